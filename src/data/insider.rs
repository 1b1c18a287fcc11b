use serde::{Deserialize, Serialize};

/// One Form 4 filing line.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsiderTransaction {
    #[serde(default)]
    pub name: String,
    /// Shares held after the transaction.
    #[serde(default)]
    pub share: Option<i64>,
    /// Signed share delta; negative for sales.
    #[serde(default)]
    pub change: Option<i64>,
    #[serde(default)]
    pub filing_date: Option<String>,
    #[serde(default)]
    pub transaction_date: Option<String>,
    #[serde(default)]
    pub transaction_price: Option<f64>,
    #[serde(default)]
    pub transaction_code: Option<String>,
}

impl InsiderTransaction {
    pub fn is_purchase(&self) -> bool {
        self.change.is_some_and(|c| c > 0)
    }

    /// Month bucket (`YYYY-MM`) of the transaction, for the activity chart.
    pub fn month(&self) -> Option<&str> {
        self.transaction_date
            .as_deref()
            .or(self.filing_date.as_deref())
            .and_then(|d| d.get(..7))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_camel_case_fields() {
        let tx: InsiderTransaction = serde_json::from_str(
            r#"{"name":"COOK TIMOTHY D","share":3280180,"change":-59730,
                "filingDate":"2024-04-03","transactionDate":"2024-04-01",
                "transactionPrice":170.03,"transactionCode":"S"}"#,
        )
        .unwrap();
        assert!(!tx.is_purchase());
        assert_eq!(tx.month(), Some("2024-04"));
        assert_eq!(tx.transaction_code.as_deref(), Some("S"));
    }

    #[test]
    fn month_falls_back_to_filing_date() {
        let tx = InsiderTransaction {
            filing_date: Some("2023-12-29".to_string()),
            change: Some(10),
            ..Default::default()
        };
        assert!(tx.is_purchase());
        assert_eq!(tx.month(), Some("2023-12"));
    }
}
