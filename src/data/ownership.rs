use serde::{Deserialize, Serialize};

/// Institutional holder of a ticker.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InstitutionHolder {
    pub name: String,
    /// Percentage of shares outstanding.
    #[serde(default)]
    pub ownership: Option<f64>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub form_type: Option<String>,
}

/// Holders ordered by stake, largest first; holders without a stake go last.
pub fn rank_holders(mut holders: Vec<InstitutionHolder>) -> Vec<InstitutionHolder> {
    holders.sort_by(|a, b| match (a.ownership, b.ownership) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
    holders
}

#[cfg(test)]
mod tests {
    use super::*;

    fn holder(name: &str, ownership: Option<f64>) -> InstitutionHolder {
        InstitutionHolder {
            name: name.to_string(),
            ownership,
            ..Default::default()
        }
    }

    #[test]
    fn ranks_by_stake_with_unknowns_last() {
        let ranked = rank_holders(vec![
            holder("unknown", None),
            holder("small", Some(1.2)),
            holder("large", Some(8.9)),
        ]);
        let names: Vec<_> = ranked.iter().map(|h| h.name.as_str()).collect();
        assert_eq!(names, ["large", "small", "unknown"]);
    }
}
