use std::cmp::Ordering;

/// Direction of a change, for up/down colouring.
pub trait Sign {
    fn sign(&self) -> Ordering;
}

impl Sign for f64 {
    /// `NaN` counts as flat.
    fn sign(&self) -> Ordering {
        self.partial_cmp(&0.0).unwrap_or(Ordering::Equal)
    }
}

/// Format volume to short format
/// Example: 1234567 → 1.23M (en) / 123.46万 (zh-CN)
pub fn format_volume(volume: u64) -> String {
    if volume == 0 {
        return "--".to_string();
    }

    #[allow(clippy::cast_precision_loss)]
    let volume_f = volume as f64;
    let locale = rust_i18n::locale();

    if locale.starts_with("zh") {
        let (wan, yi, wan_yi) = match locale.as_str() {
            "zh-HK" | "zh-TW" => ("萬", "億", "萬億"),
            _ => ("万", "亿", "万亿"),
        };

        if volume >= 1_000_000_000_000 {
            format!("{:.2}{wan_yi}", volume_f / 1_000_000_000_000.0)
        } else if volume >= 100_000_000 {
            format!("{:.2}{yi}", volume_f / 100_000_000.0)
        } else if volume >= 10_000 {
            format!("{:.2}{wan}", volume_f / 10_000.0)
        } else {
            volume.to_string()
        }
    } else if volume >= 1_000_000_000 {
        format!("{:.2}B", volume_f / 1_000_000_000.0)
    } else if volume >= 1_000_000 {
        format!("{:.2}M", volume_f / 1_000_000.0)
    } else if volume >= 1_000 {
        format!("{:.2}K", volume_f / 1_000.0)
    } else {
        volume.to_string()
    }
}

/// Share counts from insider filings carry a sign (sales are negative).
pub fn format_share_change(change: i64) -> String {
    let magnitude = format_volume(change.unsigned_abs());
    match change.cmp(&0) {
        Ordering::Less => format!("-{magnitude}"),
        Ordering::Equal => "0".to_string(),
        Ordering::Greater => format!("+{magnitude}"),
    }
}
