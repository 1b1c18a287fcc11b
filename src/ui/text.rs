use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::helper::decimal_ext::fixed;

const EMPTY_PLACEHOLDER: &str = "--";

pub fn align_right(text: &str, width: usize) -> String {
    let extra: usize = text
        .chars()
        .filter_map(|c| c.width_cjk().and_then(|w| w.checked_sub(1)))
        .sum();
    format!(
        "{text:>width$}",
        width = width.checked_sub(extra).unwrap_or(width)
    )
}

/// Cuts `text` to at most `width` display columns, ending with `…` when shortened.
pub fn ellipsis(text: &str, width: usize) -> String {
    if text.width() <= width {
        return text.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w + 1 > width {
            break;
        }
        used += w;
        out.push(c);
    }
    out.push('…');
    out
}

pub fn unit(number: Decimal, precision: u32) -> String {
    match rust_i18n::locale().as_str() {
        "zh-CN" => unit_4(number, precision, (" 万", " 亿", " 万亿")),
        "zh-HK" => unit_4(number, precision, (" 萬", " 億", " 萬億")),
        _ => unit_3(number, precision, ("K", "M", "B")),
    }
}

/// Market capitalisation as reported by the backend, in millions of the quote currency.
pub fn market_cap(millions: Option<f64>) -> String {
    millions
        .and_then(crate::helper::decimal_ext::decimal)
        .filter(|v| v.is_sign_positive() && !v.is_zero())
        .map_or_else(
            || EMPTY_PLACEHOLDER.to_string(),
            |v| unit(v * dec!(1e6), 2),
        )
}

/// Plain number with two decimals, or the placeholder.
pub fn number(value: Option<f64>) -> String {
    value
        .filter(|v| v.is_finite())
        .map_or_else(|| EMPTY_PLACEHOLDER.to_string(), |v| format!("{v:.2}"))
}

fn unit_4(number: Decimal, precision: u32, units: (&str, &str, &str)) -> String {
    if number >= dec!(1e12) {
        return format!("{}{}", fixed(number / dec!(1e12), precision), units.2);
    }
    if number >= dec!(1e8) {
        return format!("{}{}", fixed(number / dec!(1e8), precision), units.1);
    }
    if number >= dec!(1e4) {
        return format!("{}{}", fixed(number / dec!(1e4), precision), units.0);
    }
    fixed(number, precision)
}

fn unit_3(number: Decimal, precision: u32, units: (&str, &str, &str)) -> String {
    if number >= dec!(1e9) {
        return format!("{}{}", fixed(number / dec!(1e9), precision), units.2);
    }
    if number >= dec!(1e6) {
        return format!("{}{}", fixed(number / dec!(1e6), precision), units.1);
    }
    if number >= dec!(1e3) {
        return format!("{}{}", fixed(number / dec!(1e3), precision), units.0);
    }
    fixed(number, precision)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_align_right() {
        assert_eq!(align_right("text", 3), "text");
        assert_eq!(align_right("text", 10), "      text");
        // CJK characters
        assert_eq!(align_right("你好世界", 3), "你好世界");
        assert_eq!(align_right("你好世界", 10), "  你好世界");
    }

    #[test]
    fn test_ellipsis() {
        assert_eq!(ellipsis("Apple Inc", 20), "Apple Inc");
        assert_eq!(ellipsis("Apple Inc", 6), "Apple…");
        assert_eq!(ellipsis("苹果公司财报", 5), "苹果…");
    }

    #[test]
    fn test_unit() {
        let _lock = crate::helper::TEST_LOCALE_LOCK
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        rust_i18n::set_locale("en");
        assert_eq!(unit(dec!(1), 2), "1.00");
        assert_eq!(unit(dec!(2300), 1), "2.3K");
        assert_eq!(unit(dec!(78232300), 2), "78.23M");
        assert_eq!(unit(dec!(29278232300), 0), "29B");
        assert_eq!(unit(dec!(2345), 2), "2.35K");

        rust_i18n::set_locale("zh-CN");
        assert_eq!(unit(dec!(23000), 1), "2.3 万");
        assert_eq!(unit(dec!(782323000), 2), "7.82 亿");
        assert_eq!(unit(dec!(2927823230000), 2), "2.93 万亿");
    }

    #[test]
    fn test_market_cap_in_millions() {
        let _lock = crate::helper::TEST_LOCALE_LOCK
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        rust_i18n::set_locale("en");
        assert_eq!(market_cap(Some(2_950_000.0)), "2950.00B");
        assert_eq!(market_cap(Some(850.5)), "850.50M");
        assert_eq!(market_cap(None), "--");
        assert_eq!(market_cap(Some(0.0)), "--");
    }

    #[test]
    fn test_number_placeholder() {
        assert_eq!(number(Some(31.456)), "31.46");
        assert_eq!(number(Some(f64::NAN)), "--");
        assert_eq!(number(None), "--");
    }
}
