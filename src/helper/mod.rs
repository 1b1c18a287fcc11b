pub mod clock;
pub mod cycle;
pub mod decimal_ext;
pub mod number;

pub use number::{format_volume, Sign};

/// `rust_i18n` keeps the active locale in a global, so tests touching it run one at a time.
#[cfg(test)]
pub(crate) static TEST_LOCALE_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
