pub mod footer;
pub mod help;
pub mod navbar;
pub mod news;
pub mod popup;
pub mod profile;
pub mod screener;
