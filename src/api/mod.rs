pub mod client;
pub mod error;
pub mod rate_limiter;

pub use client::ApiClient;
pub use error::ApiError;
