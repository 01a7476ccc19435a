pub mod client;
pub mod types;

pub use client::{API_BASE_PATH, ApiGateway};
pub use types::{ApiResponse, RequestOptions};
