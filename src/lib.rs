pub mod app;
pub mod cli;
pub mod config;
pub mod errors;
pub mod gateway;
pub mod logger;
pub mod models;
pub mod runtime;
pub mod session_store;
pub mod token_storage;
pub mod traits;

pub use app::Application;
pub use config::Config;
pub use errors::{AppError, ConfigError, GatewayError, SessionError};
pub use gateway::{ApiGateway, ApiResponse, RequestOptions};
pub use models::{ErrorBody, Session};
pub use session_store::SessionStore;
pub use token_storage::{MemoryStorage, TokenStorage};
pub use traits::{DefaultNavigator, MessageHandler, Navigator, SessionStorage};
