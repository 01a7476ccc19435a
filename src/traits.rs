use crate::errors::{ConfigError, SessionError};

/// Persistent key-value storage holding at most one serialized session.
///
/// Only the session store talks to an implementation of this trait.
pub trait SessionStorage: Send + Sync {
    /// Raw stored value, `None` when nothing is stored
    fn read(&self) -> Result<Option<String>, SessionError>;

    /// Overwrite the stored value
    fn write(&self, value: &str) -> Result<(), SessionError>;

    /// Remove the stored value; removing a missing value succeeds
    fn remove(&self) -> Result<(), SessionError>;
}

/// Sends the user back to the unauthenticated entry point
pub trait Navigator: Send + Sync {
    fn navigate_to_login(&self);
}

/// Navigator for the command line: there is no page to leave, so the
/// redirect becomes a message pointing at the login path
pub struct DefaultNavigator {
    login_path: String,
}

impl DefaultNavigator {
    pub fn new(login_path: impl Into<String>) -> Self {
        Self {
            login_path: login_path.into(),
        }
    }

    pub fn login_path(&self) -> &str {
        &self.login_path
    }
}

impl Navigator for DefaultNavigator {
    fn navigate_to_login(&self) {
        tracing::info!("Redirecting to {}", self.login_path);
        eprintln!("Session ended. Please log in again at {}", self.login_path);
    }
}

/// Trait for handling printing messages to console, allowing for testable output
pub trait MessageHandler: Send + Sync {
    fn print(&self, message: &str);
    fn eprint(&self, message: &str);
}

/// Default implementation that calls println!/eprintln!
pub struct DefaultMessageHandler;

impl MessageHandler for DefaultMessageHandler {
    fn print(&self, message: &str) {
        println!("{}", message);
    }

    fn eprint(&self, message: &str) {
        eprintln!("{}", message);
    }
}

/// Trait for configuration loading, allowing for testable configuration
pub trait ConfigProvider: Send + Sync {
    fn load_config(&self) -> Result<crate::Config, ConfigError>;
    fn config_path(&self) -> std::path::PathBuf;
}

/// Loads from the given path, or the default config location
pub struct DefaultConfigProvider {
    pub path: Option<std::path::PathBuf>,
}

impl ConfigProvider for DefaultConfigProvider {
    fn load_config(&self) -> Result<crate::Config, ConfigError> {
        match &self.path {
            Some(path) => crate::config::load_config_from(path),
            None => crate::config::load_config(),
        }
    }

    fn config_path(&self) -> std::path::PathBuf {
        self.path
            .clone()
            .unwrap_or_else(crate::config::config_file_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_default_navigator() {
        let navigator = DefaultNavigator::new("/");
        assert_eq!(navigator.login_path(), "/");
        let navigator: Box<dyn Navigator> = Box::new(navigator);
        navigator.navigate_to_login();
    }

    #[test]
    fn test_default_message_handler() {
        let handler: Box<dyn MessageHandler> = Box::new(DefaultMessageHandler);
        handler.print("Test message");
        handler.eprint("Test error message");
    }

    #[test]
    fn test_default_config_provider_with_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let provider = DefaultConfigProvider {
            path: Some(dir.path().join("missing.toml")),
        };

        let config = provider.load_config().unwrap();
        assert_eq!(config.api.base_url, "http://localhost:4000");
        assert_eq!(provider.config_path(), dir.path().join("missing.toml"));
    }

    #[test]
    fn test_mock_navigator() {
        struct MockNavigator {
            calls: Arc<Mutex<u32>>,
        }

        impl Navigator for MockNavigator {
            fn navigate_to_login(&self) {
                *self.calls.lock().unwrap() += 1;
            }
        }

        let calls = Arc::new(Mutex::new(0));
        let navigator = MockNavigator {
            calls: calls.clone(),
        };

        navigator.navigate_to_login();
        navigator.navigate_to_login();

        assert_eq!(*calls.lock().unwrap(), 2);
    }

    #[test]
    fn test_mock_message_handler() {
        struct MockMessageHandler {
            printed: Arc<Mutex<Vec<String>>>,
            eprinted: Arc<Mutex<Vec<String>>>,
        }

        impl MessageHandler for MockMessageHandler {
            fn print(&self, message: &str) {
                self.printed.lock().unwrap().push(message.to_string());
            }

            fn eprint(&self, message: &str) {
                self.eprinted.lock().unwrap().push(message.to_string());
            }
        }

        let printed = Arc::new(Mutex::new(Vec::new()));
        let eprinted = Arc::new(Mutex::new(Vec::new()));
        let handler = MockMessageHandler {
            printed: printed.clone(),
            eprinted: eprinted.clone(),
        };

        handler.print("Hello");
        handler.eprint("World");

        assert_eq!(printed.lock().unwrap().as_slice(), ["Hello"]);
        assert_eq!(eprinted.lock().unwrap().as_slice(), ["World"]);
    }
}
