use crate::cli::{Cli, Commands, InitArgs, LoginArgs, RequestArgs, WatchArgs};
use crate::errors::AppError;
use crate::gateway::{ApiGateway, RequestOptions};
use crate::models::Session;
use crate::runtime::{run_watch_loop, shutdown_signal};
use crate::session_store::SessionStore;
use crate::token_storage::open_storage;
use crate::traits::{
    ConfigProvider, DefaultConfigProvider, DefaultMessageHandler, DefaultNavigator,
    MessageHandler, Navigator, SessionStorage,
};
use crate::Config;
use chrono::{Duration, Utc};
use reqwest::Method;
use std::sync::Arc;

/// Wires the session store, gateway and console output together
pub struct Application {
    store: Arc<SessionStore>,
    gateway: ApiGateway,
    messages: Arc<dyn MessageHandler>,
}

impl Application {
    /// Run the CLI with default implementations
    pub async fn run(cli: Cli) -> Result<(), AppError> {
        let config_provider = DefaultConfigProvider {
            path: cli.config.clone(),
        };
        Self::run_with_deps(cli, &config_provider, Arc::new(DefaultMessageHandler)).await
    }

    /// Run the CLI with dependency injection
    pub async fn run_with_deps(
        cli: Cli,
        config_provider: &dyn ConfigProvider,
        messages: Arc<dyn MessageHandler>,
    ) -> Result<(), AppError> {
        // An existing config may be invalid, so init does not load it
        if let Commands::Init(args) = &cli.command {
            return init_config(config_provider, args, messages.as_ref());
        }

        let mut config = config_provider.load_config()?;
        if let Some(level) = cli.log_level {
            config.logging.level = level;
        }

        // Keep the guard alive to ensure log messages are flushed
        let _guard = crate::logger::setup_logging(&config)?;

        let storage = open_storage(&config.storage)?;
        let navigator = Arc::new(DefaultNavigator::new(config.login_path()));
        let app = Application::new(&config, storage, navigator, messages)?;

        let result = app.execute(cli.command).await;
        app.shutdown();
        result
    }

    /// Builds the components and loads any persisted session
    pub fn new(
        config: &Config,
        storage: Arc<dyn SessionStorage>,
        navigator: Arc<dyn Navigator>,
        messages: Arc<dyn MessageHandler>,
    ) -> Result<Self, AppError> {
        let store = Arc::new(SessionStore::new(storage));
        store.initialize();
        let gateway = ApiGateway::new(&config.api, store.clone(), navigator)?;

        Ok(Application {
            store,
            gateway,
            messages,
        })
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    pub async fn execute(&self, command: Commands) -> Result<(), AppError> {
        match command {
            Commands::Status => self.status(),
            Commands::Login(args) => self.login(args),
            Commands::Logout => self.logout(),
            Commands::Check => self.check(),
            Commands::Request(args) => self.request(args).await,
            Commands::Watch(args) => self.watch(args).await,
            Commands::Init(_) => Err(AppError::Generic {
                message: "init runs before a session is opened".to_string(),
            }),
        }
    }

    /// Releases the in-memory session; the persisted record is kept
    pub fn shutdown(&self) {
        self.store.teardown();
    }

    fn status(&self) -> Result<(), AppError> {
        self.messages.print(&self.store.status_line());

        match self.store.session() {
            Some(session) if !session.is_expired() => {
                self.messages.print(&format!(
                    "Session expires at {} ({} minutes left)",
                    session.expires_at.to_rfc3339(),
                    session.minutes_until_expiry()
                ));
            }
            Some(session) => {
                self.messages.print(&format!(
                    "Session for {} expired at {}",
                    session.identity,
                    session.expires_at.to_rfc3339()
                ));
            }
            None => {}
        }
        Ok(())
    }

    fn login(&self, args: LoginArgs) -> Result<(), AppError> {
        let expires_at = match (args.expires_at, args.expires_in) {
            (Some(at), _) => at,
            (None, Some(minutes)) => Utc::now() + Duration::minutes(minutes),
            (None, None) => {
                return Err(AppError::Generic {
                    message: "one of --expires-in or --expires-at is required".to_string(),
                });
            }
        };

        let token = match args.token {
            Some(token) => token,
            None => rpassword::prompt_password("Token: ").map_err(|e| AppError::Generic {
                message: format!("Failed to read token: {}", e),
            })?,
        };

        let session = Session::new(args.identity, token.trim(), expires_at);
        if session.is_expired() {
            self.messages
                .eprint("Warning: the session is already expired and will not authenticate");
        }

        self.store.set_session(Some(session))?;
        self.messages.print(&self.store.status_line());
        Ok(())
    }

    fn logout(&self) -> Result<(), AppError> {
        self.store.logout()?;
        self.messages.print(&self.store.status_line());
        Ok(())
    }

    fn check(&self) -> Result<(), AppError> {
        if self.store.check_expiry()? {
            self.messages.print("Session expired and was cleared");
        } else if self.store.is_authenticated() {
            self.messages.print("Session is valid");
        } else {
            self.messages.print("No session");
        }
        Ok(())
    }

    async fn request(&self, args: RequestArgs) -> Result<(), AppError> {
        let method = Method::from_bytes(args.method.to_uppercase().as_bytes()).map_err(|_| {
            AppError::Generic {
                message: format!("Invalid HTTP method: {}", args.method),
            }
        })?;

        let mut options = RequestOptions::new(method);
        for line in &args.headers {
            let (name, value) = parse_header_line(line)?;
            options = options.header(name, value)?;
        }
        if let Some(data) = args.data {
            options = options.body(data);
        }

        let response = self.gateway.request(&args.endpoint, options).await?;
        self.messages.print(&response.status().to_string());

        let body = response.text();
        if !body.is_empty() {
            self.messages.print(&body);
        }
        Ok(())
    }

    async fn watch(&self, args: WatchArgs) -> Result<(), AppError> {
        if args.interval_sec == 0 {
            return Err(AppError::Generic {
                message: "--interval-sec must be greater than 0".to_string(),
            });
        }

        run_watch_loop(
            &self.store,
            self.messages.as_ref(),
            std::time::Duration::from_secs(args.interval_sec),
            shutdown_signal(),
        )
        .await;
        Ok(())
    }
}

/// Writes the default configuration to the provider's path
fn init_config(
    config_provider: &dyn ConfigProvider,
    args: &InitArgs,
    messages: &dyn MessageHandler,
) -> Result<(), AppError> {
    let path = config_provider.config_path();
    if path.exists() && !args.force {
        return Err(AppError::Generic {
            message: format!(
                "Config file {} already exists (use --force to replace it)",
                path.display()
            ),
        });
    }

    crate::config::save_config(&Config::default(), &path)?;
    tracing::info!("Wrote default config to {:?}", path);
    messages.print(&format!("Wrote {}", path.display()));
    Ok(())
}

/// Splits a "Name: value" header argument
fn parse_header_line(line: &str) -> Result<(&str, &str), AppError> {
    match line.split_once(':') {
        Some((name, value)) if !name.trim().is_empty() => Ok((name.trim(), value.trim())),
        _ => Err(AppError::Generic {
            message: format!("Invalid header '{}', expected 'Name: value'", line),
        }),
    }
}
