use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// EatLog session client - manages the login session and sends authorized API requests
#[derive(Parser)]
#[command(name = "eatlog")]
#[command(
    about = "Session management and authorized requests for the EatLog API",
    long_about = None
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Logging level (overrides the config file)
    #[arg(short, long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Show who is logged in
    Status,

    /// Store a session issued by the login exchange
    Login(LoginArgs),

    /// Clear the session
    Logout,

    /// End the session if it has expired
    Check,

    /// Send an authorized request to the API
    Request(RequestArgs),

    /// Follow session changes until interrupted
    Watch(WatchArgs),

    /// Write a default configuration file
    Init(InitArgs),
}

#[derive(Args, Clone, Debug)]
pub struct LoginArgs {
    /// Login name shown in the header
    #[arg(short, long)]
    pub identity: String,

    /// Bearer token; prompted for when omitted
    #[arg(short, long)]
    pub token: Option<String>,

    /// Session lifetime in minutes
    #[arg(
        long,
        value_name = "MINUTES",
        conflicts_with = "expires_at",
        allow_negative_numbers = true
    )]
    pub expires_in: Option<i64>,

    /// Absolute expiry (RFC 3339, e.g. "2026-01-01T00:00:00Z")
    #[arg(long, value_name = "TIMESTAMP")]
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Args, Clone, Debug)]
pub struct RequestArgs {
    /// Endpoint path appended to /api/v1, e.g. "/items"
    pub endpoint: String,

    /// HTTP method
    #[arg(short = 'X', long, default_value = "GET")]
    pub method: String,

    /// Request body
    #[arg(short, long)]
    pub data: Option<String>,

    /// Extra header, "Name: value" (repeatable)
    #[arg(short = 'H', long = "header", value_name = "HEADER")]
    pub headers: Vec<String>,
}

#[derive(Args, Clone, Debug)]
pub struct WatchArgs {
    /// Seconds between expiry checks
    #[arg(long, default_value = "30")]
    pub interval_sec: u64,
}

#[derive(Args, Clone, Debug)]
pub struct InitArgs {
    /// Replace an existing configuration file
    #[arg(long)]
    pub force: bool,
}
