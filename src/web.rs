#![cfg(not(tarpaulin_include))]

use feedback::app;
use feedback::config::Config;

/// Main entry point for the feedback web application
///
/// Initializes logging from `RUST_LOG`, reads the configuration from the
/// environment once, and runs the HTTP server.
///
/// # Returns
/// * `Result<(), Box<dyn std::error::Error>>` - Success or error object
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env()?;
    app::run(config).await
}
