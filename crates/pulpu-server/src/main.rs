mod cli;

use std::env;

use clap::Parser;
use pulpu_server::ServerBuilder;
use pulpu_server::config::loader::{DEFAULT_CONFIG_PATH, load_config};

use cli::{Cli, Commands};

/// How the configuration path was determined.
#[derive(Debug, Clone, Copy)]
enum ConfigSource {
    /// From --config CLI argument
    CliArgument,
    /// From PULPU_CONFIG environment variable
    EnvironmentVariable,
    /// Default path (pulpu.toml)
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CliArgument => write!(f, "CLI argument (--config)"),
            Self::EnvironmentVariable => write!(f, "environment variable (PULPU_CONFIG)"),
            Self::Default => write!(f, "default"),
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Some(Commands::GenerateSecret) = cli.command {
        match pulpu_auth::generate_secret_key() {
            Ok(key) => println!("{}", key.to_hex()),
            Err(e) => {
                eprintln!("Failed to generate secret key: {e}");
                std::process::exit(exit_code(&e));
            }
        }
        return;
    }

    // Load .env file if present (before anything else)
    if let Err(e) = dotenvy::dotenv() {
        // Not an error if .env doesn't exist - it's optional
        if !matches!(e, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound)
        {
            eprintln!("Warning: Failed to load .env file: {e}");
        }
    }

    // Initialize tracing early with the default level
    pulpu_server::observability::init_tracing();

    let (config_path, source) = resolve_config_path(cli.config);

    let explicit_path = match source {
        ConfigSource::Default => None,
        _ => Some(config_path.as_str()),
    };
    let cfg = match load_config(explicit_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(2);
        }
    };

    tracing::info!(
        path = %config_path,
        source = %source,
        "Configuration loaded"
    );

    pulpu_server::observability::apply_logging_level(&cfg.logging.level);

    let server = match ServerBuilder::new().with_config(cfg).build() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Server initialization failed: {e}");
            std::process::exit(exit_code(&e));
        }
    };

    if let Err(err) = server.run().await {
        eprintln!("Server error: {err}");
        std::process::exit(1);
    }
}

/// Startup failures that no retry can fix exit with 2, everything else with 1.
fn exit_code(err: &pulpu_auth::AuthError) -> i32 {
    if err.is_fatal() { 2 } else { 1 }
}

/// Resolve the configuration file path.
///
/// Priority order:
/// 1. CLI argument: --config <path>
/// 2. Environment variable: PULPU_CONFIG
/// 3. Default: pulpu.toml
fn resolve_config_path(cli_path: Option<String>) -> (String, ConfigSource) {
    if let Some(path) = cli_path {
        return (path, ConfigSource::CliArgument);
    }

    if let Ok(path) = env::var("PULPU_CONFIG")
        && !path.is_empty()
    {
        return (path, ConfigSource::EnvironmentVariable);
    }

    (DEFAULT_CONFIG_PATH.to_string(), ConfigSource::Default)
}
