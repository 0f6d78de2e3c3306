use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "pulpu-server")]
#[command(about = "Web server with Google login and signed-cookie sessions")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Configuration file (overrides PULPU_CONFIG)
    #[arg(short, long, global = true)]
    pub config: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP server (default)
    Serve,
    /// Print a new random session secret key as hex
    GenerateSecret,
}
