pub mod config;
pub mod handlers;
pub mod observability;
pub mod server;

pub use config::{AppConfig, LoggingConfig, ServerConfig};
pub use observability::init_tracing;
pub use server::{AppState, PulpuServer, ServerBuilder, build_app};
