//! CommentScope Server
//!
//! HTTP API around the local comment models: prediction, history,
//! statistics and model diagnostics.

pub mod cli;
pub mod config;
pub mod error;
pub mod predict;
pub mod server;
pub mod state;
pub mod telemetry;

pub use cli::*;
pub use config::ServerConfig;
pub use error::AppError;
pub use server::*;
pub use state::AppState;
