pub mod config;
pub mod content;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod scheduler;
pub mod services;

pub use config::Config;
pub use error::{AppError, Result};
pub use services::*;
