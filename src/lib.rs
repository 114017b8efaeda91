pub mod app;
pub mod checkout;
pub mod config;
pub mod database;
pub mod error;
pub mod i18n;
pub mod middleware;
pub mod models;
pub mod queries;
pub mod routes;
pub mod services;
pub mod utils;

pub use app::AppState;
pub use config::AppConfig;
pub use error::{AppError, Result};
