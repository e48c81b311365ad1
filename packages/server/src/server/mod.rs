// HTTP server setup (Axum REST API)
pub mod app;
pub mod error;
pub mod routes;

pub use app::*;
pub use error::ApiError;
