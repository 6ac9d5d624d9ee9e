//! HTTP boundary: router, handlers, callback authentication.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod signature;
pub mod state;

pub use routes::{build_router, serve};
pub use state::AppState;
