//! Web layer for the bike-share mirror.
//!
//! Provides JSON endpoints over the cached station snapshot.

mod dto;
mod routes;
mod state;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::AppState;
