//! API layer - HTTP endpoints

pub mod health;
pub mod knowledge;
pub mod router;
pub mod state;
pub mod types;
pub mod widget;

pub use router::create_router;
pub use state::AppState;
