//! DocQA server library: application state and the HTTP router.

pub mod routes;
pub mod state;

pub use routes::build_router;
pub use state::AppState;
