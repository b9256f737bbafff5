pub mod batches;
pub mod downloads;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod orchestrator;
pub mod playlists;
pub mod routes;

pub use routes::create_router;
