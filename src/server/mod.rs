mod errors;
mod handlers;
mod models;
mod state;
mod upload;

pub use handlers::{router, run_server};
pub use state::ServerState;
