mod error;
mod server;
pub mod services;
pub mod state;
pub(crate) mod utils;

pub use error::{ApiError, ErrorResponse};
pub use server::{router, run};
pub use state::AppState;
