//! One-shot client config delivery: an authenticated end user downloads a
//! freshly minted client config for their own peer, exactly once.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use error::{Error, Result};
pub use routes::create_router;
pub use state::{AppState, HeaderSessionSource, SessionSource, StoreBackend};
