//! Renders the fixed WireGuard server and client interface files from
//! stored records.

pub mod error;
pub mod renderer;

pub use error::{Error, Result};
pub use renderer::{render_client, render_server, ServerInterfaceContext, ServerPeerEntry};
