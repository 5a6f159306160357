//! Async table service.
//!
//! Each table runs as its own tokio task ([`TableActor`]) owning its state.
//! Clients talk to it through a [`TableHandle`]; the [`TableRegistry`] maps
//! table ids to handles. Transports (websocket, TCP) live outside this
//! crate and only need to move [`ClientMessage`](crate::protocol::ClientMessage)s in and
//! [`ServerMessage`](crate::protocol::ServerMessage)s out.

mod actor;
mod config;
mod registry;

pub use actor::{TableActor, TableCommand, TableHandle};
pub use config::ServiceConfig;
pub use registry::TableRegistry;
