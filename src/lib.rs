//! gluecodec - textual remote-object RPC, introspection and signal codec
//!
//! A caller invokes procedures, introspects enum/interface/procedure
//! metadata and subscribes to signals of an object space it does not link
//! against. Messages are compact s-expressions; a responder decodes them,
//! dispatches to a [`protocol::GlueService`] and pushes signal events back
//! out of band.

pub mod catalog;
pub mod codec;
pub mod error;
pub mod ipc;
pub mod protocol;

pub use error::{GlueError, Result};
