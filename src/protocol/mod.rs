//! Glue command protocol: the responder and caller roles, the signal
//! subscription registry and the collaborator traits they sit between.

pub mod caller;
pub mod command;
pub mod responder;
pub mod service;
pub mod signals;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use caller::Caller;
pub use command::{Command, CommandId, SignalEvent};
pub use responder::{ClientMsgHook, Responder};
pub use service::{ConnectionId, GlueService, NotificationSink, SignalHandler, Transport};
pub use signals::{SignalRegistry, Subscription};
pub use transport::{LoopbackTransport, QueueSink};

/// Prefix of every successful reply.
pub const RETURN_MARKER: &str = ";gsl-glue-return\n";

/// Entire reply to a message that failed to decode.
pub const PARSE_ERROR_MARKER: &str = ";gsl-glue-parse-error";
