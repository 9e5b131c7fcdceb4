//! Collaborator interfaces at the edges of the protocol engine.

use std::num::NonZeroU64;

use crate::codec::{EnumDescriptor, IfaceDescriptor, ProcDescriptor, PropDescriptor, Value};

/// Handle for an established signal connection. Never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(NonZeroU64);

impl ConnectionId {
    pub fn new(id: u64) -> Option<Self> {
        NonZeroU64::new(id).map(Self)
    }

    pub fn get(self) -> u64 {
        self.0.get()
    }
}

/// Callback installed on a signal; invoked with the signal's arguments.
pub type SignalHandler = Box<dyn FnMut(&[Value]) + Send>;

/// The object space a responder serves.
pub trait GlueService {
    fn describe_enum(&mut self, name: &str) -> Option<EnumDescriptor>;

    fn describe_iface(&mut self, iface: &str) -> Option<IfaceDescriptor>;

    fn describe_prop(&mut self, proxy: u64, prop_name: &str) -> Option<PropDescriptor>;

    fn describe_proc(&mut self, proc_name: &str) -> Option<ProcDescriptor>;

    fn list_proc_names(&mut self) -> Vec<String>;

    fn list_method_names(&mut self, iface: &str) -> Vec<String>;

    /// Root of the interface hierarchy.
    fn base_iface(&mut self) -> String;

    fn iface_children(&mut self, iface: &str) -> Vec<String>;

    fn proxy_iface(&mut self, proxy: u64) -> Option<String>;

    fn exec(&mut self, proc_name: &str, args: Vec<Value>) -> Value;

    /// Attach `on_fire` to `signal` on `proxy`. `None` if the connection
    /// could not be made.
    fn connect_signal(
        &mut self,
        signal: &str,
        proxy: u64,
        on_fire: SignalHandler,
    ) -> Option<ConnectionId>;

    fn disconnect_signal(&mut self, signal: &str, proxy: u64, id: ConnectionId);

    /// Fallback for client messages the responder's hook did not take.
    fn default_client_msg(&mut self, _message: Option<&str>, _value: &Value) -> Option<Value> {
        None
    }
}

/// Out-of-band channel for pushed notifications. Fire-and-forget.
pub trait NotificationSink: Send + Sync {
    fn push(&self, event_text: &str);
}

/// Synchronous request/response primitive used by the caller.
pub trait Transport {
    /// Deliver one request and wait for its reply. `None` means no reply.
    fn send(&mut self, request: &str) -> Option<String>;

    /// Notifications received since the last call, oldest first.
    fn drain_notifications(&mut self) -> Vec<String> {
        Vec::new()
    }
}
