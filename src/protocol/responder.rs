//! Responder role: decode a request, dispatch it to the service, encode the reply.

use std::sync::Arc;

use super::command::Command;
use super::service::{GlueService, NotificationSink};
use super::signals::SignalRegistry;
use super::{PARSE_ERROR_MARKER, RETURN_MARKER};
use crate::codec::{Encode, TextWriter, Value};

/// Interception hook for client messages. Returning `Some` consumes the message.
pub type ClientMsgHook = Box<dyn FnMut(Option<&str>, &Value) -> Option<Value> + Send>;

/// Serves one peer. Requests are handled strictly one at a time.
///
/// Dropping the responder disables every remaining signal subscription.
pub struct Responder<S: GlueService> {
    service: S,
    sink: Arc<dyn NotificationSink>,
    registry: SignalRegistry,
    client_msg_hook: Option<ClientMsgHook>,
}

impl<S: GlueService> Responder<S> {
    pub fn new(service: S, sink: Arc<dyn NotificationSink>) -> Self {
        Self {
            service,
            sink,
            registry: SignalRegistry::new(),
            client_msg_hook: None,
        }
    }

    /// Install a hook that sees client messages before the service does.
    pub fn with_client_msg_hook<F>(mut self, hook: F) -> Self
    where
        F: FnMut(Option<&str>, &Value) -> Option<Value> + Send + 'static,
    {
        self.client_msg_hook = Some(Box::new(hook));
        self
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn service_mut(&mut self) -> &mut S {
        &mut self.service
    }

    pub fn registry(&self) -> &SignalRegistry {
        &self.registry
    }

    /// Handle one request message and produce the reply text.
    ///
    /// A message that does not decode completely is answered with the
    /// parse-error marker and never reaches the service.
    pub fn process(&mut self, message: &str) -> String {
        match Command::decode(message) {
            Ok(cmd) => {
                log::debug!("Dispatching {:?}", cmd.id());
                let payload = self.dispatch(cmd);
                format!("{}{}", RETURN_MARKER, payload)
            }
            Err(failure) => {
                log::warn!("Glue parse error: {} in message {:?}", failure, message);
                PARSE_ERROR_MARKER.to_string()
            }
        }
    }

    fn dispatch(&mut self, cmd: Command) -> String {
        match cmd {
            Command::DescribeEnum { name } => encode_optional(self.service.describe_enum(&name)),
            Command::DescribeIface { iface } => {
                encode_optional(self.service.describe_iface(&iface))
            }
            Command::DescribeProp { proxy, prop_name } => {
                encode_optional(self.service.describe_prop(proxy, &prop_name))
            }
            Command::DescribeProc { proc_name } => {
                encode_optional(self.service.describe_proc(&proc_name))
            }
            Command::ListProcNames => encode_list(&self.service.list_proc_names()),
            Command::ListMethodNames { iface_name } => {
                encode_list(&self.service.list_method_names(&iface_name))
            }
            Command::BaseIface => {
                let mut w = TextWriter::new();
                w.str(&self.service.base_iface());
                w.finish()
            }
            Command::IfaceChildren { iface_name } => {
                encode_list(&self.service.iface_children(&iface_name))
            }
            Command::ProxyIface { proxy } => {
                let mut w = TextWriter::new();
                w.string(self.service.proxy_iface(proxy).as_deref());
                w.finish()
            }
            Command::Exec { proc_name, args } => {
                let result = match args {
                    Value::Seq(args) => self.service.exec(&proc_name, args),
                    other => {
                        log::debug!(
                            "Exec `{}` with {:?} arguments instead of a sequence",
                            proc_name,
                            other.glue_type()
                        );
                        Value::None
                    }
                };
                result.encode()
            }
            Command::SignalConnection {
                proxy,
                enable,
                signal,
            } => {
                let connected = self.registry.set_connection(
                    &mut self.service,
                    &self.sink,
                    proxy,
                    &signal,
                    enable,
                );
                let mut w = TextWriter::new();
                w.bool(connected);
                w.finish()
            }
            Command::ClientMsg { message, value } => {
                self.client_msg(message.as_deref(), &value).encode()
            }
        }
    }

    fn client_msg(&mut self, message: Option<&str>, value: &Value) -> Value {
        if let Some(hook) = self.client_msg_hook.as_mut() {
            if let Some(result) = hook(message, value) {
                return result;
            }
        }
        match self.service.default_client_msg(message, value) {
            Some(result) => result,
            None => {
                log::warn!("Unhandled client message {:?}", message);
                Value::None
            }
        }
    }

    /// Disable every signal subscription. Called automatically on drop.
    pub fn shutdown(&mut self) {
        self.registry.disable_all(&mut self.service, &self.sink);
    }
}

impl<S: GlueService> Drop for Responder<S> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn encode_optional<T: Encode>(desc: Option<T>) -> String {
    desc.map(|d| d.encode()).unwrap_or_default()
}

fn encode_list(items: &[String]) -> String {
    let mut w = TextWriter::new();
    w.string_list(items);
    w.finish()
}
