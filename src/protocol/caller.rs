//! Caller role: typed operations over a request/response transport.
//!
//! Every operation degrades to its empty result (`None`, an empty list,
//! `false`, `Value::None`) when the reply is missing, unmarked or fails to
//! parse. The failure is logged, never returned.

use std::collections::VecDeque;

use super::command::{Command, SignalEvent};
use super::service::Transport;
use super::RETURN_MARKER;
use crate::codec::{
    parse_enum, parse_iface, parse_proc, parse_prop, parse_string_list, parse_value, Encode,
    EnumDescriptor, IfaceDescriptor, Parser, ProcDescriptor, PropDescriptor, Value,
};

pub struct Caller<T: Transport> {
    transport: T,
    events: VecDeque<SignalEvent>,
}

impl<T: Transport> Caller<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            events: VecDeque::new(),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Send a command and return the payload after the success marker.
    fn round_trip(&mut self, cmd: &Command) -> Option<String> {
        let request = cmd.encode();
        let Some(reply) = self.transport.send(&request) else {
            log::warn!("No reply to {:?} request", cmd.id());
            return None;
        };
        match reply.strip_prefix(RETURN_MARKER) {
            Some(payload) => Some(payload.to_string()),
            None => {
                log::warn!("Unmarked reply to {:?} request: {:?}", cmd.id(), reply);
                None
            }
        }
    }

    /// Round-trip and decode a reply that must parse completely.
    fn call<R>(&mut self, cmd: Command, rule: impl FnOnce(&mut Parser<'_>) -> R) -> Option<R> {
        let payload = self.round_trip(&cmd)?;
        let mut p = Parser::new(&payload);
        let result = rule(&mut p);
        p.expect_end();
        match p.failure() {
            Some(failure) => {
                log::warn!("Malformed reply to {:?} request: {}", cmd.id(), failure);
                None
            }
            None => Some(result),
        }
    }

    /// Round-trip a describe request. An empty payload means "not found";
    /// a descriptor that started parsing is returned even if it broke off.
    fn describe<R>(
        &mut self,
        cmd: Command,
        rule: impl FnOnce(&mut Parser<'_>) -> Option<R>,
    ) -> Option<R> {
        let payload = self.round_trip(&cmd)?;
        let mut p = Parser::new(&payload);
        if p.at_end() {
            return None;
        }
        let desc = rule(&mut p);
        p.expect_end();
        if let Some(failure) = p.failure() {
            log::warn!("Malformed reply to {:?} request: {}", cmd.id(), failure);
        }
        desc
    }

    pub fn describe_enum(&mut self, name: &str) -> Option<EnumDescriptor> {
        self.describe(Command::DescribeEnum { name: name.into() }, parse_enum)
    }

    pub fn describe_iface(&mut self, iface: &str) -> Option<IfaceDescriptor> {
        self.describe(Command::DescribeIface { iface: iface.into() }, parse_iface)
    }

    pub fn describe_prop(&mut self, proxy: u64, prop_name: &str) -> Option<PropDescriptor> {
        self.describe(
            Command::DescribeProp {
                proxy,
                prop_name: prop_name.into(),
            },
            parse_prop,
        )
    }

    pub fn describe_proc(&mut self, proc_name: &str) -> Option<ProcDescriptor> {
        self.describe(
            Command::DescribeProc {
                proc_name: proc_name.into(),
            },
            parse_proc,
        )
    }

    pub fn list_proc_names(&mut self) -> Vec<String> {
        self.call(Command::ListProcNames, parse_string_list)
            .unwrap_or_default()
    }

    pub fn list_method_names(&mut self, iface_name: &str) -> Vec<String> {
        self.call(
            Command::ListMethodNames {
                iface_name: iface_name.into(),
            },
            parse_string_list,
        )
        .unwrap_or_default()
    }

    pub fn base_iface(&mut self) -> String {
        self.call(Command::BaseIface, |p| p.expect_string())
            .unwrap_or_default()
    }

    pub fn iface_children(&mut self, iface_name: &str) -> Vec<String> {
        self.call(
            Command::IfaceChildren {
                iface_name: iface_name.into(),
            },
            parse_string_list,
        )
        .unwrap_or_default()
    }

    pub fn proxy_iface(&mut self, proxy: u64) -> Option<String> {
        self.call(Command::ProxyIface { proxy }, |p| {
            p.expect_optional_string()
        })
        .flatten()
    }

    pub fn exec(&mut self, proc_name: &str, args: Vec<Value>) -> Value {
        self.call(
            Command::Exec {
                proc_name: proc_name.into(),
                args: Value::Seq(args),
            },
            parse_value,
        )
        .unwrap_or_default()
    }

    /// Enable or disable a signal. `true` means the subscription is active.
    pub fn signal_connection(&mut self, proxy: u64, enable: bool, signal: &str) -> bool {
        self.call(
            Command::SignalConnection {
                proxy,
                enable,
                signal: signal.into(),
            },
            |p| p.expect_uint() != 0,
        )
        .unwrap_or(false)
    }

    pub fn client_msg(&mut self, message: Option<&str>, value: Value) -> Value {
        self.call(
            Command::ClientMsg {
                message: message.map(str::to_string),
                value,
            },
            parse_value,
        )
        .unwrap_or_default()
    }

    /// Take a pushed message. Returns `false` if it is not a signal event.
    ///
    /// Complete events for a non-null proxy are queued; malformed ones are
    /// logged and dropped.
    pub fn enqueue_event(&mut self, text: &str) -> bool {
        match SignalEvent::decode(text) {
            None => false,
            Some(Ok(event)) => {
                if event.proxy != 0 {
                    self.events.push_back(event);
                } else {
                    log::debug!("Dropping `{}` event for null proxy", event.signal);
                }
                true
            }
            Some(Err(failure)) => {
                log::warn!("Malformed signal event: {}", failure);
                true
            }
        }
    }

    /// Move notifications the transport has buffered into the event queue.
    /// Returns how many signal events were taken.
    pub fn poll_events(&mut self) -> usize {
        let mut taken = 0;
        for text in self.transport.drain_notifications() {
            if self.enqueue_event(&text) {
                taken += 1;
            } else {
                log::warn!("Ignoring unexpected notification {:?}", text);
            }
        }
        taken
    }

    pub fn pop_event(&mut self) -> Option<SignalEvent> {
        self.events.pop_front()
    }

    pub fn pending_events(&self) -> usize {
        self.events.len()
    }
}
