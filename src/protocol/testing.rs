//! Test doubles for the protocol engine.

use std::collections::HashMap;
use std::sync::Mutex;

use super::service::{ConnectionId, GlueService, NotificationSink, SignalHandler};
use crate::codec::{
    EnumDescriptor, IfaceDescriptor, ParamDescriptor, ParamKind, ProcDescriptor, PropDescriptor,
    Value,
};

/// Sink that keeps every pushed event in order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<String>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl NotificationSink for RecordingSink {
    fn push(&self, event_text: &str) {
        self.events.lock().unwrap().push(event_text.to_string());
    }
}

/// Fixed object space that records the calls made on it.
#[derive(Default)]
pub struct RecordingService {
    pub connects: usize,
    pub disconnects: Vec<(String, u64)>,
    pub exec_calls: Vec<(String, Vec<Value>)>,
    pub refuse: bool,
    handlers: HashMap<(String, u64), SignalHandler>,
    next_id: u64,
}

impl RecordingService {
    pub fn fire(&mut self, signal: &str, proxy: u64, args: &[Value]) -> bool {
        match self.handlers.get_mut(&(signal.to_string(), proxy)) {
            Some(handler) => {
                handler(args);
                true
            }
            None => false,
        }
    }
}

impl GlueService for RecordingService {
    fn describe_enum(&mut self, name: &str) -> Option<EnumDescriptor> {
        (name == "Color").then(|| EnumDescriptor {
            enum_name: "Color".into(),
            values: vec!["Red".into(), "Green".into()],
            blurbs: vec!["r".into(), "g".into()],
        })
    }

    fn describe_iface(&mut self, iface: &str) -> Option<IfaceDescriptor> {
        (iface == "Item").then(|| IfaceDescriptor {
            type_name: "Item".into(),
            ancestor_ifaces: vec!["Item".into()],
            property_names: vec!["name".into()],
            signal_names: vec!["changed".into()],
        })
    }

    fn describe_prop(&mut self, proxy: u64, prop_name: &str) -> Option<PropDescriptor> {
        (proxy != 0 && prop_name == "name").then(|| {
            PropDescriptor::new(ParamDescriptor::named(
                "name",
                ParamKind::Str { default: None },
            ))
        })
    }

    fn describe_proc(&mut self, proc_name: &str) -> Option<ProcDescriptor> {
        (proc_name == "echo").then(|| ProcDescriptor {
            name: "echo".into(),
            return_param: ParamDescriptor::returns(ParamKind::Str { default: None }),
            params: vec![ParamDescriptor::named(
                "text",
                ParamKind::Str { default: None },
            )],
        })
    }

    fn list_proc_names(&mut self) -> Vec<String> {
        vec!["echo".into()]
    }

    fn list_method_names(&mut self, iface: &str) -> Vec<String> {
        if iface == "Item" {
            vec!["rename".into()]
        } else {
            Vec::new()
        }
    }

    fn base_iface(&mut self) -> String {
        "Item".into()
    }

    fn iface_children(&mut self, _iface: &str) -> Vec<String> {
        Vec::new()
    }

    fn proxy_iface(&mut self, proxy: u64) -> Option<String> {
        (proxy != 0).then(|| "Item".to_string())
    }

    fn exec(&mut self, proc_name: &str, args: Vec<Value>) -> Value {
        self.exec_calls.push((proc_name.to_string(), args.clone()));
        args.into_iter().next().unwrap_or_default()
    }

    fn connect_signal(
        &mut self,
        signal: &str,
        proxy: u64,
        on_fire: SignalHandler,
    ) -> Option<ConnectionId> {
        if self.refuse {
            return None;
        }
        self.connects += 1;
        self.next_id += 1;
        self.handlers.insert((signal.to_string(), proxy), on_fire);
        ConnectionId::new(self.next_id)
    }

    fn disconnect_signal(&mut self, signal: &str, proxy: u64, _id: ConnectionId) {
        self.handlers.remove(&(signal.to_string(), proxy));
        self.disconnects.push((signal.to_string(), proxy));
    }

    fn default_client_msg(&mut self, message: Option<&str>, value: &Value) -> Option<Value> {
        match message {
            Some("echo") => Some(value.clone()),
            _ => None,
        }
    }
}
