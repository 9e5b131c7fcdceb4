//! Glue service that answers from a loaded catalog and keeps signal
//! connections in memory.

use std::collections::BTreeMap;

use super::Catalog;
use crate::codec::{
    EnumDescriptor, IfaceDescriptor, ProcDescriptor, PropDescriptor, Record, Value,
};
use crate::protocol::{ConnectionId, GlueService, SignalHandler};

struct Connection {
    proxy: u64,
    signal: String,
    handler: SignalHandler,
}

/// Glue service backed by a static [`Catalog`].
///
/// Signals are fired explicitly, either through [`CatalogService::emit`] or
/// with an `"emit"` client message carrying `{proxy, signal, args}`.
pub struct CatalogService {
    catalog: Catalog,
    connections: BTreeMap<ConnectionId, Connection>,
    next_connection: u64,
}

impl CatalogService {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog,
            connections: BTreeMap::new(),
            next_connection: 0,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Fire `signal` on `proxy`. Returns how many handlers ran.
    pub fn emit(&mut self, proxy: u64, signal: &str, args: &[Value]) -> usize {
        let mut fired = 0;
        for conn in self.connections.values_mut() {
            if conn.proxy == proxy && conn.signal == signal {
                (conn.handler)(args);
                fired += 1;
            }
        }
        log::debug!("Emitted `{}` on proxy {} to {} handlers", signal, proxy, fired);
        fired
    }

    fn emit_record(&mut self, rec: &Record) -> Value {
        let proxy = rec.get("proxy").and_then(Value::as_proxy);
        let signal = rec.get("signal").and_then(Value::as_str);
        let (Some(proxy), Some(signal)) = (proxy, signal) else {
            log::warn!("Emit request needs `proxy` and `signal` fields");
            return Value::Bool(false);
        };
        let signal = signal.to_string();
        let args = rec
            .get("args")
            .and_then(Value::as_seq)
            .map(<[Value]>::to_vec)
            .unwrap_or_default();
        Value::Bool(self.emit(proxy, &signal, &args) > 0)
    }
}

impl GlueService for CatalogService {
    fn describe_enum(&mut self, name: &str) -> Option<EnumDescriptor> {
        self.catalog.enum_descriptor(name)
    }

    fn describe_iface(&mut self, iface: &str) -> Option<IfaceDescriptor> {
        self.catalog.iface_descriptor(iface)
    }

    fn describe_prop(&mut self, proxy: u64, prop_name: &str) -> Option<PropDescriptor> {
        let iface = self.catalog.proxies.get(&proxy)?;
        self.catalog.find_property(iface, prop_name).cloned()
    }

    fn describe_proc(&mut self, proc_name: &str) -> Option<ProcDescriptor> {
        self.catalog.proc_descriptor(proc_name)
    }

    fn list_proc_names(&mut self) -> Vec<String> {
        self.catalog.procs.keys().cloned().collect()
    }

    fn list_method_names(&mut self, iface: &str) -> Vec<String> {
        self.catalog
            .ifaces
            .get(iface)
            .map(|spec| spec.methods.clone())
            .unwrap_or_default()
    }

    fn base_iface(&mut self) -> String {
        self.catalog.base.clone()
    }

    fn iface_children(&mut self, iface: &str) -> Vec<String> {
        self.catalog.children(iface)
    }

    fn proxy_iface(&mut self, proxy: u64) -> Option<String> {
        self.catalog.proxies.get(&proxy).cloned()
    }

    fn exec(&mut self, proc_name: &str, args: Vec<Value>) -> Value {
        let Some(spec) = self.catalog.procs.get(proc_name) else {
            log::warn!("Exec of unknown proc `{}`", proc_name);
            return Value::None;
        };
        if args.len() != spec.params.len() {
            log::debug!(
                "Proc `{}` takes {} args, got {}",
                proc_name,
                spec.params.len(),
                args.len()
            );
        }
        spec.result.clone().unwrap_or_default()
    }

    fn connect_signal(
        &mut self,
        signal: &str,
        proxy: u64,
        on_fire: SignalHandler,
    ) -> Option<ConnectionId> {
        let iface = self.catalog.proxies.get(&proxy)?;
        if !self.catalog.declares_signal(iface, signal) {
            log::warn!("Iface `{}` has no signal `{}`", iface, signal);
            return None;
        }
        self.next_connection += 1;
        let id = ConnectionId::new(self.next_connection)?;
        self.connections.insert(
            id,
            Connection {
                proxy,
                signal: signal.to_string(),
                handler: on_fire,
            },
        );
        Some(id)
    }

    fn disconnect_signal(&mut self, signal: &str, proxy: u64, id: ConnectionId) {
        match self.connections.remove(&id) {
            Some(conn) if conn.proxy == proxy && conn.signal == signal => {}
            Some(conn) => log::warn!(
                "Connection {} belonged to `{}` on proxy {}",
                id.get(),
                conn.signal,
                conn.proxy
            ),
            None => log::warn!("Unknown connection {} for `{}`", id.get(), signal),
        }
    }

    fn default_client_msg(&mut self, message: Option<&str>, value: &Value) -> Option<Value> {
        match message? {
            "ping" => Some(Value::string("pong")),
            "emit" => Some(match value.as_rec() {
                Some(rec) => self.emit_record(rec),
                None => Value::Bool(false),
            }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::SAMPLE;
    use std::sync::{Arc, Mutex};

    fn service() -> CatalogService {
        CatalogService::new(Catalog::from_yaml(SAMPLE).unwrap())
    }

    fn recorder() -> (Arc<Mutex<Vec<Vec<Value>>>>, SignalHandler) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let handler: SignalHandler = Box::new(move |args: &[Value]| {
            sink.lock().unwrap().push(args.to_vec());
        });
        (seen, handler)
    }

    #[test]
    fn test_describe_prop_via_proxy() {
        let mut s = service();
        let prop = s.describe_prop(2, "volume").unwrap();
        assert_eq!(prop.group.as_deref(), Some("Mixer"));
        assert!(s.describe_prop(99, "volume").is_none());
    }

    #[test]
    fn test_exec_returns_configured_result() {
        let mut s = service();
        assert_eq!(s.exec("echo", vec![Value::string("x")]), Value::string("hello"));
        assert_eq!(s.exec("stop", vec![]), Value::None);
        assert_eq!(s.exec("missing", vec![]), Value::None);
    }

    #[test]
    fn test_connect_requires_declared_signal() {
        let mut s = service();
        let (_, handler) = recorder();
        assert!(s.connect_signal("changed", 1, handler).is_some());
        let (_, handler) = recorder();
        assert!(s.connect_signal("bogus", 1, handler).is_none());
        let (_, handler) = recorder();
        assert!(s.connect_signal("changed", 42, handler).is_none());
        assert_eq!(s.connection_count(), 1);
    }

    #[test]
    fn test_emit_and_disconnect() {
        let mut s = service();
        let (seen, handler) = recorder();
        let id = s.connect_signal("notify", 2, handler).unwrap();
        assert_eq!(s.emit(2, "notify", &[Value::Int(1)]), 1);
        assert_eq!(s.emit(1, "notify", &[]), 0);
        s.disconnect_signal("notify", 2, id);
        assert_eq!(s.emit(2, "notify", &[]), 0);
        assert_eq!(seen.lock().unwrap().clone(), vec![vec![Value::Int(1)]]);
    }

    #[test]
    fn test_client_messages() {
        let mut s = service();
        assert_eq!(
            s.default_client_msg(Some("ping"), &Value::None),
            Some(Value::string("pong"))
        );
        assert_eq!(s.default_client_msg(None, &Value::None), None);
        assert_eq!(s.default_client_msg(Some("other"), &Value::None), None);

        let (seen, handler) = recorder();
        s.connect_signal("changed", 1, handler).unwrap();
        let request = Value::Rec(
            Record::new()
                .with("proxy", Value::Proxy(1))
                .with("signal", Value::string("changed"))
                .with("args", Value::Seq(vec![Value::Bool(true)])),
        );
        assert_eq!(
            s.default_client_msg(Some("emit"), &request),
            Some(Value::Bool(true))
        );
        assert_eq!(seen.lock().unwrap().len(), 1);
        assert_eq!(
            s.default_client_msg(Some("emit"), &Value::None),
            Some(Value::Bool(false))
        );
    }
}
