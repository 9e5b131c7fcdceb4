//! Responder-side signal subscriptions.
//!
//! Each `(proxy, signal)` pair is subscribed at most once. Enabling twice is
//! a no-op that still reports success; disabling tears the connection down
//! and pushes one last event with `connected = false`.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::command::SignalEvent;
use super::service::{ConnectionId, GlueService, NotificationSink, SignalHandler};
use crate::codec::{Encode, Value};

/// An active connection between a proxy's signal and the notification sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    pub proxy: u64,
    pub signal_name: String,
    pub connection_id: ConnectionId,
}

#[derive(Debug, Default)]
pub struct SignalRegistry {
    subscriptions: BTreeMap<(u64, String), Subscription>,
}

impl SignalRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    pub fn contains(&self, proxy: u64, signal: &str) -> bool {
        self.subscriptions.contains_key(&(proxy, signal.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Subscription> {
        self.subscriptions.values()
    }

    /// Enable or disable a subscription. Returns the reply for the caller:
    /// `true` only when the subscription is active afterwards.
    pub fn set_connection<S: GlueService + ?Sized>(
        &mut self,
        service: &mut S,
        sink: &Arc<dyn NotificationSink>,
        proxy: u64,
        signal: &str,
        enable: bool,
    ) -> bool {
        if proxy == 0 {
            log::warn!("Rejecting signal connection for `{}` on null proxy", signal);
            return false;
        }

        let key = (proxy, signal.to_string());
        match (self.subscriptions.contains_key(&key), enable) {
            (true, true) => {
                log::info!("Signal `{}` on proxy {} is already connected", signal, proxy);
                true
            }
            (false, true) => {
                let handler = event_forwarder(Arc::clone(sink), signal, proxy);
                match service.connect_signal(signal, proxy, handler) {
                    Some(connection_id) => {
                        log::debug!(
                            "Connected signal `{}` on proxy {} (connection {})",
                            signal,
                            proxy,
                            connection_id.get()
                        );
                        self.subscriptions.insert(
                            key,
                            Subscription {
                                proxy,
                                signal_name: signal.to_string(),
                                connection_id,
                            },
                        );
                        true
                    }
                    None => {
                        log::warn!("Failed to connect signal `{}` on proxy {}", signal, proxy);
                        false
                    }
                }
            }
            (false, false) => {
                log::info!("Signal `{}` on proxy {} is already disabled", signal, proxy);
                false
            }
            (true, false) => {
                if let Some(sub) = self.subscriptions.remove(&key) {
                    teardown(service, sink, sub);
                }
                false
            }
        }
    }

    /// Disable every remaining subscription.
    pub fn disable_all<S: GlueService + ?Sized>(
        &mut self,
        service: &mut S,
        sink: &Arc<dyn NotificationSink>,
    ) {
        let subscriptions = std::mem::take(&mut self.subscriptions);
        if !subscriptions.is_empty() {
            log::debug!("Disabling {} signal subscriptions", subscriptions.len());
        }
        for sub in subscriptions.into_values() {
            teardown(service, sink, sub);
        }
    }
}

fn event_forwarder(sink: Arc<dyn NotificationSink>, signal: &str, proxy: u64) -> SignalHandler {
    let signal = signal.to_string();
    Box::new(move |args: &[Value]| {
        let event = SignalEvent {
            signal: signal.clone(),
            proxy,
            args: args.to_vec(),
            connected: true,
        };
        sink.push(&event.encode());
    })
}

fn teardown<S: GlueService + ?Sized>(
    service: &mut S,
    sink: &Arc<dyn NotificationSink>,
    sub: Subscription,
) {
    service.disconnect_signal(&sub.signal_name, sub.proxy, sub.connection_id);
    log::debug!("Disconnected signal `{}` on proxy {}", sub.signal_name, sub.proxy);
    let event = SignalEvent {
        signal: sub.signal_name,
        proxy: sub.proxy,
        args: vec![Value::Proxy(sub.proxy)],
        connected: false,
    };
    sink.push(&event.encode());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::testing::{RecordingService, RecordingSink};

    fn setup() -> (RecordingService, Arc<RecordingSink>, Arc<dyn NotificationSink>) {
        let sink = Arc::new(RecordingSink::default());
        let dyn_sink: Arc<dyn NotificationSink> = sink.clone();
        (RecordingService::default(), sink, dyn_sink)
    }

    #[test]
    fn test_null_proxy_rejected() {
        let (mut service, sink, dyn_sink) = setup();
        let mut registry = SignalRegistry::new();
        assert!(!registry.set_connection(&mut service, &dyn_sink, 0, "changed", true));
        assert!(registry.is_empty());
        assert_eq!(service.connects, 0);
        assert!(sink.events().is_empty());
    }

    #[test]
    fn test_enable_twice_is_idempotent() {
        let (mut service, _sink, dyn_sink) = setup();
        let mut registry = SignalRegistry::new();
        assert!(registry.set_connection(&mut service, &dyn_sink, 3, "changed", true));
        assert!(registry.set_connection(&mut service, &dyn_sink, 3, "changed", true));
        assert_eq!(registry.len(), 1);
        assert_eq!(service.connects, 1);
    }

    #[test]
    fn test_disable_emits_final_event() {
        let (mut service, sink, dyn_sink) = setup();
        let mut registry = SignalRegistry::new();
        registry.set_connection(&mut service, &dyn_sink, 3, "changed", true);
        assert!(!registry.set_connection(&mut service, &dyn_sink, 3, "changed", false));
        assert!(registry.is_empty());
        assert_eq!(service.disconnects, vec![("changed".to_string(), 3)]);
        assert_eq!(sink.events(), vec![r#"(1 "changed" 3 (7 (6 3)) 0)"#.to_string()]);
    }

    #[test]
    fn test_disable_absent_is_quiet() {
        let (mut service, sink, dyn_sink) = setup();
        let mut registry = SignalRegistry::new();
        assert!(!registry.set_connection(&mut service, &dyn_sink, 3, "changed", false));
        assert!(sink.events().is_empty());
        assert!(service.disconnects.is_empty());
    }

    #[test]
    fn test_failed_connect_leaves_no_record() {
        let (mut service, _sink, dyn_sink) = setup();
        service.refuse = true;
        let mut registry = SignalRegistry::new();
        assert!(!registry.set_connection(&mut service, &dyn_sink, 3, "changed", true));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_fired_handler_pushes_connected_event() {
        let (mut service, sink, dyn_sink) = setup();
        let mut registry = SignalRegistry::new();
        registry.set_connection(&mut service, &dyn_sink, 5, "notify", true);
        service.fire("notify", 5, &[Value::from(1)]);
        assert_eq!(sink.events(), vec![r#"(1 "notify" 5 (7 (2 1)) 1)"#.to_string()]);
    }

    #[test]
    fn test_disable_all() {
        let (mut service, sink, dyn_sink) = setup();
        let mut registry = SignalRegistry::new();
        registry.set_connection(&mut service, &dyn_sink, 1, "a", true);
        registry.set_connection(&mut service, &dyn_sink, 2, "b", true);
        registry.disable_all(&mut service, &dyn_sink);
        assert!(registry.is_empty());
        assert_eq!(service.disconnects.len(), 2);
        assert_eq!(sink.events().len(), 2);
    }
}
