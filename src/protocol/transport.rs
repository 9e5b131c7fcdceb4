//! In-process transport: a caller talking straight to a responder.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use super::responder::Responder;
use super::service::{GlueService, NotificationSink, Transport};

/// Notification sink that buffers pushed events until drained.
#[derive(Debug, Default)]
pub struct QueueSink {
    queue: Mutex<VecDeque<String>>,
}

impl QueueSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drain(&self) -> Vec<String> {
        let mut queue = self.queue.lock().unwrap_or_else(PoisonError::into_inner);
        queue.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl NotificationSink for QueueSink {
    fn push(&self, event_text: &str) {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(event_text.to_string());
    }
}

/// Transport that hands each request directly to an owned responder.
pub struct LoopbackTransport<S: GlueService> {
    responder: Responder<S>,
    sink: Arc<QueueSink>,
}

impl<S: GlueService> LoopbackTransport<S> {
    pub fn new(service: S) -> Self {
        let sink = Arc::new(QueueSink::new());
        let responder = Responder::new(service, sink.clone());
        Self { responder, sink }
    }

    /// Wrap an already configured responder whose pushes go to `sink`.
    pub fn with_responder(responder: Responder<S>, sink: Arc<QueueSink>) -> Self {
        Self { responder, sink }
    }

    pub fn responder(&self) -> &Responder<S> {
        &self.responder
    }

    pub fn responder_mut(&mut self) -> &mut Responder<S> {
        &mut self.responder
    }
}

impl<S: GlueService> Transport for LoopbackTransport<S> {
    fn send(&mut self, request: &str) -> Option<String> {
        Some(self.responder.process(request))
    }

    fn drain_notifications(&mut self) -> Vec<String> {
        self.sink.drain()
    }
}
