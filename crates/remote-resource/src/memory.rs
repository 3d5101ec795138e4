//! Scripted in-memory transport.
//!
//! Used by tests across the workspace. Routes are matched on exact
//! `(method, path)`. A [`Gate`] parks the next call to a route until
//! released, which lets tests control the order in which concurrent
//! requests complete.

use async_trait::async_trait;
use portal_types::TransportError;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

use crate::transport::{Method, Transport, TransportRequest, TransportResponse};

type Responder =
    Arc<dyn Fn(&TransportRequest) -> Result<Value, TransportError> + Send + Sync + 'static>;

type RouteKey = (Method, String);

/// Releases one parked request.
#[derive(Debug)]
pub struct Gate {
    sender: oneshot::Sender<()>,
}

impl Gate {
    /// Lets the parked request continue to its responder.
    pub fn release(self) {
        let _ = self.sender.send(());
    }
}

#[derive(Default)]
struct State {
    responders: HashMap<RouteKey, Responder>,
    gates: HashMap<RouteKey, VecDeque<oneshot::Receiver<()>>>,
    calls: Vec<TransportRequest>,
}

/// Transport answering from an in-memory route table.
#[derive(Default)]
pub struct InMemoryTransport {
    state: Mutex<State>,
}

impl InMemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers every call to the route with `data`.
    pub fn respond(&self, method: Method, path: &str, data: Value) {
        self.respond_with(method, path, move |_| Ok(data.clone()));
    }

    /// Answers every call to the route with `error`.
    pub fn fail(&self, method: Method, path: &str, error: TransportError) {
        self.respond_with(method, path, move |_| Err(error.clone()));
    }

    /// Answers calls to the route by invoking `responder`.
    ///
    /// The responder runs after any gate is released, so it observes
    /// state changed while the request was parked.
    pub fn respond_with<F>(&self, method: Method, path: &str, responder: F)
    where
        F: Fn(&TransportRequest) -> Result<Value, TransportError> + Send + Sync + 'static,
    {
        let mut state = self.state.lock().expect("lock poisoned");
        state
            .responders
            .insert((method, path.to_string()), Arc::new(responder));
    }

    /// Parks the next not-yet-parked call to the route until the gate is released.
    ///
    /// Gates queue: calling `hold` twice parks the next two calls, released
    /// independently.
    pub fn hold(&self, method: Method, path: &str) -> Gate {
        let (sender, receiver) = oneshot::channel();
        let mut state = self.state.lock().expect("lock poisoned");
        state
            .gates
            .entry((method, path.to_string()))
            .or_default()
            .push_back(receiver);
        Gate { sender }
    }

    /// All requests received so far, in arrival order.
    pub fn calls(&self) -> Vec<TransportRequest> {
        self.state.lock().expect("lock poisoned").calls.clone()
    }

    /// Number of requests received for the route.
    pub fn call_count(&self, method: Method, path: &str) -> usize {
        self.state
            .lock()
            .expect("lock poisoned")
            .calls
            .iter()
            .filter(|c| c.method == method && c.path == path)
            .count()
    }
}

#[async_trait]
impl Transport for InMemoryTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        let route = (request.method, request.path.clone());
        let gate = {
            let mut state = self.state.lock().expect("lock poisoned");
            state.calls.push(request.clone());
            state.gates.get_mut(&route).and_then(VecDeque::pop_front)
        };

        if let Some(gate) = gate {
            // A dropped gate releases the request as well.
            let _ = gate.await;
        }

        let responder = {
            let state = self.state.lock().expect("lock poisoned");
            state.responders.get(&route).cloned()
        };

        match responder {
            Some(responder) => responder(&request).map(TransportResponse::ok),
            None => Err(TransportError::http(
                404,
                format!("no handler for {} {}", request.method, request.path),
            )),
        }
    }
}
