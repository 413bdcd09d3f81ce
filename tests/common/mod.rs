//! Shared utilities for lifecycle integration tests.

#![allow(dead_code)]

use std::fmt;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{routing::get, Router};
use service_lifecycle::{BoxError, DependencyContainer, Logger};

/// Ordered record of everything the service and its collaborators did.
pub type Events = Arc<Mutex<Vec<String>>>;

pub fn events() -> Events {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn snapshot(events: &Events) -> Vec<String> {
    events.lock().unwrap().clone()
}

/// Logger that appends `INFO …` / `ERROR …` lines to the shared events.
pub struct RecordingLogger {
    events: Events,
}

impl RecordingLogger {
    pub fn new(events: Events) -> Self {
        Self { events }
    }
}

impl Logger for RecordingLogger {
    fn info(&self, args: fmt::Arguments<'_>) {
        self.events.lock().unwrap().push(format!("INFO {}", args));
    }

    fn error(&self, args: fmt::Arguments<'_>) {
        self.events.lock().unwrap().push(format!("ERROR {}", args));
    }
}

/// Container that records its shutdown and, optionally, fails it.
pub struct RecordingContainer {
    events: Events,
    calls: AtomicUsize,
    failure: Option<&'static str>,
    probe: Option<SocketAddr>,
}

impl RecordingContainer {
    pub fn new(events: Events) -> Self {
        Self {
            events,
            calls: AtomicUsize::new(0),
            failure: None,
            probe: None,
        }
    }

    /// Fail shutdown with `message`.
    pub fn failing(mut self, message: &'static str) -> Self {
        self.failure = Some(message);
        self
    }

    /// On shutdown, record whether `addr` still accepts connections.
    pub fn probing(mut self, addr: SocketAddr) -> Self {
        self.probe = Some(addr);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl DependencyContainer for RecordingContainer {
    fn shutdown(&self) -> Result<(), BoxError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let event = match self.probe {
            Some(addr) => {
                let open =
                    std::net::TcpStream::connect_timeout(&addr, Duration::from_millis(200)).is_ok();
                let state = if open { "listener open" } else { "listener closed" };
                format!("CONTAINER shutdown ({})", state)
            }
            None => "CONTAINER shutdown".to_string(),
        };
        self.events.lock().unwrap().push(event);

        match self.failure {
            Some(message) => Err(message.into()),
            None => Ok(()),
        }
    }
}

/// Router with a cheap root route.
pub fn ok_router() -> Router {
    Router::new().route("/", get(|| async { "ok" }))
}

/// Wait until something accepts TCP connections on `addr`.
pub async fn wait_for_listener(addr: SocketAddr) {
    for _ in 0..250 {
        if tokio::net::TcpStream::connect(addr).await.is_ok() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("nothing listening on {}", addr);
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
