//! Deterministic in-process oracle.
//!
//! Replies come from a caller-supplied closure, so tests can script every
//! decision. Calls are counted and recorded; an optional latency simulates
//! a slow endpoint.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::{DecisionOracle, OracleError, OracleRequest};

type Responder = dyn Fn(&OracleRequest) -> Result<String, OracleError> + Send + Sync;

pub struct ScriptedOracle {
    name: String,
    responder: Box<Responder>,
    latency: Option<Duration>,
    calls: AtomicU32,
    requests: Mutex<Vec<OracleRequest>>,
}

impl ScriptedOracle {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&OracleRequest) -> Result<String, OracleError> + Send + Sync + 'static,
    {
        Self {
            name: "scripted".to_string(),
            responder: Box::new(responder),
            latency: None,
            calls: AtomicU32::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Always reply with the same text.
    pub fn constant(reply: &str) -> Self {
        let reply = reply.to_string();
        Self::new(move |_| Ok(reply.clone()))
    }

    /// Always fail with a request error.
    pub fn failing() -> Self {
        let mut oracle = Self::new(|_| Err(OracleError::RequestFailed("simulated outage".into())));
        oracle.name = "scripted-fail".to_string();
        oracle
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// Sleep this long before every reply.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Copies of every request received so far.
    pub fn requests(&self) -> Vec<OracleRequest> {
        match self.requests.lock() {
            Ok(log) => log.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait]
impl DecisionOracle for ScriptedOracle {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, request: &OracleRequest) -> Result<String, OracleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.requests.lock() {
            Ok(mut log) => log.push(request.clone()),
            Err(poisoned) => poisoned.into_inner().push(request.clone()),
        }
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        (self.responder)(request)
    }
}
