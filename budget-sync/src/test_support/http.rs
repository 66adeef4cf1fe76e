//! Transport doubles: scripted executor, sleepers, and jitter.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;
use tokio::time::Instant;

use crate::outbound::http::{
    BackoffJitter, HttpExecutor, OutgoingRequest, RawResponse, RetrySleeper, TransportError,
};

type Scripted = Result<RawResponse, TransportError>;

/// Executor that replays scripted outcomes and records every request.
///
/// Once the script runs dry the fallback outcome (if any) repeats.
#[derive(Default)]
pub struct ScriptedExecutor {
    script: Mutex<VecDeque<Scripted>>,
    fallback: Option<Scripted>,
    gate: Option<Arc<Notify>>,
    delay: Option<Duration>,
    requests: Mutex<Vec<(Instant, OutgoingRequest)>>,
}

impl ScriptedExecutor {
    pub fn new(script: impl IntoIterator<Item = Scripted>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            ..Self::default()
        }
    }

    /// Executor that answers every request the same way.
    pub fn always(outcome: Scripted) -> Self {
        Self {
            fallback: Some(outcome),
            ..Self::default()
        }
    }

    /// Hold every request until `gate` is notified.
    #[must_use]
    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Take `delay` of (Tokio) time to answer.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.lock_requests().len()
    }

    pub fn requests(&self) -> Vec<OutgoingRequest> {
        self.lock_requests()
            .iter()
            .map(|(_, request)| request.clone())
            .collect()
    }

    /// Tokio instants at which each request arrived.
    pub fn arrival_times(&self) -> Vec<Instant> {
        self.lock_requests().iter().map(|(at, _)| *at).collect()
    }

    fn lock_requests(&self) -> std::sync::MutexGuard<'_, Vec<(Instant, OutgoingRequest)>> {
        match self.requests.lock() {
            Ok(guard) => guard,
            Err(_) => panic!("requests mutex"),
        }
    }

    fn next_outcome(&self) -> Scripted {
        let scripted = match self.script.lock() {
            Ok(mut script) => script.pop_front(),
            Err(_) => panic!("script mutex"),
        };
        scripted
            .or_else(|| self.fallback.clone())
            .unwrap_or_else(|| Err(TransportError::network("script exhausted")))
    }
}

#[async_trait]
impl HttpExecutor for ScriptedExecutor {
    async fn execute(&self, request: OutgoingRequest) -> Result<RawResponse, TransportError> {
        self.lock_requests().push((Instant::now(), request));
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.next_outcome()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ImmediateSleeper;

#[async_trait]
impl RetrySleeper for ImmediateSleeper {
    async fn sleep(&self, _duration: Duration) {}
}

#[derive(Default)]
pub struct RecordingSleeper(pub Mutex<Vec<Duration>>);

impl RecordingSleeper {
    pub fn recorded(&self) -> Vec<Duration> {
        match self.0.lock() {
            Ok(entries) => entries.clone(),
            Err(_) => panic!("sleeper mutex"),
        }
    }
}

#[async_trait]
impl RetrySleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        let mut entries = match self.0.lock() {
            Ok(entries) => entries,
            Err(_) => panic!("sleeper mutex"),
        };
        entries.push(duration);
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoJitter;

impl BackoffJitter for NoJitter {
    fn jittered_delay(&self, base: Duration, _retry: u32) -> Duration {
        base
    }
}
