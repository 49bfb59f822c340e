//! # Outbound Ports
//!
//! What the adapters require from the outside world: a wire transport and a
//! time source. Both come with deterministic implementations so the full
//! pipeline can run in tests without a network or a wall clock.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fiscal_types::FiscalError;

use crate::domain::entities::{RawResponse, WireRequest};

/// Sends one prepared request to the provider endpoint.
///
/// A transport never retries; retry scheduling belongs to the dispatcher.
/// Timeouts and non-2xx statuses surface as [`FiscalError::Transport`].
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: WireRequest) -> Result<RawResponse, FiscalError>;
}

/// Time source injected wherever a payload or token carries a timestamp.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Frozen time source for deterministic payloads and tokens.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
