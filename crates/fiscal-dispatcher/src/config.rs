//! Process-wide dispatcher knobs.

use std::time::Duration;

use rust_decimal::Decimal;

/// Retry, routing, and timeout configuration shared by the dispatcher and
/// its workers. One instance per process; per-tenant settings live in
/// `TenantConfig`.
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Natural-person invoices above this grand total upgrade to wholesale.
    pub wholesale_threshold: Decimal,
    /// Cap on send attempts per request, counting the first.
    pub max_attempts: u32,
    /// Backoff schedule between transport-error retries. The last entry
    /// repeats when attempts outnumber entries.
    pub backoff: Vec<Duration>,
    /// Outbound send deadline.
    pub request_timeout: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            wholesale_threshold: Decimal::from(3000),
            max_attempts: 5,
            backoff: vec![
                Duration::from_secs(1),
                Duration::from_secs(5),
                Duration::from_secs(30),
                Duration::from_secs(300),
                Duration::from_secs(1800),
            ],
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl DispatcherConfig {
    /// Delay before the retry following attempt number `attempt` (1-based).
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        if self.backoff.is_empty() {
            return Duration::ZERO;
        }
        let index = (attempt.saturating_sub(1) as usize).min(self.backoff.len() - 1);
        self.backoff[index]
    }
}
