//! Circuit breaker guarding the text-generation endpoint

use super::generator::GenerationError;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    Closed,
    Open,
    /// Reset window elapsed; the next call is a probe
    HalfOpen,
}

#[derive(Debug, Clone)]
struct Circuit {
    state: BreakerState,
    consecutive_failures: usize,
    opened_at: Option<Instant>,
}

impl Default for Circuit {
    fn default() -> Self {
        Self {
            state: BreakerState::Closed,
            consecutive_failures: 0,
            opened_at: None,
        }
    }
}

/// Per-operation breaker. Opens after `failure_threshold` consecutive
/// failures and lets one probe through after `reset_after`.
pub struct CircuitBreaker {
    failure_threshold: usize,
    reset_after: Duration,
    circuits: Mutex<HashMap<String, Circuit>>,
}

impl CircuitBreaker {
    pub fn new(failure_threshold: usize, reset_after: Duration) -> Self {
        Self {
            failure_threshold: failure_threshold.max(1),
            reset_after,
            circuits: Mutex::new(HashMap::new()),
        }
    }

    fn circuits(&self) -> MutexGuard<'_, HashMap<String, Circuit>> {
        self.circuits.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Fail fast with `CircuitOpen` while the circuit is open
    pub fn check(&self, operation: &str) -> Result<(), GenerationError> {
        let mut circuits = self.circuits();
        let circuit = circuits.entry(operation.to_string()).or_default();

        if circuit.state == BreakerState::Open {
            let elapsed = circuit.opened_at.map(|t| t.elapsed()).unwrap_or_default();
            if elapsed < self.reset_after {
                return Err(GenerationError::CircuitOpen(operation.to_string()));
            }
            circuit.state = BreakerState::HalfOpen;
        }
        Ok(())
    }

    pub fn record_success(&self, operation: &str) {
        let mut circuits = self.circuits();
        circuits.insert(operation.to_string(), Circuit::default());
    }

    pub fn record_failure(&self, operation: &str) {
        let mut circuits = self.circuits();
        let circuit = circuits.entry(operation.to_string()).or_default();
        circuit.consecutive_failures += 1;

        let trip = circuit.state == BreakerState::HalfOpen
            || circuit.consecutive_failures >= self.failure_threshold;
        if trip {
            circuit.state = BreakerState::Open;
            circuit.opened_at = Some(Instant::now());
        }
    }

    pub fn state(&self, operation: &str) -> BreakerState {
        self.circuits()
            .get(operation)
            .map(|c| c.state)
            .unwrap_or(BreakerState::Closed)
    }

    pub fn failures(&self, operation: &str) -> usize {
        self.circuits()
            .get(operation)
            .map(|c| c.consecutive_failures)
            .unwrap_or(0)
    }
}
