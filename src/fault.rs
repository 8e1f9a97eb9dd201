//! Percentage-based error injection for resolvers
//!
//! Used to exercise gateway partial-failure handling and observability.

use rand::Rng;

use crate::{AccountsError, Result};

/// Injects synthetic resolver failures at a configured rate (0-100)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ErrorInjector {
    rate: f64,
}

impl ErrorInjector {
    /// Create an injector; the rate is clamped to 0..=100 and NaN disables it
    pub fn new(rate: f64) -> Self {
        let rate = if rate.is_nan() { 0.0 } else { rate.clamp(0.0, 100.0) };
        Self { rate }
    }

    pub fn disabled() -> Self {
        Self { rate: 0.0 }
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn should_inject(&self) -> bool {
        if self.rate <= 0.0 {
            return false;
        }
        if self.rate >= 100.0 {
            return true;
        }
        rand::thread_rng().gen_range(0.0..100.0) < self.rate
    }

    /// Fail with `message` when an injection is drawn
    pub fn check(&self, message: &str) -> Result<()> {
        if self.should_inject() {
            tracing::debug!(rate = self.rate, reason = message, "injecting resolver error");
            return Err(AccountsError::Injected(message.to_string()));
        }
        Ok(())
    }
}

impl Default for ErrorInjector {
    fn default() -> Self {
        Self::disabled()
    }
}
