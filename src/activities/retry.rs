// Retry policy and backoff schedule for remote task invocation

use std::time::Duration;

use crate::error::ConfigError;

/// Immutable retry policy, validated at construction
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    initial_interval: Duration,
    backoff_coefficient: f64,
    maximum_interval: Duration,
    maximum_attempts: Option<u32>,
}

impl RetryPolicy {
    pub fn new(
        initial_interval: Duration,
        backoff_coefficient: f64,
        maximum_interval: Duration,
    ) -> Result<Self, ConfigError> {
        if initial_interval.is_zero() {
            return Err(ConfigError::NonPositiveDuration {
                field: "initial_interval",
            });
        }
        if maximum_interval.is_zero() {
            return Err(ConfigError::NonPositiveDuration {
                field: "maximum_interval",
            });
        }
        if !backoff_coefficient.is_finite() || backoff_coefficient < 1.0 {
            return Err(ConfigError::InvalidBackoffCoefficient(backoff_coefficient));
        }
        if maximum_interval < initial_interval {
            return Err(ConfigError::MaximumBelowInitial {
                initial: initial_interval,
                maximum: maximum_interval,
            });
        }

        Ok(Self {
            initial_interval,
            backoff_coefficient,
            maximum_interval,
            maximum_attempts: None,
        })
    }

    /// Caps the number of attempts; zero means unlimited
    pub fn with_maximum_attempts(mut self, attempts: u32) -> Self {
        self.maximum_attempts = (attempts > 0).then_some(attempts);
        self
    }

    pub fn initial_interval(&self) -> Duration {
        self.initial_interval
    }

    pub fn backoff_coefficient(&self) -> f64 {
        self.backoff_coefficient
    }

    pub fn maximum_interval(&self) -> Duration {
        self.maximum_interval
    }

    pub fn maximum_attempts(&self) -> Option<u32> {
        self.maximum_attempts
    }

    /// Fresh delay schedule for one invocation
    pub fn backoff(&self) -> Backoff {
        Backoff {
            next: self.initial_interval,
            coefficient: self.backoff_coefficient,
            maximum: self.maximum_interval,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_secs(1),
            backoff_coefficient: 2.0,
            maximum_interval: Duration::from_secs(30),
            maximum_attempts: None,
        }
    }
}

/// Exponential delay sequence, non-decreasing and capped at the maximum interval
#[derive(Debug, Clone)]
pub struct Backoff {
    next: Duration,
    coefficient: f64,
    maximum: Duration,
}

impl Iterator for Backoff {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        let current = self.next;
        self.next = Duration::try_from_secs_f64(current.as_secs_f64() * self.coefficient)
            .unwrap_or(self.maximum)
            .min(self.maximum);
        Some(current)
    }
}

/// Options attached to a single remote task invocation
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityOptions {
    start_to_close_timeout: Duration,
    retry_policy: RetryPolicy,
}

impl ActivityOptions {
    pub fn new(start_to_close_timeout: Duration, retry_policy: RetryPolicy) -> Result<Self, ConfigError> {
        if start_to_close_timeout.is_zero() {
            return Err(ConfigError::NonPositiveDuration {
                field: "start_to_close_timeout",
            });
        }
        Ok(Self {
            start_to_close_timeout,
            retry_policy,
        })
    }

    pub fn start_to_close_timeout(&self) -> Duration {
        self.start_to_close_timeout
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }
}

impl Default for ActivityOptions {
    fn default() -> Self {
        Self {
            start_to_close_timeout: Duration::from_secs(5),
            retry_policy: RetryPolicy::default(),
        }
    }
}
