//! Bounded polling for asynchronous remote state transitions.
//!
//! Remote provisioning and termination complete asynchronously and send no
//! notification, so the only way to observe completion is to poll. The loop
//! here retries exactly one thing: a refresh that reports a non-target
//! state. A refresh that fails stops the loop immediately; callers that
//! want transport retries must wrap their refresh themselves.

use crate::error::{Error, Result};
use crate::types::PollConfig;
use std::fmt;
use std::thread;
use std::time::Instant;

/// Poll `refresh` on a fixed cadence until it reports `target`.
///
/// `refresh` performs one remote lookup and classifies the result into a
/// state label plus, when available, the observation itself. The loop ends:
///
/// - successfully, the first time `refresh` reports `target` (a refresh
///   that reports it immediately returns without any sleep),
/// - with the refresh's own error as soon as one occurs, or
/// - with [`Error::Timeout`] once the total elapsed time exceeds
///   `config.timeout`.
pub fn wait_for<T, L, F>(mut refresh: F, target: L, config: &PollConfig) -> Result<T>
where
    L: PartialEq + fmt::Display,
    F: FnMut() -> Result<(Option<T>, L)>,
{
    let started = Instant::now();
    if !config.initial_delay.is_zero() {
        thread::sleep(config.initial_delay);
    }

    loop {
        let (observation, label) = refresh()?;
        if label == target {
            return observation.ok_or_else(|| {
                Error::Other(format!(
                    "refresh reported target state {target} without an observation"
                ))
            });
        }

        log::debug!("state is {label}, waiting for {target}");
        if started.elapsed() >= config.timeout {
            return Err(Error::Timeout {
                target: target.to_string(),
                waited: started.elapsed(),
            });
        }
        thread::sleep(config.interval);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::time::Duration;

    fn fast_config() -> PollConfig {
        PollConfig {
            timeout: Duration::from_millis(50),
            interval: Duration::from_millis(5),
            initial_delay: Duration::ZERO,
        }
    }

    #[test]
    fn test_immediate_target_returns_on_first_attempt() {
        let attempts = Cell::new(0u32);
        let started = Instant::now();
        // Interval long enough that any sleep would be visible.
        let config = PollConfig {
            timeout: Duration::from_secs(5),
            interval: Duration::from_secs(5),
            initial_delay: Duration::ZERO,
        };

        let result = wait_for(
            || {
                attempts.set(attempts.get() + 1);
                Ok((Some(42), "running"))
            },
            "running",
            &config,
        );

        assert_eq!(result.unwrap(), 42);
        assert_eq!(attempts.get(), 1);
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_reaches_target_after_pending_attempts() {
        let attempts = Cell::new(0u32);

        let result = wait_for(
            || {
                attempts.set(attempts.get() + 1);
                if attempts.get() < 3 {
                    Ok((None, "pending"))
                } else {
                    Ok((Some("done"), "running"))
                }
            },
            "running",
            &fast_config(),
        );

        assert_eq!(result.unwrap(), "done");
        assert_eq!(attempts.get(), 3);
    }

    #[test]
    fn test_times_out_when_target_never_arrives() {
        let attempts = Cell::new(0u32);

        let result: Result<()> = wait_for(
            || {
                attempts.set(attempts.get() + 1);
                Ok((None, "pending"))
            },
            "running",
            &fast_config(),
        );

        assert!(result.unwrap_err().is_timeout());
        assert!(attempts.get() > 1);
    }

    #[test]
    fn test_refresh_error_stops_immediately() {
        let attempts = Cell::new(0u32);

        let result: Result<()> = wait_for(
            || {
                attempts.set(attempts.get() + 1);
                if attempts.get() < 3 {
                    Ok((None, "pending"))
                } else {
                    Err(Error::remote("one.vm.info", "connection refused"))
                }
            },
            "running",
            &fast_config(),
        );

        let err = result.unwrap_err();
        assert!(matches!(err, Error::Remote { .. }));
        // No further attempts after the failing one.
        assert_eq!(attempts.get(), 3);
    }

    #[test]
    fn test_target_without_observation_is_an_error() {
        let result: Result<()> = wait_for(|| Ok((None, "running")), "running", &fast_config());
        assert!(matches!(result.unwrap_err(), Error::Other(_)));
    }

    #[test]
    fn test_initial_delay_is_respected() {
        let config = PollConfig {
            timeout: Duration::from_millis(100),
            interval: Duration::from_millis(5),
            initial_delay: Duration::from_millis(20),
        };
        let started = Instant::now();
        let result = wait_for(|| Ok((Some(()), "running")), "running", &config);
        assert!(result.is_ok());
        assert!(started.elapsed() >= Duration::from_millis(20));
    }
}
