//! Behavioural properties of the blocking executor.

use proptest::prelude::*;
use retry_executor::prelude::*;
use retry_executor::{Interrupted, RetryConfig};
use rstest::rstest;
use std::cell::RefCell;
use std::io;
use std::time::Duration;

#[derive(Default)]
struct RecordingSleeper {
    delays: RefCell<Vec<Duration>>,
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, delay: Duration) -> Result<(), Interrupted> {
        self.delays.borrow_mut().push(delay);
        Ok(())
    }
}

/// Fails the first `failures` calls, then returns the call number.
fn flaky(failures: u32) -> impl FnMut() -> Result<u32, io::Error> {
    let mut calls = 0;
    move || {
        calls += 1;
        if calls <= failures {
            Err(io::Error::other(format!("failure #{calls}")))
        } else {
            Ok(calls)
        }
    }
}

fn run(
    policy: RetryPolicy,
    failures: u32,
) -> (Result<u32, RetryError<io::Error>>, Vec<Duration>) {
    let sleeper = RecordingSleeper::default();
    let result = RetryExecutor::with_sleeper(policy, &sleeper).execute(flaky(failures));
    (result, sleeper.delays.into_inner())
}

proptest! {
    #[test]
    fn always_succeeding_operation_runs_once(
        max_attempts in 1u32..20,
        base_ms in 0u64..1000,
        exponential in any::<bool>(),
    ) {
        let policy = RetryPolicy::new(max_attempts, Duration::from_millis(base_ms), exponential);
        let (result, delays) = run(policy, 0);

        prop_assert_eq!(result.unwrap(), 1);
        prop_assert!(delays.is_empty());
    }

    #[test]
    fn always_failing_operation_uses_whole_budget(
        max_attempts in 1u32..20,
        base_ms in 1u64..1000,
        exponential in any::<bool>(),
    ) {
        let policy = RetryPolicy::new(max_attempts, Duration::from_millis(base_ms), exponential);
        let (result, delays) = run(policy, u32::MAX);

        let err = result.unwrap_err();
        prop_assert!(err.is_exhausted());
        prop_assert_eq!(err.attempts(), max_attempts);
        let expected_cause = format!("failure #{max_attempts}");
        prop_assert_eq!(err.cause().unwrap().to_string(), expected_cause);
        prop_assert_eq!(delays.len() as u32, max_attempts - 1);
    }

    #[test]
    fn recovers_after_k_failures(
        max_attempts in 2u32..20,
        failures_seed in 0u32..100,
        base_ms in 1u64..1000,
    ) {
        let failures = failures_seed % max_attempts;
        let policy = RetryPolicy::new(max_attempts, Duration::from_millis(base_ms), false);
        let (result, delays) = run(policy, failures);

        prop_assert_eq!(result.unwrap(), failures + 1);
        prop_assert_eq!(delays.len() as u32, failures);
        prop_assert!(delays.iter().all(|d| *d == Duration::from_millis(base_ms)));
    }

    #[test]
    fn exponential_delays_double(
        max_attempts in 2u32..12,
        base_ms in 1u64..1000,
    ) {
        let policy = RetryPolicy::new(max_attempts, Duration::from_millis(base_ms), true);
        let (_, delays) = run(policy, u32::MAX);

        for (retry, delay) in delays.iter().enumerate() {
            prop_assert_eq!(*delay, Duration::from_millis(base_ms) * 2u32.pow(retry as u32));
        }
    }

    #[test]
    fn non_positive_delay_never_sleeps(
        max_attempts in 1u32..20,
        base_ms in i64::MIN..=0,
        exponential in any::<bool>(),
    ) {
        let policy = RetryPolicy::builder()
            .max_attempts(max_attempts)
            .base_delay_millis(base_ms)
            .exponential(exponential)
            .build();
        let (_, delays) = run(policy, u32::MAX);

        prop_assert!(delays.is_empty());
    }
}

#[rstest]
#[case::constant(false, vec![100, 100])]
#[case::exponential(true, vec![100, 200])]
fn three_attempts_at_100ms(#[case] exponential: bool, #[case] expected_ms: Vec<u64>) {
    let policy = RetryPolicy::new(3, Duration::from_millis(100), exponential);
    let (result, delays) = run(policy, u32::MAX);

    let err = result.unwrap_err();
    assert_eq!(err.attempts(), 3);
    assert_eq!(err.cause().unwrap().to_string(), "failure #3");
    let expected: Vec<Duration> = expected_ms.into_iter().map(Duration::from_millis).collect();
    assert_eq!(delays, expected);
}

#[test]
fn fails_twice_then_returns_ok() {
    let sleeper = RecordingSleeper::default();
    let mut calls = 0;

    let value = Retry::new()
        .operation(|| {
            calls += 1;
            if calls < 3 {
                Err(io::Error::other("transient"))
            } else {
                Ok("ok")
            }
        })
        .max_attempts(3)
        .base_delay(Duration::from_millis(100))
        .exponential(false)
        .sleeper(&sleeper)
        .run()
        .unwrap();

    assert_eq!(value, "ok");
    assert_eq!(calls, 3);
    assert_eq!(
        sleeper.delays.into_inner(),
        vec![Duration::from_millis(100), Duration::from_millis(100)]
    );
}

#[test]
fn zero_attempts_never_calls_operation() {
    let mut calls = 0;
    let err = execute_with_retry(
        || {
            calls += 1;
            Ok::<_, io::Error>(())
        },
        0,
        Duration::from_millis(10),
        false,
    )
    .unwrap_err();

    assert!(err.is_invalid_argument());
    assert_eq!(calls, 0);

    let err = Retry::new()
        .operation(|| {
            calls += 1;
            Ok::<_, io::Error>(())
        })
        .max_attempts(0)
        .run()
        .unwrap_err();

    assert!(err.is_invalid_argument());
    assert_eq!(calls, 0);
}

#[test]
fn policy_loaded_from_config() {
    let config = RetryConfig::from_toml_str(
        r#"
        max_attempts = 4
        base_delay_ms = 25
        exponential = true
        "#,
    )
    .unwrap();

    let (result, delays) = run(config.into_policy(), u32::MAX);

    assert_eq!(result.unwrap_err().attempts(), 4);
    assert_eq!(
        delays,
        vec![
            Duration::from_millis(25),
            Duration::from_millis(50),
            Duration::from_millis(100),
        ]
    );
}

#[test]
fn real_sleep_spaces_attempts() {
    let start = std::time::Instant::now();
    let err = execute_with_retry(
        || Err::<(), _>(io::Error::other("down")),
        3,
        Duration::from_millis(10),
        true,
    )
    .unwrap_err();

    assert_eq!(err.attempts(), 3);
    // 10ms + 20ms
    assert!(start.elapsed() >= Duration::from_millis(30));
}
