//! Interruptions during backoff are absorbed by both executors.

use async_trait::async_trait;
use retry_executor::prelude::*;
use retry_executor::{InterruptibleSleeper, Interrupted};
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::thread;
use std::time::{Duration, Instant};

#[test]
fn interrupt_from_another_thread_shortens_backoff() {
    let sleeper = InterruptibleSleeper::new();
    let handle = sleeper.handle();
    let executor = RetryExecutor::with_sleeper(
        RetryPolicy::new(2, Duration::from_secs(30), false),
        sleeper,
    );

    let interrupter = thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        handle.interrupt();
    });

    let start = Instant::now();
    let mut calls = 0;
    let value = executor
        .execute(|| {
            calls += 1;
            if calls == 1 {
                Err(io::Error::other("first try fails"))
            } else {
                Ok(calls)
            }
        })
        .unwrap();
    interrupter.join().unwrap();

    assert_eq!(value, 2);
    assert!(start.elapsed() < Duration::from_secs(30));
}

#[test]
fn pending_interrupt_does_not_end_the_loop() {
    let sleeper = InterruptibleSleeper::new();
    sleeper.handle().interrupt();

    let executor = RetryExecutor::with_sleeper(
        RetryPolicy::new(3, Duration::from_millis(5), false),
        sleeper,
    );

    let mut calls = 0;
    let err = executor
        .execute(|| {
            calls += 1;
            Err::<(), _>(io::Error::other("down"))
        })
        .unwrap_err();

    assert_eq!(calls, 3);
    assert!(err.is_exhausted());
}

/// Interrupts every other sleep.
#[derive(Default)]
struct AlternatingSleeper {
    sleeps: AtomicU32,
}

#[async_trait]
impl AsyncSleeper for AlternatingSleeper {
    async fn sleep(&self, _delay: Duration) -> Result<(), Interrupted> {
        if self.sleeps.fetch_add(1, Ordering::SeqCst) % 2 == 0 {
            Err(Interrupted)
        } else {
            Ok(())
        }
    }
}

#[tokio::test]
async fn async_executor_absorbs_interrupts() {
    let sleeper = Arc::new(AlternatingSleeper::default());
    let executor = AsyncRetryExecutor::with_sleeper(
        RetryPolicy::new(5, Duration::from_millis(100), true),
        Arc::clone(&sleeper),
    );

    let calls = Arc::new(AtomicU32::new(0));
    let err = executor
        .execute(|| {
            let calls = Arc::clone(&calls);
            async move {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                Err::<(), _>(io::Error::other(format!("attempt {n}")))
            }
        })
        .await
        .unwrap_err();

    assert_eq!(calls.load(Ordering::SeqCst), 5);
    assert_eq!(sleeper.sleeps.load(Ordering::SeqCst), 4);
    assert_eq!(err.cause().unwrap().to_string(), "attempt 5");
}

#[tokio::test]
async fn shared_executor_serves_concurrent_callers() {
    let executor = Arc::new(AsyncRetryExecutor::new(RetryPolicy::new(
        3,
        Duration::from_millis(1),
        false,
    )));

    let mut tasks = Vec::new();
    for id in 0..4u32 {
        let executor = Arc::clone(&executor);
        tasks.push(tokio::spawn(async move {
            let calls = AtomicU32::new(0);
            executor
                .execute(|| {
                    let n = calls.fetch_add(1, Ordering::SeqCst);
                    async move {
                        if n < 2 {
                            Err(io::Error::other("busy"))
                        } else {
                            Ok(id)
                        }
                    }
                })
                .await
                .map_err(|err| err.to_string())
        }));
    }

    for (id, task) in tasks.into_iter().enumerate() {
        assert_eq!(task.await.unwrap(), Ok(id as u32));
    }
}
