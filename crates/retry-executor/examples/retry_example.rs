//! Example: retrying a flaky operation
//!
//! This example demonstrates:
//! 1. Blocking retry with constant backoff
//! 2. Async retry with exponential backoff that gives up
//! 3. Loading the policy from a TOML snippet
//!
//! Run with:
//! ```bash
//! RUST_LOG=debug cargo run -p retry-executor --example retry_example
//! ```

use retry_executor::RetryConfig;
use retry_executor::prelude::*;
use std::error::Error;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};

/// A simulated service that fails the first few times
struct UnreliableService {
    attempts: AtomicU32,
    fail_count: u32,
}

impl UnreliableService {
    fn new(fail_count: u32) -> Self {
        Self {
            attempts: AtomicU32::new(0),
            fail_count,
        }
    }

    fn call(&self) -> Result<String, std::io::Error> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;

        if attempt <= self.fail_count {
            println!("  Attempt {attempt}: FAILED (simulating transient error)");
            Err(std::io::Error::other(format!(
                "transient error on attempt {attempt}"
            )))
        } else {
            println!("  Attempt {attempt}: SUCCESS");
            Ok("service response".to_string())
        }
    }

    fn total_attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }
}

/// Example 1: Blocking retry with constant backoff
fn example_blocking() -> Result<(), Box<dyn Error>> {
    println!("\n=== Example 1: Blocking Retry, Constant Backoff ===\n");

    let service = UnreliableService::new(2);
    let start = Instant::now();

    let result = execute_with_retry(|| service.call(), 3, Duration::from_millis(100), false)?;

    println!("\nResult: {result}");
    println!("Total attempts: {}", service.total_attempts());
    println!("Total time: {:?}", start.elapsed());
    println!("Expected delays: 100ms + 100ms = ~200ms");

    Ok(())
}

/// Example 2: Async retry with exponential backoff that runs out of attempts
async fn example_async_exhausted() {
    println!("\n=== Example 2: Async Retry, Exponential Backoff, Exhausted ===\n");

    let service = Arc::new(UnreliableService::new(u32::MAX));
    let executor = AsyncRetryExecutor::new(
        RetryPolicy::builder()
            .max_attempts(4)
            .base_delay(Duration::from_millis(50))
            .exponential(true)
            .build(),
    );

    let start = Instant::now();
    let result = executor
        .execute(|| {
            let service = Arc::clone(&service);
            async move { service.call() }
        })
        .await;

    match result {
        Ok(value) => println!("\nUnexpected success: {value}"),
        Err(err) => {
            println!("\nGave up: {err}");
            if let Some(cause) = err.cause() {
                println!("Last failure: {cause}");
            }
        }
    }
    println!("Total time: {:?}", start.elapsed());
    println!("Expected delays: 50ms + 100ms + 200ms = ~350ms");
}

/// Example 3: Policy from configuration
fn example_config() -> Result<(), Box<dyn Error>> {
    println!("\n=== Example 3: Policy From Configuration ===\n");

    let config = RetryConfig::from_toml_str(
        r#"
        max_attempts = 5
        base_delay_ms = 0
        exponential = true
        "#,
    )?;
    println!("Loaded: {config:?}");

    let service = UnreliableService::new(3);
    let result = RetryExecutor::new(config.into_policy()).execute(|| service.call())?;

    println!("\nResult: {result}");
    println!("Total attempts: {} (no sleeping)", service.total_attempts());

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("Retry Executor Examples");
    println!("=======================");

    example_blocking()?;
    example_async_exhausted().await;
    example_config()?;

    println!("\n=== All examples completed ===\n");

    Ok(())
}
