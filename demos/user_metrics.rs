//! # Stream Basics Example
//!
//! Shows two independent controllers:
//! - an integer stream with one listener
//! - a struct stream carrying user metrics
//!
//! Each emits two data items and one error, then closes and waits for its
//! listener to drain.
//!
//! ## Run
//! ```bash
//! RUST_LOG=streamvisor=debug cargo run --example user_metrics
//! ```

use std::sync::Arc;

use streamvisor::{SharedError, StreamController};
use tracing_subscriber::EnvFilter;

#[derive(Clone, Debug)]
struct UserMetric {
    user_id: String,
    value: f64,
    event: String,
}

impl UserMetric {
    fn new(user_id: &str, value: f64, event: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            value,
            event: event.to_string(),
        }
    }
}

fn sample_error(msg: &str) -> SharedError {
    Arc::new(std::io::Error::other(msg.to_string()))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("--- streamvisor example ---");

    println!();
    println!("Integer stream:");
    let ints: StreamController<i64> = StreamController::new();
    ints.stream().listen(
        |n| println!(" ├─► data:  {n}"),
        |err| println!(" └─► error: {err}"),
    );

    ints.emit(10).await;
    ints.emit(20).await;
    ints.emit_error(sample_error("int sample error")).await;
    ints.close().await;

    println!();
    println!("Metric stream:");
    let metrics: StreamController<UserMetric> = StreamController::new();
    metrics.stream().listen(
        |m| {
            println!(
                " ├─► metric: {} for user {} (value {:.1})",
                m.event, m.user_id, m.value
            )
        },
        |err| println!(" └─► error:  {err}"),
    );

    metrics.emit(UserMetric::new("A101", 5.4, "Login")).await;
    metrics.emit(UserMetric::new("B202", 12.1, "Logout")).await;
    metrics
        .emit_error(sample_error("critical metric error"))
        .await;
    metrics.close().await;

    println!();
    println!("--- example finished ---");
    Ok(())
}
