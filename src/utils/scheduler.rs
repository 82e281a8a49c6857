//! Fixed-cadence driver for the relay passes.

use std::future::Future;
use std::time::Duration;

use log::error;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

/// Invokes `action` repeatedly at the given period on a background task.
///
/// Invocations of the same action are serialized: the next tick is not
/// consumed until the previous invocation has resolved, so a pass never
/// overlaps itself. Ticks missed while an invocation runs long are delayed,
/// not burst. An invocation that returns an error is logged and does not
/// stop future invocations.
pub fn run_periodically<F, Fut>(task_name: &'static str, period: Duration, action: F) -> JoinHandle<()>
where
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = eyre::Result<()>> + Send,
{
    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if let Err(err) = action().await {
                error!("Scheduled task {task_name} failed: {err:?}");
            }
        }
    })
}
