use anyhow::Result;
use tokio::sync::watch;
use tokio::time::{interval, sleep, Duration};

use crate::core::state::AppState;
use crate::tasks::notifications::{self, NotificationDispatcher};

const NOTIFICATION_WORKER_CONCURRENCY: usize = 2;
const STALE_RECOVERY_INTERVAL: Duration = Duration::from_secs(600);

pub(crate) async fn run(state: AppState) -> Result<()> {
    let dispatcher = NotificationDispatcher::from_settings(state.settings())?;
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let mut handles = Vec::with_capacity(NOTIFICATION_WORKER_CONCURRENCY + 1);
    for _ in 0..NOTIFICATION_WORKER_CONCURRENCY {
        handles.push(tokio::spawn(notification_worker(
            state.clone(),
            dispatcher.clone(),
            shutdown_rx.clone(),
        )));
    }
    handles.push(tokio::spawn(recover_stale_loop(state.clone(), shutdown_rx.clone())));

    tracing::info!(workers = NOTIFICATION_WORKER_CONCURRENCY, "Notification worker started");

    crate::core::shutdown::shutdown_signal("worker").await;
    if shutdown_tx.send(true).is_err() {
        tracing::warn!("Failed to broadcast shutdown signal to background tasks");
    }

    for handle in handles {
        if let Err(err) = handle.await {
            tracing::error!(error = %err, "Background task join failed");
        }
    }

    Ok(())
}

async fn notification_worker(
    state: AppState,
    dispatcher: NotificationDispatcher,
    mut shutdown: watch::Receiver<bool>,
) {
    let idle = Duration::from_secs(state.settings().notifications().poll_interval_seconds.max(1));
    loop {
        if *shutdown.borrow() {
            break;
        }

        match notifications::process_next(&state, &dispatcher).await {
            Ok(true) => continue,
            Ok(false) => {}
            Err(err) => tracing::error!(error = %err, "Failed to process notification job"),
        }

        tokio::select! {
            _ = shutdown.changed() => break,
            _ = sleep(idle) => {}
        }
    }
}

async fn recover_stale_loop(state: AppState, mut shutdown: watch::Receiver<bool>) {
    let mut tick = interval(STALE_RECOVERY_INTERVAL);
    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = tick.tick() => {
                if let Err(err) = notifications::recover_stale_jobs(&state).await {
                    tracing::error!(error = %err, "recover_stale_jobs failed");
                }
            }
        }
    }
}
