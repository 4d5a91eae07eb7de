//! Async loop feeding modem events and deadlines to a [`CallHandler`].

use tokio::sync::{mpsc, watch};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, error, info};

use super::CallHandler;
use crate::calllog::{CallLog, DispositionRecord};
use crate::modem::{ModemControl, ModemEvent};

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => sleep_until(at).await,
        None => std::future::pending().await,
    }
}

fn record(call_log: &CallLog, record: &DispositionRecord) {
    info!(
        call_id = %record.call_id,
        disposition = %record.disposition,
        name = %record.name,
        number = %record.number,
        matched = record.matched_pattern.as_deref().unwrap_or(""),
        "call disposition"
    );
    if let Err(e) = call_log.append(record) {
        error!(error = %e, "failed to append to call log");
    }
}

/// Drive `handler` until shutdown or until the event stream ends.
///
/// One event or deadline is handled at a time. The pending deadline is
/// re-read from the handler after every step, so a timer never outlives
/// the state that armed it.
pub async fn run_handler<M: ModemControl>(
    mut handler: CallHandler<M>,
    mut events: mpsc::Receiver<ModemEvent>,
    call_log: CallLog,
    mut shutdown: watch::Receiver<bool>,
) -> CallHandler<M> {
    info!("call handler started");
    loop {
        let deadline = handler.deadline();
        let outcome = tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            event = events.recv() => match event {
                Some(event) => handler.on_event(event, Instant::now()),
                None => {
                    debug!("modem event stream closed");
                    break;
                }
            },
            _ = wait_until(deadline) => handler.on_deadline(Instant::now()),
        };
        if let Some(outcome) = outcome {
            record(&call_log, &outcome);
        }
    }

    handler.abandon();
    info!(anomalies = handler.anomalies(), "call handler stopped");
    handler
}
