//! The screening daemon: modem, call handler and purge scheduler as tokio
//! tasks over one shared [`ListStore`].
//!
//! `SIGHUP` reloads the list files; `SIGINT`/`SIGTERM` stop every task,
//! put the line on-hook and flush the store.

use jcb_config::ScreenerConfig;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::calllog::CallLog;
use crate::handler::{run_handler, CallHandler, HandlerTiming};
use crate::lists::{ListError, ListStore, StorePaths};
use crate::modem::{command_channel, ModemError, SerialModem};
use crate::purge::{PurgePolicy, PurgeScheduler};

/// Modem events buffered between the device reader and the handler.
const EVENT_BUFFER: usize = 64;

/// How long blocking device I/O may outlive the daemon before it is abandoned.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Errors that stop the daemon.
#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("invalid configuration:\n{0}")]
    Config(String),

    #[error(transparent)]
    Lists(#[from] ListError),

    #[error(transparent)]
    Modem(#[from] ModemError),

    #[error("failed to install signal handler: {0}")]
    Signal(#[source] std::io::Error),

    #[error("failed to start runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

impl From<DaemonError> for jcb_common::Error {
    fn from(err: DaemonError) -> Self {
        match err {
            DaemonError::Config(msg) => jcb_common::Error::Config(msg),
            DaemonError::Lists(e) => e.into(),
            DaemonError::Modem(e) => e.into(),
            DaemonError::Signal(e) | DaemonError::Runtime(e) => jcb_common::Error::Io(e),
        }
    }
}

/// What a received signal asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SignalRequest {
    Shutdown,
    Reload,
}

#[cfg(unix)]
struct Signals {
    term: tokio::signal::unix::Signal,
    hup: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl Signals {
    fn install() -> Result<Self, DaemonError> {
        use tokio::signal::unix::{signal, SignalKind};
        Ok(Self {
            term: signal(SignalKind::terminate()).map_err(DaemonError::Signal)?,
            hup: signal(SignalKind::hangup()).map_err(DaemonError::Signal)?,
        })
    }

    async fn next(&mut self) -> SignalRequest {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("received SIGINT");
                SignalRequest::Shutdown
            }
            _ = self.term.recv() => {
                info!("received SIGTERM");
                SignalRequest::Shutdown
            }
            _ = self.hup.recv() => {
                info!("received SIGHUP");
                SignalRequest::Reload
            }
        }
    }
}

#[cfg(not(unix))]
struct Signals;

#[cfg(not(unix))]
impl Signals {
    fn install() -> Result<Self, DaemonError> {
        Ok(Self)
    }

    async fn next(&mut self) -> SignalRequest {
        let _ = tokio::signal::ctrl_c().await;
        info!("received Ctrl+C");
        SignalRequest::Shutdown
    }
}

/// Run the daemon on its own multi-thread runtime until it stops.
pub fn run_blocking(config: ScreenerConfig) -> Result<(), DaemonError> {
    block_on_bounded(run(config), SHUTDOWN_GRACE).map_err(DaemonError::Runtime)?
}

/// Drive `future` to completion, then shut the runtime down.
///
/// Tty reads run on blocking threads that cannot be cancelled; any still
/// pending after `grace` are abandoned instead of holding up process exit.
pub fn block_on_bounded<F: Future>(future: F, grace: Duration) -> std::io::Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let output = runtime.block_on(future);
    runtime.shutdown_timeout(grace);
    Ok(output)
}

/// Run the daemon until a shutdown signal or a modem failure.
pub async fn run(config: ScreenerConfig) -> Result<(), DaemonError> {
    let validation = config.validate();
    if !validation.is_ok() {
        return Err(DaemonError::Config(validation.to_string()));
    }

    let store = Arc::new(ListStore::open(StorePaths::from_config(&config))?);
    let mut signals = Signals::install()?;
    let (stop_tx, stop_rx) = watch::channel(false);

    let (event_tx, event_rx) = mpsc::channel(EVENT_BUFFER);
    let (modem_ctl, command_rx) = command_channel();
    let mut modem_task = tokio::spawn(SerialModem::new(&config.modem).run(
        event_tx,
        command_rx,
        stop_rx.clone(),
    ));

    let handler = CallHandler::new(
        Arc::clone(&store),
        modem_ctl,
        HandlerTiming::from(&config.timing),
    );
    let handler_task = tokio::spawn(run_handler(
        handler,
        event_rx,
        CallLog::new(config.call_log_path()),
        stop_rx.clone(),
    ));

    let purge_task: Option<JoinHandle<()>> = if config.purge.enabled {
        let scheduler = PurgeScheduler::new(
            Arc::clone(&store),
            PurgePolicy::from_config(&config.purge),
            config.purge.interval(),
            config.purge_archive_path(),
        );
        Some(tokio::spawn(scheduler.run(stop_rx.clone())))
    } else {
        info!("purge disabled");
        None
    };

    info!(port = %config.modem.port.display(), "jcblock screening");

    let mut outcome = Ok(());
    let mut modem_done = false;
    loop {
        tokio::select! {
            request = signals.next() => match request {
                SignalRequest::Shutdown => break,
                SignalRequest::Reload => {
                    if let Err(e) = store.reload() {
                        error!(error = %e, "list reload failed, keeping current lists");
                    }
                }
            },
            result = &mut modem_task => {
                modem_done = true;
                outcome = match result {
                    Ok(Ok(())) => Ok(()),
                    Ok(Err(e)) => {
                        error!(error = %e, "modem task failed");
                        Err(DaemonError::Modem(e))
                    }
                    Err(e) => {
                        error!(error = %e, "modem task panicked");
                        Err(DaemonError::Modem(ModemError::Closed))
                    }
                };
                break;
            }
        }
    }

    info!("shutting down");
    let _ = stop_tx.send(true);
    if let Err(e) = handler_task.await {
        warn!(error = %e, "call handler task failed");
    }
    if !modem_done {
        match modem_task.await {
            Ok(Err(e)) => warn!(error = %e, "modem task ended with error"),
            Err(e) => warn!(error = %e, "modem task failed"),
            Ok(Ok(())) => {}
        }
    }
    if let Some(task) = purge_task {
        if let Err(e) = task.await {
            warn!(error = %e, "purge task failed");
        }
    }
    if let Err(e) = store.flush() {
        error!(error = %e, "final flush failed");
    }
    info!("stopped");
    outcome
}
