//! Modem boundary.
//!
//! The call handler sees the modem only as a stream of [`ModemEvent`]s and
//! a [`ModemControl`] it can send [`ModemCommand`]s to. The AT command set
//! lives in [`at`]; the serial device task in [`serial`].

pub mod at;
pub mod serial;

use std::path::PathBuf;
use thiserror::Error;
use tokio::sync::mpsc;

pub use at::AtDecoder;
pub use serial::SerialModem;

/// Something the modem reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModemEvent {
    Ring,
    CallerId { name: String, number: String },
    Dtmf(char),
    CallEnded,
}

/// Something the handler asks the modem to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModemCommand {
    /// Go off-hook in voice mode so keypresses can be heard.
    Answer,
    /// Go back on-hook.
    Hangup,
}

/// Errors from the modem link.
#[derive(Debug, Error)]
pub enum ModemError {
    #[error("failed to open modem device {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("modem I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("modem write timed out: {0}")]
    Timeout(String),

    #[error("modem link closed")]
    Closed,
}

impl From<ModemError> for jcb_common::Error {
    fn from(err: ModemError) -> Self {
        match err {
            ModemError::Closed => jcb_common::Error::ModemClosed,
            other => jcb_common::Error::Modem(other.to_string()),
        }
    }
}

/// Command sink used by the call handler.
pub trait ModemControl {
    fn send(&mut self, command: ModemCommand) -> Result<(), ModemError>;
}

/// [`ModemControl`] that forwards commands to the modem task.
#[derive(Debug, Clone)]
pub struct ChannelModem {
    tx: mpsc::UnboundedSender<ModemCommand>,
}

impl ChannelModem {
    pub fn new(tx: mpsc::UnboundedSender<ModemCommand>) -> Self {
        Self { tx }
    }
}

impl ModemControl for ChannelModem {
    fn send(&mut self, command: ModemCommand) -> Result<(), ModemError> {
        self.tx.send(command).map_err(|_| ModemError::Closed)
    }
}

/// A connected [`ChannelModem`] and the receiver the modem task drains.
pub fn command_channel() -> (ChannelModem, mpsc::UnboundedReceiver<ModemCommand>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ChannelModem::new(tx), rx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_modem_forwards_in_order() {
        let (mut modem, mut rx) = command_channel();
        modem.send(ModemCommand::Answer).unwrap();
        modem.send(ModemCommand::Hangup).unwrap();
        assert_eq!(rx.try_recv().unwrap(), ModemCommand::Answer);
        assert_eq!(rx.try_recv().unwrap(), ModemCommand::Hangup);
    }

    #[test]
    fn test_channel_modem_reports_closed() {
        let (mut modem, rx) = command_channel();
        drop(rx);
        assert!(matches!(
            modem.send(ModemCommand::Answer),
            Err(ModemError::Closed)
        ));
    }
}
