//! Serial device task.
//!
//! The device is opened twice: one handle feeds a reader task that decodes
//! events, the other takes command writes, so a pending read never holds up
//! an answer or hangup. Line speed and framing are left to the OS (`stty`).

use jcb_config::ModemConfig;
use std::path::PathBuf;
use std::time::Duration;
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use super::at::{command_lines, frame, AtDecoder};
use super::{ModemCommand, ModemError, ModemEvent};

const WRITE_TIMEOUT: Duration = Duration::from_secs(2);

/// Owner of the modem device while the daemon runs.
#[derive(Debug, Clone)]
pub struct SerialModem {
    port: PathBuf,
    init_commands: Vec<String>,
}

impl SerialModem {
    pub fn new(config: &ModemConfig) -> Self {
        Self {
            port: config.port.clone(),
            init_commands: config.init_commands.clone(),
        }
    }

    /// Run until shutdown, the command channel closes, or the device fails.
    pub async fn run(
        self,
        events: mpsc::Sender<ModemEvent>,
        mut commands: mpsc::UnboundedReceiver<ModemCommand>,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<(), ModemError> {
        let reader = File::open(&self.port).await.map_err(|e| ModemError::Open {
            path: self.port.clone(),
            source: e,
        })?;
        let mut writer = OpenOptions::new()
            .write(true)
            .open(&self.port)
            .await
            .map_err(|e| ModemError::Open {
                path: self.port.clone(),
                source: e,
            })?;
        info!(port = %self.port.display(), "modem opened");

        for line in &self.init_commands {
            write_line(&mut writer, line).await?;
        }

        let mut read_task = tokio::spawn(read_loop(reader, events));

        let result = loop {
            tokio::select! {
                biased;
                _ = shutdown.changed() => {
                    debug!("modem task stopping");
                    break Ok(());
                }
                read = &mut read_task => {
                    break match read {
                        Ok(result) => result,
                        Err(e) => Err(ModemError::Io(std::io::Error::other(e))),
                    };
                }
                command = commands.recv() => {
                    let Some(command) = command else {
                        break Ok(());
                    };
                    if let Err(e) = write_command(&mut writer, command).await {
                        break Err(e);
                    }
                }
            }
        };

        read_task.abort();
        if let Err(e) = write_command(&mut writer, ModemCommand::Hangup).await {
            warn!(error = %e, "failed to hang up modem on exit");
        }
        result
    }
}

/// Write every line of `command`.
pub async fn write_command<W>(writer: &mut W, command: ModemCommand) -> Result<(), ModemError>
where
    W: AsyncWrite + Unpin,
{
    debug!(?command, "modem command");
    for line in command_lines(command) {
        write_line(writer, line).await?;
    }
    Ok(())
}

async fn write_line<W>(writer: &mut W, line: &str) -> Result<(), ModemError>
where
    W: AsyncWrite + Unpin,
{
    let bytes = frame(line);
    let write = async {
        writer.write_all(&bytes).await?;
        writer.flush().await
    };
    match tokio::time::timeout(WRITE_TIMEOUT, write).await {
        Ok(result) => result.map_err(ModemError::Io),
        Err(_) => Err(ModemError::Timeout(line.to_string())),
    }
}

/// Decode everything `reader` yields into events until EOF.
pub async fn read_loop<R>(mut reader: R, events: mpsc::Sender<ModemEvent>) -> Result<(), ModemError>
where
    R: AsyncRead + Unpin,
{
    let mut decoder = AtDecoder::new();
    let mut buf = [0u8; 256];
    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            return Err(ModemError::Closed);
        }
        for event in decoder.feed(&buf[..n]) {
            debug!(?event, "modem event");
            events.send(event).await.map_err(|_| ModemError::Closed)?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_read_loop_decodes_until_eof() {
        let (tx, mut rx) = mpsc::channel(8);
        let input: &[u8] = b"RING\r\nNMBR = 5551234\r\nNAME = JOHN DOE\r\n";
        let result = read_loop(input, tx).await;
        assert!(matches!(result, Err(ModemError::Closed)));
        assert_eq!(rx.recv().await, Some(ModemEvent::Ring));
        assert_eq!(
            rx.recv().await,
            Some(ModemEvent::CallerId {
                name: "JOHN DOE".to_string(),
                number: "5551234".to_string(),
            })
        );
    }

    #[tokio::test]
    async fn test_write_command_frames_lines() {
        let mut out: Vec<u8> = Vec::new();
        write_command(&mut out, ModemCommand::Answer).await.unwrap();
        write_command(&mut out, ModemCommand::Hangup).await.unwrap();
        assert_eq!(out, b"AT+FCLASS=8\rAT+VLS=1\rATH\rAT+FCLASS=0\r".to_vec());
    }

    #[tokio::test]
    async fn test_run_fails_on_missing_device() {
        let dir = tempfile::tempdir().unwrap();
        let config = ModemConfig {
            port: dir.path().join("ttyNONE"),
            ..ModemConfig::default()
        };
        let (events, _rx) = mpsc::channel(1);
        let (_tx, commands) = mpsc::unbounded_channel();
        let (_stop, shutdown) = watch::channel(false);
        let result = SerialModem::new(&config).run(events, commands, shutdown).await;
        assert!(matches!(result, Err(ModemError::Open { .. })));
    }
}
