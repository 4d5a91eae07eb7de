//! Hayes AT command set: decoding modem output, encoding commands.
//!
//! Caller ID arrives as a block of `KEY = value` lines between rings:
//!
//! ```text
//! RING
//! DATE = 1016
//! TIME = 1430
//! NMBR = 9785551200
//! NAME = TOLL FREE
//! RING
//! ```
//!
//! The block is complete on `NAME`, or on the next `RING` if the network
//! sent no name. In voice mode keypresses arrive as DLE-shielded codes
//! (`<DLE>/<DLE>*<DLE>~` for `*`).

use tracing::{debug, trace};

use super::{ModemCommand, ModemEvent};

/// Data link escape; starts every shielded code in voice mode.
pub const DLE: u8 = 0x10;

/// Longest line kept; anything beyond is line noise.
const MAX_LINE: usize = 256;

/// Caller ID fields collected so far.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct PendingCallerId {
    date: Option<String>,
    time: Option<String>,
    number: Option<String>,
    name: Option<String>,
}

impl PendingCallerId {
    fn is_empty(&self) -> bool {
        self.date.is_none() && self.time.is_none() && self.number.is_none() && self.name.is_none()
    }

    fn take_event(&mut self) -> ModemEvent {
        let pending = std::mem::take(self);
        debug!(
            date = pending.date.as_deref().unwrap_or(""),
            time = pending.time.as_deref().unwrap_or(""),
            "caller id complete"
        );
        ModemEvent::CallerId {
            name: pending.name.unwrap_or_default(),
            number: pending.number.unwrap_or_default(),
        }
    }
}

/// Incremental decoder of bytes read from the modem.
#[derive(Debug, Default)]
pub struct AtDecoder {
    line: Vec<u8>,
    after_dle: bool,
    caller: PendingCallerId,
}

impl AtDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed raw bytes; returns the events they complete.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<ModemEvent> {
        let mut events = Vec::new();
        for &byte in bytes {
            if self.after_dle {
                self.after_dle = false;
                self.shielded(byte, &mut events);
                continue;
            }
            match byte {
                DLE => self.after_dle = true,
                b'\r' | b'\n' => {
                    if !self.line.is_empty() {
                        let text = String::from_utf8_lossy(&self.line).trim().to_string();
                        self.line.clear();
                        self.handle_line(&text, &mut events);
                    }
                }
                _ if self.line.len() < MAX_LINE => self.line.push(byte),
                _ => {}
            }
        }
        events
    }

    fn shielded(&mut self, code: u8, events: &mut Vec<ModemEvent>) {
        match code {
            b'0'..=b'9' | b'*' | b'#' | b'A'..=b'D' => events.push(ModemEvent::Dtmf(code as char)),
            // Busy or dial tone: the far end is gone.
            b'b' | b'd' => events.push(ModemEvent::CallEnded),
            _ => trace!(code = %(code as char).escape_default(), "ignoring shielded code"),
        }
    }

    fn handle_line(&mut self, line: &str, events: &mut Vec<ModemEvent>) {
        if line.starts_with("RING") {
            if self.caller.is_empty() {
                events.push(ModemEvent::Ring);
            } else {
                events.push(self.caller.take_event());
            }
            return;
        }
        if line.starts_with("NO CARRIER") {
            self.caller = PendingCallerId::default();
            events.push(ModemEvent::CallEnded);
            return;
        }

        let Some((key, value)) = line.split_once('=') else {
            trace!(line, "ignoring modem line");
            return;
        };
        let value = value.trim().to_string();
        match key.trim() {
            "DATE" => self.caller.date = Some(value),
            "TIME" => self.caller.time = Some(value),
            "NMBR" => self.caller.number = Some(value),
            "NAME" => {
                self.caller.name = Some(value);
                events.push(self.caller.take_event());
            }
            _ => trace!(line, "ignoring modem line"),
        }
    }
}

/// AT command lines that carry out `command`, in order.
pub fn command_lines(command: ModemCommand) -> &'static [&'static str] {
    match command {
        ModemCommand::Answer => &["AT+FCLASS=8", "AT+VLS=1"],
        ModemCommand::Hangup => &["ATH", "AT+FCLASS=0"],
    }
}

/// Bytes sent for one command line.
pub fn frame(line: &str) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(line.len() + 1);
    bytes.extend_from_slice(line.as_bytes());
    bytes.push(b'\r');
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caller(name: &str, number: &str) -> ModemEvent {
        ModemEvent::CallerId {
            name: name.to_string(),
            number: number.to_string(),
        }
    }

    #[test]
    fn test_full_caller_id_block() {
        let mut decoder = AtDecoder::new();
        let events = decoder.feed(
            b"\r\nRING\r\n\r\nDATE = 1016\r\nTIME = 1430\r\nNMBR = 9785551200\r\nNAME = TOLL FREE\r\n",
        );
        assert_eq!(events, vec![ModemEvent::Ring, caller("TOLL FREE", "9785551200")]);
    }

    #[test]
    fn test_ring_completes_block_without_name() {
        let mut decoder = AtDecoder::new();
        let mut events = decoder.feed(b"RING\r\nDATE=1016\r\nTIME=1430\r\nNMBR=5551234\r\n");
        events.extend(decoder.feed(b"RING\r\n"));
        assert_eq!(events, vec![ModemEvent::Ring, caller("", "5551234")]);
        assert_eq!(decoder.feed(b"RING\r\n"), vec![ModemEvent::Ring]);
    }

    #[test]
    fn test_split_reads() {
        let mut decoder = AtDecoder::new();
        assert!(decoder.feed(b"NMBR = 61755").is_empty());
        assert!(decoder.feed(b"50000\r").is_empty());
        assert_eq!(decoder.feed(b"\nNAME = O\r\n"), vec![caller("O", "6175550000")]);
    }

    #[test]
    fn test_dtmf_shielded_codes() {
        let mut decoder = AtDecoder::new();
        let events = decoder.feed(&[DLE, b'/', DLE, b'*', DLE, b'~', DLE, b'R', DLE, b'5']);
        assert_eq!(events, vec![ModemEvent::Dtmf('*'), ModemEvent::Dtmf('5')]);
    }

    #[test]
    fn test_dle_split_across_reads() {
        let mut decoder = AtDecoder::new();
        assert!(decoder.feed(&[DLE]).is_empty());
        assert_eq!(decoder.feed(b"#"), vec![ModemEvent::Dtmf('#')]);
    }

    #[test]
    fn test_call_ended() {
        let mut decoder = AtDecoder::new();
        assert_eq!(decoder.feed(b"NO CARRIER\r\n"), vec![ModemEvent::CallEnded]);
        assert_eq!(decoder.feed(&[DLE, b'b']), vec![ModemEvent::CallEnded]);
    }

    #[test]
    fn test_result_codes_ignored() {
        let mut decoder = AtDecoder::new();
        assert!(decoder.feed(b"ATZ\r\nOK\r\nAT+VCID=1\r\nOK\r\nERROR\r\n").is_empty());
    }

    #[test]
    fn test_commands() {
        assert_eq!(command_lines(ModemCommand::Answer), &["AT+FCLASS=8", "AT+VLS=1"]);
        assert_eq!(command_lines(ModemCommand::Hangup), &["ATH", "AT+FCLASS=0"]);
        assert_eq!(frame("ATH"), b"ATH\r".to_vec());
    }
}
