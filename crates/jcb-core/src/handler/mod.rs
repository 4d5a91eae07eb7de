//! Call handling state machine.
//!
//! ```text
//! Idle --Ring--> AwaitingCallerId --CallerId--> decide
//!   Allowed: stay silent                       -> Idle
//!   Blocked: Answer, Hangup, touch pattern     -> Idle
//!   Unknown: Answer                            -> UnknownPending
//! AwaitingCallerId --T1--> Answer              -> UnknownPending
//! UnknownPending --'*'--> add number to block list, Hangup -> Idle
//! UnknownPending --window | CallEnded--> Hangup -> Idle
//! ```
//!
//! The handler is synchronous and clock-agnostic: callers pass the current
//! [`Instant`] and ask [`CallHandler::deadline`] when to call
//! [`CallHandler::on_deadline`]. Every deadline is derived from the current
//! state, so returning to `Idle` cancels all of them. The async loop that
//! drives it lives in [`driver`].

pub mod driver;

use chrono::{DateTime, Utc};
use jcb_common::{CallEvent, CallId, DispositionKind};
use jcb_config::TimingConfig;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::calllog::DispositionRecord;
use crate::decision::{evaluate, Verdict};
use crate::lists::ListStore;
use crate::modem::{ModemCommand, ModemControl, ModemEvent};

pub use driver::run_handler;

/// Comment written on entries added by a keypress.
pub const AUTO_ADDED_COMMENT: &str = "auto-added";

/// Timing windows of the handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandlerTiming {
    /// T1: wait for Caller ID after the first ring.
    pub caller_id_timeout: Duration,
    /// How long an unknown caller has to press `*`.
    pub dtmf_window: Duration,
    /// Rings closer than this belong to the call already handled.
    pub ring_gap: Duration,
    /// Bound on any single call outside `Idle`.
    pub watchdog: Duration,
}

impl From<&TimingConfig> for HandlerTiming {
    fn from(config: &TimingConfig) -> Self {
        Self {
            caller_id_timeout: config.caller_id_timeout(),
            dtmf_window: config.dtmf_window(),
            ring_gap: config.ring_gap(),
            watchdog: config.watchdog(),
        }
    }
}

impl Default for HandlerTiming {
    fn default() -> Self {
        Self::from(&TimingConfig::default())
    }
}

/// Where the current call stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallState {
    Idle,
    /// Rang; Caller ID not delivered yet.
    AwaitingCallerId {
        call_id: CallId,
        rang_at: Instant,
        started_at: Instant,
        received_at: DateTime<Utc>,
    },
    /// Unknown caller answered; waiting for `*` or the window to close.
    UnknownPending {
        call_id: CallId,
        call: CallEvent,
        answered_at: Instant,
        started_at: Instant,
    },
}

impl CallState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::AwaitingCallerId { .. } => "awaiting_caller_id",
            Self::UnknownPending { .. } => "unknown_pending",
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}

/// Screens one line, one call at a time.
pub struct CallHandler<M> {
    store: Arc<ListStore>,
    modem: M,
    timing: HandlerTiming,
    state: CallState,
    last_ring: Option<Instant>,
    anomalies: u64,
}

impl<M: ModemControl> CallHandler<M> {
    pub fn new(store: Arc<ListStore>, modem: M, timing: HandlerTiming) -> Self {
        Self {
            store,
            modem,
            timing,
            state: CallState::Idle,
            last_ring: None,
            anomalies: 0,
        }
    }

    pub fn state(&self) -> &CallState {
        &self.state
    }

    /// Number of anomaly resets so far.
    pub fn anomalies(&self) -> u64 {
        self.anomalies
    }

    /// When [`on_deadline`](Self::on_deadline) is next due, if ever.
    pub fn deadline(&self) -> Option<Instant> {
        match &self.state {
            CallState::Idle => None,
            CallState::AwaitingCallerId {
                rang_at, started_at, ..
            } => Some(
                (*rang_at + self.timing.caller_id_timeout).min(*started_at + self.timing.watchdog),
            ),
            CallState::UnknownPending {
                answered_at,
                started_at,
                ..
            } => Some(
                (*answered_at + self.timing.dtmf_window).min(*started_at + self.timing.watchdog),
            ),
        }
    }

    /// Handle one modem event.
    pub fn on_event(&mut self, event: ModemEvent, now: Instant) -> Option<DispositionRecord> {
        let state = std::mem::replace(&mut self.state, CallState::Idle);
        match (state, event) {
            (CallState::Idle, ModemEvent::Ring) => {
                let previous = self.last_ring.replace(now);
                if previous.is_some_and(|at| now.duration_since(at) < self.timing.ring_gap) {
                    debug!("ring continues the previous call");
                    return None;
                }
                let call_id = CallId::new();
                info!(call_id = %call_id, "incoming call");
                self.state = CallState::AwaitingCallerId {
                    call_id,
                    rang_at: now,
                    started_at: now,
                    received_at: Utc::now(),
                };
                None
            }
            (CallState::Idle, ModemEvent::CallerId { name, number }) => {
                let call_id = CallId::new();
                info!(call_id = %call_id, "incoming call announced by caller id");
                self.decide(call_id, CallEvent::new(name, number), now, now)
            }
            (CallState::Idle, event) => {
                debug!(?event, "ignoring event while idle");
                None
            }

            (
                CallState::AwaitingCallerId {
                    call_id,
                    started_at,
                    received_at,
                    ..
                },
                ModemEvent::CallerId { name, number },
            ) => self.decide(
                call_id,
                CallEvent::received(name, number, received_at),
                started_at,
                now,
            ),
            (CallState::AwaitingCallerId { call_id, .. }, ModemEvent::CallEnded) => {
                info!(call_id = %call_id, "caller hung up before caller id");
                None
            }

            (CallState::UnknownPending { call_id, call, .. }, ModemEvent::Dtmf('*')) => {
                Some(self.add_caller(call_id, call))
            }
            (state @ CallState::UnknownPending { .. }, ModemEvent::Dtmf(digit)) => {
                debug!(%digit, "ignoring keypress other than *");
                self.state = state;
                None
            }
            (CallState::UnknownPending { call_id, call, .. }, ModemEvent::CallEnded) => {
                self.hang_up();
                info!(call_id = %call_id, "caller hung up during keypress window");
                Some(
                    DispositionRecord::new(call_id, &call, DispositionKind::UnknownIgnored)
                        .with_note("caller hung up"),
                )
            }

            (state, event) => {
                if matches!(event, ModemEvent::Ring) {
                    self.last_ring = Some(now);
                }
                self.anomaly(state, &format!("unexpected event {event:?}"))
            }
        }
    }

    /// Handle the deadline reported by [`deadline`](Self::deadline).
    pub fn on_deadline(&mut self, now: Instant) -> Option<DispositionRecord> {
        let state = std::mem::replace(&mut self.state, CallState::Idle);
        match state {
            CallState::Idle => None,
            CallState::AwaitingCallerId {
                call_id,
                rang_at,
                started_at,
                received_at,
            } => {
                if now >= rang_at + self.timing.caller_id_timeout {
                    // No Caller ID to match: straight to the keypress window.
                    info!(call_id = %call_id, "no caller id delivered");
                    self.screen_unknown(call_id, CallEvent::anonymous(received_at), started_at, now)
                } else if now >= started_at + self.timing.watchdog {
                    self.anomaly(
                        CallState::AwaitingCallerId {
                            call_id,
                            rang_at,
                            started_at,
                            received_at,
                        },
                        "watchdog expired",
                    )
                } else {
                    self.state = CallState::AwaitingCallerId {
                        call_id,
                        rang_at,
                        started_at,
                        received_at,
                    };
                    None
                }
            }
            CallState::UnknownPending {
                call_id,
                call,
                answered_at,
                started_at,
            } => {
                if now >= answered_at + self.timing.dtmf_window {
                    self.hang_up();
                    info!(call_id = %call_id, "keypress window closed");
                    Some(DispositionRecord::new(
                        call_id,
                        &call,
                        DispositionKind::UnknownIgnored,
                    ))
                } else if now >= started_at + self.timing.watchdog {
                    self.anomaly(
                        CallState::UnknownPending {
                            call_id,
                            call,
                            answered_at,
                            started_at,
                        },
                        "watchdog expired",
                    )
                } else {
                    self.state = CallState::UnknownPending {
                        call_id,
                        call,
                        answered_at,
                        started_at,
                    };
                    None
                }
            }
        }
    }

    /// Put the line back on-hook if a call is in progress. Used at shutdown.
    pub fn abandon(&mut self) {
        let state = std::mem::replace(&mut self.state, CallState::Idle);
        if let CallState::UnknownPending { call_id, .. } = &state {
            info!(call_id = %call_id, "abandoning call");
            self.hang_up();
        }
    }

    fn decide(
        &mut self,
        call_id: CallId,
        call: CallEvent,
        started_at: Instant,
        now: Instant,
    ) -> Option<DispositionRecord> {
        let lists = self.store.snapshot();
        let verdict = evaluate(&lists, &call.name, &call.number);
        info!(
            call_id = %call_id,
            name = %call.name,
            number = %call.number,
            verdict = %verdict,
            "call decided"
        );

        match verdict {
            Verdict::Allowed(m) => {
                Some(DispositionRecord::new(call_id, &call, DispositionKind::Allowed).with_match(&m))
            }
            Verdict::Blocked(m) => {
                let mut record =
                    DispositionRecord::new(call_id, &call, DispositionKind::Blocked).with_match(&m);
                if let Err(e) = self
                    .modem
                    .send(ModemCommand::Answer)
                    .and_then(|()| self.modem.send(ModemCommand::Hangup))
                {
                    self.anomalies += 1;
                    warn!(error = %e, "modem command failed while blocking");
                    record = record.with_note(format!("modem command failed: {e}"));
                }
                if let Err(e) = self.store.touch(&m.pattern) {
                    warn!(pattern = %m.pattern, error = %e, "failed to record block activity");
                }
                Some(record)
            }
            Verdict::Unknown => self.screen_unknown(call_id, call, started_at, now),
        }
    }

    /// Answer an unknown caller and open the keypress window.
    fn screen_unknown(
        &mut self,
        call_id: CallId,
        call: CallEvent,
        started_at: Instant,
        now: Instant,
    ) -> Option<DispositionRecord> {
        match self.modem.send(ModemCommand::Answer) {
            Ok(()) => {
                debug!(call_id = %call_id, "waiting for keypress");
                self.state = CallState::UnknownPending {
                    call_id,
                    call,
                    answered_at: now,
                    started_at,
                };
                None
            }
            Err(e) => {
                self.anomalies += 1;
                warn!(error = %e, "modem failed to answer unknown caller");
                Some(
                    DispositionRecord::new(call_id, &call, DispositionKind::UnknownIgnored)
                        .with_note(format!("modem answer failed: {e}")),
                )
            }
        }
    }

    fn add_caller(&mut self, call_id: CallId, call: CallEvent) -> DispositionRecord {
        let number = call.number.trim();
        let record = if number.is_empty() {
            info!(call_id = %call_id, "keypress for a caller without a number");
            DispositionRecord::new(call_id, &call, DispositionKind::UnknownIgnored)
                .with_note("keypress ignored: no caller number")
        } else {
            let pattern = regex::escape(number);
            match self.store.add_block(&pattern, false, AUTO_ADDED_COMMENT) {
                Ok(()) => {
                    info!(call_id = %call_id, pattern = %pattern, "caller added to block list");
                    DispositionRecord::new(call_id, &call, DispositionKind::UnknownAdded)
                        .with_added_pattern(pattern)
                }
                Err(e) => {
                    warn!(call_id = %call_id, pattern = %pattern, error = %e, "failed to add caller");
                    DispositionRecord::new(call_id, &call, DispositionKind::UnknownIgnored)
                        .with_note(format!("block add failed: {e}"))
                }
            }
        };
        self.hang_up();
        record
    }

    fn hang_up(&mut self) {
        if let Err(e) = self.modem.send(ModemCommand::Hangup) {
            self.anomalies += 1;
            warn!(error = %e, "modem failed to hang up");
        }
    }

    /// Reset to `Idle`. An answered call is hung up and still recorded.
    fn anomaly(&mut self, state: CallState, reason: &str) -> Option<DispositionRecord> {
        self.anomalies += 1;
        warn!(state = state.name(), reason, "call handler anomaly, resetting to idle");
        self.state = CallState::Idle;
        match state {
            CallState::UnknownPending { call_id, call, .. } => {
                self.hang_up();
                Some(
                    DispositionRecord::new(call_id, &call, DispositionKind::UnknownIgnored)
                        .with_note(format!("anomaly: {reason}")),
                )
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lists::StorePaths;
    use crate::modem::{command_channel, ChannelModem, ModemError};
    use std::fs;
    use tempfile::TempDir;
    use tokio::sync::mpsc::UnboundedReceiver;

    struct Fixture {
        _dir: TempDir,
        store: Arc<ListStore>,
        handler: CallHandler<ChannelModem>,
        commands: UnboundedReceiver<ModemCommand>,
    }

    fn fixture(allow: &str, block: &str) -> Fixture {
        let dir = tempfile::tempdir().expect("tempdir");
        let paths = StorePaths {
            allow: dir.path().join("allowlist.dat"),
            block: dir.path().join("blocklist.dat"),
            activity: dir.path().join("activity.json"),
        };
        fs::write(&paths.allow, allow).unwrap();
        fs::write(&paths.block, block).unwrap();
        let store = Arc::new(ListStore::open(paths).expect("open"));
        let (modem, commands) = command_channel();
        let handler = CallHandler::new(Arc::clone(&store), modem, HandlerTiming::default());
        Fixture {
            _dir: dir,
            store,
            handler,
            commands,
        }
    }

    fn caller(name: &str, number: &str) -> ModemEvent {
        ModemEvent::CallerId {
            name: name.to_string(),
            number: number.to_string(),
        }
    }

    fn drain(rx: &mut UnboundedReceiver<ModemCommand>) -> Vec<ModemCommand> {
        let mut out = Vec::new();
        while let Ok(cmd) = rx.try_recv() {
            out.push(cmd);
        }
        out
    }

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    #[test]
    fn test_ring_waits_for_caller_id() {
        let mut f = fixture("", "");
        let t0 = Instant::now();
        assert!(f.handler.on_event(ModemEvent::Ring, t0).is_none());
        assert_eq!(f.handler.state().name(), "awaiting_caller_id");
        assert_eq!(f.handler.deadline(), Some(t0 + secs(5)));
        assert!(drain(&mut f.commands).is_empty());
    }

    #[test]
    fn test_allowed_call_rings_through() {
        let mut f = fixture("^555;;family\n", "5551234;;\n");
        let t0 = Instant::now();
        f.handler.on_event(ModemEvent::Ring, t0);
        let record = f
            .handler
            .on_event(caller("MOM", "5551234567"), t0 + secs(1))
            .expect("record");
        assert_eq!(record.disposition, DispositionKind::Allowed);
        assert_eq!(record.matched_pattern.as_deref(), Some("^555"));
        assert!(f.handler.state().is_idle());
        assert!(drain(&mut f.commands).is_empty());
    }

    #[test]
    fn test_blocked_call_is_answered_and_dropped() {
        let mut f = fixture("", "978.....00;;desc\n");
        let t0 = Instant::now();
        f.handler.on_event(ModemEvent::Ring, t0);
        let record = f
            .handler
            .on_event(caller("", "9785551200"), t0 + secs(1))
            .expect("record");
        assert_eq!(record.disposition, DispositionKind::Blocked);
        assert_eq!(
            drain(&mut f.commands),
            vec![ModemCommand::Answer, ModemCommand::Hangup]
        );
        let activity = f.store.activity();
        let touched = activity.get("978.....00").expect("record");
        assert!(touched.last_fired_at.is_some());
        assert_eq!(touched.match_count, 1);
    }

    #[test]
    fn test_unknown_caller_star_adds_escaped_number() {
        let mut f = fixture("", "");
        let t0 = Instant::now();
        f.handler.on_event(ModemEvent::Ring, t0);
        assert!(f.handler.on_event(caller("", "+1.555"), t0 + secs(1)).is_none());
        assert_eq!(f.handler.deadline(), Some(t0 + secs(11)));
        assert_eq!(drain(&mut f.commands), vec![ModemCommand::Answer]);

        let record = f
            .handler
            .on_event(ModemEvent::Dtmf('*'), t0 + secs(4))
            .expect("record");
        assert_eq!(record.disposition, DispositionKind::UnknownAdded);
        assert_eq!(record.added_pattern.as_deref(), Some(r"\+1\.555"));
        assert_eq!(drain(&mut f.commands), vec![ModemCommand::Hangup]);
        assert!(f.handler.state().is_idle());
        assert_eq!(f.handler.deadline(), None);

        let entry = f.store.snapshot().block.get(r"\+1\.555").cloned().expect("added");
        assert!(!entry.is_permanent());
        assert_eq!(entry.comment(), AUTO_ADDED_COMMENT);
    }

    #[test]
    fn test_keypress_window_expires() {
        let mut f = fixture("", "");
        let t0 = Instant::now();
        f.handler.on_event(caller("JOHN DOE", "6175550000"), t0);
        assert!(f.handler.on_event(ModemEvent::Dtmf('5'), t0 + secs(2)).is_none());
        let record = f.handler.on_deadline(t0 + secs(10)).expect("record");
        assert_eq!(record.disposition, DispositionKind::UnknownIgnored);
        assert_eq!(
            drain(&mut f.commands),
            vec![ModemCommand::Answer, ModemCommand::Hangup]
        );
        assert!(f.store.snapshot().block.is_empty());
    }

    #[test]
    fn test_caller_id_timeout_skips_the_lists() {
        let mut f = fixture("^$;;\n", "^$;;no caller id\n");
        let t0 = Instant::now();
        f.handler.on_event(ModemEvent::Ring, t0);
        assert!(f.handler.on_deadline(t0 + secs(5)).is_none());
        assert_eq!(f.handler.state().name(), "unknown_pending");
        assert_eq!(drain(&mut f.commands), vec![ModemCommand::Answer]);

        let record = f.handler.on_deadline(t0 + secs(15)).expect("record");
        assert_eq!(record.disposition, DispositionKind::UnknownIgnored);
        assert!(record.matched_pattern.is_none());
        assert!(f.store.activity().get("^$").unwrap().last_fired_at.is_none());
    }

    #[test]
    fn test_received_at_is_first_ring() {
        let mut f = fixture("", "");
        let t0 = Instant::now();
        let before = Utc::now();
        f.handler.on_event(ModemEvent::Ring, t0);
        std::thread::sleep(Duration::from_millis(20));
        let after_ring = Utc::now();
        f.handler.on_event(caller("", "6175550000"), t0 + secs(1));
        let record = f.handler.on_deadline(t0 + secs(11)).expect("record");
        assert!(record.received_at >= before);
        assert!(record.received_at <= after_ring);
        assert!(record.decided_at > record.received_at);
    }

    #[test]
    fn test_caller_id_timeout_treated_as_unknown() {
        let mut f = fixture("", "");
        let t0 = Instant::now();
        f.handler.on_event(ModemEvent::Ring, t0);
        assert!(f.handler.on_deadline(t0 + secs(5)).is_none());
        assert_eq!(f.handler.state().name(), "unknown_pending");

        let record = f
            .handler
            .on_event(ModemEvent::Dtmf('*'), t0 + secs(6))
            .expect("record");
        assert_eq!(record.disposition, DispositionKind::UnknownIgnored);
        assert!(record.note.is_some());
        assert!(f.store.snapshot().block.is_empty());
    }

    #[test]
    fn test_early_deadline_is_ignored() {
        let mut f = fixture("", "");
        let t0 = Instant::now();
        f.handler.on_event(ModemEvent::Ring, t0);
        assert!(f.handler.on_deadline(t0 + secs(1)).is_none());
        assert_eq!(f.handler.state().name(), "awaiting_caller_id");
    }

    #[test]
    fn test_ring_gap_suppresses_new_call() {
        let mut f = fixture("^555;;\n", "");
        let t0 = Instant::now();
        f.handler.on_event(ModemEvent::Ring, t0);
        f.handler.on_event(caller("", "5550000"), t0 + secs(1));
        f.handler.on_event(ModemEvent::Ring, t0 + secs(6));
        assert!(f.handler.state().is_idle());
        f.handler.on_event(ModemEvent::Ring, t0 + secs(12));
        assert!(f.handler.state().is_idle());
        f.handler.on_event(ModemEvent::Ring, t0 + secs(30));
        assert_eq!(f.handler.state().name(), "awaiting_caller_id");
    }

    #[test]
    fn test_invalid_event_resets_after_hangup() {
        let mut f = fixture("", "");
        let t0 = Instant::now();
        f.handler.on_event(caller("", "6175550000"), t0);
        let record = f
            .handler
            .on_event(caller("", "6175550000"), t0 + secs(1))
            .expect("record");
        assert_eq!(record.disposition, DispositionKind::UnknownIgnored);
        assert!(record.note.as_deref().unwrap().starts_with("anomaly: unexpected event"));
        assert!(f.handler.state().is_idle());
        assert_eq!(f.handler.anomalies(), 1);
        assert_eq!(
            drain(&mut f.commands),
            vec![ModemCommand::Answer, ModemCommand::Hangup]
        );
    }

    #[test]
    fn test_call_ended_before_caller_id() {
        let mut f = fixture("", "");
        let t0 = Instant::now();
        f.handler.on_event(ModemEvent::Ring, t0);
        assert!(f.handler.on_event(ModemEvent::CallEnded, t0 + secs(2)).is_none());
        assert!(f.handler.state().is_idle());
        assert_eq!(f.handler.anomalies(), 0);
    }

    #[test]
    fn test_call_ended_during_window() {
        let mut f = fixture("", "");
        let t0 = Instant::now();
        f.handler.on_event(caller("", "6175550000"), t0);
        let record = f
            .handler
            .on_event(ModemEvent::CallEnded, t0 + secs(3))
            .expect("record");
        assert_eq!(record.disposition, DispositionKind::UnknownIgnored);
        assert!(f.handler.state().is_idle());
    }

    #[test]
    fn test_watchdog_bounds_call() {
        let mut f = fixture("", "");
        f.handler.timing.watchdog = secs(12);
        let t0 = Instant::now();
        f.handler.on_event(ModemEvent::Ring, t0);
        f.handler.on_deadline(t0 + secs(5));
        assert_eq!(f.handler.deadline(), Some(t0 + secs(12)));
        let record = f.handler.on_deadline(t0 + secs(12)).expect("record");
        assert_eq!(record.note.as_deref(), Some("anomaly: watchdog expired"));
        assert!(f.handler.state().is_idle());
        assert_eq!(f.handler.anomalies(), 1);
    }

    #[test]
    fn test_second_ring_while_answered_is_recorded() {
        let mut f = fixture("", "");
        let t0 = Instant::now();
        f.handler.on_event(ModemEvent::Ring, t0);
        f.handler.on_event(caller("", "6175550000"), t0 + secs(1));
        let record = f
            .handler
            .on_event(ModemEvent::Ring, t0 + secs(3))
            .expect("record");
        assert_eq!(record.disposition, DispositionKind::UnknownIgnored);
        assert_eq!(record.number, "6175550000");
        assert_eq!(
            drain(&mut f.commands),
            vec![ModemCommand::Answer, ModemCommand::Hangup]
        );
        assert!(f.handler.state().is_idle());
    }

    #[test]
    fn test_watchdog_before_caller_id_records_nothing() {
        let mut f = fixture("", "");
        f.handler.timing.watchdog = secs(3);
        let t0 = Instant::now();
        f.handler.on_event(ModemEvent::Ring, t0);
        assert_eq!(f.handler.deadline(), Some(t0 + secs(3)));
        assert!(f.handler.on_deadline(t0 + secs(3)).is_none());
        assert!(f.handler.state().is_idle());
        assert!(drain(&mut f.commands).is_empty());
    }

    struct BrokenModem;

    impl ModemControl for BrokenModem {
        fn send(&mut self, _command: ModemCommand) -> Result<(), ModemError> {
            Err(ModemError::Closed)
        }
    }

    #[test]
    fn test_modem_failure_forces_idle() {
        let f = fixture("", "");
        let mut handler = CallHandler::new(Arc::clone(&f.store), BrokenModem, HandlerTiming::default());
        let record = handler
            .on_event(caller("", "6175550000"), Instant::now())
            .expect("record");
        assert_eq!(record.disposition, DispositionKind::UnknownIgnored);
        assert!(handler.state().is_idle());
        assert_eq!(handler.anomalies(), 1);
    }
}
