//! jcblock screening core.
//!
//! Screens incoming calls on one analog line using Caller ID delivered by
//! a Hayes-command modem:
//! - [`lists`]: allow/block pattern lists and block-entry activity
//! - [`decision`]: ordered allow-then-block evaluation
//! - [`handler`]: per-call state machine with its timing windows
//! - [`purge`]: aging out stale block entries
//! - [`calllog`]: append-only disposition records
//! - [`modem`]: AT command set and the serial device task
//! - [`daemon`]: wiring of the above into one long-running process

pub mod calllog;
pub mod daemon;
pub mod decision;
pub mod exit_codes;
pub mod handler;
pub mod lists;
pub mod logging;
pub mod modem;
pub mod persist;
pub mod purge;

pub use calllog::{CallLog, DispositionRecord};
pub use decision::{evaluate, PatternMatch, Verdict};
pub use exit_codes::ExitCode;
pub use handler::{CallHandler, CallState, HandlerTiming};
pub use lists::{ListError, ListStore, PatternLists, StorePaths};
pub use purge::{purge_stale, PurgePolicy, PurgeReport};
