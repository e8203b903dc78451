//! roompulse-core: Core library for roompulse
//!
//! Records how a live audience feels over time. Participants report a
//! status (green / yellow / red); the library samples the distribution of
//! those statuses and keeps a bounded, two-resolution history suitable for
//! a participation-over-time chart.
//!
//! # Architecture
//!
//! ```text
//! participants → StatusLedger ──statuses()──→ StatusRecorder ──→ RetentionEngine
//!                      ↑                           ↑                 dense │ sparse
//!                    Room ─────── tick() ──────────┘                       ↓
//!                                                                   read_history()
//! ```
//!
//! # Modules
//!
//! - `status`: the closed status enumeration and its labels
//! - `snapshot`: point-in-time status counts
//! - `retention`: two-tier (dense + sparse) history engine
//! - `ledger`: concurrent participant → status map
//! - `recorder`: lock-protected engine with an injected clock
//! - `room`: ledger + recorder + host liveness
//! - `clock`: wall, scaled and manual time sources
//! - `config`: TOML configuration and validation
//! - `error`: error types with remediation hints
//! - `logging`: `tracing` subscriber setup
//!
//! # Safety
//!
//! This crate forbids unsafe code.

#![forbid(unsafe_code)]

pub mod clock;
pub mod config;
pub mod error;
pub mod ledger;
pub mod logging;
pub mod recorder;
pub mod retention;
pub mod room;
pub mod snapshot;
pub mod status;

pub use clock::{Clock, ManualClock, ScaledClock, SystemClock};
pub use config::{Config, RetentionConfig};
pub use error::{ConfigError, Error, Result};
pub use ledger::{ParticipantSession, StatusLedger};
pub use recorder::StatusRecorder;
pub use retention::{RecordOutcome, RecordReport, RetentionEngine, RetentionStats};
pub use room::Room;
pub use snapshot::{StatusCounts, StatusSnapshot};
pub use status::StatusValue;

/// Version of the roompulse-core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
