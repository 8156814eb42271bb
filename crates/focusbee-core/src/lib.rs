//! # Focusbee Core Library
//!
//! Core logic for the Focusbee focus helper: a pomodoro timer, website
//! blocking, ambient background sounds and a small task list. The CLI binary
//! is a thin layer over this crate.
//!
//! ## Architecture
//!
//! - **Timer Engine**: a one-second countdown state machine. The caller
//!   drives `tick()`; the [`Controller`] does so from a 1 Hz interval.
//! - **Blocking**: the blocklist, a pure redirect-rule builder and the
//!   [`RuleSink`] seam to the host's network filter.
//! - **Gatekeeper**: in-page blocking for pages the network rules missed.
//! - **Ambient**: sound settings relayed to a separate playback context.
//! - **Storage**: key-value JSON blobs ([`Store`]) backed by SQLite, and
//!   TOML configuration.
//!
//! ## Key Components
//!
//! - [`Controller`]: owns all mutable state and handles [`Message`]s
//! - [`TimerEngine`]: core timer state machine
//! - [`Database`]: persistent key-value store
//! - [`Config`]: application configuration management

pub mod ambient;
pub mod blocking;
pub mod controller;
pub mod error;
pub mod events;
pub mod gatekeeper;
pub mod messages;
pub mod notification;
pub mod quote;
pub mod storage;
pub mod task;
pub mod timer;

pub use ambient::{AmbientCoordinator, AmbientSettings, OffscreenPlayer, PlaybackContext};
pub use blocking::{BlockedUrlEntry, Blocklist, MemoryRuleTable, RedirectRule, RuleSink, StoredRuleTable};
pub use controller::Controller;
pub use error::{ConfigError, CoreError, PlaybackError, RuleError, StorageError, ValidationError};
pub use events::Event;
pub use gatekeeper::{Gatekeeper, MatchMode, PageHost, Verdict};
pub use messages::{Message, Response};
pub use quote::Quote;
pub use storage::{Config, Database, MemoryStore, Store};
pub use task::{Task, TaskFilter, TaskList, TaskStats};
pub use timer::{Mode, TimerEngine, TimerSettings, TimerState};
