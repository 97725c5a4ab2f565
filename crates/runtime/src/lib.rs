//! Picker Runtime - session state machine and host ports
//!
//! This crate provides the platform-independent core of the media picker:
//!
//! - **Host ports**: Traits for the foreground activity, chooser launch, and content resolver
//! - **Completion**: One-shot resolve-or-reject handle for a pending pick
//! - **Session**: Request-code correlation between chooser launch and activity result
//! - **Grant manager**: Best-effort upgrade to a persistable URI grant
//! - **Metadata probe**: MIME type, display name, and size lookup
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │   media-picker   │  AudioPicker bridge module, host adapters
//! └────────┬─────────┘
//!          │ implements Host
//! ┌────────▼─────────┐
//! │  picker-runtime  │  This crate
//! │  ┌────────────┐  │
//! │  │  Session   │  │  pending map, result correlation
//! │  └────────────┘  │
//! │  ┌─────┐ ┌─────┐ │
//! │  │Grant│ │Probe│ │  content resolver calls
//! │  └─────┘ └─────┘ │
//! └──────────────────┘
//! ```

pub mod completion;
pub mod config;
pub mod error;
pub mod grant;
pub mod host;
pub mod probe;
pub mod session;

pub use completion::{Completion, Outcome, PickFuture};
pub use config::{PickerConfig, ReentryPolicy};
pub use error::{Error, Result};
pub use grant::{GrantManager, GrantOutcome};
pub use host::{Activity, ActivityEventListener, ContentResolver, Cursor, Host};
pub use probe::{MediaMetadata, describe};
pub use session::PickerSession;
