//! Pick a media file through the host document chooser.
//!
//! `media-picker` exposes one bridge module, [`AudioPicker`], with one
//! operation: open the operating system's document chooser filtered to audio,
//! image, and video files, then describe the selection.
//!
//! # Example
//!
//! ```ignore
//! use media_picker::AudioPicker;
//!
//! let picker = AudioPicker::new(host)?;
//! match picker.pick_audio().await {
//!     Ok(picked) => println!("{:?} ({:?}, {:?} bytes)", picked.uri, picked.name, picked.size),
//!     Err(e) if e.is_cancelled() => println!("user backed out"),
//!     Err(e) => eprintln!("{}: {e}", e.code()),
//! }
//! ```
//!
//! # Hosts
//!
//! The picker reaches the platform only through the [`Host`] trait family:
//!
//! - `android::JniHost` (Android targets): framework calls over JNI
//! - [`sim::SimHost`]: in-memory host for tests and scenario replay
//!
//! # Error Codes
//!
//! | code | when |
//! |---|---|
//! | `NO_ACTIVITY` | nothing in the foreground, chooser never launched |
//! | `CANCELLED` | chooser dismissed, returned no envelope, or failed to launch |
//! | `BUSY` | a pick is already pending |

#[cfg(target_os = "android")]
pub mod android;
pub mod audio_picker;
pub mod sim;

pub use audio_picker::{AudioPicker, reply, reply_json, result_json};
pub use picker_protocol::{
	ActivityResult, BridgeReply, ErrorCode, Intent, PickResult, Rejection, ResultData,
};
pub use picker_runtime::{
	Activity, ActivityEventListener, Completion, ContentResolver, Cursor, Error, Host, Outcome,
	PickFuture, PickerConfig, PickerSession, ReentryPolicy, Result,
};
