//! Error types for the picker runtime.

use picker_protocol::{ErrorCode, Rejection};
use thiserror::Error;

/// Result type alias for runtime operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while running a pick.
#[derive(Debug, Error)]
pub enum Error {
	/// No foreground activity to launch the chooser from.
	#[error("No activity found")]
	NoActivity,

	/// The chooser returned a non-OK result, no data envelope, or could not be launched.
	#[error("Audio picking cancelled")]
	Cancelled,

	/// A pick with the same request code is still waiting for its result.
	#[error("Another pick is already in progress")]
	Busy,

	/// The completion was dropped without being settled.
	///
	/// Happens to a pick displaced under [`ReentryPolicy::Replace`](crate::ReentryPolicy::Replace)
	/// or when the session itself is torn down.
	#[error("Pick was superseded before the chooser returned")]
	Orphaned,

	/// Host-side failure (an exception thrown across the bridge).
	#[error("Host error: {0}")]
	Host(String),

	/// Configuration rejected by validation.
	#[error("Invalid picker configuration: {0}")]
	InvalidConfig(String),

	/// I/O error.
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	/// JSON serialization/deserialization error.
	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),
}

impl Error {
	/// Convenience constructor for host failures.
	pub fn host(message: impl Into<String>) -> Self {
		Error::Host(message.into())
	}

	/// Returns the bridge rejection code for this error.
	pub fn code(&self) -> ErrorCode {
		match self {
			Error::NoActivity => ErrorCode::NoActivity,
			Error::Cancelled => ErrorCode::Cancelled,
			Error::Busy => ErrorCode::Busy,
			Error::Orphaned => ErrorCode::Orphaned,
			Error::Host(_) | Error::InvalidConfig(_) | Error::Io(_) | Error::Json(_) => {
				ErrorCode::Internal
			}
		}
	}

	/// Converts into the `(code, message)` pair the bridge rejects with.
	pub fn to_rejection(&self) -> Rejection {
		Rejection::new(self.code(), self.to_string())
	}

	/// Returns true if the chooser was dismissed.
	pub fn is_cancelled(&self) -> bool {
		matches!(self, Error::Cancelled)
	}
}

impl From<Error> for Rejection {
	fn from(err: Error) -> Self {
		err.to_rejection()
	}
}
