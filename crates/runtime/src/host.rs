//! Ports onto the host operating system.
//!
//! The picker never talks to the platform directly. Everything it needs (the
//! foreground activity, the chooser launch, the content resolver) is reached
//! through these traits, implemented by a JNI adapter on device and by an
//! in-memory simulator in tests.
//!
//! Host calls that can throw on the platform side return [`Result`]; the
//! picker decides per call site whether a failure is surfaced or absorbed.

use std::sync::{Arc, Weak};

use picker_protocol::{ActivityResult, Intent};

use crate::error::Result;

/// Application-wide host services.
pub trait Host: Send + Sync {
	/// The activity currently in the foreground, if any.
	fn current_activity(&self) -> Option<Arc<dyn Activity>>;

	/// Platform API level, used for feature gating.
	fn sdk_int(&self) -> u32;

	/// Registers a listener for activity results delivered to any activity.
	///
	/// The host keeps only a weak reference; a dropped listener is skipped.
	fn add_activity_event_listener(&self, listener: Weak<dyn ActivityEventListener>);
}

/// A foreground activity.
pub trait Activity: Send + Sync {
	/// Launches a foreign activity whose result comes back tagged with `request_code`.
	fn start_activity_for_result(&self, intent: &Intent, request_code: i32) -> Result<()>;

	/// The content resolver bound to this activity's context.
	fn content_resolver(&self) -> Arc<dyn ContentResolver>;
}

/// Access to document-provider metadata and grants.
pub trait ContentResolver: Send + Sync {
	/// MIME type of the locator, `None` when the provider does not know it.
	fn get_type(&self, uri: &str) -> Result<Option<String>>;

	/// Queries all columns of the locator's row.
	///
	/// `None` mirrors a null cursor from the provider.
	fn query(&self, uri: &str) -> Result<Option<Box<dyn Cursor>>>;

	/// Records a persistable permission for the locator.
	fn take_persistable_uri_permission(&self, uri: &str, flags: i32) -> Result<()>;
}

/// Row cursor returned by [`ContentResolver::query`].
///
/// The underlying platform cursor is released when the value is dropped.
pub trait Cursor: Send {
	/// Positions on the first row; `false` when the result set is empty.
	fn move_to_first(&mut self) -> Result<bool>;

	/// Index of the named column, `None` if the provider does not expose it.
	fn column_index(&self, name: &str) -> Option<usize>;

	fn is_null(&self, index: usize) -> Result<bool>;

	fn get_string(&self, index: usize) -> Result<Option<String>>;

	fn get_long(&self, index: usize) -> Result<i64>;
}

/// Observer of activity lifecycle events.
pub trait ActivityEventListener: Send + Sync {
	/// Called for every activity result the host receives, whatever its request code.
	fn on_activity_result(&self, activity: &dyn Activity, result: ActivityResult);

	fn on_new_intent(&self, _intent: &Intent) {}
}
