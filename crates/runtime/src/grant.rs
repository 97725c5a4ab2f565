//! Persistable URI grants.
//!
//! A locator returned by the chooser comes with a transient read grant that
//! lasts for the current process. Upgrading it lets the application reopen the
//! locator after a restart. The upgrade is best-effort: the pick is still useful
//! without it, so failures are logged and dropped.

use picker_protocol::{
	FLAG_GRANT_READ_URI_PERMISSION, FLAG_GRANT_WRITE_URI_PERMISSION, SDK_PERSISTABLE_GRANTS,
};

use crate::host::ContentResolver;

/// Upgrades transient URI grants into persistent ones.
#[derive(Debug, Clone, Copy)]
pub struct GrantManager {
	sdk_int: u32,
	enabled: bool,
}

/// What [`GrantManager::persist_read_grant`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantOutcome {
	Persisted,
	/// Platform too old or persistence disabled.
	Skipped,
	/// The host refused; the transient grant still applies.
	Failed,
}

impl GrantManager {
	pub fn new(sdk_int: u32, enabled: bool) -> Self {
		Self { sdk_int, enabled }
	}

	/// Returns true if the platform can record persistable grants.
	pub fn is_supported(&self) -> bool {
		self.sdk_int >= SDK_PERSISTABLE_GRANTS
	}

	/// Asks the host to persist the read (and write, if granted) permission on `uri`.
	///
	/// `flags` are the grant flags carried on the activity-result envelope.
	pub fn persist_read_grant(
		&self,
		resolver: &dyn ContentResolver,
		uri: &str,
		flags: i32,
	) -> GrantOutcome {
		if !self.enabled || !self.is_supported() {
			return GrantOutcome::Skipped;
		}

		let mask = flags & (FLAG_GRANT_READ_URI_PERMISSION | FLAG_GRANT_WRITE_URI_PERMISSION);
		match resolver.take_persistable_uri_permission(uri, mask) {
			Ok(()) => {
				tracing::debug!(uri, mask, "Persisted URI grant");
				GrantOutcome::Persisted
			}
			Err(e) => {
				tracing::debug!(uri, mask, error = %e, "Could not persist URI grant, keeping transient grant");
				GrantOutcome::Failed
			}
		}
	}
}
