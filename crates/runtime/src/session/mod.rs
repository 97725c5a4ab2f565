//! Picker session: request-code correlation for chooser launches.
//!
//! This module owns the only mutable state of the picker, the map of pending
//! completions keyed by request code. It handles:
//! - Launching the open-document chooser
//! - Enforcing the re-entrancy policy
//! - Correlating activity results with the pending pick
//! - Composing the [`PickResult`] through the grant manager and metadata probe
//!
//! # Pick Flow
//!
//! 1. Caller invokes [`PickerSession::pick_media`] with a [`Completion`]
//! 2. Session checks for a foreground activity and a free request-code slot
//! 3. Completion is stored under the request code and the chooser is launched
//! 4. Host delivers the activity result to [`ActivityEventListener::on_activity_result`]
//! 5. The pending entry is removed, then the completion is settled
//!
//! The pending map lock is never held while calling into the host or a
//! completion, so a completion may start the next pick from inside its callback.
//!
//! A host carries at most one live session. Constructing a second one over the
//! same host hands back the first, so every module built on that host shares
//! one pending slot and one activity-event listener.

#[cfg(test)]
mod tests;

use std::collections::HashMap;
use std::sync::{Arc, LazyLock, Weak};

use parking_lot::Mutex;
use picker_protocol::{
	ACTION_OPEN_DOCUMENT, ActivityResult, CATEGORY_OPENABLE, FLAG_GRANT_PERSISTABLE_URI_PERMISSION,
	FLAG_GRANT_READ_URI_PERMISSION, Intent, PickResult, ResultData, SDK_PERSISTABLE_GRANTS,
};

use crate::completion::Completion;
use crate::config::{PickerConfig, ReentryPolicy};
use crate::error::{Error, Result};
use crate::grant::GrantManager;
use crate::host::{Activity, ActivityEventListener, Host};
use crate::probe;

/// Pending completions keyed by request code.
type PendingMap = HashMap<i32, Completion>;

/// Live sessions keyed by the address of the host they are bound to.
///
/// An entry can only go stale once its session is gone, since the session
/// keeps its host (and thus the address) alive.
static SESSIONS: LazyLock<Mutex<HashMap<usize, Weak<PickerSession>>>> = LazyLock::new(|| Mutex::new(HashMap::new()));

fn host_key(host: &Arc<dyn Host>) -> usize {
	Arc::as_ptr(host) as *const () as usize
}

/// Single-slot picker state machine bound to one host.
pub struct PickerSession {
	host: Arc<dyn Host>,
	config: PickerConfig,
	pending: Mutex<PendingMap>,
}

impl PickerSession {
	/// Returns the session bound to `host`, creating and registering it as the
	/// host's activity-event listener on first use.
	///
	/// # Errors
	///
	/// Returns [`Error::InvalidConfig`] if `config` fails validation, or if the
	/// host already has a live session with a different config.
	pub fn new(host: Arc<dyn Host>, config: PickerConfig) -> Result<Arc<Self>> {
		config.validate()?;

		let key = host_key(&host);
		let session = {
			let mut sessions = SESSIONS.lock();
			sessions.retain(|_, session| session.strong_count() > 0);

			if let Some(existing) = sessions.get(&key).and_then(Weak::upgrade) {
				if existing.config != config {
					return Err(Error::InvalidConfig(format!(
						"host already has a picker session on request code {}",
						existing.config.request_code
					)));
				}
				tracing::debug!(request_code = existing.config.request_code, "Reusing picker session for host");
				return Ok(existing);
			}

			let session = Arc::new(Self {
				host: Arc::clone(&host),
				config,
				pending: Mutex::new(HashMap::new()),
			});
			sessions.insert(key, Arc::downgrade(&session));
			session
		};

		let weak: Weak<PickerSession> = Arc::downgrade(&session);
		let listener: Weak<dyn ActivityEventListener> = weak;
		host.add_activity_event_listener(listener);

		tracing::debug!(request_code = session.config.request_code, "Picker session attached to host");
		Ok(session)
	}

	pub fn config(&self) -> &PickerConfig {
		&self.config
	}

	pub fn request_code(&self) -> i32 {
		self.config.request_code
	}

	/// Returns true while a pick is waiting for its activity result.
	pub fn is_pending(&self) -> bool {
		self.pending.lock().contains_key(&self.config.request_code)
	}

	pub fn pending_count(&self) -> usize {
		self.pending.lock().len()
	}

	/// Starts a pick. The outcome is delivered through `completion`.
	///
	/// Settles immediately with [`Error::NoActivity`] when nothing is in the
	/// foreground, with [`Error::Busy`] when another pick is pending under
	/// [`ReentryPolicy::Reject`], and with [`Error::Cancelled`] when the host
	/// refuses to launch the chooser. Otherwise the completion stays pending
	/// until the matching activity result arrives.
	pub fn pick_media(&self, completion: Completion) {
		let code = self.config.request_code;

		let Some(activity) = self.host.current_activity() else {
			tracing::warn!("Pick requested with no foreground activity");
			completion.reject(Error::NoActivity);
			return;
		};

		let admitted = {
			let mut pending = self.pending.lock();
			if pending.contains_key(&code) && self.config.reentry == ReentryPolicy::Reject {
				Err(completion)
			} else {
				Ok(pending.insert(code, completion))
			}
		};

		match admitted {
			Err(completion) => {
				tracing::warn!(request_code = code, "Pick rejected, another pick is pending");
				completion.reject(Error::Busy);
				return;
			}
			Ok(Some(displaced)) => {
				tracing::warn!(request_code = code, "Replacing pending pick, earlier caller is orphaned");
				drop(displaced);
			}
			Ok(None) => {}
		}

		let intent = self.build_intent(self.host.sdk_int());
		tracing::info!(request_code = code, mime_types = ?intent.extra_mime_types, "Launching document chooser");

		if let Err(e) = activity.start_activity_for_result(&intent, code) {
			tracing::warn!(request_code = code, error = %e, "Chooser launch failed");
			let completion = self.pending.lock().remove(&code);
			if let Some(completion) = completion {
				completion.reject(Error::Cancelled);
			}
		}
	}

	/// Builds the open-document request for the given platform level.
	pub fn build_intent(&self, sdk_int: u32) -> Intent {
		let mut intent = Intent::new(ACTION_OPEN_DOCUMENT);
		intent
			.add_category(CATEGORY_OPENABLE)
			.set_type(self.config.mime_type.clone())
			.add_flags(FLAG_GRANT_READ_URI_PERMISSION);
		intent.extra_mime_types = self.config.allowed_mime_types.clone();

		if sdk_int >= SDK_PERSISTABLE_GRANTS {
			intent.add_flags(FLAG_GRANT_PERSISTABLE_URI_PERMISSION);
			intent.initial_uri = self.config.initial_uri.clone();
		}

		intent
	}

	/// Correlates an activity result with the pending pick and settles it.
	pub fn handle_activity_result(&self, activity: &dyn Activity, result: ActivityResult) {
		if result.request_code != self.config.request_code {
			tracing::trace!(request_code = result.request_code, "Ignoring foreign activity result");
			return;
		}

		let completion = self.pending.lock().remove(&result.request_code);
		let Some(completion) = completion else {
			tracing::debug!(request_code = result.request_code, "Activity result with no pending pick");
			return;
		};

		if !result.is_ok() {
			tracing::info!(result_code = result.result_code, "Chooser dismissed");
			completion.reject(Error::Cancelled);
			return;
		}

		let Some(data) = result.data else {
			tracing::info!("Chooser returned OK without a data envelope");
			completion.reject(Error::Cancelled);
			return;
		};

		let picked = self.describe_selection(activity, &data);
		tracing::info!(uri = ?picked.uri, mime_type = ?picked.mime_type, "Pick resolved");
		completion.resolve(picked);
	}

	/// Persists the grant and gathers metadata for the returned locator.
	fn describe_selection(&self, activity: &dyn Activity, data: &ResultData) -> PickResult {
		let Some(uri) = data.uri.as_deref() else {
			return PickResult::empty();
		};

		let mut picked = PickResult::for_uri(uri);
		let resolver = activity.content_resolver();

		GrantManager::new(self.host.sdk_int(), self.config.persist_grants).persist_read_grant(
			resolver.as_ref(),
			uri,
			data.flags,
		);

		if self.config.describe_metadata {
			probe::describe(resolver.as_ref(), uri).apply_to(&mut picked);
		}

		picked
	}
}

impl ActivityEventListener for PickerSession {
	fn on_activity_result(&self, activity: &dyn Activity, result: ActivityResult) {
		self.handle_activity_result(activity, result);
	}
}

impl std::fmt::Debug for PickerSession {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("PickerSession")
			.field("config", &self.config)
			.field("pending", &self.pending_count())
			.finish()
	}
}
