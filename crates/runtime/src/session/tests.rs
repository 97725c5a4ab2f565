use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use picker_protocol::{
	ACTION_OPEN_DOCUMENT, ActivityResult, CATEGORY_OPENABLE, ErrorCode, FLAG_GRANT_PERSISTABLE_URI_PERMISSION,
	FLAG_GRANT_READ_URI_PERMISSION, Intent, PickResult, RESULT_CANCELED, RESULT_OK, ResultData,
};

use super::*;
use crate::completion::Outcome;
use crate::host::{ContentResolver, Cursor};

#[derive(Default)]
struct MockResolver {
	mime_type: Option<String>,
	fail_grant: bool,
	grants: Mutex<Vec<(String, i32)>>,
}

impl ContentResolver for MockResolver {
	fn get_type(&self, _uri: &str) -> Result<Option<String>> {
		Ok(self.mime_type.clone())
	}

	fn query(&self, _uri: &str) -> Result<Option<Box<dyn Cursor>>> {
		Ok(None)
	}

	fn take_persistable_uri_permission(&self, uri: &str, flags: i32) -> Result<()> {
		self.grants.lock().push((uri.to_string(), flags));
		if self.fail_grant {
			return Err(Error::host("SecurityException"));
		}
		Ok(())
	}
}

#[derive(Default)]
struct MockActivity {
	fail_launch: bool,
	launches: Mutex<Vec<(Intent, i32)>>,
	resolver: Arc<MockResolver>,
}

impl Activity for MockActivity {
	fn start_activity_for_result(&self, intent: &Intent, request_code: i32) -> Result<()> {
		if self.fail_launch {
			return Err(Error::host("ActivityNotFoundException"));
		}
		self.launches.lock().push((intent.clone(), request_code));
		Ok(())
	}

	fn content_resolver(&self) -> Arc<dyn ContentResolver> {
		Arc::clone(&self.resolver) as Arc<dyn ContentResolver>
	}
}

struct MockHost {
	sdk_int: u32,
	activity: Mutex<Option<Arc<MockActivity>>>,
	listeners: Mutex<Vec<Weak<dyn ActivityEventListener>>>,
}

impl MockHost {
	fn with_activity(activity: MockActivity) -> Arc<Self> {
		Arc::new(Self {
			sdk_int: 33,
			activity: Mutex::new(Some(Arc::new(activity))),
			listeners: Mutex::new(Vec::new()),
		})
	}

	fn detached() -> Arc<Self> {
		Arc::new(Self {
			sdk_int: 33,
			activity: Mutex::new(None),
			listeners: Mutex::new(Vec::new()),
		})
	}

	fn activity(&self) -> Arc<MockActivity> {
		self.activity.lock().clone().expect("mock host has no activity")
	}

	fn deliver(&self, request_code: i32, result_code: i32, data: Option<ResultData>) {
		let activity = self.activity();
		let listeners: Vec<_> = self.listeners.lock().iter().filter_map(Weak::upgrade).collect();
		for listener in listeners {
			listener.on_activity_result(
				activity.as_ref(),
				ActivityResult {
					request_code,
					result_code,
					data: data.clone(),
				},
			);
		}
	}
}

impl Host for MockHost {
	fn current_activity(&self) -> Option<Arc<dyn Activity>> {
		self.activity.lock().clone().map(|a| a as Arc<dyn Activity>)
	}

	fn sdk_int(&self) -> u32 {
		self.sdk_int
	}

	fn add_activity_event_listener(&self, listener: Weak<dyn ActivityEventListener>) {
		self.listeners.lock().push(listener);
	}
}

fn session_for(host: &Arc<MockHost>, config: PickerConfig) -> Arc<PickerSession> {
	PickerSession::new(Arc::clone(host) as Arc<dyn Host>, config).unwrap()
}

/// Completion that records every outcome it receives.
fn recording() -> (Completion, Arc<Mutex<Vec<Outcome>>>) {
	let seen = Arc::new(Mutex::new(Vec::new()));
	let sink = Arc::clone(&seen);
	(Completion::from_fn(move |outcome| sink.lock().push(outcome)), seen)
}

fn single_code(seen: &Mutex<Vec<Outcome>>) -> Option<ErrorCode> {
	let seen = seen.lock();
	assert_eq!(seen.len(), 1, "expected exactly one settlement, got {}", seen.len());
	seen[0].as_ref().err().map(Error::code)
}

#[test]
fn no_activity_rejects_without_dispatch() {
	let host = MockHost::detached();
	let session = session_for(&host, PickerConfig::default());
	let (completion, seen) = recording();

	session.pick_media(completion);

	assert_eq!(single_code(&seen), Some(ErrorCode::NoActivity));
	assert!(!session.is_pending());
}

#[test]
fn dispatch_builds_open_document_intent() {
	let host = MockHost::with_activity(MockActivity::default());
	let session = session_for(&host, PickerConfig::default());
	let (completion, seen) = recording();

	session.pick_media(completion);

	assert!(seen.lock().is_empty());
	assert!(session.is_pending());

	let launches = host.activity().launches.lock().clone();
	assert_eq!(launches.len(), 1);
	let (intent, code) = &launches[0];
	assert_eq!(*code, 9001);
	assert_eq!(intent.action, ACTION_OPEN_DOCUMENT);
	assert!(intent.has_category(CATEGORY_OPENABLE));
	assert_eq!(intent.mime_type.as_deref(), Some("*/*"));
	assert_eq!(intent.extra_mime_types, vec!["image/*", "video/*", "audio/*"]);
	assert!(intent.has_flag(FLAG_GRANT_READ_URI_PERMISSION));
	assert!(intent.has_flag(FLAG_GRANT_PERSISTABLE_URI_PERMISSION));
	assert_eq!(intent.initial_uri.as_deref(), Some("content://media/external/audio/media"));
}

#[test]
fn pre_kitkat_intent_omits_persistable_flag_and_hint() {
	let host = MockHost::with_activity(MockActivity::default());
	let session = session_for(&host, PickerConfig::default());

	let intent = session.build_intent(18);

	assert!(intent.has_flag(FLAG_GRANT_READ_URI_PERMISSION));
	assert!(!intent.has_flag(FLAG_GRANT_PERSISTABLE_URI_PERMISSION));
	assert!(intent.initial_uri.is_none());
}

#[test]
fn ok_result_resolves_and_persists_grant() {
	let host = MockHost::with_activity(MockActivity {
		resolver: Arc::new(MockResolver {
			mime_type: Some("audio/mpeg".into()),
			..Default::default()
		}),
		..Default::default()
	});
	let session = session_for(&host, PickerConfig::default());
	let (completion, seen) = recording();

	session.pick_media(completion);
	host.deliver(
		9001,
		RESULT_OK,
		Some(ResultData::with_uri("content://media/audio/42", FLAG_GRANT_READ_URI_PERMISSION)),
	);

	assert_eq!(single_code(&seen), None);
	let result = seen.lock()[0].as_ref().unwrap().clone();
	assert_eq!(
		result,
		PickResult {
			uri: Some("content://media/audio/42".into()),
			mime_type: Some("audio/mpeg".into()),
			name: None,
			size: None,
		}
	);
	assert_eq!(
		*host.activity().resolver.grants.lock(),
		vec![("content://media/audio/42".to_string(), FLAG_GRANT_READ_URI_PERMISSION)]
	);
	assert!(!session.is_pending());
}

#[test]
fn non_ok_result_rejects_cancelled() {
	let host = MockHost::with_activity(MockActivity::default());
	let session = session_for(&host, PickerConfig::default());
	let (completion, seen) = recording();

	session.pick_media(completion);
	host.deliver(9001, RESULT_CANCELED, None);

	assert_eq!(single_code(&seen), Some(ErrorCode::Cancelled));
	let message = seen.lock()[0].as_ref().unwrap_err().to_string();
	assert_eq!(message, "Audio picking cancelled");
	assert!(!session.is_pending());
}

#[test]
fn ok_without_envelope_rejects_cancelled() {
	let host = MockHost::with_activity(MockActivity::default());
	let session = session_for(&host, PickerConfig::default());
	let (completion, seen) = recording();

	session.pick_media(completion);
	host.deliver(9001, RESULT_OK, None);

	assert_eq!(single_code(&seen), Some(ErrorCode::Cancelled));
}

#[test]
fn ok_with_empty_envelope_resolves_null_uri() {
	let host = MockHost::with_activity(MockActivity::default());
	let session = session_for(&host, PickerConfig::default());
	let (completion, seen) = recording();

	session.pick_media(completion);
	host.deliver(9001, RESULT_OK, Some(ResultData::default()));

	assert_eq!(single_code(&seen), None);
	assert_eq!(*seen.lock()[0].as_ref().unwrap(), PickResult::empty());
	assert!(host.activity().resolver.grants.lock().is_empty());
}

#[test]
fn foreign_request_code_is_ignored() {
	let host = MockHost::with_activity(MockActivity::default());
	let session = session_for(&host, PickerConfig::default());
	let (completion, seen) = recording();

	session.pick_media(completion);
	host.deliver(1234, RESULT_OK, Some(ResultData::with_uri("content://other/1", 0)));

	assert!(seen.lock().is_empty());
	assert!(session.is_pending());

	host.deliver(9001, RESULT_CANCELED, None);
	assert_eq!(single_code(&seen), Some(ErrorCode::Cancelled));
}

#[test]
fn result_without_pending_pick_is_ignored() {
	let host = MockHost::with_activity(MockActivity::default());
	let session = session_for(&host, PickerConfig::default());

	host.deliver(9001, RESULT_OK, Some(ResultData::with_uri("content://stale/1", 0)));

	assert!(!session.is_pending());
	assert_eq!(session.pending_count(), 0);
}

#[test]
fn second_pick_is_rejected_busy() {
	let host = MockHost::with_activity(MockActivity::default());
	let session = session_for(&host, PickerConfig::default());
	let (first, first_seen) = recording();
	let (second, second_seen) = recording();

	session.pick_media(first);
	session.pick_media(second);

	assert_eq!(single_code(&second_seen), Some(ErrorCode::Busy));
	assert!(first_seen.lock().is_empty());
	assert_eq!(host.activity().launches.lock().len(), 1);

	host.deliver(9001, RESULT_OK, Some(ResultData::with_uri("content://x/1", 0)));
	assert_eq!(single_code(&first_seen), None);
	assert_eq!(second_seen.lock().len(), 1);
}

#[tokio::test]
async fn replace_policy_orphans_earlier_pick() {
	let host = MockHost::with_activity(MockActivity::default());
	let config = PickerConfig {
		reentry: ReentryPolicy::Replace,
		..PickerConfig::default()
	};
	let session = session_for(&host, config);

	let (first, first_future) = Completion::channel();
	let (second, second_future) = Completion::channel();
	session.pick_media(first);
	session.pick_media(second);

	assert_eq!(session.pending_count(), 1);
	assert_eq!(host.activity().launches.lock().len(), 2);
	assert!(matches!(first_future.await, Err(Error::Orphaned)));

	host.deliver(9001, RESULT_OK, Some(ResultData::with_uri("content://x/2", 0)));
	let result = second_future.await.unwrap();
	assert_eq!(result.uri.as_deref(), Some("content://x/2"));
}

#[test]
fn launch_failure_rejects_cancelled_and_frees_slot() {
	let host = MockHost::with_activity(MockActivity {
		fail_launch: true,
		..Default::default()
	});
	let session = session_for(&host, PickerConfig::default());
	let (completion, seen) = recording();

	session.pick_media(completion);

	assert_eq!(single_code(&seen), Some(ErrorCode::Cancelled));
	assert!(!session.is_pending());
}

#[test]
fn grant_failure_still_resolves() {
	let host = MockHost::with_activity(MockActivity {
		resolver: Arc::new(MockResolver {
			fail_grant: true,
			..Default::default()
		}),
		..Default::default()
	});
	let session = session_for(&host, PickerConfig::default());
	let (completion, seen) = recording();

	session.pick_media(completion);
	host.deliver(
		9001,
		RESULT_OK,
		Some(ResultData::with_uri("content://media/audio/7", FLAG_GRANT_READ_URI_PERMISSION)),
	);

	assert_eq!(single_code(&seen), None);
	assert_eq!(
		seen.lock()[0].as_ref().unwrap().uri.as_deref(),
		Some("content://media/audio/7")
	);
	assert_eq!(host.activity().resolver.grants.lock().len(), 1);
}

#[test]
fn grant_persistence_can_be_disabled() {
	let host = MockHost::with_activity(MockActivity::default());
	let config = PickerConfig {
		persist_grants: false,
		..PickerConfig::default()
	};
	let session = session_for(&host, config);
	let (completion, _seen) = recording();

	session.pick_media(completion);
	host.deliver(9001, RESULT_OK, Some(ResultData::with_uri("content://x/1", 1)));

	assert!(host.activity().resolver.grants.lock().is_empty());
}

#[test]
fn duplicate_results_settle_once() {
	let host = MockHost::with_activity(MockActivity::default());
	let session = session_for(&host, PickerConfig::default());
	let calls = Arc::new(AtomicUsize::new(0));
	let counter = Arc::clone(&calls);

	session.pick_media(Completion::from_fn(move |_| {
		counter.fetch_add(1, Ordering::SeqCst);
	}));
	host.deliver(9001, RESULT_OK, Some(ResultData::with_uri("content://x/1", 0)));
	host.deliver(9001, RESULT_CANCELED, None);

	assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn reentrant_pick_from_completion_sees_empty_slot() {
	let host = MockHost::with_activity(MockActivity::default());
	let session = session_for(&host, PickerConfig::default());
	let (inner, inner_seen) = recording();
	let inner = Mutex::new(Some(inner));
	let observed_pending = Arc::new(Mutex::new(None));

	let reentrant_session = Arc::clone(&session);
	let observed = Arc::clone(&observed_pending);
	session.pick_media(Completion::from_fn(move |_| {
		*observed.lock() = Some(reentrant_session.is_pending());
		if let Some(next) = inner.lock().take() {
			reentrant_session.pick_media(next);
		}
	}));

	host.deliver(9001, RESULT_CANCELED, None);

	assert_eq!(*observed_pending.lock(), Some(false));
	assert!(inner_seen.lock().is_empty(), "re-entrant pick must not be rejected");
	assert!(session.is_pending());
	assert_eq!(host.activity().launches.lock().len(), 2);
}

#[test]
fn invalid_config_is_refused() {
	let host = MockHost::detached();
	let config = PickerConfig {
		request_code: -5,
		..PickerConfig::default()
	};

	let err = PickerSession::new(host as Arc<dyn Host>, config).unwrap_err();
	assert!(matches!(err, Error::InvalidConfig(_)));
}

#[test]
fn sessions_on_one_host_share_the_pending_slot() {
	let host = MockHost::with_activity(MockActivity::default());
	let first = session_for(&host, PickerConfig::default());
	let second = session_for(&host, PickerConfig::default());

	assert!(Arc::ptr_eq(&first, &second));
	assert_eq!(host.listeners.lock().len(), 1);

	let (a, a_seen) = recording();
	let (b, b_seen) = recording();
	first.pick_media(a);
	second.pick_media(b);

	assert_eq!(single_code(&b_seen), Some(ErrorCode::Busy));
	assert_eq!(host.activity().launches.lock().len(), 1);

	host.deliver(9001, RESULT_OK, Some(ResultData::with_uri("content://x/1", 0)));
	assert_eq!(single_code(&a_seen), None);
	assert_eq!(a_seen.lock().len(), 1);
}

#[test]
fn conflicting_config_on_same_host_is_refused() {
	let host = MockHost::with_activity(MockActivity::default());
	let _session = session_for(&host, PickerConfig::default());

	let err = PickerSession::new(Arc::clone(&host) as Arc<dyn Host>, PickerConfig::audio_only()).unwrap_err();
	assert!(matches!(err, Error::InvalidConfig(_)));
}

#[test]
fn dropped_session_frees_the_host() {
	let host = MockHost::with_activity(MockActivity::default());
	drop(session_for(&host, PickerConfig::default()));

	let session = session_for(&host, PickerConfig::audio_only());
	assert_eq!(session.config().allowed_mime_types, vec!["audio/*".to_string()]);
}
