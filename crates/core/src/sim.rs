//! In-memory host for tests and scenario replay.
//!
//! [`SimHost`] plays the operating system: it has (or lacks) a foreground
//! activity, a content resolver backed by a table of [`SimDocument`]s, and
//! switches to make the chooser launch, grant, or query calls fail. Every
//! launch and grant is recorded so callers can assert on what the picker did.
//!
//! Activity results are fed back with [`SimHost::deliver`], which fans out to
//! every registered listener exactly like the platform does.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use picker_protocol::{ActivityResult, Intent, RESULT_CANCELED, RESULT_OK, ResultData};
use picker_runtime::{Activity, ActivityEventListener, ContentResolver, Cursor, Error, Host, Result};
use serde::{Deserialize, Serialize};

/// A single cell of a simulated provider row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SimValue {
	Integer(i64),
	Text(String),
	Null,
}

/// A document the simulated provider knows about.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SimDocument {
	/// What `getType` reports.
	pub mime_type: Option<String>,
	/// Columns of the document's single row. Absent columns are not exposed at all.
	pub columns: BTreeMap<String, SimValue>,
}

impl SimDocument {
	/// A document with a MIME type, display name, and size.
	pub fn media(mime_type: &str, name: &str, size: i64) -> Self {
		let mut columns = BTreeMap::new();
		columns.insert(picker_protocol::COLUMN_DISPLAY_NAME.to_string(), SimValue::Text(name.to_string()));
		columns.insert(picker_protocol::COLUMN_SIZE.to_string(), SimValue::Integer(size));
		Self {
			mime_type: Some(mime_type.to_string()),
			columns,
		}
	}
}

/// Serializable description of the simulated host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SimHostState {
	/// Whether an activity is in the foreground.
	pub foreground: bool,
	pub sdk_int: u32,
	/// Provider table keyed by locator.
	pub documents: BTreeMap<String, SimDocument>,
	/// `startActivityForResult` throws.
	pub fail_launch: bool,
	/// `takePersistableUriPermission` throws.
	pub fail_grant: bool,
	/// `query` throws.
	pub fail_query: bool,
}

impl Default for SimHostState {
	fn default() -> Self {
		Self {
			foreground: true,
			sdk_int: 33,
			documents: BTreeMap::new(),
			fail_launch: false,
			fail_grant: false,
			fail_query: false,
		}
	}
}

/// A chooser launch the picker performed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Launch {
	pub intent: Intent,
	pub request_code: i32,
}

#[derive(Default)]
struct Journal {
	launches: Mutex<Vec<Launch>>,
	grants: Mutex<Vec<(String, i32)>>,
	open_cursors: Arc<AtomicUsize>,
}

/// Scriptable stand-in for the host operating system.
pub struct SimHost {
	state: Arc<Mutex<SimHostState>>,
	journal: Arc<Journal>,
	activity: Arc<SimActivity>,
	listeners: Mutex<Vec<Weak<dyn ActivityEventListener>>>,
}

impl SimHost {
	pub fn new() -> Arc<Self> {
		Self::from_state(SimHostState::default())
	}

	pub fn from_state(state: SimHostState) -> Arc<Self> {
		let state = Arc::new(Mutex::new(state));
		let journal = Arc::new(Journal::default());
		let activity = Arc::new(SimActivity {
			resolver: Arc::new(SimResolver {
				state: Arc::clone(&state),
				journal: Arc::clone(&journal),
			}),
			state: Arc::clone(&state),
			journal: Arc::clone(&journal),
		});

		Arc::new(Self {
			state,
			journal,
			activity,
			listeners: Mutex::new(Vec::new()),
		})
	}

	/// Mutates the simulated host state.
	pub fn update(&self, f: impl FnOnce(&mut SimHostState)) {
		f(&mut self.state.lock());
	}

	pub fn set_foreground(&self, foreground: bool) {
		self.update(|s| s.foreground = foreground);
	}

	pub fn insert_document(&self, uri: impl Into<String>, document: SimDocument) {
		let uri = uri.into();
		self.update(move |s| {
			s.documents.insert(uri, document);
		});
	}

	/// Chooser launches performed so far.
	pub fn launches(&self) -> Vec<Launch> {
		self.journal.launches.lock().clone()
	}

	/// `(uri, flags)` of every persistable-grant request, including failed ones.
	pub fn grants(&self) -> Vec<(String, i32)> {
		self.journal.grants.lock().clone()
	}

	/// Cursors handed out and not yet released.
	pub fn open_cursors(&self) -> usize {
		self.journal.open_cursors.load(Ordering::SeqCst)
	}

	/// Live listeners. Dead registrations are pruned on the next registration.
	pub fn listener_count(&self) -> usize {
		self.listeners.lock().iter().filter(|l| l.strong_count() > 0).count()
	}

	/// Registrations held, live or not.
	pub fn registered_listeners(&self) -> usize {
		self.listeners.lock().len()
	}

	/// Delivers an activity result to every live listener.
	pub fn deliver(&self, result: ActivityResult) {
		let listeners: Vec<_> = self.listeners.lock().iter().filter_map(Weak::upgrade).collect();
		tracing::debug!(
			request_code = result.request_code,
			result_code = result.result_code,
			listeners = listeners.len(),
			"Delivering activity result"
		);
		for listener in listeners {
			listener.on_activity_result(self.activity.as_ref(), result.clone());
		}
	}

	/// The user picked `uri`; the envelope carries a read grant.
	pub fn deliver_pick(&self, request_code: i32, uri: &str) {
		self.deliver(ActivityResult {
			request_code,
			result_code: RESULT_OK,
			data: Some(ResultData::with_uri(uri, picker_protocol::FLAG_GRANT_READ_URI_PERMISSION)),
		});
	}

	/// The user backed out of the chooser.
	pub fn deliver_cancel(&self, request_code: i32) {
		self.deliver(ActivityResult {
			request_code,
			result_code: RESULT_CANCELED,
			data: None,
		});
	}
}

impl Host for SimHost {
	fn current_activity(&self) -> Option<Arc<dyn Activity>> {
		if !self.state.lock().foreground {
			return None;
		}
		Some(Arc::clone(&self.activity) as Arc<dyn Activity>)
	}

	fn sdk_int(&self) -> u32 {
		self.state.lock().sdk_int
	}

	fn add_activity_event_listener(&self, listener: Weak<dyn ActivityEventListener>) {
		let mut listeners = self.listeners.lock();
		listeners.retain(|l| l.strong_count() > 0);
		listeners.push(listener);
	}
}

struct SimActivity {
	resolver: Arc<SimResolver>,
	state: Arc<Mutex<SimHostState>>,
	journal: Arc<Journal>,
}

impl Activity for SimActivity {
	fn start_activity_for_result(&self, intent: &Intent, request_code: i32) -> Result<()> {
		if self.state.lock().fail_launch {
			return Err(Error::host("ActivityNotFoundException: No Activity found to handle Intent"));
		}
		self.journal.launches.lock().push(Launch {
			intent: intent.clone(),
			request_code,
		});
		Ok(())
	}

	fn content_resolver(&self) -> Arc<dyn ContentResolver> {
		Arc::clone(&self.resolver) as Arc<dyn ContentResolver>
	}
}

struct SimResolver {
	state: Arc<Mutex<SimHostState>>,
	journal: Arc<Journal>,
}

impl ContentResolver for SimResolver {
	fn get_type(&self, uri: &str) -> Result<Option<String>> {
		Ok(self.state.lock().documents.get(uri).and_then(|d| d.mime_type.clone()))
	}

	fn query(&self, uri: &str) -> Result<Option<Box<dyn Cursor>>> {
		let state = self.state.lock();
		if state.fail_query {
			return Err(Error::host(format!("SecurityException: Permission Denial reading {uri}")));
		}

		let Some(document) = state.documents.get(uri) else {
			return Ok(None);
		};

		let cursor: Box<dyn Cursor> = Box::new(SimCursor::open(
			document.columns.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
			Arc::clone(&self.journal.open_cursors),
		));
		Ok(Some(cursor))
	}

	fn take_persistable_uri_permission(&self, uri: &str, flags: i32) -> Result<()> {
		self.journal.grants.lock().push((uri.to_string(), flags));
		if self.state.lock().fail_grant {
			return Err(Error::host(format!("SecurityException: No persistable permission grants found for {uri}")));
		}
		Ok(())
	}
}

struct SimCursor {
	columns: Vec<(String, SimValue)>,
	open: Arc<AtomicUsize>,
}

impl SimCursor {
	fn open(columns: Vec<(String, SimValue)>, open: Arc<AtomicUsize>) -> Self {
		open.fetch_add(1, Ordering::SeqCst);
		Self { columns, open }
	}

	fn value(&self, index: usize) -> Result<&SimValue> {
		self.columns
			.get(index)
			.map(|(_, v)| v)
			.ok_or_else(|| Error::host(format!("CursorIndexOutOfBoundsException: column {index}")))
	}
}

impl Cursor for SimCursor {
	fn move_to_first(&mut self) -> Result<bool> {
		Ok(true)
	}

	fn column_index(&self, name: &str) -> Option<usize> {
		self.columns.iter().position(|(k, _)| k == name)
	}

	fn is_null(&self, index: usize) -> Result<bool> {
		Ok(matches!(self.value(index)?, SimValue::Null))
	}

	fn get_string(&self, index: usize) -> Result<Option<String>> {
		Ok(match self.value(index)? {
			SimValue::Text(s) => Some(s.clone()),
			SimValue::Integer(n) => Some(n.to_string()),
			SimValue::Null => None,
		})
	}

	fn get_long(&self, index: usize) -> Result<i64> {
		match self.value(index)? {
			SimValue::Integer(n) => Ok(*n),
			SimValue::Null => Ok(0),
			SimValue::Text(s) => s
				.parse()
				.map_err(|_| Error::host(format!("NumberFormatException: '{s}'"))),
		}
	}
}

impl Drop for SimCursor {
	fn drop(&mut self) {
		self.open.fetch_sub(1, Ordering::SeqCst);
	}
}
