//! Android host over JNI.
//!
//! [`JniHost`] implements the picker's host ports with framework calls made
//! through `jni`. The Java `AudioPickerBridge` class talks to native code
//! through three static methods:
//!
//! - `nativeSetActivity(Activity)` whenever the foreground activity changes
//!   (`null` when the app goes to the background)
//! - `nativeOnActivityResult(Activity, int, int, Intent)` from `onActivityResult`
//! - `nativePickAudio(Object callback)` to start a pick. The outcome arrives as
//!   the bridge reply JSON through `callback.onPickResult(String)`.
//!
//! The `JavaVM` is taken from the `JNIEnv` of the first call, so no NDK glue
//! has to run beforehand. The process-wide [`AudioPicker`] is built by the
//! first `nativePickAudio` call.
//!
//! Java exceptions thrown by framework calls are cleared and surfaced as
//! [`Error::Host`].

use std::sync::{Arc, OnceLock, Weak};

use jni::objects::{GlobalRef, JClass, JObject, JString, JValue};
use jni::sys::jint;
use jni::{JNIEnv, JavaVM};
use parking_lot::Mutex;
use picker_protocol::{ActivityResult, Intent, ResultData};
use picker_runtime::{Activity, ActivityEventListener, Completion, ContentResolver, Cursor, Error, Host, Result};

use crate::audio_picker::{AudioPicker, reply_json};

const CLASS_INTENT: &str = "android/content/Intent";
const CLASS_URI: &str = "android/net/Uri";
const CLASS_STRING: &str = "java/lang/String";
const SIG_INTENT_STRING: &str = "(Ljava/lang/String;)Landroid/content/Intent;";

static SHARED_HOST: OnceLock<Arc<JniHost>> = OnceLock::new();
static SHARED_PICKER: OnceLock<AudioPicker> = OnceLock::new();

/// Runs `f` with an attached environment inside a fresh local frame.
fn with_env<R, F>(vm: &JavaVM, f: F) -> Result<R>
where
	F: for<'a> FnOnce(&mut JNIEnv<'a>) -> jni::errors::Result<R>,
{
	let mut env = vm
		.attach_current_thread()
		.map_err(|e| Error::host(format!("JNI attach failed: {e}")))?;

	let outcome = env.with_local_frame(32, |env| f(env));
	outcome.map_err(|e| {
		if env.exception_check().unwrap_or(false) {
			let _ = env.exception_describe();
			let _ = env.exception_clear();
		}
		Error::host(e.to_string())
	})
}

fn parse_uri<'a>(env: &mut JNIEnv<'a>, uri: &str) -> jni::errors::Result<JObject<'a>> {
	let uri = env.new_string(uri)?;
	env.call_static_method(
		CLASS_URI,
		"parse",
		"(Ljava/lang/String;)Landroid/net/Uri;",
		&[JValue::Object(&uri)],
	)?
	.l()
}

fn opt_string(env: &mut JNIEnv<'_>, obj: JObject<'_>) -> jni::errors::Result<Option<String>> {
	if obj.is_null() {
		return Ok(None);
	}
	let jstr = JString::from(obj);
	let value: String = env.get_string(&jstr)?.into();
	Ok(Some(value))
}

/// Host ports backed by the Android framework.
pub struct JniHost {
	vm: Arc<JavaVM>,
	sdk_int: u32,
	activity: Mutex<Option<GlobalRef>>,
	listeners: Mutex<Vec<Weak<dyn ActivityEventListener>>>,
}

impl JniHost {
	/// Returns the process-wide host, if a native entry point has created it.
	pub fn shared() -> Option<Arc<JniHost>> {
		SHARED_HOST.get().map(Arc::clone)
	}

	/// Returns the process-wide host, creating it from `env` on first use.
	pub fn attach(env: &JNIEnv<'_>) -> Result<Arc<JniHost>> {
		if let Some(host) = Self::shared() {
			return Ok(host);
		}

		let vm = Arc::new(
			env.get_java_vm()
				.map_err(|e| Error::host(format!("JavaVM unavailable: {e}")))?,
		);

		let sdk_int = with_env(&vm, |env| {
			env.get_static_field("android/os/Build$VERSION", "SDK_INT", "I")?.i()
		})?;

		let host = Arc::new(JniHost {
			vm,
			sdk_int: u32::try_from(sdk_int).unwrap_or(0),
			activity: Mutex::new(None),
			listeners: Mutex::new(Vec::new()),
		});
		tracing::debug!(sdk_int, "JNI host created");

		Ok(Arc::clone(SHARED_HOST.get_or_init(|| host)))
	}

	fn set_activity(&self, activity: Option<GlobalRef>) {
		*self.activity.lock() = activity;
	}

	fn activity_for(&self, activity: GlobalRef) -> Result<JniActivity> {
		let resolver = with_env(&self.vm, |env| {
			let resolver = env
				.call_method(
					activity.as_obj(),
					"getContentResolver",
					"()Landroid/content/ContentResolver;",
					&[],
				)?
				.l()?;
			env.new_global_ref(resolver)
		})?;

		Ok(JniActivity {
			vm: Arc::clone(&self.vm),
			activity,
			resolver: Arc::new(JniResolver {
				vm: Arc::clone(&self.vm),
				resolver,
			}),
		})
	}

	fn dispatch(&self, activity: &dyn Activity, result: ActivityResult) {
		let listeners: Vec<_> = self.listeners.lock().iter().filter_map(Weak::upgrade).collect();
		for listener in listeners {
			listener.on_activity_result(activity, result.clone());
		}
	}
}

impl Host for JniHost {
	fn current_activity(&self) -> Option<Arc<dyn Activity>> {
		let activity = self.activity.lock().clone()?;
		match self.activity_for(activity) {
			Ok(activity) => Some(Arc::new(activity)),
			Err(e) => {
				tracing::warn!(error = %e, "Foreground activity unusable");
				None
			}
		}
	}

	fn sdk_int(&self) -> u32 {
		self.sdk_int
	}

	fn add_activity_event_listener(&self, listener: Weak<dyn ActivityEventListener>) {
		let mut listeners = self.listeners.lock();
		listeners.retain(|l| l.strong_count() > 0);
		listeners.push(listener);
	}
}

struct JniActivity {
	vm: Arc<JavaVM>,
	activity: GlobalRef,
	resolver: Arc<JniResolver>,
}

impl Activity for JniActivity {
	fn start_activity_for_result(&self, intent: &Intent, request_code: i32) -> Result<()> {
		with_env(&self.vm, |env| {
			let action = env.new_string(&intent.action)?;
			let android_intent = env.new_object(CLASS_INTENT, "(Ljava/lang/String;)V", &[JValue::Object(&action)])?;

			for category in &intent.categories {
				let category = env.new_string(category)?;
				env.call_method(&android_intent, "addCategory", SIG_INTENT_STRING, &[JValue::Object(&category)])?;
			}

			if let Some(mime_type) = &intent.mime_type {
				let mime_type = env.new_string(mime_type)?;
				env.call_method(&android_intent, "setType", SIG_INTENT_STRING, &[JValue::Object(&mime_type)])?;
			}

			if !intent.extra_mime_types.is_empty() {
				let array =
					env.new_object_array(intent.extra_mime_types.len() as jint, CLASS_STRING, JObject::null())?;
				for (i, mime) in intent.extra_mime_types.iter().enumerate() {
					let mime = env.new_string(mime)?;
					env.set_object_array_element(&array, i as jint, mime)?;
				}
				let key = env.new_string(picker_protocol::EXTRA_MIME_TYPES)?;
				env.call_method(
					&android_intent,
					"putExtra",
					"(Ljava/lang/String;[Ljava/lang/String;)Landroid/content/Intent;",
					&[JValue::Object(&key), JValue::Object(&array)],
				)?;
			}

			if let Some(initial_uri) = &intent.initial_uri {
				let uri = parse_uri(env, initial_uri)?;
				let key = env.new_string(picker_protocol::EXTRA_INITIAL_URI)?;
				env.call_method(
					&android_intent,
					"putExtra",
					"(Ljava/lang/String;Landroid/os/Parcelable;)Landroid/content/Intent;",
					&[JValue::Object(&key), JValue::Object(&uri)],
				)?;
			}

			env.call_method(
				&android_intent,
				"addFlags",
				"(I)Landroid/content/Intent;",
				&[JValue::Int(intent.flags)],
			)?;

			env.call_method(
				self.activity.as_obj(),
				"startActivityForResult",
				"(Landroid/content/Intent;I)V",
				&[JValue::Object(&android_intent), JValue::Int(request_code)],
			)?;
			Ok(())
		})
	}

	fn content_resolver(&self) -> Arc<dyn ContentResolver> {
		Arc::clone(&self.resolver) as Arc<dyn ContentResolver>
	}
}

struct JniResolver {
	vm: Arc<JavaVM>,
	resolver: GlobalRef,
}

impl ContentResolver for JniResolver {
	fn get_type(&self, uri: &str) -> Result<Option<String>> {
		with_env(&self.vm, |env| {
			let uri = parse_uri(env, uri)?;
			let mime = env
				.call_method(
					self.resolver.as_obj(),
					"getType",
					"(Landroid/net/Uri;)Ljava/lang/String;",
					&[JValue::Object(&uri)],
				)?
				.l()?;
			opt_string(env, mime)
		})
	}

	fn query(&self, uri: &str) -> Result<Option<Box<dyn Cursor>>> {
		let cursor = with_env(&self.vm, |env| {
			let uri = parse_uri(env, uri)?;
			let null = JObject::null();
			let cursor = env
				.call_method(
					self.resolver.as_obj(),
					"query",
					"(Landroid/net/Uri;[Ljava/lang/String;Ljava/lang/String;[Ljava/lang/String;Ljava/lang/String;)Landroid/database/Cursor;",
					&[
						JValue::Object(&uri),
						JValue::Object(&null),
						JValue::Object(&null),
						JValue::Object(&null),
						JValue::Object(&null),
					],
				)?
				.l()?;
			if cursor.is_null() {
				return Ok(None);
			}
			env.new_global_ref(cursor).map(Some)
		})?;

		Ok(cursor.map(|cursor| {
			let cursor: Box<dyn Cursor> = Box::new(JniCursor {
				vm: Arc::clone(&self.vm),
				cursor,
			});
			cursor
		}))
	}

	fn take_persistable_uri_permission(&self, uri: &str, flags: i32) -> Result<()> {
		with_env(&self.vm, |env| {
			let uri = parse_uri(env, uri)?;
			env.call_method(
				self.resolver.as_obj(),
				"takePersistableUriPermission",
				"(Landroid/net/Uri;I)V",
				&[JValue::Object(&uri), JValue::Int(flags)],
			)?;
			Ok(())
		})
	}
}

struct JniCursor {
	vm: Arc<JavaVM>,
	cursor: GlobalRef,
}

impl Cursor for JniCursor {
	fn move_to_first(&mut self) -> Result<bool> {
		with_env(&self.vm, |env| env.call_method(self.cursor.as_obj(), "moveToFirst", "()Z", &[])?.z())
	}

	fn column_index(&self, name: &str) -> Option<usize> {
		let index = with_env(&self.vm, |env| {
			let name = env.new_string(name)?;
			env.call_method(
				self.cursor.as_obj(),
				"getColumnIndex",
				"(Ljava/lang/String;)I",
				&[JValue::Object(&name)],
			)?
			.i()
		});
		index.ok().and_then(|i| usize::try_from(i).ok())
	}

	fn is_null(&self, index: usize) -> Result<bool> {
		with_env(&self.vm, |env| {
			env.call_method(self.cursor.as_obj(), "isNull", "(I)Z", &[JValue::Int(index as jint)])?
				.z()
		})
	}

	fn get_string(&self, index: usize) -> Result<Option<String>> {
		with_env(&self.vm, |env| {
			let value = env
				.call_method(
					self.cursor.as_obj(),
					"getString",
					"(I)Ljava/lang/String;",
					&[JValue::Int(index as jint)],
				)?
				.l()?;
			opt_string(env, value)
		})
	}

	fn get_long(&self, index: usize) -> Result<i64> {
		with_env(&self.vm, |env| {
			env.call_method(self.cursor.as_obj(), "getLong", "(I)J", &[JValue::Int(index as jint)])?
				.j()
		})
	}
}

impl Drop for JniCursor {
	fn drop(&mut self) {
		let closed = with_env(&self.vm, |env| {
			env.call_method(self.cursor.as_obj(), "close", "()V", &[]).map(|_| ())
		});
		if let Err(e) = closed {
			tracing::debug!(error = %e, "Cursor close failed");
		}
	}
}

fn read_result_data(env: &mut JNIEnv<'_>, data: &JObject<'_>) -> jni::errors::Result<Option<ResultData>> {
	if data.is_null() {
		return Ok(None);
	}

	let uri = env.call_method(data, "getData", "()Landroid/net/Uri;", &[])?.l()?;
	let uri = if uri.is_null() {
		None
	} else {
		let text = env.call_method(&uri, "toString", "()Ljava/lang/String;", &[])?.l()?;
		opt_string(env, text)?
	};
	let flags = env.call_method(data, "getFlags", "()I", &[])?.i()?;

	Ok(Some(ResultData { uri, flags }))
}

#[unsafe(no_mangle)]
pub extern "system" fn Java_com_aqualink_tindo_AudioPickerBridge_nativeSetActivity<'local>(
	env: JNIEnv<'local>,
	_class: JClass<'local>,
	activity: JObject<'local>,
) {
	let host = match JniHost::attach(&env) {
		Ok(host) => host,
		Err(e) => {
			tracing::error!(error = %e, "JNI host unavailable");
			return;
		}
	};

	if activity.is_null() {
		host.set_activity(None);
		return;
	}

	match env.new_global_ref(&activity) {
		Ok(global) => host.set_activity(Some(global)),
		Err(e) => tracing::error!(error = %e, "Could not pin foreground activity"),
	}
}

#[unsafe(no_mangle)]
pub extern "system" fn Java_com_aqualink_tindo_AudioPickerBridge_nativeOnActivityResult<'local>(
	mut env: JNIEnv<'local>,
	_class: JClass<'local>,
	activity: JObject<'local>,
	request_code: jint,
	result_code: jint,
	data: JObject<'local>,
) {
	let Some(host) = JniHost::shared() else {
		tracing::debug!(request_code, "Activity result before picker host was created");
		return;
	};

	let data = match read_result_data(&mut env, &data) {
		Ok(data) => data,
		Err(e) => {
			if env.exception_check().unwrap_or(false) {
				let _ = env.exception_clear();
			}
			tracing::warn!(error = %e, "Unreadable activity result envelope");
			None
		}
	};

	let activity = match env.new_global_ref(&activity) {
		Ok(global) => global,
		Err(e) => {
			tracing::error!(error = %e, "Could not pin result activity");
			return;
		}
	};

	let activity = match host.activity_for(activity) {
		Ok(activity) => activity,
		Err(e) => {
			tracing::error!(error = %e, "Result activity unusable");
			return;
		}
	};

	host.dispatch(
		&activity,
		ActivityResult {
			request_code,
			result_code,
			data,
		},
	);
}

/// Returns the process-wide picker, building it over the shared host on first use.
fn shared_picker(env: &JNIEnv<'_>) -> Result<(&'static AudioPicker, Arc<JniHost>)> {
	let host = JniHost::attach(env)?;
	if let Some(picker) = SHARED_PICKER.get() {
		return Ok((picker, host));
	}
	let picker = AudioPicker::new(Arc::clone(&host) as Arc<dyn Host>)?;
	Ok((SHARED_PICKER.get_or_init(|| picker), host))
}

/// Calls `callback.onPickResult(String)` with the reply JSON.
fn notify_callback(vm: &JavaVM, callback: &GlobalRef, reply: &str) -> Result<()> {
	with_env(vm, |env| {
		let reply = env.new_string(reply)?;
		env.call_method(
			callback.as_obj(),
			"onPickResult",
			"(Ljava/lang/String;)V",
			&[JValue::Object(&reply)],
		)?;
		Ok(())
	})
}

#[unsafe(no_mangle)]
pub extern "system" fn Java_com_aqualink_tindo_AudioPickerBridge_nativePickAudio<'local>(
	env: JNIEnv<'local>,
	_class: JClass<'local>,
	callback: JObject<'local>,
) {
	let callback = match env.new_global_ref(&callback) {
		Ok(global) => global,
		Err(e) => {
			tracing::error!(error = %e, "Could not pin pick callback");
			return;
		}
	};

	let (picker, host) = match shared_picker(&env) {
		Ok(shared) => shared,
		Err(e) => {
			tracing::error!(error = %e, "Picker unavailable");
			let reply = reply_json(Err(e)).to_string();
			if let Ok(vm) = env.get_java_vm() {
				if let Err(e) = notify_callback(&vm, &callback, &reply) {
					tracing::error!(error = %e, "Pick callback failed");
				}
			}
			return;
		}
	};

	let vm = Arc::clone(&host.vm);
	picker.pick_audio_with(Completion::from_fn(move |outcome| {
		let reply = reply_json(outcome).to_string();
		if let Err(e) = notify_callback(&vm, &callback, &reply) {
			tracing::error!(error = %e, "Pick callback failed");
		}
	}));
}
