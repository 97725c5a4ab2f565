//! Metadata lookup for a picked locator.
//!
//! Every attribute is optional. A provider that throws, returns no cursor, or
//! lacks a column only shrinks the result; [`describe`] itself never fails.

use picker_protocol::{COLUMN_DISPLAY_NAME, COLUMN_SIZE, PickResult};

use crate::error::Result;
use crate::host::ContentResolver;

/// Attributes the content resolver reported for a locator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaMetadata {
	pub mime_type: Option<String>,
	pub name: Option<String>,
	pub size: Option<u64>,
}

impl MediaMetadata {
	/// Copies every known attribute onto `result`.
	pub fn apply_to(self, result: &mut PickResult) {
		if self.mime_type.is_some() {
			result.mime_type = self.mime_type;
		}
		if self.name.is_some() {
			result.name = self.name;
		}
		if self.size.is_some() {
			result.size = self.size;
		}
	}
}

/// Queries MIME type, display name, and size for `uri`.
pub fn describe(resolver: &dyn ContentResolver, uri: &str) -> MediaMetadata {
	let mut meta = MediaMetadata::default();

	match resolver.get_type(uri) {
		Ok(mime_type) => meta.mime_type = mime_type,
		Err(e) => tracing::debug!(uri, error = %e, "MIME type lookup failed"),
	}

	if let Err(e) = read_openable_columns(resolver, uri, &mut meta) {
		tracing::debug!(uri, error = %e, "Openable column query failed");
	}

	meta
}

/// Reads the first row's openable columns. The cursor is released on return.
fn read_openable_columns(resolver: &dyn ContentResolver, uri: &str, meta: &mut MediaMetadata) -> Result<()> {
	let Some(mut cursor) = resolver.query(uri)? else {
		tracing::debug!(uri, "Provider returned no cursor");
		return Ok(());
	};

	if !cursor.move_to_first()? {
		tracing::debug!(uri, "Provider returned no rows");
		return Ok(());
	}

	if let Some(index) = cursor.column_index(COLUMN_DISPLAY_NAME) {
		meta.name = cursor.get_string(index)?;
	}

	if let Some(index) = cursor.column_index(COLUMN_SIZE) {
		if !cursor.is_null(index)? {
			let size = cursor.get_long(index)?;
			meta.size = u64::try_from(size).ok();
		}
	}

	Ok(())
}
