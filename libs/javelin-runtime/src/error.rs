use std::io;
use thiserror::Error;

/// Failures with a user-facing message. Everything else travels as an
/// `eyre::Report` with context attached at the call site.
#[derive(Debug, Error)]
pub enum LoadError {
	#[error("An IOException occurred reading {path}: {source}")]
	Io {
		path: String,
		#[source]
		source: io::Error,
	},

	#[error("An IOException occurred reading {path}: the magic number is invalid. Expected: {expected:x}, Got: {found:x}")]
	JmodMagic {
		path: String,
		expected: u16,
		found: u16,
	},

	#[error("Invalid or corrupt jarfile {path}")]
	CorruptJar { path: String },

	#[error("JAVA_HOME ({path}) does not exist")]
	JavaHomeMissing { path: String },

	#[error("Base JMOD with name {name} not found in {dir}")]
	BaseJmodNotFound { name: String, dir: String },

	#[error("no main manifest attribute, in {jar}")]
	NoMainManifest { jar: String },
}
