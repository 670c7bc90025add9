use std::fs::read;
use std::path::PathBuf;

#[cfg(windows)]
const CLASSPATH_SEPARATOR: char = ';';
#[cfg(not(windows))]
const CLASSPATH_SEPARATOR: char = ':';

/// Anywhere raw class bytes can come from. `name` is the internal form,
/// e.g. `java/lang/Object`.
pub trait ClassSource: Send + Sync {
	fn try_load(&self, name: &str) -> eyre::Result<Option<Vec<u8>>>;
}

/// Loose class files under one or more classpath roots, probed in order.
pub struct DirectoryClassSource {
	roots: Vec<PathBuf>,
}

impl DirectoryClassSource {
	pub fn new(dir: impl Into<PathBuf>) -> DirectoryClassSource {
		DirectoryClassSource {
			roots: vec![dir.into()],
		}
	}

	/// Splits a classpath string on the platform separator. Entries naming
	/// nothing on disk are kept; they may exist by the time they are probed.
	pub fn from_classpath(classpath: &str) -> DirectoryClassSource {
		DirectoryClassSource {
			roots: classpath
				.split(CLASSPATH_SEPARATOR)
				.filter(|entry| !entry.is_empty())
				.map(PathBuf::from)
				.collect(),
		}
	}
}

impl ClassSource for DirectoryClassSource {
	fn try_load(&self, name: &str) -> eyre::Result<Option<Vec<u8>>> {
		let file = format!("{name}.class");
		for root in &self.roots {
			let path = root.join(&file);
			if path.is_file() {
				return Ok(Some(read(path)?));
			}
		}
		Ok(None)
	}
}
