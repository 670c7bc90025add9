use ahash::HashSet;
use parking_lot::{Mutex, RwLock};
use std::fmt::{Display, Formatter};

use crate::ClassSource;

/// The three loaders are fixed at startup and chained bootstrap ←
/// extension ← application. Delegation is parent-first.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum LoaderKind {
	Bootstrap,
	Extension,
	Application,
}

impl LoaderKind {
	pub fn parent(self) -> Option<LoaderKind> {
		match self {
			LoaderKind::Bootstrap => None,
			LoaderKind::Extension => Some(LoaderKind::Bootstrap),
			LoaderKind::Application => Some(LoaderKind::Extension),
		}
	}

	pub fn name(self) -> &'static str {
		match self {
			LoaderKind::Bootstrap => "bootstrap",
			LoaderKind::Extension => "extension",
			LoaderKind::Application => "application",
		}
	}
}

impl Display for LoaderKind {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.name())
	}
}

/// One loader: the names it has loaded, and the places it may search once
/// its parents come up empty.
pub struct Loader {
	kind: LoaderKind,
	names: RwLock<HashSet<String>>,
	sources: Mutex<Vec<Box<dyn ClassSource>>>,
}

impl Loader {
	pub fn new(kind: LoaderKind) -> Loader {
		Loader {
			kind,
			names: RwLock::new(HashSet::default()),
			sources: Mutex::new(Vec::new()),
		}
	}

	pub fn kind(&self) -> LoaderKind {
		self.kind
	}

	pub fn parent(&self) -> Option<LoaderKind> {
		self.kind.parent()
	}

	pub fn add_source(&self, source: Box<dyn ClassSource>) {
		self.sources.lock().push(source);
	}

	/// Probes this loader's own sources, in registration order.
	pub fn try_load(&self, name: &str) -> eyre::Result<Option<Vec<u8>>> {
		let guard = self.sources.lock();
		for source in guard.iter() {
			if let Some(data) = source.try_load(name)? {
				return Ok(Some(data));
			}
		}
		Ok(None)
	}

	/// Records that this loader owns `name`. Called only by whichever load
	/// won the method-area insert, so a name never has two owners.
	pub fn claim(&self, name: &str) {
		self.names.write().insert(name.to_string());
	}

	pub fn owns(&self, name: &str) -> bool {
		self.names.read().contains(name)
	}

	pub fn owned_count(&self) -> usize {
		self.names.read().len()
	}
}
