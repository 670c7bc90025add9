use once_cell::sync::OnceCell;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info, trace};

use eyre::{bail, Context};
use javelin_core::Globals;
use javelin_management::{
	increment_counter, register_provider, InstrumentationDetail, InstrumentationEntry,
	InstrumentationProvider,
};
use javelin_reader::{format_check, ClassInfo};

use crate::{
	convert_to_postable, ClassRecord, ClassStatus, JarFile, JmodManager, LoadError, Loader,
	LoaderKind, MethodArea,
};

/// Owns the method area, the loader hierarchy, and the module archives, and
/// drives byte sequences through parse, format check, normalize, and insert.
pub struct ClassManager {
	method_area: Arc<MethodArea>,
	bootstrap: Loader,
	extension: Loader,
	application: Loader,
	jmods: OnceCell<JmodManager>,
}

impl Default for ClassManager {
	fn default() -> Self {
		ClassManager::new()
	}
}

impl ClassManager {
	pub fn new() -> ClassManager {
		let manager = ClassManager {
			method_area: Arc::new(MethodArea::new()),
			bootstrap: Loader::new(LoaderKind::Bootstrap),
			extension: Loader::new(LoaderKind::Extension),
			application: Loader::new(LoaderKind::Application),
			jmods: OnceCell::new(),
		};

		let provider = Arc::new(ClassLoadingProvider {
			method_area: manager.method_area.clone(),
		});
		if let Err(err) = register_provider(provider) {
			// a previous manager in this process already owns the name
			debug!("instrumentation not re-registered: {err}");
		}

		manager
	}

	pub fn method_area(&self) -> &MethodArea {
		&self.method_area
	}

	pub fn loader(&self, kind: LoaderKind) -> &Loader {
		match kind {
			LoaderKind::Bootstrap => &self.bootstrap,
			LoaderKind::Extension => &self.extension,
			LoaderKind::Application => &self.application,
		}
	}

	/// Walks the base module and posts everything it yields under the
	/// bootstrap loader. Individual classes are best-effort; a bad Java home
	/// is not.
	pub fn load_base_classes(&self, globals: &Globals) -> eyre::Result<usize> {
		let manager = match JmodManager::new(&globals.java_home, &globals.base_module) {
			Ok(manager) => manager,
			Err(err) => {
				error!(target: "class", "{err:#}");
				return Err(err);
			}
		};

		let mut loaded = 0usize;
		let mut skipped = 0usize;
		manager.walk_base(|bytes, id| {
			match self.parse_and_post(LoaderKind::Bootstrap, bytes) {
				Ok(name) => {
					loaded += 1;
					trace!(target: "class", "loaded base class {name}");
				}
				Err(err) => {
					skipped += 1;
					info!(target: "class", "skipping base class {id}: {err:#}");
				}
			}
		})?;

		let _ = self.jmods.set(manager);
		info!(target: "class", "base classes loaded: {loaded} ({skipped} skipped)");
		Ok(loaded)
	}

	/// Reads a class file from disk and posts it, returning the canonical
	/// class name out of the parsed constant pool.
	pub fn load_class_from_file(
		&self,
		loader: LoaderKind,
		path: impl AsRef<Path>,
	) -> eyre::Result<String> {
		let path = path.as_ref();
		let bytes = fs::read(path).map_err(|source| {
			let err = LoadError::Io {
				path: path.display().to_string(),
				source,
			};
			error!(target: "class", "{err}");
			err
		})?;

		self.parse_and_post(loader, &bytes)
			.map_err(|err| {
				error!(target: "class", "failed to load {}: {err:#}", path.display());
				err
			})
			.wrap_err_with(|| format!("Failed to load class from {}", path.display()))
	}

	/// The `Main-Class` manifest attribute of an executable JAR. A missing
	/// attribute is its own failure, distinct from an unreadable archive.
	pub fn get_main_class_from_jar(
		&self,
		loader: LoaderKind,
		jar_path: impl AsRef<Path>,
	) -> eyre::Result<String> {
		let jar_path = jar_path.as_ref();
		debug!(target: "class", "{loader} loader reading manifest of {}", jar_path.display());

		let jar = JarFile::open(jar_path)?;
		match jar.main_class()? {
			Some(name) => Ok(name),
			None => {
				let err = LoadError::NoMainManifest {
					jar: jar_path.display().to_string(),
				};
				info!(target: "class", "{err}");
				Err(err.into())
			}
		}
	}

	pub fn load_class_from_jar(
		&self,
		loader: LoaderKind,
		class_name: &str,
		jar_path: impl AsRef<Path>,
	) -> eyre::Result<String> {
		let jar_path = jar_path.as_ref();
		let jar = JarFile::open(jar_path)?;

		let Some(bytes) = jar.read_class(class_name)? else {
			bail!("Class {class_name} not found in {}", jar_path.display());
		};

		self.parse_and_post(loader, &bytes)
			.map_err(|err| {
				error!(target: "class", "failed to load {class_name} from {}: {err:#}", jar_path.display());
				err
			})
			.wrap_err_with(|| {
				format!("Failed to load {class_name} from {}", jar_path.display())
			})
	}

	/// Parse, format-check, normalize, insert. Returns the canonical name.
	/// Losing a racing insert is fine: the surviving record is the answer.
	pub fn parse_and_post(&self, loader: LoaderKind, bytes: &[u8]) -> eyre::Result<String> {
		let info = ClassInfo::parse_complete(bytes)?;
		format_check(&info)?;
		let postable = convert_to_postable(&info)?;

		let name = postable.name.clone();
		let record = ClassRecord::new(name.clone(), loader, postable);
		record.advance(ClassStatus::FormatChecked)?;
		record.advance(ClassStatus::Linked)?;

		let (record, installed) = self.method_area.insert(record);
		if installed {
			record.advance(ClassStatus::Ready)?;
			self.loader(loader).claim(&name);
			increment_counter("classloader.loads");
		}

		Ok(name)
	}

	/// Parent-first delegation: the method area answers first, then the
	/// chain of parents, then this loader's own sources.
	pub fn load_class(&self, loader: LoaderKind, name: &str) -> eyre::Result<Arc<ClassRecord>> {
		if let Some(record) = self.method_area.lookup(name) {
			return Ok(record);
		}
		if let Some(record) = self.find_class(loader, name)? {
			return Ok(record);
		}
		bail!("Failed to find a way to load {name}")
	}

	fn find_class(
		&self,
		loader: LoaderKind,
		name: &str,
	) -> eyre::Result<Option<Arc<ClassRecord>>> {
		if let Some(parent) = loader.parent() {
			if let Some(record) = self.find_class(parent, name)? {
				return Ok(Some(record));
			}
		}

		let mut bytes = None;
		if loader == LoaderKind::Bootstrap {
			if let Some(jmods) = self.jmods.get() {
				bytes = jmods.load_by_name(&format!("{name}.class"))?;
			}
		}
		if bytes.is_none() {
			bytes = self.loader(loader).try_load(name)?;
		}

		let Some(bytes) = bytes else {
			return Ok(None);
		};

		let posted = self
			.parse_and_post(loader, &bytes)
			.wrap_err_with(|| format!("Failed to load {name}"))?;
		Ok(self.method_area.lookup(&posted))
	}

	/// Transitively resolves every class the named class's pool points at
	/// that is not yet in the method area, through the owning loader.
	/// Unresolvable references are logged and skipped.
	pub fn load_referenced_classes(&self, name: &str) {
		let mut visited = ahash::HashSet::default();
		let mut pending = vec![name.to_string()];

		while let Some(current) = pending.pop() {
			if !visited.insert(current.clone()) {
				continue;
			}
			let Some(record) = self.method_area.lookup(&current) else {
				continue;
			};

			let loader = record.loader;
			for referenced in record.data.referenced_classes() {
				if visited.contains(referenced) {
					continue;
				}
				if self.method_area.lookup(referenced).is_none() {
					if let Err(err) = self.load_class(loader, referenced) {
						info!(
							target: "class",
							"unable to resolve referenced class {referenced}: {err:#}"
						);
						visited.insert(referenced.to_string());
						continue;
					}
				}
				pending.push(referenced.to_string());
			}
		}
	}
}

struct ClassLoadingProvider {
	method_area: Arc<MethodArea>,
}

impl InstrumentationProvider for ClassLoadingProvider {
	fn name(&self) -> &str {
		"classloading"
	}

	fn list(&self) -> Vec<InstrumentationEntry> {
		vec![InstrumentationEntry {
			key: "loaded".to_string(),
			description: "number of classes in the method area".to_string(),
		}]
	}

	fn detail(&self, key: &str) -> Option<InstrumentationDetail> {
		match key {
			"loaded" => Some(InstrumentationDetail {
				entry: self.list().remove(0),
				data: self.method_area.len().to_string(),
			}),
			_ => None,
		}
	}
}
