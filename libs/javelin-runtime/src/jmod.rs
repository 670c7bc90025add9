use ahash::{HashMap, HashMapExt, HashSet};
use once_cell::sync::OnceCell;
use std::ffi::OsStr;
use std::fs;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;
use zip::ZipArchive;

use crate::LoadError;

pub const JMOD_MAGIC: u16 = 0x4A4D;
const JMOD_HEADER_LEN: usize = 4;

/// A Java Module archive: a 4-byte header (2-byte magic, 2 reserved bytes)
/// in front of an ordinary ZIP. Walking yields classes under `classes/`,
/// filtered through `lib/classlist` when the module carries one.
#[derive(Debug)]
pub struct Jmod {
	path: PathBuf,
	entries: OnceCell<HashMap<String, String>>,
}

impl Jmod {
	pub fn new(path: impl Into<PathBuf>) -> Jmod {
		Jmod {
			path: path.into(),
			entries: OnceCell::new(),
		}
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	fn open(&self) -> eyre::Result<ZipArchive<Cursor<Vec<u8>>>> {
		let path = self.path.display().to_string();
		let data = fs::read(&self.path).map_err(|source| LoadError::Io {
			path: path.clone(),
			source,
		})?;

		let found = if data.len() >= 2 {
			u16::from_be_bytes([data[0], data[1]])
		} else {
			0
		};
		if found != JMOD_MAGIC || data.len() < JMOD_HEADER_LEN {
			return Err(LoadError::JmodMagic {
				path,
				expected: JMOD_MAGIC,
				found,
			}
			.into());
		}

		// the header has to go so the payload reads as a plain ZIP
		let cursor = Cursor::new(data[JMOD_HEADER_LEN..].to_vec());
		Ok(ZipArchive::new(cursor)?)
	}

	/// Class-relative name (`java/lang/Object.class`) to archive entry name.
	/// Built once; later calls observe the populated map.
	fn index(&self) -> eyre::Result<&HashMap<String, String>> {
		self.entries.get_or_try_init(|| {
			let archive = self.open()?;
			let mut entries = HashMap::new();
			for name in archive.file_names() {
				if let Some(relative) = name.strip_prefix("classes/") {
					entries.insert(relative.to_string(), name.to_string());
				}
			}
			Ok(entries)
		})
	}

	/// Bytes of one class, by class-relative name. A miss is not an error.
	pub fn load_by_name(&self, name: &str) -> eyre::Result<Option<Vec<u8>>> {
		let entry = match self.index()?.get(name) {
			Some(entry) => entry.clone(),
			None => return Ok(None),
		};

		let mut archive = self.open()?;
		let mut file = archive.by_name(&entry)?;
		let mut data = Vec::with_capacity(file.size() as usize);
		file.read_to_end(&mut data)?;
		Ok(Some(data))
	}

	/// Invokes `visit` with raw bytes and `<archive-path>+<internal-entry>`
	/// for every class the classlist admits.
	pub fn walk(&self, mut visit: impl FnMut(&[u8], &str)) -> eyre::Result<()> {
		let mut archive = self.open()?;
		let classlist = read_classlist(&mut archive, &self.path);

		let mut names: Vec<String> = archive.file_names().map(|v| v.to_string()).collect();
		names.sort();

		for name in names {
			let relative = match name.strip_prefix("classes/") {
				Some(relative) => relative,
				None => continue,
			};

			match &classlist {
				Some(list) => {
					if !list.contains(relative) {
						continue;
					}
				}
				None => {
					if !name.ends_with(".class") {
						continue;
					}
				}
			}

			let mut file = archive.by_name(&name)?;
			if !file.is_file() {
				continue;
			}

			let mut data = Vec::with_capacity(file.size() as usize);
			file.read_to_end(&mut data)?;
			drop(file);

			let id = format!("{}+{}", self.path.display(), name);
			visit(&data, &id);
		}

		Ok(())
	}
}

/// `lib/classlist` as a set of class-relative names, or `None` when the
/// archive has no usable list and every class should be loaded.
fn read_classlist(
	archive: &mut ZipArchive<Cursor<Vec<u8>>>,
	path: &Path,
) -> Option<HashSet<String>> {
	let mut file = match archive.by_name("lib/classlist") {
		Ok(file) => file,
		Err(_) => {
			debug!(
				target: "class",
				"no lib/classlist in {}, loading all classes in the module",
				path.display()
			);
			return None;
		}
	};

	let mut content = String::new();
	if file.read_to_string(&mut content).is_err() {
		debug!(
			target: "class",
			"unable to read lib/classlist from {}, loading all classes in the module",
			path.display()
		);
		return None;
	}

	let list: HashSet<String> = content
		.lines()
		.map(|line| line.trim_end_matches('\r'))
		.filter(|line| !line.is_empty())
		.map(|line| format!("{line}.class"))
		.collect();

	if list.is_empty() {
		return None;
	}
	Some(list)
}

/// All module archives under `<java-home>/jmods`, with one of them marked
/// as the base module used for startup enumeration.
#[derive(Debug)]
pub struct JmodManager {
	jmods: Vec<(String, Jmod)>,
	base: usize,
}

impl JmodManager {
	pub fn new(java_home: &str, base_name: &str) -> eyre::Result<JmodManager> {
		if !Path::new(java_home).is_dir() {
			return Err(LoadError::JavaHomeMissing {
				path: java_home.to_string(),
			}
			.into());
		}

		let dir = Path::new(java_home).join("jmods");
		let mut jmods = Vec::new();
		let mut base = None;

		for entry in WalkDir::new(&dir)
			.sort_by_file_name()
			.into_iter()
			.filter_map(Result::ok)
		{
			let path = entry.path();
			if path.extension() != Some(OsStr::new("jmod")) {
				continue;
			}

			let file_name = match path.file_name() {
				Some(name) => name.to_string_lossy().into_owned(),
				None => continue,
			};
			if file_name == base_name {
				base = Some(jmods.len());
			}
			jmods.push((file_name, Jmod::new(path)));
		}

		let base = base.ok_or_else(|| LoadError::BaseJmodNotFound {
			name: base_name.to_string(),
			dir: dir.display().to_string(),
		})?;

		Ok(JmodManager { jmods, base })
	}

	pub fn base(&self) -> &Jmod {
		&self.jmods[self.base].1
	}

	pub fn walk_base(&self, visit: impl FnMut(&[u8], &str)) -> eyre::Result<()> {
		self.base().walk(visit)
	}

	/// Probes the indexed archives in order and returns the first hit.
	pub fn load_by_name(&self, name: &str) -> eyre::Result<Option<Vec<u8>>> {
		for (_, jmod) in &self.jmods {
			if let Some(data) = jmod.load_by_name(name)? {
				return Ok(Some(data));
			}
		}
		Ok(None)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::BTreeSet;
	use std::io::Write;
	use tempfile::TempDir;
	use zip::write::FileOptions;
	use zip::ZipWriter;

	pub(crate) fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
		let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
		for (name, data) in entries {
			writer.start_file(*name, FileOptions::default()).unwrap();
			writer.write_all(data).unwrap();
		}
		writer.finish().unwrap().into_inner()
	}

	pub(crate) fn jmod_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
		let mut out = vec![0x4A, 0x4D, 0x01, 0x00];
		out.extend_from_slice(&zip_bytes(entries));
		out
	}

	fn walked_entries(jmod: &Jmod) -> BTreeSet<String> {
		let mut found = BTreeSet::new();
		jmod.walk(|_, id| {
			let entry = id.split('+').nth(1).unwrap();
			found.insert(entry.to_string());
		})
		.unwrap();
		found
	}

	#[test]
	fn classlist_filters_the_walk() {
		let dir = TempDir::new().unwrap();
		let path = dir.path().join("test.jmod");
		fs::write(
			&path,
			jmod_bytes(&[
				("classes/org/javelin/test/Hello.class", b"AAAA"),
				("classes/module-info.class", b"BBBB"),
				("lib/classlist", b"org/javelin/test/Hello\r\n"),
			]),
		)
		.unwrap();

		let found = walked_entries(&Jmod::new(&path));
		assert!(found.contains("classes/org/javelin/test/Hello.class"));
		assert!(!found.contains("classes/module-info.class"));
	}

	#[test]
	fn walk_without_classlist_yields_every_class() {
		let dir = TempDir::new().unwrap();
		let path = dir.path().join("full.jmod");
		fs::write(
			&path,
			jmod_bytes(&[
				("classes/org/javelin/test/Hello.class", b"AAAA"),
				("classes/module-info.class", b"BBBB"),
				("legal/LICENSE", b"MIT"),
			]),
		)
		.unwrap();

		let found = walked_entries(&Jmod::new(&path));
		assert!(found.contains("classes/org/javelin/test/Hello.class"));
		assert!(found.contains("classes/module-info.class"));
		assert_eq!(found.len(), 2);
	}

	#[test]
	fn non_jmod_file_is_rejected() {
		let dir = TempDir::new().unwrap();
		let path = dir.path().join("README.md");
		fs::write(&path, b"# not a module\n").unwrap();

		let err = Jmod::new(&path).walk(|_, _| {}).unwrap_err();
		let message = format!("{err:#}");
		assert!(message.contains("README.md"));
		assert!(message.contains("magic number is invalid"));
	}

	#[test]
	fn load_by_name_hits_and_misses() {
		let dir = TempDir::new().unwrap();
		let path = dir.path().join("test.jmod");
		fs::write(
			&path,
			jmod_bytes(&[("classes/java/lang/Object.class", b"OBJT")]),
		)
		.unwrap();

		let jmod = Jmod::new(&path);
		assert_eq!(
			jmod.load_by_name("java/lang/Object.class").unwrap(),
			Some(b"OBJT".to_vec())
		);
		assert_eq!(jmod.load_by_name("java/lang/String.class").unwrap(), None);
	}

	#[test]
	fn manager_requires_the_java_home() {
		let err = JmodManager::new("gherkin", "java.base.jmod").unwrap_err();
		assert!(format!("{err:#}").contains("JAVA_HOME (gherkin) does not exist"));
	}

	#[test]
	fn manager_requires_the_base_module() {
		let home = TempDir::new().unwrap();
		fs::create_dir(home.path().join("jmods")).unwrap();
		fs::write(
			home.path().join("jmods").join("other.jmod"),
			jmod_bytes(&[("classes/A.class", b"AAAA")]),
		)
		.unwrap();

		let err =
			JmodManager::new(&home.path().display().to_string(), "java.base.jmod").unwrap_err();
		assert!(format!("{err:#}").contains("Base JMOD with name java.base.jmod not found"));
	}

	#[test]
	fn manager_probes_modules_in_order() {
		let home = TempDir::new().unwrap();
		let jmods = home.path().join("jmods");
		fs::create_dir(&jmods).unwrap();
		fs::write(
			jmods.join("java.base.jmod"),
			jmod_bytes(&[("classes/java/lang/Object.class", b"OBJT")]),
		)
		.unwrap();
		fs::write(
			jmods.join("java.extra.jmod"),
			jmod_bytes(&[("classes/org/javelin/Extra.class", b"XTRA")]),
		)
		.unwrap();

		let manager =
			JmodManager::new(&home.path().display().to_string(), "java.base.jmod").unwrap();
		assert_eq!(
			manager.load_by_name("java/lang/Object.class").unwrap(),
			Some(b"OBJT".to_vec())
		);
		assert_eq!(
			manager.load_by_name("org/javelin/Extra.class").unwrap(),
			Some(b"XTRA".to_vec())
		);
		assert_eq!(manager.load_by_name("absent.class").unwrap(), None);

		let mut walked = 0;
		manager.walk_base(|_, _| walked += 1).unwrap();
		assert_eq!(walked, 1);
	}
}
