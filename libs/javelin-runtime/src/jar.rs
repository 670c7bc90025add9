use parking_lot::Mutex;
use std::fs;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use tracing::error;
use zip::result::ZipError;
use zip::ZipArchive;

use crate::LoadError;

/// An executable or library JAR. Anything that stops the archive from
/// opening is reported as a corrupt jarfile, the way the JDK launcher does.
#[derive(Debug)]
pub struct JarFile {
	path: PathBuf,
	archive: Mutex<ZipArchive<Cursor<Vec<u8>>>>,
}

impl JarFile {
	pub fn open(path: impl Into<PathBuf>) -> eyre::Result<JarFile> {
		let path = path.into();
		let corrupt = || {
			let err = LoadError::CorruptJar {
				path: path.display().to_string(),
			};
			error!(target: "class", "{err}");
			err
		};

		let data = fs::read(&path).map_err(|_| corrupt())?;
		let archive = ZipArchive::new(Cursor::new(data)).map_err(|_| corrupt())?;

		Ok(JarFile {
			path,
			archive: Mutex::new(archive),
		})
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	/// The `Main-Class` attribute out of `META-INF/MANIFEST.MF`. Absent
	/// manifest or absent attribute both come back as `None`.
	pub fn main_class(&self) -> eyre::Result<Option<String>> {
		let mut archive = self.archive.lock();
		let mut file = match archive.by_name("META-INF/MANIFEST.MF") {
			Ok(file) => file,
			Err(ZipError::FileNotFound) => return Ok(None),
			Err(err) => return Err(err.into()),
		};

		let mut content = String::new();
		file.read_to_string(&mut content)?;

		for line in content.lines() {
			if let Some(value) = line.strip_prefix("Main-Class:") {
				return Ok(Some(value.trim().to_string()));
			}
		}
		Ok(None)
	}

	/// Bytes of one class. `class_name` may be dotted (as manifests write
	/// it) or internal; a miss is not an error.
	pub fn read_class(&self, class_name: &str) -> eyre::Result<Option<Vec<u8>>> {
		let entry = format!("{}.class", class_name.replace('.', "/"));
		let mut archive = self.archive.lock();
		let mut file = match archive.by_name(&entry) {
			Ok(file) => file,
			Err(ZipError::FileNotFound) => return Ok(None),
			Err(err) => return Err(err.into()),
		};

		let mut data = Vec::with_capacity(file.size() as usize);
		file.read_to_end(&mut data)?;
		Ok(Some(data))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;
	use tempfile::TempDir;
	use zip::write::FileOptions;
	use zip::ZipWriter;

	fn write_jar(path: &Path, entries: &[(&str, &[u8])]) {
		let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
		for (name, data) in entries {
			writer.start_file(*name, FileOptions::default()).unwrap();
			writer.write_all(data).unwrap();
		}
		fs::write(path, writer.finish().unwrap().into_inner()).unwrap();
	}

	#[test]
	fn nonexistent_jar_is_corrupt() {
		let err = JarFile::open("gherkin").unwrap_err();
		assert!(format!("{err:#}").contains("Invalid or corrupt jarfile"));
	}

	#[test]
	fn non_zip_jar_is_corrupt() {
		let dir = TempDir::new().unwrap();
		let path = dir.path().join("bad.jar");
		fs::write(&path, b"definitely not a zip").unwrap();

		let err = JarFile::open(&path).unwrap_err();
		assert!(format!("{err:#}").contains("Invalid or corrupt jarfile"));
	}

	#[test]
	fn manifest_main_class_is_extracted() {
		let dir = TempDir::new().unwrap();
		let path = dir.path().join("app.jar");
		write_jar(
			&path,
			&[(
				"META-INF/MANIFEST.MF",
				b"Manifest-Version: 1.0\r\nMain-Class: org.javelin.Main\r\n".as_slice(),
			)],
		);

		let jar = JarFile::open(&path).unwrap();
		assert_eq!(jar.main_class().unwrap().as_deref(), Some("org.javelin.Main"));
	}

	#[test]
	fn missing_main_class_attribute() {
		let dir = TempDir::new().unwrap();
		let path = dir.path().join("app.jar");
		write_jar(
			&path,
			&[("META-INF/MANIFEST.MF", b"Manifest-Version: 1.0\r\n".as_slice())],
		);

		let jar = JarFile::open(&path).unwrap();
		assert_eq!(jar.main_class().unwrap(), None);
	}

	#[test]
	fn read_class_translates_dotted_names() {
		let dir = TempDir::new().unwrap();
		let path = dir.path().join("app.jar");
		write_jar(&path, &[("org/javelin/Main.class", b"MAIN".as_slice())]);

		let jar = JarFile::open(&path).unwrap();
		assert_eq!(
			jar.read_class("org.javelin.Main").unwrap(),
			Some(b"MAIN".to_vec())
		);
		assert_eq!(jar.read_class("org/javelin/Main").unwrap(), Some(b"MAIN".to_vec()));
		assert_eq!(jar.read_class("org.javelin.Missing").unwrap(), None);
	}
}
