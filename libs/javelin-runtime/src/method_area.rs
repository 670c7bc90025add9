use ahash::{HashMap, HashMapExt};
use eyre::bail;
use parking_lot::{Mutex, RwLock};
use std::collections::hash_map::Entry;
use std::sync::Arc;
use tracing::debug;

use crate::{LoaderKind, PostableClass};

/// Where a class record is in its life. Transitions only move forward;
/// `Failed` is terminal and reachable from anything that is not `Ready`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ClassStatus {
	Loading,
	FormatChecked,
	Linked,
	Ready,
	Failed,
}

impl ClassStatus {
	fn rank(self) -> u8 {
		match self {
			ClassStatus::Loading => 0,
			ClassStatus::FormatChecked => 1,
			ClassStatus::Linked => 2,
			ClassStatus::Ready => 3,
			ClassStatus::Failed => 4,
		}
	}
}

#[derive(Debug)]
pub struct ClassRecord {
	pub name: String,
	pub loader: LoaderKind,
	status: Mutex<ClassStatus>,
	pub data: PostableClass,
}

impl ClassRecord {
	pub fn new(name: String, loader: LoaderKind, data: PostableClass) -> ClassRecord {
		ClassRecord {
			name,
			loader,
			status: Mutex::new(ClassStatus::Loading),
			data,
		}
	}

	pub fn status(&self) -> ClassStatus {
		*self.status.lock()
	}

	pub fn advance(&self, next: ClassStatus) -> eyre::Result<()> {
		let mut status = self.status.lock();
		let legal = match (*status, next) {
			(ClassStatus::Ready, _) | (ClassStatus::Failed, _) => false,
			(_, ClassStatus::Failed) => true,
			(current, next) => next.rank() == current.rank() + 1,
		};
		if !legal {
			bail!(
				"illegal status transition {:?} -> {next:?} for class {}",
				*status,
				self.name
			);
		}
		*status = next;
		Ok(())
	}
}

/// The process-wide table of loaded classes, keyed by internal name. A name
/// is installed at most once; racing inserts converge on a single record.
pub struct MethodArea {
	classes: RwLock<HashMap<String, Arc<ClassRecord>>>,
}

impl Default for MethodArea {
	fn default() -> Self {
		MethodArea::new()
	}
}

impl MethodArea {
	pub fn new() -> MethodArea {
		MethodArea {
			classes: RwLock::new(HashMap::new()),
		}
	}

	/// Installs `record` unless the name is already taken. Returns the record
	/// living under the name and whether this call was the one that put it
	/// there.
	pub fn insert(&self, record: ClassRecord) -> (Arc<ClassRecord>, bool) {
		let mut classes = self.classes.write();
		match classes.entry(record.name.clone()) {
			Entry::Occupied(existing) => (existing.get().clone(), false),
			Entry::Vacant(slot) => {
				debug!(
					target: "class",
					"class {} inserted into method area by {} loader",
					record.name, record.loader
				);
				(slot.insert(Arc::new(record)).clone(), true)
			}
		}
	}

	pub fn lookup(&self, name: &str) -> Option<Arc<ClassRecord>> {
		self.classes.read().get(name).cloned()
	}

	pub fn len(&self) -> usize {
		self.classes.read().len()
	}

	pub fn is_empty(&self) -> bool {
		self.classes.read().is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use parking_lot::Mutex as PlMutex;
	use std::io;
	use std::thread;
	use tracing_subscriber::fmt::MakeWriter;

	fn record(name: &str, loader: LoaderKind) -> ClassRecord {
		ClassRecord::new(name.to_string(), loader, PostableClass::default())
	}

	#[test]
	fn insert_is_write_once() {
		let area = MethodArea::new();
		let (first, installed) = area.insert(record("Willy", LoaderKind::Application));
		assert!(installed);
		let (second, installed) = area.insert(record("Willy", LoaderKind::Bootstrap));
		assert!(!installed);
		assert!(Arc::ptr_eq(&first, &second));
		assert_eq!(second.loader, LoaderKind::Application);
		assert_eq!(area.len(), 1);
	}

	#[test]
	fn concurrent_inserts_converge() {
		let area = Arc::new(MethodArea::new());
		let mut handles = Vec::new();
		for _ in 0..8 {
			let area = area.clone();
			handles.push(thread::spawn(move || {
				let (winner, _) = area.insert(record("Racer", LoaderKind::Application));
				Arc::as_ptr(&winner) as usize
			}));
		}
		let pointers: Vec<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();
		assert!(pointers.windows(2).all(|w| w[0] == w[1]));
		assert_eq!(area.len(), 1);
	}

	#[test]
	fn status_machine_is_monotonic() {
		let record = record("Status", LoaderKind::Bootstrap);
		assert_eq!(record.status(), ClassStatus::Loading);
		record.advance(ClassStatus::FormatChecked).unwrap();
		record.advance(ClassStatus::Linked).unwrap();
		// no skipping back
		assert!(record.advance(ClassStatus::FormatChecked).is_err());
		record.advance(ClassStatus::Ready).unwrap();
		// ready records are immutable
		assert!(record.advance(ClassStatus::Failed).is_err());
	}

	#[test]
	fn failure_is_reachable_before_ready() {
		let record = record("Doomed", LoaderKind::Bootstrap);
		record.advance(ClassStatus::FormatChecked).unwrap();
		record.advance(ClassStatus::Failed).unwrap();
		assert!(record.advance(ClassStatus::Linked).is_err());
	}

	#[derive(Clone, Default)]
	struct Capture(Arc<PlMutex<Vec<u8>>>);

	impl io::Write for Capture {
		fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
			self.0.lock().extend_from_slice(buf);
			Ok(buf.len())
		}

		fn flush(&mut self) -> io::Result<()> {
			Ok(())
		}
	}

	impl<'a> MakeWriter<'a> for Capture {
		type Writer = Capture;

		fn make_writer(&'a self) -> Self::Writer {
			self.clone()
		}
	}

	#[test]
	fn insert_logs_class_and_loader() {
		let capture = Capture::default();
		let subscriber = tracing_subscriber::fmt()
			.with_max_level(tracing::Level::TRACE)
			.with_writer(capture.clone())
			.finish();

		tracing::subscriber::with_default(subscriber, || {
			let area = MethodArea::new();
			area.insert(record("WillyWonkaClass", LoaderKind::Application));
		});

		let output = String::from_utf8(capture.0.lock().clone()).unwrap();
		assert!(output.contains("WillyWonkaClass"));
		assert!(output.contains("application"));
	}
}
