use ahash::{HashMap, HashMapExt};
use once_cell::sync::Lazy;
use parking_lot::Mutex;

// Per-name counters only ever go up. A plain locked map keeps that
// property without needing a dedicated writer.
static COUNTERS: Lazy<Mutex<HashMap<String, i64>>> = Lazy::new(|| Mutex::new(HashMap::new()));

pub fn increment_counter(name: &str) {
	let mut counters = COUNTERS.lock();
	match counters.get_mut(name) {
		Some(count) => *count += 1,
		None => {
			counters.insert(name.to_string(), 1);
		}
	}
}

/// A snapshot of every counter at the moment of the call.
pub fn counters() -> HashMap<String, i64> {
	COUNTERS.lock().clone()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn counters_accumulate() {
		increment_counter("metrics-test.counter");
		increment_counter("metrics-test.counter");
		increment_counter("metrics-test.counter");
		assert_eq!(counters().get("metrics-test.counter"), Some(&3));
	}

	#[test]
	fn absent_counters_are_absent() {
		assert_eq!(counters().get("metrics-test.never"), None);
	}
}
