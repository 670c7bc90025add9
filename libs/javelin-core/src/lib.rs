use std::sync::atomic::{AtomicBool, Ordering};

use tracing::Level;
use tracing_subscriber::filter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

pub use flags::*;
pub use globals::*;

mod flags;
mod globals;
pub mod shutdown;

static INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Installs the process-wide subscriber. Class-loading chatter goes to the
/// `class` target so it can be raised or silenced independently.
pub fn init() {
	if !INITIALIZED.fetch_or(true, Ordering::SeqCst) {
		let filter = filter::Targets::new()
			.with_default(Level::INFO)
			.with_target("class", Level::DEBUG);

		tracing_subscriber::registry()
			.with(tracing_subscriber::fmt::layer())
			.with(filter)
			.init();
	}
}
