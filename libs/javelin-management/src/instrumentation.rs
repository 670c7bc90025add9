use ahash::{HashMap, HashMapExt};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::sync::Arc;
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct InstrumentationEntry {
	pub key: String,
	pub description: String,
}

#[derive(Clone, Debug)]
pub struct InstrumentationDetail {
	pub entry: InstrumentationEntry,
	pub data: String,
}

/// A subsystem that wants to be inspectable at runtime. Providers are
/// registered once, by name, and queried by whatever surfaces them.
pub trait InstrumentationProvider: Send + Sync {
	fn name(&self) -> &str;
	fn list(&self) -> Vec<InstrumentationEntry>;
	fn detail(&self, key: &str) -> Option<InstrumentationDetail>;
}

#[derive(Debug, Error)]
#[error("Provider with name {0} already registered")]
pub struct DuplicateProvider(pub String);

static PROVIDERS: Lazy<RwLock<HashMap<String, Arc<dyn InstrumentationProvider>>>> =
	Lazy::new(|| RwLock::new(HashMap::new()));

pub fn register_provider(
	provider: Arc<dyn InstrumentationProvider>,
) -> Result<(), DuplicateProvider> {
	let mut providers = PROVIDERS.write();
	let name = provider.name().to_string();
	if providers.contains_key(&name) {
		return Err(DuplicateProvider(name));
	}
	providers.insert(name, provider);
	Ok(())
}

pub fn get_provider(name: &str) -> Option<Arc<dyn InstrumentationProvider>> {
	PROVIDERS.read().get(name).cloned()
}

pub fn provider_names() -> Vec<String> {
	PROVIDERS.read().keys().cloned().collect()
}
