use crate::impl_constant;
use std::ops::Deref;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UTF8Const(pub String);

impl UTF8Const {
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl Deref for UTF8Const {
	type Target = str;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}

impl_constant!(UTF8 UTF8Const);
