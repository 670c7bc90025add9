pub use error::*;
pub use jar::*;
pub use jmod::*;
pub use loader::*;
pub use manager::*;
pub use method_area::*;
pub use postable::*;
pub use source::*;

mod error;
mod jar;
mod jmod;
mod loader;
mod manager;
mod method_area;
mod postable;
mod source;

#[cfg(test)]
mod testdata;
