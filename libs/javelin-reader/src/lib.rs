pub use attribute::*;
pub use check::*;
pub use class::*;
pub use consts::*;
pub use error::*;
pub use field::*;
pub use method::*;

mod attribute;
mod check;
mod class;
mod consts;
mod error;
mod field;
mod method;

pub type IResult<'a, O> = nom::IResult<&'a [u8], O, ParsingError<'a>>;
