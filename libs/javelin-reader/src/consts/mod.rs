mod class;
mod dynamic;
mod field;
mod interface;
mod method;
mod module;
mod name_and_type;
mod number;
mod string;
mod utf_8;

pub use crate::consts::class::ClassConst;
pub use crate::consts::dynamic::{DynamicConst, InvokeDynamicConst};
pub use crate::consts::field::FieldConst;
pub use crate::consts::interface::InterfaceConst;
pub use crate::consts::method::{MethodConst, MethodHandleConst, MethodTypeConst};
pub use crate::consts::module::{ModuleConst, PackageConst};
pub use crate::consts::name_and_type::NameAndTypeConst;
pub use crate::consts::number::{DoubleConst, FloatConst, IntegerConst, LongConst};
pub use crate::consts::string::StringConst;
pub use crate::consts::utf_8::UTF8Const;
use crate::{IResult, ParsingError};
use nom::combinator::{map, map_res};
use nom::error::{ContextError, ErrorKind, ParseError};
use nom::multi::length_data;
use nom::number::complete::{be_f32, be_f64, be_i32, be_i64, be_u16, be_u8};
use nom::sequence::pair;
use std::fmt::{Debug, Formatter};
use std::io;
use std::io::ErrorKind as IoErrorKind;
use std::marker::PhantomData;
use tracing::trace;

#[macro_export]
macro_rules! impl_constant {
	($VARIANT:ident $TY:ty) => {
		impl crate::Constant for $TY {
			fn get(value: &crate::ConstantInfo) -> Option<&Self> {
				if let crate::ConstantInfo::$VARIANT(v) = value {
					return Some(v);
				}
				None
			}
		}
	};
}

pub trait Constant {
	fn get(value: &ConstantInfo) -> Option<&Self>;
}

/// A 1-based pool index carrying the kind of entry it is expected to resolve
/// to. Index 0 is the reserved null entry and resolves to nothing.
pub struct ConstPtr<V: Constant>(u16, PhantomData<V>);

impl<V: Constant> ConstPtr<V> {
	pub fn new(id: u16) -> ConstPtr<V> {
		ConstPtr(id, PhantomData)
	}

	pub fn index(&self) -> u16 {
		self.0
	}

	pub fn is_null(&self) -> bool {
		self.0 == 0
	}

	pub fn get<'a>(&self, cp: &'a ConstantPool) -> Option<&'a V> {
		cp.get(*self)
	}
}

#[inline]
pub fn be_cp<V: Constant>(input: &[u8]) -> IResult<'_, ConstPtr<V>> {
	map(be_u16, ConstPtr::new)(input)
}

impl<V: Constant> Clone for ConstPtr<V> {
	fn clone(&self) -> Self {
		*self
	}
}

impl<V: Constant> Debug for ConstPtr<V> {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		self.0.fmt(f)
	}
}

impl<V: Constant> Copy for ConstPtr<V> {}

#[derive(Debug)]
pub struct ConstantPool(Vec<ConstantInfo>);

impl ConstantPool {
	pub fn new(values: Vec<ConstantInfo>) -> ConstantPool {
		ConstantPool(values)
	}

	/// The declared pool count: one more than the number of stored entries.
	pub fn count(&self) -> u16 {
		self.0.len() as u16 + 1
	}

	pub fn raw_get(&self, index: u16) -> Option<&ConstantInfo> {
		if index == 0 {
			return None;
		}
		self.0.get(index as usize - 1)
	}

	pub fn get<V: Constant>(&self, ptr: ConstPtr<V>) -> Option<&V> {
		V::get(self.raw_get(ptr.0)?)
	}

	/// Entries with their 1-based pool index.
	pub fn iter(&self) -> impl Iterator<Item = (u16, &ConstantInfo)> {
		self.0
			.iter()
			.enumerate()
			.map(|(i, info)| (i as u16 + 1, info))
	}

	pub fn parse(input: &[u8]) -> IResult<'_, ConstantPool> {
		let (mut input, count) = be_u16(input)?;

		let mut values = Vec::with_capacity(count.saturating_sub(1) as usize);
		let mut index = 1u16;
		while index < count {
			let (rest, info) = ConstantInfo::parse(input)?;
			input = rest;

			let wide = info.is_wide();
			values.push(info);
			index += 1;
			if wide {
				// longs and doubles take up two pool slots
				values.push(ConstantInfo::Unusable);
				index += 1;
			}
		}

		Ok((input, ConstantPool::new(values)))
	}
}

#[derive(Debug)]
pub enum ConstantInfo {
	Class(ClassConst),
	Field(FieldConst),
	Method(MethodConst),
	Interface(InterfaceConst),
	String(StringConst),
	Integer(IntegerConst),
	Float(FloatConst),
	Long(LongConst),
	Double(DoubleConst),
	NameAndType(NameAndTypeConst),
	UTF8(UTF8Const),
	MethodHandle(MethodHandleConst),
	MethodType(MethodTypeConst),
	Dynamic(DynamicConst),
	InvokeDynamic(InvokeDynamicConst),
	Module(ModuleConst),
	Package(PackageConst),
	Unusable,
}

impl ConstantInfo {
	/// Longs and doubles occupy two pool slots.
	pub fn is_wide(&self) -> bool {
		matches!(self, ConstantInfo::Long(_) | ConstantInfo::Double(_))
	}

	pub fn parse(input: &[u8]) -> IResult<'_, Self> {
		let (input, variant) = be_u8(input)?;

		trace!("cp_info tag: {variant}");
		match variant {
			1 => map_res(length_data(be_u16), |data: &[u8]| {
				let data = mutf8::mutf8_to_utf8(data)
					.map_err(|_| io::Error::from(IoErrorKind::InvalidData))?;
				let text = String::from_utf8(data.to_vec())
					.map_err(|_| io::Error::from(IoErrorKind::InvalidData))?;
				Ok::<_, io::Error>(ConstantInfo::UTF8(UTF8Const(text)))
			})(input),
			3 => map(be_i32, |bytes| {
				ConstantInfo::Integer(IntegerConst { bytes })
			})(input),
			4 => map(be_f32, |bytes| ConstantInfo::Float(FloatConst { bytes }))(input),
			5 => map(be_i64, |bytes| ConstantInfo::Long(LongConst { bytes }))(input),
			6 => map(be_f64, |bytes| ConstantInfo::Double(DoubleConst { bytes }))(input),
			7 => map(be_u16, |name_index| {
				ConstantInfo::Class(ClassConst {
					name: ConstPtr::new(name_index),
				})
			})(input),
			8 => map(be_u16, |string_index| {
				ConstantInfo::String(StringConst {
					string: ConstPtr::new(string_index),
				})
			})(input),
			9 => map(
				pair(be_u16, be_u16),
				|(class_index, name_and_type_index)| {
					ConstantInfo::Field(FieldConst {
						class: ConstPtr::new(class_index),
						name_and_type: ConstPtr::new(name_and_type_index),
					})
				},
			)(input),
			10 => map(
				pair(be_u16, be_u16),
				|(class_index, name_and_type_index)| {
					ConstantInfo::Method(MethodConst {
						class: ConstPtr::new(class_index),
						name_and_type: ConstPtr::new(name_and_type_index),
					})
				},
			)(input),
			11 => map(
				pair(be_u16, be_u16),
				|(class_index, name_and_type_index)| {
					ConstantInfo::Interface(InterfaceConst {
						class: ConstPtr::new(class_index),
						name_and_type: ConstPtr::new(name_and_type_index),
					})
				},
			)(input),
			12 => map(pair(be_u16, be_u16), |(name_index, descriptor_index)| {
				ConstantInfo::NameAndType(NameAndTypeConst {
					name: ConstPtr::new(name_index),
					descriptor: ConstPtr::new(descriptor_index),
				})
			})(input),
			15 => map(pair(be_u8, be_u16), |(reference_kind, reference_index)| {
				ConstantInfo::MethodHandle(MethodHandleConst {
					reference_kind,
					reference_index,
				})
			})(input),
			16 => map(be_u16, |descriptor_index| {
				ConstantInfo::MethodType(MethodTypeConst {
					descriptor: ConstPtr::new(descriptor_index),
				})
			})(input),
			17 => map(
				pair(be_u16, be_u16),
				|(bootstrap_method_attr_index, name_and_type_index)| {
					ConstantInfo::Dynamic(DynamicConst {
						bootstrap_method_attr_index,
						name_and_type: ConstPtr::new(name_and_type_index),
					})
				},
			)(input),
			18 => map(
				pair(be_u16, be_u16),
				|(bootstrap_method_attr_index, name_and_type_index)| {
					ConstantInfo::InvokeDynamic(InvokeDynamicConst {
						bootstrap_method_attr_index,
						name_and_type: ConstPtr::new(name_and_type_index),
					})
				},
			)(input),
			19 => map(be_u16, |name_index| {
				ConstantInfo::Module(ModuleConst {
					name: ConstPtr::new(name_index),
				})
			})(input),
			20 => map(be_u16, |name_index| {
				ConstantInfo::Package(PackageConst {
					name: ConstPtr::new(name_index),
				})
			})(input),
			_ => Err(nom::Err::Failure(ParsingError::add_context(
				input,
				"invalid constant pool tag",
				ParsingError::from_error_kind(input, ErrorKind::Switch),
			))),
		}
	}
}
