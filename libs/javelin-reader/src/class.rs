use crate::attribute::AttributeInfo;
use crate::consts::{be_cp, ConstantPool};
use crate::field::FieldInfo;
use crate::method::MethodInfo;
use crate::{ClassConst, ConstPtr, IResult};
use javelin_core::ClassAccessFlags;
use nom::combinator::{all_consuming, map_opt, verify};
use nom::error::context;
use nom::multi::length_count;
use nom::number::complete::{be_u16, be_u32};

pub const MAGIC: u32 = 0xCAFE_BABE;

#[derive(Debug)]
pub struct ClassInfo {
	pub minor_version: u16,
	pub major_version: u16,
	pub constant_pool: ConstantPool,
	pub access_flags: ClassAccessFlags,

	pub this_class: ConstPtr<ClassConst>,
	pub super_class: ConstPtr<ClassConst>,

	pub interfaces: Vec<ConstPtr<ClassConst>>,
	pub fields: Vec<FieldInfo>,
	pub methods: Vec<MethodInfo>,
	pub attributes: Vec<AttributeInfo>,
}

impl ClassInfo {
	pub fn parse(input: &[u8]) -> IResult<'_, Self> {
		let (input, _) = context("invalid magic number", verify(be_u32, |magic| *magic == MAGIC))(input)?;
		let (input, minor_version) = be_u16(input)?;
		let (input, major_version) = be_u16(input)?;

		let (input, constant_pool) = context("constant pool", ConstantPool::parse)(input)?;

		let (input, access_flags) = context(
			"class access flags",
			map_opt(be_u16, ClassAccessFlags::from_bits),
		)(input)?;
		let (input, this_class) = be_cp(input)?;
		let (input, super_class) = be_cp(input)?;
		let (input, interfaces) = length_count(be_u16, be_cp::<ClassConst>)(input)?;

		let (input, fields) =
			length_count(be_u16, |input| FieldInfo::parse(input, &constant_pool))(input)?;
		let (input, methods) =
			length_count(be_u16, |input| MethodInfo::parse(input, &constant_pool))(input)?;
		let (input, attributes) =
			length_count(be_u16, |input| AttributeInfo::parse(input, &constant_pool))(input)?;

		Ok((
			input,
			ClassInfo {
				minor_version,
				major_version,
				constant_pool,
				access_flags,
				this_class,
				super_class,
				interfaces,
				fields,
				methods,
				attributes,
			},
		))
	}

	/// Parses a whole class file. Trailing bytes beyond the declared end of
	/// the structure are an error.
	pub fn parse_complete(data: &[u8]) -> eyre::Result<ClassInfo> {
		match all_consuming(ClassInfo::parse)(data) {
			Ok((_, info)) => Ok(info),
			Err(nom::Err::Error(err)) | Err(nom::Err::Failure(err)) => Err(err.format(data)),
			Err(nom::Err::Incomplete(_)) => Err(eyre::Report::msg("class file ends prematurely")),
		}
	}

	/// The internal name of the class itself, out of the constant pool.
	pub fn name(&self) -> Option<&str> {
		let class = self.this_class.get(&self.constant_pool)?;
		Some(class.name.get(&self.constant_pool)?.as_str())
	}
}
