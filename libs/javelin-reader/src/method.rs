use crate::attribute::AttributeInfo;
use crate::consts::{be_cp, ConstantPool};
use crate::{ConstPtr, IResult, UTF8Const};
use javelin_core::MethodAccessFlags;
use nom::combinator::map_opt;
use nom::error::context;
use nom::multi::length_count;
use nom::number::complete::be_u16;

#[derive(Debug)]
pub struct MethodInfo {
	pub access_flags: MethodAccessFlags,
	pub name_index: ConstPtr<UTF8Const>,
	pub descriptor_index: ConstPtr<UTF8Const>,
	pub attribute_info: Vec<AttributeInfo>,
}

impl MethodInfo {
	pub fn parse<'a>(input: &'a [u8], constant_pool: &ConstantPool) -> IResult<'a, Self> {
		let (input, access_flags) = context(
			"method access flags",
			map_opt(be_u16, MethodAccessFlags::from_bits),
		)(input)?;
		let (input, name_index) = be_cp(input)?;
		let (input, descriptor_index) = be_cp(input)?;
		let (input, attribute_info) =
			length_count(be_u16, |input| AttributeInfo::parse(input, constant_pool))(input)?;

		Ok((
			input,
			Self {
				access_flags,
				name_index,
				descriptor_index,
				attribute_info,
			},
		))
	}

	/// The method's Code attribute, if it carries one.
	pub fn code(&self) -> Option<&crate::Code> {
		self.attribute_info.iter().find_map(|attribute| match attribute {
			AttributeInfo::CodeAttribute { code } => Some(code),
			_ => None,
		})
	}
}
