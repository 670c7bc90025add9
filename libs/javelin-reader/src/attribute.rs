use nom::bytes::complete::take;
use nom::combinator::{all_consuming, map, map_opt, rest};
use nom::error::{context, ContextError, ErrorKind, ParseError};
use nom::multi::length_count;
use nom::number::complete::{be_u16, be_u32};
use nom::sequence::tuple;

use crate::consts::{ConstantInfo, ConstantPool};
use crate::{IResult, ParsingError};

#[derive(Clone, Debug)]
pub struct AttributeException {
	pub start_pc: u16,
	pub end_pc: u16,
	pub handler_pc: u16,
	pub catch_type: u16,
}

impl AttributeException {
	pub fn parse(input: &[u8]) -> IResult<'_, Self> {
		map(
			tuple((be_u16, be_u16, be_u16, be_u16)),
			|(start_pc, end_pc, handler_pc, catch_type)| AttributeException {
				start_pc,
				end_pc,
				handler_pc,
				catch_type,
			},
		)(input)
	}
}

#[derive(Clone, Debug)]
pub struct AttributeLineNumber {
	pub start_pc: u16,
	pub line_number: u16,
}

impl AttributeLineNumber {
	pub fn parse(input: &[u8]) -> IResult<'_, Self> {
		map(tuple((be_u16, be_u16)), |(start_pc, line_number)| {
			AttributeLineNumber {
				start_pc,
				line_number,
			}
		})(input)
	}
}

#[derive(Clone, Debug)]
pub struct AttributeLocalVariable {
	pub start_pc: u16,
	pub length: u16,
	pub name_index: u16,
	pub descriptor_index: u16,
	pub index: u16,
}

impl AttributeLocalVariable {
	pub fn parse(input: &[u8]) -> IResult<'_, Self> {
		map(
			tuple((be_u16, be_u16, be_u16, be_u16, be_u16)),
			|(start_pc, length, name_index, descriptor_index, index)| AttributeLocalVariable {
				start_pc,
				length,
				name_index,
				descriptor_index,
				index,
			},
		)(input)
	}
}

/// The Code attribute without instruction decoding: bytecode stays raw for
/// whatever engine ends up dispatching it.
#[derive(Clone, Debug)]
pub struct Code {
	pub max_stack: u16,
	pub max_locals: u16,
	pub code: Vec<u8>,
	pub exception_table: Vec<AttributeException>,
	pub attribute_info: Vec<AttributeInfo>,
}

impl Code {
	pub fn parse<'a>(input: &'a [u8], constant_pool: &ConstantPool) -> IResult<'a, Self> {
		let (input, max_stack) = be_u16(input)?;
		let (input, max_locals) = be_u16(input)?;
		let (input, code) = length_data_u32(input)?;
		let (input, exception_table) = length_count(be_u16, AttributeException::parse)(input)?;
		let (input, attribute_info) =
			length_count(be_u16, |input| AttributeInfo::parse(input, constant_pool))(input)?;

		Ok((
			input,
			Code {
				max_stack,
				max_locals,
				code: code.to_vec(),
				exception_table,
				attribute_info,
			},
		))
	}
}

fn length_data_u32(input: &[u8]) -> IResult<'_, &[u8]> {
	let (input, length) = be_u32(input)?;
	take(length)(input)
}

#[derive(Clone, Debug)]
pub enum AttributeInfo {
	ConstantValue {
		constant_index: u16,
	},
	CodeAttribute {
		code: Code,
	},
	// kept raw: semantic verification is not this subsystem's job
	StackMapTable {
		entries: Vec<u8>,
	},
	Exceptions {
		exception_index_table: Vec<u16>,
	},
	Signature {
		signature_index: u16,
	},
	SourceFile {
		source_file_index: u16,
	},
	LineNumberTable {
		line_number_table: Vec<AttributeLineNumber>,
	},
	LocalVariableTable {
		local_variable_table: Vec<AttributeLocalVariable>,
	},
	Unknown {
		name: String,
		data: Vec<u8>,
	},
}

impl AttributeInfo {
	pub fn parse_list<'a>(input: &'a [u8], constant_pool: &ConstantPool) -> IResult<'a, Vec<Self>> {
		context(
			"Attributes",
			length_count(be_u16, |input| AttributeInfo::parse(input, constant_pool)),
		)(input)
	}

	/// Generic framing: name index, length, then exactly `length` bytes. The
	/// window is parsed to completion so declared attribute lengths hold.
	pub fn parse<'a>(input: &'a [u8], constant_pool: &ConstantPool) -> IResult<'a, Self> {
		let (input, info) = context(
			"attribute name",
			map_opt(be_u16, |index| constant_pool.raw_get(index)),
		)(input)?;
		let (input, length) = be_u32(input)?;
		let (input, data) = take(length)(input)?;

		let name = match info {
			ConstantInfo::UTF8(text) => text.as_str(),
			_ => {
				return Err(nom::Err::Failure(ParsingError::add_context(
					input,
					"attribute name is not a UTF8 entry",
					ParsingError::from_error_kind(input, ErrorKind::MapOpt),
				)))
			}
		};

		let (_, attribute) =
			all_consuming(|data| Self::parse_known(name, data, constant_pool))(data)?;
		Ok((input, attribute))
	}

	fn parse_known<'a>(
		name: &str,
		input: &'a [u8],
		constant_pool: &ConstantPool,
	) -> IResult<'a, Self> {
		match name {
			"ConstantValue" => map(be_u16, |constant_index| AttributeInfo::ConstantValue {
				constant_index,
			})(input),
			"Code" => context(
				"Code",
				map(
					|input| Code::parse(input, constant_pool),
					|code| AttributeInfo::CodeAttribute { code },
				),
			)(input),
			"StackMapTable" => map(rest, |entries: &[u8]| AttributeInfo::StackMapTable {
				entries: entries.to_vec(),
			})(input),
			"Exceptions" => map(length_count(be_u16, be_u16), |exception_index_table| {
				AttributeInfo::Exceptions {
					exception_index_table,
				}
			})(input),
			"Signature" => map(be_u16, |signature_index| AttributeInfo::Signature {
				signature_index,
			})(input),
			"SourceFile" => map(be_u16, |source_file_index| AttributeInfo::SourceFile {
				source_file_index,
			})(input),
			"LineNumberTable" => map(
				length_count(be_u16, AttributeLineNumber::parse),
				|line_number_table| AttributeInfo::LineNumberTable { line_number_table },
			)(input),
			"LocalVariableTable" => map(
				length_count(be_u16, AttributeLocalVariable::parse),
				|local_variable_table| AttributeInfo::LocalVariableTable {
					local_variable_table,
				},
			)(input),
			_ => map(rest, |data: &[u8]| AttributeInfo::Unknown {
				name: name.to_string(),
				data: data.to_vec(),
			})(input),
		}
	}
}
