use ahash::{HashMap, HashMapExt};
use eyre::eyre;
use javelin_core::{ClassAccessFlags, FieldAccessFlags, MethodAccessFlags};
use javelin_reader::{AttributeInfo, ClassInfo, ConstantInfo};

/// Tags of the execution-facing pool. `Invalid` covers the reserved zero
/// entry and the shadow slot behind longs and doubles.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CpTag {
	Invalid,
	Utf8,
	Integer,
	Float,
	Long,
	Double,
	Class,
	FieldRef,
	MethodRef,
	InterfaceMethodRef,
	NameAndType,
	MethodHandle,
	MethodType,
	Dynamic,
	InvokeDynamic,
	Module,
	Package,
}

/// One pool position: which kind of entry lives here and where its payload
/// sits in the matching side table.
#[derive(Copy, Clone, Debug)]
pub struct CpSlot {
	pub tag: CpTag,
	pub slot: u16,
}

#[derive(Copy, Clone, Debug)]
pub struct MemberRef {
	/// slot into `class_refs`
	pub class: u16,
	/// slot into `name_and_types`
	pub name_and_type: u16,
}

#[derive(Copy, Clone, Debug)]
pub struct NameAndTypeRef {
	/// slot into `utf8_refs`
	pub name: u16,
	/// slot into `utf8_refs`
	pub descriptor: u16,
}

#[derive(Copy, Clone, Debug)]
pub struct MethodHandleRef {
	pub kind: u8,
	/// raw pool index of the referenced member
	pub reference: u16,
}

#[derive(Copy, Clone, Debug)]
pub struct DynamicRef {
	pub bootstrap_method: u16,
	/// slot into `name_and_types`
	pub name_and_type: u16,
}

#[derive(Debug, Default)]
pub struct PostablePool {
	pub cp_index: Vec<CpSlot>,
	pub utf8_refs: Vec<String>,
	pub int_refs: Vec<i32>,
	pub float_refs: Vec<f32>,
	pub long_refs: Vec<i64>,
	pub double_refs: Vec<f64>,
	/// each entry is a slot into `utf8_refs` holding the class name
	pub class_refs: Vec<u16>,
	pub field_refs: Vec<MemberRef>,
	pub method_refs: Vec<MemberRef>,
	pub interface_refs: Vec<MemberRef>,
	pub name_and_types: Vec<NameAndTypeRef>,
	pub method_handles: Vec<MethodHandleRef>,
	/// slots into `utf8_refs` holding descriptors
	pub method_types: Vec<u16>,
	pub dynamics: Vec<DynamicRef>,
	pub invoke_dynamics: Vec<DynamicRef>,
	pub modules: Vec<u16>,
	pub packages: Vec<u16>,
}

#[derive(Debug)]
pub struct PostableField {
	pub access_flags: FieldAccessFlags,
	pub name: u16,
	pub descriptor: u16,
	/// raw pool index of the ConstantValue payload
	pub constant_value: Option<u16>,
}

#[derive(Clone, Debug)]
pub struct CodeException {
	pub start_pc: u16,
	pub end_pc: u16,
	pub handler_pc: u16,
	pub catch_type: u16,
}

#[derive(Debug)]
pub struct PostableCode {
	pub max_stack: u16,
	pub max_locals: u16,
	pub code: Vec<u8>,
	pub exceptions: Vec<CodeException>,
}

#[derive(Debug)]
pub struct PostableMethod {
	pub access_flags: MethodAccessFlags,
	pub name: u16,
	pub descriptor: u16,
	pub code: Option<PostableCode>,
}

/// The execution-facing class shape: string constants have collapsed into
/// their UTF8 targets and every cross-reference is a slot into a side table,
/// so nothing the engine touches can dangle.
#[derive(Debug)]
pub struct PostableClass {
	pub name: String,
	pub super_name: Option<String>,
	pub minor_version: u16,
	pub major_version: u16,
	pub access_flags: ClassAccessFlags,
	pub cp: PostablePool,
	/// slots into `cp.class_refs`
	pub interfaces: Vec<u16>,
	pub fields: Vec<PostableField>,
	pub methods: Vec<PostableMethod>,
	pub source_file: Option<String>,
}

impl Default for PostableClass {
	fn default() -> Self {
		PostableClass {
			name: String::new(),
			super_name: None,
			minor_version: 0,
			major_version: 0,
			access_flags: ClassAccessFlags::empty(),
			cp: PostablePool::default(),
			interfaces: Vec::new(),
			fields: Vec::new(),
			methods: Vec::new(),
			source_file: None,
		}
	}
}

impl PostableClass {
	/// Names of every class this one's pool points at, normalized. Array
	/// references to primitives come back empty and are dropped.
	pub fn referenced_classes(&self) -> Vec<&str> {
		let mut names = Vec::with_capacity(self.cp.class_refs.len());
		for &utf8_slot in &self.cp.class_refs {
			let name = normalize_class_reference(&self.cp.utf8_refs[utf8_slot as usize]);
			if !name.is_empty() {
				names.push(name);
			}
		}
		names
	}

	pub fn utf8(&self, slot: u16) -> &str {
		&self.cp.utf8_refs[slot as usize]
	}
}

/// `[Ljava/lang/String;` means the class `java/lang/String`; an array of a
/// primitive means no class at all; everything else is already a name.
pub fn normalize_class_reference(name: &str) -> &str {
	if let Some(stripped) = name.strip_prefix("[L") {
		stripped.strip_suffix(';').unwrap_or(stripped)
	} else if name.starts_with('[') {
		""
	} else {
		name
	}
}

pub fn convert_to_postable(class: &ClassInfo) -> eyre::Result<PostableClass> {
	let pool = &class.constant_pool;
	let count = pool.count() as usize;

	let mut cp = PostablePool {
		cp_index: vec![
			CpSlot {
				tag: CpTag::Invalid,
				slot: 0,
			};
			count
		],
		..PostablePool::default()
	};

	let mut utf8_slots: HashMap<u16, u16> = HashMap::new();
	let mut class_slots: HashMap<u16, u16> = HashMap::new();
	let mut nat_slots: HashMap<u16, u16> = HashMap::new();

	// UTF8 and numeric payloads first so every later wave can point at them.
	for (index, info) in pool.iter() {
		let slot = match info {
			ConstantInfo::UTF8(text) => {
				let slot = cp.utf8_refs.len() as u16;
				cp.utf8_refs.push(text.as_str().to_string());
				utf8_slots.insert(index, slot);
				CpSlot {
					tag: CpTag::Utf8,
					slot,
				}
			}
			ConstantInfo::Integer(value) => {
				let slot = cp.int_refs.len() as u16;
				cp.int_refs.push(value.bytes);
				CpSlot {
					tag: CpTag::Integer,
					slot,
				}
			}
			ConstantInfo::Float(value) => {
				let slot = cp.float_refs.len() as u16;
				cp.float_refs.push(value.bytes);
				CpSlot {
					tag: CpTag::Float,
					slot,
				}
			}
			ConstantInfo::Long(value) => {
				let slot = cp.long_refs.len() as u16;
				cp.long_refs.push(value.bytes);
				CpSlot {
					tag: CpTag::Long,
					slot,
				}
			}
			ConstantInfo::Double(value) => {
				let slot = cp.double_refs.len() as u16;
				cp.double_refs.push(value.bytes);
				CpSlot {
					tag: CpTag::Double,
					slot,
				}
			}
			_ => continue,
		};
		cp.cp_index[index as usize] = slot;
	}

	// classes and name-and-type pairs next
	for (index, info) in pool.iter() {
		let slot = match info {
			ConstantInfo::Class(class_const) => {
				let name = utf8_slot(&utf8_slots, class_const.name.index())?;
				let slot = cp.class_refs.len() as u16;
				cp.class_refs.push(name);
				class_slots.insert(index, slot);
				CpSlot {
					tag: CpTag::Class,
					slot,
				}
			}
			ConstantInfo::NameAndType(name_and_type) => {
				let slot = cp.name_and_types.len() as u16;
				cp.name_and_types.push(NameAndTypeRef {
					name: utf8_slot(&utf8_slots, name_and_type.name.index())?,
					descriptor: utf8_slot(&utf8_slots, name_and_type.descriptor.index())?,
				});
				nat_slots.insert(index, slot);
				CpSlot {
					tag: CpTag::NameAndType,
					slot,
				}
			}
			ConstantInfo::MethodType(method_type) => {
				let slot = cp.method_types.len() as u16;
				cp.method_types
					.push(utf8_slot(&utf8_slots, method_type.descriptor.index())?);
				CpSlot {
					tag: CpTag::MethodType,
					slot,
				}
			}
			ConstantInfo::Module(module) => {
				let slot = cp.modules.len() as u16;
				cp.modules.push(utf8_slot(&utf8_slots, module.name.index())?);
				CpSlot {
					tag: CpTag::Module,
					slot,
				}
			}
			ConstantInfo::Package(package) => {
				let slot = cp.packages.len() as u16;
				cp.packages
					.push(utf8_slot(&utf8_slots, package.name.index())?);
				CpSlot {
					tag: CpTag::Package,
					slot,
				}
			}
			_ => continue,
		};
		cp.cp_index[index as usize] = slot;
	}

	// members, string constants, and dynamic call sites last
	for (index, info) in pool.iter() {
		let slot = match info {
			// the normalization itself: the string constant is now its UTF8
			ConstantInfo::String(string) => CpSlot {
				tag: CpTag::Utf8,
				slot: utf8_slot(&utf8_slots, string.string.index())?,
			},
			ConstantInfo::Field(field) => {
				let slot = cp.field_refs.len() as u16;
				cp.field_refs.push(MemberRef {
					class: class_slot(&class_slots, field.class.index())?,
					name_and_type: nat_slot(&nat_slots, field.name_and_type.index())?,
				});
				CpSlot {
					tag: CpTag::FieldRef,
					slot,
				}
			}
			ConstantInfo::Method(method) => {
				let slot = cp.method_refs.len() as u16;
				cp.method_refs.push(MemberRef {
					class: class_slot(&class_slots, method.class.index())?,
					name_and_type: nat_slot(&nat_slots, method.name_and_type.index())?,
				});
				CpSlot {
					tag: CpTag::MethodRef,
					slot,
				}
			}
			ConstantInfo::Interface(interface) => {
				let slot = cp.interface_refs.len() as u16;
				cp.interface_refs.push(MemberRef {
					class: class_slot(&class_slots, interface.class.index())?,
					name_and_type: nat_slot(&nat_slots, interface.name_and_type.index())?,
				});
				CpSlot {
					tag: CpTag::InterfaceMethodRef,
					slot,
				}
			}
			ConstantInfo::MethodHandle(handle) => {
				let slot = cp.method_handles.len() as u16;
				cp.method_handles.push(MethodHandleRef {
					kind: handle.reference_kind,
					reference: handle.reference_index,
				});
				CpSlot {
					tag: CpTag::MethodHandle,
					slot,
				}
			}
			ConstantInfo::Dynamic(dynamic) => {
				let slot = cp.dynamics.len() as u16;
				cp.dynamics.push(DynamicRef {
					bootstrap_method: dynamic.bootstrap_method_attr_index,
					name_and_type: nat_slot(&nat_slots, dynamic.name_and_type.index())?,
				});
				CpSlot {
					tag: CpTag::Dynamic,
					slot,
				}
			}
			ConstantInfo::InvokeDynamic(invoke_dynamic) => {
				let slot = cp.invoke_dynamics.len() as u16;
				cp.invoke_dynamics.push(DynamicRef {
					bootstrap_method: invoke_dynamic.bootstrap_method_attr_index,
					name_and_type: nat_slot(&nat_slots, invoke_dynamic.name_and_type.index())?,
				});
				CpSlot {
					tag: CpTag::InvokeDynamic,
					slot,
				}
			}
			_ => continue,
		};
		cp.cp_index[index as usize] = slot;
	}

	let name = class
		.name()
		.ok_or_else(|| eyre!("this_class does not resolve to a class name"))?
		.to_string();

	let super_name = if class.super_class.is_null() {
		None
	} else {
		let super_const = class
			.super_class
			.get(pool)
			.ok_or_else(|| eyre!("super_class is not a class entry"))?;
		let super_name = super_const
			.name
			.get(pool)
			.ok_or_else(|| eyre!("superclass name is not a UTF8 entry"))?;
		Some(super_name.as_str().to_string())
	};

	let interfaces = class
		.interfaces
		.iter()
		.map(|ptr| class_slot(&class_slots, ptr.index()))
		.collect::<eyre::Result<Vec<u16>>>()?;

	let fields = class
		.fields
		.iter()
		.map(|field| {
			Ok(PostableField {
				access_flags: field.access_flags,
				name: utf8_slot(&utf8_slots, field.name_index.index())?,
				descriptor: utf8_slot(&utf8_slots, field.descriptor_index.index())?,
				constant_value: field.attribute_info.iter().find_map(|attribute| {
					match attribute {
						AttributeInfo::ConstantValue { constant_index } => Some(*constant_index),
						_ => None,
					}
				}),
			})
		})
		.collect::<eyre::Result<Vec<PostableField>>>()?;

	let methods = class
		.methods
		.iter()
		.map(|method| {
			let code = method.code().map(|code| PostableCode {
				max_stack: code.max_stack,
				max_locals: code.max_locals,
				code: code.code.clone(),
				exceptions: code
					.exception_table
					.iter()
					.map(|exception| CodeException {
						start_pc: exception.start_pc,
						end_pc: exception.end_pc,
						handler_pc: exception.handler_pc,
						catch_type: exception.catch_type,
					})
					.collect(),
			});
			Ok(PostableMethod {
				access_flags: method.access_flags,
				name: utf8_slot(&utf8_slots, method.name_index.index())?,
				descriptor: utf8_slot(&utf8_slots, method.descriptor_index.index())?,
				code,
			})
		})
		.collect::<eyre::Result<Vec<PostableMethod>>>()?;

	let source_file = class.attributes.iter().find_map(|attribute| match attribute {
		AttributeInfo::SourceFile { source_file_index } => match pool.raw_get(*source_file_index) {
			Some(ConstantInfo::UTF8(text)) => Some(text.as_str().to_string()),
			_ => None,
		},
		_ => None,
	});

	Ok(PostableClass {
		name,
		super_name,
		minor_version: class.minor_version,
		major_version: class.major_version,
		access_flags: class.access_flags,
		cp,
		interfaces,
		fields,
		methods,
		source_file,
	})
}

fn utf8_slot(slots: &HashMap<u16, u16>, index: u16) -> eyre::Result<u16> {
	slots
		.get(&index)
		.copied()
		.ok_or_else(|| eyre!("index {index} does not reference a UTF8 entry"))
}

fn class_slot(slots: &HashMap<u16, u16>, index: u16) -> eyre::Result<u16> {
	slots
		.get(&index)
		.copied()
		.ok_or_else(|| eyre!("index {index} does not reference a class entry"))
}

fn nat_slot(slots: &HashMap<u16, u16>, index: u16) -> eyre::Result<u16> {
	slots
		.get(&index)
		.copied()
		.ok_or_else(|| eyre!("index {index} does not reference a name-and-type entry"))
}

#[cfg(test)]
mod tests {
	use super::*;
	use javelin_reader::{ClassConst, ConstPtr, ConstantPool, StringConst, UTF8Const};

	fn class_with_string_const() -> ClassInfo {
		// 1: Utf8 "Thing", 2: Class -> 1, 3: String -> 4, 4: Utf8 "Hello string"
		let constant_pool = ConstantPool::new(vec![
			ConstantInfo::UTF8(UTF8Const("Thing".to_string())),
			ConstantInfo::Class(ClassConst {
				name: ConstPtr::new(1),
			}),
			ConstantInfo::String(StringConst {
				string: ConstPtr::new(4),
			}),
			ConstantInfo::UTF8(UTF8Const("Hello string".to_string())),
		]);

		ClassInfo {
			minor_version: 0,
			major_version: 55,
			constant_pool,
			access_flags: ClassAccessFlags::PUBLIC,
			this_class: ConstPtr::new(2),
			super_class: ConstPtr::new(0),
			interfaces: Vec::new(),
			fields: Vec::new(),
			methods: Vec::new(),
			attributes: Vec::new(),
		}
	}

	#[test]
	fn string_consts_become_utf8() {
		let postable = convert_to_postable(&class_with_string_const()).unwrap();

		let slot = postable.cp.cp_index[3];
		assert_eq!(slot.tag, CpTag::Utf8);
		assert_eq!(postable.utf8(slot.slot), "Hello string");
		// the UTF8 target was not duplicated
		assert_eq!(postable.cp.utf8_refs.len(), 2);
	}

	#[test]
	fn pool_index_zero_stays_reserved() {
		let postable = convert_to_postable(&class_with_string_const()).unwrap();
		assert_eq!(postable.cp.cp_index[0].tag, CpTag::Invalid);
	}

	#[test]
	fn referenced_classes_are_enumerated() {
		let postable = convert_to_postable(&class_with_string_const()).unwrap();
		assert_eq!(postable.referenced_classes(), vec!["Thing"]);
	}

	#[test]
	fn class_references_normalize() {
		assert_eq!(
			normalize_class_reference("[Ljava/test/java.String;"),
			"java/test/java.String"
		);
		assert_eq!(normalize_class_reference("[B"), "");
		assert_eq!(
			normalize_class_reference("java/lang/Object"),
			"java/lang/Object"
		);
	}
}
