use eyre::{bail, eyre, Context};

use crate::{
	ClassInfo, ConstPtr, Constant, ConstantInfo, ConstantPool, UTF8Const,
};

/// Structural verification of everything the parser could not check locally:
/// every cross-index must land in range and on an entry of the right kind.
pub fn format_check(class: &ClassInfo) -> eyre::Result<()> {
	let cp = &class.constant_pool;

	for (index, info) in cp.iter() {
		check_entry(cp, info)
			.wrap_err_with(|| format!("constant pool entry {index} failed the format check"))?;
	}

	let this_name = class
		.name()
		.ok_or_else(|| eyre!("this_class does not resolve to a class name"))?;

	if class.super_class.is_null() {
		// only the root of the class hierarchy may have no superclass
		if this_name != "java/lang/Object" {
			bail!("class {this_name} has no superclass");
		}
	} else {
		let super_class = class
			.super_class
			.get(cp)
			.ok_or_else(|| eyre!("super_class index {} is not a class entry", class.super_class.index()))?;
		expect::<UTF8Const>(cp, super_class.name).wrap_err("superclass name")?;
	}

	for interface in &class.interfaces {
		let class_const = interface
			.get(cp)
			.ok_or_else(|| eyre!("interface index {} is not a class entry", interface.index()))?;
		expect::<UTF8Const>(cp, class_const.name).wrap_err("interface name")?;
	}

	for field in &class.fields {
		expect::<UTF8Const>(cp, field.name_index).wrap_err("field name")?;
		expect::<UTF8Const>(cp, field.descriptor_index).wrap_err("field descriptor")?;
	}

	for method in &class.methods {
		expect::<UTF8Const>(cp, method.name_index).wrap_err("method name")?;
		expect::<UTF8Const>(cp, method.descriptor_index).wrap_err("method descriptor")?;
	}

	Ok(())
}

fn check_entry(cp: &ConstantPool, info: &ConstantInfo) -> eyre::Result<()> {
	match info {
		ConstantInfo::Class(class) => {
			expect::<UTF8Const>(cp, class.name).wrap_err("class name")?;
		}
		ConstantInfo::String(string) => {
			expect::<UTF8Const>(cp, string.string).wrap_err("string value")?;
		}
		ConstantInfo::Field(field) => {
			expect(cp, field.class).wrap_err("fieldref class")?;
			expect(cp, field.name_and_type).wrap_err("fieldref name-and-type")?;
		}
		ConstantInfo::Method(method) => {
			expect(cp, method.class).wrap_err("methodref class")?;
			expect(cp, method.name_and_type).wrap_err("methodref name-and-type")?;
		}
		ConstantInfo::Interface(interface) => {
			expect(cp, interface.class).wrap_err("interface methodref class")?;
			expect(cp, interface.name_and_type).wrap_err("interface methodref name-and-type")?;
		}
		ConstantInfo::NameAndType(name_and_type) => {
			expect::<UTF8Const>(cp, name_and_type.name).wrap_err("name-and-type name")?;
			expect::<UTF8Const>(cp, name_and_type.descriptor)
				.wrap_err("name-and-type descriptor")?;
		}
		ConstantInfo::MethodHandle(handle) => {
			if !(1..=9).contains(&handle.reference_kind) {
				bail!("method handle kind {} is out of range", handle.reference_kind);
			}
			if cp.raw_get(handle.reference_index).is_none() {
				bail!(
					"method handle reference index {} is out of range",
					handle.reference_index
				);
			}
		}
		ConstantInfo::MethodType(method_type) => {
			expect::<UTF8Const>(cp, method_type.descriptor).wrap_err("method type descriptor")?;
		}
		ConstantInfo::Dynamic(dynamic) => {
			expect(cp, dynamic.name_and_type).wrap_err("dynamic name-and-type")?;
		}
		ConstantInfo::InvokeDynamic(invoke_dynamic) => {
			expect(cp, invoke_dynamic.name_and_type).wrap_err("invokedynamic name-and-type")?;
		}
		ConstantInfo::Module(module) => {
			expect::<UTF8Const>(cp, module.name).wrap_err("module name")?;
		}
		ConstantInfo::Package(package) => {
			expect::<UTF8Const>(cp, package.name).wrap_err("package name")?;
		}
		ConstantInfo::Integer(_)
		| ConstantInfo::Float(_)
		| ConstantInfo::Long(_)
		| ConstantInfo::Double(_)
		| ConstantInfo::UTF8(_)
		| ConstantInfo::Unusable => {}
	}

	Ok(())
}

fn expect<'a, V: Constant>(cp: &'a ConstantPool, ptr: ConstPtr<V>) -> eyre::Result<&'a V> {
	ptr.get(cp).ok_or_else(|| {
		eyre!(
			"index {} does not reference an entry of the expected kind",
			ptr.index()
		)
	})
}
