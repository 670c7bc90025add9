use crate::consts::name_and_type::NameAndTypeConst;
use crate::consts::ConstPtr;
use crate::impl_constant;

#[derive(Copy, Clone, Debug)]
pub struct DynamicConst {
	pub bootstrap_method_attr_index: u16,
	pub name_and_type: ConstPtr<NameAndTypeConst>,
}

#[derive(Copy, Clone, Debug)]
pub struct InvokeDynamicConst {
	pub bootstrap_method_attr_index: u16,
	pub name_and_type: ConstPtr<NameAndTypeConst>,
}

impl_constant!(Dynamic DynamicConst);
impl_constant!(InvokeDynamic InvokeDynamicConst);
