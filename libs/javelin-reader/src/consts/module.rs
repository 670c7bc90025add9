use crate::consts::utf_8::UTF8Const;
use crate::consts::ConstPtr;
use crate::impl_constant;

#[derive(Copy, Clone, Debug)]
pub struct ModuleConst {
	pub name: ConstPtr<UTF8Const>,
}

#[derive(Copy, Clone, Debug)]
pub struct PackageConst {
	pub name: ConstPtr<UTF8Const>,
}

impl_constant!(Module ModuleConst);
impl_constant!(Package PackageConst);
