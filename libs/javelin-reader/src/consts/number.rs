use crate::impl_constant;

#[derive(Copy, Clone, Debug)]
pub struct IntegerConst {
	pub bytes: i32,
}

#[derive(Copy, Clone, Debug)]
pub struct FloatConst {
	pub bytes: f32,
}

#[derive(Copy, Clone, Debug)]
pub struct LongConst {
	pub bytes: i64,
}

#[derive(Copy, Clone, Debug)]
pub struct DoubleConst {
	pub bytes: f64,
}

impl_constant!(Integer IntegerConst);
impl_constant!(Float FloatConst);
impl_constant!(Long LongConst);
impl_constant!(Double DoubleConst);
