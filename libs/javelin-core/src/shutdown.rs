use tracing::{info, warn};

/// Why the process is coming down. The numeric codes are what the host
/// process reports; the driver performs the actual `process::exit`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ExitReason {
	Ok,
	AppException,
	JvmException,
}

impl ExitReason {
	pub fn code(self) -> i32 {
		match self {
			ExitReason::Ok => 0,
			ExitReason::AppException => 1,
			ExitReason::JvmException => 2,
		}
	}
}

pub fn exit(reason: ExitReason) -> i32 {
	match reason {
		ExitReason::Ok => info!("shutdown requested, all is well"),
		ExitReason::AppException => warn!("shutdown requested after application error"),
		ExitReason::JvmException => warn!("shutdown requested after VM error"),
	}
	reason.code()
}
