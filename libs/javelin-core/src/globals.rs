use std::env;
use std::path::MAIN_SEPARATOR;

/// Process-wide configuration, assembled once at startup and handed by
/// reference to the subsystems that need it.
#[derive(Debug, Clone)]
pub struct Globals {
	pub name: String,
	pub version: String,
	pub vm_model: String,

	pub java_home: String,
	pub javelin_home: String,
	pub base_module: String,
	pub classpath: String,

	pub starting_class: String,
	pub starting_jar: String,
	pub app_args: Vec<String>,
	pub command_line: String,

	pub max_java_version: u16,
	pub strict_jdk: bool,
	pub exit_now: bool,
}

impl Globals {
	pub fn new(name: impl ToString) -> Globals {
		Globals {
			name: name.to_string(),
			version: env!("CARGO_PKG_VERSION").to_string(),
			vm_model: "server".to_string(),
			java_home: home_from_env("JAVA_HOME"),
			javelin_home: home_from_env("JAVELIN_HOME"),
			base_module: "java.base.jmod".to_string(),
			classpath: env::var("CLASSPATH").unwrap_or_default(),
			starting_class: String::new(),
			starting_jar: String::new(),
			app_args: Vec::new(),
			command_line: String::new(),
			max_java_version: 11,
			strict_jdk: false,
			exit_now: false,
		}
	}
}

fn home_from_env(key: &str) -> String {
	env::var(key).map(|v| normalize_home(&v)).unwrap_or_default()
}

/// Trailing separators are dropped and forward slashes rewritten to the
/// platform separator, so the rest of the code can join paths blindly.
pub fn normalize_home(path: &str) -> String {
	let trimmed = path.trim_end_matches(['/', '\\']);
	trimmed.replace('/', &MAIN_SEPARATOR.to_string())
}

/// JVM options may arrive through the environment before the command line is
/// consulted. Order matters: later variables override earlier ones.
pub fn env_args() -> String {
	let mut args = String::new();
	for key in ["JAVA_TOOL_OPTIONS", "_JAVA_OPTIONS", "JDK_JAVA_OPTIONS"] {
		if let Ok(value) = env::var(key) {
			if !value.is_empty() {
				args.push_str(&value);
				if !args.ends_with(' ') {
					args.push(' ');
				}
			}
		}
	}
	args.trim().to_string()
}
