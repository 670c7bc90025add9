use std::env;
use std::thread::Builder;

use javelin_core::shutdown::{self, ExitReason};
use javelin_core::Globals;
use javelin_runtime::{ClassManager, DirectoryClassSource, LoadError, LoaderKind};
use tracing::{debug, error, info, warn};

fn main() {
	let code = Builder::new()
		.name("main".to_string())
		.stack_size(1024 * 1024 * 64)
		.spawn(run)
		.unwrap()
		.join()
		.unwrap();

	std::process::exit(code);
}

fn run() -> i32 {
	javelin_core::init();

	let args: Vec<String> = env::args().collect();
	let mut globals = Globals::new(
		args.first()
			.cloned()
			.unwrap_or_else(|| "javelin".to_string()),
	);

	let env_options = javelin_core::env_args();
	if !env_options.is_empty() {
		debug!("Java environment variables: {env_options}");
	}
	if !globals.java_home.is_empty() {
		debug!("JAVA_HOME: {}", globals.java_home);
	}
	if !globals.javelin_home.is_empty() {
		debug!("JAVELIN_HOME: {}", globals.javelin_home);
	}

	let mut command_line = env_options;
	for arg in &args[1..] {
		if !command_line.is_empty() {
			command_line.push(' ');
		}
		command_line.push_str(arg);
	}
	globals.command_line = command_line;
	debug!("Commandline: {}", globals.command_line);

	parse_args(&mut globals, args.into_iter().skip(1));

	info!("running program: {}", globals.name);

	let manager = ClassManager::new();
	if !globals.classpath.is_empty() {
		manager
			.loader(LoaderKind::Application)
			.add_source(Box::new(DirectoryClassSource::from_classpath(
				&globals.classpath,
			)));
	}
	if let Err(err) = manager.load_base_classes(&globals) {
		// base classes are best-effort; only user-requested classes are fatal
		warn!("{err:#}");
	}

	let main_class = if !globals.starting_jar.is_empty() {
		let manifest_class = match manager
			.get_main_class_from_jar(LoaderKind::Bootstrap, &globals.starting_jar)
		{
			Ok(name) => name,
			Err(err) => {
				return match err.downcast_ref::<LoadError>() {
					Some(LoadError::NoMainManifest { .. }) => {
						shutdown::exit(ExitReason::AppException)
					}
					_ => shutdown::exit(ExitReason::JvmException),
				};
			}
		};
		match manager.load_class_from_jar(
			LoaderKind::Bootstrap,
			&manifest_class,
			&globals.starting_jar,
		) {
			Ok(name) => name,
			// the failure has already been shown to the user
			Err(_) => return shutdown::exit(ExitReason::JvmException),
		}
	} else if !globals.starting_class.is_empty() {
		match manager.load_class_from_file(LoaderKind::Bootstrap, &globals.starting_class) {
			Ok(name) => name,
			Err(_) => return shutdown::exit(ExitReason::JvmException),
		}
	} else {
		error!("Error: No executable program specified. Exiting.");
		return shutdown::exit(ExitReason::AppException);
	};

	manager.load_referenced_classes(&main_class);

	info!("Starting execution with: {main_class}");
	// the execution engine takes the method area from here

	shutdown::exit(ExitReason::Ok)
}

/// Only the executable selection and the classpath are handled here: a
/// `.class` path, a `-jar <file>` pair, or `-cp`/`-classpath <path>`, with
/// everything after the executable passed to the program.
fn parse_args(globals: &mut Globals, mut args: impl Iterator<Item = String>) {
	while let Some(arg) = args.next() {
		if arg == "-cp" || arg == "-classpath" {
			match args.next() {
				Some(classpath) => globals.classpath = classpath,
				None => error!("{arg} requires a path argument"),
			}
			continue;
		}

		if arg == "-jar" {
			match args.next() {
				Some(jar) => {
					globals.starting_jar = jar;
					globals.app_args = args.collect();
				}
				None => error!("-jar requires a jarfile argument"),
			}
			return;
		}

		if arg.ends_with(".class") {
			globals.starting_class = arg;
			globals.app_args = args.collect();
			return;
		}

		warn!("{arg} is not a recognized option. Ignored.");
	}
}
