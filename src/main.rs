use clap::{Arg, ArgAction, Command};
use starship::runner::{self, Options};
use std::fs;
use std::path::Path;
use std::process::ExitCode;

fn main() -> ExitCode {
    let matches = Command::new("starship")
        .about("Front end of the Starship compiler")
        .version(env!("CARGO_PKG_VERSION"))
        .arg(
            Arg::new("file")
                .help("The source file to compile")
                .value_name("FILE")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("tokens")
                .long("tokens")
                .help("Print the token stream")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("ast")
                .long("ast")
                .help("Print the syntax tree")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Log what the front end is doing")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let default_level = if matches.get_flag("verbose") { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let options = Options {
        dump_tokens: matches.get_flag("tokens"),
        dump_ast: matches.get_flag("ast"),
    };

    match matches.get_one::<String>("file") {
        Some(file_path) => compile_file(file_path, &options),
        None => ExitCode::FAILURE,
    }
}

fn compile_file(path: &str, options: &Options) -> ExitCode {
    let path = Path::new(path);

    if !path.exists() {
        eprintln!("Error: File '{}' not found", path.display());
        return ExitCode::FAILURE;
    }

    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Error reading file '{}': {}", path.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let filename = path.display().to_string();
    match runner::run(&source, Some(&filename), options) {
        Ok(compilation) => {
            log::info!(
                "compiled {} with {} warnings",
                filename,
                compilation.warnings.len()
            );
            ExitCode::SUCCESS
        }
        Err(_) => ExitCode::FAILURE,
    }
}
