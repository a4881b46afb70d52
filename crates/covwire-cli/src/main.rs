use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use covwire_core::prelude::*;
use covwire_core::{FileDocumentStore, FileExternalConfigStore};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

type FileSetup = CoverageSetup<FileDocumentStore, FileExternalConfigStore>;

fn cli() -> Command {
    Command::new("covwire")
        .version(covwire_core::VERSION)
        .about("Wire JaCoCo code coverage into a Maven project")
        .subcommand_required(true)
        .arg(
            Arg::new("project")
                .long("project")
                .global(true)
                .default_value(".")
                .value_parser(value_parser!(PathBuf))
                .help("Project root containing the build descriptor"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Config file (defaults to covwire.toml in the project root)"),
        )
        .subcommand(
            Command::new("setup")
                .about("Install the coverage profile")
                .arg(
                    Arg::new("package")
                        .long("package")
                        .help("Limit instrumentation to this package"),
                ),
        )
        .subcommand(
            Command::new("run-tests")
                .about("Scope coverage to a package and run the tests")
                .arg(
                    Arg::new("package")
                        .long("package")
                        .required(true)
                        .help("Package containing classes to instrument"),
                )
                .arg(
                    Arg::new("container-profile")
                        .long("container-profile")
                        .help("Run container tests with this managed container profile"),
                ),
        )
        .subcommand(
            Command::new("create-report")
                .about("Create the coverage report under target/site/jacoco"),
        )
        .subcommand(Command::new("status").about("Show how far setup has progressed"))
        .subcommand(
            Command::new("show-config")
                .about("Print the effective configuration")
                .arg(
                    Arg::new("check")
                        .long("check")
                        .action(ArgAction::SetTrue)
                        .help("Only validate, print nothing"),
                ),
        )
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "covwire=info,covwire_core=info".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Runs build commands as child processes in the project root
struct ShellRunner {
    dir: PathBuf,
}

impl ProcessRunner for ShellRunner {
    fn run(&mut self, command: &CommandLine) -> MergeResult<i32> {
        let status = std::process::Command::new(&command.program)
            .args(&command.args)
            .current_dir(&self.dir)
            .status()
            .map_err(|source| MergeError::Spawn {
                command: command.to_string(),
                source,
            })?;
        // killed by a signal
        Ok(status.code().unwrap_or(-1))
    }
}

fn load_config(project: &Path, explicit: Option<&PathBuf>) -> anyhow::Result<CoverageConfig> {
    let config = match explicit {
        Some(path) => CoverageConfig::from_file(path),
        None => CoverageConfig::load(project),
    };
    config.context("loading configuration")
}

fn open_setup(project: &Path, config: CoverageConfig) -> FileSetup {
    let descriptors = FileDocumentStore::new(project.join(&config.descriptor_file));
    let external = FileExternalConfigStore::new(project.join(&config.test_resource_dir));
    CoverageSetup::new(config, descriptors, external)
}

fn run(matches: &ArgMatches) -> anyhow::Result<()> {
    let project = matches
        .get_one::<PathBuf>("project")
        .cloned()
        .unwrap_or_else(|| PathBuf::from("."));
    let config = load_config(&project, matches.get_one::<PathBuf>("config"))?;
    tracing::debug!(
        project = %project.display(),
        descriptor = %config.descriptor_file,
        "project opened"
    );

    match matches.subcommand() {
        Some(("setup", args)) => {
            let package = args.get_one::<String>("package").map(String::as_str);
            let state = open_setup(&project, config).install(package)?;
            println!("Coverage setup: {state}");
        }
        Some(("run-tests", args)) => {
            let package = args
                .get_one::<String>("package")
                .context("--package is required")?;
            let container = args.get_one::<String>("container-profile").map(String::as_str);
            let mut runner = ShellRunner {
                dir: project.clone(),
            };
            open_setup(&project, config).run_tests(&mut runner, package, container)?;
        }
        Some(("create-report", _)) => {
            let mut runner = ShellRunner {
                dir: project.clone(),
            };
            open_setup(&project, config).create_report(&mut runner)?;
            println!("Report written to {}", project.join("target/site/jacoco").display());
        }
        Some(("status", _)) => {
            let state = open_setup(&project, config).state()?;
            println!("{state}");
        }
        Some(("show-config", args)) => {
            config.validate()?;
            if !args.get_flag("check") {
                print!("{}", config.to_toml()?);
            }
        }
        _ => unreachable!("subcommand is required"),
    }
    Ok(())
}

fn main() -> ExitCode {
    init_tracing();

    match run(&cli().get_matches()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let user_facing = err
                .downcast_ref::<MergeError>()
                .is_some_and(MergeError::is_user_facing);
            if user_facing {
                eprintln!("error: {err}");
            } else {
                eprintln!("error: {err:#}");
            }
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const POM: &str = "<project><modelVersion>4.0.0</modelVersion></project>";

    fn project() -> TempDir {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("pom.xml"), POM).unwrap();
        dir
    }

    fn run_args(dir: &TempDir, args: &[&str]) -> anyhow::Result<()> {
        let project = dir.path().to_string_lossy().into_owned();
        let mut argv = vec!["covwire", "--project", project.as_str()];
        argv.extend_from_slice(args);
        run(&cli().try_get_matches_from(argv)?)
    }

    #[test]
    fn cli_definition_is_consistent() {
        cli().debug_assert();
    }

    #[test]
    fn run_tests_requires_package() {
        assert!(cli().try_get_matches_from(["covwire", "run-tests"]).is_err());
    }

    #[test]
    fn setup_writes_profile() {
        let dir = project();
        run_args(&dir, &["setup", "--package", "com.test"]).unwrap();
        run_args(&dir, &["setup", "--package", "com.test"]).unwrap();

        let pom = std::fs::read_to_string(dir.path().join("pom.xml")).unwrap();
        assert_eq!(pom.matches("<id>jacoco</id>").count(), 1);
        assert!(pom.contains("<include>com/test/**</include>"));
    }

    #[test]
    fn config_file_overrides_profile_id() {
        let dir = project();
        std::fs::write(dir.path().join("covwire.toml"), "profile_id = \"coverage\"\n").unwrap();
        run_args(&dir, &["setup"]).unwrap();

        let pom = std::fs::read_to_string(dir.path().join("pom.xml")).unwrap();
        assert!(pom.contains("<id>coverage</id>"));
    }

    #[test]
    fn missing_descriptor_fails() {
        let dir = TempDir::new().unwrap();
        let err = run_args(&dir, &["status"]).unwrap_err();
        assert!(matches!(err.downcast_ref::<MergeError>(), Some(MergeError::Io { .. })));
    }

    #[test]
    fn unknown_program_is_a_spawn_error() {
        let dir = TempDir::new().unwrap();
        let mut runner = ShellRunner {
            dir: dir.path().to_path_buf(),
        };
        let err = runner
            .run(&CommandLine::new("covwire-no-such-program-here"))
            .unwrap_err();
        assert!(matches!(err, MergeError::Spawn { .. }));
    }
}
