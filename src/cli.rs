//! Command-line interface for termprof.
//!
//! Flags override the matching config file values; the config file itself
//! is optional.

use crate::discovery::AwsCliDirectory;
use crate::generate::{Generator, InstanceSource};
use crate::profile::reconcile::{OutputMode, ReconcileOutcome};
use crate::sources::{AwsAccountSource, ProfileGenerator};
use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use termprof_config::{Config, Profiles};
use tokio::runtime::Runtime;

/// termprof - iTerm2 dynamic profiles from AWS, Kubernetes, SSH and more
#[derive(Debug, Parser)]
#[command(name = "termprof")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Set log level (overrides RUST_LOG)
    #[arg(long, value_enum, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevelArg>,
}

/// Log level argument for CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum LogLevelArg {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevelArg {
    /// Convert to `log::LevelFilter`
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevelArg::Off => log::LevelFilter::Off,
            LogLevelArg::Error => log::LevelFilter::Error,
            LogLevelArg::Warn => log::LevelFilter::Warn,
            LogLevelArg::Info => log::LevelFilter::Info,
            LogLevelArg::Debug => log::LevelFilter::Debug,
            LogLevelArg::Trace => log::LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Generate the dynamic profiles document
    #[command(visible_alias = "gen")]
    Generate(GenerateArgs),

    /// Print a script running a command in every AWS account
    #[command(visible_alias = "cmd")]
    Estate(EstateArgs),
}

#[derive(Debug, Default, Args)]
pub struct GenerateArgs {
    /// Dynamic profiles document to write or diff against
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    #[arg(short, long, value_name = "PATH")]
    pub aws_config: Option<PathBuf>,

    #[arg(short = 'c', long, value_name = "PATH")]
    pub aws_credentials: Option<PathBuf>,

    #[arg(short, long, value_name = "PATH")]
    pub kube_config: Option<PathBuf>,

    /// Replace the output file
    #[arg(short, long)]
    pub write: bool,

    /// Show what would change in the output file
    #[arg(short, long)]
    pub diff: bool,

    /// Reuse cached instances instead of discovering them
    #[arg(short = 'I', long)]
    pub ignore_instances: bool,

    /// Config file (default: ~/.config/termprof/config.yaml)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct EstateArgs {
    /// Command to run; may use {{ .Profile }} and {{ .Region }}
    #[arg(long = "cmd", value_name = "COMMAND", default_value = "aws s3 ls")]
    pub command: String,

    #[arg(short, long, value_name = "PATH")]
    pub aws_config: Option<PathBuf>,

    #[arg(short = 'c', long, value_name = "PATH")]
    pub aws_credentials: Option<PathBuf>,

    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

fn path_string(path: &std::path::Path) -> String {
    path.to_string_lossy().into_owned()
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<Config> {
    let config = match path {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    Ok(config)
}

impl GenerateArgs {
    /// Apply the path overrides to `config`.
    pub fn apply(&self, config: &mut Config) {
        if let Some(ref path) = self.output {
            config.output = path_string(path);
        }
        if let Some(ref path) = self.aws_config {
            config.aws_config = path_string(path);
        }
        if let Some(ref path) = self.aws_credentials {
            config.aws_credentials = path_string(path);
        }
        if let Some(ref path) = self.kube_config {
            config.kube_config = path_string(path);
        }
    }
}

impl EstateArgs {
    pub fn apply(&self, config: &mut Config) {
        if let Some(ref path) = self.aws_config {
            config.aws_config = path_string(path);
        }
        if let Some(ref path) = self.aws_credentials {
            config.aws_credentials = path_string(path);
        }
    }
}

fn run_generate(args: GenerateArgs, runtime: &Runtime, out: &mut dyn Write) -> anyhow::Result<()> {
    // Reject conflicting flags before touching any source
    let mode = OutputMode::from_flags(args.write, args.diff)?;

    let mut config = load_config(args.config.as_ref())?;
    args.apply(&mut config);

    let source = if args.ignore_instances {
        InstanceSource::Cached
    } else {
        let directory = AwsCliDirectory::default()
            .aws_files(config.aws_config_path(), config.aws_credentials_path());
        InstanceSource::Live(Arc::new(directory))
    };

    let generator = Generator::new(config);
    let outcome = runtime.block_on(generator.run(mode, source, out))?;
    match outcome {
        ReconcileOutcome::Written { count } => {
            log::info!("Wrote {} profiles to {:?}", count, generator.config().output_path());
        }
        ReconcileOutcome::Diffed { ref entries } if entries.is_empty() => {
            log::info!("No changes");
        }
        _ => {}
    }
    Ok(())
}

fn run_estate(args: EstateArgs, out: &mut dyn Write) -> anyhow::Result<()> {
    let mut config = load_config(args.config.as_ref())?;
    args.apply(&mut config);

    let source = AwsAccountSource::new(config.aws_config_path(), config.aws_credentials_path());
    let profiles = Profiles::from_vec(source.generate());
    for line in crate::estate::generate_commands(&profiles, &args.command)? {
        writeln!(out, "{line}").context("Failed to print script")?;
    }
    Ok(())
}

/// Run the parsed command, writing its output to stdout.
pub fn run(cli: Cli, runtime: &Runtime) -> anyhow::Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match cli.command {
        Commands::Generate(args) => run_generate(args, runtime, &mut out),
        Commands::Estate(args) => run_estate(args, &mut out),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_generate_flags() {
        let cli = Cli::try_parse_from([
            "termprof", "gen", "-w", "-I", "-o", "/tmp/out.json", "-a", "/tmp/aws",
        ])
        .unwrap();
        let Commands::Generate(args) = cli.command else {
            panic!("expected generate");
        };
        assert!(args.write);
        assert!(!args.diff);
        assert!(args.ignore_instances);

        let mut config = Config::default();
        args.apply(&mut config);
        assert_eq!(config.output, "/tmp/out.json");
        assert_eq!(config.aws_config, "/tmp/aws");
        assert_eq!(config.kube_config, Config::default().kube_config);
    }

    #[test]
    fn test_estate_defaults_and_alias() {
        let cli = Cli::try_parse_from(["termprof", "cmd"]).unwrap();
        let Commands::Estate(args) = cli.command else {
            panic!("expected estate");
        };
        assert_eq!(args.command, "aws s3 ls");
    }

    #[test]
    fn test_global_log_level() {
        let cli =
            Cli::try_parse_from(["termprof", "generate", "--log-level", "debug"]).unwrap();
        assert_eq!(cli.log_level, Some(LogLevelArg::Debug));
        assert_eq!(
            cli.log_level.map(LogLevelArg::to_level_filter),
            Some(log::LevelFilter::Debug)
        );
    }

    #[test]
    fn test_subcommand_is_required() {
        assert!(Cli::try_parse_from(["termprof"]).is_err());
    }

    #[test]
    fn test_conflicting_modes_fail_before_any_work() {
        let runtime = Runtime::new().unwrap();
        let args = GenerateArgs {
            write: true,
            diff: true,
            // Never read: the mode check comes first
            config: Some(PathBuf::from("/nonexistent/termprof.yaml")),
            ..GenerateArgs::default()
        };
        let mut out = Vec::new();
        let err = run_generate(args, &runtime, &mut out).unwrap_err();
        assert!(err.to_string().contains("--write"));
        assert!(out.is_empty());
    }

    #[test]
    fn test_estate_prints_script() {
        let temp = tempfile::tempdir().unwrap();
        let aws = temp.path().join("config");
        std::fs::write(
            &aws,
            "[profile root]\nregion = us-east-1\n\n[profile dev]\nsource_profile = root\n",
        )
        .unwrap();
        let args = EstateArgs {
            command: "aws s3 ls".to_string(),
            aws_config: Some(aws),
            aws_credentials: Some(temp.path().join("credentials")),
            config: Some(temp.path().join("termprof.yaml")),
        };
        let mut out = Vec::new();
        run_estate(args, &mut out).unwrap();
        let script = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = script.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("AWS_PROFILE=root"));
        assert!(!lines[0].contains("sleep 60"));
        assert_eq!(lines[1], "AWS_PROFILE=dev aws s3 ls");
    }
}
