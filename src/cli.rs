// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `assetdag`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "assetdag",
    version,
    about = "Build, optimize and serve front-end assets.",
    long_about = None
)]
pub struct CliArgs {
    /// Task or workflow to run.
    #[arg(value_enum, value_name = "TASK")]
    pub command: Command,

    /// Project root; every configured path is relative to it.
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub root: String,

    /// Path to the config file (TOML). Relative paths are resolved against
    /// `--root`. A missing file means "use the built-in defaults".
    #[arg(long, value_name = "PATH", default_value = "Assetdag.toml")]
    pub config: String,

    /// Override the dev server port.
    #[arg(long, value_name = "PORT")]
    pub port: Option<u16>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `ASSETDAG_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Load config, print the registry and execution stages, run nothing.
    #[arg(long)]
    pub dry_run: bool,
}

/// Named entry points, matching the task names used by the workflows.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum Command {
    #[value(name = "buildScss", alias = "build-scss")]
    BuildScss,
    #[value(name = "buildCss", alias = "build-css")]
    BuildCss,
    #[value(name = "buildImg", alias = "build-img")]
    BuildImg,
    #[value(name = "buildJs", alias = "build-js")]
    BuildJs,
    #[value(name = "favicon")]
    Favicon,
    #[value(name = "minify")]
    Minify,
    #[value(name = "clean")]
    Clean,
    #[value(name = "browserSync", alias = "browser-sync")]
    BrowserSync,
    #[value(name = "build")]
    Build,
    #[value(name = "watch")]
    Watch,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_camel_case_and_kebab_case_task_names() {
        let args = CliArgs::try_parse_from(["assetdag", "buildScss"]).unwrap();
        assert_eq!(args.command, Command::BuildScss);

        let args = CliArgs::try_parse_from(["assetdag", "browser-sync", "--port", "4000"]).unwrap();
        assert_eq!(args.command, Command::BrowserSync);
        assert_eq!(args.port, Some(4000));
        assert_eq!(args.root, ".");
    }

    #[test]
    fn rejects_unknown_task() {
        assert!(CliArgs::try_parse_from(["assetdag", "deploy"]).is_err());
    }
}
