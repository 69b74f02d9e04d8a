use clap::Parser;

pub mod global;
pub mod root_commands;

pub use global::{GlobalFlags, OutputFormat};
pub use root_commands::Commands;

/// Top-level CLI parser for the `accord` binary.
#[derive(Debug, Parser)]
#[command(name = "accord", version, about = "Accord - mutual-consent matching engine")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format: json, raw
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Max results to return
    #[arg(short, long, global = true)]
    pub limit: Option<u32>,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Database path (overrides `database.path`)
    #[arg(long, global = true)]
    pub db: Option<String>,
}

impl Cli {
    /// Extract ergonomic global flags struct for command handlers.
    #[must_use]
    pub fn global_flags(&self) -> GlobalFlags {
        GlobalFlags {
            format: self.format,
            limit: self.limit,
            quiet: self.quiet,
            verbose: self.verbose,
            db: self.db.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::{CommandFactory, Parser};
    use pretty_assertions::assert_eq;

    use super::{Cli, Commands, GlobalFlags, OutputFormat};

    #[test]
    fn clap_command_tree_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_parse_before_subcommand() {
        let cli = Cli::try_parse_from([
            "accord",
            "--format",
            "raw",
            "--limit",
            "10",
            "--verbose",
            "history",
            "--actor",
            "a",
        ])
        .expect("cli should parse");

        assert_eq!(cli.format, OutputFormat::Raw);
        assert_eq!(cli.limit, Some(10));
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::History(ref args) if args.actor == "a"));
    }

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::try_parse_from(["accord", "quota", "--actor", "a", "--format", "raw", "--quiet"])
            .expect("cli should parse");

        assert_eq!(cli.format, OutputFormat::Raw);
        assert!(cli.quiet);
        assert!(matches!(cli.command, Commands::Quota(_)));
    }

    #[test]
    fn output_format_rejects_invalid_value() {
        let parsed = Cli::try_parse_from(["accord", "--format", "table", "quota", "--actor", "a"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn decide_requires_all_arguments() {
        let parsed = Cli::try_parse_from(["accord", "decide", "--actor", "a", "--target", "b"]);
        assert!(parsed.is_err());

        let cli = Cli::try_parse_from([
            "accord",
            "decide",
            "--actor",
            "a",
            "--target",
            "b",
            "--direction",
            "accept",
        ])
        .expect("cli should parse");
        let Commands::Decide(args) = cli.command else {
            panic!("expected decide");
        };
        assert_eq!(args.target, "b");
        assert_eq!(args.direction, "accept");
    }

    #[test]
    fn relationship_commands_take_actor_and_relationship() {
        for command in ["end", "gate"] {
            let cli = Cli::try_parse_from([
                "accord",
                command,
                "--actor",
                "a",
                "--relationship",
                "rel-12345678",
            ])
            .expect("cli should parse");
            assert!(matches!(cli.command, Commands::End(_) | Commands::Gate(_)));
        }
    }

    #[test]
    fn global_flags_extraction_copies_values() {
        let cli = Cli::try_parse_from(["accord", "--db", "/tmp/demo.db", "active", "--actor", "a"])
            .expect("cli should parse");
        let flags: GlobalFlags = cli.global_flags();
        assert_eq!(flags.db.as_deref(), Some("/tmp/demo.db"));
        assert_eq!(flags.format, OutputFormat::Json);
    }
}
