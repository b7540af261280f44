use clap::Parser;

pub mod global;
pub mod root_commands;
pub mod subcommands;

pub use global::{GlobalFlags, OutputFormat};
pub use root_commands::Commands;

/// Top-level CLI parser for the `rig` binary.
#[derive(Debug, Parser)]
#[command(
    name = "rig",
    version,
    about = "Rigcheck - pre-use equipment checklists and their review workflow"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format: json, table, raw
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Max results to return
    #[arg(short, long, global = true)]
    pub limit: Option<u32>,

    /// Quiet mode (suppress non-essential output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Store path (defaults to store.path from configuration)
    #[arg(short, long, global = true)]
    pub store: Option<String>,
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
            store: self.store.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::{CommandFactory, Parser};

    use super::subcommands::EquipmentCommands;
    use super::{Cli, Commands, GlobalFlags, OutputFormat};

    #[test]
    fn clap_command_tree_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_parse_before_subcommand() {
        let cli = Cli::try_parse_from([
            "rig", "--format", "table", "--limit", "10", "--verbose", "list",
        ])
        .expect("cli should parse");

        assert_eq!(cli.format, OutputFormat::Table);
        assert_eq!(cli.limit, Some(10));
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::List(_)));
    }

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::try_parse_from(["rig", "show", "chk-0000beef", "--format", "raw", "--quiet"])
            .expect("cli should parse");

        assert_eq!(cli.format, OutputFormat::Raw);
        assert!(cli.quiet);
        assert!(matches!(cli.command, Commands::Show { ref id } if id == "chk-0000beef"));
    }

    #[test]
    fn output_format_rejects_invalid_value() {
        let parsed = Cli::try_parse_from(["rig", "--format", "xml", "list"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn reject_requires_reason() {
        let parsed = Cli::try_parse_from(["rig", "reject", "chk-0000beef"]);
        assert!(parsed.is_err());

        let cli = Cli::try_parse_from([
            "rig",
            "reject",
            "chk-0000beef",
            "--reason",
            "mast chain slack",
        ])
        .expect("cli should parse");
        assert!(matches!(
            cli.command,
            Commands::Reject { ref reason, .. } if reason == "mast chain slack"
        ));
    }

    #[test]
    fn equipment_set_status_parses() {
        let cli = Cli::try_parse_from([
            "rig",
            "equipment",
            "set-status",
            "eqp-0000beef",
            "under_maintenance",
            "--note",
            "hose replaced",
        ])
        .expect("cli should parse");

        match cli.command {
            Commands::Equipment {
                action: EquipmentCommands::SetStatus { id, status, note },
            } => {
                assert_eq!(id, "eqp-0000beef");
                assert_eq!(status, "under_maintenance");
                assert_eq!(note.as_deref(), Some("hose replaced"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn list_filters_parse() {
        let cli = Cli::try_parse_from([
            "rig",
            "list",
            "--status",
            "pending",
            "--category",
            "forklift",
            "--since",
            "2026-10-01",
        ])
        .expect("cli should parse");

        let Commands::List(args) = cli.command else {
            panic!("expected list");
        };
        assert_eq!(args.status.as_deref(), Some("pending"));
        assert_eq!(args.category.as_deref(), Some("forklift"));
        assert_eq!(args.since.as_deref(), Some("2026-10-01"));
        assert_eq!(args.until, None);
    }

    #[test]
    fn global_flags_extraction_copies_values() {
        let cli = Cli::try_parse_from(["rig", "--store", "/tmp/rig.db", "catalog"])
            .expect("cli should parse");
        let flags: GlobalFlags = cli.global_flags();
        assert_eq!(flags.store.as_deref(), Some("/tmp/rig.db"));
        assert_eq!(flags.format, OutputFormat::Json);
    }
}
