use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::cli::subcommands::EquipmentCommands;

/// Top-level command tree.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Create the store and a project configuration file.
    Init(InitArgs),
    /// Show checklist categories and their items.
    Catalog(CatalogArgs),
    /// Submit a completed checklist from a JSON file.
    Submit(SubmitArgs),
    /// List checklist records, newest first.
    List(ListArgs),
    /// Show one record with its answers and review history.
    Show { id: String },
    /// Approve a pending checklist.
    Approve {
        id: String,
        #[arg(long)]
        comment: Option<String>,
    },
    /// Reject a pending checklist.
    Reject {
        id: String,
        #[arg(long)]
        reason: String,
    },
    /// Permanently delete a checklist and everything attached to it.
    Erase {
        id: String,
        /// Confirm the deletion.
        #[arg(long)]
        yes: bool,
    },
    /// Equipment registry.
    Equipment {
        #[command(subcommand)]
        action: EquipmentCommands,
    },
    /// Keep a reconciled view of the store and print every update.
    Watch(WatchArgs),
}

#[derive(Clone, Debug, Args)]
pub struct InitArgs {
    /// Name of the current user.
    #[arg(long)]
    pub name: Option<String>,
    /// Badge id of the current user.
    #[arg(long)]
    pub badge: Option<String>,
    /// Role of the current user (operator, supervisor, maintenance, admin).
    #[arg(long)]
    pub role: Option<String>,
    /// Overwrite an existing project configuration.
    #[arg(long)]
    pub force: bool,
}

#[derive(Clone, Debug, Args)]
pub struct CatalogArgs {
    /// Show the items of one category.
    pub category: Option<String>,
}

#[derive(Clone, Debug, Args)]
pub struct SubmitArgs {
    /// JSON submission file, or `-` for stdin.
    #[arg(long)]
    pub file: PathBuf,
}

#[derive(Clone, Debug, Args)]
pub struct ListArgs {
    #[arg(long)]
    pub status: Option<String>,
    #[arg(long)]
    pub category: Option<String>,
    #[arg(long)]
    pub equipment: Option<String>,
    /// Operator badge id. Ignored for operators.
    #[arg(long)]
    pub operator: Option<String>,
    /// Submitted at or after (RFC 3339 or YYYY-MM-DD).
    #[arg(long)]
    pub since: Option<String>,
    /// Submitted before (RFC 3339 or YYYY-MM-DD).
    #[arg(long)]
    pub until: Option<String>,
}

#[derive(Clone, Debug, Args)]
pub struct WatchArgs {
    /// Seconds between forced reconciliations.
    #[arg(long, default_value_t = 5)]
    pub poll_secs: u64,
    /// Exit after this many reconciliations.
    #[arg(long)]
    pub max_fetches: Option<u64>,
}
