use clap::Subcommand;

/// Equipment registry commands.
#[derive(Clone, Debug, Subcommand)]
pub enum EquipmentCommands {
    /// Register a piece of equipment.
    Add {
        #[arg(long)]
        code: String,
        #[arg(long)]
        model: String,
        #[arg(long)]
        category: String,
        #[arg(long)]
        location: Option<String>,
    },
    /// List registered equipment.
    List,
    /// Get equipment by ID.
    Get { id: String },
    /// Write the equipment status directly.
    SetStatus {
        id: String,
        /// available, in_operation or under_maintenance.
        status: String,
        #[arg(long)]
        note: Option<String>,
    },
    /// Recompute the status from the latest checklist disposition.
    Refresh {
        id: String,
        /// The operating session has not started yet.
        #[arg(long)]
        not_started: bool,
    },
}
