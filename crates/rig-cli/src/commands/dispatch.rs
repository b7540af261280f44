use crate::cli::GlobalFlags;
use crate::cli::root_commands::Commands;
use crate::commands;
use crate::context::AppContext;

/// Dispatch a parsed command to the corresponding handler module.
pub async fn dispatch(command: Commands, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    match command {
        Commands::Submit(args) => commands::submit::handle(&args, ctx, flags).await,
        Commands::List(args) => commands::list::handle(&args, ctx, flags).await,
        Commands::Show { id } => commands::show::handle(&id, ctx, flags).await,
        Commands::Approve { id, comment } => {
            commands::review::approve(&id, comment, ctx, flags).await
        }
        Commands::Reject { id, reason } => commands::review::reject(&id, &reason, ctx, flags).await,
        Commands::Erase { id, yes } => commands::erase::handle(&id, yes, ctx, flags).await,
        Commands::Equipment { action } => commands::equipment::handle(&action, ctx, flags).await,
        Commands::Watch(args) => commands::watch::handle(&args, ctx, flags).await,
        Commands::Init(_) | Commands::Catalog(_) => {
            unreachable!("init/catalog are pre-dispatched in main")
        }
    }
}
