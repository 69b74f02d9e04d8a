use crate::cli::GlobalFlags;
use crate::cli::root_commands::Commands;
use crate::commands;
use crate::context::AppContext;

/// Dispatch a parsed command to the corresponding handler module.
pub async fn dispatch(command: Commands, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    match command {
        Commands::Decide(args) => commands::decide::handle(&args, ctx, flags).await,
        Commands::Active(args) => commands::relationship::handle_active(&args, ctx, flags).await,
        Commands::Quota(args) => commands::quota::handle(&args, ctx, flags).await,
        Commands::End(args) => commands::relationship::handle_end(&args, ctx, flags).await,
        Commands::History(args) => commands::relationship::handle_history(&args, ctx, flags).await,
        Commands::Decisions(args) => commands::decisions::handle(&args, ctx, flags).await,
        Commands::Audit(args) => commands::audit::handle(&args, ctx, flags).await,
        Commands::Gate(args) => commands::relationship::handle_gate(&args, ctx, flags).await,
    }
}
