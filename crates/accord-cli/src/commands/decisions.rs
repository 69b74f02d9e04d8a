use accord_core::entities::Decision;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::ActorArgs;
use crate::commands::shared::limit::effective_limit;
use crate::context::AppContext;
use crate::output::output;

/// Handle `accord decisions`.
pub async fn handle(args: &ActorArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let decisions = fetch(args, ctx, flags).await?;
    output(&decisions, flags.format)
}

pub async fn fetch(
    args: &ActorArgs,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<Vec<Decision>> {
    let limit = effective_limit(flags.limit, ctx.config.general.default_limit);
    ctx.service
        .decision_history(&args.actor, limit)
        .await
        .map_err(Into::into)
}
