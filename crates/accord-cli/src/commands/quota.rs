use accord_core::responses::QuotaResponse;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::ActorArgs;
use crate::context::AppContext;
use crate::output::output;

/// Handle `accord quota`.
pub async fn handle(args: &ActorArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let status = fetch(args, ctx).await?;
    output(&status, flags.format)
}

pub async fn fetch(args: &ActorArgs, ctx: &AppContext) -> anyhow::Result<QuotaResponse> {
    ctx.service
        .quota_status(&args.actor)
        .await
        .map_err(Into::into)
}
