use serde::Serialize;

use accord_core::responses::{ActiveRelationshipResponse, RelationshipView};

use crate::cli::GlobalFlags;
use crate::cli::root_commands::{ActorArgs, RelationshipArgs};
use crate::commands::shared::limit::effective_limit;
use crate::context::AppContext;
use crate::output::output;

/// Result of `accord gate`. Only produced when access is granted; a denial
/// surfaces as an engine error.
#[derive(Debug, Serialize)]
pub struct ExchangeAccess {
    pub allowed: bool,
    pub relationship: RelationshipView,
}

/// Handle `accord active`.
pub async fn handle_active(args: &ActorArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let response = active(args, ctx).await?;
    output(&response, flags.format)
}

/// Handle `accord end`.
pub async fn handle_end(
    args: &RelationshipArgs,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let view = end(args, ctx).await?;
    output(&view, flags.format)
}

/// Handle `accord history`.
pub async fn handle_history(args: &ActorArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let views = history(args, ctx, flags).await?;
    output(&views, flags.format)
}

/// Handle `accord gate`.
pub async fn handle_gate(
    args: &RelationshipArgs,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let access = gate(args, ctx).await?;
    output(&access, flags.format)
}

pub async fn active(args: &ActorArgs, ctx: &AppContext) -> anyhow::Result<ActiveRelationshipResponse> {
    let relationship = ctx.service.active_relationship(&args.actor).await?;
    Ok(ActiveRelationshipResponse {
        relationship: relationship
            .as_ref()
            .and_then(|rel| RelationshipView::for_actor(rel, &args.actor)),
    })
}

pub async fn end(args: &RelationshipArgs, ctx: &AppContext) -> anyhow::Result<RelationshipView> {
    let ended = ctx.service.terminate(&args.relationship, &args.actor).await?;
    RelationshipView::for_actor(&ended, &args.actor)
        .ok_or_else(|| anyhow::anyhow!("ended relationship {} does not involve {}", ended.id, args.actor))
}

pub async fn history(
    args: &ActorArgs,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<Vec<RelationshipView>> {
    let limit = effective_limit(flags.limit, ctx.config.general.default_limit);
    let relationships = ctx.service.relationship_history(&args.actor, limit).await?;
    Ok(relationships
        .iter()
        .filter_map(|rel| RelationshipView::for_actor(rel, &args.actor))
        .collect())
}

pub async fn gate(args: &RelationshipArgs, ctx: &AppContext) -> anyhow::Result<ExchangeAccess> {
    let relationship = ctx
        .service
        .exchange_access(&args.relationship, &args.actor)
        .await?;
    let view = RelationshipView::for_actor(&relationship, &args.actor).ok_or_else(|| {
        anyhow::anyhow!("relationship {} does not involve {}", relationship.id, args.actor)
    })?;
    Ok(ExchangeAccess {
        allowed: true,
        relationship: view,
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{active, end, gate, history};
    use crate::cli::root_commands::{ActorArgs, RelationshipArgs};
    use crate::cli::{GlobalFlags, OutputFormat};
    use crate::context::AppContext;
    use crate::context::test_support::in_memory;
    use accord_core::enums::{Direction, ErrorKind, RelationshipStatus};
    use accord_db::error::EngineError;

    fn actor(id: &str) -> ActorArgs {
        ActorArgs { actor: id.into() }
    }

    fn on(actor: &str, relationship: &str) -> RelationshipArgs {
        RelationshipArgs {
            actor: actor.into(),
            relationship: relationship.into(),
        }
    }

    fn flags(limit: Option<u32>) -> GlobalFlags {
        GlobalFlags {
            format: OutputFormat::Json,
            limit,
            quiet: false,
            verbose: false,
            db: None,
        }
    }

    fn kind(err: &anyhow::Error) -> ErrorKind {
        err.downcast_ref::<EngineError>().expect("engine error").kind()
    }

    async fn matched(ctx: &AppContext, x: &str, y: &str) -> String {
        ctx.service.submit_decision(x, y, Direction::Accept).await.unwrap();
        ctx.service
            .submit_decision(y, x, Direction::Accept)
            .await
            .unwrap()
            .expect("mutual accept")
            .id
    }

    #[tokio::test]
    async fn active_names_the_counterpart() {
        let ctx = in_memory().await;
        assert!(active(&actor("a"), &ctx).await.unwrap().relationship.is_none());

        let rel_id = matched(&ctx, "a", "b").await;
        let view = active(&actor("b"), &ctx).await.unwrap().relationship.unwrap();
        assert_eq!(view.relationship_id, rel_id);
        assert_eq!(view.counterpart_id, "a");
    }

    #[tokio::test]
    async fn end_then_gate_denies() {
        let ctx = in_memory().await;
        let rel_id = matched(&ctx, "a", "b").await;

        let access = gate(&on("a", &rel_id), &ctx).await.unwrap();
        assert!(access.allowed);
        assert_eq!(access.relationship.counterpart_id, "b");

        let err = gate(&on("c", &rel_id), &ctx).await.unwrap_err();
        assert_eq!(kind(&err), ErrorKind::NotAParty);

        let view = end(&on("b", &rel_id), &ctx).await.unwrap();
        assert_eq!(view.status, RelationshipStatus::Ended);
        assert_eq!(view.ended_by.as_deref(), Some("b"));

        let err = gate(&on("a", &rel_id), &ctx).await.unwrap_err();
        assert_eq!(kind(&err), ErrorKind::AlreadyEnded);
        let err = end(&on("a", &rel_id), &ctx).await.unwrap_err();
        assert_eq!(kind(&err), ErrorKind::AlreadyEnded);
    }

    #[tokio::test]
    async fn history_respects_limit() {
        let ctx = in_memory().await;
        let first = matched(&ctx, "a", "b").await;
        end(&on("a", &first), &ctx).await.unwrap();
        let second = matched(&ctx, "a", "c").await;

        let all = history(&actor("a"), &ctx, &flags(None)).await.unwrap();
        assert_eq!(all.len(), 2);

        let newest = history(&actor("a"), &ctx, &flags(Some(1))).await.unwrap();
        assert_eq!(newest.len(), 1);
        assert_eq!(newest[0].relationship_id, second);
        assert_eq!(newest[0].counterpart_id, "c");
    }
}
