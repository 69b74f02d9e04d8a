use accord_core::enums::Direction;
use accord_core::responses::DecisionResponse;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::DecideArgs;
use crate::context::AppContext;
use crate::output::output;

/// Handle `accord decide`.
pub async fn handle(args: &DecideArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let response = execute(args, ctx).await?;
    output(&response, flags.format)
}

pub async fn execute(args: &DecideArgs, ctx: &AppContext) -> anyhow::Result<DecisionResponse> {
    let direction: Direction = args.direction.parse()?;
    let relationship = ctx
        .service
        .submit_decision(&args.actor, &args.target, direction)
        .await?;
    Ok(DecisionResponse::from_relationship(
        relationship.as_ref(),
        &args.actor,
    ))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::execute;
    use crate::cli::root_commands::DecideArgs;
    use crate::context::test_support::in_memory;
    use accord_core::enums::ErrorKind;
    use accord_db::error::EngineError;

    fn decide(actor: &str, target: &str, direction: &str) -> DecideArgs {
        DecideArgs {
            actor: actor.into(),
            target: target.into(),
            direction: direction.into(),
        }
    }

    #[tokio::test]
    async fn reciprocated_accept_reports_match() {
        let ctx = in_memory().await;

        let first = execute(&decide("a", "b", "accept"), &ctx).await.unwrap();
        assert!(!first.matched);
        assert!(first.relationship.is_none());

        let second = execute(&decide("b", "a", "right"), &ctx).await.unwrap();
        assert!(second.matched);
        assert_eq!(second.relationship.unwrap().counterpart_id, "a");
    }

    #[tokio::test]
    async fn unknown_direction_is_not_an_engine_error() {
        let ctx = in_memory().await;
        let err = execute(&decide("a", "b", "maybe"), &ctx).await.unwrap_err();
        assert!(err.downcast_ref::<EngineError>().is_none());
        assert!(err.to_string().contains("maybe"));
    }

    #[tokio::test]
    async fn engine_rejections_keep_their_kind() {
        let ctx = in_memory().await;
        let err = execute(&decide("a", "a", "accept"), &ctx).await.unwrap_err();
        let engine = err.downcast_ref::<EngineError>().expect("engine error");
        assert_eq!(engine.kind(), ErrorKind::SelfReference);
    }
}
