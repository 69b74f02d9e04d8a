use clap::{Args, Subcommand};

/// Top-level command tree.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Submit an accept or reject decision about a target.
    Decide(DecideArgs),
    /// Show the actor's active relationship, if any.
    Active(ActorArgs),
    /// Show the actor's remaining daily quota.
    Quota(ActorArgs),
    /// End a relationship the actor is part of.
    End(RelationshipArgs),
    /// Relationships the actor has been part of, newest first.
    History(ActorArgs),
    /// Decisions the actor has made, newest first.
    Decisions(ActorArgs),
    /// Query the audit trail.
    Audit(AuditArgs),
    /// Check whether the actor may exchange content in a relationship.
    Gate(RelationshipArgs),
}

/// Arguments for `accord decide`.
#[derive(Clone, Debug, Args)]
pub struct DecideArgs {
    #[arg(long)]
    pub actor: String,
    #[arg(long)]
    pub target: String,
    /// accept or reject
    #[arg(long)]
    pub direction: String,
}

/// Arguments for commands scoped to one actor.
#[derive(Clone, Debug, Args)]
pub struct ActorArgs {
    #[arg(long)]
    pub actor: String,
}

/// Arguments for commands acting on one relationship.
#[derive(Clone, Debug, Args)]
pub struct RelationshipArgs {
    #[arg(long)]
    pub actor: String,
    #[arg(long)]
    pub relationship: String,
}

/// Arguments for `accord audit`.
#[derive(Clone, Debug, Args)]
pub struct AuditArgs {
    #[arg(long)]
    pub entity_type: Option<String>,
    #[arg(long)]
    pub entity_id: Option<String>,
    #[arg(long)]
    pub action: Option<String>,
    #[arg(long)]
    pub actor: Option<String>,
}
