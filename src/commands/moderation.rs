use poise::serenity_prelude::{Member, UserId};
use poise::CreateReply;
use tracing::info;

use crate::bot::data::Context;
use crate::bot::error::Error;
use crate::constants::embeds;
use crate::constants::timeouts::{format_mute_length, mute_duration};
use crate::services::moderation::{MuteKind, Outcome, TargetResult, UnmuteTrigger};
use crate::utils::formatting::{mention_user, mention_users};

/// Mute members by adding the mute role, keeping their other roles
#[poise::command(
    prefix_command,
    guild_only,
    aliases("sm"),
    required_permissions = "KICK_MEMBERS",
    required_bot_permissions = "MANAGE_ROLES"
)]
pub async fn softmute(
    ctx: Context<'_>,
    #[description = "Members to mute"] targets: Vec<Member>,
    #[description = "Minutes until the mute is lifted"] minutes: Option<u64>,
    #[description = "Reason, sent to the muted members"]
    #[rest]
    reason: Option<String>,
) -> Result<(), Error> {
    run_mute(ctx, MuteKind::Soft, targets, minutes, reason).await
}

/// Mute members by replacing all of their roles with the mute role
#[poise::command(
    prefix_command,
    guild_only,
    aliases("mute"),
    required_permissions = "KICK_MEMBERS",
    required_bot_permissions = "MANAGE_ROLES"
)]
pub async fn hardmute(
    ctx: Context<'_>,
    #[description = "Members to mute"] targets: Vec<Member>,
    #[description = "Minutes until the mute is lifted"] minutes: Option<u64>,
    #[description = "Reason, sent to the muted members"]
    #[rest]
    reason: Option<String>,
) -> Result<(), Error> {
    run_mute(ctx, MuteKind::Hard, targets, minutes, reason).await
}

/// Lift a soft or hard mute
#[poise::command(
    prefix_command,
    guild_only,
    aliases("endmute"),
    required_permissions = "KICK_MEMBERS",
    required_bot_permissions = "MANAGE_ROLES"
)]
pub async fn unmute(
    ctx: Context<'_>,
    #[description = "Members to unmute"] targets: Vec<Member>,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or(Error::custom("Not in a guild"))?;

    if targets.is_empty() {
        return send_usage(ctx, "<member> [member]...").await;
    }

    let target_ids = member_ids(&targets);
    let actor = ctx.author().id;
    let results = ctx
        .data()
        .mute_service
        .unmute(guild_id, UnmuteTrigger::Manual { actor }, &target_ids)
        .await?;

    info!(
        "{} ran unmute on {} member(s) in guild {}",
        actor,
        target_ids.len(),
        guild_id
    );

    send_summary(ctx, "Unmute", &summarize("Unmuted", &results, None)).await
}

async fn run_mute(
    ctx: Context<'_>,
    kind: MuteKind,
    targets: Vec<Member>,
    minutes: Option<u64>,
    reason: Option<String>,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or(Error::custom("Not in a guild"))?;

    if targets.is_empty() {
        return send_usage(ctx, "<member> [member]... [minutes] [reason]").await;
    }

    let target_ids = member_ids(&targets);
    let duration = mute_duration(minutes);
    let reason = reason.map(|r| r.trim().to_string()).filter(|r| !r.is_empty());
    let actor = ctx.author().id;

    let results = ctx
        .data()
        .mute_service
        .apply_mute(
            kind,
            guild_id,
            actor,
            &target_ids,
            duration,
            reason.as_deref(),
        )
        .await?;

    info!(
        "{} ran {:?} mute on {} member(s) in guild {}",
        actor,
        kind,
        target_ids.len(),
        guild_id
    );

    let length = format_mute_length(duration);
    let title = match kind {
        MuteKind::Soft => "Softmute",
        MuteKind::Hard => "Hardmute",
    };
    send_summary(ctx, title, &summarize(kind.label(), &results, Some(&length))).await
}

fn member_ids(members: &[Member]) -> Vec<UserId> {
    let mut ids: Vec<UserId> = Vec::with_capacity(members.len());
    for member in members {
        if !ids.contains(&member.user.id) {
            ids.push(member.user.id);
        }
    }
    ids
}

async fn send_usage(ctx: Context<'_>, args: &str) -> Result<(), Error> {
    let usage = format!("Usage: `{}{} {}`", ctx.prefix(), ctx.command().name, args);
    ctx.send(CreateReply::default().embed(embeds::error_embed().description(usage)))
        .await?;
    Ok(())
}

async fn send_summary(ctx: Context<'_>, title: &str, summary: &Summary) -> Result<(), Error> {
    let embed = match summary.severity {
        Severity::Success => embeds::success_embed(),
        Severity::Partial => embeds::warning_embed(),
        Severity::Failure => embeds::error_embed(),
    }
    .title(title)
    .description(&summary.description);

    ctx.send(CreateReply::default().embed(embed)).await?;
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Severity {
    Success,
    Partial,
    Failure,
}

#[derive(Debug)]
struct Summary {
    severity: Severity,
    description: String,
}

/// One reply covering every target: a line for those acted on, then one
/// bullet per target that was skipped or failed
fn summarize(action: &str, results: &[TargetResult], length: Option<&str>) -> Summary {
    let succeeded: Vec<UserId> = results
        .iter()
        .filter(|r| matches!(r.outcome, Outcome::Muted | Outcome::Unmuted))
        .map(|r| r.target)
        .collect();

    let problems: Vec<String> = results
        .iter()
        .filter_map(|r| match &r.outcome {
            Outcome::Skipped(reason) => Some(format!("{}: {}", mention_user(r.target), reason)),
            Outcome::Failed(reason) => Some(format!("{}: {}", mention_user(r.target), reason)),
            Outcome::Muted | Outcome::Unmuted => None,
        })
        .collect();

    let any_failed = results.iter().any(|r| r.outcome.is_failure());
    let severity = if problems.is_empty() {
        Severity::Success
    } else if succeeded.is_empty() && any_failed {
        Severity::Failure
    } else {
        Severity::Partial
    };

    let mut description = String::new();
    if !succeeded.is_empty() {
        description.push_str(&format!("{} {}", action, mention_users(&succeeded)));
        if let Some(length) = length {
            description.push(' ');
            description.push_str(length);
        }
        description.push('.');
    }
    if !problems.is_empty() {
        if !description.is_empty() {
            description.push_str("\n\n");
        }
        description.push_str(&embeds::bullet_list(&problems));
    }

    Summary {
        severity,
        description,
    }
}
