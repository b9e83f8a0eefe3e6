//! Command checks.
//!
//! Used with `#[poise::command(check = "...")]`. A check returning `false` ends up in
//! the framework's `on_error` as `CommandCheckFailed`, which answers with a
//! permission message.

use crate::{bot::Context, errors::Result};

/// Role IDs of the invoking member, empty outside guilds.
pub async fn author_role_ids(ctx: Context<'_>) -> Vec<String> {
    ctx.author_member()
        .await
        .map(|member| member.roles.iter().map(ToString::to_string).collect())
        .unwrap_or_default()
}

/// Whether the invoking member holds the configured booster role.
pub async fn author_is_booster(ctx: Context<'_>) -> bool {
    let roles = author_role_ids(ctx).await;
    ctx.data()
        .settings
        .is_booster(roles.iter().map(String::as_str))
}

/// Passes for members holding one of the configured staff roles.
pub async fn is_staff(ctx: Context<'_>) -> Result<bool> {
    let roles = author_role_ids(ctx).await;
    Ok(ctx.data().settings.is_staff(roles.iter().map(String::as_str)))
}

/// Passes only for the configured owner.
#[allow(clippy::unused_async)] // poise checks must be async
pub async fn is_owner(ctx: Context<'_>) -> Result<bool> {
    let author = ctx.author().id.to_string();
    Ok(ctx.data().settings.owner_id.as_deref() == Some(author.as_str()))
}
