//! Checks run before commands

use crate::application::context::Context;
use crate::application::errors::CommandError;
use crate::infrastructure::config::Config;

/// Whether `user_id` is listed in the configured admins
pub fn is_admin(config: &Config, user_id: &str) -> bool {
    config.is_admin(user_id)
}

/// Whether the command was invoked in a group chat
pub fn guild_only(ctx: &Context) -> bool {
    ctx.guild_id().is_some()
}

/// Whether the invoker owns the group the command was used in
pub async fn is_guild_owner(ctx: &Context) -> Result<bool, CommandError> {
    let guild = ctx.guild_id().ok_or(CommandError::NoPrivateMessage)?;
    let owner = ctx.bot.client().fetch_guild_owner(guild).await?;
    Ok(owner.as_deref() == Some(ctx.author().id.as_str()))
}
