//! Command processing: prefix parsing, lookup, checks and invocation

use crate::application::bot::Bot;
use crate::application::checks;
use crate::application::context::Context;
use crate::application::errors::CommandError;
use crate::domain::entities::Message;
use crate::plugins::BotEvent;
use std::sync::Arc;
use tracing::debug;

/// Parse `message` as a command and run it. Outcomes are reported to cogs
/// as `CommandCompleted` or `CommandError` events; nothing is returned.
pub async fn process_commands(bot: &Arc<Bot>, message: Message) {
    let Some(invocation) = bot.parser().parse(&message.content) else {
        return;
    };

    let mut ctx = Context::new(Arc::clone(bot), message, invocation);
    match invoke(bot, &mut ctx).await {
        Ok(()) => bot.dispatch_event(&BotEvent::CommandCompleted(&ctx)).await,
        Err(e) => {
            debug!("command `{}` failed: {}", ctx.invoked_with, e);
            bot.dispatch_event(&BotEvent::CommandError(&ctx, &e)).await
        }
    }
}

/// Resolve the command named in `ctx` and run it after its checks pass
pub async fn invoke(bot: &Arc<Bot>, ctx: &mut Context) -> Result<(), CommandError> {
    let registry = bot.registry()?;
    let (command, cog) = registry
        .resolve(&ctx.invoked_with)
        .ok_or_else(|| CommandError::NotFound(ctx.invoked_with.clone()))?;
    ctx.command = Some(command.clone());

    if command.guild_only && !checks::guild_only(ctx) {
        return Err(CommandError::NoPrivateMessage);
    }
    if command.guild_owner_only && !checks::is_guild_owner(ctx).await? {
        return Err(CommandError::CheckFailure);
    }
    if !cog.cog_check(ctx).await? {
        return Err(CommandError::CheckFailure);
    }

    bot.dispatch_event(&BotEvent::CommandInvoked(ctx)).await;
    cog.invoke(&command.name, ctx).await
}
