//! Lifecycle logging and user-facing command error replies

use crate::application::bot::Bot;
use crate::application::context::Context;
use crate::application::errors::{CommandError, ExtensionError};
use crate::infrastructure::config::Config;
use crate::plugins::{BotEvent, Cog, CogRegistry};
use crate::utils::formatters::{self, fill_template};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, error, info};

pub fn setup(registry: &mut CogRegistry) -> Result<(), ExtensionError> {
    registry.add_cog(Events)
}

pub struct Events;

#[async_trait]
impl Cog for Events {
    fn name(&self) -> &str {
        "events"
    }

    fn description(&self) -> &str {
        "Logs activity and reports command errors."
    }

    fn hidden(&self) -> bool {
        true
    }

    async fn on_event(&self, bot: &Arc<Bot>, event: &BotEvent<'_>) {
        match event {
            BotEvent::Ready => {
                let me = bot.bot_info();
                info!("serving as {} on {}", me.username, me.platform);
                info!("ready to handle commands");
            }
            BotEvent::CommandInvoked(ctx) => {
                if bot.config().logging.log_commands_to_console {
                    info!(
                        "{} used {}{} in chat {}",
                        ctx.author().describe(),
                        ctx.clean_prefix(),
                        ctx.command_name(),
                        ctx.channel_id()
                    );
                }
            }
            BotEvent::CommandError(ctx, e) => {
                if let Some(reply) = error_reply(bot.config(), ctx, e) {
                    if let Err(e) = ctx.reply(&reply).await {
                        debug!("failed to notify error to user: {}", e);
                    }
                }
            }
            _ => {}
        }
    }
}

/// The reply a failed command gets, if any. Also logs the failure where the
/// config asks for it.
pub fn error_reply(config: &Config, ctx: &Context, e: &CommandError) -> Option<String> {
    let messages = &config.messages;
    let prefix = ctx.prefix.as_str();
    let clean_prefix = ctx.clean_prefix();
    let command = ctx.command_name();

    match e {
        CommandError::MissingArgument { name, kind } => messages.missing_argument.as_deref().map(|template| {
            fill_template(
                template,
                &[
                    ("argument", name.as_str()),
                    ("type", kind.as_str()),
                    ("prefix", prefix),
                    ("clean_prefix", clean_prefix.as_str()),
                    ("command", command),
                ],
            )
        }),
        CommandError::MissingPermissions(perms) => messages
            .no_permissions
            .as_deref()
            .map(|template| fill_permissions(template, perms, prefix, &clean_prefix, command)),
        CommandError::BotMissingPermissions(perms) => messages
            .bot_no_permissions
            .as_deref()
            .map(|template| fill_permissions(template, perms, prefix, &clean_prefix, command)),
        CommandError::NotFound(name) => {
            if config.logging.log_not_found_commands_to_console {
                error!(
                    "{} used {} but command `{}` doesn't exist!",
                    ctx.author().describe(),
                    ctx.message.content,
                    name
                );
            }
            messages.command_not_found.as_deref().map(|template| {
                fill_template(
                    template,
                    &[("prefix", prefix), ("clean_prefix", clean_prefix.as_str()), ("command", name.as_str())],
                )
            })
        }
        CommandError::CheckFailure => None,
        other => {
            error!("ignoring exception in command {}: {}", command, other);
            config.logging.notify_all_errors_to_user.then(|| {
                format!(
                    "An error occurred in `{}{}`:\n{}",
                    clean_prefix,
                    command,
                    formatters::error(other.type_name(), other)
                )
            })
        }
    }
}

fn fill_permissions(template: &str, perms: &[String], prefix: &str, clean_prefix: &str, command: &str) -> String {
    let joined = perms.join(", ");
    let joined_code = perms
        .iter()
        .map(|p| format!("`{}`", p))
        .collect::<Vec<_>>()
        .join(", ");
    fill_template(
        template,
        &[
            ("joined_permissions_code", joined_code.as_str()),
            ("joined_permissions", joined.as_str()),
            ("prefix", prefix),
            ("clean_prefix", clean_prefix),
            ("command", command),
        ],
    )
}
