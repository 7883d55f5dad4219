//! Command usage statistics and bot information

use crate::application::bot::Bot;
use crate::application::context::Context;
use crate::application::errors::{CommandError, ExtensionError};
use crate::domain::entities::Command;
use crate::infrastructure::database::CommandUsage;
use crate::plugins::{BotEvent, Cog, CogRegistry};
use crate::utils::console::detect_platform;
use crate::utils::formatters::{format_number, format_size, timestamp, SizeFormat};
use crate::utils::values::clamp;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tracing::warn;

pub fn setup(registry: &mut CogRegistry) -> Result<(), ExtensionError> {
    registry.add_cog(Statistics)
}

pub struct Statistics;

#[async_trait]
impl Cog for Statistics {
    fn name(&self) -> &str {
        "statistics"
    }

    fn description(&self) -> &str {
        "Command usage and information about the bot."
    }

    fn emoji(&self) -> Option<&str> {
        Some("📊")
    }

    fn commands(&self) -> Vec<Command> {
        vec![
            Command::new("stats")
                .with_description("Most used commands")
                .with_usage("[page]")
                .with_aliases(&["usage"]),
            Command::new("uptime").with_description("How long the bot has been running").slash(),
            Command::new("about")
                .with_description("Information about the bot")
                .with_aliases(&["info"])
                .slash(),
        ]
    }

    async fn invoke(&self, name: &str, ctx: &mut Context) -> Result<(), CommandError> {
        match name {
            "stats" => stats(ctx).await,
            "uptime" => uptime(ctx).await,
            "about" => about(ctx).await,
            _ => Err(CommandError::NotFound(name.to_string())),
        }
    }

    async fn on_event(&self, bot: &Arc<Bot>, event: &BotEvent<'_>) {
        if let BotEvent::CommandCompleted(ctx) = event {
            if let Err(e) = bot.with_db(|db| db.record_command_use(ctx.command_name())) {
                warn!("could not record usage of `{}`: {}", ctx.command_name(), e);
            }
        }
    }
}

fn uptime_seconds(bot: &Bot) -> u64 {
    bot.uptime()
        .map(|since| (Utc::now() - since).num_seconds().max(0) as u64)
        .unwrap_or(0)
}

async fn stats(ctx: &Context) -> Result<(), CommandError> {
    let per_page = ctx.bot.config().bot.items_per_page.max(1);
    let requested = match ctx.args.first() {
        Some(_) => ctx.parse_arg::<usize>(0, "page", "int")?,
        None => 1,
    };

    let (tracked, total) = ctx
        .bot
        .with_db(|db| Ok((db.tracked_commands()?, db.total_uses()?)))
        .map_err(|e| CommandError::ExecutionFailed(e.to_string()))?;
    if tracked == 0 {
        ctx.send("No commands have been used yet.").await?;
        return Ok(());
    }

    let pages = tracked.div_ceil(per_page);
    let page = clamp(requested, 1, pages);
    let rows = ctx
        .bot
        .with_db(|db| db.top_commands(per_page, (page - 1) * per_page))
        .map_err(|e| CommandError::ExecutionFailed(e.to_string()))?;

    let lines = usage_lines(&rows, &ctx.clean_prefix(), (page - 1) * per_page);
    let board = ctx
        .create_board(Some("Command usage"), Some(lines.as_str()), None)
        .footer(format!(
            "Page {}/{} • {} uses in total",
            page,
            pages,
            format_number(total.max(0) as u64, 1, false)
        ));
    ctx.send_board(&board).await?;
    Ok(())
}

fn usage_lines(rows: &[CommandUsage], prefix: &str, offset: usize) -> String {
    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            format!(
                "`{}.` `{}{}`: {} uses",
                offset + i + 1,
                prefix,
                row.command,
                format_number(row.uses.max(0) as u64, 1, false)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

async fn uptime(ctx: &Context) -> Result<(), CommandError> {
    let text = match ctx.bot.uptime() {
        Some(since) => format!(
            "Up for `{}` (since {})",
            timestamp(uptime_seconds(&ctx.bot)),
            since.format("%Y-%m-%d %H:%M:%S UTC")
        ),
        None => "Not fully started yet.".to_string(),
    };
    ctx.send(&text).await?;
    Ok(())
}

async fn about(ctx: &Context) -> Result<(), CommandError> {
    let bot = &ctx.bot;
    let database = match bot.with_db(|db| db.size_bytes()) {
        Ok(bytes) => format_size(bytes, &SizeFormat::default()).to_string(),
        Err(e) => {
            warn!("could not read database size: {}", e);
            "unavailable".to_string()
        }
    };
    let commands = bot.registry()?.commands().len();

    let board = ctx
        .create_board(Some(bot.config().bot.name.as_str()), None, Some(Utc::now()))
        .field("Version", format!("{} `{}`", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")))
        .field("Platform", format!("`{}` on `{}`", bot.bot_info().platform, detect_platform()))
        .field("Uptime", format!("`{}`", timestamp(uptime_seconds(bot))))
        .field("Database", format!("`{}`", database))
        .field(
            "Commands",
            format!("{} in {} extensions", commands, bot.loaded_extensions().len()),
        );
    ctx.send_board(&board).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_lines_continue_numbering_across_pages() {
        let rows = vec![
            CommandUsage {
                command: "help".to_string(),
                uses: 1200,
                last_used: "2026-01-01 00:00:00".to_string(),
            },
            CommandUsage {
                command: "about".to_string(),
                uses: 3,
                last_used: "2026-01-01 00:00:00".to_string(),
            },
        ];
        assert_eq!(
            usage_lines(&rows, "!", 5),
            "`6.` `!help`: 1.2K uses\n`7.` `!about`: 3 uses"
        );
    }
}
