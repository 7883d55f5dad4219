//! Developer tools: extension management, shell execution, app command sync
//! and process control. Admins only.

use crate::application::bot::Shutdown;
use crate::application::checks;
use crate::application::context::Context;
use crate::application::errors::{BotError, CommandError, ExtensionError};
use crate::domain::entities::{Command, CommandScope};
use crate::plugins::{Cog, CogRegistry};
use crate::utils::bot::prevent_ratelimit;
use crate::utils::console::detect_platform;
use crate::utils::formatters::{self, code, trim_and_add_suffix};
use crate::utils::iterables::paginate;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tokio::process::Command as Process;
use tracing::{error, info, warn};

/// Longest shell output shown in a reply
const MAX_OUTPUT_CHARS: usize = 1500;

/// Guild syncs sent before pausing
const SYNCS_PER_BATCH: usize = 5;

pub fn setup(registry: &mut CogRegistry) -> Result<(), ExtensionError> {
    registry.add_cog(Developer::new())
}

pub struct Developer {
    /// Output of the previous `exec`, exposed to the next one as `$LAST`
    last_result: Mutex<Option<String>>,
}

impl Developer {
    pub fn new() -> Self {
        Self {
            last_result: Mutex::new(None),
        }
    }

    fn last_result(&self) -> Option<String> {
        self.last_result.lock().ok().and_then(|last| last.clone())
    }

    fn set_last_result(&self, value: String) {
        if let Ok(mut last) = self.last_result.lock() {
            *last = Some(value);
        }
    }

    async fn load(&self, ctx: &Context) -> Result<(), CommandError> {
        let name = ctx.arg(0, "extension", "str")?;
        let ext = ctx.bot.qualify_extension(name)?;
        warn!("{} wants to load `{}`", ctx.author().describe(), ext);

        match ctx.bot.load_extension(name) {
            Ok(()) => {
                ctx.send(&format!("✅ Loaded the extension: `{}`", ext)).await?;
                info!("successfully loaded `{}`", ext);
                Ok(())
            }
            Err(e) => report_extension_error(ctx, "loading", &ext, e).await,
        }
    }

    async fn unload(&self, ctx: &Context) -> Result<(), CommandError> {
        let name = ctx.arg(0, "extension", "str")?;
        let ext = ctx.bot.qualify_extension(name)?;
        warn!("{} wants to unload `{}`", ctx.author().describe(), ext);

        match ctx.bot.unload_extension(name) {
            Ok(()) => {
                ctx.send(&format!("✅ Unloaded the extension: `{}`", ext)).await?;
                info!("successfully unloaded `{}`", ext);
                Ok(())
            }
            Err(e) => report_extension_error(ctx, "unloading", &ext, e).await,
        }
    }

    async fn reload(&self, ctx: &Context) -> Result<(), CommandError> {
        let (extensions, status_id) = if ctx.args.is_empty() {
            warn!("{} wants to reload all extensions", ctx.author().describe());
            let id = ctx.send("🔨 Reloading all extensions...").await?;
            (ctx.bot.loaded_extensions(), id)
        } else {
            let extensions = ctx
                .args
                .iter()
                .map(|name| ctx.bot.qualify_extension(name))
                .collect::<Result<Vec<_>, _>>()?;
            let listed = extensions.join("`, `");
            warn!("{} wants to reload `{}`", ctx.author().describe(), listed);
            let id = ctx.send(&format!("🔨 Reloading: `{}`", listed)).await?;
            (extensions, id)
        };

        let mut status = String::new();
        for ext in &extensions {
            match ctx.bot.reload_extension(ext) {
                Ok(()) => {
                    info!("successfully reloaded `{}`", ext);
                    status.push_str(&format!("✅ Successfully reloaded `{}`\n", ext));
                }
                Err(e) => {
                    let e = CommandError::from(e);
                    error!("failed to reload `{}`: {}", ext, e);
                    status.push_str(&format!("❌ Failed to reload `{}`: `{}`\n", ext, e.type_name()));
                }
            }
        }
        if status.is_empty() {
            status.push_str("No extensions are loaded.");
        }

        ctx.edit(&status_id, status.trim_end()).await
    }

    async fn extensions(&self, ctx: &Context) -> Result<(), CommandError> {
        let loaded: Vec<String> = ctx
            .bot
            .loaded_extensions()
            .iter()
            .map(|name| format!("`{}`", name))
            .collect();
        if loaded.is_empty() {
            ctx.send("No extensions are loaded.").await?;
            return Ok(());
        }

        let lines: Vec<String> = paginate(loaded, 3)
            .into_iter()
            .map(|group| group.join(", "))
            .collect();
        ctx.send(&format!("All loaded extensions:\n{}", lines.join(",\n")))
            .await?;
        Ok(())
    }

    async fn exec(&self, ctx: &Context) -> Result<(), CommandError> {
        let snippet = ctx.cleaned_up_code.clone();
        if snippet.is_empty() {
            return Err(CommandError::missing("code", "str"));
        }
        warn!("{}exec called by {}", ctx.clean_prefix(), ctx.author().describe());

        let started = Instant::now();
        let result = shell(&snippet)
            .env("LAST", self.last_result().unwrap_or_default())
            .output()
            .await;
        let took = elapsed_text(started.elapsed());

        let board = ctx
            .create_board(None, None, Some(Utc::now()))
            .field(
                "System Info",
                format!(
                    "{} `{}`\nPlatform `{}`",
                    env!("CARGO_PKG_NAME"),
                    env!("CARGO_PKG_VERSION"),
                    detect_platform()
                ),
            )
            .footer(format!("Requested by {}", ctx.author().handle()));

        let board = match result {
            Ok(output) => {
                let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
                text.push_str(&String::from_utf8_lossy(&output.stderr));
                let status = output.status.code().map_or("signal".to_string(), |c| c.to_string());

                if output.status.success() {
                    info!("execution successful, output of exec:\n{}\nTime taken: {}", text, took);
                    ctx.success().await.ok();
                } else {
                    error!("execution failed, output of exec:\n{}\nTime taken: {}", text, took);
                    ctx.failure().await.ok();
                }

                let shown = if text.trim().is_empty() {
                    "No output recorded.".to_string()
                } else {
                    trim_and_add_suffix(text.trim_end(), MAX_OUTPUT_CHARS, "\n...")
                        .map_err(|e| CommandError::ExecutionFailed(e.to_string()))?
                };
                self.set_last_result(text);

                let title = if output.status.success() {
                    "Execution Successful"
                } else {
                    "Execution Failed"
                };
                board
                    .title(title)
                    .description(format!("Output:\n{}", code(&shown, Some("prolog"))))
                    .field("Execution Info", format!("Took `{}`\nExit status: `{}`", took, status))
            }
            Err(e) => {
                error!("could not start the shell: {}", e);
                ctx.failure().await.ok();
                self.set_last_result(e.to_string());
                board
                    .title("Execution Failed at spawn")
                    .description(formatters::error("io::Error", &e))
                    .field("Execution Info", format!("Took `{}`", took))
            }
        };

        ctx.send_board(&board).await?;
        Ok(())
    }

    async fn sync(&self, ctx: &Context) -> Result<(), CommandError> {
        let guild = ctx.guild_id().ok_or(CommandError::NoPrivateMessage)?.to_string();
        let (guilds, spec) = split_sync_args(&ctx.args);
        let bot = &ctx.bot;

        if guilds.is_empty() {
            let here = CommandScope::Guild(guild.clone());
            let synced = match spec {
                Some("~") => bot.sync_commands(&here).await?,
                Some("*") => {
                    bot.tree().copy_global_to(&guild, &bot.app_commands()?)?;
                    bot.sync_commands(&here).await?
                }
                Some("^") => {
                    bot.tree().clear_commands(&guild)?;
                    bot.sync_commands(&here).await?;
                    Vec::new()
                }
                _ => bot.sync_commands(&CommandScope::Global).await?,
            };

            let target = if spec.is_none() {
                "globally"
            } else {
                "to the current guild"
            };
            ctx.send(&format!("Synced {} commands {}.", synced.len(), target))
                .await?;
            return Ok(());
        }

        let scopes: Vec<CommandScope> = guilds
            .iter()
            .map(|id| CommandScope::Guild(id.to_string()))
            .collect();
        let syncs = scopes.iter().map(|scope| bot.sync_commands(scope)).collect();
        let results = prevent_ratelimit(syncs, SYNCS_PER_BATCH, Duration::from_secs(1)).await;

        let mut synced = 0;
        for (scope, result) in scopes.iter().zip(results) {
            match result {
                Ok(_) => synced += 1,
                Err(e) => warn!("failed to sync {}: {}", scope, e),
            }
        }
        ctx.send(&format!("Synced the tree to {}/{}.", synced, scopes.len()))
            .await?;
        Ok(())
    }

    async fn stop(&self, ctx: &Context, kind: Shutdown) -> Result<(), CommandError> {
        let (verb, emoji) = match kind {
            Shutdown::Restart => ("restarting", "🫠"),
            Shutdown::Stop => ("shutting down", "🫀"),
        };
        let author = ctx.author();
        warn!("{} is {} the bot", author.describe(), verb);

        let notice = format!(
            "*{}* is {} the bot\n{} ({})",
            author.display_name(),
            verb,
            author.handle(),
            author.id
        );
        match ctx.bot.send_to_log_channel(&notice).await {
            Ok(true) => warn!("informed logs channel"),
            Ok(false) => warn!("log_channel is not set, {} without informing logs channel...", verb),
            Err(e) => error!("couldn't inform logs channel, ignoring and {}: {}", verb, e),
        }

        if let Err(e) = ctx.react(emoji).await {
            error!("couldn't react to message, ignoring and {}: {}", verb, e);
        }

        warn!("{}", verb);
        ctx.bot.request_shutdown(kind);
        Ok(())
    }

    async fn generate_invite(&self, ctx: &Context) -> Result<(), CommandError> {
        let text = match ctx.bot.client().invite_url() {
            Some(url) => format!("[Click to invite me to a group]({})", url),
            None => "This platform has no invite links.".to_string(),
        };
        ctx.send(&text).await?;
        Ok(())
    }
}

impl Default for Developer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Cog for Developer {
    fn name(&self) -> &str {
        "developer"
    }

    fn description(&self) -> &str {
        "Tools for the bot's admins."
    }

    fn emoji(&self) -> Option<&str> {
        Some("🛠")
    }

    fn hidden(&self) -> bool {
        true
    }

    fn commands(&self) -> Vec<Command> {
        vec![
            Command::new("load")
                .with_description("Load an extension")
                .with_usage("<extension>")
                .with_aliases(&["load-extension"]),
            Command::new("unload")
                .with_description("Unload an extension")
                .with_usage("<extension>")
                .with_aliases(&["unload-extension"]),
            Command::new("reload")
                .with_description("Reload some or all extensions")
                .with_usage("[extensions...]")
                .with_aliases(&["r", "re", "reload-all", "reload-extension", "reload-all-extensions"]),
            Command::new("extensions")
                .with_description("List all loaded extensions")
                .with_aliases(&["exts", "loaded", "loaded-extensions"]),
            Command::new("exec")
                .with_description("Run a shell snippet")
                .with_usage("<code>")
                .with_aliases(&["eval", "run"]),
            Command::new("sync")
                .with_description("Sync app commands")
                .with_usage("[guilds...] [~|*|^]")
                .guild_only(),
            Command::new("restart").with_description("Restart the bot"),
            Command::new("shutdown").with_description("Shut the bot down"),
            Command::new("generate-invite")
                .with_description("Generate an invite link for testing")
                .with_aliases(&["invite"]),
        ]
    }

    async fn cog_check(&self, ctx: &Context) -> Result<bool, CommandError> {
        Ok(checks::is_admin(ctx.bot.config(), &ctx.author().id))
    }

    async fn invoke(&self, name: &str, ctx: &mut Context) -> Result<(), CommandError> {
        match name {
            "load" => self.load(ctx).await,
            "unload" => self.unload(ctx).await,
            "reload" => self.reload(ctx).await,
            "extensions" => self.extensions(ctx).await,
            "exec" => self.exec(ctx).await,
            "sync" => self.sync(ctx).await,
            "restart" => self.stop(ctx, Shutdown::Restart).await,
            "shutdown" => self.stop(ctx, Shutdown::Stop).await,
            "generate-invite" => self.generate_invite(ctx).await,
            _ => Err(CommandError::NotFound(name.to_string())),
        }
    }
}

async fn report_extension_error(ctx: &Context, verb: &str, ext: &str, e: BotError) -> Result<(), CommandError> {
    let e = CommandError::from(e);
    error!("failed {} `{}`: `{}`", verb, ext, e.type_name());
    ctx.send(&format!(
        "❌ Error occurred while {} the extension: `{}`\n{}",
        verb,
        ext,
        code(&format!("{}: {}", e.type_name(), e), None)
    ))
    .await?;
    Ok(())
}

#[cfg(unix)]
fn shell(snippet: &str) -> Process {
    let mut command = Process::new("sh");
    command.arg("-c").arg(snippet);
    command
}

#[cfg(windows)]
fn shell(snippet: &str) -> Process {
    let mut command = Process::new("cmd");
    command.arg("/C").arg(snippet);
    command
}

/// `250ms`, `1.5s` or `2.25m`
fn elapsed_text(elapsed: Duration) -> String {
    let round2 = |value: f64| (value * 100.0).round() / 100.0;
    let secs = elapsed.as_secs_f64();

    if secs < 1.0 {
        format!("{}ms", elapsed.as_millis())
    } else if secs > 60.0 {
        format!("{}m", round2(secs / 60.0))
    } else {
        format!("{}s", round2(secs))
    }
}

/// Guild ids, then an optional trailing `~`, `*` or `^`
fn split_sync_args(args: &[String]) -> (Vec<&str>, Option<&str>) {
    let (spec, guilds) = match args.split_last() {
        Some((last, rest)) if matches!(last.as_str(), "~" | "*" | "^") => (Some(last.as_str()), rest),
        _ => (None, args),
    };
    (guilds.iter().map(String::as_str).collect(), spec)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elapsed_text() {
        assert_eq!(elapsed_text(Duration::from_millis(250)), "250ms");
        assert_eq!(elapsed_text(Duration::from_millis(1500)), "1.5s");
        assert_eq!(elapsed_text(Duration::from_secs(135)), "2.25m");
    }

    #[test]
    fn test_split_sync_args() {
        let args = |s: &str| s.split_whitespace().map(String::from).collect::<Vec<_>>();

        assert_eq!(split_sync_args(&args("")), (vec![], None));
        assert_eq!(split_sync_args(&args("~")), (vec![], Some("~")));
        assert_eq!(split_sync_args(&args("1 2 ^")), (vec!["1", "2"], Some("^")));
        assert_eq!(split_sync_args(&args("1 2")), (vec!["1", "2"], None));
    }

    #[test]
    fn test_setup_registers_hidden_cog() {
        let mut registry = CogRegistry::new();
        setup(&mut registry).unwrap();

        let (command, cog) = registry.resolve("re").unwrap();
        assert_eq!(command.name, "reload");
        assert!(cog.hidden());
        assert!(registry.commands().find("sync").unwrap().guild_only);
    }

    #[test]
    fn test_last_result_is_per_instance() {
        let first = Developer::new();
        let second = Developer::new();
        first.set_last_result("42".to_string());

        assert_eq!(first.last_result().as_deref(), Some("42"));
        assert_eq!(second.last_result(), None);
    }
}
