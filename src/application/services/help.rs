//! Built-in `help` command

use crate::application::context::Context;
use crate::application::errors::CommandError;
use crate::domain::entities::{Board, Command};
use crate::plugins::{Cog, CogRegistry};
use crate::utils::formatters::camelize;
use crate::utils::iterables::paginate;
use crate::utils::searchers::{get_identifiable_matches, get_matches_by_key};
use crate::utils::values::clamp;
use async_trait::async_trait;

/// Always registered, not tied to any extension
pub struct Help;

#[async_trait]
impl Cog for Help {
    fn name(&self) -> &str {
        "help"
    }

    fn description(&self) -> &str {
        "Information about commands and categories."
    }

    fn emoji(&self) -> Option<&str> {
        Some("❓")
    }

    fn commands(&self) -> Vec<Command> {
        vec![Command::new("help")
            .with_description("Show help for a command or category.")
            .with_usage("[command|category] [page]")
            .with_aliases(&["h"])
            .slash()]
    }

    async fn invoke(&self, name: &str, ctx: &mut Context) -> Result<(), CommandError> {
        match name {
            "help" => help(ctx).await,
            _ => Err(CommandError::NotFound(name.to_string())),
        }
    }
}

async fn help(ctx: &mut Context) -> Result<(), CommandError> {
    let registry = ctx.bot.registry()?;
    let view = HelpView {
        registry: &registry,
        admin: ctx.bot.config().is_admin(&ctx.author().id),
        prefix: ctx.clean_prefix(),
    };
    let (query, page) = split_page(&ctx.args);

    let text = if query.is_empty() {
        view.overview()
    } else if let Some(command) = view.command(&query) {
        let mention = command.slash.then(|| ctx.bot.slash_mention(&command.name));
        view.command_page(command, mention)
    } else if let Some(cog) = view.cog(&query) {
        view.cog_page(cog.as_ref(), page, ctx.bot.config().bot.items_per_page)
    } else {
        view.suggestions(&query)
    };

    ctx.send(&text).await?;
    Ok(())
}

/// Query words, and a page number when the last word is one
fn split_page(args: &[String]) -> (String, usize) {
    match args.split_last() {
        Some((last, rest)) if !rest.is_empty() => match last.parse::<usize>() {
            Ok(page) => (rest.join(" "), page),
            Err(_) => (args.join(" "), 1),
        },
        _ => (args.join(" "), 1),
    }
}

fn category_title(cog: &dyn Cog) -> String {
    match cog.emoji() {
        Some(emoji) => format!("{} {}", emoji, camelize(cog.name())),
        None => camelize(cog.name()),
    }
}

/// Help rendering for one reader. Hidden cogs and commands are only shown to
/// admins.
pub struct HelpView<'a> {
    pub registry: &'a CogRegistry,
    pub admin: bool,
    pub prefix: String,
}

impl<'a> HelpView<'a> {
    fn cog_visible(&self, cog: &dyn Cog) -> bool {
        self.admin || !cog.hidden()
    }

    fn command_visible(&self, command: &Command) -> bool {
        if self.admin {
            return true;
        }
        !command.hidden
            && self
                .registry
                .get_cog(&command.cog)
                .map(|cog| !cog.hidden())
                .unwrap_or(false)
    }

    fn visible_commands(&self) -> Vec<&'a Command> {
        self.registry
            .commands()
            .all()
            .filter(|c| self.command_visible(c))
            .collect()
    }

    /// Exact command name or alias
    pub fn command(&self, query: &str) -> Option<&'a Command> {
        self.registry
            .commands()
            .find(query)
            .filter(|c| self.command_visible(c))
    }

    /// Exact category name
    pub fn cog(&self, query: &str) -> Option<std::sync::Arc<dyn Cog>> {
        self.registry
            .get_cog(query)
            .filter(|cog| self.cog_visible(cog.as_ref()))
    }

    /// Every category with its commands
    pub fn overview(&self) -> String {
        let mut board = Board::new().title("Help").description(format!(
            "Use `{p}help <command>` or `{p}help <category>` for more information.",
            p = self.prefix
        ));

        for cog in self.registry.cogs() {
            if !self.cog_visible(cog.as_ref()) {
                continue;
            }
            let names: Vec<String> = self
                .registry
                .commands()
                .by_cog(cog.name())
                .filter(|c| self.command_visible(c))
                .map(|c| format!("`{}`", c.name))
                .collect();
            if names.is_empty() {
                continue;
            }
            board = board.field(category_title(cog.as_ref()), names.join(" "));
        }
        board.render()
    }

    pub fn command_page(&self, command: &Command, slash_mention: Option<String>) -> String {
        let description = command
            .description
            .clone()
            .unwrap_or_else(|| "No description provided.".to_string());

        let mut board = Board::new()
            .title(format!("{}{}", self.prefix, command.signature()))
            .description(description);
        if !command.aliases.is_empty() {
            let aliases: Vec<String> = command.aliases.iter().map(|a| format!("`{}`", a)).collect();
            board = board.field("Aliases", aliases.join(" "));
        }
        board = board.field("Category", camelize(&command.cog));
        if let Some(mention) = slash_mention {
            board = board.field("Slash command", mention);
        }
        board.render()
    }

    /// One page of a category's commands. Out of range pages are clamped.
    pub fn cog_page(&self, cog: &dyn Cog, page: usize, per_page: usize) -> String {
        let commands: Vec<&Command> = self
            .registry
            .commands()
            .by_cog(cog.name())
            .filter(|c| self.command_visible(c))
            .collect();
        let pages = paginate(commands, per_page);
        let total = pages.len().max(1);
        let page = clamp(page, 1, total);

        let mut board = Board::new()
            .title(category_title(cog))
            .description(cog.description());
        if let Some(entries) = pages.get(page - 1) {
            for command in entries {
                board = board.field(
                    format!("{}{}", self.prefix, command.signature()),
                    command
                        .description
                        .clone()
                        .unwrap_or_else(|| "No description provided.".to_string()),
                );
            }
        }
        board.footer(format!("Page {}/{}", page, total)).render()
    }

    /// Fuzzy suggestions for a query that named nothing exactly
    pub fn suggestions(&self, query: &str) -> String {
        let commands = get_matches_by_key(query, self.visible_commands(), |c: &&Command| {
            c.names().into_iter().map(str::to_string).collect::<Vec<String>>()
        });
        let categories = get_identifiable_matches(
            query,
            self.registry
                .cogs()
                .iter()
                .filter(|cog| self.cog_visible(cog.as_ref()))
                .map(|cog| (cog.name().to_string(), cog.description().to_string())),
        );

        let mut text = format!("No command or category called `{}` found.", query);
        if commands.is_empty() && categories.is_empty() {
            return text;
        }

        text.push_str("\nDid you mean:");
        for command in commands {
            text.push_str(&format!("\n- `{}{}` (command)", self.prefix, command.name));
        }
        for (name, description) in categories {
            text.push_str(&format!("\n- `{}` (category): {}", name, description));
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Tools;

    #[async_trait]
    impl Cog for Tools {
        fn name(&self) -> &str {
            "tools"
        }

        fn commands(&self) -> Vec<Command> {
            vec![
                Command::new("reload").with_aliases(&["r", "re"]).with_description("Reload things"),
                Command::new("release"),
                Command::new("ping").with_description("Pong"),
            ]
        }
    }

    struct Secret;

    #[async_trait]
    impl Cog for Secret {
        fn name(&self) -> &str {
            "secret"
        }

        fn hidden(&self) -> bool {
            true
        }

        fn commands(&self) -> Vec<Command> {
            vec![Command::new("restart")]
        }
    }

    fn registry() -> CogRegistry {
        let mut registry = CogRegistry::new();
        registry.add_cog(Help).unwrap();
        registry.add_cog(Tools).unwrap();
        registry.add_cog(Secret).unwrap();
        registry
    }

    fn view(registry: &CogRegistry, admin: bool) -> HelpView<'_> {
        HelpView {
            registry,
            admin,
            prefix: "!".to_string(),
        }
    }

    #[test]
    fn test_split_page() {
        let args = |s: &str| s.split_whitespace().map(String::from).collect::<Vec<_>>();
        assert_eq!(split_page(&args("tools 2")), ("tools".to_string(), 2));
        assert_eq!(split_page(&args("tools")), ("tools".to_string(), 1));
        assert_eq!(split_page(&args("2")), ("2".to_string(), 1));
        assert_eq!(split_page(&[]), (String::new(), 1));
    }

    #[test]
    fn test_overview_hides_hidden_cogs() {
        let registry = registry();
        let text = view(&registry, false).overview();
        assert!(text.contains("*Tools*"));
        assert!(text.contains("`reload`"));
        assert!(!text.contains("restart"));

        let text = view(&registry, true).overview();
        assert!(text.contains("*Secret*"));
        assert!(text.contains("`restart`"));
    }

    #[test]
    fn test_command_by_alias() {
        let registry = registry();
        let view = view(&registry, false);
        let command = view.command("RE").unwrap();
        assert_eq!(command.name, "reload");

        let text = view.command_page(command, None);
        assert!(text.starts_with("*!reload*"));
        assert!(text.contains("`r` `re`"));
        assert!(text.contains("*Category*\nTools"));
    }

    #[test]
    fn test_hidden_command_is_not_found_for_users() {
        let registry = registry();
        assert!(view(&registry, false).command("restart").is_none());
        assert!(view(&registry, true).command("restart").is_some());
    }

    #[test]
    fn test_cog_page_clamps_page() {
        let registry = registry();
        let view = view(&registry, false);
        let cog = view.cog("Tools").unwrap();

        // sorted by name: ping, release | reload
        let text = view.cog_page(cog.as_ref(), 9, 2);
        assert!(text.contains("Page 2/2"));
        assert!(text.contains("*!reload*\nReload things"));
        assert!(!text.contains("!ping"));

        let text = view.cog_page(cog.as_ref(), 0, 2);
        assert!(text.contains("Page 1/2"));
    }

    #[test]
    fn test_suggestions_use_fuzzy_matching() {
        let registry = registry();
        let text = view(&registry, false).suggestions("rel");
        assert!(text.starts_with("No command or category called `rel` found."));
        assert!(text.contains("`!reload` (command)"));
        assert!(text.contains("`!release` (command)"));
        assert!(!text.contains("ping"));
    }

    #[test]
    fn test_suggestions_match_categories_by_name() {
        let registry = registry();
        let text = view(&registry, false).suggestions("too");
        assert!(text.contains("`tools` (category)"));

        let text = view(&registry, false).suggestions("zzz");
        assert_eq!(text, "No command or category called `zzz` found.");
    }
}
