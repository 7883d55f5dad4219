use clap::{Parser, Subcommand};
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use cogbot::application::{Bot, Shutdown};
use cogbot::cogs;
use cogbot::domain::traits::ChatClient;
use cogbot::infrastructure::adapters::{ConsoleAdapter, TelegramAdapter};
use cogbot::infrastructure::config::Config;
use cogbot::infrastructure::logging::init_logging;
use cogbot::plugins::ExtensionLoader;
use cogbot::utils::console::print_terminal_size;

#[derive(Parser)]
#[command(name = "cogbot")]
#[command(about = "A chat bot scaffold with loadable cogs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file path
    #[arg(short, long, default_value = "config.yaml")]
    config: String,

    /// Bot token (overrides config and TOKEN)
    #[arg(short, long)]
    token: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot
    Run,
    /// Show version
    Version,
    /// Generate default config
    InitConfig,
    /// List the extension catalog
    Cogs,
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_bot(&cli.config, cli.token),
        Commands::Version => {
            println!("cogbot v{}", env!("CARGO_PKG_VERSION"));
            ExitCode::SUCCESS
        }
        Commands::InitConfig => init_config(),
        Commands::Cogs => list_cogs(&cli.config),
    }
}

fn load_config(path: &str, token: Option<String>) -> Result<Config, String> {
    let mut config = if Path::new(path).exists() {
        Config::load(path).map_err(|e| e.to_string())?
    } else {
        Config::default()
    };
    config.apply_env();
    if let Some(token) = token {
        config.set_token(token);
    }
    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

fn run_bot(config_path: &str, token: Option<String>) -> ExitCode {
    let config = match load_config(config_path, token) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("invalid configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let _guard = match init_logging(&config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("could not set up logging: {}", e);
            return ExitCode::FAILURE;
        }
    };
    if config.bot.debug {
        print_terminal_size();
    }

    let catalog = match cogs::catalog().discover(&config.extensions.namespace) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let client: Arc<dyn ChatClient> = match config.telegram_token() {
        Some(token) => Arc::new(TelegramAdapter::new(token)),
        None => {
            tracing::info!("no token set, using the console adapter");
            Arc::new(ConsoleAdapter::new(config.console_user()))
        }
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!("could not start the async runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let outcome = runtime.block_on(async {
        match Bot::new(config, client, catalog) {
            Ok(bot) => Arc::new(bot).run().await,
            Err(e) => Err(e),
        }
    });
    // Drop the runtime so stdin readers and in-flight requests are gone
    // before the process is replaced
    drop(runtime);

    match outcome {
        Ok(Shutdown::Stop) => ExitCode::SUCCESS,
        Ok(Shutdown::Restart) => restart(),
        Err(e) => {
            tracing::error!("bot stopped with an error: {}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(unix)]
fn restart() -> ExitCode {
    use std::os::unix::process::CommandExt;

    let mut args = std::env::args_os();
    let Some(program) = args.next() else {
        tracing::error!("could not determine how the bot was started");
        return ExitCode::FAILURE;
    };
    let args: Vec<_> = args.collect();
    tracing::warn!(
        "replacing current process with a new one: {} {}",
        program.to_string_lossy(),
        args.iter()
            .map(|a| a.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ")
    );

    // exec only returns on failure
    let e = std::process::Command::new(program).args(args).exec();
    tracing::error!("restart failed: {}", e);
    ExitCode::FAILURE
}

#[cfg(not(unix))]
fn restart() -> ExitCode {
    let mut args = std::env::args_os();
    let Some(program) = args.next() else {
        tracing::error!("could not determine how the bot was started");
        return ExitCode::FAILURE;
    };
    match std::process::Command::new(program).args(args).spawn() {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("restart failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_config() -> ExitCode {
    match Config::default().to_yaml() {
        Ok(yaml) => {
            println!("{}", yaml);
            println!("\nSave this to config.yaml and adjust as needed.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn list_cogs(config_path: &str) -> ExitCode {
    let config = match load_config(config_path, None) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("invalid configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let loader = ExtensionLoader::new(config.extensions.namespace.clone(), &config.extensions.exclude);

    let entries = match cogs::catalog().discover(&config.extensions.namespace) {
        Ok(entries) => entries,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    for entry in entries {
        let note = if loader.is_excluded(&entry.name) {
            " (excluded in config)"
        } else if entry.ignore {
            " (ignored)"
        } else {
            ""
        };
        println!("{}{}", entry.name, note);
    }
    ExitCode::SUCCESS
}
