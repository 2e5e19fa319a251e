use clap::{Parser, Subcommand};
use lib::api::ChatApiClient;
use lib::catalog;
use lib::controller::{ResetOutcome, SessionController, SubmitOutcome};
use lib::transcript::{Speaker, WELCOME_MESSAGE};

#[derive(Parser)]
#[command(name = "memchat")]
#[command(about = "Chat with an AI backend, with or without memory", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Interactive chat session against the configured backend.
    Chat {
        /// Config file path (default: MEMCHAT_CONFIG_PATH or ~/.memchat/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,

        /// Backend base URL (overrides config and MEMCHAT_BASE_URL)
        #[arg(long, value_name = "URL")]
        url: Option<String>,

        /// Provider to start with (openai or gemini)
        #[arg(long, value_name = "ID")]
        provider: Option<String>,

        /// Model to start with (default: first model of the provider's list)
        #[arg(long, value_name = "ID")]
        model: Option<String>,

        /// Start with the memory feature off
        #[arg(long)]
        no_memory: bool,
    },

    /// Reset the server-side session (clears conversation memory).
    Reset {
        /// Config file path (default: MEMCHAT_CONFIG_PATH or ~/.memchat/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,

        /// Backend base URL (overrides config and MEMCHAT_BASE_URL)
        #[arg(long, value_name = "URL")]
        url: Option<String>,

        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Version) => {
            println!("memchat {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Chat { config, url, provider, model, no_memory }) => {
            if let Err(e) = run_chat(config, url, provider, model, no_memory).await {
                log::error!("chat failed: {}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Reset { config, url, yes }) => {
            if let Err(e) = run_reset(config, url, yes).await {
                log::error!("reset failed: {}", e);
                std::process::exit(1);
            }
        }
        None => {
            println!("Run with --help for usage");
        }
    }
}

fn build_controller(
    config_path: Option<std::path::PathBuf>,
    url: Option<String>,
    provider: Option<String>,
    model: Option<String>,
    no_memory: bool,
) -> anyhow::Result<SessionController<ChatApiClient>> {
    let (config, _path) = lib::config::load_config(config_path)?;
    let base_url = url.unwrap_or_else(|| lib::config::resolve_base_url(&config));
    let timeout = config.backend.timeout_secs.map(std::time::Duration::from_secs);
    let client = ChatApiClient::new(Some(base_url), timeout)?;

    let settings = lib::config::initial_settings(&config);
    let mut controller = SessionController::with_settings(client, settings);
    if let Some(p) = provider {
        controller.select_provider(p);
    }
    if let Some(m) = model {
        controller.select_model(m);
    }
    if no_memory {
        controller.set_memory_enabled(false);
    }
    Ok(controller)
}

async fn run_chat(
    config_path: Option<std::path::PathBuf>,
    url: Option<String>,
    provider: Option<String>,
    model: Option<String>,
    no_memory: bool,
) -> anyhow::Result<()> {
    use std::io::{self, Write};

    let mut controller = build_controller(config_path, url, provider, model, no_memory)?;

    println!("{}", WELCOME_MESSAGE);
    println!();
    println!(
        "backend: {} | {} / {} ({}) | /help for commands",
        controller.backend().base_url(),
        controller.settings().provider,
        controller.settings().model,
        controller.memory_label()
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        write!(stdout, "> ")?;
        stdout.flush()?;
        let mut line = String::new();
        if stdin.read_line(&mut line)? == 0 {
            break;
        }
        let input = line.trim();
        if input.is_empty() {
            // silently dropped, same as the submit guard
            continue;
        }
        if input.eq_ignore_ascii_case("/exit") || input.eq_ignore_ascii_case("/quit") {
            break;
        }
        if let Some(command) = input.strip_prefix('/') {
            handle_command(&mut controller, command).await;
            continue;
        }

        let before = controller.transcript().len();
        if controller.submit(input).await == SubmitOutcome::Completed {
            for turn in &controller.transcript().turns()[before..] {
                if turn.speaker == Speaker::Assistant {
                    println!("{}", turn.label());
                    println!("{}", turn.text);
                }
            }
        }
    }

    Ok(())
}

async fn handle_command(controller: &mut SessionController<ChatApiClient>, command: &str) {
    let mut parts = command.split_whitespace();
    let name = parts.next().unwrap_or("");
    let arg = parts.next();

    match name {
        "help" => {
            println!("  /provider <id>   switch provider ({})", catalog::providers().join("|"));
            println!("  /model <id>      switch model");
            println!("  /models          list models for the current provider");
            println!("  /memory on|off   toggle the memory feature");
            println!("  /reset           reset the session (asks for confirmation)");
            println!("  /exit            quit");
        }
        "provider" => match arg {
            Some(p) if catalog::models_for(p).is_empty() => {
                println!("unknown provider: {} (known: {})", p, catalog::providers().join(", "));
            }
            Some(p) => {
                controller.select_provider(p);
                println!(
                    "provider: {} / model: {}",
                    controller.settings().provider,
                    controller.settings().model
                );
            }
            None => {
                println!("provider: {}", controller.settings().provider);
            }
        },
        "model" => match arg {
            Some(m) => {
                controller.select_model(m);
                println!("model: {}", controller.settings().model);
            }
            None => {
                println!("model: {}", controller.settings().model);
            }
        },
        "models" => {
            for option in catalog::models_for(&controller.settings().provider) {
                println!("  {}", option.label);
            }
        }
        "memory" => match arg {
            Some("on") => {
                controller.set_memory_enabled(true);
                println!("{}", controller.memory_label());
            }
            Some("off") => {
                controller.set_memory_enabled(false);
                println!("{}", controller.memory_label());
            }
            _ => {
                println!("{}", controller.memory_label());
            }
        },
        "reset" => match controller.reset(confirm_reset).await {
            ResetOutcome::Done => {
                println!("{}", WELCOME_MESSAGE);
            }
            ResetOutcome::Declined => {}
            ResetOutcome::Failed(e) => {
                eprintln!("Error resetting session: {}", e);
            }
        },
        other => {
            println!("unknown command: /{}", other);
        }
    }
}

async fn run_reset(
    config_path: Option<std::path::PathBuf>,
    url: Option<String>,
    yes: bool,
) -> anyhow::Result<()> {
    let mut controller = build_controller(config_path, url, None, None, false)?;
    match controller.reset(|| yes || confirm_reset()).await {
        ResetOutcome::Done => {
            println!("Session reset.");
            Ok(())
        }
        ResetOutcome::Declined => {
            println!("Aborted.");
            Ok(())
        }
        ResetOutcome::Failed(e) => anyhow::bail!("resetting session: {}", e),
    }
}

/// Blocking y/N prompt; the reset proceeds only on an explicit yes.
fn confirm_reset() -> bool {
    use std::io::{self, Write};

    print!("Reset your session? This clears all memories for this conversation. [y/N] ");
    let _ = io::stdout().flush();
    let mut answer = String::new();
    if io::stdin().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
