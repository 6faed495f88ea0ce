//! RunHNT CLI
//!
//! Command-line client for the treasure hunt:
//! - List teams
//! - Submit a treasure code for a team
//! - Show the activity feed
//! - Run the interactive two-tab shell

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use runhunt::render;
use runhunt::{
    Backend, Config, EntryForm, FeedQuery, FeedState, LoggingConfig, RestBackend, SubmitOutcome,
    Tab, TabShell, TeamDirectory, ToastLevel, Toasts,
};

#[derive(Parser)]
#[command(name = "runhunt")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Treasure-code entry and activity feed for RunHNT hunts")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: search the usual locations)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the backend project URL
    #[arg(long, global = true)]
    pub backend_url: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table", global = true)]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the teams
    Teams,

    /// Submit a treasure code
    Submit {
        /// Treasure code (non-digits are stripped, at most 7 digits kept)
        code: String,
        /// Team id or exact team name
        #[arg(short, long)]
        team: String,
    },

    /// Show the activity feed
    Feed,

    /// Interactive session with Entry and Feed tabs
    Shell,

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Commands::Config { output } = &cli.command {
        return write_default_config(output.as_deref());
    }

    let mut config = match &cli.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };
    if let Some(url) = cli.backend_url.clone() {
        config.backend.url = url;
    }
    init_logging(&config.logging);

    tracing::info!("RunHNT client v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Backend: {}", config.backend.rest_base());

    // One backend handle for the whole process, never reconfigured
    let backend: Arc<dyn Backend> = Arc::new(
        RestBackend::new(&config.backend).context("Failed to create backend client")?,
    );
    let query = FeedQuery::new(config.feed.effective_limit());
    let color = cli.format == OutputFormat::Table && std::io::stdout().is_terminal();

    let ok = match cli.command {
        Commands::Teams => list_teams(backend.as_ref(), cli.format).await?,
        Commands::Submit { code, team } => {
            submit_code(backend.as_ref(), &code, &team, cli.format).await?
        }
        Commands::Feed => show_feed(backend.as_ref(), query, cli.format, color).await?,
        Commands::Shell => {
            run_shell(backend, query, color).await?;
            true
        }
        Commands::Config { .. } => true,
    };

    if !ok {
        std::process::exit(1);
    }
    Ok(())
}

fn init_logging(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("runhunt={}", logging.level)));
    let registry = tracing_subscriber::registry().with(filter);

    if logging.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn write_default_config(output: Option<&std::path::Path>) -> anyhow::Result<()> {
    let config = runhunt::config::generate_default_config();

    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, &config)
                .with_context(|| format!("Failed to write config to {:?}", path))?;
            println!("Config written to {:?}", path);
        }
        None => print!("{}", config),
    }
    Ok(())
}

/// Print pending toasts to stderr; returns whether any was an error
fn flush_toasts(toasts: &mut Toasts) -> bool {
    let mut failed = false;
    for toast in toasts.drain() {
        failed |= toast.level == ToastLevel::Error;
        eprintln!("{}", toast);
    }
    failed
}

async fn list_teams(backend: &dyn Backend, format: OutputFormat) -> anyhow::Result<bool> {
    let mut toasts = Toasts::new();
    let directory = TeamDirectory::load(backend, &mut toasts).await;
    let failed = flush_toasts(&mut toasts);

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(directory.teams())?),
        OutputFormat::Table => println!("{}", render::team_list(directory.teams())),
    }
    Ok(!failed)
}

async fn submit_code(
    backend: &dyn Backend,
    code: &str,
    team: &str,
    format: OutputFormat,
) -> anyhow::Result<bool> {
    let mut toasts = Toasts::new();
    let directory = TeamDirectory::load(backend, &mut toasts).await;
    flush_toasts(&mut toasts);

    let team_id = directory.resolve(team).map(|t| t.id);
    let mut form = EntryForm::new(directory);

    let typed = form.set_code(code);
    if typed != code {
        eprintln!("Code entered as {:?}", typed);
    }
    match team_id {
        Some(id) => form.select_team(id)?,
        None => eprintln!("Unknown team: {}", team),
    }

    let outcome = form.submit(backend, &mut toasts).await;

    match format {
        OutputFormat::Json => {
            toasts.drain();
            let body = match &outcome {
                SubmitOutcome::Succeeded(entry) => serde_json::json!({
                    "status": "succeeded",
                    "entry": entry,
                }),
                SubmitOutcome::Failed(e) => serde_json::json!({
                    "status": "failed",
                    "reason": e.reason(),
                    "message": e.to_string(),
                }),
            };
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        OutputFormat::Table => {
            flush_toasts(&mut toasts);
        }
    }
    Ok(outcome.is_success())
}

async fn show_feed(
    backend: &dyn Backend,
    query: FeedQuery,
    format: OutputFormat,
    color: bool,
) -> anyhow::Result<bool> {
    let mut toasts = Toasts::new();
    let state = FeedState::load(backend, query, &mut toasts).await;
    let failed = flush_toasts(&mut toasts);

    match format {
        OutputFormat::Json if !failed => {
            println!("{}", serde_json::to_string_pretty(state.rows())?)
        }
        _ => println!("{}", render::feed_view(&state, color)),
    }
    Ok(!failed)
}

const SHELL_HELP: &str = "\
Commands:
  feed              switch to the Feed tab
  entry             switch to the Entry tab
  code <input>      type a treasure code
  team <id|name>    select your team
  submit            submit the entry
  show              redraw the current tab
  help              show this help
  quit              leave";

enum Flow {
    Continue,
    Quit,
}

async fn run_shell(backend: Arc<dyn Backend>, query: FeedQuery, color: bool) -> anyhow::Result<()> {
    let mut shell = TabShell::new(backend, query);
    shell.start();

    println!("RunHNT  (type `help` for commands)");
    show_active(&shell, color);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            settled = shell.settle(), if shell.is_loading() => {
                if settled {
                    show_active(&shell, color);
                }
                flush_toasts(shell.toasts_mut());
            }
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if let Flow::Quit = handle_command(&mut shell, line.trim(), color).await {
                    break;
                }
                flush_toasts(shell.toasts_mut());
            }
        }
    }

    Ok(())
}

async fn handle_command(shell: &mut TabShell, line: &str, color: bool) -> Flow {
    let (command, arg) = match line.split_once(char::is_whitespace) {
        Some((command, arg)) => (command, arg.trim()),
        None => (line, ""),
    };

    match command {
        "" => {}
        "help" | "?" => println!("{}", SHELL_HELP),
        "quit" | "exit" => return Flow::Quit,
        "show" => show_active(shell, color),
        "feed" | "entry" => {
            if let Ok(tab) = command.parse::<Tab>() {
                if shell.switch_to(tab) {
                    show_active(shell, color);
                }
            }
        }
        "code" | "team" | "submit" if shell.active() != Tab::Entry => {
            println!("Switch to the Entry tab first (`entry`)");
        }
        "code" => {
            shell.entry_mut().set_code(arg);
            show_active(shell, color);
        }
        "team" => {
            let team_id = shell.entry().directory().resolve(arg).map(|t| t.id);
            match team_id.map(|id| shell.entry_mut().select_team(id)) {
                Some(Ok(())) => show_active(shell, color),
                _ => println!("Unknown team: {}", arg),
            }
        }
        "submit" => {
            if shell.entry().can_submit() {
                shell.submit().await;
                show_active(shell, color);
            } else {
                println!("Submit is disabled until a code and a team are set");
            }
        }
        other => println!("Unknown command: {} (type `help`)", other),
    }
    Flow::Continue
}

fn show_active(shell: &TabShell, color: bool) {
    println!();
    println!("{}", render::tab_bar(shell.active()));
    println!();
    match shell.active() {
        Tab::Entry if shell.is_loading() => println!("Loading teams..."),
        Tab::Entry => println!("{}", render::entry_view(shell.entry())),
        Tab::Feed => println!("{}", render::feed_view(shell.feed(), color)),
    }
}
