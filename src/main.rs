use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use curlhop::capabilities::{Clipboard, DirectorySaver, TerminalClipboard};
use curlhop::config::{load_config, Settings, SettingsBuilder};
use curlhop::interactive::run_interactive;
use curlhop::interpreter::{to_curl_command, CurlDescriptor};
use curlhop::logging::init_logging;
use curlhop::orchestrator::Orchestrator;
use curlhop::printer::{print_history, print_logs, print_outcome, print_request, print_services};
use curlhop::request::is_origin;
use curlhop::response::ResponseOutcome;
use curlhop::store::{normalize_origin, JsonFileStore};
use curlhop::transport::ReqwestTransport;

#[derive(Parser, Debug)]
#[command(
    name = "curlhop",
    version,
    about = "Replay pasted curl commands against any service and pull their server logs",
    disable_help_subcommand = true
)]
struct Cli {
    /// Directory or file containing curlhop.json
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override env file relative to config directory
    #[arg(short, long, global = true)]
    env: Option<PathBuf>,

    /// State file keeping services, history and the last request id
    #[arg(long, global = true)]
    state: Option<PathBuf>,

    /// Directory to save downloaded attachments
    #[arg(long = "download-dir", short = 'O', global = true)]
    download_dir: Option<PathBuf>,

    /// Override base directory used for resolving paths
    #[arg(long, global = true)]
    cwd: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args, Debug)]
struct CurlSource {
    /// Read the curl command from a file instead of stdin
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Send the request to this origin instead of the one in the command
    #[arg(short, long)]
    origin: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Execute a curl command and print the response
    Run(CurlSource),
    /// Show the request a curl command resolves to without sending it
    Inspect(CurlSource),
    /// Fetch server logs for a request id (defaults to the last response)
    Logs {
        #[arg(value_name = "REQUEST_ID")]
        request_id: Option<String>,
    },
    /// Manage known service origins
    Services {
        #[command(subcommand)]
        action: ServiceAction,
    },
    /// Browse and replay previously pasted commands
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },
}

#[derive(Subcommand, Debug)]
enum ServiceAction {
    /// List services; the active one is marked with *
    List,
    /// Register an origin and make it active
    Add { origin: String },
    /// Forget an origin
    Remove { origin: String },
    /// Make an origin the active one
    Use { origin: String },
    /// Send requests to the origin found in each curl command
    Clear,
}

#[derive(Subcommand, Debug)]
enum HistoryAction {
    /// List remembered commands, most recent first
    List,
    /// Execute a remembered command again
    Run {
        #[arg(value_name = "INDEX")]
        index: usize,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    let base_dir = cli
        .cwd
        .as_ref()
        .map(|p| resolve_path(Path::new(p)))
        .transpose()?
        .unwrap_or(std::env::current_dir()?);

    let config_target = cli
        .config
        .as_ref()
        .map(|p| resolve_relative(&base_dir, p))
        .unwrap_or_else(|| base_dir.clone());

    let cfg = load_config(&config_target).context("loading configuration")?;
    let config_dir = cfg.as_ref().map(|c| c.dir.clone()).unwrap_or_else(|| {
        if config_target.is_dir() {
            config_target.clone()
        } else {
            config_target
                .parent()
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| config_target.clone())
        }
    });

    let settings = SettingsBuilder::new(base_dir.clone(), config_dir.clone(), cfg)
        .env_file(cli.env.as_ref().map(|p| resolve_relative(&config_dir, p)))
        .state_file(cli.state.as_ref().map(|p| resolve_relative(&base_dir, p)))
        .download_dir(cli.download_dir.as_ref().map(|p| resolve_relative(&base_dir, p)))
        .build()?;
    debug!(state = %settings.state_path.display(), "settings resolved");

    let orchestrator = build_orchestrator(&settings)?;
    let clipboard = TerminalClipboard;

    match cli.command {
        None => {
            run_interactive(&orchestrator, &clipboard).await?;
            Ok(ExitCode::SUCCESS)
        }
        Some(Commands::Run(source)) => {
            let text = read_curl(&source, &base_dir, &clipboard)?;
            run_curl(&orchestrator, &text, source.origin.as_deref()).await
        }
        Some(Commands::Inspect(source)) => {
            let text = read_curl(&source, &base_dir, &clipboard)?;
            let request = orchestrator.prepare(&text, source.origin.as_deref())?;
            print_request(&request);
            println!();
            clipboard.write_text(&to_curl_command(&CurlDescriptor::from(&request)))?;
            Ok(ExitCode::SUCCESS)
        }
        Some(Commands::Logs { request_id }) => {
            let id = request_id
                .or_else(|| orchestrator.last_request_id())
                .ok_or_else(|| anyhow!("no request id given and no previous response recorded"))?;
            let logs = orchestrator.fetch_logs(&id).await?;
            print_logs(&logs);
            Ok(ExitCode::SUCCESS)
        }
        Some(Commands::Services { action }) => {
            handle_services(&orchestrator, action)?;
            Ok(ExitCode::SUCCESS)
        }
        Some(Commands::History { action }) => match action {
            HistoryAction::List => {
                print_history(&orchestrator.history().entries());
                Ok(ExitCode::SUCCESS)
            }
            HistoryAction::Run { index } => {
                let entry = orchestrator
                    .history()
                    .get(index)
                    .ok_or_else(|| anyhow!("no history entry at index {index}"))?;
                run_curl(&orchestrator, &entry.curl, None).await
            }
        },
    }
}

fn build_orchestrator(settings: &Settings) -> Result<Orchestrator> {
    let store = Arc::new(JsonFileStore::open(&settings.state_path)?);
    let orchestrator = Orchestrator::new(
        Arc::new(ReqwestTransport::new(settings.timeout)?),
        store,
        Arc::new(DirectorySaver::new(settings.download_dir.clone())),
    )
    .with_header_rules(settings.header_rules.clone())
    .with_log_service(settings.log_service.clone())
    .with_history_limit(settings.history_limit);

    orchestrator.services().seed(&settings.services)?;
    Ok(orchestrator)
}

fn read_curl(source: &CurlSource, base_dir: &Path, clipboard: &dyn Clipboard) -> Result<String> {
    let text = match &source.file {
        Some(path) => {
            let path = resolve_relative(base_dir, path);
            std::fs::read_to_string(&path)
                .with_context(|| format!("reading curl command from {}", path.display()))?
        }
        None => clipboard.read_text()?,
    };
    if text.trim().is_empty() {
        bail!("no curl command given");
    }
    Ok(text)
}

async fn run_curl(orchestrator: &Orchestrator, text: &str, origin: Option<&str>) -> Result<ExitCode> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message("executing request");
    spinner.enable_steady_tick(Duration::from_millis(80));

    let result = orchestrator.submit(text, origin).await;
    spinner.finish_and_clear();

    if let Some(request) = orchestrator.snapshot().request {
        print_request(&request);
        println!();
    }
    let outcome = result?;
    print_outcome(&outcome);

    Ok(match outcome {
        ResponseOutcome::Success { .. } => ExitCode::SUCCESS,
        ResponseOutcome::Failure { .. } => ExitCode::FAILURE,
    })
}

fn handle_services(orchestrator: &Orchestrator, action: ServiceAction) -> Result<()> {
    let registry = orchestrator.services();
    match action {
        ServiceAction::List => {}
        ServiceAction::Add { origin } | ServiceAction::Use { origin } => {
            let origin = normalize_origin(&origin);
            if !is_origin(&origin) {
                bail!("{origin} is not an origin (expected scheme://host[:port])");
            }
            registry.append_if_absent(&origin)?;
            registry.set_active(Some(&origin))?;
        }
        ServiceAction::Remove { origin } => {
            if !registry.remove(&origin)? {
                bail!("{} is not a registered service", normalize_origin(&origin));
            }
        }
        ServiceAction::Clear => registry.set_active(None)?,
    }
    print_services(&registry.list(), registry.active().as_deref());
    Ok(())
}

fn resolve_path(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

fn resolve_relative(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
