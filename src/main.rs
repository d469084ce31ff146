//! agentflow - agent network layout and live activity tracking
//!
//! Command-line front end for the `agentflow` library: lay out connectivity
//! lists, talk to an agent server and replay recorded chunk streams.

use agentflow::chat::transport::HttpTransportConfig;
use agentflow::chat::{Alert, AlertSeverity, HttpChatTransport, OutputSink, StreamingQueryExecutor};
use agentflow::config::{Config, ConfigManager};
use agentflow::graph::{parse_connectivity, ConnectivityEntry};
use agentflow::layout::{render_network, HighlightState, LayoutMode, LayoutSettings};
use agentflow::session::ChatSession;
use agentflow::tracking::ConversationTracker;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// agentflow - agent network layout and activity CLI
#[derive(Parser)]
#[command(name = "agentflow")]
#[command(about = "Lay out agent networks and follow which agents are active")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(short, long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands
#[derive(Subcommand)]
enum Commands {
    /// Lay out a connectivity list read from a file ("-" for stdin)
    Layout {
        input: String,

        /// Layout engine (radial or linear); defaults to the configured mode
        #[arg(short, long)]
        mode: Option<LayoutMode>,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// List the agent networks the server hosts
    Networks,

    /// Fetch a network's connectivity from the server and lay it out
    Connectivity {
        /// Agent network name
        agent: String,

        #[arg(short, long)]
        mode: Option<LayoutMode>,

        #[arg(long)]
        pretty: bool,
    },

    /// Send one query to an agent network (Ctrl-C cancels)
    Chat {
        /// Agent network name
        agent: String,

        /// The query text
        query: String,

        /// Identity to send instead of the configured user
        #[arg(short, long)]
        user: Option<String>,
    },

    /// Feed recorded chunks (one per line) through the conversation tracker
    Replay { file: PathBuf },

    /// Show or reset the configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,

        /// Reset to default configuration
        #[arg(long)]
        reset: bool,
    },
}

/// Prints agent output and alerts to the terminal
struct ConsoleSink;

impl OutputSink for ConsoleSink {
    fn on_alert(&self, alert: Alert) {
        let label = match alert.severity {
            AlertSeverity::Info => "info:".blue().bold(),
            AlertSeverity::Warning => "warning:".yellow().bold(),
            AlertSeverity::Error => "error:".red().bold(),
        };
        eprintln!("{} {}", label, alert.message);
    }

    fn on_agent_message(&self, agent: &str, text: &str) {
        println!("{} {}", format!("[{}]", agent).cyan().bold(), text);
    }
}

fn init_logging(level: &str) {
    let log_level = match level.to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .init();
}

fn read_input(input: &str) -> Result<String> {
    if input == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read connectivity list from stdin")?;
        Ok(buffer)
    } else {
        std::fs::read_to_string(input).with_context(|| format!("Failed to read {}", input))
    }
}

fn print_layout(config: &Config, entries: &[ConnectivityEntry], mode: Option<LayoutMode>, pretty: bool) -> Result<()> {
    let mode = mode.unwrap_or(config.layout.default_mode);
    let settings = LayoutSettings::from(&config.layout);
    let output = render_network(mode, &settings, entries, &HighlightState::default(), pretty)?;
    info!("Rendered {} layout of {} agents", mode, entries.len());
    println!("{}", output);
    Ok(())
}

/// Token that fires on Ctrl-C
fn ctrl_c_token() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            trigger.cancel();
        }
    });
    token
}

async fn run_chat(config: &Config, agent: String, query: String, user: Option<String>) -> Result<()> {
    let transport = HttpChatTransport::new(HttpTransportConfig::from(&config.chat))?;
    let executor = StreamingQueryExecutor::new(Arc::new(transport), Arc::new(ConsoleSink))
        .with_max_retries(config.chat.max_retries);
    let identity = user.unwrap_or_else(|| config.chat.user.clone());
    let mut session = ChatSession::new(executor, identity, agent);

    let mut reader = session.subscribe();
    tokio::spawn(async move {
        while reader.changed().await {
            let highlight = reader.get();
            debug!(
                "Active agents: {:?}, counters: {:?}",
                highlight.active_agents, highlight.counters
            );
        }
    });

    println!("{} {}", "Contacting".bold(), session.target());
    let cancel = ctrl_c_token();
    let outcome = session.send(&cancel, &query).await;

    if outcome.aborted {
        eprintln!("{}", "Request cancelled".yellow());
    } else {
        info!("Query finished after {} attempt(s): {}", outcome.attempts, outcome.state);
    }
    Ok(())
}

fn run_replay(file: &Path) -> Result<()> {
    let content = std::fs::read_to_string(file).with_context(|| format!("Failed to read {}", file.display()))?;
    let mut tracker = ConversationTracker::new();

    for (index, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let accepted = tracker.process_chunk(line);
        let step = serde_json::json!({
            "chunk": index + 1,
            "accepted": accepted,
            "conversations": tracker.conversations(),
            "counters": tracker.counters(),
        });
        println!("{}", step);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut manager = ConfigManager::new(cli.config.clone())?;
    let log_level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| manager.config().general.log_level.clone());
    init_logging(&log_level);
    debug!("Using configuration at {}", manager.config_path().display());

    match cli.command {
        Commands::Layout { input, mode, pretty } => {
            let entries = parse_connectivity(&read_input(&input)?)?;
            print_layout(manager.config(), &entries, mode, pretty)?
        }
        Commands::Networks => {
            let config = manager.config();
            let transport = HttpChatTransport::new(HttpTransportConfig::from(&config.chat))?;
            let networks = transport.list_networks(&ctrl_c_token(), &config.chat.user).await?;
            if networks.is_empty() {
                println!("{}", "No agent networks available".yellow());
            }
            for network in networks {
                println!("{}", network);
            }
        }
        Commands::Connectivity { agent, mode, pretty } => {
            let config = manager.config();
            let transport = HttpChatTransport::new(HttpTransportConfig::from(&config.chat))?;
            let entries = transport
                .fetch_connectivity(&ctrl_c_token(), &config.chat.user, &agent)
                .await?;
            print_layout(config, &entries, mode, pretty)?
        }
        Commands::Chat { agent, query, user } => run_chat(manager.config(), agent, query, user).await?,
        Commands::Replay { file } => run_replay(&file)?,
        Commands::Config { show, reset } => {
            if reset {
                manager.reset_to_default();
                manager.save()?;
                println!("Configuration reset to defaults at {}", manager.config_path().display());
            }
            if show || !reset {
                print!("{}", manager.to_toml()?);
            }
        }
    }

    Ok(())
}
