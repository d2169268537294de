mod config;
mod demo;
mod validation;

use agentbay_sdk::{
    AgentBay, CreateSessionParams, DEFAULT_CODE_TIMEOUT_S, DEFAULT_COMMAND_TIMEOUT_MS,
    DEFAULT_MAX_RESULTS, ListSessionParams,
};
use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{ApiKeySource, Config, EnvOverrides, Settings};
use crate::validation::{labels_from_args, parse_label, validate_session_id};

#[derive(Parser)]
#[command(name = "agentbay")]
#[command(about = "Create AgentBay sandbox sessions and run code and commands in them")]
#[command(version)]
struct Cli {
    /// Path to a config.toml (default: <config dir>/agentbay/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// API key (overrides AGENTBAY_API_KEY and the config file)
    #[arg(long, global = true)]
    api_key: Option<String>,
    /// Service endpoint (overrides AGENTBAY_ENDPOINT and the config file)
    #[arg(long, global = true)]
    endpoint: Option<String>,
    /// Log requests to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a session, run Python, JavaScript and a shell command, then delete it
    Demo {
        /// Image to boot (defaults to the config file's image, then code_latest)
        #[arg(long)]
        image: Option<String>,
    },
    /// Create a new session
    Create {
        /// Image to boot
        #[arg(long)]
        image: Option<String>,
        /// Label to attach, as KEY=VALUE (repeatable)
        #[arg(short, long = "label", value_parser = parse_label)]
        labels: Vec<(String, String)>,
        /// Tool policy id
        #[arg(long)]
        policy: Option<String>,
    },
    /// Delete a session
    Delete {
        /// Session id
        session_id: String,
    },
    /// Show session resource info
    Info {
        /// Session id
        session_id: String,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Get an access link for a session
    Link {
        /// Session id
        session_id: String,
        /// Protocol type, e.g. https (service default if omitted)
        #[arg(long)]
        protocol: Option<String>,
        /// Port (service default if omitted)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Run code in a session
    RunCode {
        /// Session id
        session_id: String,
        /// Source code to run
        code: String,
        /// Language: python or javascript
        #[arg(short, long, default_value = "python")]
        language: String,
        /// Timeout in seconds
        #[arg(long, default_value_t = DEFAULT_CODE_TIMEOUT_S)]
        timeout: u64,
    },
    /// Run a shell command in a session
    Exec {
        /// Session id
        session_id: String,
        /// Timeout in milliseconds
        #[arg(long, default_value_t = DEFAULT_COMMAND_TIMEOUT_MS)]
        timeout_ms: u64,
        /// Command to run
        #[arg(trailing_var_arg = true, required = true)]
        command: Vec<String>,
    },
    /// Read or replace session labels
    Labels {
        #[command(subcommand)]
        command: LabelsCommand,
    },
    /// List sessions on the service, optionally filtered by labels
    List {
        /// Label filter, as KEY=VALUE (repeatable)
        #[arg(short, long = "label", value_parser = parse_label)]
        labels: Vec<(String, String)>,
        /// Page size
        #[arg(long, default_value_t = DEFAULT_MAX_RESULTS)]
        max_results: u32,
        /// Token from a previous page
        #[arg(long)]
        next_token: Option<String>,
    },
}

#[derive(Subcommand)]
enum LabelsCommand {
    /// Show a session's labels
    Get {
        /// Session id
        session_id: String,
    },
    /// Replace a session's labels
    Set {
        /// Session id
        session_id: String,
        /// Labels as KEY=VALUE
        #[arg(value_parser = parse_label, required = true)]
        labels: Vec<(String, String)>,
    },
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = Config::load(cli.config.as_deref())?;
    let settings = Settings::resolve(cli.api_key, cli.endpoint, EnvOverrides::from_env(), &config);
    if settings.api_key_source == ApiKeySource::Placeholder {
        println!(
            "Warning: Using default API key. Set AGENTBAY_API_KEY environment variable for production use."
        );
    }
    tracing::debug!(source = ?settings.api_key_source, endpoint = ?settings.endpoint, "resolved settings");

    let client = settings.client()?;

    match cli.command {
        Commands::Demo { image } => {
            let image = image.unwrap_or_else(|| settings.image_id.clone());
            demo::run(&client, &image).await;
        }
        Commands::Create {
            image,
            labels,
            policy,
        } => {
            let mut params = CreateSessionParams::new()
                .with_image_id(image.unwrap_or_else(|| settings.image_id.clone()));
            if !labels.is_empty() {
                params = params.with_labels(labels_from_args(labels));
            }
            if let Some(policy) = policy {
                params = params.with_policy_id(policy);
            }

            let created = client.create(params).await?;
            println!("Session created with ID: {}", created.data.session_id());
            if !created.data.resource_url().is_empty() {
                println!("Resource URL: {}", created.data.resource_url());
            }
            println!("Request ID: {}", created.request_id);
        }
        Commands::Delete { session_id } => {
            let session = attach(&client, &session_id)?;
            let deleted = session.delete().await?;
            if !deleted.data.success {
                bail!(
                    "Failed to delete session {}: {} (Request ID: {})",
                    session_id,
                    deleted.data.error_message.unwrap_or_default(),
                    deleted.request_id
                );
            }
            println!("Session {} deleted", session_id);
            println!("Request ID: {}", deleted.request_id);
        }
        Commands::Info { session_id, json } => {
            let session = attach(&client, &session_id)?;
            let info = session.info().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&info.data)?);
            } else {
                let i = &info.data;
                println!("{:<22} {}", "Session ID:", i.session_id);
                println!("{:<22} {}", "Resource URL:", i.resource_url);
                println!("{:<22} {}", "App ID:", i.app_id);
                println!("{:<22} {}", "Auth code:", i.auth_code);
                println!("{:<22} {}", "Connection properties:", i.connection_properties);
                println!("{:<22} {}", "Resource ID:", i.resource_id);
                println!("{:<22} {}", "Resource type:", i.resource_type);
                println!("{:<22} {}", "Ticket:", i.ticket);
            }
            println!("Request ID: {}", info.request_id);
        }
        Commands::Link {
            session_id,
            protocol,
            port,
        } => {
            let session = attach(&client, &session_id)?;
            let link = session.get_link(protocol.as_deref(), port).await?;
            println!("{}", link.data);
            println!("Request ID: {}", link.request_id);
        }
        Commands::RunCode {
            session_id,
            code,
            language,
            timeout,
        } => {
            let session = attach(&client, &session_id)?;
            let result = session.code().run_code(&code, &language, timeout).await?;
            print!("{}", result.data.output);
            println!("Request ID: {}", result.request_id);
        }
        Commands::Exec {
            session_id,
            timeout_ms,
            command,
        } => {
            let session = attach(&client, &session_id)?;
            let result = session
                .command()
                .execute_command(&command.join(" "), timeout_ms)
                .await?;
            print!("{}", result.data.output);
            println!("Request ID: {}", result.request_id);
        }
        Commands::Labels { command } => match command {
            LabelsCommand::Get { session_id } => {
                let session = attach(&client, &session_id)?;
                let result = session.get_labels().await?;
                let mut labels: Vec<_> = result.data.into_iter().collect();
                labels.sort();
                if labels.is_empty() {
                    println!("No labels set.");
                }
                for (key, value) in labels {
                    println!("{}={}", key, value);
                }
                println!("Request ID: {}", result.request_id);
            }
            LabelsCommand::Set { session_id, labels } => {
                let session = attach(&client, &session_id)?;
                let result = session.set_labels(&labels_from_args(labels)).await?;
                println!("Labels updated");
                println!("Request ID: {}", result.request_id);
            }
        },
        Commands::List {
            labels,
            max_results,
            next_token,
        } => {
            let mut params = ListSessionParams::new()
                .with_labels(labels_from_args(labels))
                .with_max_results(max_results);
            if let Some(token) = next_token {
                params = params.with_next_token(token);
            }

            let list = client.list_by_labels(params).await?;
            if list.sessions.is_empty() {
                println!("No sessions found.");
            } else {
                println!("{:<40} {}", "SESSION ID", "RESOURCE URL");
                for session in &list.sessions {
                    println!("{:<40} {}", session.session_id(), session.resource_url());
                }
            }
            if let Some(total) = list.total_count {
                println!("\nTotal: {}", total);
            }
            if let Some(token) = list.next_token {
                println!("Next page: --next-token {}", token);
            }
            if let Some(request_id) = list.request_id {
                println!("Request ID: {}", request_id);
            }
        }
    }

    Ok(())
}

fn attach(client: &AgentBay, session_id: &str) -> Result<agentbay_sdk::Session> {
    validate_session_id(session_id)?;
    Ok(client.attach(session_id))
}
