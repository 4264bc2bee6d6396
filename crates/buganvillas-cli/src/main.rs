//! Buganvillas admin CLI - a terminal front-end for the condominium
//! administration console.
//!
//! It signs an administrator in, keeps the session on disk, and runs
//! authenticated calls against the backend's resources. Navigation intents
//! returned by the core are printed instead of followed.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use buganvillas_core::api::{Payload, Resource};
use buganvillas_core::auth::ViewGate;
use buganvillas_core::models::Credentials;
use buganvillas_core::{
    AuthError, AuthGateway, AuthProvider, Config, GuardDecision, NavigationIntent,
    ResourceClient, Route, RouteGuard, SessionStore,
};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "buganvillas", about = "Condominio Buganvillas administration console")]
struct Cli {
    /// Backend base URL (overrides config and BUGANVILLAS_API_URL)
    #[arg(long)]
    api_url: Option<String>,

    /// Directory holding the session (overrides config and BUGANVILLAS_DATA_DIR)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Also write logs to this file
    #[arg(long)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in as an administrator
    Login {
        #[arg(long)]
        email: Option<String>,
        /// Prompted for when omitted
        #[arg(long)]
        password: Option<String>,
    },
    /// Sign out and discard the local session
    Logout,
    /// Show the current session
    Status,
    /// Show what the route guard decides for a page
    Route { path: String },
    #[command(flatten)]
    Resource(ResourceCommand),
}

/// Commands that need a signed-in session
#[derive(Subcommand, Debug)]
enum ResourceCommand {
    /// List a resource collection
    List { resource: Resource },
    /// Fetch one item of a resource
    Get { resource: Resource, id: String },
    /// Create an item from a JSON document
    Create {
        resource: Resource,
        #[arg(long)]
        data: String,
    },
    /// Replace an item with a JSON document
    Update {
        resource: Resource,
        id: String,
        #[arg(long)]
        data: String,
    },
    /// Delete an item
    Delete { resource: Resource, id: String },
    /// Mark a security alert as reviewed
    ReviewAlert { id: i64 },
}

/// Initialize the tracing subscriber for logging
fn init_tracing(log_file: Option<&PathBuf>) -> Result<Option<WorkerGuard>> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let stderr_layer = fmt::layer().with_writer(io::stderr);

    let Some(path) = log_file else {
        tracing_subscriber::registry()
            .with(stderr_layer)
            .with(filter)
            .init();
        return Ok(None);
    };

    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    let file_name = path
        .file_name()
        .context("Log file path has no file name")?;
    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(
        dir, file_name,
    ));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(fmt::layer().with_ansi(false).with_writer(writer))
        .with(filter)
        .init();
    Ok(Some(guard))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let _log_guard = init_tracing(cli.log_file.as_ref())?;

    let mut config = Config::load().context("Failed to load configuration")?;
    if let Some(url) = cli.api_url {
        config.api_base_url = url;
    }
    if let Some(dir) = cli.data_dir {
        config.data_dir = Some(dir);
    }

    let store = Arc::new(SessionStore::file(config.data_dir()?));
    let gateway = Arc::new(AuthGateway::from_config(&config, store.clone())?);
    let provider = AuthProvider::new(gateway.clone());
    info!(api = config.base_url(), "Buganvillas console ready");

    match cli.command {
        Command::Login { email, password } => login(&provider, &mut config, email, password).await,
        Command::Logout => {
            let navigation = provider.logout().await;
            println!("Session closed.");
            report_navigation(&navigation);
            Ok(())
        }
        Command::Status => {
            status(&provider, &store);
            Ok(())
        }
        Command::Route { path } => {
            let guard = RouteGuard::new(config.routes.clone());
            match guard.check(&path, store.cookie_header().as_deref()) {
                GuardDecision::Allow => println!("{} -> allowed", path),
                GuardDecision::Redirect(route) => println!("{} -> redirect to {}", path, route),
            }
            Ok(())
        }
        Command::Resource(command) => {
            if let ViewGate::RedirectTo(route) = provider.state().view_gate() {
                anyhow::bail!("Not signed in; go to {} (run `buganvillas login`)", route);
            }
            let client = ResourceClient::new(gateway);
            let result = run_resource_command(&client, command).await;
            print_result(result)
        }
    }
}

async fn login(
    provider: &AuthProvider,
    config: &mut Config,
    email: Option<String>,
    password: Option<String>,
) -> Result<()> {
    let email = match email.or_else(|| config.last_email.clone()) {
        Some(email) => email,
        None => prompt("Email: ")?,
    };
    let password = match password {
        Some(password) => password,
        None => rpassword::prompt_password("Password: ").context("Failed to read password")?,
    };

    let credentials = Credentials::new(email.trim(), password);
    match provider.login(&credentials).await {
        Ok(user) => {
            println!("Signed in as {} <{}>", user.full_name(), user.email);
            if config.last_email.as_deref() != Some(credentials.email.as_str()) {
                config.last_email = Some(credentials.email.clone());
                if let Err(e) = config.save() {
                    warn!(error = %e, "Failed to remember email");
                }
            }
            let landing = Route::from_path(&config.routes.landing);
            report_navigation(&NavigationIntent::RedirectTo(landing));
            Ok(())
        }
        Err(e) => {
            report_navigation(&e.navigation());
            Err(anyhow::anyhow!(e.user_message()))
        }
    }
}

fn status(provider: &AuthProvider, store: &SessionStore) {
    let state = provider.state();
    match state.user {
        Some(ref user) => {
            println!("Signed in as {} <{}>", user.full_name(), user.email);
            if let Some(role) = user.role() {
                println!("Role: {}", role);
            }
            if let Some(condominio) = user.condominio_name() {
                println!("Condominio: {}", condominio);
            }
            println!("Route cookie: {}", cookie_status(store));
        }
        None => println!("Not signed in."),
    }
}

/// The jar cannot tell a missing cookie from an expired one
fn cookie_status(store: &SessionStore) -> &'static str {
    if store.cookie_header().is_some() {
        "present"
    } else {
        "absent or expired"
    }
}

async fn run_resource_command(
    client: &ResourceClient,
    command: ResourceCommand,
) -> Result<Payload, CommandError> {
    let payload = match command {
        ResourceCommand::List { resource } => client.list(resource).await?,
        ResourceCommand::Get { resource, id } => client.get(resource, &id).await?,
        ResourceCommand::Create { resource, data } => {
            client.create(resource, parse_json(&data)?).await?
        }
        ResourceCommand::Update { resource, id, data } => {
            client.update(resource, &id, parse_json(&data)?).await?
        }
        ResourceCommand::Delete { resource, id } => client.delete(resource, &id).await?,
        ResourceCommand::ReviewAlert { id } => client.mark_alert_reviewed(id).await?,
    };
    Ok(payload)
}

#[derive(Debug)]
enum CommandError {
    Auth(AuthError),
    InvalidJson(serde_json::Error),
}

impl From<AuthError> for CommandError {
    fn from(e: AuthError) -> Self {
        CommandError::Auth(e)
    }
}

fn parse_json(data: &str) -> Result<serde_json::Value, CommandError> {
    serde_json::from_str(data).map_err(CommandError::InvalidJson)
}

fn print_result(result: Result<Payload, CommandError>) -> Result<()> {
    match result {
        Ok(Payload::Json(value)) => {
            println!("{}", serde_json::to_string_pretty(&value)?);
            Ok(())
        }
        Ok(Payload::Text(text)) => {
            if !text.is_empty() {
                println!("{}", text);
            }
            Ok(())
        }
        Err(CommandError::Auth(e)) => {
            report_navigation(&e.navigation());
            Err(anyhow::anyhow!(e.user_message()))
        }
        Err(CommandError::InvalidJson(e)) => Err(anyhow::anyhow!("Invalid --data JSON: {}", e)),
    }
}

fn report_navigation(navigation: &NavigationIntent) {
    if let Some(route) = navigation.redirect_target() {
        eprintln!("-> {}", route);
    }
}

fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}
