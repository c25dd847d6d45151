use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crmlens::cli::{self, OutputFormat, PresentOptions};
use crmlens::config::{self, ViewMode};

#[derive(Debug, Parser)]
#[command(name = "crmlens")]
#[command(about = "Visualize CRM API responses as charts, insights and raw JSON")]
struct App {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Log in and save the access token
    Login {
        #[arg(long, short)]
        username: Option<String>,
        /// Read from stdin when omitted
        #[arg(long, short)]
        password: Option<String>,
    },
    /// Show the saved token and its expiry
    Token,
    /// Call an endpoint (alias or path) and render the response
    Call {
        /// Endpoint alias (see `crmlens endpoints`) or path such as /api/leads/
        endpoint: String,
        /// Value for endpoints with an {id} placeholder
        #[arg(long)]
        id: Option<String>,
        /// View mode: chart, scene (3d), json
        #[arg(long)]
        view: Option<String>,
        /// Output format: table (default), json
        #[arg(long, default_value = "table")]
        format: String,
        /// Write the response body to this file
        #[arg(long)]
        export: Option<PathBuf>,
    },
    /// Render a payload saved in a JSON file, without calling the API
    Render {
        file: PathBuf,
        #[arg(long)]
        view: Option<String>,
        #[arg(long, default_value = "table")]
        format: String,
        #[arg(long)]
        export: Option<PathBuf>,
    },
    /// List known endpoints
    Endpoints {
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Probe the API health endpoint on an interval
    Watch {
        /// Seconds between probes (default: [health] interval_secs)
        #[arg(long)]
        interval: Option<u64>,
        /// Stop after this many probes
        #[arg(long)]
        count: Option<usize>,
    },
    /// Start the web dashboard
    Web {
        /// Listen address (default: [web] addr)
        #[arg(long)]
        addr: Option<String>,
        /// Do not open a browser
        #[arg(long)]
        no_open: bool,
    },
    /// Show recent API calls
    History {
        #[arg(long, default_value = "20")]
        limit: usize,
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Show the effective merged configuration
    Show,
    /// Write the default config to ~/.crmlens/config.toml
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Set a value, e.g. `crmlens config set api.base_url https://crm.example.com`
    Set { key: String, value: String },
    /// Reset the global config file to defaults
    Reset,
}

fn parse_view(view: Option<&str>) -> Result<Option<ViewMode>> {
    view.map(|v| config::parse_view_mode(v).with_context(|| format!("unknown view mode: {v}")))
        .transpose()
}

fn main() -> Result<()> {
    let app = App::parse();
    let config = config::load();

    match app.command {
        Commands::Login { username, password } => cli::run_login(&config, username, password),
        Commands::Token => cli::run_token(&config),
        Commands::Call {
            endpoint,
            id,
            view,
            format,
            export,
        } => {
            let options = PresentOptions {
                view: parse_view(view.as_deref())?,
                format: OutputFormat::from_str_opt(Some(&format)),
                export: export.as_deref(),
            };
            cli::run_call(&config, &endpoint, id.as_deref(), options)
        }
        Commands::Render {
            file,
            view,
            format,
            export,
        } => {
            let options = PresentOptions {
                view: parse_view(view.as_deref())?,
                format: OutputFormat::from_str_opt(Some(&format)),
                export: export.as_deref(),
            };
            cli::run_render(&config, &file, options)
        }
        Commands::Endpoints { format } => {
            cli::run_endpoints(OutputFormat::from_str_opt(Some(&format)))
        }
        Commands::Watch { interval, count } => cli::run_watch(&config, interval, count),
        Commands::Web { addr, no_open } => {
            let addr = addr.unwrap_or_else(|| config.web.addr.clone());
            crmlens::web::serve(&config, &addr, !no_open)
        }
        Commands::History { limit, format } => {
            cli::run_history(&config, limit, OutputFormat::from_str_opt(Some(&format)))
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => cli::run_config_show(),
            ConfigAction::Init { force } => cli::run_config_init(force),
            ConfigAction::Set { key, value } => cli::run_config_set(&key, &value),
            ConfigAction::Reset => cli::run_config_reset(),
        },
    }
}
