use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use eco_save::{
    api::{self, AppState},
    config::Config,
    pipeline::SavingsRequest,
    savings::InvoiceInput,
    telemetry,
};
use tracing::{info, warn};

/// Invoice used when none is given, taken from a typical monthly bill
const DEFAULT_INVOICE_KWH: &str = "350.0";
const DEFAULT_INVOICE_COST: &str = "110.25";

#[derive(Parser)]
#[command(name = "eco-save")]
#[command(about = "Household consumption forecasting, anomaly detection and savings projection", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyse a meter feed and print the JSON report
    Analyze {
        /// Meter feed (defaults to data.path from the config)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Write the report here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Monthly invoice consumption (kWh) for the savings projections
        #[arg(long, requires = "cost")]
        kwh: Option<f64>,

        /// Monthly invoice amount
        #[arg(long, requires = "kwh")]
        cost: Option<f64>,

        /// Reduction to project, in percent
        #[arg(short, long, requires = "kwh", value_parser = clap::value_parser!(u32).range(1..=50))]
        percentage: Option<u32>,

        /// Comma-separated saving action ids
        #[arg(short, long, requires = "kwh", value_delimiter = ',')]
        actions: Vec<String>,
    },

    /// Project savings for an invoice without analysing a feed
    Savings {
        /// Monthly consumption (kWh)
        #[arg(long, default_value = DEFAULT_INVOICE_KWH)]
        kwh: f64,

        /// Monthly bill amount
        #[arg(long, default_value = DEFAULT_INVOICE_COST)]
        cost: f64,

        /// Reduction to project, in percent
        #[arg(short, long, default_value_t = 10, value_parser = clap::value_parser!(u32).range(1..=50))]
        percentage: u32,

        /// Comma-separated saving action ids
        #[arg(short, long, value_delimiter = ',')]
        actions: Vec<String>,

        /// List the action catalogue and exit
        #[arg(long)]
        list_actions: bool,
    },

    /// Start the HTTP API
    Serve {
        /// Host to bind to (overrides server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    telemetry::init_tracing();

    let cli = Cli::parse();
    let cfg = Config::load()?;

    match cli.command {
        Commands::Analyze {
            input,
            output,
            kwh,
            cost,
            percentage,
            actions,
        } => {
            let state = AppState::from_config(&cfg)?;
            let path = input.unwrap_or_else(|| cfg.data.path.clone());
            let request = match (kwh, cost) {
                (Some(kwh), Some(cost)) => Some(SavingsRequest {
                    invoice: InvoiceInput::new(kwh, cost),
                    percentage,
                    actions,
                }),
                _ => None,
            };

            info!(path = %path.display(), "analysing meter feed");
            let records = state.reader.read_path(&path)?;
            let report = state.pipeline.run_with(records, request.as_ref())?;
            emit(&serde_json::to_string_pretty(&report)?, output)?;
        }
        Commands::Savings {
            kwh,
            cost,
            percentage,
            actions,
            list_actions,
        } => {
            let recommender = cfg.recommender()?;
            if list_actions {
                emit(
                    &serde_json::to_string_pretty(recommender.catalogue().actions())?,
                    None,
                )?;
                return Ok(());
            }

            let invoice = InvoiceInput::new(kwh, cost);
            let interactive = recommender.interactive(&invoice, percentage)?;
            let plan = if actions.is_empty() {
                None
            } else {
                Some(recommender.action_plan(&invoice, &actions)?)
            };
            let body = serde_json::json!({
                "interactive": interactive,
                "action_plan": plan,
            });
            emit(&serde_json::to_string_pretty(&body)?, None)?;
        }
        Commands::Serve { host, port } => {
            let mut server = cfg.server.clone();
            if let Some(host) = host {
                server.host = host;
            }
            if let Some(port) = port {
                server.port = port;
            }

            let state = AppState::from_config(&cfg)?;
            let app = api::router(state, &server);
            let addr = server.socket_addr()?;

            if server.host == "0.0.0.0" {
                warn!("Server binding to 0.0.0.0 - the API will be reachable from the network");
            }
            info!(%addr, "starting Eco-Save API");

            let listener = tokio::net::TcpListener::bind(addr)
                .await
                .with_context(|| format!("cannot bind {}", addr))?;
            axum::serve(listener, app)
                .with_graceful_shutdown(telemetry::shutdown_signal())
                .await?;

            warn!("shutdown complete");
        }
    }

    Ok(())
}

fn emit(body: &str, output: Option<PathBuf>) -> Result<()> {
    match output {
        Some(path) => std::fs::write(&path, body)
            .with_context(|| format!("cannot write {}", path.display())),
        None => {
            println!("{}", body);
            Ok(())
        }
    }
}
