//! Command-line host for the deedsearch session components.

mod commands;
mod state;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::error;

use deedsearch::api::{ExportFormat, RecordId, SelectionId};
use deedsearch::search::SearchField;
use deedsearch::telemetry::init_tracing;
use deedsearch::{load_config, ClientConfig};

use commands::search::SearchArgs;
use state::AppState;

/// Upload deed documents, follow their ingestion and search the results.
#[derive(Parser)]
#[command(name = "deedsearch", version, about)]
struct Cli {
    /// Path to a JSON configuration file. Defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload files into a table and wait for ingestion to finish.
    Upload {
        /// Target table name.
        #[arg(long)]
        table: String,

        /// Files to upload.
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Search documents.
    Search {
        /// Free-text query.
        #[arg(short, long)]
        q: Option<String>,
        #[arg(long)]
        purchaser: Option<String>,
        #[arg(long)]
        seller: Option<String>,
        #[arg(long)]
        docname: Option<String>,
        #[arg(long)]
        docno: Option<String>,
        /// Registration date as stored by the server.
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        property: Option<String>,
        /// Table to search; remembered as the most recent table.
        #[arg(long)]
        table: Option<String>,
        /// Restrict to one document-name group.
        #[arg(long)]
        facet: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: u32,
        /// Print the full session state as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List tables, most recently used first.
    Tables {
        /// Remember this table as the most recent one.
        #[arg(long = "use")]
        remember: Option<String>,
    },

    /// Manage saved entries.
    Saved {
        #[command(subcommand)]
        action: SavedAction,
    },

    /// Export the saved entries of a table.
    Export {
        table: String,
        /// `excel` or `word`.
        #[arg(long, default_value = "excel")]
        format: ExportFormat,
        /// Directory the document is written to.
        #[arg(long, default_value = ".")]
        output: PathBuf,
    },
}

#[derive(Subcommand)]
enum SavedAction {
    /// List saved entries grouped by table.
    List,
    /// Save a search result by record id.
    Add { id: RecordId },
    /// Remove one saved entry.
    Remove {
        sel_id: SelectionId,
        #[arg(long)]
        table: String,
    },
    /// Remove every saved entry of a table.
    RemoveGroup { table: String },
    /// Print `docno | docname` lines for a table.
    Copy { table: String },
}

fn load_client_config(path: Option<&PathBuf>) -> deedsearch::Result<ClientConfig> {
    let mut config = match path {
        Some(path) => load_config(path)?,
        None => ClientConfig::default(),
    };
    config.apply_env();
    Ok(config)
}

async fn run(cli: Cli) -> deedsearch::Result<()> {
    let config = load_client_config(cli.config.as_ref())?;
    let state = AppState::new(config)?;

    match cli.command {
        Commands::Upload { table, files } => commands::upload::run(&state, &table, &files).await,
        Commands::Search {
            q,
            purchaser,
            seller,
            docname,
            docno,
            date,
            property,
            table,
            facet,
            page,
            json,
        } => {
            let fields = [
                (SearchField::FreeText, q),
                (SearchField::Purchaser, purchaser),
                (SearchField::Seller, seller),
                (SearchField::DocName, docname),
                (SearchField::DocNo, docno),
                (SearchField::RegistrationDate, date),
                (SearchField::PropertyDescription, property),
                (SearchField::TableName, table),
            ]
            .into_iter()
            .filter_map(|(field, value)| value.map(|v| (field, v)))
            .collect();

            let args = SearchArgs {
                fields,
                facet,
                page,
                json,
            };
            commands::search::run(&state, args).await
        }
        Commands::Tables { remember } => commands::tables::run(&state, remember.as_deref()).await,
        Commands::Saved { action } => match action {
            SavedAction::List => commands::saved::list(&state).await,
            SavedAction::Add { id } => commands::saved::add(&state, id).await,
            SavedAction::Remove { sel_id, table } => {
                commands::saved::remove(&state, sel_id, &table).await
            }
            SavedAction::RemoveGroup { table } => {
                commands::saved::remove_group(&state, &table).await
            }
            SavedAction::Copy { table } => commands::saved::copy(&state, &table).await,
        },
        Commands::Export {
            table,
            format,
            output,
        } => commands::saved::export(&state, &table, format, &output).await,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
