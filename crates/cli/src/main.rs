use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ccr_core::{
    CaseId, CaseStatus, CaseStore, CoreConfig, DraftCase, ListScope, NullSink, ReviewService,
};

/// Audit identity for drafts ingested from the command line.
const CLI_ACTOR: &str = "cli";

#[derive(Parser)]
#[command(name = "ccr")]
#[command(about = "Clinical case review CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest a draft case from a JSON file
    Ingest {
        /// Path to the draft case JSON
        file: PathBuf,
        /// Initial status, DRAFT_AI or IN_REVIEW (optional)
        #[arg(long)]
        status: Option<CaseStatus>,
    },
    /// List stored cases (published only by default)
    List {
        /// Include unpublished cases
        #[arg(long)]
        all: bool,
    },
    /// Print a case's full JSON snapshot
    Export {
        /// Case UUID
        case_id: String,
    },
    /// Remove a case and its audit trail
    Purge {
        /// Case UUID
        case_id: String,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let cfg = Arc::new(CoreConfig::from_env()?);
    let store = CaseStore::new(cfg);

    match cli.command {
        Some(Commands::Ingest { file, status }) => {
            let service = ReviewService::new(store, Arc::new(NullSink));
            match read_draft(&file, status) {
                Ok(draft) => match service.ingest(CLI_ACTOR, draft) {
                    Ok(case) => println!("Ingested case {} ({})", case.id, case.status),
                    Err(e) => eprintln!("Error ingesting case: {}", e),
                },
                Err(e) => eprintln!("Error reading draft from {}: {}", file.display(), e),
            }
        }
        Some(Commands::List { all }) => {
            let scope = if all {
                ListScope::All
            } else {
                ListScope::PublishedOnly
            };
            match store.list_cases(scope) {
                Ok(cases) if cases.is_empty() => println!("No cases found."),
                Ok(cases) => {
                    for case in cases {
                        println!(
                            "ID: {}, Status: {}, Domain: {}, Title: {}",
                            case.id, case.status, case.domain, case.title
                        );
                    }
                }
                Err(e) => eprintln!("Error listing cases: {}", e),
            }
        }
        Some(Commands::Export { case_id }) => match export_case(&store, &case_id) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("Error exporting case {}: {}", case_id, e),
        },
        Some(Commands::Purge { case_id }) => {
            // Local operator tooling: no role gate on direct store access.
            match CaseId::parse(&case_id).and_then(|id| store.purge(&id)) {
                Ok(()) => println!("Purged case {}", case_id),
                Err(e) => eprintln!("Error purging case {}: {}", case_id, e),
            }
        }
        None => {
            println!("Use 'ccr --help' for commands");
        }
    }

    Ok(())
}

fn read_draft(
    file: &Path,
    status: Option<CaseStatus>,
) -> Result<DraftCase, Box<dyn std::error::Error>> {
    let raw = std::fs::read_to_string(file)?;
    let mut draft: DraftCase = serde_json::from_str(&raw)?;
    if status.is_some() {
        draft.status = status;
    }
    Ok(draft)
}

fn export_case(store: &CaseStore, case_id: &str) -> Result<String, Box<dyn std::error::Error>> {
    let id = CaseId::parse(case_id)?;
    let snapshot = store.export_json(&id)?;
    Ok(serde_json::to_string_pretty(&snapshot)?)
}
