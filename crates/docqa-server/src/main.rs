//! DocQA — ask questions about uploaded text and PDF documents.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use docqa_chat::{CompletionClient, CompletionConfig, HttpCompletionClient};
use docqa_core::DocQaConfig;
use docqa_ingest::{Ingester, RecursiveChunker, UploadedFile};
use docqa_server::{build_router, AppState};
use docqa_session::{Session, TurnEvent};
use tokio_stream::StreamExt;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn print_usage() {
    println!("DocQA — question answering over your documents");
    println!();
    println!("Usage: docqa [command]");
    println!();
    println!("Commands:");
    println!("  (none)                      Start the server");
    println!("  ask <question> <file>...    Answer a question about local .txt/.pdf files");
    println!("  help                        Show this help message");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() > 1 {
        match args[1].as_str() {
            "ask" => {
                if args.len() < 4 {
                    eprintln!("Usage: docqa ask <question> <file>...");
                    std::process::exit(1);
                }
                return ask(&args[2], &args[3..]).await;
            }
            "--help" | "-h" | "help" => {
                print_usage();
                return Ok(());
            }
            _ => {
                eprintln!("Unknown command: {}. Use 'docqa help' for usage.", args[1]);
                std::process::exit(1);
            }
        }
    }

    serve().await
}

async fn serve() -> anyhow::Result<()> {
    let config = DocQaConfig::from_env()?;
    let port = config.port;

    let (completion, completion_config) = match CompletionConfig::from_env() {
        Ok(completion_config) => {
            let client = HttpCompletionClient::new(completion_config.clone())?;
            let client: Arc<dyn CompletionClient> = Arc::new(client);
            (Some(client), Some(completion_config))
        }
        Err(e) => {
            warn!("{}; chat is disabled until credentials are provided", e);
            (None, None)
        }
    };

    let state = Arc::new(AppState::new(config, completion, completion_config));
    let app = build_router(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("DocQA server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// One-shot question over local files: outcomes go to stderr, the answer
/// streams to stdout.
async fn ask(question: &str, paths: &[String]) -> anyhow::Result<()> {
    let config = DocQaConfig::from_env()?;
    let client = HttpCompletionClient::new(CompletionConfig::from_env()?)?;

    let mut session = Session::new(
        "cli",
        Ingester::new(RecursiveChunker::from_preset(config.chunking)),
    );

    let mut files = Vec::new();
    for path in paths {
        match UploadedFile::from_path(Path::new(path)) {
            Ok(file) => files.push(file),
            Err(e) => eprintln!("Error processing {}: {}", path, e),
        }
    }

    let (mut session, outcomes) = tokio::task::spawn_blocking(move || {
        let outcomes = session.ingest(files);
        (session, outcomes)
    })
    .await?;
    for outcome in &outcomes {
        eprintln!("{}", outcome.message());
    }
    if session.documents().is_empty() {
        anyhow::bail!("no documents could be processed");
    }

    let stream = session.ask(&client, question)?;
    tokio::pin!(stream);

    let mut stdout = std::io::stdout();
    while let Some(turn_event) = stream.next().await {
        match turn_event {
            TurnEvent::Token(token) => {
                write!(stdout, "{}", token)?;
                stdout.flush()?;
            }
            TurnEvent::Done { .. } => {
                writeln!(stdout)?;
            }
            TurnEvent::Failed(error) => return Err(error.into()),
        }
    }

    Ok(())
}
