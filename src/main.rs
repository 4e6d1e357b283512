use anyhow::Context;
use clap::Parser;
use mcq_ingest::{config, logging, pipeline::IngestPipeline};
use std::path::PathBuf;
use uuid::Uuid;

/// Ingest one uploaded document into the vector store.
#[derive(Parser)]
#[command(name = "mcq-ingest", about = "Chunk, embed, and store a document")]
struct Cli {
    /// Path to the uploaded file on disk.
    file: PathBuf,
    /// Owner of the document.
    #[arg(long)]
    user_id: String,
    /// Document identifier; generated when omitted.
    #[arg(long)]
    doc_id: Option<String>,
    /// Tag describing the document's downstream use.
    #[arg(long, default_value = "mcq")]
    doc_type: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    config::init_config();
    logging::init_tracing();
    let filename = cli
        .file
        .file_name()
        .and_then(|name| name.to_str())
        .context("File path has no usable filename")?
        .to_string();
    let doc_id = cli.doc_id.unwrap_or_else(|| Uuid::new_v4().to_string());

    let pipeline = IngestPipeline::new()
        .await
        .context("Failed to initialize ingestion pipeline")?;

    let outcome = pipeline
        .ingest_document(&cli.file, &filename, &cli.user_id, &doc_id, &cli.doc_type)
        .await?;

    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}
