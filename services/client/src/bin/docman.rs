//! services/client/src/bin/docman.rs
//!
//! Command-line front-end for the document manager client. It only collects input
//! and calls the state containers; every rule lives in the library.

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use client_lib::{
    adapters::local_file::attachment_from_path,
    config::Config,
    error::ClientError,
    state::AppState,
};
use document_manager_core::domain::{
    AuthStatus, Document, DocumentDraft, DocumentMetadata, FileAttachment, MajorHead, SearchQuery,
};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "docman", version, about = "Document management client")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Request an OTP for a phone number and sign in with it.
    Login {
        #[arg(long)]
        phone: String,
        /// The OTP; prompted for when omitted.
        #[arg(long)]
        otp: Option<String>,
    },
    /// Sign out and forget the stored session.
    Logout,
    /// Show whether a session is active.
    Status,
    /// List known tags, optionally filtered.
    Tags {
        #[arg(default_value = "")]
        term: String,
    },
    /// Upload a PDF or image with its metadata.
    Upload {
        file: PathBuf,
        #[arg(long)]
        major: MajorHead,
        #[arg(long)]
        minor: String,
        /// Document date as YYYY-MM-DD; defaults to today.
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        remarks: Option<String>,
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
    /// Search stored documents. Returns at most one page of results.
    Search {
        #[arg(long)]
        major: Option<MajorHead>,
        #[arg(long)]
        minor: Option<String>,
        #[arg(long = "tag")]
        tags: Vec<String>,
        #[arg(long)]
        from: Option<NaiveDate>,
        #[arg(long)]
        to: Option<NaiveDate>,
    },
    /// Download a stored file.
    Download {
        /// Where the service serves the file from.
        #[arg(long)]
        uri: String,
        /// File name to save under.
        #[arg(long)]
        name: String,
        /// Target directory; defaults to DOCMAN_DOWNLOAD_DIR.
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode, ClientError> {
    let cli = Cli::parse();

    // --- 1. Load Configuration & Set Up Logging ---
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
    info!("Configuration loaded.");

    // --- 2. Build the Application State ---
    let mut app = AppState::bootstrap(config).await?;

    // --- 3. Run the Command ---
    let ok = match cli.command {
        Command::Login { phone, otp } => login(&mut app, &phone, otp).await?,
        Command::Logout => {
            app.auth.logout().await;
            report(app.auth.last_error())
        }
        Command::Status => {
            match app.auth.status() {
                AuthStatus::Authenticated => println!("authenticated"),
                AuthStatus::Anonymous => println!("anonymous"),
            }
            true
        }
        Command::Tags { term } => {
            let tags = app.documents.fetch_tags(&term).await;
            for tag in &tags {
                println!("{}", tag);
            }
            report(app.documents.last_error())
        }
        Command::Upload { file, major, minor, date, remarks, tags } => {
            let attachment = attachment_from_path(&file).await?;
            let date = date.unwrap_or_else(|| Local::now().date_naive());
            match DocumentMetadata::new(major, &minor, date, remarks, tags) {
                Ok(metadata) => {
                    let draft = DocumentDraft { metadata, file: attachment };
                    if let Some(document) = app.documents.upload_document(draft).await {
                        print_documents(&[document])?;
                    }
                    report(app.documents.last_error())
                }
                Err(e) => report(Some(&e.to_string())),
            }
        }
        Command::Search { major, minor, tags, from, to } => {
            let query = SearchQuery {
                major_head: major,
                minor_head: minor,
                tags,
                from_date: from,
                to_date: to,
                ..Default::default()
            };
            let documents = app.documents.search_documents(&query).await;
            print_documents(&documents)?;
            report(app.documents.last_error())
        }
        Command::Download { uri, name, dir } => {
            let dir = dir.unwrap_or_else(|| app.config.download_dir.clone());
            let file = FileAttachment { name, uri, ..Default::default() };
            if let Some(path) = app.documents.download_file(&file, &dir).await {
                println!("{}", path.display());
            }
            report(app.documents.last_error())
        }
    };

    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

async fn login(app: &mut AppState, phone: &str, otp: Option<String>) -> Result<bool, ClientError> {
    if !app.auth.request_otp(phone).await {
        return Ok(report(app.auth.last_error()));
    }
    let otp = match otp {
        Some(otp) => otp,
        None => prompt("OTP sent. Enter the OTP: ")?,
    };
    if app.auth.validate_otp(&otp).await {
        println!("authenticated");
    }
    Ok(report(app.auth.last_error()))
}

fn prompt(label: &str) -> Result<String, ClientError> {
    let mut stderr = io::stderr();
    stderr.write_all(label.as_bytes())?;
    stderr.flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn print_documents(documents: &[Document]) -> Result<(), ClientError> {
    let rendered = serde_json::to_string_pretty(documents)
        .map_err(|e| ClientError::Internal(e.to_string()))?;
    println!("{}", rendered);
    Ok(())
}

/// Prints a stored error message, returning whether the command succeeded.
fn report(error: Option<&str>) -> bool {
    match error {
        Some(message) => {
            eprintln!("error: {}", message);
            false
        }
        None => true,
    }
}
