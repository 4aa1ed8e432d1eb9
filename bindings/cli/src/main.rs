//! Redact text from profile pictures on the command line.
//!
//! # Usage
//!
//! ```bash
//! # One-shot: blur the words from a saved OCR response
//! textredact-cli redact --input avatar.png --detections ocr.json --output avatar.redacted.png
//!
//! # Full flow against a directory-backed store (bucket = sub-directory of --root)
//! PROCESSING_BUCKET_NAME=processing NOTIFICATION_TOPIC=reviewers \
//!     textredact-cli process --root ./store --bucket uploads --key players/7/avatar.jpg \
//!     --detections ocr.json
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use textredact::{
    ObjectRef, RedactionService, Redactor, ServiceConfig, StandardLoader, StaticDetector,
};
use textredact_cli::{load_detections, output_format, DirectoryStore, LogNotifier};

/// Command-line arguments
#[derive(Parser)]
#[command(name = "textredact-cli")]
#[command(about = "Blur text found by OCR in profile pictures")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Redact a local image file
    Redact {
        /// Image to redact (PNG, JPEG or WebP)
        #[arg(short, long)]
        input: PathBuf,

        /// OCR response (JSON block list) for the image
        #[arg(short, long)]
        detections: PathBuf,

        /// Where to write the result; its extension picks the format, if it has one
        #[arg(short, long)]
        output: PathBuf,

        /// JPEG quality (1-100)
        #[arg(short, long, default_value_t = 95)]
        quality: u8,
    },

    /// Process an object in a directory-backed store, staging and notifying
    Process {
        /// Directory holding one sub-directory per bucket
        #[arg(short, long)]
        root: PathBuf,

        /// Bucket the object was uploaded to
        #[arg(short, long)]
        bucket: String,

        /// Object key within the bucket
        #[arg(short, long)]
        key: String,

        /// OCR response (JSON block list) for the object
        #[arg(short, long)]
        detections: PathBuf,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("textredact=info,textredact_cli=info")),
        )
        .with_target(false)
        .init();

    match run(Args::parse()) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<ExitCode> {
    match args.command {
        Command::Redact {
            input,
            detections,
            output,
            quality,
        } => {
            let format = output_format(&output)?;
            let detections = load_detections(&detections)?;
            let bytes = std::fs::read(&input)
                .with_context(|| format!("failed to read {}", input.display()))?;

            let mut redactor = Redactor::new(bytes)?.quality(quality);
            if let Some(format) = format {
                redactor = redactor.format(format);
            }
            let result = redactor.redact(&detections)?;
            std::fs::write(&output, &result.data)
                .with_context(|| format!("failed to write {}", output.display()))?;

            info!(
                output = %output.display(),
                width = result.width,
                height = result.height,
                bytes = result.data.len(),
                "wrote redacted image"
            );
            for text in &result.detected_texts {
                println!("{text}");
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Process {
            root,
            bucket,
            key,
            detections,
        } => {
            let config = ServiceConfig::from_env().context("invalid configuration")?;
            let store = DirectoryStore::new(root);
            let detector = StaticDetector::new(load_detections(&detections)?);
            let notifier = LogNotifier::new(config.notification_topic.clone());
            let loader = StandardLoader::new(config.jpeg_quality)?;
            let service = RedactionService::new(config, &store, &detector, &notifier, &loader);

            let status = service.handle(&ObjectRef::new(bucket, key));
            println!("{} {}", status.status_code, status.message);
            Ok(if status.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}
