use std::io::Read;

use anyhow::{Context, Result};
use busbreakdown::config::{RAW_BUCKET_NAME_VAR, TABLE_NAME_VAR};
use busbreakdown::storage::{MemoryBlobStore, MemoryRecordStore, aws_stores};
use busbreakdown::types::{OCCURRED_ON_KEY, ROUTE_NUMBER_KEY};
use busbreakdown::{Config, IncidentEvent, IncidentProcessor, set_up_logger};
use clap::{Arg, ArgAction, Command};
use log::{debug, info};

#[derive(Debug)]
struct Args {
    verbose: bool,
    dry_run: bool,
    payload: Option<String>,
    bucket: Option<String>,
    table: Option<String>,
}

fn parse_args() -> Args {
    let matches = Command::new("busbreakdown")
        .version("0.1")
        .author("Jacob Luszcz")
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::SetTrue)
                .help("Verbose mode. Outputs DEBUG and higher log messages."),
        )
        .arg(
            Arg::new("dry-run")
                .short('n')
                .long("dry-run")
                .action(ArgAction::SetTrue)
                .help("Use in-memory stores and print the enriched record rather than writing to AWS."),
        )
        .arg(
            Arg::new("bucket")
                .short('b')
                .long("bucket")
                .env(RAW_BUCKET_NAME_VAR)
                .help("Bucket that raw breakdown reports are archived to."),
        )
        .arg(
            Arg::new("table")
                .short('t')
                .long("table")
                .env(TABLE_NAME_VAR)
                .help("Table that enriched breakdown records are written to."),
        )
        .arg(
            Arg::new("payload")
                .help("Breakdown report JSON file. Reads stdin if omitted."),
        )
        .get_matches();

    let verbose = matches.get_flag("verbose");

    let dry_run = matches.get_flag("dry-run");

    let payload = matches.get_one::<String>("payload").cloned();
    let bucket = matches.get_one::<String>("bucket").cloned();
    let table = matches.get_one::<String>("table").cloned();

    Args {
        verbose,
        dry_run,
        payload,
        bucket,
        table,
    }
}

fn read_payload(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read {path}"))
        }
        None => {
            let mut body = String::new();
            std::io::stdin()
                .read_to_string(&mut body)
                .context("Failed to read stdin")?;
            Ok(body)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = parse_args();
    set_up_logger(module_path!(), args.verbose)?;
    debug!("{args:?}");

    let event = IncidentEvent::new(read_payload(args.payload.as_deref())?);

    if args.dry_run {
        let config = Config::new(
            args.bucket.unwrap_or_else(|| "dry-run".to_owned()),
            args.table.unwrap_or_else(|| "dry-run".to_owned()),
        );
        let blobs = MemoryBlobStore::new();
        let records = MemoryRecordStore::keyed_by(ROUTE_NUMBER_KEY, OCCURRED_ON_KEY);
        let processor = IncidentProcessor::new(config, blobs.clone(), records.clone());

        let response = processor.handle(&event).await;
        info!("{response:?}");

        for blob in blobs.blobs() {
            info!("Archived s3://{}/{}", blob.bucket, blob.key);
        }
        for item in records.items(&processor.config().table_name) {
            println!("{}", serde_json::to_string_pretty(&item)?);
        }
        println!("{}", serde_json::to_string(&response)?);
    } else {
        let config = Config::new(
            args.bucket.context("--bucket or RAW_BUCKET_NAME is required")?,
            args.table.context("--table or TABLE_NAME is required")?,
        );
        let (blobs, records) = aws_stores().await;
        let processor = IncidentProcessor::new(config, blobs, records);

        let response = processor.handle(&event).await;
        println!("{}", serde_json::to_string(&response)?);
    }

    Ok(())
}
