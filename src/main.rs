// src/main.rs

use clap::Parser;
use receipt_parse::{Config, Error, ReceiptExtractor};
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "receipt-parse")]
#[command(about = "Extract vendor, date, total and items from grocery-receipt OCR text")]
struct Args {
    /// TOML config file; built-in tables are used when absent
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// OCR text file; reads stdin when absent
    input: Option<PathBuf>,
}

fn read_input(input: Option<&PathBuf>) -> Result<String, Error> {
    match input {
        Some(path) => fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.clone(),
            source,
        }),
        None => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .map_err(|source| Error::Io {
                    path: PathBuf::from("<stdin>"),
                    source,
                })?;
            Ok(text)
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let cfg = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    // init tracing; RUST_LOG wins over the config file
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cfg.log_filter));
    tracing_subscriber::fmt()
        .with_target(true)
        .with_level(true)
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let extractor = ReceiptExtractor::from_config(&cfg)?;
    let text = read_input(args.input.as_ref())?;
    info!(bytes = text.len(), "Read OCR text");

    let receipt = extractor.extract(&text);
    for issue in receipt.review() {
        warn!(%issue, "Needs review");
    }

    println!("{}", serde_json::to_string_pretty(&receipt)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_config_and_input() {
        let args = Args::try_parse_from(["receipt-parse", "-c", "rules.toml", "bill.txt"]).unwrap();
        assert_eq!(args.config, Some(PathBuf::from("rules.toml")));
        assert_eq!(args.input, Some(PathBuf::from("bill.txt")));
    }

    #[test]
    fn test_args_default_to_stdin() {
        let args = Args::try_parse_from(["receipt-parse"]).unwrap();
        assert!(args.config.is_none());
        assert!(args.input.is_none());
    }

    #[test]
    fn test_help_is_not_a_failure() {
        let err = Args::try_parse_from(["receipt-parse", "--help"]).err().unwrap();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
        assert!(Args::try_parse_from(["receipt-parse", "--bogus"]).is_err());
    }
}
