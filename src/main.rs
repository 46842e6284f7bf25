// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! netprint: Local Network Device Fingerprint Matching
//!
//! Command-line front end: classify single observations or JSONL streams
//! produced by a discovery collector, and inspect fingerprint catalogs.

use chrono::Utc;
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, BufReader};
use tracing::{debug, info, warn};

use netprint::config::AppConfig;
use netprint::engine::MatchEngine;
use netprint::normalize::NormalizedObservation;
use netprint::scorer::{self, ScoreBreakdown};
use netprint::stream::{classify_stream, Classification, JsonLinesSource};
use netprint::{Catalog, DeviceObservation, MatchPolicy, MatchResult, NetprintError, Result};

/// netprint CLI - Local Network Device Fingerprint Matching
#[derive(Parser, Debug)]
#[command(name = "netprint")]
#[command(author = "Jonathan D. A. Jewell <hyperpolymath>")]
#[command(version)]
#[command(about = "Match discovered network devices to integration fingerprints", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (JSON format)
    #[arg(short, long, default_value = "netprint.json", global = true)]
    config: PathBuf,

    /// Fingerprint catalog (overrides config; bundled catalog when neither is set)
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable trace logging (most verbose)
    #[arg(long, global = true)]
    trace: bool,

    /// Output format for results (overrides config)
    #[arg(long, global = true, value_parser = ["text", "json", "jsonl"])]
    format: Option<String>,

    /// Suppress non-essential output (quiet mode)
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Classify one device described on the command line
    Match {
        /// MAC address, any separator style
        #[arg(long)]
        mac: Option<String>,

        /// DHCP hostname
        #[arg(long)]
        hostname: Option<String>,

        /// Advertised mDNS service type, e.g. _hue._tcp.local.
        #[arg(long)]
        mdns_type: Option<String>,

        /// SSDP field as KEY=VALUE (repeatable)
        #[arg(long = "ssdp", value_parser = parse_key_val)]
        ssdp: Vec<(String, String)>,

        /// Show per-signal score breakdown
        #[arg(long)]
        explain: bool,

        /// Show the N best candidates instead of only the winner
        #[arg(long)]
        top: Option<usize>,

        /// Use first-match selection instead of best score
        #[arg(long)]
        first_match: bool,
    },

    /// Classify a stream of JSON observations, one per line
    Classify {
        /// Input file (stdin when omitted)
        input: Option<PathBuf>,

        /// Maximum observations classified concurrently
        #[arg(long)]
        max_in_flight: Option<usize>,

        /// Use first-match selection instead of best score
        #[arg(long)]
        first_match: bool,
    },

    /// Catalog inspection
    Catalog {
        #[command(subcommand)]
        action: CatalogCommands,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
enum CatalogCommands {
    /// List fingerprints in catalog order
    List,

    /// Validate the catalog and report problems
    Validate,

    /// Write the normalized catalog to a file
    Export {
        /// Output file
        output: PathBuf,
    },

    /// Show catalog summary and digest
    Info,
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Generate default configuration file
    Generate {
        /// Output file path
        #[arg(short, long, default_value = "netprint.json")]
        output: PathBuf,
    },
}

fn parse_key_val(s: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", s))?;
    if key.is_empty() {
        return Err(format!("empty SSDP field name in '{}'", s));
    }
    Ok((key.to_string(), value.to_string()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Load configuration
    let mut config = AppConfig::load(&cli.config)?;
    if let Some(catalog) = cli.catalog {
        config.catalog_path = Some(catalog.to_string_lossy().to_string());
    }
    if let Some(format) = cli.format {
        config.output.format = format;
    }

    match cli.command {
        Commands::Match { mac, hostname, mdns_type, ssdp, explain, top, first_match } => {
            let observation = DeviceObservation {
                mac_address: mac,
                hostname,
                mdns_service_type: mdns_type,
                ssdp_fields: ssdp.into_iter().collect(),
            };
            run_match(&config, observation, explain || config.output.explain, top, first_match)
        }
        Commands::Classify { input, max_in_flight, first_match } => {
            run_classify(&config, input, max_in_flight, first_match).await
        }
        Commands::Catalog { action } => run_catalog_command(&config, action),
        Commands::Config { action } => run_config_command(&config, action),
    }
}

/// Build the engine from the configured catalog
fn build_engine(config: &AppConfig, first_match: bool) -> Result<MatchEngine> {
    let catalog = config.load_catalog()?;
    let policy = if first_match { MatchPolicy::FirstMatch } else { config.policy };

    info!(
        "Catalog ready: {} fingerprints, {} integrations, policy {:?}",
        catalog.len(),
        catalog.integrations().len(),
        policy
    );
    Ok(MatchEngine::from_catalog(catalog).with_policy(policy))
}

fn describe_breakdown(breakdown: &ScoreBreakdown) -> String {
    let parts: Vec<String> = breakdown
        .contributions()
        .into_iter()
        .map(|(signal, points)| format!("{} +{}", signal.as_str(), points))
        .collect();
    parts.join(", ")
}

fn result_json(result: &MatchResult, breakdown: Option<&ScoreBreakdown>) -> serde_json::Value {
    let mut value = serde_json::json!({
        "integration": result.integration_id(),
        "score": result.score,
    });
    if let Some(breakdown) = breakdown {
        value["breakdown"] = serde_json::json!(breakdown);
    }
    value
}

/// Classify a single observation given on the command line
fn run_match(
    config: &AppConfig,
    observation: DeviceObservation,
    explain: bool,
    top: Option<usize>,
    first_match: bool,
) -> Result<()> {
    let engine = build_engine(config, first_match)?;
    let normalized = NormalizedObservation::new(&observation);

    if normalized.is_empty() {
        warn!("Observation carries no usable signal");
    }

    let results: Vec<MatchResult> = match top {
        Some(limit) => engine.rank(&observation, limit),
        None => engine.match_observation(&observation).into_iter().collect(),
    };
    let breakdowns: Vec<Option<ScoreBreakdown>> = results
        .iter()
        .map(|r| explain.then(|| scorer::explain(&r.fingerprint, &normalized)))
        .collect();

    let mut out = std::io::stdout().lock();
    match config.output.format.as_str() {
        "json" | "jsonl" => {
            let candidates: Vec<serde_json::Value> = results
                .iter()
                .zip(&breakdowns)
                .map(|(r, b)| result_json(r, b.as_ref()))
                .collect();
            let report = serde_json::json!({
                "classified_at": Utc::now().to_rfc3339(),
                "observation": observation,
                "matched": !results.is_empty(),
                "candidates": candidates,
            });
            if config.output.format == "json" {
                writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
            } else {
                writeln!(out, "{}", serde_json::to_string(&report)?)?;
            }
        }
        _ => {
            if results.is_empty() {
                writeln!(out, "No matching integration")?;
            }
            for (result, breakdown) in results.iter().zip(&breakdowns) {
                writeln!(out, "{} (score {})", result.integration_id(), result.score)?;
                if let Some(breakdown) = breakdown {
                    writeln!(out, "  {}", describe_breakdown(breakdown))?;
                }
            }
        }
    }

    Ok(())
}

fn write_classification(out: &mut impl Write, format: &str, classification: &Classification) -> Result<()> {
    match format {
        "json" | "jsonl" => {
            let line = serde_json::json!({
                "classified_at": Utc::now().to_rfc3339(),
                "sequence": classification.sequence,
                "observation": classification.observation,
                "result": classification.result.as_ref().map(|r| result_json(r, None)),
            });
            writeln!(out, "{}", serde_json::to_string(&line)?)?;
        }
        _ => match &classification.result {
            Some(result) => writeln!(
                out,
                "{}: {} (score {})",
                classification.sequence,
                result.integration_id(),
                result.score
            )?,
            None => writeln!(out, "{}: no match", classification.sequence)?,
        },
    }
    Ok(())
}

/// Classify a JSONL observation stream from a file or stdin
async fn run_classify(
    config: &AppConfig,
    input: Option<PathBuf>,
    max_in_flight: Option<usize>,
    first_match: bool,
) -> Result<()> {
    let engine = Arc::new(build_engine(config, first_match)?);
    let max_in_flight = max_in_flight.unwrap_or(config.stream.max_in_flight);

    let reader: Box<dyn AsyncBufRead + Unpin + Send> = match &input {
        Some(path) => {
            info!("Reading observations from {:?}", path);
            Box::new(BufReader::new(tokio::fs::File::open(path).await?))
        }
        None => {
            debug!("Reading observations from stdin");
            Box::new(BufReader::new(tokio::io::stdin()))
        }
    };
    let mut source = JsonLinesSource::new(reader);

    let format = config.output.format.as_str();
    let mut out = std::io::stdout().lock();
    let mut matched = 0;
    let total = classify_stream(engine, &mut source, max_in_flight, |classification| {
        if classification.result.is_some() {
            matched += 1;
        }
        write_classification(&mut out, format, &classification)
    })
    .await?;

    info!(
        "Classified {} observations: {} matched, {} skipped",
        total,
        matched,
        source.skipped()
    );
    Ok(())
}

fn catalog_origin(config: &AppConfig) -> String {
    config
        .catalog_path
        .clone()
        .unwrap_or_else(|| "<built-in>".to_string())
}

/// Run catalog commands
fn run_catalog_command(config: &AppConfig, action: CatalogCommands) -> Result<()> {
    let catalog: Catalog = config.load_catalog()?;

    match action {
        CatalogCommands::List => {
            for (index, fp) in catalog.iter().enumerate() {
                let mut criteria = Vec::new();
                if let Some(prefix) = fp.mac_prefix() {
                    criteria.push(format!("mac={}", prefix));
                }
                if let Some(fragment) = fp.hostname_fragment() {
                    criteria.push(format!("hostname~{}", fragment));
                }
                if let Some(service_type) = fp.service_type() {
                    criteria.push(format!("zeroconf={}", service_type));
                }
                for (field, value) in &fp.ssdp {
                    criteria.push(format!("ssdp.{}={}", field, value));
                }
                println!("{:>4}  {:<20} {}", index, fp.integration_id, criteria.join(" "));
            }
        }
        CatalogCommands::Validate => {
            let unreachable: Vec<usize> = catalog
                .iter()
                .enumerate()
                .filter(|(_, fp)| fp.has_no_criteria())
                .map(|(index, _)| index)
                .collect();
            for index in &unreachable {
                warn!("Entry {} has no criteria and can never match", index);
            }
            println!("Catalog at {} is valid", catalog_origin(config));
            println!("  Fingerprints: {}", catalog.len());
            println!("  Integrations: {}", catalog.integrations().len());
            println!("  Without criteria: {}", unreachable.len());
        }
        CatalogCommands::Export { output } => {
            export_catalog(&catalog, &output)?;
            println!("Exported {} fingerprints to {:?}", catalog.len(), output);
        }
        CatalogCommands::Info => {
            println!("Catalog: {}", catalog_origin(config));
            println!("  Fingerprints: {}", catalog.len());
            println!("  Integrations: {}", catalog.integrations().join(", "));
            println!("  Digest: {}", catalog.digest());
        }
    }

    Ok(())
}

fn export_catalog(catalog: &Catalog, output: &Path) -> Result<()> {
    if output.exists() {
        warn!("Overwriting {:?}", output);
    }
    catalog.save(output)
}

/// Run config commands
fn run_config_command(config: &AppConfig, action: ConfigCommands) -> Result<()> {
    match action {
        ConfigCommands::Show => {
            let json = serde_json::to_string_pretty(config)?;
            println!("{}", json);
        }
        ConfigCommands::Generate { output } => {
            if output.exists() {
                return Err(NetprintError::Config(format!(
                    "{:?} already exists, refusing to overwrite",
                    output
                )));
            }
            AppConfig::default().save(&output)?;
            println!("Generated config at {:?}", output);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_requires_subcommand() {
        assert!(Cli::try_parse_from(["netprint"]).is_err());
    }

    #[test]
    fn test_cli_match_command() {
        let cli = Cli::try_parse_from([
            "netprint", "match",
            "--mac", "44:5C:E9:86:51:9C",
            "--mdns-type", "_samsungtv._tcp.local.",
            "--ssdp", "manufacturer=Samsung Electronics",
            "--ssdp", "deviceType=urn:schemas-upnp-org:device:MediaRenderer:1",
            "--top", "3",
        ])
        .unwrap();

        match cli.command {
            Commands::Match { mac, mdns_type, ssdp, top, explain, .. } => {
                assert_eq!(mac.as_deref(), Some("44:5C:E9:86:51:9C"));
                assert_eq!(mdns_type.as_deref(), Some("_samsungtv._tcp.local."));
                assert_eq!(ssdp.len(), 2);
                assert_eq!(ssdp[1].1, "urn:schemas-upnp-org:device:MediaRenderer:1");
                assert_eq!(top, Some(3));
                assert!(!explain);
            }
            _ => panic!("Expected Match command"),
        }
    }

    #[test]
    fn test_cli_classify_command() {
        let cli = Cli::try_parse_from([
            "netprint", "--format", "jsonl", "classify", "/tmp/observations.jsonl", "--first-match",
        ])
        .unwrap();

        assert_eq!(cli.format.as_deref(), Some("jsonl"));
        match cli.command {
            Commands::Classify { input, first_match, max_in_flight } => {
                assert_eq!(input, Some(PathBuf::from("/tmp/observations.jsonl")));
                assert!(first_match);
                assert_eq!(max_in_flight, None);
            }
            _ => panic!("Expected Classify command"),
        }
    }

    #[test]
    fn test_cli_rejects_unknown_format() {
        assert!(Cli::try_parse_from(["netprint", "--format", "xml", "catalog", "info"]).is_err());
    }

    #[test]
    fn test_parse_key_val() {
        assert_eq!(
            parse_key_val("modelName=AFT=1").unwrap(),
            ("modelName".to_string(), "AFT=1".to_string())
        );
        assert!(parse_key_val("manufacturer").is_err());
        assert!(parse_key_val("=Amazon.com").is_err());
    }

    #[test]
    fn test_describe_breakdown() {
        let breakdown = ScoreBreakdown {
            dhcp_mac: 10,
            zeroconf: 5,
            ..Default::default()
        };
        assert_eq!(describe_breakdown(&breakdown), "dhcp_mac +10, zeroconf +5");
    }

    #[test]
    fn test_write_classification_text_and_json() {
        let engine = MatchEngine::new(vec![
            netprint::IntegrationFingerprint::new("esphome").with_service_type("_esphomelib._tcp.local."),
        ])
        .unwrap();
        let observation = DeviceObservation::new().with_mdns_service_type("_esphomelib._tcp.local.");
        let classification = Classification {
            sequence: 7,
            result: engine.match_observation(&observation),
            observation,
        };

        let mut text = Vec::new();
        write_classification(&mut text, "text", &classification).unwrap();
        assert_eq!(String::from_utf8(text).unwrap(), "7: esphome (score 5)\n");

        let mut json = Vec::new();
        write_classification(&mut json, "jsonl", &classification).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&json).unwrap();
        assert_eq!(value["sequence"], 7);
        assert_eq!(value["result"]["integration"], "esphome");
        assert_eq!(value["result"]["score"], 5);
        assert!(value["classified_at"].is_string());
    }
}
