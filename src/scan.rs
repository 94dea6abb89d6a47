use crate::cli::Cli;
use crate::netutils::parse_target;
use crate::probes::MysqlProbe;
use crate::types::{DetectResult, ScanSummary};
use anyhow::{bail, Result};
use colored::*;
use futures::stream::{FuturesUnordered, StreamExt};
use serde_json::json;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

/// Write `value` to `path.tmp` then rename over `path`. The tmp file is
/// removed if any step fails.
pub fn write_json_file_atomic(path: &str, value: &serde_json::Value) -> anyhow::Result<()> {
    let tmp = format!("{}.tmp", path);
    let res = (|| -> anyhow::Result<()> {
        let f = File::create(&tmp)?;
        let mut w = BufWriter::new(f);
        serde_json::to_writer_pretty(&mut w, value)?;
        w.flush()?;
        drop(w);
        fs::rename(&tmp, path)?;
        Ok(())
    })();
    if res.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    res
}

pub fn results_document(results: &[DetectResult], summary: &ScanSummary) -> serde_json::Value {
    json!({
        "results": results,
        "summary": summary,
    })
}

/// Probe every target, at most `concurrency` at a time.
/// Results come back in the order the targets were given.
pub async fn probe_all(
    probe: &MysqlProbe,
    targets: &[String],
    concurrency: usize,
) -> Vec<DetectResult> {
    let semaphore = Semaphore::new(concurrency.max(1));
    let mut tasks = FuturesUnordered::new();

    for (idx, target) in targets.iter().enumerate() {
        let semaphore = &semaphore;
        tasks.push(async move {
            // the semaphore is never closed, so acquire cannot fail
            let _permit = semaphore.acquire().await.ok();
            (idx, probe.detect(target).await)
        });
    }

    let mut slots: Vec<Option<DetectResult>> = vec![None; targets.len()];
    while let Some((idx, res)) = tasks.next().await {
        debug!(
            addr = %res.target,
            detected = res.detected,
            duration_ms = res.duration_ms,
            "probe finished"
        );
        slots[idx] = Some(res);
    }
    slots.into_iter().flatten().collect()
}

fn print_human(results: &[DetectResult]) {
    for r in results {
        match &r.handshake {
            Some(h) => {
                println!("{}  {}", r.target.bold(), "detected".green());
                for line in h.to_string().lines() {
                    println!("  {}", line);
                }
            }
            None => {
                println!("{}  {}", r.target.bold(), "not detected".red());
            }
        }
    }
}

/// Failures go to stderr whatever the stdout format.
fn print_errors(results: &[DetectResult]) {
    for r in results {
        if let Some(e) = &r.error {
            eprintln!("{}: {}", r.target, e);
        }
    }
}

/// Validate the command line, probe every target and report.
pub async fn run(cli: Cli) -> Result<ScanSummary> {
    if cli.concurrency == 0 || cli.concurrency > 1024 {
        bail!("--concurrency must be between 1 and 1024");
    }
    let targets = cli
        .targets
        .iter()
        .map(|t| parse_target(t))
        .collect::<Result<Vec<_>>>()?;

    let probe = MysqlProbe::new(Duration::from_secs(cli.timeout));
    let results = probe_all(&probe, &targets, cli.concurrency).await;
    let summary = ScanSummary::from_results(&results);
    let doc = results_document(&results, &summary);

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&doc)?);
    } else {
        print_human(&results);
        if results.len() > 1 {
            println!();
            println!("{}", "Scan summary".bold().underline());
            println!("  Targets:      {}", summary.targets);
            println!("  Detected:     {}", summary.detected);
            println!("  Not detected: {}", summary.failed);
        }
    }
    print_errors(&results);

    if !cli.json_out.is_empty() {
        if let Err(e) = write_json_file_atomic(&cli.json_out, &doc) {
            warn!(path = %cli.json_out, error = %e, "failed to write JSON output");
            eprintln!("Failed to write JSON file {}: {}", &cli.json_out, e);
        } else {
            eprintln!("Wrote JSON output to {}", &cli.json_out);
        }
    }

    Ok(summary)
}
