use clap::Parser;
use classlint::ScanEngine;
use classlint::cli::{Args, Command, OutputFormat, ScanArgs};
use classlint::config;
use classlint::detector::ScanSettings;
use classlint::detectors;
use classlint::diagnostics::render_report;
use classlint::lifecycle::LifecycleTable;
use classlint::loader;
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    classlint::telemetry::init_tracing();
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{err:#}");
            ExitCode::from(2)
        }
    }
}

fn run() -> anyhow::Result<ExitCode> {
    let args = Args::parse();

    match args.command {
        Some(Command::ListDetectors) => {
            list_detectors();
            Ok(ExitCode::SUCCESS)
        }
        Some(Command::Explain { detector }) => {
            explain_detector(&detector)?;
            Ok(ExitCode::SUCCESS)
        }
        Some(Command::Scan(scan)) => scan_command(scan),
        None => scan_command(args.scan),
    }
}

fn list_detectors() {
    let registry = detectors::default_registry(LifecycleTable::android_defaults());
    let mut all: Vec<_> = registry.descriptors().collect();
    all.sort_by_key(|d| d.name);

    for d in all {
        println!("{}\t{}\t{}", d.name, d.category.as_str(), d.description);
    }
}

fn explain_detector(name: &str) -> anyhow::Result<()> {
    let registry = detectors::default_registry(LifecycleTable::android_defaults());
    let Some(d) = registry.find_descriptor(name) else {
        anyhow::bail!("unknown detector: {name}");
    };

    println!("name: {}", d.name);
    println!("category: {}", d.category.as_str());
    println!("description: {}", d.description);
    Ok(())
}

fn scan_command(args: ScanArgs) -> anyhow::Result<ExitCode> {
    if args.paths.is_empty() {
        anyhow::bail!("no corpus paths given");
    }

    let start_dir = infer_start_dir(&args.paths)?;
    let loaded_cfg = config::load_config(args.config.as_deref(), &start_dir)?;

    let (settings, lifecycle) = match loaded_cfg.as_ref() {
        Some((_path, cfg)) => (
            ScanSettings::default()
                .with_config_levels(cfg.detectors.levels.clone())
                .disable(cfg.detectors.disabled.clone()),
            cfg.lifecycle_table()
                .unwrap_or_else(LifecycleTable::android_defaults),
        ),
        None => (ScanSettings::default(), LifecycleTable::android_defaults()),
    };

    let registry = detectors::default_registry_filtered(lifecycle, &args.only, &args.skip)?;
    let engine = ScanEngine::new_with_settings(registry, settings);

    let classes = loader::collect_corpus(&args.paths)?;
    let outcome = engine.scan_corpus(&classes);

    #[cfg(feature = "telemetry")]
    for skipped in &outcome.skipped {
        tracing::warn!(
            class = %skipped.class,
            method = %skipped.method,
            error = %skipped.reason,
            "method excluded from analysis"
        );
    }

    match args.format {
        OutputFormat::Text => {
            if !outcome.diagnostics.is_empty() {
                println!("{}", render_report(&outcome.diagnostics));
            }
        }
        OutputFormat::Json => {
            let rows: Vec<JsonDiagnostic<'_>> = outcome
                .diagnostics
                .iter()
                .map(|d| JsonDiagnostic {
                    detector: d.detector.name,
                    severity: d.severity.as_str(),
                    file: &d.file,
                    line: d.line,
                    message: &d.message,
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
    }

    if args.deny_warnings && !outcome.diagnostics.is_empty() {
        return Ok(ExitCode::from(1));
    }
    Ok(ExitCode::SUCCESS)
}

fn infer_start_dir(paths: &[PathBuf]) -> anyhow::Result<PathBuf> {
    let first = &paths[0];
    if first.is_dir() {
        return Ok(first.clone());
    }
    match first.parent() {
        Some(parent) if parent.as_os_str().is_empty() => Ok(std::env::current_dir()?),
        Some(parent) => Ok(parent.to_path_buf()),
        None => Ok(std::env::current_dir()?),
    }
}

#[derive(Serialize)]
struct JsonDiagnostic<'a> {
    detector: &'a str,
    severity: &'a str,
    file: &'a str,
    line: u32,
    message: &'a str,
}
