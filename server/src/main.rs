use anyhow::Context;
use api::ApiBridge;
use clap::Parser;
use generator::profile::{build_spectrum, to_delimited_text, GeneratorConfig};
use ingest::parse_upload;
use log::{info, warn};
use spectracore::interface::ProcessResponse;
use spectracore::pipeline::BatchPolicy;
use spectracore::prelude::Series;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;
use workflow::config::ServiceConfig;
use workflow::runner::Runner;

mod api;
mod generator;
mod ingest;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Spectral processing service and offline driver")]
struct Args {
    /// Load the service configuration from YAML
    #[arg(long)]
    config: Option<PathBuf>,
    /// Address for the HTTP API, overrides the config file
    #[arg(long)]
    bind: Option<String>,
    /// Spectrum files (.esp, .txt, .csv) to process offline
    #[arg(long, num_args = 1..)]
    input: Vec<PathBuf>,
    /// Process a generated spectrum offline
    #[arg(long, default_value_t = false)]
    demo: bool,
    /// Seed for the generated spectrum
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Also write the generated spectrum as two-column CSV
    #[arg(long)]
    export_demo: Option<PathBuf>,
    /// Enable baseline removal, smoothing, normalization and peak detection
    #[arg(long, default_value_t = false)]
    full: bool,
    /// Keep processing the remaining series when one fails
    #[arg(long, default_value_t = false)]
    skip_failed: bool,
    /// Write the offline result as JSON to this file instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
    /// Run the HTTP API until Ctrl+C
    #[arg(long, default_value_t = false)]
    serve: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let policy = args.skip_failed.then_some(BatchPolicy::SkipFailed);
    let mut service_config = if let Some(path) = &args.config {
        ServiceConfig::load(path)?
    } else {
        ServiceConfig::from_args(args.bind.clone(), policy)
    };
    if let Some(bind) = args.bind.clone() {
        service_config.bind = bind;
    }
    if let Some(policy) = policy {
        service_config.batch_policy = policy;
    }

    let runner = Arc::new(Runner::new(service_config.clone()));

    let offline = args.demo || !args.input.is_empty();
    if offline {
        let mut series = Vec::new();
        for path in &args.input {
            series.push(load_series(path)?);
        }
        if args.demo {
            let demo = build_spectrum(&GeneratorConfig {
                seed: args.seed,
                ..Default::default()
            })?;
            if let Some(path) = &args.export_demo {
                fs::write(path, to_delimited_text(&demo, ",")?)
                    .with_context(|| format!("writing {}", path.display()))?;
            }
            series.push(demo);
        }

        let pipeline_config = if args.full {
            service_config.pipeline.clone().with_all_stages()
        } else {
            service_config.pipeline.clone()
        };

        let response = runner.process(series, pipeline_config)?;
        report_offline(&response, args.output.as_deref())?;
    }

    if args.serve {
        let address = service_config.bind_address()?;
        let bridge = ApiBridge::new(runner.clone());
        let runtime = TokioBuilder::new_multi_thread()
            .enable_all()
            .build()
            .context("creating runtime for the HTTP API")?;
        runtime.block_on(async {
            tokio::select! {
                _ = bridge.serve(address) => {}
                result = signal::ctrl_c() => {
                    result.context("awaiting Ctrl+C to exit")?;
                    info!("shutting down HTTP API");
                }
            }
            Ok::<(), anyhow::Error>(())
        })?;
    } else if !offline {
        warn!("nothing to do: pass --input, --demo or --serve");
    }

    Ok(())
}

fn load_series(path: &Path) -> anyhow::Result<Series> {
    let content = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let spectrum = parse_upload(&filename, &content)?;
    Ok(Series::new(spectrum.frequencies, spectrum.amplitudes))
}

fn report_offline(response: &ProcessResponse, output: Option<&Path>) -> anyhow::Result<()> {
    info!(
        "offline run -> series {}, peaks {}, failures {}",
        response.processed_amplitudes.len(),
        response.total_peaks(),
        response.failures.len()
    );

    let json = serde_json::to_string_pretty(response).context("serializing offline result")?;
    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
        }
        None => println!("{}", json),
    }
    Ok(())
}
