use crate::cli::{OutputFormat, Settings};
use crossing_pipes_lib::{Asset, CheckError, CrossingReport, Network, find_crossing_pipes};
use serde::Deserialize;
use std::io::{self, BufReader, Read, Write};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Invalid network snapshot: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Check(#[from] CheckError),
}

/// On-disk network snapshot
#[derive(Debug, Deserialize)]
struct Snapshot {
    assets: Vec<Asset>,
}

/// Read a snapshot from `path`, or stdin when `path` is `-`
pub fn load_network(path: &Path) -> Result<Network, CliError> {
    let reader: Box<dyn Read> = if path == Path::new("-") {
        Box::new(io::stdin().lock())
    } else {
        Box::new(std::fs::File::open(path)?)
    };
    let snapshot: Snapshot = serde_json::from_reader(BufReader::new(reader))?;
    tracing::info!(
        "Loaded {} assets from {}",
        snapshot.assets.len(),
        path.display()
    );

    Ok(Network::new(snapshot.assets)?)
}

pub fn write_reports(
    reports: &[CrossingReport],
    format: OutputFormat,
    out: &mut impl Write,
) -> Result<(), CliError> {
    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, reports)?;
            writeln!(out)?;
        }
        OutputFormat::Text => {
            for report in reports {
                let [x, y] = report.intersection_point;
                writeln!(
                    out,
                    "{} crosses {} at ({x}, {y}), {:.3} from the nearest junction",
                    report.pipe1, report.pipe2, report.distance_to_nearest_junction
                )?;
            }
        }
    }
    Ok(())
}

/// Load, check and print; returns the number of crossings found
pub async fn run(settings: Settings) -> Result<usize, CliError> {
    let network = load_network(&settings.input)?;
    let config = settings.check_config();
    tracing::debug!("Checking {} pipes with {:?}", network.pipe_count(), config);

    let reports = find_crossing_pipes(&network, &config).await?;

    let mut out = io::stdout().lock();
    write_reports(&reports, settings.format, &mut out)?;
    out.flush()?;
    Ok(reports.len())
}
