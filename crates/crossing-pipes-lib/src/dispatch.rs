//! Execution dispatcher for the crossing check
//!
//! Runs encode → detect → decode as one awaitable unit. Detection either runs inline or on a
//! dedicated worker thread that takes ownership of the encoded buffers and replies with the
//! raw crossings. Decoding always happens on the caller's side because it needs the network.
//! Both paths produce identical output.
//!
//! There is no mid-run cancellation: dropping the returned future stops waiting, and the
//! worker finishes its pass and discards the result.

use crate::decode::decode;
use crate::detect::{self, DetectParams, RawCrossing};
use crate::encode::{EncodedNetwork, NetworkBuffers, encode};
use crate::{CheckConfig, CheckError, CrossingReport, ExecutionMode, IdLookup, Network, Result};
use tokio::sync::oneshot;

/// Name given to the background detection thread
pub const WORKER_THREAD_NAME: &str = "crossing-pipes-worker";

/// Run detection on a fresh background thread that owns the buffers
///
/// Fails where threads are unavailable (e.g. wasm32); the buffers are dropped in that case.
fn spawn_worker(
    buffers: NetworkBuffers,
    params: DetectParams,
) -> std::io::Result<oneshot::Receiver<Vec<RawCrossing>>> {
    let (reply, response) = oneshot::channel();

    std::thread::Builder::new()
        .name(WORKER_THREAD_NAME.to_string())
        .spawn(move || {
            #[cfg(feature = "profiling")]
            profiling::register_thread!("crossing-pipes-worker");

            let raw = detect::find_crossings(&buffers, params);
            if reply.send(raw).is_err() {
                tracing::debug!("Crossing check caller went away, discarding results");
            }
        })?;

    Ok(response)
}

/// Encoded network ready for detection, or `None` when there is nothing to check
fn prepare(network: &Network, config: &CheckConfig) -> Result<Option<EncodedNetwork>> {
    config.validate()?;

    if network.pipe_count() < 2 {
        tracing::debug!("Skipping crossing detection: {} pipes", network.pipe_count());
        return Ok(None);
    }

    let encoded = encode(network);
    if encoded.stats.pipes < 2 || encoded.stats.segments == 0 {
        tracing::debug!(
            "Skipping crossing detection: {} pipes, {} segments",
            encoded.stats.pipes,
            encoded.stats.segments
        );
        return Ok(None);
    }
    Ok(Some(encoded))
}

fn finish(
    raw: Vec<RawCrossing>,
    encoded_pipes: usize,
    id_lookup: &IdLookup,
    network: &Network,
) -> Result<Vec<CrossingReport>> {
    let reports = decode(raw, id_lookup, network)?;
    tracing::info!(
        "Crossing check finished: {} crossings among {} pipes",
        reports.len(),
        encoded_pipes
    );
    Ok(reports)
}

/// Find unintended pipe crossings in `network`
///
/// Detection runs on a background thread unless `config.execution` is
/// [`ExecutionMode::Inline`] or no thread can be spawned, in which case it runs on the
/// calling thread. The result is the same either way.
///
/// # Example
/// ```ignore
/// let reports = find_crossing_pipes(&network, &CheckConfig::with_tolerance(0.5)).await?;
/// for report in reports {
///     println!("{} crosses {}", report.pipe1, report.pipe2);
/// }
/// ```
pub async fn find_crossing_pipes(
    network: &Network,
    config: &CheckConfig,
) -> Result<Vec<CrossingReport>> {
    let Some(EncodedNetwork {
        buffers,
        id_lookup,
        stats,
    }) = prepare(network, config)?
    else {
        return Ok(Vec::new());
    };
    let params = config.detect_params();

    let raw = match config.execution {
        ExecutionMode::Inline => detect::find_crossings(&buffers, params),
        ExecutionMode::Worker => match spawn_worker(buffers, params) {
            Ok(response) => response.await.map_err(|_| CheckError::WorkerDisconnected)?,
            Err(err) => {
                tracing::warn!("Could not start detection worker ({}), running inline", err);
                detect::find_crossings(&encode(network).buffers, params)
            }
        },
    };

    finish(raw, stats.pipes, &id_lookup, network)
}

/// Find unintended pipe crossings on the calling thread
pub fn find_crossing_pipes_inline(
    network: &Network,
    config: &CheckConfig,
) -> Result<Vec<CrossingReport>> {
    let Some(encoded) = prepare(network, config)? else {
        return Ok(Vec::new());
    };

    let raw = detect::find_crossings(&encoded.buffers, config.detect_params());
    finish(raw, encoded.stats.pipes, &encoded.id_lookup, network)
}
