//! Run a wav file through the VAD pipeline and print per-patch decisions.
//!
//! ```text
//! listen <file.wav> [--metadata <metadata.json>] [--block-size <n>] [--model <model.onnx>]
//! ```
//!
//! Without `--model` (or without the `onnx` feature) the stub classifier is
//! used, which exercises the whole pipeline but carries no trained weights.

use std::path::PathBuf;
use std::time::Duration;

use specvad_core::frame::WavFrameSource;
use specvad_core::{ClassifierHandle, EngineConfig, ModelMetadata, StubClassifier, VadEngine};

fn main() {
    if let Err(e) = run() {
        eprintln!("listen failed: {e}");
        std::process::exit(1);
    }
}

#[derive(Debug)]
struct Args {
    wav: PathBuf,
    metadata: Option<PathBuf>,
    block_size: usize,
    model: Option<PathBuf>,
}

fn parse_args() -> Result<Args, String> {
    let mut wav: Option<PathBuf> = None;
    let mut metadata: Option<PathBuf> = None;
    let mut block_size: usize = 2048;
    let mut model: Option<PathBuf> = None;

    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--metadata" => {
                metadata = Some(PathBuf::from(
                    it.next().ok_or("--metadata requires a path")?,
                ));
            }
            "--block-size" => {
                block_size = it
                    .next()
                    .ok_or("--block-size requires a number")?
                    .parse()
                    .map_err(|e| format!("invalid --block-size: {e}"))?;
            }
            "--model" => {
                model = Some(PathBuf::from(it.next().ok_or("--model requires a path")?));
            }
            other if wav.is_none() => wav = Some(PathBuf::from(other)),
            other => return Err(format!("unexpected argument: {other}")),
        }
    }

    Ok(Args {
        wav: wav.ok_or("usage: listen <file.wav> [--metadata <json>] [--block-size <n>]")?,
        metadata,
        block_size,
        model,
    })
}

#[cfg_attr(not(feature = "onnx"), allow(unused_variables))]
fn build_classifier(args: &Args, config: &EngineConfig) -> Result<ClassifierHandle, String> {
    #[cfg(feature = "onnx")]
    if let Some(model) = &args.model {
        let classifier =
            specvad_core::OnnxClassifier::new(model, config.frames_in_patch, config.frequency_bins)
                .map_err(|e| e.to_string())?;
        return Ok(ClassifierHandle::new(classifier));
    }

    #[cfg(not(feature = "onnx"))]
    if args.model.is_some() {
        return Err("--model requires the 'onnx' feature".into());
    }

    Ok(ClassifierHandle::new(StubClassifier::new()))
}

#[tokio::main]
async fn run() -> Result<(), String> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = parse_args()?;

    let meta = match &args.metadata {
        Some(path) => ModelMetadata::load(path).map_err(|e| e.to_string())?,
        None => ModelMetadata::default(),
    };
    let config = EngineConfig::from_metadata(&meta);

    let source = WavFrameSource::open(&args.wav, args.block_size, config.frequency_bins)
        .map_err(|e| e.to_string())?;
    let total_frames = source.frames_remaining();

    let classifier = build_classifier(&args, &config)?;
    let engine = VadEngine::new(config.clone(), classifier);
    engine.warm_up().map_err(|e| e.to_string())?;

    let mut rx = engine.subscribe();
    engine.start(source).map_err(|e| e.to_string())?;

    let expected_patches = total_frames / config.frames_in_patch;
    println!(
        "{} frames → {} patches (threshold {:.3})",
        total_frames, expected_patches, config.threshold
    );

    let mut received = 0usize;
    while received < expected_patches {
        match tokio::time::timeout(Duration::from_secs(5), rx.recv()).await {
            Ok(Ok(event)) => {
                received += 1;
                let marker = if event.is_speech { "speech" } else { "  --  " };
                println!(
                    "patch {:>4}  [{marker}]  confidence {:>5.1}%",
                    event.seq,
                    100.0 * event.confidence
                );
            }
            Ok(Err(_)) => break,
            Err(_) => {
                eprintln!("timed out waiting for classifications");
                break;
            }
        }
    }

    engine.stop().map_err(|e| e.to_string())?;

    let snap = engine.diagnostics_snapshot();
    println!(
        "done: {} patches classified, {} sentinel frames skipped, {} inference errors",
        snap.events_emitted, snap.sentinel_frames, snap.inference_errors
    );
    Ok(())
}
