mod replay;

use clap::Parser;
use frcnn::io::load_bgr_image;
use frcnn::{Detection, Detector, DetectorConfig, TensorNames};
use replay::ReplayEngine;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

const SCHEMA_JSON: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.schema.json"));
const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

#[derive(Parser, Debug)]
#[command(author, version, about = "Faster R-CNN post-processing CLI (JSON config driven)")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "config.json")]
    config: PathBuf,
    /// Print the JSON schema and exit.
    #[arg(long)]
    print_schema: bool,
    /// Print an example config and exit.
    #[arg(long)]
    print_example: bool,
    /// Enable tracing output.
    #[arg(long)]
    trace: bool,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct TensorNamesJson {
    rois: String,
    cls_prob: String,
    bbox_pred: String,
    roi_pool_prefix: String,
}

impl Default for TensorNamesJson {
    fn default() -> Self {
        let names = TensorNames::default();
        Self {
            rois: names.rois,
            cls_prob: names.cls_prob,
            bbox_pred: names.bbox_pred,
            roi_pool_prefix: names.roi_pool_prefix,
        }
    }
}

impl From<TensorNamesJson> for TensorNames {
    fn from(value: TensorNamesJson) -> Self {
        Self {
            rois: value.rois,
            cls_prob: value.cls_prob,
            bbox_pred: value.bbox_pred,
            roi_pool_prefix: value.roi_pool_prefix,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct DetectorConfigJson {
    pixel_means: [f32; 3],
    test_scales: Vec<f32>,
    test_max_size: f32,
    score_threshold: f32,
    nms_iou_threshold: f32,
    num_classes: usize,
    iterative_rounds: Option<usize>,
    names: TensorNamesJson,
}

impl Default for DetectorConfigJson {
    fn default() -> Self {
        let cfg = DetectorConfig::default();
        Self {
            pixel_means: cfg.pixel_means,
            test_scales: cfg.test_scales,
            test_max_size: cfg.test_max_size,
            score_threshold: cfg.score_threshold,
            nms_iou_threshold: cfg.nms_iou_threshold,
            num_classes: cfg.num_classes,
            iterative_rounds: cfg.iterative_rounds,
            names: TensorNamesJson::default(),
        }
    }
}

impl From<DetectorConfigJson> for DetectorConfig {
    fn from(value: DetectorConfigJson) -> Self {
        Self {
            pixel_means: value.pixel_means,
            test_scales: value.test_scales,
            test_max_size: value.test_max_size,
            score_threshold: value.score_threshold,
            nms_iou_threshold: value.nms_iou_threshold,
            num_classes: value.num_classes,
            iterative_rounds: value.iterative_rounds,
            names: value.names.into(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Config {
    image_path: String,
    /// Recorded network outputs replayed in place of a live engine.
    outputs_path: String,
    output_path: Option<String>,
    /// Labels indexed by class; entry 0 is the background label.
    class_names: Vec<String>,
    detector: DetectorConfigJson,
}

#[derive(Debug, Serialize)]
struct DetectionRecord {
    class_index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    label: Option<String>,
    score: f32,
    bbox: [f32; 4],
}

impl DetectionRecord {
    fn new(det: &Detection, class_names: &[String]) -> Self {
        Self {
            class_index: det.class_index(),
            label: class_names.get(det.class_index()).cloned(),
            score: det.score(),
            bbox: det.bbox().to_array(),
        }
    }
}

#[derive(Debug, Serialize)]
struct Output {
    image_width: usize,
    image_height: usize,
    detections: Vec<DetectionRecord>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env().add_directive("frcnn=info".parse()?))
            .with_target(false)
            .init();
    }

    if cli.print_schema {
        println!("{SCHEMA_JSON}");
        return Ok(());
    }
    if cli.print_example {
        println!("{EXAMPLE_JSON}");
        return Ok(());
    }

    let config_text = fs::read_to_string(&cli.config)?;
    let config: Config = serde_json::from_str(&config_text)?;
    if config.image_path.is_empty() || config.outputs_path.is_empty() {
        return Err("image_path and outputs_path must be set in the config".into());
    }

    let detector_cfg: DetectorConfig = config.detector.into();
    if !config.class_names.is_empty() && config.class_names.len() != detector_cfg.num_classes {
        return Err(format!(
            "class_names has {} entries but num_classes is {}",
            config.class_names.len(),
            detector_cfg.num_classes
        )
        .into());
    }

    let image = load_bgr_image(&config.image_path)?;
    let engine = ReplayEngine::open(Path::new(&config.outputs_path), detector_cfg.names.clone())?;
    let mut detector = Detector::new(engine, detector_cfg)?;
    let detections = detector.detect(image.view())?;
    tracing::info!(
        image = config.image_path.as_str(),
        detections = detections.len(),
        "detection finished"
    );

    let output = Output {
        image_width: image.width(),
        image_height: image.height(),
        detections: detections
            .iter()
            .map(|det| DetectionRecord::new(det, &config.class_names))
            .collect(),
    };
    let json = serde_json::to_string_pretty(&output)?;

    match config.output_path {
        Some(path) => fs::write(path, json)?,
        None => println!("{json}"),
    }

    Ok(())
}
