use std::path::{Path, PathBuf};

use anyhow::Context;
use structopt::StructOpt;

pub const DEFAULT_MODEL_PATH: &str = "public/model/plant_disease_prediction_model.onnx";
pub const DEFAULT_CLASS_INDICES_PATH: &str = "public/model/class_indices.json";

#[derive(Debug, StructOpt)]
#[structopt(name = "plant-disease-backend", about = "Classifies plant leaf photos by disease")]
pub struct Opt {
    /// ONNX model artifact, relative to the executable's directory unless absolute
    #[structopt(long, parse(from_os_str))]
    pub model_path: Option<PathBuf>,
    /// JSON table mapping class index to class name
    #[structopt(long, parse(from_os_str))]
    pub class_indices: Option<PathBuf>,
    #[structopt(long, default_value = "127.0.0.1")]
    pub host: String,
    #[structopt(short, long, default_value = "5000")]
    pub port: u16,
    /// The single origin allowed to call /api/*
    #[structopt(long, default_value = "http://localhost:3000")]
    pub allowed_origin: String,
    #[structopt(long, default_value = "10485760")]
    pub max_upload_bytes: usize,
}

/// Fully resolved settings the server starts from.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub model_path: PathBuf,
    pub class_indices_path: PathBuf,
    pub bind_addr: (String, u16),
    pub allowed_origin: String,
    pub max_upload_bytes: usize,
}

impl Settings {
    pub fn from_opt(opt: Opt, base_dir: &Path) -> Self {
        let resolve = |path: Option<PathBuf>, default: &str| {
            let path = path.unwrap_or_else(|| PathBuf::from(default));
            if path.is_absolute() {
                path
            } else {
                base_dir.join(path)
            }
        };

        Self {
            model_path: resolve(opt.model_path, DEFAULT_MODEL_PATH),
            class_indices_path: resolve(opt.class_indices, DEFAULT_CLASS_INDICES_PATH),
            bind_addr: (opt.host, opt.port),
            allowed_origin: opt.allowed_origin,
            max_upload_bytes: opt.max_upload_bytes,
        }
    }
}

/// Directory holding the running executable; asset paths hang off it.
pub fn base_dir() -> anyhow::Result<PathBuf> {
    let exe = std::env::current_exe().context("Could not locate the running executable")?;
    exe.parent()
        .map(Path::to_path_buf)
        .context("Executable path has no parent directory")
}
