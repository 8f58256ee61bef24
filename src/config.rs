//! Environment-based configuration.

use std::path::PathBuf;

pub const DEFAULT_MODEL_PATH: &str = "data/yolov5m.onnx";
pub const DEFAULT_FONT_PATH: &str = "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf";

#[derive(Clone, Debug)]
pub struct Config {
    pub model_path: PathBuf,
    pub classes_path: Option<PathBuf>,
    pub font_path: PathBuf,
    pub port: u16,
    pub img_size: u32,
    /// Default confidence threshold when a request does not pass `conf`.
    pub conf_thres: f32,
    /// Default IoU threshold when a request does not pass `iou`.
    pub iou_thres: f32,
    pub engine_pool_size: usize,
    /// Intra-op threads per session, 0 leaves the runtime default.
    pub engine_threads: usize,
    pub max_upload_mb: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            classes_path: None,
            font_path: PathBuf::from(DEFAULT_FONT_PATH),
            port: 8000,
            img_size: 640,
            conf_thres: 0.25,
            iou_thres: 0.45,
            engine_pool_size: 2,
            engine_threads: 0,
            max_upload_mb: 64,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup. Unparseable values fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Self {
            model_path: lookup("MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.model_path),
            classes_path: lookup("CLASSES_PATH")
                .filter(|p| !p.is_empty())
                .map(PathBuf::from),
            font_path: lookup("FONT_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.font_path),
            port: parse_var(&lookup, "PORT").unwrap_or(defaults.port),
            img_size: parse_var(&lookup, "IMG_SIZE")
                .filter(|s: &u32| *s > 0)
                .unwrap_or(defaults.img_size),
            conf_thres: parse_var(&lookup, "CONF_THRES")
                .filter(|t: &f32| (0.0..=1.0).contains(t))
                .unwrap_or(defaults.conf_thres),
            iou_thres: parse_var(&lookup, "IOU_THRES")
                .filter(|t: &f32| (0.0..=1.0).contains(t))
                .unwrap_or(defaults.iou_thres),
            engine_pool_size: parse_var(&lookup, "ENGINE_POOL_SIZE")
                .filter(|n: &usize| *n > 0)
                .unwrap_or(defaults.engine_pool_size),
            engine_threads: parse_var(&lookup, "ENGINE_THREADS").unwrap_or(defaults.engine_threads),
            max_upload_mb: parse_var(&lookup, "MAX_UPLOAD_MB")
                .filter(|n: &usize| *n > 0)
                .unwrap_or(defaults.max_upload_mb),
        }
    }

    /// File name of the model, reported by the health probe.
    /// Request body limit in bytes, saturating for absurd `MAX_UPLOAD_MB` values.
    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }

    pub fn model_name(&self) -> String {
        self.model_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.model_path.display().to_string())
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(key).and_then(|v| v.trim().parse().ok())
}
