use anyhow::{anyhow, bail, Context, Result};
use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;

use crate::engine::{
    EngineSettings, DEFAULT_ATTRIBUTION_THRESHOLD, DEFAULT_DEVIATION_THRESHOLD, DEFAULT_N_LAGS,
};
use crate::models::artifacts::ArtifactPaths;

pub const DEFAULT_CONTAMINATION: f64 = 0.1;

#[derive(Debug, Clone)]
pub struct Config {
    pub http_bind: String,

    pub model_dir: PathBuf,
    pub scaler_path: PathBuf,
    pub anomaly_model_path: PathBuf,
    pub registry_path: Option<PathBuf>,

    pub n_lags: usize,
    pub attribution_threshold: f64,
    pub deviation_threshold: f64,
    pub contamination: f64,

    pub cors_allow_any: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let http_bind = env_string("INFER_HTTP_BIND", Some("127.0.0.1:8000".to_string()))?;

        let model_dir = PathBuf::from(env_string(
            "INFER_MODEL_DIR",
            Some("modelos_predicao".to_string()),
        )?);
        let scaler_path =
            PathBuf::from(env_string("INFER_SCALER_FILE", Some("scaler.json".to_string()))?);
        let anomaly_model_path = PathBuf::from(env_string(
            "INFER_ANOMALY_MODEL_FILE",
            Some("isolation_forest.json".to_string()),
        )?);
        let registry_path = env_optional("INFER_REGISTRY_FILE").map(PathBuf::from);

        let n_lags = env_u64("INFER_N_LAGS", Some(DEFAULT_N_LAGS as u64))? as usize;
        let attribution_threshold =
            env_f64("INFER_ATTRIBUTION_THRESHOLD", Some(DEFAULT_ATTRIBUTION_THRESHOLD))?;
        let deviation_threshold =
            env_f64("INFER_DEVIATION_THRESHOLD", Some(DEFAULT_DEVIATION_THRESHOLD))?;
        let contamination = env_f64("INFER_CONTAMINATION", Some(DEFAULT_CONTAMINATION))?;

        let cors_allow_any = env_bool("INFER_CORS_ALLOW_ANY", true)?;

        let config = Self {
            http_bind,
            model_dir,
            scaler_path,
            anomaly_model_path,
            registry_path,
            n_lags,
            attribution_threshold,
            deviation_threshold,
            contamination,
            cors_allow_any,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.n_lags == 0 {
            bail!("INFER_N_LAGS must be at least 1");
        }
        for (key, value) in [
            ("INFER_ATTRIBUTION_THRESHOLD", self.attribution_threshold),
            ("INFER_DEVIATION_THRESHOLD", self.deviation_threshold),
        ] {
            if !value.is_finite() || value <= 0.0 {
                bail!("{key} must be a positive number, got {value}");
            }
        }
        if !(self.contamination > 0.0 && self.contamination <= 0.5) {
            bail!(
                "INFER_CONTAMINATION must be in (0, 0.5], got {}",
                self.contamination
            );
        }
        Ok(())
    }

    pub fn artifact_paths(&self) -> ArtifactPaths {
        ArtifactPaths {
            model_dir: self.model_dir.clone(),
            scaler: self.scaler_path.clone(),
            anomaly_model: self.anomaly_model_path.clone(),
        }
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            n_lags: self.n_lags,
            attribution_threshold: self.attribution_threshold,
            deviation_threshold: self.deviation_threshold,
        }
    }
}

fn env_string(key: &str, default: Option<String>) -> Result<String> {
    match env::var(key) {
        Ok(value) => Ok(value.trim().to_string()),
        Err(_) => default.ok_or_else(|| anyhow!("missing env var {key}")),
    }
}

fn env_u64(key: &str, default: Option<u64>) -> Result<u64> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse::<u64>()
            .with_context(|| format!("invalid {key}")),
        Err(_) => default.ok_or_else(|| anyhow!("missing env var {key}")),
    }
}

fn env_f64(key: &str, default: Option<f64>) -> Result<f64> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse::<f64>()
            .with_context(|| format!("invalid {key}")),
        Err(_) => default.ok_or_else(|| anyhow!("missing env var {key}")),
    }
}

fn env_bool(key: &str, default: bool) -> Result<bool> {
    match env_optional(key) {
        Some(value) => match value.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => bail!("invalid {key}: {other}"),
        },
        None => Ok(default),
    }
}

fn env_optional(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
