//! File-based model registry.
//!
//! Each symbol owns a set of deterministically-named slots under the
//! models directory: the final model blob, an optional best-checkpoint
//! blob, both fitted scaler states, and a metadata record. Every file is
//! published via temp-file-plus-rename, and the model blob is written
//! last, so a concurrent reader either resolves the previous artifact or
//! the complete new one. Writes for one symbol are not internally
//! serialized; callers run at most one training job per symbol at a time.

use crate::application::scaling::MinMaxScaler;
use crate::domain::errors::ForecastError;
use crate::domain::metrics::EvaluationMetrics;
use crate::domain::symbol::registry_candidates;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const FINAL_SUFFIX: &str = "_model.json";
const BEST_SUFFIX: &str = "_best.json";
const FEATURE_SCALER_SUFFIX: &str = "_feature_scaler.json";
const PRICE_SCALER_SUFFIX: &str = "_price_scaler.json";
const META_SUFFIX: &str = "_meta.json";

/// Which model slot an artifact was resolved from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelSlot {
    Final,
    BestCheckpoint,
}

/// Metadata persisted alongside a model blob.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactMeta {
    pub symbol: String,
    pub trained_at: DateTime<Utc>,
    pub version: String,
    pub metrics: EvaluationMetrics,
}

/// A complete artifact to publish for one symbol.
pub struct NewArtifact<'a> {
    pub model_blob: &'a [u8],
    pub feature_scaler: &'a MinMaxScaler,
    pub price_scaler: &'a MinMaxScaler,
    pub meta: ArtifactMeta,
}

/// A model resolved for inference. Carries only inference state: the
/// blob and its metadata, never trainer internals.
#[derive(Debug)]
pub struct ResolvedModel {
    /// The registry key that matched, which may differ from the symbol
    /// the caller supplied (suffix fallback).
    pub key: String,
    pub slot: ModelSlot,
    pub model_blob: Vec<u8>,
    pub meta: Option<ArtifactMeta>,
}

pub struct ModelRegistry {
    models_dir: PathBuf,
}

impl ModelRegistry {
    pub fn new(models_dir: impl Into<PathBuf>) -> Result<Self, ForecastError> {
        let models_dir = models_dir.into();
        fs::create_dir_all(&models_dir).map_err(|e| ForecastError::Storage {
            path: models_dir.clone(),
            source: e,
        })?;
        Ok(Self { models_dir })
    }

    pub fn models_dir(&self) -> &Path {
        &self.models_dir
    }

    /// Publishes a full artifact under `key`, overwriting any previous
    /// version. Scalers and metadata land before the model blob so a
    /// reader never resolves a half-written artifact.
    pub fn store(&self, key: &str, artifact: &NewArtifact<'_>) -> Result<(), ForecastError> {
        self.write_json(
            &format!("{key}{FEATURE_SCALER_SUFFIX}"),
            artifact.feature_scaler,
        )?;
        self.write_json(&format!("{key}{PRICE_SCALER_SUFFIX}"), artifact.price_scaler)?;
        self.write_json(&format!("{key}{META_SUFFIX}"), &artifact.meta)?;
        self.write_bytes(&format!("{key}{FINAL_SUFFIX}"), artifact.model_blob)?;
        debug!(key, "Artifact published");
        Ok(())
    }

    /// Publishes a best-validation checkpoint blob for `key`. Used by
    /// epoch-style trainers that track a best model separately from the
    /// final one; resolution prefers the final slot when both exist.
    pub fn store_checkpoint(&self, key: &str, model_blob: &[u8]) -> Result<(), ForecastError> {
        self.write_bytes(&format!("{key}{BEST_SUFFIX}"), model_blob)
    }

    /// Resolves a user-supplied symbol to a stored model, walking the
    /// candidate keys in priority order and preferring the final slot
    /// over the best-checkpoint slot within each. The suffix fallback is
    /// a silent retry, not an error.
    pub fn resolve(&self, symbol: &str) -> Result<ResolvedModel, ForecastError> {
        let candidates = registry_candidates(symbol);
        for key in &candidates {
            for (slot, suffix) in [
                (ModelSlot::Final, FINAL_SUFFIX),
                (ModelSlot::BestCheckpoint, BEST_SUFFIX),
            ] {
                let path = self.models_dir.join(format!("{key}{suffix}"));
                if !path.exists() {
                    continue;
                }
                let model_blob = fs::read(&path).map_err(|e| ForecastError::Storage {
                    path: path.clone(),
                    source: e,
                })?;
                let meta = self.load_meta(key)?;
                debug!(symbol, key, ?slot, "Model resolved");
                return Ok(ResolvedModel {
                    key: key.clone(),
                    slot,
                    model_blob,
                    meta,
                });
            }
        }
        Err(ForecastError::ModelNotFound {
            symbol: symbol.to_string(),
            candidates,
        })
    }

    /// Keys that have a persisted model in either slot. A pure read over
    /// the keyspace; never triggers training.
    pub fn trained_symbols(&self) -> Result<Vec<String>, ForecastError> {
        let entries = fs::read_dir(&self.models_dir).map_err(|e| ForecastError::Storage {
            path: self.models_dir.clone(),
            source: e,
        })?;

        let mut keys = BTreeSet::new();
        for entry in entries {
            let entry = entry.map_err(|e| ForecastError::Storage {
                path: self.models_dir.clone(),
                source: e,
            })?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            for suffix in [FINAL_SUFFIX, BEST_SUFFIX] {
                if let Some(key) = name.strip_suffix(suffix) {
                    keys.insert(key.to_string());
                }
            }
        }
        Ok(keys.into_iter().collect())
    }

    fn load_meta(&self, key: &str) -> Result<Option<ArtifactMeta>, ForecastError> {
        let path = self.models_dir.join(format!("{key}{META_SUFFIX}"));
        if !path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(&path).map_err(|e| ForecastError::Storage {
            path: path.clone(),
            source: e,
        })?;
        let meta = serde_json::from_slice(&bytes).map_err(|e| ForecastError::Codec {
            context: format!("artifact metadata for {key}"),
            source: e,
        })?;
        Ok(Some(meta))
    }

    fn write_json<T: Serialize>(&self, name: &str, value: &T) -> Result<(), ForecastError> {
        let bytes = serde_json::to_vec(value).map_err(|e| ForecastError::Codec {
            context: name.to_string(),
            source: e,
        })?;
        self.write_bytes(name, &bytes)
    }

    fn write_bytes(&self, name: &str, bytes: &[u8]) -> Result<(), ForecastError> {
        let tmp = self.models_dir.join(format!("{name}.tmp"));
        let path = self.models_dir.join(name);
        fs::write(&tmp, bytes).map_err(|e| ForecastError::Storage {
            path: tmp.clone(),
            source: e,
        })?;
        fs::rename(&tmp, &path).map_err(|e| ForecastError::Storage { path, source: e })
    }
}
