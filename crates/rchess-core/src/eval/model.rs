//! 評価モデル（JSON）の読み書き
//!
//! 形式:
//! ```json
//! { "layout": "rchess-hce-v1", "theta": [ ... ] }
//! ```
//! または `theta` の代わりにグループ名をキーにした値（スカラーまたは配列）を並べる。
//! 両方ある場合は `theta` を優先する。

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;

use super::params::{EvalParams, THETA_LAYOUT};

/// モデルファイルのレイアウト識別子
pub const MODEL_LAYOUT: &str = "rchess-hce-v1";

/// モデル読み込みエラー
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("failed to read model: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse model JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported model layout: expected {expected}, found {found}")]
    Layout { expected: &'static str, found: String },

    #[error("weight group `{group}` has length {found}, expected {expected}")]
    Length {
        group: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("weight group `{0}` contains a non-numeric value")]
    InvalidValue(String),

    #[error("model has neither `theta` nor any weight group")]
    Empty,
}

#[derive(Debug, Serialize, Deserialize)]
struct ModelFile {
    layout: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    theta: Option<Vec<f64>>,
    #[serde(flatten)]
    groups: BTreeMap<String, JsonValue>,
}

/// 学習器が出力する実数重みを丸める
fn round_weight(v: f64) -> i32 {
    v.round().clamp(i32::MIN as f64, i32::MAX as f64) as i32
}

fn parse_group(name: &str, value: &JsonValue) -> Result<Vec<i32>, ModelError> {
    let number = |v: &JsonValue| {
        v.as_f64()
            .map(round_weight)
            .ok_or_else(|| ModelError::InvalidValue(name.to_string()))
    };
    match value {
        JsonValue::Array(items) => items.iter().map(number).collect(),
        other => Ok(vec![number(other)?]),
    }
}

impl EvalParams {
    /// JSON文字列からモデルを読み込む
    pub fn from_model_json(json: &str) -> Result<EvalParams, ModelError> {
        let file: ModelFile = serde_json::from_str(json)?;
        if file.layout != MODEL_LAYOUT {
            return Err(ModelError::Layout {
                expected: MODEL_LAYOUT,
                found: file.layout,
            });
        }

        if let Some(theta) = file.theta {
            let theta: Vec<i32> = theta.into_iter().map(round_weight).collect();
            return EvalParams::from_theta(&theta);
        }

        let known = |key: &str| THETA_LAYOUT.iter().any(|&(name, _)| name == key);
        if !file.groups.keys().any(|key| known(key)) {
            return Err(ModelError::Empty);
        }
        for key in file.groups.keys().filter(|key| !known(key)) {
            log::warn!("ignoring unknown weight group `{key}` in model");
        }

        let mut parsed = Vec::with_capacity(THETA_LAYOUT.len());
        for &(name, len) in THETA_LAYOUT.iter() {
            match file.groups.get(name) {
                Some(value) => {
                    let weights = parse_group(name, value)?;
                    if weights.len() != len {
                        return Err(ModelError::Length {
                            group: name,
                            expected: len,
                            found: weights.len(),
                        });
                    }
                    parsed.push(Some(weights));
                }
                None => {
                    log::warn!("weight group `{name}` missing from model, keeping default");
                    parsed.push(None);
                }
            }
        }

        let mut params = EvalParams::default();
        let mut groups = parsed.into_iter();
        params.visit_mut(|_, slice| {
            if let Some(Some(weights)) = groups.next() {
                slice.copy_from_slice(&weights);
            }
        });
        params.sanitize();
        Ok(params)
    }

    /// ファイルからモデルを読み込む
    pub fn load_model(path: impl AsRef<Path>) -> Result<EvalParams, ModelError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let params = EvalParams::from_model_json(&json)?;
        log::info!("loaded eval model from {}", path.display());
        Ok(params)
    }

    /// グループ形式のJSONへ書き出す
    pub fn to_model_json(&self) -> Result<String, ModelError> {
        let mut groups = BTreeMap::new();
        self.visit(|name, slice| {
            let value = if slice.len() == 1 {
                JsonValue::from(slice[0])
            } else {
                JsonValue::from(slice.to_vec())
            };
            groups.insert(name.to_string(), value);
        });
        let file = ModelFile {
            layout: MODEL_LAYOUT.to_string(),
            theta: None,
            groups,
        };
        Ok(serde_json::to_string_pretty(&file)?)
    }
}
