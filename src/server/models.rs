use serde::{Deserialize, Serialize};

use crate::detect::DetectionResult;
use crate::recipe::{Recipe, SearchResult, SourceLabel};

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub(crate) struct SearchParams {
    pub(crate) ingredients: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SearchResponse {
    pub(crate) recipes: Vec<Recipe>,
    pub(crate) source: SourceLabel,
    pub(crate) count: usize,
    pub(crate) local_count: usize,
    pub(crate) external_count: usize,
}

impl From<SearchResult> for SearchResponse {
    fn from(result: SearchResult) -> Self {
        Self {
            source: result.source_label(),
            count: result.recipes.len(),
            local_count: result.local_count,
            external_count: result.external_count,
            recipes: result.recipes,
        }
    }
}

/// JSON form of a detection upload; multipart posts use an `image` field instead.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub(crate) struct DetectRequest {
    pub(crate) data_base64: Option<String>,
    pub(crate) data_mime: Option<String>,
    pub(crate) backend: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct DetectResponse {
    pub(crate) ingredients_en: Vec<String>,
    pub(crate) ingredients_jp: Vec<String>,
    pub(crate) confidence: Option<f32>,
    pub(crate) source: &'static str,
}

impl From<&DetectionResult> for DetectResponse {
    fn from(result: &DetectionResult) -> Self {
        Self {
            ingredients_en: result.english().to_vec(),
            ingredients_jp: result.japanese().to_vec(),
            confidence: result.confidence(),
            source: result.provenance().as_str(),
        }
    }
}

const LEGACY_LABEL_COUNT: usize = 3;
const LEGACY_MODEL: &str = "Image Processing + Food Recognition";

/// Shape returned by `/api/detect-ingredients` to older clients.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LegacyDetectResponse {
    pub(crate) ingredients: Vec<String>,
    pub(crate) detected_labels: Vec<String>,
    pub(crate) model: &'static str,
    #[serde(flatten)]
    pub(crate) detection: DetectResponse,
}

impl From<&DetectionResult> for LegacyDetectResponse {
    fn from(result: &DetectionResult) -> Self {
        let ingredients = result.english().to_vec();
        Self {
            detected_labels: ingredients.iter().take(LEGACY_LABEL_COUNT).cloned().collect(),
            ingredients,
            model: LEGACY_MODEL,
            detection: DetectResponse::from(result),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub(crate) struct TranslateRequest {
    pub(crate) text: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct TranslateResponse {
    pub(crate) translation: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct HealthResponse {
    pub(crate) status: &'static str,
    pub(crate) message: &'static str,
}

#[derive(Debug, Serialize)]
pub(crate) struct ReloadResponse {
    pub(crate) message: String,
    pub(crate) count: usize,
}

#[derive(Debug, Serialize)]
pub(crate) struct ErrorResponse {
    pub(crate) error: String,
}
