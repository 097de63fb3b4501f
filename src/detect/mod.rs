use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::data::DataAttachment;
use crate::lexicon::Lexicon;
use crate::terms::{self, OrderedTerms};

mod heuristic;
mod vision;

pub use heuristic::{HeuristicDetector, TAXONOMY, select_terms};
pub use vision::{VisionDetector, VisionReply, parse_vision_reply};

pub const DEFAULT_MAX_TERMS: usize = 20;

const FALLBACK_ENGLISH: [&str; 3] = ["tomato", "onion", "garlic"];
const FALLBACK_JAPANESE: [&str; 3] = ["トマト", "タマネギ", "ニンニク"];
const FALLBACK_CONFIDENCE: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    LocalHeuristic,
    ExternalVision,
    Fallback,
}

impl Provenance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provenance::LocalHeuristic => "local_heuristic",
            Provenance::ExternalVision => "external_vision",
            Provenance::Fallback => "fallback",
        }
    }
}

/// Which detector a request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectorBackend {
    #[default]
    Local,
    External,
}

impl FromStr for DetectorBackend {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "local" | "heuristic" => Ok(DetectorBackend::Local),
            "external" | "vision" | "gemini" | "openai" => Ok(DetectorBackend::External),
            other => Err(anyhow!(
                "unknown detector backend '{}' (expected local or external)",
                other
            )),
        }
    }
}

/// What a backend reports before normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDetection {
    pub english: Vec<String>,
    pub japanese: Vec<String>,
    pub confidence: Option<f32>,
    pub provenance: Provenance,
}

/// Normalized, bilingual detection output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectionResult {
    english: Vec<String>,
    japanese: Vec<String>,
    confidence: Option<f32>,
    provenance: Provenance,
}

impl DetectionResult {
    pub fn english(&self) -> &[String] {
        &self.english
    }

    pub fn japanese(&self) -> &[String] {
        &self.japanese
    }

    pub fn confidence(&self) -> Option<f32> {
        self.confidence
    }

    pub fn provenance(&self) -> Provenance {
        self.provenance
    }
}

pub type DetectFuture<'a> = Pin<Box<dyn Future<Output = Result<RawDetection>> + Send + 'a>>;

/// An ingredient detection strategy.
pub trait Detector: Send + Sync {
    fn name(&self) -> &'static str;
    fn detect<'a>(&'a self, image: &'a DataAttachment) -> DetectFuture<'a>;
}

/// Runs a detector and always hands back a usable, bilingual result.
#[derive(Clone)]
pub struct DetectorAdapter {
    lexicon: Arc<Lexicon>,
    local: Arc<dyn Detector>,
    external: Option<Arc<dyn Detector>>,
    max_terms: usize,
}

impl DetectorAdapter {
    pub fn new(lexicon: Arc<Lexicon>, local: Arc<dyn Detector>) -> Self {
        Self {
            lexicon,
            local,
            external: None,
            max_terms: DEFAULT_MAX_TERMS,
        }
    }

    pub fn with_external(mut self, external: Arc<dyn Detector>) -> Self {
        self.external = Some(external);
        self
    }

    pub fn with_max_terms(mut self, max_terms: usize) -> Self {
        if max_terms > 0 {
            self.max_terms = max_terms;
        }
        self
    }

    pub async fn detect(&self, image: &DataAttachment, backend: DetectorBackend) -> DetectionResult {
        let detector = match backend {
            DetectorBackend::Local => Some(&self.local),
            DetectorBackend::External => self.external.as_ref(),
        };
        let Some(detector) = detector else {
            warn!("no vision backend configured; using fallback detection");
            return self.fallback();
        };

        match detector.detect(image).await {
            Ok(raw) => {
                debug!(
                    "{} detected {} english / {} japanese terms",
                    detector.name(),
                    raw.english.len(),
                    raw.japanese.len()
                );
                self.finalize(raw)
            }
            Err(err) => {
                warn!("{} detection failed: {:#}", detector.name(), err);
                self.fallback()
            }
        }
    }

    /// Fills in the missing language, applies synonym closure and caps lengths.
    pub fn finalize(&self, raw: RawDetection) -> DetectionResult {
        let mut english = OrderedTerms::default();
        for term in &raw.english {
            let term = term.trim();
            if !term.is_empty() {
                english.push(terms::normalize_english(&self.lexicon, term));
            }
        }
        let english = english.into_vec();

        let mut japanese = OrderedTerms::default();
        for term in terms::close_japanese(&self.lexicon, &raw.japanese) {
            japanese.push(term);
        }
        let expanded = terms::expand_to_japanese(&self.lexicon, &english);
        for term in terms::close_japanese(&self.lexicon, &expanded) {
            japanese.push(term);
        }

        DetectionResult {
            english: cap(english, self.max_terms),
            japanese: cap(japanese.into_vec(), self.max_terms),
            confidence: raw.confidence.map(|value| value.clamp(0.0, 1.0)),
            provenance: raw.provenance,
        }
    }

    pub fn fallback(&self) -> DetectionResult {
        DetectionResult {
            english: FALLBACK_ENGLISH.iter().map(|term| term.to_string()).collect(),
            japanese: terms::close_japanese(&self.lexicon, &FALLBACK_JAPANESE),
            confidence: Some(FALLBACK_CONFIDENCE),
            provenance: Provenance::Fallback,
        }
    }
}

fn cap(mut terms: Vec<String>, max: usize) -> Vec<String> {
    terms.truncate(max);
    terms
}
