use anyhow::{Context, Result, anyhow};
use serde_json::Value;
use tracing::warn;

use crate::data::DataAttachment;
use crate::providers::Provider;

use super::{DetectFuture, Detector, Provenance, RawDetection};

const PROMPT: &str = "You are an expert culinary vision assistant. Identify visible raw ingredients (not dishes) in the photo.
- Return a compact JSON object only, no prose.
- Keys: ingredients_en (array of lowercase English words), ingredients_jp (array of Japanese strings as users would type: katakana for foreign items, kanji where common), confidence (0..1).
- Avoid brand names and utensils.";

const DEFAULT_CONFIDENCE: f32 = 0.6;

/// Structured part of a vision model reply.
#[derive(Debug, Clone, PartialEq)]
pub struct VisionReply {
    pub english: Vec<String>,
    pub japanese: Vec<String>,
    pub confidence: f32,
}

impl VisionReply {
    /// No ingredients at the default confidence, used when the reply cannot be read.
    pub fn empty() -> Self {
        Self {
            english: Vec::new(),
            japanese: Vec::new(),
            confidence: DEFAULT_CONFIDENCE,
        }
    }
}

/// Asks a multimodal model to list the ingredients in a photo.
#[derive(Debug, Clone)]
pub struct VisionDetector<P: Provider> {
    provider: P,
}

impl<P: Provider> VisionDetector<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }
}

impl<P: Provider + 'static> Detector for VisionDetector<P> {
    fn name(&self) -> &'static str {
        "vision"
    }

    fn detect<'a>(&'a self, image: &'a DataAttachment) -> DetectFuture<'a> {
        let request = self
            .provider
            .clone()
            .append_user_input(PROMPT.to_string())
            .append_user_data(image.clone());
        Box::pin(async move {
            let response = request.complete().await?;
            let reply = match parse_vision_reply(&response.text) {
                Ok(reply) => reply,
                Err(err) => {
                    warn!(
                        "unusable reply from {}: {:#}",
                        response.model.as_deref().unwrap_or("vision model"),
                        err
                    );
                    VisionReply::empty()
                }
            };
            Ok(RawDetection {
                english: reply.english,
                japanese: reply.japanese,
                confidence: Some(reply.confidence),
                provenance: Provenance::ExternalVision,
            })
        })
    }
}

/// Reads the JSON object out of a model reply, fenced or bare.
pub fn parse_vision_reply(text: &str) -> Result<VisionReply> {
    let body = fenced_block(text).unwrap_or(text).trim();
    let value: Value =
        serde_json::from_str(body).with_context(|| "vision reply is not valid JSON")?;
    let object = value
        .as_object()
        .ok_or_else(|| anyhow!("vision reply is not a JSON object"))?;

    let confidence = object
        .get("confidence")
        .and_then(Value::as_f64)
        .map(|value| value as f32)
        .unwrap_or(DEFAULT_CONFIDENCE);

    Ok(VisionReply {
        english: string_items(object.get("ingredients_en")),
        japanese: string_items(object.get("ingredients_jp")),
        confidence,
    })
}

fn string_items(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .filter(|item| !item.trim().is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn fenced_block(text: &str) -> Option<&str> {
    let start = text.find("```")?;
    let rest = &text[start + 3..];
    let tag_len = rest
        .find(|ch: char| !ch.is_ascii_alphabetic())
        .unwrap_or(rest.len());
    let rest = &rest[tag_len..];
    match rest.find("```") {
        Some(end) => Some(&rest[..end]),
        None => Some(rest),
    }
}
