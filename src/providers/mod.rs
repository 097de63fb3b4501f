use anyhow::{Result, anyhow};
use serde::Serialize;
use std::future::Future;
use std::pin::Pin;

use crate::data::DataAttachment;

mod gemini;
mod openai;

pub use gemini::Gemini;
pub use openai::OpenAI;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    OpenAI,
    Gemini,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAI => "openai",
            ProviderKind::Gemini => "gemini",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSelection {
    pub provider: ProviderKind,
    pub requested_model: Option<String>,
}

/// Free-form reply of a vision model.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderResponse {
    pub text: String,
    pub model: Option<String>,
}

#[derive(Debug, Clone)]
pub enum MessagePart {
    Text(String),
    Data(DataAttachment),
}

pub type ProviderFuture = Pin<Box<dyn Future<Output = Result<ProviderResponse>> + Send>>;

/// A remote model that answers a prompt about attached images.
pub trait Provider: Clone + Send + Sync {
    fn append_user_input(self, input: String) -> Self;
    fn append_user_data(self, data: DataAttachment) -> Self;
    fn complete(self) -> ProviderFuture;
}

#[derive(Debug, Clone)]
pub enum ProviderImpl {
    OpenAI(OpenAI),
    Gemini(Gemini),
}

impl ProviderImpl {
    pub fn kind(&self) -> ProviderKind {
        match self {
            ProviderImpl::OpenAI(_) => ProviderKind::OpenAI,
            ProviderImpl::Gemini(_) => ProviderKind::Gemini,
        }
    }
}

impl Provider for ProviderImpl {
    fn append_user_input(self, input: String) -> Self {
        match self {
            ProviderImpl::OpenAI(provider) => {
                ProviderImpl::OpenAI(provider.append_user_input(input))
            }
            ProviderImpl::Gemini(provider) => {
                ProviderImpl::Gemini(provider.append_user_input(input))
            }
        }
    }

    fn append_user_data(self, data: DataAttachment) -> Self {
        match self {
            ProviderImpl::OpenAI(provider) => ProviderImpl::OpenAI(provider.append_user_data(data)),
            ProviderImpl::Gemini(provider) => ProviderImpl::Gemini(provider.append_user_data(data)),
        }
    }

    fn complete(self) -> ProviderFuture {
        match self {
            ProviderImpl::OpenAI(provider) => provider.complete(),
            ProviderImpl::Gemini(provider) => provider.complete(),
        }
    }
}

pub fn build_provider(provider: ProviderKind, key: String, model: Option<String>) -> ProviderImpl {
    match provider {
        ProviderKind::OpenAI => {
            ProviderImpl::OpenAI(OpenAI::new(key).with_model(model.unwrap_or_default()))
        }
        ProviderKind::Gemini => {
            ProviderImpl::Gemini(Gemini::new(key).with_model(model.unwrap_or_default()))
        }
    }
}

/// Builds the configured provider, or `None` when no key can be found.
pub fn provider_from_settings(model_arg: Option<&str>, key: Option<&str>) -> Result<Option<ProviderImpl>> {
    let selection = match model_arg.map(str::trim).filter(|value| !value.is_empty()) {
        Some(model) => parse_model_arg(model)?,
        None => match default_provider_selection() {
            Some(selection) => selection,
            None => return Ok(None),
        },
    };
    let Ok(key) = resolve_key(selection.provider, key) else {
        return Ok(None);
    };
    Ok(Some(build_provider(
        selection.provider,
        key,
        selection.requested_model,
    )))
}

pub fn resolve_key(provider: ProviderKind, override_key: Option<&str>) -> Result<String> {
    if let Some(key) = override_key.filter(|value| !value.trim().is_empty()) {
        return Ok(key.to_string());
    }

    match provider {
        ProviderKind::OpenAI => get_env("OPENAI_API_KEY"),
        ProviderKind::Gemini => get_env("GEMINI_API_KEY")
            .or_else(|| get_env("GCP_GEMINI_API_KEY"))
            .or_else(|| get_env("GOOGLE_API_KEY")),
    }
    .ok_or_else(|| anyhow!("API key not found for provider {}", provider.as_str()))
}

fn default_provider_selection() -> Option<ProviderSelection> {
    if get_env("GEMINI_API_KEY").is_some()
        || get_env("GCP_GEMINI_API_KEY").is_some()
        || get_env("GOOGLE_API_KEY").is_some()
    {
        return Some(ProviderSelection {
            provider: ProviderKind::Gemini,
            requested_model: None,
        });
    }

    if get_env("OPENAI_API_KEY").is_some() {
        return Some(ProviderSelection {
            provider: ProviderKind::OpenAI,
            requested_model: None,
        });
    }

    None
}

pub fn parse_model_arg(model_arg: &str) -> Result<ProviderSelection> {
    let raw = model_arg.trim();
    if raw.is_empty() {
        return Err(anyhow!("model argument is empty"));
    }

    if let Some(provider) = provider_from_name(&raw.to_lowercase()) {
        return Ok(ProviderSelection {
            provider,
            requested_model: None,
        });
    }

    if let Some((provider, model)) = parse_provider_model_pair(raw) {
        return Ok(ProviderSelection {
            provider,
            requested_model: model,
        });
    }

    Err(anyhow!(
        "unable to infer provider from model '{}'. Use provider:model (gemini:, openai:)",
        raw
    ))
}

fn parse_provider_model_pair(input: &str) -> Option<(ProviderKind, Option<String>)> {
    let (provider_part, model_part) = input.split_once(':')?;
    let provider = provider_from_name(&provider_part.to_lowercase())?;
    let model = if model_part.trim().is_empty() {
        None
    } else {
        Some(model_part.trim().to_string())
    };
    Some((provider, model))
}

fn provider_from_name(name: &str) -> Option<ProviderKind> {
    match name {
        "openai" => Some(ProviderKind::OpenAI),
        "gemini" | "google" => Some(ProviderKind::Gemini),
        _ => None,
    }
}

fn get_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
}

pub(crate) fn format_error_parts(
    message: Option<String>,
    kind: Option<String>,
    code: Option<String>,
) -> String {
    let mut parts = Vec::new();
    if let Some(message) = message
        && !message.trim().is_empty()
    {
        parts.push(message);
    }
    if let Some(kind) = kind
        && !kind.trim().is_empty()
    {
        parts.push(format!("type: {}", kind));
    }
    if let Some(code) = code
        && !code.trim().is_empty()
    {
        parts.push(format!("code: {}", code));
    }
    if parts.is_empty() {
        "unknown error".to_string()
    } else {
        parts.join(" | ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_arg_forms() {
        assert_eq!(
            parse_model_arg("gemini:gemini-1.5-flash").expect("selection"),
            ProviderSelection {
                provider: ProviderKind::Gemini,
                requested_model: Some("gemini-1.5-flash".to_string()),
            }
        );
        assert_eq!(
            parse_model_arg("OpenAI").expect("selection").provider,
            ProviderKind::OpenAI
        );
        assert_eq!(
            parse_model_arg("google:").expect("selection").requested_model,
            None
        );
        assert!(parse_model_arg("llama-3").is_err());
    }

    #[test]
    fn explicit_key_builds_provider() {
        let provider = provider_from_settings(Some("openai:gpt-4o-mini"), Some("sk-test"))
            .expect("settings")
            .expect("provider");
        assert_eq!(provider.kind(), ProviderKind::OpenAI);
    }

    #[test]
    fn error_parts_join_non_blank_values() {
        assert_eq!(
            format_error_parts(Some("bad".to_string()), Some(" ".to_string()), Some("400".to_string())),
            "bad | code: 400"
        );
        assert_eq!(format_error_parts(None, None, None), "unknown error");
    }
}
