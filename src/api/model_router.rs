// Model router: maps a requested model name to an upstream provider.
//
// Classification is a closed enum with a fixed precedence order so the
// dispatch can be tested without any HTTP plumbing. The pseudo-model
// "unified-auto" defers selection to whichever provider keys are configured.

use crate::config::Config;

/// Pseudo-model that resolves to a concrete model at request time.
pub const UNIFIED_AUTO: &str = "unified-auto";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    OpenAi,
    Anthropic,
    Gemini,
    Xai,
}

impl ProviderKind {
    pub fn label(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "OpenAI",
            ProviderKind::Anthropic => "Anthropic",
            ProviderKind::Gemini => "Gemini",
            ProviderKind::Xai => "xAI",
        }
    }

    pub fn env_var(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "OPENAI_API_KEY",
            ProviderKind::Anthropic => "ANTHROPIC_API_KEY",
            ProviderKind::Gemini => "GOOGLE_API_KEY",
            ProviderKind::Xai => "XAI_API_KEY",
        }
    }
}

/// Classify a model name. Matching is ordered and first-match wins:
/// `gpt-` prefix, `claude` substring, `gemini` prefix/substring, `grok`
/// substring. Unknown names return `None`; the handler turns that into a
/// 400 without touching the network.
pub fn classify_model(model: &str) -> Option<ProviderKind> {
    if model.starts_with("gpt-") {
        Some(ProviderKind::OpenAi)
    } else if model.contains("claude") {
        Some(ProviderKind::Anthropic)
    } else if model.starts_with("gemini-") || model.contains("gemini") {
        Some(ProviderKind::Gemini)
    } else if model.contains("grok") {
        Some(ProviderKind::Xai)
    } else {
        None
    }
}

/// Resolve "unified-auto" to a concrete model based on which keys are
/// configured. Priority: Google, then OpenAI, then a last-resort OpenAI model
/// that will fail with `ProviderNotConfigured` at dispatch if no key exists.
pub fn resolve_auto_model(config: &Config) -> &'static str {
    if config.google_api_key.is_some() {
        "gemini-flash-latest"
    } else if config.openai_api_key.is_some() {
        "gpt-4o"
    } else {
        "gpt-3.5-turbo"
    }
}

/// Full resolution: expand `unified-auto`, then classify.
pub fn resolve_model(model: &str, config: &Config) -> (String, Option<ProviderKind>) {
    let concrete = if model == UNIFIED_AUTO {
        resolve_auto_model(config).to_string()
    } else {
        model.to_string()
    };
    let kind = classify_model(&concrete);
    (concrete, kind)
}
