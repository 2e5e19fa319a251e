//! Static provider/model catalog.
//!
//! Preset lists mirroring what the backend serves; not discovered at runtime.
//! Selecting a provider discards the previous model selection and starts over
//! at the head of the new provider's list.

/// One selectable model: `id` is the wire value, `label` the display text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelOption {
    pub id: &'static str,
    pub label: &'static str,
}

const fn opt(id: &'static str) -> ModelOption {
    ModelOption { id, label: id }
}

const OPENAI_MODELS: &[ModelOption] = &[
    opt("gpt-4.1-mini"),
    opt("gpt-4o"),
    opt("gpt-4o-mini"),
    opt("gpt-4-turbo"),
    opt("gpt-3.5-turbo"),
];

const GEMINI_MODELS: &[ModelOption] = &[
    opt("gemini-2.5-flash"),
    opt("gemini-2.5-flash-lite"),
    opt("gemma-3-12b-it"),
];

pub const DEFAULT_PROVIDER: &str = "openai";

/// Known provider ids, in display order.
pub fn providers() -> &'static [&'static str] {
    &["openai", "gemini"]
}

/// Ordered model options for a provider. Unknown providers get an empty list.
pub fn models_for(provider: &str) -> &'static [ModelOption] {
    match provider {
        "openai" => OPENAI_MODELS,
        "gemini" => GEMINI_MODELS,
        _ => &[],
    }
}

/// First model of the provider's list, if the provider is known.
pub fn default_model(provider: &str) -> Option<&'static str> {
    models_for(provider).first().map(|m| m.id)
}

/// Display name for a provider id. Anything that is not gemini renders as
/// OpenAI, matching the backend's own fallback.
pub fn provider_display_name(provider: &str) -> &'static str {
    if provider == "gemini" {
        "Gemini"
    } else {
        "OpenAI"
    }
}
