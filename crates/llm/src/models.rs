//! Generation model selection.

use crate::client::LlmClient;

/// Choose a model from what the provider reports.
///
/// Preferences are tried in order; a preference matches any available name
/// that contains it, so `llama3` matches `llama3:8b-instruct`. Without a
/// match the first available model is used, and with nothing available the
/// configured `fallback` is returned.
pub fn pick_model(available: &[String], preferred: &[String], fallback: &str) -> String {
    for wanted in preferred {
        if let Some(found) = available.iter().find(|name| name.contains(wanted.as_str())) {
            return found.clone();
        }
    }

    available
        .first()
        .cloned()
        .unwrap_or_else(|| fallback.to_string())
}

/// Ask the provider for its models and pick one.
///
/// A listing failure is not fatal here; the configured model is used and
/// the generation call itself will surface any real outage.
pub async fn select_model(client: &dyn LlmClient, preferred: &[String], fallback: &str) -> String {
    if preferred.is_empty() {
        return fallback.to_string();
    }

    match client.list_models().await {
        Ok(available) => {
            let chosen = pick_model(&available, preferred, fallback);
            tracing::debug!(model = %chosen, available = available.len(), "Selected generation model");
            chosen
        }
        Err(e) => {
            tracing::warn!("Could not list models from {}: {}", client.provider_name(), e);
            fallback.to_string()
        }
    }
}
