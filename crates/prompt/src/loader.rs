//! Prompt loader for YAML prompt definitions.

use crate::types::{PromptContextConfig, PromptDefinition};
use abunda_core::{AppError, AppResult};
use std::path::Path;

/// Identifier of the built-in answer prompt.
pub const DEFAULT_PROMPT_ID: &str = "abunda.answer";

const DEFAULT_TEMPLATE: &str = r#"Answer the question using the reference material below.
If the material does not contain the answer, say that you do not know.

Reference material:
{{#each fragments}}
[{{index}}] {{source}} (part {{sequence}})
{{text}}

{{/each}}
{{#if history}}
Conversation so far:
{{#each history}}
{{role}}: {{content}}
{{/each}}

{{/if}}
Question: {{question}}
"#;

/// The built-in retrieval-augmented answer prompt.
pub fn default_prompt() -> PromptDefinition {
    PromptDefinition {
        id: DEFAULT_PROMPT_ID.to_string(),
        title: "Answer from the knowledge base".to_string(),
        api_version: "1.0".to_string(),
        context: PromptContextConfig::default(),
        template: DEFAULT_TEMPLATE.to_string(),
    }
}

/// Load a prompt definition by ID from the workspace.
///
/// This function searches for a prompt file named `<id>.yml` in the
/// `.abunda/prompts/` directory.
///
/// # Example
/// ```no_run
/// use abunda_prompt::load_prompt;
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let prompt = load_prompt(Path::new("."), "abunda.answer")?;
/// println!("Loaded prompt: {}", prompt.title);
/// # Ok(())
/// # }
/// ```
pub fn load_prompt(workspace_path: &Path, prompt_id: &str) -> AppResult<PromptDefinition> {
    let prompt_file = prompt_path(workspace_path, prompt_id);

    tracing::debug!("Loading prompt from: {:?}", prompt_file);

    if !prompt_file.exists() {
        return Err(AppError::Prompt(format!(
            "Prompt file not found: {:?}",
            prompt_file
        )));
    }

    let contents = std::fs::read_to_string(&prompt_file).map_err(|e| {
        AppError::Prompt(format!(
            "Failed to read prompt file {:?}: {}",
            prompt_file, e
        ))
    })?;

    let definition: PromptDefinition = serde_yaml::from_str(&contents).map_err(|e| {
        AppError::Prompt(format!(
            "Failed to parse prompt YAML {:?}: {}",
            prompt_file, e
        ))
    })?;

    validate_prompt(&definition)?;

    tracing::info!("Loaded prompt: {} ({})", definition.id, definition.title);

    Ok(definition)
}

/// Load a workspace prompt, or the built-in one if the workspace has none.
///
/// A prompt file that exists but does not parse is still an error.
pub fn load_prompt_or_default(
    workspace_path: &Path,
    prompt_id: &str,
) -> AppResult<PromptDefinition> {
    if prompt_path(workspace_path, prompt_id).exists() {
        load_prompt(workspace_path, prompt_id)
    } else {
        tracing::debug!("No workspace prompt '{}', using built-in", prompt_id);
        Ok(default_prompt())
    }
}

fn prompt_path(workspace_path: &Path, prompt_id: &str) -> std::path::PathBuf {
    workspace_path
        .join(".abunda/prompts")
        .join(format!("{}.yml", prompt_id))
}

/// Validate a prompt definition.
fn validate_prompt(def: &PromptDefinition) -> AppResult<()> {
    if def.id.is_empty() {
        return Err(AppError::Prompt("Prompt ID cannot be empty".to_string()));
    }

    if def.title.is_empty() {
        return Err(AppError::Prompt("Prompt title cannot be empty".to_string()));
    }

    if def.template.trim().is_empty() {
        return Err(AppError::Prompt(
            "Prompt template cannot be empty".to_string(),
        ));
    }

    if !def.api_version.contains('.') {
        return Err(AppError::Prompt(format!(
            "Invalid apiVersion format: {}. Expected format: 'x.y'",
            def.api_version
        )));
    }

    if !def.template.contains("{{question}}") {
        return Err(AppError::Prompt(format!(
            "Prompt {} never renders {{{{question}}}}",
            def.id
        )));
    }

    Ok(())
}
