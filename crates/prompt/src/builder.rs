//! Prompt builder for rendering templates with retrieved knowledge.

use crate::types::{BuiltPrompt, BuiltPromptMetadata, PromptContext, PromptDefinition};
use abunda_core::{AppError, AppResult};
use handlebars::Handlebars;
use serde_json::json;

/// Build a prompt from a definition and the per-question context.
///
/// Fragments are numbered in `(source, sequence)` order, so the same
/// retrieval result always renders the same frame regardless of the
/// similarity ranking. Context sections the definition disables are
/// rendered empty.
///
/// # Example
/// ```no_run
/// use abunda_prompt::{build_prompt, default_prompt, PromptContext};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let context = PromptContext {
///     question: "Who approves travel?".to_string(),
///     ..Default::default()
/// };
/// let built = build_prompt(&default_prompt(), &context, Some("Be precise"))?;
/// println!("User prompt: {}", built.user);
/// # Ok(())
/// # }
/// ```
pub fn build_prompt(
    definition: &PromptDefinition,
    context: &PromptContext,
    system: Option<&str>,
) -> AppResult<BuiltPrompt> {
    tracing::debug!("Building prompt: {}", definition.id);

    let mut fragments = if definition.context.include_knowledge_base {
        context.fragments.clone()
    } else {
        Vec::new()
    };
    fragments.sort_by(|a, b| a.source.cmp(&b.source).then(a.sequence.cmp(&b.sequence)));

    let history = if definition.context.include_history {
        context.history.clone()
    } else {
        Vec::new()
    };

    let numbered: Vec<serde_json::Value> = fragments
        .iter()
        .enumerate()
        .map(|(i, f)| {
            json!({
                "index": i + 1,
                "source": f.source,
                "sequence": f.sequence,
                "text": f.text,
            })
        })
        .collect();

    let data = json!({
        "question": context.question,
        "fragments": numbered,
        "history": history,
    });

    let user = render_template(&definition.template, &data)?;

    Ok(BuiltPrompt {
        system: system
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
        user,
        metadata: BuiltPromptMetadata {
            source_prompt_id: definition.id.clone(),
            fragment_count: fragments.len(),
            history_turns: history.len(),
        },
    })
}

/// Render a Handlebars template against JSON data.
fn render_template(template: &str, data: &serde_json::Value) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Plain text, not HTML
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string("prompt", template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    handlebars
        .render("prompt", data)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::default_prompt;
    use crate::types::{ContextFragment, HistoryLine};

    fn fragment(source: &str, sequence: usize, text: &str) -> ContextFragment {
        ContextFragment {
            source: source.to_string(),
            sequence,
            text: text.to_string(),
        }
    }

    fn sample_context() -> PromptContext {
        PromptContext {
            question: "How many vacation days do we get?".to_string(),
            fragments: vec![
                fragment("handbook.md", 3, "Vacation: 25 days per year."),
                fragment("benefits.md", 0, "Benefits overview."),
                fragment("handbook.md", 1, "Working hours are flexible."),
            ],
            history: vec![
                HistoryLine {
                    role: "User".to_string(),
                    content: "Hi".to_string(),
                },
                HistoryLine {
                    role: "Assistant".to_string(),
                    content: "Hello, how can I help?".to_string(),
                },
            ],
        }
    }

    #[test]
    fn test_render_simple_template() {
        let result = render_template("Question: {{question}}", &json!({"question": "a < b?"}));
        assert_eq!(result.unwrap(), "Question: a < b?");
    }

    #[test]
    fn test_frame_orders_fragments_by_source_then_sequence() {
        let built = build_prompt(&default_prompt(), &sample_context(), None).unwrap();

        let benefits = built.user.find("[1] benefits.md (part 0)").unwrap();
        let hours = built.user.find("[2] handbook.md (part 1)").unwrap();
        let vacation = built.user.find("[3] handbook.md (part 3)").unwrap();
        assert!(benefits < hours && hours < vacation);
        assert_eq!(built.metadata.fragment_count, 3);
    }

    #[test]
    fn test_history_precedes_question() {
        let built = build_prompt(&default_prompt(), &sample_context(), None).unwrap();

        let history = built.user.find("Assistant: Hello, how can I help?").unwrap();
        let question = built
            .user
            .find("Question: How many vacation days do we get?")
            .unwrap();
        assert!(history < question);
        assert!(built.user.trim_end().ends_with("do we get?"));
        assert_eq!(built.metadata.history_turns, 2);
    }

    #[test]
    fn test_no_history_section_when_empty() {
        let mut context = sample_context();
        context.history.clear();

        let built = build_prompt(&default_prompt(), &context, None).unwrap();
        assert!(!built.user.contains("Conversation so far"));
    }

    #[test]
    fn test_disabled_sections_render_empty() {
        let mut def = default_prompt();
        def.context.include_knowledge_base = false;
        def.context.include_history = false;

        let built = build_prompt(&def, &sample_context(), Some("  ")).unwrap();
        assert!(!built.user.contains("Vacation"));
        assert!(!built.user.contains("Conversation so far"));
        assert_eq!(built.system, None);
        assert_eq!(built.metadata.fragment_count, 0);
    }

    #[test]
    fn test_system_instruction_carried() {
        let built =
            build_prompt(&default_prompt(), &sample_context(), Some("You are Abunda AI")).unwrap();
        assert_eq!(built.system.as_deref(), Some("You are Abunda AI"));
    }
}
