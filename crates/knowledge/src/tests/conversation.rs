//! Multi-turn sessions through `Conversation`.

use super::support::*;
use crate::engine::QueryStatus;
use crate::history::{Conversation, ConversationHistory, Role};
use crate::loader::{ContentType, Document};

#[tokio::test]
async fn test_answers_are_recorded_and_replayed() {
    let h = active_harness().await;
    h.engine
        .ingest(&Document::new("handbook.md", ContentType::Markdown, HANDBOOK))
        .await
        .unwrap();

    let mut conversation = Conversation::new(h.engine.clone(), ConversationHistory::new(10));

    let first = conversation.ask("How many vacation days?").await;
    assert_eq!(first.status, QueryStatus::Answered);
    assert_eq!(conversation.history().len(), 2);
    assert_eq!(conversation.history().turns()[0].role, Role::User);
    assert_eq!(conversation.history().turns()[1].content, first.answer);

    conversation.ask("And when does parking close?").await;
    assert_eq!(conversation.history().len(), 4);

    let requests = h.llm.completion_requests();
    assert!(!requests[0].prompt.contains("Conversation so far"));
    assert!(requests[1].prompt.contains("User: How many vacation days?"));

    conversation.reset();
    assert!(conversation.history().is_empty());
}

#[tokio::test]
async fn test_unanswered_questions_are_not_recorded() {
    let h = active_harness().await;
    let mut conversation = Conversation::new(h.engine.clone(), ConversationHistory::new(10));

    let response = conversation.ask("Anything in there?").await;
    assert_eq!(response.status, QueryStatus::EmptyKnowledgeBase);
    assert!(conversation.history().is_empty());

    h.engine
        .ingest(&Document::new("handbook.md", ContentType::Markdown, HANDBOOK))
        .await
        .unwrap();
    h.store.set(Link::Down);

    let response = conversation.ask("How many vacation days?").await;
    assert_eq!(response.status, QueryStatus::Unavailable);
    assert!(conversation.history().is_empty());
}
