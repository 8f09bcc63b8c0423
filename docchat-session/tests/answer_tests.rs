//! Tests for the retrieval-augmented answerer.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{FailingModel, HangingModel, RecordingModel, VocabEmbedder, topic_document};
use docchat_rag::{BuildOptions, ChunkConfig, Document, InMemoryVectorIndex};
use docchat_session::{
    AnswerGenerationError, Answerer, AnswererConfig, AskError, ConversationMemory,
};

async fn topic_index(embedder: &VocabEmbedder) -> InMemoryVectorIndex {
    let config = ChunkConfig::builder().chunk_size(80).chunk_overlap(10).build().unwrap();
    let chunks = config.chunker().chunk(&Document::new("topics.txt", topic_document()));
    InMemoryVectorIndex::build(chunks, embedder, &BuildOptions::default()).await.unwrap()
}

fn config(top_k: usize) -> AnswererConfig {
    AnswererConfig { top_k, ..AnswererConfig::default() }
}

#[tokio::test]
async fn success_appends_exactly_one_turn() {
    let embedder = Arc::new(VocabEmbedder::new());
    let index = topic_index(&embedder).await;
    let model = Arc::new(RecordingModel::with_replies(&["It enforces borrow rules."]));
    let answerer = Answerer::new(embedder, model.clone(), config(2));
    let mut memory = ConversationMemory::new();

    let answer =
        answerer.answer("What does the rust compiler do?", &mut memory, &index).await.unwrap();

    assert_eq!(answer.text, "It enforces borrow rules.");
    assert_eq!(memory.len(), 1);
    assert_eq!(memory.history()[0].question, "What does the rust compiler do?");
    assert_eq!(memory.history()[0].answer, "It enforces borrow rules.");
    assert!(answer.sources[0].text.contains("rust compiler"));
}

#[tokio::test]
async fn sources_are_renumbered_per_answer() {
    let embedder = Arc::new(VocabEmbedder::new());
    let index = topic_index(&embedder).await;
    let answerer = Answerer::new(embedder, Arc::new(RecordingModel::default()), config(3));
    let mut memory = ConversationMemory::new();

    let answer = answerer.answer("Tell me about the river", &mut memory, &index).await.unwrap();

    let labels: Vec<&str> = answer.sources.iter().map(|s| s.label.as_str()).collect();
    assert_eq!(labels, ["source_0", "source_1", "source_2"]);
    // The best match is not the first chunk, so chunk labels differ from answer labels.
    assert_ne!(answer.sources[0].chunk_label, "0-pl");
    assert!(answer.sources.windows(2).all(|w| w[0].score >= w[1].score));
    assert!(answer.rendered().ends_with("Sources: source_0, source_1, source_2"));
}

#[tokio::test]
async fn zero_top_k_answers_with_no_sources_note() {
    let embedder = Arc::new(VocabEmbedder::new());
    let index = topic_index(&embedder).await;
    let model = Arc::new(RecordingModel::default());
    let answerer = Answerer::new(embedder, model.clone(), config(0));
    let mut memory = ConversationMemory::new();

    let answer = answerer.answer("Anything?", &mut memory, &index).await.unwrap();

    assert!(answer.sources.is_empty());
    assert!(answer.rendered().ends_with("No sources found."));
    assert!(model.prompts()[0].last_user_message().unwrap().starts_with("No passages"));
    assert_eq!(memory.len(), 1);
}

#[tokio::test]
async fn model_failure_leaves_memory_untouched() {
    let embedder = Arc::new(VocabEmbedder::new());
    let index = topic_index(&embedder).await;
    let answerer = Answerer::new(embedder, Arc::new(FailingModel), config(2));
    let mut memory = ConversationMemory::new();

    let err = answerer.answer("What is the tide?", &mut memory, &index).await.unwrap_err();

    assert!(matches!(err, AskError::AnswerGeneration(AnswerGenerationError::Model { .. })));
    assert!(!err.is_retryable());
    assert!(memory.is_empty());
}

#[tokio::test(start_paused = true)]
async fn model_timeout_is_retryable_and_records_nothing() {
    let embedder = Arc::new(VocabEmbedder::new());
    let index = topic_index(&embedder).await;
    let answerer = Answerer::new(embedder, Arc::new(HangingModel::default()), config(2))
        .with_timeouts(Duration::from_secs(1), Duration::from_secs(5));
    let mut memory = ConversationMemory::new();

    let err = answerer.answer("What is the tide?", &mut memory, &index).await.unwrap_err();

    assert!(matches!(
        err,
        AskError::AnswerGeneration(AnswerGenerationError::ServiceUnavailable { .. })
    ));
    assert!(err.is_retryable());
    assert!(memory.is_empty());
}

#[tokio::test]
async fn follow_up_sees_previous_turn_but_not_itself() {
    let embedder = Arc::new(VocabEmbedder::new());
    let index = topic_index(&embedder).await;
    let model = Arc::new(RecordingModel::with_replies(&["The ocean.", "Because of the tide."]));
    let answerer = Answerer::new(embedder, model.clone(), config(2));
    let mut memory = ConversationMemory::new();

    answerer.answer("What is salty?", &mut memory, &index).await.unwrap();
    answerer.answer("Why does it move?", &mut memory, &index).await.unwrap();

    assert!(model.history_questions(0).is_empty());
    assert_eq!(model.history_questions(1), ["What is salty?"]);
    let second = &model.prompts()[1];
    assert!(second.messages.iter().any(|m| m.content == "The ocean."));
    assert!(second.last_user_message().unwrap().ends_with("Question: Why does it move?"));
    assert_eq!(memory.len(), 2);
}

#[tokio::test]
async fn history_window_limits_replayed_turns() {
    let embedder = Arc::new(VocabEmbedder::new());
    let index = topic_index(&embedder).await;
    let model = Arc::new(RecordingModel::default());
    let answerer = Answerer::new(
        embedder,
        model.clone(),
        AnswererConfig { top_k: 1, history_window: Some(1), condense_follow_ups: false },
    );
    let mut memory = ConversationMemory::new();

    for question in ["first", "second", "third"] {
        answerer.answer(question, &mut memory, &index).await.unwrap();
    }

    assert_eq!(model.history_questions(2), ["second"]);
    assert_eq!(memory.len(), 3);
}

#[tokio::test]
async fn condensed_question_drives_retrieval() {
    let embedder = Arc::new(VocabEmbedder::new());
    let index = topic_index(&embedder).await;
    let model = Arc::new(RecordingModel::with_replies(&[
        "It is about the rust compiler.",
        "What does the ocean tide do?",
        "It rises and falls.",
    ]));
    let answerer = Answerer::new(
        embedder,
        model.clone(),
        AnswererConfig { top_k: 1, history_window: None, condense_follow_ups: true },
    );
    let mut memory = ConversationMemory::new();

    answerer.answer("What is rust?", &mut memory, &index).await.unwrap();
    let answer = answerer.answer("And the other one?", &mut memory, &index).await.unwrap();

    // First question has no history, so only the follow-up is condensed.
    assert_eq!(model.prompts().len(), 3);
    assert!(answer.sources[0].text.contains("tide"));
    assert_eq!(memory.history()[1].question, "And the other one?");
    assert_eq!(memory.history()[1].answer, "It rises and falls.");
}

#[tokio::test]
async fn index_from_another_embedding_model_is_refused() {
    let builder = VocabEmbedder::named("test/vocab-v1");
    let index = topic_index(&builder).await;
    let answerer = Answerer::new(
        Arc::new(VocabEmbedder::named("test/vocab-v2")),
        Arc::new(RecordingModel::default()),
        config(2),
    );
    let mut memory = ConversationMemory::new();

    let err = answerer.answer("rust?", &mut memory, &index).await.unwrap_err();

    assert!(matches!(err, AskError::EmbeddingModelMismatch { .. }));
    assert!(memory.is_empty());
}

#[tokio::test]
async fn question_embedding_failure_is_a_retrieval_error() {
    let embedder = Arc::new(VocabEmbedder::new());
    let index = topic_index(&embedder).await;
    embedder.set_down(true);
    let answerer = Answerer::new(embedder, Arc::new(RecordingModel::default()), config(2));
    let mut memory = ConversationMemory::new();

    let err = answerer.answer("rust?", &mut memory, &index).await.unwrap_err();

    assert!(matches!(err, AskError::Retrieval(_)));
    assert!(err.is_retryable());
    assert!(memory.is_empty());
}
