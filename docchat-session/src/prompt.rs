//! Prompt composition for grounded answers and follow-up condensing.

use std::fmt::Write;

use crate::answer::SourceReference;
use crate::memory::ConversationTurn;
use crate::model::{ChatMessage, Prompt};

const ANSWER_INSTRUCTIONS: &str = "You answer questions about a document the user uploaded. \
Use only the numbered context passages and the conversation so far. \
If the passages do not contain the answer, say that you don't know instead of guessing.";

const CONDENSE_INSTRUCTIONS: &str = "Rewrite the user's follow-up question as a standalone \
question that can be understood without the conversation. Resolve pronouns and references \
such as \"it\" or \"the second one\" using the conversation. Reply with the question only.";

/// Build the answer prompt: instructions, prior turns, then the passages and question.
pub fn answer_prompt(
    history: &[ConversationTurn],
    sources: &[SourceReference],
    question: &str,
) -> Prompt {
    let mut messages = Vec::with_capacity(history.len() * 2 + 2);
    messages.push(ChatMessage::system(ANSWER_INSTRUCTIONS));
    for turn in history {
        messages.push(ChatMessage::user(turn.question.as_str()));
        messages.push(ChatMessage::assistant(turn.answer.as_str()));
    }

    let mut content = String::new();
    if sources.is_empty() {
        content.push_str("No passages from the document matched this question.\n\n");
    } else {
        content.push_str("Context passages:\n\n");
        for source in sources {
            let _ = write!(content, "[{}]\n{}\n\n", source.label, source.text);
        }
    }
    let _ = write!(content, "Question: {question}");
    messages.push(ChatMessage::user(content));

    Prompt { messages }
}

/// Build the prompt asking the model to turn a follow-up into a standalone question.
pub fn condense_prompt(history: &[ConversationTurn], question: &str) -> Prompt {
    let mut transcript = String::from("Conversation:\n");
    for turn in history {
        let _ = write!(transcript, "Human: {}\nAssistant: {}\n", turn.question, turn.answer);
    }
    let _ = write!(transcript, "\nFollow-up question: {question}\nStandalone question:");

    Prompt {
        messages: vec![ChatMessage::system(CONDENSE_INSTRUCTIONS), ChatMessage::user(transcript)],
    }
}
