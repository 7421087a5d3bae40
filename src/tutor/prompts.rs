//! Prompt templates for the three answering modes.
//!
//! Every template grounds the model in retrieved context only; the model is
//! told to admit when the context does not contain the answer rather than
//! improvise.

use crate::index::RetrievedChunk;
use crate::tutor::types::{ChatTurn, FLASHCARD_COUNT};

/// Join history turns into one block, preserving caller order.
pub fn format_history(history: &[ChatTurn]) -> String {
    history
        .iter()
        .map(|turn| format!("{}: {}", turn.role, turn.content))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Join retrieved chunks into the context block, best match first.
pub fn format_context(chunks: &[RetrievedChunk]) -> String {
    chunks
        .iter()
        .map(|chunk| chunk.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Conversational template: answer the latest question given history and context.
pub fn build_chat_prompt(history: &[ChatTurn], context: &[RetrievedChunk], question: &str) -> String {
    format!(
        "You are a patient study tutor. Answer the student's question using only \
the context from their uploaded documents below.\n\n\
Context:\n{context}\n\n\
Conversation so far:\n{history}\n\n\
Student question: {question}\n\n\
Answer clearly and concisely. If the context does not contain the answer, \
say that you cannot find it in the uploaded material.",
        context = format_context(context),
        history = format_history(history),
    )
}

/// Exam template: request exactly `count` short-answer question/answer pairs.
pub fn build_exam_prompt(context: &[RetrievedChunk], count: usize) -> String {
    format!(
        "You are an examiner writing short-answer questions from study material.\n\n\
Context:\n{context}\n\n\
Write exactly {count} short-answer questions with model answers, based only \
on the context above.\n\
Respond with a JSON array and nothing else. Each element must have the shape \
{{\"id\": <number starting at 1>, \"question\": \"...\", \"answer\": \"...\"}}.",
        context = format_context(context),
    )
}

/// Flashcard template: request exactly four front/back pairs.
pub fn build_flashcard_prompt(context: &[RetrievedChunk]) -> String {
    format!(
        "You are writing study flashcards from the material below.\n\n\
Context:\n{context}\n\n\
Write exactly {FLASHCARD_COUNT} flashcards covering the most important facts, \
based only on the context above.\n\
Respond with a JSON array and nothing else. Each element must have the shape \
{{\"front\": \"...\", \"back\": \"...\"}}.",
        context = format_context(context),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(text: &str) -> RetrievedChunk {
        RetrievedChunk {
            text: text.to_string(),
            source: "notes.pdf".into(),
            page: 1,
            score: 0.9,
        }
    }

    #[test]
    fn history_preserves_caller_order() {
        let history = vec![
            ChatTurn {
                role: "user".into(),
                content: "What is osmosis?".into(),
            },
            ChatTurn {
                role: "assistant".into(),
                content: "Movement of water across a membrane.".into(),
            },
            ChatTurn {
                role: "user".into(),
                content: "And diffusion?".into(),
            },
        ];
        let block = format_history(&history);
        let first = block.find("What is osmosis?").expect("first turn");
        let second = block.find("Movement of water").expect("second turn");
        let third = block.find("And diffusion?").expect("third turn");
        assert!(first < second && second < third);
        assert!(block.starts_with("user: "));
    }

    #[test]
    fn chat_prompt_embeds_context_history_and_question() {
        let prompt = build_chat_prompt(
            &[ChatTurn {
                role: "user".into(),
                content: "hello".into(),
            }],
            &[chunk("Cells divide by mitosis.")],
            "How do cells divide?",
        );
        assert!(prompt.contains("Cells divide by mitosis."));
        assert!(prompt.contains("user: hello"));
        assert!(prompt.contains("Student question: How do cells divide?"));
    }

    #[test]
    fn context_chunks_are_separated_by_blank_lines() {
        let block = format_context(&[chunk("first"), chunk("second")]);
        assert_eq!(block, "first\n\nsecond");
    }

    #[test]
    fn exam_prompt_requests_exact_count() {
        let prompt = build_exam_prompt(&[chunk("material")], 5);
        assert!(prompt.contains("exactly 5 short-answer questions"));
        assert!(prompt.contains("\"id\""));
    }

    #[test]
    fn flashcard_prompt_requests_four_cards() {
        let prompt = build_flashcard_prompt(&[chunk("material")]);
        assert!(prompt.contains("exactly 4 flashcards"));
        assert!(prompt.contains("\"front\""));
    }
}
