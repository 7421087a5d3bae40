//! Recursive character splitting for extracted document text.
//!
//! Mirrors the splitting strategy used by mainstream RAG pipelines:
//!
//! - Paragraph boundaries (`\n\n`) are preferred, then line breaks, then spaces.
//! - Fragments that still exceed the budget after every separator fall back to a
//!   hard character split.
//! - Adjacent chunks share a sliding character overlap so spans around chunk
//!   boundaries remain visible to retrieval.

use std::collections::VecDeque;

use super::types::{DocumentChunk, IngestError, PageText};

/// Separator hierarchy tried in order before falling back to a character split.
const SEPARATORS: &[&str] = &["\n\n", "\n", " "];

/// Split page texts into chunks, assigning document-wide chunk indices.
///
/// Pages are split independently so every chunk carries the page it came from.
pub fn chunk_pages(
    pages: &[PageText],
    chunk_size: usize,
    overlap: usize,
) -> Result<Vec<DocumentChunk>, IngestError> {
    let mut chunks = Vec::new();
    for page in pages {
        for text in chunk_text(&page.text, chunk_size, overlap)? {
            let chunk_index = chunks.len();
            chunks.push(DocumentChunk {
                text,
                page: page.page,
                chunk_index,
            });
        }
    }
    Ok(chunks)
}

/// Split raw text into chunks of at most `chunk_size` characters.
///
/// Adjacent chunks share up to `overlap` characters. Chunk edges are trimmed and
/// whitespace-only chunks are dropped, so joining the output does not reproduce
/// the input byte-for-byte.
pub fn chunk_text(
    text: &str,
    chunk_size: usize,
    overlap: usize,
) -> Result<Vec<String>, IngestError> {
    if chunk_size == 0 {
        return Err(IngestError::InvalidChunkSize);
    }
    if overlap >= chunk_size {
        return Err(IngestError::OverlapTooLarge {
            overlap,
            chunk_size,
        });
    }
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(split_recursive(text, chunk_size, overlap, SEPARATORS))
}

fn split_recursive(
    text: &str,
    chunk_size: usize,
    overlap: usize,
    separators: &[&str],
) -> Vec<String> {
    let Some(position) = separators
        .iter()
        .position(|separator| text.contains(separator))
    else {
        return hard_split(text, chunk_size, overlap);
    };
    let separator = separators[position];
    let remaining = &separators[position + 1..];

    let mut chunks = Vec::new();
    let mut window: VecDeque<&str> = VecDeque::new();
    let mut window_len = 0usize;

    for fragment in text.split_inclusive(separator) {
        let fragment_len = fragment.chars().count();

        if fragment_len >= chunk_size {
            // Oversized fragments are split on their own; overlap does not carry
            // across them.
            emit(&mut chunks, &window);
            window.clear();
            window_len = 0;
            let nested = if remaining.is_empty() {
                hard_split(fragment, chunk_size, overlap)
            } else {
                split_recursive(fragment, chunk_size, overlap, remaining)
            };
            chunks.extend(nested);
            continue;
        }

        if window_len + fragment_len > chunk_size && !window.is_empty() {
            emit(&mut chunks, &window);
            while window_len > overlap
                || (window_len + fragment_len > chunk_size && window_len > 0)
            {
                let dropped = window
                    .pop_front()
                    .expect("window drained despite positive length");
                window_len -= dropped.chars().count();
            }
        }

        window.push_back(fragment);
        window_len += fragment_len;
    }

    emit(&mut chunks, &window);
    chunks
}

/// Join the pending window into a chunk, dropping whitespace-only output.
fn emit(chunks: &mut Vec<String>, window: &VecDeque<&str>) {
    if window.is_empty() {
        return;
    }
    let joined: String = window.iter().copied().collect();
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}

/// Character-level sliding window used when no separator fits the budget.
fn hard_split(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    let characters: Vec<char> = text.chars().collect();
    let step = chunk_size.saturating_sub(overlap).max(1);
    let mut pieces = Vec::new();
    let mut start = 0;

    while start < characters.len() {
        let end = (start + chunk_size).min(characters.len());
        let piece: String = characters[start..end].iter().collect();
        let trimmed = piece.trim();
        if !trimmed.is_empty() {
            pieces.push(trimmed.to_string());
        }
        if end == characters.len() {
            break;
        }
        start += step;
    }

    pieces
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_paragraph_boundaries_first() {
        let text = "First paragraph.\n\nSecond paragraph.";
        let chunks = chunk_text(text, 20, 0).expect("chunking succeeded");
        assert_eq!(chunks, vec!["First paragraph.", "Second paragraph."]);
    }

    #[test]
    fn applies_sliding_overlap_between_chunks() {
        let text = "one two three four five";
        let chunks = chunk_text(text, 12, 6).expect("chunking succeeded");
        assert_eq!(
            chunks,
            vec!["one two", "two three", "three four", "four five"]
        );
    }

    #[test]
    fn hard_splits_unbroken_runs() {
        let chunks = chunk_text("abcdefghij", 4, 2).expect("chunking succeeded");
        assert_eq!(chunks, vec!["abcd", "cdef", "efgh", "ghij"]);
    }

    #[test]
    fn hard_split_respects_character_boundaries() {
        let chunks = chunk_text("가나다라마바사아자차", 4, 2).expect("chunking succeeded");
        assert_eq!(chunks, vec!["가나다라", "다라마바", "마바사아", "사아자차"]);
    }

    #[test]
    fn respects_chunk_size_budget() {
        let text = "The quick brown fox jumps over the lazy dog. ".repeat(40);
        let chunks = chunk_text(&text, 100, 20).expect("chunking succeeded");
        assert!(!chunks.is_empty());
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 100);
        }
    }

    #[test]
    fn whitespace_only_input_produces_no_chunks() {
        let chunks = chunk_text("  \n\n  ", 100, 10).expect("chunking succeeded");
        assert!(chunks.is_empty());
    }

    #[test]
    fn short_input_stays_whole() {
        let chunks = chunk_text("tiny", 100, 10).expect("chunking succeeded");
        assert_eq!(chunks, vec!["tiny"]);
    }

    #[test]
    fn rejects_zero_chunk_size() {
        let error = chunk_text("hello", 0, 0).unwrap_err();
        assert!(matches!(error, IngestError::InvalidChunkSize));
    }

    #[test]
    fn rejects_overlap_reaching_chunk_size() {
        let error = chunk_text("hello", 10, 10).unwrap_err();
        assert!(matches!(error, IngestError::OverlapTooLarge { .. }));
    }

    #[test]
    fn chunk_pages_assigns_document_wide_indices() {
        let pages = vec![
            PageText {
                page: 1,
                text: "First paragraph.\n\nSecond paragraph.".to_string(),
            },
            PageText {
                page: 2,
                text: "Third paragraph.".to_string(),
            },
        ];
        let chunks = chunk_pages(&pages, 20, 0).expect("chunking succeeded");
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].page, 1);
        assert_eq!(chunks[0].chunk_index, 0);
        assert_eq!(chunks[1].chunk_index, 1);
        assert_eq!(chunks[2].page, 2);
        assert_eq!(chunks[2].chunk_index, 2);
        assert_eq!(chunks[2].text, "Third paragraph.");
    }
}
