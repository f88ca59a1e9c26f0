//! Chunking stage.
//!
//! Splits raw text units into fixed-size overlapping character
//! windows. The window math is exact: adjacent chunks from the same
//! unit share precisely `chunk_overlap` characters, so consumers can
//! reconstruct the source text by dropping each chunk's leading
//! overlap. All slicing happens on char boundaries.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{PipelineError, Result};
use crate::loader::RawDocument;

/// One segment of source text with its provenance metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub metadata: Map<String, Value>,
}

/// Split raw documents into overlapping chunks, preserving reading
/// order. Metadata from each source unit is copied onto every chunk
/// derived from it.
///
/// Preconditions: `chunk_size > 0` and `chunk_overlap < chunk_size`
/// (a `Configuration` error otherwise - equal or larger overlap would
/// never advance the window).
///
/// Empty units yield zero chunks; windows that are entirely
/// whitespace after trimming are dropped.
pub fn split_documents(
    docs: &[RawDocument],
    chunk_size: usize,
    chunk_overlap: usize,
) -> Result<Vec<Chunk>> {
    if chunk_size == 0 {
        return Err(PipelineError::Configuration(
            "chunk_size must be greater than zero".to_string(),
        ));
    }
    if chunk_overlap >= chunk_size {
        return Err(PipelineError::Configuration(format!(
            "chunk_overlap ({chunk_overlap}) must be smaller than chunk_size ({chunk_size})"
        )));
    }

    let mut chunks = Vec::new();
    for doc in docs {
        split_unit(doc, chunk_size, chunk_overlap, &mut chunks);
    }

    tracing::info!(
        documents = docs.len(),
        chunks = chunks.len(),
        chunk_size,
        chunk_overlap,
        "Split documents into chunks"
    );
    Ok(chunks)
}

fn split_unit(doc: &RawDocument, size: usize, overlap: usize, out: &mut Vec<Chunk>) {
    // Byte offset of every char boundary, including the end of text.
    let boundaries: Vec<usize> = doc
        .text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(doc.text.len()))
        .collect();
    let char_count = boundaries.len() - 1;
    if char_count == 0 {
        return;
    }

    let step = size - overlap;
    let mut start = 0;
    loop {
        let end = (start + size).min(char_count);
        let window = &doc.text[boundaries[start]..boundaries[end]];
        if !window.trim().is_empty() {
            out.push(Chunk {
                text: window.to_string(),
                metadata: doc.metadata.clone(),
            });
        }
        if end == char_count {
            break;
        }
        start += step;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(text: &str) -> RawDocument {
        RawDocument::new(text, "test.txt")
    }

    #[test]
    fn empty_unit_yields_zero_chunks() {
        let chunks = split_documents(&[doc("")], 100, 10).unwrap();
        assert!(chunks.is_empty());
    }

    #[test]
    fn overlap_must_be_smaller_than_size() {
        let err = split_documents(&[doc("abc")], 10, 10).unwrap_err();
        assert!(matches!(err, PipelineError::Configuration(_)));
    }

    #[test]
    fn short_unit_is_a_single_chunk() {
        let chunks = split_documents(&[doc("short text")], 100, 10).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "short text");
    }

    #[test]
    fn metadata_is_copied_to_every_chunk() {
        let source = doc(&"x".repeat(250)).with_field("page", 3u64);
        let chunks = split_documents(&[source], 100, 20).unwrap();
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert_eq!(
                chunk.metadata.get("source_file").and_then(|v| v.as_str()),
                Some("test.txt")
            );
            assert_eq!(chunk.metadata.get("page").and_then(|v| v.as_u64()), Some(3));
        }
    }

    #[test]
    fn windows_reconstruct_the_original_text() {
        let text: String = (0..977).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
        let size = 100;
        let overlap = 30;
        let chunks = split_documents(&[doc(&text)], size, overlap).unwrap();

        let mut rebuilt: String = chunks[0].text.clone();
        for chunk in &chunks[1..] {
            rebuilt.extend(chunk.text.chars().skip(overlap));
        }
        assert_eq!(rebuilt, text);
    }

    #[test]
    fn exact_overlap_scenario_3500_chars() {
        // 3,500 chars at size 1000 / overlap 200: windows advance by
        // 800, so starts are 0, 800, 1600, 2400, 3200 -> five chunks.
        let text: String = (0..3500).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
        let chunks = split_documents(&[doc(&text)], 1000, 200).unwrap();

        assert_eq!(chunks.len(), 5);
        for chunk in &chunks {
            assert!(chunk.text.chars().count() <= 1000);
        }
        for pair in chunks.windows(2) {
            let prev: Vec<char> = pair[0].text.chars().collect();
            let next: Vec<char> = pair[1].text.chars().collect();
            let tail: String = prev[prev.len() - 200..].iter().collect();
            let head: String = next[..200].iter().collect();
            assert_eq!(tail, head);
        }
    }

    #[test]
    fn multibyte_text_splits_on_char_boundaries() {
        let text = "héllo wörld ünïcode çontent ".repeat(20);
        let chunks = split_documents(&[doc(&text)], 50, 10).unwrap();
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.text.chars().count() <= 50);
        }
    }

    #[test]
    fn whitespace_only_windows_are_dropped() {
        let chunks = split_documents(&[doc("   \n\t  ")], 100, 10).unwrap();
        assert!(chunks.is_empty());
    }
}
