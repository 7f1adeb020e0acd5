//! Text chunking with configurable size and overlap.

use crate::loader::Document;
use crate::types::{fragment_id, Fragment};
use abunda_core::config::ChunkingSettings;
use abunda_core::{AppError, AppResult};
use text_splitter::{ChunkConfig, TextSplitter};

/// Splits documents into fragments on semantic boundaries.
///
/// The text is first cut into pieces of at most `chunk_size - chunk_overlap`
/// characters, preferring paragraph, then sentence, then word, then character
/// boundaries. Every piece after the first is then extended backwards by
/// `chunk_overlap` characters of the piece before it, so consecutive fragments
/// share exactly that many characters (fewer only when the previous piece is
/// shorter). Fragments are not trimmed, so each fragment's text is exactly
/// `document.text[byte_range]`.
pub struct Chunker {
    splitter: TextSplitter<text_splitter::Characters>,
    chunk_size: usize,
    chunk_overlap: usize,
}

impl Chunker {
    /// Create a chunker producing fragments of at most `chunk_size` characters.
    ///
    /// # Errors
    /// `AppError::Config` when `chunk_size` is zero or `chunk_overlap` is not
    /// smaller than `chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> AppResult<Self> {
        if chunk_size == 0 {
            return Err(AppError::Config("chunkSize must be positive".to_string()));
        }
        if chunk_overlap >= chunk_size {
            return Err(AppError::Config(format!(
                "chunkOverlap ({}) must be smaller than chunkSize ({})",
                chunk_overlap, chunk_size
            )));
        }

        let config = ChunkConfig::new(chunk_size - chunk_overlap).with_trim(false);

        Ok(Self {
            splitter: TextSplitter::new(config),
            chunk_size,
            chunk_overlap,
        })
    }

    pub fn from_settings(settings: &ChunkingSettings) -> AppResult<Self> {
        Self::new(settings.chunk_size, settings.chunk_overlap)
    }

    /// Split a document into ordered fragments.
    ///
    /// Whitespace-only pieces are dropped; a document without extractable
    /// text yields an empty vector.
    pub fn split(&self, document: &Document) -> Vec<Fragment> {
        let text = document.text.as_str();

        let mut previous_start: Option<usize> = None;

        let fragments: Vec<Fragment> = self
            .splitter
            .chunk_indices(text)
            .filter(|(_, piece)| !piece.trim().is_empty())
            .map(|(offset, piece)| {
                let start = match previous_start {
                    Some(floor) => overlap_start(text, offset, self.chunk_overlap).max(floor),
                    None => offset,
                };
                previous_start = Some(offset);
                start..offset + piece.len()
            })
            .enumerate()
            .map(|(sequence_index, byte_range)| Fragment {
                id: fragment_id(&document.id, text, sequence_index),
                source_document_id: document.id.clone(),
                sequence_index,
                text: text[byte_range.clone()].to_string(),
                byte_range,
                embedding: None,
            })
            .collect();

        tracing::debug!(
            "Chunked {} into {} fragments (size: {}, overlap: {})",
            document.id,
            fragments.len(),
            self.chunk_size,
            self.chunk_overlap
        );

        fragments
    }
}

/// Byte offset `overlap` characters before `offset`, clamped to the start.
fn overlap_start(text: &str, offset: usize, overlap: usize) -> usize {
    if overlap == 0 {
        return offset;
    }

    text[..offset]
        .char_indices()
        .rev()
        .nth(overlap - 1)
        .map(|(i, _)| i)
        .unwrap_or(0)
}
