//! Overlapping fixed-size text chunker.
//!
//! Splits page texts into [`Chunk`]s of at most `chunk_size` characters,
//! where consecutive chunks from the same page share exactly
//! `chunk_overlap` characters. Counts are characters, never bytes: the
//! corpus is Japanese and a byte window would split multibyte sequences.
//!
//! Each chunk records its page and index plus a SHA-256 hash of its text.
//! `overlap < chunk_size` is a configuration invariant validated at
//! startup, not here.

use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::models::{Chunk, TextUnit};

/// Split page texts into overlapping chunks, preserving page order.
/// Deterministic apart from the generated chunk IDs.
pub fn split_units(units: &[TextUnit], chunk_size: usize, overlap: usize) -> Vec<Chunk> {
    debug_assert!(overlap < chunk_size);

    let mut chunks = Vec::new();
    for unit in units {
        split_unit(unit, chunk_size, overlap, &mut chunks);
    }
    chunks
}

fn split_unit(unit: &TextUnit, chunk_size: usize, overlap: usize, out: &mut Vec<Chunk>) {
    let text = unit.text.trim();
    if text.is_empty() {
        return;
    }

    // Byte offset of every char boundary, with the end offset appended so
    // `boundaries[i]..boundaries[j]` is always a valid slice range.
    let mut boundaries: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
    boundaries.push(text.len());
    let char_count = boundaries.len() - 1;

    let stride = chunk_size - overlap;
    let mut chunk_index: i64 = 0;
    let mut start = 0usize;

    loop {
        let end = (start + chunk_size).min(char_count);
        let piece = &text[boundaries[start]..boundaries[end]];
        out.push(make_chunk(unit.page, chunk_index, piece));
        chunk_index += 1;

        if end == char_count {
            break;
        }
        start += stride;
    }
}

fn make_chunk(page: i64, index: i64, text: &str) -> Chunk {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let hash = format!("{:x}", hasher.finalize());

    Chunk {
        id: Uuid::new_v4().to_string(),
        page,
        chunk_index: index,
        text: text.to_string(),
        hash,
    }
}
