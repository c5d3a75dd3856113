//! Core data models used throughout the engine.
//!
//! These types represent the page texts, chunks, and retrieval results that
//! flow through the ingestion and answering pipeline.

/// Extracted text of one source-document page, before chunking.
///
/// Produced by the ingestor, consumed by the chunker; never persisted.
#[derive(Debug, Clone)]
pub struct TextUnit {
    /// 1-based page number in the source document.
    pub page: i64,
    pub text: String,
}

/// A bounded span of page text, the unit of embedding and retrieval.
///
/// Consecutive chunks from the same page overlap by the configured number
/// of characters so statute articles split across a boundary stay
/// retrievable.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub id: String,
    /// Page the chunk was cut from.
    pub page: i64,
    /// Position of the chunk within its page, starting at 0.
    pub chunk_index: i64,
    pub text: String,
    /// SHA-256 of the text, for staleness checks and debugging.
    pub hash: String,
}

/// A chunk ranked by similarity to a query.
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    /// Cosine similarity in `[-1.0, 1.0]`, higher is closer.
    pub score: f32,
}

/// Speaker of one conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

/// One turn of the caller-owned conversation history.
pub type ConversationTurn = (Role, String);
