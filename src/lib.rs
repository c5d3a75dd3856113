//! # Soudan
//!
//! A retrieval-grounded advisory chat engine for business and
//! employee-health consultations.
//!
//! Soudan routes free-text questions through a bounded reasoning loop
//! over a fixed catalog of advisory tools. Companies-Act questions are
//! grounded in a persistent vector index built once over the statute PDF;
//! general questions go to domain-specific advisory prompts or external
//! lookups (Wikipedia, web search).
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌───────────────┐   ┌───────────┐
//! │  Fetch    │──▶│ Chunk + Embed │──▶│  SQLite    │
//! │ (statute) │   │  (batched)    │   │ vec index  │
//! └──────────┘   └───────────────┘   └─────┬─────┘
//!                                          │ top-K
//!              ┌────────────┐   ┌──────────┴─────┐
//! question ───▶│  Context    │──▶│ Reasoning agent │──▶ answer
//!              │  builder    │   │  + tool catalog │
//!              └────────────┘   └────────────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing and validation |
//! | [`models`] | Core data types |
//! | [`fetch`] | Source-document download cache and page extraction |
//! | [`chunk`] | Overlapping fixed-size text chunking |
//! | [`embedding`] | Embedding capability and vector utilities |
//! | [`index`] | Persistent vector index (build once, load thereafter) |
//! | [`llm`] | Chat-completion capability |
//! | [`prompts`] | Advisory templates and fixed messages |
//! | [`tools`] | The fixed advisory tool catalog |
//! | [`agent`] | Bounded reasoning loop and output guard |
//! | [`context`] | Conversational context builder |
//! | [`engine`] | Engine assembly and the session boundary |
//! | [`progress`] | Index-build progress reporting |
//! | [`error`] | Error taxonomy |

pub mod agent;
pub mod chunk;
pub mod config;
pub mod context;
pub mod embedding;
pub mod engine;
pub mod error;
pub mod fetch;
pub mod index;
pub mod llm;
pub mod models;
pub mod progress;
pub mod prompts;
pub mod tools;
