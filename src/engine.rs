//! Engine assembly and the session boundary.
//!
//! [`Advisor`] is the construct-once core shared by every session: the
//! completion and embedding clients, the fixed tool catalog, and the
//! (optional) statute index behind an `Arc`. [`Session`] is the
//! caller-owned, mutable side: selected mode/category and the append-only
//! turn history.
//!
//! An index build failure during initialization is deliberately non-fatal:
//! the engine comes up without the index and the Companies-Act tool
//! reports the resource as unavailable, mirroring how the rest of the
//! catalog keeps working when one capability is down.

use std::sync::Arc;
use uuid::Uuid;

use crate::agent::{guard_output, Agent};
use crate::config::{Config, RetrievalConfig, SearchConfig};
use crate::context::{build_contextual_input, DEFAULT_MAX_TURNS};
use crate::embedding::{Embedder, OpenAiEmbedder};
use crate::error::CorpusError;
use crate::fetch;
use crate::index::VectorIndex;
use crate::llm::{ChatModel, OpenAiChat};
use crate::models::{ConversationTurn, Role};
use crate::progress::{BuildEvent, BuildProgressReporter};
use crate::tools::ToolCatalog;

/// Shared, immutable core. Safe to use from multiple concurrent sessions.
pub struct Advisor {
    llm: Arc<dyn ChatModel>,
    catalog: Arc<ToolCatalog>,
    max_iterations: usize,
}

impl Advisor {
    /// Build the full production engine: OpenAI clients plus the statute
    /// index (loaded, or built on first run).
    pub async fn initialize(
        config: &Config,
        progress: &dyn BuildProgressReporter,
    ) -> anyhow::Result<Self> {
        let llm: Arc<dyn ChatModel> = Arc::new(OpenAiChat::new(&config.llm)?);
        let embedder: Arc<dyn Embedder> = Arc::new(OpenAiEmbedder::new(&config.embedding)?);

        let index = match prepare_index(config, embedder.as_ref(), progress).await {
            Ok(index) => Some(Arc::new(index)),
            Err(e) => {
                tracing::error!(error = %e, "statute index unavailable, continuing without it");
                None
            }
        };

        Ok(Self::from_parts(
            llm,
            embedder,
            index,
            &config.retrieval,
            &config.search,
            config.llm.max_iterations,
        ))
    }

    /// Assemble an engine from explicit parts. This is the seam the tests
    /// use to wire in scripted models.
    pub fn from_parts(
        llm: Arc<dyn ChatModel>,
        embedder: Arc<dyn Embedder>,
        index: Option<Arc<VectorIndex>>,
        retrieval: &RetrievalConfig,
        search: &SearchConfig,
        max_iterations: usize,
    ) -> Self {
        let catalog = Arc::new(ToolCatalog::new(
            llm.clone(),
            embedder,
            index,
            retrieval,
            search,
        ));
        Self {
            llm,
            catalog,
            max_iterations,
        }
    }

    /// Boundary contract with the caller (the UI layer): context in,
    /// guarded answer text out. Tool-level failures never surface as
    /// errors — only catastrophic agent failure does.
    pub async fn get_response(
        &self,
        chat_message: &str,
        mode: &str,
        category: &str,
        history: &[ConversationTurn],
    ) -> anyhow::Result<String> {
        let input =
            build_contextual_input(chat_message, mode, category, history, DEFAULT_MAX_TURNS);

        let agent = Agent::new(self.llm.clone(), self.catalog.clone(), self.max_iterations);
        let raw = agent.run(&input).await?;

        Ok(guard_output(&raw))
    }
}

/// Load the persisted index, or run the full first-time pipeline:
/// download → parse → chunk/embed/persist. The dominant path after the
/// first run is the load, which touches neither the PDF nor the network.
async fn prepare_index(
    config: &Config,
    embedder: &dyn Embedder,
    progress: &dyn BuildProgressReporter,
) -> Result<VectorIndex, CorpusError> {
    let storage_dir = &config.index.path;

    if VectorIndex::exists(storage_dir) {
        return VectorIndex::open(storage_dir).await;
    }

    progress.report(BuildEvent::Fetching {
        url: config.source.url.clone(),
    });
    let pdf_path = fetch::ensure_local(
        &config.source.url,
        &config.source.cache_path,
        config.source.fetch_timeout_secs,
    )
    .await?;

    progress.report(BuildEvent::Parsing);
    let units = fetch::parse_pages(&pdf_path)?;

    VectorIndex::build_or_load(
        &units,
        storage_dir,
        config.chunking.chunk_size,
        config.chunking.chunk_overlap,
        config.embedding.batch_size,
        embedder,
        progress,
    )
    .await
}

/// One user's conversation: selected mode/category plus the append-only
/// history the core reads a bounded suffix of.
pub struct Session {
    id: Uuid,
    mode: String,
    category: String,
    history: Vec<ConversationTurn>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            mode: String::new(),
            category: String::new(),
            history: Vec::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn mode(&self) -> &str {
        &self.mode
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn history(&self) -> &[ConversationTurn] {
        &self.history
    }

    /// Select the top-level mode. Changing mode mid-conversation starts a
    /// fresh consultation: history and category are cleared.
    pub fn select_mode(&mut self, mode: &str) {
        if mode != self.mode {
            self.history.clear();
            self.category.clear();
        }
        self.mode = mode.to_string();
    }

    pub fn select_category(&mut self, category: &str) {
        self.category = category.to_string();
    }

    /// Ask one question and record both turns in the history.
    pub async fn ask(&mut self, advisor: &Advisor, message: &str) -> anyhow::Result<String> {
        tracing::info!(session_id = %self.id, mode = %self.mode, "user message received");

        let answer = advisor
            .get_response(message, &self.mode, &self.category, &self.history)
            .await?;

        self.history.push((Role::User, message.to_string()));
        self.history.push((Role::Assistant, answer.clone()));

        Ok(answer)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
