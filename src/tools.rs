//! The advisory tool catalog.
//!
//! Every tool is `(name, description, text -> text)`. The set is fixed at
//! startup and immutable afterward; the reasoning agent resolves tools by
//! exact name, with an explicit unknown branch instead of any dynamic
//! dispatch.
//!
//! Failure policy differs by tool shape:
//! - template-advisory tools propagate completion failures as
//!   [`ToolError::Invocation`] — the agent decides how to surface them;
//! - the Companies-Act tool and the lookup tools convert every failure to
//!   a user-facing string and never error past their boundary.

use std::sync::Arc;
use std::time::Duration;

use crate::config::{RetrievalConfig, SearchConfig};
use crate::embedding::Embedder;
use crate::error::ToolError;
use crate::index::VectorIndex;
use crate::llm::ChatModel;
use crate::prompts;

enum ToolKind {
    /// Fixed system template + user input → completion text verbatim.
    Advisory { template: &'static str },
    /// Retrieval-grounded statute advice.
    CompanyLaw,
    Wikipedia,
    WebSearch,
}

struct Tool {
    name: &'static str,
    description: &'static str,
    kind: ToolKind,
}

/// Fixed, immutable catalog shared by every session.
pub struct ToolCatalog {
    tools: Vec<Tool>,
    llm: Arc<dyn ChatModel>,
    embedder: Arc<dyn Embedder>,
    index: Option<Arc<VectorIndex>>,
    top_k: usize,
    wikipedia_lang: String,
    http: reqwest::Client,
}

impl ToolCatalog {
    /// Assemble the catalog. `index` is `None` when the statute index
    /// failed to build; the Companies-Act tool then reports the resource
    /// as unavailable instead of the catalog shrinking.
    pub fn new(
        llm: Arc<dyn ChatModel>,
        embedder: Arc<dyn Embedder>,
        index: Option<Arc<VectorIndex>>,
        retrieval: &RetrievalConfig,
        search: &SearchConfig,
    ) -> Self {
        let tools = vec![
            advisory(
                prompts::MARKETING_STRATEGY_NAME,
                prompts::MARKETING_STRATEGY_DESCRIPTION,
                prompts::MARKETING_STRATEGY_TEMPLATE,
            ),
            advisory(
                prompts::SALES_STRATEGY_NAME,
                prompts::SALES_STRATEGY_DESCRIPTION,
                prompts::SALES_STRATEGY_TEMPLATE,
            ),
            advisory(
                prompts::RECRUITMENT_STRATEGY_NAME,
                prompts::RECRUITMENT_STRATEGY_DESCRIPTION,
                prompts::RECRUITMENT_STRATEGY_TEMPLATE,
            ),
            advisory(
                prompts::ORGANIZATIONAL_STRATEGY_NAME,
                prompts::ORGANIZATIONAL_STRATEGY_DESCRIPTION,
                prompts::ORGANIZATIONAL_STRATEGY_TEMPLATE,
            ),
            advisory(
                prompts::BUSINESS_IMPROVEMENT_NAME,
                prompts::BUSINESS_IMPROVEMENT_DESCRIPTION,
                prompts::BUSINESS_IMPROVEMENT_TEMPLATE,
            ),
            advisory(
                prompts::PHYSICAL_HEALTH_NAME,
                prompts::PHYSICAL_HEALTH_DESCRIPTION,
                prompts::PHYSICAL_HEALTH_TEMPLATE,
            ),
            advisory(
                prompts::MENTAL_HEALTH_NAME,
                prompts::MENTAL_HEALTH_DESCRIPTION,
                prompts::MENTAL_HEALTH_TEMPLATE,
            ),
            Tool {
                name: prompts::COMPANY_LAW_NAME,
                description: prompts::COMPANY_LAW_DESCRIPTION,
                kind: ToolKind::CompanyLaw,
            },
            Tool {
                name: prompts::SEARCH_WEB_TOOL_NAME,
                description: prompts::SEARCH_WEB_TOOL_DESCRIPTION,
                kind: ToolKind::WebSearch,
            },
            Tool {
                name: prompts::SEARCH_WIKIPEDIA_TOOL_NAME,
                description: prompts::SEARCH_WIKIPEDIA_TOOL_DESCRIPTION,
                kind: ToolKind::Wikipedia,
            },
        ];

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(search.timeout_secs))
            .build()
            .unwrap_or_default();

        Self {
            tools,
            llm,
            embedder,
            index,
            top_k: retrieval.top_k,
            wikipedia_lang: search.wikipedia_lang.clone(),
            http,
        }
    }

    /// Name-and-description listing for the reasoning prompt.
    pub fn descriptions(&self) -> String {
        self.tools
            .iter()
            .map(|t| format!("- {}: {}", t.name, t.description))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Comma-joined tool names for the reasoning prompt.
    pub fn names(&self) -> String {
        self.tools
            .iter()
            .map(|t| t.name)
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.iter().any(|t| t.name == name)
    }

    /// Dispatch by exact name. Unknown names and advisory completion
    /// failures come back as `Err`; the agent converts both to
    /// observations at its own boundary.
    pub async fn invoke(&self, name: &str, input: &str) -> Result<String, ToolError> {
        let tool = self
            .tools
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| ToolError::Unknown(name.to_string()))?;

        match &tool.kind {
            ToolKind::Advisory { template } => {
                let answer = self.llm.complete(Some(*template), input).await?;
                Ok(answer)
            }
            ToolKind::CompanyLaw => Ok(self.company_law_advice(input).await),
            ToolKind::Wikipedia => Ok(self.wikipedia_search(input).await),
            ToolKind::WebSearch => Ok(self.web_search(input).await),
        }
    }

    // ==========================================
    // Companies Act (retrieval-grounded)
    // ==========================================

    /// Never errors past this boundary: a missing index yields the fixed
    /// unavailable message without touching network or retrieval, and any
    /// retrieval/completion failure becomes a descriptive string.
    async fn company_law_advice(&self, input: &str) -> String {
        let Some(index) = &self.index else {
            return prompts::COMPANY_LAW_UNAVAILABLE_MESSAGE.to_string();
        };

        match self.company_law_grounded(index, input).await {
            Ok(answer) => answer,
            Err(e) => {
                tracing::warn!(error = %e, "statute tool failed");
                format!("{}: {}", prompts::COMPANY_LAW_ERROR_PREFIX, e)
            }
        }
    }

    async fn company_law_grounded(
        &self,
        index: &VectorIndex,
        input: &str,
    ) -> anyhow::Result<String> {
        let hits = index.query(self.embedder.as_ref(), input, self.top_k).await?;

        let context = hits
            .iter()
            .map(|h| h.chunk.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        let system = prompts::COMPANY_LAW_TEMPLATE.replace("{context}", &context);
        let answer = self.llm.complete(Some(&system), input).await?;
        Ok(answer)
    }

    // ==========================================
    // Wikipedia
    // ==========================================

    async fn wikipedia_search(&self, query: &str) -> String {
        match self.wikipedia_lookup(query).await {
            Ok(Some(citation)) => citation,
            Ok(None) => format!("Wikipediaで該当記事が見つかりませんでした: {}", query),
            Err(e) => format!("Wikipedia検索中にエラーが発生しました: {}", e),
        }
    }

    /// Search API for the top hit title, then the REST summary API.
    async fn wikipedia_lookup(&self, query: &str) -> anyhow::Result<Option<String>> {
        let lang = &self.wikipedia_lang;

        let search_url = format!("https://{}.wikipedia.org/w/api.php", lang);
        let data: serde_json::Value = self
            .http
            .get(&search_url)
            .query(&[
                ("action", "query"),
                ("list", "search"),
                ("srsearch", query),
                ("format", "json"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let title = data
            .pointer("/query/search/0/title")
            .and_then(|t| t.as_str());
        let Some(title) = title else {
            return Ok(None);
        };

        let mut summary_url = reqwest::Url::parse(&format!(
            "https://{}.wikipedia.org/api/rest_v1/page/summary/",
            lang
        ))?;
        summary_url
            .path_segments_mut()
            .map_err(|_| anyhow::anyhow!("invalid summary URL"))?
            .pop_if_empty()
            .push(title);

        let summary: serde_json::Value = self
            .http
            .get(summary_url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let extract = summary
            .get("extract")
            .and_then(|e| e.as_str())
            .unwrap_or("概要が取得できませんでした。");

        let page_url = match summary
            .pointer("/content_urls/desktop/page")
            .and_then(|u| u.as_str())
        {
            Some(url) => url.to_string(),
            None => {
                let mut fallback =
                    reqwest::Url::parse(&format!("https://{}.wikipedia.org/wiki/", lang))?;
                fallback
                    .path_segments_mut()
                    .map_err(|_| anyhow::anyhow!("invalid article URL"))?
                    .pop_if_empty()
                    .push(title);
                fallback.to_string()
            }
        };

        Ok(Some(format!(
            "【Wikipedia】{}\n{}\n\nURL: {}",
            title, extract, page_url
        )))
    }

    // ==========================================
    // Web search (SerpAPI)
    // ==========================================

    async fn web_search(&self, query: &str) -> String {
        let Ok(api_key) = std::env::var("SERPAPI_API_KEY") else {
            return "Web検索を利用できません: SERPAPI_API_KEYが設定されていません。".to_string();
        };

        match self.serpapi_lookup(&api_key, query).await {
            Ok(Some(citation)) => citation,
            Ok(None) => format!("Web検索で該当する結果が見つかりませんでした: {}", query),
            Err(e) => format!("Web検索中にエラーが発生しました: {}", e),
        }
    }

    async fn serpapi_lookup(&self, api_key: &str, query: &str) -> anyhow::Result<Option<String>> {
        let data: serde_json::Value = self
            .http
            .get("https://serpapi.com/search.json")
            .query(&[
                ("engine", "google"),
                ("q", query),
                ("hl", self.wikipedia_lang.as_str()),
                ("api_key", api_key),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let Some(hit) = data.pointer("/organic_results/0") else {
            return Ok(None);
        };

        let title = hit.get("title").and_then(|t| t.as_str()).unwrap_or("(無題)");
        let snippet = hit
            .get("snippet")
            .and_then(|s| s.as_str())
            .unwrap_or("概要が取得できませんでした。");
        let link = hit.get("link").and_then(|l| l.as_str()).unwrap_or("");

        Ok(Some(format!(
            "【Web検索】{}\n{}\n\nURL: {}",
            title, snippet, link
        )))
    }
}

fn advisory(name: &'static str, description: &'static str, template: &'static str) -> Tool {
    Tool {
        name,
        description,
        kind: ToolKind::Advisory { template },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LlmError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Echoes which template it was handed; counts calls.
    struct EchoChat {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ChatModel for EchoChat {
        async fn complete(&self, system: Option<&str>, user: &str) -> Result<String, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("[{}] {}", system.unwrap_or(""), user))
        }
    }

    struct CountingEmbedder {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Embedder for CountingEmbedder {
        fn model_name(&self) -> &str {
            "test-embedder"
        }
        fn dims(&self) -> usize {
            4
        }
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(texts.iter().map(|_| vec![0.0; 4]).collect())
        }
    }

    fn catalog_without_index() -> (ToolCatalog, Arc<EchoChat>, Arc<CountingEmbedder>) {
        let llm = Arc::new(EchoChat {
            calls: AtomicUsize::new(0),
        });
        let embedder = Arc::new(CountingEmbedder {
            calls: AtomicUsize::new(0),
        });
        let catalog = ToolCatalog::new(
            llm.clone(),
            embedder.clone(),
            None,
            &RetrievalConfig::default(),
            &SearchConfig::default(),
        );
        (catalog, llm, embedder)
    }

    #[tokio::test]
    async fn test_unknown_tool_is_typed_error() {
        let (catalog, _, _) = catalog_without_index();
        let err = catalog.invoke("存在しないツール", "入力").await.unwrap_err();
        assert!(matches!(err, ToolError::Unknown(_)));
    }

    #[tokio::test]
    async fn test_advisory_tool_uses_its_template() {
        let (catalog, llm, _) = catalog_without_index();
        let answer = catalog
            .invoke(prompts::MARKETING_STRATEGY_NAME, "新製品の売り方は?")
            .await
            .unwrap();
        assert!(answer.contains("マーケティング戦略の専門家"));
        assert!(answer.contains("新製品の売り方は?"));
        assert_eq!(llm.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_company_law_unavailable_makes_no_calls() {
        let (catalog, llm, embedder) = catalog_without_index();
        let answer = catalog
            .invoke(prompts::COMPANY_LAW_NAME, "取締役の責任は?")
            .await
            .unwrap();
        assert_eq!(answer, prompts::COMPANY_LAW_UNAVAILABLE_MESSAGE);
        assert_eq!(llm.calls.load(Ordering::SeqCst), 0);
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_catalog_is_complete() {
        let (catalog, _, _) = catalog_without_index();
        assert!(catalog.contains(prompts::MENTAL_HEALTH_NAME));
        assert!(catalog.contains(prompts::SEARCH_WEB_TOOL_NAME));
        assert!(catalog.contains(prompts::SEARCH_WIKIPEDIA_TOOL_NAME));
        assert_eq!(catalog.names().split(", ").count(), 10);
    }
}
