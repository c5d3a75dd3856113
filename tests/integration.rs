//! End-to-end tests over the library with deterministic in-process
//! fakes standing in for the OpenAI endpoints. No test touches the
//! network.

use async_trait::async_trait;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

use soudan::config::{RetrievalConfig, SearchConfig};
use soudan::embedding::Embedder;
use soudan::engine::Advisor;
use soudan::error::LlmError;
use soudan::index::VectorIndex;
use soudan::llm::ChatModel;
use soudan::models::TextUnit;
use soudan::progress::NoProgress;
use soudan::prompts;

const DIMS: usize = 16;

/// Deterministic bag-of-chars embedding: similar texts get similar
/// vectors, identical texts get identical vectors. Counts every
/// `embed` call so idempotence is observable.
struct FakeEmbedder {
    calls: AtomicUsize,
}

impl FakeEmbedder {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }

    fn embed_one(text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; DIMS];
        for c in text.chars() {
            v[(c as usize) % DIMS] += 1.0;
        }
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in v.iter_mut() {
                *x /= norm;
            }
        }
        v
    }
}

#[async_trait]
impl Embedder for FakeEmbedder {
    fn model_name(&self) -> &str {
        "fake-bag-of-chars"
    }
    fn dims(&self) -> usize {
        DIMS
    }
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|t| Self::embed_one(t)).collect())
    }
}

/// Fails on the given 1-based batch call.
struct FailingEmbedder {
    calls: AtomicUsize,
    fail_on: usize,
}

#[async_trait]
impl Embedder for FailingEmbedder {
    fn model_name(&self) -> &str {
        "failing"
    }
    fn dims(&self) -> usize {
        DIMS
    }
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, LlmError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if n == self.fail_on {
            return Err(LlmError::Transport("simulated batch failure".to_string()));
        }
        Ok(texts.iter().map(|t| FakeEmbedder::embed_one(t)).collect())
    }
}

fn sample_units() -> Vec<TextUnit> {
    // Three pages, long enough to split into several overlapping chunks
    // at chunk_size=100 / overlap=20.
    vec![
        TextUnit {
            page: 1,
            text: "株式会社の設立には定款の作成と公証人による認証が必要である。".repeat(8),
        },
        TextUnit {
            page: 2,
            text: "取締役は株式会社に対して善管注意義務および忠実義務を負う。".repeat(8),
        },
        TextUnit {
            page: 3,
            text: "監査役は取締役の職務の執行を監査し監査報告を作成する。".repeat(8),
        },
    ]
}

async fn build_index(
    dir: &Path,
    embedder: &dyn Embedder,
    batch_size: usize,
) -> Result<VectorIndex, soudan::error::CorpusError> {
    VectorIndex::build_or_load(
        &sample_units(),
        dir,
        100,
        20,
        batch_size,
        embedder,
        &NoProgress,
    )
    .await
}

// ==========================================
// Index construction
// ==========================================

#[tokio::test]
async fn test_build_then_load_is_idempotent() {
    let tmp = TempDir::new().unwrap();
    let store = tmp.path().join("vector_store");
    let embedder = FakeEmbedder::new();

    let first = build_index(&store, &embedder, 4).await.unwrap();
    let build_calls = embedder.calls.load(Ordering::SeqCst);
    assert!(build_calls > 0, "first call must embed");
    assert!(store.is_dir(), "index must be persisted");

    let second = build_index(&store, &embedder, 4).await.unwrap();
    assert_eq!(
        embedder.calls.load(Ordering::SeqCst),
        build_calls,
        "second call must perform zero embedding work"
    );
    assert_eq!(first.len(), second.len());

    // Equivalent retrieval results from both handles.
    let q = "取締役の義務";
    let a = first.query(&embedder, q, 3).await.unwrap();
    let b = second.query(&embedder, q, 3).await.unwrap();
    let texts_a: Vec<&str> = a.iter().map(|s| s.chunk.text.as_str()).collect();
    let texts_b: Vec<&str> = b.iter().map(|s| s.chunk.text.as_str()).collect();
    assert_eq!(texts_a, texts_b);
}

#[tokio::test]
async fn test_batch_size_does_not_change_retrieval() {
    let tmp = TempDir::new().unwrap();
    let embedder = FakeEmbedder::new();

    let small = build_index(&tmp.path().join("small_batches"), &embedder, 2)
        .await
        .unwrap();
    let single = build_index(&tmp.path().join("one_batch"), &embedder, 10_000)
        .await
        .unwrap();

    assert_eq!(small.len(), single.len());

    for query in ["定款の認証", "監査報告", "忠実義務"] {
        let a = small.query(&embedder, query, 5).await.unwrap();
        let b = single.query(&embedder, query, 5).await.unwrap();
        let texts_a: Vec<&str> = a.iter().map(|s| s.chunk.text.as_str()).collect();
        let texts_b: Vec<&str> = b.iter().map(|s| s.chunk.text.as_str()).collect();
        assert_eq!(texts_a, texts_b, "query {:?} ranked differently", query);
    }
}

#[tokio::test]
async fn test_failed_build_persists_nothing() {
    let tmp = TempDir::new().unwrap();
    let store = tmp.path().join("vector_store");
    let embedder = FailingEmbedder {
        calls: AtomicUsize::new(0),
        fail_on: 2,
    };

    let err = build_index(&store, &embedder, 2).await.unwrap_err();
    assert!(matches!(err, soudan::error::CorpusError::IndexBuild(_)));
    assert!(!store.exists(), "partial index must not be persisted");
    assert!(
        !store.with_file_name("vector_store.partial").exists(),
        "partial build directory must be cleaned up"
    );
}

#[tokio::test]
async fn test_query_k_capped_at_chunk_count() {
    let tmp = TempDir::new().unwrap();
    let store = tmp.path().join("vector_store");
    let embedder = FakeEmbedder::new();

    let index = build_index(&store, &embedder, 4).await.unwrap();
    let hits = index.query(&embedder, "設立", 10_000).await.unwrap();
    assert_eq!(hits.len(), index.len());
}

#[tokio::test]
async fn test_query_ranked_descending() {
    let tmp = TempDir::new().unwrap();
    let store = tmp.path().join("vector_store");
    let embedder = FakeEmbedder::new();

    let index = build_index(&store, &embedder, 4).await.unwrap();
    let hits = index.query(&embedder, "監査役の監査報告", 5).await.unwrap();
    for pair in hits.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
}

// ==========================================
// Engine boundary
// ==========================================

/// Scripted reasoner for the grounded path: asks the statute tool, then
/// finishes from its observation.
struct StatuteScript;

#[async_trait]
impl ChatModel for StatuteScript {
    async fn complete(&self, system: Option<&str>, user: &str) -> Result<String, LlmError> {
        let system = system.unwrap_or("");
        if system.starts_with("あなたは会社法の専門家AIです。") {
            // Grounded completion: retrieved context must be substituted in.
            assert!(system.contains("【参考情報】"));
            assert!(
                !system.contains("{context}"),
                "context placeholder must be filled"
            );
            return Ok("会社法第26条により、定款の作成が必要です。".to_string());
        }
        if user.contains("Observation:") {
            Ok("Thought: 根拠が揃った\nFinal Answer: 定款の作成が必要です。".to_string())
        } else {
            Ok(format!(
                "Thought: 条文を確認する\nAction: {}\nAction Input: 株式会社の設立",
                prompts::COMPANY_LAW_NAME
            ))
        }
    }
}

#[tokio::test]
async fn test_get_response_grounds_statute_questions() {
    let tmp = TempDir::new().unwrap();
    let store = tmp.path().join("vector_store");
    let embedder = Arc::new(FakeEmbedder::new());

    let index = build_index(&store, embedder.as_ref(), 4).await.unwrap();

    let advisor = Advisor::from_parts(
        Arc::new(StatuteScript),
        embedder,
        Some(Arc::new(index)),
        &RetrievalConfig::default(),
        &SearchConfig::default(),
        3,
    );

    let answer = advisor
        .get_response(
            "株式会社の設立に必要なものは?",
            prompts::MODE_BUSINESS,
            prompts::CATEGORY_COMPANY_LAW,
            &[],
        )
        .await
        .unwrap();

    assert_eq!(answer, "定款の作成が必要です。");
}

/// Asks the statute tool once, then answers with whatever it observed.
struct EchoObservation;

#[async_trait]
impl ChatModel for EchoObservation {
    async fn complete(&self, _system: Option<&str>, user: &str) -> Result<String, LlmError> {
        if let Some(pos) = user.find("Observation: ") {
            let obs = user[pos + "Observation: ".len()..].lines().next().unwrap_or("");
            Ok(format!("Final Answer: {}", obs))
        } else {
            Ok(format!(
                "Thought: 条文を確認する\nAction: {}\nAction Input: 設立",
                prompts::COMPANY_LAW_NAME
            ))
        }
    }
}

#[tokio::test]
async fn test_missing_index_surfaces_fixed_message_without_retrieval() {
    let embedder = Arc::new(FakeEmbedder::new());

    let advisor = Advisor::from_parts(
        Arc::new(EchoObservation),
        embedder.clone(),
        None,
        &RetrievalConfig::default(),
        &SearchConfig::default(),
        3,
    );

    let answer = advisor
        .get_response("設立について", "", "", &[])
        .await
        .unwrap();

    assert_eq!(answer, prompts::COMPANY_LAW_UNAVAILABLE_MESSAGE);
    assert_eq!(
        embedder.calls.load(Ordering::SeqCst),
        0,
        "no retrieval may be attempted without an index"
    );
}

/// Leaks its reasoning transcript instead of a clean answer.
struct LeakyReasoner;

#[async_trait]
impl ChatModel for LeakyReasoner {
    async fn complete(&self, system: Option<&str>, _user: &str) -> Result<String, LlmError> {
        if system == Some(prompts::SYNTHESIZE_SYSTEM_PROMPT) {
            // Degraded synthesis also leaks an unresolved action.
            Ok("Thought: 検索したい\nAction: search_web_tool".to_string())
        } else {
            Ok("まとまらない出力".to_string())
        }
    }
}

#[tokio::test]
async fn test_output_guard_replaces_leaked_transcript() {
    let advisor = Advisor::from_parts(
        Arc::new(LeakyReasoner),
        Arc::new(FakeEmbedder::new()),
        None,
        &RetrievalConfig::default(),
        &SearchConfig::default(),
        2,
    );

    let answer = advisor.get_response("何か", "", "", &[]).await.unwrap();
    assert_eq!(answer, prompts::SEARCH_INCOMPLETE_MESSAGE);
}
