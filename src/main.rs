//! # Soudan CLI
//!
//! The `soudan` binary is the conversational front-end for the advisory
//! engine — it stands in for the excluded UI layer by driving
//! `get_response` and printing the answer.
//!
//! ## Usage
//!
//! ```bash
//! soudan --config ./config/soudan.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `soudan init` | Download the statute PDF and build the vector index |
//! | `soudan ask "<question>"` | Answer one question (optionally with mode/category) |
//! | `soudan search "<query>"` | Inspect raw statute retrieval results |
//! | `soudan chat` | Interactive consultation session with history |
//!
//! ## Examples
//!
//! ```bash
//! # One-time index construction (also happens lazily on first ask)
//! soudan init
//!
//! # A grounded statute question
//! soudan ask "監査役の任期は?" --mode "経営に関するお悩み相談" --category "法律(会社法)"
//!
//! # See which chunks retrieval would hand to the statute tool
//! soudan search "取締役の責任"
//!
//! # A full session
//! soudan chat --mode "健康に関するお悩み相談"
//! ```
//!
//! Secrets come from the environment (or a `.env` file):
//! `OPENAI_API_KEY` is required, `SERPAPI_API_KEY` enables web search.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::io::{BufRead, Write};
use std::path::PathBuf;

use soudan::config::{self, Config};
use soudan::embedding::OpenAiEmbedder;
use soudan::engine::{Advisor, Session};
use soudan::index::VectorIndex;
use soudan::progress::ProgressMode;
use soudan::prompts;

/// Soudan — a retrieval-grounded advisory chat engine for business and
/// employee-health consultations.
#[derive(Parser)]
#[command(
    name = "soudan",
    about = "Soudan — a retrieval-grounded advisory chat engine",
    version,
    long_about = "Soudan answers business-strategy and health questions through a fixed \
    catalog of advisory tools, grounds Companies-Act questions in a persistent vector \
    index over the statute PDF, and degrades gracefully when reasoning or lookups fail."
)]
struct Cli {
    /// Path to configuration file (TOML). Defaults apply when absent.
    #[arg(long, global = true, default_value = "./config/soudan.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download the statute PDF and build the vector index.
    ///
    /// Idempotent: when the index directory already exists it is loaded
    /// and left untouched. The build embeds chunks in batches and only
    /// persists on full success.
    Init,

    /// Answer a single question.
    Ask {
        /// The question text.
        message: String,

        /// Top-level consultation mode (e.g. 経営に関するお悩み相談).
        #[arg(long, default_value = "")]
        mode: String,

        /// Selected category within the mode (e.g. マーケティング).
        #[arg(long, default_value = "")]
        category: String,
    },

    /// Show the raw statute chunks retrieval would return for a query.
    Search {
        /// The query text.
        query: String,

        /// Number of chunks to show.
        #[arg(long)]
        top_k: Option<usize>,
    },

    /// Interactive consultation session.
    ///
    /// Lines are sent as messages; `:mode <名前>` switches the mode
    /// (clearing the history, as a new consultation), `:genre <名前>`
    /// selects a category, and `:quit` ends the session.
    Chat {
        /// Initial consultation mode.
        #[arg(long, default_value = "")]
        mode: String,

        /// Initial category.
        #[arg(long, default_value = "")]
        category: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "soudan=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => run_init(&cfg).await,
        Commands::Ask {
            message,
            mode,
            category,
        } => run_ask(&cfg, &message, &mode, &category).await,
        Commands::Search { query, top_k } => run_search(&cfg, &query, top_k).await,
        Commands::Chat { mode, category } => run_chat(&cfg, &mode, &category).await,
    }
}

async fn run_init(cfg: &Config) -> Result<()> {
    let progress = ProgressMode::default_for_tty().reporter();
    let advisor = Advisor::initialize(cfg, progress.as_ref()).await;

    match advisor {
        Ok(_) => {
            if VectorIndex::exists(&cfg.index.path) {
                println!("index ready at {}", cfg.index.path.display());
            } else {
                println!("engine initialized, but the statute index could not be built");
                println!("(the Companies-Act tool will report the resource as unavailable)");
            }
            Ok(())
        }
        Err(e) => {
            anyhow::bail!(fatal_message(prompts::INITIALIZE_ERROR_MESSAGE, &e))
        }
    }
}

async fn run_ask(cfg: &Config, message: &str, mode: &str, category: &str) -> Result<()> {
    let progress = ProgressMode::default_for_tty().reporter();
    let advisor = Advisor::initialize(cfg, progress.as_ref())
        .await
        .map_err(|e| anyhow::anyhow!(fatal_message(prompts::INITIALIZE_ERROR_MESSAGE, &e)))?;

    let answer = advisor
        .get_response(message, mode, category, &[])
        .await
        .map_err(|e| anyhow::anyhow!(fatal_message(prompts::GET_RESPONSE_ERROR_MESSAGE, &e)))?;

    println!("{}", answer);
    Ok(())
}

async fn run_search(cfg: &Config, query: &str, top_k: Option<usize>) -> Result<()> {
    if !VectorIndex::exists(&cfg.index.path) {
        anyhow::bail!(
            "no index at {} — run `soudan init` first",
            cfg.index.path.display()
        );
    }

    let index = VectorIndex::open(&cfg.index.path).await?;
    let embedder = OpenAiEmbedder::new(&cfg.embedding)?;
    let k = top_k.unwrap_or(cfg.retrieval.top_k);

    let hits = index.query(&embedder, query, k).await?;

    if hits.is_empty() {
        println!("No results.");
        return Ok(());
    }

    for (i, hit) in hits.iter().enumerate() {
        let excerpt: String = hit.chunk.text.chars().take(120).collect();
        println!("{}. [{:.3}] page {}", i + 1, hit.score, hit.chunk.page);
        println!("    excerpt: \"{}\"", excerpt.replace('\n', " "));
        println!();
    }

    Ok(())
}

async fn run_chat(cfg: &Config, mode: &str, category: &str) -> Result<()> {
    let progress = ProgressMode::default_for_tty().reporter();
    let advisor = Advisor::initialize(cfg, progress.as_ref())
        .await
        .map_err(|e| anyhow::anyhow!(fatal_message(prompts::INITIALIZE_ERROR_MESSAGE, &e)))?;

    let mut session = Session::new();
    if !mode.is_empty() {
        session.select_mode(mode);
    }
    if !category.is_empty() {
        session.select_category(category);
    }

    println!("こんにちは。私は企業と従業員の健康を手助けする生成AIチャットボットです。");
    println!("お悩み（:mode）とジャンル（:genre）を選択し、メッセージを送信してください。:quit で終了します。");
    print_selection(&session);

    let stdin = std::io::stdin();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(rest) = line.strip_prefix(":mode ") {
            session.select_mode(rest.trim());
            print_selection(&session);
            continue;
        }
        if let Some(rest) = line.strip_prefix(":genre ") {
            session.select_category(rest.trim());
            print_selection(&session);
            continue;
        }
        if line == ":quit" || line == ":q" {
            break;
        }

        match session.ask(&advisor, line).await {
            Ok(answer) => println!("{}\n", answer),
            Err(e) => eprintln!(
                "{}",
                fatal_message(prompts::GET_RESPONSE_ERROR_MESSAGE, &e)
            ),
        }
    }

    Ok(())
}

fn print_selection(session: &Session) {
    let mode = if session.mode().is_empty() {
        "(未選択)"
    } else {
        session.mode()
    };
    let category = if session.category().is_empty() {
        "(未選択)"
    } else {
        session.category()
    };
    println!("お悩み種別: {} / ジャンル: {}", mode, category);

    let categories = prompts::categories_for_mode(session.mode());
    if !categories.is_empty() {
        println!("選択できるジャンル: {}", categories.join(" / "));
    }
}

/// Fatal errors carry the fixed contact-the-administrator suffix.
fn fatal_message(message: &str, err: &anyhow::Error) -> String {
    format!("{}\n{}\n{}", message, err, prompts::COMMON_ERROR_MESSAGE)
}
