//! Conversational context builder.
//!
//! Folds the selected mode/category and a bounded suffix of the turn
//! history into the single query string handed to the reasoning agent.
//! Pure function: deterministic, no side effects, no network.

use crate::models::{ConversationTurn, Role};

/// Pairs of user/assistant turns included from the end of the history.
pub const DEFAULT_MAX_TURNS: usize = 4;

/// Build the agent input for one chat message.
///
/// Layout: an optional header block naming the mode and category (each
/// line only when set), the last `max_turns` pairs of history rendered as
/// `ユーザー:` / `アシスタント:` lines, then the current message as a
/// final `ユーザー:` line. Blocks are joined with blank lines; empty
/// blocks are omitted entirely, so there are never dangling separators.
pub fn build_contextual_input(
    chat_message: &str,
    mode: &str,
    category: &str,
    history: &[ConversationTurn],
    max_turns: usize,
) -> String {
    let mut header_lines = Vec::new();
    if !mode.is_empty() {
        header_lines.push(format!("[お悩み種別: {}]", mode));
    }
    if !category.is_empty() {
        header_lines.push(format!("[選択ジャンル: {}]", category));
    }
    let header = header_lines.join("\n");

    let skip = history.len().saturating_sub(max_turns * 2);
    let history_block = history[skip..]
        .iter()
        .map(|(role, content)| match role {
            Role::User => format!("ユーザー: {}", content),
            Role::Assistant => format!("アシスタント: {}", content),
        })
        .collect::<Vec<_>>()
        .join("\n");

    let current = format!("ユーザー: {}", chat_message);

    [header, history_block, current]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}
