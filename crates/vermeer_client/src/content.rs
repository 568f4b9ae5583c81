//! Mention resolution and content normalization.

use crate::models::{GuildId, Member, MemberKey, UserId};
use futures::future::join_all;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use crate::resource::CachedResource;

/// Raw mention tokens: `<@123>` or the legacy nickname form `<@!123>`.
static MENTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<@!?(\d+)>").expect("mention pattern is valid"));

/// One mention token and what it resolved to.
///
/// `resolved_text` is `None` when the lookup failed or the referenced
/// member no longer exists; the original token is left untouched in that
/// case.
#[derive(Debug, Clone, PartialEq, Eq, derive_getters::Getters)]
pub struct ResolvedMention {
    /// The token exactly as it appeared in the text.
    raw_token: String,
    /// Display form to substitute, when resolution succeeded.
    resolved_text: Option<String>,
}

/// Resolves mention tokens against the member cache and normalizes
/// message content for display.
#[derive(Clone)]
pub struct ContentResolver {
    members: CachedResource<MemberKey, Member>,
}

impl ContentResolver {
    /// Create a resolver over the shared member cache.
    pub fn new(members: CachedResource<MemberKey, Member>) -> Self {
        Self { members }
    }

    /// Extract and resolve every mention token in `text`.
    ///
    /// Each distinct referenced user is looked up once; all lookups are
    /// issued together with no ordering between them. An individual
    /// failure degrades that token to unresolved rather than failing the
    /// whole text.
    pub async fn resolve_mentions(&self, guild: GuildId, text: &str) -> Vec<ResolvedMention> {
        let mut tokens: Vec<(String, UserId)> = Vec::new();
        let mut seen_tokens = HashSet::new();
        let mut user_ids: Vec<UserId> = Vec::new();
        let mut seen_users = HashSet::new();

        for capture in MENTION.captures_iter(text) {
            let raw = capture[0].to_string();
            // Overflowing digit runs are not valid snowflakes; skip them.
            let Ok(user) = capture[1].parse::<u64>() else {
                continue;
            };
            let user = UserId::new(user);
            if seen_tokens.insert(raw.clone()) {
                tokens.push((raw, user));
            }
            if seen_users.insert(user) {
                user_ids.push(user);
            }
        }
        if tokens.is_empty() {
            return Vec::new();
        }

        let lookups = user_ids.iter().map(|&user| {
            let members = self.members.clone();
            async move {
                match members.get((guild, user)).await {
                    Ok(found) => (user, found.map(|m| m.display_name().to_string())),
                    Err(e) => {
                        tracing::debug!(user = %user, error = %e, "Mention lookup failed");
                        (user, None)
                    }
                }
            }
        });
        let display_names: HashMap<UserId, Option<String>> =
            join_all(lookups).await.into_iter().collect();

        tokens
            .into_iter()
            .map(|(raw_token, user)| ResolvedMention {
                raw_token,
                resolved_text: display_names.get(&user).cloned().flatten(),
            })
            .collect()
    }

    /// Resolve mentions in `text` and normalize the result for display.
    ///
    /// Every occurrence of a resolved token is rewritten to the member's
    /// display form; unresolvable tokens stay byte-for-byte identical.
    /// Code-fence markers are then normalized so fenced blocks never glue
    /// to adjacent prose.
    pub async fn resolve(&self, guild: GuildId, text: &str) -> String {
        let mentions = self.resolve_mentions(guild, text).await;

        let mut rewritten = text.to_string();
        for mention in mentions {
            if let Some(display) = &mention.resolved_text {
                rewritten = rewritten.replace(&mention.raw_token, &format!("@{display}"));
            }
        }

        normalize_code_fences(&rewritten)
    }
}

/// Normalize triple-backtick fence markers so that fenced blocks are
/// separated from surrounding prose: every opening fence starts on its own
/// line and every closing fence ends one.
///
/// # Example
///
/// ```
/// use vermeer_client::normalize_code_fences;
///
/// let glued = "see:```rust\nfn main() {}\n```done";
/// assert_eq!(
///     normalize_code_fences(glued),
///     "see:\n```rust\nfn main() {}\n```\ndone"
/// );
/// ```
pub fn normalize_code_fences(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    let mut rest = text;
    let mut opening = true;

    while let Some(pos) = rest.find("```") {
        out.push_str(&rest[..pos]);
        rest = &rest[pos + 3..];

        if !out.is_empty() && !out.ends_with('\n') {
            out.push('\n');
        }
        out.push_str("```");
        if !opening && !rest.is_empty() && !rest.starts_with('\n') {
            out.push('\n');
        }
        opening = !opening;
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaves_clean_fences_untouched() {
        let text = "prose\n```\ncode\n```\nprose";
        assert_eq!(normalize_code_fences(text), text);
    }

    #[test]
    fn splits_glued_opening_fence() {
        let text = "prose```\ncode\n```";
        assert_eq!(normalize_code_fences(text), "prose\n```\ncode\n```");
    }

    #[test]
    fn splits_glued_closing_fence() {
        let text = "```\ncode\n```prose";
        assert_eq!(normalize_code_fences(text), "```\ncode\n```\nprose");
    }

    #[test]
    fn no_fences_is_identity() {
        assert_eq!(normalize_code_fences("just text"), "just text");
    }
}
