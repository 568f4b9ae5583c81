//! Tests for mention resolution against the member cache.

mod common;

use common::MockRest;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use vermeer_cache::CacheConfig;
use vermeer_client::{
    CachedResource, ContentResolver, GuildId, Member, MemberKey, RestApi, UserId,
};
use vermeer_rate_limit::RateLimiter;

const GUILD: GuildId = GuildId::new(1);

fn resolver(rest: Arc<MockRest>) -> ContentResolver {
    let members: CachedResource<MemberKey, Member> = CachedResource::new(
        "member",
        CacheConfig::default(),
        RateLimiter::unlimited(),
        move |(guild, user)| {
            let rest = Arc::clone(&rest);
            async move { rest.fetch_member(guild, user).await }
        },
    );
    ContentResolver::new(members)
}

#[tokio::test]
async fn resolves_known_mentions_to_display_names() {
    let rest = Arc::new(MockRest::new());
    rest.insert_member(common::member(1, 42, "lorenzo", Some("Il Magnifico")));
    rest.insert_member(common::member(1, 43, "giuliano", None));
    let resolver = resolver(Arc::clone(&rest));

    let text = "hey <@42> and <@!43>, meeting at noon";
    let resolved = resolver.resolve(GUILD, text).await;

    assert_eq!(resolved, "hey @Il Magnifico and @giuliano, meeting at noon");
}

#[tokio::test]
async fn unknown_mention_is_left_untouched() {
    let rest = Arc::new(MockRest::new());
    rest.insert_member(common::member(1, 42, "lorenzo", None));
    let resolver = resolver(Arc::clone(&rest));

    let resolved = resolver.resolve(GUILD, "<@42> meet <@99>").await;

    assert_eq!(resolved, "@lorenzo meet <@99>");
}

#[tokio::test]
async fn lookup_failure_degrades_to_unresolved() {
    let rest = Arc::new(MockRest::new());
    rest.fail.store(true, Ordering::SeqCst);
    let resolver = resolver(Arc::clone(&rest));

    let resolved = resolver.resolve(GUILD, "ping <@42>").await;

    assert_eq!(resolved, "ping <@42>");
}

#[tokio::test]
async fn repeated_mentions_fetch_once() {
    let rest = Arc::new(MockRest::new());
    rest.insert_member(common::member(1, 42, "lorenzo", None));
    let resolver = resolver(Arc::clone(&rest));

    let resolved = resolver
        .resolve(GUILD, "<@42> <@42> <@!42> again <@42>")
        .await;

    assert_eq!(resolved, "@lorenzo @lorenzo @lorenzo again @lorenzo");
    assert_eq!(rest.member_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn resolve_mentions_reports_each_distinct_token() {
    let rest = Arc::new(MockRest::new());
    rest.insert_member(common::member(1, 42, "lorenzo", None));
    let resolver = resolver(Arc::clone(&rest));

    let mentions = resolver
        .resolve_mentions(GUILD, "<@42> and <@99> and <@42>")
        .await;

    assert_eq!(mentions.len(), 2);
    assert_eq!(mentions[0].raw_token(), "<@42>");
    assert_eq!(mentions[0].resolved_text(), &Some("lorenzo".to_string()));
    assert_eq!(mentions[1].raw_token(), "<@99>");
    assert_eq!(mentions[1].resolved_text(), &None);
}

#[tokio::test]
async fn mention_free_text_passes_through() {
    let rest = Arc::new(MockRest::new());
    let resolver = resolver(Arc::clone(&rest));

    let resolved = resolver.resolve(GUILD, "no mentions here").await;

    assert_eq!(resolved, "no mentions here");
    assert_eq!(rest.member_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn resolve_normalizes_code_fences() {
    let rest = Arc::new(MockRest::new());
    rest.insert_member(common::member(1, 42, "lorenzo", None));
    let resolver = resolver(Arc::clone(&rest));

    let resolved = resolver
        .resolve(GUILD, "<@42> wrote:```rust\nfn main() {}\n```nice")
        .await;

    assert_eq!(
        resolved,
        "@lorenzo wrote:\n```rust\nfn main() {}\n```\nnice"
    );
}
