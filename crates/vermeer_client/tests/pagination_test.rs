//! Tests for cursor-driven message pagination.

mod common;

use common::MockRest;
use futures::StreamExt;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use vermeer_client::{ChannelId, MessageId, MessageKind, MessagePaginator};
use vermeer_rate_limit::RateLimiter;

const CHANNEL: ChannelId = ChannelId::new(100);

fn paginator(rest: Arc<MockRest>, page_size: u8) -> MessagePaginator {
    MessagePaginator::new(rest, RateLimiter::unlimited(), CHANNEL).with_page_size(page_size)
}

fn seed_regular(rest: &MockRest, count: u64) {
    let batch = (1..=count)
        .map(|id| common::message(100, id, MessageKind::Regular))
        .collect();
    rest.insert_messages(CHANNEL, batch);
}

#[tokio::test]
async fn streams_all_messages_in_ascending_order() {
    let rest = Arc::new(MockRest::new());
    seed_regular(&rest, 25);

    let messages: Vec<_> = paginator(Arc::clone(&rest), 10)
        .stream(None)
        .map(|item| item.unwrap())
        .collect()
        .await;

    assert_eq!(messages.len(), 25);
    let ids: Vec<u64> = messages.iter().map(|m| m.id.get()).collect();
    assert_eq!(ids, (1..=25).collect::<Vec<_>>());
    // 25 messages at page size 10: two full pages and one short page.
    assert_eq!(rest.page_calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn exact_multiple_needs_one_extra_page() {
    let rest = Arc::new(MockRest::new());
    seed_regular(&rest, 20);

    let messages: Vec<_> = paginator(Arc::clone(&rest), 10)
        .stream(None)
        .map(|item| item.unwrap())
        .collect()
        .await;

    assert_eq!(messages.len(), 20);
    // Two full pages prove nothing about the end; a third, empty page does.
    assert_eq!(rest.page_calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn empty_channel_yields_nothing() {
    let rest = Arc::new(MockRest::new());

    let messages: Vec<_> = paginator(Arc::clone(&rest), 10).stream(None).collect().await;

    assert!(messages.is_empty());
    assert_eq!(rest.page_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn resumes_after_cursor() {
    let rest = Arc::new(MockRest::new());
    seed_regular(&rest, 10);

    let messages: Vec<_> = paginator(Arc::clone(&rest), 10)
        .stream(Some(MessageId::new(7)))
        .map(|item| item.unwrap())
        .collect()
        .await;

    let ids: Vec<u64> = messages.iter().map(|m| m.id.get()).collect();
    assert_eq!(ids, vec![8, 9, 10]);
}

#[tokio::test]
async fn abandoned_stream_fetches_no_further_pages() {
    let rest = Arc::new(MockRest::new());
    seed_regular(&rest, 100);

    let stream = paginator(Arc::clone(&rest), 10).stream(None);
    let first_five: Vec<_> = stream.take(5).collect().await;

    assert_eq!(first_five.len(), 5);
    // Only the page backing the consumed items was fetched.
    assert_eq!(rest.page_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn fetch_failure_ends_the_stream_with_an_error() {
    let rest = Arc::new(MockRest::new());
    rest.fail.store(true, Ordering::SeqCst);

    let mut stream = std::pin::pin!(paginator(Arc::clone(&rest), 10).stream(None));
    let first = stream.next().await.unwrap();
    assert!(first.is_err());
    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn regular_messages_drops_system_noise() {
    let rest = Arc::new(MockRest::new());
    rest.insert_messages(
        CHANNEL,
        vec![
            common::message(100, 1, MessageKind::Regular),
            common::message(100, 2, MessageKind::System),
            common::message(100, 3, MessageKind::Reply),
            common::message(100, 4, MessageKind::System),
        ],
    );

    let mut ids: Vec<u64> = paginator(Arc::clone(&rest), 10)
        .regular_messages(None)
        .map(|item| item.unwrap().id.get())
        .collect()
        .await;
    ids.sort_unstable();

    assert_eq!(ids, vec![1, 3]);
}

#[tokio::test]
async fn thread_starter_dereferences_to_referenced_message() {
    let rest = Arc::new(MockRest::new());
    let mut starter = common::message(100, 5, MessageKind::ThreadStarter);
    starter.thread_starter = Some(MessageId::new(2));
    rest.insert_messages(
        CHANNEL,
        vec![common::message(100, 2, MessageKind::Regular), starter],
    );

    let mut ids: Vec<u64> = paginator(Arc::clone(&rest), 10)
        .regular_messages(None)
        .map(|item| item.unwrap().id.get())
        .collect()
        .await;
    ids.sort_unstable();

    // The placeholder resolved to message 2, which also streamed directly.
    assert_eq!(ids, vec![2, 2]);
}

#[tokio::test]
async fn dangling_thread_starter_is_dropped() {
    let rest = Arc::new(MockRest::new());
    let mut starter = common::message(100, 5, MessageKind::ThreadStarter);
    starter.thread_starter = Some(MessageId::new(999));
    rest.insert_messages(CHANNEL, vec![starter]);

    let messages: Vec<_> = paginator(Arc::clone(&rest), 10)
        .regular_messages(None)
        .collect()
        .await;

    assert!(messages.is_empty());
}
