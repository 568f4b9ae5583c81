//! Cursor-driven lazy streaming of channel messages.

use crate::models::{ChannelId, Message, MessageId, MessageKind};
use crate::rest::RestApi;
use async_stream::try_stream;
use futures::{Stream, StreamExt};
use std::sync::Arc;
use vermeer_error::VermeerResult;
use vermeer_rate_limit::RateLimiter;

/// Default page size, the largest the remote allows per request.
const DEFAULT_PAGE_SIZE: u8 = 100;

/// Lazy, forward-only pagination over a channel's messages.
///
/// Each page fetch acquires a rate-limit permit first. The produced stream
/// is pull-based and not restartable: if the consumer stops polling, no
/// further pages are fetched, and a fresh traversal needs a fresh
/// paginator.
#[derive(Clone)]
pub struct MessagePaginator {
    rest: Arc<dyn RestApi>,
    limiter: RateLimiter,
    channel: ChannelId,
    page_size: u8,
}

impl MessagePaginator {
    /// Create a paginator over one channel.
    pub fn new(rest: Arc<dyn RestApi>, limiter: RateLimiter, channel: ChannelId) -> Self {
        Self {
            rest,
            limiter,
            channel,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Override the page size (clamped to at least 1).
    pub fn with_page_size(mut self, page_size: u8) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Stream every message with an ID greater than `after`, in ascending
    /// ID order.
    ///
    /// Pages are fetched strictly in cursor order; the stream terminates
    /// when the remote returns an empty or short page. Infinite in
    /// principle, bounded in practice by the channel's history.
    pub fn stream(
        self,
        after: Option<MessageId>,
    ) -> impl Stream<Item = VermeerResult<Message>> + Send + 'static {
        try_stream! {
            let mut cursor = after;
            loop {
                let _permit = self.limiter.acquire(1).await?;
                let page = self
                    .rest
                    .fetch_messages(self.channel, cursor, self.page_size)
                    .await?;

                let count = page.len();
                if count == 0 {
                    break;
                }
                cursor = page.last().map(|m| m.id);
                tracing::trace!(channel = %self.channel, count, cursor = ?cursor, "Fetched page");

                for message in page {
                    yield message;
                }
                if count < self.page_size as usize {
                    break;
                }
            }
        }
    }

    /// Stream only user-authored content: system messages are dropped and
    /// thread-starter placeholders are dereferenced to the message that
    /// started the thread.
    ///
    /// The per-item dereference stage runs with unbounded concurrency, so
    /// items may arrive out of page order; within-page ordering is not
    /// required downstream.
    pub fn regular_messages(
        self,
        after: Option<MessageId>,
    ) -> impl Stream<Item = VermeerResult<Message>> + Send + 'static {
        let rest = Arc::clone(&self.rest);
        let limiter = self.limiter.clone();
        let channel = self.channel;

        self.stream(after)
            .map(move |item| {
                let rest = Arc::clone(&rest);
                let limiter = limiter.clone();
                async move {
                    match item {
                        Ok(message) if message.kind == MessageKind::ThreadStarter => {
                            dereference_starter(&*rest, &limiter, channel, &message).await
                        }
                        Ok(message) if message.is_regular() => Ok(Some(message)),
                        Ok(_) => Ok(None),
                        Err(e) => Err(e),
                    }
                }
            })
            .buffer_unordered(usize::MAX)
            .filter_map(|item| async move { item.transpose() })
    }
}

/// Resolve a thread-starter placeholder to its referenced message. A
/// dangling or missing reference degrades to `None` rather than failing
/// the stream.
async fn dereference_starter(
    rest: &dyn RestApi,
    limiter: &RateLimiter,
    channel: ChannelId,
    message: &Message,
) -> VermeerResult<Option<Message>> {
    let Some(starter) = message.thread_starter else {
        return Ok(None);
    };
    let _permit = limiter.acquire(1).await?;
    match rest.fetch_message(channel, starter).await {
        Ok(found) => Ok(found),
        Err(e) => {
            tracing::debug!(starter = %starter, error = %e, "Thread starter lookup failed");
            Ok(None)
        }
    }
}
