//! Streaming chat response.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;

use super::ChatEvent;

/// Events of one conversation turn.
///
/// The turn runs on its own task. Dropping the stream aborts that task,
/// cancelling any model or tool call still in flight.
pub struct ChatStream {
    events: ReceiverStream<ChatEvent>,
    task: JoinHandle<()>,
}

impl ChatStream {
    pub(crate) fn new(events: mpsc::Receiver<ChatEvent>, task: JoinHandle<()>) -> Self {
        Self {
            events: ReceiverStream::new(events),
            task,
        }
    }
}

impl Stream for ChatStream {
    type Item = ChatEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.events).poll_next(cx)
    }
}

impl Drop for ChatStream {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl std::fmt::Debug for ChatStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatStream")
            .field("finished", &self.task.is_finished())
            .finish_non_exhaustive()
    }
}
