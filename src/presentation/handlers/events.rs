use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;

use crate::application::services::{JobRegistry, SubscriberId};
use crate::presentation::state::AppState;

/// Unregisters the subscriber when the client goes away and the stream is
/// dropped.
struct SubscriptionGuard {
    registry: Arc<JobRegistry>,
    id: SubscriberId,
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        self.registry.unsubscribe(self.id);
        tracing::debug!("Event subscriber disconnected");
    }
}

/// Pushes job snapshots as they change. Delivery is best effort: a slow
/// client misses events and should re-read `GET /jobs`.
pub async fn job_events_handler(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let subscription = state.registry.subscribe();
    let guard = SubscriptionGuard {
        registry: Arc::clone(&state.registry),
        id: subscription.id,
    };
    let mut receiver = subscription.receiver;

    let stream = async_stream::stream! {
        let _guard = guard;
        while let Some(snapshot) = receiver.recv().await {
            yield Ok::<_, Infallible>(Event::default().event("job").data(snapshot));
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}
