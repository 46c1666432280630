//! Event bus adapter: relayer completions as a correlator source.

use futures::future;
use futures::stream::{BoxStream, StreamExt};
use shared_bus::{EventFilter, EventSource, EventSubscriber, EventTopic, IvsEvent};
use shared_types::ipc::DecryptionCompleted;

/// Subscribe to relayer completions on `bus`.
///
/// Only notifications published after this call are observed, so subscribe
/// before submitting any request.
pub fn completion_stream<B>(bus: &B) -> BoxStream<'static, DecryptionCompleted>
where
    B: EventSubscriber + ?Sized,
{
    let filter = EventFilter {
        topics: vec![EventTopic::Decryption],
        sources: vec![EventSource::Relayer],
    };

    bus.subscribe(filter)
        .into_stream()
        .filter_map(|event| {
            future::ready(match event {
                IvsEvent::DecryptionCompleted(record) => Some(record),
                _ => None,
            })
        })
        .boxed()
}
