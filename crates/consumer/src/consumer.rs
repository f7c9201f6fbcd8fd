use std::time::Duration;

use tokio::sync::watch;
use tracing::Instrument;
use uuid::Uuid;

use messaging::{Envelope, Message};
use storage::{ConversationStore, HistoryStore, InteractionStore};

use crate::error::ConsumerError;
use crate::router::MessageRouter;
use crate::trace::extract_trace_id;
use crate::transport::{MessageSink, MessageSource, RawMessage, TransportError};

/// Default pause between fetch attempts after a transport error.
pub const DEFAULT_FETCH_BACKOFF: Duration = Duration::from_secs(1);

/// The fetch/handle/publish/commit loop over one inbound topic.
///
/// Every fetched message is resolved to exactly one outbound envelope and one
/// commit. Handler failures become error envelopes, undecodable payloads are
/// answered and committed rather than redelivered forever, and only fetch
/// errors trigger backoff.
pub struct Consumer<S, P, I, C, H>
where
    S: MessageSource,
    P: MessageSink,
    I: InteractionStore,
    C: ConversationStore,
    H: HistoryStore,
{
    source: S,
    sink: P,
    router: MessageRouter<I, C, H>,
    fetch_backoff: Duration,
}

impl<S, P, I, C, H> Consumer<S, P, I, C, H>
where
    S: MessageSource,
    P: MessageSink,
    I: InteractionStore,
    C: ConversationStore,
    H: HistoryStore,
{
    pub fn new(source: S, sink: P, router: MessageRouter<I, C, H>) -> Self {
        Self {
            source,
            sink,
            router,
            fetch_backoff: DEFAULT_FETCH_BACKOFF,
        }
    }

    pub fn with_fetch_backoff(mut self, backoff: Duration) -> Self {
        self.fetch_backoff = backoff;
        self
    }

    /// Runs the consume loop until the shutdown signal flips to `true` or the
    /// source closes. The reader is torn down on the way out.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!("consumer loop started");
        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        tracing::info!("shutdown requested, stopping consumer");
                        break;
                    }
                }
                fetched = self.source.fetch() => {
                    match fetched {
                        Ok(raw) => self.process(&raw).await,
                        Err(TransportError::Closed) => {
                            tracing::info!("message source closed, stopping consumer");
                            break;
                        }
                        Err(err) => {
                            metrics::counter!("consumer_fetch_errors").increment(1);
                            tracing::warn!(error = %err, "fetch failed, backing off");
                            tokio::time::sleep(self.fetch_backoff).await;
                        }
                    }
                }
            }
        }
        self.source.close().await;
    }

    /// Processes one raw message through to publish and commit.
    async fn process(&self, raw: &RawMessage) {
        let trace_id = extract_trace_id(&raw.headers);
        let span = tracing::info_span!(
            "message.process",
            topic = %raw.topic,
            partition = raw.partition,
            offset = raw.offset,
            trace_id = trace_id.as_deref().unwrap_or(""),
        );
        self.process_inner(raw).instrument(span).await;
    }

    async fn process_inner(&self, raw: &RawMessage) {
        metrics::counter!("consumer_messages_received").increment(1);

        let reply = match Envelope::from_json(&raw.payload) {
            Ok(envelope) => {
                tracing::debug!(
                    envelope_id = %envelope.id,
                    correlation_id = %envelope.correlation_id,
                    event_name = %envelope.event_name,
                    "envelope decoded"
                );
                self.router.handle(&envelope).await
            }
            Err(err) => {
                // Undecodable payloads can never succeed on redelivery.
                // Answer with a fatal error envelope and commit past them.
                metrics::counter!("consumer_poison_messages").increment(1);
                tracing::error!(error = %err, "payload is not a valid envelope, skipping");
                Envelope::builder(Message::default())
                    .build()
                    .error_reply("malformed-envelope", true)
            }
        };

        if let Err(err) = self.publish(&reply).await {
            metrics::counter!("consumer_publish_errors").increment(1);
            tracing::error!(
                error = %err,
                correlation_id = %reply.correlation_id,
                "failed to publish reply"
            );
        }

        // The offset is committed even when the publish failed; replaying the
        // message would re-run a handler that already took effect.
        if let Err(err) = self.source.commit(raw).await {
            metrics::counter!("consumer_commit_errors").increment(1);
            tracing::error!(error = %err, offset = raw.offset, "failed to commit offset");
        } else {
            metrics::counter!("consumer_messages_committed").increment(1);
        }
    }

    async fn publish(&self, envelope: &Envelope) -> Result<(), ConsumerError> {
        let payload = envelope.to_json()?;
        let key = Uuid::new_v4().to_string().into_bytes();
        self.sink.publish(key, payload).await?;
        Ok(())
    }
}
