//! WebSocket event channel.
//!
//! Clients subscribe to topics with `{"type":"subscribe","topic":"sessions"}`
//! and receive every event published on them afterwards as JSON text frames.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use hotspot_auth::Permission;
use hotspot_realtime::{ClientMessage, Event, EventBroadcaster, EventPayload, Topic};
use hotspot_service::RequestContext;

use crate::error::ApiError;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// GET /api/v1/ws?token={jwt}
pub async fn ws_upgrade(
    State(state): State<AppState>,
    auth: AuthUser,
    ws: WebSocketUpgrade,
) -> Result<Response, ApiError> {
    state
        .rbac
        .require_permission(&auth.role, &Permission::SessionView)?;
    Ok(ws.on_upgrade(move |socket| handle_socket(state, auth.0, socket)))
}

async fn handle_socket(state: AppState, ctx: RequestContext, socket: WebSocket) {
    let metrics = Arc::clone(state.broadcaster.metrics());
    metrics.connection_opened();
    info!(operator = %ctx.operator_id, "WebSocket connection established");

    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::channel::<Message>(state.config.realtime.channel_buffer_size.max(1));
    let ping_every = Duration::from_secs(state.config.realtime.ping_interval_seconds.max(1));

    let writer = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(ping_every);
        ticker.tick().await;
        loop {
            tokio::select! {
                message = rx.recv() => {
                    let Some(message) = message else { break };
                    if sink.send(message).await.is_err() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    if sink.send(Message::Ping(Default::default())).await.is_err() {
                        break;
                    }
                }
            }
        }
    });

    let mut channel = ClientChannel::new(Arc::clone(&state.broadcaster), tx.clone());
    while let Some(frame) = stream.next().await {
        let text = match frame {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                debug!(operator = %ctx.operator_id, error = %e, "WebSocket read failed");
                break;
            }
        };
        if !channel.handle(text.as_str()).await {
            break;
        }
    }

    channel.close();
    drop(tx);
    writer.abort();
    metrics.connection_closed();
    info!(operator = %ctx.operator_id, "WebSocket connection closed");
}

async fn send_event(tx: &mpsc::Sender<Message>, event: &Event) -> bool {
    match event.to_json() {
        Ok(json) => tx.send(Message::Text(json.into())).await.is_ok(),
        Err(e) => {
            warn!(error = %e, "Failed to serialize event");
            true
        }
    }
}

/// Topic subscriptions of one connection.
///
/// Each subscribed topic has a forwarder task that copies events into the
/// connection's outbound queue; a full queue makes the forwarder lag, and
/// a lagging forwarder loses the oldest events of its topic.
struct ClientChannel {
    broadcaster: Arc<EventBroadcaster>,
    outbound: mpsc::Sender<Message>,
    forwarders: HashMap<Topic, JoinHandle<()>>,
}

impl ClientChannel {
    fn new(broadcaster: Arc<EventBroadcaster>, outbound: mpsc::Sender<Message>) -> Self {
        Self {
            broadcaster,
            outbound,
            forwarders: HashMap::new(),
        }
    }

    /// Apply one client message and queue the reply.
    ///
    /// Returns `false` once the connection's outbound queue is closed.
    async fn handle(&mut self, raw: &str) -> bool {
        let message = match serde_json::from_str::<ClientMessage>(raw) {
            Ok(message) => message,
            Err(e) => {
                return self
                    .reply(Event::direct(EventPayload::Error {
                        message: format!("Invalid message: {e}"),
                    }))
                    .await;
            }
        };

        match message {
            ClientMessage::Ping => self.reply(Event::direct(EventPayload::Pong)).await,
            ClientMessage::Subscribe { topic } => match topic.parse::<Topic>() {
                Ok(topic) => self.subscribe(topic).await,
                Err(message) => self.reply(Event::direct(EventPayload::Error { message })).await,
            },
            ClientMessage::Unsubscribe { topic } => match topic.parse::<Topic>() {
                Ok(topic) => {
                    if let Some(forwarder) = self.forwarders.remove(&topic) {
                        forwarder.abort();
                    }
                    self.reply(Event::new(
                        topic,
                        EventPayload::Unsubscribed {
                            message: format!("Unsubscribed from {topic}"),
                        },
                    ))
                    .await
                }
                Err(message) => self.reply(Event::direct(EventPayload::Error { message })).await,
            },
        }
    }

    async fn reply(&self, event: Event) -> bool {
        send_event(&self.outbound, &event).await
    }

    /// The `subscribed` reply is queued before the forwarder starts, so it
    /// precedes every event of the topic on the wire.
    async fn subscribe(&mut self, topic: Topic) -> bool {
        let ack = Event::new(
            topic,
            EventPayload::Subscribed {
                message: format!("Subscribed to {topic}"),
            },
        );
        if self.forwarders.contains_key(&topic) {
            return self.reply(ack).await;
        }

        let mut subscription = self.broadcaster.subscribe(topic);
        if !self.reply(ack).await {
            return false;
        }
        let outbound = self.outbound.clone();
        let forwarder = tokio::spawn(async move {
            while let Some(event) = subscription.recv().await {
                if !send_event(&outbound, &event).await {
                    break;
                }
            }
        });
        self.forwarders.insert(topic, forwarder);
        true
    }

    #[cfg(test)]
    fn subscribed(&self) -> impl Iterator<Item = &Topic> {
        self.forwarders.keys()
    }

    fn close(&mut self) {
        for (_, forwarder) in self.forwarders.drain() {
            forwarder.abort();
        }
    }
}
