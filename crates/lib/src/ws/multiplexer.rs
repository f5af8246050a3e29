//! Single-socket subscription multiplexer.
//!
//! The outer [`SubscriptionMultiplexer`] owns connection state and subscriptions. The socket
//! itself is driven by two tasks: a writer draining an outbound queue (so subscribe/unsubscribe
//! return immediately) and a reader feeding every inbound frame to the [`Router`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde::de::DeserializeOwned;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::ws::event::PushEvent;
use crate::ws::protocol::{Channel, PushMessage, SubscriptionKey};
use crate::ws::registry::{lock, Subscription};
use crate::ws::router::Router;

/// How long a closing link may take to flush its close frame.
const CLOSE_GRACE: Duration = Duration::from_secs(1);

/// Lifecycle of the push connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Live socket: outbound queue plus the tasks driving it.
struct Link {
    generation: u64,
    outbound: mpsc::UnboundedSender<Message>,
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
}

impl Link {
    /// Send a close frame, let the writer flush it, then stop reading.
    async fn close(mut self, grace: Duration) {
        let _ = self.outbound.send(Message::Close(None));
        drop(self.outbound);
        if tokio::time::timeout(grace, &mut self.writer).await.is_err() {
            log::debug!("websocket writer did not finish within {:?}", grace);
            self.writer.abort();
        }
        self.reader.abort();
    }
}

struct Slot {
    state: ConnectionState,
    link: Option<Link>,
}

/// Owns at most one push connection and routes its frames to registered callbacks.
pub struct SubscriptionMultiplexer {
    ws_url: String,
    ack_timeout: Duration,
    router: Arc<Router>,
    slot: Arc<Mutex<Slot>>,
    generation: AtomicU64,
}

impl SubscriptionMultiplexer {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        Ok(Self::with_url(
            config.ws_url()?,
            Duration::from_millis(config.timeout_ms),
        ))
    }

    /// Multiplexer for an explicit `ws://` / `wss://` address.
    pub fn with_url(ws_url: impl Into<String>, ack_timeout: Duration) -> Self {
        Self {
            ws_url: ws_url.into(),
            ack_timeout,
            router: Arc::new(Router::new()),
            slot: Arc::new(Mutex::new(Slot {
                state: ConnectionState::Disconnected,
                link: None,
            })),
            generation: AtomicU64::new(0),
        }
    }

    pub fn ws_url(&self) -> &str {
        &self.ws_url
    }

    pub fn state(&self) -> ConnectionState {
        lock(&self.slot).state
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    pub fn subscription_count(&self) -> usize {
        self.router.registry().len()
    }

    pub fn has_subscription(&self, channel: impl AsRef<str>, address: Option<&str>) -> bool {
        self.router
            .registry()
            .contains(&SubscriptionKey::new(channel.as_ref(), address))
    }

    /// Open the socket. Resolves once the handshake completes; a no-op when already connected.
    ///
    /// Subscriptions still tracked from a connection the server dropped are re-sent.
    pub async fn connect(&self) -> Result<(), ClientError> {
        {
            let mut slot = lock(&self.slot);
            match slot.state {
                ConnectionState::Connected => {
                    log::debug!("already connected to {}", self.ws_url);
                    return Ok(());
                }
                ConnectionState::Connecting => return Err(ClientError::AlreadyConnecting),
                ConnectionState::Disconnected => slot.state = ConnectionState::Connecting,
            }
        }
        self.establish().await
    }

    /// Drop the current socket (if any) without forgetting subscriptions, connect again and
    /// re-send one subscribe frame per tracked key.
    pub async fn reconnect(&self) -> Result<(), ClientError> {
        let old = {
            let mut slot = lock(&self.slot);
            if slot.state == ConnectionState::Connecting {
                return Err(ClientError::AlreadyConnecting);
            }
            slot.state = ConnectionState::Connecting;
            slot.link.take()
        };
        self.router.fail_pending();
        if let Some(link) = old {
            link.close(CLOSE_GRACE).await;
        }
        self.establish().await
    }

    /// Close the socket and forget every subscription.
    pub async fn disconnect(&self) {
        let link = {
            let mut slot = lock(&self.slot);
            slot.state = ConnectionState::Disconnected;
            self.router.registry().clear();
            slot.link.take()
        };
        self.router.fail_pending();
        if let Some(link) = link {
            link.close(CLOSE_GRACE).await;
            log::info!("disconnected from {}", self.ws_url);
        }
    }

    /// Subscribe `callback` to `channel` (optionally one address). Replaces any callback under
    /// the same key. The frame is sent without waiting for the server's acknowledgment.
    pub fn subscribe<F>(
        &self,
        channel: impl AsRef<str>,
        address: Option<&str>,
        callback: F,
    ) -> Result<(), ClientError>
    where
        F: Fn(serde_json::Value) + Send + Sync + 'static,
    {
        let channel = channel.as_ref();
        self.register_and_send(
            Subscription::new(channel, address, Arc::new(callback)),
            PushMessage::subscribe(channel, address),
        )
    }

    /// Like [`subscribe`](Self::subscribe), with payloads decoded into [`PushEvent`].
    pub fn subscribe_events<F>(
        &self,
        channel: impl AsRef<str>,
        address: Option<&str>,
        callback: F,
    ) -> Result<(), ClientError>
    where
        F: Fn(PushEvent) + Send + Sync + 'static,
    {
        let kind = Channel::from(channel.as_ref());
        self.subscribe(channel, address, event_callback(kind, callback))
    }

    /// Like [`subscribe`](Self::subscribe), with payloads decoded into `T`. Payloads that do not
    /// decode are logged and skipped.
    pub fn subscribe_typed<T, F>(
        &self,
        channel: impl AsRef<str>,
        address: Option<&str>,
        callback: F,
    ) -> Result<(), ClientError>
    where
        T: DeserializeOwned + 'static,
        F: Fn(T) + Send + Sync + 'static,
    {
        let name = channel.as_ref().to_string();
        self.subscribe(channel, address, typed_callback(name, callback))
    }

    /// Subscribe and wait for the server to acknowledge. Resolves with the ack's `result`.
    /// A rejected subscription is removed again.
    pub async fn subscribe_acked<F>(
        &self,
        channel: impl AsRef<str>,
        address: Option<&str>,
        callback: F,
    ) -> Result<serde_json::Value, ClientError>
    where
        F: Fn(serde_json::Value) + Send + Sync + 'static,
    {
        let channel = channel.as_ref();
        let id = uuid::Uuid::new_v4().to_string();
        let ack = self.router.expect_ack(&id);
        let subscription = Subscription::new(channel, address, Arc::new(callback));
        let callback = subscription.callback().clone();
        if let Err(e) = self.register_and_send(
            subscription,
            PushMessage::subscribe(channel, address).with_id(id.clone()),
        ) {
            self.router.cancel_ack(&id);
            return Err(e);
        }
        let outcome = self.await_ack(&id, ack).await;
        if let Err(ClientError::Subscription(_)) = outcome {
            let key = SubscriptionKey::new(channel, address);
            if !self.router.registry().remove_if_same(&key, &callback) {
                log::debug!("rejected subscription {} was already replaced", key);
            }
        }
        outcome
    }

    /// Remove the subscription for `channel` (and address) and tell the server. Removing an
    /// unknown key still sends the frame. When not connected nothing is sent, but a key kept from a
    /// dropped connection is forgotten so the next connect does not restore it.
    pub fn unsubscribe(&self, channel: impl AsRef<str>, address: Option<&str>) {
        let channel = channel.as_ref();
        let slot = lock(&self.slot);
        self.router
            .registry()
            .remove(&SubscriptionKey::new(channel, address));
        let Some(link) = live_link(&slot) else {
            log::debug!("unsubscribe {} not sent: not connected", channel);
            return;
        };
        if let Err(e) = send_frame(link, &PushMessage::unsubscribe(channel, address)) {
            log::warn!("unsubscribe {} not sent: {}", channel, e);
        }
    }

    /// Unsubscribe and wait for the server to acknowledge.
    pub async fn unsubscribe_acked(
        &self,
        channel: impl AsRef<str>,
        address: Option<&str>,
    ) -> Result<serde_json::Value, ClientError> {
        let channel = channel.as_ref();
        let id = uuid::Uuid::new_v4().to_string();
        let ack = self.router.expect_ack(&id);
        let sent = {
            let slot = lock(&self.slot);
            self.router
                .registry()
                .remove(&SubscriptionKey::new(channel, address));
            match live_link(&slot) {
                Some(link) => {
                    send_frame(link, &PushMessage::unsubscribe(channel, address).with_id(id.clone()))
                }
                None => Err(ClientError::NotConnected),
            }
        };
        if let Err(e) = sent {
            self.router.cancel_ack(&id);
            return Err(e);
        }
        self.await_ack(&id, ack).await
    }

    fn register_and_send(
        &self,
        subscription: Subscription,
        frame: PushMessage,
    ) -> Result<(), ClientError> {
        let slot = lock(&self.slot);
        let link = live_link(&slot).ok_or(ClientError::NotConnected)?;
        let key = subscription.key();
        if self.router.registry().insert(subscription) {
            log::debug!("replaced subscription {}", key);
        }
        send_frame(link, &frame)
    }

    async fn await_ack(
        &self,
        id: &str,
        ack: oneshot::Receiver<Result<serde_json::Value, ClientError>>,
    ) -> Result<serde_json::Value, ClientError> {
        match tokio::time::timeout(self.ack_timeout, ack).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(_)) => Err(ClientError::NotConnected),
            Err(_) => {
                self.router.cancel_ack(id);
                Err(ClientError::AckTimeout)
            }
        }
    }

    /// Handshake, spawn the I/O tasks and move Connecting → Connected. Caller has already set
    /// the state to Connecting.
    async fn establish(&self) -> Result<(), ClientError> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let stream = match tokio_tungstenite::connect_async(self.ws_url.as_str()).await {
            Ok((stream, _)) => stream,
            Err(e) => {
                log::error!("WebSocket error: {}", e);
                lock(&self.slot).state = ConnectionState::Disconnected;
                return Err(e.into());
            }
        };
        let (mut sink, mut source) = stream.split();

        let (outbound, mut queue) = mpsc::unbounded_channel::<Message>();
        let writer = tokio::spawn(async move {
            while let Some(msg) = queue.recv().await {
                let closing = matches!(msg, Message::Close(_));
                if let Err(e) = sink.send(msg).await {
                    log::warn!("websocket send failed: {}", e);
                    break;
                }
                if closing {
                    break;
                }
            }
        });

        let router = self.router.clone();
        let slot = self.slot.clone();
        let url = self.ws_url.clone();
        let reader = tokio::spawn(async move {
            while let Some(msg) = source.next().await {
                match msg {
                    Ok(Message::Text(text)) => {
                        router.handle_text(&text);
                    }
                    Ok(Message::Binary(bytes)) => match std::str::from_utf8(&bytes) {
                        Ok(text) => {
                            router.handle_text(text);
                        }
                        Err(_) => log::warn!("dropping non-UTF-8 binary frame"),
                    },
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(e) => {
                        log::error!("WebSocket error: {}", e);
                        break;
                    }
                }
            }
            log::info!("disconnected from {}", url);
            let mut slot = lock(&slot);
            if slot.link.as_ref().map(|l| l.generation) == Some(generation) {
                slot.state = ConnectionState::Disconnected;
                slot.link = None;
                router.fail_pending();
            }
        });

        let link = Link {
            generation,
            outbound,
            reader,
            writer,
        };

        let abandoned = {
            let mut slot = lock(&self.slot);
            if slot.state != ConnectionState::Connecting {
                // disconnect() ran during the handshake
                Some(link)
            } else {
                for (channel, address) in self.router.registry().targets() {
                    let frame = PushMessage::subscribe(&channel, address.as_deref());
                    if let Err(e) = send_frame(&link, &frame) {
                        log::warn!("re-subscribe {} failed: {}", channel, e);
                    }
                }
                slot.state = ConnectionState::Connected;
                slot.link = Some(link);
                None
            }
        };
        if let Some(link) = abandoned {
            link.close(CLOSE_GRACE).await;
            return Err(ClientError::NotConnected);
        }
        log::info!("connected to {}", self.ws_url);
        Ok(())
    }
}

impl Drop for SubscriptionMultiplexer {
    fn drop(&mut self) {
        if let Some(link) = lock(&self.slot).link.take() {
            let _ = link.outbound.send(Message::Close(None));
            link.reader.abort();
        }
    }
}

fn event_callback<F>(kind: Channel, callback: F) -> impl Fn(serde_json::Value) + Send + Sync + 'static
where
    F: Fn(PushEvent) + Send + Sync + 'static,
{
    move |payload| callback(PushEvent::decode(&kind, payload))
}

fn typed_callback<T, F>(name: String, callback: F) -> impl Fn(serde_json::Value) + Send + Sync + 'static
where
    T: DeserializeOwned + 'static,
    F: Fn(T) + Send + Sync + 'static,
{
    move |payload| match serde_json::from_value::<T>(payload) {
        Ok(value) => callback(value),
        Err(e) => log::warn!("dropping {} payload that failed to decode: {}", name, e),
    }
}

fn live_link(slot: &Slot) -> Option<&Link> {
    match slot.state {
        ConnectionState::Connected => slot.link.as_ref(),
        _ => None,
    }
}

fn send_frame(link: &Link, frame: &PushMessage) -> Result<(), ClientError> {
    let text = serde_json::to_string(frame)?;
    link.outbound
        .send(Message::Text(text))
        .map_err(|_| ClientError::NotConnected)
}
