//! Live-update channel: one WebSocket, many subscriptions.
//!
//! Protocol: the client sends `subscribe` / `unsubscribe` frames naming a channel and an
//! optional address; the server pushes data frames echoing them in `params`, which are routed
//! to the callback registered under the matching [`SubscriptionKey`].

mod event;
mod multiplexer;
mod protocol;
mod registry;
mod router;

pub use event::{AccountUpdate, PushEvent};
pub use multiplexer::{ConnectionState, SubscriptionMultiplexer};
pub use protocol::{Channel, PushMessage, SubscriptionKey};
pub use registry::{Callback, Subscription, SubscriptionRegistry};
pub use router::{Routed, Router};
