//! Event streaming for game observers
//!
//! Every state change in a game is published as a [`GameEvent`] on an
//! [`EventBus`]. Observers subscribe independently and each get their own
//! unbounded queue.
//!
//! # Event Flow
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌──────────────┐
//! │  GameRunner  │────▶│  Event Bus   │────▶│  Subscribers │
//! │  (publish)   │     │  (fan-out)   │     │   (recv)     │
//! └──────────────┘     └──────┬───────┘     └──────────────┘
//!                             │
//!                             ▼
//!                      ┌──────────────┐
//!                      │   EventLog   │
//!                      │  (optional)  │
//!                      └──────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use arena_coordination::events::{EventBus, GameEvent};
//!
//! let bus = EventBus::new().shared();
//! let mut subscription = bus.subscribe();
//!
//! bus.publish(GameEvent::ScoreUpdate { good_wins: 1, evil_wins: 0 });
//!
//! let envelope = subscription.recv().await.unwrap();
//! println!("{}", envelope.to_json());
//! ```

pub mod bus;
pub mod history;
pub mod types;

pub use bus::{
    EventBus, EventBusError, EventBusResult, EventFilter, EventSubscription, FilteredSubscription,
    SharedEventBus, SubscriberId,
};
pub use history::EventLog;
pub use types::{EventEnvelope, GameEvent, PauseReason, PlayerInfo, ThinkingAction};
