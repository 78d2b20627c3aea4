//! Client side of the hub: a reconnecting subscriber that republishes
//! received envelopes on a local [`crate::domain::EventBus`].

pub mod dispatch;
pub mod error;
pub mod state;
pub mod subscriber;

pub use dispatch::{Notification, Notifier, TracingNotifier, decode_frame, dispatch_frame, side_effect};
pub use error::ClientError;
pub use state::{ConnectionState, LinkEvent, ReconnectPolicy, StateMachine, Transition};
pub use subscriber::{Subscriber, SubscriberHandle};
