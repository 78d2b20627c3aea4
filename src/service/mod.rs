//! Service layer: the realtime hub that route handlers notify.

pub mod hub;

pub use hub::RealtimeHub;
