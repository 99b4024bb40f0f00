//! Cross-context relay: the coordinator that owns the monitoring lifecycle,
//! the message shapes of the relay protocol, and the persisted status blob.
//!
//! Contexts never share memory — the detection surface and every
//! presentation surface talk to the [`Coordinator`] exclusively through
//! message passing ([`RelayHandle`] in, [`SurfaceUpdate`] out).

pub mod coordinator;
pub mod message;
pub mod status;

pub use coordinator::{
    ChannelSubscriber, ContextHost, ContextId, Coordinator, DeliveryError, RelayError, Subscriber,
};
pub use message::{Ack, Envelope, RelayHandle, RelayRequest, SurfaceUpdate};
pub use status::{MonitorStatus, StatusStore};
