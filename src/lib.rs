//! scanport drives a TWAIN-style imaging device through its multi-stage
//! session protocol and funnels captured raster frames into the
//! application.
//!
//! The session state machine ([`session::Session`]) owns the protocol
//! state and gates every lifecycle operation on it: open the manager, pick
//! and open a device, negotiate the transfer count, enable the device's
//! capture UI, transfer images, tear down. The device signals readiness
//! and completion through messages interleaved with ordinary input, so the
//! host's event loop offers every raw event to
//! [`Session::classify_event`](session::Session::classify_event) before
//! normal dispatch; a `TransferReady` classification triggers
//! [`transfer::drain`], which hands each captured frame to a
//! [`transfer::FrameSink`].
//!
//! Protocol backends implement [`port::DevicePort`]. Every protocol call
//! runs inside an [`env::EnvGuard`] that shields the device module from
//! the host's UI styling context and display scaling mode.

pub mod config;
pub mod env;
pub mod events;
pub mod frame;
pub mod port;
pub mod session;
pub mod sink;
pub mod transfer;

#[cfg(test)]
pub(crate) mod testutil;

pub use config::CaptureConfig;
pub use env::{CallEnv, EnvGuard, NoopEnv, ScalingAwareness};
pub use events::Classified;
pub use frame::RasterFrame;
pub use port::{DevicePort, Notification, PortError, TransferCount};
pub use session::{DeviceIdentity, ManagerIdentity, Session, SessionError, SessionState};
pub use sink::{FileFormat, FileSink};
pub use transfer::{FrameSink, TransferFailed, drain};
