//! Raw protocol boundary
//!
//! `DevicePort` is the single seam between the session state machine and a
//! concrete device protocol backend. Backends return opaque protocol codes
//! (`PortError`); the session layer maps them to its own error kinds and
//! never leaks them to callers.

use std::fmt;

use crate::frame::RasterFrame;
use crate::session::{DeviceIdentity, ManagerIdentity};

/// Opaque return code reported by the protocol layer for a failed call.
///
/// Carried for logging only; callers above the session layer never see it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortError(pub u16);

impl fmt::Display for PortError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "protocol return code {}", self.0)
    }
}

impl std::error::Error for PortError {}

pub type PortResult<T> = Result<T, PortError>;

/// Notification kinds a device can post through the shared event stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notification {
    /// The device has at least one image ready for transfer.
    TransferReady,
    /// The device asks the application to close it.
    CloseRequested,
    /// The event belonged to the device but carried no actionable message.
    Null,
    /// Any other device message, with its raw code.
    Other(u16),
}

/// Number of images to negotiate for one enable/transfer cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferCount {
    /// Transfer everything the device can produce.
    All,
    Exactly(u16),
}

/// One device protocol backend.
///
/// Every method corresponds to one protocol request. Implementations must
/// not track session state; legal-state gating is entirely the session's
/// job. Calls may block and may pump nested device UI before returning.
pub trait DevicePort {
    /// Raw event type flowing through the host's input loop.
    type Event;

    fn open_manager(&mut self, app: &ManagerIdentity) -> PortResult<()>;

    fn close_manager(&mut self);

    /// Ask the protocol layer to let the user pick a device. The protocol
    /// layer may show its own native picker. An error means failure or
    /// cancellation; the two are not distinguished on the wire.
    fn user_select(&mut self) -> PortResult<DeviceIdentity>;

    fn open_device(&mut self, device: &DeviceIdentity) -> PortResult<()>;

    fn close_device(&mut self, device: &DeviceIdentity);

    fn set_transfer_count(
        &mut self,
        device: &DeviceIdentity,
        count: TransferCount,
    ) -> PortResult<()>;

    /// Enable the device. With `show_ui` the device may bring up its own
    /// capture window asynchronously.
    fn enable_device(&mut self, device: &DeviceIdentity, show_ui: bool) -> PortResult<()>;

    fn disable_device(&mut self, device: &DeviceIdentity);

    /// Offer one raw input event to the device. `None` means the event was
    /// not claimed and must go through normal input dispatch.
    fn process_event(&mut self, device: &DeviceIdentity, event: &Self::Event)
    -> Option<Notification>;

    /// Request one native image transfer. `None` means no frame was
    /// produced; the session distinguishes failure from completion by its
    /// own state afterwards.
    fn begin_transfer(&mut self, device: &DeviceIdentity) -> Option<RasterFrame>;

    /// Close out the current transfer. Returns the number of transfers the
    /// device still has pending.
    fn end_transfer(&mut self, device: &DeviceIdentity) -> u16;

    /// Discard all pending transfers.
    fn reset_pending(&mut self, device: &DeviceIdentity) -> PortResult<()>;
}
