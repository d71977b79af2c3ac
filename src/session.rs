//! Session state machine
//!
//! Owns the protocol state, the application identity and the selected
//! device. Every operation is gated on the current state; tear-down
//! operations are idempotent and cascade through the lower levels, so a
//! caller can always reach a safe state with a single call no matter how
//! far setup got before failing.

use thiserror::Error;

use crate::env::{CallEnv, EnvGuard};
use crate::frame::RasterFrame;
use crate::port::{DevicePort, TransferCount};

/// Protocol state, ordered from fully torn down to mid-transfer.
///
/// Operations compare against thresholds rather than exact states, so the
/// machine can only be observed in one of these six values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SessionState {
    ManagerUnloaded,
    ManagerOpen,
    DeviceOpen,
    DeviceEnabled,
    TransferReady,
    Transferring,
}

/// Static descriptor of the calling application, immutable after
/// construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerIdentity {
    pub protocol_version: (u16, u16),
    pub vendor: String,
    pub product_family: String,
    pub product_name: String,
    pub supported_groups: SupportedGroups,
}

/// Capability groups the application announces to the manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupportedGroups {
    pub control: bool,
    pub image: bool,
}

impl ManagerIdentity {
    /// Identity with protocol version 1.0 and both capability groups.
    pub fn new(vendor: &str, product_family: &str, product_name: &str) -> Self {
        Self {
            protocol_version: (1, 0),
            vendor: vendor.to_owned(),
            product_family: product_family.to_owned(),
            product_name: product_name.to_owned(),
            supported_groups: SupportedGroups {
                control: true,
                image: true,
            },
        }
    }
}

/// Descriptor of a selected device, as reported by the protocol layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceIdentity {
    pub id: u32,
    pub vendor: String,
    pub product_name: String,
}

/// Operation-level failure kinds. Raw protocol codes never appear here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("failed to open the device manager")]
    ManagerOpenFailed,
    #[error("no device was selected")]
    NoDeviceSelected,
    #[error("failed to open the device")]
    DeviceOpenFailed,
    #[error("failed to enable the device")]
    DeviceEnableFailed,
}

/// One end-to-end device session.
///
/// The session exclusively owns the port, the environment toggles and the
/// selected device identity; collaborators mutate state only through the
/// documented operations. The machine is cyclic: after `close_manager` it
/// is back at `ManagerUnloaded` and can be opened again.
pub struct Session<P: DevicePort, E: CallEnv> {
    port: P,
    env: E,
    app: ManagerIdentity,
    device: Option<DeviceIdentity>,
    state: SessionState,
}

impl<P: DevicePort, E: CallEnv> Session<P, E> {
    pub fn new(port: P, env: E, app: ManagerIdentity) -> Self {
        Self {
            port,
            env,
            app,
            device: None,
            state: SessionState::ManagerUnloaded,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn app(&self) -> &ManagerIdentity {
        &self.app
    }

    /// Identity of the currently open device, if any.
    pub fn device(&self) -> Option<&DeviceIdentity> {
        self.device.as_ref()
    }

    /// Route one protocol call through the environment guard. This is the
    /// only path into the port; nothing else may call it directly.
    pub(crate) fn call<T>(&mut self, f: impl FnOnce(&mut P) -> T) -> T {
        let _guard = EnvGuard::activate(&mut self.env);
        f(&mut self.port)
    }

    pub(crate) fn current_device(&self) -> Option<DeviceIdentity> {
        self.device.clone()
    }

    #[cfg(test)]
    pub(crate) fn port(&self) -> &P {
        &self.port
    }

    #[cfg(test)]
    pub(crate) fn port_mut(&mut self) -> &mut P {
        &mut self.port
    }

    /// Promote to `TransferReady`. Only the event classifier advances the
    /// machine this way; transfers cannot begin before it happens.
    pub(crate) fn promote_transfer_ready(&mut self) {
        if self.state < SessionState::TransferReady {
            log::debug!("device reports transfer ready");
            self.state = SessionState::TransferReady;
        }
    }

    /// Open the session manager. Valid only from `ManagerUnloaded`.
    pub fn open_manager(&mut self) -> Result<(), SessionError> {
        if self.state != SessionState::ManagerUnloaded {
            log::debug!("open_manager ignored in state {:?}", self.state);
            return Err(SessionError::ManagerOpenFailed);
        }
        let app = self.app.clone();
        match self.call(|p| p.open_manager(&app)) {
            Ok(()) => {
                log::debug!("manager open");
                self.state = SessionState::ManagerOpen;
                Ok(())
            }
            Err(code) => {
                log::error!("manager open failed: {code}");
                Err(SessionError::ManagerOpenFailed)
            }
        }
    }

    /// Tear everything down and close the manager. Always lands in
    /// `ManagerUnloaded`, from any state.
    pub fn close_manager(&mut self) {
        self.close_device();
        if self.state >= SessionState::ManagerOpen {
            self.call(|p| p.close_manager());
            log::debug!("manager closed");
        }
        self.state = SessionState::ManagerUnloaded;
    }

    /// Ask the user to pick a device. The protocol layer may show its own
    /// picker. Cancellation and failure both report `NoDeviceSelected`.
    pub fn select_device(&mut self) -> Result<DeviceIdentity, SessionError> {
        if self.state < SessionState::ManagerOpen || self.state >= SessionState::DeviceOpen {
            log::debug!("select_device ignored in state {:?}", self.state);
            return Err(SessionError::NoDeviceSelected);
        }
        self.call(|p| p.user_select()).map_err(|code| {
            log::debug!("device selection cancelled or failed: {code}");
            SessionError::NoDeviceSelected
        })
    }

    /// Open the given device, making it the session's device.
    pub fn open_device(&mut self, device: DeviceIdentity) -> Result<(), SessionError> {
        if self.state < SessionState::ManagerOpen || self.state >= SessionState::DeviceOpen {
            log::debug!("open_device ignored in state {:?}", self.state);
            return Err(SessionError::DeviceOpenFailed);
        }
        match self.call(|p| p.open_device(&device)) {
            Ok(()) => {
                log::debug!("device open: {}", device.product_name);
                self.device = Some(device);
                self.state = SessionState::DeviceOpen;
                Ok(())
            }
            Err(code) => {
                log::error!("device open failed: {code}");
                Err(SessionError::DeviceOpenFailed)
            }
        }
    }

    /// Negotiate how many images the coming enable may transfer.
    ///
    /// Best effort: devices that reject the capability still transfer a
    /// single image, so callers should not treat `false` as fatal.
    pub fn set_transfer_count(&mut self, count: TransferCount) -> bool {
        if self.state < SessionState::DeviceOpen {
            return false;
        }
        let Some(device) = self.current_device() else {
            return false;
        };
        match self.call(|p| p.set_transfer_count(&device, count)) {
            Ok(()) => true,
            Err(code) => {
                log::debug!(
                    "transfer count negotiation failed ({code}), device will default to a single image"
                );
                false
            }
        }
    }

    /// Enable the device with its capture UI. Succeeds without a protocol
    /// call if the device is already enabled.
    pub fn enable_device(&mut self) -> Result<(), SessionError> {
        if self.state < SessionState::DeviceOpen {
            log::debug!("enable_device ignored in state {:?}", self.state);
            return Err(SessionError::DeviceEnableFailed);
        }
        if self.state >= SessionState::DeviceEnabled {
            return Ok(());
        }
        let Some(device) = self.current_device() else {
            return Err(SessionError::DeviceEnableFailed);
        };
        match self.call(|p| p.enable_device(&device, true)) {
            Ok(()) => {
                log::debug!("device enabled: {}", device.product_name);
                self.state = SessionState::DeviceEnabled;
                Ok(())
            }
            Err(code) => {
                log::error!("device enable failed: {code}");
                Err(SessionError::DeviceEnableFailed)
            }
        }
    }

    /// Disable the device, aborting any pending transfers first. No-op
    /// below `DeviceEnabled`.
    pub fn disable_device(&mut self) {
        self.abort_transfers();
        if self.state >= SessionState::DeviceEnabled {
            if let Some(device) = self.current_device() {
                self.call(|p| p.disable_device(&device));
            }
            log::debug!("device disabled");
            self.state = SessionState::DeviceOpen;
        }
    }

    /// Close the device, disabling it first. No-op below `DeviceOpen`.
    pub fn close_device(&mut self) {
        self.disable_device();
        if self.state >= SessionState::DeviceOpen {
            if let Some(device) = self.current_device() {
                self.call(|p| p.close_device(&device));
            }
            log::debug!("device closed");
            self.device = None;
            self.state = SessionState::ManagerOpen;
        }
    }

    /// Request one native image transfer.
    ///
    /// `None` either means the device's queue is drained (state has fallen
    /// back to `DeviceEnabled`) or the transfer failed (state still
    /// `TransferReady`); callers tell the two apart by checking `state()`.
    pub fn begin_transfer(&mut self) -> Option<RasterFrame> {
        if self.state >= SessionState::Transferring {
            self.end_transfer();
        }
        if self.state < SessionState::TransferReady {
            return None;
        }
        let device = self.current_device()?;
        match self.call(|p| p.begin_transfer(&device)) {
            Some(frame) => {
                log::debug!(
                    "transferring {}x{} frame at {} bpp",
                    frame.width(),
                    frame.height(),
                    frame.bits_per_pixel()
                );
                self.state = SessionState::Transferring;
                Some(frame)
            }
            None => {
                log::warn!("device produced no frame");
                None
            }
        }
    }

    /// Close out the current transfer and query the device's remaining
    /// count. Returns `None` when no transfer is in flight.
    pub fn end_transfer(&mut self) -> Option<u16> {
        if self.state < SessionState::Transferring {
            return None;
        }
        let device = self.current_device()?;
        let remaining = self.call(|p| p.end_transfer(&device));
        log::debug!("transfer ended, {remaining} pending");
        self.state = if remaining > 0 {
            SessionState::TransferReady
        } else {
            SessionState::DeviceEnabled
        };
        Some(remaining)
    }

    /// End any in-flight transfer and discard whatever the device still has
    /// queued. The state is forced back to `DeviceEnabled` even when the
    /// device rejects the reset; local consistency wins over the device's
    /// own confusion.
    pub fn abort_transfers(&mut self) -> bool {
        if self.state < SessionState::DeviceEnabled {
            return false;
        }
        if self.state >= SessionState::Transferring {
            self.end_transfer();
        }
        let Some(device) = self.current_device() else {
            self.state = SessionState::DeviceEnabled;
            return false;
        };
        let ok = self.call(|p| p.reset_pending(&device)).is_ok();
        if !ok {
            log::warn!("pending transfer reset failed, forcing device back to enabled");
        }
        self.state = SessionState::DeviceEnabled;
        ok
    }
}
