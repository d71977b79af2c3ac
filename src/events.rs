//! Event classification
//!
//! The host's input loop offers every raw event to the session before
//! normal dispatch. Below `DeviceEnabled` nothing is forwarded to the
//! protocol layer at all; above it, the device gets first refusal and may
//! claim the event as one of its notifications.

use crate::env::CallEnv;
use crate::port::{DevicePort, Notification};
use crate::session::{Session, SessionState};

/// Outcome of offering one raw event to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classified {
    /// Ordinary input; dispatch it normally.
    Input,
    /// The device claimed the event.
    Device(Notification),
}

impl<P: DevicePort, E: CallEnv> Session<P, E> {
    /// Classify one raw event from the shared input stream.
    ///
    /// A `TransferReady` notification promotes the session to
    /// `TransferReady` as a side effect; this is the only way the machine
    /// reaches that state.
    pub fn classify_event(&mut self, event: &P::Event) -> Classified {
        if self.state() < SessionState::DeviceEnabled {
            return Classified::Input;
        }
        let Some(device) = self.current_device() else {
            return Classified::Input;
        };
        match self.call(|p| p.process_event(&device, event)) {
            None => Classified::Input,
            Some(notification) => {
                if notification == Notification::TransferReady
                    && self.state() < SessionState::TransferReady
                {
                    self.promote_transfer_ready();
                }
                Classified::Device(notification)
            }
        }
    }
}
