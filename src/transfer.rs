//! Transfer drain loop
//!
//! Once the classifier reports `TransferReady`, `drain` pulls every image
//! the device has queued and hands each frame to the persistence
//! collaborator. "No more images" and "transfer failed" both surface as a
//! missing frame; the session's state immediately after the attempt is the
//! only signal telling them apart, and the loop keys off that.

use thiserror::Error;

use crate::env::CallEnv;
use crate::frame::RasterFrame;
use crate::port::DevicePort;
use crate::session::{Session, SessionState};

/// Persistence collaborator. Receives ownership of each frame; the frame
/// is released when it goes out of scope, whatever the outcome.
pub trait FrameSink {
    fn store(&mut self, frame: RasterFrame) -> anyhow::Result<()>;
}

/// The device stopped producing frames while still reporting more pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("image transfer failed before the device finished its queue")]
pub struct TransferFailed;

/// Drain all currently pending images into `sink`.
///
/// Returns the number of frames handed to the sink. Sink failures are
/// logged and do not stop the drain; the remaining images still belong to
/// this transfer session and must be consumed. A transfer failure aborts
/// whatever the device still has queued and reports `TransferFailed`.
pub fn drain<P, E, S>(session: &mut Session<P, E>, sink: &mut S) -> Result<usize, TransferFailed>
where
    P: DevicePort,
    E: CallEnv,
    S: FrameSink,
{
    let mut emitted = 0;
    loop {
        match session.begin_transfer() {
            Some(frame) => {
                emitted += 1;
                if let Err(err) = sink.store(frame) {
                    log::error!("failed to persist frame: {err:#}");
                }
                session.end_transfer();
            }
            None if session.state() == SessionState::TransferReady => {
                log::error!("device reported ready but produced no frame, aborting");
                session.abort_transfers();
                return Err(TransferFailed);
            }
            None => {
                log::debug!("transfer session drained, {emitted} frame(s) emitted");
                return Ok(emitted);
            }
        }
    }
}
