//! Scripted fakes shared by the unit tests.

use std::collections::VecDeque;

use crate::frame::RasterFrame;
use crate::port::{DevicePort, Notification, PortError, PortResult, TransferCount};
use crate::session::{DeviceIdentity, ManagerIdentity};

pub(crate) fn device() -> DeviceIdentity {
    DeviceIdentity {
        id: 7,
        vendor: "Acme".into(),
        product_name: "FlatScan 9000".into(),
    }
}

/// Small 24 bpp frame for transfer tests.
pub(crate) fn rgb_frame(width: u32, height: u32) -> RasterFrame {
    let stride = width as usize * 3;
    let data = vec![0x7f; stride * height as usize];
    RasterFrame::new(width, height, 24, stride, None, data).expect("valid test frame")
}

/// Raw event stand-in: either plain input or a device notification.
#[derive(Debug, Clone, Copy)]
pub(crate) enum FakeEvent {
    Input,
    Notify(Notification),
}

/// Scripted protocol backend. Flags decide per-operation outcomes, queues
/// script the transfer phase, and `calls` records every port call in
/// order.
pub(crate) struct FakePort {
    pub open_manager_ok: bool,
    pub open_device_ok: bool,
    pub enable_ok: bool,
    pub set_count_ok: bool,
    pub reset_ok: bool,
    pub select_result: Option<DeviceIdentity>,
    pub frames: VecDeque<Option<RasterFrame>>,
    pub pending_after: VecDeque<u16>,
    pub calls: Vec<String>,
}

impl Default for FakePort {
    fn default() -> Self {
        Self {
            open_manager_ok: true,
            open_device_ok: true,
            enable_ok: true,
            set_count_ok: true,
            reset_ok: true,
            select_result: Some(device()),
            frames: VecDeque::new(),
            pending_after: VecDeque::new(),
            calls: Vec::new(),
        }
    }
}

impl FakePort {
    fn record(&mut self, name: &str) {
        self.calls.push(name.to_owned());
    }

    fn outcome(ok: bool) -> PortResult<()> {
        if ok { Ok(()) } else { Err(PortError(1)) }
    }
}

impl DevicePort for FakePort {
    type Event = FakeEvent;

    fn open_manager(&mut self, _app: &ManagerIdentity) -> PortResult<()> {
        self.record("open_manager");
        Self::outcome(self.open_manager_ok)
    }

    fn close_manager(&mut self) {
        self.record("close_manager");
    }

    fn user_select(&mut self) -> PortResult<DeviceIdentity> {
        self.record("user_select");
        self.select_result.clone().ok_or(PortError(2))
    }

    fn open_device(&mut self, _device: &DeviceIdentity) -> PortResult<()> {
        self.record("open_device");
        Self::outcome(self.open_device_ok)
    }

    fn close_device(&mut self, _device: &DeviceIdentity) {
        self.record("close_device");
    }

    fn set_transfer_count(
        &mut self,
        _device: &DeviceIdentity,
        _count: TransferCount,
    ) -> PortResult<()> {
        self.record("set_transfer_count");
        Self::outcome(self.set_count_ok)
    }

    fn enable_device(&mut self, _device: &DeviceIdentity, _show_ui: bool) -> PortResult<()> {
        self.record("enable_device");
        Self::outcome(self.enable_ok)
    }

    fn disable_device(&mut self, _device: &DeviceIdentity) {
        self.record("disable_device");
    }

    fn process_event(
        &mut self,
        _device: &DeviceIdentity,
        event: &FakeEvent,
    ) -> Option<Notification> {
        self.record("process_event");
        match event {
            FakeEvent::Input => None,
            FakeEvent::Notify(notification) => Some(*notification),
        }
    }

    fn begin_transfer(&mut self, _device: &DeviceIdentity) -> Option<RasterFrame> {
        self.record("begin_transfer");
        self.frames.pop_front().flatten()
    }

    fn end_transfer(&mut self, _device: &DeviceIdentity) -> u16 {
        self.record("end_transfer");
        self.pending_after.pop_front().unwrap_or(0)
    }

    fn reset_pending(&mut self, _device: &DeviceIdentity) -> PortResult<()> {
        self.record("reset_pending");
        Self::outcome(self.reset_ok)
    }
}
