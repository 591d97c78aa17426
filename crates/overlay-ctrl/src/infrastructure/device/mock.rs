//! In-memory display device for tests.
//!
//! # Why a mock display?
//!
//! The real framebuffer adapter needs an MDP kernel driver and a display.
//! `MockDisplay` replaces it with an in-memory overlay table that behaves like
//! the kernel closely enough for the controller's state machine:
//!
//! - `set_overlay` validates the request, allocates a slot for new requests
//!   and stores the configuration under its id.
//! - `get_overlay` returns what was stored.
//! - `unset_overlay` frees the slot.
//!
//! Every call is recorded as a [`DeviceCall`] so tests can assert exactly which
//! device requests were issued and in what order.
//!
//! # Failure injection
//!
//! Each operation can be made to fail with the `fail_*` / `reject_commits`
//! switches.  They can be flipped at any time, including after the device has
//! been handed to a controller.
//!
//! # Usage in tests
//!
//! ```ignore
//! let display = Arc::new(MockDisplay::new());
//! let mut ctrl = PipeController::new(display.clone(), 20);
//! ctrl.init(0).unwrap();
//! ctrl.commit().unwrap();
//! assert_eq!(display.calls().last(), Some(&DeviceCall::Set(PipeId::Unassigned)));
//! ```

use std::collections::BTreeMap;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use overlay_core::{PipeConfiguration, PipeId};

use crate::application::overlay_device::{
    DeviceError, DeviceOpener, FixedScreenInfo, OverlayDevice, VariableScreenInfo,
};

/// A device request observed by the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceCall {
    Open(u32),
    Get(PipeId),
    /// Carries the id the request was submitted with.
    Set(PipeId),
    Unset(u32),
    FixedScreenInfo,
    VariableScreenInfo,
    Close,
}

#[derive(Debug, Default)]
struct Failures {
    open: bool,
    get: bool,
    set: bool,
    unset: bool,
    close: bool,
    screen_info: bool,
}

#[derive(Debug, Default)]
struct MockState {
    calls: Vec<DeviceCall>,
    overlays: BTreeMap<u32, PipeConfiguration>,
    next_id: u32,
    open_handles: usize,
    failures: Failures,
}

#[derive(Debug)]
struct Shared {
    state: Mutex<MockState>,
    fixed: FixedScreenInfo,
    var: VariableScreenInfo,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A mock display that hands out [`MockDisplayDevice`] handles.
#[derive(Debug)]
pub struct MockDisplay {
    shared: Arc<Shared>,
}

impl MockDisplay {
    /// Creates a 1920×1080, 32 bpp display with no overlays.
    pub fn new() -> Self {
        Self::with_screen(1920, 1080, 32)
    }

    /// Creates a display with the given resolution and depth.
    ///
    /// The row stride is `width * bits_per_pixel / 8`.
    pub fn with_screen(width: u32, height: u32, bits_per_pixel: u32) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(MockState::default()),
                fixed: FixedScreenInfo {
                    line_length: width * bits_per_pixel / 8,
                },
                var: VariableScreenInfo {
                    xres: width,
                    yres: height,
                    bits_per_pixel,
                },
            }),
        }
    }

    /// Returns every device request recorded so far.
    pub fn calls(&self) -> Vec<DeviceCall> {
        self.shared.lock().calls.clone()
    }

    /// Forgets the recorded requests.
    pub fn clear_calls(&self) {
        self.shared.lock().calls.clear();
    }

    /// Returns the configuration stored under overlay slot `id`.
    pub fn overlay(&self, id: u32) -> Option<PipeConfiguration> {
        self.shared.lock().overlays.get(&id).cloned()
    }

    /// Number of allocated overlay slots.
    pub fn overlay_count(&self) -> usize {
        self.shared.lock().overlays.len()
    }

    /// Number of handles opened and not yet closed.
    pub fn open_handles(&self) -> usize {
        self.shared.lock().open_handles
    }

    pub fn fail_open(&self, on: bool) {
        self.shared.lock().failures.open = on;
    }

    pub fn fail_get(&self, on: bool) {
        self.shared.lock().failures.get = on;
    }

    /// Makes every `set_overlay` fail as if the kernel rejected it.
    pub fn reject_commits(&self, on: bool) {
        self.shared.lock().failures.set = on;
    }

    pub fn fail_unset(&self, on: bool) {
        self.shared.lock().failures.unset = on;
    }

    pub fn fail_close(&self, on: bool) {
        self.shared.lock().failures.close = on;
    }

    pub fn fail_screen_info(&self, on: bool) {
        self.shared.lock().failures.screen_info = on;
    }
}

impl Default for MockDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceOpener for MockDisplay {
    fn open(&self, index: u32) -> Result<Box<dyn OverlayDevice>, DeviceError> {
        let mut state = self.shared.lock();
        state.calls.push(DeviceCall::Open(index));
        if state.failures.open {
            return Err(DeviceError::Open {
                path: format!("mock://fb{index}").into(),
                source: io::Error::new(io::ErrorKind::NotFound, "mock failure"),
            });
        }
        state.open_handles += 1;
        Ok(Box::new(MockDisplayDevice {
            shared: Arc::clone(&self.shared),
        }))
    }
}

/// Handle returned by [`MockDisplay::open`].
#[derive(Debug)]
pub struct MockDisplayDevice {
    shared: Arc<Shared>,
}

fn mock_failure(request: &'static str) -> DeviceError {
    DeviceError::Ioctl {
        request,
        source: io::Error::new(io::ErrorKind::InvalidInput, "mock failure"),
    }
}

/// Kernel-style validation of an overlay request.
fn validate(config: &PipeConfiguration, var: &VariableScreenInfo) -> Result<(), DeviceError> {
    if !config.src_rect.fits_within(config.src.w, config.src.h) {
        return Err(DeviceError::Ioctl {
            request: "MSMFB_OVERLAY_SET",
            source: io::Error::new(io::ErrorKind::InvalidInput, "source crop exceeds buffer"),
        });
    }
    if !config.dst_rect.fits_within(var.xres, var.yres) {
        return Err(DeviceError::Ioctl {
            request: "MSMFB_OVERLAY_SET",
            source: io::Error::new(io::ErrorKind::InvalidInput, "destination exceeds screen"),
        });
    }
    Ok(())
}

impl OverlayDevice for MockDisplayDevice {
    fn get_overlay(&self, id: PipeId) -> Result<PipeConfiguration, DeviceError> {
        let mut state = self.shared.lock();
        state.calls.push(DeviceCall::Get(id));
        if state.failures.get {
            return Err(mock_failure("MSMFB_OVERLAY_GET"));
        }
        match id {
            PipeId::Assigned(slot) => state
                .overlays
                .get(&slot)
                .cloned()
                .ok_or_else(|| mock_failure("MSMFB_OVERLAY_GET")),
            PipeId::Unassigned => Err(mock_failure("MSMFB_OVERLAY_GET")),
        }
    }

    fn set_overlay(&mut self, config: &PipeConfiguration) -> Result<u32, DeviceError> {
        let mut state = self.shared.lock();
        state.calls.push(DeviceCall::Set(config.id));
        if state.failures.set {
            return Err(mock_failure("MSMFB_OVERLAY_SET"));
        }
        validate(config, &self.shared.var)?;

        let slot = match config.id {
            PipeId::Assigned(slot) if state.overlays.contains_key(&slot) => slot,
            PipeId::Assigned(_) => return Err(mock_failure("MSMFB_OVERLAY_SET")),
            PipeId::Unassigned => {
                let slot = state.next_id;
                state.next_id += 1;
                slot
            }
        };

        let stored = PipeConfiguration {
            id: PipeId::Assigned(slot),
            ..config.clone()
        };
        state.overlays.insert(slot, stored);
        Ok(slot)
    }

    fn unset_overlay(&mut self, id: u32) -> Result<(), DeviceError> {
        let mut state = self.shared.lock();
        state.calls.push(DeviceCall::Unset(id));
        if state.failures.unset {
            return Err(mock_failure("MSMFB_OVERLAY_UNSET"));
        }
        state
            .overlays
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| mock_failure("MSMFB_OVERLAY_UNSET"))
    }

    fn fixed_screen_info(&self) -> Result<FixedScreenInfo, DeviceError> {
        let mut state = self.shared.lock();
        state.calls.push(DeviceCall::FixedScreenInfo);
        if state.failures.screen_info {
            return Err(mock_failure("FBIOGET_FSCREENINFO"));
        }
        Ok(self.shared.fixed)
    }

    fn variable_screen_info(&self) -> Result<VariableScreenInfo, DeviceError> {
        let mut state = self.shared.lock();
        state.calls.push(DeviceCall::VariableScreenInfo);
        if state.failures.screen_info {
            return Err(mock_failure("FBIOGET_VSCREENINFO"));
        }
        Ok(self.shared.var)
    }

    fn close(&mut self) -> Result<(), DeviceError> {
        let mut state = self.shared.lock();
        state.calls.push(DeviceCall::Close);
        if state.failures.close {
            return Err(DeviceError::Close(io::Error::new(
                io::ErrorKind::Other,
                "mock failure",
            )));
        }
        state.open_handles = state.open_handles.saturating_sub(1);
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
