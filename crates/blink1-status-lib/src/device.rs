//! Device communication: trait + Linux (nusb) backend.

use std::fmt;

use serde::Serialize;

use crate::color::{ColorCorrect, Rgb};
use crate::protocol::{self, REPORT_SIZE};

// ── Error type ──

/// Errors from opening or talking to a blink(1).
///
/// Payloads read `"<step>: <cause>"`, e.g. `"SET_REPORT: timeout"`.
#[derive(Debug)]
pub enum DeviceError {
    NotFound,
    OpenFailed(String),
    WriteFailed(String),
    ReadFailed(String),
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceError::NotFound => write!(f, "blink(1) device not found"),
            DeviceError::OpenFailed(e) => write!(f, "Failed to open device: {e}"),
            DeviceError::WriteFailed(e) => write!(f, "Write failed: {e}"),
            DeviceError::ReadFailed(e) => write!(f, "Read failed: {e}"),
        }
    }
}

impl std::error::Error for DeviceError {}

pub type Result<T> = std::result::Result<T, DeviceError>;

/// A single feature report, including the leading report id.
pub type Report = [u8; REPORT_SIZE];

// ── Device info ──

#[derive(Debug, Clone, Serialize)]
pub struct DeviceInfo {
    /// Bus location, e.g. `usb:001/004`.
    pub path: String,
    /// USB product string.
    pub product: String,
    /// USB serial number, if the device reports one.
    pub serial: Option<String>,
    /// Firmware version as `major * 100 + minor`, if it could be read.
    pub firmware: Option<u16>,
}

// ── Trait ──

/// A blink(1)-style status light reachable through feature reports.
///
/// Backends implement raw report I/O; the light commands are provided on top.
pub trait StatusLightDevice {
    fn open() -> Result<Self>
    where
        Self: Sized;
    fn info(&self) -> &DeviceInfo;
    /// Send one feature report.
    fn write_report(&self, report: &Report) -> Result<()>;
    /// Read back one feature report.
    fn read_report(&self) -> Result<Report>;

    /// USB serial number of the device.
    fn serial_number(&self) -> Result<String> {
        self.info()
            .serial
            .clone()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| DeviceError::ReadFailed("serial number: not reported".into()))
    }

    /// Fade to a color without color correction.
    fn fade_to_rgb_uncorrected(&self, fade_ms: u32, rgb: Rgb) -> Result<()> {
        let report =
            protocol::build_fade_report(fade_ms, rgb.r, rgb.g, rgb.b, protocol::LED_ALL);
        self.write_report(&report)
    }

    /// Fade to a color after applying `correction`.
    fn fade_to_rgb_with(&self, correction: &ColorCorrect, fade_ms: u32, rgb: Rgb) -> Result<()> {
        self.fade_to_rgb_uncorrected(fade_ms, correction.apply(rgb))
    }

    /// Fade to a color using the default gamma correction.
    fn fade_to_rgb(&self, fade_ms: u32, rgb: Rgb) -> Result<()> {
        self.fade_to_rgb_with(&ColorCorrect::default(), fade_ms, rgb)
    }

    /// Turn all LEDs off immediately.
    fn off(&self) -> Result<()> {
        self.fade_to_rgb(0, Rgb::BLACK)
    }

    /// Query the firmware version (`major * 100 + minor`).
    fn firmware_version(&self) -> Result<u16> {
        self.write_report(&protocol::build_version_report())?;
        let resp = self.read_report()?;
        protocol::parse_version(&resp).ok_or_else(|| {
            DeviceError::ReadFailed(format!("version: unexpected response {resp:02X?}"))
        })
    }
}

// ── Linux implementation ──

#[cfg(target_os = "linux")]
mod linux_impl {
    use super::*;
    use std::time::Duration;

    use nusb::transfer::{Control, ControlType, Recipient};

    use crate::protocol::{
        BLINK1_PID, BLINK1_VID, FEATURE_REPORT_VALUE, HID_GET_REPORT, HID_INTERFACE,
        HID_SET_REPORT, USB_TIMEOUT_MS,
    };

    pub struct LinuxDevice {
        interface: nusb::Interface,
        info: DeviceInfo,
    }

    fn feature_control(request: u8) -> Control {
        Control {
            control_type: ControlType::Class,
            recipient: Recipient::Interface,
            request,
            value: FEATURE_REPORT_VALUE,
            index: u16::from(HID_INTERFACE),
        }
    }

    impl StatusLightDevice for LinuxDevice {
        fn open() -> Result<Self> {
            let device_info = nusb::list_devices()
                .map_err(|e| DeviceError::OpenFailed(format!("USB enumeration: {e}")))?
                .find(|dev| dev.vendor_id() == BLINK1_VID && dev.product_id() == BLINK1_PID)
                .ok_or(DeviceError::NotFound)?;

            let serial = device_info.serial_number().map(|s| s.to_string());
            let product = device_info
                .product_string()
                .unwrap_or("blink(1)")
                .to_string();
            let path = format!(
                "usb:{:03}/{:03}",
                device_info.bus_number(),
                device_info.device_address()
            );

            let usb_device = device_info
                .open()
                .map_err(|e| DeviceError::OpenFailed(format!("USB open: {e}")))?;

            // usbhid owns the interface by default
            let interface = usb_device
                .detach_and_claim_interface(HID_INTERFACE)
                .map_err(|e| {
                    DeviceError::OpenFailed(format!("claim interface {HID_INTERFACE}: {e}"))
                })?;

            let mut dev = LinuxDevice {
                interface,
                info: DeviceInfo {
                    path,
                    product,
                    serial,
                    firmware: None,
                },
            };

            match dev.firmware_version() {
                Ok(v) => dev.info.firmware = Some(v),
                Err(e) => log::debug!("could not read firmware version: {e}"),
            }

            Ok(dev)
        }

        fn info(&self) -> &DeviceInfo {
            &self.info
        }

        fn write_report(&self, report: &Report) -> Result<()> {
            self.interface
                .control_out_blocking(
                    feature_control(HID_SET_REPORT),
                    report,
                    Duration::from_millis(USB_TIMEOUT_MS),
                )
                .map_err(|e| DeviceError::WriteFailed(format!("SET_REPORT: {e}")))?;
            Ok(())
        }

        fn read_report(&self) -> Result<Report> {
            let mut buf = [0u8; REPORT_SIZE];
            let n = self
                .interface
                .control_in_blocking(
                    feature_control(HID_GET_REPORT),
                    &mut buf,
                    Duration::from_millis(USB_TIMEOUT_MS),
                )
                .map_err(|e| DeviceError::ReadFailed(format!("GET_REPORT: {e}")))?;
            if n < REPORT_SIZE {
                return Err(DeviceError::ReadFailed(format!(
                    "GET_REPORT: short report ({n} of {REPORT_SIZE} bytes)"
                )));
            }
            Ok(buf)
        }
    }
}

#[cfg(target_os = "linux")]
pub use linux_impl::LinuxDevice;

// ── Stub device for unsupported platforms ──

/// Backend for targets without USB support here; `open` reports `NotFound`.
#[cfg(not(target_os = "linux"))]
pub struct StubDevice;

#[cfg(not(target_os = "linux"))]
impl StatusLightDevice for StubDevice {
    fn open() -> Result<Self> {
        Err(DeviceError::NotFound)
    }
    fn info(&self) -> &DeviceInfo {
        unreachable!()
    }
    fn write_report(&self, _report: &Report) -> Result<()> {
        unreachable!()
    }
    fn read_report(&self) -> Result<Report> {
        unreachable!()
    }
}

/// Concrete device type for the current platform.
#[cfg(target_os = "linux")]
pub type PlatformDevice = LinuxDevice;
#[cfg(not(target_os = "linux"))]
pub type PlatformDevice = StubDevice;

/// Open the first blink(1) on the platform backend.
pub fn open_device() -> Result<PlatformDevice> {
    PlatformDevice::open()
}

// ── Mock device for testing ──

/// In-memory mock device for unit and integration tests.
///
/// Records every report written; replies to reads from a queue.
#[doc(hidden)]
pub mod mock {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Records every written report; `read_report` pops queued responses.
    /// Thread-safe so it can sit behind the offload worker.
    pub struct MockDevice {
        info: DeviceInfo,
        /// Every report passed to `write_report`, in order.
        pub written: Mutex<Vec<Report>>,
        /// Responses returned by `read_report`, front first.
        pub responses: Mutex<VecDeque<Report>>,
        /// If true, `write_report` returns an error.
        pub fail_writes: AtomicBool,
    }

    impl Default for MockDevice {
        fn default() -> Self {
            Self::new()
        }
    }

    impl MockDevice {
        pub fn new() -> Self {
            Self::with_serial(Some("3A1C0F2D"))
        }

        pub fn with_serial(serial: Option<&str>) -> Self {
            MockDevice {
                info: DeviceInfo {
                    path: "mock://blink1".into(),
                    product: "blink(1) mk3".into(),
                    serial: serial.map(str::to_string),
                    firmware: Some(302),
                },
                written: Mutex::new(Vec::new()),
                responses: Mutex::new(VecDeque::new()),
                fail_writes: AtomicBool::new(false),
            }
        }

        /// Mutable access to device info.
        pub fn info_mut(&mut self) -> &mut DeviceInfo {
            &mut self.info
        }

        /// Queue a response for the next `read_report`.
        pub fn push_response(&self, report: Report) {
            self.responses.lock().unwrap().push_back(report);
        }

        /// Snapshot of all reports written so far.
        pub fn written(&self) -> Vec<Report> {
            self.written.lock().unwrap().clone()
        }

        /// The most recently written report.
        pub fn last_written(&self) -> Option<Report> {
            self.written.lock().unwrap().last().copied()
        }

        pub fn set_fail_writes(&self, fail: bool) {
            self.fail_writes.store(fail, Ordering::SeqCst);
        }
    }

    impl StatusLightDevice for MockDevice {
        fn open() -> Result<Self> {
            Ok(Self::new())
        }

        fn info(&self) -> &DeviceInfo {
            &self.info
        }

        fn write_report(&self, report: &Report) -> Result<()> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(DeviceError::WriteFailed(
                    "mock: write failure injected".into(),
                ));
            }
            self.written.lock().unwrap().push(*report);
            Ok(())
        }

        fn read_report(&self) -> Result<Report> {
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| DeviceError::ReadFailed("mock: no queued response".into()))
        }
    }

    /// A device type whose `open()` always fails.
    pub struct MissingDevice;

    impl StatusLightDevice for MissingDevice {
        fn open() -> Result<Self> {
            Err(DeviceError::NotFound)
        }
        fn info(&self) -> &DeviceInfo {
            unreachable!()
        }
        fn write_report(&self, _report: &Report) -> Result<()> {
            unreachable!()
        }
        fn read_report(&self) -> Result<Report> {
            unreachable!()
        }
    }
}
