// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-memory platform bridge for unit tests.

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use image::{DynamicImage, RgbImage};

use scandesk_bridge::{DesktopShell, PlatformBridge, ScanSetting, ScannerBackend, Spooler};
use scandesk_core::error::{Result, ScanDeskError};
use scandesk_core::{Device, DeviceKind, PrintSettings, PrinterDetails};

#[derive(Clone, Copy)]
pub(crate) enum Acquire {
    /// Save a small valid BMP.
    Image,
    /// Save a BMP of the given pixel size.
    Page(u32, u32),
    /// Save bytes no decoder accepts.
    Garbage,
    /// Report a disconnected scanner.
    Disconnected,
}

pub(crate) struct MockBridge {
    scanners: Vec<Device>,
    printers: Vec<PrinterDetails>,
    default: Option<String>,
    fail_enumeration: bool,
    acquire: Acquire,
    enumerations: AtomicUsize,
    pub(crate) acquired: Mutex<Vec<(String, Vec<ScanSetting>, PathBuf)>>,
}

impl MockBridge {
    fn base() -> Self {
        Self {
            scanners: Vec::new(),
            printers: Vec::new(),
            default: None,
            fail_enumeration: false,
            acquire: Acquire::Image,
            enumerations: AtomicUsize::new(0),
            acquired: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn with_scanners(names: &[&str]) -> Self {
        let scanners = names
            .iter()
            .enumerate()
            .map(|(i, name)| Device {
                index: i + 1,
                display_name: name.to_string(),
                device_id: format!("scanner-{}", i + 1),
                kind: DeviceKind::Scanner,
            })
            .collect();
        Self {
            scanners,
            ..Self::base()
        }
    }

    pub(crate) fn with_printers(names: &[&str], default: Option<&str>) -> Self {
        let printers = names
            .iter()
            .enumerate()
            .map(|(i, name)| PrinterDetails {
                device: Device {
                    index: i + 1,
                    display_name: name.to_string(),
                    device_id: name.to_string(),
                    kind: DeviceKind::Printer,
                },
                is_default: Some(*name) == default,
                port: format!("USB00{}", i + 1),
                driver: "Generic / Text Only".into(),
                status: 0,
                attributes: 0,
            })
            .collect();
        Self {
            printers,
            default: default.map(str::to_string),
            ..Self::base()
        }
    }

    pub(crate) fn failing_enumeration() -> Self {
        Self {
            fail_enumeration: true,
            ..Self::base()
        }
    }

    pub(crate) fn acquiring(mut self, acquire: Acquire) -> Self {
        self.acquire = acquire;
        self
    }

    pub(crate) fn enumerations(&self) -> usize {
        self.enumerations.load(Ordering::SeqCst)
    }
}

impl PlatformBridge for MockBridge {
    fn platform_name(&self) -> &str {
        "mock"
    }
}

impl ScannerBackend for MockBridge {
    fn enumerate_scanners(&self) -> Result<Vec<Device>> {
        self.enumerations.fetch_add(1, Ordering::SeqCst);
        if self.fail_enumeration {
            return Err(ScanDeskError::DeviceBusyOrDisconnected("WIA service stopped".into()));
        }
        Ok(self.scanners.clone())
    }

    fn scanner_properties(&self, _device_id: &str) -> Result<Vec<(String, String)>> {
        if self.fail_enumeration {
            return Err(ScanDeskError::PlatformUnavailable);
        }
        Ok(vec![("Name".into(), "Mock".into())])
    }

    fn acquire(&self, device_id: &str, settings: &[ScanSetting], destination: &Path) -> Result<()> {
        assert!(!destination.exists(), "destination must be fresh");
        self.acquired.lock().unwrap().push((
            device_id.to_string(),
            settings.to_vec(),
            destination.to_path_buf(),
        ));
        match self.acquire {
            Acquire::Image => {
                DynamicImage::ImageRgb8(RgbImage::from_pixel(24, 32, image::Rgb([200, 200, 200])))
                    .save_with_format(destination, image::ImageFormat::Bmp)
                    .unwrap();
                Ok(())
            }
            Acquire::Page(width, height) => {
                DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, image::Rgb([255, 255, 255])))
                    .save_with_format(destination, image::ImageFormat::Bmp)
                    .unwrap();
                Ok(())
            }
            Acquire::Garbage => {
                std::fs::write(destination, b"BM not really a bitmap").unwrap();
                Ok(())
            }
            Acquire::Disconnected => Err(ScanDeskError::DeviceBusyOrDisconnected(
                "RPC server unavailable".into(),
            )),
        }
    }
}

impl Spooler for MockBridge {
    fn enumerate_printers(&self) -> Result<Vec<PrinterDetails>> {
        if self.fail_enumeration {
            return Err(ScanDeskError::Spooler("spooler stopped".into()));
        }
        Ok(self.printers.clone())
    }

    fn default_printer(&self) -> Result<Option<String>> {
        Ok(self.default.clone())
    }

    fn set_default_printer(&self, _name: &str) -> Result<()> {
        Ok(())
    }

    fn write_raw(&self, _printer: &str, _document_name: &str, _data: &[u8]) -> Result<()> {
        Ok(())
    }

    fn apply_settings(&self, _printer: &str, _settings: &PrintSettings) -> Result<()> {
        Ok(())
    }
}

impl DesktopShell for MockBridge {
    fn shell_execute(&self, _verb: &str, _file: &Path, _parameters: Option<&str>) -> Result<()> {
        Ok(())
    }
}
