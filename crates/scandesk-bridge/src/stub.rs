// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Stub bridge for non-Windows builds.
//
// Enumerations report nothing attached; every action returns
// `PlatformUnavailable`. The real implementation lives in the `windows`
// module.

use std::path::Path;

use scandesk_core::error::{Result, ScanDeskError};
use scandesk_core::{Device, PrintSettings, PrinterDetails};

use crate::traits::*;

/// No-op bridge returned on platforms without WIA and the Windows spooler.
pub struct StubBridge;

impl PlatformBridge for StubBridge {
    fn platform_name(&self) -> &str {
        "Unsupported platform (stub)"
    }
}

impl ScannerBackend for StubBridge {
    fn enumerate_scanners(&self) -> Result<Vec<Device>> {
        Ok(Vec::new())
    }

    fn scanner_properties(&self, _device_id: &str) -> Result<Vec<(String, String)>> {
        Err(ScanDeskError::PlatformUnavailable)
    }

    fn acquire(&self, _device_id: &str, _settings: &[ScanSetting], _destination: &Path) -> Result<()> {
        tracing::warn!("ScannerBackend::acquire called on stub bridge");
        Err(ScanDeskError::PlatformUnavailable)
    }
}

impl Spooler for StubBridge {
    fn enumerate_printers(&self) -> Result<Vec<PrinterDetails>> {
        Ok(Vec::new())
    }

    fn default_printer(&self) -> Result<Option<String>> {
        Ok(None)
    }

    fn set_default_printer(&self, _name: &str) -> Result<()> {
        Err(ScanDeskError::PlatformUnavailable)
    }

    fn write_raw(&self, _printer: &str, _document_name: &str, _data: &[u8]) -> Result<()> {
        tracing::warn!("Spooler::write_raw called on stub bridge");
        Err(ScanDeskError::PlatformUnavailable)
    }

    fn apply_settings(&self, _printer: &str, _settings: &PrintSettings) -> Result<()> {
        Err(ScanDeskError::PlatformUnavailable)
    }
}

impl DesktopShell for StubBridge {
    fn shell_execute(&self, _verb: &str, _file: &Path, _parameters: Option<&str>) -> Result<()> {
        tracing::warn!("DesktopShell::shell_execute called on stub bridge");
        Err(ScanDeskError::PlatformUnavailable)
    }
}
