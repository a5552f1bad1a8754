// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Windows platform bridge.
//
// Printers go through the Win32 spooler API, shell verbs through
// ShellExecuteW, and scanners through WIA automation in PowerShell.

#![cfg(windows)]

mod shell;
mod spooler;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use scandesk_core::error::Result;
use scandesk_core::{Device, PrintSettings, PrinterDetails};

use crate::process::ProcessRunner;
use crate::traits::*;
use crate::wia::WiaScanner;

pub struct WindowsBridge {
    scanner: WiaScanner,
}

impl WindowsBridge {
    pub fn new(runner: Arc<dyn ProcessRunner>, powershell: &Path, scanner_timeout: Duration) -> Self {
        Self {
            scanner: WiaScanner::new(runner, powershell, scanner_timeout),
        }
    }
}

impl PlatformBridge for WindowsBridge {
    fn platform_name(&self) -> &str {
        "Windows"
    }
}

impl ScannerBackend for WindowsBridge {
    fn enumerate_scanners(&self) -> Result<Vec<Device>> {
        self.scanner.enumerate_scanners()
    }

    fn scanner_properties(&self, device_id: &str) -> Result<Vec<(String, String)>> {
        self.scanner.scanner_properties(device_id)
    }

    fn acquire(&self, device_id: &str, settings: &[ScanSetting], destination: &Path) -> Result<()> {
        self.scanner.acquire(device_id, settings, destination)
    }
}

impl Spooler for WindowsBridge {
    fn enumerate_printers(&self) -> Result<Vec<PrinterDetails>> {
        spooler::enumerate_printers()
    }

    fn default_printer(&self) -> Result<Option<String>> {
        spooler::default_printer()
    }

    fn set_default_printer(&self, name: &str) -> Result<()> {
        spooler::set_default_printer(name)
    }

    fn write_raw(&self, printer: &str, document_name: &str, data: &[u8]) -> Result<()> {
        spooler::write_raw(printer, document_name, data)
    }

    fn apply_settings(&self, printer: &str, settings: &PrintSettings) -> Result<()> {
        spooler::apply_settings(printer, settings)
    }
}

impl DesktopShell for WindowsBridge {
    fn shell_execute(&self, verb: &str, file: &Path, parameters: Option<&str>) -> Result<()> {
        shell::shell_execute(verb, file, parameters)
    }
}
