// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Fakes shared by the print unit tests: a recording bridge, a scripted
// process runner and a page rasterizer that needs no external tools.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use image::{DynamicImage, RgbImage};

use scandesk_bridge::{
    DesktopShell, PlatformBridge, ProcessRunner, ScanSetting, ScannerBackend, Spooler, ToolCommand,
    ToolOutput,
};
use scandesk_core::config::{ToolSearchPaths, ToolTimeouts, ViewerDownload};
use scandesk_core::error::{Result, ScanDeskError};
use scandesk_core::{Device, DeviceKind, PrintSettings, PrinterDetails};

use crate::env::PrintEnvironment;
use crate::rasterize::PageConverter;
use crate::tools::ToolLocator;
use crate::viewer::{DenyDownload, ViewerFetcher, ViewerProvisioner};

// -- Bridge -------------------------------------------------------------------

#[derive(Default)]
pub(crate) struct MockBridge {
    printers: Vec<PrinterDetails>,
    default: Mutex<Option<String>>,
    fail_raw: bool,
    fail_shell: bool,
    default_changes: Mutex<Vec<String>>,
    raw: Mutex<Vec<(String, String, Vec<u8>)>>,
    applied: Mutex<Vec<PrintSettings>>,
    shell: Mutex<Vec<PathBuf>>,
}

impl MockBridge {
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
            default: Mutex::new(default.map(str::to_string)),
            ..Self::default()
        }
    }

    pub(crate) fn failing_raw_writes(mut self) -> Self {
        self.fail_raw = true;
        self
    }

    pub(crate) fn failing_shell(mut self) -> Self {
        self.fail_shell = true;
        self
    }

    pub(crate) fn current_default(&self) -> Option<String> {
        self.default.lock().unwrap().clone()
    }

    pub(crate) fn default_changes(&self) -> Vec<String> {
        self.default_changes.lock().unwrap().clone()
    }

    /// (printer, document name, byte count) per raw write.
    pub(crate) fn raw_writes(&self) -> Vec<(String, String, usize)> {
        self.raw
            .lock()
            .unwrap()
            .iter()
            .map(|(printer, doc, data)| (printer.clone(), doc.clone(), data.len()))
            .collect()
    }

    pub(crate) fn raw_payloads(&self) -> Vec<Vec<u8>> {
        self.raw.lock().unwrap().iter().map(|(_, _, data)| data.clone()).collect()
    }

    pub(crate) fn applied_settings(&self) -> Vec<PrintSettings> {
        self.applied.lock().unwrap().clone()
    }

    pub(crate) fn shell_calls(&self) -> Vec<PathBuf> {
        self.shell.lock().unwrap().clone()
    }
}

impl PlatformBridge for MockBridge {
    fn platform_name(&self) -> &str {
        "mock"
    }
}

impl ScannerBackend for MockBridge {
    fn enumerate_scanners(&self) -> Result<Vec<Device>> {
        Ok(Vec::new())
    }

    fn scanner_properties(&self, _device_id: &str) -> Result<Vec<(String, String)>> {
        Err(ScanDeskError::NoDeviceFound)
    }

    fn acquire(&self, _device_id: &str, _settings: &[ScanSetting], _destination: &Path) -> Result<()> {
        Err(ScanDeskError::NoDeviceFound)
    }
}

impl Spooler for MockBridge {
    fn enumerate_printers(&self) -> Result<Vec<PrinterDetails>> {
        Ok(self.printers.clone())
    }

    fn default_printer(&self) -> Result<Option<String>> {
        Ok(self.current_default())
    }

    fn set_default_printer(&self, name: &str) -> Result<()> {
        self.default_changes.lock().unwrap().push(name.to_string());
        *self.default.lock().unwrap() = Some(name.to_string());
        Ok(())
    }

    fn write_raw(&self, printer: &str, document_name: &str, data: &[u8]) -> Result<()> {
        if self.fail_raw {
            return Err(ScanDeskError::Spooler("StartDocPrinter failed (error 1801)".into()));
        }
        self.raw
            .lock()
            .unwrap()
            .push((printer.to_string(), document_name.to_string(), data.to_vec()));
        Ok(())
    }

    fn apply_settings(&self, _printer: &str, settings: &PrintSettings) -> Result<()> {
        self.applied.lock().unwrap().push(settings.clone());
        Ok(())
    }
}

impl DesktopShell for MockBridge {
    fn shell_execute(&self, _verb: &str, file: &Path, _parameters: Option<&str>) -> Result<()> {
        if self.fail_shell {
            return Err(ScanDeskError::ExternalTool("no application is associated with this file".into()));
        }
        self.shell.lock().unwrap().push(file.to_path_buf());
        Ok(())
    }
}

// -- Processes ----------------------------------------------------------------

/// Records every command and answers with a fixed exit code.
pub(crate) struct ScriptedRunner {
    status: i32,
    calls: Mutex<Vec<ToolCommand>>,
}

impl ScriptedRunner {
    pub(crate) fn succeeding() -> Self {
        Self::exiting_with(0)
    }

    pub(crate) fn exiting_with(status: i32) -> Self {
        Self {
            status,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn calls(&self) -> Vec<ToolCommand> {
        self.calls.lock().unwrap().clone()
    }
}

impl ProcessRunner for ScriptedRunner {
    fn run(&self, command: &ToolCommand) -> Result<ToolOutput> {
        self.calls.lock().unwrap().push(command.clone());
        Ok(ToolOutput {
            status: Some(self.status),
            stderr: if self.status == 0 { String::new() } else { "scripted failure".into() },
            ..ToolOutput::default()
        })
    }
}

// -- Pages --------------------------------------------------------------------

/// Writes `n` small PNG pages, or reports no rasterizer when `None`.
pub(crate) struct PageStub {
    pages: Option<usize>,
}

impl PageStub {
    pub(crate) fn pages(n: usize) -> Self {
        Self { pages: Some(n) }
    }

    pub(crate) fn missing() -> Self {
        Self { pages: None }
    }
}

impl PageConverter for PageStub {
    fn rasterize(&self, _pdf: &Path, out_dir: &Path, _dpi: u32) -> Result<Vec<PathBuf>> {
        let count = self
            .pages
            .ok_or_else(|| ScanDeskError::ToolMissing("Ghostscript or pdftoppm".into()))?;
        Ok((1..=count)
            .map(|n| write_png(out_dir, &format!("page_{n:03}.png")))
            .collect())
    }
}

struct NoFetch;

impl ViewerFetcher for NoFetch {
    fn fetch(&self, url: &str, _destination: &Path) -> Result<()> {
        Err(ScanDeskError::Download(format!("{url}: offline")))
    }
}

// -- Environment --------------------------------------------------------------

fn no_tools() -> ToolSearchPaths {
    ToolSearchPaths {
        photo_viewer: Vec::new(),
        ghostscript: Vec::new(),
        pdftoppm: Vec::new(),
        viewer: Vec::new(),
        pdf_reader: Vec::new(),
        browser: Vec::new(),
        powershell: Vec::new(),
        console_script_host: Vec::new(),
        gui_script_host: Vec::new(),
    }
}

/// Locator that only knows what `configure` adds.
pub(crate) fn tools_with(configure: impl FnOnce(&mut ToolSearchPaths)) -> ToolLocator {
    let mut search = no_tools();
    configure(&mut search);
    ToolLocator::without_path_lookup(search)
}

/// Environment with no tools, no rasterizer and downloads refused.
pub(crate) fn test_env(
    bridge: Arc<MockBridge>,
    runner: Arc<ScriptedRunner>,
    dir: &Path,
) -> PrintEnvironment {
    let download = ViewerDownload {
        urls: vec!["https://example.invalid/SumatraPDF.exe".into()],
        install_path: Some(dir.join("viewer").join("SumatraPDF.exe")),
    };
    PrintEnvironment {
        bridge,
        runner,
        tools: tools_with(|_| {}),
        pages: Arc::new(PageStub::missing()),
        viewer: ViewerProvisioner::new(Arc::new(NoFetch), Arc::new(DenyDownload), &download),
        timeouts: ToolTimeouts::default(),
        temp_prefix: "scandesk_test_".into(),
        viewer_defaults: "color,duplexshort".into(),
        preferred_printer: None,
    }
}

/// Save a 4x3 RGB PNG and return its path.
pub(crate) fn write_png(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 3, image::Rgb([10, 120, 240])))
        .save_with_format(&path, image::ImageFormat::Png)
        .unwrap();
    path
}
