// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Central service layer. Builds the platform bridge and every backend
// component once at startup from the loaded configuration.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use scandesk_bridge::{PlatformBridge, ProcessRunner, SystemProcessRunner, platform_bridge};
use scandesk_core::AppConfig;
use scandesk_core::error::Result;
use scandesk_core::{CaptureRequest, CapturedDocument, ColorMode, OutputFormat};
use scandesk_device::{CaptureAdapter, DeviceInventory};
use scandesk_document::{FormatConverter, TextExtractor};
use scandesk_print::{DownloadConsent, PrintEnvironment, PrintResolver};

use super::data_dir;
use crate::prompt::ConsoleInput;

/// Backend components shared by the menu and the single-shot commands.
pub struct AppServices {
    config: AppConfig,
    config_path: PathBuf,
    inventory: DeviceInventory,
    capture: CaptureAdapter,
    converter: FormatConverter,
    resolver: PrintResolver,
    extractor: TextExtractor,
}

impl AppServices {
    /// Load configuration and wire up the platform backends.
    ///
    /// `input` answers the viewer download question; the menu reads from
    /// the same handle.
    pub fn init(input: ConsoleInput) -> Result<Self> {
        let config_path = data_dir::config_path();
        let config = AppConfig::load_or_default(&config_path);
        info!(config = %config_path.display(), scan_dir = %config.scan_dir.display(), "Initialising services");

        let runner: Arc<dyn ProcessRunner> = Arc::new(SystemProcessRunner::new()?);
        let bridge = platform_bridge(
            runner.clone(),
            Duration::from_secs(config.timeouts.scanner_secs),
        );
        Self::assemble(config, config_path, bridge, runner, input)
    }

    pub(crate) fn assemble(
        config: AppConfig,
        config_path: PathBuf,
        bridge: Arc<dyn PlatformBridge>,
        runner: Arc<dyn ProcessRunner>,
        input: ConsoleInput,
    ) -> Result<Self> {
        info!(platform = bridge.platform_name(), "Platform bridge ready");

        let env = PrintEnvironment::from_config(
            bridge.clone(),
            runner,
            Arc::new(ConsoleConsent::new(input)),
            &config,
        )?;

        Ok(Self {
            inventory: DeviceInventory::new(bridge.clone()),
            capture: CaptureAdapter::from_config(bridge, &config),
            converter: FormatConverter::new(),
            resolver: PrintResolver::new(env),
            extractor: TextExtractor::from_config(&config.extraction),
            config,
            config_path,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn inventory(&self) -> &DeviceInventory {
        &self.inventory
    }

    pub fn capture(&self) -> &CaptureAdapter {
        &self.capture
    }

    pub fn converter(&self) -> &FormatConverter {
        &self.converter
    }

    pub fn resolver(&self) -> &PrintResolver {
        &self.resolver
    }

    pub fn extractor(&self) -> &TextExtractor {
        &self.extractor
    }

    /// Capture request from the configured defaults.
    pub fn default_request(&self, format: OutputFormat) -> CaptureRequest {
        default_request(&self.config, format)
    }

    /// One page from the first scanner with the configured defaults.
    pub fn quick_scan(&self, format: OutputFormat) -> Result<CapturedDocument> {
        self.capture.capture(&self.default_request(format))
    }
}

fn default_request(config: &AppConfig, format: OutputFormat) -> CaptureRequest {
    CaptureRequest {
        resolution_dpi: config.default_resolution_dpi,
        color_mode: ColorMode::Color,
        output_format: format,
        page_size: config.default_paper_size,
        ..CaptureRequest::default()
    }
}

/// Asks on the console before a download starts.
pub struct ConsoleConsent {
    input: ConsoleInput,
}

impl ConsoleConsent {
    pub fn new(input: ConsoleInput) -> Self {
        Self { input }
    }
}

impl DownloadConsent for ConsoleConsent {
    fn confirm(&self, question: &str) -> bool {
        ask_consent(&self.input, std::io::stdout(), question)
    }
}

fn ask_consent(input: &ConsoleInput, mut output: impl Write, question: &str) -> bool {
    let _ = write!(output, "{question} [y/N] ");
    let _ = output.flush();
    let mut answer = String::new();
    if input.read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
