// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Everything a print strategy may touch: the platform bridge, the process
// runner, tool discovery, the page rasterizer and viewer provisioning.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use scandesk_bridge::{PlatformBridge, ProcessRunner};
use scandesk_core::AppConfig;
use scandesk_core::config::ToolTimeouts;
use scandesk_core::error::Result;

use crate::rasterize::{PageConverter, ToolRasterizer};
use crate::tools::{Tool, ToolLocator};
use crate::viewer::{DownloadConsent, HttpViewerFetcher, ViewerProvisioner};

pub struct PrintEnvironment {
    pub bridge: Arc<dyn PlatformBridge>,
    pub runner: Arc<dyn ProcessRunner>,
    pub tools: ToolLocator,
    pub pages: Arc<dyn PageConverter>,
    pub viewer: ViewerProvisioner,
    pub timeouts: ToolTimeouts,
    pub temp_prefix: String,
    /// Viewer `-print-settings` used when a job carries no options.
    pub viewer_defaults: String,
    /// Printer the viewer entry point prefers when it is installed.
    pub preferred_printer: Option<String>,
}

impl PrintEnvironment {
    /// Production wiring from configuration.
    pub fn from_config(
        bridge: Arc<dyn PlatformBridge>,
        runner: Arc<dyn ProcessRunner>,
        consent: Arc<dyn DownloadConsent>,
        config: &AppConfig,
    ) -> Result<Self> {
        let tools = ToolLocator::new(config.tools.clone());
        let timeouts = config.timeouts;
        let pages = Arc::new(ToolRasterizer::new(
            runner.clone(),
            tools.clone(),
            Duration::from_secs(timeouts.rasterizer_secs),
        ));
        let fetcher = Arc::new(HttpViewerFetcher::new(Duration::from_secs(
            timeouts.download_secs,
        ))?);
        Ok(Self {
            bridge,
            runner,
            tools,
            pages,
            viewer: ViewerProvisioner::new(fetcher, consent, &config.viewer_download),
            timeouts,
            temp_prefix: config.temp_prefix.clone(),
            viewer_defaults: config.viewer_print_settings.clone(),
            preferred_printer: config.preferred_printer.clone(),
        })
    }

    /// Installed viewer: configured locations and `PATH`, then the download
    /// destination.
    pub fn find_viewer(&self) -> Option<PathBuf> {
        self.tools
            .locate(Tool::Viewer)
            .or_else(|| self.viewer.installed())
    }

    pub fn temp_builder(&self) -> tempfile::Builder<'_, 'static> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(&self.temp_prefix);
        builder
    }
}
