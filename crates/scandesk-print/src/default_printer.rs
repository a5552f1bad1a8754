// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Temporary default-printer switching.
//
// Some print paths only ever print to the system default printer. The guard
// makes the target printer the default for its lifetime and puts the original
// back when dropped, whichever way the strategy exits.

use tracing::{debug, warn};

use scandesk_bridge::PlatformBridge;
use scandesk_core::error::Result;

pub struct DefaultPrinterGuard<'a> {
    bridge: &'a dyn PlatformBridge,
    original: Option<String>,
}

impl<'a> DefaultPrinterGuard<'a> {
    /// Make `printer` the default. Nothing changes when it already is.
    pub fn switch(bridge: &'a dyn PlatformBridge, printer: &str) -> Result<Self> {
        let current = bridge.default_printer()?;
        if current.as_deref() == Some(printer) {
            return Ok(Self {
                bridge,
                original: None,
            });
        }
        bridge.set_default_printer(printer)?;
        debug!(printer, previous = ?current, "Default printer switched");
        Ok(Self {
            bridge,
            original: current,
        })
    }
}

impl Drop for DefaultPrinterGuard<'_> {
    fn drop(&mut self) {
        if let Some(original) = self.original.take() {
            match self.bridge.set_default_printer(&original) {
                Ok(()) => debug!(printer = %original, "Default printer restored"),
                Err(err) => warn!(printer = %original, error = %err, "Could not restore default printer"),
            }
        }
    }
}
