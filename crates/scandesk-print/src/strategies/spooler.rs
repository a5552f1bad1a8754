// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Raw spooler writes.

use tracing::warn;

use scandesk_core::error::Result;
use scandesk_core::{IMAGE_EXTENSIONS, PLAIN_TEXT_EXTENSIONS};

use super::document_name;
use super::image::image_to_pdf;
use crate::strategy::{Attempt, ChainContext, PrintStrategy, StrategyOutcome, outcome_of};

/// Plain text, decoded leniently and sent as UTF-8.
pub struct RawSpoolerWrite;

impl PrintStrategy for RawSpoolerWrite {
    fn name(&self) -> &'static str {
        "RawSpoolerWrite"
    }

    fn extensions(&self) -> Option<&'static [&'static str]> {
        Some(PLAIN_TEXT_EXTENSIONS)
    }

    fn execute(&self, attempt: &Attempt<'_>, ctx: &ChainContext<'_>) -> StrategyOutcome {
        outcome_of(write_text(attempt, ctx))
    }
}

fn write_text(attempt: &Attempt<'_>, ctx: &ChainContext<'_>) -> Result<String> {
    let bytes = std::fs::read(attempt.path)?;
    let text = String::from_utf8_lossy(&bytes);
    ctx.env
        .bridge
        .write_raw(attempt.printer, &document_name(attempt.path), text.as_bytes())?;
    Ok(format!("{} bytes of text", text.len()))
}

/// Apply the requested device options, then send the file bytes as-is.
/// Images become a PDF first.
pub struct DirectSpoolerPrint;

impl PrintStrategy for DirectSpoolerPrint {
    fn name(&self) -> &'static str {
        "DirectSpoolerPrint"
    }

    fn extensions(&self) -> Option<&'static [&'static str]> {
        None
    }

    fn execute(&self, attempt: &Attempt<'_>, ctx: &ChainContext<'_>) -> StrategyOutcome {
        outcome_of(write_direct(attempt, ctx))
    }
}

fn write_direct(attempt: &Attempt<'_>, ctx: &ChainContext<'_>) -> Result<String> {
    let bridge = ctx.env.bridge.as_ref();
    if !attempt.settings.is_empty() {
        if let Err(err) = bridge.apply_settings(attempt.printer, attempt.settings) {
            warn!(printer = attempt.printer, error = %err, "Could not apply print options; using printer defaults");
        }
    }

    let staging;
    let source = if IMAGE_EXTENSIONS.contains(&attempt.extension.as_str()) {
        staging = ctx.env.temp_builder().tempdir()?;
        image_to_pdf(attempt, staging.path())?
    } else {
        attempt.path.to_path_buf()
    };

    let data = std::fs::read(&source)?;
    bridge.write_raw(attempt.printer, &document_name(&source), &data)?;
    Ok(format!("{} bytes sent to the spooler", data.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::ChainRun;
    use crate::test_support::{MockBridge, ScriptedRunner, test_env, write_png};
    use scandesk_core::{Orientation, PrintSettings};
    use std::sync::Arc;

    fn run_one(
        bridge: Arc<MockBridge>,
        strategy: Box<dyn PrintStrategy>,
        file: &std::path::Path,
        settings: &PrintSettings,
        dir: &std::path::Path,
    ) -> ChainRun {
        let env = test_env(bridge, Arc::new(ScriptedRunner::succeeding()), dir);
        let chain = crate::strategies::silent_chain();
        let ctx = ChainContext::new(&env, &chain, "Lab", settings, true, true);
        ctx.run(&[strategy], file, 0)
    }

    #[test]
    fn text_is_decoded_leniently() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("notes.log");
        std::fs::write(&file, b"caf\xe9\n").unwrap();
        let bridge = Arc::new(MockBridge::default());

        let run = run_one(bridge.clone(), Box::new(RawSpoolerWrite), &file, &PrintSettings::default(), dir.path());
        assert!(matches!(run, ChainRun::Printed { .. }));
        let writes = bridge.raw_writes();
        assert_eq!(writes[0].1, "notes.log");
        // 'caf' + U+FFFD (3 bytes) + newline
        assert_eq!(writes[0].2, 3 + 3 + 1);
    }

    #[test]
    fn direct_print_applies_only_present_options() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("report.xps");
        std::fs::write(&file, b"PK-xps").unwrap();
        let bridge = Arc::new(MockBridge::default());
        let settings = PrintSettings {
            orientation: Some(Orientation::Landscape),
            ..PrintSettings::default()
        };

        let run = run_one(bridge.clone(), Box::new(DirectSpoolerPrint), &file, &settings, dir.path());
        assert!(matches!(run, ChainRun::Printed { .. }));
        assert_eq!(bridge.applied_settings(), vec![settings]);
        assert_eq!(bridge.raw_writes()[0].2, 6);
    }

    #[test]
    fn direct_print_without_options_leaves_device_alone() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.txt");
        std::fs::write(&file, b"x").unwrap();
        let bridge = Arc::new(MockBridge::default());
        run_one(bridge.clone(), Box::new(DirectSpoolerPrint), &file, &PrintSettings::default(), dir.path());
        assert!(bridge.applied_settings().is_empty());
    }

    #[test]
    fn direct_print_sends_images_as_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let image = write_png(dir.path(), "logo.png");
        let bridge = Arc::new(MockBridge::default());
        run_one(bridge.clone(), Box::new(DirectSpoolerPrint), &image, &PrintSettings::default(), dir.path());
        let writes = bridge.raw_writes();
        assert_eq!(writes[0].1, "logo.pdf");
        assert!(bridge.raw_payloads()[0].starts_with(b"%PDF"));
    }
}
