// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Print resolution: pick the printer, run the no-dialog cascade, then the
// dialog chain, and report which method printed the file.

use std::path::Path;

use tracing::{info, instrument, warn};

use scandesk_core::error::{Result, ScanDeskError};
use scandesk_core::{PrintJob, PrintSettings, VIEWER_EXTENSIONS, extension_of};

use crate::env::PrintEnvironment;
use crate::strategies::{dialog_chain, silent_chain};
use crate::strategy::{AttemptRecord, ChainContext, ChainRun, PrintStrategy};
use crate::tools::Tool;
use crate::viewer::{viewer_command, viewer_settings};

/// A file that was printed, and how.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintReport {
    pub strategy: &'static str,
    pub printer: String,
    pub detail: String,
    /// Every strategy evaluated on the way, in order.
    pub attempts: Vec<AttemptRecord>,
}

impl PrintReport {
    pub fn status_line(&self) -> String {
        format!("Printed on {} via {} ({})", self.printer, self.strategy, self.detail)
    }
}

pub struct PrintResolver {
    env: PrintEnvironment,
    silent: Vec<Box<dyn PrintStrategy>>,
    dialog: Vec<Box<dyn PrintStrategy>>,
}

impl PrintResolver {
    /// Resolver with the standard cascade and dialog chain.
    pub fn new(env: PrintEnvironment) -> Self {
        Self::with_chains(env, silent_chain(), dialog_chain())
    }

    pub fn with_chains(
        env: PrintEnvironment,
        silent: Vec<Box<dyn PrintStrategy>>,
        dialog: Vec<Box<dyn PrintStrategy>>,
    ) -> Self {
        Self {
            env,
            silent,
            dialog,
        }
    }

    pub fn env(&self) -> &PrintEnvironment {
        &self.env
    }

    /// Print `job.file_path`.
    ///
    /// With `ultra_silent` the no-dialog cascade runs first; the dialog chain
    /// is always the last resort.
    #[instrument(skip(self, job), fields(file = %job.file_path.display()))]
    pub fn print_document(&self, job: &PrintJob) -> Result<PrintReport> {
        let path = job.file_path.as_path();
        if !path.is_file() {
            return Err(ScanDeskError::FileNotFound(path.to_path_buf()));
        }
        let printer = self.resolve_printer(job.printer_name.as_deref())?;
        info!(printer = %printer, ultra_silent = job.ultra_silent, "Printing");

        let ctx = ChainContext::new(
            &self.env,
            &self.silent,
            &printer,
            &job.settings,
            job.silent,
            job.use_shell_fallback,
        );

        let mut executed = 0;
        if job.ultra_silent {
            match ctx.run(&self.silent, path, 0) {
                ChainRun::Printed { strategy, detail } => {
                    return Ok(report(ctx, strategy, &printer, detail));
                }
                ChainRun::Exhausted { executed: n } => {
                    warn!(executed = n, "No silent method printed; trying the dialog chain");
                    executed += n;
                }
            }
        }

        match ctx.run(&self.dialog, path, 0) {
            ChainRun::Printed { strategy, detail } => Ok(report(ctx, strategy, &printer, detail)),
            ChainRun::Exhausted { executed: n } => Err(exhausted(path, executed + n)),
        }
    }

    /// Print with every option at its default, no-dialog paths first.
    pub fn print_silently(&self, path: &Path, printer: Option<&str>) -> Result<PrintReport> {
        let mut job = PrintJob::new(path);
        job.printer_name = printer.map(str::to_string);
        self.print_document(&job)
    }

    /// Print through the third-party viewer only, downloading it with
    /// consent when missing. `settings` is a raw `-print-settings` value.
    #[instrument(skip(self))]
    pub fn print_with_viewer(
        &self,
        path: &Path,
        printer: Option<&str>,
        settings: Option<&str>,
    ) -> Result<PrintReport> {
        if !path.is_file() {
            return Err(ScanDeskError::FileNotFound(path.to_path_buf()));
        }
        let extension = extension_of(path);
        if !VIEWER_EXTENSIONS.contains(&extension.as_str()) {
            return Err(ScanDeskError::NoApplicableStrategy(path.display().to_string()));
        }

        let printer = match self.preferred_installed() {
            Some(preferred) => preferred,
            None => self.resolve_printer(printer)?,
        };
        let viewer = self
            .env
            .find_viewer()
            .or_else(|| self.env.viewer.provision_with_consent())
            .ok_or_else(|| ScanDeskError::ToolMissing(Tool::Viewer.label().into()))?;
        let settings = settings
            .map(str::to_string)
            .unwrap_or_else(|| viewer_settings(&PrintSettings::default(), &self.env.viewer_defaults));

        let command = viewer_command(
            &viewer,
            &printer,
            &settings,
            path,
            std::time::Duration::from_secs(self.env.timeouts.viewer_secs),
        );
        self.env.runner.run(&command)?.into_result(&command.display_name())?;
        info!(printer = %printer, "Printed with the viewer");
        Ok(PrintReport {
            strategy: "ThirdPartyViewerPrint",
            printer,
            detail: format!("viewer -print-settings {settings}"),
            attempts: Vec::new(),
        })
    }

    /// Download the viewer now, regardless of whether one is installed.
    pub fn provision_viewer(&self) -> Result<std::path::PathBuf> {
        self.env.viewer.provision()
    }

    /// Explicit printers must exist when the spooler lists any; otherwise
    /// the system default is used.
    fn resolve_printer(&self, requested: Option<&str>) -> Result<String> {
        let bridge = self.env.bridge.as_ref();
        if let Some(name) = requested {
            let installed = match bridge.enumerate_printers() {
                Ok(printers) => printers,
                Err(err) => {
                    warn!(error = %err, "Could not list printers; trusting the requested name");
                    Vec::new()
                }
            };
            if installed.is_empty() || installed.iter().any(|p| p.device.display_name == name) {
                return Ok(name.to_string());
            }
            return Err(ScanDeskError::PrinterNotFound(name.to_string()));
        }
        bridge
            .default_printer()?
            .ok_or_else(|| ScanDeskError::PrinterNotFound("no default printer".into()))
    }

    fn preferred_installed(&self) -> Option<String> {
        let preferred = self.env.preferred_printer.as_deref()?;
        let printers = self.env.bridge.enumerate_printers().ok()?;
        printers
            .iter()
            .any(|p| p.device.display_name == preferred)
            .then(|| preferred.to_string())
    }
}

fn report(ctx: ChainContext<'_>, strategy: &'static str, printer: &str, detail: String) -> PrintReport {
    PrintReport {
        strategy,
        printer: printer.to_string(),
        detail,
        attempts: ctx.into_records(),
    }
}

fn exhausted(path: &Path, executed: usize) -> ScanDeskError {
    if executed == 0 {
        ScanDeskError::NoApplicableStrategy(path.display().to_string())
    } else {
        ScanDeskError::AllStrategiesFailed { attempted: executed }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MockBridge, ScriptedRunner, test_env, tools_with, write_png};
    use crate::strategy::StrategyOutcome;
    use std::sync::Arc;

    fn pdf(dir: &Path) -> std::path::PathBuf {
        let path = dir.join("invoice.pdf");
        std::fs::write(&path, b"%PDF-1.7\n%%EOF\n").unwrap();
        path
    }

    fn touch(dir: &Path, name: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, b"").unwrap();
        path
    }

    #[test]
    fn missing_file_runs_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(ScriptedRunner::succeeding());
        let bridge = Arc::new(MockBridge::with_printers(&["Office"], Some("Office")));
        let resolver = PrintResolver::new(test_env(bridge, runner.clone(), dir.path()));

        let err = resolver.print_document(&PrintJob::new(dir.path().join("gone.pdf"))).unwrap_err();
        assert!(matches!(err, ScanDeskError::FileNotFound(_)));
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn unknown_printer_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let file = pdf(dir.path());
        let bridge = Arc::new(MockBridge::with_printers(&["Office"], Some("Office")));
        let resolver = PrintResolver::new(test_env(bridge, Arc::new(ScriptedRunner::succeeding()), dir.path()));

        let err = resolver.print_document(&PrintJob::new(&file).with_printer("Basement")).unwrap_err();
        assert!(matches!(err, ScanDeskError::PrinterNotFound(name) if name == "Basement"));
    }

    #[test]
    fn no_default_printer_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let file = pdf(dir.path());
        let resolver = PrintResolver::new(test_env(
            Arc::new(MockBridge::default()),
            Arc::new(ScriptedRunner::succeeding()),
            dir.path(),
        ));
        assert!(matches!(
            resolver.print_silently(&file, None),
            Err(ScanDeskError::PrinterNotFound(_))
        ));
    }

    #[test]
    fn failed_rasterizer_falls_through_to_the_viewer() {
        let dir = tempfile::tempdir().unwrap();
        let file = pdf(dir.path());
        let gs = touch(dir.path(), "gswin64c.exe");
        let viewer = touch(dir.path(), "SumatraPDF.exe");
        let runner = Arc::new(ScriptedRunner::exiting_with(1));
        let bridge = Arc::new(MockBridge::with_printers(&["Office"], Some("Office")));
        let mut env = test_env(bridge, runner.clone(), dir.path());
        env.tools = tools_with(|paths| {
            paths.ghostscript = vec![gs.display().to_string()];
            paths.viewer = vec![viewer.display().to_string()];
        });
        let resolver = PrintResolver::new(env);

        // Every tool exits 1, so both fail and the shell verb prints.
        let report = resolver.print_document(&PrintJob::new(&file)).unwrap();
        assert_eq!(report.strategy, "ShellPrintVerb");
        assert_eq!(report.printer, "Office");
        let programs: Vec<_> = runner.calls().iter().map(|c| c.program.clone()).collect();
        assert_eq!(programs, vec![gs, viewer]);
        let failed: Vec<_> = report
            .attempts
            .iter()
            .filter(|a| matches!(a.outcome, StrategyOutcome::Failed(_)))
            .map(|a| a.strategy)
            .collect();
        assert_eq!(failed, ["VendorRasterizerPrint", "ThirdPartyViewerPrint"]);
    }

    #[test]
    fn default_printer_is_restored_after_printing() {
        let dir = tempfile::tempdir().unwrap();
        let file = pdf(dir.path());
        let bridge = Arc::new(MockBridge::with_printers(&["Office", "Lab"], Some("Office")));
        let resolver = PrintResolver::new(test_env(bridge.clone(), Arc::new(ScriptedRunner::succeeding()), dir.path()));

        let report = resolver.print_document(&PrintJob::new(&file).with_printer("Lab")).unwrap();
        assert_eq!(report.strategy, "ShellPrintVerb");
        assert_eq!(bridge.default_changes(), vec!["Lab", "Office"]);
        assert_eq!(bridge.current_default().as_deref(), Some("Office"));
    }

    #[test]
    fn nothing_applicable() {
        let dir = tempfile::tempdir().unwrap();
        let file = touch(dir.path(), "drawing.dwg");
        let bridge = Arc::new(MockBridge::with_printers(&["Office"], Some("Office")));
        let resolver = PrintResolver::with_chains(
            test_env(bridge, Arc::new(ScriptedRunner::succeeding()), dir.path()),
            silent_chain(),
            Vec::new(),
        );
        assert!(matches!(
            resolver.print_document(&PrintJob::new(&file)),
            Err(ScanDeskError::NoApplicableStrategy(_))
        ));
    }

    #[test]
    fn everything_failing_counts_attempts() {
        let dir = tempfile::tempdir().unwrap();
        let file = touch(dir.path(), "notes.txt");
        let bridge = Arc::new(
            MockBridge::with_printers(&["Office"], Some("Office"))
                .failing_raw_writes()
                .failing_shell(),
        );
        let resolver = PrintResolver::new(test_env(bridge, Arc::new(ScriptedRunner::succeeding()), dir.path()));

        // RawSpoolerWrite, then ShellPrintVerb and DirectSpoolerPrint.
        assert!(matches!(
            resolver.print_document(&PrintJob::new(&file)),
            Err(ScanDeskError::AllStrategiesFailed { attempted: 3 })
        ));
    }

    #[test]
    fn dialog_only_when_not_ultra_silent() {
        let dir = tempfile::tempdir().unwrap();
        let file = touch(dir.path(), "notes.txt");
        let bridge = Arc::new(MockBridge::with_printers(&["Office"], Some("Office")));
        let resolver = PrintResolver::new(test_env(bridge.clone(), Arc::new(ScriptedRunner::succeeding()), dir.path()));

        let mut job = PrintJob::new(&file);
        job.ultra_silent = false;
        let report = resolver.print_document(&job).unwrap();
        assert_eq!(report.strategy, "ShellPrintVerb");
        assert!(report.attempts.iter().all(|a| a.strategy != "RawSpoolerWrite"));
        assert!(bridge.raw_writes().is_empty());
    }

    #[test]
    fn images_print_through_a_converted_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let image = write_png(dir.path(), "receipt.png");
        let bridge = Arc::new(MockBridge::with_printers(&["Office"], Some("Office")));
        let resolver = PrintResolver::new(test_env(bridge.clone(), Arc::new(ScriptedRunner::succeeding()), dir.path()));

        let report = resolver.print_document(&PrintJob::new(&image)).unwrap();
        assert_eq!(report.strategy, "ImageToPdfThenRetry");
        let converted = &bridge.shell_calls()[0];
        assert_eq!(converted.extension().unwrap(), "pdf");
        assert!(!converted.exists(), "temporary PDF must be removed");
        assert!(report.attempts.iter().any(|a| a.strategy == "ShellPrintVerb" && a.depth == 1));
    }

    #[test]
    fn viewer_entry_prefers_configured_printer() {
        let dir = tempfile::tempdir().unwrap();
        let file = pdf(dir.path());
        let viewer = touch(dir.path(), "SumatraPDF.exe");
        let runner = Arc::new(ScriptedRunner::succeeding());
        let bridge = Arc::new(MockBridge::with_printers(&["Office", "Front Desk"], Some("Office")));
        let mut env = test_env(bridge, runner.clone(), dir.path());
        env.tools = tools_with(|paths| paths.viewer = vec![viewer.display().to_string()]);
        env.preferred_printer = Some("Front Desk".into());
        let resolver = PrintResolver::new(env);

        let report = resolver.print_with_viewer(&file, Some("Office"), None).unwrap();
        assert_eq!(report.printer, "Front Desk");
        let call = &runner.calls()[0];
        assert_eq!(call.args[1], "Front Desk");
        assert_eq!(call.args[3], "color,duplexshort");
    }

    #[test]
    fn viewer_entry_rejects_other_types_and_missing_viewer() {
        let dir = tempfile::tempdir().unwrap();
        let text = touch(dir.path(), "a.txt");
        let file = pdf(dir.path());
        let bridge = Arc::new(MockBridge::with_printers(&["Office"], Some("Office")));
        let resolver = PrintResolver::new(test_env(bridge, Arc::new(ScriptedRunner::succeeding()), dir.path()));

        assert!(matches!(
            resolver.print_with_viewer(&text, None, None),
            Err(ScanDeskError::NoApplicableStrategy(_))
        ));
        assert!(matches!(
            resolver.print_with_viewer(&file, None, Some("2x")),
            Err(ScanDeskError::ToolMissing(_))
        ));
    }
}
