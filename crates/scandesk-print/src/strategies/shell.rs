// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The OS `print` association.

use scandesk_core::error::Result;

use crate::default_printer::DefaultPrinterGuard;
use crate::strategy::{Attempt, ChainContext, PrintStrategy, StrategyOutcome, outcome_of};

const PDF: &[&str] = &["pdf"];

/// Shell `print` verb against the temporarily switched default printer.
///
/// In the silent cascade it only handles PDFs; in the dialog chain it takes
/// any file but needs the job's shell fallback flag.
pub struct ShellPrintVerb {
    any_type: bool,
}

impl ShellPrintVerb {
    pub fn documents_only() -> Self {
        Self { any_type: false }
    }

    pub fn any_type() -> Self {
        Self { any_type: true }
    }
}

impl PrintStrategy for ShellPrintVerb {
    fn name(&self) -> &'static str {
        "ShellPrintVerb"
    }

    fn extensions(&self) -> Option<&'static [&'static str]> {
        if self.any_type { None } else { Some(PDF) }
    }

    fn execute(&self, attempt: &Attempt<'_>, ctx: &ChainContext<'_>) -> StrategyOutcome {
        if self.any_type && !attempt.use_shell_fallback {
            return StrategyOutcome::Skipped("shell fallback disabled".into());
        }
        outcome_of(print_with_shell(attempt, ctx))
    }
}

fn print_with_shell(attempt: &Attempt<'_>, ctx: &ChainContext<'_>) -> Result<String> {
    let bridge = ctx.env.bridge.as_ref();
    let _default = DefaultPrinterGuard::switch(bridge, attempt.printer)?;
    bridge.shell_execute("print", attempt.path, None)?;
    Ok("shell print verb".into())
}
