// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Script-host print paths: PowerShell and Windows Script Host.

use std::path::Path;

use scandesk_bridge::ToolCommand;
use scandesk_bridge::wia::ps_quote;
use scandesk_core::error::Result;

use super::{missing, run_tool, secs, temp_script};
use crate::default_printer::DefaultPrinterGuard;
use crate::strategy::{Attempt, ChainContext, PrintStrategy, StrategyOutcome, outcome_of};
use crate::tools::Tool;

const PDF: &[&str] = &["pdf"];

/// Quote a value as a VBScript string literal.
fn vbs_quote(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// PowerShell `Start-Process -Verb PrintTo`, waiting for the handler.
pub fn powershell_print_script(file: &Path, printer: &str, wait_secs: u64) -> String {
    format!(
        "$ErrorActionPreference = 'Stop'\r\n\
         $file = {file}\r\n\
         $printer = {printer}\r\n\
         $proc = Start-Process -FilePath $file -Verb PrintTo -ArgumentList ('\"' + $printer + '\"') -WindowStyle Hidden -PassThru\r\n\
         if ($proc) {{ $proc | Wait-Process -Timeout {wait_secs} -ErrorAction SilentlyContinue }}\r\n\
         exit 0\r\n",
        file = ps_quote(&file.to_string_lossy()),
        printer = ps_quote(printer),
    )
}

/// VBScript invoking the shell `print` verb, hidden, then giving the
/// handler time to spool.
pub fn shell_print_vbscript(file: &Path) -> String {
    format!(
        "Set shell = CreateObject(\"Shell.Application\")\r\n\
         shell.ShellExecute {file}, \"\", \"\", \"print\", 0\r\n\
         WScript.Sleep 3000\r\n",
        file = vbs_quote(&file.to_string_lossy()),
    )
}

/// PowerShell script in a temp file using the `PrintTo` verb.
pub struct ScriptedPrint;

impl PrintStrategy for ScriptedPrint {
    fn name(&self) -> &'static str {
        "ScriptedPrint"
    }

    fn extensions(&self) -> Option<&'static [&'static str]> {
        Some(PDF)
    }

    fn execute(&self, attempt: &Attempt<'_>, ctx: &ChainContext<'_>) -> StrategyOutcome {
        outcome_of(print_with_powershell(attempt, ctx))
    }
}

fn print_with_powershell(attempt: &Attempt<'_>, ctx: &ChainContext<'_>) -> Result<String> {
    let powershell = ctx
        .env
        .tools
        .locate(Tool::PowerShell)
        .ok_or_else(|| missing(Tool::PowerShell.label()))?;
    let timeout = ctx.env.timeouts.script_secs;
    let script = temp_script(
        ctx,
        ".ps1",
        &powershell_print_script(attempt.path, attempt.printer, timeout.saturating_sub(5).max(1)),
    )?;
    let command = ToolCommand::new(powershell, secs(timeout))
        .args(["-NoProfile", "-NonInteractive", "-ExecutionPolicy", "Bypass", "-File"])
        .arg(script.path());
    run_tool(ctx, &command)?;
    Ok("PowerShell PrintTo".into())
}

/// VBScript through the console script host.
pub struct ScriptedShellExecutePrint;

impl PrintStrategy for ScriptedShellExecutePrint {
    fn name(&self) -> &'static str {
        "ScriptedShellExecutePrint"
    }

    fn extensions(&self) -> Option<&'static [&'static str]> {
        Some(PDF)
    }

    fn execute(&self, attempt: &Attempt<'_>, ctx: &ChainContext<'_>) -> StrategyOutcome {
        outcome_of(print_with_script_host(
            attempt,
            ctx,
            Tool::ConsoleScriptHost,
            &["//NoLogo"],
        ))
    }
}

/// VBScript through the windowless script host. Only when silent printing
/// was requested.
pub struct ScriptHostSilentPrint;

impl PrintStrategy for ScriptHostSilentPrint {
    fn name(&self) -> &'static str {
        "ScriptHostSilentPrint"
    }

    fn extensions(&self) -> Option<&'static [&'static str]> {
        None
    }

    fn execute(&self, attempt: &Attempt<'_>, ctx: &ChainContext<'_>) -> StrategyOutcome {
        if !attempt.silent {
            return StrategyOutcome::Skipped("silent printing not requested".into());
        }
        outcome_of(print_with_script_host(
            attempt,
            ctx,
            Tool::GuiScriptHost,
            &["//B", "//NoLogo"],
        ))
    }
}

fn print_with_script_host(
    attempt: &Attempt<'_>,
    ctx: &ChainContext<'_>,
    host: Tool,
    flags: &[&str],
) -> Result<String> {
    let program = ctx
        .env
        .tools
        .locate(host)
        .ok_or_else(|| missing(host.label()))?;
    let script = temp_script(ctx, ".vbs", &shell_print_vbscript(attempt.path))?;
    let _default = DefaultPrinterGuard::switch(ctx.env.bridge.as_ref(), attempt.printer)?;
    let command = ToolCommand::new(program, secs(ctx.env.timeouts.script_secs))
        .args(flags.iter().copied())
        .arg(script.path());
    run_tool(ctx, &command)?;
    Ok(format!("{} print verb", host.label()))
}
