// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Shell verbs (`print`, `printto`) through ShellExecuteW.

use std::path::Path;

use tracing::debug;
use windows_sys::Win32::UI::Shell::ShellExecuteW;

use scandesk_core::error::{Result, ScanDeskError};

use super::spooler::wide;

const SW_HIDE: i32 = 0;

pub fn shell_execute(verb: &str, file: &Path, parameters: Option<&str>) -> Result<()> {
    let verb_w = wide(verb);
    let file_w = wide(&file.display().to_string());
    let params_w = parameters.map(wide);
    let directory_w = file.parent().map(|dir| wide(&dir.display().to_string()));

    // SAFETY: every string is NUL-terminated and outlives the call; a zero
    // window handle means no owner window.
    let result = unsafe {
        ShellExecuteW(
            std::mem::zeroed(),
            verb_w.as_ptr(),
            file_w.as_ptr(),
            params_w.as_ref().map_or(std::ptr::null(), |p| p.as_ptr()),
            directory_w.as_ref().map_or(std::ptr::null(), |d| d.as_ptr()),
            SW_HIDE,
        )
    };

    // Values above 32 indicate success.
    let code = result as isize;
    if code <= 32 {
        return Err(ScanDeskError::ExternalTool(format!(
            "shell verb '{verb}' failed for {} (code {code})",
            file.display()
        )));
    }
    debug!(verb, file = %file.display(), "Shell verb invoked");
    Ok(())
}
