// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Helper-tool discovery.
//
// Each tool has an ordered list of search patterns. `%VAR%` expands from the
// environment and a leading `~` from the home directory; wildcards are
// resolved against the filesystem and the last match in sorted order wins,
// which picks the newest versioned install directory. When no pattern
// matches, the executable names are looked up on `PATH`.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use globset::GlobBuilder;
use tracing::debug;
use walkdir::WalkDir;

use scandesk_core::config::ToolSearchPaths;

/// External programs the print strategies drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    PhotoViewer,
    Ghostscript,
    Pdftoppm,
    Viewer,
    PdfReader,
    Browser,
    PowerShell,
    ConsoleScriptHost,
    GuiScriptHost,
}

impl Tool {
    pub fn label(&self) -> &'static str {
        match self {
            Self::PhotoViewer => "photo viewer",
            Self::Ghostscript => "Ghostscript",
            Self::Pdftoppm => "pdftoppm",
            Self::Viewer => "SumatraPDF",
            Self::PdfReader => "PDF reader",
            Self::Browser => "browser",
            Self::PowerShell => "PowerShell",
            Self::ConsoleScriptHost => "cscript",
            Self::GuiScriptHost => "wscript",
        }
    }

    /// Executable names tried on `PATH`.
    fn path_names(&self) -> &'static [&'static str] {
        match self {
            Self::PhotoViewer => &["rundll32.exe"],
            Self::Ghostscript => &["gswin64c.exe", "gswin32c.exe", "gs"],
            Self::Pdftoppm => &["pdftoppm.exe", "pdftoppm"],
            Self::Viewer => &["SumatraPDF.exe", "sumatrapdf"],
            Self::PdfReader => &["AcroRd32.exe", "Acrobat.exe"],
            Self::Browser => &["chrome.exe", "msedge.exe"],
            Self::PowerShell => &["powershell.exe", "pwsh"],
            Self::ConsoleScriptHost => &["cscript.exe"],
            Self::GuiScriptHost => &["wscript.exe"],
        }
    }
}

/// Finds helper tools from configured patterns and `PATH`.
#[derive(Debug, Clone)]
pub struct ToolLocator {
    search: ToolSearchPaths,
    path_var: Option<OsString>,
}

impl ToolLocator {
    pub fn new(search: ToolSearchPaths) -> Self {
        Self {
            search,
            path_var: std::env::var_os("PATH"),
        }
    }

    /// Locator that only consults the configured patterns.
    pub fn without_path_lookup(search: ToolSearchPaths) -> Self {
        Self {
            search,
            path_var: None,
        }
    }

    pub fn locate(&self, tool: Tool) -> Option<PathBuf> {
        let found = self
            .patterns(tool)
            .iter()
            .find_map(|pattern| {
                let expanded = expand_pattern(pattern, |name| std::env::var(name).ok(), dirs::home_dir())?;
                resolve_pattern(&expanded)
            })
            .or_else(|| self.on_path(tool));
        match &found {
            Some(path) => debug!(tool = tool.label(), path = %path.display(), "Tool found"),
            None => debug!(tool = tool.label(), "Tool not found"),
        }
        found
    }

    fn patterns(&self, tool: Tool) -> &[String] {
        match tool {
            Tool::PhotoViewer => &self.search.photo_viewer,
            Tool::Ghostscript => &self.search.ghostscript,
            Tool::Pdftoppm => &self.search.pdftoppm,
            Tool::Viewer => &self.search.viewer,
            Tool::PdfReader => &self.search.pdf_reader,
            Tool::Browser => &self.search.browser,
            Tool::PowerShell => &self.search.powershell,
            Tool::ConsoleScriptHost => &self.search.console_script_host,
            Tool::GuiScriptHost => &self.search.gui_script_host,
        }
    }

    fn on_path(&self, tool: Tool) -> Option<PathBuf> {
        let path_var = self.path_var.as_ref()?;
        std::env::split_paths(path_var).find_map(|dir| {
            tool.path_names()
                .iter()
                .map(|name| dir.join(name))
                .find(|candidate| candidate.is_file())
        })
    }
}

/// Expand `%VAR%` references and a leading `~`.
///
/// Returns `None` when a referenced variable is unset, so the pattern is
/// skipped rather than probed with a literal `%VAR%`.
pub fn expand_pattern(
    pattern: &str,
    lookup: impl Fn(&str) -> Option<String>,
    home: Option<PathBuf>,
) -> Option<String> {
    let mut expanded = String::with_capacity(pattern.len());
    let mut rest = pattern;
    while let Some(start) = rest.find('%') {
        let after = &rest[start + 1..];
        let end = after.find('%')?;
        expanded.push_str(&rest[..start]);
        expanded.push_str(&lookup(&after[..end])?);
        rest = &after[end + 1..];
    }
    expanded.push_str(rest);

    if let Some(tail) = expanded.strip_prefix('~') {
        if tail.is_empty() || tail.starts_with(['/', '\\']) {
            let home = home?;
            return Some(format!("{}{tail}", home.display()));
        }
    }
    Some(expanded)
}

fn has_wildcard(component: &str) -> bool {
    component.contains(['*', '?', '['])
}

/// Resolve an expanded pattern to an existing file.
fn resolve_pattern(pattern: &str) -> Option<PathBuf> {
    let normalized = pattern.replace('\\', "/");
    let components: Vec<&str> = normalized.split('/').collect();
    let Some(first_wild) = components.iter().position(|c| has_wildcard(c)) else {
        let path = PathBuf::from(pattern);
        return path.is_file().then_some(path);
    };

    let base = match components[..first_wild].join("/") {
        base if base.is_empty() => "/".to_string(),
        base => base,
    };
    let depth = components.len() - first_wild;
    let matcher = GlobBuilder::new(&normalized)
        .literal_separator(true)
        .backslash_escape(false)
        .build()
        .ok()?
        .compile_matcher();

    let mut matches: Vec<PathBuf> = WalkDir::new(&base)
        .min_depth(depth)
        .max_depth(depth)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| matcher.is_match(normalize(path)))
        .collect();
    matches.sort();
    matches.pop()
}

fn normalize(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
