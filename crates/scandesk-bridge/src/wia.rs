// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// WIA scanner access through PowerShell COM automation.
//
// Each operation runs one short PowerShell script against `WIA.DeviceManager`.
// Scripts print compact JSON on success; on failure they print
// `HRESULT=0x........ <message>` to stderr and exit non-zero, which is
// translated into a device error category.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, info, instrument};

use scandesk_core::error::{Result, ScanDeskError};
use scandesk_core::human_errors::device_error;
use scandesk_core::{Device, DeviceKind};

use crate::process::{ProcessRunner, ToolCommand};
use crate::traits::{ScanSetting, ScannerBackend};

/// WIA format GUID for BMP transfers (lossless, supported by every driver).
pub const WIA_FORMAT_BMP: &str = "{B96B3CAB-0728-11D3-9D7B-0000F81EF32E}";

const PRELUDE: &str = "$ErrorActionPreference = 'Stop'
$ProgressPreference = 'SilentlyContinue'
function Fail($err) {
  [Console]::Error.WriteLine(('HRESULT=0x{0:X8} {1}' -f $err.Exception.HResult, $err.Exception.Message))
  exit 2
}
";

/// Quote a value as a PowerShell single-quoted literal.
pub fn ps_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn enumerate_script() -> String {
    format!(
        "{PRELUDE}try {{
  $manager = New-Object -ComObject WIA.DeviceManager
  $found = @()
  $index = 0
  foreach ($info in $manager.DeviceInfos) {{
    if ($info.Type -ne 1) {{ continue }}
    $index++
    $name = ($info.Properties | Where-Object {{ $_.Name -eq 'Name' }} | Select-Object -First 1).Value
    if (-not $name) {{ $name = ($info.Properties | Where-Object {{ $_.Name -eq 'Description' }} | Select-Object -First 1).Value }}
    $found += [pscustomobject]@{{ index = $index; name = [string]$name; id = [string]$info.DeviceID }}
  }}
  ConvertTo-Json -InputObject @($found) -Compress
}} catch {{ Fail $_ }}
"
    )
}

fn connect_snippet(device_id: &str) -> String {
    format!(
        "  $manager = New-Object -ComObject WIA.DeviceManager
  $info = $manager.DeviceInfos | Where-Object {{ $_.DeviceID -eq {id} }} | Select-Object -First 1
  if (-not $info) {{ [Console]::Error.WriteLine('HRESULT=0x80210015 scanner not found'); exit 3 }}
  $device = $info.Connect()
  $item = $null
  foreach ($candidate in $device.Items) {{ $item = $candidate; break }}
",
        id = ps_quote(device_id)
    )
}

fn properties_script(device_id: &str) -> String {
    format!(
        "{PRELUDE}try {{
{connect}  $props = @()
  foreach ($p in $device.Properties) {{ $props += [pscustomobject]@{{ name = [string]$p.Name; value = [string]$p.Value }} }}
  if ($item) {{
    foreach ($p in $item.Properties) {{ $props += [pscustomobject]@{{ name = 'Item.' + [string]$p.Name; value = [string]$p.Value }} }}
  }}
  ConvertTo-Json -InputObject @($props) -Compress
}} catch {{ Fail $_ }}
",
        connect = connect_snippet(device_id)
    )
}

fn acquire_script(device_id: &str, settings: &[ScanSetting], destination: &Path) -> String {
    let assignments: String = settings
        .iter()
        .map(|setting| {
            format!(
                "  Set-WiaProperty $item {} {}\n",
                ps_quote(setting.property_name()),
                setting.value()
            )
        })
        .collect();

    format!(
        "{PRELUDE}function Set-WiaProperty($target, $name, $value) {{
  foreach ($p in $target.Properties) {{
    if ($p.Name -eq $name) {{ try {{ $p.Value = $value }} catch {{ }}; return }}
  }}
}}
try {{
{connect}  if (-not $item) {{ [Console]::Error.WriteLine('scanner exposes no scan item'); exit 4 }}
{assignments}  $image = $item.Transfer({format})
  $image.SaveFile({dest})
  ConvertTo-Json -InputObject @{{ saved = $true }} -Compress
}} catch {{ Fail $_ }}
",
        connect = connect_snippet(device_id),
        format = ps_quote(WIA_FORMAT_BMP),
        dest = ps_quote(&destination.display().to_string()),
    )
}

#[derive(Debug, Deserialize)]
struct WiaDevice {
    index: usize,
    name: String,
    id: String,
}

#[derive(Debug, Deserialize)]
struct WiaProperty {
    name: String,
    value: String,
}

/// Parse the enumeration script's JSON output.
pub fn parse_device_list(stdout: &str) -> Result<Vec<Device>> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    let devices: Vec<WiaDevice> = serde_json::from_str(trimmed)?;
    Ok(devices
        .into_iter()
        .map(|d| Device {
            index: d.index,
            display_name: if d.name.is_empty() { d.id.clone() } else { d.name },
            device_id: d.id,
            kind: DeviceKind::Scanner,
        })
        .collect())
}

/// Parse the property script's JSON output.
pub fn parse_properties(stdout: &str) -> Result<Vec<(String, String)>> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    let props: Vec<WiaProperty> = serde_json::from_str(trimmed)?;
    Ok(props.into_iter().map(|p| (p.name, p.value)).collect())
}

/// Scanner backend driving WIA through PowerShell.
pub struct WiaScanner {
    runner: Arc<dyn ProcessRunner>,
    powershell: PathBuf,
    timeout: Duration,
}

impl WiaScanner {
    pub fn new(runner: Arc<dyn ProcessRunner>, powershell: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            runner,
            powershell: powershell.into(),
            timeout,
        }
    }

    fn run_script(&self, script: &str) -> Result<String> {
        let command = ToolCommand::new(&self.powershell, self.timeout).args([
            "-NoProfile",
            "-NonInteractive",
            "-ExecutionPolicy",
            "Bypass",
            "-Command",
            script,
        ]);
        let output = self.runner.run(&command).map_err(|err| match err {
            ScanDeskError::ExternalTool(detail) => device_error(&detail),
            other => other,
        })?;
        if output.success() {
            Ok(output.stdout)
        } else {
            Err(device_error(&output.stderr))
        }
    }
}

impl ScannerBackend for WiaScanner {
    fn enumerate_scanners(&self) -> Result<Vec<Device>> {
        let devices = parse_device_list(&self.run_script(&enumerate_script())?)?;
        debug!(count = devices.len(), "WIA scanners enumerated");
        Ok(devices)
    }

    fn scanner_properties(&self, device_id: &str) -> Result<Vec<(String, String)>> {
        parse_properties(&self.run_script(&properties_script(device_id))?)
    }

    #[instrument(skip(self, settings), fields(device_id, destination = %destination.display()))]
    fn acquire(&self, device_id: &str, settings: &[ScanSetting], destination: &Path) -> Result<()> {
        info!("Starting WIA transfer");
        self.run_script(&acquire_script(device_id, settings, destination))?;
        if !destination.exists() {
            return Err(ScanDeskError::TransferFailed(
                "scanner reported success but wrote no image".into(),
            ));
        }
        Ok(())
    }
}
