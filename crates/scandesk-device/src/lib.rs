// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// scandesk-device — Scanner and printer inventory, and scan capture.

pub mod capture;
pub mod inventory;

#[cfg(test)]
mod test_support;

pub use capture::CaptureAdapter;
pub use inventory::DeviceInventory;
