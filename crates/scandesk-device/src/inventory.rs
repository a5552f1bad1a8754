// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Device inventory.
//
// Every call re-queries the OS; nothing is cached between calls. A failed
// enumeration is logged and reported as "nothing attached".

use std::sync::Arc;

use tracing::{debug, warn};

use scandesk_bridge::PlatformBridge;
use scandesk_core::{Device, DeviceKind, PrinterDetails};

/// Lists scanners and printers currently known to the OS.
#[derive(Clone)]
pub struct DeviceInventory {
    bridge: Arc<dyn PlatformBridge>,
}

impl DeviceInventory {
    pub fn new(bridge: Arc<dyn PlatformBridge>) -> Self {
        Self { bridge }
    }

    pub fn list_scanners(&self) -> Vec<Device> {
        match self.bridge.enumerate_scanners() {
            Ok(scanners) => {
                debug!(count = scanners.len(), "Scanners enumerated");
                scanners
            }
            Err(err) => {
                warn!(error = %err, "Scanner enumeration failed");
                Vec::new()
            }
        }
    }

    pub fn printer_details(&self) -> Vec<PrinterDetails> {
        match self.bridge.enumerate_printers() {
            Ok(printers) => {
                debug!(count = printers.len(), "Printers enumerated");
                printers
            }
            Err(err) => {
                warn!(error = %err, "Printer enumeration failed");
                Vec::new()
            }
        }
    }

    pub fn list_printers(&self) -> Vec<Device> {
        self.printer_details()
            .into_iter()
            .map(|details| details.device)
            .collect()
    }

    /// The system default printer, if one is set.
    pub fn default_printer(&self) -> Option<Device> {
        let name = match self.bridge.default_printer() {
            Ok(name) => name?,
            Err(err) => {
                warn!(error = %err, "Default printer lookup failed");
                return None;
            }
        };
        let listed = self
            .list_printers()
            .into_iter()
            .find(|device| device.device_id == name);
        Some(listed.unwrap_or(Device {
            index: 0,
            display_name: name.clone(),
            device_id: name,
            kind: DeviceKind::Printer,
        }))
    }

    /// The scanner with `device_id`, or the first scanner when `None`.
    pub fn find_scanner(&self, device_id: Option<&str>) -> Option<Device> {
        let mut scanners = self.list_scanners().into_iter();
        match device_id {
            Some(id) => scanners.find(|device| device.device_id == id),
            None => scanners.next(),
        }
    }

    /// Device and first-item properties of a scanner; empty on failure.
    pub fn scanner_properties(&self, device_id: &str) -> Vec<(String, String)> {
        self.bridge
            .scanner_properties(device_id)
            .unwrap_or_else(|err| {
                warn!(device_id, error = %err, "Reading scanner properties failed");
                Vec::new()
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockBridge;

    #[test]
    fn listing_scanners_twice_queries_twice() {
        let bridge = Arc::new(MockBridge::with_scanners(&["Flatbed", "Feeder"]));
        let inventory = DeviceInventory::new(bridge.clone());

        let first = inventory.list_scanners();
        let second = inventory.list_scanners();
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
        assert_eq!(bridge.enumerations(), 2);
    }

    #[test]
    fn enumeration_failure_is_empty() {
        let bridge = Arc::new(MockBridge::failing_enumeration());
        let inventory = DeviceInventory::new(bridge);
        assert!(inventory.list_scanners().is_empty());
        assert!(inventory.find_scanner(None).is_none());
        assert!(inventory.scanner_properties("any").is_empty());
    }

    #[test]
    fn scanner_lookup_by_id() {
        let inventory = DeviceInventory::new(Arc::new(MockBridge::with_scanners(&["Flatbed", "Feeder"])));
        assert_eq!(inventory.find_scanner(None).unwrap().display_name, "Flatbed");
        assert_eq!(
            inventory.find_scanner(Some("scanner-2")).unwrap().display_name,
            "Feeder"
        );
        assert!(inventory.find_scanner(Some("scanner-9")).is_none());
    }

    #[test]
    fn default_printer_is_resolved_from_the_list() {
        let inventory = DeviceInventory::new(Arc::new(MockBridge::with_printers(&["Office", "Lab"], Some("Lab"))));
        let default = inventory.default_printer().unwrap();
        assert_eq!(default.index, 2);
        assert_eq!(inventory.list_printers().len(), 2);

        let none = DeviceInventory::new(Arc::new(MockBridge::with_printers(&["Office"], None)));
        assert!(none.default_printer().is_none());
    }
}
