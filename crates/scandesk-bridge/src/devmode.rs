// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Device-mode patching.
//
// Print options map onto DEVMODE fields. Only options present in the request
// are written; every other field keeps the driver's value and its `dmFields`
// bit is left alone.

use scandesk_core::PrintSettings;

pub const DM_ORIENTATION: u32 = 0x0000_0001;
pub const DM_PAPERSIZE: u32 = 0x0000_0002;
pub const DM_COPIES: u32 = 0x0000_0100;
pub const DM_PRINTQUALITY: u32 = 0x0000_0400;
pub const DM_COLOR: u32 = 0x0000_0800;
pub const DM_DUPLEX: u32 = 0x0000_1000;

const DMCOLOR_MONOCHROME: i16 = 1;
const DMCOLOR_COLOR: i16 = 2;

/// The DEVMODE fields ScanDesk reads and writes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceModeFields {
    pub fields: u32,
    pub orientation: i16,
    pub paper_size: i16,
    pub copies: i16,
    pub print_quality: i16,
    pub color: i16,
    pub duplex: i16,
}

/// Values to overwrite; `None` leaves the field untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceModePatch {
    pub orientation: Option<i16>,
    pub paper_size: Option<i16>,
    pub copies: Option<i16>,
    pub print_quality: Option<i16>,
    pub color: Option<i16>,
    pub duplex: Option<i16>,
}

impl DeviceModePatch {
    pub fn from_settings(settings: &PrintSettings) -> Self {
        Self {
            orientation: settings.orientation.map(|o| o.devmode_code()),
            paper_size: settings.paper_size.map(|p| p.devmode_code()),
            copies: settings
                .copies
                .map(|c| c.clamp(1, i16::MAX as u16) as i16),
            print_quality: settings.quality.map(|q| q.devmode_code()),
            color: settings
                .color
                .map(|color| if color { DMCOLOR_COLOR } else { DMCOLOR_MONOCHROME }),
            duplex: settings.duplex.map(|d| d.devmode_code()),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// `dmFields` bits for the fields this patch writes.
    pub fn field_mask(&self) -> u32 {
        [
            (self.orientation.is_some(), DM_ORIENTATION),
            (self.paper_size.is_some(), DM_PAPERSIZE),
            (self.copies.is_some(), DM_COPIES),
            (self.print_quality.is_some(), DM_PRINTQUALITY),
            (self.color.is_some(), DM_COLOR),
            (self.duplex.is_some(), DM_DUPLEX),
        ]
        .into_iter()
        .filter(|(present, _)| *present)
        .fold(0, |mask, (_, bit)| mask | bit)
    }

    pub fn apply(&self, target: &mut DeviceModeFields) {
        fn set(slot: &mut i16, value: Option<i16>) {
            if let Some(value) = value {
                *slot = value;
            }
        }
        set(&mut target.orientation, self.orientation);
        set(&mut target.paper_size, self.paper_size);
        set(&mut target.copies, self.copies);
        set(&mut target.print_quality, self.print_quality);
        set(&mut target.color, self.color);
        set(&mut target.duplex, self.duplex);
        target.fields |= self.field_mask();
    }
}
