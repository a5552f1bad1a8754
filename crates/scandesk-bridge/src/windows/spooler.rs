// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Windows print spooler through the Win32 printing API.
//
// Printer handles, spooler documents and spooler pages are RAII guards, so
// every exit path closes what it opened, innermost first.

use std::ffi::{OsStr, c_void};
use std::os::windows::ffi::OsStrExt;

use tracing::{debug, info, warn};
use windows_sys::Win32::Foundation::{GetLastError, HANDLE};
use windows_sys::Win32::Graphics::Gdi::DEVMODEW;
use windows_sys::Win32::Graphics::Printing::{
    ClosePrinter, DOC_INFO_1W, DocumentPropertiesW, EndDocPrinter, EndPagePrinter, EnumPrintersW,
    GetDefaultPrinterW, OpenPrinterW, PRINTER_INFO_2W, PRINTER_INFO_9W, SetDefaultPrinterW,
    SetPrinterW, StartDocPrinterW, StartPagePrinter, WritePrinter,
};

use scandesk_core::error::{Result, ScanDeskError};
use scandesk_core::{Device, DeviceKind, PrintSettings, PrinterDetails};

use crate::devmode::{DeviceModeFields, DeviceModePatch};

const PRINTER_ENUM_LOCAL: u32 = 0x0000_0002;
const PRINTER_ENUM_CONNECTIONS: u32 = 0x0000_0004;
const DM_OUT_BUFFER: u32 = 2;
const DM_IN_BUFFER: u32 = 8;
const ERROR_FILE_NOT_FOUND: u32 = 2;

/// NUL-terminated UTF-16 copy of `s`.
pub(crate) fn wide(s: &str) -> Vec<u16> {
    OsStr::new(s).encode_wide().chain(std::iter::once(0)).collect()
}

/// Read a NUL-terminated UTF-16 string.
///
/// # Safety
/// `ptr` must be null or point to a NUL-terminated UTF-16 buffer.
unsafe fn from_wide(ptr: *const u16) -> String {
    if ptr.is_null() {
        return String::new();
    }
    let mut len = 0;
    // SAFETY: the caller guarantees a terminating NUL within the buffer.
    while unsafe { *ptr.add(len) } != 0 {
        len += 1;
    }
    // SAFETY: `len` elements were just read successfully.
    String::from_utf16_lossy(unsafe { std::slice::from_raw_parts(ptr, len) })
}

fn spooler_error(action: &str) -> ScanDeskError {
    // SAFETY: GetLastError has no preconditions.
    let code = unsafe { GetLastError() };
    ScanDeskError::Spooler(format!("{action} failed (Win32 error {code})"))
}

// -- Scoped handles -----------------------------------------------------------

struct PrinterHandle(HANDLE);

impl PrinterHandle {
    fn open(name: &str) -> Result<Self> {
        let name_w = wide(name);
        // SAFETY: zero is a valid "no handle" value for the out parameter.
        let mut handle: HANDLE = unsafe { std::mem::zeroed() };
        // SAFETY: `name_w` is NUL-terminated and outlives the call; a null
        // PRINTER_DEFAULTS requests the default (use) access.
        let ok = unsafe { OpenPrinterW(name_w.as_ptr(), &mut handle, std::ptr::null()) };
        if ok == 0 {
            return Err(ScanDeskError::PrinterNotFound(name.to_string()));
        }
        Ok(Self(handle))
    }
}

impl Drop for PrinterHandle {
    fn drop(&mut self) {
        // SAFETY: the handle came from a successful OpenPrinterW.
        if unsafe { ClosePrinter(self.0) } == 0 {
            warn!("ClosePrinter failed");
        }
    }
}

struct SpoolDocument(HANDLE);

impl Drop for SpoolDocument {
    fn drop(&mut self) {
        // SAFETY: constructed only after StartDocPrinterW succeeded.
        unsafe { EndDocPrinter(self.0) };
    }
}

struct SpoolPage(HANDLE);

impl Drop for SpoolPage {
    fn drop(&mut self) {
        // SAFETY: constructed only after StartPagePrinter succeeded.
        unsafe { EndPagePrinter(self.0) };
    }
}

// -- Operations ---------------------------------------------------------------

pub fn enumerate_printers() -> Result<Vec<PrinterDetails>> {
    let flags = PRINTER_ENUM_LOCAL | PRINTER_ENUM_CONNECTIONS;
    let mut needed = 0u32;
    let mut returned = 0u32;
    // SAFETY: sizing call with a null buffer of length zero.
    unsafe {
        EnumPrintersW(flags, std::ptr::null(), 2, std::ptr::null_mut(), 0, &mut needed, &mut returned)
    };
    if needed == 0 {
        return Ok(Vec::new());
    }

    // u64 storage keeps the PRINTER_INFO_2W array suitably aligned.
    let mut buffer = vec![0u64; (needed as usize).div_ceil(8)];
    // SAFETY: `buffer` holds at least `needed` bytes.
    let ok = unsafe {
        EnumPrintersW(
            flags,
            std::ptr::null(),
            2,
            buffer.as_mut_ptr().cast::<u8>(),
            needed,
            &mut needed,
            &mut returned,
        )
    };
    if ok == 0 {
        return Err(spooler_error("EnumPrinters"));
    }

    let default = default_printer()?.unwrap_or_default();
    // SAFETY: on success the buffer starts with `returned` PRINTER_INFO_2W
    // records whose string pointers point into the same buffer.
    let infos = unsafe {
        std::slice::from_raw_parts(buffer.as_ptr().cast::<PRINTER_INFO_2W>(), returned as usize)
    };
    let printers = infos
        .iter()
        .enumerate()
        .map(|(i, info)| {
            // SAFETY: see above.
            let name = unsafe { from_wide(info.pPrinterName) };
            PrinterDetails {
                device: Device {
                    index: i + 1,
                    display_name: name.clone(),
                    device_id: name.clone(),
                    kind: DeviceKind::Printer,
                },
                is_default: name == default,
                // SAFETY: see above.
                port: unsafe { from_wide(info.pPortName) },
                // SAFETY: see above.
                driver: unsafe { from_wide(info.pDriverName) },
                status: info.Status,
                attributes: info.Attributes,
            }
        })
        .collect();
    Ok(printers)
}

pub fn default_printer() -> Result<Option<String>> {
    let mut len = 0u32;
    // SAFETY: sizing call with a null buffer.
    unsafe { GetDefaultPrinterW(std::ptr::null_mut(), &mut len) };
    if len == 0 {
        // SAFETY: GetLastError has no preconditions.
        let code = unsafe { GetLastError() };
        if code == ERROR_FILE_NOT_FOUND {
            return Ok(None);
        }
        return Err(ScanDeskError::Spooler(format!(
            "GetDefaultPrinter failed (Win32 error {code})"
        )));
    }
    let mut buffer = vec![0u16; len as usize];
    // SAFETY: `buffer` holds `len` UTF-16 units.
    if unsafe { GetDefaultPrinterW(buffer.as_mut_ptr(), &mut len) } == 0 {
        return Err(spooler_error("GetDefaultPrinter"));
    }
    // SAFETY: the API wrote a NUL-terminated name into `buffer`.
    Ok(Some(unsafe { from_wide(buffer.as_ptr()) }))
}

pub fn set_default_printer(name: &str) -> Result<()> {
    let name_w = wide(name);
    // SAFETY: `name_w` is NUL-terminated and outlives the call.
    if unsafe { SetDefaultPrinterW(name_w.as_ptr()) } == 0 {
        return Err(spooler_error("SetDefaultPrinter"));
    }
    debug!(printer = name, "Default printer set");
    Ok(())
}

pub fn write_raw(printer: &str, document_name: &str, data: &[u8]) -> Result<()> {
    let handle = PrinterHandle::open(printer)?;
    let mut doc_name = wide(document_name);
    let mut datatype = wide("RAW");
    let doc_info = DOC_INFO_1W {
        pDocName: doc_name.as_mut_ptr(),
        pOutputFile: std::ptr::null_mut(),
        pDatatype: datatype.as_mut_ptr(),
    };

    // SAFETY: `doc_info` and the strings it points to outlive the call.
    let job = unsafe { StartDocPrinterW(handle.0, 1, &doc_info) };
    if job == 0 {
        return Err(spooler_error("StartDocPrinter"));
    }
    let document = SpoolDocument(handle.0);

    // SAFETY: a spooler document is open on `handle`.
    if unsafe { StartPagePrinter(handle.0) } == 0 {
        return Err(spooler_error("StartPagePrinter"));
    }
    let page = SpoolPage(handle.0);

    let length = u32::try_from(data.len())
        .map_err(|_| ScanDeskError::Spooler("document larger than 4 GiB".into()))?;
    let mut written = 0u32;
    // SAFETY: `data` is valid for `length` bytes.
    let ok = unsafe {
        WritePrinter(handle.0, data.as_ptr().cast::<c_void>(), length, &mut written)
    };
    drop(page);
    drop(document);

    if ok == 0 {
        return Err(spooler_error("WritePrinter"));
    }
    if written != length {
        return Err(ScanDeskError::Spooler(format!(
            "spooler accepted {written} of {length} bytes"
        )));
    }
    info!(printer, job, bytes = length, "Raw document spooled");
    Ok(())
}

pub fn apply_settings(printer: &str, settings: &PrintSettings) -> Result<()> {
    let patch = DeviceModePatch::from_settings(settings);
    if patch.is_empty() {
        return Ok(());
    }

    let handle = PrinterHandle::open(printer)?;
    let name_w = wide(printer);
    // SAFETY: a zero window handle means "no owner window".
    let hwnd = unsafe { std::mem::zeroed() };
    // SAFETY: null output buffer with fMode 0 returns the DEVMODE size.
    let size = unsafe {
        DocumentPropertiesW(hwnd, handle.0, name_w.as_ptr(), std::ptr::null_mut(), std::ptr::null(), 0)
    };
    if size <= 0 {
        return Err(spooler_error("DocumentProperties (size)"));
    }

    let mut buffer = vec![0u64; (size as usize).div_ceil(8)];
    let devmode = buffer.as_mut_ptr().cast::<DEVMODEW>();
    // SAFETY: `buffer` holds `size` bytes, aligned for DEVMODEW.
    if unsafe {
        DocumentPropertiesW(hwnd, handle.0, name_w.as_ptr(), devmode, std::ptr::null(), DM_OUT_BUFFER)
    } < 0
    {
        return Err(spooler_error("DocumentProperties (read)"));
    }

    // SAFETY: `devmode` was initialised by the driver above; the union
    // variant for printers is Anonymous1.Anonymous1.
    unsafe {
        let dm = &mut *devmode;
        let printer_fields = &mut dm.Anonymous1.Anonymous1;
        let mut fields = DeviceModeFields {
            fields: dm.dmFields,
            orientation: printer_fields.dmOrientation,
            paper_size: printer_fields.dmPaperSize,
            copies: printer_fields.dmCopies,
            print_quality: printer_fields.dmPrintQuality,
            color: dm.dmColor,
            duplex: dm.dmDuplex,
        };
        patch.apply(&mut fields);
        dm.dmFields = fields.fields;
        printer_fields.dmOrientation = fields.orientation;
        printer_fields.dmPaperSize = fields.paper_size;
        printer_fields.dmCopies = fields.copies;
        printer_fields.dmPrintQuality = fields.print_quality;
        dm.dmColor = fields.color;
        dm.dmDuplex = fields.duplex;
    }

    // SAFETY: merge the edited DEVMODE through the driver in place.
    if unsafe {
        DocumentPropertiesW(
            hwnd,
            handle.0,
            name_w.as_ptr(),
            devmode,
            devmode,
            DM_IN_BUFFER | DM_OUT_BUFFER,
        )
    } < 0
    {
        return Err(spooler_error("DocumentProperties (merge)"));
    }

    let info = PRINTER_INFO_9W { pDevMode: devmode };
    // SAFETY: level 9 stores a per-user default DEVMODE; `info` outlives the call.
    if unsafe { SetPrinterW(handle.0, 9, (&info as *const PRINTER_INFO_9W).cast::<u8>(), 0) } == 0 {
        return Err(spooler_error("SetPrinter"));
    }

    info!(printer, fields = patch.field_mask(), "Printer options applied");
    Ok(())
}
