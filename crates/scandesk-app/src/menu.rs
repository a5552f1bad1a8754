// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Interactive console menu.

use std::io::Write;
use std::path::PathBuf;

use tracing::{debug, warn};

use scandesk_core::error::ScanDeskError;
use scandesk_core::human_errors::humanize_error;
use scandesk_core::{
    CaptureRequest, ColorMode, Device, DuplexMode, Orientation, OutputFormat, PaperSize, PrintJob,
    PrintSettings,
};
use scandesk_document::save_extracted_text;

use crate::prompt::Prompter;
use crate::services::app_services::AppServices;

/// Menu entries in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuItem {
    Scan,
    ListScanners,
    ListPrinters,
    BatchScan,
    Combine,
    Print,
    AdvancedScan,
    AdvancedPrint,
    ScannerProperties,
    PrintWithViewer,
    DownloadViewer,
    QuickScanToPdf,
    ExtractText,
    Exit,
}

impl MenuItem {
    const ALL: [MenuItem; 14] = [
        Self::Scan,
        Self::ListScanners,
        Self::ListPrinters,
        Self::BatchScan,
        Self::Combine,
        Self::Print,
        Self::AdvancedScan,
        Self::AdvancedPrint,
        Self::ScannerProperties,
        Self::PrintWithViewer,
        Self::DownloadViewer,
        Self::QuickScanToPdf,
        Self::ExtractText,
        Self::Exit,
    ];

    pub fn key(&self) -> u8 {
        match self {
            Self::Exit => 0,
            item => Self::ALL.iter().position(|i| i == item).map_or(0, |i| i as u8 + 1),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Scan => "Scan a document",
            Self::ListScanners => "List scanners",
            Self::ListPrinters => "List printers",
            Self::BatchScan => "Batch scan (several pages)",
            Self::Combine => "Combine images into one PDF",
            Self::Print => "Print a file",
            Self::AdvancedScan => "Advanced scan",
            Self::AdvancedPrint => "Advanced print",
            Self::ScannerProperties => "Scanner properties",
            Self::PrintWithViewer => "Print with SumatraPDF",
            Self::DownloadViewer => "Download SumatraPDF",
            Self::QuickScanToPdf => "Quick scan to PDF",
            Self::ExtractText => "Extract text from an image",
            Self::Exit => "Exit",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        let key: u8 = key.trim().parse().ok()?;
        Self::ALL.iter().copied().find(|item| item.key() == key)
    }
}

/// Run the menu until the user exits or input ends.
pub fn run<W: Write>(services: &AppServices, prompt: &mut Prompter<W>) {
    prompt.say("ScanDesk");
    prompt.say(format!("  Scans are saved to {}", services.capture().scan_dir().display()));
    loop {
        prompt.say("");
        for item in MenuItem::ALL {
            prompt.say(format!("{:>3}. {}", item.key(), item.label()));
        }
        let answer = prompt.ask("Choose an option: ");
        if prompt.is_closed() {
            break;
        }
        let Some(item) = MenuItem::from_key(&answer) else {
            prompt.say("Unknown option.");
            continue;
        };
        debug!(?item, "Menu selection");
        if item == MenuItem::Exit {
            break;
        }
        if let Err(err) = dispatch(item, services, prompt) {
            report_error(prompt, &err);
        }
    }
    prompt.say("Goodbye.");
}

/// Print an error the way a user should read it.
pub fn report_error<W: Write>(prompt: &mut Prompter<W>, err: &ScanDeskError) {
    warn!(error = %err, "Operation failed");
    let human = humanize_error(err);
    prompt.say(format!("Error: {}", human.message));
    prompt.say(format!("  {}", human.suggestion));
}

type Outcome = Result<(), ScanDeskError>;

fn dispatch<W: Write>(item: MenuItem, svc: &AppServices, p: &mut Prompter<W>) -> Outcome {
    match item {
        MenuItem::Scan => scan(svc, p),
        MenuItem::ListScanners => {
            list_scanners(svc, p);
            Ok(())
        }
        MenuItem::ListPrinters => {
            list_printers(svc, p);
            Ok(())
        }
        MenuItem::BatchScan => batch_scan(svc, p),
        MenuItem::Combine => combine(svc, p),
        MenuItem::Print => print(svc, p, false),
        MenuItem::AdvancedScan => advanced_scan(svc, p),
        MenuItem::AdvancedPrint => print(svc, p, true),
        MenuItem::ScannerProperties => scanner_properties(svc, p),
        MenuItem::PrintWithViewer => print_with_viewer(svc, p),
        MenuItem::DownloadViewer => download_viewer(svc, p),
        MenuItem::QuickScanToPdf => {
            let document = svc.quick_scan(OutputFormat::Pdf)?;
            p.say(format!("Saved {}", document.file_path.display()));
            Ok(())
        }
        MenuItem::ExtractText => extract_text(svc, p),
        MenuItem::Exit => Ok(()),
    }
}

// -- Scanning -----------------------------------------------------------------

fn ask_format<W: Write>(p: &mut Prompter<W>, default: OutputFormat) -> OutputFormat {
    p.ask_parsed(&format!("Format (jpg/png/pdf/tiff/bmp) [{default}]: "), default)
}

fn scan<W: Write>(svc: &AppServices, p: &mut Prompter<W>) -> Outcome {
    let format = ask_format(p, OutputFormat::Jpg);
    p.say("Scanning...");
    let document = svc.quick_scan(format)?;
    p.say(format!("Saved {}", document.file_path.display()));
    Ok(())
}

fn list_scanners<W: Write>(svc: &AppServices, p: &mut Prompter<W>) {
    let scanners = svc.inventory().list_scanners();
    if scanners.is_empty() {
        p.say("No scanners found.");
        return;
    }
    for scanner in scanners {
        p.say(format!("  {}. {}  [{}]", scanner.index, scanner.display_name, scanner.device_id));
    }
}

fn list_printers<W: Write>(svc: &AppServices, p: &mut Prompter<W>) {
    let printers = svc.inventory().printer_details();
    if printers.is_empty() {
        p.say("No printers found.");
        return;
    }
    for printer in printers {
        p.say(format!(
            "  {}. {}{}  port {}, driver {}, {}",
            printer.device.index,
            printer.device.display_name,
            if printer.is_default { " (default)" } else { "" },
            printer.port,
            printer.driver,
            printer.status_label(),
        ));
    }
}

fn pick_scanner<W: Write>(svc: &AppServices, p: &mut Prompter<W>) -> Result<Option<Device>, ScanDeskError> {
    let scanners = svc.inventory().list_scanners();
    if scanners.is_empty() {
        return Err(ScanDeskError::NoDeviceFound);
    }
    Ok(p
        .choose("Scanner [first]: ", &scanners, |s| s.display_name.clone())
        .cloned())
}

fn advanced_scan<W: Write>(svc: &AppServices, p: &mut Prompter<W>) -> Outcome {
    let scanner = pick_scanner(svc, p)?;
    let defaults = svc.default_request(OutputFormat::Jpg);
    let request = CaptureRequest {
        device_id: scanner.map(|s| s.device_id),
        resolution_dpi: p.ask_parsed(
            &format!("Resolution in dpi [{}]: ", defaults.resolution_dpi),
            defaults.resolution_dpi,
        ),
        color_mode: p.ask_parsed("Colour mode (color/grayscale/bw) [color]: ", ColorMode::Color),
        brightness: p.ask_parsed("Brightness -1000..1000 [0]: ", 0),
        contrast: p.ask_parsed("Contrast -1000..1000 [0]: ", 0),
        output_format: ask_format(p, defaults.output_format),
        page_size: p.ask_parsed("Paper size for PDF (a4/letter/legal/a3/a5) [a4]: ", defaults.page_size),
        output_path: p.ask_optional("Save as [timestamped name]: ").map(PathBuf::from),
    };
    p.say("Scanning...");
    let document = svc.capture().capture(&request)?;
    p.say(format!("Saved {} ({})", document.file_path.display(), document.format));
    Ok(())
}

fn batch_scan<W: Write>(svc: &AppServices, p: &mut Prompter<W>) -> Outcome {
    let pages: usize = p.ask_parsed("Number of pages [2]: ", 2);
    let format = ask_format(p, OutputFormat::Jpg);
    let request = svc.default_request(format);

    // The batch borrows the prompter for its between-page pause.
    let documents = svc.capture().capture_batch(&request, pages, |page| {
        let answer = p.ask(&format!("Load page {page} and press Enter (q to stop): "));
        !answer.eq_ignore_ascii_case("q") && !p.is_closed()
    });
    if documents.is_empty() {
        return Err(ScanDeskError::TransferFailed("no pages were scanned".into()));
    }
    for document in &documents {
        p.say(format!("Saved {}", document.file_path.display()));
    }

    if format != OutputFormat::Pdf && documents.len() > 1 && p.confirm("Combine the pages into one PDF? [y/N] ", false) {
        let images: Vec<PathBuf> = documents.iter().map(|d| d.file_path.clone()).collect();
        let output = images[0].with_extension("pdf");
        let pages = svc.converter().combine(&images, &output)?;
        p.say(format!("Combined {pages} page(s) into {}", output.display()));
    }
    Ok(())
}

fn scanner_properties<W: Write>(svc: &AppServices, p: &mut Prompter<W>) -> Outcome {
    let scanners = svc.inventory().list_scanners();
    let scanner = match pick_scanner(svc, p)? {
        Some(scanner) => scanner,
        None => scanners.into_iter().next().ok_or(ScanDeskError::NoDeviceFound)?,
    };
    let properties = svc.inventory().scanner_properties(&scanner.device_id);
    if properties.is_empty() {
        p.say("No properties reported.");
    }
    for (name, value) in properties {
        p.say(format!("  {name}: {value}"));
    }
    Ok(())
}

// -- Documents ----------------------------------------------------------------

fn combine<W: Write>(svc: &AppServices, p: &mut Prompter<W>) -> Outcome {
    p.say("Enter image paths, one per line. Finish with an empty line.");
    let mut images = Vec::new();
    while let Some(path) = p.ask_optional("  image: ") {
        images.push(PathBuf::from(path.trim_matches('"')));
    }
    let output = p
        .ask_optional("Output PDF [combined.pdf]: ")
        .map_or_else(|| svc.capture().scan_dir().join("combined.pdf"), PathBuf::from);
    let pages = svc.converter().combine(&images, &output)?;
    p.say(format!("Wrote {pages} page(s) to {}", output.display()));
    Ok(())
}

fn ask_file<W: Write>(p: &mut Prompter<W>, question: &str) -> Result<PathBuf, ScanDeskError> {
    let answer = p.ask(question);
    let path = PathBuf::from(answer.trim_matches('"'));
    if answer.is_empty() || !path.is_file() {
        return Err(ScanDeskError::FileNotFound(path));
    }
    Ok(path)
}

fn pick_printer<W: Write>(svc: &AppServices, p: &mut Prompter<W>) -> Option<String> {
    let printers = svc.inventory().list_printers();
    if printers.is_empty() {
        return None;
    }
    p.choose("Printer [default]: ", &printers, |d| d.display_name.clone())
        .map(|d| d.display_name.clone())
}

fn print<W: Write>(svc: &AppServices, p: &mut Prompter<W>, advanced: bool) -> Outcome {
    let file = ask_file(p, "File to print: ")?;
    let mut job = PrintJob::new(file);
    job.printer_name = pick_printer(svc, p);

    if advanced {
        job.settings = ask_settings(p);
        job.ultra_silent = !p.confirm("Allow print dialogs? [y/N] ", false);
    }

    p.say("Printing...");
    let report = svc.resolver().print_document(&job)?;
    p.say(report.status_line());
    Ok(())
}

fn ask_settings<W: Write>(p: &mut Prompter<W>) -> PrintSettings {
    PrintSettings {
        copies: p.ask_optional("Copies [printer default]: ").and_then(|s| s.parse().ok()),
        orientation: p
            .ask_optional("Orientation (portrait/landscape) [printer default]: ")
            .and_then(|s| match s.to_ascii_lowercase().as_str() {
                "portrait" | "p" => Some(Orientation::Portrait),
                "landscape" | "l" => Some(Orientation::Landscape),
                _ => None,
            }),
        duplex: p
            .ask_optional("Duplex (simplex/long/short) [printer default]: ")
            .and_then(|s| s.parse::<DuplexMode>().ok()),
        paper_size: p
            .ask_optional("Paper (a4/letter/legal/a3/a5) [printer default]: ")
            .and_then(|s| s.parse::<PaperSize>().ok()),
        quality: None,
        color: p
            .ask_optional("Colour (color/mono) [printer default]: ")
            .and_then(|s| match s.to_ascii_lowercase().as_str() {
                "color" | "colour" => Some(true),
                "mono" | "monochrome" | "bw" => Some(false),
                _ => None,
            }),
    }
}

fn print_with_viewer<W: Write>(svc: &AppServices, p: &mut Prompter<W>) -> Outcome {
    let file = ask_file(p, "File to print: ")?;
    let printer = pick_printer(svc, p);
    let settings = p.ask_optional(&format!(
        "Print settings [{}]: ",
        svc.config().viewer_print_settings
    ));
    let report = svc
        .resolver()
        .print_with_viewer(&file, printer.as_deref(), settings.as_deref())?;
    p.say(report.status_line());
    Ok(())
}

fn download_viewer<W: Write>(svc: &AppServices, p: &mut Prompter<W>) -> Outcome {
    let resolver = svc.resolver();
    if let Some(existing) = resolver.env().find_viewer() {
        p.say(format!("SumatraPDF is already installed at {}", existing.display()));
        if !p.confirm("Download it again? [y/N] ", false) {
            return Ok(());
        }
    }
    p.say("Downloading...");
    let path = resolver.provision_viewer()?;
    p.say(format!("Installed {}", path.display()));
    Ok(())
}

fn extract_text<W: Write>(svc: &AppServices, p: &mut Prompter<W>) -> Outcome {
    if !svc.extractor().is_available() {
        return Err(ScanDeskError::ServiceUnavailable(format!(
            "set {} to enable text extraction",
            svc.config().extraction.api_key_env
        )));
    }
    let image = ask_file(p, "Image: ")?;
    let want_modified = p.confirm("Also ask for a cleaned-up image? [y/N] ", false);
    let result = svc.extractor().extract(&image, want_modified)?;

    match &result.text {
        Some(text) => {
            p.say("----- extracted text -----");
            p.say(text);
            p.say("--------------------------");
            if p.confirm("Save the text next to the image? [Y/n] ", true) {
                let saved = save_extracted_text(&image, text)?;
                p.say(format!("Saved {}", saved.display()));
            }
        }
        None => p.say("No text was found."),
    }
    if let Some(modified) = &result.modified_image_path {
        p.say(format!("Modified image saved as {}", modified.display()));
    }
    Ok(())
}
