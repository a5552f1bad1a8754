// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// ScanDesk — scanner capture and silent printing for Windows desktops.
//
// Entry point. Initialises logging and the backend services, then either
// runs a single command or the interactive menu.

mod menu;
mod prompt;
mod services;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{error, info};

use scandesk_core::error::ScanDeskError;
use scandesk_core::{DuplexMode, Orientation, OutputFormat, PaperSize, PrintJob, PrintSettings};
use scandesk_document::save_extracted_text;

use prompt::{ConsoleInput, Prompter};
use services::app_services::AppServices;

#[derive(Parser)]
#[command(name = "scandesk")]
#[command(about = "ScanDesk — scan documents and print them without dialogs")]
#[command(version)]
struct Cli {
    /// Runs the interactive menu when omitted.
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan one page as PDF (A4, 300 dpi, colour) from the first scanner
    #[command(visible_alias = "1")]
    Scan,
    /// Print a document silently through SumatraPDF
    #[command(name = "print-with-viewer", visible_alias = "print_with_sumatra")]
    PrintWithViewer {
        file: PathBuf,
        /// Printer name; the configured or system default when omitted
        #[arg(short, long)]
        printer: Option<String>,
        /// Raw SumatraPDF -print-settings value
        #[arg(short, long)]
        settings: Option<String>,
    },
    /// Print any file, trying every silent method in turn
    Print {
        file: PathBuf,
        #[arg(short, long)]
        printer: Option<String>,
        #[arg(short, long)]
        copies: Option<u16>,
        /// simplex, long or short
        #[arg(short, long)]
        duplex: Option<DuplexMode>,
        #[arg(short, long)]
        landscape: bool,
        /// a4, letter, legal, a3 or a5
        #[arg(long)]
        paper: Option<PaperSize>,
        /// Skip the silent cascade and go straight to the dialog fallbacks
        #[arg(long)]
        dialog: bool,
    },
    /// Read the text in an image with the cloud vision model
    Extract {
        image: PathBuf,
        /// Also request a cleaned-up copy of the image
        #[arg(long)]
        modified: bool,
        /// Save the text as <stem>_extracted_text.txt
        #[arg(long)]
        save: bool,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    info!("ScanDesk starting");

    let input = ConsoleInput::stdin();
    let services = match AppServices::init(input.clone()) {
        Ok(services) => services,
        Err(err) => {
            error!(error = %err, "Backend services failed to start");
            return fail(&err);
        }
    };

    let outcome = match cli.command {
        None => {
            let mut prompt = Prompter::new(input, std::io::stdout());
            menu::run(&services, &mut prompt);
            Ok(())
        }
        Some(Commands::Scan) => services.quick_scan(OutputFormat::Pdf).map(|document| {
            println!("Saved {}", document.file_path.display());
        }),
        Some(Commands::PrintWithViewer {
            file,
            printer,
            settings,
        }) => services
            .resolver()
            .print_with_viewer(&file, printer.as_deref(), settings.as_deref())
            .map(|report| println!("{}", report.status_line())),
        Some(Commands::Print {
            file,
            printer,
            copies,
            duplex,
            landscape,
            paper,
            dialog,
        }) => {
            let mut job = PrintJob::new(file).with_settings(PrintSettings {
                copies,
                duplex,
                orientation: landscape.then_some(Orientation::Landscape),
                paper_size: paper,
                ..PrintSettings::default()
            });
            job.printer_name = printer;
            job.ultra_silent = !dialog;
            services
                .resolver()
                .print_document(&job)
                .map(|report| println!("{}", report.status_line()))
        }
        Some(Commands::Extract {
            image,
            modified,
            save,
        }) => extract(&services, &image, modified, save),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => fail(&err),
    }
}

fn extract(
    services: &AppServices,
    image: &std::path::Path,
    modified: bool,
    save: bool,
) -> Result<(), ScanDeskError> {
    let result = services.extractor().extract(image, modified)?;
    match &result.text {
        Some(text) => {
            println!("{text}");
            if save {
                let saved = save_extracted_text(image, text)?;
                eprintln!("Saved {}", saved.display());
            }
        }
        None => eprintln!("No text was found."),
    }
    if let Some(path) = &result.modified_image_path {
        eprintln!("Modified image saved as {}", path.display());
    }
    Ok(())
}

fn fail(err: &ScanDeskError) -> ExitCode {
    let human = scandesk_core::human_errors::humanize_error(err);
    eprintln!("Error: {}", human.message);
    eprintln!("  {}", human.suggestion);
    ExitCode::FAILURE
}
