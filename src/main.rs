//! # Bayan CLI
//!
//! Command-line interface for bilingual invoice label printing.
//!
//! ## Usage
//!
//! ```bash
//! # Generate a label without a printer (dry run) and save it
//! bayan print --invoices invoices/ INV-1001 --zpl out.zpl
//!
//! # Print on a paired ZQ520
//! bayan print --invoices invoices.json INV-1001 --device AC:3F:A4:00:11:22
//!
//! # Use the 832-dot template and the printer's own Arabic font
//! bayan print --invoices invoices/ INV-1001 --template zq520-832 --native-arabic
//!
//! # List paired and nearby printers
//! bayan devices
//!
//! # Check whether a printer can render Arabic natively
//! bayan test-arabic --device AC:3F:A4:00:11:22
//!
//! # Print one full-invoice image as a label
//! bayan image invoice.png --device AC:3F:A4:00:11:22
//! ```
//!
//! Set `RUST_LOG=debug` for connection and layout details.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use tracing::info;
use tracing_subscriber::EnvFilter;

use bayan::{
    BayanError,
    invoice::JsonInvoiceProvider,
    job::{Delivery, PrintJob},
    layout::{self, ArabicPolicy, LayoutCompiler, NATIVE_FONT_PATH, Template},
    render::{bitmap, surface::TtfSurface},
    transport::{self, BluetoothDiscovery, BluetoothLink, PrinterSession},
};

/// Fonts with Arabic coverage tried when `--arabic-font` is not given.
const SYSTEM_ARABIC_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/noto/NotoSansArabic-Regular.ttf",
    "/usr/share/fonts/noto/NotoSansArabic-Regular.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
];

/// Bayan - bilingual invoice labels for Zebra printers
#[derive(Parser, Debug)]
#[command(name = "bayan")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Label template selection, shared by the printing commands.
#[derive(clap::Args, Debug)]
struct TemplateArgs {
    /// Template preset (zq520, zq520-832)
    #[arg(long, default_value = "zq520")]
    template: String,

    /// Template JSON file, overrides --template
    #[arg(long, value_name = "FILE")]
    template_file: Option<PathBuf>,
}

/// Output options, shared by the printing commands.
#[derive(clap::Args, Debug)]
struct OutputArgs {
    /// Printer Bluetooth address; omit for a dry run
    #[arg(long, value_name = "MAC")]
    device: Option<String>,

    /// RFCOMM channel index (/dev/rfcommN)
    #[arg(long, default_value = "0")]
    channel: u8,

    /// Also write the generated ZPL to this file
    #[arg(long, value_name = "FILE")]
    zpl: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print an invoice label
    Print {
        /// Invoice uid
        uid: String,

        /// Invoice JSON file or directory of <uid>.json files
        #[arg(long, value_name = "PATH")]
        invoices: PathBuf,

        #[command(flatten)]
        template: TemplateArgs,

        #[command(flatten)]
        output: OutputArgs,

        /// TrueType font used to rasterize Arabic text
        #[arg(long, value_name = "FILE")]
        arabic_font: Option<PathBuf>,

        /// Print Arabic with a printer-resident font instead of bitmaps
        #[arg(long)]
        native_arabic: bool,

        /// Printer font file used with --native-arabic
        #[arg(long, default_value = NATIVE_FONT_PATH)]
        native_font: String,

        /// Refuse invoices whose totals do not add up
        #[arg(long)]
        strict: bool,
    },

    /// List paired and nearby Bluetooth devices
    Devices,

    /// Print a small label exercising native Arabic fonts
    TestArabic {
        #[command(flatten)]
        template: TemplateArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Print a full-invoice PNG as one graphic label
    Image {
        /// PNG file
        png: PathBuf,

        #[command(flatten)]
        output: OutputArgs,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), BayanError> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Print {
            uid,
            invoices,
            template,
            output,
            arabic_font,
            native_arabic,
            native_font,
            strict,
        } => {
            let template = load_template(&template)?;
            let provider = JsonInvoiceProvider::new(&invoices);

            let surface;
            let policy = if native_arabic {
                ArabicPolicy::NativeFont {
                    font_path: &native_font,
                }
            } else {
                surface = load_surface(arabic_font.as_deref())?;
                ArabicPolicy::Raster(&surface)
            };
            let compiler = LayoutCompiler::new(template, policy);
            let job = PrintJob::new(&provider, &compiler).strict(strict);

            let outcome = match &output.device {
                Some(device) => {
                    let mut session = connect(device, output.channel)?;
                    let outcome = job.print(&uid, &mut session);
                    session.finish(outcome)?
                }
                None => job.dry_run(&uid)?,
            };

            save_zpl(output.zpl.as_deref(), &outcome.zpl)?;
            match &outcome.delivery {
                Delivery::Printed { device, bytes } => {
                    println!("Printed invoice {} on {} ({} bytes)", outcome.invoice_number, device, bytes);
                }
                Delivery::DryRun => {
                    println!(
                        "No printer connected. Generated invoice {} ({} bytes)",
                        outcome.invoice_number,
                        outcome.size()
                    );
                }
            }
        }

        Commands::Devices => {
            let devices = transport::list_devices(&BluetoothDiscovery)?;
            if devices.is_empty() {
                println!("No Bluetooth devices found. Pair the printer first.");
            }
            for device in devices {
                println!("{}  {}", device.address, device.name);
            }
        }

        Commands::TestArabic { template, output } => {
            let template = load_template(&template)?;
            let zpl = layout::arabic_test_label(&template);
            deliver(&zpl, &output)?;
        }

        Commands::Image { png, output } => {
            let bytes = std::fs::read(&png)?;
            let zpl = bitmap::image_label(&bytes)?;
            deliver(&zpl, &output)?;
        }
    }

    Ok(())
}

fn load_template(args: &TemplateArgs) -> Result<Template, BayanError> {
    match &args.template_file {
        Some(path) => Template::from_json_file(path),
        None => {
            let template = Template::parse(&args.template).map_err(BayanError::Config)?;
            template.validate()?;
            Ok(template)
        }
    }
}

fn load_surface(font: Option<&Path>) -> Result<TtfSurface, BayanError> {
    if let Some(path) = font {
        return TtfSurface::from_file(path);
    }
    let found = SYSTEM_ARABIC_FONTS
        .iter()
        .map(Path::new)
        .find(|p| p.exists())
        .ok_or_else(|| {
            BayanError::Config(
                "no Arabic font found; pass --arabic-font FILE or use --native-arabic".to_string(),
            )
        })?;
    info!(font = %found.display(), "rasterizing Arabic with system font");
    TtfSurface::from_file(found)
}

fn connect(device: &str, channel: u8) -> Result<PrinterSession<BluetoothLink>, BayanError> {
    let mut session = PrinterSession::new(BluetoothLink::with_channel(device, channel)?);
    session.connect()?;
    Ok(session)
}

/// Write a ready document to the device, or report a dry run.
fn deliver(zpl: &str, output: &OutputArgs) -> Result<(), BayanError> {
    save_zpl(output.zpl.as_deref(), zpl)?;
    match &output.device {
        Some(device) => {
            let mut session = connect(device, output.channel)?;
            let written = session.write(zpl);
            let written = session.finish(written)?;
            println!("Printed {} bytes on {}", written, device);
        }
        None => println!("No printer connected. Generated {} bytes", zpl.len()),
    }
    Ok(())
}

fn save_zpl(path: Option<&Path>, zpl: &str) -> Result<(), BayanError> {
    if let Some(path) = path {
        std::fs::write(path, zpl)?;
        println!("Saved ZPL to {}", path.display());
    }
    Ok(())
}
