//! form1x CLI - Form 1 asset table extraction tool

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use form1x::{
    pipeline::discover_pdfs, CancellationToken, Config, CsvTableWriter, Document, LocatorMode,
    PageLog, PageStatus, Pipeline,
};

#[derive(Parser)]
#[command(name = "form1x")]
#[command(version)]
#[command(about = "Locate and extract Form 1 asset tables from PDF filings", long_about = None)]
struct Cli {
    /// JSON configuration file
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// tesseract executable
    #[arg(long, global = true, env = "FORM1X_TESSERACT", value_name = "PATH")]
    tesseract: Option<PathBuf>,

    /// pdftoppm executable
    #[arg(long, global = true, env = "FORM1X_PDFTOPPM", value_name = "PATH")]
    pdftoppm: Option<PathBuf>,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Do not append to extraction.log
    #[arg(long, global = true)]
    no_log_file: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process every PDF in a directory
    Run {
        /// Directory containing PDF files
        #[arg(value_name = "INPUT_DIR")]
        input: PathBuf,

        /// Output directory for extracted tables
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,

        /// Run log CSV
        #[arg(long, value_name = "FILE")]
        log: Option<PathBuf>,

        /// Directory for preprocessed OCR page images
        #[arg(long, value_name = "DIR")]
        debug_dir: Option<PathBuf>,

        /// Page locator
        #[arg(long, value_enum)]
        locator: Option<LocatorArg>,

        /// Disable the spatial OCR fallback
        #[arg(long)]
        no_ocr_fallback: bool,
    },

    /// Print the indices of pages carrying Form 1 markers
    Locate {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Page locator
        #[arg(long, value_enum)]
        locator: Option<LocatorArg>,
    },

    /// Print the text/image classification of every page
    Classify {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Extract the table of a single page
    Extract {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Page index (0-indexed, as printed by `locate`)
        #[arg(long)]
        page: usize,

        /// Output CSV file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Disable the spatial OCR fallback
        #[arg(long)]
        no_ocr_fallback: bool,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum LocatorArg {
    /// Embedded text only
    Native,
    /// OCR of pages with embedded images
    Ocr,
    /// Embedded text, OCR for scanned pages
    Auto,
}

impl From<LocatorArg> for LocatorMode {
    fn from(arg: LocatorArg) -> Self {
        match arg {
            LocatorArg::Native => LocatorMode::Native,
            LocatorArg::Ocr => LocatorMode::Ocr,
            LocatorArg::Auto => LocatorMode::Auto,
        }
    }
}

/// Log sink writing every line to stderr and, when open, a log file.
struct TeeWriter {
    file: Option<File>,
}

impl Write for TeeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stderr().write_all(buf)?;
        if let Some(file) = &mut self.file {
            file.write_all(buf)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()?;
        if let Some(file) = &mut self.file {
            file.flush()?;
        }
        Ok(())
    }
}

fn init_logging(cli: &Cli) {
    let level = match (cli.quiet, cli.verbose) {
        (true, _) => log::LevelFilter::Warn,
        (false, 0) => log::LevelFilter::Info,
        (false, 1) => log::LevelFilter::Debug,
        (false, _) => log::LevelFilter::Trace,
    };

    let file = if cli.no_log_file {
        None
    } else {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open("extraction.log")
            .map_err(|e| eprintln!("{}: cannot open extraction.log: {}", "Warning".yellow(), e))
            .ok()
    };

    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format(|buf, record| {
            writeln!(
                buf,
                "{} | {} | {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(TeeWriter { file })))
        .init();
}

fn load_config(cli: &Cli) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => Config::from_json_file(path)?,
        None => Config::default(),
    };
    if let Some(cmd) = &cli.tesseract {
        config = config.with_tesseract_cmd(cmd);
    }
    if let Some(cmd) = &cli.pdftoppm {
        config = config.with_pdftoppm_cmd(cmd);
    }
    Ok(config)
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli);

    let result = load_config(&cli).and_then(|config| match cli.command {
        Commands::Run {
            input,
            output,
            log,
            debug_dir,
            locator,
            no_ocr_fallback,
        } => {
            let mut config = config;
            if let Some(dir) = output {
                config = config.with_output_dir(dir);
            }
            if let Some(path) = log {
                config = config.with_log_path(path);
            }
            if let Some(dir) = debug_dir {
                config = config.with_debug_dir(dir);
            }
            if let Some(mode) = locator {
                config = config.with_locator_mode(mode.into());
            }
            if no_ocr_fallback {
                config = config.with_ocr_fallback(false);
            }
            cmd_run(&input, config)
        }
        Commands::Locate { input, locator } => {
            let config = match locator {
                Some(mode) => config.with_locator_mode(mode.into()),
                None => config,
            };
            cmd_locate(&input, config)
        }
        Commands::Classify { input } => cmd_classify(&input, config),
        Commands::Extract {
            input,
            page,
            output,
            no_ocr_fallback,
        } => {
            let config = config
                .with_ocr_fallback(!no_ocr_fallback)
                .without_debug_dir();
            cmd_extract(&input, page, output.as_deref(), config)
        }
    });

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn status_label(entry: &PageLog) -> colored::ColoredString {
    let label = entry.status.as_str();
    match entry.status {
        PageStatus::Success => label.green().bold(),
        PageStatus::Skipped => label.yellow(),
        PageStatus::Failed => label.red(),
        PageStatus::Error(_) => label.red().bold(),
    }
}

fn cmd_run(input: &Path, config: Config) -> Result<(), Box<dyn std::error::Error>> {
    fs::create_dir_all(&config.output.output_dir)?;
    let files = discover_pdfs(input)?;
    if files.is_empty() {
        println!("{} {}", "No PDF files found in".yellow(), input.display());
        return Ok(());
    }

    let pipeline = Pipeline::new(config);
    let cancel = CancellationToken::new();

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );

    let report = pipeline.process_files(&files, &cancel, |entry| {
        pb.println(format!("  {} {}", status_label(entry), entry.filename));
        pb.set_message(entry.filename.clone());
        pb.inc(1);
    })?;
    pb.finish_with_message("Done!");

    let log_path = &pipeline.config().output.log_path;
    report.write_csv(log_path)?;

    println!("\n{}", "Summary".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    println!(
        "{}: {}",
        "Success".bold(),
        report.count(&PageStatus::Success)
    );
    println!(
        "{}: {}",
        "Skipped".bold(),
        report.count(&PageStatus::Skipped)
    );
    println!("{}: {}", "Failed".bold(), report.count(&PageStatus::Failed));
    println!(
        "{}: {}",
        "Errors".bold(),
        report.count(&PageStatus::Error(String::new()))
    );
    println!("{} {}", "Run log:".green(), log_path.display());

    Ok(())
}

fn cmd_locate(input: &Path, config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let document = Document::open(input)?;
    let pipeline = Pipeline::new(config);
    let pages = pipeline.locate(&document, &CancellationToken::new())?;

    if pages.is_empty() {
        println!("{}", "No Form 1 pages found".yellow());
    } else {
        let list: Vec<String> = pages.iter().map(|p| p.to_string()).collect();
        println!("{}", list.join(" "));
    }
    Ok(())
}

fn cmd_classify(input: &Path, config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let document = Document::open(input)?;
    let classifier = Pipeline::new(config).classifier();

    println!("{}", "Page Classification".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    for index in 0..document.page_count() {
        let c = classifier.classify_page(&document, index)?;
        let kind = match c.kind {
            form1x::PageKind::Text => "text".green(),
            form1x::PageKind::Image => "image".yellow(),
        };
        println!(
            "{:>4}  {:<6} ratio {:.3}  (text {:.0}, images {:.0})",
            index, kind, c.ratio, c.text_area, c.image_area
        );
    }
    Ok(())
}

fn cmd_extract(
    input: &Path,
    page: usize,
    output: Option<&Path>,
    config: Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let document = Document::open(input)?;
    let pipeline = Pipeline::new(config);
    let result = pipeline.extract_page(&document, page, &CancellationToken::new())?;

    let (Some(table), Some(method)) = (result.table, result.method) else {
        return Err(format!("no table found on page {}", page).into());
    };

    let writer = CsvTableWriter::new();
    if let Some(path) = output {
        form1x::TableWriter::write(&writer, &table, path)?;
        println!(
            "{} {} rows ({}) to {}",
            "Saved".green(),
            table.row_count(),
            method,
            path.display()
        );
    } else {
        print!("{}", writer.to_csv_string(&table)?);
    }
    Ok(())
}
