//! Parse command - extract roll and customer from label pages.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use clap::Args;
use console::style;
use image::DynamicImage;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::Semaphore;
use tracing::{debug, info};

use rollscan_core::models::config::RasterizerKind;
use rollscan_core::{
    BatchDriver, EmbeddedRasterizer, LabelParser, PageRange, PageResult, PdftoppmRasterizer,
    Rasterizer, RollscanConfig, TesseractCli,
};

type Driver = BatchDriver<TesseractCli, Box<dyn Rasterizer + Send + Sync>>;

/// Arguments for the parse command.
#[derive(Args)]
pub struct ParseArgs {
    /// Input file (PDF or image)
    #[arg(required = true)]
    input: PathBuf,

    /// Pages to parse, e.g. "3" or "1-20" (default: all)
    #[arg(short, long)]
    pages: Option<PageRange>,

    /// Drop text lines shorter than this fraction of the page height
    #[arg(long)]
    min_height_ratio: Option<f32>,

    /// Rendering resolution for PDF pages
    #[arg(long)]
    dpi: Option<u32>,

    /// How PDF pages are turned into images
    #[arg(long, value_enum)]
    rasterizer: Option<RasterizerArg>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Number of pages parsed in parallel
    #[arg(short = 'j', long, default_value = "1")]
    jobs: usize,

    /// Skip the cropped re-read of the roll line
    #[arg(long)]
    no_refine: bool,

    /// Skip the whole-page plain-text fallback
    #[arg(long)]
    no_fallback: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text table
    Text,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum RasterizerArg {
    /// Render pages with pdftoppm
    Pdftoppm,
    /// Use the image embedded in each page
    Embedded,
}

impl From<RasterizerArg> for RasterizerKind {
    fn from(arg: RasterizerArg) -> Self {
        match arg {
            RasterizerArg::Pdftoppm => RasterizerKind::Pdftoppm,
            RasterizerArg::Embedded => RasterizerKind::Embedded,
        }
    }
}

pub async fn run(args: ParseArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = super::load_config(config_path)?;
    apply_overrides(&mut config, &args);
    config.extraction.validate()?;

    // Check input file exists
    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let extension = args
        .input
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    info!("Processing file: {}", args.input.display());

    let results = match extension.as_str() {
        "pdf" => parse_pdf(&args, &config).await?,
        "png" | "jpg" | "jpeg" | "tif" | "tiff" | "bmp" => {
            if args.pages.is_some() {
                anyhow::bail!("--pages only applies to PDF input");
            }
            vec![parse_single_image(&args, &config)?]
        }
        _ => anyhow::bail!("Unsupported file format: {}", extension),
    };

    let output = format_results(&results, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        eprintln!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        print!("{}", output);
    }

    let complete = results.iter().filter(|r| r.is_complete()).count();
    eprintln!(
        "{} Parsed {} pages in {:?}, {} with roll and customer",
        style("✓").green(),
        results.len(),
        start.elapsed(),
        style(complete).green()
    );

    Ok(())
}

fn apply_overrides(config: &mut RollscanConfig, args: &ParseArgs) {
    if let Some(ratio) = args.min_height_ratio {
        config.extraction.min_height_ratio = ratio;
    }
    if let Some(dpi) = args.dpi {
        config.pdf.render_dpi = dpi;
    }
    if let Some(rasterizer) = args.rasterizer {
        config.pdf.rasterizer = rasterizer.into();
    }
    if args.no_refine {
        config.extraction.refine_roll = false;
    }
    if args.no_fallback {
        config.extraction.text_fallback = false;
    }
}

fn build_parser(config: &RollscanConfig) -> LabelParser<TesseractCli> {
    LabelParser::from_config(TesseractCli::from_config(&config.ocr), config)
}

fn build_driver(config: &RollscanConfig) -> Driver {
    let rasterizer: Box<dyn Rasterizer + Send + Sync> = match config.pdf.rasterizer {
        RasterizerKind::Pdftoppm => Box::new(PdftoppmRasterizer::new(&config.pdf.pdftoppm_path)),
        RasterizerKind::Embedded => Box::new(EmbeddedRasterizer),
    };
    BatchDriver::new(build_parser(config), rasterizer).with_dpi(config.pdf.render_dpi)
}

async fn parse_pdf(args: &ParseArgs, config: &RollscanConfig) -> anyhow::Result<Vec<PageResult>> {
    let driver = build_driver(config);
    let range = driver.resolve_range(&args.input, args.pages)?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_message(format!("Rendering pages {}-{}...", range.first, range.last));
    let images = driver.rasterize(&args.input, range)?;
    spinner.finish_and_clear();
    debug!("Rendered {} pages", images.len());

    let pb = ProgressBar::new(images.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} pages")
            .unwrap()
            .progress_chars("=>-"),
    );

    let results = if args.jobs <= 1 {
        let results = driver.parse_pages(&images, range.first)?;
        pb.inc(results.len() as u64);
        results
    } else {
        parse_parallel(Arc::new(driver), images, range.first, args.jobs, &pb).await?
    };

    pb.finish_and_clear();
    Ok(results)
}

/// Parse one page through the driver so numbering matches the sequential path.
fn parse_page(driver: &Driver, image: &DynamicImage, page: u32) -> anyhow::Result<PageResult> {
    driver
        .parse_pages(std::slice::from_ref(image), page)
        .map_err(|e| anyhow::anyhow!("Page {}: {}", page, e))?
        .pop()
        .ok_or_else(|| anyhow::anyhow!("Page {}: no result", page))
}

/// Parse pages as independent blocking tasks, returning results in page order.
async fn parse_parallel(
    driver: Arc<Driver>,
    images: Vec<DynamicImage>,
    first_page: u32,
    jobs: usize,
    pb: &ProgressBar,
) -> anyhow::Result<Vec<PageResult>> {
    let semaphore = Arc::new(Semaphore::new(jobs));
    let mut handles = Vec::with_capacity(images.len());

    for (image, page) in images.into_iter().zip(first_page..) {
        let permit = Arc::clone(&semaphore).acquire_owned().await?;
        let driver = Arc::clone(&driver);
        let pb = pb.clone();
        handles.push(tokio::task::spawn_blocking(move || {
            let _permit = permit;
            let result = parse_page(&driver, &image, page);
            pb.inc(1);
            result
        }));
    }

    let mut results = Vec::with_capacity(handles.len());
    for handle in handles {
        results.push(handle.await??);
    }
    Ok(results)
}

fn parse_single_image(args: &ParseArgs, config: &RollscanConfig) -> anyhow::Result<PageResult> {
    let image = image::open(&args.input)?;
    let mut result = build_parser(config).parse_image(&image)?;
    result.page = 1;
    Ok(result)
}

fn format_results(results: &[PageResult], format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(results)? + "\n"),
        OutputFormat::Csv => format_results_csv(results),
        OutputFormat::Text => Ok(format_results_text(results)),
    }
}

fn format_results_csv(results: &[PageResult]) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record(["page", "roll", "customer"])?;
    for result in results {
        wtr.write_record([
            result.page.to_string().as_str(),
            result.roll.as_deref().unwrap_or(""),
            result.customer.as_deref().unwrap_or(""),
        ])?;
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_results_text(results: &[PageResult]) -> String {
    let mut output = String::new();

    output.push_str(&format!("{:>4}  {:<12}  {}\n", "Page", "Roll", "Customer"));
    for result in results {
        output.push_str(&format!(
            "{:>4}  {:<12}  {}\n",
            result.page,
            result.roll.as_deref().unwrap_or("-"),
            result.customer.as_deref().unwrap_or("-")
        ));
    }

    output
}
