use clap::{Parser, Subcommand};
use env_logger::Env;
use imgbound::imaging::{self, Bounds, ImageBackend, OutputFormat, RustBackend};
use imgbound::{batch, config, naming, output};
use log::info;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Compression flags shared by `compress` and `batch`.
///
/// Each flag overrides the matching `[compress]` key from the config file.
/// Zero or negative limits mean "no constraint".
#[derive(clap::Args, Clone)]
struct CompressArgs {
    /// Output directory
    #[arg(long, default_value = "compressed")]
    output_dir: PathBuf,

    /// Width ceiling in pixels
    #[arg(long, allow_negative_numbers = true)]
    max_width: Option<i64>,

    /// Height ceiling in pixels
    #[arg(long, allow_negative_numbers = true)]
    max_height: Option<i64>,

    /// Byte budget for the encoded file
    #[arg(long, allow_negative_numbers = true)]
    max_bytes: Option<i64>,

    /// Quality floor for the search (0-100)
    #[arg(long)]
    min_quality: Option<u32>,

    /// Output format: jpeg, png or webp
    #[arg(long)]
    format: Option<OutputFormat>,
}

impl CompressArgs {
    fn overrides(&self) -> config::Overrides {
        config::Overrides {
            max_width: self.max_width,
            max_height: self.max_height,
            max_bytes_length: self.max_bytes,
            min_quality: self.min_quality,
            format: self.format,
        }
    }
}

#[derive(Parser)]
#[command(name = "imgbound")]
#[command(about = "Downscale and re-encode images to fit a pixel and byte budget")]
#[command(long_about = "\
Downscale and re-encode images to fit a pixel and byte budget

Images larger than the width/height ceiling are scaled down uniformly.
Lossy formats are then encoded at decreasing quality until the output fits
the byte budget or the quality floor is reached.

Settings resolve in order (later wins):
  stock defaults → imgbound.toml → command-line flags

Run 'imgbound gen-config' to generate a documented imgbound.toml.")]
#[command(version)]
struct Cli {
    /// Config file (missing file = stock defaults)
    #[arg(long, default_value = config::CONFIG_FILE_NAME, global = true)]
    config: PathBuf,

    /// Increase log verbosity (-v warn, -vv info, -vvv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compress a single image
    Compress {
        /// Source image
        source: PathBuf,

        /// Output base name (default: current unix time in seconds)
        #[arg(long)]
        name: Option<String>,

        /// Print the outcome as JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        args: CompressArgs,
    },
    /// Print an image's dimensions without decoding its pixels
    Probe {
        /// Image to probe
        file: PathBuf,
    },
    /// Decode an image bounded to a preview box
    Preview {
        /// Image to decode
        file: PathBuf,

        /// Preview box width in pixels
        #[arg(long)]
        width: u32,

        /// Preview box height in pixels
        #[arg(long)]
        height: u32,
    },
    /// Compress every supported image under a directory
    Batch {
        /// Source directory
        dir: PathBuf,

        #[command(flatten)]
        args: CompressArgs,
    },
    /// Print a stock imgbound.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Compress {
            source,
            name,
            json,
            args,
        } => {
            let config = config::load_config(&cli.config, &args.overrides())?;
            let params = config.to_params();
            let base_name = name.unwrap_or_else(|| naming::timestamp_base_name(SystemTime::now()));
            let backend = RustBackend::new();

            let outcome = imaging::compress_with_backend(
                &backend,
                &source,
                &args.output_dir,
                &base_name,
                &params,
            )?;

            if json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                let written = imaging::decode(&backend, &outcome.path, Bounds::NONE)?;
                let lines = output::format_compress_report(
                    &source,
                    file_size(&source),
                    &outcome,
                    backend.dimensions(&written),
                );
                print_lines(&lines);
            }
        }
        Command::Probe { file } => {
            let dims = imaging::identify(&RustBackend::new(), &file)?;
            print_lines(&output::format_probe(&file, dims, file_size(&file)));
        }
        Command::Preview {
            file,
            width,
            height,
        } => {
            let backend = RustBackend::new();
            let intrinsic = imaging::identify(&backend, &file)?;
            let raster = imaging::decode(&backend, &file, Bounds::new(width, height))?;
            print_lines(&output::format_preview(
                &file,
                intrinsic,
                backend.dimensions(&raster),
            ));
        }
        Command::Batch { dir, args } => {
            let config = config::load_config(&cli.config, &args.overrides())?;
            let params = config.to_params();
            init_thread_pool(&config.processing);

            let sources = batch::collect_sources(&dir, Some(&args.output_dir))?;
            info!("{} source images under {}", sources.len(), dir.display());

            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    print_lines(&output::format_batch_event(&event));
                }
            });
            let summary = batch::compress_all(
                &RustBackend::new(),
                &sources,
                &args.output_dir,
                &params,
                Some(tx),
            );
            printer
                .join()
                .map_err(|_| "batch output thread panicked")?;
            println!("{}", output::format_batch_summary(&summary));

            if summary.failed > 0 {
                return Err(format!("{} of {} images failed", summary.failed, sources.len()).into());
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Map `-v` occurrences to a default filter; `RUST_LOG` still wins.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "error",
        1 => "warn",
        2 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; config can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}

fn file_size(path: &Path) -> Option<u64> {
    std::fs::metadata(path).ok().map(|m| m.len())
}

fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{}", line);
    }
}
