//! zsession - zstd compression with shared dictionaries and side-channel records
//!
//! Compresses and decompresses files through the zsession session layer,
//! attaches or reads skippable records, and inspects frame headers.

mod display;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use console::style;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};
use zsession_codec::{
    codec_version, codec_version_string, compress_async, copy_compress, copy_decompress,
    decompress_async, prepend_skippable_record, skippable_records, write_skippable_record,
    CompressOptions, DecompressOptions, ExecutionBridge,
};
use zsession_config::{Config, ConfigLoader, LoggingConfig};
use zsession_types::{BridgeMode, MagicVariant};

/// zsession - zstd compression with shared dictionaries
#[derive(Parser)]
#[command(
    name = "zsession",
    version = env!("CARGO_PKG_VERSION"),
    about = "zstd compression with shared dictionaries and side-channel records",
    long_about = "zsession compresses and decompresses files with zstd, optionally using a\n\
                  shared dictionary, and can attach opaque metadata records that zstd\n\
                  decoders skip."
)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Verbose mode - detailed output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compress a file
    Compress {
        /// Input file
        input: PathBuf,
        /// Output file (default: input with .zst appended)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Compression level (negative levels trade ratio for speed)
        #[arg(short, long, allow_negative_numbers = true)]
        level: Option<i32>,
        /// Dictionary file
        #[arg(short = 'D', long)]
        dict: Option<PathBuf>,
        /// Worker threads for the codec's internal pool
        #[arg(short, long)]
        workers: Option<u32>,
        /// Run the codec on the blocking thread pool
        #[arg(long)]
        offload: bool,
        /// Attach a skippable record with this payload in front of the frame
        #[arg(long)]
        record: Option<String>,
        /// Magic variant for the attached record (0-15)
        #[arg(long)]
        variant: Option<u8>,
        /// Overwrite the output file if it exists
        #[arg(short, long)]
        force: bool,
    },
    /// Decompress a file
    Decompress {
        /// Input file
        input: PathBuf,
        /// Output file (default: input without .zst)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Dictionary file
        #[arg(short = 'D', long)]
        dict: Option<PathBuf>,
        /// Run the codec on the blocking thread pool
        #[arg(long)]
        offload: bool,
        /// Overwrite the output file if it exists
        #[arg(short, long)]
        force: bool,
    },
    /// Show the frame headers at the start of a file
    Inspect {
        /// File to inspect
        input: PathBuf,
    },
    /// Write or read skippable records
    Skippable {
        #[command(subcommand)]
        action: SkippableCommand,
    },
    /// Show the linked codec version
    Version,
    /// Show configuration
    Config {
        /// Show default configuration
        #[arg(long)]
        default: bool,
        /// Write the default configuration to this file
        #[arg(long)]
        generate: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum SkippableCommand {
    /// Put a record in front of an existing file
    Add {
        /// File to prepend the record to
        input: PathBuf,
        /// Record payload
        payload: String,
        /// Output file (default: rewrite the input)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Magic variant (0-15)
        #[arg(long)]
        variant: Option<u8>,
    },
    /// Print the records at the start of a file
    Read {
        /// File to read
        input: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => ConfigLoader::load_from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => ConfigLoader::load_default().context("Failed to load configuration")?,
    };

    init_logging(&config.logging, cli.debug, cli.quiet, cli.verbose);

    info!("zsession v{} starting", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Compress {
            input,
            output,
            level,
            dict,
            workers,
            offload,
            record,
            variant,
            force,
        } => {
            let options = compress_options(&config, level, dict.as_deref(), workers)?;
            let record = match record {
                Some(payload) => Some((payload, magic_variant(&config, variant)?)),
                None => None,
            };
            let output = output.unwrap_or_else(|| compressed_path(&input));
            let mode = bridge_mode(&config, offload);
            compress_command(&config, &input, &output, options, record, mode, force, cli.quiet).await?;
        }
        Commands::Decompress {
            input,
            output,
            dict,
            offload,
            force,
        } => {
            let options = decompress_options(&config, dict.as_deref())?;
            let output = output.unwrap_or_else(|| decompressed_path(&input));
            let mode = bridge_mode(&config, offload);
            decompress_command(&config, &input, &output, options, mode, force, cli.quiet).await?;
        }
        Commands::Inspect { input } => {
            let bytes = read_file(&input)?;
            display::print_inspection(&input, &bytes);
        }
        Commands::Skippable { action } => match action {
            SkippableCommand::Add {
                input,
                payload,
                output,
                variant,
            } => {
                let variant = magic_variant(&config, variant)?;
                let output = output.unwrap_or_else(|| input.clone());
                skippable_add_command(&input, &output, payload.as_bytes(), variant, cli.quiet)?;
            }
            SkippableCommand::Read { input } => skippable_read_command(&input)?,
        },
        Commands::Version => {
            println!(
                "zsession {} (zstd {}, {})",
                env!("CARGO_PKG_VERSION"),
                codec_version_string(),
                codec_version()
            );
        }
        Commands::Config { default, generate } => config_command(&config, default, generate)?,
    }

    Ok(())
}

fn init_logging(logging: &LoggingConfig, debug: bool, quiet: bool, verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let level = if debug {
        "debug"
    } else if verbose {
        "info"
    } else if quiet {
        "error"
    } else {
        logging.level.as_str()
    };

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let builder = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr);

    if logging.json_format {
        builder.json().init();
    } else {
        builder.with_ansi(logging.colored_output).init();
    }
}

fn compress_options(
    config: &Config,
    level: Option<i32>,
    dict: Option<&Path>,
    workers: Option<u32>,
) -> Result<CompressOptions> {
    let mut options = CompressOptions::with_level(level.unwrap_or_else(|| config.codec.level.get()))?
        .workers(workers.unwrap_or_else(|| config.codec.workers.get()))?;
    if let Some(path) = dict.or(config.codec.dictionary.as_deref()) {
        options = options.dictionary(read_file(path)?);
    }
    Ok(options)
}

fn decompress_options(config: &Config, dict: Option<&Path>) -> Result<DecompressOptions> {
    let mut options = DecompressOptions::new();
    if let Some(path) = dict.or(config.codec.dictionary.as_deref()) {
        options = options.dictionary(read_file(path)?);
    }
    Ok(options)
}

fn magic_variant(config: &Config, variant: Option<u8>) -> Result<MagicVariant> {
    match variant {
        Some(value) => MagicVariant::new(value).map_err(anyhow::Error::msg),
        None => Ok(config.codec.skippable_variant),
    }
}

fn bridge_mode(config: &Config, offload: bool) -> BridgeMode {
    if offload {
        BridgeMode::Offload
    } else {
        config.bridge.mode
    }
}

#[allow(clippy::too_many_arguments)]
async fn compress_command(
    config: &Config,
    input: &Path,
    output: &Path,
    options: CompressOptions,
    record: Option<(String, MagicVariant)>,
    mode: BridgeMode,
    force: bool,
    quiet: bool,
) -> Result<()> {
    check_output(output, force)?;
    info!("Compressing {} to {}", input.display(), output.display());
    let started = Instant::now();

    let (bytes_in, bytes_out) = if mode.is_offload() {
        let bridge = ExecutionBridge::new(config.bridge.max_concurrent)?;
        let data = tokio::fs::read(input)
            .await
            .with_context(|| format!("Failed to read {}", input.display()))?;
        let bytes_in = data.len() as u64;
        let mut compressed = compress_async(&bridge, data, options, mode).await?;
        if let Some((payload, variant)) = &record {
            compressed = prepend_skippable_record(&compressed, payload.as_bytes(), *variant)?;
        }
        tokio::fs::write(output, &compressed)
            .await
            .with_context(|| format!("Failed to write {}", output.display()))?;
        (bytes_in, compressed.len() as u64)
    } else {
        let source = File::open(input).with_context(|| format!("Failed to open {}", input.display()))?;
        let bytes_in = source.metadata()?.len();
        let mut writer = BufWriter::new(
            File::create(output).with_context(|| format!("Failed to create {}", output.display()))?,
        );

        let mut record_len = 0;
        if let Some((payload, variant)) = &record {
            let bytes = write_skippable_record(payload.as_bytes(), *variant)?;
            writer.write_all(&bytes)?;
            record_len = bytes.len() as u64;
        }

        let pb = display::create_progress_bar(quiet, bytes_in);
        let reader = BufReader::new(source);
        let written = match &pb {
            Some(pb) => {
                pb.set_message("Compressing");
                copy_compress(pb.wrap_read(reader), &mut writer, &options)?
            }
            None => copy_compress(reader, &mut writer, &options)?,
        };
        writer.flush()?;
        if let Some(pb) = pb {
            pb.finish_and_clear();
        }
        (bytes_in, written + record_len)
    };

    debug!(bytes_in, bytes_out, ?mode, "Compression finished");
    if !quiet {
        display::print_transfer("Compressed to", output, bytes_in, bytes_out, started.elapsed());
    }
    Ok(())
}

async fn decompress_command(
    config: &Config,
    input: &Path,
    output: &Path,
    options: DecompressOptions,
    mode: BridgeMode,
    force: bool,
    quiet: bool,
) -> Result<()> {
    check_output(output, force)?;
    info!("Decompressing {} to {}", input.display(), output.display());
    let started = Instant::now();

    let (bytes_in, bytes_out) = if mode.is_offload() {
        let bridge = ExecutionBridge::new(config.bridge.max_concurrent)?;
        let data = tokio::fs::read(input)
            .await
            .with_context(|| format!("Failed to read {}", input.display()))?;
        let bytes_in = data.len() as u64;
        let restored = decompress_async(&bridge, data, options, mode).await?;
        tokio::fs::write(output, &restored)
            .await
            .with_context(|| format!("Failed to write {}", output.display()))?;
        (bytes_in, restored.len() as u64)
    } else {
        let source = File::open(input).with_context(|| format!("Failed to open {}", input.display()))?;
        let bytes_in = source.metadata()?.len();
        let writer = BufWriter::new(
            File::create(output).with_context(|| format!("Failed to create {}", output.display()))?,
        );

        let pb = display::create_progress_bar(quiet, bytes_in);
        let reader = BufReader::new(source);
        let written = match &pb {
            Some(pb) => {
                pb.set_message("Decompressing");
                copy_decompress(pb.wrap_read(reader), writer, &options)?
            }
            None => copy_decompress(reader, writer, &options)?,
        };
        if let Some(pb) = pb {
            pb.finish_and_clear();
        }
        (bytes_in, written)
    };

    debug!(bytes_in, bytes_out, ?mode, "Decompression finished");
    if !quiet {
        display::print_transfer("Decompressed to", output, bytes_in, bytes_out, started.elapsed());
    }
    Ok(())
}

fn skippable_add_command(
    input: &Path,
    output: &Path,
    payload: &[u8],
    variant: MagicVariant,
    quiet: bool,
) -> Result<()> {
    let contents = read_file(input)?;
    let combined = prepend_skippable_record(&contents, payload, variant)?;
    std::fs::write(output, combined).with_context(|| format!("Failed to write {}", output.display()))?;

    if !quiet {
        println!(
            "{} Added {} record (variant {}) to {}",
            style("✓").green().bold(),
            display::format_bytes(payload.len() as u64),
            variant.get(),
            style(output.display()).cyan()
        );
    }
    Ok(())
}

fn skippable_read_command(input: &Path) -> Result<()> {
    let contents = read_file(input)?;
    let mut found = false;
    for record in skippable_records(&contents) {
        let record = record?;
        found = true;
        println!(
            "{} {}",
            style(format!("[{}]", record.variant.get())).yellow(),
            String::from_utf8_lossy(record.payload)
        );
    }
    if !found {
        bail!("{} does not start with a skippable record", input.display());
    }
    Ok(())
}

fn config_command(config: &Config, default: bool, generate: Option<PathBuf>) -> Result<()> {
    if let Some(path) = generate {
        ConfigLoader::generate_default_config(&path)?;
        println!(
            "{} Wrote default configuration to {}",
            style("✓").green().bold(),
            style(path.display()).cyan()
        );
        return Ok(());
    }

    let (label, shown) = if default {
        ("Default configuration:", Config::default())
    } else {
        ("Current configuration:", config.clone())
    };
    println!("{} {}", style("⚙").blue().bold(), label);
    print!("{}", serde_yaml::to_string(&shown)?);
    Ok(())
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn check_output(output: &Path, force: bool) -> Result<()> {
    if output.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", output.display());
    }
    Ok(())
}

fn compressed_path(input: &Path) -> PathBuf {
    let mut name = input.as_os_str().to_owned();
    name.push(".zst");
    PathBuf::from(name)
}

fn decompressed_path(input: &Path) -> PathBuf {
    if input.extension().is_some_and(|ext| ext == "zst") {
        input.with_extension("")
    } else {
        let mut name = input.as_os_str().to_owned();
        name.push(".out");
        PathBuf::from(name)
    }
}
