// SPDX-License-Identifier: MIT

mod config;
mod shell;
mod utils;

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::fs::{File, OpenOptions};
use std::path::PathBuf;

use flatfs::flat::*;

use crate::config::Config;
use crate::shell::Shell;
use crate::utils::{LogLevel, log_level, set_log_level};

#[derive(Parser)]
#[command(name = "flatsh", version, about = "Flat filesystem shell", long_about = None)]
struct Cli {
    /// Image file holding the volume (created if missing)
    #[arg(short, long, default_value = "flatfs.img")]
    image: PathBuf,

    /// Volume geometry and options (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Work on a RAM volume, nothing is saved
    #[arg(long)]
    memory: bool,

    /// Size the volume to the existing image instead of the configured block count
    #[arg(long, conflicts_with = "memory")]
    fit: bool,

    #[arg(short, long)]
    verbose: bool,

    #[arg(short, long)]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Clone, Copy)]
enum Commands {
    /// Interactive shell on stdin/stdout (default)
    Shell,
    /// Erase the volume, leaving only the root directory
    Format {
        /// Keep the data region as is
        #[arg(long)]
        quick: bool,
    },
    /// Check volume consistency, exits non-zero on errors
    Check {
        /// Do not warn about blocks marked used but held by no file
        #[arg(long)]
        no_leaks: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    set_log_level(LogLevel::from_flags(cli.quiet, cli.verbose));

    let config = match &cli.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Cannot load config {}", path.display()))?,
        None => Config::default(),
    };
    let mut meta = config.meta()?;
    let options = config.fs_options();
    log_verbose!(
        "Geometry: {} blocks of {} bytes, {} table slots, {} bytes on device",
        meta.total_blocks,
        meta.block_size,
        meta.capacity,
        meta.device_size()
    );

    let command = cli.command.unwrap_or(Commands::Shell);

    if cli.memory {
        log_info!("Using a RAM volume, nothing will be saved");
        let mut buf = vec![0u8; meta.device_size() as usize];
        let mut dev = MemBlockIO::new(&mut buf);
        return run(&mut dev, meta, options, command);
    }

    let mut file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(&cli.image)
        .with_context(|| format!("Cannot open image {}", cli.image.display()))?;

    let existing = file.metadata()?.len();
    if cli.fit && existing > 0 {
        meta = FlatMeta::from_device_size(existing, meta.block_size, meta.capacity)
            .map_err(|e| anyhow::anyhow!("Cannot fit a volume in {existing} bytes: {e}"))?;
        log_verbose!("Fitted {} blocks to the image", meta.total_blocks);
    }

    let size = meta.device_size();
    if existing < size {
        log_verbose!("Growing {} to {} bytes", cli.image.display(), size);
    }
    log_verbose!("Image: {}", cli.image.display());

    let mut dev = image_device(&mut file, existing, size)?;
    run(&mut dev, meta, options, command)
}

/// Wraps an image file as a `size`-byte device, growing the file if it is
/// shorter than the volume.
fn image_device(file: &mut File, existing: u64, size: u64) -> BlockIOResult<StdBlockIO<'_, File>> {
    if existing >= size {
        return Ok(StdBlockIO::new(file, size));
    }
    let mut dev = StdBlockIO::new(file, existing);
    dev.set_len(size)?;
    Ok(dev)
}

fn run<IO: BlockIO + ?Sized>(
    dev: &mut IO,
    meta: FlatMeta,
    options: FlatOptions,
    command: Commands,
) -> anyhow::Result<()> {
    let mut fs = FlatFs::open_with(dev, meta, options)?;
    if fs.formatted_on_open() {
        log_warn!("No flatfs volume found on the device, formatted a new one");
    }

    match command {
        Commands::Shell => {
            let stdin = std::io::stdin();
            let shell = Shell::new(fs, stdin.lock(), std::io::stdout());
            let mut shell = if log_level() == LogLevel::Quiet {
                shell.quiet()
            } else {
                shell
            };
            shell.run()?;
        }
        Commands::Format { quick } => {
            fs.set_options(FlatOptions {
                full_format: !quick,
                ..options
            });
            fs.format()?;
            fs.flush()?;
            log_info!("Formatted the file system.");
        }
        Commands::Check { no_leaks } => {
            let opt = FlatCheckOptions {
                report_leaks: !no_leaks,
                ..FlatCheckOptions::default()
            };
            let report = fs.check_with(&opt).map_err(FsError::from)?;
            let display = ReportDisplayOpts {
                show_summary: true,
                ..ReportDisplayOpts::default()
            };
            print!("{}", report.display_with(display));

            if let Some(first) = report.first_error() {
                log_error!("Volume is inconsistent: {first}");
                anyhow::bail!("check failed");
            }
            log_info!("Volume is consistent");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempfile;

    #[test]
    fn test_image_device_grows_short_file() {
        let mut file = tempfile().unwrap();
        let meta = FlatMeta::new(512, 8, 4).unwrap();
        let size = meta.device_size();

        let mut dev = image_device(&mut file, 0, size).unwrap();
        assert_eq!(dev.size_bytes(), size);
        FlatFs::open_with(&mut dev, meta, FlatOptions::default()).unwrap();
        drop(dev);

        assert_eq!(file.metadata().unwrap().len(), size);
    }

    #[test]
    fn test_image_device_keeps_longer_file() {
        let mut file = tempfile().unwrap();
        file.set_len(8192).unwrap();

        let dev = image_device(&mut file, 8192, 4096).unwrap();
        assert_eq!(dev.size_bytes(), 4096);
        drop(dev);

        assert_eq!(file.metadata().unwrap().len(), 8192);
    }
}
