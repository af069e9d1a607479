mod quantize;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use gim::{ExactQuantizer, GimFile};
use miette::{miette, IntoDiagnostic, Result, WrapErr};

use crate::quantize::LiqQuantizer;

#[derive(Parser, Debug)]
#[command(name = "GIM tool")]
#[command(about, author, version, long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert GIM textures to PNG files
    #[command(arg_required_else_help = true)]
    Extract {
        /// GIM files
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Outbound directory (defaults to the directory of each file)
        #[arg(short, long, value_name = "DIR")]
        out: Option<PathBuf>,
        /// Overwrite files
        #[arg(short, long, default_value_t = false)]
        force: bool,
    },
    /// Write PNG files back into their GIM textures
    #[command(arg_required_else_help = true)]
    Inject {
        /// GIM files
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Directory holding the PNG files (defaults to the directory of each file)
        #[arg(short, long, value_name = "DIR")]
        input: Option<PathBuf>,
        /// Target quantization quality
        #[arg(long, default_value_t = 100, value_parser = clap::value_parser!(u8).range(0..=100))]
        quality: u8,
        /// Quantizer speed, 1 (slowest) to 10 (fastest)
        #[arg(long, default_value_t = 4, value_parser = clap::value_parser!(i32).range(1..=10))]
        speed: i32,
        /// Fail instead of reducing colors when the image does not fit the palette
        #[arg(long, default_value_t = false)]
        exact: bool,
    },
    /// Print the header of each GIM file as a CSV row
    #[command(arg_required_else_help = true)]
    Info {
        /// GIM files
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

pub fn main() -> Result<()> {
    let stdout = console::Term::stdout();
    let cli = Cli::parse();
    init_logger(cli.verbose);

    match cli.command {
        Commands::Extract { files, out, force } => command_extract(files, out, force),
        Commands::Inject {
            files,
            input,
            quality,
            speed,
            exact,
        } => {
            let quantizer = LiqQuantizer { quality, speed };
            command_inject(files, input, &quantizer, exact)
        }
        Commands::Info { files } => command_info(stdout, files),
    }
}

fn init_logger(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn command_extract(files: Vec<PathBuf>, out: Option<PathBuf>, force: bool) -> Result<()> {
    run_batch(&files, |file| {
        let path = png_path(file, out.as_deref());

        if !force && path.exists() {
            let message = format!("File \"{}\" exists. Overwrite it?", path.display());

            if !dialoguer::Confirm::new()
                .with_prompt(message)
                .interact()
                .into_diagnostic()?
            {
                return Ok(());
            }
        }

        let image = GimFile::open(file)?.decode()?;
        let image = image::RgbaImage::from_raw(image.width, image.height, image.rgba8)
            .ok_or_else(|| miette!("decoded pixel buffer does not match its dimensions"))?;
        image
            .save_with_format(&path, image::ImageFormat::Png)
            .into_diagnostic()
            .wrap_err_with(|| format!("failed to save {}", path.display()))?;

        log::info!("saved {}", path.display());
        Ok(())
    })
}

fn command_inject(
    files: Vec<PathBuf>,
    input: Option<PathBuf>,
    quantizer: &LiqQuantizer,
    exact: bool,
) -> Result<()> {
    run_batch(&files, |file| {
        let path = png_path(file, input.as_deref());
        let image = image::open(&path)
            .into_diagnostic()
            .wrap_err_with(|| format!("failed to load {}", path.display()))?
            .to_rgba8();

        let mut gim = GimFile::open(file)?;
        let (width, height) = image.dimensions();
        if exact {
            gim.encode_rgba(width, height, image.as_raw(), &ExactQuantizer)?;
        } else {
            gim.encode_rgba(width, height, image.as_raw(), quantizer)?;
        }
        gim.save(file)?;

        log::info!("injected {} into {}", path.display(), file.display());
        Ok(())
    })
}

fn command_info(stdout: console::Term, files: Vec<PathBuf>) -> Result<()> {
    stdout
        .write_line(
            "magic, title, type, width, height, dataOffset, paletteOffset, \
             unk1, unk2, unk3, unk4, unk5, unk6, unk7, unk8, unk9, unk10, unk11, unk12",
        )
        .into_diagnostic()?;

    let mut failed = 0;
    for file in &files {
        let row = GimFile::open(file).map(|gim| {
            let header = gim.header();
            let mut row = format!(
                "{}, {}, {:02x}, {:02X}, {:02X}, {:X}, {:X}",
                header.magic_str(),
                header.title_str(),
                header.kind_raw,
                header.width,
                header.height,
                header.offsets.data,
                header.offsets.palette
            );
            for word in header.opaque.unknown_words() {
                row.push_str(&format!(", {word:02X}"));
            }
            row
        });

        match row {
            Ok(row) => stdout.write_line(&row).into_diagnostic()?,
            Err(err) => {
                failed += 1;
                let report = miette::Report::new(err)
                    .wrap_err(format!("failed to read {}", file.display()));
                eprintln!("{report:?}");
            }
        }
    }

    batch_result(failed, files.len())
}

/// Runs `task` on every file, reporting failures without stopping the batch.
fn run_batch<F>(files: &[PathBuf], mut task: F) -> Result<()>
where
    F: FnMut(&Path) -> Result<()>,
{
    let bar = indicatif::ProgressBar::new(files.len() as u64);
    bar.set_style(get_bar_style()?);

    let mut failed = 0;
    for file in files {
        bar.set_message(file.display().to_string());

        let result = bar.suspend(|| task(file));
        if let Err(report) = result.wrap_err_with(|| format!("{}", file.display())) {
            failed += 1;
            bar.suspend(|| eprintln!("{report:?}"));
        }
        bar.inc(1);
    }

    bar.finish();

    batch_result(failed, files.len())
}

fn batch_result(failed: usize, total: usize) -> Result<()> {
    if failed > 0 {
        return Err(miette!("{failed} of {total} files failed"));
    }
    Ok(())
}

/// `<file>.png`, either next to the GIM or inside `dir`.
fn png_path(gim: &Path, dir: Option<&Path>) -> PathBuf {
    let mut name = gim.file_name().unwrap_or(gim.as_os_str()).to_os_string();
    name.push(".png");
    match dir {
        Some(dir) => dir.join(name),
        None => gim.with_file_name(name),
    }
}

fn get_bar_style() -> Result<indicatif::ProgressStyle> {
    Ok(
        indicatif::ProgressStyle::with_template("[{bar:32}] {pos:>7}/{len:7} {msg}")
            .into_diagnostic()?
            .progress_chars("=>-"),
    )
}
