use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use miette::{miette, IntoDiagnostic, Result, WrapErr};
use pac::{Archive, Builder};

#[derive(Parser, Debug)]
#[command(name = "PAC tool")]
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
    /// Print a list of files in the PAC archive
    #[command(arg_required_else_help = true)]
    Ls {
        /// PAC file
        file: PathBuf,
    },
    /// Extract every file of each archive into `<file>_`
    #[command(arg_required_else_help = true)]
    Extract {
        /// PAC files
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Outbound directory (defaults to the directory of each file)
        #[arg(short, long, value_name = "DIR")]
        out: Option<PathBuf>,
    },
    /// Build `<NAME>.PAC` from each `<NAME>.PAC_` directory
    #[command(arg_required_else_help = true)]
    Create {
        /// Directories named `<NAME>.PAC_`
        #[arg(required = true)]
        dirs: Vec<PathBuf>,
        /// Outbound directory (defaults to the parent of each directory)
        #[arg(short, long, value_name = "DIR")]
        out: Option<PathBuf>,
    },
}

pub fn main() -> Result<()> {
    let stdout = console::Term::stdout();
    let cli = Cli::parse();
    init_logger(cli.verbose);

    match cli.command {
        Commands::Ls { file } => command_ls(stdout, file),
        Commands::Extract { files, out } => run_batch(&files, |file| {
            command_extract(file, out.as_deref()).map(|_| ())
        }),
        Commands::Create { dirs, out } => run_batch(&dirs, |dir| {
            command_create(dir, out.as_deref()).map(|_| ())
        }),
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

fn command_ls(stdout: console::Term, file: PathBuf) -> Result<()> {
    let archive = Archive::open(&file)?;

    for entry in archive.entries() {
        let text = format!(
            "{:<20} offset=0x{:08X} length={:>9} type=0x{:02X} extra={}",
            entry.file_name(),
            entry.offset,
            entry.length,
            entry.kind.raw(),
            entry.extra
        );
        stdout.write_line(&text).into_diagnostic()?;
    }

    Ok(())
}

fn command_extract(file: &Path, out: Option<&Path>) -> Result<PathBuf> {
    let archive = Archive::open(file)?;
    let dir = match out {
        Some(out) => out.join(pac::extract_dir_for(file.file_name().unwrap_or_default())),
        None => pac::extract_dir_for(file),
    };
    archive.extract_to(&dir)?;
    Ok(dir)
}

fn command_create(dir: &Path, out: Option<&Path>) -> Result<PathBuf> {
    let (builder, file_name) = Builder::from_dir(dir)?;
    if builder.is_empty() {
        log::warn!("{} holds no files", dir.display());
    }

    let path = match out {
        Some(out) => out.join(&file_name),
        None => dir.with_file_name(&file_name),
    };
    let bytes = builder.finish()?;
    std::fs::write(&path, bytes)
        .into_diagnostic()
        .wrap_err_with(|| format!("failed to write {}", path.display()))?;

    log::info!("created {}", path.display());
    Ok(path)
}

/// Runs `task` on every path, reporting failures without stopping the batch.
fn run_batch<F>(paths: &[PathBuf], mut task: F) -> Result<()>
where
    F: FnMut(&Path) -> Result<()>,
{
    let bar = indicatif::ProgressBar::new(paths.len() as u64);
    bar.set_style(get_bar_style()?);

    let mut failed = 0;
    for path in paths {
        bar.set_message(path.display().to_string());

        if let Err(report) = task(path).wrap_err_with(|| format!("{}", path.display())) {
            failed += 1;
            bar.suspend(|| eprintln!("{report:?}"));
        }
        bar.inc(1);
    }

    bar.finish();

    if failed > 0 {
        return Err(miette!("{failed} of {} files failed", paths.len()));
    }
    Ok(())
}

fn get_bar_style() -> Result<indicatif::ProgressStyle> {
    Ok(
        indicatif::ProgressStyle::with_template("[{bar:32}] {pos:>7}/{len:7} {msg}")
            .into_diagnostic()?
            .progress_chars("=>-"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pac::FileKind;
    use tempdir::TempDir;

    #[test]
    fn create_then_extract_round_trips_files() {
        let tmp = TempDir::new("pactool").expect("failed to create temp dir");
        let source = tmp.path().join("COURSE01.PAC_");
        std::fs::create_dir(&source).expect("failed to create source dir");
        std::fs::write(source.join("TEX.gim"), [1u8, 2, 3]).expect("failed to write texture");
        std::fs::write(source.join("CAR.smd"), [4u8; 40]).expect("failed to write model");

        let out = tmp.path().join("out");
        std::fs::create_dir(&out).expect("failed to create out dir");

        let archive_path = command_create(&source, Some(&out)).expect("create failed");
        assert_eq!(archive_path, out.join("COURSE01.PAC"));

        let archive = Archive::open(&archive_path).expect("failed to open created archive");
        assert_eq!(archive.name(), "COURSE01");
        assert_eq!(archive.entries()[0].kind, FileKind::Smd);

        let extracted = command_extract(&archive_path, None).expect("extract failed");
        assert_eq!(extracted, out.join("COURSE01.PAC_"));
        assert_eq!(
            std::fs::read(extracted.join("TEX.gim")).expect("missing texture"),
            vec![1, 2, 3]
        );
        assert_eq!(
            std::fs::read(extracted.join("CAR.smd")).expect("missing model"),
            vec![4; 40]
        );
    }

    #[test]
    fn batch_keeps_going_after_a_failure() {
        let tmp = TempDir::new("pactool").expect("failed to create temp dir");
        let good = tmp.path().join("GOOD.PAC_");
        std::fs::create_dir(&good).expect("failed to create dir");
        let bad = tmp.path().join("missing.PAC_");

        let result = run_batch(&[bad, good], |dir| command_create(dir, None).map(|_| ()));

        assert!(result.is_err());
        assert!(tmp.path().join("GOOD.PAC").exists());
    }
}
