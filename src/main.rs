use std::fs;
use std::io::{stdin, stdout, IsTerminal};
use std::path::{Path, PathBuf};

use clap::Parser;
use colored::Colorize;
use miette::{bail, Result};

use bobbin::term::{self, RawModeGuard};
use bobbin::{RunState, TermConsole};

/// Bobbin is a terminal virtual machine for compiled LC3 image files.
#[derive(Parser)]
#[command(version)]
struct Args {
    /// `.lc3` or `.obj` images to run; later images overlay earlier ones
    #[arg(required = true)]
    images: Vec<PathBuf>,

    /// Print each executed instruction to stdout
    #[arg(short, long)]
    trace: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Read and decode every image before any machine or terminal state exists
    let mut images = Vec::with_capacity(args.images.len());
    for path in &args.images {
        images.push(read_image(path)?);
    }

    let interactive = stdin().is_terminal();
    {
        let _term = RawModeGuard::acquire(interactive);
        let mut state = RunState::new(TermConsole::new(interactive), stdout());
        state.set_trace(args.trace);
        for image in &images {
            state.load_image(image);
        }
        state.run();
    }

    if term::cancelled() {
        eprintln!("\n{:>12}", "Interrupted".cyan());
    }
    Ok(())
}

/// Read a binary image into its big-endian 16-bit words.
fn read_image(path: &Path) -> Result<Vec<u16>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) => bail!("failed to load image {}: {err}", path.display()),
    };

    if bytes.len() % 2 != 0 {
        bail!("image {} is not aligned to 16 bits", path.display());
    }

    let words: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|word| u16::from_be_bytes([word[0], word[1]]))
        .collect();

    if words.is_empty() {
        bail!("image {} is missing an origin word", path.display());
    }
    Ok(words)
}
