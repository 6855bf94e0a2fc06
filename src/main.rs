//! CLI driver: argument parsing, STL I/O, logging, and the iterative
//! mode that re-runs simplification and stops once two consecutive
//! iterations agree on face count. Not part of the simplification core
//! -- see spec section 6.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use log::{error, info};

use mesh_simplify::geometry::Triangle;
use mesh_simplify::{simplify_mesh, stl};

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Mode {
    Simple,
    Iterative,
}

/// Reduce the triangle count of an STL mesh using quadric error metric edge collapse.
#[derive(Parser, Debug)]
#[command(name = "mesh-simplify", version, about)]
struct Cli {
    /// Input mesh file (STL).
    #[arg(long = "in")]
    input: PathBuf,

    /// Output mesh file; default is `<stem>_simplified.stl` beside the input.
    #[arg(long = "out")]
    output: Option<PathBuf>,

    /// Target reduction factor in (0, 1) -- output has roughly factor * input faces.
    #[arg(long, default_value_t = 0.5)]
    factor: f64,

    /// Simplify once, or repeatedly feed the output back in as the next input.
    #[arg(long, value_enum, default_value_t = Mode::Simple)]
    mode: Mode,

    /// Number of iterations to run in iterative mode.
    #[arg(long, default_value_t = 1)]
    iterations: u32,
}

impl Cli {
    fn validate(&self) -> Result<()> {
        if !(self.factor > 0.0 && self.factor < 1.0) {
            bail!("invalid factor: {} (must be in (0, 1))", self.factor);
        }
        if self.iterations < 1 {
            bail!("invalid number of iterations: {}", self.iterations);
        }
        if !self.input.is_file() {
            bail!("invalid input path: {}", self.input.display());
        }
        Ok(())
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    if let Err(e) = cli.validate() {
        error!("{e}");
        std::process::exit(1);
    }

    let result = match cli.mode {
        Mode::Simple => run_simple(&cli),
        Mode::Iterative => run_iterative(&cli),
    };

    if let Err(e) = result {
        error!("{e:#}");
        std::process::exit(1);
    }
}

fn load_mesh(path: &Path) -> Result<Vec<Triangle>> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    stl::read_auto(path, &bytes)
}

fn derive_output_path(input: &Path, suffix: &str) -> PathBuf {
    let stem = input.file_stem().and_then(|s| s.to_str()).unwrap_or("mesh");
    let name = format!("{stem}{suffix}.stl");
    input.with_file_name(name)
}

fn run_simple(cli: &Cli) -> Result<()> {
    info!("loading {}", cli.input.display());
    let mesh = load_mesh(&cli.input)?;
    info!("input mesh contains {} faces", mesh.len());

    info!("simplifying to {:.0}% of original...", cli.factor * 100.0);
    let start = Instant::now();
    let simplified = simplify_mesh(&mesh, cli.factor);
    let elapsed = start.elapsed();

    info!("simplification took {:?}", elapsed);
    info!(
        "output mesh contains {} faces (actual factor: {:.4})",
        simplified.len(),
        simplified.len() as f64 / mesh.len() as f64
    );

    let out_path = cli
        .output
        .clone()
        .unwrap_or_else(|| derive_output_path(&cli.input, "_simplified"));
    info!("writing {}", out_path.display());
    stl::write_binary(&out_path, &simplified)?;
    Ok(())
}

fn run_iterative(cli: &Cli) -> Result<()> {
    info!("loading {}", cli.input.display());
    let mesh = load_mesh(&cli.input)?;
    info!("input mesh contains {} faces", mesh.len());
    info!("simplifying...");

    let mut previous = mesh;
    let mut face_counts: Vec<usize> = Vec::new();

    for iteration in 1..=cli.iterations {
        let start = Instant::now();
        let simplified = simplify_mesh(&previous, cli.factor);
        let elapsed = start.elapsed();
        face_counts.push(simplified.len());

        info!(
            "iteration {} | {} faces | duration: {:?}",
            iteration,
            simplified.len(),
            elapsed
        );

        let out_path = derive_output_path(&cli.input, &format!("_simplified{iteration}"));
        stl::write_binary(&out_path, &simplified)?;

        // stop once two consecutive iterations agree on face count.
        if face_counts.len() >= 2 && face_counts[face_counts.len() - 1] == face_counts[face_counts.len() - 2] {
            info!("no further simplification possible");
            break;
        }
        previous = simplified;
    }

    Ok(())
}
