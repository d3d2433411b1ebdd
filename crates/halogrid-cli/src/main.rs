//! Halogrid command-line interface.

use std::path::PathBuf;
use std::thread;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use halogrid_core::{partition, Kernel3, ProcessGrid, RunParams};
use halogrid_engine::{run_node, ChannelMesh, NodeReport, RasterFile};
use halogrid_simd::SimdCapability;

#[derive(Parser)]
#[command(name = "halogrid")]
#[command(about = "Distributed halo-exchange stencil convolution", long_about = None)]
#[command(version)]
struct Cli {
    /// Input raster file (flat row-major interleaved f32)
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// Output raster file
    #[arg(short, long, default_value = "out.f32")]
    output: PathBuf,

    /// Global raster width in pixels
    #[arg(long)]
    width: Option<usize>,

    /// Global raster height in pixels
    #[arg(long)]
    height: Option<usize>,

    /// Samples per pixel
    #[arg(short, long, default_value_t = 1)]
    channels: usize,

    /// Number of stencil rounds
    #[arg(short = 'n', long, default_value_t = 1)]
    iterations: usize,

    /// Number of worker nodes
    #[arg(long, default_value_t = 1)]
    nodes: usize,

    /// Terminate early once a round changes nothing anywhere
    #[arg(short = 't', long)]
    track_similarity: bool,

    /// Stencil implementation: auto, avx2, or scalar
    #[arg(long, default_value = "auto")]
    simd: String,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(ref input) = cli.input {
        let capability = detect_capability(&cli.simd);

        if cli.verbose {
            println!("Stencil kernel: {}", capability);
        }

        run_grid(input, &cli, capability)?;
    } else {
        println!("Halogrid - Distributed Stencil Convolution");
        println!();
        println!("Usage: halogrid <input.f32> --width W --height H [options]");
        println!();
        println!("Options:");
        println!("  -o, --output <FILE>      Output raster file");
        println!("      --width <W>          Global raster width");
        println!("      --height <H>         Global raster height");
        println!("  -c, --channels <C>       Samples per pixel");
        println!("  -n, --iterations <N>     Number of stencil rounds");
        println!("      --nodes <P>          Number of worker nodes");
        println!("  -t, --track-similarity   Stop early once nothing changes");
        println!("      --simd <NAME>        Stencil implementation: auto, avx2, scalar");
        println!("  -v, --verbose            Verbose output");
        println!("  -h, --help               Show help");
        println!("  -V, --version            Show version");
    }

    Ok(())
}

/// Select the stencil implementation based on the CLI argument.
fn detect_capability(name: &str) -> SimdCapability {
    match name.to_lowercase().as_str() {
        "scalar" => SimdCapability::Scalar,
        "avx2" => {
            let detected = SimdCapability::detect();
            if detected.is_simd() {
                detected
            } else {
                eprintln!("Warning: AVX2 requested but not available, falling back to scalar");
                SimdCapability::Scalar
            }
        }
        _ => SimdCapability::detect(),
    }
}

fn run_grid(input: &PathBuf, cli: &Cli, capability: SimdCapability) -> Result<()> {
    let width = cli.width.context("--width is required")?;
    let height = cli.height.context("--height is required")?;

    let params = RunParams {
        global_width: width,
        global_height: height,
        channels: cli.channels,
        rounds: cli.iterations,
        track_similarity: cli.track_similarity,
    };
    params.validate()?;

    // The partition is decided before any tile is allocated; an impossible
    // split aborts the whole run here.
    let width_div = partition(width, height, cli.nodes)?;
    let grid = ProcessGrid::new(width, height, cli.nodes, width_div)?;

    if cli.verbose {
        println!(
            "Node grid: {} x {} ({} x {} cells each)",
            grid.height_div, grid.width_div, grid.tile_rows, grid.tile_cols
        );
    }

    let kernel = Kernel3::gaussian();
    let input_file = RasterFile::new(input, width, cli.channels);
    let output_file = RasterFile::new(&cli.output, width, cli.channels);
    let meshes = ChannelMesh::build(cli.nodes);

    let reports = thread::scope(|scope| -> Result<Vec<NodeReport>> {
        let handles: Vec<_> = meshes
            .into_iter()
            .map(|mut comm| {
                let input_file = input_file.clone();
                let output_file = output_file.clone();
                scope.spawn(move || {
                    run_node(
                        &params,
                        &grid,
                        &kernel,
                        capability,
                        &input_file,
                        &output_file,
                        &mut comm,
                    )
                })
            })
            .collect();

        handles
            .into_iter()
            .enumerate()
            .map(|(rank, handle)| {
                handle
                    .join()
                    .map_err(|_| anyhow!("worker {rank} panicked"))?
                    .with_context(|| format!("worker {rank} failed"))
            })
            .collect()
    })?;

    let root = &reports[0];
    if root.driver.converged {
        println!(
            "Converged after {} of {} rounds.",
            root.driver.rounds_completed, cli.iterations
        );
    } else {
        println!("Completed {} rounds.", root.driver.rounds_completed);
    }

    if let Some(times) = root.times {
        eprintln!("Phase times (grid maximum):");
        eprintln!("  read    {:>10.6} s", times.read);
        eprintln!("  compute {:>10.6} s", times.compute);
        eprintln!("  write   {:>10.6} s", times.write);
    }

    if cli.verbose {
        println!("Output written to {}", cli.output.display());
    }

    Ok(())
}
