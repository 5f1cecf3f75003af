//! `carus` — command-line interface for the NM-Carus offload driver.
//!
//! ```text
//! USAGE:
//!   carus info                       Show deployment capabilities
//!   carus kernels                    List the kernel image table
//!   carus maxpool [options]          Run a max-pooling offload demo
//! ```

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use carus_chip::kernels::{image, KernelId};
use carus_driver::chip::ElemType;
use carus_driver::{BackendSelection, CarusDevice, MaxPoolConfig, MaxPoolExecutor};

#[derive(Parser)]
#[command(name = "carus", about = "NM-Carus near-memory-compute CLI", version)]
struct Cli {
    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Show deployment capabilities.
    Info,
    /// List the kernel image table.
    Kernels,
    /// Run a max-pooling offload on the software backend.
    Maxpool {
        /// Input matrix rows.
        #[arg(long, default_value_t = 4)]
        rows: usize,
        /// Input matrix columns.
        #[arg(long, default_value_t = 4)]
        cols: usize,
        /// Pooling window edge length.
        #[arg(long, default_value_t = 2)]
        pool: usize,
        /// Window stride on both axes.
        #[arg(long, default_value_t = 2)]
        stride: usize,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Cmd::Info => cmd_info()?,
        Cmd::Kernels => cmd_kernels(),
        Cmd::Maxpool {
            rows,
            cols,
            pool,
            stride,
        } => cmd_maxpool(rows, cols, pool, stride)?,
    }

    Ok(())
}

fn cmd_info() -> Result<()> {
    let device = CarusDevice::open(BackendSelection::Auto)?;
    let caps = device.capabilities();

    println!("NM-Carus deployment ({})", device.backend_type());
    println!("  Instances      {}", caps.instance_count);
    println!(
        "  Register bank  {} x {} B",
        caps.vreg_count, caps.max_vl_bytes
    );
    println!(
        "  Max VL         {} (e8) / {} (e16) / {} (e32)",
        caps.max_vl_elems(ElemType::Int8),
        caps.max_vl_elems(ElemType::Int16),
        caps.max_vl_elems(ElemType::Int32)
    );
    println!("  Imem           {} words", caps.imem_words);

    Ok(())
}

fn cmd_kernels() {
    println!("Kernel image table:");
    for id in KernelId::ALL {
        let img = image(id);
        println!(
            "  {:<8} {:>4} words  {:>5} B",
            id.name(),
            img.size_words(),
            img.size_bytes()
        );
    }
}

fn cmd_maxpool(rows: usize, cols: usize, pool: usize, stride: usize) -> Result<()> {
    let mut device = CarusDevice::open(BackendSelection::Auto)?;
    device.load_kernel(KernelId::MaxPool)?;

    let config = MaxPoolConfig::new(rows, cols, pool, stride, ElemType::Int32)?;

    // Deterministic demo matrix.
    let a: Vec<i32> = (0..rows * cols).map(|v| ((v * 7) % 23) as i32).collect();
    let input: Vec<u8> = a.iter().flat_map(|v| v.to_le_bytes()).collect();

    let result = MaxPoolExecutor::new(config).run(&mut device, 0, &input)?;
    let out: Vec<i32> = result
        .output
        .chunks_exact(4)
        .map(|c| i32::from_le_bytes(c.try_into().expect("4-byte chunk")))
        .collect();
    if out.len() != result.rows * result.cols {
        bail!("short result: {} of {}", out.len(), result.rows * result.cols);
    }

    println!("Input {rows}x{cols}, pool={pool}, stride={stride}");
    for r in a.chunks(cols) {
        println!("  {r:>4?}");
    }
    println!("Pooled {}x{}:", result.rows, result.cols);
    for r in out.chunks(result.cols) {
        println!("  {r:>4?}");
    }
    println!(
        "stage {:?}  execute {:?}  retrieve {:?}  total {:.1} us",
        result.stage_duration,
        result.execute_duration,
        result.retrieve_duration,
        result.latency_us()
    );

    Ok(())
}
