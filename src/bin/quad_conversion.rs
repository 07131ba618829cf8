use std::path::PathBuf;

use bessy2_tools::prelude::*;
use clap::Parser;

/// Quadrupole power supply setpoints of a new lattice
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// new lattice file
    #[arg(short, long)]
    new: PathBuf,
    /// reference lattice file
    #[arg(short, long)]
    reference: PathBuf,
    /// power supply values of the reference lattice (JSON)
    #[arg(short, long)]
    ps: PathBuf,
    /// file the new power supply values are written to (JSON)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .format_timestamp(None)
        .init();
    let args = Args::parse();

    let new_k = load_quad_values(&args.new)?;
    let ref_k = load_quad_values(&args.reference)?;
    let ref_ps = load_ps_values(&args.ps)?;

    let new_ps = compute_new_ps_values(&new_k, &ref_k, &ref_ps)?;
    if new_ps.is_empty() {
        log::info!("no quadrupole strength differs from the reference lattice");
    }
    print!("{}", SetpointTable::new(&new_ps, &ref_ps, &new_k, &ref_k));

    if let Some(output) = &args.output {
        save_ps_values(output, &new_ps)?;
    }
    Ok(())
}
