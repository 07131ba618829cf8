use std::path::PathBuf;

use bessy2_tools::prelude::*;
use clap::{Parser, ValueEnum};

/// Extracts the magnet strengths of LOCO exports into lattice files
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// LOCO exports (`ATRingWithAO` JSON files)
    #[arg(default_value = "ATRingWithAO.json")]
    paths: Vec<PathBuf>,
    /// lattice file the magnets are merged into
    #[arg(short, long)]
    template: Option<PathBuf>,
    /// magnet types to extract (QUAD, SEXT)
    #[arg(short, long, default_value = "QUAD")]
    kind: Vec<MagnetKind>,
    /// fit iteration, negative values count from the last one
    #[arg(long, default_value_t = -1, allow_hyphen_values = true)]
    fit_iteration: isize,
    /// strength aggregation method
    #[arg(long, default_value = "byPowerSupply")]
    method: AggregationMethod,
    /// policy for AT indices claimed by several AO families
    #[arg(long, value_enum, default_value_t = Collision::Warn)]
    collision: Collision,
    /// additional machine profiles (TOML)
    #[arg(long, env = "MML_PROFILES")]
    profiles: Option<PathBuf>,
    /// prints the name map
    #[arg(long)]
    print_name_map: bool,
    /// prints the ring of the selected fit iteration
    #[arg(long)]
    print_ring: bool,
    /// prints the lattices instead of writing them
    #[arg(long)]
    dry_run: bool,
}
#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
enum Collision {
    /// the last AO family silently wins
    Overwrite,
    /// the last AO family wins with a warning
    Warn,
    /// stops on the first collision
    Error,
}
impl From<Collision> for CollisionPolicy {
    fn from(collision: Collision) -> Self {
        match collision {
            Collision::Overwrite => CollisionPolicy::Overwrite,
            Collision::Warn => CollisionPolicy::Warn,
            Collision::Error => CollisionPolicy::Error,
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .format_timestamp(None)
        .init();
    let args = Args::parse();

    let mut registry = ProfileRegistry::default();
    if let Some(path) = &args.profiles {
        registry.merge_path(path)?;
    }
    let template = args
        .template
        .as_ref()
        .map(Lattice::from_path)
        .transpose()?
        .unwrap_or_default();

    for path in &args.paths {
        let loco = LocoFile::from_path(path)?;
        let resolver = loco.resolver_with(&registry, args.collision.into())?;
        if args.print_name_map {
            println!("{}", resolver.name_map());
        }
        if args.print_ring {
            println!("{}", resolver.ring(args.fit_iteration)?.listing(false));
        }

        let mut magnets = vec![];
        for &kind in &args.kind {
            let records = resolver.magnet_strength(kind, args.fit_iteration, args.method)?;
            log::info!("{} {kind} magnets extracted from {path:?}", records.len());
            magnets.extend(records.into_values());
        }
        let lattice = Lattice::with_magnets(&template, magnets.iter());

        if args.dry_run {
            println!("{}", serde_json::to_string_pretty(&lattice)?);
        } else {
            let mut output = path.clone().into_os_string();
            output.push("_lattice.json");
            lattice.to_path(PathBuf::from(output))?;
        }
    }
    Ok(())
}
