//! LOCO export to power supply setpoints
//!
//! The initial fit iteration of `demos/ATRingWithAO.json` is the reference lattice and
//! the last fit iteration the new one: only the Q1 power supply changed.

use bessy2_tools::prelude::*;
use bessy2_tools::quad_conversion::Values;

const LOCO: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/demos/ATRingWithAO.json");
const TEMPLATE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/demos/b2_template.json");

#[test]
fn loco_to_setpoints() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let loco = LocoFile::from_path(LOCO)?;
    let resolver = loco.resolver_with(&ProfileRegistry::default(), CollisionPolicy::Error)?;
    let template = Lattice::from_path(TEMPLATE)?;

    for (fit_iteration, name) in [(0, "reference.json"), (-1, "new.json")] {
        let quads = resolver.magnet_strength(
            MagnetKind::Quad,
            fit_iteration,
            AggregationMethod::ByPowerSupply,
        )?;
        Lattice::with_magnets(&template, quads.values()).to_path(dir.path().join(name))?;
    }

    let ref_k = load_quad_values(dir.path().join("reference.json"))?;
    let new_k = load_quad_values(dir.path().join("new.json"))?;
    let ref_ps: Values = [("Q1PDR", 100.0), ("Q3PD1R", -80.0)]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

    let new_ps = compute_new_ps_values(&new_k, &ref_k, &ref_ps)?;
    assert_eq!(new_ps.keys().collect::<Vec<_>>(), vec!["Q1PDR"]);
    assert!((new_ps["Q1PDR"] - 100.0).abs() < 1e-9);

    let output = dir.path().join("new.values");
    save_ps_values(&output, &new_ps)?;
    assert_eq!(load_ps_values(&output)?, new_ps);

    let table = SetpointTable::new(&new_ps, &ref_ps, &new_k, &ref_k);
    assert_eq!(table.len(), 1);
    Ok(())
}
