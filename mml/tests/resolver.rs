//! LOCO export to lattice magnets
//!
//! The LOCO export `demos/ATRingWithAO.json` has 2 fit iterations of a 12 elements ring:
//! the Q1 magnets were fitted individually in the last iteration.

use bessy2_tools_mml::{
    AggregationMethod, ChannelGroup, Filing, Lattice, LocoFile, MagnetKind, MagnetRecord,
    MmlError,
};

const LOCO: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../demos/ATRingWithAO.json");
const TEMPLATE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../demos/b2_template.json");

#[test]
fn name_map() -> anyhow::Result<()> {
    let loco = LocoFile::from_path(LOCO)?;
    assert_eq!(loco.machine(), "BESSYII");
    assert_eq!(loco.rings.len(), 2);
    let resolver = loco.resolver()?;
    let name_map = resolver.name_map();
    assert_eq!(name_map.len(), 12);
    assert!(name_map
        .entries()
        .iter()
        .enumerate()
        .all(|(i, e)| e.at_index == i));
    assert_eq!(name_map.at_indices_by_ps_name("Q1PDR"), vec![1, 8]);
    assert_eq!(name_map.at_indices_by_at_name("BEND"), vec![3, 7]);
    assert_eq!(name_map.get(10).unwrap().at_type, "BPM");
    assert_eq!(
        name_map.ps_names("QUAD").into_iter().collect::<Vec<_>>(),
        vec!["Q1PDR", "Q3PD1R"]
    );
    println!("{name_map}");
    Ok(())
}

#[test]
fn quadrupoles() -> anyhow::Result<()> {
    let loco = LocoFile::from_path(LOCO)?;
    let resolver = loco.resolver()?;

    let supplies = resolver.supply_strength(MagnetKind::Quad, -1)?;
    assert!(supplies["Q1PDR"].diverged);
    assert!(!supplies["Q3PD1R"].diverged);

    let quads = resolver.magnet_strength(MagnetKind::Quad, -1, AggregationMethod::ByPowerSupply)?;
    assert_eq!(quads.keys().collect::<Vec<_>>(), vec!["Q1D", "Q3D1"]);
    assert!((quads["Q1D"].strength - 2.4).abs() < 1e-12);
    assert_eq!(quads["Q1D"].length, 0.25);
    assert_eq!(quads["Q3D1"].strength, -1.9);

    let initial = resolver.magnet_strength(MagnetKind::Quad, 0, AggregationMethod::ByPowerSupply)?;
    assert_eq!(initial["Q1D"].strength, 2.4);
    assert_eq!(
        initial,
        resolver.magnet_strength(MagnetKind::Quad, -2, AggregationMethod::ByPowerSupply)?
    );

    assert!(matches!(
        resolver.magnet_strength(MagnetKind::Quad, 2, AggregationMethod::ByPowerSupply),
        Err(MmlError::FitIteration { .. })
    ));
    Ok(())
}

#[test]
fn sextupoles() -> anyhow::Result<()> {
    let loco = LocoFile::from_path(LOCO)?;
    let sexts = loco
        .resolver()?
        .magnet_strength(MagnetKind::Sext, -1, AggregationMethod::ByPowerSupply)?;
    let s2 = &sexts["S2"];
    assert_eq!(s2.kind, MagnetKind::Sext);
    assert_eq!(s2.length, 0.16);
    assert!((s2.strength - 156.25).abs() < 1e-9);
    Ok(())
}

#[test]
fn unknown_machine() -> anyhow::Result<()> {
    let mut loco = LocoFile::from_path(LOCO)?;
    loco.ad.machine = "UNKNOWN".into();
    assert!(matches!(
        loco.resolver(),
        Err(MmlError::UnknownMachine(machine)) if machine == "UNKNOWN"
    ));
    Ok(())
}

#[test]
fn incompatible_files() -> anyhow::Result<()> {
    let mut loco = LocoFile::from_path(LOCO)?;
    loco.ao.insert(
        "BEND",
        ChannelGroup::new(
            "BEND",
            vec![vec![4], vec![8]].try_into()?,
            ["B1", "B2"],
            ["Q1PDR:set", "Q1PDR:set"],
        ),
    );
    assert!(matches!(
        loco.resolver(),
        Err(MmlError::BendSupply { index: 3, .. })
    ));
    Ok(())
}

#[test]
fn legacy_machine_key() -> anyhow::Result<()> {
    let json = std::fs::read_to_string(LOCO)?.replacen("\"Machine\"", "\"Maschine\"", 1);
    let loco: LocoFile = serde_json::from_str(&json)?;
    assert_eq!(loco.machine(), "BESSYII");
    Ok(())
}

#[test]
fn lattice_file() -> anyhow::Result<()> {
    let loco = LocoFile::from_path(LOCO)?;
    let resolver = loco.resolver()?;
    let quads = resolver.magnet_strength(MagnetKind::Quad, -1, AggregationMethod::ByPowerSupply)?;
    let sexts = resolver.magnet_strength(MagnetKind::Sext, -1, AggregationMethod::ByPowerSupply)?;

    let template = Lattice::from_path(TEMPLATE)?;
    let lattice = Lattice::with_magnets(&template, quads.values().chain(sexts.values()));
    assert_eq!(
        lattice.elements.keys().collect::<Vec<_>>(),
        vec!["B", "D1", "Q1D", "Q3D1", "S2"]
    );
    assert!(lattice.others.contains_key("lines"));

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("ATRingWithAO.json_lattice.json");
    lattice.to_path(&path)?;
    let decoded = Lattice::from_path(&path)?;
    assert_eq!(decoded, lattice);
    assert_eq!(decoded.magnets(MagnetKind::Quad)?, quads);
    assert_eq!(decoded.magnets(MagnetKind::Sext)?, sexts);
    Ok(())
}

#[test]
fn lattice_round_trip() -> anyhow::Result<()> {
    let q1 = MagnetRecord {
        name: "Q1".into(),
        kind: MagnetKind::Quad,
        length: 0.25,
        strength: 1.234,
    };
    let lattice: Lattice = [q1.clone()].iter().collect();
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("lattice.json");
    lattice.to_path(&path)?;
    let decoded = Lattice::from_path(&path)?;
    assert_eq!(decoded.elements.keys().collect::<Vec<_>>(), vec!["Q1"]);
    let magnets = decoded.magnets(MagnetKind::Quad)?;
    assert_eq!(magnets["Q1"], q1);
    assert_eq!(magnets["Q1"].strength, 1.234);
    Ok(())
}
