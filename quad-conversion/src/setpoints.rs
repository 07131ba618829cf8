use std::{
    collections::BTreeMap,
    fmt::{Debug, Display},
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::Path,
};

use bessy2_tools_mml::{Filing, Lattice, MagnetKind};

use crate::{name_conversion::short_to_epics, QuadConversionError, Result};

/// Values indexed by power supply name
pub type Values = BTreeMap<String, f64>;

/// Quadrupole `k1` of a lattice indexed by power supply name
pub fn quad_values(lattice: &Lattice) -> Result<Values> {
    lattice
        .magnets(MagnetKind::Quad)?
        .into_iter()
        .map(|(short, magnet)| {
            short_to_epics(&short)
                .map(|epics| (epics.to_string(), magnet.strength))
                .ok_or(QuadConversionError::UnknownMagnet(short))
        })
        .collect()
}

/// Loads the quadrupole `k1` of a lattice file, indexed by power supply name
pub fn load_quad_values<P>(path: P) -> Result<Values>
where
    P: AsRef<Path> + Debug,
{
    quad_values(&Lattice::from_path(path)?)
}

/// Loads power supply values from a JSON object
pub fn load_ps_values<P>(path: P) -> Result<Values>
where
    P: AsRef<Path> + Debug,
{
    log::info!("loading power supply values from {path:?}");
    let file = File::open(&path)
        .map_err(|e| QuadConversionError::Open(e, path.as_ref().to_path_buf()))?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

/// Saves power supply values into a JSON object
pub fn save_ps_values<P>(path: P, values: &Values) -> Result<()>
where
    P: AsRef<Path> + Debug,
{
    log::info!("saving power supply values to {path:?}");
    let file = File::create(&path)
        .map_err(|e| QuadConversionError::Create(e, path.as_ref().to_path_buf()))?;
    let mut buffer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut buffer, values)?;
    buffer.write_all(b"\n")?;
    buffer.flush()?;
    Ok(())
}

/// New power supply values of the quadrupoles whose strength changed
///
/// `new_ps = new_k * ref_ps / ref_k`
pub fn compute_new_ps_values(new_k: &Values, ref_k: &Values, ref_ps: &Values) -> Result<Values> {
    if new_k.keys().ne(ref_k.keys()) {
        return Err(QuadConversionError::DifferentMagnets {
            only_new: new_k
                .keys()
                .filter(|k| !ref_k.contains_key(*k))
                .cloned()
                .collect(),
            only_ref: ref_k
                .keys()
                .filter(|k| !new_k.contains_key(*k))
                .cloned()
                .collect(),
        });
    }
    new_k
        .iter()
        .zip(ref_k.values())
        .filter(|((_, new), reference)| new != reference)
        .map(|((magnet, &new), &reference)| {
            let ps = *ref_ps
                .get(magnet)
                .ok_or_else(|| QuadConversionError::MissingReference(magnet.clone()))?;
            if reference == 0. {
                return Err(QuadConversionError::ZeroReference(magnet.clone()));
            }
            Ok((magnet.clone(), new * ps / reference))
        })
        .collect()
}

/// Power supply setpoint of a quadrupole
#[derive(Debug, Clone, PartialEq)]
pub struct Setpoint {
    pub magnet: String,
    pub new_ps: f64,
    pub ref_ps: f64,
    pub new_k: f64,
    pub ref_k: f64,
}
impl Setpoint {
    /// Ratio of the new to the reference power supply values
    pub fn factor(&self) -> f64 {
        self.new_ps / self.ref_ps
    }
}

/// Table of the new power supply setpoints
#[derive(Debug, Clone, Default)]
pub struct SetpointTable(Vec<Setpoint>);
impl SetpointTable {
    /// Collects the setpoints of the magnets with a new power supply value
    pub fn new(new_ps: &Values, ref_ps: &Values, new_k: &Values, ref_k: &Values) -> Self {
        Self(
            new_ps
                .iter()
                .filter_map(|(magnet, &new)| {
                    Some(Setpoint {
                        magnet: magnet.clone(),
                        new_ps: new,
                        ref_ps: *ref_ps.get(magnet)?,
                        new_k: *new_k.get(magnet)?,
                        ref_k: *ref_k.get(magnet)?,
                    })
                })
                .collect(),
        )
    }
    pub fn setpoints(&self) -> &[Setpoint] {
        &self.0
    }
    pub fn len(&self) -> usize {
        self.0.len()
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
impl Display for SetpointTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "{:10} {:>14} {:>14} {:>8} {:>13} {:>13}",
            "Magnet", "New PS values", "Ref PS values", "Factor", "New k values", "Ref k values"
        )?;
        for s in &self.0 {
            writeln!(
                f,
                "{:10} {:>14.3} {:>14.3} {:>8.3} {:>13.3} {:>13.3}",
                s.magnet,
                s.new_ps,
                s.ref_ps,
                s.factor(),
                s.new_k,
                s.ref_k
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(values: &[(&str, f64)]) -> Values {
        values.iter().map(|&(k, v)| (k.to_string(), v)).collect()
    }

    #[test]
    fn new_ps_values() {
        let new_k = values(&[("Q1PDR", 2.5), ("Q2PDR", -1.8)]);
        let ref_k = values(&[("Q1PDR", 2.0), ("Q2PDR", -1.8)]);
        let ref_ps = values(&[("Q1PDR", 100.0), ("Q2PDR", 80.0)]);
        let new_ps = compute_new_ps_values(&new_k, &ref_k, &ref_ps).unwrap();
        assert_eq!(new_ps, values(&[("Q1PDR", 125.0)]));
        let table = SetpointTable::new(&new_ps, &ref_ps, &new_k, &ref_k);
        assert_eq!(table.len(), 1);
        assert_eq!(table.setpoints()[0].factor(), 1.25);
        let text = table.to_string();
        assert!(text.lines().nth(1).unwrap().starts_with("Q1PDR"));
        assert!(text.contains("125.000"));
    }

    #[test]
    fn different_magnets() {
        let new_k = values(&[("Q1PDR", 2.5), ("Q2PDR", -1.8)]);
        let ref_k = values(&[("Q1PDR", 2.0), ("Q3PD1R", -1.8)]);
        match compute_new_ps_values(&new_k, &ref_k, &Values::new()) {
            Err(QuadConversionError::DifferentMagnets { only_new, only_ref }) => {
                assert_eq!(only_new, vec!["Q2PDR"]);
                assert_eq!(only_ref, vec!["Q3PD1R"]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn bad_reference() {
        let new_k = values(&[("Q1PDR", 2.5)]);
        assert!(matches!(
            compute_new_ps_values(&new_k, &values(&[("Q1PDR", 2.0)]), &Values::new()),
            Err(QuadConversionError::MissingReference(_))
        ));
        assert!(matches!(
            compute_new_ps_values(
                &new_k,
                &values(&[("Q1PDR", 0.0)]),
                &values(&[("Q1PDR", 100.0)])
            ),
            Err(QuadConversionError::ZeroReference(_))
        ));
    }
}
