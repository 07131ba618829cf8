//! # Magnet strengths
//!
//! Strengths of the magnets driven by the same power supply are averaged and converted
//! into lattice magnets according to the machine profile.

use std::{collections::BTreeMap, fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{MachineProfile, MmlError, NameMap, Result, Ring};

/// Magnet type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MagnetKind {
    Quad,
    Sext,
}
impl MagnetKind {
    /// AT type as declared in the AO families
    pub fn at_type(&self) -> &'static str {
        match self {
            Self::Quad => "QUAD",
            Self::Sext => "SEXT",
        }
    }
    /// Element type in the lattice file
    pub fn element_type(&self) -> &'static str {
        match self {
            Self::Quad => "Quad",
            Self::Sext => "Sext",
        }
    }
    /// Strength field name in the lattice file
    pub fn strength_field(&self) -> &'static str {
        match self {
            Self::Quad => "k1",
            Self::Sext => "k2",
        }
    }
    /// Model strength of ring element #`index`
    pub fn model_strength(&self, ring: &Ring, index: usize) -> Result<f64> {
        match self {
            Self::Quad => ring.quadrupole_strength(index),
            Self::Sext => ring.sextupole_strength(index),
        }
    }
}
impl FromStr for MagnetKind {
    type Err = MmlError;
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "QUAD" | "Quad" | "quad" => Ok(Self::Quad),
            "SEXT" | "Sext" | "sext" => Ok(Self::Sext),
            _ => Err(MmlError::UnsupportedKind(s.to_string())),
        }
    }
}
impl Display for MagnetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.at_type().fmt(f)
    }
}

/// Magnet strength aggregation method
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum AggregationMethod {
    /// one strength per power supply
    #[default]
    ByPowerSupply,
}
impl FromStr for AggregationMethod {
    type Err = MmlError;
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "byPowerSupply" => Ok(Self::ByPowerSupply),
            _ => Err(MmlError::UnsupportedMethod(s.to_string())),
        }
    }
}
impl Display for AggregationMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ByPowerSupply => write!(f, "byPowerSupply"),
        }
    }
}

/// Averaged model strength of the magnets driven by one power supply
#[derive(Debug, Clone, PartialEq)]
pub struct SupplyStrength {
    /// AT indices of the magnets
    pub at_indices: Vec<usize>,
    /// model strength of each magnet
    pub strengths: Vec<f64>,
    pub mean: f64,
    /// `true` if the magnets do not share the same strength
    pub diverged: bool,
}
impl SupplyStrength {
    pub fn new(at_indices: Vec<usize>, strengths: Vec<f64>) -> Option<Self> {
        let first = *strengths.first()?;
        let diverged = strengths.iter().any(|&s| s != first);
        let mean = strengths.iter().sum::<f64>() / strengths.len() as f64;
        Some(Self {
            at_indices,
            strengths,
            mean,
            diverged,
        })
    }
}

/// Averages the magnet strengths of a ring per power supply
///
/// The power supplies are sorted alphabetically
pub fn aggregate_by_power_supply(
    name_map: &NameMap,
    ring: &Ring,
    kind: MagnetKind,
) -> Result<BTreeMap<String, SupplyStrength>> {
    let ps_names = name_map.ps_names(kind.at_type());
    log::info!("number of independent {kind} parameters: {}", ps_names.len());
    ps_names
        .into_iter()
        .map(|ps_name| {
            let at_indices = name_map.at_indices_by_ps_name(ps_name);
            let strengths = at_indices
                .iter()
                .map(|&i| kind.model_strength(ring, i))
                .collect::<Result<Vec<f64>>>()?;
            let supply = SupplyStrength::new(at_indices, strengths)
                .ok_or_else(|| MmlError::EmptySupply(ps_name.to_string()))?;
            if supply.diverged {
                log::warn!(
                    "magnets of power supply {ps_name} have different strengths {:?}, \
                    probably not fitted by power supply, using the average value {}",
                    supply.strengths,
                    supply.mean
                );
            } else {
                log::debug!("{ps_name}: {} x {}", supply.at_indices.len(), supply.mean);
            }
            Ok((ps_name.to_string(), supply))
        })
        .collect()
}

/// Lattice magnet
#[derive(Debug, Clone, PartialEq)]
pub struct MagnetRecord {
    pub name: String,
    pub kind: MagnetKind,
    /// magnetic length `[m]`
    pub length: f64,
    /// `k1` for quadrupoles, `k2` for sextupoles
    pub strength: f64,
}
impl MagnetRecord {
    /// Converts the averaged model strength of a power supply into a lattice magnet
    ///
    /// The sextupole `PolynomB[2]` coefficient is converted into `k2 = 2 PolynomB[2] / length`
    pub fn convert(
        profile: &MachineProfile,
        ps_name: &str,
        model_strength: f64,
        kind: MagnetKind,
    ) -> Result<Self> {
        let name = profile.canonical_name(ps_name);
        let length = profile.length(kind, &name)?;
        let strength = match kind {
            MagnetKind::Quad => model_strength,
            MagnetKind::Sext => model_strength / length * 2.,
        };
        Ok(Self {
            name,
            kind,
            length,
            strength,
        })
    }
}

/// Lattice magnets of a given type, indexed by magnet name
pub fn magnet_strength(
    name_map: &NameMap,
    ring: &Ring,
    profile: &MachineProfile,
    kind: MagnetKind,
    method: AggregationMethod,
) -> Result<BTreeMap<String, MagnetRecord>> {
    log::info!("magnet ({kind}) strength {method} for {}", profile.name);
    let supplies = match method {
        AggregationMethod::ByPowerSupply => aggregate_by_power_supply(name_map, ring, kind)?,
    };
    let mut magnets = BTreeMap::new();
    for (ps_name, supply) in supplies {
        let magnet = MagnetRecord::convert(profile, &ps_name, supply.mean, kind)?;
        if let Some(previous) = magnets.insert(magnet.name.clone(), magnet) {
            log::warn!("{ps_name} overrides magnet {}", previous.name);
        }
    }
    Ok(magnets)
}
