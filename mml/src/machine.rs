//! # Machine profiles
//!
//! Magnet lengths and power supply naming conventions of the storage rings.
//!
//! The BESSY II and MLS profiles are built-in, more profiles can be loaded from a TOML file:
//! ```toml
//! [[profile]]
//! name = "MLS"
//! rewrites = [{ from = "RP", to = "" }]
//! bend_supplies = ["BPRP"]
//!
//! [profile.quad_length]
//! Q1 = 0.2
//! Q2 = 0.2
//! Q3 = 0.2
//!
//! [profile.sext_length]
//! S1 = 0.1
//! S2 = 0.1
//! S3 = 0.1
//! ```

use std::{collections::BTreeMap, fmt::Debug, fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{MagnetKind, MmlError, Result};

/// Substring replacement applied to power supply names
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewriteRule {
    pub from: String,
    pub to: String,
}
impl From<(&str, &str)> for RewriteRule {
    fn from((from, to): (&str, &str)) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

fn bend_family() -> String {
    "BEND".into()
}

/// Machine specific magnet lengths and naming conventions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineProfile {
    /// machine name as written in the LOCO export
    pub name: String,
    /// quadrupole lengths indexed by the first 2 letters of the magnet name
    pub quad_length: BTreeMap<String, f64>,
    /// sextupole lengths indexed by the first 2 letters of the magnet name
    pub sext_length: BTreeMap<String, f64>,
    /// power supply name to magnet name replacements, applied in order
    #[serde(default)]
    pub rewrites: Vec<RewriteRule>,
    /// AT family of the dipoles
    #[serde(default = "bend_family")]
    pub bend_family: String,
    /// power supplies allowed to drive the dipoles
    #[serde(default)]
    pub bend_supplies: Vec<String>,
}

const BEND_SUPPLIES: [&str; 5] = ["PB1ID6R", "PB2ID6R", "PB3ID6R", "BPR", "BPRP"];

fn lengths(table: &[(&str, f64)]) -> BTreeMap<String, f64> {
    table.iter().map(|&(k, l)| (k.to_string(), l)).collect()
}

impl MachineProfile {
    /// BESSY II storage ring
    pub fn bessy2() -> Self {
        Self {
            name: "BESSYII".into(),
            quad_length: lengths(&[
                ("Q1", 0.25),
                ("Q2", 0.20),
                ("Q3", 0.25),
                ("Q4", 0.50),
                ("Q5", 0.20),
                ("QI", 0.122),
            ]),
            sext_length: lengths(&[("S1", 0.21), ("S2", 0.16), ("S3", 0.16), ("S4", 0.16)]),
            rewrites: [("PR", ""), ("PD", "D"), ("PT", "T"), ("PQ", "Q"), ("R", "")]
                .into_iter()
                .map(RewriteRule::from)
                .collect(),
            bend_family: bend_family(),
            bend_supplies: BEND_SUPPLIES.iter().map(|s| s.to_string()).collect(),
        }
    }
    /// Metrology Light Source
    pub fn mls() -> Self {
        Self {
            name: "MLS".into(),
            quad_length: lengths(&[("Q1", 0.2), ("Q2", 0.2), ("Q3", 0.2)]),
            sext_length: lengths(&[("S1", 0.1), ("S2", 0.1), ("S3", 0.1)]),
            rewrites: vec![("RP", "").into()],
            bend_family: bend_family(),
            bend_supplies: BEND_SUPPLIES.iter().map(|s| s.to_string()).collect(),
        }
    }
    /// Magnet name from the power supply name
    pub fn canonical_name(&self, ps_name: &str) -> String {
        self.rewrites
            .iter()
            .fold(ps_name.to_string(), |name, rule| {
                name.replace(&rule.from, &rule.to)
            })
    }
    /// Magnet length from the magnet name
    pub fn length(&self, kind: MagnetKind, name: &str) -> Result<f64> {
        let table = match kind {
            MagnetKind::Quad => &self.quad_length,
            MagnetKind::Sext => &self.sext_length,
        };
        let key: String = name.chars().take(2).collect();
        table
            .get(&key)
            .copied()
            .ok_or_else(|| MmlError::UnknownFamily {
                machine: self.name.clone(),
                kind,
                key,
                name: name.to_string(),
            })
    }
    /// Checks if a power supply is allowed to drive the dipoles
    pub fn is_bend_supply(&self, ps_name: &str) -> bool {
        self.bend_supplies.iter().any(|s| s == ps_name)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ProfileFile {
    #[serde(default)]
    profile: Vec<MachineProfile>,
}

/// Machine profiles indexed by machine name
#[derive(Debug, Clone)]
pub struct ProfileRegistry {
    profiles: BTreeMap<String, MachineProfile>,
}
impl Default for ProfileRegistry {
    /// Registry with the BESSY II and MLS profiles
    fn default() -> Self {
        Self {
            profiles: [MachineProfile::bessy2(), MachineProfile::mls()]
                .into_iter()
                .map(|p| (p.name.clone(), p))
                .collect(),
        }
    }
}
impl ProfileRegistry {
    /// Registry without any profile
    pub fn empty() -> Self {
        Self {
            profiles: BTreeMap::new(),
        }
    }
    /// Adds a profile, replacing the profile with the same name
    pub fn insert(&mut self, profile: MachineProfile) -> &mut Self {
        if self.profiles.contains_key(&profile.name) {
            log::info!("overriding {} machine profile", profile.name);
        }
        self.profiles.insert(profile.name.clone(), profile);
        self
    }
    /// Adds the profiles of a TOML document
    pub fn merge_toml(&mut self, toml: &str) -> Result<&mut Self> {
        let file: ProfileFile = toml::from_str(toml)?;
        for profile in file.profile {
            self.insert(profile);
        }
        Ok(self)
    }
    /// Adds the profiles of a TOML file
    pub fn merge_path<P>(&mut self, path: P) -> Result<&mut Self>
    where
        P: AsRef<Path> + Debug,
    {
        log::info!("loading machine profiles from {path:?}");
        let toml = fs::read_to_string(&path)
            .map_err(|e| MmlError::Open(e, path.as_ref().to_path_buf()))?;
        self.merge_toml(&toml)
    }
    /// Returns the profile of a given machine
    pub fn get(&self, machine: &str) -> Result<&MachineProfile> {
        self.profiles
            .get(machine)
            .ok_or_else(|| MmlError::UnknownMachine(machine.to_string()))
    }
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(String::as_str)
    }
}
