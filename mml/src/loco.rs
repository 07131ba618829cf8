use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    filing::Codec, strength, AggregationMethod, ChannelGroups, CollisionPolicy, FitHistory,
    MachineProfile, MagnetKind, MagnetRecord, NameMap, ProfileRegistry, Result, Ring,
    SupplyStrength,
};

/// Accelerator data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcceleratorData {
    /// machine name (`Maschine` in older files)
    #[serde(rename = "Machine", alias = "Maschine")]
    pub machine: String,
}

/// LOCO export of an `ATRingWithAO` file
///
/// The JSON document holds the accelerator data `ad`, the AO families `ao`
/// and the rings of the successive fit iterations `RINGs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocoFile {
    pub ad: AcceleratorData,
    pub ao: ChannelGroups,
    #[serde(rename = "RINGs")]
    pub rings: FitHistory,
}
impl Codec for LocoFile {}

impl LocoFile {
    pub fn machine(&self) -> &str {
        &self.ad.machine
    }
    /// Builds the resolver with the built-in machine profiles and the default collision policy
    pub fn resolver(&self) -> Result<Resolver<'_>> {
        self.resolver_with(&ProfileRegistry::default(), CollisionPolicy::default())
    }
    /// Builds the resolver with the given machine profiles and collision policy
    pub fn resolver_with(
        &self,
        registry: &ProfileRegistry,
        collision: CollisionPolicy,
    ) -> Result<Resolver<'_>> {
        log::info!("LOCO file belongs to: {}", self.machine());
        let profile = registry.get(self.machine())?.clone();
        Resolver::new(profile, &self.ao, &self.rings, collision)
    }
}

/// Magnet name map & strength resolver
///
/// The name map is built once from the initial ring
#[derive(Debug)]
pub struct Resolver<'a> {
    profile: MachineProfile,
    name_map: NameMap,
    rings: &'a FitHistory,
}
impl<'a> Resolver<'a> {
    pub fn new(
        profile: MachineProfile,
        groups: &ChannelGroups,
        rings: &'a FitHistory,
        collision: CollisionPolicy,
    ) -> Result<Self> {
        let name_map = NameMap::builder(groups, rings.first())
            .collision(collision)
            .build(&profile)?;
        Ok(Self {
            profile,
            name_map,
            rings,
        })
    }
    pub fn profile(&self) -> &MachineProfile {
        &self.profile
    }
    pub fn name_map(&self) -> &NameMap {
        &self.name_map
    }
    /// Ring of a given fit iteration (`-1` for the last one)
    pub fn ring(&self, fit_iteration: isize) -> Result<&'a Ring> {
        self.rings.ring(fit_iteration)
    }
    /// Averaged model strengths per power supply
    pub fn supply_strength(
        &self,
        kind: MagnetKind,
        fit_iteration: isize,
    ) -> Result<BTreeMap<String, SupplyStrength>> {
        strength::aggregate_by_power_supply(&self.name_map, self.ring(fit_iteration)?, kind)
    }
    /// Lattice magnets of a given type, indexed by magnet name
    pub fn magnet_strength(
        &self,
        kind: MagnetKind,
        fit_iteration: isize,
        method: AggregationMethod,
    ) -> Result<BTreeMap<String, MagnetRecord>> {
        strength::magnet_strength(
            &self.name_map,
            self.ring(fit_iteration)?,
            &self.profile,
            kind,
            method,
        )
    }
}
