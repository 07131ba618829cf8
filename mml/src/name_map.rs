//! # Name map
//!
//! A table with, for each ring element:
//! AT index - AO index - AT type (defined in AO) - AT (family) name - AO name - PS name
//!
//! AT indices start at 0.
//! AO indices are not unique, they are defined within each AO family.

use std::{
    collections::BTreeSet,
    fmt::Display,
};

use serde::Serialize;

use crate::{ChannelGroups, MachineProfile, MmlError, Result, Ring};

/// Policy for ring elements claimed by several AO family members
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum CollisionPolicy {
    /// the last claim silently wins
    Overwrite,
    /// the last claim wins and a warning is logged
    #[default]
    Warn,
    /// the name map is not built
    Error,
}

/// Name map row
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NameMapEntry {
    pub at_index: usize,
    pub ao_index: usize,
    pub at_type: String,
    pub at_name: String,
    pub ao_name: String,
    pub ps_name: String,
}

/// [NameMap] builder
#[derive(Debug)]
pub struct NameMapBuilder<'a> {
    groups: &'a ChannelGroups,
    ring: &'a Ring,
    collision: CollisionPolicy,
}
impl<'a> NameMapBuilder<'a> {
    /// Sets the policy for AT indices claimed twice
    pub fn collision(self, collision: CollisionPolicy) -> Self {
        Self { collision, ..self }
    }
    /// Builds the name map and checks its consistency against the machine profile
    pub fn build(self, profile: &MachineProfile) -> Result<NameMap> {
        let n = self.ring.len();
        let mut entries: Vec<NameMapEntry> = (0..n)
            .map(|at_index| NameMapEntry {
                at_index,
                ..Default::default()
            })
            .collect();
        let mut owners: Vec<Option<&str>> = vec![None; n];

        for (family, group) in self.groups.magnet_families() {
            let Some(at_type) = group.at_type() else {
                log::debug!("skipping AO family {family} without AT data");
                continue;
            };
            for assignment in group.assignments(family, n)? {
                let j = assignment.at_index;
                if let Some(previous) = owners[j] {
                    match self.collision {
                        CollisionPolicy::Overwrite => (),
                        CollisionPolicy::Warn => log::warn!(
                            "AT index {j} claimed by {family} ({}) was assigned to {previous} ({})",
                            assignment.ao_name,
                            entries[j].ao_name
                        ),
                        CollisionPolicy::Error => {
                            return Err(MmlError::IndexCollision {
                                index: j,
                                family: family.to_string(),
                                previous: previous.to_string(),
                            })
                        }
                    }
                }
                owners[j] = Some(family);
                let entry = &mut entries[j];
                entry.ao_index = assignment.ao_index;
                entry.at_type = at_type.to_string();
                entry.ao_name = assignment.ao_name.to_string();
                entry.ps_name = assignment.ps_name.to_string();
            }
        }

        for (entry, element) in entries.iter_mut().zip(self.ring.elements()) {
            entry.at_name = element.fam_name.clone();
        }

        if let Some(entry) = entries
            .iter()
            .find(|e| e.at_name == profile.bend_family && !profile.is_bend_supply(&e.ps_name))
        {
            return Err(MmlError::BendSupply {
                index: entry.at_index,
                at_name: entry.at_name.clone(),
                ps_name: entry.ps_name.clone(),
            });
        }

        Ok(NameMap { entries })
    }
}

/// Ring elements AT, AO & power supply names
#[derive(Debug, Clone, Serialize)]
pub struct NameMap {
    entries: Vec<NameMapEntry>,
}
impl NameMap {
    /// Starts building the name map of a ring from the AO families
    pub fn builder<'a>(groups: &'a ChannelGroups, ring: &'a Ring) -> NameMapBuilder<'a> {
        NameMapBuilder {
            groups,
            ring,
            collision: Default::default(),
        }
    }
    pub fn len(&self) -> usize {
        self.entries.len()
    }
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
    pub fn entries(&self) -> &[NameMapEntry] {
        &self.entries
    }
    pub fn get(&self, at_index: usize) -> Option<&NameMapEntry> {
        self.entries.get(at_index)
    }
    fn at_indices_by<F>(&self, f: F) -> Vec<usize>
    where
        F: Fn(&NameMapEntry) -> bool,
    {
        self.entries
            .iter()
            .filter(|e| f(e))
            .map(|e| e.at_index)
            .collect()
    }
    pub fn at_indices_by_ao_name(&self, name: &str) -> Vec<usize> {
        self.at_indices_by(|e| e.ao_name == name)
    }
    pub fn at_indices_by_ps_name(&self, name: &str) -> Vec<usize> {
        self.at_indices_by(|e| e.ps_name == name)
    }
    pub fn at_indices_by_at_name(&self, name: &str) -> Vec<usize> {
        self.at_indices_by(|e| e.at_name == name)
    }
    fn unique<'a, F>(&'a self, at_type: &str, f: F) -> BTreeSet<&'a str>
    where
        F: Fn(&'a NameMapEntry) -> &'a str,
    {
        self.entries
            .iter()
            .filter(|e| e.at_type == at_type)
            .map(f)
            .collect()
    }
    /// Sorted power supply names of a given AT type
    pub fn ps_names(&self, at_type: &str) -> BTreeSet<&str> {
        self.unique(at_type, |e| e.ps_name.as_str())
    }
    /// Sorted AO names of a given AT type
    pub fn ao_names(&self, at_type: &str) -> BTreeSet<&str> {
        self.unique(at_type, |e| e.ao_name.as_str())
    }
    /// Sorted AT names of a given AT type
    pub fn at_names(&self, at_type: &str) -> BTreeSet<&str> {
        self.unique(at_type, |e| e.at_name.as_str())
    }
    /// Printable table of the `n_max` first rows
    pub fn table(&self, n_max: Option<usize>) -> NameMapTable<'_> {
        NameMapTable {
            name_map: self,
            n_max: n_max.unwrap_or(self.len()),
        }
    }
}

pub struct NameMapTable<'a> {
    name_map: &'a NameMap,
    n_max: usize,
}
impl<'a> Display for NameMapTable<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "{:5} {:5} {:5}  {:12}    {:12}   {:20}   {:20}",
            "index",
            "at_indices",
            "ao_indices",
            "at_names",
            "ao_names",
            "ps_names",
            "at_types (defined in AO)"
        )?;
        for (i, e) in self.name_map.entries.iter().take(self.n_max).enumerate() {
            writeln!(
                f,
                "{:6}  {:6}  {:6}  {:12}    {:12}   {:20}   {:20}",
                i, e.at_index, e.ao_index, e.at_name, e.ao_name, e.ps_name, e.at_type
            )?;
        }
        Ok(())
    }
}
impl Display for NameMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.table(None).fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ChannelGroup, RingElement};

    fn ring() -> Ring {
        ["D", "Q1", "D", "BEND", "D", "Q1", "S1"]
            .into_iter()
            .map(|name| RingElement::new(name, "DriftPass", 0.1))
            .collect::<Vec<_>>()
            .into()
    }

    fn groups(bend_supply: &str) -> ChannelGroups {
        vec![
            (
                "Q1",
                ChannelGroup::new("QUAD", vec![2, 6].into(), ["Q1D1", "Q1D2"], ["Q1PDR:set", "Q1PDR:set"]),
            ),
            (
                "BEND",
                ChannelGroup::new("BEND", vec![4].into(), ["B1"], [bend_supply]),
            ),
            ("S1", ChannelGroup::new("SEXT", vec![7].into(), ["S1"], ["S1PR:set"])),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn completeness() {
        let ring = ring();
        let groups = groups("BPR:set");
        let name_map = NameMap::builder(&groups, &ring)
            .build(&MachineProfile::bessy2())
            .unwrap();
        assert_eq!(name_map.len(), ring.len());
        let indices: Vec<_> = name_map.entries().iter().map(|e| e.at_index).collect();
        assert_eq!(indices, (0..ring.len()).collect::<Vec<_>>());
        let drift = name_map.get(0).unwrap();
        assert_eq!(drift.at_name, "D");
        assert!(drift.ps_name.is_empty());
    }

    #[test]
    fn queries() {
        let ring = ring();
        let groups = groups("BPR:set");
        let name_map = NameMap::builder(&groups, &ring)
            .build(&MachineProfile::bessy2())
            .unwrap();
        assert_eq!(name_map.at_indices_by_ps_name("Q1PDR"), vec![1, 5]);
        assert_eq!(name_map.at_indices_by_ao_name("Q1D2"), vec![5]);
        assert_eq!(name_map.at_indices_by_at_name("D"), vec![0, 2, 4]);
        assert_eq!(
            name_map.ps_names("QUAD").into_iter().collect::<Vec<_>>(),
            vec!["Q1PDR"]
        );
        assert_eq!(
            name_map.ao_names("QUAD").into_iter().collect::<Vec<_>>(),
            vec!["Q1D1", "Q1D2"]
        );
        assert_eq!(
            name_map.at_names("SEXT").into_iter().collect::<Vec<_>>(),
            vec!["S1"]
        );
        assert!(name_map.ps_names("BPM").is_empty());
        assert_eq!(name_map.get(1).unwrap().ao_index, 0);
        assert_eq!(name_map.get(5).unwrap().ao_index, 1);
    }

    #[test]
    fn bend_supply() {
        let ring = ring();
        let groups = groups("Q1PDR:set");
        assert!(matches!(
            NameMap::builder(&groups, &ring).build(&MachineProfile::bessy2()),
            Err(MmlError::BendSupply { index: 3, ref ps_name, .. }) if ps_name == "Q1PDR"
        ));
    }

    #[test]
    fn collisions() {
        let ring = ring();
        let mut groups = groups("BPR:set");
        groups.insert(
            "Q1X",
            ChannelGroup::new("QUAD", vec![6].into(), ["Q1X"], ["Q1XPR:set"]),
        );
        let name_map = NameMap::builder(&groups, &ring)
            .build(&MachineProfile::bessy2())
            .unwrap();
        assert_eq!(name_map.get(5).unwrap().ps_name, "Q1XPR");
        let name_map = NameMap::builder(&groups, &ring)
            .collision(CollisionPolicy::Overwrite)
            .build(&MachineProfile::bessy2())
            .unwrap();
        assert_eq!(name_map.get(5).unwrap().ao_name, "Q1X");
        assert!(matches!(
            NameMap::builder(&groups, &ring)
                .collision(CollisionPolicy::Error)
                .build(&MachineProfile::bessy2()),
            Err(MmlError::IndexCollision { index: 5, .. })
        ));
    }

    #[test]
    fn table() {
        let ring = ring();
        let groups = groups("BPR:set");
        let name_map = NameMap::builder(&groups, &ring)
            .build(&MachineProfile::bessy2())
            .unwrap();
        assert_eq!(name_map.to_string().lines().count(), 8);
        let table = name_map.table(Some(2)).to_string();
        assert_eq!(table.lines().count(), 3);
        assert!(table.lines().nth(2).unwrap().contains("Q1PDR"));
    }
}
