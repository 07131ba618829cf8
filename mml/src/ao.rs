//! # Middle Layer (AO) families
//!
//! Each AO family gives, for each of its members, the AT indices of the
//! ring elements, the member common name and the power supply channel name.

use indexmap::IndexMap;
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::{MmlError, Result};

/// AO families without ring elements
pub const IGNORED_FAMILIES: [&str; 2] = ["TUNE", "DCCT"];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RawIndexTable {
    Matrix(Vec<Vec<usize>>),
    Column(Vec<usize>),
}

/// AT indices of an AO family
///
/// Each row is a family member, each column an occurrence of the member in the ring
/// (e.g. the slices of a split magnet).
/// The indices follow the MatLab convention and start at 1.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexTable(DMatrix<usize>);
impl TryFrom<Vec<Vec<usize>>> for IndexTable {
    type Error = MmlError;
    fn try_from(rows: Vec<Vec<usize>>) -> Result<Self> {
        let nrows = rows.len();
        let ncols = rows.first().map_or(0, Vec::len);
        if let Some(row) = rows.iter().find(|row| row.len() != ncols) {
            return Err(MmlError::ChannelGroup {
                family: String::new(),
                reason: format!(
                    "ATIndex is not rectangular: found a row of {} instead of {ncols}",
                    row.len()
                ),
            });
        }
        let data: Vec<usize> = rows.into_iter().flatten().collect();
        Ok(Self(DMatrix::from_row_slice(nrows, ncols, &data)))
    }
}
impl From<Vec<usize>> for IndexTable {
    fn from(column: Vec<usize>) -> Self {
        Self(DMatrix::from_column_slice(column.len(), 1, &column))
    }
}
impl TryFrom<RawIndexTable> for IndexTable {
    type Error = MmlError;
    fn try_from(raw: RawIndexTable) -> Result<Self> {
        match raw {
            RawIndexTable::Matrix(rows) => rows.try_into(),
            RawIndexTable::Column(column) => Ok(column.into()),
        }
    }
}
impl From<IndexTable> for RawIndexTable {
    fn from(table: IndexTable) -> Self {
        RawIndexTable::Matrix(
            table
                .0
                .row_iter()
                .map(|row| row.iter().copied().collect())
                .collect(),
        )
    }
}
impl Serialize for IndexTable {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        RawIndexTable::from(self.clone()).serialize(serializer)
    }
}
impl<'de> Deserialize<'de> for IndexTable {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        RawIndexTable::deserialize(deserializer)?
            .try_into()
            .map_err(serde::de::Error::custom)
    }
}
impl IndexTable {
    /// Number of family members
    pub fn n_member(&self) -> usize {
        self.0.nrows()
    }
    /// Number of occurrences of each member
    pub fn n_occurrence(&self) -> usize {
        self.0.ncols()
    }
    /// Iterates over `(member, 1-based AT index)`, occurrence after occurrence
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..self.0.ncols())
            .flat_map(move |j| (0..self.0.nrows()).map(move |i| (i, self.0[(i, j)])))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AtInfo {
    #[serde(rename = "ATIndex")]
    pub index: IndexTable,
    #[serde(rename = "ATType")]
    pub at_type: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Monitor {
    #[serde(rename = "ChannelNames", default)]
    pub channel_names: Vec<String>,
}

/// AO family
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelGroup {
    #[serde(rename = "AT", default, skip_serializing_if = "Option::is_none")]
    pub at: Option<AtInfo>,
    #[serde(rename = "CommonNames", default)]
    pub common_names: Vec<String>,
    #[serde(rename = "Monitor", default)]
    pub monitor: Monitor,
}

/// Ring element assignment of an AO family member
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment<'a> {
    /// AT index (starts at 0)
    pub at_index: usize,
    /// member index within the family (starts at 0)
    pub ao_index: usize,
    pub ao_name: &'a str,
    pub ps_name: &'a str,
}

impl ChannelGroup {
    pub fn new<S: Into<String>>(
        at_type: impl Into<String>,
        index: IndexTable,
        common_names: impl IntoIterator<Item = S>,
        channel_names: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            at: Some(AtInfo {
                index,
                at_type: at_type.into(),
            }),
            common_names: common_names.into_iter().map(Into::into).collect(),
            monitor: Monitor {
                channel_names: channel_names.into_iter().map(Into::into).collect(),
            },
        }
    }
    /// AT type declared in AO
    pub fn at_type(&self) -> Option<&str> {
        self.at.as_ref().map(|at| at.at_type.as_str())
    }
    /// Name of family member #`i`
    ///
    /// A single name is shared by all the members (e.g. `RF`)
    fn member_name<'a>(names: &'a [String], i: usize) -> Option<&'a str> {
        match names {
            [name] => Some(name.as_str()),
            names => names.get(i).map(String::as_str),
        }
    }
    /// Ring element assignments of the family members, occurrence after occurrence
    ///
    /// `n` is the number of elements in the ring
    pub fn assignments(&self, family: &str, n: usize) -> Result<Vec<Assignment<'_>>> {
        let Some(at) = &self.at else {
            return Ok(vec![]);
        };
        let err = |reason: String| MmlError::ChannelGroup {
            family: family.to_string(),
            reason,
        };
        at.index
            .iter()
            .map(|(ao_index, index)| {
                if index == 0 || index > n {
                    return Err(MmlError::IndexOutOfRange {
                        family: family.to_string(),
                        index,
                        n,
                    });
                }
                let ao_name = Self::member_name(&self.common_names, ao_index).ok_or_else(|| {
                    err(format!(
                        "{} common name(s) for {} members",
                        self.common_names.len(),
                        at.index.n_member()
                    ))
                })?;
                let channel_name = Self::member_name(&self.monitor.channel_names, ao_index)
                    .ok_or_else(|| {
                        err(format!(
                            "{} channel name(s) for {} members",
                            self.monitor.channel_names.len(),
                            at.index.n_member()
                        ))
                    })?;
                Ok(Assignment {
                    at_index: index - 1,
                    ao_index,
                    ao_name,
                    ps_name: channel_name.split(':').next().unwrap_or_default(),
                })
            })
            .collect()
    }
}

/// AO families indexed by family name, in file order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelGroups(IndexMap<String, ChannelGroup>);
impl ChannelGroups {
    pub fn new() -> Self {
        Default::default()
    }
    pub fn insert(&mut self, family: impl Into<String>, group: ChannelGroup) -> &mut Self {
        self.0.insert(family.into(), group);
        self
    }
    pub fn get(&self, family: &str) -> Option<&ChannelGroup> {
        self.0.get(family)
    }
    pub fn len(&self) -> usize {
        self.0.len()
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ChannelGroup)> {
        self.0.iter().map(|(family, group)| (family.as_str(), group))
    }
    /// Families with ring elements, in file order
    pub fn magnet_families(&self) -> impl Iterator<Item = (&str, &ChannelGroup)> {
        self.iter()
            .filter(|(family, _)| !IGNORED_FAMILIES.contains(family))
    }
}
impl<S: Into<String>> FromIterator<(S, ChannelGroup)> for ChannelGroups {
    fn from_iter<T: IntoIterator<Item = (S, ChannelGroup)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}
