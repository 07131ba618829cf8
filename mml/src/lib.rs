/*!
# LOCO magnet name map & strength extraction

Reconciles the three naming schemes found in a LOCO export of the BESSY II or MLS
storage rings:
 1. the AT index, position of an element in the accelerator model ring (starts at 0),
 2. the AO family & common names of the Middle Layer,
 3. the power supply names of the control system.

The [NameMap] is built once from the AO families and the first ring of the fit history.
Magnet strengths are then aggregated per power supply for a given fit iteration and converted
into lattice elements (`k1` for quadrupoles, `k2` for sextupoles) according to the
[MachineProfile] selected by the machine name written in the LOCO export.

```no_run
use bessy2_tools_mml::{Filing, LocoFile, MagnetKind, AggregationMethod};

let loco = LocoFile::from_path("ATRingWithAO.json")?;
let resolver = loco.resolver()?;
let quads = resolver.magnet_strength(MagnetKind::Quad, -1, AggregationMethod::ByPowerSupply)?;
# Ok::<(), bessy2_tools_mml::MmlError>(())
```
*/

use std::path::PathBuf;

pub mod ao;
mod filing;
pub mod lattice;
mod loco;
pub mod machine;
pub mod name_map;
pub mod ring;
pub mod strength;

pub use ao::{ChannelGroup, ChannelGroups, IndexTable};
pub use filing::{Codec, Filing};
pub use lattice::{Lattice, LatticeElement};
pub use loco::{AcceleratorData, LocoFile, Resolver};
pub use machine::{MachineProfile, ProfileRegistry};
pub use name_map::{CollisionPolicy, NameMap, NameMapBuilder, NameMapEntry};
pub use ring::{ElementKind, FitHistory, Ring, RingElement};
pub use strength::{AggregationMethod, MagnetKind, MagnetRecord, SupplyStrength};

#[derive(Debug, thiserror::Error)]
pub enum MmlError {
    #[error("unknown machine {0:?}")]
    UnknownMachine(String),
    #[error("no {kind} length for magnet family {key:?} of {machine} (magnet {name:?})")]
    UnknownFamily {
        machine: String,
        kind: MagnetKind,
        key: String,
        name: String,
    },
    #[error("AT type {0:?} not implemented")]
    UnsupportedKind(String),
    #[error("aggregation method {0:?} not implemented")]
    UnsupportedMethod(String),
    #[error(
        "broken file, probable cause: init and AT file incompatible \
        (element #{index} {at_name} powered by {ps_name:?})"
    )]
    BendSupply {
        index: usize,
        at_name: String,
        ps_name: String,
    },
    #[error("AT index {index} claimed by {family} was already assigned to {previous}")]
    IndexCollision {
        index: usize,
        family: String,
        previous: String,
    },
    #[error("AT index {index} of {family} is outside the ring (1..={n})")]
    IndexOutOfRange {
        family: String,
        index: usize,
        n: usize,
    },
    #[error("AO family {family}: {reason}")]
    ChannelGroup { family: String, reason: String },
    #[error("fit iteration {iteration} out of range ({n} ring(s) available)")]
    FitIteration { iteration: isize, n: usize },
    #[error("fit history is empty")]
    EmptyHistory,
    #[error("ring #{index} has {len} elements, expected {expected}")]
    RingLength {
        index: usize,
        len: usize,
        expected: usize,
    },
    #[error("element #{index} ({name}) has no {parameter}")]
    MissingParameter {
        index: usize,
        name: String,
        parameter: &'static str,
    },
    #[error("power supply {0:?} drives no magnet")]
    EmptySupply(String),
    #[error("lattice element {name:?} is not a valid magnet: {reason}")]
    Element { name: String, reason: String },
    #[error("can't create file {1:?}")]
    Create(#[source] std::io::Error, PathBuf),
    #[error("can't open file {1:?}")]
    Open(#[source] std::io::Error, PathBuf),
    #[error(transparent)]
    IO(#[from] std::io::Error),
    #[error("JSON (de)serialization failed")]
    Json(#[from] serde_json::Error),
    #[error("failed to parse machine profiles")]
    Toml(#[from] toml::de::Error),
}
pub type Result<T> = std::result::Result<T, MmlError>;
