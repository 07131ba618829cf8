/*!
# Quadrupole power supply setpoints

Computes new quadrupole power supply setpoints from a new lattice, a reference lattice
and the power supply setpoints of the reference lattice, assuming that the magnet
strength is proportional to the power supply current:
`new_ps = new_k * ref_ps / ref_k`.

```no_run
use bessy2_tools_quad_conversion::{compute_new_ps_values, load_ps_values, load_quad_values};

let new_k = load_quad_values("Q5T2off_turn_off.json")?;
let ref_k = load_quad_values("LOCOFitByPS_noID_ActualUserMode.json")?;
let ref_ps = load_ps_values("LOCOFitByPS_noID_ActualUserMode.values")?;
let new_ps = compute_new_ps_values(&new_k, &ref_k, &ref_ps)?;
# Ok::<(), bessy2_tools_quad_conversion::QuadConversionError>(())
```
*/

use std::path::PathBuf;

use bessy2_tools_mml::MmlError;

pub mod name_conversion;
mod setpoints;
pub use setpoints::{
    compute_new_ps_values, load_ps_values, load_quad_values, quad_values, save_ps_values,
    Setpoint, SetpointTable, Values,
};

#[derive(Debug, thiserror::Error)]
pub enum QuadConversionError {
    #[error("failed to read the lattice")]
    Lattice(#[from] MmlError),
    #[error("no power supply for quadrupole {0:?}")]
    UnknownMagnet(String),
    #[error("different magnets: {only_new:?} only in new values, {only_ref:?} only in reference values")]
    DifferentMagnets {
        only_new: Vec<String>,
        only_ref: Vec<String>,
    },
    #[error("no reference power supply value for {0:?}")]
    MissingReference(String),
    #[error("reference strength of {0:?} is zero")]
    ZeroReference(String),
    #[error("can't create file {1:?}")]
    Create(#[source] std::io::Error, PathBuf),
    #[error("can't open file {1:?}")]
    Open(#[source] std::io::Error, PathBuf),
    #[error(transparent)]
    IO(#[from] std::io::Error),
    #[error("JSON (de)serialization failed")]
    Json(#[from] serde_json::Error),
}
pub type Result<T> = std::result::Result<T, QuadConversionError>;
