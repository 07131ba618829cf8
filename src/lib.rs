//! # BESSY II & MLS magnet tools
//!
//! Tools to carry the magnet strengths of a LOCO fit of the BESSY II or MLS storage rings
//! into the machine:
//!  1. **[mml]**: builds the AT index / AO name / power supply name map of a LOCO export
//!     and extracts the quadrupole and sextupole strengths per power supply into a lattice file,
//!  2. **[quad_conversion]**: converts the quadrupole strengths of a new lattice into
//!     power supply setpoints relative to a reference lattice.
//!
//! Both are available as command line tools: `extract_quad_values` and `quad_conversion`.

pub use bessy2_tools_mml as mml;
pub use bessy2_tools_quad_conversion as quad_conversion;

pub mod prelude {
    pub use bessy2_tools_mml::{
        AggregationMethod, CollisionPolicy, Filing, Lattice, LocoFile, MagnetKind,
        ProfileRegistry,
    };
    pub use bessy2_tools_quad_conversion::{
        compute_new_ps_values, load_ps_values, load_quad_values, save_ps_values, SetpointTable,
    };
}
