//! # BESSY II quadrupole names
//!
//! Short magnet names of the lattice files and power supply names of the control system.

/// Quadrupoles `(short name, power supply name)`
pub const QUADRUPOLES: [(&str, &str); 52] = [
    ("QIT6", "PQIT6R"),
    ("Q1D", "Q1PDR"),
    ("Q2D", "Q2PDR"),
    ("Q3P1T1", "Q3P1T1R"),
    ("Q3P1T6", "Q3P1T6R"),
    ("Q3P1T8", "Q3P1T8R"),
    ("Q3P2T1", "Q3P2T1R"),
    ("Q3P2T6", "Q3P2T6R"),
    ("Q3P2T8", "Q3P2T8R"),
    ("Q3D1", "Q3PD1R"),
    ("Q3D2", "Q3PD2R"),
    ("Q3D3", "Q3PD3R"),
    ("Q3D4", "Q3PD4R"),
    ("Q3D5", "Q3PD5R"),
    ("Q3D6", "Q3PD6R"),
    ("Q3D7", "Q3PD7R"),
    ("Q3D8", "Q3PD8R"),
    ("Q3T2", "Q3PT2R"),
    ("Q3T3", "Q3PT3R"),
    ("Q3T4", "Q3PT4R"),
    ("Q3T5", "Q3PT5R"),
    ("Q3T7", "Q3PT7R"),
    ("Q4P1T1", "Q4P1T1R"),
    ("Q4P1T6", "Q4P1T6R"),
    ("Q4P1T8", "Q4P1T8R"),
    ("Q4P2T1", "Q4P2T1R"),
    ("Q4P2T6", "Q4P2T6R"),
    ("Q4P2T8", "Q4P2T8R"),
    ("Q4D1", "Q4PD1R"),
    ("Q4D2", "Q4PD2R"),
    ("Q4D3", "Q4PD3R"),
    ("Q4D4", "Q4PD4R"),
    ("Q4D5", "Q4PD5R"),
    ("Q4D6", "Q4PD6R"),
    ("Q4D7", "Q4PD7R"),
    ("Q4D8", "Q4PD8R"),
    ("Q4T2", "Q4PT2R"),
    ("Q4T3", "Q4PT3R"),
    ("Q4T4", "Q4PT4R"),
    ("Q4T5", "Q4PT5R"),
    ("Q4T7", "Q4PT7R"),
    ("Q5P1T1", "Q5P1T1R"),
    ("Q5P1T6", "Q5P1T6R"),
    ("Q5P1T8", "Q5P1T8R"),
    ("Q5P2T1", "Q5P2T1R"),
    ("Q5P2T6", "Q5P2T6R"),
    ("Q5P2T8", "Q5P2T8R"),
    ("Q5T2", "Q5PT2R"),
    ("Q5T3", "Q5PT3R"),
    ("Q5T4", "Q5PT4R"),
    ("Q5T5", "Q5PT5R"),
    ("Q5T7", "Q5PT7R"),
];

/// Power supply name of a quadrupole from its short name
pub fn short_to_epics(short: &str) -> Option<&'static str> {
    QUADRUPOLES
        .iter()
        .find(|(s, _)| *s == short)
        .map(|(_, epics)| *epics)
}

/// Short name of a quadrupole from its power supply name
pub fn epics_to_short(epics: &str) -> Option<&'static str> {
    QUADRUPOLES
        .iter()
        .find(|(_, e)| *e == epics)
        .map(|(short, _)| *short)
}
