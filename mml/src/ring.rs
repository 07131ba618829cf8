//! # Accelerator model rings
//!
//! AT ring elements as exported from the LOCO files and the time-ordered
//! history of rings produced by the successive fit iterations.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::{MmlError, Result};

/// AT element category, derived from the element pass method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Drift,
    /// Thick multipole (quadrupoles & sextupoles)
    Multipole,
    ThinMultipole,
    Bend,
    Other,
}
impl From<&str> for ElementKind {
    fn from(pass_method: &str) -> Self {
        match pass_method {
            "DriftPass" => Self::Drift,
            "StrMPoleSymplectic4Pass" | "StrMPoleSymplectic4RadPass" => Self::Multipole,
            "ThinMPolePass" => Self::ThinMultipole,
            "BndMPoleSymplectic4Pass" | "BndMPoleSymplectic4RadPass" => Self::Bend,
            _ => Self::Other,
        }
    }
}

/// AT ring element
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RingElement {
    #[serde(rename = "FamName")]
    pub fam_name: String,
    #[serde(rename = "PassMethod", default)]
    pub pass_method: String,
    #[serde(rename = "Length", default)]
    pub length: f64,
    #[serde(rename = "K", default, skip_serializing_if = "Option::is_none")]
    pub k: Option<f64>,
    #[serde(rename = "PolynomB", default, skip_serializing_if = "Option::is_none")]
    pub polynom_b: Option<Vec<f64>>,
    #[serde(
        rename = "BendingAngle",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub bending_angle: Option<f64>,
    #[serde(
        rename = "EntranceAngle",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub entrance_angle: Option<f64>,
    #[serde(rename = "ExitAngle", default, skip_serializing_if = "Option::is_none")]
    pub exit_angle: Option<f64>,
}
impl RingElement {
    pub fn new(fam_name: impl Into<String>, pass_method: impl Into<String>, length: f64) -> Self {
        Self {
            fam_name: fam_name.into(),
            pass_method: pass_method.into(),
            length,
            ..Default::default()
        }
    }
    /// Sets the quadrupole gradient `K`
    pub fn k(mut self, k: f64) -> Self {
        self.k = Some(k);
        self
    }
    /// Sets the multipole coefficients `PolynomB`
    pub fn polynom_b(mut self, polynom_b: Vec<f64>) -> Self {
        self.polynom_b = Some(polynom_b);
        self
    }
    /// Sets the bending, entrance and exit angles
    pub fn angles(mut self, bending: f64, entrance: f64, exit: f64) -> Self {
        self.bending_angle = Some(bending);
        self.entrance_angle = Some(entrance);
        self.exit_angle = Some(exit);
        self
    }
    pub fn kind(&self) -> ElementKind {
        self.pass_method.as_str().into()
    }
    fn polynom_b_at(&self, order: usize) -> Option<f64> {
        self.polynom_b.as_ref().and_then(|b| b.get(order)).copied()
    }
    /// Listing details: `None` if the element has nothing worth reporting
    fn extra(&self) -> Option<String> {
        match self.kind() {
            ElementKind::Multipole => match (self.k, self.polynom_b_at(2)) {
                (Some(k), _) => Some(format!("K = {k:11.8}")),
                (None, Some(b2)) => Some(format!("PolynomB[2] = {b2:11.8}")),
                (None, None) => None,
            },
            ElementKind::ThinMultipole => self
                .polynom_b_at(2)
                .map(|b2| format!("PolynomB[2] = {b2:11.8}")),
            ElementKind::Bend => Some(format!(
                "BendingAngle = {:11.8} EntranceAngle = {:11.8} ExitAngle = {:11.8}",
                self.bending_angle.unwrap_or_default(),
                self.entrance_angle.unwrap_or_default(),
                self.exit_angle.unwrap_or_default()
            )),
            _ => None,
        }
    }
}

/// One accelerator model ring
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ring {
    #[serde(rename = "ring")]
    elements: Vec<RingElement>,
}
impl From<Vec<RingElement>> for Ring {
    fn from(elements: Vec<RingElement>) -> Self {
        Self { elements }
    }
}
impl Ring {
    pub fn len(&self) -> usize {
        self.elements.len()
    }
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
    pub fn elements(&self) -> &[RingElement] {
        &self.elements
    }
    pub fn get(&self, index: usize) -> Option<&RingElement> {
        self.elements.get(index)
    }
    fn element(&self, index: usize) -> Result<&RingElement> {
        self.elements.get(index).ok_or(MmlError::IndexOutOfRange {
            family: "ring".into(),
            index: index + 1,
            n: self.len(),
        })
    }
    /// Quadrupole gradient of element #`index`
    ///
    /// `K` if present, otherwise the normal quadrupole coefficient `PolynomB[1]`
    pub fn quadrupole_strength(&self, index: usize) -> Result<f64> {
        let element = self.element(index)?;
        element
            .k
            .or_else(|| element.polynom_b_at(1))
            .ok_or_else(|| MmlError::MissingParameter {
                index,
                name: element.fam_name.clone(),
                parameter: "K",
            })
    }
    /// Normal sextupole coefficient `PolynomB[2]` of element #`index`
    pub fn sextupole_strength(&self, index: usize) -> Result<f64> {
        let element = self.element(index)?;
        element
            .polynom_b_at(2)
            .ok_or_else(|| MmlError::MissingParameter {
                index,
                name: element.fam_name.clone(),
                parameter: "PolynomB[2]",
            })
    }
    /// Sum of the element lengths
    pub fn total_length(&self) -> f64 {
        self.elements.iter().map(|e| e.length).sum()
    }
    /// Printable listing of the ring elements
    ///
    /// With `all` set to `false`, only multipoles and bends are listed
    pub fn listing(&self, all: bool) -> RingListing<'_> {
        RingListing { ring: self, all }
    }
}

/// Ring listing with the longitudinal position of each element
pub struct RingListing<'a> {
    ring: &'a Ring,
    all: bool,
}
impl<'a> Display for RingListing<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut s = 0f64;
        for (i, element) in self.ring.elements.iter().enumerate() {
            let l = element.length;
            s += l;
            let extra = element.extra();
            if extra.is_none() && !self.all {
                continue;
            }
            writeln!(
                f,
                "start: {:12.6} - {:10.6}   length: {:10.5}    {:5} {:12}  {:20} {}",
                s - l,
                s,
                l,
                i,
                element.fam_name,
                element.pass_method,
                extra.unwrap_or_default()
            )?;
        }
        write!(f, "Total length: {s:12.6}")
    }
}

/// Time-ordered rings of the successive LOCO fit iterations
///
/// All the rings have the same number of elements.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "Vec<Ring>", into = "Vec<Ring>")]
pub struct FitHistory(Vec<Ring>);
impl TryFrom<Vec<Ring>> for FitHistory {
    type Error = MmlError;
    fn try_from(rings: Vec<Ring>) -> Result<Self> {
        let expected = rings.first().ok_or(MmlError::EmptyHistory)?.len();
        if let Some((index, ring)) = rings
            .iter()
            .enumerate()
            .find(|(_, ring)| ring.len() != expected)
        {
            return Err(MmlError::RingLength {
                index,
                len: ring.len(),
                expected,
            });
        }
        Ok(Self(rings))
    }
}
impl From<FitHistory> for Vec<Ring> {
    fn from(history: FitHistory) -> Self {
        history.0
    }
}
impl FitHistory {
    /// Number of fit iterations
    pub fn len(&self) -> usize {
        self.0.len()
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
    /// Number of elements in each ring
    pub fn n_element(&self) -> usize {
        self.0.first().map_or(0, Ring::len)
    }
    /// Returns the ring of a given fit iteration
    ///
    /// Negative iterations count backward from the most recent one (`-1`)
    pub fn ring(&self, iteration: isize) -> Result<&Ring> {
        let n = self.0.len();
        let index = if iteration < 0 {
            n.checked_sub(iteration.unsigned_abs())
        } else {
            Some(iteration as usize).filter(|&i| i < n)
        };
        index
            .and_then(|i| self.0.get(i))
            .ok_or(MmlError::FitIteration { iteration, n })
    }
    /// The initial ring, before any fit
    pub fn first(&self) -> &Ring {
        &self.0[0]
    }
}
