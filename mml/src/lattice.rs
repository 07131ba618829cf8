//! # Lattice file
//!
//! JSON lattice with the magnets indexed by name in the top-level `elements` object:
//! ```json
//! {
//!   "elements": {
//!     "Q1D": { "type": "Quad", "length": 0.25, "k1": 2.4 },
//!     "S2": { "type": "Sext", "length": 0.16, "k2": 6.25 }
//!   }
//! }
//! ```
//! Any other element or top-level entry is kept as it is.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{filing::Codec, MagnetKind, MagnetRecord, MmlError, Result};

/// Lattice element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatticeElement {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}
impl From<&MagnetRecord> for LatticeElement {
    fn from(magnet: &MagnetRecord) -> Self {
        let mut fields = Map::new();
        fields.insert("length".into(), magnet.length.into());
        fields.insert(magnet.kind.strength_field().into(), magnet.strength.into());
        Self {
            kind: magnet.kind.element_type().into(),
            fields,
        }
    }
}
impl LatticeElement {
    /// Returns the magnet kind if the element is a quadrupole or a sextupole
    pub fn magnet_kind(&self) -> Option<MagnetKind> {
        [MagnetKind::Quad, MagnetKind::Sext]
            .into_iter()
            .find(|kind| kind.element_type() == self.kind)
    }
    fn number(&self, name: &str, field: &str) -> Result<f64> {
        self.fields
            .get(field)
            .and_then(Value::as_f64)
            .ok_or_else(|| MmlError::Element {
                name: name.to_string(),
                reason: format!("missing or non-numeric {field:?}"),
            })
    }
    /// Converts the element into a magnet named `name`
    pub fn magnet(&self, name: &str) -> Result<MagnetRecord> {
        let kind = self.magnet_kind().ok_or_else(|| MmlError::Element {
            name: name.to_string(),
            reason: format!("type {:?} is neither Quad nor Sext", self.kind),
        })?;
        Ok(MagnetRecord {
            name: name.to_string(),
            kind,
            length: self.number(name, "length")?,
            strength: self.number(name, kind.strength_field())?,
        })
    }
}

/// JSON lattice
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Lattice {
    #[serde(default)]
    pub elements: BTreeMap<String, LatticeElement>,
    #[serde(flatten)]
    pub others: Map<String, Value>,
}
impl Codec for Lattice {}

impl<'a> FromIterator<&'a MagnetRecord> for Lattice {
    fn from_iter<T: IntoIterator<Item = &'a MagnetRecord>>(iter: T) -> Self {
        Self {
            elements: iter
                .into_iter()
                .map(|magnet| (magnet.name.clone(), magnet.into()))
                .collect(),
            ..Default::default()
        }
    }
}

impl Lattice {
    /// Adds a magnet, replacing the element with the same name
    pub fn insert_magnet(&mut self, magnet: &MagnetRecord) -> Option<LatticeElement> {
        self.elements.insert(magnet.name.clone(), magnet.into())
    }
    /// New lattice from a template and extracted magnets
    ///
    /// The template elements take precedence over the magnets with the same name
    pub fn with_magnets<'a, I>(template: &Lattice, magnets: I) -> Self
    where
        I: IntoIterator<Item = &'a MagnetRecord>,
    {
        let mut lattice = template.clone();
        for magnet in magnets {
            if lattice.elements.contains_key(&magnet.name) {
                log::warn!("magnet {} is superseded by the template element", magnet.name);
                continue;
            }
            lattice.insert_magnet(magnet);
        }
        lattice
    }
    /// Magnets of a given type, indexed by name
    pub fn magnets(&self, kind: MagnetKind) -> Result<BTreeMap<String, MagnetRecord>> {
        self.elements
            .iter()
            .filter(|(_, element)| element.magnet_kind() == Some(kind))
            .map(|(name, element)| Ok((name.clone(), element.magnet(name)?)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q1() -> MagnetRecord {
        MagnetRecord {
            name: "Q1".into(),
            kind: MagnetKind::Quad,
            length: 0.25,
            strength: 1.234,
        }
    }

    #[test]
    fn magnet_element() {
        let element = LatticeElement::from(&q1());
        assert_eq!(
            serde_json::to_value(&element).unwrap(),
            serde_json::json!({"type": "Quad", "length": 0.25, "k1": 1.234})
        );
        assert_eq!(element.magnet("Q1").unwrap(), q1());
    }

    #[test]
    fn round_trip() {
        let lattice: Lattice = [q1()].iter().collect();
        let json = serde_json::to_string_pretty(&lattice).unwrap();
        let decoded: Lattice = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, lattice);
        let q1 = &decoded.magnets(MagnetKind::Quad).unwrap()["Q1"];
        assert_eq!(q1.strength, 1.234);
        assert_eq!(q1.length, 0.25);
        assert_eq!(serde_json::to_string_pretty(&decoded).unwrap(), json);
    }

    #[test]
    fn other_entries() {
        let json = r#"{
  "elements": {
    "B1": {"type": "Sbend", "length": 0.855, "angle": 0.19634954084936207, "e1": 0.098},
    "Q1": {"type": "Quad", "length": 0.25, "k1": 2.1}
  },
  "version": 2,
  "sequence": ["Q1", "B1"]
}"#;
        let lattice: Lattice = serde_json::from_str(json).unwrap();
        assert_eq!(lattice.others["version"], 2);
        let b1 = &lattice.elements["B1"];
        assert_eq!(b1.magnet_kind(), None);
        assert_eq!(b1.fields["angle"].as_f64().unwrap(), 0.19634954084936207);
        assert!(b1.magnet("B1").is_err());
        let again: Lattice =
            serde_json::from_str(&serde_json::to_string(&lattice).unwrap()).unwrap();
        assert_eq!(again, lattice);
        assert!(lattice.magnets(MagnetKind::Sext).unwrap().is_empty());
    }

    #[test]
    fn bad_magnet() {
        let json = r#"{"elements": {"Q1": {"type": "Quad", "length": 0.25}}}"#;
        let lattice: Lattice = serde_json::from_str(json).unwrap();
        assert!(matches!(
            lattice.magnets(MagnetKind::Quad),
            Err(MmlError::Element { .. })
        ));
    }

    #[test]
    fn template_precedence() {
        let mut template = Lattice::default();
        template.elements.insert(
            "Q2".into(),
            LatticeElement {
                kind: "Quad".into(),
                fields: serde_json::json!({"length": 0.2, "k1": -1.0})
                    .as_object()
                    .cloned()
                    .unwrap(),
            },
        );
        let q2 = MagnetRecord {
            name: "Q2".into(),
            kind: MagnetKind::Quad,
            length: 0.2,
            strength: -2.0,
        };
        let lattice = Lattice::with_magnets(&template, [q1(), q2].iter());
        assert_eq!(lattice.elements.len(), 2);
        let magnets = lattice.magnets(MagnetKind::Quad).unwrap();
        assert_eq!(magnets["Q1"].strength, 1.234);
        assert_eq!(magnets["Q2"].strength, -1.0);
    }
}
