//! Grid function declarations: storage classes, centering and symmetry.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// How the host framework stores a grid function.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StorageClass {
    /// Owned by another module; read-only in this thorn.
    External { module: String },
    /// Evolved state, kept across multiple time levels.
    Evol,
    /// Derived data such as right hand sides, a single time level.
    Aux,
    /// Tile-local temporary, never persisted as a grid function.
    Tmp,
}

impl StorageClass {
    pub fn is_external(&self) -> bool {
        matches!(self, StorageClass::External { .. })
    }
}

/// Alignment of values along one axis of a grid cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Align {
    Vertex,
    Cell,
}

/// Grid-cell alignment for each of the three axes, written in the
/// compact three-letter form (`VVV`, `CCC`, `VVC`, ...).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Centering(pub [Align; 3]);

impl Centering {
    pub const fn vertex() -> Self {
        Self([Align::Vertex; 3])
    }

    pub const fn cell() -> Self {
        Self([Align::Cell; 3])
    }
}

/// Error while parsing a centering tag.
#[derive(Error, Debug, PartialEq, Eq)]
#[error("centering must be three characters of V or C, got {0:?}")]
pub struct CenteringParseError(String);

impl FromStr for Centering {
    type Err = CenteringParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let mut axes = [Align::Vertex; 3];
        let mut chars = value.chars();

        for axis in &mut axes {
            *axis = match chars.next() {
                Some('V') => Align::Vertex,
                Some('C') => Align::Cell,
                _ => return Err(CenteringParseError(value.to_string())),
            };
        }

        if chars.next().is_some() {
            return Err(CenteringParseError(value.to_string()));
        }

        Ok(Self(axes))
    }
}

impl fmt::Display for Centering {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for axis in self.0 {
            let tag = match axis {
                Align::Vertex => 'V',
                Align::Cell => 'C',
            };
            write!(f, "{}", tag)?;
        }

        Ok(())
    }
}

impl TryFrom<String> for Centering {
    type Error = CenteringParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Centering> for String {
    fn from(value: Centering) -> String {
        value.to_string()
    }
}

/// Index symmetry of a registered rank 2 or rank 3 grid function.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Symmetry {
    None,
    /// Symmetric in the leading index pair; only the lower triangle is
    /// stored and emitted.
    Sym01,
}

/// A grid function recorded in the registry, with the component symbols
/// its handle spans in storage order.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GridFunction {
    pub name: String,
    /// Flattened so the storage class serializes as plain keys of the
    /// grid-function entry rather than a nested table.
    #[serde(flatten)]
    pub class: StorageClass,
    pub rank: usize,
    pub symmetry: Symmetry,
    pub centering: Centering,
    pub components: Vec<String>,
}
