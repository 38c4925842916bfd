//! The thorn under construction: grid-function registry, declared
//! parameters and scheduled functions.

use crate::gridfn::{Centering, GridFunction, StorageClass, Symmetry};
use crate::schedule::{Stmt, ThornFunction};
use briar_expr::Expr;
use briar_tensor::d3::{SymDeriv, Symmetric, Vector};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error while building up a thorn.
#[derive(Error, Debug)]
pub enum ThornError {
    #[error("grid function {0} is already registered")]
    DuplicateGridFunction(String),
    #[error("function {0} is already registered")]
    DuplicateFunction(String),
    #[error("parameter {name} value {value} is outside {min}..={max}")]
    ParamOutOfRange {
        name: String,
        value: i64,
        min: i64,
        max: i64,
    },
    #[error("assignment target {0} is not a registered grid-function component")]
    UnknownTarget(String),
    #[error("assignment target {0} is read-only (owned by external module {1})")]
    ExternalTarget(String, String),
    #[error("assignment target must be a grid-function symbol, got {0}")]
    MalformedTarget(String),
}

/// A host-visible integer parameter, declared together with the value
/// this generation run uses. The value travels in signatures and the
/// emitted description; there is no ambient parameter table.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IntParam {
    pub name: String,
    pub value: i64,
    pub min: i64,
    pub max: i64,
    pub doc: String,
}

/// A thorn being assembled: registered grid functions, parameters and
/// scheduled functions, all in registration order.
#[derive(Debug)]
pub struct Thorn {
    name: String,
    arrangement: String,
    grid_functions: Vec<GridFunction>,
    params: Vec<IntParam>,
    functions: Vec<ThornFunction>,
}

impl Thorn {
    pub fn new(arrangement: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arrangement: arrangement.into(),
            grid_functions: Vec::new(),
            params: Vec::new(),
            functions: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arrangement(&self) -> &str {
        &self.arrangement
    }

    pub fn grid_functions(&self) -> &[GridFunction] {
        &self.grid_functions
    }

    pub fn params(&self) -> &[IntParam] {
        &self.params
    }

    pub fn functions(&self) -> &[ThornFunction] {
        &self.functions
    }

    /// Declares an integer parameter along with the value used for this
    /// generation run.
    pub fn declare_int_param(
        &mut self,
        name: impl Into<String>,
        value: i64,
        (min, max): (i64, i64),
        doc: impl Into<String>,
    ) -> Result<(), ThornError> {
        let name = name.into();

        if !(min..=max).contains(&value) {
            return Err(ThornError::ParamOutOfRange {
                name,
                value,
                min,
                max,
            });
        }

        self.params.push(IntParam {
            name,
            value,
            min,
            max,
            doc: doc.into(),
        });

        Ok(())
    }

    /// Registers a scalar grid function and returns its symbol.
    pub fn register_scalar(
        &mut self,
        class: StorageClass,
        name: &str,
        centering: Centering,
    ) -> Result<Expr, ThornError> {
        self.insert(GridFunction {
            name: name.to_string(),
            class,
            rank: 0,
            symmetry: Symmetry::None,
            centering,
            components: vec![name.to_string()],
        })?;

        Ok(Expr::symbol(name))
    }

    /// Registers a rank 1 grid function; components are `name0..name2`.
    pub fn register_rank1(
        &mut self,
        class: StorageClass,
        name: &str,
        centering: Centering,
    ) -> Result<Vector<Expr>, ThornError> {
        let handle = Vector::from_fn(|[i]| Expr::symbol(format!("{}{}", name, i)));

        self.insert(GridFunction {
            name: name.to_string(),
            class,
            rank: 1,
            symmetry: Symmetry::None,
            centering,
            components: (0..3).map(|i| format!("{}{}", name, i)).collect(),
        })?;

        Ok(handle)
    }

    /// Registers a symmetric rank 2 grid function. Only the lower
    /// triangle is stored; components are named by the sorted index pair
    /// in storage order (`name00`, `name01`, `name11`, ...).
    pub fn register_rank2_sym(
        &mut self,
        class: StorageClass,
        name: &str,
        centering: Centering,
    ) -> Result<Symmetric<Expr>, ThornError> {
        let handle = Symmetric::from_fn(|[i, j]| {
            Expr::symbol(format!("{}{}{}", name, j.min(i), j.max(i)))
        });

        let mut components = Vec::new();
        Symmetric::<Expr>::for_each_index(|[i, j]| {
            components.push(format!("{}{}{}", name, j.min(i), j.max(i)))
        });

        self.insert(GridFunction {
            name: name.to_string(),
            class,
            rank: 2,
            symmetry: Symmetry::Sym01,
            centering,
            components,
        })?;

        Ok(handle)
    }

    /// Registers a rank 3 grid function symmetric in its leading pair,
    /// component names as in [`crate::deriv::declare_rank3_sym01`].
    pub fn register_rank3_sym01(
        &mut self,
        class: StorageClass,
        name: &str,
        centering: Centering,
    ) -> Result<SymDeriv<Expr>, ThornError> {
        let handle = SymDeriv::from_fn(|[i, j, k]| {
            Expr::symbol(format!("{}{}{}{}", name, j.min(i), j.max(i), k))
        });

        let mut components = Vec::new();
        SymDeriv::<Expr>::for_each_index(|[i, j, k]| {
            components.push(format!("{}{}{}{}", name, j.min(i), j.max(i), k))
        });

        self.insert(GridFunction {
            name: name.to_string(),
            class,
            rank: 3,
            symmetry: Symmetry::Sym01,
            centering,
            components,
        })?;

        Ok(handle)
    }

    /// Appends a scheduled function after checking every assignment
    /// writes a registered, writable grid-function component.
    pub fn add_func(&mut self, func: ThornFunction) -> Result<(), ThornError> {
        if self.functions.iter().any(|f| f.name == func.name) {
            return Err(ThornError::DuplicateFunction(func.name));
        }

        for stmt in &func.body {
            let Stmt::Assign { lhs, .. } = stmt else {
                continue;
            };

            let Expr::Symbol(target) = lhs else {
                return Err(ThornError::MalformedTarget(lhs.to_string()));
            };

            let owner = self
                .component_owner(target)
                .ok_or_else(|| ThornError::UnknownTarget(target.clone()))?;

            if let StorageClass::External { module } = &owner.class {
                return Err(ThornError::ExternalTarget(target.clone(), module.clone()));
            }
        }

        self.functions.push(func);
        Ok(())
    }

    fn component_owner(&self, component: &str) -> Option<&GridFunction> {
        self.grid_functions
            .iter()
            .find(|gf| gf.components.iter().any(|c| c == component))
    }

    fn insert(&mut self, gf: GridFunction) -> Result<(), ThornError> {
        if self.grid_functions.iter().any(|g| g.name == gf.name) {
            return Err(ThornError::DuplicateGridFunction(gf.name));
        }

        self.grid_functions.push(gf);
        Ok(())
    }
}
