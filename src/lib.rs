//! Symbolic construction of simulation-framework thorns.
//!
//! A thorn is assembled by registering grid functions (which hand back
//! symbolic expression handles), declaring parameters and scheduling
//! functions made of update equations, then emitted as a declarative
//! description for the host framework's lowering toolchain. The symbolic
//! algebra itself lives in `briar_expr` and `briar_tensor`.

pub mod deriv;
pub mod generate;
pub mod gridfn;
pub mod schedule;
pub mod thorn;

/// Provides the common types used by thorn-building recipes.
pub mod prelude {
    pub use crate::generate::{generate, GenerateConfig};
    pub use crate::gridfn::{Align, Centering, StorageClass, Symmetry};
    pub use crate::schedule::{IterationDomain, ScheduleBin, Stmt, ThornFunction};
    pub use crate::thorn::{Thorn, ThornError};
    pub use briar_expr::Expr;
    pub use briar_tensor::d3::{sum, SymDeriv, Symmetric, Vector};
    pub use briar_tensor::{InverseResult, SingularMatrixError};
}
