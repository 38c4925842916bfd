//! Finite-difference derivative placeholders.
//!
//! Equations reference derivatives through indexed placeholder symbols;
//! deriving the actual stencils is the lowering toolchain's job.

use briar_expr::Expr;
use briar_tensor::d3::{SymDeriv, Vector};

/// Declares first-derivative placeholders `name0`, `name1`, `name2`.
pub fn declare_rank1(name: &str) -> Vector<Expr> {
    Vector::from_fn(|[i]| Expr::symbol(format!("{}{}", name, i)))
}

/// Declares derivative placeholders for a symmetric rank 2 grid
/// function: components are named by the sorted leading pair followed by
/// the derivative axis (`name001` is ∂₁ of the `00` component).
pub fn declare_rank3_sym01(name: &str) -> SymDeriv<Expr> {
    SymDeriv::from_fn(|[i, j, k]| {
        Expr::symbol(format!("{}{}{}{}", name, j.min(i), j.max(i), k))
    })
}
