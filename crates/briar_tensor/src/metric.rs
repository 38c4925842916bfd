//! Inverse, determinant and trace of symmetric 3×3 matrices.
//!
//! The entries are scalars in the [`Scalar`](crate::Scalar) sense, so the
//! same routines serve the symbolic metric at generation time and plain
//! floats in numeric checks. Everything is purely functional over the
//! input matrix.

use crate::d3::{sum, Symmetric};
use crate::{Scalar, Sym, Tensor};
use thiserror::Error;

/// The algebraic inverse of a symmetric matrix, along with the
/// determinant the cofactors were divided by.
#[derive(Clone, Debug)]
pub struct InverseResult<T> {
    pub inverse: Symmetric<T>,
    pub determinant: T,
}

/// The determinant is identically the zero expression, so no algebraic
/// inverse exists. Determinants that merely vanish at particular points
/// are not detected here; that is an evaluation-time concern.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("symmetric matrix determinant is identically zero")]
pub struct SingularMatrixError;

impl<T: Scalar> Tensor<T, 3, 2, Sym> {
    /// Computes the determinant by cofactor expansion along the first row.
    pub fn det(&self) -> T {
        let m = |i: usize, j: usize| self[[i, j]].clone();

        m(0, 0) * (m(1, 1) * m(2, 2) - m(1, 2) * m(1, 2))
            - m(0, 1) * (m(0, 1) * m(2, 2) - m(1, 2) * m(0, 2))
            + m(0, 2) * (m(0, 1) * m(1, 2) - m(1, 1) * m(0, 2))
    }

    /// Computes the inverse as the adjugate over the determinant.
    ///
    /// Fails only when the determinant is identically zero; any other
    /// determinant yields the quotient unconditionally.
    pub fn inv(&self) -> Result<InverseResult<T>, SingularMatrixError> {
        let det = self.det();

        if det.is_zero() {
            return Err(SingularMatrixError);
        }

        let inverse = Symmetric::from_fn(|[i, j]| self.cofactor(i, j) / det.clone());

        Ok(InverseResult {
            inverse,
            determinant: det,
        })
    }

    /// Contracts this matrix against another symmetric matrix over both
    /// indices, Σᵢⱼ self\[i\]\[j\]·other\[i\]\[j\].
    pub fn cotrace(&self, other: &Symmetric<T>) -> T {
        sum(|[a, b]| self[[a, b]].clone() * other[[a, b]].clone())
    }

    fn cofactor(&self, i: usize, j: usize) -> T {
        let (r0, r1) = complement(i);
        let (c0, c1) = complement(j);

        let minor = self[[r0, c0]].clone() * self[[r1, c1]].clone()
            - self[[r0, c1]].clone() * self[[r1, c0]].clone();

        if (i + j) % 2 == 1 {
            -minor
        } else {
            minor
        }
    }
}

/// The two axes other than the given one, in increasing order.
fn complement(axis: usize) -> (usize, usize) {
    match axis {
        0 => (1, 2),
        1 => (0, 2),
        _ => (0, 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use briar_expr::Expr;

    /// A fully symbolic symmetric matrix with entries named by the
    /// sorted index pair, `g00`, `g01`, ...
    fn sym_matrix(prefix: &str) -> Symmetric<Expr> {
        Symmetric::from_fn(|[i, j]| Expr::symbol(format!("{}{}{}", prefix, j.min(i), j.max(i))))
    }

    fn delta(i: usize, k: usize) -> Expr {
        Expr::integer(if i == k { 1 } else { 0 })
    }

    #[test]
    fn inverse_round_trip_is_the_identity() {
        let m = sym_matrix("g");
        let InverseResult { inverse, .. } = m.inv().unwrap();

        for i in 0..3 {
            for k in 0..3 {
                let entry = sum(|[j]| m[[i, j]].clone() * inverse[[j, k]].clone());
                assert!(
                    entry.equivalent(&delta(i, k)),
                    "entry ({i}, {k}) does not contract to the identity"
                );
            }
        }
    }

    #[test]
    fn determinant_respects_symmetry() {
        let m = sym_matrix("g");
        let relabeled = Symmetric::from_fn(|[i, j]| m[[j, i]].clone());

        assert_eq!(m.det(), relabeled.det());
    }

    #[test]
    fn double_inversion_restores_the_matrix() {
        let m = sym_matrix("g");
        let once = m.inv().unwrap();
        let twice = once.inverse.inv().unwrap();

        Symmetric::<Expr>::for_each_index(|[i, j]| {
            assert!(
                twice.inverse[[i, j]].equivalent(&m[[i, j]]),
                "component ({i}, {j}) not restored"
            );
        });
    }

    #[test]
    fn identity_inverts_to_itself() {
        let id: Symmetric<f64> = Symmetric::from_fn(|[i, j]| if i == j { 1.0 } else { 0.0 });
        let InverseResult {
            inverse,
            determinant,
        } = id.inv().unwrap();

        assert_eq!(determinant, 1.0);
        Symmetric::<f64>::for_each_index(|[i, j]| {
            assert_eq!(inverse[[i, j]], if i == j { 1.0 } else { 0.0 });
        });
    }

    #[test]
    fn diagonal_matrix_inverts_exactly() {
        let diag = [2, 3, 5];
        let m: Symmetric<Expr> = Symmetric::from_fn(|[i, j]| {
            if i == j {
                Expr::integer(diag[i])
            } else {
                Expr::integer(0)
            }
        });

        let InverseResult {
            inverse,
            determinant,
        } = m.inv().unwrap();

        assert_eq!(determinant, Expr::integer(30));
        for i in 0..3 {
            assert_eq!(inverse[[i, i]], Expr::rational(1, diag[i]));
        }
        assert_eq!(inverse[[0, 1]], Expr::integer(0));
        assert_eq!(inverse[[1, 2]], Expr::integer(0));
    }

    #[test]
    fn zero_row_is_structurally_singular() {
        let m: Symmetric<Expr> = Symmetric::from_fn(|[i, j]| {
            if i == 0 || j == 0 {
                Expr::integer(0)
            } else {
                Expr::symbol(format!("g{}{}", j.min(i), j.max(i)))
            }
        });

        assert!(m.det().is_structurally_zero());
        assert_eq!(m.inv().unwrap_err(), SingularMatrixError);
    }

    #[test]
    fn numerically_singular_floats_are_rejected_too() {
        let m: Symmetric<f64> =
            Symmetric::from_fn(|[i, j]| if i == j && i < 2 { 1.0 } else { 0.0 });

        assert!(m.inv().is_err());
    }

    #[test]
    fn trace_against_own_inverse_is_the_dimension() {
        let dd = sym_matrix("d");
        let InverseResult { inverse, .. } = dd.inv().unwrap();

        let trace = inverse.cotrace(&dd);
        assert!(trace.equivalent(&Expr::integer(3)));
    }
}
