//! Canonical rational-polynomial form of an expression.
//!
//! Symbols and irrational powers are interned as opaque atoms; everything
//! else expands into a quotient of multivariate polynomials with exact
//! rational coefficients. Two quotients are compared by cross
//! multiplication, so no polynomial division or GCD is needed.

use crate::{integer_exponent, Expr};
use num::rational::BigRational;
use num::{One, Signed, Zero};
use std::collections::BTreeMap;

/// Interning table mapping non-polynomial subexpressions to atom ids.
/// Shared between the expressions taking part in one comparison so equal
/// subtrees get equal ids.
pub(crate) struct AtomTable {
    atoms: BTreeMap<Expr, usize>,
}

impl AtomTable {
    pub(crate) fn new() -> Self {
        Self {
            atoms: BTreeMap::new(),
        }
    }

    fn intern(&mut self, expr: Expr) -> usize {
        let next = self.atoms.len();
        *self.atoms.entry(expr).or_insert(next)
    }
}

/// A monomial: atom id to (positive) power.
type Monomial = BTreeMap<usize, u64>;

/// A multivariate polynomial in normal form. Zero-coefficient terms are
/// never stored, so structural equality is polynomial equality.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Poly {
    terms: BTreeMap<Monomial, BigRational>,
}

impl Poly {
    fn constant(value: BigRational) -> Self {
        let mut terms = BTreeMap::new();
        if !value.is_zero() {
            terms.insert(Monomial::new(), value);
        }
        Self { terms }
    }

    fn one() -> Self {
        Self::constant(BigRational::one())
    }

    fn atom(id: usize) -> Self {
        let mut monomial = Monomial::new();
        monomial.insert(id, 1);

        let mut terms = BTreeMap::new();
        terms.insert(monomial, BigRational::one());
        Self { terms }
    }

    pub(crate) fn is_zero(&self) -> bool {
        self.terms.is_empty()
    }

    fn add(&self, other: &Poly) -> Poly {
        let mut terms = self.terms.clone();

        for (monomial, coeff) in &other.terms {
            let entry = terms
                .entry(monomial.clone())
                .or_insert_with(BigRational::zero);
            *entry += coeff;

            if entry.is_zero() {
                terms.remove(monomial);
            }
        }

        Poly { terms }
    }

    pub(crate) fn mul(&self, other: &Poly) -> Poly {
        let mut terms: BTreeMap<Monomial, BigRational> = BTreeMap::new();

        for (ma, ca) in &self.terms {
            for (mb, cb) in &other.terms {
                let mut monomial = ma.clone();
                for (atom, power) in mb {
                    *monomial.entry(*atom).or_insert(0) += power;
                }

                let entry = terms.entry(monomial).or_insert_with(BigRational::zero);
                *entry += ca * cb;
            }
        }

        terms.retain(|_, coeff| !coeff.is_zero());
        Poly { terms }
    }

    fn powi(&self, exp: u64) -> Poly {
        let mut result = Poly::one();
        for _ in 0..exp {
            result = result.mul(self);
        }
        result
    }
}

/// A quotient of polynomials. The denominator is not reduced against the
/// numerator; comparisons cross multiply instead.
pub(crate) struct RationalForm {
    pub(crate) num: Poly,
    pub(crate) den: Poly,
}

impl RationalForm {
    fn constant(value: BigRational) -> Self {
        Self {
            num: Poly::constant(value),
            den: Poly::one(),
        }
    }

    fn atom(id: usize) -> Self {
        Self {
            num: Poly::atom(id),
            den: Poly::one(),
        }
    }
}

/// Expands a normalized expression into canonical quotient form.
pub(crate) fn rational_form(expr: &Expr, atoms: &mut AtomTable) -> RationalForm {
    match expr {
        Expr::Rational(r) => RationalForm::constant(r.clone()),
        Expr::Symbol(_) => RationalForm::atom(atoms.intern(expr.clone())),
        Expr::Add(terms) => {
            let mut acc = RationalForm::constant(BigRational::zero());

            for term in terms {
                let rhs = rational_form(term, atoms);

                // Quotients over one common denominator add directly;
                // the general case cross multiplies, a/b + c/d = (ad + cb)/bd.
                acc = if acc.den == rhs.den {
                    RationalForm {
                        num: acc.num.add(&rhs.num),
                        den: acc.den,
                    }
                } else {
                    RationalForm {
                        num: acc.num.mul(&rhs.den).add(&rhs.num.mul(&acc.den)),
                        den: acc.den.mul(&rhs.den),
                    }
                };
            }

            acc
        }
        Expr::Mul(factors) => {
            let mut acc = RationalForm::constant(BigRational::one());

            for factor in factors {
                let rhs = rational_form(factor, atoms);
                acc = RationalForm {
                    num: acc.num.mul(&rhs.num),
                    den: acc.den.mul(&rhs.den),
                };
            }

            acc
        }
        Expr::Pow(base, exp) => match integer_exponent(exp) {
            Some(k) => {
                let inner = rational_form(base, atoms);
                let power = k.unsigned_abs();

                if k >= 0 {
                    RationalForm {
                        num: inner.num.powi(power),
                        den: inner.den.powi(power),
                    }
                } else {
                    RationalForm {
                        num: inner.den.powi(power),
                        den: inner.num.powi(power),
                    }
                }
            }
            // Irrational exponents stay opaque. Negative ones intern the
            // positive-power node and land in the denominator, so e.g.
            // detg^(-1/3) and 1/detg^(1/3) canonicalize identically.
            None => {
                if exp.is_negative() {
                    let inverse = Expr::Pow(base.clone(), -exp.clone());
                    RationalForm {
                        num: Poly::one(),
                        den: Poly::atom(atoms.intern(inverse)),
                    }
                } else {
                    RationalForm::atom(atoms.intern(expr.clone()))
                }
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn polynomial_normal_form_cancels() {
        let x = Expr::symbol("x");
        let y = Expr::symbol("y");

        let mut atoms = AtomTable::new();
        let a = rational_form(&(x.clone() * y.clone()), &mut atoms);
        let b = rational_form(&(y * x), &mut atoms);

        assert_eq!(a.num, b.num);
        assert!(a.num.mul(&b.den) == b.num.mul(&a.den));
    }

    #[test]
    fn negative_powers_move_to_denominator() {
        let x = Expr::symbol("x");

        let mut atoms = AtomTable::new();
        let form = rational_form(&x.clone().powi(-2), &mut atoms);

        assert!(form.num == Poly::one());
        assert!(!form.den.is_zero());
    }
}
