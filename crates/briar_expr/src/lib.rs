//! Symbolic scalar expressions used to state grid-function update equations.
//!
//! Expressions are kept in a normal form incrementally: the arithmetic
//! operators flatten nested sums and products, fold rational constants and
//! collect like terms as they build the tree, so two expressions assembled
//! from the same pieces compare equal structurally. Deeper questions
//! (is this expression identically zero? are these two quotients the same
//! rational function?) go through the canonical polynomial form in [`poly`].

use num::rational::BigRational;
use num::{BigInt, One, Signed, ToPrimitive, Zero};
use std::collections::BTreeMap;
use std::collections::VecDeque;
use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};

mod display;
mod poly;

/// A scalar expression over exact rational coefficients.
///
/// Sums and products are n-ary and sorted, powers carry a rational
/// exponent (so `x⁻¹` and `∛x` need no extra node kinds). Division is a
/// product with a negative exponent.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Expr {
    Rational(BigRational),
    Symbol(String),
    Add(Vec<Expr>),
    Mul(Vec<Expr>),
    Pow(Box<Expr>, BigRational),
}

impl Expr {
    /// Constructs an integer constant.
    pub fn integer(value: i64) -> Self {
        Expr::Rational(BigRational::from_integer(BigInt::from(value)))
    }

    /// Constructs an exact rational constant. Panics if `denom` is zero.
    pub fn rational(numer: i64, denom: i64) -> Self {
        Expr::Rational(BigRational::new(BigInt::from(numer), BigInt::from(denom)))
    }

    /// Constructs a free symbol.
    pub fn symbol(name: impl Into<String>) -> Self {
        Expr::Symbol(name.into())
    }

    /// Converts a finite float into its exact rational value.
    /// Returns `None` for NaN and infinities.
    pub fn from_f64(value: f64) -> Option<Self> {
        BigRational::from_float(value).map(Expr::Rational)
    }

    /// Raises the expression to an integer power.
    pub fn powi(self, exp: i64) -> Self {
        normalize_pow(self, BigRational::from_integer(BigInt::from(exp)))
    }

    /// The cube root, kept symbolic as a rational power.
    pub fn cbrt(self) -> Self {
        normalize_pow(self, BigRational::new(BigInt::from(1), BigInt::from(3)))
    }

    /// Recursively renormalizes an expression. Expressions built through
    /// the arithmetic operators are already in normal form; this is for
    /// trees assembled by hand out of the enum variants.
    pub fn simplify(&self) -> Self {
        match self {
            Expr::Rational(_) | Expr::Symbol(_) => self.clone(),
            Expr::Add(terms) => normalize_add(terms.iter().map(|t| t.simplify()).collect()),
            Expr::Mul(factors) => normalize_mul(factors.iter().map(|f| f.simplify()).collect()),
            Expr::Pow(base, exp) => normalize_pow(base.simplify(), exp.clone()),
        }
    }

    /// Whether the expression is identically the zero expression: its
    /// canonical numerator polynomial is empty. This is a structural
    /// property, independent of where the expression might evaluate to
    /// zero numerically.
    pub fn is_structurally_zero(&self) -> bool {
        let mut atoms = poly::AtomTable::new();
        poly::rational_form(&self.simplify(), &mut atoms).num.is_zero()
    }

    /// Whether two expressions denote the same rational function, decided
    /// by cross-multiplied canonical polynomial equality. This sees through
    /// unexpanded products and common factors that plain structural
    /// comparison misses.
    pub fn equivalent(&self, other: &Expr) -> bool {
        let mut atoms = poly::AtomTable::new();
        let a = poly::rational_form(&self.simplify(), &mut atoms);
        let b = poly::rational_form(&other.simplify(), &mut atoms);
        a.num.mul(&b.den) == b.num.mul(&a.den)
    }
}

impl From<i64> for Expr {
    fn from(value: i64) -> Self {
        Expr::integer(value)
    }
}

// *********************************
// Normalization

/// Flattens, folds constants and collects like terms of a sum.
fn normalize_add(terms: Vec<Expr>) -> Expr {
    let mut constant = BigRational::zero();
    let mut coeffs: BTreeMap<Expr, BigRational> = BTreeMap::new();

    let mut queue: VecDeque<Expr> = terms.into();
    while let Some(term) = queue.pop_front() {
        match term {
            Expr::Add(inner) => queue.extend(inner),
            Expr::Rational(r) => constant += r,
            other => {
                let (coeff, key) = split_coeff(other);
                *coeffs.entry(key).or_insert_with(BigRational::zero) += coeff;
            }
        }
    }

    let mut out = Vec::new();
    if !constant.is_zero() {
        out.push(Expr::Rational(constant));
    }

    for (key, coeff) in coeffs {
        if coeff.is_zero() {
            continue;
        }

        if coeff.is_one() {
            out.push(key);
        } else {
            out.push(apply_coeff(coeff, key));
        }
    }

    match out.len() {
        0 => Expr::Rational(BigRational::zero()),
        1 => out.pop().unwrap(),
        _ => Expr::Add(out),
    }
}

/// Splits a term into its rational coefficient and the remaining key used
/// for like-term collection. Normalized products keep their constant as
/// the leading factor.
fn split_coeff(term: Expr) -> (BigRational, Expr) {
    match term {
        Expr::Mul(mut factors) if matches!(factors.first(), Some(Expr::Rational(_))) => {
            let Expr::Rational(coeff) = factors.remove(0) else {
                unreachable!();
            };

            let key = if factors.len() == 1 {
                factors.pop().unwrap()
            } else {
                Expr::Mul(factors)
            };

            (coeff, key)
        }
        other => (BigRational::one(), other),
    }
}

/// Reattaches a collected coefficient to a like-term key.
fn apply_coeff(coeff: BigRational, key: Expr) -> Expr {
    match key {
        Expr::Mul(factors) => {
            let mut out = Vec::with_capacity(factors.len() + 1);
            out.push(Expr::Rational(coeff));
            out.extend(factors);
            Expr::Mul(out)
        }
        other => Expr::Mul(vec![Expr::Rational(coeff), other]),
    }
}

/// Flattens, folds constants and merges exponents of a product.
fn normalize_mul(factors: Vec<Expr>) -> Expr {
    let mut constant = BigRational::one();
    let mut powers: BTreeMap<Expr, BigRational> = BTreeMap::new();

    let mut queue: VecDeque<Expr> = factors.into();
    while let Some(factor) = queue.pop_front() {
        match factor {
            Expr::Mul(inner) => queue.extend(inner),
            Expr::Rational(r) => {
                if r.is_zero() {
                    return Expr::Rational(BigRational::zero());
                }
                constant *= r;
            }
            Expr::Pow(base, exp) => {
                *powers.entry(*base).or_insert_with(BigRational::zero) += exp;
            }
            other => {
                *powers.entry(other).or_insert_with(BigRational::zero) += BigRational::one();
            }
        }
    }

    let mut out = Vec::new();
    for (base, exp) in powers {
        if exp.is_zero() {
            continue;
        }

        // Integer powers of rationals fold back into the constant, except
        // negative powers of zero, which stay as their unevaluable node.
        if let (Expr::Rational(r), Some(k)) = (&base, integer_exponent(&exp)) {
            if !r.is_zero() || k >= 0 {
                constant *= rational_powi(r, k);
                continue;
            }
        }

        if exp.is_one() {
            out.push(base);
        } else {
            out.push(Expr::Pow(Box::new(base), exp));
        }
    }

    if out.is_empty() {
        return Expr::Rational(constant);
    }

    // A constant times a sum distributes, so that e.g. x - (x + y)
    // cancels term by term instead of stranding an unmerged sum.
    if out.len() == 1 && !constant.is_one() {
        if let Expr::Add(terms) = &out[0] {
            let scaled = terms
                .iter()
                .map(|t| normalize_mul(vec![Expr::Rational(constant.clone()), t.clone()]))
                .collect();
            return normalize_add(scaled);
        }
    }

    if constant.is_one() && out.len() == 1 {
        return out.pop().unwrap();
    }

    if !constant.is_one() {
        out.insert(0, Expr::Rational(constant));
    }

    match out.len() {
        1 => out.pop().unwrap(),
        _ => Expr::Mul(out),
    }
}

/// Collapses a power node: unit exponents, rational bases with integer
/// exponents, nested powers and integer powers of products.
fn normalize_pow(base: Expr, exp: BigRational) -> Expr {
    if exp.is_zero() {
        return Expr::Rational(BigRational::one());
    }

    if exp.is_one() {
        return base;
    }

    match base {
        Expr::Rational(r) => {
            if let Some(k) = integer_exponent(&exp) {
                // A negative power of zero has no closed form, keep the node.
                if r.is_zero() && k < 0 {
                    return Expr::Pow(Box::new(Expr::Rational(r)), exp);
                }
                return Expr::Rational(rational_powi(&r, k));
            }

            if r.is_zero() && exp.is_positive() {
                return Expr::Rational(BigRational::zero());
            }

            if r.is_one() {
                return Expr::Rational(BigRational::one());
            }

            Expr::Pow(Box::new(Expr::Rational(r)), exp)
        }
        Expr::Pow(inner, inner_exp) => normalize_pow(*inner, inner_exp * exp),
        Expr::Mul(factors) if exp.is_integer() => {
            let powed = factors
                .into_iter()
                .map(|f| normalize_pow(f, exp.clone()))
                .collect();
            normalize_mul(powed)
        }
        other => Expr::Pow(Box::new(other), exp),
    }
}

/// Extracts an exponent as a machine integer if it is one.
pub(crate) fn integer_exponent(exp: &BigRational) -> Option<i64> {
    if !exp.is_integer() {
        return None;
    }

    exp.to_integer().to_i64()
}

/// Exact integer power of a rational by repeated squaring.
fn rational_powi(r: &BigRational, k: i64) -> BigRational {
    let mut result = BigRational::one();
    let mut base = if k < 0 { r.recip() } else { r.clone() };
    let mut n = k.unsigned_abs();

    while n > 0 {
        if n & 1 == 1 {
            result *= &base;
        }
        base = &base * &base;
        n >>= 1;
    }

    result
}

// *********************************
// Operators

impl Add for Expr {
    type Output = Expr;

    fn add(self, rhs: Expr) -> Expr {
        normalize_add(vec![self, rhs])
    }
}

impl Sub for Expr {
    type Output = Expr;

    fn sub(self, rhs: Expr) -> Expr {
        normalize_add(vec![self, -rhs])
    }
}

impl Mul for Expr {
    type Output = Expr;

    fn mul(self, rhs: Expr) -> Expr {
        normalize_mul(vec![self, rhs])
    }
}

impl Div for Expr {
    type Output = Expr;

    fn div(self, rhs: Expr) -> Expr {
        let inverse = normalize_pow(rhs, -BigRational::one());
        normalize_mul(vec![self, inverse])
    }
}

impl Neg for Expr {
    type Output = Expr;

    fn neg(self) -> Expr {
        normalize_mul(vec![Expr::integer(-1), self])
    }
}

impl Zero for Expr {
    fn zero() -> Self {
        Expr::Rational(BigRational::zero())
    }

    fn is_zero(&self) -> bool {
        self.is_structurally_zero()
    }
}

impl One for Expr {
    fn one() -> Self {
        Expr::Rational(BigRational::one())
    }
}

impl std::iter::Sum for Expr {
    fn sum<I: Iterator<Item = Expr>>(iter: I) -> Expr {
        normalize_add(iter.collect())
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        display::write_expr(f, self)
    }
}
