//! Infix rendering of expressions, used for the emitted equation listing.

use crate::Expr;
use num::rational::BigRational;
use num::{One, Signed};
use std::fmt;

pub(crate) fn write_expr(f: &mut fmt::Formatter<'_>, expr: &Expr) -> fmt::Result {
    match expr {
        Expr::Rational(r) => write_rational(f, r),
        Expr::Symbol(name) => f.write_str(name),
        Expr::Add(terms) => write_sum(f, terms),
        Expr::Mul(factors) => write_product(f, factors),
        Expr::Pow(base, exp) => write_pow(f, base, exp),
    }
}

fn write_rational(f: &mut fmt::Formatter<'_>, r: &BigRational) -> fmt::Result {
    write!(f, "{}", r.numer())?;

    if !r.denom().is_one() {
        write!(f, "/{}", r.denom())?;
    }

    Ok(())
}

fn write_sum(f: &mut fmt::Formatter<'_>, terms: &[Expr]) -> fmt::Result {
    for (i, term) in terms.iter().enumerate() {
        if i == 0 {
            write_expr(f, term)?;
            continue;
        }

        match strip_negative(term) {
            Some(positive) => {
                write!(f, " - ")?;
                write_expr(f, &positive)?;
            }
            None => {
                write!(f, " + ")?;
                write_expr(f, term)?;
            }
        }
    }

    Ok(())
}

/// If the term carries a negative leading coefficient, returns its
/// negation so the sum can render it after a minus sign.
fn strip_negative(term: &Expr) -> Option<Expr> {
    match term {
        Expr::Rational(r) if r.is_negative() => Some(Expr::Rational(-r.clone())),
        Expr::Mul(factors) => match factors.first() {
            Some(Expr::Rational(r)) if r.is_negative() => Some(-term.clone()),
            _ => None,
        },
        _ => None,
    }
}

fn write_product(f: &mut fmt::Formatter<'_>, factors: &[Expr]) -> fmt::Result {
    let mut constant = None;
    let mut numerator = Vec::new();
    let mut denominator = Vec::new();

    for factor in factors {
        match factor {
            Expr::Rational(r) => constant = Some(r),
            Expr::Pow(base, exp) if exp.is_negative() => denominator.push((base, -exp.clone())),
            other => numerator.push(other),
        }
    }

    let bare_sign = constant.map(|r| *r == -BigRational::one()).unwrap_or(false)
        && !numerator.is_empty();

    let mut need_star = false;
    if bare_sign {
        write!(f, "-")?;
    } else if let Some(r) = constant {
        write_rational(f, r)?;
        need_star = true;
    } else if numerator.is_empty() {
        write!(f, "1")?;
    }

    for factor in numerator {
        if need_star {
            write!(f, "*")?;
        }
        write_atom(f, factor)?;
        need_star = true;
    }

    if !denominator.is_empty() {
        write!(f, "/")?;

        if denominator.len() == 1 {
            let (base, exp) = &denominator[0];
            write_pow(f, base, exp)?;
        } else {
            write!(f, "(")?;
            for (i, (base, exp)) in denominator.iter().enumerate() {
                if i > 0 {
                    write!(f, "*")?;
                }
                write_pow(f, base, exp)?;
            }
            write!(f, ")")?;
        }
    }

    Ok(())
}

fn write_pow(f: &mut fmt::Formatter<'_>, base: &Expr, exp: &BigRational) -> fmt::Result {
    if exp.is_negative() {
        write!(f, "1/")?;
        return write_pow(f, base, &-exp.clone());
    }

    if exp.is_one() {
        return write_atom(f, base);
    }

    write_atom(f, base)?;
    write!(f, "^")?;

    if exp.is_integer() {
        write!(f, "{}", exp.numer())
    } else {
        write!(f, "(")?;
        write_rational(f, exp)?;
        write!(f, ")")
    }
}

/// Writes a subexpression, parenthesized when its rendering would bind
/// looser than the surrounding product or power.
fn write_atom(f: &mut fmt::Formatter<'_>, expr: &Expr) -> fmt::Result {
    let composite = match expr {
        Expr::Symbol(_) => false,
        Expr::Rational(r) => r.is_negative() || !r.denom().is_one(),
        Expr::Add(_) | Expr::Mul(_) => true,
        // Powers render tightly except for the 1/x form.
        Expr::Pow(_, exp) => exp.is_negative(),
    };

    if composite {
        write!(f, "(")?;
        write_expr(f, expr)?;
        write!(f, ")")
    } else {
        write_expr(f, expr)
    }
}
