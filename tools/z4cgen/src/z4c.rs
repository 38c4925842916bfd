//! The Z4c conversion recipe: grid-function registrations and the two
//! scheduled functions turning ADM initial data into Z4c variables.

use crate::config::Config;
use anyhow::{anyhow, Result};
use briar::deriv;
use briar::prelude::*;

fn external(module: &str) -> StorageClass {
    StorageClass::External {
        module: module.to_string(),
    }
}

/// Registers the full set of grid functions for the formulation and
/// schedules the ADM to Z4c conversion.
pub fn build_thorn(config: &Config, centering: Centering) -> Result<Thorn> {
    let mut thorn = Thorn::new(&config.arrangement, &config.thorn);

    thorn.declare_int_param(
        "fd_order",
        config.fd_order as i64,
        (2, 8),
        "Finite differencing order",
    )?;

    // ADM variables, owned by the initial-data module.
    let gdd = thorn.register_rank2_sym(external("ADMBase"), "metric", centering)?;
    let kdd = thorn.register_rank2_sym(external("ADMBase"), "extcurv", centering)?;
    let alp = thorn.register_scalar(external("ADMBase"), "lapse", centering)?;
    let betau = thorn.register_rank1(external("ADMBase"), "shift", centering)?;

    // Evolved Z4c variables.
    let chi = thorn.register_scalar(StorageClass::Evol, "chi", centering)?;
    let gammatildedd = thorn.register_rank2_sym(StorageClass::Evol, "gammatildeDD", centering)?;
    let khat = thorn.register_scalar(StorageClass::Evol, "Khat", centering)?;
    let atildedd = thorn.register_rank2_sym(StorageClass::Evol, "AtildeDD", centering)?;
    let gammatildeu = thorn.register_rank1(StorageClass::Evol, "GammatildeU", centering)?;
    let theta = thorn.register_scalar(StorageClass::Evol, "Theta", centering)?;
    let alphag = thorn.register_scalar(StorageClass::Evol, "alphaG", centering)?;
    let betagu = thorn.register_rank1(StorageClass::Evol, "betaGU", centering)?;

    // Right hand sides, filled in by the evolution loops.
    thorn.register_scalar(StorageClass::Aux, "chi_rhs", centering)?;
    thorn.register_rank2_sym(StorageClass::Aux, "gammatildeDD_rhs", centering)?;
    thorn.register_scalar(StorageClass::Aux, "Khat_rhs", centering)?;
    thorn.register_rank2_sym(StorageClass::Aux, "AtildeDD_rhs", centering)?;
    thorn.register_rank1(StorageClass::Aux, "GammatildeU_rhs", centering)?;
    thorn.register_scalar(StorageClass::Aux, "Theta_rhs", centering)?;
    thorn.register_scalar(StorageClass::Aux, "alphaG_rhs", centering)?;
    thorn.register_rank1(StorageClass::Aux, "betaGU_rhs", centering)?;

    // Tile-local derivative scratch.
    thorn.register_rank1(StorageClass::Tmp, "dchi", centering)?;
    let dgammatildeddd =
        thorn.register_rank3_sym01(StorageClass::Tmp, "dgammatildeDDD", centering)?;

    let theta0 = Expr::from_f64(config.theta)
        .ok_or_else(|| anyhow!("theta initial value must be finite"))?;

    // Part 1: pointwise conversion of the ADM state.
    let InverseResult {
        inverse: guu,
        determinant: detg,
    } = gdd.inv()?;

    let trk = guu.cotrace(&kdd);
    let chi_value = Expr::integer(1) / detg.cbrt();

    let mut body = Vec::new();

    body.push(Stmt::assign(chi.clone(), chi_value.clone()));

    for i in 0..3 {
        for j in 0..=i {
            body.push(Stmt::assign(
                gammatildedd[[i, j]].clone(),
                chi_value.clone() * gdd[[i, j]].clone(),
            ));
        }
    }

    body.push(Stmt::assign(theta.clone(), theta0.clone()));
    body.push(Stmt::assign(
        khat.clone(),
        trk.clone() - Expr::integer(2) * theta0,
    ));

    for i in 0..3 {
        for j in 0..=i {
            let traceless =
                kdd[[i, j]].clone() - trk.clone() / Expr::integer(3) * gdd[[i, j]].clone();
            body.push(Stmt::assign(
                atildedd[[i, j]].clone(),
                chi_value.clone() * traceless,
            ));
        }
    }

    body.push(Stmt::assign(alphag, alp));

    for i in 0..3 {
        body.push(Stmt::assign(betagu[[i]].clone(), betau[[i]].clone()));
    }

    thorn.add_func(ThornFunction {
        name: format!("{}_initial1", config.thorn),
        body,
        domain: IterationDomain::Everywhere,
        schedule: ScheduleBin::new("initial").after("ADMBase_PostInitial"),
        doc: "Convert ADM to Z4c variables, part 1".to_string(),
        centering,
    })?;

    // Part 2: the conformal connection, which needs derivatives of the
    // conformal metric written in part 1.
    let gammatildedd_dd = deriv::declare_rank3_sym01("gammatildeDD_dD");

    let InverseResult {
        inverse: gammatildeuu,
        ..
    } = gammatildedd.inv()?;

    let mut body = Vec::new();

    for i in 0..3 {
        for j in 0..=i {
            for k in 0..3 {
                body.push(Stmt::assign(
                    dgammatildeddd[[i, j, k]].clone(),
                    gammatildedd_dd[[i, j, k]].clone(),
                ));
            }
            // The contraction below reads the whole temporary, so each
            // component group finishes its tile loop first.
            body.push(Stmt::SplitLoop);
        }
    }

    for i in 0..3 {
        let rhs = sum(|[j, k]| gammatildeuu[[j, k]].clone() * dgammatildeddd[[j, k, i]].clone());
        body.push(Stmt::assign(gammatildeu[[i]].clone(), rhs));
    }

    thorn.add_func(ThornFunction {
        name: format!("{}_initial2", config.thorn),
        body,
        domain: IterationDomain::Interior,
        schedule: ScheduleBin::new("initial").after(format!("{}_initial1", config.thorn)),
        doc: "Convert ADM to Z4c variables, part 2".to_string(),
        centering,
    })?;

    Ok(thorn)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        toml::from_str("").unwrap()
    }

    fn build() -> Thorn {
        build_thorn(&config(), Centering::vertex()).unwrap()
    }

    /// Rebuilds the symbolic handle of an external rank 2 registration.
    fn sym_handle(name: &str) -> Symmetric<Expr> {
        Symmetric::from_fn(|[i, j]| Expr::symbol(format!("{}{}{}", name, j.min(i), j.max(i))))
    }

    fn assigned(stmt: &Stmt) -> (&Expr, &Expr) {
        match stmt {
            Stmt::Assign { lhs, rhs } => (lhs, rhs),
            Stmt::SplitLoop => panic!("expected an assignment"),
        }
    }

    #[test]
    fn registers_the_full_formulation() {
        let thorn = build();

        let names: Vec<_> = thorn
            .grid_functions()
            .iter()
            .map(|gf| gf.name.as_str())
            .collect();

        assert_eq!(
            names,
            vec![
                "metric",
                "extcurv",
                "lapse",
                "shift",
                "chi",
                "gammatildeDD",
                "Khat",
                "AtildeDD",
                "GammatildeU",
                "Theta",
                "alphaG",
                "betaGU",
                "chi_rhs",
                "gammatildeDD_rhs",
                "Khat_rhs",
                "AtildeDD_rhs",
                "GammatildeU_rhs",
                "Theta_rhs",
                "alphaG_rhs",
                "betaGU_rhs",
                "dchi",
                "dgammatildeDDD",
            ]
        );

        assert_eq!(thorn.params()[0].name, "fd_order");
        assert_eq!(thorn.params()[0].value, 4);
    }

    #[test]
    fn initial1_emits_in_lower_triangular_order() {
        let thorn = build();
        let initial1 = &thorn.functions()[0];

        assert_eq!(initial1.name, "Z4c_initial1");
        assert_eq!(initial1.schedule.to_string(), "initial AFTER ADMBase_PostInitial");

        let targets: Vec<_> = initial1
            .body
            .iter()
            .map(|stmt| assigned(stmt).0.to_string())
            .collect();

        assert_eq!(
            targets,
            vec![
                "chi",
                "gammatildeDD00",
                "gammatildeDD01",
                "gammatildeDD11",
                "gammatildeDD02",
                "gammatildeDD12",
                "gammatildeDD22",
                "Theta",
                "Khat",
                "AtildeDD00",
                "AtildeDD01",
                "AtildeDD11",
                "AtildeDD02",
                "AtildeDD12",
                "AtildeDD22",
                "alphaG",
                "betaGU0",
                "betaGU1",
                "betaGU2",
            ]
        );
    }

    #[test]
    fn chi_is_the_inverse_cube_root_of_the_determinant() {
        let thorn = build();
        let (lhs, rhs) = assigned(&thorn.functions()[0].body[0]);

        assert_eq!(*lhs, Expr::symbol("chi"));

        let expected = Expr::integer(1) / sym_handle("metric").det().cbrt();
        assert_eq!(*rhs, expected);
    }

    #[test]
    fn theta_parameter_feeds_theta_and_khat() {
        let mut config = config();
        config.theta = 0.25;

        let thorn = build_thorn(&config, Centering::vertex()).unwrap();
        let body = &thorn.functions()[0].body;

        let (lhs, rhs) = assigned(&body[7]);
        assert_eq!(*lhs, Expr::symbol("Theta"));
        assert_eq!(*rhs, Expr::rational(1, 4));

        let gdd = sym_handle("metric");
        let kdd = sym_handle("extcurv");
        let trk = gdd.inv().unwrap().inverse.cotrace(&kdd);

        let (lhs, rhs) = assigned(&body[8]);
        assert_eq!(*lhs, Expr::symbol("Khat"));
        assert_eq!(*rhs, trk - Expr::rational(1, 2));
    }

    #[test]
    fn initial2_splits_loops_before_the_contraction() {
        let thorn = build();
        let initial2 = &thorn.functions()[1];

        assert_eq!(initial2.name, "Z4c_initial2");
        assert_eq!(initial2.domain, IterationDomain::Interior);
        assert_eq!(
            initial2.schedule.to_string(),
            "initial AFTER Z4c_initial1"
        );

        // Six component groups of three copies, each closed by a split,
        // then the three contraction assignments.
        assert_eq!(initial2.body.len(), 6 * 4 + 3);

        for group in 0..6 {
            assert!(matches!(initial2.body[group * 4 + 3], Stmt::SplitLoop));
        }

        let (lhs, rhs) = assigned(&initial2.body[24]);
        assert_eq!(*lhs, Expr::symbol("GammatildeU0"));

        let gammatildeuu = sym_handle("gammatildeDD").inv().unwrap().inverse;
        let scratch = deriv::declare_rank3_sym01("dgammatildeDDD");
        let expected = sum(|[j, k]| gammatildeuu[[j, k]].clone() * scratch[[j, k, 0]].clone());
        assert_eq!(*rhs, expected);
    }
}
