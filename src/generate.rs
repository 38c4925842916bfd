//! Emission of the thorn description consumed by the downstream
//! lowering toolchain.
//!
//! Nothing here touches stencils or host code: the output is a toml
//! manifest of the registry contents plus a readable equation listing,
//! written under the host installation's arrangements directory.

use crate::gridfn::GridFunction;
use crate::schedule::{IterationDomain, Stmt, ThornFunction};
use crate::thorn::{IntParam, Thorn};
use serde::Serialize;
use std::fmt::Write as _;
use std::path::PathBuf;
use thiserror::Error;

/// Environment variable naming the host installation root. Required.
pub const HOME_KEY: &str = "BRIAR_HOME";
/// Environment variable naming the build configuration. Optional.
pub const CONFIG_KEY: &str = "BRIAR_CONFIG";
/// Environment variable naming a thornlist to extend. Optional.
pub const THORNLIST_KEY: &str = "BRIAR_THORNLIST";

/// Error while emitting the thorn description.
#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("environment variable {0} must point to the host installation root")]
    MissingHome(&'static str),
    #[error("failed to write thorn description: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to serialize thorn manifest: {0}")]
    Toml(#[from] toml::ser::Error),
}

/// Where and under which configuration the description is emitted.
#[derive(Clone, Debug)]
pub struct GenerateConfig {
    pub home: PathBuf,
    pub config: String,
    pub thornlist: Option<PathBuf>,
}

impl GenerateConfig {
    /// Reads the generation target from the environment. A missing
    /// installation root is a fatal precondition failure, reported
    /// immediately; there is nothing to fall back to.
    pub fn from_env() -> Result<Self, GenerateError> {
        let home = std::env::var_os(HOME_KEY).ok_or(GenerateError::MissingHome(HOME_KEY))?;

        let config = std::env::var(CONFIG_KEY).unwrap_or_else(|_| "sim".to_string());
        let thornlist = std::env::var_os(THORNLIST_KEY).map(PathBuf::from);

        Ok(Self {
            home: PathBuf::from(home),
            config,
            thornlist,
        })
    }
}

#[derive(Serialize)]
struct Manifest<'a> {
    thorn: Header<'a>,
    #[serde(rename = "param")]
    params: &'a [IntParam],
    #[serde(rename = "grid_function")]
    grid_functions: &'a [GridFunction],
    #[serde(rename = "function")]
    functions: Vec<FunctionEntry>,
}

#[derive(Serialize)]
struct Header<'a> {
    name: &'a str,
    arrangement: &'a str,
    config: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    thornlist: Option<&'a PathBuf>,
}

#[derive(Serialize)]
struct FunctionEntry {
    name: String,
    domain: IterationDomain,
    schedule: String,
    doc: String,
    centering: String,
    /// Equation bodies, one list per tile loop.
    loops: Vec<Vec<String>>,
}

impl FunctionEntry {
    fn new(func: &ThornFunction) -> Self {
        Self {
            name: func.name.clone(),
            domain: func.domain,
            schedule: func.schedule.to_string(),
            doc: func.doc.clone(),
            centering: func.centering.to_string(),
            loops: split_loops(&func.body),
        }
    }
}

/// Renders a function body into per-loop equation lists. Empty loops
/// produced by trailing splits are dropped.
fn split_loops(body: &[Stmt]) -> Vec<Vec<String>> {
    let mut loops = Vec::new();
    let mut current = Vec::new();

    for stmt in body {
        match stmt {
            Stmt::Assign { lhs, rhs } => current.push(format!("{} = {}", lhs, rhs)),
            Stmt::SplitLoop => {
                if !current.is_empty() {
                    loops.push(std::mem::take(&mut current));
                }
            }
        }
    }

    if !current.is_empty() {
        loops.push(current);
    }

    loops
}

/// Writes the thorn description under
/// `<home>/arrangements/<arrangement>/<thorn>/` and returns that
/// directory.
pub fn generate(thorn: &Thorn, config: &GenerateConfig) -> Result<PathBuf, GenerateError> {
    let dir = config
        .home
        .join("arrangements")
        .join(thorn.arrangement())
        .join(thorn.name());

    std::fs::create_dir_all(&dir)?;

    let manifest = Manifest {
        thorn: Header {
            name: thorn.name(),
            arrangement: thorn.arrangement(),
            config: &config.config,
            thornlist: config.thornlist.as_ref(),
        },
        params: thorn.params(),
        grid_functions: thorn.grid_functions(),
        functions: thorn.functions().iter().map(FunctionEntry::new).collect(),
    };

    std::fs::write(dir.join("manifest.toml"), toml::to_string_pretty(&manifest)?)?;
    std::fs::write(dir.join("equations.txt"), listing(thorn))?;

    Ok(dir)
}

/// A human-readable listing of every scheduled function's equations.
fn listing(thorn: &Thorn) -> String {
    let mut out = String::new();

    for func in thorn.functions() {
        // Infallible writes into a String.
        let _ = writeln!(
            out,
            "# {} ({:?}, {})",
            func.name, func.domain, func.schedule
        );

        for (i, block) in split_loops(&func.body).into_iter().enumerate() {
            if i > 0 {
                let _ = writeln!(out, "# -- next tile loop");
            }

            for line in block {
                let _ = writeln!(out, "{}", line);
            }
        }

        let _ = writeln!(out);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gridfn::{Centering, StorageClass};
    use crate::schedule::ScheduleBin;

    fn sample_thorn() -> Thorn {
        let mut thorn = Thorn::new("TestArrangement", "Test");
        thorn
            .declare_int_param("fd_order", 4, (2, 8), "Finite differencing order")
            .unwrap();

        let chi = thorn
            .register_scalar(StorageClass::Evol, "chi", Centering::vertex())
            .unwrap();
        let psi = thorn
            .register_scalar(StorageClass::Evol, "psi", Centering::vertex())
            .unwrap();

        thorn
            .add_func(ThornFunction {
                name: "Test_initial".to_string(),
                body: vec![
                    Stmt::assign(chi.clone(), briar_expr::Expr::integer(1)),
                    Stmt::SplitLoop,
                    Stmt::assign(psi, chi),
                ],
                domain: IterationDomain::Everywhere,
                schedule: ScheduleBin::new("initial"),
                doc: "Test function".to_string(),
                centering: Centering::vertex(),
            })
            .unwrap();

        thorn
    }

    #[test]
    fn loops_split_on_markers() {
        let thorn = sample_thorn();
        let loops = split_loops(&thorn.functions()[0].body);

        assert_eq!(loops, vec![vec!["chi = 1".to_string()], vec!["psi = chi".to_string()]]);
    }

    #[test]
    fn generate_emits_manifest_and_listing() {
        let thorn = sample_thorn();
        let dir = tempfile::tempdir().unwrap();

        let config = GenerateConfig {
            home: dir.path().to_path_buf(),
            config: "sim".to_string(),
            thornlist: None,
        };

        let out = generate(&thorn, &config).unwrap();
        assert_eq!(out, dir.path().join("arrangements/TestArrangement/Test"));

        let manifest = std::fs::read_to_string(out.join("manifest.toml")).unwrap();
        assert!(manifest.contains("fd_order"));
        assert!(manifest.contains("arrangement = \"TestArrangement\""));

        let listing = std::fs::read_to_string(out.join("equations.txt")).unwrap();
        assert!(listing.contains("chi = 1"));
        assert!(listing.contains("next tile loop"));
    }

    #[test]
    fn missing_home_is_fatal() {
        std::env::remove_var(HOME_KEY);
        assert!(matches!(
            GenerateConfig::from_env(),
            Err(GenerateError::MissingHome(_))
        ));

        std::env::set_var(HOME_KEY, "/opt/host");
        std::env::set_var(CONFIG_KEY, "devsim");

        let config = GenerateConfig::from_env().unwrap();
        assert_eq!(config.home, PathBuf::from("/opt/host"));
        assert_eq!(config.config, "devsim");

        std::env::remove_var(HOME_KEY);
        std::env::remove_var(CONFIG_KEY);
    }
}
