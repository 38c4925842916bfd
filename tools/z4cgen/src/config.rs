use anyhow::{anyhow, Context, Result};
use clap::{Arg, Command};
use serde::Deserialize;

/// Configuration format for Z4cGen.
#[derive(Deserialize)]
pub struct Config {
    /// Name of the generated thorn.
    #[serde(default = "default_thorn")]
    pub thorn: String,
    /// Arrangement the thorn description is placed under.
    #[serde(default = "default_arrangement")]
    pub arrangement: String,
    /// Verbosity of logging.
    pub logging_level: Option<usize>,

    /// Finite differencing order declared by the thorn. Threaded
    /// explicitly into the emitted description.
    #[serde(default = "default_fd_order")]
    pub fd_order: usize,
    /// Initial value of the evolved Theta projection variable.
    #[serde(default)]
    pub theta: f64,
    /// Grid centering used by every registered function.
    #[serde(default = "default_centering")]
    pub centering: String,
}

fn default_thorn() -> String {
    "Z4c".to_string()
}

fn default_arrangement() -> String {
    "BriarNR".to_string()
}

fn default_fd_order() -> usize {
    4
}

fn default_centering() -> String {
    "VVV".to_string()
}

pub fn configure() -> Result<Config> {
    let matches = Command::new("z4cgen")
        .about("A program for generating the Z4c variable-conversion thorn from its symbolic description.")
        .version("v0.1.0")
        .arg(
            Arg::new("path")
                .help("Path of config file describing the thorn to generate")
                .value_name("PATH")
                .required(true),
        )
        .get_matches();

    // Get path argument
    let path = matches
        .get_one::<String>("path")
        .ok_or(anyhow!("Failed to specify path argument"))?
        .clone();

    // Read config file.
    let config_string =
        String::from_utf8(std::fs::read(&path).context(format!("Failed to find {} file", &path))?)
            .context("Config file must be UTF8 encoded")?;

    // Parse config file into structure.
    toml::from_str(&config_string).context("Failed to parse config file")
}
