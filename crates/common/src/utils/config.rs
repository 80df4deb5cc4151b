use anyhow::{Context, Result};
use ::config::{Config, Environment, File};
use serde::de::DeserializeOwned;
use std::path::Path;

/// Loads configuration into a struct.
///
/// Sources are layered lowest first: the optional file (TOML, YAML, JSON,
/// etc. based on file extension), then environment variables named
/// `<PREFIX>_<FIELD>`, with `__` separating nested sections
/// (`FAUCET_LOGGING__LEVEL`). Fields absent from every source fall back to
/// the struct's serde defaults.
pub fn load_config<T: DeserializeOwned, P: AsRef<Path>>(path: Option<P>, env_prefix: &str) -> Result<T> {
    let mut builder = Config::builder();

    if let Some(path) = path {
        let path_str = path.as_ref().to_str().context("Invalid config path")?;
        builder = builder.add_source(File::with_name(path_str));
    }

    let settings = builder
        .add_source(
            Environment::with_prefix(env_prefix)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .context("Failed to build configuration")?;

    settings.try_deserialize::<T>().context("Failed to deserialize configuration")
}
