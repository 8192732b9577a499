use std::path::{Path, PathBuf};

use tracing::debug;

use crate::{env_subst::substitute_env, schema::MusterConfig};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &["muster.toml", "muster.yaml", "muster.yml", "muster.json"];

/// Load config from the given path (any supported format).
///
/// Relative data source paths are resolved against the file's directory.
pub fn load_config(path: &Path) -> anyhow::Result<MusterConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let raw = substitute_env(&raw);
    let mut config = parse_config(&raw, path)?;
    if let Some(base) = path.parent() {
        config.resolve_paths(base);
    }
    Ok(config)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./muster.{toml,yaml,yml,json}` (project-local)
/// 2. `~/.config/muster/muster.{toml,yaml,yml,json}` (user-global)
///
/// A run cannot proceed without credentials, so a missing file is an error.
pub fn discover_and_load() -> anyhow::Result<(PathBuf, MusterConfig)> {
    let Some(path) = find_config_file() else {
        anyhow::bail!(
            "no config file found (looked for {} in ./ and {})",
            CONFIG_FILENAMES.join(", "),
            config_dir().map_or_else(|| "~/.config/muster".into(), |d| d.display().to_string())
        );
    };
    debug!(path = %path.display(), "loading config");
    let config = load_config(&path)?;
    Ok((path, config))
}

/// Find the first config file in standard locations.
pub fn find_config_file() -> Option<PathBuf> {
    // Project-local
    for name in CONFIG_FILENAMES {
        let p = PathBuf::from(name);
        if p.exists() {
            return Some(p);
        }
    }

    // User-global: ~/.config/muster/
    if let Some(dir) = config_dir() {
        for name in CONFIG_FILENAMES {
            let p = dir.join(name);
            if p.exists() {
                return Some(p);
            }
        }
    }

    None
}

/// Returns the user-global config directory (`~/.config/muster/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "muster").map(|d| d.config_dir().to_path_buf())
}

fn parse_config(raw: &str, path: &Path) -> anyhow::Result<MusterConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        _ => anyhow::bail!("unsupported config format: .{ext}"),
    }
}
