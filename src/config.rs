//! Configuration discovery and effective settings resolution.
//!
//! Lintel reads `lintel.toml|yaml|yml` from the project root (or closest
//! ancestor) and merges it with CLI flags to produce an `Effective`
//! config. Defaults:
//! - `output`: `human`
//! - `[scan] include_submodules|include_subprojects`: false
//! - `[annotate] mode`: `replace`, `merge_copyrights`: true,
//!   `skip_existing`: true, `sidecar`: false
//!
//! Overrides precedence: CLI > config file > defaults.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{LintelError, Result};
use crate::scan::ScanOptions;

#[derive(Debug, Default, Deserialize, Clone)]
/// Annotation-related configuration section under `[annotate]`.
pub struct AnnotateCfg {
    pub style: Option<String>,
    pub mode: Option<String>,
    pub merge_copyrights: Option<bool>,
    pub skip_existing: Option<bool>,
    pub sidecar: Option<bool>,
}

#[derive(Debug, Default, Deserialize, Clone)]
/// Scanner configuration section under `[scan]`.
pub struct ScanCfg {
    pub include_submodules: Option<bool>,
    pub include_subprojects: Option<bool>,
}

#[derive(Debug, Default, Deserialize, Clone)]
/// Root configuration loaded from `lintel.toml|yaml`.
pub struct LintelConfig {
    pub root: Option<String>,
    pub output: Option<String>,
    #[serde(default)]
    pub annotate: Option<AnnotateCfg>,
    #[serde(default)]
    pub scan: Option<ScanCfg>,
}

#[derive(Debug, Clone)]
/// Fully-resolved configuration used by commands after applying precedence.
pub struct Effective {
    pub root: PathBuf,
    pub output: String,
    pub scan: ScanOptions,
    pub annotate: AnnotateDefaults,
    /// Whether a config file was found during resolution. The root may
    /// be redirected away from where that file lives, so callers must
    /// not re-probe the filesystem to answer this.
    pub config_found: bool,
}

#[derive(Debug, Clone)]
/// Resolved `[annotate]` defaults; CLI flags can still override per run.
pub struct AnnotateDefaults {
    pub style: Option<String>,
    pub mode: String,
    pub merge_copyrights: bool,
    pub skip_existing: bool,
    pub sidecar: bool,
}

/// Walk upward from `start` to detect the project root.
///
/// Stops when a `lintel.toml|yaml|yml` or a `.git` directory is found.
pub fn detect_project_root(start: &Path) -> PathBuf {
    let mut cur = start;
    loop {
        if cur.join("lintel.toml").exists()
            || cur.join("lintel.yaml").exists()
            || cur.join("lintel.yml").exists()
        {
            return cur.to_path_buf();
        }
        if cur.join(".git").exists() {
            return cur.to_path_buf();
        }
        match cur.parent() {
            Some(p) => cur = p,
            None => return start.to_path_buf(),
        }
    }
}

/// Load `LintelConfig` from `lintel.toml` or `lintel.yaml|yml` if present.
/// A present-but-malformed file is a fatal configuration error.
pub fn load_config(root: &Path) -> Result<Option<LintelConfig>> {
    let toml_path = root.join("lintel.toml");
    if toml_path.exists() {
        let s = fs::read_to_string(&toml_path)?;
        let cfg: LintelConfig = toml::from_str(&s).map_err(|e| {
            LintelError::config(format!("invalid {}: {e}", toml_path.display()))
        })?;
        return Ok(Some(cfg));
    }
    for yml in ["lintel.yaml", "lintel.yml"] {
        let p = root.join(yml);
        if p.exists() {
            let s = fs::read_to_string(&p)?;
            let cfg: LintelConfig = serde_yaml::from_str(&s)
                .map_err(|e| LintelError::config(format!("invalid {}: {e}", p.display())))?;
            return Ok(Some(cfg));
        }
    }
    Ok(None)
}

/// Resolve `Effective` by merging CLI flags, discovered config, and defaults.
pub fn resolve_effective(
    cli_root: Option<&str>,
    cli_output: Option<&str>,
    cli_include_submodules: Option<bool>,
    cli_include_subprojects: Option<bool>,
) -> Result<Effective> {
    let start = PathBuf::from(cli_root.unwrap_or("."));
    let root = detect_project_root(&start);
    let loaded = load_config(&root)?;
    let config_found = loaded.is_some();
    let cfg = loaded.unwrap_or_default();

    let root = match (cli_root, cfg.root.as_deref()) {
        (Some(_), _) => root,
        (None, Some(configured)) => root.join(configured),
        (None, None) => root,
    };

    let output = cli_output
        .map(|s| s.to_string())
        .or(cfg.output)
        .unwrap_or_else(|| "human".to_string());

    let scan_cfg = cfg.scan.unwrap_or_default();
    let scan = ScanOptions {
        include_submodules: cli_include_submodules
            .or(scan_cfg.include_submodules)
            .unwrap_or(false),
        include_subprojects: cli_include_subprojects
            .or(scan_cfg.include_subprojects)
            .unwrap_or(false),
    };

    let annotate_cfg = cfg.annotate.unwrap_or_default();
    let annotate = AnnotateDefaults {
        style: annotate_cfg.style,
        mode: annotate_cfg.mode.unwrap_or_else(|| "replace".to_string()),
        merge_copyrights: annotate_cfg.merge_copyrights.unwrap_or(true),
        skip_existing: annotate_cfg.skip_existing.unwrap_or(true),
        sidecar: annotate_cfg.sidecar.unwrap_or(false),
    };

    Ok(Effective {
        root,
        output,
        scan,
        annotate,
        config_found,
    })
}
