//! Configuration management utilities.

use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dirs_next::config_dir;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::app::batch::PLATFORM_CEILING;

static DEFAULT_CONFIG: Lazy<&'static str> =
    Lazy::new(|| include_str!("../../assets/default-config.toml"));
static DEFAULT_WORKSPACE_CONFIG_PATH: &str = ".lintdispatch/config.toml";

/// Layered configuration loaded from defaults, user, workspace, and env.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub defaults: Defaults,
    #[serde(default)]
    pub ignore: Ignore,
    #[serde(default)]
    pub tools: Tools,
    #[serde(default)]
    pub patches: Patches,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Defaults {
    /// Overrides the platform argument-length ceiling when set.
    #[serde(default)]
    pub batch_ceiling: Option<usize>,
}

impl Defaults {
    pub fn batch_ceiling(&self) -> usize {
        self.batch_ceiling.unwrap_or(PLATFORM_CEILING)
    }
}

/// Extra root-relative paths added to the built-in deny-list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ignore {
    #[serde(default)]
    pub paths: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tools {
    #[serde(default = "Tools::default_depot_tools")]
    pub depot_tools: String,
    #[serde(default = "Tools::default_buildtools")]
    pub buildtools: String,
}

impl Tools {
    fn default_depot_tools() -> String {
        "../third_party/depot_tools".into()
    }

    fn default_buildtools() -> String {
        "../buildtools".into()
    }
}

impl Default for Tools {
    fn default() -> Self {
        Self {
            depot_tools: Self::default_depot_tools(),
            buildtools: Self::default_buildtools(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patches {
    /// Ancestor that `config.json` keys resolve against, relative to the source root.
    #[serde(default = "Patches::default_target_root")]
    pub target_root: String,
}

impl Patches {
    fn default_target_root() -> String {
        "../..".into()
    }
}

impl Default for Patches {
    fn default() -> Self {
        Self {
            target_root: Self::default_target_root(),
        }
    }
}

/// Environment overrides for critical settings.
#[derive(Debug, Default, Clone)]
pub struct EnvOverrides {
    batch_ceiling: Option<String>,
    depot_tools: Option<String>,
}

impl EnvOverrides {
    fn from_env() -> Self {
        Self {
            batch_ceiling: env::var("LINTDISPATCH_BATCH_CEILING").ok(),
            depot_tools: env::var("LINTDISPATCH_DEPOT_TOOLS").ok(),
        }
    }

    #[cfg(test)]
    fn for_tests(batch_ceiling: &str, depot_tools: &str) -> Self {
        Self {
            batch_ceiling: Some(batch_ceiling.to_owned()),
            depot_tools: Some(depot_tools.to_owned()),
        }
    }
}

impl Config {
    /// Load configuration for the source tree at `root`.
    pub fn load(root: &Path) -> Result<Self> {
        let env = EnvOverrides::from_env();
        let global = global_config_path();
        let workspace = Some(root.join(DEFAULT_WORKSPACE_CONFIG_PATH));
        Self::load_with_layers(global, workspace, env)
    }

    fn load_with_layers(
        global: Option<PathBuf>,
        workspace: Option<PathBuf>,
        env_overrides: EnvOverrides,
    ) -> Result<Self> {
        let mut layers: Vec<Config> = Vec::new();

        layers.push(Self::from_str(&DEFAULT_CONFIG)?);

        if let Some(global_path) = global.filter(|path| path.exists()) {
            layers.push(Self::from_file(&global_path)?);
        }

        if let Some(workspace_path) = workspace.filter(|path| path.exists()) {
            layers.push(Self::from_file(&workspace_path)?);
        }

        let merged = layers.into_iter().reduce(Config::merge).unwrap_or_default();
        apply_env_overrides(merged, env_overrides)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        Self::from_str(&data).with_context(|| format!("in config file: {}", path.display()))
    }

    fn from_str(contents: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(contents).with_context(|| "failed to parse TOML config".to_string())?;
        Ok(config)
    }

    fn merge(self, other: Self) -> Self {
        Self {
            defaults: Defaults {
                batch_ceiling: other.defaults.batch_ceiling.or(self.defaults.batch_ceiling),
            },
            ignore: merge_ignore(self.ignore, other.ignore),
            tools: Tools {
                depot_tools: choose(
                    self.tools.depot_tools,
                    other.tools.depot_tools,
                    Tools::default_depot_tools,
                ),
                buildtools: choose(
                    self.tools.buildtools,
                    other.tools.buildtools,
                    Tools::default_buildtools,
                ),
            },
            patches: Patches {
                target_root: choose(
                    self.patches.target_root,
                    other.patches.target_root,
                    Patches::default_target_root,
                ),
            },
        }
    }
}

fn merge_ignore(base: Ignore, overlay: Ignore) -> Ignore {
    let mut paths: BTreeSet<String> = base.paths.into_iter().collect();
    paths.extend(overlay.paths);
    Ignore {
        paths: paths.into_iter().collect(),
    }
}

fn choose(base: String, overlay: String, default_fn: fn() -> String) -> String {
    if overlay != default_fn() {
        overlay
    } else {
        base
    }
}

fn global_config_path() -> Option<PathBuf> {
    config_dir().map(|base| base.join("lintdispatch/config.toml"))
}

fn apply_env_overrides(mut config: Config, env: EnvOverrides) -> Result<Config> {
    if let Some(raw) = env.batch_ceiling {
        let ceiling = raw
            .trim()
            .parse::<usize>()
            .with_context(|| format!("invalid LINTDISPATCH_BATCH_CEILING: {raw}"))?;
        config.defaults.batch_ceiling = Some(ceiling);
    }
    if let Some(depot_tools) = env.depot_tools {
        config.tools.depot_tools = depot_tools;
    }
    Ok(config)
}
