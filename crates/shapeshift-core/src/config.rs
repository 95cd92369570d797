//! Mapper configuration
//!
//! Configuration is read from defaults, a JSON file, or environment
//! variables (a `.env` file in the working directory is honored).
//!
//! Copyright (c) 2025 Shapeshift Team
//! Licensed under the Apache-2.0 license

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Nesting depth up to which nested object and enumerable branches are inlined
pub const DEFAULT_MAX_INLINE_DEPTH: usize = 3;

pub const ENV_MAX_INLINE_DEPTH: &str = "SHAPESHIFT_MAX_INLINE_DEPTH";
pub const ENV_DIAGNOSTICS: &str = "SHAPESHIFT_DIAGNOSTICS";
pub const ENV_RECURSION_SCOPE: &str = "SHAPESHIFT_RECURSION_SCOPE";

/// How long a recursion guard entry lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecursionScope {
    /// Entries live for the whole top-level call; shared references map to
    /// one target instance
    #[default]
    Call,
    /// Entries are removed when their object subtree finishes; only cycles
    /// are broken
    Subtree,
}

impl fmt::Display for RecursionScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecursionScope::Call => write!(f, "call"),
            RecursionScope::Subtree => write!(f, "subtree"),
        }
    }
}

impl FromStr for RecursionScope {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "call" => Ok(RecursionScope::Call),
            "subtree" => Ok(RecursionScope::Subtree),
            other => Err(Error::Configuration {
                message: format!("unknown recursion scope '{other}', expected 'call' or 'subtree'"),
                source: None,
            }),
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapperConfig {
    /// Nested branches deeper than this call a separately compiled mapper
    pub max_inline_depth: usize,

    /// Wrap runtime failures with the source and target expression labels
    pub diagnostics: bool,

    /// Lifetime of recursion guard entries
    pub recursion_scope: RecursionScope,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            max_inline_depth: DEFAULT_MAX_INLINE_DEPTH,
            diagnostics: false,
            recursion_scope: RecursionScope::Call,
        }
    }
}

impl MapperConfig {
    /// Load from the process environment, after reading `.env` if present
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Load from an arbitrary variable lookup, starting from defaults
    pub fn from_vars<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(depth) = lookup(ENV_MAX_INLINE_DEPTH) {
            config.max_inline_depth = depth.trim().parse::<usize>().map_err(|err| Error::Configuration {
                message: format!("{ENV_MAX_INLINE_DEPTH} must be a positive integer, got '{depth}'"),
                source: Some(anyhow::Error::new(err)),
            })?;
        }
        if let Some(flag) = lookup(ENV_DIAGNOSTICS) {
            config.diagnostics = parse_flag(ENV_DIAGNOSTICS, &flag)?;
        }
        if let Some(scope) = lookup(ENV_RECURSION_SCOPE) {
            config.recursion_scope = scope.parse()?;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_inline_depth == 0 {
            return Err(Error::Configuration {
                message: "max_inline_depth must be at least 1".to_string(),
                source: None,
            });
        }
        Ok(())
    }

    pub fn with_max_inline_depth(mut self, depth: usize) -> Self {
        self.max_inline_depth = depth;
        self
    }

    pub fn with_diagnostics(mut self, enabled: bool) -> Self {
        self.diagnostics = enabled;
        self
    }

    pub fn with_recursion_scope(mut self, scope: RecursionScope) -> Self {
        self.recursion_scope = scope;
        self
    }
}

fn parse_flag(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(Error::Configuration {
            message: format!("{name} must be a boolean flag, got '{other}'"),
            source: None,
        }),
    }
}
