// Copyright 2026 BadCompany
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::engine::policy::Policy;
use crate::engine_core::constants::config as keys;
use crate::engine_core::errors::GuardError;
use crate::engine_core::models::EntityType;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub log_format: String, // "json" or "text"
    /// Explicit guard log path; `None` means the home-directory default.
    pub log_file: Option<PathBuf>,
    pub policy_path: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            log_level: non_empty(keys::ENV_LOG_LEVEL).unwrap_or_else(|| "info".to_string()),
            log_format: non_empty(keys::ENV_LOG_FORMAT).unwrap_or_else(|| "text".to_string()),
            log_file: non_empty(keys::ENV_LOG_FILE).map(PathBuf::from),
            policy_path: non_empty(keys::ENV_POLICY).map(PathBuf::from),
        }
    }

    /// Configured log path, else the default under the home directory.
    pub fn resolve_log_file(&self) -> Result<PathBuf, GuardError> {
        match &self.log_file {
            Some(path) => Ok(path.clone()),
            None => default_log_file(),
        }
    }
}

/// `<home>/.mcp-guard/logs/guard.log`
pub fn default_log_file() -> Result<PathBuf, GuardError> {
    let home = dirs::home_dir().ok_or_else(|| {
        GuardError::Config(format!(
            "cannot resolve home directory; set {} or --log-file",
            keys::ENV_LOG_FILE
        ))
    })?;
    Ok(home
        .join(keys::STATE_DIR_NAME)
        .join(keys::LOG_DIR_NAME)
        .join(keys::LOG_FILE_NAME))
}

/// Allow/deny pattern maps as written in a policy file.
///
/// ```yaml
/// allow:
///   tool: ["read_*"]
/// deny:
///   resource: ["secret.*"]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyConfig {
    #[serde(default)]
    pub allow: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub deny: BTreeMap<String, Vec<String>>,
}

impl PolicyConfig {
    pub fn from_yaml_str(content: &str) -> Result<Self, GuardError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml_ng::from_str(content)
            .map_err(|e| GuardError::Config(format!("invalid policy file: {}", e)))
    }

    pub fn from_file(path: &Path) -> Result<Self, GuardError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            GuardError::Config(format!("cannot read policy file {}: {}", path.display(), e))
        })?;
        Self::from_yaml_str(&content)
    }

    /// Append `type:pattern` to the allow list.
    pub fn add_allow(&mut self, rule: &str) -> Result<(), GuardError> {
        let (entity, pattern) = parse_rule(rule)?;
        self.allow
            .entry(entity.as_str().to_string())
            .or_default()
            .push(pattern);
        Ok(())
    }

    /// Append `type:pattern` to the deny list.
    pub fn add_deny(&mut self, rule: &str) -> Result<(), GuardError> {
        let (entity, pattern) = parse_rule(rule)?;
        self.deny
            .entry(entity.as_str().to_string())
            .or_default()
            .push(pattern);
        Ok(())
    }

    pub fn build(&self) -> Result<Policy, GuardError> {
        Policy::from_named(&self.allow, &self.deny)
    }
}

fn parse_rule(rule: &str) -> Result<(EntityType, String), GuardError> {
    let (entity, pattern) = rule.split_once(':').ok_or_else(|| {
        GuardError::Config(format!("rule '{}' must look like <type>:<pattern>", rule))
    })?;
    let entity = entity.parse::<EntityType>().map_err(GuardError::Config)?;
    if pattern.is_empty() {
        return Err(GuardError::Config(format!("rule '{}' has an empty pattern", rule)));
    }
    Ok((entity, pattern.to_string()))
}
