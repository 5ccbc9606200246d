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

//! Allow/deny policy over entity names.
//!
//! For each entity type the policy holds an ordered allow list and an ordered
//! deny list of glob patterns. An empty allow list means allow-all for that
//! type. Deny is evaluated last and always wins.

use crate::engine::pattern_matcher::{CompiledPattern, PatternMatcher};
use crate::engine_core::errors::GuardError;
use crate::engine_core::models::EntityType;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Default)]
struct EntityRules {
    allow: Vec<CompiledPattern>,
    deny: Vec<CompiledPattern>,
}

/// Immutable per-session policy.
#[derive(Debug, Clone, Default)]
pub struct Policy {
    rules: HashMap<EntityType, EntityRules>,
}

impl Policy {
    /// Policy with no patterns: everything is allowed.
    pub fn allow_all() -> Self {
        Self::default()
    }

    pub fn new(
        allow: &HashMap<EntityType, Vec<String>>,
        deny: &HashMap<EntityType, Vec<String>>,
    ) -> Self {
        let mut rules: HashMap<EntityType, EntityRules> = HashMap::new();
        for (entity, patterns) in allow {
            rules
                .entry(*entity)
                .or_default()
                .allow
                .extend(patterns.iter().map(|p| CompiledPattern::new(p)));
        }
        for (entity, patterns) in deny {
            rules
                .entry(*entity)
                .or_default()
                .deny
                .extend(patterns.iter().map(|p| CompiledPattern::new(p)));
        }
        Self { rules }
    }

    /// Build from maps keyed by entity-type names (`tool`, `prompts`, ...).
    pub fn from_named(
        allow: &BTreeMap<String, Vec<String>>,
        deny: &BTreeMap<String, Vec<String>>,
    ) -> Result<Self, GuardError> {
        Ok(Self::new(&typed_map(allow)?, &typed_map(deny)?))
    }

    pub fn is_allowed(&self, entity: EntityType, name: &str) -> bool {
        let Some(rules) = self.rules.get(&entity) else {
            return true;
        };

        let provisionally_allowed =
            rules.allow.is_empty() || PatternMatcher::any_match(&rules.allow, name);
        if !provisionally_allowed {
            return false;
        }

        !PatternMatcher::any_match(&rules.deny, name)
    }

    /// Patterns configured for a type, as (allow, deny) source strings.
    pub fn patterns(&self, entity: EntityType) -> (Vec<&str>, Vec<&str>) {
        self.rules
            .get(&entity)
            .map(|r| {
                (
                    r.allow.iter().map(CompiledPattern::as_str).collect(),
                    r.deny.iter().map(CompiledPattern::as_str).collect(),
                )
            })
            .unwrap_or_default()
    }

    /// True when no type carries any pattern.
    pub fn is_empty(&self) -> bool {
        self.rules
            .values()
            .all(|r| r.allow.is_empty() && r.deny.is_empty())
    }
}

fn typed_map(
    named: &BTreeMap<String, Vec<String>>,
) -> Result<HashMap<EntityType, Vec<String>>, GuardError> {
    let mut out: HashMap<EntityType, Vec<String>> = HashMap::new();
    for (key, patterns) in named {
        let entity: EntityType = key.parse().map_err(GuardError::Config)?;
        out.entry(entity).or_default().extend(patterns.iter().cloned());
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(allow: &[(EntityType, &[&str])], deny: &[(EntityType, &[&str])]) -> Policy {
        let to_map = |entries: &[(EntityType, &[&str])]| {
            entries
                .iter()
                .map(|(e, ps)| (*e, ps.iter().map(|s| s.to_string()).collect()))
                .collect::<HashMap<_, _>>()
        };
        Policy::new(&to_map(allow), &to_map(deny))
    }

    #[test]
    fn test_empty_policy_allows_everything() {
        let p = Policy::allow_all();
        for entity in EntityType::ALL {
            assert!(p.is_allowed(entity, "anything"));
            assert!(p.is_allowed(entity, ""));
        }
        assert!(p.is_empty());
    }

    #[test]
    fn test_allow_list_restricts_only_its_type() {
        let p = policy(&[(EntityType::Tool, &["read_*"])], &[]);
        assert!(p.is_allowed(EntityType::Tool, "read_file"));
        assert!(!p.is_allowed(EntityType::Tool, "write_file"));
        assert!(p.is_allowed(EntityType::Prompt, "write_file"));
    }

    #[test]
    fn test_allow_patterns_are_or_combined() {
        let p = policy(&[(EntityType::Tool, &["read_*", "list_*"])], &[]);
        assert!(p.is_allowed(EntityType::Tool, "read_file"));
        assert!(p.is_allowed(EntityType::Tool, "list_dir"));
        assert!(!p.is_allowed(EntityType::Tool, "delete_file"));
    }

    #[test]
    fn test_deny_overrides_allow() {
        let p = policy(
            &[(EntityType::Tool, &["*_file"])],
            &[(EntityType::Tool, &["write_*"])],
        );
        assert!(p.is_allowed(EntityType::Tool, "read_file"));
        assert!(!p.is_allowed(EntityType::Tool, "write_file"));
    }

    #[test]
    fn test_deny_without_allow() {
        let p = policy(&[], &[(EntityType::Tool, &["delete_*"])]);
        assert!(!p.is_allowed(EntityType::Tool, "delete_all"));
        assert!(p.is_allowed(EntityType::Tool, "read_file"));
    }

    #[test]
    fn test_malformed_patterns_are_non_matching() {
        // A broken allow pattern matches nothing, so the type denies everything.
        let p = policy(&[(EntityType::Tool, &["[bad"])], &[]);
        assert!(!p.is_allowed(EntityType::Tool, "[bad"));

        // A broken deny pattern blocks nothing.
        let p = policy(&[], &[(EntityType::Prompt, &["[bad"])]);
        assert!(p.is_allowed(EntityType::Prompt, "[bad"));
    }

    #[test]
    fn test_from_named_accepts_plural_keys() {
        let mut allow = BTreeMap::new();
        allow.insert("tools".to_string(), vec!["read_*".to_string()]);
        let mut deny = BTreeMap::new();
        deny.insert("resource".to_string(), vec!["secret.*".to_string()]);

        let p = Policy::from_named(&allow, &deny).unwrap();
        assert!(!p.is_allowed(EntityType::Tool, "write_file"));
        assert!(!p.is_allowed(EntityType::Resource, "secret.env"));
        assert_eq!(p.patterns(EntityType::Tool), (vec!["read_*"], vec![]));
    }

    #[test]
    fn test_from_named_rejects_unknown_type() {
        let mut allow = BTreeMap::new();
        allow.insert("widget".to_string(), vec!["*".to_string()]);
        let err = Policy::from_named(&allow, &BTreeMap::new()).unwrap_err();
        assert!(matches!(err, GuardError::Config(_)));
    }
}
