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

//! Shell-glob matching of entity names.
//!
//! `*` matches any run of characters, separators included: entity names are
//! flat identifiers, not paths. A pattern that fails to compile never matches
//! anything; it is reported once when compiled and then ignored.

use globset::{Glob, GlobMatcher};
use tracing::warn;

/// A glob pattern compiled once and kept next to its source text.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    source: String,
    matcher: Option<GlobMatcher>,
}

impl CompiledPattern {
    pub fn new(pattern: &str) -> Self {
        let matcher = match Glob::new(pattern) {
            Ok(glob) => Some(glob.compile_matcher()),
            Err(e) => {
                warn!("Ignoring malformed pattern '{}': {}", pattern, e);
                None
            }
        };
        Self {
            source: pattern.to_string(),
            matcher,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_valid(&self) -> bool {
        self.matcher.is_some()
    }

    pub fn matches(&self, name: &str) -> bool {
        self.matcher.as_ref().is_some_and(|m| m.is_match(name))
    }
}

pub struct PatternMatcher;

impl PatternMatcher {
    /// One-shot match; compiles `pattern` on every call.
    pub fn glob_match(pattern: &str, name: &str) -> bool {
        Glob::new(pattern)
            .map(|g| g.compile_matcher().is_match(name))
            .unwrap_or(false)
    }

    /// True if any pattern in the list matches.
    pub fn any_match(patterns: &[CompiledPattern], name: &str) -> bool {
        patterns.iter().any(|p| p.matches(name))
    }
}
