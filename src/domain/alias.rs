//! Command aliases and canonical command paths
//!
//! An alias maps a user-typed token to a canonical command string. The target may
//! contain spaces (`"group sub"`), meaning subcommand `sub` of group `group`, so
//! resolution walks a path through the [`CommandRegistry`] tree rather than doing a
//! single lookup.

use std::collections::BTreeMap;

use itertools::Itertools;
use tracing::{debug, trace};

const BUILTIN_ALIASES: [(&str, &str); 11] = [
    ("ls", "list"),
    ("alias", "aliases"),
    ("app-store", "appstore"),
    ("execute", "deploy"),
    ("launch", "deploy"),
    ("run", "deploy"),
    ("del", "delete"),
    ("display", "show"),
    ("runs", "deployments"),
    ("vms", "virtualmachines"),
    ("virtual-machines", "virtualmachines"),
];

/// Alias token -> canonical command string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasTable {
    entries: BTreeMap<String, String>,
}

impl AliasTable {
    /// Table seeded with the built-in aliases.
    pub fn builtin() -> Self {
        BUILTIN_ALIASES
            .iter()
            .map(|(alias, target)| (alias.to_string(), target.to_string()))
            .collect()
    }

    pub fn get(&self, alias: &str) -> Option<&str> {
        self.entries.get(alias).map(String::as_str)
    }

    /// Add or replace an alias. The target is whitespace-normalized.
    pub fn insert(&mut self, alias: impl Into<String>, target: &str) {
        self.entries
            .insert(alias.into(), target.split_whitespace().join(" "));
    }

    pub fn remove(&mut self, alias: &str) -> Option<String> {
        self.entries.remove(alias)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Aliases grouped by canonical command, both sorted.
    pub fn grouped(&self) -> Vec<(String, Vec<String>)> {
        self.entries
            .iter()
            .map(|(alias, target)| (target.clone(), alias.clone()))
            .into_group_map()
            .into_iter()
            .map(|(target, mut aliases)| {
                aliases.sort();
                (target, aliases)
            })
            .sorted_by(|a, b| a.0.cmp(&b.0))
            .collect()
    }
}

impl FromIterator<(String, String)> for AliasTable {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        let mut table = Self::default();
        for (alias, target) in iter {
            table.insert(alias, &target);
        }
        table
    }
}

impl Extend<(String, String)> for AliasTable {
    fn extend<T: IntoIterator<Item = (String, String)>>(&mut self, iter: T) {
        for (alias, target) in iter {
            self.insert(alias, &target);
        }
    }
}

/// Outcome of resolving a command token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Canonical command path, outermost group first.
    Found(Vec<String>),
    Unresolved,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct CommandNode {
    children: BTreeMap<String, CommandNode>,
}

/// Tree of canonical command names known at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandRegistry {
    root: CommandNode,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a command path, creating intermediate groups as needed.
    pub fn insert_path<S: AsRef<str>>(&mut self, path: &[S]) {
        let mut node = &mut self.root;
        for segment in path {
            node = node
                .children
                .entry(segment.as_ref().to_string())
                .or_default();
        }
    }

    /// Whether `name` is a top-level canonical command.
    pub fn contains(&self, name: &str) -> bool {
        self.root.children.contains_key(name)
    }

    /// Walk `path` from the root; every segment must exist.
    pub fn find_path<'a, I>(&self, path: I) -> Option<Vec<String>>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut node = &self.root;
        let mut found = Vec::new();
        for segment in path {
            node = node.children.get(segment)?;
            found.push(segment.to_string());
        }
        if found.is_empty() {
            None
        } else {
            Some(found)
        }
    }

    /// Resolve a user-typed token to a canonical command path.
    ///
    /// Registered commands win over aliases. An alias whose target path does not
    /// exist in the registry is unresolved.
    pub fn resolve(&self, token: &str, aliases: &AliasTable) -> Resolution {
        if self.contains(token) {
            trace!(token, "canonical command");
            return Resolution::Found(vec![token.to_string()]);
        }
        let Some(target) = aliases.get(token) else {
            debug!(token, "no command or alias");
            return Resolution::Unresolved;
        };
        match self.find_path(target.split_whitespace()) {
            Some(path) => {
                debug!(token, target, "alias resolved");
                Resolution::Found(path)
            }
            None => {
                debug!(token, target, "alias target not registered");
                Resolution::Unresolved
            }
        }
    }
}
