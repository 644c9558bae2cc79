//! Namespace canonicalization.
//!
//! Content packs mix historical and current namespaces for the same mod
//! (`appliedenergistics2:` vs `ae2:`, `forge:` tags vs `c:` tags). The
//! [`AliasTable`] folds every alternate namespace onto one canonical prefix
//! before anything is inserted into a registry, used as a memo key, or
//! written to output.

use crate::id::{ItemId, NAMESPACE_SEPARATOR, TAG_PREFIX, TagId, split_namespace};
use std::collections::BTreeMap;

/// Aliases every catalog starts from unless explicitly disabled.
pub const BUILTIN_ALIASES: &[(&str, &str)] = &[("appliedenergistics2", "ae2"), ("forge", "c")];

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AliasError {
    #[error("namespace '{namespace}' cannot alias itself")]
    SelfAlias { namespace: String },
    #[error("alias '{alias}' points at '{target}', which is itself an alias")]
    Chained { alias: String, target: String },
    #[error("alias '{alias}' maps to both '{first}' and '{second}'")]
    Conflict {
        alias: String,
        first: String,
        second: String,
    },
    #[error("alias namespaces must be non-empty and contain no ':'")]
    InvalidNamespace,
}

/// Fixed mapping from alternate namespace to canonical namespace.
///
/// Canonicalization is total (unknown namespaces pass through unchanged)
/// and idempotent: construction rejects chains, so a canonical namespace is
/// never itself an alias.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasTable {
    map: BTreeMap<String, String>,
}

impl AliasTable {
    /// A table with no aliases at all.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in table ([`BUILTIN_ALIASES`]).
    pub fn builtin() -> Self {
        Self {
            map: BUILTIN_ALIASES
                .iter()
                .map(|(alias, target)| (alias.to_string(), target.to_string()))
                .collect(),
        }
    }

    /// Build a table from `(alias, canonical)` pairs.
    pub fn new<I, A, C>(pairs: I) -> Result<Self, AliasError>
    where
        I: IntoIterator<Item = (A, C)>,
        A: Into<String>,
        C: Into<String>,
    {
        Self::empty().extended(pairs)
    }

    /// Return a new table with additional pairs; the receiver is unchanged.
    pub fn extended<I, A, C>(&self, pairs: I) -> Result<Self, AliasError>
    where
        I: IntoIterator<Item = (A, C)>,
        A: Into<String>,
        C: Into<String>,
    {
        let mut map = self.map.clone();
        for (alias, target) in pairs {
            let (alias, target) = (alias.into(), target.into());
            for ns in [&alias, &target] {
                if ns.is_empty() || ns.contains(NAMESPACE_SEPARATOR) {
                    return Err(AliasError::InvalidNamespace);
                }
            }
            if alias == target {
                return Err(AliasError::SelfAlias { namespace: alias });
            }
            match map.get(&alias) {
                Some(existing) if *existing != target => {
                    return Err(AliasError::Conflict {
                        alias,
                        first: existing.clone(),
                        second: target,
                    });
                }
                _ => {
                    map.insert(alias, target);
                }
            }
        }

        for (alias, target) in &map {
            if map.contains_key(target) {
                return Err(AliasError::Chained {
                    alias: alias.clone(),
                    target: target.clone(),
                });
            }
        }

        Ok(Self { map })
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Iterate `(alias, canonical)` pairs in alias order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.map.iter().map(|(a, c)| (a.as_str(), c.as_str()))
    }

    /// The canonical form of a namespace.
    pub fn canonical_namespace<'a>(&'a self, namespace: &'a str) -> &'a str {
        self.map.get(namespace).map(String::as_str).unwrap_or(namespace)
    }

    /// Canonicalize a raw id string (no `#` handling).
    pub fn canonical_str(&self, raw: &str) -> String {
        match split_namespace(raw) {
            (Some(ns), path) => match self.map.get(ns) {
                Some(canonical) => format!("{canonical}{NAMESPACE_SEPARATOR}{path}"),
                None => raw.to_string(),
            },
            (None, _) => raw.to_string(),
        }
    }

    /// Canonical item id for a raw string.
    pub fn canonicalize(&self, raw: &str) -> ItemId {
        ItemId::from(self.canonical_str(raw))
    }

    /// Canonical form of an existing id. Clones cheaply when already canonical.
    pub fn canonicalize_id(&self, id: &ItemId) -> ItemId {
        match id.namespace() {
            Some(ns) if self.map.contains_key(ns) => self.canonicalize(id.as_str()),
            _ => id.clone(),
        }
    }

    /// Canonical tag id; accepts the id with or without a leading `#`.
    pub fn canonicalize_tag(&self, raw: &str) -> TagId {
        let bare = raw.strip_prefix(TAG_PREFIX).unwrap_or(raw);
        TagId::new(self.canonical_str(bare))
    }

    /// Canonicalize a tag member, keeping a `#` prefix on nested references.
    pub fn canonicalize_member(&self, raw: &str) -> String {
        match raw.strip_prefix(TAG_PREFIX) {
            Some(nested) => format!("{TAG_PREFIX}{}", self.canonical_str(nested)),
            None => self.canonical_str(raw),
        }
    }
}
