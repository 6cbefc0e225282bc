//! Shared value types: identifiers, meta maps, multiplicities, risk flags, and
//! attack step types.

use crate::error::LangError;
use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

static IDENTIFIER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

/// Returns whether `s` is a valid identifier (`[A-Za-z_][A-Za-z0-9_]*`).
///
/// All names in a language — categories, assets, fields, associations, attack
/// steps, variables, tags, meta keys, defines keys, distribution names — are
/// identifiers.
pub fn is_identifier(s: &str) -> bool {
    IDENTIFIER_RE.is_match(s)
}

/// Checks that `s` is a valid identifier.
///
/// # Errors
///
/// Returns [`LangError::InvalidIdentifier`] otherwise.
pub fn check_identifier(s: &str) -> Result<(), LangError> {
    if is_identifier(s) {
        Ok(())
    } else {
        Err(LangError::InvalidIdentifier(s.to_string()))
    }
}

// ─── Meta ───────────────────────────────────────────────────────────────────

/// An ordered, immutable mapping from identifier keys to string values.
///
/// Insertion order is preserved through serialization.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Meta {
    entries: IndexMap<String, String>,
}

impl Meta {
    /// Builds a meta map from ordered entries, validating keys as identifiers
    /// and rejecting duplicates.
    pub(crate) fn from_entries(
        entries: impl IntoIterator<Item = (String, String)>,
        kind: &'static str,
    ) -> Result<Self, LangError> {
        let mut map = IndexMap::new();
        for (key, value) in entries {
            check_identifier(&key)?;
            if map.insert(key.clone(), value).is_some() {
                return Err(LangError::DuplicateName { kind, name: key });
            }
        }
        Ok(Meta { entries: map })
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Iterates over entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

// ─── Multiplicity ───────────────────────────────────────────────────────────

/// A field multiplicity: min ∈ {0, 1} and max ∈ {1, ∞}.
///
/// An infinite max is represented as `None` and is serialized by omitting the
/// `max` key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Multiplicity {
    min: u32,
    max: Option<u32>,
}

impl Multiplicity {
    /// `0..1`
    pub const ZERO_OR_ONE: Multiplicity = Multiplicity { min: 0, max: Some(1) };
    /// `0..*`
    pub const ZERO_OR_MORE: Multiplicity = Multiplicity { min: 0, max: None };
    /// `1..1`
    pub const ONE: Multiplicity = Multiplicity { min: 1, max: Some(1) };
    /// `1..*`
    pub const ONE_OR_MORE: Multiplicity = Multiplicity { min: 1, max: None };

    /// Creates a multiplicity, where `None` means an infinite max.
    ///
    /// # Errors
    ///
    /// Returns [`LangError::InvalidMultiplicity`] unless min ∈ {0, 1} and
    /// max ∈ {1, ∞}.
    pub fn new(min: u32, max: Option<u32>) -> Result<Self, LangError> {
        if min > 1 || matches!(max, Some(m) if m != 1) {
            return Err(LangError::InvalidMultiplicity { min, max });
        }
        Ok(Multiplicity { min, max })
    }

    pub fn min(&self) -> u32 {
        self.min
    }

    /// The max bound, or `None` for an infinite max.
    pub fn max(&self) -> Option<u32> {
        self.max
    }
}

impl fmt::Display for Multiplicity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max {
            Some(max) => write!(f, "{}..{}", self.min, max),
            None => write!(f, "{}..*", self.min),
        }
    }
}

// ─── Risk ───────────────────────────────────────────────────────────────────

/// Confidentiality/integrity/availability flags attached to an attack step.
///
/// Serialized as the subset of the literals `"confidentiality"`,
/// `"integrity"`, `"availability"` that are set, always in that order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Risk {
    pub confidentiality: bool,
    pub integrity: bool,
    pub availability: bool,
}

impl Risk {
    pub fn new(confidentiality: bool, integrity: bool, availability: bool) -> Self {
        Risk {
            confidentiality,
            integrity,
            availability,
        }
    }
}

// ─── Attack step types ──────────────────────────────────────────────────────

/// The type of an attack step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AttackStepType {
    /// Compromised when any parent step is compromised.
    Or,
    /// Compromised when all parent steps are compromised.
    And,
    /// A defense that, when enabled, blocks its child steps.
    Defense,
    /// Compromised when the required associated assets exist.
    Exist,
    /// Compromised when the required associated assets do not exist.
    NotExist,
}

impl AttackStepType {
    /// The wire name of this type (`"or"`, `"and"`, `"defense"`, `"exist"`,
    /// `"notExist"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            AttackStepType::Or => "or",
            AttackStepType::And => "and",
            AttackStepType::Defense => "defense",
            AttackStepType::Exist => "exist",
            AttackStepType::NotExist => "notExist",
        }
    }

    /// Whether this is an existence type (`exist` or `notExist`), the only
    /// types on which `requires` is permitted.
    pub fn is_existence(&self) -> bool {
        matches!(self, AttackStepType::Exist | AttackStepType::NotExist)
    }
}

impl fmt::Display for AttackStepType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
