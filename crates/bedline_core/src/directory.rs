//! Beneficiary directory collaborator.
//!
//! The engine does not own people. It asks a [`BeneficiaryDirectory`] who an
//! occupant is, whether they are active, and what sex they are.

use bedline_model::{OccupantId, Sex};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A beneficiary as seen by the allocation engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occupant {
    /// Occupant ID.
    pub id: OccupantId,
    /// Sex, matched against room restrictions.
    pub sex: Sex,
    /// Inactive beneficiaries cannot be given a bed.
    #[serde(default = "default_active")]
    pub active: bool,
    /// First name.
    #[serde(default)]
    pub first_name: String,
    /// Last name.
    #[serde(default)]
    pub last_name: String,
    /// Identity document number.
    #[serde(default)]
    pub document: Option<String>,
}

fn default_active() -> bool {
    true
}

impl Occupant {
    /// Creates an active occupant with no name or document.
    #[must_use]
    pub fn new(id: OccupantId, sex: Sex) -> Self {
        Self {
            id,
            sex,
            active: true,
            first_name: String::new(),
            last_name: String::new(),
            document: None,
        }
    }

    /// Sets the occupant's name.
    #[must_use]
    pub fn with_name(mut self, first: impl Into<String>, last: impl Into<String>) -> Self {
        self.first_name = first.into();
        self.last_name = last.into();
        self
    }

    /// Sets the identity document.
    #[must_use]
    pub fn with_document(mut self, document: impl Into<String>) -> Self {
        self.document = Some(document.into());
        self
    }

    /// Marks the occupant inactive.
    #[must_use]
    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    /// Full name, falling back to the document and then the ID.
    #[must_use]
    pub fn display_name(&self) -> String {
        let name = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let name = name.trim();
        if !name.is_empty() {
            return name.to_string();
        }
        self.document
            .clone()
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| self.id.to_string())
    }

    /// Case-insensitive substring match over names and document.
    ///
    /// `needle` must already be lowercase.
    fn matches_text(&self, needle: &str) -> bool {
        [
            self.first_name.as_str(),
            self.last_name.as_str(),
            self.document.as_deref().unwrap_or(""),
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(needle))
    }
}

/// Criteria for listing beneficiaries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OccupantQuery {
    /// Only occupants of this sex.
    pub sex: Option<Sex>,
    /// Substring to find in first name, last name or document.
    pub text: Option<String>,
}

impl OccupantQuery {
    /// Returns true if `occupant` is active and passes every criterion.
    #[must_use]
    pub fn matches(&self, occupant: &Occupant) -> bool {
        if !occupant.active || self.sex.is_some_and(|s| s != occupant.sex) {
            return false;
        }
        match self.text.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => occupant.matches_text(&text.to_lowercase()),
            _ => true,
        }
    }
}

/// Source of truth for beneficiaries.
///
/// Implementations must be `Send + Sync`; the engine calls them from
/// request threads.
pub trait BeneficiaryDirectory: Send + Sync {
    /// Looks up an occupant. Returns `None` if unknown.
    fn get_occupant(&self, id: OccupantId) -> Option<Occupant>;

    /// Lists active occupants matching `query`, ordered by first name.
    fn search(&self, query: &OccupantQuery) -> Vec<Occupant>;
}

/// A directory held in memory.
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    occupants: RwLock<BTreeMap<OccupantId, Occupant>>,
}

impl InMemoryDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a directory from a list of occupants.
    ///
    /// Later entries replace earlier ones with the same ID.
    pub fn from_occupants(occupants: impl IntoIterator<Item = Occupant>) -> Self {
        Self {
            occupants: RwLock::new(occupants.into_iter().map(|o| (o.id, o)).collect()),
        }
    }

    /// Adds or replaces an occupant.
    pub fn upsert(&self, occupant: Occupant) {
        self.occupants.write().insert(occupant.id, occupant);
    }

    /// Marks an occupant active or inactive. Returns false if unknown.
    pub fn set_active(&self, id: OccupantId, active: bool) -> bool {
        match self.occupants.write().get_mut(&id) {
            Some(occupant) => {
                occupant.active = active;
                true
            }
            None => false,
        }
    }

    /// Number of occupants, active or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.occupants.read().len()
    }

    /// Returns true if the directory is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.occupants.read().is_empty()
    }
}

impl BeneficiaryDirectory for InMemoryDirectory {
    fn get_occupant(&self, id: OccupantId) -> Option<Occupant> {
        self.occupants.read().get(&id).cloned()
    }

    fn search(&self, query: &OccupantQuery) -> Vec<Occupant> {
        let mut found: Vec<Occupant> = self
            .occupants
            .read()
            .values()
            .filter(|o| query.matches(o))
            .cloned()
            .collect();
        found.sort_by(|a, b| {
            a.first_name
                .to_lowercase()
                .cmp(&b.first_name.to_lowercase())
                .then(a.id.cmp(&b.id))
        });
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directory() -> InMemoryDirectory {
        InMemoryDirectory::from_occupants([
            Occupant::new(OccupantId::new(1), Sex::Male)
                .with_name("Luis", "Pardo")
                .with_document("CC-100"),
            Occupant::new(OccupantId::new(2), Sex::Female)
                .with_name("ana", "Rojas")
                .with_document("CC-200"),
            Occupant::new(OccupantId::new(3), Sex::Male)
                .with_name("Carlos", "Luna")
                .inactive(),
            Occupant::new(OccupantId::new(4), Sex::Male).with_name("Bruno", "Diaz"),
        ])
    }

    #[test]
    fn search_excludes_inactive_and_orders_by_first_name() {
        let found = directory().search(&OccupantQuery::default());
        let ids: Vec<_> = found.iter().map(|o| o.id.as_u64()).collect();
        assert_eq!(ids, vec![2, 4, 1]);
    }

    #[test]
    fn search_by_sex() {
        let query = OccupantQuery {
            sex: Some(Sex::Male),
            text: None,
        };
        let ids: Vec<_> = directory()
            .search(&query)
            .iter()
            .map(|o| o.id.as_u64())
            .collect();
        assert_eq!(ids, vec![4, 1]);
    }

    #[test]
    fn text_match_is_case_insensitive_across_fields() {
        let dir = directory();
        let by = |text: &str| -> Vec<u64> {
            dir.search(&OccupantQuery {
                sex: None,
                text: Some(text.to_string()),
            })
            .iter()
            .map(|o| o.id.as_u64())
            .collect()
        };
        assert_eq!(by("LUIS"), vec![1]);
        assert_eq!(by("rojas"), vec![2]);
        assert_eq!(by("cc-"), vec![2, 1]);
        assert_eq!(by("  "), vec![2, 4, 1]);
        assert!(by("luna").is_empty());
    }

    #[test]
    fn display_name_fallbacks() {
        let named = Occupant::new(OccupantId::new(1), Sex::Male).with_name("Ana", "");
        assert_eq!(named.display_name(), "Ana");
        let doc = Occupant::new(OccupantId::new(2), Sex::Male).with_document("CC-9");
        assert_eq!(doc.display_name(), "CC-9");
        let bare = Occupant::new(OccupantId::new(3), Sex::Male);
        assert_eq!(bare.display_name(), "occupant:3");
    }

    #[test]
    fn set_active_and_upsert() {
        let dir = directory();
        assert!(dir.set_active(OccupantId::new(3), true));
        assert!(!dir.set_active(OccupantId::new(99), true));
        dir.upsert(Occupant::new(OccupantId::new(5), Sex::Female));
        assert_eq!(dir.len(), 5);
        assert!(dir.get_occupant(OccupantId::new(3)).unwrap().active);
    }

    #[test]
    fn deserializes_with_defaults() {
        let occupant: Occupant = serde_json::from_str(r#"{"id": 7, "sex": "M"}"#).unwrap();
        assert!(occupant.active);
        assert_eq!(occupant.sex, Sex::Female);
        assert!(occupant.document.is_none());
    }
}
