//! Field-name mapping between topics and flat records.
//!
//! # Responsibility
//! - Name the record field used for each topic facet.
//! - Parse the comma directives that control parent-id and is-root output.
//!
//! # Invariants
//! - Every facet maps to a non-empty field name.
//! - No two facets share a field name.

use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// One logical facet of a topic record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Facet {
    Id,
    Title,
    ParentId,
    IsRoot,
    Labels,
    Notes,
    Branch,
    Href,
}

impl Facet {
    pub const ALL: [Facet; 8] = [
        Facet::Id,
        Facet::Title,
        Facet::ParentId,
        Facet::IsRoot,
        Facet::Labels,
        Facet::Notes,
        Facet::Branch,
        Facet::Href,
    ];

    /// Configuration key naming this facet, e.g. `"ParentId"`.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Id => "Id",
            Self::Title => "Title",
            Self::ParentId => "ParentId",
            Self::IsRoot => "IsRoot",
            Self::Labels => "Labels",
            Self::Notes => "Notes",
            Self::Branch => "Branch",
            Self::Href => "Href",
        }
    }

    pub fn parse(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|facet| facet.key() == key)
    }
}

/// Which records carry the is-root field on export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RootEmission {
    /// No record carries it.
    #[default]
    Never,
    /// Only the central topic's record, with value `true`.
    CentralOnly,
    /// Every record: `true` for the central topic, `false` elsewhere.
    Every,
}

/// Invalid or contradictory field mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MappingError {
    /// Configuration key is not a known facet.
    UnknownFacet(String),
    /// Facet is mapped to an empty field name.
    EmptyField(Facet),
    /// Two facets read or write the same record field.
    DuplicateField {
        field: String,
        first: Facet,
        second: Facet,
    },
    /// Comma directive on a facet that takes none.
    UnexpectedDirective(Facet),
}

impl Display for MappingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownFacet(key) => write!(
                f,
                "unknown mapping key `{key}`; expected Id|Title|ParentId|IsRoot|Labels|Notes|Branch|Href"
            ),
            Self::EmptyField(facet) => write!(f, "mapping for `{}` must not be empty", facet.key()),
            Self::DuplicateField {
                field,
                first,
                second,
            } => write!(
                f,
                "field `{field}` is mapped by both `{}` and `{}`",
                first.key(),
                second.key()
            ),
            Self::UnexpectedDirective(facet) => {
                write!(f, "mapping for `{}` does not accept a directive", facet.key())
            }
        }
    }
}

impl Error for MappingError {}

/// Field names used for each facet, plus export directives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMapping {
    pub id: String,
    pub title: String,
    pub parent_id: String,
    /// Emit an empty parent field on the central topic's record.
    pub emit_empty_parent: bool,
    /// Is-root field; `None` disables the facet on import and export.
    pub is_root: Option<String>,
    pub root_emission: RootEmission,
    pub labels: String,
    pub notes: String,
    pub branch: String,
    pub href: String,
}

impl Default for FieldMapping {
    fn default() -> Self {
        Self {
            id: "id".to_string(),
            title: "title".to_string(),
            parent_id: "parentid".to_string(),
            emit_empty_parent: false,
            is_root: None,
            root_emission: RootEmission::Never,
            labels: "labels".to_string(),
            notes: "notes".to_string(),
            branch: "branch".to_string(),
            href: "href".to_string(),
        }
    }
}

impl FieldMapping {
    /// Builds a mapping from `(facet key, field spec)` pairs.
    ///
    /// Unlisted facets keep their default field. `ParentId` accepts
    /// `"name,<any>"` to emit an empty parent on the central topic. `IsRoot`
    /// given as `"name"` is emitted on every record, `"name,<any>"` on the
    /// central topic only.
    ///
    /// # Errors
    /// - Unknown facet keys, empty field names, directives on other facets
    ///   and field names shared by two facets.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, MappingError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut mapping = Self::default();
        for (key, spec) in pairs {
            let facet = Facet::parse(key.as_ref().trim())
                .ok_or_else(|| MappingError::UnknownFacet(key.as_ref().to_string()))?;
            let (field, directive) = match spec.as_ref().split_once(',') {
                Some((field, _)) => (field.trim(), true),
                None => (spec.as_ref().trim(), false),
            };
            if field.is_empty() {
                return Err(MappingError::EmptyField(facet));
            }
            let field = field.to_string();
            match facet {
                Facet::ParentId => {
                    mapping.parent_id = field;
                    mapping.emit_empty_parent = directive;
                }
                Facet::IsRoot => {
                    mapping.is_root = Some(field);
                    mapping.root_emission = if directive {
                        RootEmission::CentralOnly
                    } else {
                        RootEmission::Every
                    };
                }
                _ if directive => return Err(MappingError::UnexpectedDirective(facet)),
                Facet::Id => mapping.id = field,
                Facet::Title => mapping.title = field,
                Facet::Labels => mapping.labels = field,
                Facet::Notes => mapping.notes = field,
                Facet::Branch => mapping.branch = field,
                Facet::Href => mapping.href = field,
            }
        }
        mapping.validate()?;
        Ok(mapping)
    }

    /// Field name for `facet`; `None` only for an unmapped is-root facet.
    pub fn field(&self, facet: Facet) -> Option<&str> {
        match facet {
            Facet::Id => Some(&self.id),
            Facet::Title => Some(&self.title),
            Facet::ParentId => Some(&self.parent_id),
            Facet::IsRoot => self.is_root.as_deref(),
            Facet::Labels => Some(&self.labels),
            Facet::Notes => Some(&self.notes),
            Facet::Branch => Some(&self.branch),
            Facet::Href => Some(&self.href),
        }
    }

    /// Checks the invariants of a mapping built or edited by hand.
    pub fn validate(&self) -> Result<(), MappingError> {
        let mut owners: HashMap<&str, Facet> = HashMap::new();
        for facet in Facet::ALL {
            let Some(field) = self.field(facet) else {
                continue;
            };
            if field.is_empty() {
                return Err(MappingError::EmptyField(facet));
            }
            if let Some(first) = owners.insert(field, facet) {
                return Err(MappingError::DuplicateField {
                    field: field.to_string(),
                    first,
                    second: facet,
                });
            }
        }
        Ok(())
    }
}

impl TryFrom<&HashMap<String, String>> for FieldMapping {
    type Error = MappingError;

    fn try_from(value: &HashMap<String, String>) -> Result<Self, Self::Error> {
        Self::from_pairs(value.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::{Facet, FieldMapping, MappingError, RootEmission};

    #[test]
    fn unlisted_facets_keep_defaults() {
        let mapping = FieldMapping::from_pairs([("Id", "a"), ("Title", "b")]).unwrap();
        assert_eq!(mapping.id, "a");
        assert_eq!(mapping.title, "b");
        assert_eq!(mapping.parent_id, "parentid");
        assert_eq!(mapping.is_root, None);
        assert_eq!(mapping.root_emission, RootEmission::Never);
    }

    #[test]
    fn directives_select_emission_policy() {
        let mapping =
            FieldMapping::from_pairs([("ParentId", "parent,1"), ("IsRoot", "isRoot,1")]).unwrap();
        assert_eq!(mapping.parent_id, "parent");
        assert!(mapping.emit_empty_parent);
        assert_eq!(mapping.is_root.as_deref(), Some("isRoot"));
        assert_eq!(mapping.root_emission, RootEmission::CentralOnly);

        let every = FieldMapping::from_pairs([("IsRoot", "isRoot")]).unwrap();
        assert_eq!(every.root_emission, RootEmission::Every);
        assert!(!every.emit_empty_parent);
    }

    #[test]
    fn rejects_contradictory_mappings() {
        assert_eq!(
            FieldMapping::from_pairs([("Parent", "p")]).unwrap_err(),
            MappingError::UnknownFacet("Parent".to_string())
        );
        assert_eq!(
            FieldMapping::from_pairs([("Title", " ")]).unwrap_err(),
            MappingError::EmptyField(Facet::Title)
        );
        assert_eq!(
            FieldMapping::from_pairs([("Notes", "notes,1")]).unwrap_err(),
            MappingError::UnexpectedDirective(Facet::Notes)
        );
        assert!(matches!(
            FieldMapping::from_pairs([("Title", "id")]).unwrap_err(),
            MappingError::DuplicateField { first: Facet::Id, second: Facet::Title, .. }
        ));
    }
}
