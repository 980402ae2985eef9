//! Scopes in which an automation can be triggered.

use std::fmt;

use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// The type of scope an automation is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScopeType {
    Project,
    ArtifactCollection,
}

impl ScopeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Project => "PROJECT",
            Self::ArtifactCollection => "ARTIFACT_COLLECTION",
        }
    }
}

impl fmt::Display for ScopeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The backend entity (project or artifact collection) an automation is
/// attached to.
///
/// Responses discriminate the variant by GraphQL `__typename`; the backend
/// reports artifact collections as their concrete subtype
/// (`ArtifactSequence` or `ArtifactPortfolio`), all of which decode to
/// [`Scope::ArtifactCollection`].
#[derive(Debug, Clone, PartialEq)]
pub enum Scope {
    Project { id: String, name: Option<String> },
    ArtifactCollection { id: String, name: Option<String> },
}

impl Scope {
    pub fn project(id: impl Into<String>) -> Self {
        Self::Project {
            id: id.into(),
            name: None,
        }
    }

    pub fn artifact_collection(id: impl Into<String>) -> Self {
        Self::ArtifactCollection {
            id: id.into(),
            name: None,
        }
    }

    /// Attach a display name.
    pub fn with_name(self, name: impl Into<String>) -> Self {
        match self {
            Self::Project { id, .. } => Self::Project {
                id,
                name: Some(name.into()),
            },
            Self::ArtifactCollection { id, .. } => Self::ArtifactCollection {
                id,
                name: Some(name.into()),
            },
        }
    }

    pub fn scope_type(&self) -> ScopeType {
        match self {
            Self::Project { .. } => ScopeType::Project,
            Self::ArtifactCollection { .. } => ScopeType::ArtifactCollection,
        }
    }

    /// The opaque backend identifier of the scoped entity.
    pub fn id(&self) -> &str {
        match self {
            Self::Project { id, .. } | Self::ArtifactCollection { id, .. } => id,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Project { name, .. } | Self::ArtifactCollection { name, .. } => name.as_deref(),
        }
    }

    fn typename(&self) -> &'static str {
        match self {
            Self::Project { .. } => "Project",
            Self::ArtifactCollection { .. } => "ArtifactCollection",
        }
    }
}

impl Serialize for Scope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = if self.name().is_some() { 3 } else { 2 };
        let mut map = serializer.serialize_map(Some(len))?;
        map.serialize_entry("__typename", self.typename())?;
        map.serialize_entry("id", self.id())?;
        if let Some(name) = self.name() {
            map.serialize_entry("name", name)?;
        }
        map.end()
    }
}

#[derive(Deserialize)]
struct RawScope {
    #[serde(rename = "__typename")]
    typename: String,
    id: String,
    #[serde(default)]
    name: Option<String>,
}

impl<'de> Deserialize<'de> for Scope {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawScope::deserialize(deserializer)?;
        match raw.typename.as_str() {
            "Project" => Ok(Self::Project {
                id: raw.id,
                name: raw.name,
            }),
            "ArtifactCollection" | "ArtifactSequence" | "ArtifactPortfolio" => {
                Ok(Self::ArtifactCollection {
                    id: raw.id,
                    name: raw.name,
                })
            }
            other => Err(D::Error::unknown_variant(
                other,
                &[
                    "Project",
                    "ArtifactCollection",
                    "ArtifactSequence",
                    "ArtifactPortfolio",
                ],
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_project_scope_round_trip() {
        let scope = Scope::project("UHJvamVjdDox").with_name("my-project");
        let value = serde_json::to_value(&scope).unwrap();
        assert_eq!(
            value,
            json!({"__typename": "Project", "id": "UHJvamVjdDox", "name": "my-project"})
        );
        assert_eq!(serde_json::from_value::<Scope>(value).unwrap(), scope);
    }

    #[test]
    fn test_collection_subtypes_decode_as_artifact_collection() {
        for typename in ["ArtifactCollection", "ArtifactSequence", "ArtifactPortfolio"] {
            let scope: Scope =
                serde_json::from_value(json!({"__typename": typename, "id": "QXJ0OjE="})).unwrap();
            assert_eq!(scope.scope_type(), ScopeType::ArtifactCollection);
            assert_eq!(scope.id(), "QXJ0OjE=");
            assert_eq!(scope.name(), None);
        }
    }

    #[test]
    fn test_unknown_typename_is_rejected() {
        let result =
            serde_json::from_value::<Scope>(json!({"__typename": "Entity", "id": "RW50OjE="}));
        assert!(result.is_err());
    }

    #[test]
    fn test_scope_type_wire_values() {
        assert_eq!(
            serde_json::to_value(ScopeType::Project).unwrap(),
            json!("PROJECT")
        );
        assert_eq!(
            serde_json::to_value(ScopeType::ArtifactCollection).unwrap(),
            json!("ARTIFACT_COLLECTION")
        );
    }
}
