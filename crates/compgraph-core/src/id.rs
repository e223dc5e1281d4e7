//! Component identity.
//!
//! A [`ComponentRef`] is the `(domain, flow, key, version)` tuple a
//! component is addressed by. Its canonical string form, `domain/flow/key@version`,
//! is the [`ComponentId`] used as the key of every graph map.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A normalized reference to one versioned component.
///
/// Construct through [`ComponentRef::new`], which lowercases every field and
/// rejects empty ones. Version matching is exact string equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ComponentRef {
    pub domain: String,
    pub flow: String,
    pub key: String,
    pub version: String,
}

impl ComponentRef {
    /// Creates a normalized reference.
    ///
    /// Returns `None` if any field is empty after trimming; a reference is
    /// never completed with guessed values here.
    pub fn new(domain: &str, flow: &str, key: &str, version: &str) -> Option<Self> {
        let fields = [domain, flow, key, version].map(|f| f.trim().to_lowercase());
        if fields.iter().any(|f| f.is_empty()) {
            return None;
        }
        let [domain, flow, key, version] = fields;
        Some(ComponentRef {
            domain,
            flow,
            key,
            version,
        })
    }

    /// The canonical identity of this reference.
    pub fn id(&self) -> ComponentId {
        ComponentId(format!(
            "{}/{}/{}@{}",
            self.domain, self.flow, self.key, self.version
        ))
    }

    /// Id prefix shared by every version of this logical component.
    pub fn logical_prefix(&self) -> String {
        format!("{}/{}/{}@", self.domain, self.flow, self.key)
    }
}

impl fmt::Display for ComponentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}@{}",
            self.domain, self.flow, self.key, self.version
        )
    }
}

/// Canonical `domain/flow/key@version` string.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentId(String);

impl ComponentId {
    /// Wraps an already-canonical id string.
    ///
    /// Used when ids arrive from serialized graphs or the command line; the
    /// string is lowercased but not otherwise validated.
    pub fn new(id: impl Into<String>) -> Self {
        ComponentId(id.into().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parses the id back into its reference tuple.
    ///
    /// Returns `None` for strings that are not in `domain/flow/key@version`
    /// form.
    pub fn to_ref(&self) -> Option<ComponentRef> {
        let (path, version) = self.0.rsplit_once('@')?;
        let mut parts = path.splitn(3, '/');
        let domain = parts.next()?;
        let flow = parts.next()?;
        let key = parts.next()?;
        ComponentRef::new(domain, flow, key, version)
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for ComponentId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&ComponentRef> for ComponentId {
    fn from(r: &ComponentRef) -> Self {
        r.id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_lowercases_every_field() {
        let r = ComponentRef::new("Core", "SYS-Tasks", "Send-Email", "1.0.0").unwrap();
        assert_eq!(r.domain, "core");
        assert_eq!(r.flow, "sys-tasks");
        assert_eq!(r.key, "send-email");
        assert_eq!(r.id().as_str(), "core/sys-tasks/send-email@1.0.0");
    }

    #[test]
    fn new_rejects_empty_fields() {
        assert!(ComponentRef::new("core", "sys-tasks", "", "1.0.0").is_none());
        assert!(ComponentRef::new("  ", "sys-tasks", "a", "1.0.0").is_none());
    }

    #[test]
    fn id_parses_back_to_ref() {
        let r = ComponentRef::new("core", "sys-flows", "onboarding", "2.1.0").unwrap();
        assert_eq!(r.id().to_ref(), Some(r));
        assert_eq!(ComponentId::new("not-an-id").to_ref(), None);
    }

    #[test]
    fn logical_prefix_ignores_version() {
        let r = ComponentRef::new("core", "sys-views", "card", "1.0.0").unwrap();
        assert_eq!(r.logical_prefix(), "core/sys-views/card@");
        assert!(r.id().as_str().starts_with(&r.logical_prefix()));
    }

    #[test]
    fn id_serializes_as_plain_string() {
        let id = ComponentId::new("core/sys-tasks/a@1.0.0");
        assert_eq!(
            serde_json::to_string(&id).unwrap(),
            "\"core/sys-tasks/a@1.0.0\""
        );
    }
}
