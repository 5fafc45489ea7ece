use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TagId {
    /// Sentinel for "the whole collection"; invalidated when membership can change
    List,
    Id(String),
}

/// Label attached to cache entries so mutations can invalidate without knowing query keys
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tag {
    pub kind: &'static str,
    pub id: TagId,
}

impl Tag {
    pub fn list(kind: &'static str) -> Self {
        Self { kind, id: TagId::List }
    }

    pub fn item(kind: &'static str, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: TagId::Id(id.into()),
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self.id, TagId::List)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.id {
            TagId::List => write!(f, "{}:LIST", self.kind),
            TagId::Id(id) => write!(f, "{}:{}", self.kind, id),
        }
    }
}
