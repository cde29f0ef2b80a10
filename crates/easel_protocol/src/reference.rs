use easel_shared::types::ModelId;
use std::fmt;

const REFERENCE_PREFIX: &str = "IPY_MODEL_";

/// Reference to an object living on the remote side (a surface, gradient, pattern, image or
/// path). On the wire it travels as `"IPY_MODEL_<model id>"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RemoteRef(ModelId);

impl RemoteRef {
    pub fn new(id: ModelId) -> Self {
        Self(id)
    }

    pub fn id(&self) -> &ModelId {
        &self.0
    }

    /// Serialized reference string
    pub fn serialized(&self) -> String {
        format!("{REFERENCE_PREFIX}{}", self.0)
    }

    /// Parses a serialized reference string
    pub fn parse(value: &str) -> Option<Self> {
        let id = value.strip_prefix(REFERENCE_PREFIX)?;
        if id.is_empty() {
            return None;
        }
        Some(Self(ModelId::from(id)))
    }
}

impl From<ModelId> for RemoteRef {
    fn from(id: ModelId) -> Self {
        Self(id)
    }
}

impl fmt::Display for RemoteRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{REFERENCE_PREFIX}{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialized_form() {
        let reference = RemoteRef::new(ModelId::from("abc123"));
        assert_eq!(reference.serialized(), "IPY_MODEL_abc123");
        assert_eq!(reference.to_string(), "IPY_MODEL_abc123");
        assert_eq!(RemoteRef::parse("IPY_MODEL_abc123"), Some(reference));
    }

    #[test]
    fn parse_rejects_other_strings() {
        assert_eq!(RemoteRef::parse("abc123"), None);
        assert_eq!(RemoteRef::parse("IPY_MODEL_"), None);
    }
}
