//! Generic types shared by the easel crates

use derive_more::Display;

/// Result that can be returned which holds either T or an Error
pub type Result<T> = std::result::Result<T, anyhow::Error>;

/// Identifier of a synchronized model living on both sides of the transport.
#[derive(Debug, Display, Clone, PartialEq, Eq, Hash)]
#[display("{_0}")]
pub struct ModelId(String);

impl ModelId {
    /// Generates a fresh random model id
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ModelId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for ModelId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ModelId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Size<T: Copy> {
    pub width: T,
    pub height: T,
}

impl<T: Copy> Size<T> {
    pub fn new(width: T, height: T) -> Self {
        Self { width, height }
    }
}

impl Size<u32> {
    pub fn f64(&self) -> Size<f64> {
        Size::new(self.width as f64, self.height as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_ids_are_unique() {
        let a = ModelId::new();
        let b = ModelId::new();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 32);
    }

    #[test]
    fn model_id_display() {
        let id = ModelId::from("abc123");
        assert_eq!(id.to_string(), "abc123");
    }

    #[test]
    fn size_conversion() {
        let s = Size::new(700u32, 500u32);
        assert_eq!(s.f64(), Size::new(700.0, 500.0));
    }
}
