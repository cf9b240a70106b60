use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A string credential that is redacted in debug output and serializable.
///
/// Wraps [`Secret<String>`] so that configuration structs and persisted
/// session bundles can round-trip credentials through serde without the
/// value ever appearing in `Debug` formatting or logs.
#[derive(Clone)]
pub struct SecretString(Secret<String>);

impl SecretString {
    /// Returns the underlying credential value.
    ///
    /// Callers should keep the exposed reference as short-lived as possible.
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl From<String> for SecretString {
    fn from(value: String) -> Self {
        Self(Secret::new(value))
    }
}

impl From<&str> for SecretString {
    fn from(value: &str) -> Self {
        Self(Secret::new(value.to_owned()))
    }
}

impl Serialize for SecretString {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.0.expose_secret())
    }
}

impl<'de> Deserialize<'de> for SecretString {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let string = String::deserialize(deserializer)?;

        Ok(Self(Secret::new(string)))
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretString([REDACTED])")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_is_redacted() {
        let secret = SecretString::from("super-secret-token");
        let debug = format!("{secret:?}");
        assert!(!debug.contains("super-secret-token"));
        assert!(debug.contains("REDACTED"));
    }

    #[test]
    fn serde_round_trip_preserves_value() {
        let secret = SecretString::from("bearer-token-123");
        let json = serde_json::to_string(&secret).unwrap();
        assert_eq!(json, "\"bearer-token-123\"");

        let restored: SecretString = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.expose(), "bearer-token-123");
    }
}
