//! Small validated value types shared by every Askara crate.
//!
//! Each type checks its invariant once, at construction, so the rest of the
//! workspace can pass values around without re-validating them.

use std::fmt;

/// Errors that can occur when creating validated text types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,
    /// A field name contained whitespace or a placeholder delimiter
    #[error("invalid field name '{0}': whitespace and the characters {{ }} [ ] are not allowed")]
    InvalidFieldName(String),
    /// An e-mail address was not of the form `local@domain`
    #[error("invalid e-mail address '{0}'")]
    InvalidEmail(String),
}

/// Trimmed text with at least one visible character: document titles,
/// authors and e-mail subjects.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// # Errors
    ///
    /// Returns [`TextError::Empty`] if nothing is left after trimming.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        match input.as_ref().trim() {
            "" => Err(TextError::Empty),
            text => Ok(Self(text.to_owned())),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for NonEmptyText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for NonEmptyText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NonEmptyText::new(&s).map_err(serde::de::Error::custom)
    }
}

/// Name of a template field, as written inside a placeholder token.
///
/// Field names are non-empty and contain no whitespace and none of the
/// placeholder delimiter characters (`{`, `}`, `[`, `]`). Anything else is
/// accepted, including `_`, `-`, `.` and accented letters such as `prénom`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldName(String);

impl FieldName {
    /// Validates and wraps a field name. Surrounding whitespace is trimmed.
    ///
    /// # Errors
    ///
    /// Returns [`TextError::Empty`] for blank input and
    /// [`TextError::InvalidFieldName`] when the name contains whitespace or a delimiter.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        let forbidden = |c: char| c.is_whitespace() || matches!(c, '{' | '}' | '[' | ']');
        if trimmed.chars().any(forbidden) {
            return Err(TextError::InvalidFieldName(trimmed.to_owned()));
        }
        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for FieldName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::borrow::Borrow<str> for FieldName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for FieldName {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for FieldName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        FieldName::new(&s).map_err(serde::de::Error::custom)
    }
}

/// A syntactically plausible e-mail address (`local@domain.tld`).
///
/// This is a guard against obvious typos, not an RFC 5322 parser.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// # Errors
    ///
    /// Returns [`TextError::InvalidEmail`] when the input has no `@`, an empty local
    /// part, a domain without a dot, or contains whitespace.
    pub fn parse(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        let invalid = || TextError::InvalidEmail(trimmed.to_owned());

        if trimmed.chars().any(char::is_whitespace) {
            return Err(invalid());
        }
        let (local, domain) = trimmed.split_once('@').ok_or_else(invalid)?;
        if local.is_empty()
            || domain.contains('@')
            || !domain.contains('.')
            || domain.starts_with('.')
            || domain.ends_with('.')
        {
            return Err(invalid());
        }
        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl serde::Serialize for EmailAddress {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for EmailAddress {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        EmailAddress::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_empty_text_trims_and_rejects_blank() {
        assert_eq!(NonEmptyText::new("  Dr Martin ").unwrap().as_str(), "Dr Martin");
        assert_eq!(NonEmptyText::new("   "), Err(TextError::Empty));
    }

    #[test]
    fn test_field_name_accepts_regex_meaningful_characters() {
        for name in ["nom", "date_rdv", "num-secu", "patient.nom", "prénom", "a+b", "x(1)"] {
            assert!(FieldName::new(name).is_ok(), "{name} should be accepted");
        }
    }

    #[test]
    fn test_field_name_rejects_delimiters_and_whitespace() {
        for name in ["nom complet", "{{nom}}", "[nom]", "a}b"] {
            assert!(
                matches!(FieldName::new(name), Err(TextError::InvalidFieldName(_))),
                "{name} should be rejected"
            );
        }
        assert_eq!(FieldName::new(""), Err(TextError::Empty));
    }

    #[test]
    fn test_field_name_deserialize_validates() {
        let ok: FieldName = serde_json::from_str("\"date\"").unwrap();
        assert_eq!(ok.as_str(), "date");
        assert!(serde_json::from_str::<FieldName>("\"a b\"").is_err());
    }

    #[test]
    fn test_email_address_parse() {
        assert!(EmailAddress::parse("secretariat@cabinet-durand.fr").is_ok());
        for bad in ["", "no-at-sign", "@example.com", "a@b", "a@.com", "a b@c.fr", "a@b@c.fr"] {
            assert!(EmailAddress::parse(bad).is_err(), "{bad} should be rejected");
        }
    }
}
