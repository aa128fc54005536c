use crate::{Result, error::Error};
use serde::{Deserialize, Serialize};
use std::fmt;
use subtle::ConstantTimeEq;

/// Encoded fingerprint template, exactly as produced by the driver.
///
/// The content is opaque to this service; it is stored and pushed back to the
/// device verbatim.
///
/// # Security
/// Equality is constant-time so comparing templates does not leak how many
/// leading bytes matched.
#[derive(Clone, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Template(String);

impl Template {
    /// Create a template from its encoded form.
    ///
    /// # Errors
    /// Returns `Error::InvalidTemplate` if the encoded form is empty. Any
    /// other content the driver produces is accepted as-is.
    pub fn new(encoded: impl Into<String>) -> Result<Self> {
        let encoded = encoded.into();

        if encoded.is_empty() {
            return Err(Error::InvalidTemplate("template is empty".to_string()));
        }

        Ok(Template(encoded))
    }

    /// Get the encoded template as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length of the encoded form in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`; construction rejects empty templates.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consume the template, returning the encoded form.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl PartialEq for Template {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_bytes().ct_eq(other.0.as_bytes()).into()
    }
}

impl std::hash::Hash for Template {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

// Templates are biometric data; keep them out of debug logs.
impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Template({} bytes)", self.0.len())
    }
}

impl TryFrom<String> for Template {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Template::new(value)
    }
}

impl From<Template> for String {
    fn from(template: Template) -> Self {
        template.0
    }
}

impl std::str::FromStr for Template {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Template::new(s)
    }
}

/// Identifier of a record in the local template store.
///
/// Assigned by the store on insertion. Unrelated to [`DeviceTemplateId`]:
/// the store and the device keep separate namespaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(i64);

impl RecordId {
    /// Wrap a store-assigned identifier.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        RecordId(id)
    }

    /// Get the raw identifier.
    #[must_use]
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for RecordId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        s.trim()
            .parse()
            .map(RecordId)
            .map_err(|_| Error::InvalidId(format!("invalid record id: {s}")))
    }
}

/// Identifier of a template enrolled on the device itself.
///
/// Chosen by the caller at enrollment and returned by on-device
/// identification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceTemplateId(i64);

impl DeviceTemplateId {
    /// Create a device template id.
    ///
    /// # Errors
    /// Returns `Error::InvalidId` for non-positive values; the device reserves
    /// zero and negative ids.
    pub fn new(id: i64) -> Result<Self> {
        if id <= 0 {
            return Err(Error::InvalidId(format!(
                "device template id must be positive, got {id}"
            )));
        }
        Ok(DeviceTemplateId(id))
    }

    /// Get the raw identifier.
    #[must_use]
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for DeviceTemplateId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for DeviceTemplateId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let id: i64 = s
            .trim()
            .parse()
            .map_err(|_| Error::InvalidId(format!("invalid device template id: {s}")))?;
        DeviceTemplateId::new(id)
    }
}
