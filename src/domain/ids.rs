//! Domain identifier types with validation
//!
//! Newtype wrappers for ODK Central identifiers. Each type validates its
//! format on construction so the rest of the crate can build URLs and
//! file paths from them without re-checking.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// ODK Central project identifier
///
/// Central assigns numeric ids to projects.
///
/// # Examples
///
/// ```
/// use odk_relay::domain::ids::ProjectId;
/// use std::str::FromStr;
///
/// let project_id = ProjectId::from_str("12").unwrap();
/// assert_eq!(project_id.get(), 12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(u32);

impl ProjectId {
    /// Creates a new ProjectId
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the numeric id
    pub fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ProjectId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u32>()
            .map(Self)
            .map_err(|e| format!("Invalid project id '{s}': {e}"))
    }
}

impl From<u32> for ProjectId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

/// XForm identifier (`xmlFormId` on Central)
///
/// # Examples
///
/// ```
/// use odk_relay::domain::ids::XFormId;
/// use std::path::Path;
///
/// let form_id = XFormId::from_path(Path::new("/tmp/form-42.xml")).unwrap();
/// assert_eq!(form_id.as_str(), "form-42");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct XFormId(String);

impl XFormId {
    /// Creates a new XFormId from a string
    ///
    /// Returns `Err` if the id is empty or contains a path separator.
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err("XForm id cannot be empty".to_string());
        }
        if id.contains('/') || id.contains('\\') {
            return Err(format!("XForm id cannot contain path separators: {id}"));
        }
        Ok(Self(id))
    }

    /// Derives the form slug from a file name, e.g. `buildings.xls` → `buildings`
    pub fn from_path(path: &Path) -> Result<Self, String> {
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| format!("Cannot derive a form id from {}", path.display()))?;
        Self::new(stem)
    }

    /// Returns the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes self and returns the inner String
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for XFormId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for XFormId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for XFormId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Geodata category name
///
/// Names the GeoJSON attachment a form references (`buildings` →
/// `buildings.geojson`). Used in file paths, so it must be a single path
/// segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GeodataCategory(String);

impl GeodataCategory {
    /// Creates a new GeodataCategory
    pub fn new(category: impl Into<String>) -> Result<Self, String> {
        let category = category.into();
        if category.trim().is_empty() {
            return Err("Geodata category cannot be empty".to_string());
        }
        if category
            .chars()
            .any(|c| c == '/' || c == '\\' || c.is_whitespace())
            || category == ".."
        {
            return Err(format!(
                "Geodata category must be a single path segment without whitespace: {category}"
            ));
        }
        Ok(Self(category))
    }

    /// Returns the category as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Attachment file name, e.g. `buildings.geojson`
    pub fn file_name(&self) -> String {
        format!("{}.geojson", self.0)
    }
}

impl fmt::Display for GeodataCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for GeodataCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}
