//! Field classification and dot-path access for profile documents
//!
//! Profile attributes fall into three sets: governed (change requires admin
//! approval), direct (applied immediately), and disallowed (never settable
//! through the update endpoint). Dot-paths address nested leaves, one level
//! deep, e.g. `offlineDetails.clinicName`.

use serde_json::{Map, Value};

use crate::error::{AppError, Result};

/// Attributes whose change must go through the approval ledger
pub const GOVERNED_FIELDS: &[&str] = &[
    "name",
    "phone",
    "certificates",
    "licenses",
    "consultationMode",
    "onlineDetails",
    "offlineDetails",
    "location",
];

/// Attributes updated in place on submission
pub const DIRECT_FIELDS: &[&str] = &[
    "area",
    "city",
    "state",
    "country",
    "qualification",
    "specialization",
    "experience",
    "profileLink",
    "description",
    "profileImage",
    "charges",
    "availabilityType",
    "availabilitySlots",
    "serviceDescription",
];

/// Attributes that are never settable through the update endpoint,
/// including the raw storage names
pub const DISALLOWED_FIELDS: &[&str] = &[
    "id",
    "_id",
    "email",
    "password",
    "passwordHash",
    "role",
    "approved",
    "isApproved",
    "updateRequests",
    "version",
    "createdAt",
    "updatedAt",
];

pub fn is_governed(key: &str) -> bool {
    GOVERNED_FIELDS.contains(&key)
}

/// Known sub-fields of the nested governed composites. Only these fields
/// support dot-path addressing; a leaf outside the list would be dropped by
/// profile deserialization after approval, leaving an approved request with
/// no effect.
pub fn composite_leaves(top: &str) -> Option<&'static [&'static str]> {
    match top {
        "onlineDetails" => Some(&["platform", "link"]),
        "offlineDetails" => Some(&["clinicName", "clinicAddress"]),
        "location" => Some(&["latitude", "longitude", "altitude"]),
        _ => None,
    }
}

pub fn is_direct(key: &str) -> bool {
    DIRECT_FIELDS.contains(&key)
}

pub fn is_disallowed(key: &str) -> bool {
    DISALLOWED_FIELDS.contains(&key)
}

/// A validated dot-path into the profile document.
///
/// At most one level of nesting, and the top-level segment must name a known
/// governed or direct field. Unknown names are rejected rather than walked,
/// so an approved ledger entry can never write outside the profile schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    top: String,
    leaf: Option<String>,
}

impl FieldPath {
    pub fn parse(path: &str) -> Result<Self> {
        let mut segments = path.split('.');
        let top = match segments.next() {
            Some(s) if !s.is_empty() => s.to_string(),
            _ => return Err(AppError::BadRequest(format!("Invalid field path: {}", path))),
        };
        let leaf = match segments.next() {
            None => None,
            Some(s) if !s.is_empty() => Some(s.to_string()),
            Some(_) => {
                return Err(AppError::BadRequest(format!("Invalid field path: {}", path)))
            }
        };
        if segments.next().is_some() {
            return Err(AppError::BadRequest(format!(
                "Field path too deep: {}",
                path
            )));
        }
        if !is_governed(&top) && !is_direct(&top) {
            return Err(AppError::BadRequest(format!("Unknown field: {}", top)));
        }
        if let Some(leaf) = &leaf {
            let known = composite_leaves(&top)
                .is_some_and(|leaves| leaves.contains(&leaf.as_str()));
            if !known {
                return Err(AppError::BadRequest(format!(
                    "Unknown field path: {}",
                    path
                )));
            }
        }
        Ok(Self { top, leaf })
    }

    pub fn top(&self) -> &str {
        &self.top
    }

    /// Read the value at this path, if present
    pub fn get<'a>(&self, doc: &'a Value) -> Option<&'a Value> {
        let first = doc.get(&self.top)?;
        match &self.leaf {
            None => Some(first),
            Some(leaf) => first.get(leaf),
        }
    }

    /// Write `value` at this path, creating the intermediate object if the
    /// leaf's parent is absent or not an object
    pub fn set(&self, doc: &mut Value, value: Value) -> Result<()> {
        let root = doc
            .as_object_mut()
            .ok_or_else(|| AppError::Internal("Profile document is not an object".to_string()))?;

        match &self.leaf {
            None => {
                root.insert(self.top.clone(), value);
            }
            Some(leaf) => {
                let entry = root
                    .entry(self.top.clone())
                    .or_insert_with(|| Value::Object(Map::new()));
                if !entry.is_object() {
                    *entry = Value::Object(Map::new());
                }
                if let Value::Object(map) = entry {
                    map.insert(leaf.clone(), value);
                }
            }
        }
        Ok(())
    }
}

impl std::fmt::Display for FieldPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.leaf {
            None => write!(f, "{}", self.top),
            Some(leaf) => write!(f, "{}.{}", self.top, leaf),
        }
    }
}

/// Expand a governed payload value into independent approval units.
///
/// An object value on a nested governed composite yields one `(leaf-path,
/// value)` pair per known sub-key; unknown sub-keys are skipped like unknown
/// top-level keys. Everything else, scalars and arrays alike, is a single
/// unit at the top-level key.
pub fn expand_governed(key: &str, value: &Value) -> Vec<(String, Value)> {
    match (composite_leaves(key), value.as_object()) {
        (Some(leaves), Some(map)) => map
            .iter()
            .filter(|(sub, _)| leaves.contains(&sub.as_str()))
            .map(|(sub, v)| (format!("{}.{}", key, sub), v.clone()))
            .collect(),
        _ => vec![(key.to_string(), value.clone())],
    }
}
