//! NuGet metadata record and its mapping from the application manifest.

use crate::manifest::{AppManifest, ManifestValue};
use serde::de::{self, Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::fmt;

/// A single metadata value.
///
/// NuGet metadata is flat text, but some fields (authors, owners, tags) are
/// naturally lists and some (requireLicenseAcceptance) are flags.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    /// Boolean flag, rendered as `true` or `false`
    Flag(bool),
    /// Plain text
    Text(String),
    /// List of text, rendered space separated
    List(Vec<String>),
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataValue::Flag(flag) => write!(f, "{flag}"),
            MetadataValue::Text(text) => f.write_str(text),
            MetadataValue::List(items) => f.write_str(&items.join(" ")),
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        MetadataValue::Text(value.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        MetadataValue::Text(value)
    }
}

impl From<Vec<String>> for MetadataValue {
    fn from(value: Vec<String>) -> Self {
        MetadataValue::List(value)
    }
}

impl From<bool> for MetadataValue {
    fn from(value: bool) -> Self {
        MetadataValue::Flag(value)
    }
}

/// Nuspec `<metadata>` content.
///
/// Every field is optional. Unset fields are left out of the serialized
/// document entirely; `nuget.exe` is responsible for rejecting a package
/// that lacks required fields.
///
/// Configured changes arrive separately as [`MetadataOverrides`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NuspecMetadata {
    /// Package identifier
    pub id: Option<String>,
    /// Package version
    pub version: Option<String>,
    /// Human friendly title
    pub title: Option<MetadataValue>,
    /// Package authors
    pub authors: Option<MetadataValue>,
    /// Package owners
    pub owners: Option<MetadataValue>,
    /// Long description
    pub description: Option<MetadataValue>,
    /// Release notes for this version
    pub release_notes: Option<MetadataValue>,
    /// Short description
    pub summary: Option<MetadataValue>,
    /// Locale ID
    pub language: Option<MetadataValue>,
    /// Project homepage
    pub project_url: Option<MetadataValue>,
    /// Icon URL
    pub icon_url: Option<MetadataValue>,
    /// License URL
    pub license_url: Option<MetadataValue>,
    /// Copyright notice
    pub copyright: Option<MetadataValue>,
    /// Whether the license must be accepted before install
    pub require_license_acceptance: Option<MetadataValue>,
    /// Space separated tags
    pub tags: Option<MetadataValue>,
    /// Whether this is a development-only dependency
    pub development_dependency: Option<MetadataValue>,
}

/// Element names recognised in `<metadata>`, in NuGet schema order.
pub const METADATA_FIELDS: [&str; 16] = [
    "id",
    "version",
    "title",
    "authors",
    "owners",
    "description",
    "releaseNotes",
    "summary",
    "language",
    "projectUrl",
    "iconUrl",
    "licenseUrl",
    "copyright",
    "requireLicenseAcceptance",
    "tags",
    "developmentDependency",
];

impl NuspecMetadata {
    /// Map application manifest data onto nuspec metadata.
    ///
    /// `id←name`, `version←version`, `description←description`,
    /// `projectUrl←homepage`, `authors←author`, `tags←keywords`.
    /// Values pass through as written; a person object contributes its name.
    pub fn from_manifest(manifest: &AppManifest) -> Self {
        Self {
            id: manifest.name.as_ref().and_then(ManifestValue::as_text),
            version: manifest.version.as_ref().and_then(ManifestValue::as_text),
            description: manifest.description.as_ref().and_then(metadata_value),
            project_url: manifest.homepage.as_ref().and_then(metadata_value),
            authors: manifest.author.as_ref().and_then(metadata_value),
            tags: manifest.keywords.as_ref().and_then(metadata_value),
            ..Self::default()
        }
    }

    /// Apply configured overrides on top of this record.
    ///
    /// A field named in `overrides` always replaces the current value, and
    /// an explicit null clears it. Fields not named keep their value.
    pub fn apply_overrides(&mut self, overrides: &MetadataOverrides) {
        for (field, value) in overrides.entries() {
            self.replace(field, value.clone());
        }
    }

    /// Set a single field by its element name.
    ///
    /// Returns `false` if the name is not a known metadata field.
    pub fn set(&mut self, field: &str, value: MetadataValue) -> bool {
        self.replace(field, Some(value))
    }

    /// Set or clear a single field by its element name.
    ///
    /// Returns `false` if the name is not a known metadata field.
    pub fn replace(&mut self, field: &str, value: Option<MetadataValue>) -> bool {
        let slot = match field {
            "id" => {
                self.id = value.map(|v| v.to_string());
                return true;
            }
            "version" => {
                self.version = value.map(|v| v.to_string());
                return true;
            }
            "title" => &mut self.title,
            "authors" => &mut self.authors,
            "owners" => &mut self.owners,
            "description" => &mut self.description,
            "releaseNotes" => &mut self.release_notes,
            "summary" => &mut self.summary,
            "language" => &mut self.language,
            "projectUrl" => &mut self.project_url,
            "iconUrl" => &mut self.icon_url,
            "licenseUrl" => &mut self.license_url,
            "copyright" => &mut self.copyright,
            "requireLicenseAcceptance" => &mut self.require_license_acceptance,
            "tags" => &mut self.tags,
            "developmentDependency" => &mut self.development_dependency,
            _ => return false,
        };
        *slot = value;
        true
    }

    /// Set fields as `(element name, text)` pairs in schema order
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        let values: [Option<String>; 16] = [
            self.id.clone(),
            self.version.clone(),
            text(&self.title),
            text(&self.authors),
            text(&self.owners),
            text(&self.description),
            text(&self.release_notes),
            text(&self.summary),
            text(&self.language),
            text(&self.project_url),
            text(&self.icon_url),
            text(&self.license_url),
            text(&self.copyright),
            text(&self.require_license_acceptance),
            text(&self.tags),
            text(&self.development_dependency),
        ];

        METADATA_FIELDS
            .into_iter()
            .zip(values)
            .filter_map(|(name, value)| value.map(|v| (name, v)))
            .collect()
    }
}

fn text(value: &Option<MetadataValue>) -> Option<String> {
    value.as_ref().map(ToString::to_string)
}

fn metadata_value(value: &ManifestValue) -> Option<MetadataValue> {
    match value {
        ManifestValue::Flag(flag) => Some(MetadataValue::Flag(*flag)),
        ManifestValue::List(items) => Some(MetadataValue::List(
            items.iter().filter_map(ManifestValue::as_text).collect(),
        )),
        ManifestValue::Other(other) => {
            log::debug!("Ignoring manifest value {other}");
            None
        }
        scalar => scalar.as_text().map(MetadataValue::Text),
    }
}

fn known_field(name: &str) -> Option<&'static str> {
    METADATA_FIELDS.iter().copied().find(|field| *field == name)
}

/// Field-wise metadata changes from configuration.
///
/// Each entry either sets a field or, when `None`, clears it. Unknown field
/// names are rejected both when deserializing and when setting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataOverrides {
    entries: Vec<(&'static str, Option<MetadataValue>)>,
}

impl MetadataOverrides {
    /// No overrides
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `field`, replacing any earlier entry for it
    pub fn set(&mut self, field: &str, value: impl Into<MetadataValue>) -> bool {
        self.put(field, Some(value.into()))
    }

    /// Clear `field` in the generated metadata
    pub fn clear(&mut self, field: &str) -> bool {
        self.put(field, None)
    }

    /// Layer `other` on top of these overrides
    pub fn merge(&mut self, other: &MetadataOverrides) {
        for (field, value) in &other.entries {
            self.put(field, value.clone());
        }
    }

    /// Entries as `(element name, value)` pairs
    pub fn entries(&self) -> &[(&'static str, Option<MetadataValue>)] {
        &self.entries
    }

    /// Whether nothing is overridden
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn put(&mut self, field: &str, value: Option<MetadataValue>) -> bool {
        let Some(field) = known_field(field) else {
            return false;
        };
        match self.entries.iter_mut().find(|(name, _)| *name == field) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((field, value)),
        }
        true
    }
}

impl<'de> Deserialize<'de> for MetadataOverrides {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, Option<MetadataValue>>::deserialize(deserializer)?;
        let mut overrides = MetadataOverrides::new();
        for (field, value) in raw {
            if !overrides.put(&field, value) {
                return Err(de::Error::unknown_field(&field, &METADATA_FIELDS));
            }
        }
        Ok(overrides)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest() -> AppManifest {
        serde_json::from_str(
            r#"{
                "name": "foo",
                "version": "1.0.0",
                "description": "Foo app",
                "homepage": "https://foo.example",
                "author": { "name": "Jane", "email": "jane@foo.example" },
                "keywords": ["desktop", "foo"],
                "main": "main.js"
            }"#,
        )
        .unwrap()
    }

    fn overrides(json: &str) -> MetadataOverrides {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_from_manifest_maps_fields() {
        let metadata = NuspecMetadata::from_manifest(&manifest());
        assert_eq!(metadata.id.as_deref(), Some("foo"));
        assert_eq!(metadata.version.as_deref(), Some("1.0.0"));
        assert_eq!(metadata.description, Some("Foo app".into()));
        assert_eq!(metadata.project_url, Some("https://foo.example".into()));
        assert_eq!(metadata.authors, Some("Jane".into()));
        assert_eq!(
            metadata.tags,
            Some(MetadataValue::List(vec!["desktop".into(), "foo".into()]))
        );
        assert_eq!(metadata.title, None);
    }

    #[test]
    fn test_missing_manifest_fields_stay_unset() {
        let manifest: AppManifest = serde_json::from_str(r#"{"name": "foo"}"#).unwrap();
        let metadata = NuspecMetadata::from_manifest(&manifest);
        assert_eq!(metadata.fields(), vec![("id", "foo".to_string())]);
    }

    #[test]
    fn test_author_list_becomes_list() {
        let manifest: AppManifest =
            serde_json::from_str(r#"{"name": "foo", "author": ["Jane", {"name": "Joe"}]}"#)
                .unwrap();
        let metadata = NuspecMetadata::from_manifest(&manifest);
        assert_eq!(
            metadata.authors,
            Some(MetadataValue::List(vec!["Jane".into(), "Joe".into()]))
        );
        assert_eq!(text(&metadata.authors).as_deref(), Some("Jane Joe"));
    }

    #[test]
    fn test_values_pass_through_unchanged() {
        let manifest: AppManifest = serde_json::from_str(
            r#"{"name": "foo", "version": 2, "keywords": "a b", "description": {"long": true}}"#,
        )
        .unwrap();
        let metadata = NuspecMetadata::from_manifest(&manifest);
        assert_eq!(metadata.id.as_deref(), Some("foo"));
        assert_eq!(metadata.version.as_deref(), Some("2"));
        assert_eq!(metadata.tags, Some("a b".into()));
        assert_eq!(metadata.description, None);
    }

    #[test]
    fn test_overrides_win() {
        let mut metadata = NuspecMetadata::from_manifest(&manifest());
        metadata.apply_overrides(&overrides(r#"{"id": "bar", "title": "Bar"}"#));

        assert_eq!(metadata.id.as_deref(), Some("bar"));
        assert_eq!(metadata.title, Some("Bar".into()));
        assert_eq!(metadata.version.as_deref(), Some("1.0.0"));
    }

    #[test]
    fn test_null_override_clears_field() {
        let mut metadata = NuspecMetadata::from_manifest(&manifest());
        metadata.apply_overrides(&overrides(r#"{"description": null, "version": null}"#));

        assert_eq!(metadata.description, None);
        assert_eq!(metadata.version, None);
        assert_eq!(metadata.id.as_deref(), Some("foo"));
    }

    #[test]
    fn test_unknown_override_field_rejected() {
        let result = serde_json::from_str::<MetadataOverrides>(r#"{"colour": "red"}"#);
        assert!(result.unwrap_err().to_string().contains("colour"));

        let mut overrides = MetadataOverrides::new();
        assert!(!overrides.set("colour", "red"));
        assert!(overrides.is_empty());
    }

    #[test]
    fn test_later_override_replaces_earlier() {
        let mut base = overrides(r#"{"title": "A", "authors": "Corp"}"#);
        let mut top = MetadataOverrides::new();
        top.set("title", "B");
        top.clear("authors");
        base.merge(&top);

        assert_eq!(
            base.entries(),
            &[
                ("authors", None),
                ("title", Some(MetadataValue::from("B")))
            ]
        );
    }

    #[test]
    fn test_set_by_element_name() {
        let mut metadata = NuspecMetadata::default();
        assert!(metadata.set("releaseNotes", "Fixed things".into()));
        assert!(metadata.set("id", "foo".into()));
        assert!(!metadata.set("unknown", "x".into()));
        assert_eq!(
            metadata.fields(),
            vec![
                ("id", "foo".to_string()),
                ("releaseNotes", "Fixed things".to_string())
            ]
        );
    }

    #[test]
    fn test_value_display() {
        assert_eq!(MetadataValue::from(true).to_string(), "true");
        assert_eq!(
            MetadataValue::List(vec!["a".into(), "b".into()]).to_string(),
            "a b"
        );
    }
}
