//! Nuspec package-description document.
//!
//! A [`Nuspec`] owns the package metadata and an ordered list of file rules
//! and serializes them to the XML document consumed by `nuget.exe pack`:
//!
//! ```xml
//! <?xml version="1.0" encoding="utf-8"?>
//! <package>
//!   <metadata>
//!     <id>foo</id>
//!     <version>1.0.0</version>
//!   </metadata>
//!   <files>
//!     <file src="**\*" target="lib\net45"/>
//!   </files>
//! </package>
//! ```

mod metadata;

pub use metadata::{METADATA_FIELDS, MetadataOverrides, MetadataValue, NuspecMetadata};

use crate::error::{ErrorExt, PackagerError, Result};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use std::path::{Path, PathBuf};

/// Target folder Squirrel expects application files under
pub const LIB_TARGET: &str = "lib\\net45";

/// One `<file>` element: attribute pairs rendered in insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRule {
    attributes: Vec<(String, String)>,
}

impl FileRule {
    /// Rule mapping a source glob to a target path inside the package
    pub fn new(src: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            attributes: vec![
                ("src".to_string(), src.into()),
                ("target".to_string(), target.into()),
            ],
        }
    }

    /// Append another attribute (e.g. `exclude`)
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    /// Attribute pairs in order
    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }
}

/// The single catch-all rule packing the whole application directory
pub fn default_files() -> Vec<FileRule> {
    vec![FileRule::new("**\\*", LIB_TARGET)]
}

/// In-memory nuspec document
#[derive(Debug, Clone, Default)]
pub struct Nuspec {
    metadata: NuspecMetadata,
    files: Vec<FileRule>,
}

impl Nuspec {
    /// Create an empty document
    pub fn new() -> Self {
        Self::default()
    }

    /// Package metadata
    pub fn metadata(&self) -> &NuspecMetadata {
        &self.metadata
    }

    /// Mutable package metadata
    pub fn metadata_mut(&mut self) -> &mut NuspecMetadata {
        &mut self.metadata
    }

    /// Replace the package metadata
    pub fn set_metadata(&mut self, metadata: NuspecMetadata) {
        self.metadata = metadata;
    }

    /// File rules in order
    pub fn files(&self) -> &[FileRule] {
        &self.files
    }

    /// Replace the file rules
    pub fn set_files(&mut self, files: Vec<FileRule>) {
        self.files = files;
    }

    /// Base name shared by the `.nuspec` and the generated `.nupkg`
    pub fn package_id(&self) -> &str {
        self.metadata.id.as_deref().unwrap_or("package")
    }

    /// File name `nuget.exe pack` gives the produced archive: `{id}-{version}.nupkg`
    pub fn package_file_name(&self) -> String {
        format!(
            "{}-{}.nupkg",
            self.package_id(),
            self.metadata.version.as_deref().unwrap_or_default()
        )
    }

    /// Serialize to an indented XML document.
    ///
    /// Unset metadata fields are omitted. Output is deterministic.
    pub fn to_xml(&self) -> Result<String> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
            .map_err(PackagerError::xml)?;
        writer
            .write_event(Event::Start(BytesStart::new("package")))
            .map_err(PackagerError::xml)?;

        writer
            .write_event(Event::Start(BytesStart::new("metadata")))
            .map_err(PackagerError::xml)?;
        for (name, value) in self.metadata.fields() {
            writer
                .write_event(Event::Start(BytesStart::new(name)))
                .map_err(PackagerError::xml)?;
            writer
                .write_event(Event::Text(BytesText::new(&value)))
                .map_err(PackagerError::xml)?;
            writer
                .write_event(Event::End(BytesEnd::new(name)))
                .map_err(PackagerError::xml)?;
        }
        writer
            .write_event(Event::End(BytesEnd::new("metadata")))
            .map_err(PackagerError::xml)?;

        writer
            .write_event(Event::Start(BytesStart::new("files")))
            .map_err(PackagerError::xml)?;
        for rule in &self.files {
            let mut element = BytesStart::new("file");
            for (name, value) in rule.attributes() {
                element.push_attribute((name.as_str(), value.as_str()));
            }
            writer
                .write_event(Event::Empty(element))
                .map_err(PackagerError::xml)?;
        }
        writer
            .write_event(Event::End(BytesEnd::new("files")))
            .map_err(PackagerError::xml)?;

        writer
            .write_event(Event::End(BytesEnd::new("package")))
            .map_err(PackagerError::xml)?;

        String::from_utf8(writer.into_inner()).map_err(PackagerError::xml)
    }

    /// Write `{id}.nuspec` into `dir` and return its path
    pub async fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(format!("{}.nuspec", self.package_id()));
        let xml = self.to_xml()?;
        tokio::fs::write(&path, xml)
            .await
            .fs_context("writing nuspec", &path)?;
        log::debug!("Wrote nuspec to {}", path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id_and_version() -> Nuspec {
        let mut nuspec = Nuspec::new();
        nuspec.set_metadata(NuspecMetadata {
            id: Some("foo".into()),
            version: Some("1.0.0".into()),
            ..Default::default()
        });
        nuspec.set_files(default_files());
        nuspec
    }

    #[test]
    fn test_metadata_has_only_set_children() {
        let xml = id_and_version().to_xml().unwrap();
        let metadata = xml
            .split("<metadata>")
            .nth(1)
            .and_then(|rest| rest.split("</metadata>").next())
            .unwrap();

        assert_eq!(metadata.matches("</").count(), 2);
        assert!(metadata.contains("<id>foo</id>"));
        assert!(metadata.contains("<version>1.0.0</version>"));
    }

    #[test]
    fn test_file_rules_render_as_attributes() {
        let xml = id_and_version().to_xml().unwrap();
        assert!(xml.contains(r#"<file src="**\*" target="lib\net45"/>"#));
    }

    #[test]
    fn test_layout_is_indented() {
        let xml = id_and_version().to_xml().unwrap();
        let expected = [
            r#"<?xml version="1.0" encoding="utf-8"?>"#,
            "<package>",
            "  <metadata>",
            "    <id>foo</id>",
            "    <version>1.0.0</version>",
            "  </metadata>",
            "  <files>",
            r#"    <file src="**\*" target="lib\net45"/>"#,
            "  </files>",
            "</package>",
        ]
        .join("\n");
        assert_eq!(xml, expected);
    }

    #[test]
    fn test_serialization_is_deterministic() {
        let mut nuspec = id_and_version();
        nuspec.metadata_mut().tags = Some(MetadataValue::List(vec!["a".into(), "b".into()]));
        nuspec.metadata_mut().authors = Some("Jane".into());
        assert_eq!(nuspec.to_xml().unwrap(), nuspec.to_xml().unwrap());
    }

    #[test]
    fn test_reserved_characters_escaped() {
        let mut nuspec = id_and_version();
        nuspec.metadata_mut().description = Some("Fast & <small>".into());
        nuspec.set_files(vec![FileRule::new("a\"b", LIB_TARGET)]);

        let xml = nuspec.to_xml().unwrap();
        assert!(xml.contains("Fast &amp; &lt;small&gt;"));
        assert!(xml.contains("src=\"a&quot;b\""));
    }

    #[test]
    fn test_rule_attribute_order_preserved() {
        let mut nuspec = id_and_version();
        nuspec.set_files(vec![
            FileRule::new("*.dll", LIB_TARGET).with("exclude", "*.pdb"),
            FileRule::new("locales\\**", "lib\\net45\\locales"),
        ]);

        let xml = nuspec.to_xml().unwrap();
        let first = xml.find("*.dll").unwrap();
        let second = xml.find("locales\\**").unwrap();
        assert!(first < second);
        assert!(xml.contains(r#"<file src="*.dll" target="lib\net45" exclude="*.pdb"/>"#));
    }

    #[test]
    fn test_package_file_name() {
        assert_eq!(id_and_version().package_file_name(), "foo-1.0.0.nupkg");
    }

    #[tokio::test]
    async fn test_write_to_uses_id() {
        let dir = tempfile::tempdir().unwrap();
        let path = id_and_version().write_to(dir.path()).await.unwrap();
        assert_eq!(path, dir.path().join("foo.nuspec"));
        let content = std::fs::read_to_string(path).unwrap();
        assert!(content.starts_with("<?xml"));
    }
}
