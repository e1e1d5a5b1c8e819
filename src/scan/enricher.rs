use crate::config::ScanConfig;
use crate::error::Result;
use crate::remote::{ItemKind, PropertySource};

/// Property-bag keys holding the human-authored text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyNames {
    pub description: String,
    pub sheet_manifest: String,
}

impl Default for PropertyNames {
    fn default() -> Self {
        let scan = ScanConfig::default();
        Self {
            description: scan.description_property,
            sheet_manifest: scan.sheet_manifest_property,
        }
    }
}

impl From<&ScanConfig> for PropertyNames {
    fn from(scan: &ScanConfig) -> Self {
        Self {
            description: scan.description_property.clone(),
            sheet_manifest: scan.sheet_manifest_property.clone(),
        }
    }
}

/// Pulls description and sheet-manifest text out of item property bags.
///
/// Stateless: one remote round trip per call, blank values come back as `None`.
pub struct MetadataEnricher<'a, P: PropertySource + ?Sized> {
    source: &'a P,
    names: PropertyNames,
}

impl<'a, P: PropertySource + ?Sized> MetadataEnricher<'a, P> {
    pub fn new(source: &'a P, names: PropertyNames) -> Self {
        Self { source, names }
    }

    pub async fn fetch_description(&self, kind: ItemKind, path: &str) -> Result<Option<String>> {
        let props = self.source.fetch_properties(kind, path).await?;
        Ok(props.text(&self.names.description))
    }

    /// Spreadsheet contents summary. Callers only ask for spreadsheet files.
    pub async fn fetch_sheet_manifest(&self, path: &str) -> Result<Option<String>> {
        let props = self.source.fetch_properties(ItemKind::File, path).await?;
        Ok(props.text(&self.names.sheet_manifest))
    }
}
