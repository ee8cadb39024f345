//! Response-only view combining an upstream property with its local record.

use serde::Serialize;

use super::{LocalData, LocalProperty, PricingSummary, Property, Thumbnails};

/// Which sources contributed to a merged property.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MergeSource {
    OwnerrezMergedLocal,
    OwnerrezOnly,
    LocalOnly,
}

/// A property resolved from the upstream catalog and/or the local store.
///
/// Upstream fields always sit at the top level when the upstream record is
/// available; local fields are nested under `localData`.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum MergedProperty {
    Upstream {
        #[serde(flatten)]
        property: Property,
        #[serde(rename = "localData")]
        local_data: Option<LocalData>,
        source: MergeSource,
    },
    LocalOnly {
        #[serde(flatten)]
        local: LocalProperty,
        #[serde(flatten)]
        thumbnails: Thumbnails,
        #[serde(rename = "ownerRezData")]
        owner_rez_data: Option<Property>,
        #[serde(rename = "ownerRezError")]
        owner_rez_error: Option<String>,
        source: MergeSource,
    },
}

impl MergedProperty {
    pub fn source(&self) -> MergeSource {
        match self {
            MergedProperty::Upstream { source, .. } | MergedProperty::LocalOnly { source, .. } => {
                *source
            }
        }
    }

    /// Local fields regardless of which branch produced the view.
    pub fn local_data(&self) -> Option<&LocalData> {
        match self {
            MergedProperty::Upstream { local_data, .. } => local_data.as_ref(),
            MergedProperty::LocalOnly { local, .. } => Some(&local.data),
        }
    }

    pub fn thumbnails(&self) -> Thumbnails {
        match self {
            MergedProperty::Upstream { property, .. } => property.thumbnails(),
            MergedProperty::LocalOnly { thumbnails, .. } => thumbnails.clone(),
        }
    }

    pub fn set_thumbnails(&mut self, value: Thumbnails) {
        match self {
            MergedProperty::Upstream { property, .. } => property.set_thumbnails(value),
            MergedProperty::LocalOnly { thumbnails, .. } => *thumbnails = value,
        }
    }
}

/// Property detail response with optional pricing and partial-failure diagnostics.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDetail {
    pub property: MergedProperty,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pricing: Option<PricingSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pricing_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_error: Option<String>,
}
