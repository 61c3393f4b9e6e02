//! Serde types for the envelope and shared nested fields of API responses.

use serde::{Deserialize, Serialize};

// ============================================================================
// Response envelope
// ============================================================================

/// Top-level wrapper every endpoint returns.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DataWrapper<T> {
  pub code: serde_json::Value,
  pub status: String,
  pub copyright: String,
  pub attribution_text: String,
  #[serde(rename = "attributionHTML")]
  pub attribution_html: String,
  pub etag: String,
  pub data: DataContainer<T>,
}

impl<T> Default for DataWrapper<T> {
  fn default() -> Self {
    Self {
      code: serde_json::Value::Null,
      status: String::new(),
      copyright: String::new(),
      attribution_text: String::new(),
      attribution_html: String::new(),
      etag: String::new(),
      data: DataContainer::default(),
    }
  }
}

impl<T> DataWrapper<T> {
  /// The first result, which is the entity itself for by-id endpoints.
  pub fn into_first(self) -> Option<T> {
    self.data.results.into_iter().next()
  }
}

/// Paged result set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataContainer<T> {
  pub offset: u32,
  pub limit: u32,
  pub total: u32,
  pub count: u32,
  pub results: Vec<T>,
}

impl<T> Default for DataContainer<T> {
  fn default() -> Self {
    Self {
      offset: 0,
      limit: 0,
      total: 0,
      count: 0,
      results: Vec::new(),
    }
  }
}

// ============================================================================
// Resource references
// ============================================================================

/// Lightweight pointer to another entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceReference {
  #[serde(rename = "resourceURI")]
  pub resource_uri: String,
  pub name: String,
  /// Creator role, on creator references
  #[serde(skip_serializing_if = "Option::is_none")]
  pub role: Option<String>,
  /// Story type, on story references
  #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
  pub kind: Option<String>,
}

/// A (possibly truncated) list of references to one kind of entity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceList {
  pub available: u32,
  pub returned: u32,
  #[serde(rename = "collectionURI")]
  pub collection_uri: String,
  pub items: Vec<ResourceReference>,
}

// ============================================================================
// Common nested field types
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Image {
  pub path: String,
  pub extension: String,
}

/// Named renditions the image service can produce.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ImageVariant {
  #[default]
  Detail,
  PortraitSmall,
  PortraitMedium,
  PortraitXlarge,
  PortraitFantastic,
  PortraitUncanny,
  PortraitIncredible,
  StandardSmall,
  StandardMedium,
  StandardLarge,
  StandardXlarge,
  StandardFantastic,
  StandardAmazing,
  LandscapeSmall,
  LandscapeMedium,
  LandscapeLarge,
  LandscapeXlarge,
  LandscapeAmazing,
  LandscapeIncredible,
}

impl ImageVariant {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Detail => "detail",
      Self::PortraitSmall => "portrait_small",
      Self::PortraitMedium => "portrait_medium",
      Self::PortraitXlarge => "portrait_xlarge",
      Self::PortraitFantastic => "portrait_fantastic",
      Self::PortraitUncanny => "portrait_uncanny",
      Self::PortraitIncredible => "portrait_incredible",
      Self::StandardSmall => "standard_small",
      Self::StandardMedium => "standard_medium",
      Self::StandardLarge => "standard_large",
      Self::StandardXlarge => "standard_xlarge",
      Self::StandardFantastic => "standard_fantastic",
      Self::StandardAmazing => "standard_amazing",
      Self::LandscapeSmall => "landscape_small",
      Self::LandscapeMedium => "landscape_medium",
      Self::LandscapeLarge => "landscape_large",
      Self::LandscapeXlarge => "landscape_xlarge",
      Self::LandscapeAmazing => "landscape_amazing",
      Self::LandscapeIncredible => "landscape_incredible",
    }
  }
}

impl Image {
  /// URL of this image rendered as `variant`.
  pub fn url(&self, variant: ImageVariant) -> String {
    format!("{}/{}.{}", self.path, variant.as_str(), self.extension)
  }

  /// False for the catalog's "image not available" placeholder.
  pub fn is_available(&self) -> bool {
    !self.path.contains("image_not_available")
  }
}

/// Public web page for an entity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Link {
  #[serde(rename = "type")]
  pub kind: String,
  pub url: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TextObject {
  #[serde(rename = "type")]
  pub kind: String,
  pub language: String,
  pub text: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ComicDate {
  #[serde(rename = "type")]
  pub kind: String,
  pub date: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ComicPrice {
  #[serde(rename = "type")]
  pub kind: String,
  pub price: f64,
}
