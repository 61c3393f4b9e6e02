//! Entity records as returned by the catalog API.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::api_types::{
  ComicDate, ComicPrice, Image, Link, ResourceList, ResourceReference, TextObject,
};

/// The six kinds of entity the catalog serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
  Character,
  Comic,
  Series,
  Event,
  Story,
  Creator,
}

impl EntityKind {
  pub const ALL: [EntityKind; 6] = [
    Self::Character,
    Self::Comic,
    Self::Series,
    Self::Event,
    Self::Story,
    Self::Creator,
  ];

  /// Collection path segment, e.g. `comics`.
  pub fn path(self) -> &'static str {
    match self {
      Self::Character => "characters",
      Self::Comic => "comics",
      Self::Series => "series",
      Self::Event => "events",
      Self::Story => "stories",
      Self::Creator => "creators",
    }
  }

  /// Singular name, e.g. `comic`.
  pub fn name(self) -> &'static str {
    match self {
      Self::Character => "character",
      Self::Comic => "comic",
      Self::Series => "series",
      Self::Event => "event",
      Self::Story => "story",
      Self::Creator => "creator",
    }
  }

  /// Related categories loaded alongside an entity of this kind.
  pub fn related_categories(self) -> &'static [EntityKind] {
    const CHARACTER: &[EntityKind] = &[
      EntityKind::Comic,
      EntityKind::Series,
      EntityKind::Event,
      EntityKind::Story,
    ];
    const COMIC: &[EntityKind] = &[
      EntityKind::Character,
      EntityKind::Series,
      EntityKind::Event,
      EntityKind::Story,
      EntityKind::Creator,
    ];
    const SERIES: &[EntityKind] = &[
      EntityKind::Comic,
      EntityKind::Character,
      EntityKind::Event,
      EntityKind::Story,
      EntityKind::Creator,
    ];
    const EVENT: &[EntityKind] = &[
      EntityKind::Comic,
      EntityKind::Series,
      EntityKind::Character,
      EntityKind::Story,
      EntityKind::Creator,
    ];
    const STORY: &[EntityKind] = &[
      EntityKind::Comic,
      EntityKind::Series,
      EntityKind::Event,
      EntityKind::Character,
      EntityKind::Creator,
    ];
    const CREATOR: &[EntityKind] = &[
      EntityKind::Comic,
      EntityKind::Series,
      EntityKind::Event,
      EntityKind::Story,
    ];

    match self {
      Self::Character => CHARACTER,
      Self::Comic => COMIC,
      Self::Series => SERIES,
      Self::Event => EVENT,
      Self::Story => STORY,
      Self::Creator => CREATOR,
    }
  }

  /// Query parameter for prefix search, if the collection supports one.
  pub fn search_param(self) -> Option<&'static str> {
    match self {
      Self::Character | Self::Creator => Some("nameStartsWith"),
      Self::Comic | Self::Series | Self::Event => Some("titleStartsWith"),
      Self::Story => None,
    }
  }
}

impl fmt::Display for EntityKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

impl FromStr for EntityKind {
  type Err = String;

  /// Accepts singular or collection names, case-insensitively.
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let lower = s.trim().to_lowercase();
    Self::ALL
      .into_iter()
      .find(|kind| kind.name() == lower || kind.path() == lower)
      .ok_or_else(|| {
        format!(
          "unknown entity kind '{}' (expected one of: character, comic, series, event, story, creator)",
          s
        )
      })
  }
}

// ============================================================================
// Entities
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Character {
  pub id: u64,
  pub name: String,
  pub description: String,
  pub modified: String,
  #[serde(rename = "resourceURI")]
  pub resource_uri: String,
  pub urls: Vec<Link>,
  pub thumbnail: Image,
  pub comics: ResourceList,
  pub stories: ResourceList,
  pub events: ResourceList,
  pub series: ResourceList,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Comic {
  pub id: u64,
  pub digital_id: u64,
  pub title: String,
  pub issue_number: f64,
  pub variant_description: String,
  pub description: Option<String>,
  pub modified: String,
  pub isbn: String,
  pub upc: String,
  pub diamond_code: String,
  pub ean: String,
  pub issn: String,
  pub format: String,
  pub page_count: u32,
  pub text_objects: Vec<TextObject>,
  #[serde(rename = "resourceURI")]
  pub resource_uri: String,
  pub urls: Vec<Link>,
  /// The single series this issue belongs to
  pub series: ResourceReference,
  pub variants: Vec<ResourceReference>,
  pub collections: Vec<ResourceReference>,
  pub collected_issues: Vec<ResourceReference>,
  pub dates: Vec<ComicDate>,
  pub prices: Vec<ComicPrice>,
  pub thumbnail: Image,
  pub images: Vec<Image>,
  pub creators: ResourceList,
  pub characters: ResourceList,
  pub stories: ResourceList,
  pub events: ResourceList,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Series {
  pub id: u64,
  pub title: String,
  pub description: Option<String>,
  #[serde(rename = "resourceURI")]
  pub resource_uri: String,
  pub urls: Vec<Link>,
  pub start_year: i32,
  pub end_year: i32,
  pub rating: String,
  pub modified: String,
  pub thumbnail: Image,
  pub comics: ResourceList,
  pub stories: ResourceList,
  pub events: ResourceList,
  pub characters: ResourceList,
  pub creators: ResourceList,
  pub next: Option<ResourceReference>,
  pub previous: Option<ResourceReference>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Event {
  pub id: u64,
  pub title: String,
  pub description: Option<String>,
  #[serde(rename = "resourceURI")]
  pub resource_uri: String,
  pub urls: Vec<Link>,
  pub modified: String,
  pub start: Option<String>,
  pub end: Option<String>,
  pub thumbnail: Image,
  pub comics: ResourceList,
  pub stories: ResourceList,
  pub series: ResourceList,
  pub characters: ResourceList,
  pub creators: ResourceList,
  pub next: Option<ResourceReference>,
  pub previous: Option<ResourceReference>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Story {
  pub id: u64,
  pub title: String,
  pub description: String,
  #[serde(rename = "resourceURI")]
  pub resource_uri: String,
  #[serde(rename = "type")]
  pub kind: String,
  pub modified: String,
  pub thumbnail: Option<Image>,
  pub comics: ResourceList,
  pub series: ResourceList,
  pub events: ResourceList,
  pub characters: ResourceList,
  pub creators: ResourceList,
  pub original_issue: Option<ResourceReference>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Creator {
  pub id: u64,
  pub first_name: String,
  pub middle_name: String,
  pub last_name: String,
  pub suffix: String,
  pub full_name: String,
  pub modified: String,
  #[serde(rename = "resourceURI")]
  pub resource_uri: String,
  pub urls: Vec<Link>,
  pub thumbnail: Image,
  pub series: ResourceList,
  pub stories: ResourceList,
  pub comics: ResourceList,
  pub events: ResourceList,
}
