//! Common behaviour of the catalog's entity types.

use serde::{de::DeserializeOwned, Serialize};

use super::types::{Character, Comic, Creator, EntityKind, Event, Series, Story};

/// Trait for entities that can be fetched by id.
pub trait Entity: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
  /// Which collection this entity lives in
  const KIND: EntityKind;

  fn id(&self) -> u64;

  /// Human-readable label (name or title)
  fn label(&self) -> &str;
}

// ============================================================================
// Entity implementations
// ============================================================================

impl Entity for Character {
  const KIND: EntityKind = EntityKind::Character;

  fn id(&self) -> u64 {
    self.id
  }

  fn label(&self) -> &str {
    &self.name
  }
}

impl Entity for Comic {
  const KIND: EntityKind = EntityKind::Comic;

  fn id(&self) -> u64 {
    self.id
  }

  fn label(&self) -> &str {
    &self.title
  }
}

impl Entity for Series {
  const KIND: EntityKind = EntityKind::Series;

  fn id(&self) -> u64 {
    self.id
  }

  fn label(&self) -> &str {
    &self.title
  }
}

impl Entity for Event {
  const KIND: EntityKind = EntityKind::Event;

  fn id(&self) -> u64 {
    self.id
  }

  fn label(&self) -> &str {
    &self.title
  }
}

impl Entity for Story {
  const KIND: EntityKind = EntityKind::Story;

  fn id(&self) -> u64 {
    self.id
  }

  fn label(&self) -> &str {
    &self.title
  }
}

impl Entity for Creator {
  const KIND: EntityKind = EntityKind::Creator;

  fn id(&self) -> u64 {
    self.id
  }

  fn label(&self) -> &str {
    // Some creators only carry first/last names
    if self.full_name.is_empty() {
      &self.last_name
    } else {
      &self.full_name
    }
  }
}
