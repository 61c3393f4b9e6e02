//! Marvel comics API client, entity types and graph loading.

mod aggregate;
mod api_types;
mod cached_client;
mod client;
mod entity;
mod resolver;
mod types;

pub use aggregate::{
  load_entity_graph, CharacterGraph, ComicGraph, CreatorGraph, EntityGraph, EntityId, EventGraph,
  SeriesGraph, StoryGraph,
};
pub use api_types::{
  ComicDate, ComicPrice, DataContainer, DataWrapper, Image, ImageVariant, Link, ResourceList,
  ResourceReference, TextObject,
};
pub use cached_client::CachedMarvelClient;
pub use client::{
  HttpResponse, HttpTransport, MarvelClient, ReqwestTransport, TransportError,
};
pub use entity::Entity;
pub use resolver::{id_from_uri, parse_resource_uri, resolve_all, ResourceId};
pub use types::{Character, Comic, Creator, EntityKind, Event, Series, Story};
