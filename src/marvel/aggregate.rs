//! Loading an entity together with its related entities.

use serde::Serialize;
use std::slice;
use tracing::{debug, warn};

use super::cached_client::CachedMarvelClient;
use super::entity::Entity;
use super::types::{Character, Comic, Creator, EntityKind, Event, Series, Story};
use crate::error::GraphError;

/// A validated entity id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityId(u64);

impl EntityId {
  /// Parse a raw id as typed by a user or taken from a route.
  pub fn parse(raw: &str) -> Result<Self, GraphError> {
    let value: i64 = raw
      .trim()
      .parse()
      .map_err(|_| GraphError::InvalidId(raw.to_string()))?;
    Self::try_from(value)
  }

  pub fn get(self) -> u64 {
    self.0
  }
}

impl TryFrom<i64> for EntityId {
  type Error = GraphError;

  fn try_from(value: i64) -> Result<Self, Self::Error> {
    u64::try_from(value)
      .map(Self)
      .map_err(|_| GraphError::InvalidId(value.to_string()))
  }
}

#[derive(Debug, Clone, Serialize)]
pub struct CharacterGraph {
  pub character: Character,
  pub comics: Vec<Comic>,
  pub series: Vec<Series>,
  pub events: Vec<Event>,
  pub stories: Vec<Story>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComicGraph {
  pub comic: Comic,
  pub characters: Vec<Character>,
  /// Zero or one entry: the series the issue belongs to
  pub series: Vec<Series>,
  pub events: Vec<Event>,
  pub stories: Vec<Story>,
  pub creators: Vec<Creator>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SeriesGraph {
  pub series: Series,
  pub comics: Vec<Comic>,
  pub characters: Vec<Character>,
  pub events: Vec<Event>,
  pub stories: Vec<Story>,
  pub creators: Vec<Creator>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EventGraph {
  pub event: Event,
  pub comics: Vec<Comic>,
  pub series: Vec<Series>,
  pub characters: Vec<Character>,
  pub stories: Vec<Story>,
  pub creators: Vec<Creator>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StoryGraph {
  pub story: Story,
  pub comics: Vec<Comic>,
  pub series: Vec<Series>,
  pub events: Vec<Event>,
  pub characters: Vec<Character>,
  pub creators: Vec<Creator>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatorGraph {
  pub creator: Creator,
  pub comics: Vec<Comic>,
  pub series: Vec<Series>,
  pub events: Vec<Event>,
  pub stories: Vec<Story>,
}

/// An entity with its related entities fully loaded.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EntityGraph {
  Character(CharacterGraph),
  Comic(ComicGraph),
  Series(SeriesGraph),
  Event(EventGraph),
  Story(StoryGraph),
  Creator(CreatorGraph),
}

impl EntityGraph {
  pub fn kind(&self) -> EntityKind {
    match self {
      Self::Character(_) => EntityKind::Character,
      Self::Comic(_) => EntityKind::Comic,
      Self::Series(_) => EntityKind::Series,
      Self::Event(_) => EntityKind::Event,
      Self::Story(_) => EntityKind::Story,
      Self::Creator(_) => EntityKind::Creator,
    }
  }

  /// Name or title of the primary entity.
  pub fn label(&self) -> &str {
    match self {
      Self::Character(g) => g.character.label(),
      Self::Comic(g) => g.comic.label(),
      Self::Series(g) => g.series.label(),
      Self::Event(g) => g.event.label(),
      Self::Story(g) => g.story.label(),
      Self::Creator(g) => g.creator.label(),
    }
  }

  /// Labels of the loaded related entities, per category, in the order of
  /// [`EntityKind::related_categories`].
  pub fn related(&self) -> Vec<(EntityKind, Vec<&str>)> {
    self
      .kind()
      .related_categories()
      .iter()
      .filter_map(|&category| Some((category, self.labels_for(category)?)))
      .collect()
  }

  /// Labels of the loaded entities in one category, or `None` if this graph
  /// does not load that category.
  pub fn labels_for(&self, category: EntityKind) -> Option<Vec<&str>> {
    fn labels<T: Entity>(items: &[T]) -> Option<Vec<&str>> {
      Some(items.iter().map(T::label).collect())
    }

    use EntityKind as K;
    match (self, category) {
      (Self::Character(g), K::Comic) => labels(&g.comics),
      (Self::Character(g), K::Series) => labels(&g.series),
      (Self::Character(g), K::Event) => labels(&g.events),
      (Self::Character(g), K::Story) => labels(&g.stories),

      (Self::Comic(g), K::Character) => labels(&g.characters),
      (Self::Comic(g), K::Series) => labels(&g.series),
      (Self::Comic(g), K::Event) => labels(&g.events),
      (Self::Comic(g), K::Story) => labels(&g.stories),
      (Self::Comic(g), K::Creator) => labels(&g.creators),

      (Self::Series(g), K::Comic) => labels(&g.comics),
      (Self::Series(g), K::Character) => labels(&g.characters),
      (Self::Series(g), K::Event) => labels(&g.events),
      (Self::Series(g), K::Story) => labels(&g.stories),
      (Self::Series(g), K::Creator) => labels(&g.creators),

      (Self::Event(g), K::Comic) => labels(&g.comics),
      (Self::Event(g), K::Series) => labels(&g.series),
      (Self::Event(g), K::Character) => labels(&g.characters),
      (Self::Event(g), K::Story) => labels(&g.stories),
      (Self::Event(g), K::Creator) => labels(&g.creators),

      (Self::Story(g), K::Comic) => labels(&g.comics),
      (Self::Story(g), K::Series) => labels(&g.series),
      (Self::Story(g), K::Event) => labels(&g.events),
      (Self::Story(g), K::Character) => labels(&g.characters),
      (Self::Story(g), K::Creator) => labels(&g.creators),

      (Self::Creator(g), K::Comic) => labels(&g.comics),
      (Self::Creator(g), K::Series) => labels(&g.series),
      (Self::Creator(g), K::Event) => labels(&g.events),
      (Self::Creator(g), K::Story) => labels(&g.stories),

      _ => None,
    }
  }
}

/// Load an entity and, concurrently, every related category it lists.
///
/// A negative id fails before any request is made. A missing primary entity
/// is `NotFound`; any other primary failure is `Server`. Failures inside a
/// related category only shorten that category's list.
pub async fn load_entity_graph(
  client: &CachedMarvelClient,
  kind: EntityKind,
  id: i64,
) -> Result<EntityGraph, GraphError> {
  let id = EntityId::try_from(id)?.get();
  debug!(%kind, id, "loading entity graph");

  let graph = match kind {
    EntityKind::Character => EntityGraph::Character(character_graph(client, id).await?),
    EntityKind::Comic => EntityGraph::Comic(comic_graph(client, id).await?),
    EntityKind::Series => EntityGraph::Series(series_graph(client, id).await?),
    EntityKind::Event => EntityGraph::Event(event_graph(client, id).await?),
    EntityKind::Story => EntityGraph::Story(story_graph(client, id).await?),
    EntityKind::Creator => EntityGraph::Creator(creator_graph(client, id).await?),
  };

  Ok(graph)
}

async fn fetch_primary<T: Entity>(client: &CachedMarvelClient, id: u64) -> Result<T, GraphError> {
  match client.get_by_id::<T>(id).await {
    Ok(wrapper) => wrapper
      .into_first()
      .ok_or(GraphError::NotFound { kind: T::KIND, id }),
    Err(e) if e.is_not_found() => Err(GraphError::NotFound { kind: T::KIND, id }),
    Err(source) => {
      warn!(kind = %T::KIND, id, error = %source, "failed to load entity");
      Err(GraphError::Server {
        kind: T::KIND,
        id,
        source,
      })
    }
  }
}

async fn character_graph(client: &CachedMarvelClient, id: u64) -> Result<CharacterGraph, GraphError> {
  let character: Character = fetch_primary(client, id).await?;

  let (comics, series, events, stories) = tokio::join!(
    client.resolve::<Comic>(&character.comics.items),
    client.resolve::<Series>(&character.series.items),
    client.resolve::<Event>(&character.events.items),
    client.resolve::<Story>(&character.stories.items),
  );

  Ok(CharacterGraph {
    character,
    comics,
    series,
    events,
    stories,
  })
}

async fn comic_graph(client: &CachedMarvelClient, id: u64) -> Result<ComicGraph, GraphError> {
  let comic: Comic = fetch_primary(client, id).await?;

  let (characters, series, events, stories, creators) = tokio::join!(
    client.resolve::<Character>(&comic.characters.items),
    client.resolve::<Series>(slice::from_ref(&comic.series)),
    client.resolve::<Event>(&comic.events.items),
    client.resolve::<Story>(&comic.stories.items),
    client.resolve::<Creator>(&comic.creators.items),
  );

  Ok(ComicGraph {
    comic,
    characters,
    series,
    events,
    stories,
    creators,
  })
}

async fn series_graph(client: &CachedMarvelClient, id: u64) -> Result<SeriesGraph, GraphError> {
  let series: Series = fetch_primary(client, id).await?;

  let (comics, characters, events, stories, creators) = tokio::join!(
    client.resolve::<Comic>(&series.comics.items),
    client.resolve::<Character>(&series.characters.items),
    client.resolve::<Event>(&series.events.items),
    client.resolve::<Story>(&series.stories.items),
    client.resolve::<Creator>(&series.creators.items),
  );

  Ok(SeriesGraph {
    series,
    comics,
    characters,
    events,
    stories,
    creators,
  })
}

async fn event_graph(client: &CachedMarvelClient, id: u64) -> Result<EventGraph, GraphError> {
  let event: Event = fetch_primary(client, id).await?;

  let (comics, series, characters, stories, creators) = tokio::join!(
    client.resolve::<Comic>(&event.comics.items),
    client.resolve::<Series>(&event.series.items),
    client.resolve::<Character>(&event.characters.items),
    client.resolve::<Story>(&event.stories.items),
    client.resolve::<Creator>(&event.creators.items),
  );

  Ok(EventGraph {
    event,
    comics,
    series,
    characters,
    stories,
    creators,
  })
}

async fn story_graph(client: &CachedMarvelClient, id: u64) -> Result<StoryGraph, GraphError> {
  let story: Story = fetch_primary(client, id).await?;

  let (comics, series, events, characters, creators) = tokio::join!(
    client.resolve::<Comic>(&story.comics.items),
    client.resolve::<Series>(&story.series.items),
    client.resolve::<Event>(&story.events.items),
    client.resolve::<Character>(&story.characters.items),
    client.resolve::<Creator>(&story.creators.items),
  );

  Ok(StoryGraph {
    story,
    comics,
    series,
    events,
    characters,
    creators,
  })
}

async fn creator_graph(client: &CachedMarvelClient, id: u64) -> Result<CreatorGraph, GraphError> {
  let creator: Creator = fetch_primary(client, id).await?;

  let (comics, series, events, stories) = tokio::join!(
    client.resolve::<Comic>(&creator.comics.items),
    client.resolve::<Series>(&creator.series.items),
    client.resolve::<Event>(&creator.events.items),
    client.resolve::<Story>(&creator.stories.items),
  );

  Ok(CreatorGraph {
    creator,
    comics,
    series,
    events,
    stories,
  })
}
