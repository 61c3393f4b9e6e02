use clap::{Args as ClapArgs, Parser, Subcommand};
use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;
use tracing::info;

use comicdex::cache::QueryParams;
use comicdex::config::Config;
use comicdex::logging;
use comicdex::marvel::{
  load_entity_graph, CachedMarvelClient, Character, Comic, Creator, DataWrapper, Entity,
  EntityGraph, EntityKind, Event, Series, Story,
};

#[derive(Parser, Debug)]
#[command(name = "comicdex")]
#[command(about = "Browse the Marvel comics catalog with a local response cache")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/comicdex/config.yaml)
  #[arg(short, long, global = true)]
  config: Option<PathBuf>,

  /// Increase log verbosity (-v info, -vv debug)
  #[arg(short, long, action = clap::ArgAction::Count, global = true)]
  verbose: u8,

  /// Also write logs to this file, rotated daily
  #[arg(long, global = true)]
  log_file: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Show an entity with everything it references
  Show {
    kind: EntityKind,
    #[arg(allow_negative_numbers = true)]
    id: i64,
    /// Print the full graph as JSON
    #[arg(long)]
    json: bool,
  },

  /// List a collection
  List {
    kind: EntityKind,
    #[command(flatten)]
    page: PageArgs,
    /// Sort field, e.g. `name` or `-modified`
    #[arg(long)]
    order_by: Option<String>,
    #[arg(long)]
    json: bool,
  },

  /// Find entities whose name or title starts with a prefix
  Search {
    kind: EntityKind,
    prefix: String,
    #[command(flatten)]
    page: PageArgs,
    #[arg(long)]
    json: bool,
  },

  /// Manage the local response cache
  Cache {
    #[command(subcommand)]
    action: CacheAction,
  },
}

#[derive(ClapArgs, Debug)]
struct PageArgs {
  #[arg(long, default_value_t = 20)]
  limit: u32,
  #[arg(long, default_value_t = 0)]
  offset: u32,
}

#[derive(Subcommand, Debug)]
enum CacheAction {
  /// Remove expired entries
  Sweep,
  /// Remove one key, or every cached response
  Clear {
    #[arg(long)]
    key: Option<String>,
  },
}

/// Run `$body` with `$T` bound to the entity type for `$kind`.
macro_rules! with_entity_type {
  ($kind:expr, $T:ident => $body:expr) => {
    match $kind {
      EntityKind::Character => {
        type $T = Character;
        $body
      }
      EntityKind::Comic => {
        type $T = Comic;
        $body
      }
      EntityKind::Series => {
        type $T = Series;
        $body
      }
      EntityKind::Event => {
        type $T = Event;
        $body
      }
      EntityKind::Story => {
        type $T = Story;
        $body
      }
      EntityKind::Creator => {
        type $T = Creator;
        $body
      }
    }
  };
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();
  let _log_guard = logging::init(args.verbose, args.log_file.as_deref())?;

  // Load configuration
  let config = Config::load(args.config.as_deref())?;

  match args.command {
    Command::Show { kind, id, json } => {
      let client = CachedMarvelClient::new(&config)?;
      let graph = load_entity_graph(&client, kind, id)
        .await
        .map_err(|e| eyre!("[{}] {}", e.status(), e))?;

      if json {
        println!("{}", serde_json::to_string_pretty(&graph)?);
      } else {
        print_graph(&graph);
      }
    }

    Command::List {
      kind,
      page,
      order_by,
      json,
    } => {
      let client = CachedMarvelClient::new(&config)?;
      let params = QueryParams::new()
        .limit(page.limit)
        .offset(page.offset)
        .set_opt("orderBy", order_by);

      with_entity_type!(kind, T => {
        let results = client.list::<T>(&params).await?;
        print_page(kind, &results, json)?;
      });
    }

    Command::Search {
      kind,
      prefix,
      page,
      json,
    } => {
      let client = CachedMarvelClient::new(&config)?;
      let params = QueryParams::new().limit(page.limit).offset(page.offset);

      with_entity_type!(kind, T => {
        let results = client.search::<T>(&prefix, &params).await?;
        print_page(kind, &results, json)?;
      });
    }

    Command::Cache { action } => {
      let cache = config.cache.build();

      match action {
        CacheAction::Sweep => {
          let removed = cache.sweep().await;
          info!(removed, "cache sweep finished");
          println!("Removed {} expired entries", removed);
        }
        CacheAction::Clear { key } => {
          cache.invalidate(key.as_deref()).await;
          match key {
            Some(key) => println!("Removed {}", key),
            None => println!("Cleared every '{}' entry", cache.namespace()),
          }
        }
      }
    }
  }

  Ok(())
}

fn print_graph(graph: &EntityGraph) {
  println!("{} {}", graph.kind(), graph.label());

  for (kind, labels) in graph.related() {
    println!("  {} ({}):", kind.path(), labels.len());
    for label in labels {
      println!("    {}", label);
    }
  }
}

fn print_page<T: Entity>(kind: EntityKind, page: &DataWrapper<T>, json: bool) -> Result<()> {
  if json {
    println!("{}", serde_json::to_string_pretty(&page.data.results)?);
    return Ok(());
  }

  let data = &page.data;
  println!(
    "{} {} (total {}, offset {})",
    data.results.len(),
    kind.path(),
    data.total,
    data.offset
  );
  for entity in &data.results {
    println!("  {:>8}  {}", entity.id(), entity.label());
  }

  Ok(())
}
