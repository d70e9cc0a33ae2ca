use std::thread;

use thiserror::Error;
use tracing::{info, warn};

use crate::positions::{PositionMap, PositionStore};

use super::entity::SiteData;
use super::source::{Collection, SiteSource};

/// A collection that could not be loaded and was replaced by an empty one.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("failed to load {collection}: {message}")]
pub struct LoadFailure {
    pub collection: Collection,
    pub message: String,
}

#[derive(Clone, Debug)]
pub struct SiteSnapshot {
    pub generation: u64,
    pub data: SiteData,
    /// `None` when the load did not ask for saved positions (refetch).
    pub positions: Option<PositionMap>,
    pub failures: Vec<LoadFailure>,
}

/// Hands out increasing load numbers so only the newest response is applied.
#[derive(Debug, Default)]
pub struct LoadGenerations {
    latest: u64,
}

impl LoadGenerations {
    pub fn issue(&mut self) -> u64 {
        self.latest += 1;
        self.latest
    }

    pub fn latest(&self) -> u64 {
        self.latest
    }

    pub fn is_current(&self, generation: u64) -> bool {
        generation == self.latest
    }
}

/// Fetches every collection (and optionally the saved layout) concurrently and
/// returns once all of them have finished. Failures degrade to empty collections.
pub fn collect_site(
    source: &dyn SiteSource,
    store: Option<&dyn PositionStore>,
    generation: u64,
) -> SiteSnapshot {
    thread::scope(|scope| {
        let fetches = Collection::ALL
            .map(|collection| (collection, scope.spawn(move || source.fetch(collection))));
        let positions = store.map(|store| scope.spawn(move || store.get()));

        let mut data = SiteData::default();
        let mut failures = Vec::new();

        for (collection, handle) in fetches {
            let entities = match handle.join() {
                Ok(Ok(entities)) => entities,
                Ok(Err(error)) => {
                    failures.push(LoadFailure {
                        collection,
                        message: format!("{:#}", anyhow::Error::from(error)),
                    });
                    Vec::new()
                }
                Err(_) => {
                    failures.push(LoadFailure {
                        collection,
                        message: "loader thread panicked".to_owned(),
                    });
                    Vec::new()
                }
            };

            match collection {
                Collection::Pages => data.pages = entities,
                Collection::Templates => data.templates = entities,
                Collection::TemplateParts => data.template_parts = entities,
                Collection::Patterns => data.patterns = entities,
            }
        }

        let positions = positions.map(|handle| handle.join().unwrap_or_default());

        for failure in &failures {
            warn!(generation, %failure, "collection degraded to empty");
        }
        info!(
            generation,
            pages = data.pages.len(),
            templates = data.templates.len(),
            template_parts = data.template_parts.len(),
            patterns = data.patterns.len(),
            saved_positions = positions.as_ref().map_or(0, |map| map.len()),
            "site data loaded"
        );

        SiteSnapshot {
            generation,
            data,
            positions,
            failures,
        }
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::error::GatewayError;
    use crate::positions::Position;
    use crate::positions::tests::MemoryStore;
    use crate::site::entity::{Entity, EntityKind};

    struct FakeSource {
        failing: Option<Collection>,
    }

    impl SiteSource for FakeSource {
        fn fetch(&self, collection: Collection) -> Result<Vec<Entity>, GatewayError> {
            if self.failing == Some(collection) {
                return Err(GatewayError::Status {
                    url: collection.route().to_owned(),
                    status: 403,
                });
            }
            let entity = match collection {
                Collection::Pages => Entity::new(EntityKind::Page, "1"),
                Collection::Templates => {
                    Entity::new(EntityKind::Template, "t//index").with_slug("index")
                }
                Collection::TemplateParts => {
                    Entity::new(EntityKind::TemplatePart, "t//header").with_slug("header")
                }
                Collection::Patterns => Entity::new(EntityKind::Pattern, "ns/a").with_slug("ns/a"),
            };
            Ok(vec![entity])
        }
    }

    #[test]
    fn loads_all_collections_and_positions() {
        let store = MemoryStore::default();
        store
            .saved
            .lock()
            .unwrap()
            .insert("page-1".to_owned(), Position::new(3.0, 4.0));

        let snapshot = collect_site(&FakeSource { failing: None }, Some(&store), 3);

        assert_eq!(snapshot.generation, 3);
        assert_eq!(snapshot.data.entity_count(), 4);
        assert!(snapshot.failures.is_empty());
        assert_eq!(
            snapshot.positions.unwrap()["page-1"],
            Position::new(3.0, 4.0)
        );
    }

    #[test]
    fn failed_collection_degrades_without_blocking_the_rest() {
        let source = FakeSource {
            failing: Some(Collection::TemplateParts),
        };

        let snapshot = collect_site(&source, None, 1);

        assert!(snapshot.data.template_parts.is_empty());
        assert_eq!(snapshot.data.pages.len(), 1);
        assert_eq!(snapshot.data.patterns.len(), 1);
        assert!(snapshot.positions.is_none());
        assert_eq!(snapshot.failures.len(), 1);
        assert_eq!(snapshot.failures[0].collection, Collection::TemplateParts);
        assert!(snapshot.failures[0].to_string().contains("HTTP 403"));
    }

    #[test]
    fn unreadable_positions_fall_back_to_empty() {
        let store = Arc::new(MemoryStore {
            fail: true,
            ..MemoryStore::default()
        });

        let snapshot = collect_site(&FakeSource { failing: None }, Some(store.as_ref()), 1);

        assert_eq!(snapshot.positions, Some(PositionMap::new()));
    }

    #[test]
    fn only_the_latest_generation_is_current() {
        let mut generations = LoadGenerations::default();
        let first = generations.issue();
        let second = generations.issue();

        assert!(second > first);
        assert!(!generations.is_current(first));
        assert!(generations.is_current(second));
        assert_eq!(generations.latest(), second);
    }

    #[test]
    fn failure_message_carries_the_cause() {
        struct BrokenExport;

        impl SiteSource for BrokenExport {
            fn fetch(&self, _collection: Collection) -> Result<Vec<Entity>, GatewayError> {
                Err(GatewayError::Io {
                    path: "export/pages.json".into(),
                    source: std::io::Error::other("disk unplugged"),
                })
            }
        }

        let snapshot = collect_site(&BrokenExport, None, 1);

        assert_eq!(snapshot.failures.len(), Collection::ALL.len());
        assert_eq!(
            snapshot.failures[0].message,
            "failed to access export/pages.json: disk unplugged"
        );
    }
}
