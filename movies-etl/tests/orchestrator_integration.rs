//! Integration tests for the movies ETL orchestrator.
//!
//! These tests use the real Orchestrator and stage chain but mock dependencies
//! (CatalogRepository and SearchIndexProvider) to ensure reliable testing.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::json;
use tokio::time::timeout;
use uuid::Uuid;

use movies_etl::checkpoint::WatermarkKeys;
use movies_etl::config::{build_pipeline, CheckpointKeying, DEFAULT_STATE_KEY};
use movies_etl::errors::IngestError;
use movies_etl::orchestrator::{Orchestrator, OrchestratorConfig, OrchestratorState};
use movies_etl_repository::{
    BatchOperationResult, BatchOperationSummary, CatalogError, CatalogRepository, CheckpointStore,
    InMemoryCheckpointStore, JsonFileCheckpointStore, SearchIndexError, SearchIndexProvider,
};
use movies_etl_shared::{
    AggregateRow, ChangedRow, FilmType, GenreRef, MovieDocument, PageCursor, Participation, Role,
    TrackedTable,
};

fn at(secs: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap() + chrono::Duration::seconds(secs)
}

// ============================================================================
// Mock catalog
// ============================================================================

struct Film {
    id: Uuid,
    title: String,
    updated_at: DateTime<Utc>,
    genres: Vec<Uuid>,
    persons: Vec<(Uuid, Role)>,
}

struct Named {
    name: String,
    updated_at: DateTime<Utc>,
}

#[derive(Default)]
struct CatalogData {
    films: Vec<Film>,
    genres: HashMap<Uuid, Named>,
    persons: HashMap<Uuid, Named>,
}

/// In-memory catalog honoring the keyset ordering of the real queries.
#[derive(Default)]
struct MockCatalog {
    data: Mutex<CatalogData>,
    /// Number of upcoming calls that fail with a connectivity error.
    failures_left: AtomicUsize,
    changed_rows_calls: AtomicUsize,
    malformed: Mutex<HashSet<Uuid>>,
}

impl MockCatalog {
    fn add_film(&self, title: &str, updated_at: DateTime<Utc>) -> Uuid {
        let id = Uuid::new_v4();
        self.data.lock().unwrap().films.push(Film {
            id,
            title: title.to_string(),
            updated_at,
            genres: Vec::new(),
            persons: Vec::new(),
        });
        id
    }

    fn add_genre(&self, name: &str, updated_at: DateTime<Utc>) -> Uuid {
        let id = Uuid::new_v4();
        self.data.lock().unwrap().genres.insert(
            id,
            Named {
                name: name.to_string(),
                updated_at,
            },
        );
        id
    }

    fn add_person(&self, name: &str, updated_at: DateTime<Utc>) -> Uuid {
        let id = Uuid::new_v4();
        self.data.lock().unwrap().persons.insert(
            id,
            Named {
                name: name.to_string(),
                updated_at,
            },
        );
        id
    }

    fn link_genre(&self, film: Uuid, genre: Uuid) {
        let mut data = self.data.lock().unwrap();
        if let Some(f) = data.films.iter_mut().find(|f| f.id == film) {
            f.genres.push(genre);
        }
    }

    fn link_person(&self, film: Uuid, person: Uuid, role: Role) {
        let mut data = self.data.lock().unwrap();
        if let Some(f) = data.films.iter_mut().find(|f| f.id == film) {
            f.persons.push((person, role));
        }
    }

    fn rename_genre(&self, genre: Uuid, name: &str, updated_at: DateTime<Utc>) {
        let mut data = self.data.lock().unwrap();
        if let Some(g) = data.genres.get_mut(&genre) {
            g.name = name.to_string();
            g.updated_at = updated_at;
        }
    }

    fn fail_next(&self, calls: usize) {
        self.failures_left.store(calls, Ordering::SeqCst);
    }

    fn check_connectivity(&self) -> Result<(), CatalogError> {
        let left = self.failures_left.load(Ordering::SeqCst);
        if left > 0 {
            self.failures_left.store(left - 1, Ordering::SeqCst);
            return Err(CatalogError::from(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

fn page(mut rows: Vec<ChangedRow>, cursor: Option<&PageCursor>, limit: usize) -> Vec<ChangedRow> {
    rows.retain(|row| cursor.map_or(true, |c| c.admits(row)));
    rows.sort_by_key(|row| (row.updated_at, row.id));
    rows.truncate(limit);
    rows
}

#[async_trait]
impl CatalogRepository for MockCatalog {
    async fn changed_rows(
        &self,
        table: TrackedTable,
        cursor: &PageCursor,
        limit: usize,
    ) -> Result<Vec<ChangedRow>, CatalogError> {
        self.changed_rows_calls.fetch_add(1, Ordering::SeqCst);
        self.check_connectivity()?;

        let data = self.data.lock().unwrap();
        let rows: Vec<ChangedRow> = match table {
            TrackedTable::FilmWork => data
                .films
                .iter()
                .map(|f| ChangedRow::new(f.id, f.updated_at))
                .collect(),
            TrackedTable::Genre => data
                .genres
                .iter()
                .map(|(id, g)| ChangedRow::new(*id, g.updated_at))
                .collect(),
            TrackedTable::Person => data
                .persons
                .iter()
                .map(|(id, p)| ChangedRow::new(*id, p.updated_at))
                .collect(),
        };
        Ok(page(rows, Some(cursor), limit))
    }

    async fn films_referencing(
        &self,
        table: TrackedTable,
        child_ids: &[Uuid],
        cursor: Option<&PageCursor>,
        limit: usize,
    ) -> Result<Vec<ChangedRow>, CatalogError> {
        self.check_connectivity()?;

        let data = self.data.lock().unwrap();
        let rows: Vec<ChangedRow> = data
            .films
            .iter()
            .filter(|f| match table {
                TrackedTable::Genre => f.genres.iter().any(|g| child_ids.contains(g)),
                TrackedTable::Person => f.persons.iter().any(|(p, _)| child_ids.contains(p)),
                TrackedTable::FilmWork => false,
            })
            .map(|f| ChangedRow::new(f.id, f.updated_at))
            .collect();
        Ok(page(rows, cursor, limit))
    }

    async fn aggregate_rows(&self, film_ids: &[Uuid]) -> Result<Vec<AggregateRow>, CatalogError> {
        self.check_connectivity()?;

        if film_ids
            .iter()
            .any(|id| self.malformed.lock().unwrap().contains(id))
        {
            return Err(CatalogError::invalid_row("unknown film type 'documentary'"));
        }

        let data = self.data.lock().unwrap();
        let mut films: Vec<&Film> = data
            .films
            .iter()
            .filter(|f| film_ids.contains(&f.id))
            .collect();
        films.sort_by_key(|f| (f.updated_at, f.id));

        Ok(films
            .into_iter()
            .map(|f| AggregateRow {
                id: f.id,
                rating: Some(7.0),
                title: f.title.clone(),
                description: None,
                film_type: FilmType::Movie,
                genres: f
                    .genres
                    .iter()
                    .map(|g| GenreRef {
                        id: *g,
                        name: data.genres[g].name.clone(),
                    })
                    .collect(),
                persons: f
                    .persons
                    .iter()
                    .map(|(p, role)| Participation {
                        id: *p,
                        name: data.persons[p].name.clone(),
                        role: *role,
                    })
                    .collect(),
            })
            .collect())
    }
}

// ============================================================================
// Mock search provider
// ============================================================================

#[derive(Default)]
struct MockSearchProvider {
    documents: Mutex<HashMap<Uuid, MovieDocument>>,
    batches: Mutex<Vec<Vec<Uuid>>>,
    rejected: Mutex<HashSet<Uuid>>,
}

impl MockSearchProvider {
    fn reject(&self, id: Uuid) {
        self.rejected.lock().unwrap().insert(id);
    }

    fn accept_all(&self) {
        self.rejected.lock().unwrap().clear();
    }

    fn batches(&self) -> Vec<Vec<Uuid>> {
        self.batches.lock().unwrap().clone()
    }

    fn document(&self, id: Uuid) -> Option<MovieDocument> {
        self.documents.lock().unwrap().get(&id).cloned()
    }
}

#[async_trait]
impl SearchIndexProvider for MockSearchProvider {
    async fn ensure_index_exists(&self) -> Result<(), SearchIndexError> {
        Ok(())
    }

    async fn bulk_upsert_documents(
        &self,
        documents: &[MovieDocument],
    ) -> Result<BatchOperationSummary, SearchIndexError> {
        self.batches
            .lock()
            .unwrap()
            .push(documents.iter().map(|d| d.id).collect());

        let rejected = self.rejected.lock().unwrap().clone();
        let mut stored = self.documents.lock().unwrap();
        let results = documents
            .iter()
            .map(|doc| {
                if rejected.contains(&doc.id) {
                    BatchOperationResult {
                        document_id: doc.document_id(),
                        success: false,
                        error: Some(SearchIndexError::index("mapper_parsing_exception")),
                    }
                } else {
                    stored.insert(doc.id, doc.clone());
                    BatchOperationResult {
                        document_id: doc.document_id(),
                        success: true,
                        error: None,
                    }
                }
            })
            .collect();

        Ok(BatchOperationSummary::from_results(results))
    }
}

// ============================================================================
// Helpers
// ============================================================================

struct Harness {
    catalog: Arc<MockCatalog>,
    provider: Arc<MockSearchProvider>,
    store: Arc<InMemoryCheckpointStore>,
    orchestrator: Orchestrator,
}

fn harness(keying: CheckpointKeying, page_size: usize) -> Harness {
    harness_with(keying, page_size, OrchestratorConfig::default())
}

fn harness_with(keying: CheckpointKeying, page_size: usize, config: OrchestratorConfig) -> Harness {
    let catalog = Arc::new(MockCatalog::default());
    let provider = Arc::new(MockSearchProvider::default());
    let store = Arc::new(InMemoryCheckpointStore::new());

    let orchestrator = build_pipeline(
        catalog.clone(),
        provider.clone(),
        store.clone(),
        WatermarkKeys::new(DEFAULT_STATE_KEY, keying),
        page_size,
        config,
    );

    Harness {
        catalog,
        provider,
        store,
        orchestrator,
    }
}

fn per_table_key(table: TrackedTable) -> String {
    format!("{}:{}", DEFAULT_STATE_KEY, table.table_name())
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_end_to_end_sweep_then_idle_sweep() {
    let h = harness(CheckpointKeying::Shared, 100);
    let genre = h.catalog.add_genre("Sci-Fi", at(1));
    let actor = h.catalog.add_person("Ann Actor", at(1));
    let film = h.catalog.add_film("Star Trek", at(2));
    h.catalog.link_genre(film, genre);
    h.catalog.link_person(film, actor, Role::Actor);

    let stats = h.orchestrator.sweep().await.unwrap();
    assert_eq!(stats.documents_indexed, 1);

    let doc = serde_json::to_value(h.provider.document(film).unwrap()).unwrap();
    assert_eq!(doc["id"], json!(film.to_string()));
    assert_eq!(doc["genre"], json!(["Sci-Fi"]));
    assert_eq!(doc["actors_names"], json!(["Ann Actor"]));
    assert_eq!(
        doc["actors"],
        json!([{"id": actor.to_string(), "name": "Ann Actor"}])
    );
    assert_eq!(doc["writers_names"], json!([]));
    assert_eq!(doc["director"], json!([]));

    let watermark = h.store.get(DEFAULT_STATE_KEY).await.unwrap();
    assert_eq!(watermark, Some(at(2)));

    let second = h.orchestrator.sweep().await.unwrap();
    assert_eq!(second.documents_indexed, 0);
    assert_eq!(second.checkpoints_saved, 0);
    assert_eq!(h.provider.batches().len(), 1);
    assert_eq!(h.store.get(DEFAULT_STATE_KEY).await.unwrap(), watermark);
}

#[tokio::test]
async fn test_idle_sweep_on_empty_catalog_writes_nothing() {
    let h = harness(CheckpointKeying::PerTable, 100);

    let stats = h.orchestrator.sweep().await.unwrap();

    assert_eq!(stats.pages_extracted, 0);
    assert!(h.provider.batches().is_empty());
    assert!(h.store.snapshot().await.is_empty());
    // One empty page per table.
    assert_eq!(h.catalog.changed_rows_calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_pagination_covers_every_row_once() {
    let page_size = 2;
    let h = harness(CheckpointKeying::Shared, page_size);
    let mut expected = vec![
        (at(1), h.catalog.add_film("A", at(1))),
        (at(1), h.catalog.add_film("B", at(1))),
        (at(2), h.catalog.add_film("C", at(2))),
    ];
    expected.sort();
    let expected: Vec<Uuid> = expected.into_iter().map(|(_, id)| id).collect();

    let stats = h.orchestrator.sweep().await.unwrap();

    assert_eq!(stats.pages_extracted, 2);
    let batches = h.provider.batches();
    assert_eq!(batches.len(), 2);
    assert_eq!(batches[0].len(), page_size);
    assert_eq!(batches[1].len(), 1);
    assert_eq!(batches.concat(), expected);
    assert_eq!(h.store.get(DEFAULT_STATE_KEY).await.unwrap(), Some(at(2)));
}

#[tokio::test]
async fn test_child_without_films_contributes_nothing() {
    let h = harness(CheckpointKeying::PerTable, 100);
    let film = h.catalog.add_film("Star Trek", at(1));
    h.catalog.add_person("Nobody", at(5));

    let stats = h.orchestrator.sweep().await.unwrap();

    assert_eq!(stats.ids_enriched, 1);
    assert_eq!(h.provider.batches(), vec![vec![film]]);
    // The orphan's page still counts as handled.
    assert_eq!(
        h.store.get(&per_table_key(TrackedTable::Person)).await.unwrap(),
        Some(at(5))
    );
}

#[tokio::test]
async fn test_person_with_two_roles_fans_out() {
    let h = harness(CheckpointKeying::Shared, 100);
    let film = h.catalog.add_film("Star Trek", at(1));
    let person = h.catalog.add_person("Ann", at(0));
    h.catalog.link_person(film, person, Role::Actor);
    h.catalog.link_person(film, person, Role::Director);

    h.orchestrator.sweep().await.unwrap();

    let doc = h.provider.document(film).unwrap();
    assert_eq!(doc.actors_names, vec!["Ann"]);
    assert_eq!(doc.actors[0].id, person);
    assert_eq!(doc.director, vec!["Ann"]);
    assert!(doc.writers.is_empty());
}

#[tokio::test]
async fn test_changed_genre_reindexes_its_films() {
    let h = harness(CheckpointKeying::PerTable, 100);
    let genre = h.catalog.add_genre("Sci-Fi", at(1));
    let film = h.catalog.add_film("Star Trek", at(1));
    let other = h.catalog.add_film("Heat", at(2));
    h.catalog.link_genre(film, genre);

    h.orchestrator.sweep().await.unwrap();
    h.catalog.rename_genre(genre, "Science Fiction", at(10));

    let stats = h.orchestrator.sweep().await.unwrap();

    assert_eq!(stats.documents_indexed, 1);
    assert_eq!(
        h.provider.document(film).unwrap().genre,
        vec!["Science Fiction"]
    );
    assert_eq!(h.provider.batches().last(), Some(&vec![film]));
    assert!(h.provider.document(other).is_some());
    assert_eq!(
        h.store.get(&per_table_key(TrackedTable::Genre)).await.unwrap(),
        Some(at(10))
    );
    assert_eq!(
        h.store.get(&per_table_key(TrackedTable::FilmWork)).await.unwrap(),
        Some(at(2))
    );
}

#[tokio::test]
async fn test_partial_failure_keeps_watermark_and_reoffers_rows() {
    let h = harness(CheckpointKeying::Shared, 100);
    let good = h.catalog.add_film("Good", at(1));
    let bad = h.catalog.add_film("Bad", at(2));
    h.provider.reject(bad);

    let first = h.orchestrator.sweep().await.unwrap();

    assert_eq!(first.batches_failed, 1);
    assert_eq!(first.checkpoints_saved, 0);
    assert_eq!(h.store.get(DEFAULT_STATE_KEY).await.unwrap(), None);

    h.provider.accept_all();
    let second = h.orchestrator.sweep().await.unwrap();

    let batches = h.provider.batches();
    assert_eq!(batches.len(), 2);
    assert_eq!(batches[0], batches[1]);
    assert_eq!(batches[1], vec![good, bad]);
    assert_eq!(second.batches_failed, 0);
    assert!(h.provider.document(bad).is_some());
    assert_eq!(h.store.get(DEFAULT_STATE_KEY).await.unwrap(), Some(at(2)));
}

#[tokio::test]
async fn test_failed_page_stops_later_pages_of_the_table() {
    let h = harness(CheckpointKeying::PerTable, 1);
    let first = h.catalog.add_film("First", at(1));
    let second = h.catalog.add_film("Second", at(2));
    let third = h.catalog.add_film("Third", at(3));
    h.provider.reject(second);

    h.orchestrator.sweep().await.unwrap();

    assert_eq!(h.provider.batches(), vec![vec![first], vec![second]]);
    assert!(h.provider.document(third).is_none());
    assert_eq!(
        h.store.get(&per_table_key(TrackedTable::FilmWork)).await.unwrap(),
        Some(at(1))
    );
}

#[tokio::test]
async fn test_rows_tied_with_a_failed_row_are_reoffered() {
    let h = harness(CheckpointKeying::Shared, 1);
    let mut films = vec![
        h.catalog.add_film("First", at(1)),
        h.catalog.add_film("Second", at(1)),
    ];
    films.sort();
    h.provider.reject(films[1]);

    h.orchestrator.sweep().await.unwrap();

    assert_eq!(h.provider.batches(), vec![vec![films[0]], vec![films[1]]]);
    assert_eq!(h.store.get(DEFAULT_STATE_KEY).await.unwrap(), None);

    h.provider.accept_all();
    h.orchestrator.sweep().await.unwrap();

    let batches = h.provider.batches();
    assert_eq!(batches.len(), 4);
    assert_eq!(batches[2..], [vec![films[0]], vec![films[1]]]);
    assert!(h.provider.document(films[1]).is_some());
    assert_eq!(h.store.get(DEFAULT_STATE_KEY).await.unwrap(), Some(at(1)));
}

#[tokio::test]
async fn test_child_rows_tied_with_a_failed_row_are_reoffered() {
    let h = harness(CheckpointKeying::PerTable, 1);
    let indexed = h.catalog.add_film("Indexed", at(1));
    let rejected = h.catalog.add_film("Rejected", at(2));
    let mut genres = vec![
        h.catalog.add_genre("Drama", at(5)),
        h.catalog.add_genre("Comedy", at(5)),
    ];
    genres.sort();
    h.catalog.link_genre(indexed, genres[0]);
    h.catalog.link_genre(rejected, genres[1]);
    h.provider.reject(rejected);

    h.orchestrator.sweep().await.unwrap();

    let genre_key = per_table_key(TrackedTable::Genre);
    assert_eq!(h.store.get(&genre_key).await.unwrap(), None);

    h.provider.accept_all();
    h.orchestrator.sweep().await.unwrap();

    let batches = h.provider.batches();
    assert_eq!(batches[batches.len() - 2..], [vec![indexed], vec![rejected]]);
    assert_eq!(h.store.get(&genre_key).await.unwrap(), Some(at(5)));
    assert_eq!(
        h.store.get(&per_table_key(TrackedTable::FilmWork)).await.unwrap(),
        Some(at(2))
    );
}

#[tokio::test]
async fn test_timestamp_group_across_pages_is_saved_once_drained() {
    let h = harness(CheckpointKeying::Shared, 2);
    for title in ["A", "B", "C"] {
        h.catalog.add_film(title, at(1));
    }
    h.catalog.add_film("D", at(2));

    let stats = h.orchestrator.sweep().await.unwrap();

    assert_eq!(stats.pages_extracted, 2);
    // The first page ends inside the at(1) group, so only the last candidate is saved.
    assert_eq!(stats.checkpoints_saved, 1);
    assert_eq!(h.store.get(DEFAULT_STATE_KEY).await.unwrap(), Some(at(2)));
}

#[tokio::test]
async fn test_checkpoint_keying_modes() {
    let shared = harness(CheckpointKeying::Shared, 100);
    let per_table = harness(CheckpointKeying::PerTable, 100);

    for h in [&shared, &per_table] {
        let film = h.catalog.add_film("Star Trek", at(3));
        let genre = h.catalog.add_genre("Drama", at(4));
        let person = h.catalog.add_person("Ann", at(5));
        h.catalog.link_genre(film, genre);
        h.catalog.link_person(film, person, Role::Writer);
        h.orchestrator.sweep().await.unwrap();
    }

    let shared_keys = shared.store.snapshot().await;
    assert_eq!(shared_keys.len(), 1);
    assert_eq!(shared_keys[DEFAULT_STATE_KEY], at(5));

    let per_table_keys = per_table.store.snapshot().await;
    assert_eq!(per_table_keys.len(), 3);
    assert_eq!(per_table_keys[&per_table_key(TrackedTable::FilmWork)], at(3));
    assert_eq!(per_table_keys[&per_table_key(TrackedTable::Genre)], at(4));
    assert_eq!(per_table_keys[&per_table_key(TrackedTable::Person)], at(5));
}

#[tokio::test]
async fn test_watermark_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    let catalog = Arc::new(MockCatalog::default());
    let provider = Arc::new(MockSearchProvider::default());
    let film = catalog.add_film("Star Trek", at(1));

    for _ in 0..2 {
        let store = JsonFileCheckpointStore::open(&path).await.unwrap();
        let orchestrator = build_pipeline(
            catalog.clone(),
            provider.clone(),
            Arc::new(store),
            WatermarkKeys::new(DEFAULT_STATE_KEY, CheckpointKeying::Shared),
            100,
            OrchestratorConfig::default(),
        );
        orchestrator.sweep().await.unwrap();
    }

    assert_eq!(provider.batches(), vec![vec![film]]);
    let reopened = JsonFileCheckpointStore::open(&path).await.unwrap();
    assert_eq!(reopened.get(DEFAULT_STATE_KEY).await.unwrap(), Some(at(1)));
}

#[tokio::test]
async fn test_malformed_row_fails_the_sweep() {
    let h = harness(CheckpointKeying::Shared, 100);
    let film = h.catalog.add_film("Pilot", at(1));
    h.catalog.malformed.lock().unwrap().insert(film);

    let err = h.orchestrator.sweep().await.unwrap_err();

    assert!(matches!(err, IngestError::CatalogError(CatalogError::InvalidRow(_))));
    assert!(!err.is_transient());
    assert_eq!(h.orchestrator.state(), OrchestratorState::Idle);
    assert_eq!(h.store.get(DEFAULT_STATE_KEY).await.unwrap(), None);
}

#[tokio::test]
async fn test_state_transitions() {
    let h = harness(CheckpointKeying::Shared, 100);
    let mut states = h.orchestrator.subscribe();
    assert_eq!(h.orchestrator.state(), OrchestratorState::Idle);

    h.orchestrator.sweep().await.unwrap();

    assert!(states.has_changed().unwrap());
    assert_eq!(*states.borrow_and_update(), OrchestratorState::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_retry_budget_exhaustion_is_fatal() {
    let h = harness_with(
        CheckpointKeying::Shared,
        100,
        OrchestratorConfig {
            refresh_interval: Duration::from_secs(10),
            retry_delay: Duration::from_secs(10),
            max_attempts: 3,
        },
    );
    h.catalog.fail_next(usize::MAX);

    let err = h.orchestrator.run().await.unwrap_err();

    match err {
        IngestError::RetryBudgetExhausted {
            attempts,
            last_error,
        } => {
            assert_eq!(attempts, 3);
            assert!(last_error.is_transient());
        }
        other => panic!("unexpected error: {}", other),
    }
    assert_eq!(h.catalog.changed_rows_calls.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn test_transient_failures_are_retried() {
    let h = harness_with(
        CheckpointKeying::Shared,
        100,
        OrchestratorConfig {
            refresh_interval: Duration::from_secs(10),
            retry_delay: Duration::from_secs(10),
            max_attempts: 3,
        },
    );
    let film = h.catalog.add_film("Star Trek", at(1));
    h.catalog.fail_next(2);

    // run() only returns on a fatal error; still running at the deadline means it recovered.
    let outcome = timeout(Duration::from_secs(600), h.orchestrator.run()).await;

    assert!(outcome.is_err());
    assert!(h.provider.document(film).is_some());
    assert_eq!(h.provider.batches().len(), 1);
    assert_eq!(h.store.get(DEFAULT_STATE_KEY).await.unwrap(), Some(at(1)));
}
