//! Integration tests for the store engine.
//!
//! Every scenario runs against the in-memory backend, which implements
//! the full backend contract, so these tests exercise the whole path:
//! criteria → compiler → backend execution → normalization.
//!
//! # Test Organization
//! - `lifecycle_*` - Store creation, deletion, schema persistence
//! - `query_*` - Filters, sorting, pagination, projection
//! - `bucket_*` - Terms aggregations

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use store_engine::schema::{CreateStoreSettings, Field};
use store_engine::{
    Cluster, ClusterConfig, Comparator, DocumentRegistry, MemoryBackend, QueryCriteria,
    StoreError, StoredDocument,
};

// =============================================================================
// Fixtures
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Person {
    id: String,
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    last_name: String,
    #[serde(default)]
    age: i64,
}

impl StoredDocument for Person {
    const TYPE_NAME: &'static str = "person";

    fn id(&self) -> String {
        self.id.clone()
    }

    fn schema_fields() -> Vec<Field> {
        vec![
            Field::text("first_name"),
            Field::text("last_name").with_label("Last name"),
            Field::integer("age"),
        ]
    }
}

fn registry() -> Arc<DocumentRegistry> {
    let mut registry = DocumentRegistry::new();
    registry.register::<Person>();
    Arc::new(registry)
}

async fn cluster() -> Cluster {
    Cluster::connect(
        ClusterConfig::new("app"),
        Arc::new(MemoryBackend::new()),
        registry(),
    )
    .await
    .expect("connect failed")
}

/// 100 people: ids 0..100, last names cycling through five surnames
/// (20 each), ages 0..100.
fn hundred_people() -> Vec<Person> {
    const SURNAMES: [&str; 5] = ["Smith", "Jones", "Taylor", "Brown", "Wilson"];
    (0..100)
        .map(|i| Person {
            id: i.to_string(),
            first_name: format!("First{i}"),
            last_name: SURNAMES[i % SURNAMES.len()].to_string(),
            age: i as i64,
        })
        .collect()
}

async fn seeded_cluster() -> Cluster {
    let cluster = cluster().await;
    cluster
        .create_store(CreateStoreSettings::for_type("person"))
        .await
        .expect("create failed");
    let response = cluster
        .commit("app_person", &hundred_people())
        .await
        .expect("commit failed");
    assert!(response.errors.is_empty());
    cluster
}

// =============================================================================
// Lifecycle
// =============================================================================

#[tokio::test]
async fn lifecycle_create_commit_and_count() {
    let cluster = seeded_cluster().await;

    let result = cluster
        .search(QueryCriteria::for_type("person").take(0))
        .await
        .unwrap();
    assert_eq!(result.total, 100);
}

#[tokio::test]
async fn lifecycle_delete_unknown_store_is_not_found() {
    let cluster = seeded_cluster().await;
    let before = cluster.store_count();

    let result = cluster.delete_store("app_nope").await;
    assert!(matches!(result, Err(StoreError::StoreNotFound(_))));
    assert_eq!(cluster.store_count(), before);
}

#[tokio::test]
async fn lifecycle_schema_label_survives_save_and_reload() {
    let cluster = seeded_cluster().await;

    let mut schema = cluster.get_store_schema("app_person").await.unwrap();
    let field = schema
        .fields
        .iter_mut()
        .find(|f| f.name == "last_name")
        .unwrap();
    field.label = Some("Surname".into());
    cluster
        .save_store_schema("app_person", schema)
        .await
        .unwrap();

    // Visible through the cache without a restart.
    let reloaded = cluster.get_store_schema("app_person").await.unwrap();
    let label = reloaded
        .fields
        .iter()
        .find(|f| f.name == "last_name")
        .and_then(|f| f.label.clone());
    assert_eq!(label.as_deref(), Some("Surname"));
}

#[tokio::test]
async fn lifecycle_schema_survives_reconnect() {
    let backend = Arc::new(MemoryBackend::new());
    {
        let cluster = Cluster::connect(ClusterConfig::new("app"), backend.clone(), registry())
            .await
            .unwrap();
        let store = cluster
            .create_store(CreateStoreSettings::for_type("person"))
            .await
            .unwrap();
        let mut schema = store.schema.clone();
        schema.object_label = Some("Person".into());
        cluster
            .save_store_schema("app_person", schema)
            .await
            .unwrap();
    }

    let cluster = Cluster::connect(ClusterConfig::new("app"), backend, registry())
        .await
        .unwrap();
    let schema = cluster.get_store_schema("app_person").await.unwrap();
    assert_eq!(schema.object_label.as_deref(), Some("Person"));
}

#[tokio::test]
async fn lifecycle_eager_persist_reconciles_schema() {
    let cluster = cluster().await;
    let store = cluster
        .create_store(CreateStoreSettings::for_type("person").with_eager_persist(true))
        .await
        .unwrap();
    // The reconciled schema still names every declared field.
    assert!(store.schema.fields.iter().any(|f| f.name == "last_name"));
    assert!(store.schema.fields.iter().any(|f| f.name == "age"));
}

// =============================================================================
// Queries
// =============================================================================

#[tokio::test]
async fn query_equal_filter_returns_only_matching_documents() {
    let cluster = seeded_cluster().await;

    let result = cluster
        .search(
            QueryCriteria::for_type("person")
                .filter("last_name", Comparator::Equal, "Smith")
                .return_field("last_name")
                .take(100),
        )
        .await
        .unwrap();

    assert_eq!(result.total, 20);
    assert!(!result.documents.is_empty());
    for doc in &result.documents {
        let value = doc.to_value().unwrap();
        assert_eq!(value["last_name"], "Smith");
    }
}

#[tokio::test]
async fn query_between_is_inclusive_on_both_bounds() {
    let cluster = seeded_cluster().await;

    let result = cluster
        .search(
            QueryCriteria::for_type("person")
                .filter("age", Comparator::Between, "5|||50")
                .take(0),
        )
        .await
        .unwrap();

    // Ages 5..=50 inclusive.
    assert_eq!(result.total, 46);
}

#[tokio::test]
async fn query_between_without_delimiter_is_rejected() {
    let cluster = seeded_cluster().await;

    let result = cluster
        .search(QueryCriteria::for_type("person").filter("age", Comparator::Between, "5-50"))
        .await;
    assert!(matches!(result, Err(StoreError::MalformedRangeValue(_))));
}

#[tokio::test]
async fn query_range_on_text_field_is_rejected() {
    let cluster = seeded_cluster().await;

    let result = cluster
        .search(
            QueryCriteria::for_type("person").filter("last_name", Comparator::GreaterThan, "M"),
        )
        .await;
    assert!(matches!(
        result,
        Err(StoreError::UnsupportedComparator { .. })
    ));
}

#[tokio::test]
async fn query_conjunction_of_filters() {
    let cluster = seeded_cluster().await;

    let result = cluster
        .search(
            QueryCriteria::for_type("person")
                .filter("last_name", Comparator::Equal, "Smith")
                .filter("age", Comparator::LessThan, "25")
                .take(100),
        )
        .await
        .unwrap();

    // Smiths have ages 0, 5, 10, ..., 95; five of them are under 25.
    assert_eq!(result.total, 5);
}

#[tokio::test]
async fn query_any_word_matches_any_token() {
    let cluster = seeded_cluster().await;

    let result = cluster
        .search(
            QueryCriteria::for_type("person")
                .filter("last_name", Comparator::AnyWord, "Smith Jones")
                .take(0),
        )
        .await
        .unwrap();
    assert_eq!(result.total, 40);
}

#[tokio::test]
async fn query_not_any_word_excludes_tokens() {
    let cluster = seeded_cluster().await;

    let result = cluster
        .search(
            QueryCriteria::for_type("person")
                .filter("last_name", Comparator::NotAnyWord, "Smith Jones")
                .take(0),
        )
        .await
        .unwrap();
    assert_eq!(result.total, 60);
}

#[tokio::test]
async fn query_pagination_defaults_to_ten() {
    let cluster = seeded_cluster().await;

    let result = cluster
        .search(QueryCriteria::for_type("person"))
        .await
        .unwrap();
    assert_eq!(result.total, 100);
    assert_eq!(result.documents.len(), 10);
}

#[tokio::test]
async fn query_sort_descending_by_age() {
    let cluster = seeded_cluster().await;

    let result = cluster
        .search(
            QueryCriteria::for_type("person")
                .sort("age", false)
                .return_field("age")
                .take(3),
        )
        .await
        .unwrap();

    let ages: Vec<i64> = result
        .documents
        .iter()
        .map(|d| d.to_value().unwrap()["age"].as_i64().unwrap())
        .collect();
    assert_eq!(ages, vec![99, 98, 97]);
}

#[tokio::test]
async fn query_sort_on_text_field_ignores_case() {
    let cluster = cluster().await;
    cluster
        .create_store(CreateStoreSettings::for_type("person"))
        .await
        .expect("create failed");

    let people: Vec<Person> = ["Delta", "alpha", "carter", "Beta"]
        .iter()
        .enumerate()
        .map(|(i, surname)| Person {
            id: i.to_string(),
            first_name: String::new(),
            last_name: surname.to_string(),
            age: i as i64,
        })
        .collect();
    cluster
        .commit("app_person", &people)
        .await
        .expect("commit failed");

    let result = cluster
        .search(
            QueryCriteria::for_type("person")
                .sort("last_name", true)
                .return_field("last_name"),
        )
        .await
        .unwrap();

    let surnames: Vec<String> = result
        .documents
        .iter()
        .map(|d| d.to_value().unwrap()["last_name"].as_str().unwrap().to_string())
        .collect();
    // Case-folded order, not byte order (which would put "Delta" before
    // "alpha").
    assert_eq!(surnames, vec!["alpha", "Beta", "carter", "Delta"]);
}

#[tokio::test]
async fn query_default_projection_omits_unrequested_fields() {
    let cluster = seeded_cluster().await;

    let result = cluster
        .search(QueryCriteria::for_type("person").take(1))
        .await
        .unwrap();

    let value = result.documents[0].to_value().unwrap();
    // Only the always-returned envelope made it through, so the decoded
    // document has serde defaults everywhere else.
    assert_eq!(value["last_name"], "");
}

#[tokio::test]
async fn query_unknown_type_finds_no_stores() {
    let cluster = seeded_cluster().await;

    let result = cluster
        .search(QueryCriteria::for_type("widget"))
        .await
        .unwrap();
    assert_eq!(result.total, 0);
    assert!(result.documents.is_empty());
}

// =============================================================================
// Buckets
// =============================================================================

#[tokio::test]
async fn bucket_counts_match_committed_documents() {
    let cluster = seeded_cluster().await;

    let result = cluster
        .search(
            QueryCriteria::for_type("person")
                .bucket("last_name")
                .take(0),
        )
        .await
        .unwrap();

    assert_eq!(result.buckets.len(), 5);
    for bucket in &result.buckets {
        assert_eq!(bucket.field, "last_name");
        assert_eq!(bucket.count, 20);
        assert!(bucket.count >= 2);
    }
}

#[tokio::test]
async fn bucket_singletons_are_suppressed() {
    let cluster = seeded_cluster().await;
    // One extra person with a unique surname.
    cluster
        .commit(
            "app_person",
            &[Person {
                id: "solo".into(),
                first_name: "Only".into(),
                last_name: "Zeta".into(),
                age: 33,
            }],
        )
        .await
        .unwrap();

    let result = cluster
        .search(
            QueryCriteria::for_type("person")
                .bucket("last_name")
                .take(0),
        )
        .await
        .unwrap();

    assert!(result.buckets.iter().all(|b| b.count >= 2));
    assert!(!result.buckets.iter().any(|b| b.value == "Zeta"));
}

#[tokio::test]
async fn bucket_reserved_field_name_round_trips() {
    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct Event {
        id: String,
        #[serde(default)]
        count: i64,
    }
    impl StoredDocument for Event {
        const TYPE_NAME: &'static str = "event";
        fn id(&self) -> String {
            self.id.clone()
        }
        fn schema_fields() -> Vec<Field> {
            vec![Field::integer("count")]
        }
    }

    let mut registry = DocumentRegistry::new();
    registry.register::<Event>();
    let cluster = Cluster::connect(
        ClusterConfig::new("app"),
        Arc::new(MemoryBackend::new()),
        Arc::new(registry),
    )
    .await
    .unwrap();

    cluster
        .create_store(CreateStoreSettings::for_type("event"))
        .await
        .unwrap();
    let events: Vec<Event> = (0..6)
        .map(|i| Event {
            id: i.to_string(),
            count: (i % 2) as i64,
        })
        .collect();
    cluster.commit("app_event", &events).await.unwrap();

    // "count" is reserved envelope vocabulary; the sentinel must be
    // invisible to the caller.
    let result = cluster
        .search(QueryCriteria::for_type("event").bucket("count").take(0))
        .await
        .unwrap();

    assert_eq!(result.buckets.len(), 2);
    for bucket in &result.buckets {
        assert_eq!(bucket.field, "count");
        assert_eq!(bucket.count, 3);
    }
}
