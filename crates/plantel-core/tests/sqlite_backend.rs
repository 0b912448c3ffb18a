//! `SqliteBackend` against an in-memory database.

// Integration tests have relaxed clippy settings for test ergonomics.
// Production code (src/) must use strict zero-unwrap/panic patterns.
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::uninlined_format_args
)]

use std::{collections::BTreeMap, sync::Arc};

use chrono::Utc;
use plantel_core::{
    domain::{
        BatchDraft, FlockIndex, IndividualGateway, IndividualRecord, RingAttributes, RingChange,
        RingCodeUpdate, RingFilter, RingGateway, UnitOfWork, WorkUnit,
    },
    storage::SqliteBackend,
    BoundRingPolicy, Individual, IndividualId, InventoryConfig, InventoryError, RepositoryError,
    RingCode, RingId, RingInventoryStore, RingItem, RingSize, RingStatusKind,
};
use sqlx::sqlite::SqlitePoolOptions;

async fn backend() -> Arc<SqliteBackend> {
    // One connection keeps the in-memory database alive for the whole test
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("open in-memory database");
    let backend = SqliteBackend::new(pool);
    backend.init().await.expect("schema");
    Arc::new(backend)
}

fn id(s: &str) -> IndividualId {
    IndividualId::parse(s).expect("valid id")
}

fn code(s: &str) -> RingCode {
    RingCode::parse(s).expect("valid code")
}

fn ring(code_str: &str, species: Option<&str>, year: Option<u16>) -> RingItem {
    RingItem::new(
        RingId::generate(),
        code(code_str),
        None,
        RingAttributes {
            species: species.map(ToString::to_string),
            year,
            state: Some("SP".to_string()),
            color: Some("azul".to_string()),
            size_mm: Some(RingSize::from_tenths(25)),
            personalization: None,
        },
        Utc::now(),
    )
}

// =============================================================================
// INDIVIDUALS
// =============================================================================

#[tokio::test]
async fn test_individual_round_trip_keeps_lineage() {
    let db = backend().await;
    let bird = Individual::from_record(IndividualRecord {
        id: "bird-1".to_string(),
        name: "Filhote".to_string(),
        father_link_id: Some("sire-1".to_string()),
        manual_ancestors: BTreeMap::from([
            ("m".to_string(), "Canária".to_string()),
            ("ff".to_string(), "Avô".to_string()),
            ("mmf".to_string(), "Bisavô".to_string()),
        ]),
        ring_code: Some("A-001".to_string()),
        ..IndividualRecord::default()
    })
    .expect("valid record");

    db.save(&bird).await.expect("save");
    let loaded = db.get_by_id(&id("bird-1")).await.expect("load");

    assert_eq!(loaded, bird);
}

#[tokio::test]
async fn test_save_replaces_removed_ancestors() {
    let db = backend().await;
    let with_entry = Individual::from_record(IndividualRecord {
        id: "bird-1".to_string(),
        manual_ancestors: BTreeMap::from([("ff".to_string(), "Avô".to_string())]),
        ..IndividualRecord::default()
    })
    .expect("valid record");
    db.save(&with_entry).await.expect("save");

    let cleared = Individual::new(id("bird-1"), "Renomeado");
    db.save(&cleared).await.expect("save");

    let loaded = db.get_by_id(&id("bird-1")).await.expect("load");
    assert_eq!(loaded, cleared);
    assert!(loaded.manual_ancestors().is_empty());
}

#[tokio::test]
async fn test_lineage_save_keeps_stored_ring_code() {
    let db = backend().await;
    let bird = Individual::new(id("bird-1"), "Filhote");
    db.save(&bird).await.expect("save");
    let r = ring("A-001", None, None);
    db.create(&r).await.expect("create");
    db.commit(WorkUnit {
        ring: RingChange::Update {
            ring: r.bind(&bird, Utc::now()).expect("bind"),
            expected: RingStatusKind::Estoque,
        },
        ring_code: Some(RingCodeUpdate {
            individual: id("bird-1"),
            code: Some(r.code.clone()),
        }),
    })
    .await
    .expect("commit");

    let renamed = Individual::from_record(IndividualRecord {
        id: "bird-1".to_string(),
        name: "Renomeado".to_string(),
        mother_link_id: Some("dam-1".to_string()),
        ..IndividualRecord::default()
    })
    .expect("valid record");
    let saved = db.save_lineage(&renamed).await.expect("save lineage");

    let loaded = db.get_by_id(&id("bird-1")).await.expect("load");
    assert_eq!(loaded.ring_code(), Some(&code("A-001")));
    assert_eq!(loaded.name(), "Renomeado");
    assert_eq!(loaded.mother_link_id(), Some(&id("dam-1")));
    assert_eq!(saved, loaded);
}

#[tokio::test]
async fn test_lineage_save_creates_new_individual() {
    let db = backend().await;
    let bird = Individual::new(id("bird-1"), "Filhote");

    let saved = db.save_lineage(&bird).await.expect("save lineage");

    assert_eq!(saved, bird);
    assert_eq!(db.get_by_id(&id("bird-1")).await.expect("load"), bird);
}

#[tokio::test]
async fn test_missing_individual_is_not_found() {
    let db = backend().await;

    let result = db.get_by_id(&id("ghost")).await;

    assert!(matches!(result, Err(RepositoryError::NotFound(_))));
    assert!(!db.exists(&id("ghost")).await.expect("exists"));
}

// =============================================================================
// RINGS
// =============================================================================

#[tokio::test]
async fn test_ring_round_trip_in_every_status() {
    let db = backend().await;
    let bird = Individual::new(id("bird-1"), "Amarelo");
    let now = Utc::now();

    let in_stock = ring("001", Some("Serinus canaria"), Some(2026));
    let bound = ring("002", None, None).bind(&bird, now).expect("bind");
    let lost = ring("003", None, None)
        .bind(&bird, now)
        .and_then(|r| r.mark_lost("quebrada", now))
        .expect("lose");

    for r in [&in_stock, &bound, &lost] {
        db.create(r).await.expect("create");
        assert_eq!(&db.get(&r.id).await.expect("get"), r);
    }
}

#[tokio::test]
async fn test_update_is_guarded_by_status() {
    let db = backend().await;
    let r = ring("001", None, None);
    db.create(&r).await.expect("create");

    let stale = db.update(&r, RingStatusKind::Usada).await;
    assert!(matches!(stale, Err(RepositoryError::ConcurrentModification(_))));

    let missing = db
        .update(&ring("002", None, None), RingStatusKind::Estoque)
        .await;
    assert!(matches!(missing, Err(RepositoryError::NotFound(_))));

    assert!(db.update(&r, RingStatusKind::Estoque).await.is_ok());
}

#[tokio::test]
async fn test_filter_by_status_year_and_species() {
    let db = backend().await;
    let bird = Individual::new(id("bird-1"), "Amarelo");
    db.create(&ring("003", Some("Serinus canaria"), Some(2025)))
        .await
        .expect("create");
    db.create(&ring("001", Some(" Serinus Canaria "), Some(2026)))
        .await
        .expect("create");
    db.create(
        &ring("002", Some("Carduelis"), Some(2026))
            .bind(&bird, Utc::now())
            .expect("bind"),
    )
    .await
    .expect("create");

    let codes = |rings: Vec<RingItem>| -> Vec<String> {
        rings.into_iter().map(|r| r.code.into_string()).collect()
    };

    let all = db.list_by_filter(&RingFilter::default()).await.expect("list");
    assert_eq!(codes(all), ["001", "002", "003"]);

    let canaries = db
        .list_by_filter(&RingFilter::default().with_species("serinus canaria"))
        .await
        .expect("list");
    assert_eq!(codes(canaries), ["001", "003"]);

    let stock_2026 = db
        .list_by_filter(
            &RingFilter::default()
                .with_status(RingStatusKind::Estoque)
                .with_year(2026),
        )
        .await
        .expect("list");
    assert_eq!(codes(stock_2026), ["001"]);
}

#[tokio::test]
async fn test_commit_with_missing_individual_rolls_back() {
    let db = backend().await;
    let r = ring("A-001", None, None);
    db.create(&r).await.expect("create");
    let ghost = Individual::new(id("ghost"), "Fantasma");

    let result = db
        .commit(WorkUnit {
            ring: RingChange::Update {
                ring: r.bind(&ghost, Utc::now()).expect("bind"),
                expected: RingStatusKind::Estoque,
            },
            ring_code: Some(RingCodeUpdate {
                individual: id("ghost"),
                code: Some(r.code.clone()),
            }),
        })
        .await;

    assert!(matches!(result, Err(RepositoryError::NotFound(_))));
    assert_eq!(db.get(&r.id).await.expect("get").kind(), RingStatusKind::Estoque);
}

// =============================================================================
// STORE OVER SQLITE
// =============================================================================

#[tokio::test]
async fn test_batch_and_bind_through_store() {
    let db = backend().await;
    db.save(&Individual::new(id("bird-42"), "Amarelo"))
        .await
        .expect("save");
    let store = RingInventoryStore::new(Arc::clone(&db), InventoryConfig::default());

    let registration = store
        .register_batch(BatchDraft {
            supplier: "Anilhas Brasil".to_string(),
            year: Some(2026),
            state: "SP".to_string(),
            color: "vermelha".to_string(),
            size_mm: Some(RingSize::from_tenths(25)),
            start_number: Some("007".to_string()),
            end_number: Some("010".to_string()),
            engraving_type: "laser".to_string(),
            ..BatchDraft::default()
        })
        .await
        .expect("register");
    assert_eq!(
        db.get_batch(&registration.batch.id).await.expect("batch"),
        registration.batch
    );
    assert_eq!(db.list_batches().await.expect("batches").len(), 1);

    let first = &registration.items[0];
    store
        .binding()
        .bind(&first.id, &id("bird-42"))
        .await
        .expect("bind");

    let stored = db.get(&first.id).await.expect("ring");
    assert_eq!(stored.assigned_bird_id(), Some(&id("bird-42")));
    assert_eq!(
        db.get_by_id(&id("bird-42")).await.expect("bird").ring_code(),
        Some(&code("007"))
    );

    let again = store.binding().bind(&first.id, &id("bird-42")).await;
    assert!(matches!(again, Err(InventoryError::RingNotAvailable { .. })));
}

#[tokio::test]
async fn test_cascade_delete_through_store() {
    let db = backend().await;
    db.save(&Individual::new(id("bird-42"), "Amarelo"))
        .await
        .expect("save");
    let store = RingInventoryStore::new(
        Arc::clone(&db),
        InventoryConfig {
            bound_ring_policy: BoundRingPolicy::Cascade,
            ..InventoryConfig::default()
        },
    );
    let r = ring("A-001", None, None);
    db.create(&r).await.expect("create");
    store.binding().bind(&r.id, &id("bird-42")).await.expect("bind");

    store.delete(&r.id).await.expect("delete");

    assert!(matches!(
        db.get(&r.id).await,
        Err(RepositoryError::NotFound(_))
    ));
    assert_eq!(db.get_by_id(&id("bird-42")).await.expect("bird").ring_code(), None);
}
