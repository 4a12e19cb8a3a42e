use hybrid_recall::config::Config;
use hybrid_recall::memory::{
    InMemoryTripletStore, RelationMapBuilder, SqliteTripletStore, Triplet, TripletStore,
};
use std::path::PathBuf;
use std::sync::Arc;

async fn seeded(store: &dyn TripletStore) {
    store.add_triplet("myself", "is a", "robot").await.unwrap();
    store.add_triplet("robot", "has", "sensors").await.unwrap();
    store.add_triplet("robot", "can", "move").await.unwrap();
}

#[tokio::test]
async fn relation_map_over_sqlite_store() {
    hybrid_recall::telemetry::init("debug");
    let store = Arc::new(SqliteTripletStore::connect("sqlite::memory:").await.unwrap());
    seeded(store.as_ref()).await;

    let config = Config::load_from_str("", PathBuf::from(".")).unwrap();
    let builder = RelationMapBuilder::new(store);
    let map = builder
        .build(
            &["myself", "robot"],
            config.relation_map.depth,
            config.relation_map.limit,
        )
        .await
        .unwrap();

    assert_eq!(map.len(), 2);
    assert_eq!(
        map.get("myself").unwrap(),
        &[
            Triplet::new("myself", "is a", "robot"),
            Triplet::new("robot", "has", "sensors"),
            Triplet::new("robot", "can", "move"),
        ][..]
    );
    assert_eq!(map.get("robot").unwrap().len(), 2);
}

#[tokio::test]
async fn sqlite_and_memory_stores_agree() {
    let sqlite = Arc::new(SqliteTripletStore::connect("sqlite::memory:").await.unwrap());
    let memory = Arc::new(InMemoryTripletStore::new());
    let stores: [Arc<dyn TripletStore>; 2] = [sqlite.clone(), memory.clone()];
    for store in stores {
        seeded(store.as_ref()).await;
        store.add_triplet("sensors", "detect", "light").await.unwrap();
        store.add_triplet("light", "reaches", "myself").await.unwrap();
    }

    for depth in 0..5 {
        for limit in [1, 2, 4, 30] {
            let from_sqlite = RelationMapBuilder::new(sqlite.clone())
                .build(&["myself", "sensors"], depth, limit)
                .await
                .unwrap();
            let from_memory = RelationMapBuilder::new(memory.clone())
                .build(&["myself", "sensors"], depth, limit)
                .await
                .unwrap();

            assert_eq!(from_sqlite, from_memory, "depth={depth} limit={limit}");
            assert!(from_sqlite.total() <= limit);
        }
    }
}

#[tokio::test]
async fn deleted_facts_drop_out_of_traversal() {
    let store = Arc::new(SqliteTripletStore::connect("sqlite::memory:").await.unwrap());
    seeded(store.as_ref()).await;
    store.delete_triplet("myself", "is a", "robot").await.unwrap();

    assert!(store.neighbors("myself").await.unwrap().is_empty());

    let map = RelationMapBuilder::new(store)
        .build(&["myself"], 3, 30)
        .await
        .unwrap();
    assert_eq!(map.get("myself").unwrap().len(), 0);
}

#[tokio::test]
async fn sqlite_store_persists_across_connections() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}", dir.path().join("facts.db").display());

    {
        let store = SqliteTripletStore::connect(&url).await.unwrap();
        seeded(&store).await;
        store.pool().close().await;
    }

    let reopened = SqliteTripletStore::connect(&url).await.unwrap();
    assert_eq!(reopened.count().await.unwrap(), 3);
    assert_eq!(reopened.neighbors("robot").await.unwrap().len(), 2);
}
