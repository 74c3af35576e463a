//! MongoDB repository tests against a real server
//!
//! Each test starts its own container, so they need Docker:
//! `cargo test -p domain_users -- --ignored`

use domain_users::*;
use ::mongodb::bson::{Document, doc};
use test_utils::{TestDataBuilder, TestMongo};

async fn repository(mongo: &TestMongo, test_name: &str) -> MongoUserRepository {
    let builder = TestDataBuilder::from_test_name(test_name);
    let repo = MongoUserRepository::new(mongo.database(&builder.name("db", "users")));
    repo.init_indexes().await.unwrap();
    repo
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_mongo_create_get_list_in_insertion_order() {
    let mongo = TestMongo::new().await;
    let repo = repository(&mongo, "mongo_create_get").await;

    for id in [3, 1, 2] {
        repo.create(User::new(id, format!("u{id}@x.com"), format!("u{id}")))
            .await
            .unwrap();
    }

    let fetched = repo.get_by_id(1).await.unwrap().unwrap();
    assert_eq!(fetched, User::new(1, "u1@x.com", "u1"));

    let ids: Vec<i64> = repo.list().await.unwrap().into_iter().map(|u| u.id).collect();
    assert_eq!(ids, vec![3, 1, 2]);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_mongo_unique_index_maps_to_conflict() {
    let mongo = TestMongo::new().await;
    let repo = repository(&mongo, "mongo_conflict").await;

    repo.create(User::new(1, "a@x.com", "a")).await.unwrap();

    // Bypass the service pre-check to hit the index directly
    let result = repo.create(User::new(1, "b@x.com", "b")).await;
    assert!(matches!(result, Err(UserError::Conflict(1))));

    let stored = repo.get_by_id(1).await.unwrap().unwrap();
    assert_eq!(stored.email, "a@x.com");
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_mongo_init_indexes_is_idempotent() {
    let mongo = TestMongo::new().await;
    let repo = repository(&mongo, "mongo_indexes").await;

    repo.init_indexes().await.unwrap();
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_mongo_random_update_delete() {
    let mongo = TestMongo::new().await;
    let repo = repository(&mongo, "mongo_random_update_delete").await;

    assert!(repo.get_random().await.unwrap().is_none());

    repo.create(User::new(1, "a@x.com", "a")).await.unwrap();
    repo.create(User::new(2, "b@x.com", "b")).await.unwrap();

    let picked = repo.get_random().await.unwrap().unwrap();
    assert!([1, 2].contains(&picked.id));

    let updated = repo
        .update(
            1,
            UpdateUser {
                username: Some("renamed".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated, User::new(1, "a@x.com", "renamed"));

    assert!(matches!(
        repo.update(99, UpdateUser::default()).await,
        Err(UserError::NotFound(99))
    ));

    let deleted = repo.delete(2).await.unwrap();
    assert_eq!(deleted.id, 2);
    assert!(!repo.exists(2).await.unwrap());
    assert!(matches!(repo.delete(2).await, Err(UserError::NotFound(2))));
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_mongo_service_end_to_end() {
    let mongo = TestMongo::new().await;
    let service = UserService::new(repository(&mongo, "mongo_service").await);
    let builder = TestDataBuilder::from_test_name("mongo_service");
    let id = builder.user_id();

    let created = service
        .create_user(CreateUser {
            id: UserIdInput::from(id),
            email: builder.email("first"),
            username: builder.username("first"),
        })
        .await
        .unwrap();
    assert_eq!(created.id, id);

    let dup = service
        .create_user(CreateUser {
            id: UserIdInput::from(id),
            email: builder.email("second"),
            username: builder.username("second"),
        })
        .await;
    assert!(matches!(dup, Err(UserError::Conflict(dup_id)) if dup_id == id));

    assert_eq!(service.get_random_user().await.unwrap(), created);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_mongo_reads_documents_without_timestamps() {
    let mongo = TestMongo::new().await;
    let repo = repository(&mongo, "mongo_legacy_docs").await;

    repo.collection()
        .clone_with_type::<Document>()
        .insert_one(doc! { "id": 7_i64, "email": "old@x.com", "username": "old", "__v": 0 })
        .await
        .unwrap();

    assert_eq!(repo.list().await.unwrap(), vec![User::new(7, "old@x.com", "old")]);

    let updated = repo
        .update(
            7,
            UpdateUser {
                email: Some("new@x.com".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated, User::new(7, "new@x.com", "old"));
}
