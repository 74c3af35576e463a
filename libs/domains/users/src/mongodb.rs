//! MongoDB implementation of UserRepository

use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::{
    Collection, Database, IndexModel,
    bson::{DateTime, Document, doc, from_document},
    options::{IndexOptions, ReturnDocument},
};
use tracing::instrument;

use crate::error::{UserError, UserResult, is_duplicate_key};
use crate::models::{UpdateUser, User, UserDocument};
use crate::repository::UserRepository;

/// Collection used when none is configured
pub const DEFAULT_COLLECTION: &str = "users";

const ID_INDEX_NAME: &str = "users_id_unique";

/// MongoDB implementation of the UserRepository
#[derive(Clone)]
pub struct MongoUserRepository {
    collection: Collection<UserDocument>,
}

impl MongoUserRepository {
    /// Create a new MongoUserRepository on the `users` collection
    ///
    /// # Example
    /// ```ignore
    /// let client = Client::with_uri_str("mongodb://localhost:27017").await?;
    /// let repo = MongoUserRepository::new(client.database("users"));
    /// repo.init_indexes().await?;
    /// ```
    pub fn new(db: Database) -> Self {
        Self::with_collection(db, DEFAULT_COLLECTION)
    }

    /// Create a new MongoUserRepository with a custom collection name
    pub fn with_collection(db: Database, collection_name: &str) -> Self {
        let collection = db.collection::<UserDocument>(collection_name);
        Self { collection }
    }

    /// Get the underlying collection for advanced operations
    pub fn collection(&self) -> &Collection<UserDocument> {
        &self.collection
    }

    /// Create the unique index on the business `id`.
    ///
    /// Idempotent; safe to call on every startup.
    #[instrument(skip(self), fields(collection = %self.collection.name()))]
    pub async fn init_indexes(&self) -> UserResult<()> {
        let index = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name(ID_INDEX_NAME.to_string())
                    .build(),
            )
            .build();

        self.collection.create_index(index).await?;
        tracing::info!("User indexes ensured");
        Ok(())
    }

    fn id_filter(id: i64) -> Document {
        doc! { "id": id }
    }

    /// `$set` document for the provided fields, always bumping `updated_at`
    fn build_update(input: &UpdateUser) -> Document {
        let mut set = doc! { "updated_at": DateTime::now() };

        if let Some(ref email) = input.email {
            set.insert("email", email);
        }

        if let Some(ref username) = input.username {
            set.insert("username", username);
        }

        doc! { "$set": set }
    }
}

#[async_trait]
impl UserRepository for MongoUserRepository {
    #[instrument(skip(self))]
    async fn list(&self) -> UserResult<Vec<User>> {
        // ObjectIds grow with insertion time
        let cursor = self.collection.find(doc! {}).sort(doc! { "_id": 1 }).await?;
        let docs: Vec<UserDocument> = cursor.try_collect().await?;

        Ok(docs.into_iter().map(User::from).collect())
    }

    #[instrument(skip(self))]
    async fn get_by_id(&self, id: i64) -> UserResult<Option<User>> {
        let doc = self.collection.find_one(Self::id_filter(id)).await?;
        Ok(doc.map(User::from))
    }

    #[instrument(skip(self))]
    async fn get_random(&self) -> UserResult<Option<User>> {
        let mut cursor = self
            .collection
            .aggregate([doc! { "$sample": { "size": 1 } }])
            .await?;

        match cursor.try_next().await? {
            Some(raw) => {
                let doc: UserDocument = from_document(raw)?;
                Ok(Some(doc.into()))
            }
            None => Ok(None),
        }
    }

    #[instrument(skip(self))]
    async fn exists(&self, id: i64) -> UserResult<bool> {
        let count = self
            .collection
            .count_documents(Self::id_filter(id))
            .limit(1)
            .await?;
        Ok(count > 0)
    }

    #[instrument(skip(self, user), fields(user_id = user.id))]
    async fn create(&self, user: User) -> UserResult<User> {
        let id = user.id;
        let doc = UserDocument::from(user);

        match self.collection.insert_one(&doc).await {
            Ok(_) => {
                tracing::info!(user_id = id, "User created successfully");
                Ok(doc.into())
            }
            Err(e) if is_duplicate_key(&e) => Err(UserError::Conflict(id)),
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self, input))]
    async fn update(&self, id: i64, input: UpdateUser) -> UserResult<User> {
        let updated = self
            .collection
            .find_one_and_update(Self::id_filter(id), Self::build_update(&input))
            .return_document(ReturnDocument::After)
            .await?
            .ok_or(UserError::NotFound(id))?;

        tracing::info!(user_id = id, "User updated successfully");
        Ok(updated.into())
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: i64) -> UserResult<User> {
        let deleted = self
            .collection
            .find_one_and_delete(Self::id_filter(id))
            .await?
            .ok_or(UserError::NotFound(id))?;

        tracing::info!(user_id = id, "User deleted successfully");
        Ok(deleted.into())
    }
}
