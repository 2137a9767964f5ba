//! `MongoDB` document store.

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{self, Bson, Document as BsonDocument, doc, oid::ObjectId};
use mongodb::error::{Error as MongoError, ErrorKind, WriteFailure};
use mongodb::options::{IndexOptions, ReturnDocument};
use mongodb::{Client, Collection, Database, IndexModel};
use petlife_core::UserId;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;

use super::{DocumentStore, RemovalTarget, StoreError, UpdatePlan, username_of};
use crate::models::{Document, fields};

/// Server error code for a unique index violation.
const DUPLICATE_KEY: i32 = 11000;

/// Document store backed by `MongoDB`.
///
/// Wraps a single driver [`Client`], which pools connections internally and
/// is shared by all requests.
#[derive(Debug, Clone)]
pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    /// Connect to `MongoDB` and select a database.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Transient` if the connection string is invalid.
    pub async fn connect(url: &SecretString, database: &str) -> Result<Self, StoreError> {
        let client = Client::with_uri_str(url.expose_secret())
            .await
            .map_err(|e| transient("connect", e))?;
        Ok(Self {
            db: client.database(database),
        })
    }

    /// Ensure the unique `username` index exists on each collection.
    ///
    /// Duplicate detection on insert relies on this index.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Transient` if an index cannot be created.
    pub async fn ensure_indexes(&self, collections: &[&str]) -> Result<(), StoreError> {
        for name in collections {
            let index = IndexModel::builder()
                .keys(doc! { "username": 1 })
                .options(IndexOptions::builder().unique(true).build())
                .build();
            self.collection(name)
                .create_index(index)
                .await
                .map_err(|e| transient("create_index", e))?;
            tracing::info!(collection = %name, "Username index ensured");
        }
        Ok(())
    }

    fn collection(&self, name: &str) -> Collection<BsonDocument> {
        self.db.collection(name)
    }

    /// `find_one_and_update` by id, returning the updated document without
    /// its password.
    async fn modify(
        &self,
        collection: &str,
        oid: ObjectId,
        update: BsonDocument,
    ) -> Result<Option<Document>, MongoError> {
        let updated = self
            .collection(collection)
            .find_one_and_update(doc! { "_id": oid }, update)
            .projection(hide_password())
            .return_document(ReturnDocument::After)
            .await?;
        Ok(updated.map(from_bson))
    }
}

fn hide_password() -> BsonDocument {
    doc! { "password": 0 }
}

fn parse_oid(id: &UserId) -> Result<ObjectId, StoreError> {
    ObjectId::try_from(id).map_err(|_| StoreError::NotFound(format!("invalid user id {id}")))
}

fn to_bson_document(doc: &Document) -> Result<BsonDocument, StoreError> {
    bson::to_document(doc).map_err(|e| StoreError::InvalidArgument(e.to_string()))
}

fn to_bson_value(value: &Value) -> Result<Bson, StoreError> {
    bson::to_bson(value).map_err(|e| StoreError::InvalidArgument(e.to_string()))
}

/// Convert a stored document to JSON, exposing `_id` as a hex string.
fn from_bson(mut doc: BsonDocument) -> Document {
    let id = doc.remove(fields::ID);
    doc.remove(fields::PASSWORD);

    let mut out = match Bson::Document(doc).into_relaxed_extjson() {
        Value::Object(map) => map,
        _ => Document::new(),
    };

    let id = match id {
        Some(Bson::ObjectId(oid)) => Value::String(oid.to_hex()),
        Some(other) => other.into_relaxed_extjson(),
        None => return out,
    };
    out.insert(fields::ID.to_owned(), id);
    out
}

fn is_duplicate_key(err: &MongoError) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(e)) => e.code == DUPLICATE_KEY,
        ErrorKind::Command(e) => e.code == DUPLICATE_KEY,
        _ => false,
    }
}

fn transient(operation: &str, err: MongoError) -> StoreError {
    tracing::error!(operation, error = %err, "MongoDB operation failed");
    StoreError::Transient(format!("{operation} failed"))
}

/// Translate a driver error, recognising unique index violations.
fn translate(operation: &str, collection: &str, username: &str, err: MongoError) -> StoreError {
    if is_duplicate_key(&err) {
        return StoreError::DuplicateKey {
            username: username.to_owned(),
            collection: collection.to_owned(),
        };
    }
    tracing::error!(operation, collection, error = %err, "MongoDB operation failed");
    StoreError::Transient(format!("{operation} failed"))
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn create(&self, collection: &str, mut doc: Document) -> Result<Document, StoreError> {
        doc.remove(fields::ID);
        let username = username_of(&doc);
        let bson_doc = to_bson_document(&doc)?;

        let result = self
            .collection(collection)
            .insert_one(bson_doc)
            .await
            .map_err(|e| translate("insert", collection, &username, e))?;

        let id = match result.inserted_id {
            Bson::ObjectId(oid) => oid.to_hex(),
            other => other.to_string(),
        };
        doc.remove(fields::PASSWORD);
        doc.insert(fields::ID.to_owned(), Value::String(id));
        Ok(doc)
    }

    async fn update(
        &self,
        collection: &str,
        doc: Document,
        id: &UserId,
    ) -> Result<Document, StoreError> {
        let oid = parse_oid(id)?;
        let plan = UpdatePlan::new(doc);
        let username = username_of(&plan.set);
        let not_found = || StoreError::NotFound("invalid user id".to_owned());

        if plan.is_empty() {
            return self.find_by_id(collection, id).await;
        }

        let mut updated = None;

        for (field, value) in &plan.pushes {
            let mut push = BsonDocument::new();
            push.insert(*field, to_bson_value(value)?);
            updated = self
                .modify(collection, oid, doc! { "$push": push })
                .await
                .map_err(|e| translate("push", collection, &username, e))?;
            if updated.is_none() {
                return Err(not_found());
            }
        }

        if !plan.set.is_empty() {
            let set = to_bson_document(&plan.set)?;
            updated = self
                .modify(collection, oid, doc! { "$set": set })
                .await
                .map_err(|e| translate("set", collection, &username, e))?;
        }

        updated.ok_or_else(not_found)
    }

    async fn remove(
        &self,
        collection: &str,
        doc: &Document,
        id: &UserId,
    ) -> Result<Document, StoreError> {
        let target = RemovalTarget::from_document(doc)?;
        let oid = parse_oid(id)?;

        let mut selector = BsonDocument::new();
        selector.insert(target.key, to_bson_value(&target.value)?);
        let mut pull = BsonDocument::new();
        pull.insert(target.array, selector);

        self.modify(collection, oid, doc! { "$pull": pull })
            .await
            .map_err(|e| transient("pull", e))?
            .ok_or_else(|| StoreError::NotFound("no object found with that name or id".to_owned()))
    }

    async fn find_by_id(&self, collection: &str, id: &UserId) -> Result<Document, StoreError> {
        let oid = parse_oid(id)?;
        self.collection(collection)
            .find_one(doc! { "_id": oid })
            .projection(hide_password())
            .await
            .map_err(|e| transient("find", e))?
            .map(from_bson)
            .ok_or_else(|| StoreError::NotFound("invalid user id".to_owned()))
    }

    async fn delete(&self, collection: &str, id: &UserId) -> Result<(), StoreError> {
        let oid = parse_oid(id)?;
        let result = self
            .collection(collection)
            .delete_one(doc! { "_id": oid })
            .await
            .map_err(|e| transient("delete", e))?;
        tracing::debug!(collection, deleted = result.deleted_count, "Delete acknowledged");
        Ok(())
    }

    async fn get_by_credentials(
        &self,
        collection: &str,
        username: &str,
        password: &str,
    ) -> Result<Document, StoreError> {
        self.collection(collection)
            .find_one(doc! { "username": username, "password": password })
            .projection(hide_password())
            .await
            .map_err(|e| transient("find", e))?
            .map(from_bson)
            .ok_or_else(|| StoreError::NotFound("invalid username or password".to_owned()))
    }

    async fn list_all(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        let docs: Vec<BsonDocument> = self
            .collection(collection)
            .find(doc! {})
            .projection(hide_password())
            .await
            .map_err(|e| transient("find", e))?
            .try_collect()
            .await
            .map_err(|e| transient("find", e))?;

        if docs.is_empty() {
            return Err(StoreError::NotFound("no users yet".to_owned()));
        }
        Ok(docs.into_iter().map(from_bson).collect())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.db
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| transient("ping", e))?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_from_bson_exposes_hex_id_and_drops_password() {
        let oid = ObjectId::new();
        let stored = doc! {
            "_id": oid,
            "username": "bob",
            "password": "x",
            "pets": [{ "name": "Rex" }],
        };

        let out = from_bson(stored);
        assert_eq!(out.get("_id"), Some(&json!(oid.to_hex())));
        assert_eq!(out.get("pets"), Some(&json!([{"name": "Rex"}])));
        assert!(!out.contains_key("password"));
    }

    #[test]
    fn test_parse_oid() {
        let oid = ObjectId::new();
        assert_eq!(parse_oid(&UserId::from(oid.to_hex())).unwrap(), oid);
        assert!(matches!(
            parse_oid(&UserId::from("not-an-object-id")),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn test_dotted_keys_survive_conversion() {
        let Value::Object(doc) = json!({"pics.profile": "p.png", "address": "new"}) else {
            unreachable!()
        };
        let set = to_bson_document(&doc).unwrap();
        assert_eq!(set.get_str("pics.profile").unwrap(), "p.png");
    }
}
