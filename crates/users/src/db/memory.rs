//! In-memory document store.

use std::collections::HashMap;

use async_trait::async_trait;
use petlife_core::UserId;
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{DocumentStore, RemovalTarget, StoreError, UpdatePlan, username_of};
use crate::models::{Document, fields};

/// Document store held in process memory.
///
/// Mirrors the `MongoDB` backend: ids are generated on insert, usernames are
/// unique per collection, and ids that are not well-formed match nothing.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Vec<Document>>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Parse an id, treating malformed ids as matching nothing.
fn parse_id(id: &UserId) -> Result<String, StoreError> {
    Uuid::try_parse(id.as_str())
        .map(|uuid| uuid.simple().to_string())
        .map_err(|_| StoreError::NotFound(format!("invalid user id {id}")))
}

fn has_id(doc: &Document, id: &str) -> bool {
    doc.get(fields::ID).and_then(Value::as_str) == Some(id)
}

/// Copy of a stored document without its password.
fn project(doc: &Document) -> Document {
    let mut out = doc.clone();
    out.remove(fields::PASSWORD);
    out
}

/// Whether another document in the collection already uses the username.
fn username_taken(docs: &[Document], username: &Value, except: Option<&str>) -> bool {
    docs.iter().any(|doc| {
        doc.get(fields::USERNAME) == Some(username)
            && except.is_none_or(|id| !has_id(doc, id))
    })
}

/// Set a possibly dotted path, creating intermediate objects.
fn set_path(doc: &mut Document, path: &str, value: Value) -> Result<(), StoreError> {
    let mut parts = path.split('.');
    let last = parts.next_back().unwrap_or(path);
    let mut target = doc;
    for part in parts {
        let entry = target
            .entry(part.to_owned())
            .or_insert_with(|| Value::Object(Document::new()));
        target = match entry {
            Value::Object(map) => map,
            _ => {
                return Err(StoreError::Transient(format!(
                    "cannot create field {path}: {part} is not an object"
                )));
            }
        };
    }
    target.insert(last.to_owned(), value);
    Ok(())
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn create(&self, collection: &str, mut doc: Document) -> Result<Document, StoreError> {
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.to_owned()).or_default();

        if let Some(username) = doc.get(fields::USERNAME)
            && username_taken(docs, username, None)
        {
            return Err(StoreError::DuplicateKey {
                username: username_of(&doc),
                collection: collection.to_owned(),
            });
        }

        let id = Uuid::new_v4().simple().to_string();
        doc.insert(fields::ID.to_owned(), Value::String(id));
        let created = project(&doc);
        docs.push(doc);
        Ok(created)
    }

    async fn update(
        &self,
        collection: &str,
        doc: Document,
        id: &UserId,
    ) -> Result<Document, StoreError> {
        let id = parse_id(id)?;
        let plan = UpdatePlan::new(doc);

        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.to_owned()).or_default();

        if let Some(username) = plan.set.get(fields::USERNAME)
            && username_taken(docs, username, Some(&id))
        {
            return Err(StoreError::DuplicateKey {
                username: username_of(&plan.set),
                collection: collection.to_owned(),
            });
        }

        let stored = docs
            .iter_mut()
            .find(|doc| has_id(doc, &id))
            .ok_or_else(|| StoreError::NotFound("invalid user id".to_owned()))?;

        for (field, value) in plan.pushes {
            match stored
                .entry(field.to_owned())
                .or_insert_with(|| Value::Array(Vec::new()))
            {
                Value::Array(items) => items.push(value),
                _ => {
                    return Err(StoreError::Transient(format!(
                        "cannot push to non-array field {field}"
                    )));
                }
            }
        }

        for (path, value) in plan.set {
            set_path(stored, &path, value)?;
        }

        Ok(project(stored))
    }

    async fn remove(
        &self,
        collection: &str,
        doc: &Document,
        id: &UserId,
    ) -> Result<Document, StoreError> {
        let target = RemovalTarget::from_document(doc)?;
        let id = parse_id(id)?;

        let mut collections = self.collections.write().await;
        let stored = collections
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|doc| has_id(doc, &id)))
            .ok_or_else(|| StoreError::NotFound("no object found with that name or id".to_owned()))?;

        if let Some(Value::Array(items)) = stored.get_mut(target.array) {
            items.retain(|item| !target.matches(item));
        }

        Ok(project(stored))
    }

    async fn find_by_id(&self, collection: &str, id: &UserId) -> Result<Document, StoreError> {
        let id = parse_id(id)?;
        let collections = self.collections.read().await;
        collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|doc| has_id(doc, &id)))
            .map(project)
            .ok_or_else(|| StoreError::NotFound("invalid user id".to_owned()))
    }

    async fn delete(&self, collection: &str, id: &UserId) -> Result<(), StoreError> {
        let id = parse_id(id)?;
        if let Some(docs) = self.collections.write().await.get_mut(collection) {
            docs.retain(|doc| !has_id(doc, &id));
        }
        Ok(())
    }

    async fn get_by_credentials(
        &self,
        collection: &str,
        username: &str,
        password: &str,
    ) -> Result<Document, StoreError> {
        let collections = self.collections.read().await;
        collections
            .get(collection)
            .and_then(|docs| {
                docs.iter().find(|doc| {
                    doc.get(fields::USERNAME).and_then(Value::as_str) == Some(username)
                        && doc.get(fields::PASSWORD).and_then(Value::as_str) == Some(password)
                })
            })
            .map(project)
            .ok_or_else(|| StoreError::NotFound("invalid username or password".to_owned()))
    }

    async fn list_all(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        let collections = self.collections.read().await;
        let docs: Vec<Document> = collections
            .get(collection)
            .map(|docs| docs.iter().map(project).collect())
            .unwrap_or_default();

        if docs.is_empty() {
            return Err(StoreError::NotFound("no users yet".to_owned()));
        }
        Ok(docs)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
