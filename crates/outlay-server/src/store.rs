//! Expense storage backends.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, DateTime as BsonDateTime, Document};
use mongodb::{Client, Collection};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use outlay_core::{Error, Expense, ExpenseUpdate, Result};

/// Collection holding expense documents.
const COLLECTION: &str = "expenses";

/// Trait for expense storage backends.
///
/// Each operation is a single store call; update and delete must observe
/// whether a record matched rather than silently succeeding.
#[async_trait]
pub trait ExpenseStore: Send + Sync {
    /// Inserts an expense and returns it with its assigned identifier.
    async fn insert(&self, expense: Expense) -> Result<Expense>;

    /// Returns every stored expense, in store-native order.
    async fn list(&self) -> Result<Vec<Expense>>;

    /// Applies a partial update to the expense with the given identifier.
    async fn update(&self, id: &str, update: ExpenseUpdate) -> Result<()>;

    /// Deletes the expense with the given identifier.
    async fn delete(&self, id: &str) -> Result<()>;

    /// Closes the backend on shutdown.
    async fn close(&self) {}
}

// === MongoDB backend ===

/// The persisted shape of an expense.
///
/// Only this adapter sees the store-internal representation: `_id` as an
/// `ObjectId` and timestamps as BSON datetimes. Everything above the trait
/// works with opaque string ids and chrono timestamps.
#[derive(Debug, Serialize, Deserialize)]
struct ExpenseDocument {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    id: Option<ObjectId>,
    title: String,
    amount: f64,
    category: String,
    date: BsonDateTime,
    #[serde(rename = "createdAt")]
    created_at: BsonDateTime,
}

impl From<Expense> for ExpenseDocument {
    fn from(expense: Expense) -> Self {
        Self {
            id: expense.id.and_then(|id| ObjectId::parse_str(&id).ok()),
            title: expense.title,
            amount: expense.amount,
            category: expense.category,
            date: to_bson_date(expense.date),
            created_at: to_bson_date(expense.created_at),
        }
    }
}

impl From<ExpenseDocument> for Expense {
    fn from(doc: ExpenseDocument) -> Self {
        Self {
            id: doc.id.map(|oid| oid.to_hex()),
            title: doc.title,
            amount: doc.amount,
            category: doc.category,
            date: from_bson_date(doc.date),
            created_at: from_bson_date(doc.created_at),
        }
    }
}

fn to_bson_date(dt: DateTime<Utc>) -> BsonDateTime {
    BsonDateTime::from_millis(dt.timestamp_millis())
}

fn from_bson_date(dt: BsonDateTime) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(dt.timestamp_millis()).unwrap_or(DateTime::UNIX_EPOCH)
}

/// MongoDB-backed expense store.
///
/// Holds one process-scoped client; the driver pools connections internally,
/// so the same store value is shared by every request.
pub struct MongoStore {
    client: Client,
    collection: Collection<ExpenseDocument>,
}

impl MongoStore {
    /// Connects to MongoDB and verifies the connection with a ping.
    ///
    /// # Errors
    ///
    /// Returns a store error if the URI is invalid or the server is
    /// unreachable.
    pub async fn connect(uri: &str, database: &str) -> Result<Self> {
        let client = Client::with_uri_str(uri)
            .await
            .map_err(|e| Error::store(e.to_string()))?;

        let db = client.database(database);
        db.run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| Error::store(e.to_string()))?;

        tracing::info!(database = %database, "Connected to MongoDB");

        Ok(Self {
            collection: db.collection(COLLECTION),
            client,
        })
    }

    /// Parses an interface-level id into a store id.
    ///
    /// An id that is not a valid ObjectId cannot match any record, so it is
    /// reported as not-found rather than a server error.
    fn parse_id(id: &str) -> Result<ObjectId> {
        ObjectId::parse_str(id).map_err(|_| Error::not_found(id))
    }
}

#[async_trait]
impl ExpenseStore for MongoStore {
    async fn insert(&self, expense: Expense) -> Result<Expense> {
        let mut document = ExpenseDocument::from(expense);
        document.id = None;

        let result = self
            .collection
            .insert_one(&document)
            .await
            .map_err(|e| Error::store(e.to_string()))?;

        document.id = result.inserted_id.as_object_id();
        Ok(document.into())
    }

    async fn list(&self) -> Result<Vec<Expense>> {
        let mut cursor = self
            .collection
            .find(doc! {})
            .await
            .map_err(|e| Error::store(e.to_string()))?;

        let mut expenses = Vec::new();
        while let Some(document) = cursor
            .try_next()
            .await
            .map_err(|e| Error::store(e.to_string()))?
        {
            expenses.push(document.into());
        }
        Ok(expenses)
    }

    async fn update(&self, id: &str, update: ExpenseUpdate) -> Result<()> {
        let oid = Self::parse_id(id)?;

        let mut set = Document::new();
        if let Some(title) = &update.title {
            set.insert("title", title);
        }
        if let Some(amount) = update.amount {
            set.insert("amount", amount);
        }
        if let Some(category) = &update.category {
            set.insert("category", category);
        }
        if let Some(date) = update.date {
            set.insert("date", to_bson_date(date));
        }

        let result = self
            .collection
            .update_one(doc! { "_id": oid }, doc! { "$set": set })
            .await
            .map_err(|e| Error::store(e.to_string()))?;

        if result.matched_count == 0 {
            return Err(Error::not_found(id));
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let oid = Self::parse_id(id)?;

        let result = self
            .collection
            .delete_one(doc! { "_id": oid })
            .await
            .map_err(|e| Error::store(e.to_string()))?;

        if result.deleted_count == 0 {
            return Err(Error::not_found(id));
        }
        Ok(())
    }

    async fn close(&self) {
        self.client.clone().shutdown().await;
        tracing::info!("MongoDB connection closed");
    }
}

// === In-memory backend ===

/// In-memory expense store (for development/testing).
pub struct MemoryStore {
    records: parking_lot::RwLock<HashMap<String, Expense>>,
}

impl MemoryStore {
    /// Creates a new empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: parking_lot::RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExpenseStore for MemoryStore {
    async fn insert(&self, mut expense: Expense) -> Result<Expense> {
        let id = Uuid::new_v4().to_string();
        expense.id = Some(id.clone());
        self.records.write().insert(id, expense.clone());
        Ok(expense)
    }

    async fn list(&self) -> Result<Vec<Expense>> {
        Ok(self.records.read().values().cloned().collect())
    }

    async fn update(&self, id: &str, update: ExpenseUpdate) -> Result<()> {
        let mut records = self.records.write();
        let expense = records.get_mut(id).ok_or_else(|| Error::not_found(id))?;
        expense.apply(&update);
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.records
            .write()
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| Error::not_found(id))
    }
}
