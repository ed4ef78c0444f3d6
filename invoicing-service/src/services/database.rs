//! MongoDB store for invoicing-service.

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, Document},
    options::{FindOneAndUpdateOptions, FindOptions, IndexOptions, ReturnDocument},
    Client as MongoClient, Collection, Database, IndexModel,
};
use service_core::error::AppError;
use std::time::Instant;
use tracing::{info, instrument};

use super::metrics::record_db_query;
use super::store::{escape_regex, InvoiceStore, UserStore};
use crate::models::{CompanyProfile, Invoice, User};

#[derive(Clone)]
pub struct MongoDb {
    client: MongoClient,
    db: Database,
}

impl MongoDb {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, AppError> {
        info!("Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri).await.map_err(|e| {
            tracing::error!("Failed to connect to MongoDB: {}", e);
            AppError::from(e)
        })?;
        let db = client.database(database);
        info!(database = %database, "Successfully connected to MongoDB database");
        Ok(Self { client, db })
    }

    pub async fn initialize_indexes(&self) -> Result<(), AppError> {
        info!("Creating MongoDB indexes for invoicing-service");

        let owner_created_index = IndexModel::builder()
            .keys(doc! { "ownerId": 1, "createdAt": -1 })
            .options(
                IndexOptions::builder()
                    .name("owner_created_lookup".to_string())
                    .build(),
            )
            .build();
        self.invoices()
            .create_index(owner_created_index, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create owner index on invoices collection: {}", e);
                AppError::from(e)
            })?;
        info!("Created index on invoices.(ownerId, createdAt)");

        let email_index = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(
                IndexOptions::builder()
                    .name("email_unique".to_string())
                    .unique(true)
                    .build(),
            )
            .build();
        self.users()
            .create_index(email_index, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create email index on users collection: {}", e);
                AppError::from(e)
            })?;
        info!("Created unique index on users.email");

        Ok(())
    }

    pub async fn health_check(&self) -> Result<(), AppError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| {
                tracing::error!("MongoDB health check failed: {}", e);
                AppError::from(e)
            })?;
        Ok(())
    }

    pub fn invoices(&self) -> Collection<Invoice> {
        self.db.collection("invoices")
    }

    pub fn users(&self) -> Collection<User> {
        self.db.collection("users")
    }
}

/// Owner filter, plus a case-insensitive regex over the searchable fields.
fn list_filter(owner_id: &str, search: Option<&str>) -> Document {
    let mut filter = doc! { "ownerId": owner_id };
    if let Some(term) = search {
        let pattern = escape_regex(term);
        filter.insert(
            "$or",
            vec![
                doc! { "invoiceNumber": { "$regex": pattern.as_str(), "$options": "i" } },
                doc! { "customerDetails.name": { "$regex": pattern.as_str(), "$options": "i" } },
                doc! { "reference": { "$regex": pattern.as_str(), "$options": "i" } },
            ],
        );
    }
    filter
}

#[async_trait]
impl InvoiceStore for MongoDb {
    #[instrument(skip(self), fields(owner_id = %owner_id))]
    async fn list(&self, owner_id: &str, search: Option<&str>) -> Result<Vec<Invoice>, AppError> {
        let start = Instant::now();
        let options = FindOptions::builder()
            .sort(doc! { "createdAt": -1, "_id": -1 })
            .build();
        let cursor = self
            .invoices()
            .find(list_filter(owner_id, search), Some(options))
            .await?;
        let invoices: Vec<Invoice> = cursor.try_collect().await?;
        record_db_query("list_invoices", start.elapsed().as_secs_f64());
        Ok(invoices)
    }

    #[instrument(skip(self), fields(owner_id = %owner_id, invoice_id = %id))]
    async fn get(&self, owner_id: &str, id: &str) -> Result<Option<Invoice>, AppError> {
        let start = Instant::now();
        let invoice = self
            .invoices()
            .find_one(doc! { "_id": id, "ownerId": owner_id }, None)
            .await?;
        record_db_query("get_invoice", start.elapsed().as_secs_f64());
        Ok(invoice)
    }

    #[instrument(skip(self, invoice), fields(invoice_id = %invoice.id))]
    async fn insert(&self, invoice: &Invoice) -> Result<(), AppError> {
        let start = Instant::now();
        self.invoices().insert_one(invoice, None).await?;
        record_db_query("insert_invoice", start.elapsed().as_secs_f64());
        Ok(())
    }

    #[instrument(skip(self, invoice), fields(invoice_id = %invoice.id))]
    async fn update(&self, invoice: &Invoice) -> Result<bool, AppError> {
        let start = Instant::now();
        let result = self
            .invoices()
            .replace_one(
                doc! { "_id": invoice.id.as_str(), "ownerId": invoice.owner_id.as_str() },
                invoice,
                None,
            )
            .await?;
        record_db_query("update_invoice", start.elapsed().as_secs_f64());
        Ok(result.matched_count > 0)
    }

    #[instrument(skip(self), fields(owner_id = %owner_id, invoice_id = %id))]
    async fn delete(&self, owner_id: &str, id: &str) -> Result<bool, AppError> {
        let start = Instant::now();
        let result = self
            .invoices()
            .delete_one(doc! { "_id": id, "ownerId": owner_id }, None)
            .await?;
        record_db_query("delete_invoice", start.elapsed().as_secs_f64());
        Ok(result.deleted_count > 0)
    }
}

#[async_trait]
impl UserStore for MongoDb {
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    async fn insert_user(&self, user: &User) -> Result<(), AppError> {
        let start = Instant::now();
        // Duplicate key on the email index becomes AppError::Conflict.
        self.users().insert_one(user, None).await?;
        record_db_query("insert_user", start.elapsed().as_secs_f64());
        Ok(())
    }

    #[instrument(skip(self, email))]
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let start = Instant::now();
        let user = self.users().find_one(doc! { "email": email }, None).await?;
        record_db_query("find_user_by_email", start.elapsed().as_secs_f64());
        Ok(user)
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError> {
        let start = Instant::now();
        let user = self.users().find_one(doc! { "_id": id }, None).await?;
        record_db_query("find_user_by_id", start.elapsed().as_secs_f64());
        Ok(user)
    }

    #[instrument(skip(self, profile))]
    async fn update_profile(
        &self,
        id: &str,
        profile: &CompanyProfile,
    ) -> Result<Option<User>, AppError> {
        let start = Instant::now();
        let profile = mongodb::bson::to_bson(profile)
            .map_err(|e| AppError::InternalError(anyhow::anyhow!(e)))?;
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();
        let user = self
            .users()
            .find_one_and_update(
                doc! { "_id": id },
                doc! { "$set": { "companyProfile": profile } },
                Some(options),
            )
            .await?;
        record_db_query("update_profile", start.elapsed().as_secs_f64());
        Ok(user)
    }
}
