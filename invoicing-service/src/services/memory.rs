//! In-process store backed by `DashMap`. Used by tests and `STORE_BACKEND=memory`.

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use service_core::error::AppError;
use std::sync::Arc;

use super::store::{matches_search, InvoiceStore, UserStore};
use crate::models::{CompanyProfile, Invoice, User};

#[derive(Clone, Default)]
pub struct MemoryStore {
    invoices: Arc<DashMap<String, Invoice>>,
    users: Arc<DashMap<String, User>>,
    /// email -> user id; doubles as the unique index.
    emails: Arc<DashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl InvoiceStore for MemoryStore {
    async fn list(&self, owner_id: &str, search: Option<&str>) -> Result<Vec<Invoice>, AppError> {
        let mut invoices: Vec<Invoice> = self
            .invoices
            .iter()
            .filter(|entry| entry.owner_id == owner_id)
            .filter(|entry| search.is_none_or(|term| matches_search(entry.value(), term)))
            .map(|entry| entry.value().clone())
            .collect();
        invoices.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(invoices)
    }

    async fn get(&self, owner_id: &str, id: &str) -> Result<Option<Invoice>, AppError> {
        Ok(self
            .invoices
            .get(id)
            .filter(|invoice| invoice.owner_id == owner_id)
            .map(|invoice| invoice.clone()))
    }

    async fn insert(&self, invoice: &Invoice) -> Result<(), AppError> {
        match self.invoices.entry(invoice.id.clone()) {
            Entry::Occupied(_) => Err(AppError::Conflict(anyhow::anyhow!(
                "Invoice {} already exists",
                invoice.id
            ))),
            Entry::Vacant(slot) => {
                slot.insert(invoice.clone());
                Ok(())
            }
        }
    }

    async fn update(&self, invoice: &Invoice) -> Result<bool, AppError> {
        match self.invoices.get_mut(&invoice.id) {
            Some(mut stored) if stored.owner_id == invoice.owner_id => {
                *stored = invoice.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete(&self, owner_id: &str, id: &str) -> Result<bool, AppError> {
        Ok(self
            .invoices
            .remove_if(id, |_, invoice| invoice.owner_id == owner_id)
            .is_some())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: &User) -> Result<(), AppError> {
        match self.emails.entry(user.email.clone()) {
            Entry::Occupied(_) => Err(AppError::Conflict(anyhow::anyhow!(
                "User already exists"
            ))),
            Entry::Vacant(slot) => {
                slot.insert(user.id.clone());
                self.users.insert(user.id.clone(), user.clone());
                Ok(())
            }
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let Some(id) = self.emails.get(email).map(|id| id.clone()) else {
            return Ok(None);
        };
        Ok(self.users.get(&id).map(|user| user.clone()))
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError> {
        Ok(self.users.get(id).map(|user| user.clone()))
    }

    async fn update_profile(
        &self,
        id: &str,
        profile: &CompanyProfile,
    ) -> Result<Option<User>, AppError> {
        Ok(self.users.get_mut(id).map(|mut user| {
            user.company_profile = profile.clone();
            user.clone()
        }))
    }
}
