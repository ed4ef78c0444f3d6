use chrono::{DateTime, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Template data copied into every new invoice. Editing it never touches
/// invoices that already exist.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompanyProfile {
    pub name: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub website: String,
    pub abn: String,
    pub bank_name: String,
    pub account_number: String,
    pub bsb: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub email: String,
    pub password_hash: String,
    #[serde(default)]
    pub company_profile: CompanyProfile,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(email: &str, password_hash: String, company_profile: CompanyProfile) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: normalize_email(email),
            password_hash,
            company_profile,
            created_at: Utc::now(),
        }
    }

    pub fn sanitized(&self) -> SanitizedUser {
        SanitizedUser {
            id: self.id.clone(),
            email: self.email.clone(),
            company_profile: self.company_profile.clone(),
        }
    }
}

/// User as returned over the API: no password hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SanitizedUser {
    #[serde(rename = "_id")]
    pub id: String,
    pub email: String,
    pub company_profile: CompanyProfile,
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
