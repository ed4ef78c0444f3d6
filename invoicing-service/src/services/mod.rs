//! Services module for invoicing-service.

pub mod database;
pub mod jwt;
pub mod memory;
pub mod metrics;
pub mod store;

pub use database::MongoDb;
pub use jwt::{AccessTokenClaims, JwtService};
pub use memory::MemoryStore;
pub use metrics::{get_metrics, init_metrics};
pub use store::{InvoiceStore, UserStore};
