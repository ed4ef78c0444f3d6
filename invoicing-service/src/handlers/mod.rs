pub mod auth;
pub mod export;
pub mod health;
pub mod invoices;
pub mod views;
