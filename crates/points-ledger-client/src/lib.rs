//! Points Ledger Client SDK.
//!
//! This crate provides a client library for services that award or spend points.
//!
//! # Example
//!
//! ```no_run
//! use points_ledger_client::{CreditRequest, LedgerClient};
//! use points_ledger_core::UserId;
//!
//! # async fn example() -> Result<(), points_ledger_client::ClientError> {
//! let client = LedgerClient::new("http://points-ledger:8080", "your-service-api-key")?;
//! let user_id: UserId = "6c1f8d4e-2b7a-4f53-9e0d-1a2b3c4d5e6f".parse().unwrap();
//!
//! let credited = client
//!     .credit(CreditRequest::new(user_id, 15, "Quiz completed", "quiz"))
//!     .await?;
//! println!("Level {} with {} points", credited.level, credited.balance);
//!
//! if client.can_afford(&user_id, "homework").await?.can_afford {
//!     client.use_feature(&user_id, "homework", None).await?;
//! }
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod client;
mod error;
mod types;

pub use client::{ClientOptions, LedgerClient};
pub use error::ClientError;
pub use types::*;
