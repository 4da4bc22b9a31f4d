//! Sailthru campaign classification
//!
//! Classifies email campaigns ("blasts") fetched from the Sailthru API into
//! our own email types and publications, and wraps the API with date-range
//! pagination, retries and bulk job polling.
//!
//! # Overview
//!
//! - **Classification**: ordered rules map a campaign to an [`EmailType`]
//! - **Publication**: the publication name is recovered from the list name
//! - **Fetching**: campaigns for any date range, in ascending order
//! - **Jobs**: list exports and bulk updates, optionally polled to completion
//!
//! # Example Usage
//!
//! ```no_run
//! use chrono::NaiveDate;
//! use dive_sailthru::{client::SailthruClient, config::Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("dive-sailthru.toml".as_ref()).await?;
//!     let client = SailthruClient::from_config(&config)?;
//!
//!     let start = NaiveDate::from_ymd_opt(2017, 4, 1).unwrap();
//!     let end = NaiveDate::from_ymd_opt(2017, 5, 1).unwrap();
//!     for campaign in client.get_campaigns_in_range(start, end, None).await? {
//!         println!("{} {:?}", campaign.email_type, campaign.publication);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Module Organization
//!
//! - [`classifier`] - Email type and publication rules
//! - [`client`] - Sailthru client: pagination, retries, jobs
//! - [`cli`] - Command-line interface
//! - [`config`] - Configuration management
//! - [`error`] - Error types and result aliases
//! - [`models`] - Campaign and job data structures
//! - [`pagination`] - Date-range windowing
//! - [`transport`] - Transport trait and signed HTTP implementation

pub mod classifier;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod pagination;
pub mod transport;

// Re-export commonly used types for convenience
pub use error::{Result, SailthruError};

pub use models::{CampaignRecord, ClassifiedCampaign, EmailType, JobInfo, StatsOptions};

pub use classifier::{annotate, classify, classify_with_rule, resolve_publication, tally_by_type};

pub use client::{ClientSettings, SailthruClient};

pub use config::Config;

pub use pagination::{date_windows, DateWindow};

pub use transport::{ApiErrorBody, ApiResponse, HttpTransport, SailthruTransport};
