//! Common test utilities and fixtures

#![allow(dead_code)]

use dive_sailthru::error::Result;
use dive_sailthru::models::CampaignRecord;
use dive_sailthru::transport::{ApiResponse, SailthruTransport};
use mockall::mock;
use serde_json::{json, Value};

/// Create a campaign with the fields the classifier looks at
pub fn create_test_campaign(labels: &[&str], list_name: &str, name: &str, subject: &str) -> CampaignRecord {
    CampaignRecord::new()
        .with_labels(labels.iter().copied())
        .with_name(name)
        .with_list_name(list_name)
        .with_subject(subject)
}

/// A campaign as it appears in a `blast` listing
pub fn mock_blast(blast_id: i64, name: &str, list_name: &str, labels: &[&str]) -> Value {
    json!({
        "blast_id": blast_id,
        "labels": labels,
        "list": list_name,
        "mode": "email",
        "name": name,
        "start_time": "Thu, 06 Aug 2015 15:28:17 -0400",
        "status": "sent",
        "subject": format!("Subject for {}", name),
    })
}

/// A `blast` listing whose reported count matches its contents
pub fn mock_blast_listing(blasts: Vec<Value>) -> ApiResponse {
    let count = blasts.len();
    mock_blast_listing_with_count(blasts, count)
}

pub fn mock_blast_listing_with_count(blasts: Vec<Value>, filtered_count: usize) -> ApiResponse {
    ApiResponse::ok(json!({
        "blasts": blasts,
        "filtered_count": filtered_count,
    }))
}

pub fn mock_job_response(job_id: &str, status: &str) -> ApiResponse {
    ApiResponse::ok(json!({
        "job_id": job_id,
        "name": "Export All List Data: Just Eli",
        "status": status,
    }))
}

pub fn mock_error_response(code: i64, message: &str) -> ApiResponse {
    ApiResponse::new(400, json!({"error": code, "errormsg": message}))
}

// Mock implementation of SailthruTransport for testing
mock! {
    pub Transport {}

    #[async_trait::async_trait]
    impl SailthruTransport for Transport {
        async fn get(&self, resource: &str, params: &Value) -> Result<ApiResponse>;
        async fn post(&self, resource: &str, params: &Value) -> Result<ApiResponse>;
    }
}
