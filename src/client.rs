//! Sailthru client with campaign classification, retries and job polling

use chrono::NaiveDate;
use serde_json::{json, Map, Value};
use std::time::Duration;
use tracing::{debug, info, trace, warn};

use crate::classifier::{annotate, classify_with_rule};
use crate::config::Config;
use crate::error::{Result, SailthruError};
use crate::models::{CampaignRecord, ClassifiedCampaign, JobInfo, StatsOptions};
use crate::pagination::{date_windows, DEFAULT_PAGE_SIZE_DAYS, DEFAULT_RESULT_LIMIT};
use crate::transport::{ApiResponse, HttpTransport, SailthruTransport};

/// Tunables for pagination, retries and job polling
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub page_size_days: u32,
    pub result_limit: u64,
    pub max_attempts: u32,
    pub poll_interval: Duration,
    pub max_wait: Duration,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            page_size_days: DEFAULT_PAGE_SIZE_DAYS,
            result_limit: DEFAULT_RESULT_LIMIT,
            max_attempts: 3,
            poll_interval: Duration::from_secs(1),
            max_wait: Duration::from_secs(6 * 60 * 60),
        }
    }
}

impl From<&Config> for ClientSettings {
    fn from(config: &Config) -> Self {
        Self {
            page_size_days: config.fetch.page_size_days,
            result_limit: config.fetch.result_limit,
            max_attempts: config.retry.max_attempts,
            poll_interval: Duration::from_secs(config.jobs.poll_interval_secs),
            max_wait: Duration::from_secs(config.jobs.max_wait_secs),
        }
    }
}

/// Sailthru client that adds our own concepts on top of a transport:
/// email type and publication for campaigns, date-range pagination,
/// error raising, connect-timeout retries and job polling.
pub struct SailthruClient<T> {
    transport: T,
    settings: ClientSettings,
}

impl SailthruClient<HttpTransport> {
    /// Build an HTTP-backed client from configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        config.require_credentials()?;
        let transport = HttpTransport::new(
            config.api.key.clone(),
            config.api.secret.clone(),
            config.api.base_url.clone(),
            config.api.timeout(),
        )?;
        Ok(Self::with_settings(transport, ClientSettings::from(config)))
    }
}

impl<T> SailthruClient<T>
where
    T: SailthruTransport,
{
    pub fn new(transport: T) -> Self {
        Self::with_settings(transport, ClientSettings::default())
    }

    pub fn with_settings(transport: T, settings: ClientSettings) -> Self {
        Self { transport, settings }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    /// Turn a non-OK response into the matching error
    pub fn raise_if_error(response: &ApiResponse) -> Result<()> {
        match response.error() {
            None => Ok(()),
            Some(error) => Err(SailthruError::from_api(error.code, error.message)),
        }
    }

    /// GET with connect-timeout retries, raising on a non-OK response
    pub async fn api_get(&self, resource: &str, params: &Value) -> Result<ApiResponse> {
        let response = Self::with_retry(resource, self.settings.max_attempts, || {
            self.transport.get(resource, params)
        })
        .await?;

        Self::raise_if_error(&response)?;
        Ok(response)
    }

    /// POST, raising on a non-OK response. Never retried.
    pub async fn api_post(&self, resource: &str, params: &Value) -> Result<ApiResponse> {
        let response = self.transport.post(resource, params).await?;
        Self::raise_if_error(&response)?;
        Ok(response)
    }

    /// Run `operation` up to `max_attempts` times while it fails with a
    /// retryable error
    async fn with_retry<R, F, Fut>(operation_name: &str, max_attempts: u32, mut operation: F) -> Result<R>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<R>>,
    {
        let mut attempts = 0;

        loop {
            attempts += 1;
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_retryable() && attempts < max_attempts => {
                    warn!(
                        "{} failed (attempt {}/{}): {}. Retrying...",
                        operation_name, attempts, max_attempts, e
                    );
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Data about all lists marked as primary
    pub async fn get_primary_lists(&self) -> Result<Vec<Value>> {
        let mut body = self.api_get("list", &json!({"primary": 1})).await?.into_json();

        match body.get_mut("lists").map(Value::take) {
            Some(Value::Array(lists)) => Ok(lists),
            _ => Err(SailthruError::InvalidResponse(
                "'list' response has no 'lists' array".to_string(),
            )),
        }
    }

    /// Sent campaigns between `start` (inclusive) and `end` (exclusive),
    /// optionally only those sent to `list_name`, each annotated with its
    /// email type and publication.
    ///
    /// Results are in ascending chronological order. Fails with
    /// [`SailthruError::IncompleteData`] if any window comes back short.
    pub async fn get_campaigns_in_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        list_name: Option<&str>,
    ) -> Result<Vec<ClassifiedCampaign>> {
        let windows = date_windows(start, end, self.settings.page_size_days);
        info!(
            "Fetching campaigns from {} to {} in {} request(s)",
            start,
            end,
            windows.len()
        );

        let mut campaigns = Vec::new();

        for window in windows {
            let params = window.blast_params(self.settings.result_limit, list_name);
            let body = self.api_get("blast", &params).await?.into_json();
            let blasts = parse_blast_listing(body)?;

            debug!(
                "Window {} to {}: {} campaign(s)",
                window.start,
                window.end,
                blasts.len()
            );

            // The API lists newest first
            for record in blasts.into_iter().rev() {
                let (email_type, rule) = classify_with_rule(&record);
                trace!(
                    "Campaign {:?} '{}' classified as {} by rule {:?}",
                    record.blast_id(),
                    record.name(),
                    email_type,
                    rule
                );
                campaigns.push(annotate(record));
            }
        }

        info!("Fetched {} campaign(s)", campaigns.len());
        Ok(campaigns)
    }

    /// Stats (opens, clicks, ...) for one campaign
    pub async fn get_campaign_stats(&self, blast_id: i64, options: StatsOptions) -> Result<Value> {
        let mut params = Map::new();
        params.insert("stat".to_string(), json!("blast"));
        params.insert("blast_id".to_string(), json!(blast_id));
        params.extend(options.params());

        Ok(self.api_get("stats", &Value::Object(params)).await?.into_json())
    }

    /// Full metadata (including content) for one campaign
    pub async fn get_campaign_data(&self, blast_id: i64) -> Result<Value> {
        Ok(self
            .api_get("blast", &json!({"blast_id": blast_id}))
            .await?
            .into_json())
    }

    pub async fn get_job_info(&self, job_id: &str) -> Result<JobInfo> {
        let body = self.api_get("job", &json!({"job_id": job_id})).await?.into_json();
        parse_job(body)
    }

    /// Start an `export_list_data` job for `list_name`
    ///
    /// # Arguments
    /// * `fields` - Profile fields to include
    /// * `vars` - Custom profile vars to include
    /// * `block_until_complete` - Poll until the job leaves `pending`
    pub async fn export_list(
        &self,
        list_name: &str,
        fields: &[String],
        vars: &[String],
        block_until_complete: bool,
    ) -> Result<JobInfo> {
        let mut field_map: Map<String, Value> = fields.iter().map(|f| (f.clone(), json!(1))).collect();
        if !vars.is_empty() {
            let var_map: Map<String, Value> = vars.iter().map(|v| (v.clone(), json!(1))).collect();
            field_map.insert("vars".to_string(), Value::Object(var_map));
        }

        let params = json!({
            "job": "export_list_data",
            "list": list_name,
            "fields": field_map,
        });

        info!("Starting list export for '{}'", list_name);
        self.run_job(&params, block_until_complete).await
    }

    /// Start an `update` job from a JSON-lines file Sailthru can read by name
    pub async fn update_job_from_file(&self, file_name: &str, block_until_complete: bool) -> Result<JobInfo> {
        let params = json!({
            "job": "update",
            "file": file_name,
        });

        info!("Starting update job from '{}'", file_name);
        self.run_job(&params, block_until_complete).await
    }

    async fn run_job(&self, params: &Value, block_until_complete: bool) -> Result<JobInfo> {
        let body = self.api_post("job", params).await?.into_json();
        let mut job = parse_job(body)?;
        debug!("Job {} created with status '{}'", job.job_id, job.status);

        if block_until_complete {
            job = self.block_until_job_complete(&job.job_id).await?;
        }

        if !job.is_pending() && !job.is_completed() {
            return Err(SailthruError::UnexpectedJobStatus {
                job_id: job.job_id,
                status: job.status,
            });
        }

        Ok(job)
    }

    /// Poll a job until it is no longer pending.
    ///
    /// Fails with [`SailthruError::JobTimeout`] if it is still pending after
    /// the configured maximum wait.
    pub async fn block_until_job_complete(&self, job_id: &str) -> Result<JobInfo> {
        let interval = self.settings.poll_interval;
        let max_wait = self.settings.max_wait;
        let max_iterations = max_wait.as_millis() / interval.as_millis().max(1) + 1;

        let mut job = self.get_job_info(job_id).await?;
        let mut iteration = 1;

        while job.is_pending() && iteration < max_iterations {
            trace!("Job {} still pending, checking again in {:?}", job_id, interval);
            tokio::time::sleep(interval).await;
            job = self.get_job_info(job_id).await?;
            iteration += 1;
        }

        if job.is_pending() {
            return Err(SailthruError::JobTimeout {
                job_id: job_id.to_string(),
                max_wait_secs: max_wait.as_secs(),
            });
        }

        info!("Job {} finished with status '{}'", job_id, job.status);
        Ok(job)
    }
}

/// Pull the campaigns out of a `blast` listing, checking the reported count
fn parse_blast_listing(mut body: Value) -> Result<Vec<CampaignRecord>> {
    let filtered_count = body.get("filtered_count").and_then(Value::as_u64).unwrap_or(0);

    let blasts: Vec<CampaignRecord> = match body.get_mut("blasts").map(Value::take) {
        None | Some(Value::Null) => Vec::new(),
        Some(value) => serde_json::from_value(value)?,
    };

    if filtered_count != blasts.len() as u64 {
        return Err(SailthruError::IncompleteData {
            expected: filtered_count,
            actual: blasts.len() as u64,
        });
    }

    Ok(blasts)
}

fn parse_job(body: Value) -> Result<JobInfo> {
    serde_json::from_value(body)
        .map_err(|e| SailthruError::InvalidResponse(format!("Unexpected job response: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_parse_blast_listing_count_matches() {
        let body = json!({
            "filtered_count": 2,
            "blasts": [{"name": "b", "list": "x"}, {"name": "a", "list": "y"}],
        });
        let blasts = parse_blast_listing(body).unwrap();
        assert_eq!(blasts.len(), 2);
        assert_eq!(blasts[0].name(), "b");
    }

    #[test]
    fn test_parse_blast_listing_count_mismatch() {
        let body = json!({"filtered_count": 3, "blasts": [{"name": "only one"}]});
        let result = parse_blast_listing(body);
        assert!(matches!(
            result,
            Err(SailthruError::IncompleteData { expected: 3, actual: 1 })
        ));
    }

    #[test]
    fn test_parse_blast_listing_empty_body() {
        assert!(parse_blast_listing(json!({})).unwrap().is_empty());
    }

    #[test]
    fn test_parse_job_requires_id_and_status() {
        assert!(parse_job(json!({"job_id": "1", "status": "pending"})).is_ok());
        assert!(matches!(
            parse_job(json!({"status": "pending"})),
            Err(SailthruError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_settings_from_config() {
        let mut config = Config::default();
        config.fetch.page_size_days = 14;
        config.jobs.poll_interval_secs = 5;

        let settings = ClientSettings::from(&config);
        assert_eq!(settings.page_size_days, 14);
        assert_eq!(settings.poll_interval, Duration::from_secs(5));
        assert_eq!(settings.max_attempts, 3);
    }

    #[tokio::test]
    async fn test_with_retry_succeeds_after_connect_timeout() {
        let attempt_count = Arc::new(AtomicU32::new(0));
        let attempt_count_clone = Arc::clone(&attempt_count);

        let result = SailthruClient::<HttpTransport>::with_retry("test_op", 3, || {
            let count = Arc::clone(&attempt_count_clone);
            async move {
                let current = count.fetch_add(1, Ordering::SeqCst);
                if current < 2 {
                    Err(SailthruError::ConnectTimeout("ConnectTimeoutError".to_string()))
                } else {
                    Ok("success".to_string())
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "success");
        assert_eq!(attempt_count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_with_retry_gives_up_after_max_attempts() {
        let attempt_count = Arc::new(AtomicU32::new(0));
        let attempt_count_clone = Arc::clone(&attempt_count);

        let result = SailthruClient::<HttpTransport>::with_retry("test_op", 3, || {
            let count = Arc::clone(&attempt_count_clone);
            async move {
                count.fetch_add(1, Ordering::SeqCst);
                Err::<String, _>(SailthruError::ConnectTimeout("ConnectTimeoutError".to_string()))
            }
        })
        .await;

        assert!(matches!(result, Err(SailthruError::ConnectTimeout(_))));
        assert_eq!(attempt_count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_with_retry_does_not_retry_other_errors() {
        let attempt_count = Arc::new(AtomicU32::new(0));
        let attempt_count_clone = Arc::clone(&attempt_count);

        let result = SailthruClient::<HttpTransport>::with_retry("test_op", 3, || {
            let count = Arc::clone(&attempt_count_clone);
            async move {
                count.fetch_add(1, Ordering::SeqCst);
                Err::<String, _>(SailthruError::Network("connection reset".to_string()))
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(attempt_count.load(Ordering::SeqCst), 1);
    }
}
