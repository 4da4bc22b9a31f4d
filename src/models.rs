use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Keys added by [`ClassifiedCampaign`]; dropped when a campaign is read back
/// in so they are always recomputed.
pub const ANNOTATION_KEYS: &[&str] = &["dive_email_type", "dive_brand"];

/// Metadata for one sent campaign ("blast") as returned by the `blast` endpoint.
///
/// The record is kept exactly as received and serialized back unchanged. The
/// accessors read missing, null or mistyped fields as empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct CampaignRecord {
    fields: Map<String, Value>,
}

impl From<Map<String, Value>> for CampaignRecord {
    fn from(mut fields: Map<String, Value>) -> Self {
        for key in ANNOTATION_KEYS {
            fields.remove(*key);
        }
        Self { fields }
    }
}

impl From<CampaignRecord> for Map<String, Value> {
    fn from(record: CampaignRecord) -> Self {
        record.fields
    }
}

impl CampaignRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels: Vec<Value> = labels.into_iter().map(|l| Value::String(l.into())).collect();
        self.fields.insert("labels".to_string(), Value::Array(labels));
        self
    }

    pub fn with_name(self, name: impl Into<String>) -> Self {
        self.with_field("name", Value::String(name.into()))
    }

    pub fn with_list_name(self, list_name: impl Into<String>) -> Self {
        self.with_field("list", Value::String(list_name.into()))
    }

    pub fn with_subject(self, subject: impl Into<String>) -> Self {
        self.with_field("subject", Value::String(subject.into()))
    }

    pub fn with_field(mut self, key: &str, value: Value) -> Self {
        if !ANNOTATION_KEYS.contains(&key) {
            self.fields.insert(key.to_string(), value);
        }
        self
    }

    fn str_field(&self, key: &str) -> &str {
        self.fields.get(key).and_then(Value::as_str).unwrap_or("")
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.fields
            .get("labels")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(Value::as_str)
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.labels().any(|l| l == label)
    }

    pub fn name(&self) -> &str {
        self.str_field("name")
    }

    /// Name of the list the campaign was sent to (the `list` field)
    pub fn list_name(&self) -> &str {
        self.str_field("list")
    }

    pub fn subject(&self) -> &str {
        self.str_field("subject")
    }

    /// Sailthru's numeric blast id, if present
    pub fn blast_id(&self) -> Option<i64> {
        self.fields.get("blast_id").and_then(Value::as_i64)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}

/// The kinds of sends we distinguish between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EmailType {
    #[serde(rename = "blast")]
    Blast,
    #[serde(rename = "welcome")]
    WelcomeSeries,
    #[serde(rename = "newsletter")]
    Newsletter,
    #[serde(rename = "weekender")]
    Weekender,
    #[serde(rename = "unknown")]
    Unknown,
    #[serde(rename = "breaking")]
    BreakingNews,
    #[serde(rename = "spotlight")]
    Spotlight,
    #[serde(rename = "audience")]
    Audience,
}

impl EmailType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmailType::Blast => "blast",
            EmailType::WelcomeSeries => "welcome",
            EmailType::Newsletter => "newsletter",
            EmailType::Weekender => "weekender",
            EmailType::Unknown => "unknown",
            EmailType::BreakingNews => "breaking",
            EmailType::Spotlight => "spotlight",
            EmailType::Audience => "audience",
        }
    }
}

impl Default for EmailType {
    fn default() -> Self {
        EmailType::Unknown
    }
}

impl fmt::Display for EmailType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A campaign annotated with its email type and publication.
///
/// The serialized keys `dive_email_type` and `dive_brand` are what downstream
/// reports already read, so they stay even though "brand" is really the
/// publication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedCampaign {
    #[serde(flatten)]
    pub campaign: CampaignRecord,
    #[serde(rename = "dive_email_type")]
    pub email_type: EmailType,
    #[serde(rename = "dive_brand")]
    pub publication: Option<String>,
}

/// Status of a bulk job as reported by the `job` endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobInfo {
    pub job_id: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl JobInfo {
    pub fn is_pending(&self) -> bool {
        self.status == "pending"
    }

    pub fn is_completed(&self) -> bool {
        self.status == "completed"
    }
}

/// Optional breakdowns to include with campaign stats
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsOptions {
    pub clickmap: bool,
    pub click_times: bool,
    pub device: bool,
    pub subject: bool,
    pub urls: bool,
}

impl StatsOptions {
    /// Request parameters for the enabled breakdowns, each set to "1"
    pub fn params(&self) -> Map<String, Value> {
        let flags = [
            ("clickmap", self.clickmap),
            ("click_times", self.click_times),
            ("device", self.device),
            ("subject", self.subject),
            ("urls", self.urls),
        ];

        flags
            .iter()
            .filter(|(_, enabled)| *enabled)
            .map(|(key, _)| (key.to_string(), Value::String("1".to_string())))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_campaign_record_missing_fields_read_as_empty() {
        let record: CampaignRecord = serde_json::from_value(json!({"gibberish": "nothing useful"})).unwrap();

        assert_eq!(record.labels().count(), 0);
        assert_eq!(record.name(), "");
        assert_eq!(record.list_name(), "");
        assert_eq!(record.subject(), "");
        assert_eq!(record.get("gibberish"), Some(&json!("nothing useful")));
    }

    #[test]
    fn test_campaign_record_null_fields_read_as_empty() {
        let record: CampaignRecord =
            serde_json::from_value(json!({"labels": null, "subject": null, "list": "Utility Dive"})).unwrap();

        assert_eq!(record.labels().count(), 0);
        assert_eq!(record.subject(), "");
        assert_eq!(record.list_name(), "Utility Dive");
    }

    #[test]
    fn test_campaign_record_drops_annotation_keys() {
        let record: CampaignRecord = serde_json::from_value(json!({
            "list": "Retail Dive",
            "dive_email_type": "newsletter",
            "dive_brand": "Retail Dive",
        }))
        .unwrap();

        assert_eq!(record.fields().len(), 1);
        assert!(record.get("dive_email_type").is_none());

        let built = CampaignRecord::new().with_field("dive_brand", json!("x"));
        assert!(built.fields().is_empty());
    }

    #[test]
    fn test_classified_campaign_keeps_extra_fields() {
        let record: CampaignRecord = serde_json::from_value(json!({
            "blast_id": 4889393,
            "labels": ["Blast"],
            "list": "Utility Dive: Solar blast list",
            "stats": {"total": {"count": 16796}},
            "suppress_list": null,
        }))
        .unwrap();
        assert_eq!(record.blast_id(), Some(4889393));

        let classified = ClassifiedCampaign {
            campaign: record,
            email_type: EmailType::Blast,
            publication: Some("Utility Dive: Solar".to_string()),
        };
        let value = serde_json::to_value(&classified).unwrap();

        assert_eq!(value["blast_id"], 4889393);
        assert_eq!(value["list"], "Utility Dive: Solar blast list");
        assert_eq!(value["stats"]["total"]["count"], 16796);
        assert_eq!(value["dive_email_type"], "blast");
        assert_eq!(value["dive_brand"], "Utility Dive: Solar");

        // Absent fields stay absent and nulls stay null
        let object = value.as_object().unwrap();
        assert!(!object.contains_key("subject"));
        assert!(!object.contains_key("name"));
        assert_eq!(object.get("suppress_list"), Some(&Value::Null));
        assert_eq!(object.len(), 6);
    }

    #[test]
    fn test_null_labels_round_trip_as_null() {
        let record: CampaignRecord = serde_json::from_value(json!({"labels": null, "list": "foo"})).unwrap();
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value, json!({"labels": null, "list": "foo"}));
    }

    #[test]
    fn test_builder_sets_classifier_fields() {
        let record = CampaignRecord::new()
            .with_labels(["Blast", "Retail"])
            .with_name("x-blast-y")
            .with_list_name("Retail Dive Blast List")
            .with_subject("Hello");

        assert!(record.has_label("Retail"));
        assert!(!record.has_label("retail"));
        assert_eq!(record.name(), "x-blast-y");
        assert_eq!(record.list_name(), "Retail Dive Blast List");
        assert_eq!(record.subject(), "Hello");
    }

    #[test]
    fn test_email_type_wire_names() {
        assert_eq!(serde_json::to_value(EmailType::WelcomeSeries).unwrap(), "welcome");
        assert_eq!(serde_json::to_value(EmailType::BreakingNews).unwrap(), "breaking");
        assert_eq!(EmailType::Audience.to_string(), "audience");
        assert_eq!(EmailType::default(), EmailType::Unknown);
    }

    #[test]
    fn test_stats_options_params() {
        assert!(StatsOptions::default().params().is_empty());

        let options = StatsOptions {
            clickmap: true,
            urls: true,
            ..Default::default()
        };
        let params = options.params();
        assert_eq!(params.len(), 2);
        assert_eq!(params["clickmap"], "1");
        assert_eq!(params["urls"], "1");
    }

    #[test]
    fn test_job_info_status() {
        let job: JobInfo = serde_json::from_value(json!({
            "job_id": "591b670d15dd96ab608b4c5f",
            "status": "completed",
            "list": "Just Eli",
            "export_url": "https://example.com/export",
        }))
        .unwrap();

        assert!(job.is_completed());
        assert!(!job.is_pending());
        assert_eq!(job.export_url.as_deref(), Some("https://example.com/export"));
        assert_eq!(job.extra["list"], "Just Eli");
    }
}
