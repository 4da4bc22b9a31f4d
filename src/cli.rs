//! Command-line interface

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::classifier::{annotate, tally_by_type};
use crate::client::SailthruClient;
use crate::config::Config;
use crate::error::{Result, SailthruError};
use crate::models::{CampaignRecord, ClassifiedCampaign, EmailType, StatsOptions};
use crate::transport::HttpTransport;

#[derive(Parser, Debug)]
#[command(name = "dive-sailthru")]
#[command(version)]
#[command(about = "Classify Sailthru campaigns and run list jobs", long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "dive-sailthru.toml")]
    pub config: PathBuf,

    /// Verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Classify campaigns from a saved `blast` API response (no API calls)
    Classify {
        /// JSON file: a list of campaigns or an object with a `blasts` list
        input: PathBuf,

        /// Print counts per email type instead of the campaigns
        #[arg(long)]
        summary: bool,
    },

    /// Fetch sent campaigns in a date range, classified
    Campaigns {
        /// First day to include (YYYY-MM-DD)
        #[arg(long)]
        start: NaiveDate,

        /// Day to stop before (YYYY-MM-DD)
        #[arg(long)]
        end: NaiveDate,

        /// Only campaigns sent to this list
        #[arg(long)]
        list: Option<String>,

        /// Print counts per email type instead of the campaigns
        #[arg(long)]
        summary: bool,
    },

    /// Fetch stats for one campaign
    Stats {
        blast_id: i64,

        #[arg(long)]
        clickmap: bool,

        #[arg(long)]
        click_times: bool,

        #[arg(long)]
        device: bool,

        #[arg(long)]
        subject: bool,

        #[arg(long)]
        urls: bool,
    },

    /// Fetch metadata and content for one campaign
    Campaign { blast_id: i64 },

    /// List all primary lists
    Lists,

    /// Export a list's profiles
    ExportList {
        list: String,

        /// Profile field to include (repeatable)
        #[arg(long = "field")]
        fields: Vec<String>,

        /// Custom var to include (repeatable)
        #[arg(long = "var")]
        vars: Vec<String>,

        /// Return as soon as the job is created
        #[arg(long)]
        no_wait: bool,
    },

    /// Run a bulk update job from a JSON-lines file
    UpdateJob {
        file: String,

        /// Return as soon as the job is created
        #[arg(long)]
        no_wait: bool,
    },

    /// Show a job's status
    Job { job_id: String },

    /// Generate example configuration file
    InitConfig {
        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },
}

/// Default tracing directives when `RUST_LOG` is unset: our own crate at
/// info (debug with `--verbose`), everything else at warn
pub fn log_directives(verbose: bool) -> &'static str {
    if verbose {
        "dive_sailthru=debug,warn"
    } else {
        "dive_sailthru=info,warn"
    }
}

/// Counts per email type, as printed by `--summary`
#[derive(Debug, Serialize)]
pub struct Summary {
    pub total: usize,
    pub by_type: BTreeMap<EmailType, usize>,
    pub unknown_examples: Vec<String>,
}

impl Summary {
    pub fn from_campaigns(campaigns: &[ClassifiedCampaign]) -> Self {
        let unknown_examples = campaigns
            .iter()
            .filter(|c| c.email_type == EmailType::Unknown)
            .take(10)
            .map(|c| format!("{} ({})", c.campaign.name(), c.campaign.list_name()))
            .collect();

        Self {
            total: campaigns.len(),
            by_type: tally_by_type(campaigns),
            unknown_examples,
        }
    }
}

/// Read campaigns from a saved `blast` listing
pub fn load_campaign_dump(path: &Path) -> Result<Vec<CampaignRecord>> {
    let content = std::fs::read_to_string(path)?;
    let mut value: Value = serde_json::from_str(&content)?;

    let blasts = if value.get("blasts").is_some() {
        value["blasts"].take()
    } else {
        value
    };

    if !blasts.is_array() {
        return Err(SailthruError::InvalidResponse(format!(
            "{:?} does not contain a list of campaigns",
            path
        )));
    }

    Ok(serde_json::from_value(blasts)?)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_campaigns(campaigns: &[ClassifiedCampaign], summary: bool) -> Result<()> {
    if summary {
        print_json(&Summary::from_campaigns(campaigns))
    } else {
        print_json(&campaigns)
    }
}

fn job_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    // Template is a literal, so this only fails if it is edited badly
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed:>6}] {msg}") {
        pb.set_style(style.tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ "));
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

async fn connect(config_path: &Path) -> Result<SailthruClient<HttpTransport>> {
    let config = Config::load(config_path).await?;
    SailthruClient::from_config(&config)
}

/// Execute the selected command
pub async fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Classify { input, summary } => {
            let campaigns: Vec<ClassifiedCampaign> =
                load_campaign_dump(input)?.into_iter().map(annotate).collect();
            info!("Classified {} campaign(s) from {:?}", campaigns.len(), input);
            print_campaigns(&campaigns, *summary)
        }

        Commands::InitConfig { force } => {
            if cli.config.exists() && !force {
                return Err(SailthruError::Config(format!(
                    "{:?} already exists, use --force to overwrite",
                    cli.config
                )));
            }
            Config::create_example(&cli.config).await?;
            println!("Wrote example configuration to {:?}", cli.config);
            Ok(())
        }

        Commands::Campaigns {
            start,
            end,
            list,
            summary,
        } => {
            let client = connect(&cli.config).await?;
            let campaigns = client
                .get_campaigns_in_range(*start, *end, list.as_deref())
                .await?;
            print_campaigns(&campaigns, *summary)
        }

        Commands::Stats {
            blast_id,
            clickmap,
            click_times,
            device,
            subject,
            urls,
        } => {
            let options = StatsOptions {
                clickmap: *clickmap,
                click_times: *click_times,
                device: *device,
                subject: *subject,
                urls: *urls,
            };
            let client = connect(&cli.config).await?;
            print_json(&client.get_campaign_stats(*blast_id, options).await?)
        }

        Commands::Campaign { blast_id } => {
            let client = connect(&cli.config).await?;
            print_json(&client.get_campaign_data(*blast_id).await?)
        }

        Commands::Lists => {
            let client = connect(&cli.config).await?;
            print_json(&client.get_primary_lists().await?)
        }

        Commands::ExportList {
            list,
            fields,
            vars,
            no_wait,
        } => {
            let client = connect(&cli.config).await?;
            let pb = job_spinner(&format!("Exporting '{}'", list));
            let result = client.export_list(list, fields, vars, !no_wait).await;
            pb.finish_and_clear();
            print_json(&result?)
        }

        Commands::UpdateJob { file, no_wait } => {
            let client = connect(&cli.config).await?;
            let pb = job_spinner(&format!("Updating from '{}'", file));
            let result = client.update_job_from_file(file, !no_wait).await;
            pb.finish_and_clear();
            print_json(&result?)
        }

        Commands::Job { job_id } => {
            let client = connect(&cli.config).await?;
            print_json(&client.get_job_info(job_id).await?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_parse_campaigns_command() {
        let cli = Cli::parse_from([
            "dive-sailthru",
            "campaigns",
            "--start",
            "2017-04-01",
            "--end",
            "2017-06-05",
            "--list",
            "Mobile Marketer",
        ]);

        match cli.command {
            Commands::Campaigns { start, end, list, summary } => {
                assert_eq!(start, NaiveDate::from_ymd_opt(2017, 4, 1).unwrap());
                assert_eq!(end, NaiveDate::from_ymd_opt(2017, 6, 5).unwrap());
                assert_eq!(list.as_deref(), Some("Mobile Marketer"));
                assert!(!summary);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_export_list_repeated_fields() {
        let cli = Cli::parse_from([
            "dive-sailthru",
            "export-list",
            "Just Eli",
            "--field",
            "email",
            "--field",
            "lists",
            "--var",
            "company",
            "--no-wait",
        ]);

        match cli.command {
            Commands::ExportList { list, fields, vars, no_wait } => {
                assert_eq!(list, "Just Eli");
                assert_eq!(fields, vec!["email", "lists"]);
                assert_eq!(vars, vec!["company"]);
                assert!(no_wait);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_load_campaign_dump_listing_object() {
        let file = write_temp(
            r#"{"filtered_count": 1, "blasts": [{"labels": ["Blast"], "list": "Retail Dive Blast List", "name": "x-blast-y"}]}"#,
        );
        let campaigns = load_campaign_dump(file.path()).unwrap();
        assert_eq!(campaigns.len(), 1);
        assert_eq!(campaigns[0].list_name(), "Retail Dive Blast List");
    }

    #[test]
    fn test_load_campaign_dump_bare_array() {
        let file = write_temp(r#"[{"list": "foo"}, {"subject": "BREAKING news"}]"#);
        let campaigns = load_campaign_dump(file.path()).unwrap();
        assert_eq!(campaigns.len(), 2);
    }

    #[test]
    fn test_load_campaign_dump_rejects_non_list() {
        let file = write_temp(r#"{"blasts": {"not": "a list"}}"#);
        assert!(matches!(
            load_campaign_dump(file.path()),
            Err(SailthruError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_classify_output_can_be_classified_again() {
        let file = write_temp(
            r#"[{"blast_id": 4889393, "labels": ["Blast"], "list": "Utility Dive: Solar blast list", "name": "ABB-blast-UD"}]"#,
        );
        let first: Vec<ClassifiedCampaign> = load_campaign_dump(file.path())
            .unwrap()
            .into_iter()
            .map(annotate)
            .collect();
        let first_output = serde_json::to_string(&first).unwrap();

        let again = write_temp(&first_output);
        let second: Vec<ClassifiedCampaign> = load_campaign_dump(again.path())
            .unwrap()
            .into_iter()
            .map(annotate)
            .collect();
        let second_output = serde_json::to_string(&second).unwrap();

        assert_eq!(second_output.matches("\"dive_email_type\"").count(), 1);
        assert_eq!(second_output.matches("\"dive_brand\"").count(), 1);
        assert!(!second_output.contains("\"subject\""));

        let first_value: Value = serde_json::from_str(&first_output).unwrap();
        let second_value: Value = serde_json::from_str(&second_output).unwrap();
        assert_eq!(first_value, second_value);
        assert_eq!(second_value[0]["dive_brand"], "Utility Dive: Solar");
    }

    #[test]
    fn test_log_directives_parse() {
        assert_eq!(log_directives(false), "dive_sailthru=info,warn");
        assert_eq!(log_directives(true), "dive_sailthru=debug,warn");
        for verbose in [false, true] {
            assert!(tracing_subscriber::EnvFilter::try_new(log_directives(verbose)).is_ok());
        }
    }

    #[test]
    fn test_summary() {
        let campaigns: Vec<ClassifiedCampaign> = vec![
            CampaignRecord::new().with_list_name("foo").with_name("mystery"),
            CampaignRecord::new()
                .with_labels(["newsletter"])
                .with_list_name("Mobile Marketer"),
        ]
        .into_iter()
        .map(annotate)
        .collect();

        let summary = Summary::from_campaigns(&campaigns);
        assert_eq!(summary.total, 2);
        assert_eq!(summary.by_type.get(&EmailType::Newsletter), Some(&1));
        assert_eq!(summary.unknown_examples, vec!["mystery (foo)"]);

        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["by_type"]["unknown"], 1);
    }
}
