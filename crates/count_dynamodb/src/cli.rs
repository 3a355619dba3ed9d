use std::time::Duration;

use clap::{Parser, ValueEnum};
use count_core::{DEFAULT_PAGE_SIZE_LIMIT, DEFAULT_TOTAL_SEGMENTS};

use crate::adapters::dynamodb::{StoreSettings, DEFAULT_READY_TIMEOUT};

#[derive(Debug, Parser)]
#[command(
    name = "table_count",
    about = "Consistent, parallel item count of a DynamoDB table",
    long_about = "Counts every item of a DynamoDB table with strongly consistent,\n\
                  count-only scans split across parallel segments."
)]
pub struct Cli {
    /// Name of the table to count
    #[arg(short = 't', long, env = "TABLE_COUNT_TABLE")]
    pub table: String,

    /// AWS credentials profile, as defined in ~/.aws/credentials
    #[arg(short = 'p', long, env = "TABLE_COUNT_PROFILE", default_value = "default")]
    pub profile: String,

    /// AWS region (ex: eu-west-1)
    #[arg(short = 'r', long, env = "TABLE_COUNT_REGION", default_value = "us-east-1")]
    pub region: String,

    /// DynamoDB endpoint override (ex: http://localhost:8000)
    #[arg(short = 'e', long, env = "TABLE_COUNT_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Number of segments the scan is split into; one worker per segment
    #[arg(short = 's', long, env = "TABLE_COUNT_SEGMENTS", default_value_t = DEFAULT_TOTAL_SEGMENTS)]
    pub segments: u32,

    /// Maximum items counted per request, so one worker cannot take all of
    /// the table's read capacity
    #[arg(short = 'l', long, env = "TABLE_COUNT_LIMIT", default_value_t = DEFAULT_PAGE_SIZE_LIMIT)]
    pub limit: u32,

    /// Print only the final count
    #[arg(short = 'n', long, visible_alias = "no")]
    pub silent: bool,

    /// Abort a segment when one page takes longer than this
    #[arg(long)]
    pub page_timeout_secs: Option<u64>,

    /// How long to wait for the table to exist and become active
    #[arg(long, default_value_t = DEFAULT_READY_TIMEOUT.as_secs())]
    pub ready_timeout_secs: u64,

    /// Output format for the final report (ignored with --silent)
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary
    Text,
    /// Full report as JSON
    Json,
}

impl Cli {
    pub fn store_settings(&self) -> StoreSettings {
        StoreSettings {
            table_name: self.table.clone(),
            profile: self.profile.clone(),
            region: self.region.clone(),
            endpoint: self.endpoint.clone(),
            page_timeout: self.page_timeout_secs.map(Duration::from_secs),
            ready_timeout: Duration::from_secs(self.ready_timeout_secs),
        }
    }

    /// Default log filter when `RUST_LOG` is unset. Silent runs only surface
    /// errors so stdout/stderr stay clean.
    pub fn default_log_directive(&self) -> &'static str {
        if self.silent {
            "error"
        } else {
            "warn"
        }
    }
}
