use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use aws_sdk_dynamodb::config::Region;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::{AttributeValue, Select, TableStatus};
use base64::Engine as _;
use count_core::{Consistency, CountStore, ScanPage, ScanRequest};
use serde_json::{json, Map, Value};
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Delay between table readiness checks (same cadence as the SDK waiters).
pub const READY_POLL_INTERVAL: Duration = Duration::from_secs(20);
pub const DEFAULT_READY_TIMEOUT: Duration = Duration::from_secs(500);

const CANCELLED: &str = "cancelled";

pub type LastEvaluatedKey = HashMap<String, AttributeValue>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreSettings {
    pub table_name: String,
    pub profile: String,
    pub region: String,
    pub endpoint: Option<String>,
    pub page_timeout: Option<Duration>,
    pub ready_timeout: Duration,
}

/// DynamoDB-backed [`CountStore`].
///
/// The SDK is async while segment workers are plain threads, so every call is
/// driven to completion on the runtime behind `runtime`. Workers must not run
/// on that runtime's own threads.
///
/// Cancelling the bound token aborts the readiness wait and any scan call in
/// flight; an aborted scan comes back as a failure page.
#[derive(Debug, Clone)]
pub struct DynamoDbStore {
    client: aws_sdk_dynamodb::Client,
    table_name: String,
    runtime: Handle,
    page_timeout: Option<Duration>,
    ready_timeout: Duration,
    poll_interval: Duration,
    cancel: CancellationToken,
}

impl DynamoDbStore {
    pub async fn connect(settings: &StoreSettings, runtime: Handle) -> Self {
        let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .profile_name(&settings.profile)
            .region(Region::new(settings.region.clone()))
            .load()
            .await;

        let mut builder = aws_sdk_dynamodb::config::Builder::from(&sdk_config);
        if let Some(endpoint) = &settings.endpoint {
            builder = builder.endpoint_url(endpoint);
        }

        Self::from_client(
            aws_sdk_dynamodb::Client::from_conf(builder.build()),
            settings,
            runtime,
        )
    }

    pub fn from_client(
        client: aws_sdk_dynamodb::Client,
        settings: &StoreSettings,
        runtime: Handle,
    ) -> Self {
        Self {
            client,
            table_name: settings.table_name.clone(),
            runtime,
            page_timeout: settings.page_timeout,
            ready_timeout: settings.ready_timeout,
            poll_interval: READY_POLL_INTERVAL,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    async fn poll_until_active(&self) -> Result<(), String> {
        let deadline = tokio::time::Instant::now() + self.ready_timeout;

        loop {
            let described = bounded(
                self.client.describe_table().table_name(&self.table_name).send(),
                None,
                &self.cancel,
            )
            .await
            .map_err(|reason| format!("{reason} while waiting for table"))?;

            match described {
                Ok(output) => {
                    let status = output.table().and_then(|table| table.table_status());
                    if status == Some(&TableStatus::Active) {
                        return Ok(());
                    }
                    debug!(table = %self.table_name, ?status, "table exists but is not active yet");
                }
                Err(error) => {
                    let missing = error
                        .as_service_error()
                        .is_some_and(|service_error| service_error.is_resource_not_found_exception());
                    if !missing {
                        return Err(format!(
                            "failed to describe table: {}",
                            DisplayErrorContext(&error)
                        ));
                    }
                    debug!(table = %self.table_name, "table does not exist yet");
                }
            }

            if tokio::time::Instant::now() + self.poll_interval > deadline {
                return Err(format!(
                    "table did not become active within {}s",
                    self.ready_timeout.as_secs()
                ));
            }
            bounded(tokio::time::sleep(self.poll_interval), None, &self.cancel)
                .await
                .map_err(|reason| format!("{reason} while waiting for table"))?;
        }
    }

    async fn describe_item_count(&self) -> Result<u64, String> {
        let output = bounded(
            self.client.describe_table().table_name(&self.table_name).send(),
            None,
            &self.cancel,
        )
        .await?
        .map_err(|error| format!("failed to describe table: {}", DisplayErrorContext(&error)))?;

        output
            .table()
            .and_then(|table| table.item_count())
            .map(|count| u64::try_from(count).unwrap_or(0))
            .ok_or_else(|| "table description has no item count".to_string())
    }

    async fn scan_count(
        &self,
        request: &ScanRequest<LastEvaluatedKey>,
    ) -> Result<ScanPage<LastEvaluatedKey>, String> {
        let call = self
            .client
            .scan()
            .table_name(&self.table_name)
            .select(Select::Count)
            .consistent_read(request.consistency == Consistency::Strong)
            .segment(to_sdk_int(request.segment_index))
            .total_segments(to_sdk_int(request.total_segments))
            .limit(to_sdk_int(request.page_size_limit))
            .set_exclusive_start_key(request.continuation_token.clone())
            .send();

        let output = bounded(call, self.page_timeout, &self.cancel)
            .await?
            .map_err(|error| format!("scan failed: {}", DisplayErrorContext(&error)))?;

        let item_count = u64::try_from(output.count()).unwrap_or(0);
        let continuation_token = output.last_evaluated_key.filter(|key| !key.is_empty());
        Ok(ScanPage::success(item_count, continuation_token))
    }
}

impl CountStore for DynamoDbStore {
    type Token = LastEvaluatedKey;

    fn table_name(&self) -> &str {
        &self.table_name
    }

    fn wait_until_ready(&self) -> Result<(), String> {
        self.runtime.block_on(self.poll_until_active())
    }

    fn approximate_item_count(&self) -> Result<u64, String> {
        self.runtime.block_on(self.describe_item_count())
    }

    fn scan_page(&self, request: &ScanRequest<LastEvaluatedKey>) -> ScanPage<LastEvaluatedKey> {
        self.runtime
            .block_on(self.scan_count(request))
            .unwrap_or_else(ScanPage::failure)
    }

    /// Renders the key in DynamoDB JSON, the form `--exclusive-start-key`
    /// takes on the AWS CLI.
    fn encode_token(&self, token: &LastEvaluatedKey) -> String {
        key_to_json(token).to_string()
    }
}

/// Runs `call` until it completes, `timeout` elapses or `cancel` fires.
async fn bounded<F: Future>(
    call: F,
    timeout: Option<Duration>,
    cancel: &CancellationToken,
) -> Result<F::Output, String> {
    let timed = async {
        match timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| format!("timed out after {}ms", limit.as_millis())),
            None => Ok(call.await),
        }
    };

    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(CANCELLED.to_string()),
        result = timed => result,
    }
}

fn key_to_json(key: &LastEvaluatedKey) -> Value {
    let attributes: Map<String, Value> = key
        .iter()
        .map(|(name, value)| (name.clone(), attribute_to_json(value)))
        .collect();
    Value::Object(attributes)
}

// Key attributes are always S, N or B.
fn attribute_to_json(value: &AttributeValue) -> Value {
    match value {
        AttributeValue::S(text) => json!({ "S": text }),
        AttributeValue::N(number) => json!({ "N": number }),
        AttributeValue::B(blob) => {
            json!({ "B": base64::engine::general_purpose::STANDARD.encode(blob.as_ref()) })
        }
        other => json!({ "UNSUPPORTED": format!("{other:?}") }),
    }
}

fn to_sdk_int(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}
