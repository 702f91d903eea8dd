//! Message batches: creation, listing and result files.

use reqwest::Method;
use serde_json::Value;

use super::errors::ErrorResponse;
use super::message::Message;
use super::params::MessageCreateParams;
use crate::core::error::{DataError, LlmError};
use crate::core::open_enum::OpenEnum;
use crate::core::record::{Record, Validate};
use crate::core::request::{ApiRequest, IntoApiRequest, take_path_segment};
use crate::{api_enum, record, union};

const BATCHES_PATH: &str = "/v1/messages/batches";

#[api_enum]
pub enum ProcessingStatus {
    InProgress,
    Canceling,
    Ended,
}

#[record]
pub struct RequestCounts {
    pub processing: u64,
    pub succeeded: u64,
    pub errored: u64,
    pub canceled: u64,
    pub expired: u64,
}

#[record(tag = "message_batch")]
pub struct MessageBatch {
    pub id: String,
    pub processing_status: OpenEnum<ProcessingStatus>,
    pub request_counts: RequestCounts,
    pub created_at: String,
    pub expires_at: String,
    #[field(nullable)]
    pub ended_at: Option<String>,
    #[field(nullable)]
    pub archived_at: Option<String>,
    #[field(nullable)]
    pub cancel_initiated_at: Option<String>,
    /// Where the JSONL result file can be fetched once processing has ended.
    #[field(nullable)]
    pub results_url: Option<String>,
}

/// One request inside a batch.
#[record]
pub struct BatchRequest {
    /// Caller-chosen id, echoed back on the matching result line.
    pub custom_id: String,
    pub params: MessageCreateParams,
}

impl BatchRequest {
    pub fn new(
        custom_id: impl Into<String>,
        params: MessageCreateParams,
    ) -> Result<Self, DataError> {
        let mut request = Self::default();
        request.set_custom_id(custom_id.into())?;
        request.set_params(params)?;
        Ok(request)
    }
}

#[record]
pub struct BatchCreateParams {
    pub requests: Vec<BatchRequest>,
}

impl BatchCreateParams {
    pub fn new(requests: Vec<BatchRequest>) -> Result<Self, DataError> {
        let mut params = Self::default();
        params.set_requests(requests)?;
        Ok(params)
    }
}

impl IntoApiRequest for BatchCreateParams {
    type Response = MessageBatch;

    fn into_api_request(self) -> Result<ApiRequest, DataError> {
        Ok(ApiRequest::new(Method::POST, BATCHES_PATH).with_body(self.into_record()))
    }
}

/// Query for one page of batches. Every field travels in the query string.
#[record]
pub struct BatchListParams {
    pub limit: Option<u32>,
    pub before_id: Option<String>,
    pub after_id: Option<String>,
}

impl IntoApiRequest for BatchListParams {
    type Response = BatchList;

    fn into_api_request(self) -> Result<ApiRequest, DataError> {
        Ok(ApiRequest::new(Method::GET, BATCHES_PATH).with_query(self.into_record()))
    }
}

#[record]
pub struct BatchList {
    pub data: Vec<MessageBatch>,
    pub has_more: bool,
    #[field(nullable)]
    pub first_id: Option<String>,
    #[field(nullable)]
    pub last_id: Option<String>,
}

/// Fetch a single batch by id.
#[record]
pub struct BatchRetrieveParams {
    pub message_batch_id: String,
}

impl BatchRetrieveParams {
    pub fn new(message_batch_id: impl Into<String>) -> Self {
        let mut params = Self::default();
        params
            .record_mut()
            .insert_raw("message_batch_id", Value::String(message_batch_id.into()));
        params
    }
}

impl IntoApiRequest for BatchRetrieveParams {
    type Response = MessageBatch;

    fn into_api_request(mut self) -> Result<ApiRequest, DataError> {
        let id = take_path_segment(self.record_mut(), "message_batch_id")?;
        Ok(ApiRequest::new(Method::GET, format!("{BATCHES_PATH}/{id}")))
    }
}

/// Ask the API to stop a batch that is still processing.
#[record]
pub struct BatchCancelParams {
    pub message_batch_id: String,
}

impl BatchCancelParams {
    pub fn new(message_batch_id: impl Into<String>) -> Self {
        let mut params = Self::default();
        params
            .record_mut()
            .insert_raw("message_batch_id", Value::String(message_batch_id.into()));
        params
    }
}

impl IntoApiRequest for BatchCancelParams {
    type Response = MessageBatch;

    fn into_api_request(mut self) -> Result<ApiRequest, DataError> {
        let id = take_path_segment(self.record_mut(), "message_batch_id")?;
        Ok(ApiRequest::new(Method::POST, format!("{BATCHES_PATH}/{id}/cancel")))
    }
}

#[record(tag = "succeeded")]
pub struct SucceededResult {
    pub message: Message,
}

#[record(tag = "errored")]
pub struct ErroredResult {
    pub error: ErrorResponse,
}

#[record(tag = "canceled")]
pub struct CanceledResult {}

#[record(tag = "expired")]
pub struct ExpiredResult {}

/// Outcome of one batch request.
#[union(closed)]
pub enum BatchResult {
    #[variant(tag = "succeeded")]
    Succeeded(SucceededResult),
    #[variant(tag = "errored")]
    Errored(ErroredResult),
    #[variant(tag = "canceled")]
    Canceled(CanceledResult),
    #[variant(tag = "expired")]
    Expired(ExpiredResult),
}

/// One line of a batch result file.
#[record]
pub struct BatchIndividualResponse {
    pub custom_id: String,
    pub result: BatchResult,
}

/// Decode a JSONL batch result file.
///
/// Blank lines are skipped. Each response is shape-checked as it is read, so
/// a result kind this build does not know fails here with its line number.
pub fn decode_batch_results(jsonl: &str) -> Result<Vec<BatchIndividualResponse>, LlmError> {
    let mut responses = Vec::new();
    for (index, line) in jsonl.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let response = BatchIndividualResponse::from_json(line)
            .and_then(|response| response.check_shape().map(|()| response))
            .map_err(|e| LlmError::Parse {
                message: format!("batch result line {}", index + 1),
                source: Box::new(e),
            })?;
        responses.push(response);
    }
    Ok(responses)
}
