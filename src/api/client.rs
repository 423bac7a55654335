use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::StatusCode;
use reqwest::blocking::{Client, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use thiserror::Error;
use tracing::debug;

use super::types::{
    AddDocumentsResponse, Collection, DiscoveryStarted, DocumentPreview, JobStatus, NewDocument,
    TopicAnswer, TopicDetail, TopicGraph,
};

/// Failure classes the polling and view layers branch on. `NotFound` clears
/// client-side state, `Transient` preserves the last known snapshot, and
/// `Malformed` marks a payload that decoded but broke the data model.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("resource not found")]
    NotFound,
    #[error("backend unreachable: {0}")]
    Transient(String),
    #[error("malformed payload: {0}")]
    Malformed(String),
}

#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_owned(),
        })
    }

    pub fn list_collections(&self) -> Result<Vec<Collection>, FetchError> {
        self.get_json("/collections")
    }

    pub fn fetch_graph(&self, collection_id: i64) -> Result<TopicGraph, FetchError> {
        self.get_json(&format!("/collections/{collection_id}/topics/graph"))
    }

    pub fn fetch_job_status(&self, collection_id: i64) -> Result<JobStatus, FetchError> {
        self.get_json(&format!("/collections/{collection_id}/discover/status"))
    }

    pub fn fetch_topic(&self, topic_id: i64) -> Result<TopicDetail, FetchError> {
        self.get_json(&format!("/topics/{topic_id}"))
    }

    pub fn fetch_document(
        &self,
        collection_id: i64,
        document_id: i64,
    ) -> Result<DocumentPreview, FetchError> {
        self.get_json(&format!(
            "/collections/{collection_id}/documents/{document_id}"
        ))
    }

    pub fn start_discovery(
        &self,
        collection_id: i64,
        incremental: bool,
    ) -> Result<DiscoveryStarted, FetchError> {
        self.post_json(
            &format!("/collections/{collection_id}/discover"),
            &json!({ "incremental": incremental }),
        )
    }

    pub fn ask_topic(&self, topic_id: i64, question: &str) -> Result<TopicAnswer, FetchError> {
        self.post_json(
            &format!("/topics/{topic_id}/ask"),
            &json!({ "question": question }),
        )
    }

    pub fn add_documents(
        &self,
        collection_id: i64,
        documents: Vec<NewDocument>,
    ) -> Result<AddDocumentsResponse, FetchError> {
        self.post_json(
            &format!("/collections/{collection_id}/documents"),
            &json!({ "documents": documents, "trigger_discovery": true }),
        )
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, FetchError> {
        debug!(path, "GET");
        let response = self
            .http
            .get(format!("{}{path}", self.base_url))
            .send()
            .map_err(|error| FetchError::Transient(error.to_string()))?;
        decode(response)
    }

    fn post_json<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, FetchError> {
        debug!(path, "POST");
        let response = self
            .http
            .post(format!("{}{path}", self.base_url))
            .json(body)
            .send()
            .map_err(|error| FetchError::Transient(error.to_string()))?;
        decode(response)
    }
}

fn decode<T: DeserializeOwned>(response: Response) -> Result<T, FetchError> {
    match response.status() {
        StatusCode::NOT_FOUND => Err(FetchError::NotFound),
        status if status.is_success() => response
            .json()
            .map_err(|error| FetchError::Malformed(error.to_string())),
        status => Err(FetchError::Transient(format!("HTTP {status}"))),
    }
}
