mod client;
mod types;

pub use client::{ApiClient, FetchError};
pub use types::{
    AddDocumentsResponse, Collection, DiscoveryStarted, DocumentPreview, JobState, JobStatus,
    NewDocument, TopicAnswer, TopicDetail, TopicEdge, TopicGraph, TopicNode,
};
