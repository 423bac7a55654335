//! Wire-level data model for the topic discovery backend, mirroring its JSON
//! payloads field for field.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobState {
    Pending,
    Running,
    Succeeded,
    Failed,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct JobStatus {
    pub job_id: i64,
    #[serde(rename = "status")]
    pub state: JobState,
    #[serde(default)]
    pub progress: f32,
    #[serde(default)]
    pub current_step: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Collection {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub document_count: u32,
    #[serde(default)]
    pub topic_count: u32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct TopicNode {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub size_score: f32,
    #[serde(default)]
    pub document_count: u32,
    #[serde(default)]
    pub avg_confidence: f32,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct TopicEdge {
    pub source: String,
    pub target: String,
    pub weight: f32,
    #[serde(rename = "type", default)]
    pub edge_type: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct TopicGraph {
    #[serde(default)]
    pub nodes: Vec<TopicNode>,
    #[serde(default)]
    pub edges: Vec<TopicEdge>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct TopicInsights {
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub themes: Vec<String>,
    #[serde(default)]
    pub common_questions: Vec<String>,
    #[serde(default)]
    pub related_concepts: Vec<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct TopicDocument {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub content_preview: String,
    #[serde(default)]
    pub relevance_score: f32,
    #[serde(default)]
    pub is_primary: bool,
}

#[derive(Clone, Debug, Deserialize)]
pub struct RelatedTopic {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub similarity_score: f32,
    #[serde(default)]
    pub relationship_type: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct TopicDetail {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub document_count: u32,
    #[serde(default)]
    pub size_score: f32,
    #[serde(default)]
    pub insights: Option<TopicInsights>,
    #[serde(default)]
    pub documents: Vec<TopicDocument>,
    #[serde(default)]
    pub related_topics: Vec<RelatedTopic>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct DocumentPreview {
    pub id: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct DiscoveryStarted {
    pub job_id: i64,
    pub collection_id: i64,
    #[serde(default)]
    pub status: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct NewDocument {
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct AddDocumentsResponse {
    pub documents_added: u32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct TopicAnswer {
    pub answer: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_status_decodes_wire_casing() {
        let status: JobStatus = serde_json::from_str(
            r##"{"job_id": 7, "status": "RUNNING", "progress": 0.4, "current_step": "clustering"}"##,
        )
        .unwrap();

        assert_eq!(status.state, JobState::Running);
        assert!(!status.state.is_terminal());
        assert_eq!(status.progress, 0.4);
        assert_eq!(status.current_step.as_deref(), Some("clustering"));
        assert!(status.error_message.is_none());
    }

    #[test]
    fn terminal_states() {
        assert!(JobState::Succeeded.is_terminal());
        assert!(JobState::Failed.is_terminal());
        assert!(!JobState::Pending.is_terminal());
    }

    #[test]
    fn graph_decodes_edge_type_field() {
        let graph: TopicGraph = serde_json::from_str(
            r##"{
                "nodes": [
                    {"id": "t1", "label": "billing", "size_score": 0.8, "document_count": 12, "avg_confidence": 0.7, "color": "#3498db"},
                    {"id": "t2", "label": "refunds", "size_score": 0.3, "document_count": 4, "avg_confidence": 0.5, "color": "#e74c3c"}
                ],
                "edges": [
                    {"source": "t1", "target": "t2", "weight": 0.5, "type": "related"}
                ]
            }"##,
        )
        .unwrap();

        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(graph.nodes[0].color.as_deref(), Some("#3498db"));
        assert_eq!(graph.edges[0].edge_type, "related");
        assert_eq!(graph.edges[0].weight, 0.5);
    }

    #[test]
    fn topic_answer_decodes() {
        let reply: TopicAnswer = serde_json::from_str(
            r##"{"answer": "Mostly refund disputes tagged #billing.", "citations": []}"##,
        )
        .unwrap();
        assert_eq!(reply.answer, "Mostly refund disputes tagged #billing.");
    }

    #[test]
    fn add_documents_response_ignores_extra_fields() {
        let response: AddDocumentsResponse = serde_json::from_str(
            r##"{"documents_added": 2, "document_ids": [10, 11], "incremental_discovery_triggered": true}"##,
        )
        .unwrap();
        assert_eq!(response.documents_added, 2);
    }
}
