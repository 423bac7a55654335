use std::collections::HashMap;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};

use eframe::egui::{self, Color32, Context, Vec2};
use tracing::warn;

use crate::api::{
    ApiClient, Collection, DiscoveryStarted, DocumentPreview, FetchError, JobState, NewDocument,
    TopicAnswer, TopicDetail, TopicGraph,
};
use crate::util::topic_id_from_node;

mod graph;
mod physics;
mod poll;
mod render_utils;
mod ui;

use poll::PollingController;

pub struct TopicAtlasApp {
    api_url: String,
    poll_interval: Duration,
    api: Option<Arc<ApiClient>>,
    state: AppState,
}

enum AppState {
    Loading {
        rx: Receiver<Result<Vec<Collection>, FetchError>>,
    },
    Ready(Box<ViewModel>),
    Error(String),
}

struct ViewModel {
    api: Arc<ApiClient>,
    collections: Vec<Collection>,
    selected_collection: Option<i64>,
    poller: PollingController,

    collections_rx: Option<Receiver<Result<Vec<Collection>, FetchError>>>,
    graph_rx: Option<Receiver<Result<TopicGraph, FetchError>>>,
    topic_rx: Option<Receiver<Result<TopicDetail, FetchError>>>,
    document_rx: Option<Receiver<Result<DocumentPreview, FetchError>>>,
    discovery_rx: Option<Receiver<Result<DiscoveryStarted, FetchError>>>,
    add_documents_rx: Option<Receiver<Result<crate::api::AddDocumentsResponse, FetchError>>>,
    answer_rx: Option<Receiver<Result<TopicAnswer, FetchError>>>,

    render_graph: Option<RenderGraph>,
    graph_error: Option<String>,
    selected_topic: Option<TopicDetail>,
    document_preview: Option<DocumentPreview>,
    action_error: Option<String>,
    action_notice: Option<String>,
    question: String,
    answer: Option<String>,

    add_document_open: bool,
    add_document_title: String,
    add_document_content: String,

    search: String,
    selected_node: Option<String>,
    pending_node_click: Option<String>,
    pending_document_click: Option<i64>,
    pending_related_topic_click: Option<i64>,

    pan: Vec2,
    zoom: f32,
    drag_node: Option<usize>,
}

/// Simulation-ready graph: the node table plus resolved edges, with the
/// layout engine's mutable state attached.
struct RenderGraph {
    nodes: Vec<RenderNode>,
    edges: Vec<RenderEdge>,
    index_by_id: HashMap<String, usize>,
    alpha: f32,
    alpha_target: f32,
    forces_scratch: Vec<Vec2>,
}

struct RenderNode {
    id: String,
    label: String,
    color: Color32,
    document_count: u32,
    avg_confidence: f32,
    radius: f32,
    world_pos: Vec2,
    velocity: Vec2,
    pinned: Option<Vec2>,
}

struct RenderEdge {
    source: usize,
    target: usize,
    weight: f32,
}

/// Runs one backend call on a worker thread; the result comes back over a
/// channel the UI thread drains each frame.
fn spawn_fetch<T, F>(api: &Arc<ApiClient>, call: F) -> Receiver<Result<T, FetchError>>
where
    T: Send + 'static,
    F: FnOnce(&ApiClient) -> Result<T, FetchError> + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    let api = Arc::clone(api);
    thread::spawn(move || {
        let _ = tx.send(call(&api));
    });
    rx
}

/// Non-blocking drain of a one-shot fetch. A worker that died without
/// replying surfaces as a transient error rather than a hang.
fn drain<T>(slot: &mut Option<Receiver<Result<T, FetchError>>>) -> Option<Result<T, FetchError>> {
    let rx = slot.take()?;
    match rx.try_recv() {
        Ok(result) => Some(result),
        Err(TryRecvError::Empty) => {
            *slot = Some(rx);
            None
        }
        Err(TryRecvError::Disconnected) => {
            Some(Err(FetchError::Transient("worker exited".to_owned())))
        }
    }
}

impl TopicAtlasApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        api_url: String,
        poll_interval: Duration,
    ) -> Self {
        let mut app = Self {
            api_url,
            poll_interval,
            api: None,
            state: AppState::Error(String::new()),
        };
        app.start_load();
        app
    }

    fn start_load(&mut self) {
        match ApiClient::new(&self.api_url) {
            Ok(client) => {
                let api = Arc::new(client);
                self.state = AppState::Loading {
                    rx: spawn_fetch(&api, |api| api.list_collections()),
                };
                self.api = Some(api);
            }
            Err(error) => {
                self.state = AppState::Error(error.to_string());
            }
        }
    }
}

impl eframe::App for TopicAtlasApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;
        let mut retry = false;

        match &mut self.state {
            AppState::Loading { rx } => {
                match rx.try_recv() {
                    Ok(Ok(collections)) => {
                        if let Some(api) = &self.api {
                            transition = Some(AppState::Ready(Box::new(ViewModel::new(
                                Arc::clone(api),
                                collections,
                                self.poll_interval,
                            ))));
                        }
                    }
                    Ok(Err(error)) => {
                        transition = Some(AppState::Error(error.to_string()));
                    }
                    Err(TryRecvError::Empty) => {
                        ctx.request_repaint_after(Duration::from_millis(100));
                    }
                    Err(TryRecvError::Disconnected) => {
                        transition = Some(AppState::Error(
                            "collection load worker disconnected".to_owned(),
                        ));
                    }
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Connecting to the topic discovery backend...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
            }
            AppState::Error(error) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to reach the topic discovery backend");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    if ui.button("Retry").clicked() {
                        retry = true;
                    }
                });
            }
            AppState::Ready(model) => {
                model.show(ctx, Instant::now());
            }
        }

        if let Some(next_state) = transition {
            self.state = next_state;
        }
        if retry {
            self.start_load();
        }
    }
}

impl ViewModel {
    fn new(api: Arc<ApiClient>, collections: Vec<Collection>, poll_interval: Duration) -> Self {
        let poll_api = Arc::clone(&api);
        let poller = PollingController::new(
            Box::new(move |collection_id| {
                let api = Arc::clone(&poll_api);
                let (tx, rx) = mpsc::channel();
                thread::spawn(move || {
                    let _ = tx.send(api.fetch_job_status(collection_id));
                });
                rx
            }),
            poll_interval,
        );

        let mut model = Self {
            api,
            collections,
            selected_collection: None,
            poller,
            collections_rx: None,
            graph_rx: None,
            topic_rx: None,
            document_rx: None,
            discovery_rx: None,
            add_documents_rx: None,
            answer_rx: None,
            render_graph: None,
            graph_error: None,
            selected_topic: None,
            document_preview: None,
            action_error: None,
            action_notice: None,
            question: String::new(),
            answer: None,
            add_document_open: false,
            add_document_title: String::new(),
            add_document_content: String::new(),
            search: String::new(),
            selected_node: None,
            pending_node_click: None,
            pending_document_click: None,
            pending_related_topic_click: None,
            pan: Vec2::ZERO,
            zoom: 1.0,
            drag_node: None,
        };

        if let Some(first) = model.collections.first().map(|collection| collection.id) {
            model.select_collection(first);
        }
        model
    }

    /// Switching collection atomically retargets the poll loop and discards
    /// everything tied to the old one.
    fn select_collection(&mut self, collection_id: i64) {
        self.selected_collection = Some(collection_id);
        self.selected_topic = None;
        self.selected_node = None;
        self.document_preview = None;
        self.graph_error = None;
        self.render_graph = None;
        self.answer_rx = None;
        self.question.clear();
        self.answer = None;
        self.reload_graph();
        self.poller.start(collection_id);
    }

    fn reload_graph(&mut self) {
        if let Some(collection_id) = self.selected_collection {
            self.graph_rx = Some(spawn_fetch(&self.api, move |api| {
                api.fetch_graph(collection_id)
            }));
        }
    }

    fn reload_collections(&mut self) {
        self.collections_rx = Some(spawn_fetch(&self.api, |api| api.list_collections()));
    }

    fn request_discovery(&mut self, incremental: bool) {
        if let Some(collection_id) = self.selected_collection {
            self.discovery_rx = Some(spawn_fetch(&self.api, move |api| {
                api.start_discovery(collection_id, incremental)
            }));
        }
    }

    fn submit_new_document(&mut self) {
        let Some(collection_id) = self.selected_collection else {
            return;
        };
        let content = self.add_document_content.trim().to_owned();
        if content.is_empty() {
            return;
        }
        let title = {
            let title = self.add_document_title.trim();
            (!title.is_empty()).then(|| title.to_owned())
        };
        self.add_document_title.clear();
        self.add_document_content.clear();

        let document = NewDocument { content, title };
        self.action_notice = None;
        self.add_documents_rx = Some(spawn_fetch(&self.api, move |api| {
            api.add_documents(collection_id, vec![document])
        }));
    }

    fn ask_question(&mut self) {
        let Some(topic_id) = self.selected_topic.as_ref().map(|topic| topic.id) else {
            return;
        };
        let question = self.question.trim().to_owned();
        if question.is_empty() {
            return;
        }
        self.answer = None;
        self.answer_rx = Some(spawn_fetch(&self.api, move |api| {
            api.ask_topic(topic_id, &question)
        }));
    }

    /// Drains worker results, forwards view-layer clicks into fetches, and
    /// advances the poll loop. Called once per frame before any panel.
    fn process_background(&mut self, ctx: &Context, now: Instant) {
        if let Some(result) = drain(&mut self.collections_rx) {
            match result {
                Ok(collections) => {
                    self.collections = collections;
                    if let Some(selected) = self.selected_collection
                        && !self
                            .collections
                            .iter()
                            .any(|collection| collection.id == selected)
                    {
                        self.selected_collection = None;
                        self.poller.clear();
                        self.render_graph = None;
                        self.selected_topic = None;
                        self.selected_node = None;
                    }
                    if self.selected_collection.is_none()
                        && let Some(first) =
                            self.collections.first().map(|collection| collection.id)
                    {
                        self.select_collection(first);
                    }
                }
                Err(error) => {
                    warn!(%error, "collection reload failed");
                    self.action_error = Some(format!("Collections: {error}"));
                }
            }
        }

        if let Some(result) = drain(&mut self.graph_rx) {
            match result {
                Ok(wire) => {
                    self.graph_error = None;
                    let prior = self.render_graph.take();
                    self.render_graph = Some(RenderGraph::build(&wire, prior.as_ref()));
                    // Index into the old node table is meaningless now.
                    self.drag_node = None;
                }
                Err(FetchError::NotFound) => {
                    self.graph_error = None;
                    self.render_graph = None;
                }
                Err(error) => {
                    warn!(%error, "graph fetch failed");
                    self.graph_error = Some(format!("Graph: {error}"));
                }
            }
        }

        if let Some(result) = drain(&mut self.topic_rx) {
            match result {
                Ok(topic) => {
                    self.action_error = None;
                    // The answer belonged to the previously shown topic.
                    if self.selected_topic.as_ref().map(|prior| prior.id) != Some(topic.id) {
                        self.answer = None;
                        self.answer_rx = None;
                    }
                    self.selected_topic = Some(topic);
                }
                Err(error) => {
                    warn!(%error, "topic fetch failed");
                    self.action_error = Some(format!("Topic: {error}"));
                }
            }
        }

        if let Some(result) = drain(&mut self.document_rx) {
            match result {
                Ok(preview) => {
                    self.action_error = None;
                    self.document_preview = Some(preview);
                }
                Err(error) => {
                    warn!(%error, "document fetch failed");
                    self.action_error = Some(format!("Document: {error}"));
                }
            }
        }

        if let Some(result) = drain(&mut self.discovery_rx) {
            match result {
                Ok(started) => {
                    self.action_error = None;
                    self.poller.start(started.collection_id);
                }
                Err(error) => {
                    warn!(%error, "discovery request failed");
                    self.action_error = Some(format!("Discovery: {error}"));
                }
            }
        }

        if let Some(result) = drain(&mut self.add_documents_rx) {
            match result {
                Ok(response) => {
                    self.action_error = None;
                    self.action_notice = Some(format!(
                        "Added {} document(s), rediscovering",
                        response.documents_added
                    ));
                    self.reload_graph();
                    if let Some(collection_id) = self.selected_collection {
                        self.poller.start(collection_id);
                    }
                }
                Err(error) => {
                    warn!(%error, "add document failed");
                    self.action_error = Some(format!("Add document: {error}"));
                }
            }
        }

        if let Some(result) = drain(&mut self.answer_rx) {
            match result {
                Ok(reply) => {
                    self.answer = Some(reply.answer);
                }
                Err(error) => {
                    warn!(%error, "topic question failed");
                    self.answer = Some(format!("Question failed: {error}"));
                }
            }
        }

        if let Some(node_id) = self.pending_node_click.take() {
            if let Some(topic_id) = topic_id_from_node(&node_id) {
                self.topic_rx =
                    Some(spawn_fetch(&self.api, move |api| api.fetch_topic(topic_id)));
            } else {
                warn!(%node_id, "node id does not map to a topic");
            }
        }
        if let Some(topic_id) = self.pending_related_topic_click.take() {
            self.selected_node = Some(format!("t{topic_id}"));
            self.topic_rx = Some(spawn_fetch(&self.api, move |api| api.fetch_topic(topic_id)));
        }
        if let Some(document_id) = self.pending_document_click.take()
            && let Some(collection_id) = self.selected_collection
        {
            self.document_rx = Some(spawn_fetch(&self.api, move |api| {
                api.fetch_document(collection_id, document_id)
            }));
        }

        let status_changed = self.poller.tick(now);
        if status_changed
            && let Some(status) = self.poller.status()
            && status.state == JobState::Succeeded
        {
            // fresh topic set exists once discovery finishes
            self.reload_graph();
        }

        if let Some(due) = self.poller.next_due() {
            ctx.request_repaint_after(due.saturating_duration_since(now));
        }
        let waiting = self.poller.has_in_flight()
            || self.collections_rx.is_some()
            || self.graph_rx.is_some()
            || self.topic_rx.is_some()
            || self.document_rx.is_some()
            || self.discovery_rx.is_some()
            || self.add_documents_rx.is_some()
            || self.answer_rx.is_some();
        if waiting {
            ctx.request_repaint_after(Duration::from_millis(100));
        }
    }
}
