use async_trait::async_trait;
use cinebot::{
    CompletionProvider, CompletionRequest, Enrichment, MetadataInfo, MetadataLookup,
    ProviderError, TransportError,
};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

/// Provider that replays a fixed script of responses, one per call.
pub struct ScriptedProvider {
    responses: Mutex<VecDeque<Result<String, ProviderError>>>,
    calls: Arc<AtomicU32>,
}

impl ScriptedProvider {
    pub fn new(responses: Vec<Result<String, ProviderError>>) -> (Self, Arc<AtomicU32>) {
        let calls = Arc::new(AtomicU32::new(0));
        let provider = Self {
            responses: Mutex::new(responses.into()),
            calls: Arc::clone(&calls),
        };
        (provider, calls)
    }
}

#[async_trait]
impl CompletionProvider for ScriptedProvider {
    async fn complete(&self, _request: &CompletionRequest) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(ProviderError::NoChoices))
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// Enricher that answers from a fixed table and records every title asked for.
#[derive(Default)]
pub struct TableEnricher {
    found: HashMap<String, MetadataInfo>,
    seen: Arc<Mutex<Vec<String>>>,
}

impl TableEnricher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, title: &str, poster_url: &str, year: Option<&str>) -> Self {
        self.found.insert(
            title.to_string(),
            MetadataInfo {
                poster_url: poster_url.to_string(),
                year: year.map(str::to_string),
            },
        );
        self
    }

    pub fn seen(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.seen)
    }
}

#[async_trait]
impl MetadataLookup for TableEnricher {
    async fn enrich(&self, title: &str) -> Enrichment {
        self.seen.lock().unwrap().push(title.to_string());
        match self.found.get(title) {
            Some(info) => Enrichment::Found(info.clone()),
            None => Enrichment::NotFound,
        }
    }
}

pub fn recommendations_json(titles: &[&str]) -> String {
    let items: Vec<_> = titles
        .iter()
        .map(|title| {
            serde_json::json!({
                "title": title,
                "description": format!("{title} is a gripping film. It keeps you guessing."),
                "reasoning": format!("{title} has the same tense plotting."),
            })
        })
        .collect();
    serde_json::json!({ "recommendations": items }).to_string()
}

pub fn timeout() -> Result<String, ProviderError> {
    Err(ProviderError::Transport(TransportError::Timeout))
}

pub fn dropped_connection() -> Result<String, ProviderError> {
    Err(ProviderError::Transport(TransportError::Request(
        "connection closed before message completed".to_string(),
    )))
}

pub fn http_status(status: u16) -> Result<String, ProviderError> {
    Err(ProviderError::Transport(TransportError::Status {
        provider: "scripted".to_string(),
        status,
        body: String::new(),
    }))
}
