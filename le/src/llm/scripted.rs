//! Scripted client for driving the pipeline through chosen responses
//!
//! Stages with a script answer from it; every other stage is answered by the
//! offline stand-in. Used by integration tests and demos that need a backend
//! misbehaving in a controlled way (for example one that never emits `[NAME]`).

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::debug;

use super::{CompletionRequest, CompletionResponse, LlmClient, LlmError, OfflineClient};
use crate::prompts::Stage;

type Script = Box<dyn Fn(&str) -> Result<String, LlmError> + Send + Sync>;

pub struct ScriptedClient {
    fallback: OfflineClient,
    scripts: HashMap<Stage, Script>,
    calls: Mutex<Vec<(Stage, String)>>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self {
            fallback: OfflineClient::new(),
            scripts: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Answer `stage` with `script(rendered_prompt)`
    pub fn on<F>(mut self, stage: Stage, script: F) -> Self
    where
        F: Fn(&str) -> Result<String, LlmError> + Send + Sync + 'static,
    {
        self.scripts.insert(stage, Box::new(script));
        self
    }

    /// Answer `stage` with the same text every time
    pub fn always(self, stage: Stage, text: impl Into<String>) -> Self {
        let text = text.into();
        self.on(stage, move |_| Ok(text.clone()))
    }

    /// Fail every request of `stage`
    pub fn failing(self, stage: Stage) -> Self {
        self.on(stage, |_| {
            Err(LlmError::ApiError {
                status: 503,
                message: "scripted outage".to_string(),
            })
        })
    }

    /// Number of requests seen for `stage`
    pub fn calls(&self, stage: Stage) -> usize {
        self.prompts(stage).len()
    }

    /// Rendered prompts seen for `stage`, in order
    pub fn prompts(&self, stage: Stage) -> Vec<String> {
        let calls = self.calls.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        calls.iter().filter(|(s, _)| *s == stage).map(|(_, p)| p.clone()).collect()
    }

    fn record(&self, stage: Stage, prompt: &str) {
        let mut calls = self.calls.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        calls.push((stage, prompt.to_string()));
    }
}

impl Default for ScriptedClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmClient for ScriptedClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let stage = Stage::from_system_prompt(&request.system_prompt)
            .ok_or_else(|| LlmError::InvalidResponse("scripted client cannot route this request".to_string()))?;
        let prompt = request.user_text().unwrap_or_default().to_string();
        debug!(%stage, "ScriptedClient::complete: called");
        self.record(stage, &prompt);

        match self.scripts.get(&stage) {
            Some(script) => script(&prompt).map(CompletionResponse::text),
            None => self.fallback.complete(request).await,
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
