//! # Scripted Service
//!
//! Deterministic stand-in for the generative backend. Each operation has a
//! queue of replies; the last reply repeats once the queue is down to one.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{GenerationRequest, GenerativeService};
use crate::error::{ForgeError, Operation};

/// One canned reply
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    /// Raw response text, returned as-is
    Text(String),
    /// Transport-level failure with the given cause
    Failure(String),
    /// Never answers (exercises timeouts and cancellation)
    Hang,
}

impl ScriptedReply {
    pub fn json(value: Value) -> Self {
        ScriptedReply::Text(value.to_string())
    }
}

#[derive(Debug, Default)]
pub struct ScriptedService {
    replies: Mutex<HashMap<Operation, VecDeque<ScriptedReply>>>,
    calls: Mutex<Vec<GenerationRequest>>,
    latency: Duration,
}

impl ScriptedService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply for an operation
    pub fn reply(self, operation: Operation, reply: ScriptedReply) -> Self {
        if let Ok(mut replies) = self.replies.lock() {
            replies.entry(operation).or_default().push_back(reply);
        }
        self
    }

    /// Queue a JSON reply for an operation
    pub fn respond(self, operation: Operation, value: Value) -> Self {
        self.reply(operation, ScriptedReply::json(value))
    }

    /// Delay every reply, so callers actually suspend
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Number of requests seen for an operation
    pub fn calls(&self, operation: Operation) -> usize {
        self.calls
            .lock()
            .map(|calls| calls.iter().filter(|c| c.operation == operation).count())
            .unwrap_or(0)
    }

    /// Prompts sent for an operation, oldest first
    pub fn prompts(&self, operation: Operation) -> Vec<String> {
        self.calls
            .lock()
            .map(|calls| {
                calls
                    .iter()
                    .filter(|c| c.operation == operation)
                    .map(|c| c.prompt.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// A complete, passing factory run for offline demos
    pub fn demo() -> Self {
        Self::new()
            .respond(
                Operation::Research,
                json!({
                    "name": "Echo Chamber",
                    "concept": "Micro-communities that form around a single trending sound",
                    "painPoints": [
                        "Creators cannot find the niche that will amplify them",
                        "Feeds bury small communities"
                    ],
                    "solutions": [
                        "Sound-based community matching",
                        "Remix chains that credit every participant"
                    ],
                    "presentation": "Echo Chamber turns a trending sound into a home. Every remix grows the room.",
                    "features": ["Sound rooms", "Remix chains", "Creator credits"]
                }),
            )
            .respond(
                Operation::TechnicalPlan,
                json!({
                    "prd": "Users join rooms keyed by a sound and publish remixes.",
                    "context": "Single-page React app with a hosted backend.",
                    "sitemap": "/ -> rooms, /room/:id -> feed, /me -> profile",
                    "dbSchema": "rooms(id, sound_url), remixes(id, room_id, author, parent_id)"
                }),
            )
            .respond(
                Operation::CodeGeneration,
                json!({
                    "files": [
                        {"path": "App.tsx", "content": "export default function App() { return <main>Echo Chamber</main>; }\n"},
                        {"path": "index.tsx", "content": "import { createRoot } from 'react-dom/client';\nimport App from './App';\ncreateRoot(document.getElementById('root')!).render(<App />);\n"},
                        {"path": "README.md", "content": "# Echo Chamber\n\nSound-based micro-communities.\n"}
                    ]
                }),
            )
            .respond(
                Operation::Audit,
                json!({"status": "Pass", "notes": "Structure is coherent."}),
            )
    }

    fn next_reply(&self, operation: Operation) -> Option<ScriptedReply> {
        let mut replies = self.replies.lock().ok()?;
        let queue = replies.get_mut(&operation)?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

#[async_trait]
impl GenerativeService for ScriptedService {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, ForgeError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(request.clone());
        }
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        match self.next_reply(request.operation) {
            Some(ScriptedReply::Text(text)) => Ok(text),
            Some(ScriptedReply::Failure(cause)) => Err(ForgeError::service(request.operation, cause)),
            Some(ScriptedReply::Hang) => std::future::pending().await,
            None => Err(ForgeError::service(
                request.operation,
                "no scripted reply for this operation",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(operation: Operation) -> GenerationRequest {
        GenerationRequest {
            operation,
            model: "test".to_string(),
            thinking_budget: None,
            prompt: "prompt".to_string(),
            schema: Value::Null,
        }
    }

    #[tokio::test]
    async fn test_last_reply_repeats() {
        let service = ScriptedService::new()
            .respond(Operation::Audit, json!({"status": "Fail", "notes": "1"}))
            .respond(Operation::Audit, json!({"status": "Pass", "notes": "2"}));

        let first = service.generate(&request(Operation::Audit)).await.unwrap();
        let second = service.generate(&request(Operation::Audit)).await.unwrap();
        let third = service.generate(&request(Operation::Audit)).await.unwrap();

        assert!(first.contains("Fail"));
        assert!(second.contains("Pass"));
        assert_eq!(second, third);
        assert_eq!(service.calls(Operation::Audit), 3);
        assert_eq!(service.calls(Operation::Research), 0);
    }

    #[tokio::test]
    async fn test_unscripted_operation_is_service_error() {
        let service = ScriptedService::new();
        let err = service
            .generate(&request(Operation::Research))
            .await
            .unwrap_err();
        assert!(matches!(err, ForgeError::Service { .. }));
    }

    #[tokio::test]
    async fn test_failure_reply() {
        let service = ScriptedService::new().reply(
            Operation::TechnicalPlan,
            ScriptedReply::Failure("503 Service Unavailable".to_string()),
        );
        let err = service
            .generate(&request(Operation::TechnicalPlan))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("503"));
    }
}
