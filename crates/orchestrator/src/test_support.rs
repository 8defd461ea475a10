//! In-memory `RemoteModel` that replays a script and records every request.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use parking_lot::Mutex;
use providers::{FragmentStream, ModelRequest, RemoteModel};
use std::collections::VecDeque;
use std::sync::Arc;

enum Step {
    Reply(String),
    Fail(String),
    Stream(Vec<String>, Option<String>),
}

#[derive(Default)]
pub struct ScriptedModel {
    steps: Mutex<VecDeque<Step>>,
    calls: Arc<Mutex<Vec<ModelRequest>>>,
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, text: &str) -> Self {
        self.push(Step::Reply(text.to_string()))
    }

    pub fn fail(self, message: &str) -> Self {
        self.push(Step::Fail(message.to_string()))
    }

    pub fn stream(self, fragments: &[&str]) -> Self {
        self.push(Step::Stream(to_strings(fragments), None))
    }

    pub fn stream_then_fail(self, fragments: &[&str], message: &str) -> Self {
        self.push(Step::Stream(to_strings(fragments), Some(message.to_string())))
    }

    /// Requests seen so far, shared so tests can inspect them after the
    /// model has been moved into an assistant.
    pub fn calls(&self) -> Arc<Mutex<Vec<ModelRequest>>> {
        Arc::clone(&self.calls)
    }

    fn push(self, step: Step) -> Self {
        self.steps.lock().push_back(step);
        self
    }

    fn next_step(&self, request: ModelRequest) -> Step {
        self.calls.lock().push(request);
        self.steps
            .lock()
            .pop_front()
            .expect("scripted model ran out of steps")
    }
}

fn to_strings(fragments: &[&str]) -> Vec<String> {
    fragments.iter().map(|f| f.to_string()).collect()
}

#[async_trait]
impl RemoteModel for ScriptedModel {
    async fn generate(&self, request: ModelRequest) -> Result<String> {
        match self.next_step(request) {
            Step::Reply(text) => Ok(text),
            Step::Fail(message) => Err(anyhow!(message)),
            Step::Stream(..) => panic!("expected generate, script has a stream"),
        }
    }

    async fn generate_stream(&self, request: ModelRequest) -> Result<FragmentStream> {
        match self.next_step(request) {
            Step::Stream(fragments, failure) => {
                let items = fragments
                    .into_iter()
                    .map(Ok)
                    .chain(failure.map(|m| Err(anyhow!(m))));
                Ok(stream::iter(items.collect::<Vec<_>>()).boxed())
            }
            Step::Fail(message) => Err(anyhow!(message)),
            Step::Reply(_) => panic!("expected a stream, script has a reply"),
        }
    }
}
