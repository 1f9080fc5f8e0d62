//! Shared test helpers: scripted specialists and pipeline builders

#![allow(dead_code)]

use async_trait::async_trait;
use coach_feedback::types::{
    Category, FeedbackItem, Specialist, SpecialistError, SpecialistInput,
};
use coach_feedback::{FeedbackPipeline, PipelineConfig};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// What a scripted specialist does when invoked
#[derive(Debug, Clone)]
pub enum Script {
    Return(Vec<FeedbackItem>),
    Fail,
    /// Sleep, then return
    Delay(Duration, Vec<FeedbackItem>),
    /// Never finishes
    Hang,
}

/// Specialist that follows a script and records how it was used
pub struct ScriptedSpecialist {
    name: String,
    categories: Vec<Category>,
    script: Script,
    pub calls: AtomicUsize,
    pub finished: AtomicBool,
    pub dropped_in_flight: AtomicBool,
    pub last_input: Mutex<Option<SpecialistInput>>,
}

impl ScriptedSpecialist {
    pub fn new(category: Category, script: Script) -> Arc<Self> {
        Arc::new(Self {
            name: category.as_str().to_string(),
            categories: vec![category],
            script,
            calls: AtomicUsize::new(0),
            finished: AtomicBool::new(false),
            dropped_in_flight: AtomicBool::new(false),
            last_input: Mutex::new(None),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn was_aborted(&self) -> bool {
        self.dropped_in_flight.load(Ordering::SeqCst)
    }
}

/// Sets `dropped_in_flight` unless disarmed
struct InFlight<'a> {
    owner: &'a ScriptedSpecialist,
    armed: bool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.owner.dropped_in_flight.store(true, Ordering::SeqCst);
        }
    }
}

#[async_trait]
impl Specialist for ScriptedSpecialist {
    fn name(&self) -> &str {
        &self.name
    }

    fn categories(&self) -> &[Category] {
        &self.categories
    }

    async fn propose(&self, input: &SpecialistInput) -> Result<Vec<FeedbackItem>, SpecialistError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_input.lock().unwrap() = Some(input.clone());

        let mut guard = InFlight {
            owner: self,
            armed: true,
        };

        let result = match &self.script {
            Script::Return(items) => Ok(items.clone()),
            Script::Fail => Err(SpecialistError::Network("connection reset".to_string())),
            Script::Delay(delay, items) => {
                tokio::time::sleep(*delay).await;
                Ok(items.clone())
            }
            Script::Hang => {
                std::future::pending::<()>().await;
                Ok(Vec::new())
            }
        };

        guard.armed = false;
        self.finished.store(true, Ordering::SeqCst);
        result
    }
}

pub fn item(category: Category, original: &str, corrected: &str) -> FeedbackItem {
    FeedbackItem::new(category, original, corrected, format!("{} issue", category))
}

pub fn as_roster(specialists: &[Arc<ScriptedSpecialist>]) -> Vec<Arc<dyn Specialist>> {
    specialists
        .iter()
        .map(|s| Arc::clone(s) as Arc<dyn Specialist>)
        .collect()
}

pub fn build_pipeline(specialists: &[Arc<ScriptedSpecialist>], config: PipelineConfig) -> FeedbackPipeline {
    FeedbackPipeline::new(as_roster(specialists), config).expect("non-empty roster")
}
