use crate::error::AppError;
use crate::provider::{PollutantProvider, ProviderPayload};
use crate::state::Location;
use std::collections::VecDeque;

/// Serves scripted results in order, then fails once the script is exhausted.
#[derive(Debug, Default)]
pub struct MockProvider {
    script: VecDeque<Result<ProviderPayload, String>>,
    calls: usize,
}

impl MockProvider {
    pub fn new(script: Vec<Result<ProviderPayload, String>>) -> Self {
        Self {
            script: script.into(),
            calls: 0,
        }
    }

    pub fn failing(message: &str) -> Self {
        Self::new(vec![Err(message.to_string())])
    }

    pub fn push(&mut self, result: Result<ProviderPayload, String>) {
        self.script.push_back(result);
    }

    pub fn calls(&self) -> usize {
        self.calls
    }
}

impl PollutantProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn fetch(&mut self, location: &Location) -> Result<ProviderPayload, AppError> {
        self.calls += 1;
        match self.script.pop_front() {
            Some(Ok(payload)) => Ok(payload),
            Some(Err(message)) => Err(AppError::Provider(message)),
            None => Err(AppError::Provider(format!(
                "mock script exhausted for {}",
                location.name
            ))),
        }
    }
}
