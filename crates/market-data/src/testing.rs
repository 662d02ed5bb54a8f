//! Test doubles shared by the unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::errors::FetchError;
use crate::models::{DataKind, Observation};
use crate::provider::MarketDataProvider;

enum Outcome {
    Value(Decimal),
    PerCode(HashMap<String, Decimal>),
    Fail(FetchError),
}

pub(crate) struct MockProvider {
    id: &'static str,
    kind: DataKind,
    priority: u8,
    outcome: Outcome,
    name: Option<&'static str>,
    delay: Option<Duration>,
    delays_by_code: HashMap<String, Duration>,
    calls: AtomicUsize,
    calls_by_code: Mutex<HashMap<String, usize>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockProvider {
    fn with_outcome(id: &'static str, kind: DataKind, priority: u8, outcome: Outcome) -> Self {
        Self {
            id,
            kind,
            priority,
            outcome,
            name: None,
            delay: None,
            delays_by_code: HashMap::new(),
            calls: AtomicUsize::new(0),
            calls_by_code: Mutex::new(HashMap::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn ok(id: &'static str, kind: DataKind, priority: u8, value: Decimal) -> Self {
        Self::with_outcome(id, kind, priority, Outcome::Value(value))
    }

    pub fn failing(id: &'static str, kind: DataKind, priority: u8) -> Self {
        let error = FetchError::Network {
            provider: id.to_string(),
            message: "mock failure".to_string(),
        };
        Self::with_outcome(id, kind, priority, Outcome::Fail(error))
    }

    pub fn failing_with(id: &'static str, kind: DataKind, priority: u8, error: FetchError) -> Self {
        Self::with_outcome(id, kind, priority, Outcome::Fail(error))
    }

    /// Answers only for the listed codes; other codes fail with a missing field.
    pub fn per_code(id: &'static str, kind: DataKind, priority: u8, values: &[(&str, Decimal)]) -> Self {
        let values = values
            .iter()
            .map(|(code, value)| (code.to_string(), *value))
            .collect();
        Self::with_outcome(id, kind, priority, Outcome::PerCode(values))
    }

    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = Some(name);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Delay only fetches for `code`, overriding [`Self::with_delay`].
    pub fn with_delay_for(mut self, code: &str, delay: Duration) -> Self {
        self.delays_by_code.insert(code.to_string(), delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn calls_for(&self, code: &str) -> usize {
        self.calls_by_code
            .lock()
            .unwrap()
            .get(code)
            .copied()
            .unwrap_or(0)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MarketDataProvider for MockProvider {
    fn id(&self) -> &'static str {
        self.id
    }

    fn kind(&self) -> DataKind {
        self.kind
    }

    fn priority(&self) -> u8 {
        self.priority
    }

    async fn fetch(&self, code: &str) -> Result<Observation, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self
            .calls_by_code
            .lock()
            .unwrap()
            .entry(code.to_string())
            .or_insert(0) += 1;

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.delays_by_code.get(code).copied().or(self.delay) {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let value = match &self.outcome {
            Outcome::Value(value) => *value,
            Outcome::PerCode(values) => match values.get(code) {
                Some(value) => *value,
                None => {
                    return Err(FetchError::MissingField {
                        provider: self.id.to_string(),
                        field: "value".to_string(),
                    })
                }
            },
            Outcome::Fail(error) => return Err(error.clone()),
        };

        let mut observation = Observation::new(value);
        if let Some(name) = self.name {
            observation = observation.with_name(name);
        }
        Ok(observation)
    }
}
