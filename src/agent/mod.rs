//! Itinerary generation through an agent orchestration service
//!
//! The agent and its task are created once per process and reused. Each
//! itinerary is one execution of that task, polled until it reaches a
//! terminal status; its output is then unpacked by [`output::parse_output`].

pub mod output;
pub mod task;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::{Duration, Instant};
use tokio::sync::OnceCell;
use tracing::{debug, info, instrument, warn};

use crate::FoodieTourError;
use crate::config::AgentConfig;
use crate::http::{USER_AGENT, build_client, trim_base_url};
use crate::models::ItineraryPayload;
use task::{AGENT_ABOUT, AGENT_NAME, CreateAgent, ExecutionInput, task_definition};

/// Everything the agent needs to plan one city
#[derive(Debug, Clone, PartialEq)]
pub struct ItineraryRequest {
    pub city: String,
    pub temp: f64,
    pub condition: String,
    pub prefs: Vec<String>,
    pub surprise: bool,
}

impl From<ItineraryRequest> for ExecutionInput {
    fn from(request: ItineraryRequest) -> Self {
        Self {
            city: request.city,
            temp: request.temp,
            condition: request.condition,
            prefs: request.prefs,
            surprise: request.surprise,
        }
    }
}

/// Produces the structured itinerary for a city
#[async_trait]
pub trait ItineraryGenerator: Send + Sync {
    async fn generate(&self, request: ItineraryRequest) -> Result<ItineraryPayload>;
}

/// Execution lifecycle as reported by the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Queued,
    Starting,
    Running,
    AwaitingInput,
    Succeeded,
    Failed,
    Cancelled,
    #[serde(other)]
    Unknown,
}

impl ExecutionStatus {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ExecutionStatus::Succeeded | ExecutionStatus::Failed | ExecutionStatus::Cancelled
        )
    }
}

#[derive(Debug, Deserialize)]
struct Created {
    id: String,
}

#[derive(Debug, Deserialize)]
struct Execution {
    id: String,
    status: ExecutionStatus,
    #[serde(default)]
    output: Value,
}

/// Agent and task ids, created on first use
#[derive(Debug, Clone)]
struct AgentHandle {
    agent_id: String,
    task_id: String,
}

/// Client for a Julep-style agent orchestration API
pub struct AgentClient {
    client: ClientWithMiddleware,
    base_url: String,
    api_key: String,
    model: String,
    poll_interval: Duration,
    max_wait: Option<Duration>,
    handle: OnceCell<AgentHandle>,
}

impl AgentClient {
    pub fn new(config: &AgentConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| FoodieTourError::config("Agent API key is missing"))?;
        let client = build_client(
            Duration::from_secs(config.timeout_seconds.into()),
            config.max_retries,
            USER_AGENT,
        )?;

        Ok(Self {
            client,
            base_url: trim_base_url(&config.base_url),
            api_key,
            model: config.model.clone(),
            poll_interval: config.poll_interval(),
            max_wait: config.max_wait(),
            handle: OnceCell::new(),
        })
    }

    async fn post<T: DeserializeOwned>(&self, path: &str, body: &impl serde::Serialize) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        debug!("POST {}", url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| FoodieTourError::api(format!("Agent request to {path} failed: {e}")))?;
        Self::decode(path, response).await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| FoodieTourError::api(format!("Agent request to {path} failed: {e}")))?;
        Self::decode(path, response).await
    }

    async fn decode<T: DeserializeOwned>(path: &str, response: reqwest::Response) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FoodieTourError::api(format!(
                "Agent API error {status} on {path}: {body}"
            ))
            .into());
        }
        response
            .json()
            .await
            .with_context(|| format!("Invalid agent response from {path}"))
    }

    async fn handle(&self) -> Result<&AgentHandle> {
        self.handle
            .get_or_try_init(|| async {
                let agent: Created = self
                    .post(
                        "/agents",
                        &CreateAgent {
                            name: AGENT_NAME,
                            model: &self.model,
                            about: AGENT_ABOUT,
                        },
                    )
                    .await?;
                let task: Created = self
                    .post(&format!("/agents/{}/tasks", agent.id), &task_definition())
                    .await?;
                info!("Created agent {} with task {}", agent.id, task.id);
                Ok::<_, anyhow::Error>(AgentHandle {
                    agent_id: agent.id,
                    task_id: task.id,
                })
            })
            .await
    }

    async fn wait_for_execution(&self, execution_id: &str) -> Result<Execution> {
        let started = Instant::now();
        loop {
            let execution: Execution = self.get(&format!("/executions/{execution_id}")).await?;
            debug!("Execution {} is {:?}", execution.id, execution.status);
            if execution.status.is_terminal() {
                return Ok(execution);
            }
            if let Some(max_wait) = self.max_wait
                && started.elapsed() >= max_wait
            {
                warn!("Execution {} still {:?} after {:?}", execution_id, execution.status, max_wait);
                return Err(FoodieTourError::execution(format!(
                    "Execution did not finish within {}s",
                    max_wait.as_secs()
                ))
                .into());
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

#[async_trait]
impl ItineraryGenerator for AgentClient {
    #[instrument(skip(self), fields(city = %request.city))]
    async fn generate(&self, request: ItineraryRequest) -> Result<ItineraryPayload> {
        let handle = self.handle().await?;
        let city = request.city.clone();

        let body = serde_json::json!({ "input": ExecutionInput::from(request) });
        let created: Created = self
            .post(&format!("/tasks/{}/executions", handle.task_id), &body)
            .await?;
        debug!("Started execution {} for agent {}", created.id, handle.agent_id);

        let execution = self.wait_for_execution(&created.id).await?;
        if execution.status != ExecutionStatus::Succeeded {
            warn!("Execution {} for {} ended as {:?}", execution.id, city, execution.status);
            return Err(FoodieTourError::execution(format!("Could not plan {city}")).into());
        }

        let payload = output::parse_output(&execution.output)?;
        let issues = payload.cardinality_issues();
        if !issues.is_empty() {
            warn!("Itinerary for {} deviates from contract: {}", city, issues.join("; "));
        }
        Ok(payload)
    }
}
