//! Nomad HTTP API client.
//!
//! Implements [`JobScheduler`] with plain HTTP/1 requests: one TCP
//! connection per request, JSON bodies. `run_and_wait` registers the job
//! and then polls the job summary until every task group is running.

use std::collections::HashMap;
use std::time::Duration;

use bytes::Bytes;
use http::{Method, StatusCode};
use http_body_util::{BodyExt, Full};
use serde::Deserialize;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::{Position, Url};

use crate::error::{GatewayError, GatewayResult};
use crate::gateway::{GatewayFuture, JobScheduler};
use crate::job::Job;

/// Connection and polling settings for [`NomadClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Agent address as `host:port`.
    pub address: String,
    /// Delay between two job summary polls.
    pub poll_interval: Duration,
    /// How long a job may take to reach running state.
    pub start_timeout: Duration,
    /// Timeout of a single HTTP request.
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:4646".to_string(),
            poll_interval: Duration::from_secs(1),
            start_timeout: Duration::from_secs(120),
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl ClientConfig {
    /// Accepts `host:port` or an `http://host:port` URL.
    pub fn with_address(mut self, address: &str) -> Self {
        let address = address.trim_start_matches("http://").trim_end_matches('/');
        self.address = address.to_string();
        self
    }
}

/// Per task group allocation counters from `/v1/job/<id>/summary`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase", default)]
pub struct TaskGroupSummary {
    pub queued: u32,
    pub complete: u32,
    pub failed: u32,
    pub running: u32,
    pub starting: u32,
    pub lost: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct JobSummary {
    #[serde(default)]
    summary: HashMap<String, TaskGroupSummary>,
}

/// Observed progress of a submitted job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobProgress {
    Pending,
    Running,
    Failed(String),
}

/// Classify a job summary. A job is running once every task group has a
/// running allocation and none failed, got lost or exited.
pub fn job_progress(summary: &HashMap<String, TaskGroupSummary>) -> JobProgress {
    if summary.is_empty() {
        return JobProgress::Pending;
    }

    let mut groups: Vec<_> = summary.iter().collect();
    groups.sort_by(|a, b| a.0.cmp(b.0));

    for (group, counts) in &groups {
        if counts.failed > 0 || counts.lost > 0 || counts.complete > 0 {
            return JobProgress::Failed(format!(
                "task group {group}: failed={} lost={} complete={}",
                counts.failed, counts.lost, counts.complete
            ));
        }
    }

    if groups.iter().all(|(_, counts)| counts.running > 0) {
        JobProgress::Running
    } else {
        JobProgress::Pending
    }
}

/// Request target of a job resource. The job id is percent-encoded as a
/// single path segment.
fn job_target(job_id: &str, suffix: Option<&str>, query: Option<&str>) -> GatewayResult<String> {
    let invalid = || GatewayError::InvalidJob {
        job: job_id.to_string(),
        reason: "job id does not form a request path".to_string(),
    };

    let mut url = Url::parse("http://nomad/v1/job").map_err(|_| invalid())?;
    {
        let mut segments = url.path_segments_mut().map_err(|_| invalid())?;
        segments.push(job_id);
        if let Some(suffix) = suffix {
            segments.push(suffix);
        }
    }
    url.set_query(query);
    Ok(url[Position::BeforePath..].to_string())
}

/// [`JobScheduler`] backed by a Nomad agent.
#[derive(Debug, Clone)]
pub struct NomadClient {
    config: ClientConfig,
}

impl NomadClient {
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }

    async fn submit(&self, job: &Job) -> GatewayResult<()> {
        let body = serde_json::to_vec(&serde_json::json!({ "Job": job })).map_err(|e| {
            GatewayError::InvalidJob {
                job: job.id.clone(),
                reason: e.to_string(),
            }
        })?;

        let (status, resp) = self
            .request(&job.id, Method::POST, "/v1/jobs", Some(body))
            .await?;

        if status.is_success() {
            debug!(job = %job.id, "job registered");
            Ok(())
        } else if status.is_client_error() {
            Err(GatewayError::InvalidJob {
                job: job.id.clone(),
                reason: format!("{status}: {}", String::from_utf8_lossy(&resp).trim()),
            })
        } else {
            Err(GatewayError::Transport {
                job: job.id.clone(),
                reason: format!("register returned {status}"),
            })
        }
    }

    async fn wait_running(&self, job_id: &str) -> GatewayResult<()> {
        let deadline = Instant::now() + self.config.start_timeout;
        let path = job_target(job_id, Some("summary"), None)?;

        loop {
            let (status, resp) = self.request(job_id, Method::GET, &path, None).await?;

            if status == StatusCode::NOT_FOUND {
                debug!(job = %job_id, "job summary not available yet");
            } else if status.is_success() {
                let summary: JobSummary =
                    serde_json::from_slice(&resp).map_err(|e| GatewayError::Transport {
                        job: job_id.to_string(),
                        reason: format!("invalid job summary: {e}"),
                    })?;

                match job_progress(&summary.summary) {
                    JobProgress::Running => return Ok(()),
                    JobProgress::Failed(reason) => {
                        return Err(GatewayError::Unhealthy {
                            job: job_id.to_string(),
                            reason,
                        });
                    }
                    JobProgress::Pending => debug!(job = %job_id, "job not running yet"),
                }
            } else {
                return Err(GatewayError::Transport {
                    job: job_id.to_string(),
                    reason: format!("job summary returned {status}"),
                });
            }

            if Instant::now() + self.config.poll_interval > deadline {
                return Err(GatewayError::StartTimeout {
                    job: job_id.to_string(),
                    after: self.config.start_timeout,
                });
            }
            tokio::time::sleep(self.config.poll_interval).await;
        }
    }

    async fn deregister(&self, job_id: &str, purge: bool) -> GatewayResult<()> {
        let path = job_target(job_id, None, Some(&format!("purge={purge}")))?;
        let (status, _) = self.request(job_id, Method::DELETE, &path, None).await?;

        if status == StatusCode::NOT_FOUND {
            warn!(job = %job_id, "job not found, nothing to stop");
            Ok(())
        } else if status.is_success() {
            info!(job = %job_id, purge, "job stopped");
            Ok(())
        } else {
            Err(GatewayError::Transport {
                job: job_id.to_string(),
                reason: format!("deregister returned {status}"),
            })
        }
    }

    /// Send a single request and collect the whole response body.
    async fn request(
        &self,
        job_id: &str,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
    ) -> GatewayResult<(StatusCode, Bytes)> {
        let address = self.config.address.as_str();
        let transport = |reason: String| GatewayError::Transport {
            job: job_id.to_string(),
            reason,
        };

        let exchange = async {
            let stream = tokio::net::TcpStream::connect(address)
                .await
                .map_err(|e| transport(format!("connect to {address}: {e}")))?;

            let io = hyper_util::rt::TokioIo::new(stream);
            let (mut sender, conn) = hyper::client::conn::http1::handshake(io)
                .await
                .map_err(|e| transport(format!("handshake: {e}")))?;

            // Drive the connection in the background.
            tokio::spawn(async move {
                let _ = conn.await;
            });

            let req = http::Request::builder()
                .method(method)
                .uri(path)
                .header("host", address)
                .header("content-type", "application/json")
                .header("user-agent", "capsule/0.1")
                .body(Full::new(Bytes::from(body.unwrap_or_default())))
                .map_err(|e| transport(format!("build request: {e}")))?;

            let resp = sender
                .send_request(req)
                .await
                .map_err(|e| transport(format!("send request: {e}")))?;
            let status = resp.status();
            let bytes = resp
                .into_body()
                .collect()
                .await
                .map_err(|e| transport(format!("read response: {e}")))?
                .to_bytes();
            Ok::<_, GatewayError>((status, bytes))
        };

        match tokio::time::timeout(self.config.request_timeout, exchange).await {
            Ok(result) => result,
            Err(_) => Err(transport(format!(
                "request {path} timed out after {:?}",
                self.config.request_timeout
            ))),
        }
    }
}

impl JobScheduler for NomadClient {
    fn run_and_wait<'a>(&'a self, job: &'a Job, cancel: &'a CancellationToken) -> GatewayFuture<'a> {
        Box::pin(async move {
            let run = async {
                self.submit(job).await?;
                self.wait_running(&job.id).await
            };
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!(job = %job.id, "wait for job canceled");
                    Err(GatewayError::Canceled)
                }
                result = run => {
                    if result.is_ok() {
                        info!(job = %job.id, "job running");
                    }
                    result
                }
            }
        })
    }

    fn stop<'a>(
        &'a self,
        job_id: &'a str,
        purge: bool,
        cancel: &'a CancellationToken,
    ) -> GatewayFuture<'a> {
        Box::pin(async move {
            tokio::select! {
                _ = cancel.cancelled() => Err(GatewayError::Canceled),
                result = self.deregister(job_id, purge) => result,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(groups: &[(&str, TaskGroupSummary)]) -> HashMap<String, TaskGroupSummary> {
        groups
            .iter()
            .map(|(name, s)| (name.to_string(), s.clone()))
            .collect()
    }

    #[test]
    fn empty_summary_is_pending() {
        assert_eq!(job_progress(&HashMap::new()), JobProgress::Pending);
    }

    #[test]
    fn running_group_is_running() {
        let s = summary(&[(
            "vega",
            TaskGroupSummary {
                running: 1,
                ..Default::default()
            },
        )]);
        assert_eq!(job_progress(&s), JobProgress::Running);
    }

    #[test]
    fn starting_group_is_pending() {
        let s = summary(&[
            (
                "a",
                TaskGroupSummary {
                    running: 1,
                    ..Default::default()
                },
            ),
            (
                "b",
                TaskGroupSummary {
                    starting: 1,
                    ..Default::default()
                },
            ),
        ]);
        assert_eq!(job_progress(&s), JobProgress::Pending);
    }

    #[test]
    fn failed_or_exited_group_is_failed() {
        for counts in [
            TaskGroupSummary {
                failed: 1,
                ..Default::default()
            },
            TaskGroupSummary {
                lost: 1,
                ..Default::default()
            },
            TaskGroupSummary {
                complete: 1,
                running: 1,
                ..Default::default()
            },
        ] {
            let s = summary(&[("vega", counts)]);
            assert!(matches!(job_progress(&s), JobProgress::Failed(_)));
        }
    }

    #[test]
    fn job_id_is_a_single_path_segment() {
        assert_eq!(
            job_target("n0", Some("summary"), None).unwrap(),
            "/v1/job/n0/summary"
        );
        assert_eq!(
            job_target("pg main/x?y", Some("summary"), None).unwrap(),
            "/v1/job/pg%20main%2Fx%3Fy/summary"
        );
        assert_eq!(
            job_target("a#b", None, Some("purge=true")).unwrap(),
            "/v1/job/a%23b?purge=true"
        );
    }

    #[test]
    fn address_accepts_url() {
        let config = ClientConfig::default().with_address("http://10.0.0.1:4646/");
        assert_eq!(config.address, "10.0.0.1:4646");
    }

    #[test]
    fn summary_decodes_nomad_payload() {
        let payload = r#"{"JobID":"n0","Namespace":"default","Summary":{"vega":{"Queued":0,"Complete":0,"Failed":0,"Running":1,"Starting":0,"Lost":0,"Unknown":0}}}"#;
        let decoded: JobSummary = serde_json::from_str(payload).unwrap();
        assert_eq!(decoded.summary["vega"].running, 1);
    }
}
