//! Version-control host API client.
//!
//! A thin client over the host's REST surface: repository metadata,
//! branch refs, file contents, pull requests, and labels. The pipeline
//! is a pure consumer of this API.
//!
//! A missing file on a content lookup is an expected control-flow signal
//! (create vs. update), so `get_file` returns `Ok(None)` for 404 instead
//! of an error.

use crate::config::HostConfig;
use crate::error::HostError;
use crate::models::HostMetadata;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// A file that already exists on a branch, with its identity token.
#[derive(Debug, Clone, Deserialize)]
pub struct ExistingFile {
    /// Identity token the host uses for conflict detection on update.
    pub sha: String,
}

/// A pull request as returned by the host.
#[derive(Debug, Clone, Deserialize)]
pub struct HostPullRequest {
    pub number: u64,
    pub html_url: String,
}

#[derive(Debug, Deserialize)]
struct RefObject {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct BranchRef {
    object: RefObject,
}

#[derive(Debug, Serialize)]
struct CreateRefRequest<'a> {
    #[serde(rename = "ref")]
    git_ref: String,
    sha: &'a str,
}

#[derive(Debug, Serialize)]
struct PutFileRequest<'a> {
    message: &'a str,
    content: String,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct CreatePullRequest<'a> {
    title: &'a str,
    body: &'a str,
    head: &'a str,
    base: &'a str,
}

#[derive(Debug, Serialize)]
struct AddLabelsRequest<'a> {
    labels: &'a [String],
}

/// Client for the version-control host API.
#[derive(Debug, Clone)]
pub struct HostClient {
    http_client: reqwest::Client,
    api_url: String,
    owner: String,
    token: String,
}

impl HostClient {
    /// Create a client from the host settings.
    pub fn new(config: &HostConfig) -> Result<Self, HostError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("fleetwarden/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(HostError::transport)?;

        Ok(Self {
            http_client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            owner: config.owner.clone(),
            token: config.token.clone(),
        })
    }

    fn repo_url(&self, repo: &str, tail: &str) -> String {
        format!("{}/repos/{}/{}{}", self.api_url, self.owner, repo, tail)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, HostError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let detail = response.text().await.unwrap_or_default();
        Err(HostError::Unreachable {
            status: status.as_u16(),
            detail,
        })
    }

    /// Fetch repository metadata.
    pub async fn get_repository(&self, repo: &str) -> Result<HostMetadata, HostError> {
        let url = self.repo_url(repo, "");
        debug!("Fetching repository metadata: {}", url);

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(HostError::transport)?;

        let response = Self::check(response).await?;
        response
            .json::<HostMetadata>()
            .await
            .map_err(|e| HostError::Decode {
                detail: e.to_string(),
            })
    }

    /// Resolve the tip commit of a branch.
    pub async fn get_branch_head(&self, repo: &str, branch: &str) -> Result<String, HostError> {
        let url = self.repo_url(repo, &format!("/git/ref/heads/{}", branch));

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(HostError::transport)?;

        let response = Self::check(response).await?;
        let branch_ref: BranchRef = response.json().await.map_err(|e| HostError::Decode {
            detail: e.to_string(),
        })?;

        Ok(branch_ref.object.sha)
    }

    /// Create a new branch ref pointed at the given commit.
    ///
    /// A name collision surfaces as `HostError::Unreachable` with the
    /// host's status; it is reported, not retried.
    pub async fn create_ref(&self, repo: &str, branch: &str, sha: &str) -> Result<(), HostError> {
        let url = self.repo_url(repo, "/git/refs");
        debug!("Creating ref {} in {} at {}", branch, repo, sha);

        let request = CreateRefRequest {
            git_ref: format!("refs/heads/{}", branch),
            sha,
        };

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&request)
            .send()
            .await
            .map_err(HostError::transport)?;

        Self::check(response).await?;
        Ok(())
    }

    /// Look up a file on a branch. `Ok(None)` when the file does not exist.
    pub async fn get_file(
        &self,
        repo: &str,
        path: &str,
        branch: &str,
    ) -> Result<Option<ExistingFile>, HostError> {
        let url = self.repo_url(repo, &format!("/contents/{}?ref={}", path, branch));

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(HostError::transport)?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let response = Self::check(response).await?;
        let existing: ExistingFile = response.json().await.map_err(|e| HostError::Decode {
            detail: e.to_string(),
        })?;

        Ok(Some(existing))
    }

    /// Create or update a file on a branch.
    ///
    /// Pass the identity token (`sha`) of the existing file when updating
    /// so the host can detect conflicting writes; omit it when creating.
    pub async fn put_file(
        &self,
        repo: &str,
        path: &str,
        branch: &str,
        message: &str,
        content: &str,
        sha: Option<&str>,
    ) -> Result<(), HostError> {
        let url = self.repo_url(repo, &format!("/contents/{}", path));
        debug!(
            "Writing {} on {}@{} ({})",
            path,
            repo,
            branch,
            if sha.is_some() { "update" } else { "create" }
        );

        let request = PutFileRequest {
            message,
            content: base64::engine::general_purpose::STANDARD.encode(content),
            branch,
            sha,
        };

        let response = self
            .http_client
            .put(&url)
            .bearer_auth(&self.token)
            .json(&request)
            .send()
            .await
            .map_err(HostError::transport)?;

        Self::check(response).await?;
        Ok(())
    }

    /// Open a pull request from `head` into `base`.
    pub async fn create_pull_request(
        &self,
        repo: &str,
        title: &str,
        body: &str,
        head: &str,
        base: &str,
    ) -> Result<HostPullRequest, HostError> {
        let url = self.repo_url(repo, "/pulls");
        debug!("Opening pull request on {}: {} -> {}", repo, head, base);

        let request = CreatePullRequest {
            title,
            body,
            head,
            base,
        };

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&request)
            .send()
            .await
            .map_err(HostError::transport)?;

        let response = Self::check(response).await?;
        response
            .json::<HostPullRequest>()
            .await
            .map_err(|e| HostError::Decode {
                detail: e.to_string(),
            })
    }

    /// Attach labels to a pull request (host-side: an issue).
    pub async fn add_labels(
        &self,
        repo: &str,
        number: u64,
        labels: &[String],
    ) -> Result<(), HostError> {
        let url = self.repo_url(repo, &format!("/issues/{}/labels", number));

        let request = AddLabelsRequest { labels };

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&request)
            .send()
            .await
            .map_err(HostError::transport)?;

        Self::check(response).await?;
        Ok(())
    }
}
