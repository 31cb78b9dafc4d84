// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]
//! GitLab REST API facade.
//!
//! A thin, typed client over the handful of project repository endpoints the
//! record store needs: tree listing, file contents with last-commit ids,
//! commit enumeration and diffs on the read path; branch creation, commits
//! and merge requests on the write path.

use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Page size used for all paginated endpoints.
const PER_PAGE: usize = 100;

/// Timeout for API calls (small JSON responses).
const API_TIMEOUT: Duration = Duration::from_secs(10);

/// Remote location of a record repository: instance, project and branch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GitLabSource {
    pub endpoint: String,
    pub project: String,
    pub ref_name: String,
}

impl std::fmt::Display for GitLabSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}@{}", self.endpoint, self.project, self.ref_name)
    }
}

/// Errors from the GitLab API.
#[derive(Debug, thiserror::Error)]
pub enum GitLabError {
    /// Transport failure (connection refused, DNS, timeout).
    #[error("gitlab unreachable: {0}")]
    Unreachable(#[source] reqwest::Error),

    /// Non-success response status.
    #[error("gitlab request failed with status {status}: {path}")]
    Status {
        status: u16,
        path: String,
    },

    /// Response body could not be decoded.
    #[error("gitlab response decode failed: {0}")]
    Decode(String),
}

impl GitLabError {
    fn from_reqwest(error: reqwest::Error) -> Self {
        if error.is_connect() || error.is_timeout() {
            Self::Unreachable(error)
        } else {
            Self::Decode(error.to_string())
        }
    }
}

/// A repository tree entry.
#[derive(Clone, Debug, Deserialize)]
pub struct TreeItem {
    pub id: String,
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub item_type: String,
}

/// A repository file: decoded contents plus its head commit id.
#[derive(Clone, Debug)]
pub struct RepositoryFile {
    pub content: String,
    pub last_commit_id: String,
}

#[derive(Deserialize)]
struct RawRepositoryFile {
    content: String,
    last_commit_id: String,
}

/// A commit summary.
#[derive(Clone, Debug, Deserialize)]
pub struct Commit {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
}

/// One entry of a commit diff.
#[derive(Clone, Debug, Deserialize)]
pub struct DiffEntry {
    pub new_path: String,
    pub old_path: String,
    pub renamed_file: bool,
    pub deleted_file: bool,
    pub new_file: bool,
}

/// A single file action within a commit.
#[derive(Clone, Debug, Serialize)]
pub struct CommitAction {
    pub action: CommitActionType,
    pub file_path: String,
    pub content: String,
}

/// Commit action kinds used by the store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitActionType {
    Create,
    Update,
}

#[derive(Serialize)]
struct CommitRequest<'a> {
    branch: &'a str,
    commit_message: &'a str,
    author_name: &'a str,
    author_email: &'a str,
    actions: &'a [CommitAction],
}

#[derive(Serialize)]
struct BranchRequest<'a> {
    branch: &'a str,
    #[serde(rename = "ref")]
    ref_name: &'a str,
}

#[derive(Serialize)]
struct MergeRequestRequest<'a> {
    source_branch: &'a str,
    target_branch: &'a str,
    title: &'a str,
}

/// An opened merge request.
#[derive(Clone, Debug, Deserialize)]
pub struct MergeRequest {
    pub iid: u64,
    pub title: String,
    #[serde(default)]
    pub web_url: Option<String>,
}

/// Client for one GitLab project repository.
///
/// Safe to share read-only across workers; the write path is serialised
/// through a single caller (the store).
#[derive(Clone, Debug)]
pub struct GitLabClient {
    http: reqwest::Client,
    endpoint: String,
    token: String,
    project: String,
}

impl GitLabClient {
    pub fn new(endpoint: &str, token: &str, project: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_owned(),
            token: token.to_owned(),
            project: project.to_owned(),
        }
    }

    fn project_url(&self, suffix: &str) -> String {
        format!(
            "{}/api/v4/projects/{}/{}",
            self.endpoint, self.project, suffix
        )
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, GitLabError> {
        let response = self
            .http
            .get(url)
            .header("PRIVATE-TOKEN", &self.token)
            .query(query)
            .timeout(API_TIMEOUT)
            .send()
            .await
            .map_err(GitLabError::from_reqwest)?;
        if !response.status().is_success() {
            return Err(GitLabError::Status {
                status: response.status().as_u16(),
                path: url.to_owned(),
            });
        }
        response
            .json()
            .await
            .map_err(|e| GitLabError::Decode(e.to_string()))
    }

    async fn post_json<B: Serialize, T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<T, GitLabError> {
        let response = self
            .http
            .post(url)
            .header("PRIVATE-TOKEN", &self.token)
            .json(body)
            .timeout(API_TIMEOUT)
            .send()
            .await
            .map_err(GitLabError::from_reqwest)?;
        if !response.status().is_success() {
            return Err(GitLabError::Status {
                status: response.status().as_u16(),
                path: url.to_owned(),
            });
        }
        response
            .json()
            .await
            .map_err(|e| GitLabError::Decode(e.to_string()))
    }

    async fn get_paginated<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, GitLabError> {
        let mut items: Vec<T> = Vec::new();
        let mut page = 1usize;
        loop {
            let mut query_page: Vec<(&str, String)> = query.to_vec();
            query_page.push(("per_page", PER_PAGE.to_string()));
            query_page.push(("page", page.to_string()));
            let batch: Vec<T> = self.get_json(url, &query_page).await?;
            let len = batch.len();
            items.extend(batch);
            if len < PER_PAGE {
                return Ok(items);
            }
            page += 1;
        }
    }

    /// Whether the API is reachable (project metadata fetch succeeds).
    pub async fn is_online(&self) -> bool {
        let url = self.project_url("");
        let url = url.trim_end_matches('/');
        match self
            .http
            .get(url)
            .header("PRIVATE-TOKEN", &self.token)
            .timeout(API_TIMEOUT)
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(error) => {
                debug!(target: "carta.gitlab", %error, "gitlab unreachable");
                false
            }
        }
    }

    /// List record blob paths under a tree path on a ref, recursively.
    pub async fn list_tree_paths(
        &self,
        path: &str,
        ref_name: &str,
    ) -> Result<Vec<String>, GitLabError> {
        let url = self.project_url("repository/tree");
        let query = [
            ("path", path.to_owned()),
            ("ref", ref_name.to_owned()),
            ("recursive", "true".to_owned()),
        ];
        let items: Vec<TreeItem> = self.get_paginated(&url, &query).await?;
        Ok(items
            .into_iter()
            .filter(|item| item.item_type == "blob")
            .map(|item| item.path)
            .collect())
    }

    /// Fetch a file's decoded contents and last commit id on a ref.
    pub async fn get_file(
        &self,
        path: &str,
        ref_name: &str,
    ) -> Result<RepositoryFile, GitLabError> {
        let url = self.project_url(&format!("repository/files/{}", encode_path(path)));
        let query = [("ref", ref_name.to_owned())];
        let raw: RawRepositoryFile = self.get_json(&url, &query).await?;
        let decoded = BASE64
            .decode(raw.content.replace('\n', ""))
            .map_err(|e| GitLabError::Decode(format!("file content: {e}")))?;
        let content = String::from_utf8(decoded)
            .map_err(|e| GitLabError::Decode(format!("file content: {e}")))?;
        Ok(RepositoryFile {
            content,
            last_commit_id: raw.last_commit_id,
        })
    }

    /// Head commit id of a ref.
    pub async fn head_commit(&self, ref_name: &str) -> Result<String, GitLabError> {
        let url = self.project_url("repository/commits");
        let query = [("ref_name", ref_name.to_owned())];
        let commits: Vec<Commit> = self.get_json(&url, &query).await?;
        commits
            .first()
            .map(|commit| commit.id.clone())
            .ok_or_else(|| GitLabError::Decode("no commits on ref".into()))
    }

    /// Commits in the range `from..to` (exclusive of `from`).
    pub async fn commits_in_range(
        &self,
        from: &str,
        to: &str,
    ) -> Result<Vec<Commit>, GitLabError> {
        let url = self.project_url("repository/commits");
        let query = [
            ("ref_name", format!("{from}..{to}")),
            ("all", "true".to_owned()),
        ];
        self.get_paginated(&url, &query).await
    }

    /// Diff entries for a commit.
    pub async fn commit_diff(&self, sha: &str) -> Result<Vec<DiffEntry>, GitLabError> {
        let url = self.project_url(&format!("repository/commits/{sha}/diff"));
        self.get_paginated(&url, &[]).await
    }

    /// Whether a branch exists.
    pub async fn branch_exists(&self, branch: &str) -> Result<bool, GitLabError> {
        let url = self.project_url(&format!("repository/branches/{}", encode_path(branch)));
        let response = self
            .http
            .get(&url)
            .header("PRIVATE-TOKEN", &self.token)
            .timeout(API_TIMEOUT)
            .send()
            .await
            .map_err(GitLabError::from_reqwest)?;
        match response.status().as_u16() {
            200 => Ok(true),
            404 => Ok(false),
            status => Err(GitLabError::Status {
                status,
                path: url,
            }),
        }
    }

    /// Create a branch from another ref.
    pub async fn create_branch(&self, branch: &str, from: &str) -> Result<(), GitLabError> {
        let url = self.project_url("repository/branches");
        let _: serde_json::Value = self
            .post_json(
                &url,
                &BranchRequest {
                    branch,
                    ref_name: from,
                },
            )
            .await?;
        Ok(())
    }

    /// Create a commit of file actions on a branch.
    ///
    /// The remote applies all actions atomically; a failed action fails the
    /// whole commit.
    pub async fn commit(
        &self,
        branch: &str,
        message: &str,
        author: (&str, &str),
        actions: &[CommitAction],
    ) -> Result<Commit, GitLabError> {
        let url = self.project_url("repository/commits");
        self.post_json(
            &url,
            &CommitRequest {
                branch,
                commit_message: message,
                author_name: author.0,
                author_email: author.1,
                actions,
            },
        )
        .await
    }

    /// Open merge requests for a source branch.
    pub async fn list_merge_requests(
        &self,
        source_branch: &str,
    ) -> Result<Vec<MergeRequest>, GitLabError> {
        let url = self.project_url("merge_requests");
        let query = [
            ("state", "opened".to_owned()),
            ("source_branch", source_branch.to_owned()),
        ];
        self.get_json(&url, &query).await
    }

    /// Open a merge request between two branches.
    pub async fn open_merge_request(
        &self,
        source_branch: &str,
        target_branch: &str,
        title: &str,
    ) -> Result<MergeRequest, GitLabError> {
        let url = self.project_url("merge_requests");
        self.post_json(
            &url,
            &MergeRequestRequest {
                source_branch,
                target_branch,
                title,
            },
        )
        .await
    }
}

/// Percent-encode a repository path for use in a URL segment.
fn encode_path(path: &str) -> String {
    path.replace('%', "%25")
        .replace('/', "%2F")
        .replace('.', "%2E")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client(server: &MockServer) -> GitLabClient {
        GitLabClient::new(&server.uri(), "glpat-secret", "123")
    }

    #[test]
    fn encode_path_escapes_segments() {
        assert_eq!(
            encode_path("records/ab/cd/x.json"),
            "records%2Fab%2Fcd%2Fx%2Ejson"
        );
    }

    #[tokio::test]
    async fn list_tree_paths_filters_blobs() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v4/projects/123/repository/tree"))
            .and(query_param("recursive", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": "1", "name": "ab", "path": "records/ab", "type": "tree"},
                {"id": "2", "name": "x.json", "path": "records/ab/cd/x.json", "type": "blob"},
            ])))
            .mount(&server)
            .await;

        let paths = client(&server)
            .await
            .list_tree_paths("records", "main")
            .await
            .unwrap();
        assert_eq!(paths, vec!["records/ab/cd/x.json"]);
    }

    #[tokio::test]
    async fn get_file_decodes_base64_content() {
        let server = MockServer::start().await;
        let encoded = BASE64.encode("{\"file_identifier\": \"x\"}");
        Mock::given(method("GET"))
            .and(path(
                "/api/v4/projects/123/repository/files/records%2Fx%2Ejson",
            ))
            .and(query_param("ref", "main"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "content": encoded,
                "last_commit_id": "abc123",
            })))
            .mount(&server)
            .await;

        let file = client(&server)
            .await
            .get_file("records/x.json", "main")
            .await
            .unwrap();
        assert_eq!(file.content, "{\"file_identifier\": \"x\"}");
        assert_eq!(file.last_commit_id, "abc123");
    }

    #[tokio::test]
    async fn head_commit_takes_most_recent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v4/projects/123/repository/commits"))
            .and(query_param("ref_name", "main"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": "b", "title": "newer"},
                {"id": "a", "title": "older"},
            ])))
            .mount(&server)
            .await;

        let head = client(&server).await.head_commit("main").await.unwrap();
        assert_eq!(head, "b");
    }

    #[tokio::test]
    async fn commits_in_range_uses_range_ref() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v4/projects/123/repository/commits"))
            .and(query_param("ref_name", "a..b"))
            .and(query_param("all", "true"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!([{"id": "b", "title": "x"}])),
            )
            .mount(&server)
            .await;

        let commits = client(&server)
            .await
            .commits_in_range("a", "b")
            .await
            .unwrap();
        assert_eq!(commits.len(), 1);
        assert_eq!(commits[0].id, "b");
    }

    #[tokio::test]
    async fn branch_exists_maps_404_to_false() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v4/projects/123/repository/branches/publishing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        assert!(
            !client(&server)
                .await
                .branch_exists("publishing")
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn create_branch_posts_ref() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v4/projects/123/repository/branches"))
            .and(body_partial_json(json!({"branch": "publishing", "ref": "main"})))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(json!({"name": "publishing"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        client(&server)
            .await
            .create_branch("publishing", "main")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn commit_posts_actions() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v4/projects/123/repository/commits"))
            .and(body_partial_json(json!({
                "branch": "main",
                "commit_message": "update records",
                "actions": [{"action": "create", "file_path": "records/ab/cd/x.json"}],
            })))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(json!({"id": "new-sha", "title": "update records"})),
            )
            .mount(&server)
            .await;

        let commit = client(&server)
            .await
            .commit(
                "main",
                "update records",
                ("Carta", "carta@example.com"),
                &[CommitAction {
                    action: CommitActionType::Create,
                    file_path: "records/ab/cd/x.json".into(),
                    content: "{}".into(),
                }],
            )
            .await
            .unwrap();
        assert_eq!(commit.id, "new-sha");
    }

    #[tokio::test]
    async fn error_status_surfaces() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v4/projects/123/repository/commits"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let result = client(&server).await.head_commit("main").await;
        assert!(matches!(
            result,
            Err(GitLabError::Status { status: 500, .. })
        ));
    }

    #[tokio::test]
    async fn is_online_false_when_unreachable() {
        let client = GitLabClient::new("http://127.0.0.1:1", "token", "123");
        assert!(!client.is_online().await);
    }
}
