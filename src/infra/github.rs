//! Commit-based blog target over the GitHub GraphQL API.

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;
use url::Url;

use crate::application::sources::{BlogTarget, SourceError};

const HEAD_QUERY: &str = "query ($owner: String!, $name: String!, $expression: String!) { \
repository(owner: $owner, name: $name) { object(expression: $expression) { oid } } }";

const COMMIT_MUTATION: &str = "mutation ($input: CreateCommitOnBranchInput!) { \
createCommitOnBranch(input: $input) { commit { url } } }";

#[derive(Debug, Clone)]
pub struct GithubRepository {
    pub owner: String,
    pub name: String,
    pub branch: String,
}

pub struct GithubBlogTarget {
    client: Client,
    endpoint: Url,
    token: String,
    repository: GithubRepository,
}

#[derive(Debug, Deserialize)]
struct GraphqlResponse {
    data: Option<Value>,
    #[serde(default)]
    errors: Vec<GraphqlError>,
}

#[derive(Debug, Deserialize)]
struct GraphqlError {
    message: String,
}

impl GithubBlogTarget {
    pub fn new(client: Client, endpoint: Url, token: String, repository: GithubRepository) -> Self {
        Self {
            client,
            endpoint,
            token,
            repository,
        }
    }

    async fn execute(&self, query: &str, variables: Value) -> Result<Value, SourceError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.token)
            .header(reqwest::header::USER_AGENT, "homing")
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let body: GraphqlResponse = response.json().await?;
        if let Some(error) = body.errors.first() {
            return Err(SourceError::Rejected {
                status: status.as_u16(),
                body: error.message.clone(),
            });
        }
        body.data
            .ok_or_else(|| SourceError::invalid_response("graphql response carries no data"))
    }
}

#[async_trait]
impl BlogTarget for GithubBlogTarget {
    async fn head_revision(&self) -> Result<String, SourceError> {
        let data = self
            .execute(
                HEAD_QUERY,
                json!({
                    "owner": self.repository.owner,
                    "name": self.repository.name,
                    "expression": self.repository.branch,
                }),
            )
            .await?;

        data.pointer("/repository/object/oid")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| SourceError::invalid_response("branch head has no oid"))
    }

    async fn commit_file(
        &self,
        path: &str,
        contents: &str,
        message: &str,
        expected_head: &str,
    ) -> Result<(), SourceError> {
        let input = json!({
            "branch": {
                "repositoryNameWithOwner": format!("{}/{}", self.repository.owner, self.repository.name),
                "branchName": self.repository.branch,
            },
            "message": { "headline": message },
            "fileChanges": {
                "additions": [{ "path": path, "contents": STANDARD.encode(contents) }],
            },
            "expectedHeadOid": expected_head,
        });

        let data = self.execute(COMMIT_MUTATION, json!({ "input": input })).await?;
        let url = data
            .pointer("/createCommitOnBranch/commit/url")
            .and_then(Value::as_str)
            .unwrap_or_default();
        debug!(target = "infra::github", path, commit = url, "commit created");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_string_contains, header, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn target(server: &MockServer) -> GithubBlogTarget {
        GithubBlogTarget::new(
            Client::new(),
            Url::parse(&format!("{}/graphql", server.uri())).expect("url"),
            "secret".to_string(),
            GithubRepository {
                owner: "someone".to_string(),
                name: "site".to_string(),
                branch: "master".to_string(),
            },
        )
    }

    #[tokio::test]
    async fn head_revision_reads_oid() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("authorization", "Bearer secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "repository": { "object": { "oid": "deadbeef" } } }
            })))
            .mount(&server)
            .await;

        assert_eq!(target(&server).head_revision().await.expect("oid"), "deadbeef");
    }

    #[tokio::test]
    async fn commit_sends_expected_head_and_encoded_contents() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains("\"expectedHeadOid\":\"deadbeef\""))
            .and(body_string_contains(&STANDARD.encode("# hi")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "createCommitOnBranch": { "commit": { "url": "https://x" } } }
            })))
            .expect(1)
            .mount(&server)
            .await;

        target(&server)
            .commit_file("content/blog/hi/index.md", "# hi", "Wrote/updated hi", "deadbeef")
            .await
            .expect("commit");
    }

    #[tokio::test]
    async fn stale_head_surfaces_graphql_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": null,
                "errors": [{ "message": "Expected branch to point to \"deadbeef\"" }]
            })))
            .mount(&server)
            .await;

        let result = target(&server)
            .commit_file("a", "b", "c", "deadbeef")
            .await;
        assert!(matches!(result, Err(SourceError::Rejected { .. })));
    }
}
