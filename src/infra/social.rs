//! Social network post client.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use url::Url;

use crate::application::sources::{SocialTarget, SourceError};

pub struct SocialClient {
    client: Client,
    api_base: Url,
    bearer_token: String,
}

#[derive(Debug, Deserialize)]
struct PostResponse {
    data: PostData,
}

#[derive(Debug, Deserialize)]
struct PostData {
    id: String,
}

impl SocialClient {
    pub fn new(client: Client, api_base: Url, bearer_token: String) -> Self {
        Self {
            client,
            api_base,
            bearer_token,
        }
    }

    fn posts_url(&self) -> Result<Url, SourceError> {
        self.api_base
            .join("2/tweets")
            .map_err(|err| SourceError::invalid_response(err.to_string()))
    }
}

fn post_body(text: &str, media_ids: &[String], reply_to: Option<&str>) -> Value {
    let mut body = Map::new();
    body.insert("text".to_string(), json!(text));
    if !media_ids.is_empty() {
        body.insert("media".to_string(), json!({ "media_ids": media_ids }));
    }
    if let Some(parent) = reply_to {
        body.insert("reply".to_string(), json!({ "in_reply_to_tweet_id": parent }));
    }
    Value::Object(body)
}

#[async_trait]
impl SocialTarget for SocialClient {
    async fn post(
        &self,
        text: &str,
        media_ids: &[String],
        reply_to: Option<&str>,
    ) -> Result<String, SourceError> {
        let response = self
            .client
            .post(self.posts_url()?)
            .bearer_auth(&self.bearer_token)
            .json(&post_body(text, media_ids, reply_to))
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

        let body: PostResponse = response.json().await?;
        Ok(body.data.id)
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[test]
    fn body_omits_empty_sections() {
        assert_eq!(post_body("hi", &[], None), json!({ "text": "hi" }));
        assert_eq!(
            post_body("hi", &["m1".to_string()], Some("p0")),
            json!({
                "text": "hi",
                "media": { "media_ids": ["m1"] },
                "reply": { "in_reply_to_tweet_id": "p0" }
            })
        );
    }

    #[tokio::test]
    async fn post_returns_new_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/2/tweets"))
            .and(body_json(json!({ "text": "hello", "reply": { "in_reply_to_tweet_id": "1" } })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "data": { "id": "2", "text": "hello" }
            })))
            .mount(&server)
            .await;

        let client = SocialClient::new(
            Client::new(),
            Url::parse(&format!("{}/", server.uri())).expect("url"),
            "token".to_string(),
        );

        assert_eq!(client.post("hello", &[], Some("1")).await.expect("post"), "2");
    }

    #[tokio::test]
    async fn rejected_post_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_string("duplicate content"))
            .mount(&server)
            .await;

        let client = SocialClient::new(
            Client::new(),
            Url::parse(&format!("{}/", server.uri())).expect("url"),
            "token".to_string(),
        );

        let result = client.post("hello", &[], None).await;
        assert!(matches!(result, Err(SourceError::Rejected { status: 403, .. })));
    }
}
