//! services/client/src/adapters/http_api.rs
//!
//! This module contains the adapter for the news backend's JSON REST API.
//! It implements the `NewsApi` port from the `core` crate.

use async_trait::async_trait;
use news_digest_core::{
    ActivityEvent, Article, AuthReply, Credentials, Digest, NewsApi, PortError, PortResult,
    Preferences, UserId,
};
use reqwest::{Client, Response};
use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use tracing::{debug, warn};

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Serialize)]
struct CredentialsBody<'a> {
    username: &'a str,
    password: &'a str,
}

/// Body of `/register` and `/login` replies. Every field is optional: the
/// backend sends either the success field or `error`.
#[derive(Deserialize, Default)]
#[serde(default)]
struct AuthBody {
    user_id: Option<WireId>,
    message: Option<String>,
    error: Option<String>,
}

/// User ids arrive as strings or as integer primary keys.
#[derive(Deserialize)]
#[serde(untagged)]
enum WireId {
    Text(String),
    Number(serde_json::Number),
}

impl From<WireId> for UserId {
    fn from(id: WireId) -> Self {
        match id {
            WireId::Text(s) => UserId::new(s),
            WireId::Number(n) => UserId::new(n.to_string()),
        }
    }
}

#[derive(Serialize)]
struct ActivityBody<'a> {
    user_id: &'a str,
    article_url: &'a str,
    article_title: &'a str,
    liked: Option<bool>,
    clicked_full_article: bool,
    time_spent: f64,
}

#[derive(Serialize)]
struct DigestRequestBody<'a> {
    topics: &'a [String],
    language: &'a str,
}

#[derive(Deserialize)]
struct DigestBody {
    articles: Vec<ArticleBody>,
    #[serde(default)]
    timestamp: Option<String>,
}

#[derive(Deserialize)]
struct ArticleBody {
    title: String,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    source: String,
    #[serde(default)]
    published_date: String,
    #[serde(default, deserialize_with = "empty_as_none")]
    url: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    image_url: Option<String>,
}

impl From<ArticleBody> for Article {
    fn from(a: ArticleBody) -> Self {
        Self {
            title: a.title,
            summary: a.summary,
            source: a.source,
            published_date: a.published_date,
            url: a.url,
            image_url: a.image_url,
        }
    }
}

/// The backend sends `""` for a missing link or image.
fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `NewsApi` port over HTTP.
#[derive(Clone)]
pub struct HttpNewsApi {
    client: Client,
    base_url: String,
}

impl HttpNewsApi {
    /// Creates a new `HttpNewsApi`. `base_url` is the API root, e.g. `http://localhost:5000/api`.
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// POSTs a JSON body. Only transport failures are errors here; status is left to the caller.
    async fn post_json<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> PortResult<Response> {
        let url = self.url(path);
        debug!("POST {}", url);
        self.client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| PortError::Transport(e.to_string()))
    }

    async fn auth(&self, path: &str, credentials: &Credentials) -> PortResult<AuthReply> {
        let body = CredentialsBody {
            username: &credentials.username,
            password: &credentials.password,
        };
        let response = self.post_json(path, &body).await?;
        debug!(status = %response.status(), "{} answered", path);
        let body: AuthBody = read_json(response).await?;
        Ok(AuthReply {
            user_id: body.user_id.map(UserId::from),
            message: body.message,
            error: body.error,
        })
    }
}

async fn read_json<R: DeserializeOwned>(response: Response) -> PortResult<R> {
    let bytes = response
        .bytes()
        .await
        .map_err(|e| PortError::Transport(e.to_string()))?;
    serde_json::from_slice(&bytes).map_err(|e| PortError::Decode(e.to_string()))
}

//=========================================================================================
// `NewsApi` Trait Implementation
//=========================================================================================

#[async_trait]
impl NewsApi for HttpNewsApi {
    async fn register(&self, credentials: &Credentials) -> PortResult<AuthReply> {
        self.auth("register", credentials).await
    }

    async fn login(&self, credentials: &Credentials) -> PortResult<AuthReply> {
        self.auth("login", credentials).await
    }

    async fn record_activity(&self, event: &ActivityEvent) -> PortResult<()> {
        let body = ActivityBody {
            user_id: event.user_id.as_str(),
            article_url: &event.article_url,
            article_title: &event.article_title,
            liked: event.liked,
            clicked_full_article: event.clicked_full_article,
            time_spent: event.time_spent,
        };
        let response = self.post_json("activity", &body).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(PortError::Status {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }
        Ok(())
    }

    async fn fetch_digest(&self, preferences: &Preferences) -> PortResult<Digest> {
        let body = DigestRequestBody {
            topics: &preferences.topics,
            language: &preferences.language,
        };
        let response = self.post_json("digest", &body).await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Digest request rejected with {}: {}", status, body);
            return Err(PortError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let digest: DigestBody = read_json(response).await?;
        Ok(Digest {
            articles: digest.articles.into_iter().map(Article::from).collect(),
            timestamp: digest.timestamp,
        })
    }
}
