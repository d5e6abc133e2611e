//! HTTP submission of an assembled recipe: multipart upload with the JSON
//! payload in a `recipe` part and an optional webp thumbnail in an `image`
//! part. Transport hiccups are retried on a short fixed interval; a server
//! rejection is surfaced as-is, never retried.

use ladle::api::ApiResponse;
use ladle::recipe_json::RecipeForUpload;
use reqwest::multipart::{Form, Part};
use tokio_retry::strategy::FixedInterval;
use tokio_retry::Retry;

#[derive(thiserror::Error, Debug)]
pub enum SubmitError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("could not serialize the recipe payload: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("server rejected the recipe ({status}): {message}")]
    Rejected { status: u16, message: String },
}

/// What the server said about a stored recipe.
#[derive(Debug)]
pub struct SubmitReceipt {
    pub recipe_id: Option<i64>,
    pub message: Option<String>,
}

pub struct MarketplaceClient {
    base_url: String,
    token: String,
    http: reqwest::Client,
}

impl MarketplaceClient {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: token.into(),
            http: reqwest::Client::new(),
        }
    }

    /// Create a new recipe.
    pub async fn submit(
        &self,
        upload: &RecipeForUpload,
        image: Option<Vec<u8>>,
    ) -> Result<SubmitReceipt, SubmitError> {
        let url = format!("{}/api/v1/recipes", self.base_url);
        self.send(reqwest::Method::POST, url, upload, image).await
    }

    /// Replace an existing recipe, keeping its id.
    pub async fn update(
        &self,
        recipe_id: i64,
        upload: &RecipeForUpload,
        image: Option<Vec<u8>>,
    ) -> Result<SubmitReceipt, SubmitError> {
        let url = format!("{}/api/v1/recipes/{}", self.base_url, recipe_id);
        self.send(reqwest::Method::PUT, url, upload, image).await
    }

    async fn send(
        &self,
        method: reqwest::Method,
        url: String,
        upload: &RecipeForUpload,
        image: Option<Vec<u8>>,
    ) -> Result<SubmitReceipt, SubmitError> {
        let body = serde_json::to_string(upload)?;
        // The form is consumed per attempt, so each retry rebuilds it.
        let response = Retry::spawn(FixedInterval::from_millis(500).take(2), || async {
            let mut form = Form::new().text("recipe", body.clone());
            if let Some(bytes) = &image {
                form = form.part(
                    "image",
                    Part::bytes(bytes.clone())
                        .file_name("thumbnail.webp")
                        .mime_str("image/webp")?,
                );
            }
            self.http
                .request(method.clone(), &url)
                .bearer_auth(&self.token)
                .multipart(form)
                .send()
                .await
        })
        .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            let message = serde_json::from_str::<ApiResponse<serde_json::Value>>(&text)
                .ok()
                .and_then(|envelope| envelope.message)
                .unwrap_or(text);
            return Err(SubmitError::Rejected {
                status: status.as_u16(),
                message,
            });
        }
        let envelope: ApiResponse<serde_json::Value> = serde_json::from_str(&text)?;
        Ok(SubmitReceipt {
            recipe_id: envelope.data.get("recipe_id").and_then(|v| v.as_i64()),
            message: envelope.message,
        })
    }
}
