pub mod output;

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use std::time::{Duration, Instant};
use tokio::time::sleep;

use crate::config::ReplicateConfig;
use crate::error::{Result, VaultError};
use crate::models::image::{GeneratedImage, GenerationRequest};

pub use output::PredictionOutput;

pub const MODEL_ID: &str = "stability-ai/stable-diffusion-3.5-large";

const DEFAULT_API_BASE: &str = "https://api.replicate.com/v1";
const POLL_INTERVAL: Duration = Duration::from_millis(500);
const POLL_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug)]
pub struct ReplicateClient {
    client: Client,
    api_token: String,
    api_base: String,
}

impl ReplicateClient {
    pub fn new(config: ReplicateConfig) -> Result<Self> {
        let api_token = config.api_token.ok_or_else(|| {
            VaultError::MissingCredential(
                "Replicate API token not found. Set REPLICATE_API_TOKEN in your .env file or environment.".to_string(),
            )
        })?;

        let api_base = config
            .api_base
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            client: Client::new(),
            api_token,
            api_base,
        })
    }

    fn predictions_endpoint(&self) -> String {
        format!("{}/models/{}/predictions", self.api_base, MODEL_ID)
    }

    /// Run one prediction to completion and decode its image. The request is
    /// sent with `Prefer: wait`, so the response usually carries a terminal
    /// prediction already; otherwise the prediction is polled until done.
    pub async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedImage> {
        request.validate()?;

        log::info!("🎨 Requesting prediction from {}", MODEL_ID);
        log::debug!("Job input: {}", request.job_input());

        let response = self
            .client
            .post(self.predictions_endpoint())
            .bearer_auth(&self.api_token)
            .header("Prefer", "wait")
            .json(&json!({ "input": request.job_input() }))
            .send()
            .await
            .map_err(|e| VaultError::RequestError(format!("Replicate request failed: {}", e)))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(VaultError::ModelNotFound(format!(
                "{} was not found on Replicate. The current Stable Diffusion 3.5 slug is stability-ai/stable-diffusion-3.5-large.",
                MODEL_ID
            )));
        }
        if status == StatusCode::UNAUTHORIZED {
            return Err(VaultError::InvalidCredentials(
                "Replicate rejected the API token. Check REPLICATE_API_TOKEN.".to_string(),
            ));
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(VaultError::RequestError(format!(
                "Prediction request failed: {} - {}",
                status, error_text
            )));
        }

        let mut prediction: Value = response.json().await.map_err(|e| {
            VaultError::ResponseError(format!("Failed to parse prediction: {}", e))
        })?;

        if !is_terminal(&prediction) {
            prediction = self.poll_prediction(&prediction).await?;
        }

        let final_status = prediction["status"].as_str().unwrap_or_default();
        if final_status != "succeeded" {
            let detail = prediction["error"].as_str().unwrap_or("no error detail");
            return Err(VaultError::RequestError(format!(
                "Prediction {}: {}",
                final_status, detail
            )));
        }

        let output = PredictionOutput::classify(&prediction["output"])?;
        let bytes = self.fetch_output(output).await?;

        let image = image::load_from_memory(&bytes)
            .map_err(|e| VaultError::ImageDecode(format!("Failed to decode image: {}", e)))?;

        log::info!(
            "✅ Received {}x{} image ({} bytes)",
            image.width(),
            image.height(),
            bytes.len()
        );

        Ok(GeneratedImage {
            image,
            model: MODEL_ID.to_string(),
        })
    }

    async fn poll_prediction(&self, prediction: &Value) -> Result<Value> {
        let poll_url = prediction["urls"]["get"]
            .as_str()
            .ok_or_else(|| {
                VaultError::ResponseError("Prediction is missing its poll URL".to_string())
            })?
            .to_string();

        let started = Instant::now();
        loop {
            let current: Value = self
                .client
                .get(&poll_url)
                .bearer_auth(&self.api_token)
                .send()
                .await
                .map_err(|e| VaultError::RequestError(format!("Prediction poll failed: {}", e)))?
                .json()
                .await
                .map_err(|e| {
                    VaultError::ResponseError(format!("Failed to parse poll response: {}", e))
                })?;

            if is_terminal(&current) {
                return Ok(current);
            }

            if started.elapsed() >= POLL_TIMEOUT {
                return Err(VaultError::RequestError(format!(
                    "Prediction did not finish within {}s",
                    POLL_TIMEOUT.as_secs()
                )));
            }

            log::debug!(
                "🔄 Prediction still {}",
                current["status"].as_str().unwrap_or("pending")
            );
            sleep(POLL_INTERVAL).await;
        }
    }

    async fn fetch_output(&self, output: PredictionOutput) -> Result<Vec<u8>> {
        match output {
            PredictionOutput::Inline(bytes) => Ok(bytes),
            PredictionOutput::Url(url) => {
                log::debug!("⬇️  Downloading image from {}", url);
                // Delivery URLs are pre-signed, no auth header needed.
                let response = self.client.get(&url).send().await.map_err(|e| {
                    VaultError::RequestError(format!("Image download failed: {}", e))
                })?;

                if !response.status().is_success() {
                    return Err(VaultError::RequestError(format!(
                        "Image download failed: {}",
                        response.status()
                    )));
                }

                let bytes = response.bytes().await.map_err(|e| {
                    VaultError::RequestError(format!("Image download failed: {}", e))
                })?;
                Ok(bytes.to_vec())
            }
        }
    }
}

fn is_terminal(prediction: &Value) -> bool {
    matches!(
        prediction["status"].as_str(),
        Some("succeeded") | Some("failed") | Some("canceled")
    )
}
