//! Azure Cognitive Services text-to-speech over the REST API.
//!
//! Requests a fixed output format (48 kHz 192 kbps MP3 unless overridden) so
//! responses decode with the cache codec at its own sample rate.

use crate::defaults::{MP3_OUTPUT_FORMAT, REQUEST_TIMEOUT_SECS};
use crate::error::{LexvoxError, Result};
use crate::tts::synthesizer::Synthesizer;
use async_trait::async_trait;
use std::time::Duration;

/// Environment variable holding the subscription key.
pub const KEY_VAR: &str = "AZURE_SPEECH_KEY";

/// Environment variable holding the service region (e.g. "eastasia").
pub const REGION_VAR: &str = "AZURE_SPEECH_REGION";

/// Subscription key and region for the speech service.
#[derive(Clone)]
pub struct AzureCredentials {
    pub key: String,
    pub region: String,
}

impl std::fmt::Debug for AzureCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureCredentials")
            .field("key", &"<redacted>")
            .field("region", &self.region)
            .finish()
    }
}

impl AzureCredentials {
    /// Read credentials from the environment.
    ///
    /// Call `dotenvy::dotenv()` beforehand to pick up a `.env` file.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            key: require_env(KEY_VAR)?,
            region: require_env(REGION_VAR)?,
        })
    }
}

fn require_env(variable: &str) -> Result<String> {
    match std::env::var(variable) {
        Ok(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => Err(LexvoxError::MissingCredential {
            variable: variable.to_string(),
        }),
    }
}

/// Synthesizer backed by the Azure speech REST endpoint.
#[derive(Debug, Clone)]
pub struct AzureSynthesizer {
    credentials: AzureCredentials,
    endpoint: String,
    output_format: String,
    client: reqwest::Client,
}

impl AzureSynthesizer {
    /// Create a synthesizer for the credentials' region.
    pub fn new(credentials: AzureCredentials, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LexvoxError::SynthesisService {
                message: format!("Failed to build HTTP client: {e}"),
            })?;
        let endpoint = format!(
            "https://{}.tts.speech.microsoft.com/cognitiveservices/v1",
            credentials.region
        );
        Ok(Self {
            credentials,
            endpoint,
            output_format: MP3_OUTPUT_FORMAT.to_string(),
            client,
        })
    }

    /// Create from `AZURE_SPEECH_KEY` / `AZURE_SPEECH_REGION` with the default timeout.
    pub fn from_env() -> Result<Self> {
        Self::new(
            AzureCredentials::from_env()?,
            Duration::from_secs(REQUEST_TIMEOUT_SECS),
        )
    }

    /// Override the endpoint URL (custom domains, proxies).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Override the `X-Microsoft-OutputFormat` header value.
    pub fn with_output_format(mut self, format: impl Into<String>) -> Self {
        self.output_format = format.into();
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Synthesizer for AzureSynthesizer {
    async fn synthesize(&self, text: &str, voice: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("Ocp-Apim-Subscription-Key", &self.credentials.key)
            .header("Content-Type", "application/ssml+xml")
            .header("X-Microsoft-OutputFormat", &self.output_format)
            .header("User-Agent", concat!("lexvox/", env!("CARGO_PKG_VERSION")))
            .body(ssml(text, voice))
            .send()
            .await
            .map_err(|e| LexvoxError::SynthesisService {
                message: format!("Request failed: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LexvoxError::SynthesisService {
                message: format!("Azure TTS returned {status}: {}", body.trim()),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| LexvoxError::SynthesisService {
                message: format!("Failed to read audio response: {e}"),
            })?;
        if bytes.is_empty() {
            return Err(LexvoxError::SynthesisService {
                message: "Azure TTS returned no audio".to_string(),
            });
        }
        Ok(bytes.to_vec())
    }

    fn name(&self) -> &str {
        "azure"
    }
}

/// Locale of a service voice id: its first two `-` segments (`zh-HK-...` → `zh-HK`).
pub fn voice_locale(voice: &str) -> String {
    let mut parts = voice.splitn(3, '-');
    match (parts.next(), parts.next()) {
        (Some(lang), Some(region)) if !lang.is_empty() && !region.is_empty() => {
            format!("{lang}-{region}")
        }
        _ => "en-US".to_string(),
    }
}

/// Build the SSML request body for `text` spoken by `voice`.
pub fn ssml(text: &str, voice: &str) -> String {
    format!(
        "<speak version='1.0' xml:lang='{}'><voice name='{}'>{}</voice></speak>",
        escape_xml(&voice_locale(voice)),
        escape_xml(voice),
        escape_xml(text)
    )
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '\'' => escaped.push_str("&apos;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
