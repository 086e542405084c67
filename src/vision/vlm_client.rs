// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! VLM sidecar OCR client via OpenAI-compatible API

use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{DynamicImage, ImageFormat};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::vision::ocr::{OcrBackend, OcrOutput};

/// Transcription instruction sent with every image
const TRANSCRIBE_PROMPT: &str = "Transcribe the overlay text in this image exactly as rendered. \
Keep the original line breaks and capitalization. Reply with the text only, or nothing if the \
image contains no text.";

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Info strings a model puts on a fence around plain text
const FENCE_TAGS: &[&str] = &["text", "txt", "plain", "plaintext", "markdown", "md"];

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: [PromptMessage<'a>; 1],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct PromptMessage<'a> {
    role: &'static str,
    content: [ContentPart<'a>; 2],
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrl<'a> },
}

#[derive(Debug, Serialize)]
struct ImageUrl<'a> {
    url: &'a str,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    #[serde(default)]
    content: Option<String>,
}

/// OCR backend that asks a vision-language model sidecar to transcribe text
///
/// The sidecar must expose an OpenAI-compatible `/v1/chat/completions` route.
pub struct VlmOcrClient {
    http: Client,
    base_url: String,
    model_name: String,
}

impl VlmOcrClient {
    pub fn new(endpoint: &str, model_name: &str) -> Result<Self> {
        Self::with_timeout(endpoint, model_name, DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_timeout(endpoint: &str, model_name: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build VLM HTTP client")?;
        let base_url = endpoint.trim_end_matches('/').to_string();

        info!("VLM OCR sidecar at {} (model {})", base_url, model_name);

        Ok(Self {
            http,
            base_url,
            model_name: model_name.to_string(),
        })
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Whether the sidecar answers its health route
    pub async fn health_check(&self) -> bool {
        let url = format!("{}/health", self.base_url);
        match self.http.get(&url).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                debug!("VLM sidecar unreachable at {}: {}", url, e);
                false
            }
        }
    }

    fn completion_request<'a>(&'a self, data_url: &'a str) -> CompletionRequest<'a> {
        CompletionRequest {
            model: &self.model_name,
            messages: [PromptMessage {
                role: "user",
                content: [
                    ContentPart::Text {
                        text: TRANSCRIBE_PROMPT,
                    },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl { url: data_url },
                    },
                ],
            }],
            max_tokens: 512,
            temperature: 0.0,
        }
    }
}

/// PNG-encode an image as a base64 data URL
pub fn to_png_data_url(image: &DynamicImage) -> Result<String> {
    let mut png = Cursor::new(Vec::new());
    image
        .write_to(&mut png, ImageFormat::Png)
        .context("Failed to encode crop as PNG")?;
    Ok(format!("data:image/png;base64,{}", STANDARD.encode(png.get_ref())))
}

/// Strip the wrapping a chat model tends to add around a transcript
///
/// Removes a surrounding markdown code fence (with optional language tag) and
/// one pair of matching quotes, then trims each line.
pub fn clean_transcript(raw: &str) -> String {
    let mut text = raw.trim();

    if let Some(inner) = text.strip_prefix("```") {
        let inner = inner.strip_suffix("```").unwrap_or(inner);
        // the opening fence line may only carry a known info string
        text = match inner.split_once('\n') {
            Some((tag, rest)) if is_fence_tag(tag) => rest,
            _ => inner,
        }
        .trim();
    }

    for quote in ['"', '\''] {
        if text.len() >= 2 && text.starts_with(quote) && text.ends_with(quote) {
            text = &text[1..text.len() - 1];
            break;
        }
    }

    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn is_fence_tag(line: &str) -> bool {
    let tag = line.trim();
    tag.is_empty() || FENCE_TAGS.iter().any(|known| tag.eq_ignore_ascii_case(known))
}

#[async_trait]
impl OcrBackend for VlmOcrClient {
    fn name(&self) -> &str {
        "vlm"
    }

    /// The sidecar reports no confidence; a non-empty read counts as 1.0
    async fn recognize(&self, image: &DynamicImage) -> Result<OcrOutput> {
        let start = Instant::now();
        let data_url = to_png_data_url(image)?;

        let reply: CompletionResponse = self
            .http
            .post(format!("{}/v1/chat/completions", self.base_url))
            .json(&self.completion_request(&data_url))
            .send()
            .await
            .context("VLM sidecar request failed")?
            .error_for_status()?
            .json()
            .await
            .context("VLM sidecar returned an unexpected body")?;

        let text = reply
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| clean_transcript(&content))
            .unwrap_or_default();
        let processing_time_ms = start.elapsed().as_millis() as u64;

        debug!("VLM transcript {:?} in {}ms", text, processing_time_ms);

        Ok(OcrOutput {
            confidence: if text.is_empty() { 0.0 } else { 1.0 },
            text,
            processing_time_ms,
        })
    }
}
