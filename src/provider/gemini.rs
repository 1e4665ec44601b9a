use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

use super::Provider;
use crate::config::Config;
use crate::errors::ProviderError;
use crate::model::MediaRef;
use crate::wire::{
    ImageRequest, Part, SpeechRequest, TextRequest, TextResponse, TurnRole, VideoJob, VideoRequest, VideoStatus,
};

/// Largest download accepted from `fetch_media`.
const MAX_MEDIA_BYTES: usize = 256 * 1024 * 1024;

/// Client for the Generative Language REST API.
pub struct GeminiProvider {
    client: Client,
    api_key: Option<String>,
    api_base: String,
    timeout: Duration,
}

impl GeminiProvider {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        let client = Client::builder().connect_timeout(Duration::from_secs(15)).build()?;
        Ok(Self {
            client,
            api_key: cfg.api_key.clone().filter(|k| !k.is_empty()),
            api_base: cfg.api_base.trim_end_matches('/').to_string(),
            timeout: cfg.timeout(),
        })
    }

    fn key(&self) -> Result<&str, ProviderError> {
        self.api_key.as_deref().ok_or(ProviderError::MissingCredentials)
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value, ProviderError> {
        let key = self.key()?;
        let url = format!("{}/v1beta/{}", self.api_base, path);
        tracing::debug!(%url, "gemini POST");
        let resp = self
            .client
            .post(&url)
            .header("x-goog-api-key", key)
            .timeout(self.timeout)
            .json(body)
            .send()
            .await?;
        read_json(resp).await
    }

    async fn get(&self, path: &str) -> Result<Value, ProviderError> {
        let key = self.key()?;
        let url = format!("{}/v1beta/{}", self.api_base, path);
        tracing::debug!(%url, "gemini GET");
        let resp = self
            .client
            .get(&url)
            .header("x-goog-api-key", key)
            .timeout(self.timeout)
            .send()
            .await?;
        read_json(resp).await
    }

    /// Media downloads get the same per-request deadline as API calls.
    fn download(&self, uri: &str, key: &str) -> reqwest::RequestBuilder {
        self.client.get(uri).header("x-goog-api-key", key).timeout(self.timeout)
    }

    async fn generate_content(&self, model: &str, body: &Value) -> Result<GenerateResponse, ProviderError> {
        let raw = self.post(&format!("models/{model}:generateContent"), body).await?;
        serde_json::from_value(raw).map_err(|e| ProviderError::Malformed(e.to_string()))
    }
}

async fn read_json(resp: reqwest::Response) -> Result<Value, ProviderError> {
    let status = resp.status();
    let text = resp.text().await?;
    if !status.is_success() {
        return Err(ProviderError::Api { status: status.as_u16(), body: text });
    }
    serde_json::from_str(&text).map_err(|e| ProviderError::Malformed(format!("{e}; body: {text}")))
}

fn part_json(p: &Part) -> Value {
    match p {
        Part::Text(t) => json!({ "text": t }),
        Part::Inline { mime, data } => json!({
            "inlineData": { "mimeType": mime, "data": BASE64.encode(data) }
        }),
    }
}

pub(crate) fn text_body(req: &TextRequest) -> Value {
    let contents: Vec<Value> = req
        .turns
        .iter()
        .map(|t| {
            json!({
                "role": match t.role { TurnRole::User => "user", TurnRole::Model => "model" },
                "parts": t.parts.iter().map(part_json).collect::<Vec<_>>(),
            })
        })
        .collect();

    let mut body = json!({ "contents": contents });
    if let Some(sys) = &req.system {
        body["systemInstruction"] = json!({ "parts": [{ "text": sys }] });
    }
    if let Some(schema) = &req.schema {
        body["generationConfig"] = json!({
            "responseMimeType": "application/json",
            "responseSchema": schema,
        });
    }
    if req.grounding {
        body["tools"] = json!([{ "googleSearch": {} }]);
    }
    body
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Deserialize, Default)]
struct Content {
    #[serde(default)]
    parts: Vec<RespPart>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct RespPart {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    inline_data: Option<InlineData>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Deserialize)]
struct GroundingChunk {
    #[serde(default)]
    web: Option<WebSource>,
}

#[derive(Deserialize)]
struct WebSource {
    uri: String,
}

impl GenerateResponse {
    fn first(&self) -> Option<&Candidate> {
        self.candidates.first()
    }

    pub(crate) fn text(&self) -> String {
        self.first()
            .and_then(|c| c.content.as_ref())
            .map(|c| c.parts.iter().filter_map(|p| p.text.as_deref()).collect::<String>())
            .unwrap_or_default()
    }

    pub(crate) fn citations(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        if let Some(meta) = self.first().and_then(|c| c.grounding_metadata.as_ref()) {
            for uri in meta.grounding_chunks.iter().filter_map(|c| c.web.as_ref()).map(|w| &w.uri) {
                if !out.contains(uri) {
                    out.push(uri.clone());
                }
            }
        }
        out
    }

    pub(crate) fn inline_media(&self) -> Result<Option<MediaRef>, ProviderError> {
        let found = self
            .first()
            .and_then(|c| c.content.as_ref())
            .and_then(|c| c.parts.iter().find_map(|p| p.inline_data.as_ref()));
        match found {
            Some(d) => {
                let data = BASE64
                    .decode(d.data.as_bytes())
                    .map_err(|e| ProviderError::Malformed(format!("inline data: {e}")))?;
                Ok(Some(MediaRef::Inline { mime: d.mime_type.clone(), data: Bytes::from(data) }))
            }
            None => Ok(None),
        }
    }
}

#[derive(Deserialize)]
struct Operation {
    name: String,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<OperationError>,
    #[serde(default)]
    response: Option<Value>,
}

#[derive(Deserialize)]
struct OperationError {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

fn video_uri(response: &Value) -> Option<String> {
    response
        .pointer("/generateVideoResponse/generatedSamples/0/video/uri")
        .or_else(|| response.pointer("/generatedVideos/0/video/uri"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

#[async_trait]
impl Provider for GeminiProvider {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn generate_text(&self, req: &TextRequest) -> Result<TextResponse, ProviderError> {
        let parsed = self.generate_content(&req.model, &text_body(req)).await?;
        let text = parsed.text();
        if text.trim().is_empty() {
            return Err(ProviderError::Empty(format!("{} returned no text", req.model)));
        }
        let citations = if req.grounding { parsed.citations() } else { Vec::new() };
        Ok(TextResponse { text, citations })
    }

    async fn generate_image(&self, req: &ImageRequest) -> Result<MediaRef, ProviderError> {
        let body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": req.prompt }] }],
            "generationConfig": {
                "responseModalities": ["IMAGE"],
                "imageConfig": {
                    "aspectRatio": req.aspect.as_str(),
                    "imageSize": req.resolution.as_str(),
                }
            }
        });
        let parsed = self.generate_content(&req.model, &body).await?;
        parsed
            .inline_media()?
            .ok_or_else(|| ProviderError::Empty(format!("{} returned no image", req.model)))
    }

    async fn submit_video(&self, req: &VideoRequest) -> Result<VideoJob, ProviderError> {
        let mut instance = json!({ "prompt": req.prompt });
        if let Some(seed) = &req.seed_image {
            instance["image"] = json!({
                "bytesBase64Encoded": BASE64.encode(&seed.data),
                "mimeType": seed.mime,
            });
        }
        let body = json!({
            "instances": [instance],
            "parameters": { "aspectRatio": req.aspect.as_str() },
        });
        let raw = self.post(&format!("models/{}:predictLongRunning", req.model), &body).await?;
        let op: Operation = serde_json::from_value(raw).map_err(|e| ProviderError::Malformed(e.to_string()))?;
        tracing::info!(job = %op.name, "video job submitted");
        Ok(VideoJob { name: op.name })
    }

    async fn poll_video(&self, job: &VideoJob) -> Result<VideoStatus, ProviderError> {
        let raw = self.get(&job.name).await?;
        let op: Operation = serde_json::from_value(raw).map_err(|e| ProviderError::Malformed(e.to_string()))?;
        if let Some(err) = op.error {
            return Err(ProviderError::Api { status: err.code.clamp(0, u16::MAX as i64) as u16, body: err.message });
        }
        let result_uri = op.response.as_ref().and_then(video_uri);
        Ok(VideoStatus { done: op.done, result_uri })
    }

    async fn fetch_media(&self, uri: &str, mime: &str) -> Result<MediaRef, ProviderError> {
        let key = self.key()?;
        let resp = self.download(uri, key).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ProviderError::Api { status: status.as_u16(), body });
        }
        let mut buf = BytesMut::new();
        let mut stream = resp.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            if buf.len() + chunk.len() > MAX_MEDIA_BYTES {
                return Err(ProviderError::Malformed(format!("media at {uri} exceeds {MAX_MEDIA_BYTES} bytes")));
            }
            buf.extend_from_slice(&chunk);
        }
        if buf.is_empty() {
            return Err(ProviderError::Empty(format!("{uri} returned no bytes")));
        }
        Ok(MediaRef::Inline { mime: mime.to_string(), data: buf.freeze() })
    }

    async fn generate_speech(&self, req: &SpeechRequest) -> Result<MediaRef, ProviderError> {
        let body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": req.text }] }],
            "generationConfig": {
                "responseModalities": ["AUDIO"],
                "speechConfig": {
                    "voiceConfig": { "prebuiltVoiceConfig": { "voiceName": req.voice } }
                }
            }
        });
        let parsed = self.generate_content(&req.model, &body).await?;
        parsed
            .inline_media()?
            .ok_or_else(|| ProviderError::Empty(format!("{} returned no audio", req.model)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::Turn;
    use assert_matches::assert_matches;

    #[test]
    fn text_body_carries_schema_system_and_tools() {
        let mut req = TextRequest::new("m", "hello")
            .with_system("be brief")
            .with_schema(json!({ "type": "ARRAY" }));
        req.grounding = true;
        req.turns.push(Turn::model("hi"));
        let body = text_body(&req);
        assert_eq!(body["contents"][0]["parts"][0]["text"], "hello");
        assert_eq!(body["contents"][1]["role"], "model");
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "be brief");
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
        assert!(body["tools"][0].get("googleSearch").is_some());
    }

    #[test]
    fn media_download_carries_request_timeout() {
        let cfg = Config { timeout_secs: 7, ..Config::default() };
        let g = GeminiProvider::new(&cfg).unwrap();
        let req = g.download("https://media.example/v.mp4", "k").build().unwrap();
        assert_eq!(req.timeout(), Some(&Duration::from_secs(7)));
        assert_eq!(req.headers()["x-goog-api-key"], "k");
    }

    #[test]
    fn inline_parts_are_base64() {
        let mut req = TextRequest::new("m", "transcribe");
        req.turns[0].parts.push(Part::Inline { mime: "audio/webm".into(), data: Bytes::from_static(b"abc") });
        let body = text_body(&req);
        assert_eq!(body["contents"][0]["parts"][1]["inlineData"]["data"], "YWJj");
        assert!(body.get("tools").is_none());
    }

    #[test]
    fn response_text_and_deduped_citations() {
        let raw = json!({
            "candidates": [{
                "content": { "parts": [{ "text": "Try a " }, { "text": "spa break." }] },
                "groundingMetadata": { "groundingChunks": [
                    { "web": { "uri": "https://a.example", "title": "A" } },
                    { "web": { "uri": "https://b.example" } },
                    { "web": { "uri": "https://a.example" } }
                ]}
            }]
        });
        let parsed: GenerateResponse = serde_json::from_value(raw).unwrap();
        assert_eq!(parsed.text(), "Try a spa break.");
        assert_eq!(parsed.citations(), vec!["https://a.example", "https://b.example"]);
    }

    #[test]
    fn inline_media_is_decoded() {
        let raw = json!({
            "candidates": [{ "content": { "parts": [{ "inlineData": { "mimeType": "image/png", "data": "YWJj" } }] } }]
        });
        let parsed: GenerateResponse = serde_json::from_value(raw).unwrap();
        let media = parsed.inline_media().unwrap().unwrap();
        assert_matches!(media, MediaRef::Inline { ref mime, ref data } if mime == "image/png" && &data[..] == b"abc");
    }

    #[test]
    fn video_uri_from_operation_response() {
        let resp = json!({ "generateVideoResponse": { "generatedSamples": [{ "video": { "uri": "https://files/v1" } }] } });
        assert_eq!(video_uri(&resp).as_deref(), Some("https://files/v1"));
        assert_eq!(video_uri(&json!({})), None);
    }

    #[tokio::test]
    async fn missing_key_short_circuits_without_network() {
        let cfg = Config { api_key: None, api_base: "http://127.0.0.1:9".into(), ..Config::default() };
        let p = GeminiProvider::new(&cfg).unwrap();
        let err = p.generate_text(&TextRequest::new("m", "x")).await.unwrap_err();
        assert_matches!(err, ProviderError::MissingCredentials);
        let err = p.poll_video(&VideoJob { name: "operations/1".into() }).await.unwrap_err();
        assert_matches!(err, ProviderError::MissingCredentials);
    }
}
