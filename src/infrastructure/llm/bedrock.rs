// AWS Bedrock Provider Adapter
//
// One adapter fronting two unrelated model families behind the Bedrock
// runtime invoke endpoint, selected by the resolved model name prefix:
// `anthropic.` speaks the Claude messages envelope, `meta.` speaks the
// Llama prompt envelope. Requests are SigV4-signed; no AWS SDK.
//
// Vision is limited to the Claude family, and the invoke API only takes
// inline base64 data. The adapter is the final authority here even when
// the catalog descriptor claims vision support.

use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::error::GatewayError;
use crate::domain::llm::{require_prompt, ChatProvider, ImageAttachment, ImageSource};
use crate::domain::model::ProviderKind;
use crate::infrastructure::llm::credentials::BedrockCredentials;
use crate::infrastructure::llm::upstream_failure;

const CLAUDE_BEDROCK_VERSION: &str = "bedrock-2023-05-31";
const MAX_TOKENS: u32 = 4096;
const MAX_GEN_LEN: u32 = 2048;

pub struct BedrockAdapter {
    client: reqwest::Client,
    credentials: BedrockCredentials,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ModelFamily {
    Claude,
    Llama,
}

impl ModelFamily {
    /// Family routing is keyed on the model name prefix, mirroring the
    /// Bedrock model id namespace ("anthropic.claude-...", "meta.llama...").
    fn detect(model: &str) -> Option<Self> {
        if model.starts_with("anthropic.") {
            Some(Self::Claude)
        } else if model.starts_with("meta.") {
            Some(Self::Llama)
        } else {
            None
        }
    }
}

// Claude-on-Bedrock envelope.

#[derive(Serialize)]
struct ClaudeRequest {
    anthropic_version: &'static str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<ClaudeMessage>,
}

#[derive(Serialize)]
struct ClaudeMessage {
    role: &'static str,
    content: Vec<ClaudeBlock>,
}

#[derive(Serialize)]
#[serde(tag = "type")]
enum ClaudeBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "image")]
    Image { source: ClaudeImageSource },
}

#[derive(Serialize)]
struct ClaudeImageSource {
    #[serde(rename = "type")]
    source_type: &'static str,
    media_type: &'static str,
    data: String,
}

#[derive(Deserialize)]
struct ClaudeResponse {
    content: Vec<ClaudeResponseBlock>,
}

#[derive(Deserialize)]
struct ClaudeResponseBlock {
    #[serde(rename = "type")]
    block_type: String,
    #[serde(default)]
    text: String,
}

// Llama-on-Bedrock envelope.

#[derive(Serialize)]
struct LlamaRequest {
    prompt: String,
    temperature: f32,
    max_gen_len: u32,
}

#[derive(Deserialize)]
struct LlamaResponse {
    generation: String,
}

impl BedrockAdapter {
    pub fn new(credentials: BedrockCredentials) -> Self {
        Self {
            client: reqwest::Client::new(),
            credentials,
        }
    }

    fn family(model: &str) -> Result<ModelFamily, GatewayError> {
        ModelFamily::detect(model).ok_or_else(|| {
            GatewayError::Configuration(format!(
                "Unroutable Bedrock model '{model}': expected an 'anthropic.' or 'meta.' model id"
            ))
        })
    }

    /// POST a family-specific JSON body to the invoke endpoint with
    /// SigV4 headers, returning the raw response body on 2xx.
    async fn invoke(&self, model: &str, body: String) -> Result<String, GatewayError> {
        let path = format!("/model/{}/invoke", sigv4::uri_encode(model));
        let url = format!(
            "{}{}",
            self.credentials.endpoint.trim_end_matches('/'),
            path
        );

        let host = sigv4::host_header(&url)
            .map_err(|e| GatewayError::Configuration(format!("Invalid Bedrock endpoint: {e}")))?;
        let signing = sigv4::sign(&sigv4::SigningInput {
            access_key_id: &self.credentials.access_key_id,
            secret_access_key: &self.credentials.secret_access_key,
            region: &self.credentials.region,
            service: "bedrock",
            method: "POST",
            canonical_uri: &path,
            host: &host,
            payload: body.as_bytes(),
            timestamp: chrono::Utc::now(),
        });

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .header("Host", &host)
            .header("X-Amz-Date", &signing.amz_date)
            .header("Authorization", &signing.authorization)
            .body(body)
            .send()
            .await
            .map_err(|e| GatewayError::upstream(ProviderKind::Bedrock, e.to_string()))?;

        if !response.status().is_success() {
            return Err(upstream_failure(ProviderKind::Bedrock, response).await);
        }

        response
            .text()
            .await
            .map_err(|e| GatewayError::upstream(ProviderKind::Bedrock, e.to_string()))
    }

    async fn invoke_claude(&self, model: &str, request: &ClaudeRequest) -> Result<String, GatewayError> {
        let body = serde_json::to_string(request)
            .map_err(|e| GatewayError::upstream(ProviderKind::Bedrock, e.to_string()))?;
        let raw = self.invoke(model, body).await?;
        let parsed: ClaudeResponse = serde_json::from_str(&raw).map_err(|e| {
            GatewayError::upstream(ProviderKind::Bedrock, format!("Failed to parse response: {e}"))
        })?;
        Ok(parsed
            .content
            .into_iter()
            .filter(|block| block.block_type == "text")
            .map(|block| block.text)
            .collect())
    }

    async fn invoke_llama(&self, model: &str, request: &LlamaRequest) -> Result<String, GatewayError> {
        let body = serde_json::to_string(request)
            .map_err(|e| GatewayError::upstream(ProviderKind::Bedrock, e.to_string()))?;
        let raw = self.invoke(model, body).await?;
        let parsed: LlamaResponse = serde_json::from_str(&raw).map_err(|e| {
            GatewayError::upstream(ProviderKind::Bedrock, format!("Failed to parse response: {e}"))
        })?;
        Ok(parsed.generation)
    }
}

#[async_trait]
impl ChatProvider for BedrockAdapter {
    async fn complete(
        &self,
        model: &str,
        prompt: &str,
        temperature: f32,
    ) -> Result<String, GatewayError> {
        require_prompt(prompt)?;
        info!(model, temperature, "Bedrock text generation");

        match Self::family(model)? {
            ModelFamily::Claude => {
                self.invoke_claude(
                    model,
                    &ClaudeRequest {
                        anthropic_version: CLAUDE_BEDROCK_VERSION,
                        max_tokens: MAX_TOKENS,
                        temperature,
                        messages: vec![ClaudeMessage {
                            role: "user",
                            content: vec![ClaudeBlock::Text {
                                text: prompt.to_string(),
                            }],
                        }],
                    },
                )
                .await
            }
            ModelFamily::Llama => {
                self.invoke_llama(
                    model,
                    &LlamaRequest {
                        prompt: prompt.to_string(),
                        temperature,
                        max_gen_len: MAX_GEN_LEN,
                    },
                )
                .await
            }
        }
    }

    async fn complete_with_image(
        &self,
        model: &str,
        prompt: &str,
        temperature: f32,
        image: &ImageAttachment,
    ) -> Result<String, GatewayError> {
        require_prompt(prompt)?;

        match Self::family(model)? {
            ModelFamily::Llama => {
                // The Llama family on Bedrock has no vision path, even
                // when the descriptor mistakenly marks it vision-capable.
                Err(GatewayError::UnsupportedCapability {
                    model: model.to_string(),
                })
            }
            ModelFamily::Claude => {
                let data = match &image.source {
                    ImageSource::Base64(data) => data.clone(),
                    ImageSource::Url(_) => {
                        return Err(GatewayError::InvalidInput(
                            "Bedrock vision requires base64 image content, not a URL.".into(),
                        ));
                    }
                };
                base64::engine::general_purpose::STANDARD
                    .decode(&data)
                    .map_err(|_| {
                        GatewayError::InvalidInput("imageContent is not valid base64 data.".into())
                    })?;

                info!(model, temperature, "Bedrock vision generation");

                self.invoke_claude(
                    model,
                    &ClaudeRequest {
                        anthropic_version: CLAUDE_BEDROCK_VERSION,
                        max_tokens: MAX_TOKENS,
                        temperature,
                        messages: vec![ClaudeMessage {
                            role: "user",
                            content: vec![
                                ClaudeBlock::Image {
                                    source: ClaudeImageSource {
                                        source_type: "base64",
                                        media_type: image.media_type.mime(),
                                        data,
                                    },
                                },
                                ClaudeBlock::Text {
                                    text: prompt.to_string(),
                                },
                            ],
                        }],
                    },
                )
                .await
            }
        }
    }
}

/// Minimal AWS Signature Version 4 implementation for the Bedrock
/// runtime. Signs content-type, host and x-amz-date over an empty query
/// string, which is all the invoke endpoint needs.
pub(crate) mod sigv4 {
    use chrono::{DateTime, Utc};
    use hmac::{Hmac, Mac};
    use sha2::{Digest, Sha256};

    type HmacSha256 = Hmac<Sha256>;

    pub struct SigningInput<'a> {
        pub access_key_id: &'a str,
        pub secret_access_key: &'a str,
        pub region: &'a str,
        pub service: &'a str,
        pub method: &'a str,
        /// Already percent-encoded request path.
        pub canonical_uri: &'a str,
        pub host: &'a str,
        pub payload: &'a [u8],
        pub timestamp: DateTime<Utc>,
    }

    pub struct Signature {
        pub amz_date: String,
        pub authorization: String,
    }

    /// Percent-encode one path segment per RFC 3986 (unreserved
    /// characters pass through). Used both for the request URL and the
    /// canonical URI so the two can never disagree.
    pub fn uri_encode(segment: &str) -> String {
        let mut out = String::with_capacity(segment.len());
        for byte in segment.bytes() {
            match byte {
                b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                    out.push(byte as char)
                }
                other => out.push_str(&format!("%{other:02X}")),
            }
        }
        out
    }

    /// Host header value for a URL, including the port when non-default.
    pub fn host_header(url: &str) -> Result<String, String> {
        let parsed = reqwest::Url::parse(url).map_err(|e| e.to_string())?;
        let host = parsed.host_str().ok_or_else(|| "missing host".to_string())?;
        Ok(match parsed.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        })
    }

    fn sha256_hex(data: &[u8]) -> String {
        hex::encode(Sha256::digest(data))
    }

    fn hmac(key: &[u8], data: &[u8]) -> Vec<u8> {
        let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts any key length");
        mac.update(data);
        mac.finalize().into_bytes().to_vec()
    }

    pub fn sign(input: &SigningInput<'_>) -> Signature {
        let amz_date = input.timestamp.format("%Y%m%dT%H%M%SZ").to_string();
        let date_stamp = input.timestamp.format("%Y%m%d").to_string();
        let payload_hash = sha256_hex(input.payload);

        let canonical_headers = format!(
            "content-type:application/json\nhost:{}\nx-amz-date:{}\n",
            input.host, amz_date
        );
        let signed_headers = "content-type;host;x-amz-date";

        let canonical_request = format!(
            "{}\n{}\n\n{}\n{}\n{}",
            input.method, input.canonical_uri, canonical_headers, signed_headers, payload_hash
        );

        let credential_scope = format!(
            "{}/{}/{}/aws4_request",
            date_stamp, input.region, input.service
        );
        let string_to_sign = format!(
            "AWS4-HMAC-SHA256\n{}\n{}\n{}",
            amz_date,
            credential_scope,
            sha256_hex(canonical_request.as_bytes())
        );

        let k_secret = format!("AWS4{}", input.secret_access_key);
        let k_date = hmac(k_secret.as_bytes(), date_stamp.as_bytes());
        let k_region = hmac(&k_date, input.region.as_bytes());
        let k_service = hmac(&k_region, input.service.as_bytes());
        let k_signing = hmac(&k_service, b"aws4_request");
        let signature = hex::encode(hmac(&k_signing, string_to_sign.as_bytes()));

        let authorization = format!(
            "AWS4-HMAC-SHA256 Credential={}/{}, SignedHeaders={}, Signature={}",
            input.access_key_id, credential_scope, signed_headers, signature
        );

        Signature {
            amz_date,
            authorization,
        }
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::llm::ImageMediaType;

    fn adapter(endpoint: String) -> BedrockAdapter {
        BedrockAdapter::new(BedrockCredentials {
            access_key_id: "AKIDEXAMPLE".into(),
            secret_access_key: "secret".into(),
            region: "us-east-1".into(),
            endpoint,
        })
    }

    #[tokio::test]
    async fn test_claude_family_envelope_and_signing_headers() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/model/anthropic.claude-sonnet-4-v1%3A0/invoke")
            .match_header(
                "authorization",
                mockito::Matcher::Regex(
                    "^AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/\\d{8}/us-east-1/bedrock/aws4_request, SignedHeaders=content-type;host;x-amz-date, Signature=[0-9a-f]{64}$".into(),
                ),
            )
            .match_header("x-amz-date", mockito::Matcher::Regex("^\\d{8}T\\d{6}Z$".into()))
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "anthropic_version": "bedrock-2023-05-31",
                "max_tokens": 4096,
                "messages": [{"role": "user", "content": [{"type": "text", "text": "hi"}]}]
            })))
            .with_status(200)
            .with_body(r#"{"content":[{"type":"text","text":"hello from claude"}]}"#)
            .create_async()
            .await;

        let text = adapter(server.url())
            .complete("anthropic.claude-sonnet-4-v1:0", "hi", 0.7)
            .await
            .unwrap();
        assert_eq!(text, "hello from claude");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_llama_family_envelope() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/model/meta.llama3-70b-instruct-v1%3A0/invoke")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "prompt": "hi",
                "max_gen_len": 2048
            })))
            .with_status(200)
            .with_body(r#"{"generation":"hello from llama","stop_reason":"stop"}"#)
            .create_async()
            .await;

        let text = adapter(server.url())
            .complete("meta.llama3-70b-instruct-v1:0", "hi", 0.5)
            .await
            .unwrap();
        assert_eq!(text, "hello from llama");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_llama_vision_is_unsupported_without_a_call() {
        let image = ImageAttachment::new("aGVsbG8=", ImageMediaType::Png);
        let err = adapter("http://127.0.0.1:1".into())
            .complete_with_image("meta.llama3-70b-instruct-v1:0", "look", 0.5, &image)
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::UnsupportedCapability { .. }));
    }

    #[tokio::test]
    async fn test_url_image_is_rejected() {
        let image = ImageAttachment::new("https://example.com/a.png", ImageMediaType::Png);
        let err = adapter("http://127.0.0.1:1".into())
            .complete_with_image("anthropic.claude-sonnet-4-v1:0", "look", 0.5, &image)
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_unroutable_model_is_a_configuration_error() {
        let err = adapter("http://127.0.0.1:1".into())
            .complete("mistral.mixtral-8x7b", "hi", 0.5)
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_throttling_maps_to_upstream() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/model/meta.llama3-70b-instruct-v1%3A0/invoke")
            .with_status(429)
            .with_body(r#"{"message":"Too many requests"}"#)
            .create_async()
            .await;

        let err = adapter(server.url())
            .complete("meta.llama3-70b-instruct-v1:0", "hi", 0.5)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GatewayError::Upstream {
                backend: ProviderKind::Bedrock,
                ..
            }
        ));
    }
}
