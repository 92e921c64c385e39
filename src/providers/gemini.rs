use anyhow::{Context, Result, anyhow};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::Config;
use crate::credentials::Credential;
use crate::providers::http_errors::model_api_request_error;

const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
    status: Option<String>,
}

fn generate_url(base_url: &str, model: &str) -> String {
    format!(
        "{}/v1beta/models/{}:generateContent",
        base_url.trim_end_matches('/'),
        model
    )
}

fn request_body(prompt: &str) -> GenerateContentRequest<'_> {
    GenerateContentRequest {
        contents: vec![Content {
            role: "user",
            parts: vec![Part { text: prompt }],
        }],
    }
}

fn response_text(response: GenerateContentResponse) -> Result<String> {
    let Some(candidate) = response.candidates.into_iter().next() else {
        let reason = response
            .prompt_feedback
            .and_then(|feedback| feedback.block_reason)
            .unwrap_or_else(|| "no candidates returned".to_string());
        return Err(anyhow!("Model returned no answer: {}", reason));
    };

    let parts: Vec<String> = candidate
        .content
        .map(|content| content.parts)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|part| part.text)
        .collect();
    if parts.is_empty() {
        let reason = candidate
            .finish_reason
            .unwrap_or_else(|| "candidate has no text".to_string());
        return Err(anyhow!("Model returned no answer: {}", reason));
    }
    Ok(parts.concat())
}

fn api_error_detail(body: &str) -> String {
    match serde_json::from_str::<ApiErrorEnvelope>(body) {
        Ok(envelope) => match envelope.error.status {
            Some(status) => format!("{} ({})", envelope.error.message, status),
            None => envelope.error.message,
        },
        Err(_) => body.to_string(),
    }
}

pub async fn generate(
    client: &Client,
    cfg: &Config,
    credential: &Credential,
    prompt: &str,
) -> Result<String> {
    let api_url = generate_url(&cfg.model_base_url, &cfg.model);
    debug!(
        api_url = %api_url,
        model = %cfg.model,
        prompt_len = prompt.len(),
        "sending gemini generateContent request"
    );

    let response = client
        .post(&api_url)
        .header(API_KEY_HEADER, credential.expose())
        .json(&request_body(prompt))
        .send()
        .await
        .map_err(|err| {
            warn!(
                api_url = %api_url,
                model = %cfg.model,
                error = %err,
                "gemini request failed"
            );
            model_api_request_error(err, &api_url, cfg.model_timeout_secs)
        })?;

    if !response.status().is_success() {
        let status = response.status();
        let response_body = response
            .text()
            .await
            .unwrap_or_else(|_| "<failed to read response body>".to_string());
        warn!(
            api_url = %api_url,
            model = %cfg.model,
            status = %status,
            response_body_len = response_body.len(),
            "gemini returned non-success status"
        );
        return Err(anyhow!(
            "Model request failed with status {}: {}",
            status,
            api_error_detail(&response_body)
        ));
    }

    let parsed: GenerateContentResponse = response
        .json()
        .await
        .context("Failed to parse model generateContent response")?;
    let text = response_text(parsed)?;
    debug!(
        model = %cfg.model,
        response_len = text.len(),
        "received gemini response"
    );
    Ok(text)
}

#[cfg(test)]
mod tests {
    use reqwest::Client;
    use serde_json::json;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread::{self, JoinHandle};

    use super::{
        GenerateContentResponse, api_error_detail, generate, generate_url, request_body,
        response_text,
    };
    use crate::config::Config;
    use crate::credentials::Credential;

    /// Serves one canned HTTP response and hands back the raw request it received.
    fn serve_once(status_line: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").expect("listener should bind");
        let base_url = format!(
            "http://{}",
            listener.local_addr().expect("listener should have an address")
        );
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().expect("client should connect");
            let mut request = Vec::new();
            let mut buf = [0_u8; 4096];
            loop {
                let read = stream.read(&mut buf).expect("request should be readable");
                if read == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..read]);
                if let Some(head_end) = request.windows(4).position(|w| w == b"\r\n\r\n") {
                    let head = String::from_utf8_lossy(&request[..head_end]).to_ascii_lowercase();
                    let content_length = head
                        .lines()
                        .find_map(|line| line.strip_prefix("content-length:"))
                        .and_then(|value| value.trim().parse::<usize>().ok())
                        .unwrap_or(0);
                    if request.len() >= head_end + 4 + content_length {
                        break;
                    }
                }
            }
            let response = format!(
                "{status_line}\r\nContent-Type: application/json\r\n\
                 Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream
                .write_all(response.as_bytes())
                .expect("response should be written");
            String::from_utf8_lossy(&request).into_owned()
        });
        (base_url, handle)
    }

    fn stub_config(base_url: String) -> Config {
        Config {
            model: "test-model".to_string(),
            model_base_url: base_url,
            ..Config::default()
        }
    }

    fn parse(value: serde_json::Value) -> GenerateContentResponse {
        serde_json::from_value(value).expect("response should deserialize")
    }

    #[test]
    fn generate_url_trims_trailing_slash() {
        assert_eq!(
            generate_url("http://localhost:8080/", "gemini-1.5-flash"),
            "http://localhost:8080/v1beta/models/gemini-1.5-flash:generateContent"
        );
    }

    #[test]
    fn request_body_sends_prompt_as_single_user_part() {
        let body = serde_json::to_value(request_body("what is it?")).expect("body should encode");
        assert_eq!(
            body,
            json!({"contents": [{"role": "user", "parts": [{"text": "what is it?"}]}]})
        );
    }

    #[test]
    fn response_text_joins_parts_of_first_candidate() {
        let response = parse(json!({
            "candidates": [
                {"content": {"role": "model", "parts": [{"text": "Example"}, {"text": "ville."}]}},
                {"content": {"role": "model", "parts": [{"text": "ignored"}]}}
            ]
        }));
        assert_eq!(
            response_text(response).expect("text should be present"),
            "Exampleville."
        );
    }

    #[test]
    fn response_text_reports_block_reason_when_no_candidates() {
        let response = parse(json!({"promptFeedback": {"blockReason": "SAFETY"}}));
        let msg = format!("{:#}", response_text(response).expect_err("should fail"));
        assert!(msg.contains("SAFETY"), "unexpected message: {msg}");
    }

    #[test]
    fn response_text_reports_finish_reason_when_candidate_has_no_text() {
        let response = parse(json!({"candidates": [{"finishReason": "SAFETY"}]}));
        let msg = format!("{:#}", response_text(response).expect_err("should fail"));
        assert!(msg.contains("Model returned no answer"), "unexpected message: {msg}");
        assert!(msg.contains("SAFETY"), "unexpected message: {msg}");

        let response = parse(json!({"candidates": [{"content": {"parts": []}}]}));
        let msg = format!("{:#}", response_text(response).expect_err("should fail"));
        assert!(msg.contains("candidate has no text"), "unexpected message: {msg}");
    }

    #[test]
    fn api_error_detail_prefers_structured_message() {
        let body =
            r#"{"error":{"code":400,"message":"API key not valid.","status":"INVALID_ARGUMENT"}}"#;
        assert_eq!(
            api_error_detail(body),
            "API key not valid. (INVALID_ARGUMENT)"
        );
        assert_eq!(api_error_detail("upstream exploded"), "upstream exploded");
    }

    #[tokio::test]
    async fn generate_sends_key_in_header_and_returns_text() {
        let (base_url, server) = serve_once(
            "HTTP/1.1 200 OK",
            r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"Exampleville."}]}}]}"#,
        );
        let cfg = stub_config(base_url);

        let text = generate(&Client::new(), &cfg, &Credential::new("secret-key-123"), "the prompt")
            .await
            .expect("generate should succeed");
        assert_eq!(text, "Exampleville.");

        let request = server.join().expect("server thread should finish");
        let request_line = request.lines().next().unwrap_or_default();
        assert_eq!(
            request_line,
            "POST /v1beta/models/test-model:generateContent HTTP/1.1"
        );
        assert!(
            request
                .to_ascii_lowercase()
                .contains("x-goog-api-key: secret-key-123"),
            "key header missing: {request}"
        );
        assert!(request.contains("the prompt"), "prompt missing: {request}");
    }

    #[tokio::test]
    async fn generate_surfaces_api_error_message_on_failure_status() {
        let (base_url, server) = serve_once(
            "HTTP/1.1 400 Bad Request",
            r#"{"error":{"code":400,"message":"API key not valid.","status":"INVALID_ARGUMENT"}}"#,
        );
        let cfg = stub_config(base_url);

        let err = generate(&Client::new(), &cfg, &Credential::new("secret-key-123"), "prompt")
            .await
            .expect_err("400 should fail");
        let msg = format!("{err:#}");
        assert!(
            msg.contains("Model request failed with status 400 Bad Request"),
            "unexpected message: {msg}"
        );
        assert!(
            msg.contains("API key not valid. (INVALID_ARGUMENT)"),
            "unexpected message: {msg}"
        );
        assert!(!msg.contains("secret-key-123"), "key leaked: {msg}");

        server.join().expect("server thread should finish");
    }
}
