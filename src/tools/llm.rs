// src/tools/llm.rs

use crate::config::{BackendKind, Config};
use crate::error::GenerationError;
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde_json::{Value, json};
use std::time::Duration;
use tracing::debug;

/// Fixed sampling parameters sent with every plan request.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GenerationParams {
    pub temperature: f64,
    pub max_output_tokens: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: 0.2,
            max_output_tokens: 1024,
        }
    }
}

/// A text-generation service: prompt in, raw text out.
pub trait LlmBackend {
    fn name(&self) -> &str;
    fn complete(&self, prompt: &str) -> Result<String, GenerationError>;
}

impl<T: LlmBackend + ?Sized> LlmBackend for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn complete(&self, prompt: &str) -> Result<String, GenerationError> {
        (**self).complete(prompt)
    }
}

/// Build the backend selected in `config`.
pub fn backend_from_config(config: &Config) -> Result<Box<dyn LlmBackend>, reqwest::Error> {
    let client = http_client(config.request_timeout)?;
    let model = config.model_name().to_string();
    let api_key = config.api_key.clone();
    let backend: Box<dyn LlmBackend> = match config.backend {
        BackendKind::Gemini => Box::new(GeminiBackend::new(client, api_key, model)),
        BackendKind::Openai => Box::new(OpenAiBackend::new(client, api_key, model)),
    };
    Ok(backend)
}

/// `None` keeps requests unbounded.
pub fn http_client(timeout: Option<Duration>) -> Result<Client, reqwest::Error> {
    Client::builder().timeout(timeout).build()
}

pub struct GeminiBackend {
    client: Client,
    api_key: String,
    pub model: String,
    pub params: GenerationParams,
}

impl GeminiBackend {
    pub fn new(client: Client, api_key: String, model: String) -> Self {
        Self {
            client,
            api_key,
            model,
            params: GenerationParams::default(),
        }
    }

    /// The key travels in a header so it never shows up in a URL.
    fn request(&self, prompt: &str) -> RequestBuilder {
        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent",
            self.model
        );
        self.client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(&self.payload(prompt))
    }

    fn payload(&self, prompt: &str) -> Value {
        json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "temperature": self.params.temperature,
                "topK": 32,
                "topP": 1,
                "maxOutputTokens": self.params.max_output_tokens
            }
        })
    }
}

impl LlmBackend for GeminiBackend {
    fn name(&self) -> &str {
        "gemini"
    }

    fn complete(&self, prompt: &str) -> Result<String, GenerationError> {
        debug!(model = %self.model, "querying gemini");
        let response = self
            .request(prompt)
            .send()
            .map_err(|source| transport(self.name(), source))?;

        let body = read_json(self.name(), response)?;
        gemini_text(&body)
            .map(str::to_string)
            .ok_or_else(|| GenerationError::MissingText {
                backend: self.name().into(),
            })
    }
}

pub struct OpenAiBackend {
    client: Client,
    api_key: String,
    pub model: String,
    pub params: GenerationParams,
}

impl OpenAiBackend {
    pub fn new(client: Client, api_key: String, model: String) -> Self {
        Self {
            client,
            api_key,
            model,
            params: GenerationParams::default(),
        }
    }

    fn payload(&self, prompt: &str) -> Value {
        json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
            "temperature": self.params.temperature,
            "max_tokens": self.params.max_output_tokens
        })
    }
}

impl LlmBackend for OpenAiBackend {
    fn name(&self) -> &str {
        "openai"
    }

    fn complete(&self, prompt: &str) -> Result<String, GenerationError> {
        debug!(model = %self.model, "querying openai");
        let response = self
            .client
            .post("https://api.openai.com/v1/chat/completions")
            .bearer_auth(&self.api_key)
            .json(&self.payload(prompt))
            .send()
            .map_err(|source| transport(self.name(), source))?;

        let body = read_json(self.name(), response)?;
        openai_text(&body)
            .map(str::to_string)
            .ok_or_else(|| GenerationError::MissingText {
                backend: self.name().into(),
            })
    }
}

/// Request URLs are stripped from the error; they may carry credentials.
fn transport(backend: &str, source: reqwest::Error) -> GenerationError {
    GenerationError::Transport {
        backend: backend.into(),
        source: source.without_url(),
    }
}

fn read_json(backend: &str, response: Response) -> Result<Value, GenerationError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().unwrap_or_default();
        return Err(GenerationError::Status {
            backend: backend.into(),
            status: status.as_u16(),
            body,
        });
    }
    response.json::<Value>().map_err(|source| transport(backend, source))
}

/// `candidates[0].content.parts[0].text`
pub fn gemini_text(body: &Value) -> Option<&str> {
    body.get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .get(0)?
        .get("text")?
        .as_str()
}

/// `choices[0].message.content`
pub fn openai_text(body: &Value) -> Option<&str> {
    body.get("choices")?
        .get(0)?
        .get("message")?
        .get("content")?
        .as_str()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_gemini_text() {
        let body = json!({
            "candidates": [{ "content": { "parts": [{ "text": "[{\"a\":1}]" }] } }]
        });
        assert_eq!(gemini_text(&body), Some("[{\"a\":1}]"));
        assert_eq!(gemini_text(&json!({ "candidates": [] })), None);
    }

    #[test]
    fn extracts_openai_text() {
        let body = json!({
            "choices": [{ "message": { "role": "assistant", "content": "hello" } }]
        });
        assert_eq!(openai_text(&body), Some("hello"));
        assert_eq!(openai_text(&json!({ "error": "nope" })), None);
    }

    #[test]
    fn payloads_carry_fixed_parameters() {
        let client = Client::new();
        let gemini = GeminiBackend::new(client.clone(), "k".into(), "gemini-2.0-flash".into());
        let body = gemini.payload("do it");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "do it");
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 1024);
        assert_eq!(body["generationConfig"]["topK"], 32);

        let openai = OpenAiBackend::new(client, "k".into(), "gpt-3.5-turbo".into());
        let body = openai.payload("do it");
        assert_eq!(body["model"], "gpt-3.5-turbo");
        assert_eq!(body["messages"][0]["content"], "do it");
        assert_eq!(body["max_tokens"], 1024);
    }

    #[test]
    fn gemini_key_goes_in_a_header() {
        let gemini = GeminiBackend::new(Client::new(), "SECRETKEY123".into(), "gemini-2.0-flash".into());
        let request = gemini.request("do it").build().expect("request");

        assert!(!request.url().as_str().contains("SECRETKEY123"));
        assert_eq!(request.url().query(), None);
        assert_eq!(request.headers()["x-goog-api-key"], "SECRETKEY123");
    }

    #[test]
    fn transport_errors_never_show_the_url() {
        let client = http_client(Some(Duration::from_millis(1))).expect("client");
        let err = client
            .get("http://127.0.0.1:9/v1?key=SECRETKEY123")
            .send()
            .expect_err("nothing listens on the discard port");

        let err = transport("gemini", err);

        let shown = err.to_string();
        assert!(shown.starts_with("request to gemini failed"), "{shown}");
        assert!(!shown.contains("SECRETKEY123"), "{shown}");
    }
}
