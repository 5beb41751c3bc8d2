//! HTTP client for a Chatterbox TTS server.
//!
//! Endpoints used:
//!
//! | method | path                         | purpose                  |
//! |--------|------------------------------|--------------------------|
//! | POST   | `{endpoint}` (default `/tts`) | synthesize one line     |
//! | GET    | `/get_reference_files`        | list clone references   |
//! | GET    | `/get_predefined_voices`      | list built-in voices    |
//! | POST   | `/upload_reference`           | multipart `file` upload |
//! | POST   | `/upload_predefined_voice`    | multipart `file` upload |

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart;
use serde_json::Value;

use super::files::{estimate_duration, save_response};
use super::request::{TtsRequest, VoiceMode};
use super::service::{TtsError, TtsService, UploadOutcome};
use crate::audio::AudioFile;
use crate::config::ChatterboxConfig;

pub struct ChatterboxClient {
    client: reqwest::Client,
    base_url: String,
    tts_url: String,
}

impl ChatterboxClient {
    pub fn from_config(config: &ChatterboxConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            tts_url: config.tts_url(),
        }
    }

    pub fn tts_url(&self) -> &str {
        &self.tts_url
    }

    fn connect_error(&self, url: &str, e: reqwest::Error) -> TtsError {
        if e.is_timeout() {
            TtsError::Timeout
        } else {
            TtsError::Connect {
                endpoint: url.to_string(),
                message: e.to_string(),
            }
        }
    }

    async fn get_list(&self, path: &str) -> Result<Vec<String>, TtsError> {
        let url = format!("{}{path}", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.connect_error(&url, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TtsError::Server {
                status: status.as_u16(),
                body,
            });
        }
        let json: Value = response
            .json()
            .await
            .map_err(|e| TtsError::Parse(e.to_string()))?;
        parse_name_list(&json)
    }

    async fn upload(
        &self,
        path: &Path,
        force: bool,
        list_path: &str,
        endpoint: &str,
    ) -> Result<UploadOutcome, TtsError> {
        if !path.is_file() {
            return Err(TtsError::FileNotFound(path.to_path_buf()));
        }
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        if !force {
            match self.get_list(list_path).await {
                Ok(names) if names.contains(&filename) => {
                    log::info!("'{filename}' already on server, skipping upload");
                    return Ok(UploadOutcome::AlreadyExists(filename));
                }
                Ok(_) => {}
                Err(e) => log::warn!("Could not list existing files before upload: {e}"),
            }
        }

        let bytes = tokio::fs::read(path).await?;
        let part = multipart::Part::bytes(bytes).file_name(filename.clone());
        let form = multipart::Form::new().part("file", part);

        let url = format!("{}{endpoint}", self.base_url);
        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.connect_error(&url, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TtsError::Server {
                status: status.as_u16(),
                body,
            });
        }
        log::info!("Uploaded '{filename}' to {url}");
        Ok(UploadOutcome::Uploaded(filename))
    }
}

/// Map a failed synthesis response to a [`TtsError`].
pub(crate) fn classify_error(status: u16, body: &str, request: &TtsRequest) -> TtsError {
    if status != 404 {
        return TtsError::Server {
            status,
            body: body.to_string(),
        };
    }

    let Ok(json) = serde_json::from_str::<Value>(body) else {
        return TtsError::NotFound(body.to_string());
    };
    let detail = json["detail"]
        .as_str()
        .unwrap_or("Resource not found")
        .to_string();

    if !detail.to_lowercase().contains("not found") {
        return TtsError::Server { status, body: detail };
    }
    match request.voice_mode {
        VoiceMode::Clone if request.reference_audio_filename.is_some() => {
            TtsError::CloneVoiceNotFound(request.voice_id().to_string())
        }
        VoiceMode::Predefined if request.predefined_voice_id.is_some() => {
            TtsError::PredefinedVoiceNotFound(request.voice_id().to_string())
        }
        _ => TtsError::ResourceNotFound(detail),
    }
}

/// Accept `["a.wav", ...]` or `[{"name": ..} | {"filename": ..}, ...]`.
pub(crate) fn parse_name_list(json: &Value) -> Result<Vec<String>, TtsError> {
    let items = json
        .as_array()
        .ok_or_else(|| TtsError::Parse(format!("expected a list, got {json}")))?;

    Ok(items
        .iter()
        .filter_map(|item| {
            item.as_str()
                .or_else(|| item["name"].as_str())
                .or_else(|| item["filename"].as_str())
                .map(str::to_string)
        })
        .collect())
}

#[async_trait]
impl TtsService for ChatterboxClient {
    async fn synthesize(
        &self,
        request: &TtsRequest,
        output_path: &Path,
    ) -> Result<AudioFile, TtsError> {
        log::debug!(
            "tts: '{}' via {} voice '{}'",
            request.character.name,
            request.voice_mode.as_str(),
            request.voice_id()
        );

        let response = self
            .client
            .post(&self.tts_url)
            .header(
                reqwest::header::ACCEPT,
                format!("audio/{}", request.output_format.extension()),
            )
            .json(&request.to_body())
            .send()
            .await
            .map_err(|e| self.connect_error(&self.tts_url, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_error(status.as_u16(), &body, request));
        }

        let size = save_response(response, output_path).await?;
        Ok(AudioFile::new(output_path, request.character.clone(), request.text.clone())
            .with_duration(estimate_duration(&request.text))
            .with_size(size))
    }

    async fn reference_files(&self) -> Result<Vec<String>, TtsError> {
        self.get_list("/get_reference_files").await
    }

    async fn predefined_voices(&self) -> Result<Vec<String>, TtsError> {
        self.get_list("/get_predefined_voices").await
    }

    async fn upload_reference(&self, path: &Path, force: bool) -> Result<UploadOutcome, TtsError> {
        self.upload(path, force, "/get_reference_files", "/upload_reference")
            .await
    }

    async fn upload_predefined(
        &self,
        path: &Path,
        force: bool,
    ) -> Result<UploadOutcome, TtsError> {
        self.upload(path, force, "/get_predefined_voices", "/upload_predefined_voice")
            .await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
