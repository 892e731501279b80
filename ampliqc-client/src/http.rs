//! HTTP client for the primer backend.
//!
//! One `BackendClient` implements all four service traits against the
//! backend's form-POST endpoints. Error mapping happens here and nowhere
//! else: HTTP 504 and client-side timeouts become the retryable
//! gateway-timeout class, every other non-success status becomes a terminal
//! `ServiceError::Rejected` carrying the response text.

use crate::wire::{self, WireCandidate, WireHit, WirePcrReport};
use crate::{GenomeSearch, InSilicoPcr, PrimerDesigner, PrimerNotesStore};
use ampliqc_core::{
    AmplificationResult, AmpliqcError, AmpliqcResult, ConfigError, DesignTarget, GenomeId, Hit,
    PipelineConfig, PrimerPair, RecordId, ServiceError, TransportError,
};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::time::Duration;

const DESIGN_PATH: &str = "/primer-design/design";
const SPECIFICITY_PATH: &str = "/primer-design/specificity";
const PCR_INSTALLED_PATH: &str = "/primer-design/pcr/installed";
const PCR_PATH: &str = "/primer-design/pcr";
const NOTES_PATH: &str = "/primer-design/notes";

/// Exact body the notes endpoint returns on success; anything else is the
/// error text to surface.
const NOTES_SUCCESS_MARKER: &str = "Successfully Updated Notes";

/// Status the PCR endpoint answers with when the genome has no FM-index
/// built, distinct from ordinary rejections.
const PCR_MISSING_INDEX_STATUS: u16 = 501;

/// HTTP client against the primer backend.
///
/// Cheap to clone; the inner `reqwest::Client` is an `Arc` around a
/// connection pool.
#[derive(Debug, Clone)]
pub struct BackendClient {
    client: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    /// Create a client for the given base URL with a per-request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> AmpliqcResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ConfigError::InvalidValue {
                field: "request_timeout".to_string(),
                value: format!("{timeout:?}"),
                reason: e.to_string(),
            })?;
        let base_url = base_url.into();
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Create a client from a validated pipeline configuration.
    pub fn from_config(config: &PipelineConfig) -> AmpliqcResult<Self> {
        config.validate()?;
        Self::new(config.backend_base_url.clone(), config.request_timeout)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn map_send_error(&self, path: &str, error: reqwest::Error) -> AmpliqcError {
        if error.is_timeout() {
            TransportError::GatewayTimeout {
                endpoint: path.to_string(),
            }
            .into()
        } else {
            TransportError::ConnectionFailed {
                endpoint: path.to_string(),
                reason: error.to_string(),
            }
            .into()
        }
    }

    async fn send_form(
        &self,
        path: &str,
        form: &[(&str, &str)],
    ) -> AmpliqcResult<reqwest::Response> {
        let response = self
            .client
            .post(self.url(path))
            .form(form)
            .send()
            .await
            .map_err(|e| self.map_send_error(path, e))?;

        let status = response.status();
        if status == reqwest::StatusCode::GATEWAY_TIMEOUT {
            return Err(TransportError::GatewayTimeout {
                endpoint: path.to_string(),
            }
            .into());
        }
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ServiceError::Rejected {
                endpoint: path.to_string(),
                status: status.as_u16(),
                message,
            }
            .into());
        }
        Ok(response)
    }

    async fn post_form_json<T: DeserializeOwned>(
        &self,
        path: &str,
        form: &[(&str, &str)],
    ) -> AmpliqcResult<T> {
        let response = self.send_form(path, form).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| wire::invalid_response(path, e.to_string()))
    }

    async fn post_form_text(&self, path: &str, form: &[(&str, &str)]) -> AmpliqcResult<String> {
        let response = self.send_form(path, form).await?;
        response
            .text()
            .await
            .map_err(|e| wire::invalid_response(path, e.to_string()))
    }
}

/// The probe endpoint answers with the literal text "1" or "0".
fn parse_probe_flag(endpoint: &str, body: &str) -> AmpliqcResult<bool> {
    match body.trim() {
        "1" => Ok(true),
        "0" => Ok(false),
        other => Err(wire::invalid_response(
            endpoint,
            format!("expected \"1\" or \"0\", got {:?}", other),
        )),
    }
}

#[async_trait]
impl PrimerDesigner for BackendClient {
    async fn design(&self, target: &DesignTarget) -> AmpliqcResult<Vec<PrimerPair>> {
        let form = [
            ("gene", target.gene.as_str()),
            ("genome", target.genome.as_str()),
        ];
        let candidates: Vec<WireCandidate> = self.post_form_json(DESIGN_PATH, &form).await?;
        wire::pairs_from_candidates(DESIGN_PATH, candidates)
    }
}

#[async_trait]
impl GenomeSearch for BackendClient {
    async fn search(&self, sequence: &str, genome: &GenomeId) -> AmpliqcResult<Vec<Hit>> {
        let form = [("sequence", sequence), ("genome", genome.as_str())];
        let map: HashMap<String, WireHit> = self.post_form_json(SPECIFICITY_PATH, &form).await?;
        wire::hits_from_map(SPECIFICITY_PATH, map)
    }
}

#[async_trait]
impl InSilicoPcr for BackendClient {
    async fn is_installed(&self, genome: &GenomeId) -> AmpliqcResult<bool> {
        let form = [("genome", genome.as_str())];
        let body = self.post_form_text(PCR_INSTALLED_PATH, &form).await?;
        parse_probe_flag(PCR_INSTALLED_PATH, &body)
    }

    async fn simulate(
        &self,
        forward: &str,
        reverse: &str,
        genome: &GenomeId,
    ) -> AmpliqcResult<AmplificationResult> {
        let form = [
            ("forward", forward),
            ("reverse", reverse),
            ("genome", genome.as_str()),
        ];
        let report: WirePcrReport = match self.post_form_json(PCR_PATH, &form).await {
            Err(AmpliqcError::Service(ServiceError::Rejected { status, .. }))
                if status == PCR_MISSING_INDEX_STATUS =>
            {
                return Err(ServiceError::ToolUnavailable {
                    tool: "in-silico PCR".to_string(),
                    genome: genome.to_string(),
                }
                .into());
            }
            other => other?,
        };
        report.into_result(PCR_PATH)
    }
}

#[async_trait]
impl PrimerNotesStore for BackendClient {
    async fn update_notes(
        &self,
        record: &RecordId,
        notes: &str,
        genome: &GenomeId,
    ) -> AmpliqcResult<()> {
        let form = [
            ("record", record.as_str()),
            ("notes", notes),
            ("genome", genome.as_str()),
        ];
        let body = self.post_form_text(NOTES_PATH, &form).await?;
        if body.trim() == NOTES_SUCCESS_MARKER {
            Ok(())
        } else {
            Err(ServiceError::Rejected {
                endpoint: NOTES_PATH.to_string(),
                status: 200,
                message: body,
            }
            .into())
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base_url: &str) -> BackendClient {
        BackendClient::new(base_url, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = client("http://localhost:8000/");
        assert_eq!(client.base_url(), "http://localhost:8000");
        assert_eq!(
            client.url(DESIGN_PATH),
            "http://localhost:8000/primer-design/design"
        );
    }

    #[test]
    fn test_base_url_without_slash_kept() {
        let client = client("http://localhost:8000");
        assert_eq!(
            client.url(PCR_INSTALLED_PATH),
            "http://localhost:8000/primer-design/pcr/installed"
        );
    }

    #[test]
    fn test_from_config_rejects_invalid() {
        let config = PipelineConfig {
            backend_base_url: String::new(),
            ..Default::default()
        };
        assert!(matches!(
            BackendClient::from_config(&config),
            Err(AmpliqcError::Config(_))
        ));
    }

    #[test]
    fn test_from_config_accepts_default() {
        let config = PipelineConfig::default();
        assert!(BackendClient::from_config(&config).is_ok());
    }

    #[test]
    fn test_parse_probe_flag() {
        assert!(parse_probe_flag("test", "1").unwrap());
        assert!(!parse_probe_flag("test", "0").unwrap());
        assert!(parse_probe_flag("test", "1\n").unwrap());
        assert!(parse_probe_flag("test", "yes").is_err());
        assert!(parse_probe_flag("test", "").is_err());
    }
}
