//! The REST contract between the front-end and the backend.
//!
//! `Backend` is the seam the screen controllers talk through; the CLI
//! implements it over HTTP and tests implement it in-process.

use crate::*;
use uuid::Uuid;

pub const DEFAULT_API_URI: &str = "http://localhost:8080";
pub const DEFAULT_CAPTURE_URI: &str = "http://127.0.0.1:5000";

/// Message used when a failed response carries none
pub const GENERIC_FAILURE: &str = "API request failed";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AdminLogin {
    pub username: String,
    pub password: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RegisterTemplateRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left_template: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right_template: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_key: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScanRequest {
    pub voter_code: String,
    pub encrypted_template: String,

    /// Key the template was sealed under, when it is not the voter's own
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_key: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ScanResult {
    pub verified: bool,
    pub score: f64,
}

/// Body of every error response from the daemon
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ErrorBody {
    pub message: String,
}

/// Body of a capture-service response
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CaptureResponse {
    pub status: String,

    #[serde(default, alias = "rawTemplate")]
    pub template: Option<String>,

    #[serde(default)]
    pub voter_code: Option<String>,

    #[serde(default)]
    pub message: Option<String>,
}

impl CaptureResponse {
    /// The template, if the capture succeeded
    pub fn into_template(self) -> Result<String, ApiError> {
        match (self.status.as_str(), self.template) {
            ("success", Some(template)) if !template.is_empty() => Ok(template),
            _ => Err(ApiError::Capture(
                self.message.unwrap_or_else(|| "Capture failed.".to_owned()),
            )),
        }
    }
}

/// Operations the front-end performs against the backend
pub trait Backend {
    fn admin_login(&self, username: &str, password: &str) -> Result<String, ApiError>;

    fn create_voter(&self, voter: &NewVoter) -> Result<Voter, ApiError>;

    fn voters(&self) -> Result<Vec<Voter>, ApiError>;

    fn register_templates(
        &self,
        voter_code: &str,
        request: &RegisterTemplateRequest,
    ) -> Result<Voter, ApiError>;

    fn create_election(&self, election: &NewElection) -> Result<Election, ApiError>;

    fn add_candidate(&self, election_id: Uuid, candidate: &NewCandidate) -> Result<Candidate, ApiError>;

    fn elections(&self) -> Result<Vec<Election>, ApiError>;

    fn active_elections(&self) -> Result<Vec<Election>, ApiError>;

    /// Base64 AES-256 key from the "QKD" endpoint
    fn session_key(&self) -> Result<String, ApiError>;

    fn voter_login(&self, voter_code: &str) -> Result<Voter, ApiError>;

    fn scan_palm(&self, request: &ScanRequest) -> Result<ScanResult, ApiError>;

    /// Returns the raw response body; receipts are parsed from it
    fn cast_vote(&self, voter_code: &str, election_id: Uuid, candidate_id: Uuid) -> Result<String, ApiError>;

    fn download_vvpat(&self, ballot_id: Uuid) -> Result<Vec<u8>, ApiError>;
}

/// The local palm capture service
pub trait PalmCapture {
    /// Capture one hand, returning the raw template as base64
    fn capture(&self, hand: Hand, voter_code: &str) -> Result<String, ApiError>;
}

/// Capture stand-in that produces stable per-voter, per-hand templates
#[derive(Debug, Clone, Copy, Default)]
pub struct MockCapture;

impl PalmCapture for MockCapture {
    fn capture(&self, hand: Hand, voter_code: &str) -> Result<String, ApiError> {
        if voter_code.trim().is_empty() {
            return Err(ApiError::Capture("voterCode required".to_owned()));
        }
        Ok(mock::palm_template_for(voter_code, hand))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// One backend endpoint: method, path under `/api`, and query pairs
#[derive(Debug, Clone, PartialEq)]
pub enum Endpoint<'a> {
    AdminLogin,
    CreateVoter,
    Voters,
    RegisterTemplates { voter_code: &'a str },
    CreateElection,
    AddCandidate { election_id: Uuid },
    Elections,
    ActiveElections,
    SessionKey,
    VoterLogin { voter_code: &'a str },
    Scan,
    CastVote { voter_code: &'a str, election_id: Uuid, candidate_id: Uuid },
    Vvpat { ballot_id: Uuid },
}

impl<'a> Endpoint<'a> {
    pub fn method(&self) -> Method {
        match self {
            Endpoint::Voters
            | Endpoint::Elections
            | Endpoint::ActiveElections
            | Endpoint::SessionKey
            | Endpoint::Vvpat { .. } => Method::Get,
            _ => Method::Post,
        }
    }

    pub fn path(&self) -> String {
        match self {
            Endpoint::AdminLogin => "/api/admin/login".to_owned(),
            Endpoint::CreateVoter | Endpoint::Voters => "/api/admin/voters".to_owned(),
            Endpoint::RegisterTemplates { voter_code } => {
                format!("/api/admin/voters/{}/register-template", voter_code.trim())
            }
            Endpoint::CreateElection | Endpoint::Elections => "/api/admin/elections".to_owned(),
            Endpoint::AddCandidate { election_id } => {
                format!("/api/admin/elections/{}/candidates", election_id)
            }
            Endpoint::ActiveElections => "/api/voter/elections".to_owned(),
            Endpoint::SessionKey => "/api/security/qkd/session-key".to_owned(),
            Endpoint::VoterLogin { .. } => "/api/voter/login".to_owned(),
            Endpoint::Scan => "/api/voter/scan".to_owned(),
            Endpoint::CastVote { .. } => "/api/voter/vote".to_owned(),
            Endpoint::Vvpat { ballot_id } => format!("/api/voter/ballot/{}/vvp", ballot_id),
        }
    }

    pub fn query(&self) -> Vec<(&'static str, String)> {
        match self {
            Endpoint::VoterLogin { voter_code } => vec![("voterCode", voter_code.trim().to_owned())],
            Endpoint::CastVote {
                voter_code,
                election_id,
                candidate_id,
            } => vec![
                ("voterCode", voter_code.trim().to_owned()),
                ("electionId", election_id.to_string()),
                ("candidateId", candidate_id.to_string()),
            ],
            _ => vec![],
        }
    }
}

/// A successfully normalized response body
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Json(serde_json::Value),
    Text(String),
}

impl Body {
    /// Decode a JSON body into `T`
    pub fn json<T: serde::de::DeserializeOwned>(self) -> Result<T, ApiError> {
        match self {
            Body::Json(value) => {
                serde_json::from_value(value).map_err(|e| ApiError::Decode(e.to_string()))
            }
            Body::Text(text) => {
                serde_json::from_str(&text).map_err(|e| ApiError::Decode(e.to_string()))
            }
        }
    }

    /// The body as text; JSON bodies are re-serialized
    pub fn text(self) -> String {
        match self {
            Body::Json(value) => value.to_string(),
            Body::Text(text) => text,
        }
    }
}

/// Map a response to a `Body`, or to the error a screen should show.
///
/// JSON responses (by content type) are parsed and fail with their
/// `message` field; anything else is text and fails with the text itself.
/// Either falls back to `API request failed`.
pub fn normalize(status: u16, content_type: Option<&str>, body: &[u8]) -> Result<Body, ApiError> {
    let ok = (200..300).contains(&status);
    let is_json = content_type
        .map(|ct| ct.contains("application/json"))
        .unwrap_or(false);

    if is_json {
        let value: serde_json::Value = match serde_json::from_slice(body) {
            Ok(value) => value,
            Err(_) if !ok => serde_json::Value::Null,
            Err(e) => return Err(ApiError::Decode(e.to_string())),
        };
        if !ok {
            let message = value
                .get("message")
                .and_then(|m| m.as_str())
                .filter(|m| !m.is_empty())
                .unwrap_or(GENERIC_FAILURE);
            return Err(ApiError::Status {
                status,
                message: message.to_owned(),
            });
        }
        return Ok(Body::Json(value));
    }

    let text = String::from_utf8_lossy(body).into_owned();
    if !ok {
        let message = if text.trim().is_empty() {
            GENERIC_FAILURE.to_owned()
        } else {
            text
        };
        return Err(ApiError::Status { status, message });
    }
    Ok(Body::Text(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_table() {
        let election_id = Uuid::new_v4();
        let candidate_id = Uuid::new_v4();

        assert_eq!(Endpoint::AdminLogin.method(), Method::Post);
        assert_eq!(Endpoint::Voters.method(), Method::Get);
        assert_eq!(Endpoint::CreateVoter.path(), Endpoint::Voters.path());
        assert_eq!(
            Endpoint::RegisterTemplates { voter_code: "V1" }.path(),
            "/api/admin/voters/V1/register-template"
        );
        assert_eq!(
            Endpoint::AddCandidate { election_id }.path(),
            format!("/api/admin/elections/{}/candidates", election_id)
        );
        assert_eq!(Endpoint::SessionKey.path(), "/api/security/qkd/session-key");

        let vote = Endpoint::CastVote {
            voter_code: " V1 ",
            election_id,
            candidate_id,
        };
        assert_eq!(vote.method(), Method::Post);
        assert_eq!(vote.path(), "/api/voter/vote");
        assert_eq!(
            vote.query(),
            vec![
                ("voterCode", "V1".to_owned()),
                ("electionId", election_id.to_string()),
                ("candidateId", candidate_id.to_string()),
            ]
        );
        assert!(Endpoint::Scan.query().is_empty());
        assert_eq!(
            Endpoint::VoterLogin { voter_code: "V9" }.query(),
            vec![("voterCode", "V9".to_owned())]
        );
    }

    #[test]
    fn normalize_json_and_text() {
        let json = Some("application/json;charset=UTF-8");

        let body = normalize(200, json, br#"{"verified":true,"score":0.93}"#).unwrap();
        let result: ScanResult = body.json().unwrap();
        assert!(result.verified);

        let err = normalize(404, json, br#"{"message":"Voter not found"}"#).unwrap_err();
        assert_eq!(err.to_string(), "Voter not found");
        assert_eq!(err.status(), Some(404));

        let err = normalize(401, json, br#"{"verified":false,"score":0.1}"#).unwrap_err();
        assert_eq!(err.to_string(), GENERIC_FAILURE);

        assert_eq!(
            normalize(200, Some("text/plain"), b"Login successful").unwrap(),
            Body::Text("Login successful".into())
        );
        assert_eq!(
            normalize(401, None, b"Invalid credentials").unwrap_err().to_string(),
            "Invalid credentials"
        );
        assert_eq!(
            normalize(500, Some("text/plain"), b"").unwrap_err().to_string(),
            GENERIC_FAILURE
        );
        assert!(matches!(
            normalize(200, json, b"not json"),
            Err(ApiError::Decode(_))
        ));
    }

    #[test]
    fn capture_response() {
        let ok: CaptureResponse =
            serde_json::from_str(r#"{"status":"success","template":"AAEC","voterCode":"V1"}"#).unwrap();
        assert_eq!(ok.into_template().unwrap(), "AAEC");

        let cancelled: CaptureResponse = serde_json::from_str(r#"{"status":"cancelled"}"#).unwrap();
        assert_eq!(cancelled.into_template().unwrap_err().to_string(), "Capture failed.");

        let failed: CaptureResponse =
            serde_json::from_str(r#"{"status":"error","message":"hand must be left/right"}"#).unwrap();
        assert_eq!(
            failed.into_template().unwrap_err().to_string(),
            "hand must be left/right"
        );

        assert!(MockCapture.capture(Hand::Left, "").is_err());
        assert_eq!(
            MockCapture.capture(Hand::Left, "V1").unwrap(),
            mock::palm_template_for("V1", Hand::Left)
        );
    }
}
