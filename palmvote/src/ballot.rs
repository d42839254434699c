use crate::*;
use chrono::NaiveDateTime;
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// A cast ballot, as recorded by the backend
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Ballot {
    pub ballot_id: Uuid,
    pub voter_id: Uuid,
    pub voter_code: String,
    pub election_id: Uuid,
    pub candidate_id: Uuid,

    #[serde(with = "cast_at_format")]
    pub cast_at: NaiveDateTime,

    #[serde(default)]
    pub vvp_generated: bool,

    #[serde(default)]
    pub vvp_path: Option<String>,

    #[serde(default)]
    pub audit_hash: Option<String>,
}

impl Ballot {
    pub fn new(voter: &Voter, election_id: Uuid, candidate_id: Uuid, cast_at: NaiveDateTime) -> Self {
        Ballot {
            ballot_id: Uuid::new_v4(),
            voter_id: voter.voter_id,
            voter_code: voter.voter_code.clone(),
            election_id,
            candidate_id,
            cast_at,
            vvp_generated: false,
            vvp_path: None,
            audit_hash: None,
        }
    }

    /// Tamper-evidence hash of the ballot:
    /// `base64(SHA-256(key || "ballotId|voterCode|candidateId|castAt"))`.
    ///
    /// The voter's template key is mixed in when there is one.
    pub fn compute_audit_hash(&self, key: Option<&TemplateKey>) -> String {
        let data = format!(
            "{}|{}|{}|{}",
            self.ballot_id,
            self.voter_code,
            self.candidate_id,
            cast_at_format::format(&self.cast_at)
        );

        let mut hasher = Sha256::new();
        if let Some(key) = key {
            hasher.update(key.as_bytes());
        }
        hasher.update(data.as_bytes());
        base64::encode(&hasher.finalize())
    }

    /// Response body for a successful cast-vote request
    pub fn response(&self) -> VoteResponse {
        VoteResponse {
            message: "Vote cast successfully".to_owned(),
            path: self.vvp_path.clone(),
            audit_hash: self.audit_hash.clone(),
            ballot_id: Some(self.ballot_id),
        }
    }
}

// Cast times keep sub-second precision
mod cast_at_format {
    use chrono::NaiveDateTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn format(dt: &NaiveDateTime) -> String {
        dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string()
    }

    pub fn serialize<S: Serializer>(dt: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(dt))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        crate::serde_datetime::parse_local(&raw)
            .ok_or_else(|| de::Error::custom(format!("invalid date-time: {}", raw)))
    }
}

/// Body returned by the cast-vote endpoint
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VoteResponse {
    pub message: String,

    #[serde(default)]
    pub path: Option<String>,

    #[serde(default)]
    pub audit_hash: Option<String>,

    #[serde(default)]
    pub ballot_id: Option<Uuid>,
}
