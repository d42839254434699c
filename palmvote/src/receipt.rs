use crate::*;
use chrono::NaiveDateTime;
use lazy_static::lazy_static;
use rand::Rng;
use regex::Regex;

/// What the voter is shown after casting a ballot.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VoteReceipt {
    pub ballot_id: String,
    pub audit_hash: String,

    #[serde(with = "serde_datetime::optional")]
    pub timestamp: Option<NaiveDateTime>,

    pub candidate: Candidate,

    #[serde(default)]
    pub vvpat_path: Option<String>,

    /// True when the backend response carried no IDs and mock values were
    /// filled in. Such a receipt is not an audit artifact.
    #[serde(default)]
    pub fabricated: bool,
}

impl VoteReceipt {
    /// Build a receipt from the cast-vote response body.
    ///
    /// The body is the JSON `VoteResponse`; older backends answered with
    /// text like `ballotId: ... | auditHash: ... | VVPAT saved at: ...`,
    /// which is scraped instead.
    pub fn from_response<R: Rng + ?Sized>(
        body: &str,
        candidate: Candidate,
        now: NaiveDateTime,
        rng: &mut R,
    ) -> Self {
        let (ballot_id, audit_hash, vvpat_path) = match serde_json::from_str::<VoteResponse>(body) {
            Ok(resp) => (
                resp.ballot_id.map(|id| id.to_string()),
                resp.audit_hash,
                resp.path,
            ),
            Err(_) => scrape(body),
        };

        let fabricated = ballot_id.is_none() || audit_hash.is_none();
        if fabricated {
            log::warn!("vote response carried no ballot identifiers; receipt uses mock values");
        }

        VoteReceipt {
            ballot_id: ballot_id.unwrap_or_else(|| mock::ballot_id(rng)),
            audit_hash: audit_hash.unwrap_or_else(|| mock::audit_hash(rng)),
            timestamp: Some(now),
            candidate,
            vvpat_path,
            fabricated,
        }
    }

    /// The ballot UUID, when the receipt carries a real one
    pub fn ballot_uuid(&self) -> Option<uuid::Uuid> {
        if self.fabricated {
            return None;
        }
        self.ballot_id.parse().ok()
    }
}

lazy_static! {
    static ref BALLOT_ID: Regex = Regex::new(r"(?i)ballotId:\s*([a-f0-9-]+)").unwrap();
    static ref AUDIT_HASH: Regex = Regex::new(r"(?i)auditHash:\s*([A-Za-z0-9+/=]+)").unwrap();
    static ref VVPAT_PATH: Regex = Regex::new(r"VVPAT saved at:\s*([^|]+)").unwrap();
}

fn scrape(body: &str) -> (Option<String>, Option<String>, Option<String>) {
    let capture = |re: &Regex| -> Option<String> {
        re.captures(body)?
            .get(1)
            .map(|m| m.as_str().trim().to_owned())
    };

    (capture(&BALLOT_ID), capture(&AUDIT_HASH), capture(&VVPAT_PATH))
}
