use crate::*;
use chrono::NaiveDateTime;
use std::fmt;
use uuid::Uuid;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ElectionStatus {
    Active,
    Closed,
    Draft,
}

impl Default for ElectionStatus {
    fn default() -> Self {
        ElectionStatus::Active
    }
}

impl fmt::Display for ElectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            ElectionStatus::Active => "ACTIVE",
            ElectionStatus::Closed => "CLOSED",
            ElectionStatus::Draft => "DRAFT",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for ElectionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ACTIVE" => Ok(ElectionStatus::Active),
            "CLOSED" => Ok(ElectionStatus::Closed),
            "DRAFT" => Ok(ElectionStatus::Draft),
            other => Err(format!("unknown election status: {}", other)),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Election {
    pub election_id: Uuid,
    pub title: String,

    #[serde(default, with = "serde_datetime::optional")]
    pub start_time: Option<NaiveDateTime>,

    #[serde(default, with = "serde_datetime::optional")]
    pub end_time: Option<NaiveDateTime>,

    #[serde(default)]
    pub status: ElectionStatus,

    /// Candidates standing in this election
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

impl Election {
    pub fn new(new: NewElection) -> Self {
        Election {
            election_id: Uuid::new_v4(),
            title: new.title.trim().to_owned(),
            start_time: new.start_time,
            end_time: new.end_time,
            status: new.status.unwrap_or_default(),
            candidates: vec![],
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == ElectionStatus::Active
    }

    /// Get a candidate with the given ID
    pub fn get_candidate(&self, candidate_id: Uuid) -> Option<&Candidate> {
        self.candidates
            .iter()
            .find(|candidate| candidate.candidate_id == candidate_id)
    }

    pub fn get_candidate_mut(&mut self, candidate_id: Uuid) -> Option<&mut Candidate> {
        self.candidates
            .iter_mut()
            .find(|candidate| candidate.candidate_id == candidate_id)
    }

    pub fn total_votes(&self) -> u64 {
        self.candidates.iter().map(|c| c.votes_count).sum()
    }
}

/// Body of a create-election request
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewElection {
    #[serde(default)]
    pub title: String,

    #[serde(default, with = "serde_datetime::optional")]
    pub start_time: Option<NaiveDateTime>,

    #[serde(default, with = "serde_datetime::optional")]
    pub end_time: Option<NaiveDateTime>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ElectionStatus>,
}

impl NewElection {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::TitleRequired);
        }
        Ok(())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub candidate_id: Uuid,
    pub leader_name: String,

    #[serde(default)]
    pub party_name: String,

    #[serde(default)]
    pub city: String,

    #[serde(default)]
    pub votes_count: u64,
}

/// Body of an add-candidate request
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewCandidate {
    #[serde(default)]
    pub leader_name: String,

    #[serde(default)]
    pub party_name: String,

    #[serde(default)]
    pub city: String,

    /// Seed count; negative values are clamped to 0
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub votes_count: Option<i64>,
}

impl From<NewCandidate> for Candidate {
    fn from(new: NewCandidate) -> Self {
        Candidate {
            candidate_id: Uuid::new_v4(),
            leader_name: new.leader_name.trim().to_owned(),
            party_name: new.party_name.trim().to_owned(),
            city: new.city.trim().to_owned(),
            votes_count: new.votes_count.unwrap_or(0).max(0) as u64,
        }
    }
}
