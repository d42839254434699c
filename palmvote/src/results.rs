use crate::*;
use uuid::Uuid;

/// One candidate's line in the results table
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Standing {
    pub candidate_id: Uuid,
    pub leader_name: String,
    pub party_name: String,
    pub votes: u64,

    /// Share of the total, truncated to one decimal place
    pub percentage: f64,
}

/// Results of one election, highest vote count first
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Standings {
    pub election_id: Uuid,
    pub title: String,
    pub total_votes: u64,
    pub rows: Vec<Standing>,
}

impl Standings {
    pub fn new(election: &Election) -> Self {
        let total = election.total_votes();

        let mut rows: Vec<Standing> = election
            .candidates
            .iter()
            .map(|c| Standing {
                candidate_id: c.candidate_id,
                leader_name: c.leader_name.clone(),
                party_name: c.party_name.clone(),
                votes: c.votes_count,
                percentage: percentage(c.votes_count, total),
            })
            .collect();
        rows.sort_by(|a, b| {
            b.votes
                .cmp(&a.votes)
                .then_with(|| a.leader_name.cmp(&b.leader_name))
        });

        Standings {
            election_id: election.election_id,
            title: election.title.clone(),
            total_votes: total,
            rows,
        }
    }

    /// Leading candidate, if any votes were cast
    pub fn winner(&self) -> Option<&Standing> {
        if self.total_votes == 0 {
            return None;
        }
        self.rows.first()
    }
}

/// `votes / total` as a percentage, truncated to tenths
pub fn percentage(votes: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let tenths = (votes as u128 * 1000) / total as u128;
    tenths as f64 / 10.0
}
