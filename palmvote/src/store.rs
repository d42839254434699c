use crate::*;
use indexmap::IndexMap;
use uuid::Uuid;

/// Backend record store
pub trait Store {
    /// Get a voter by voter code
    fn get_voter(&self, voter_code: &str) -> Option<Voter>;

    /// All voters, in registration order
    fn voters(&self) -> Vec<Voter>;

    /// Insert or replace a voter, keyed by voter code
    fn put_voter(&mut self, voter: Voter);

    fn get_election(&self, election_id: Uuid) -> Option<Election>;

    /// All elections, in creation order
    fn elections(&self) -> Vec<Election>;

    fn put_election(&mut self, election: Election);

    fn get_ballot(&self, ballot_id: Uuid) -> Option<Ballot>;

    fn put_ballot(&mut self, ballot: Ballot);

    /// Whether `voter_id` already has a ballot in `election_id`
    fn has_ballot(&self, voter_id: Uuid, election_id: Uuid) -> bool;

    /// Get a voter, or fail with `VoterNotFound`
    fn require_voter(&self, voter_code: &str) -> Result<Voter, ValidationError> {
        self.get_voter(voter_code)
            .ok_or(ValidationError::VoterNotFound)
    }

    /// Get an election, or fail with `ElectionNotFound`
    fn require_election(&self, election_id: Uuid) -> Result<Election, ValidationError> {
        self.get_election(election_id)
            .ok_or(ValidationError::ElectionNotFound)
    }

    /// Elections currently accepting votes
    fn active_elections(&self) -> Vec<Election> {
        self.elections()
            .into_iter()
            .filter(Election::is_active)
            .collect()
    }
}

/// A simple store that keeps everything in memory
#[derive(Default, Clone, Debug)]
pub struct MemStore {
    voters: IndexMap<String, Voter>,
    elections: IndexMap<Uuid, Election>,
    ballots: IndexMap<Uuid, Ballot>,
}

impl MemStore {
    pub fn len_ballots(&self) -> usize {
        self.ballots.len()
    }
}

impl Store for MemStore {
    fn get_voter(&self, voter_code: &str) -> Option<Voter> {
        self.voters.get(voter_code.trim()).cloned()
    }

    fn voters(&self) -> Vec<Voter> {
        self.voters.values().cloned().collect()
    }

    fn put_voter(&mut self, voter: Voter) {
        self.voters.insert(voter.voter_code.clone(), voter);
    }

    fn get_election(&self, election_id: Uuid) -> Option<Election> {
        self.elections.get(&election_id).cloned()
    }

    fn elections(&self) -> Vec<Election> {
        self.elections.values().cloned().collect()
    }

    fn put_election(&mut self, election: Election) {
        self.elections.insert(election.election_id, election);
    }

    fn get_ballot(&self, ballot_id: Uuid) -> Option<Ballot> {
        self.ballots.get(&ballot_id).cloned()
    }

    fn put_ballot(&mut self, ballot: Ballot) {
        self.ballots.insert(ballot.ballot_id, ballot);
    }

    fn has_ballot(&self, voter_id: Uuid, election_id: Uuid) -> bool {
        self.ballots
            .values()
            .any(|b| b.voter_id == voter_id && b.election_id == election_id)
    }
}
