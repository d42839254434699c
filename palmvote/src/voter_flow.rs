//! Controllers for the voter portal, from login to receipt.

use crate::*;
use chrono::NaiveDateTime;
use rand::Rng;
use uuid::Uuid;

pub const ALREADY_VOTED: &str = "You have already voted in this election";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VoterLoginScreen {
    pub voter_code: String,
    pub state: ScreenState,

    /// The voter, once identified; later screens work on their behalf
    pub voter: Option<Voter>,
}

impl VoterLoginScreen {
    pub fn submit<B: Backend + ?Sized>(&mut self, backend: &B) -> Option<Event> {
        let code = self.voter_code.trim().to_owned();
        if code.is_empty() {
            self.state.fail("Voter code required");
            return None;
        }

        let voter = self.state.run(|| backend.voter_login(&code))?;
        if voter.has_voted {
            self.state.fail(ALREADY_VOTED);
            return None;
        }
        self.voter = Some(voter);
        Some(Event::VoterIdentified)
    }
}

/// Session key exchange, shown as a progress animation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QkdSessionScreen {
    pub progress: QkdProgress,
    pub session_key: Option<String>,
    pub state: ScreenState,
}

impl QkdSessionScreen {
    pub fn establish<B: Backend + ?Sized>(&mut self, backend: &B) {
        if let Some(key) = self.state.run(|| backend.session_key()) {
            self.session_key = Some(key.trim().to_owned());
        }
    }

    /// Advance the animation by one step. Yields the screen's outcome on the
    /// tick that completes it: the session when a key was obtained, an
    /// expired session otherwise.
    pub fn tick(&mut self) -> Option<Event> {
        match self.progress.tick() {
            qkd::Tick::Completed if self.session_key.is_some() => Some(Event::SessionEstablished),
            qkd::Tick::Completed => Some(Event::Fail(VoterErrorKind::SessionExpired)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PalmScanScreen {
    pub voter_code: String,
    pub session_key: String,
    pub result: Option<ScanResult>,
    pub state: ScreenState,
}

impl PalmScanScreen {
    pub fn new(voter_code: &str, session_key: &str) -> Self {
        PalmScanScreen {
            voter_code: voter_code.to_owned(),
            session_key: session_key.to_owned(),
            ..Default::default()
        }
    }

    /// Capture the left hand, seal it under the session key and submit it
    pub fn scan<B, C>(&mut self, backend: &B, capture: &C) -> Option<Event>
    where
        B: Backend + ?Sized,
        C: PalmCapture + ?Sized,
    {
        let code = self.voter_code.clone();
        let session_key = self.session_key.clone();
        let request = self.state.run(|| {
            let template = capture.capture(Hand::Left, &code)?;
            seal_scan(&code, &template, &session_key)
        })?;

        self.state.loading = true;
        let outcome = backend.scan_palm(&request);
        self.state.loading = false;

        match outcome {
            Ok(result) if result.verified => {
                self.result = Some(result);
                Some(Event::ScanVerified)
            }
            Ok(result) => {
                self.result = Some(result);
                self.state.fail("Verification failed");
                Some(Event::ScanRejected)
            }
            Err(e) if e.status() == Some(401) => {
                self.state.fail(e.to_string());
                Some(Event::ScanRejected)
            }
            Err(e) => {
                self.state.fail(e.to_string());
                None
            }
        }
    }
}

fn seal_scan(voter_code: &str, template: &str, session_key: &str) -> Result<ScanRequest, ApiError> {
    let decode = |e: Error| ApiError::Decode(e.to_string());

    let key = TemplateKey::from_base64(session_key).map_err(decode)?;
    let raw = base64::decode(template).map_err(|e| decode(e.into()))?;
    Ok(ScanRequest {
        voter_code: voter_code.to_owned(),
        encrypted_template: crypto::seal(&key, &raw).map_err(decode)?,
        session_key: Some(session_key.to_owned()),
    })
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidateSelectionScreen {
    pub elections: Vec<Election>,
    pub election_id: Option<Uuid>,
    pub candidate_id: Option<Uuid>,

    /// The confirmation dialog is open
    pub confirming: bool,

    pub receipt: Option<VoteReceipt>,
    pub state: ScreenState,
}

impl CandidateSelectionScreen {
    pub fn load<B: Backend + ?Sized>(&mut self, backend: &B) {
        match self.state.run(|| backend.active_elections()) {
            Some(elections) => {
                self.election_id = elections.first().map(|e| e.election_id);
                if elections.is_empty() {
                    self.state.fail("No active elections");
                }
                self.elections = elections;
            }
            None => self.state.fail("Failed to load elections"),
        }
    }

    pub fn election(&self) -> Option<&Election> {
        let id = self.election_id?;
        self.elections.iter().find(|e| e.election_id == id)
    }

    pub fn select_election(&mut self, election_id: Uuid) {
        if self.elections.iter().any(|e| e.election_id == election_id) {
            self.election_id = Some(election_id);
            self.candidate_id = None;
            self.confirming = false;
        }
    }

    /// Pick a candidate and open the confirmation
    pub fn select(&mut self, candidate_id: Uuid) {
        let known = self
            .election()
            .and_then(|e| e.get_candidate(candidate_id))
            .is_some();
        if known {
            self.candidate_id = Some(candidate_id);
            self.confirming = true;
        }
    }

    pub fn cancel(&mut self) {
        self.confirming = false;
    }

    /// Cast the confirmed vote and build the receipt
    pub fn confirm<B, R>(&mut self, backend: &B, voter_code: &str, now: NaiveDateTime, rng: &mut R) -> Option<Event>
    where
        B: Backend + ?Sized,
        R: Rng + ?Sized,
    {
        if !self.confirming {
            return None;
        }
        let (election_id, candidate) = match (self.election(), self.candidate_id) {
            (Some(election), Some(id)) => (election.election_id, election.get_candidate(id).cloned()?),
            _ => return None,
        };

        let body = self.state.run(|| backend.cast_vote(voter_code, election_id, candidate.candidate_id));
        match body {
            Some(body) => {
                self.receipt = Some(VoteReceipt::from_response(&body, candidate, now, rng));
                Some(Event::BallotCast)
            }
            None => {
                self.confirming = false;
                None
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VoteSuccessScreen {
    pub receipt: VoteReceipt,
    pub state: ScreenState,
}

impl VoteSuccessScreen {
    pub fn new(receipt: VoteReceipt) -> Self {
        VoteSuccessScreen {
            receipt,
            state: ScreenState::default(),
        }
    }

    /// Fetch the VVPAT receipt document
    pub fn download_vvpat<B: Backend + ?Sized>(&mut self, backend: &B) -> Option<Vec<u8>> {
        let ballot_id = match self.receipt.ballot_uuid() {
            Some(id) => id,
            None => {
                self.state.fail("No VVPAT available for this receipt");
                return None;
            }
        };
        self.state.run(|| backend.download_vvpat(ballot_id))
    }
}
