//! Controllers for the admin portal screens.

use crate::*;
use rand::Rng;
use std::time::Duration;
use uuid::Uuid;

/// How long "voter created" stays up before the form clears
pub const VOTER_CREATED_HOLD: Duration = Duration::from_secs(2);

/// How long "palm registered" stays up before the form clears
pub const PALM_REGISTERED_HOLD: Duration = Duration::from_millis(2500);

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdminLoginScreen {
    pub username: String,
    pub password: String,
    pub state: ScreenState,
}

impl AdminLoginScreen {
    pub fn submit<B: Backend + ?Sized>(&mut self, backend: &B) -> Option<Event> {
        let (username, password) = (self.username.trim().to_owned(), self.password.clone());
        self.state
            .run(|| backend.admin_login(&username, &password))
            .map(|_| Event::AdminAuthenticated)
    }
}

/// Headline numbers on the admin dashboard
#[derive(Serialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub total_voters: usize,
    pub palm_registered: usize,
    pub voted: usize,
    pub total_elections: usize,
    pub active_elections: usize,
}

impl Overview {
    pub fn new(voters: &[Voter], elections: &[Election]) -> Self {
        Overview {
            total_voters: voters.len(),
            palm_registered: voters.iter().filter(|v| v.palm_registered()).count(),
            voted: voters.iter().filter(|v| v.has_voted).count(),
            total_elections: elections.len(),
            active_elections: elections.iter().filter(|e| e.is_active()).count(),
        }
    }
}

/// Fetch voters and elections at the same time and wait for both
pub fn fetch_voters_and_elections<B>(backend: &B) -> Result<(Vec<Voter>, Vec<Election>), ApiError>
where
    B: Backend + Sync + ?Sized,
{
    std::thread::scope(|s| {
        let voters = s.spawn(|| backend.voters());
        let elections = s.spawn(|| backend.elections());

        let voters = voters.join().unwrap_or_else(|e| std::panic::resume_unwind(e));
        let elections = elections
            .join()
            .unwrap_or_else(|e| std::panic::resume_unwind(e));
        voters.and_then(|v| elections.map(|e| (v, e)))
    })
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardScreen {
    pub overview: Option<Overview>,
    pub state: ScreenState,
}

impl DashboardScreen {
    pub fn refresh<B: Backend + Sync + ?Sized>(&mut self, backend: &B) {
        if let Some((voters, elections)) = self.state.run(|| fetch_voters_and_elections(backend)) {
            self.overview = Some(Overview::new(&voters, &elections));
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateVoterForm {
    pub name: String,
    pub voter_code: String,
    pub mobile: String,

    /// `YYYY-MM-DD`
    pub dob: String,

    pub state: ScreenState,
    pub created: Option<Voter>,
    confirmation: Confirmation,
}

impl Default for CreateVoterForm {
    fn default() -> Self {
        CreateVoterForm {
            name: String::new(),
            voter_code: String::new(),
            mobile: String::new(),
            dob: String::new(),
            state: ScreenState::default(),
            created: None,
            confirmation: Confirmation::new(VOTER_CREATED_HOLD),
        }
    }
}

impl CreateVoterForm {
    /// Fill the voter code with a random one
    pub fn generate_code<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.voter_code = mock::voter_code(rng);
    }

    pub fn submitted(&self) -> bool {
        self.confirmation.is_shown()
    }

    /// Create the voter. Ignored while a request or the confirmation is
    /// showing.
    pub fn submit<B: Backend + ?Sized>(&mut self, backend: &B) -> Option<Voter> {
        if self.state.loading || self.submitted() {
            return None;
        }
        let voter = match self.to_request() {
            Ok(voter) => voter,
            Err(message) => {
                self.state.fail(message);
                return None;
            }
        };

        let created = self.state.run(|| backend.create_voter(&voter))?;
        self.created = Some(created.clone());
        self.confirmation.show();
        Some(created)
    }

    /// Advance the confirmation timer; the form clears when it expires
    pub fn tick(&mut self, elapsed: Duration) {
        if self.confirmation.tick(elapsed) {
            *self = CreateVoterForm::default();
        }
    }

    fn to_request(&self) -> Result<NewVoter, &'static str> {
        let required = [&self.name, &self.voter_code, &self.mobile, &self.dob];
        if required.iter().any(|f| f.trim().is_empty()) {
            return Err("Please fill in all required fields");
        }
        let dob = serde_datetime::parse_local(self.dob.trim()).ok_or("Invalid date of birth")?;

        Ok(NewVoter {
            voter_code: self.voter_code.trim().to_owned(),
            name: self.name.trim().to_owned(),
            mobile: Some(self.mobile.trim().to_owned()),
            dob: Some(dob),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VoterListScreen {
    pub voters: Vec<Voter>,
    pub filter: String,
    pub state: ScreenState,
}

impl VoterListScreen {
    pub fn load<B: Backend + ?Sized>(&mut self, backend: &B) {
        if let Some(voters) = self.state.run(|| backend.voters()) {
            self.voters = voters;
        }
    }

    /// Voters whose name or code contains the filter, ignoring case
    pub fn visible(&self) -> Vec<&Voter> {
        let needle = self.filter.trim().to_lowercase();
        self.voters
            .iter()
            .filter(|v| {
                needle.is_empty()
                    || v.name.to_lowercase().contains(&needle)
                    || v.voter_code.to_lowercase().contains(&needle)
            })
            .collect()
    }

    /// Open palm registration for one voter
    pub fn register_palm(&self, voter_code: &str) -> (Event, PalmRegistrationScreen) {
        let screen = PalmRegistrationScreen {
            voter_code: voter_code.to_owned(),
            ..Default::default()
        };
        (Event::RegisterPalm, screen)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PalmRegistrationScreen {
    pub voter_code: String,
    pub left_template: Option<String>,
    pub right_template: Option<String>,
    pub state: ScreenState,
    confirmation: Confirmation,
}

impl Default for PalmRegistrationScreen {
    fn default() -> Self {
        PalmRegistrationScreen {
            voter_code: String::new(),
            left_template: None,
            right_template: None,
            state: ScreenState::default(),
            confirmation: Confirmation::new(PALM_REGISTERED_HOLD),
        }
    }
}

impl PalmRegistrationScreen {
    pub fn capture<C: PalmCapture + ?Sized>(&mut self, hand: Hand, capture: &C) {
        let code = self.voter_code.trim().to_owned();
        if code.is_empty() {
            self.state.fail("Enter voter ID code.");
            return;
        }

        if let Some(template) = self.state.run(|| capture.capture(hand, &code)) {
            match hand {
                Hand::Left => self.left_template = Some(template),
                Hand::Right => self.right_template = Some(template),
            }
        }
    }

    pub fn registered(&self) -> bool {
        self.confirmation.is_shown()
    }

    pub fn register<B: Backend + ?Sized>(&mut self, backend: &B) -> Option<Voter> {
        self.state.clear();
        let code = self.voter_code.trim().to_owned();
        if code.is_empty() {
            self.state.fail("Voter ID required");
            return None;
        }
        if self.left_template.is_none() && self.right_template.is_none() {
            self.state.fail("Capture at least one hand");
            return None;
        }

        let request = RegisterTemplateRequest {
            left_template: self.left_template.clone(),
            right_template: self.right_template.clone(),
            session_key: None,
        };
        let voter = self.state.run(|| backend.register_templates(&code, &request))?;
        self.confirmation.show();
        Some(voter)
    }

    pub fn tick(&mut self, elapsed: Duration) {
        if self.confirmation.tick(elapsed) {
            *self = PalmRegistrationScreen::default();
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreateElectionForm {
    pub title: String,
    pub start_date: String,
    pub start_time: String,
    pub end_date: String,
    pub end_time: String,
    pub status: ElectionStatus,
    pub candidates: Vec<NewCandidate>,
    pub state: ScreenState,
}

impl CreateElectionForm {
    pub fn add_candidate_row(&mut self) -> &mut NewCandidate {
        self.candidates.push(NewCandidate::default());
        let last = self.candidates.len() - 1;
        &mut self.candidates[last]
    }

    /// Create the election, then add each candidate row with a leader name
    pub fn submit<B: Backend + ?Sized>(&mut self, backend: &B) -> Option<Election> {
        if self.title.trim().is_empty() {
            self.state.fail("Election title required");
            return None;
        }

        let request = NewElection {
            title: self.title.trim().to_owned(),
            start_time: form_datetime(&self.start_date, &self.start_time),
            end_time: form_datetime(&self.end_date, &self.end_time),
            status: Some(self.status),
        };
        let rows: Vec<NewCandidate> = self
            .candidates
            .iter()
            .filter(|c| !c.leader_name.trim().is_empty())
            .cloned()
            .collect();

        self.state.run(|| {
            let mut election = backend.create_election(&request)?;
            for row in &rows {
                let candidate = backend.add_candidate(election.election_id, row)?;
                election.candidates.push(candidate);
            }
            Ok(election)
        })
    }
}

fn form_datetime(date: &str, time: &str) -> Option<chrono::NaiveDateTime> {
    let (date, time) = (date.trim(), time.trim());
    if date.is_empty() {
        return None;
    }
    if time.is_empty() {
        return serde_datetime::parse_local(date);
    }
    serde_datetime::parse_local(&serde_datetime::join_date_time(date, time))
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultsScreen {
    pub elections: Vec<Election>,
    pub selected: Option<Uuid>,
    pub state: ScreenState,
}

impl ResultsScreen {
    /// Load elections and select the first one unless a selection still
    /// exists
    pub fn load<B: Backend + ?Sized>(&mut self, backend: &B) {
        if let Some(elections) = self.state.run(|| backend.elections()) {
            let keep = self
                .selected
                .filter(|id| elections.iter().any(|e| e.election_id == *id));
            self.selected = keep.or_else(|| elections.first().map(|e| e.election_id));
            self.elections = elections;
        }
    }

    pub fn select(&mut self, election_id: Uuid) {
        if self.elections.iter().any(|e| e.election_id == election_id) {
            self.selected = Some(election_id);
        }
    }

    pub fn standings(&self) -> Option<Standings> {
        let id = self.selected?;
        self.elections
            .iter()
            .find(|e| e.election_id == id)
            .map(Standings::new)
    }
}
