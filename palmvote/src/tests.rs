use super::*;
use crate::vvpat::tests::MemSink;
use std::sync::Mutex;
use uuid::Uuid;

/// A `Backend` that runs the registry in-process, answering the way the
/// daemon does and counting calls per operation
pub(crate) struct LocalBackend {
    inner: Mutex<(Registry<MemStore>, MemSink)>,
    calls: Mutex<Vec<&'static str>>,
}

impl LocalBackend {
    pub fn new() -> Self {
        LocalBackend {
            inner: Mutex::new((
                Registry::new(MemStore::default(), RegistrySettings::default()),
                MemSink::default(),
            )),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self, operation: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| **c == operation)
            .count()
    }

    fn with<T, F>(&self, operation: &'static str, f: F) -> Result<T, ApiError>
    where
        F: FnOnce(&mut Registry<MemStore>, &MemSink) -> Result<T, ValidationError>,
    {
        self.calls.lock().unwrap().push(operation);
        let mut guard = self.inner.lock().unwrap();
        let (registry, sink) = &mut *guard;
        f(registry, sink).map_err(|e| ApiError::Status {
            status: e.status(),
            message: e.to_string(),
        })
    }

    pub fn seed_voter(&self, code: &str) {
        let mut guard = self.inner.lock().unwrap();
        guard
            .0
            .create_voter(
                NewVoter {
                    voter_code: code.into(),
                    name: format!("Voter {}", code),
                    ..Default::default()
                },
                now(),
            )
            .unwrap();
    }

    pub fn register_left(&self, code: &str) {
        let mut guard = self.inner.lock().unwrap();
        guard
            .0
            .register_templates(
                code,
                &RegisterTemplateRequest {
                    left_template: Some(mock::palm_template_for(code, Hand::Left)),
                    ..Default::default()
                },
            )
            .unwrap();
    }

    pub fn seed_election(&self, title: &str, candidates: &[(&str, i64)]) -> Uuid {
        let mut guard = self.inner.lock().unwrap();
        let registry = &mut guard.0;
        let election = registry
            .create_election(NewElection {
                title: title.into(),
                ..Default::default()
            })
            .unwrap();
        for (name, votes) in candidates {
            registry
                .add_candidate(
                    election.election_id,
                    NewCandidate {
                        leader_name: name.to_string(),
                        votes_count: Some(*votes),
                        ..Default::default()
                    },
                )
                .unwrap();
        }
        election.election_id
    }

    /// Cast a vote for the voter in a separate election
    pub fn mark_voted(&self, code: &str) {
        let election_id = self.seed_election("Earlier poll", &[("Someone", 0)]);
        let mut guard = self.inner.lock().unwrap();
        let (registry, sink) = &mut *guard;
        let candidate_id = registry.store().require_election(election_id).unwrap().candidates[0].candidate_id;
        registry
            .cast_vote(code, election_id, candidate_id, now(), &*sink)
            .unwrap();
    }
}

impl Backend for LocalBackend {
    fn admin_login(&self, username: &str, password: &str) -> Result<String, ApiError> {
        self.with("admin_login", |r, _| r.admin_login(username, password))
            .map(|_| "Login successful".to_owned())
    }

    fn create_voter(&self, voter: &NewVoter) -> Result<Voter, ApiError> {
        self.with("create_voter", |r, _| r.create_voter(voter.clone(), now()))
    }

    fn voters(&self) -> Result<Vec<Voter>, ApiError> {
        self.with("voters", |r, _| Ok(r.voters()))
    }

    fn register_templates(&self, voter_code: &str, request: &RegisterTemplateRequest) -> Result<Voter, ApiError> {
        self.with("register_templates", |r, _| r.register_templates(voter_code, request))
    }

    fn create_election(&self, election: &NewElection) -> Result<Election, ApiError> {
        self.with("create_election", |r, _| r.create_election(election.clone()))
    }

    fn add_candidate(&self, election_id: Uuid, candidate: &NewCandidate) -> Result<Candidate, ApiError> {
        self.with("add_candidate", |r, _| r.add_candidate(election_id, candidate.clone()))
    }

    fn elections(&self) -> Result<Vec<Election>, ApiError> {
        self.with("elections", |r, _| Ok(r.elections()))
    }

    fn active_elections(&self) -> Result<Vec<Election>, ApiError> {
        self.with("active_elections", |r, _| Ok(r.active_elections()))
    }

    fn session_key(&self) -> Result<String, ApiError> {
        self.with("session_key", |_, _| Ok(registry::generate_session_key()))
    }

    fn voter_login(&self, voter_code: &str) -> Result<Voter, ApiError> {
        self.with("voter_login", |r, _| r.login_voter(voter_code))
    }

    fn scan_palm(&self, request: &ScanRequest) -> Result<ScanResult, ApiError> {
        let result = self.with("scan_palm", |r, _| r.verify_scan(request))?;
        if !result.verified {
            return Err(ApiError::Status {
                status: 401,
                message: "Palm verification failed".into(),
            });
        }
        Ok(result)
    }

    fn cast_vote(&self, voter_code: &str, election_id: Uuid, candidate_id: Uuid) -> Result<String, ApiError> {
        let ballot = self.with("cast_vote", |r, sink| {
            r.cast_vote(voter_code, election_id, candidate_id, now(), sink)
        })?;
        serde_json::to_string(&ballot.response()).map_err(|e| ApiError::Decode(e.to_string()))
    }

    fn download_vvpat(&self, ballot_id: Uuid) -> Result<Vec<u8>, ApiError> {
        self.with("download_vvpat", |r, sink| r.vvpat(ballot_id, sink).map(|(_, doc)| doc))
    }
}

fn now() -> chrono::NaiveDateTime {
    chrono::Local::now().naive_local()
}

#[test]
fn end_to_end_vote() {
    let backend = LocalBackend::new();
    let mut router = Router::new();

    // Admin signs in
    router.apply(Event::OpenAdmin).unwrap();
    let mut login = AdminLoginScreen {
        username: "admin1".into(),
        password: "admin123".into(),
        ..Default::default()
    };
    router.apply(login.submit(&backend).unwrap()).unwrap();

    // Create a voter with a generated code
    router.apply(Event::Navigate(AdminScreen::CreateVoter)).unwrap();
    let mut form = CreateVoterForm::default();
    form.name = "Asha Rao".into();
    form.mobile = "9000000000".into();
    form.dob = "1990-05-17".into();
    form.generate_code(&mut rand::thread_rng());
    let voter_code = form.submit(&backend).unwrap().voter_code;
    form.tick(admin_flow::VOTER_CREATED_HOLD);
    router.apply(Event::Completed).unwrap();

    // Register both palms from the voter list
    router.apply(Event::Navigate(AdminScreen::VoterList)).unwrap();
    let mut list = VoterListScreen::default();
    list.load(&backend);
    let (event, mut palm) = list.register_palm(&voter_code);
    router.apply(event).unwrap();
    palm.capture(Hand::Left, &MockCapture);
    palm.capture(Hand::Right, &MockCapture);
    assert!(palm.register(&backend).unwrap().palm_registered());
    router.apply(Event::Completed).unwrap();
    router.apply(Event::Back).unwrap();

    // Open an election with three candidates
    router.apply(Event::Navigate(AdminScreen::CreateElection)).unwrap();
    let mut election_form = CreateElectionForm {
        title: "Municipal Corporation 2025".into(),
        ..Default::default()
    };
    for (name, party) in &[
        ("Rajesh Kumar", "Progressive Party"),
        ("Priya Sharma", "National Alliance"),
        ("Amit Patel", "People's Front"),
    ] {
        let row = election_form.add_candidate_row();
        row.leader_name = name.to_string();
        row.party_name = party.to_string();
    }
    let election = election_form.submit(&backend).unwrap();
    router.apply(Event::Completed).unwrap();

    let mut dashboard = DashboardScreen::default();
    dashboard.refresh(&backend);
    let overview = dashboard.overview.clone().unwrap();
    assert_eq!(overview.palm_registered, 1);
    assert_eq!(overview.active_elections, 1);

    router.apply(Event::Exit).unwrap();

    // The voter walks through the booth
    router.apply(Event::OpenVoter).unwrap();
    let mut voter_login = VoterLoginScreen {
        voter_code: voter_code.clone(),
        ..Default::default()
    };
    router.apply(voter_login.submit(&backend).unwrap()).unwrap();

    let mut qkd = QkdSessionScreen::default();
    qkd.establish(&backend);
    let event = loop {
        if let Some(event) = qkd.tick() {
            break event;
        }
    };
    assert_eq!(router.apply(event).unwrap(), Mode::Voter(VoterScreen::PalmScan));

    let session_key = qkd.session_key.clone().unwrap();
    let mut scan = PalmScanScreen::new(&voter_code, &session_key);
    router.apply(scan.scan(&backend, &MockCapture).unwrap()).unwrap();
    router.apply(Event::Proceed).unwrap();

    let mut selection = CandidateSelectionScreen::default();
    selection.load(&backend);
    let choice = election.candidates[2].candidate_id;
    selection.select(choice);
    let event = selection
        .confirm(&backend, &voter_code, now(), &mut rand::thread_rng())
        .unwrap();
    assert_eq!(router.apply(event).unwrap(), Mode::Voter(VoterScreen::VoteSuccess));

    let receipt = selection.receipt.clone().unwrap();
    assert!(!receipt.fabricated);
    assert_eq!(receipt.candidate.party_name, "People's Front");
    let mut success = VoteSuccessScreen::new(receipt);
    let doc = String::from_utf8(success.download_vvpat(&backend).unwrap()).unwrap();
    assert!(doc.contains(&format!("Voter Code: {}", voter_code)));
    assert!(doc.contains("Election: Municipal Corporation 2025"));

    // Back at the landing page a second attempt is refused at login
    router.apply(Event::Exit).unwrap();
    router.apply(Event::OpenVoter).unwrap();
    let mut again = VoterLoginScreen {
        voter_code: voter_code.clone(),
        ..Default::default()
    };
    assert!(again.submit(&backend).is_none());
    assert_eq!(again.state.error.as_deref(), Some(voter_flow::ALREADY_VOTED));

    // Results show the single ballot
    let mut results = ResultsScreen::default();
    results.load(&backend);
    let standings = results.standings().unwrap();
    assert_eq!(standings.total_votes, 1);
    assert_eq!(standings.winner().unwrap().leader_name, "Amit Patel");
    assert_eq!(standings.rows[0].percentage, 100.0);
}

#[test]
fn concurrent_votes_count_once() {
    let backend = LocalBackend::new();
    backend.seed_voter("V1");
    let election_id = backend.seed_election("Ward 7", &[("A", 0), ("B", 0)]);
    let candidates: Vec<Uuid> = backend
        .elections()
        .unwrap()
        .into_iter()
        .flat_map(|e| e.candidates)
        .map(|c| c.candidate_id)
        .collect();

    let accepted = std::thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let backend = &backend;
                let candidate_id = candidates[i % 2];
                s.spawn(move || backend.cast_vote("V1", election_id, candidate_id).is_ok())
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count()
    });
    assert_eq!(accepted, 1);

    let total: u64 = backend
        .elections()
        .unwrap()
        .iter()
        .map(Election::total_votes)
        .sum();
    assert_eq!(total, 1);
    assert!(backend.voter_login("V1").unwrap().has_voted);
}

#[test]
fn mock_scan_of_the_other_hand_is_rejected() {
    let backend = LocalBackend::new();
    backend.seed_voter("V9");
    backend.register_left("V9");

    let key = TemplateKey::generate().to_base64();
    let raw = base64::decode(&MockCapture.capture(Hand::Right, "V9").unwrap()).unwrap();
    let sealed = crypto::seal(&TemplateKey::from_base64(&key).unwrap(), &raw).unwrap();
    let err = backend
        .scan_palm(&ScanRequest {
            voter_code: "V9".into(),
            encrypted_template: sealed,
            session_key: Some(key),
        })
        .unwrap_err();
    assert_eq!(err.status(), Some(401));
}
