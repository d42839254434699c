use crate::*;
use chrono::NaiveDateTime;
use log::{info, warn};
use uuid::Uuid;

/// Backend settings the registry enforces
#[derive(Debug, Clone, PartialEq)]
pub struct RegistrySettings {
    pub admin_username: String,
    pub admin_password: String,

    /// Minimum similarity for a palm scan to verify
    pub match_threshold: f64,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        RegistrySettings {
            admin_username: "admin1".to_owned(),
            admin_password: "admin123".to_owned(),
            match_threshold: DEFAULT_MATCH_THRESHOLD,
        }
    }
}

/// The backend's voter, election and ballot bookkeeping.
///
/// Every operation takes `&mut self` or `&self` on one registry, so a caller
/// that shares it behind a lock gets each operation as one atomic step.
#[derive(Debug, Clone)]
pub struct Registry<S: Store> {
    store: S,
    settings: RegistrySettings,
}

impl<S: Store> Registry<S> {
    pub fn new(store: S, settings: RegistrySettings) -> Self {
        Registry { store, settings }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn settings(&self) -> &RegistrySettings {
        &self.settings
    }

    pub fn admin_login(&self, username: &str, password: &str) -> Result<(), ValidationError> {
        if username == self.settings.admin_username && password == self.settings.admin_password {
            Ok(())
        } else {
            warn!("rejected admin login for {:?}", username);
            Err(ValidationError::InvalidCredentials)
        }
    }

    /// Create a voter. An existing voter with the same code is returned
    /// unchanged.
    pub fn create_voter(&mut self, new: NewVoter, now: NaiveDateTime) -> Result<Voter, ValidationError> {
        new.validate()?;
        if let Some(existing) = self.store.get_voter(&new.voter_code) {
            return Ok(existing);
        }

        let voter = Voter::new(new, now);
        info!("created voter {}", voter.voter_code);
        self.store.put_voter(voter.clone());
        Ok(voter)
    }

    pub fn voters(&self) -> Vec<Voter> {
        self.store.voters()
    }

    /// Seal and store a voter's palm templates.
    ///
    /// Templates are sealed under the voter's stored key when there is one;
    /// otherwise under the supplied session key, or a fresh key, which then
    /// becomes the voter's key.
    pub fn register_templates(
        &mut self,
        voter_code: &str,
        request: &RegisterTemplateRequest,
    ) -> Result<Voter, ValidationError> {
        let mut voter = self.store.require_voter(voter_code)?;

        let key = match (voter.templates.key, non_blank(&request.session_key)) {
            (Some(key), _) => key,
            (None, Some(encoded)) => {
                TemplateKey::from_base64(encoded).map_err(ValidationError::InvalidTemplate)?
            }
            (None, None) => TemplateKey::generate(),
        };

        if let Some(left) = non_blank(&request.left_template) {
            voter.templates.left = Some(seal_template(&key, left)?);
            voter.left_registered = true;
        }
        if let Some(right) = non_blank(&request.right_template) {
            voter.templates.right = Some(seal_template(&key, right)?);
            voter.right_registered = true;
        }
        voter.templates.key.get_or_insert(key);

        info!(
            "registered palm templates for {} (left: {}, right: {})",
            voter.voter_code, voter.left_registered, voter.right_registered
        );
        self.store.put_voter(voter.clone());
        Ok(voter)
    }

    pub fn create_election(&mut self, new: NewElection) -> Result<Election, ValidationError> {
        new.validate()?;
        let election = Election::new(new);
        info!("created election {} ({})", election.title, election.election_id);
        self.store.put_election(election.clone());
        Ok(election)
    }

    pub fn add_candidate(&mut self, election_id: Uuid, new: NewCandidate) -> Result<Candidate, ValidationError> {
        let mut election = self.store.require_election(election_id)?;
        if new.leader_name.trim().is_empty() {
            return Err(ValidationError::MissingField("leaderName"));
        }

        let candidate: Candidate = new.into();
        election.candidates.push(candidate.clone());
        self.store.put_election(election);
        Ok(candidate)
    }

    pub fn elections(&self) -> Vec<Election> {
        self.store.elections()
    }

    pub fn active_elections(&self) -> Vec<Election> {
        self.store.active_elections()
    }

    pub fn login_voter(&self, voter_code: &str) -> Result<Voter, ValidationError> {
        self.store.require_voter(voter_code)
    }

    /// Score a palm scan against the voter's registered templates
    pub fn verify_scan(&self, request: &ScanRequest) -> Result<ScanResult, ValidationError> {
        let voter = self.store.require_voter(&request.voter_code)?;

        let session_key = match non_blank(&request.session_key) {
            Some(encoded) => match TemplateKey::from_base64(encoded) {
                Ok(key) => Some(key),
                Err(_) => {
                    return Ok(ScanResult {
                        verified: false,
                        score: 0.0,
                    })
                }
            },
            None => None,
        };

        let score = matching::score_scan(&voter.templates, &request.encrypted_template, session_key.as_ref());
        let verified = score >= self.settings.match_threshold;
        info!(
            "palm scan for {}: score {:.3}, verified {}",
            voter.voter_code, score, verified
        );
        Ok(ScanResult { verified, score })
    }

    /// Cast a ballot.
    ///
    /// All checks run before anything is written; the receipt is stored
    /// before the ballot, the vote count and the voter are committed, so a
    /// failed receipt write leaves the registry untouched.
    pub fn cast_vote(
        &mut self,
        voter_code: &str,
        election_id: Uuid,
        candidate_id: Uuid,
        now: NaiveDateTime,
        receipts: &dyn ReceiptSink,
    ) -> Result<Ballot, ValidationError> {
        let mut voter = self.store.require_voter(voter_code)?;
        let mut election = self.store.require_election(election_id)?;

        if !election.is_active() {
            return Err(ValidationError::ElectionNotActive(election_id));
        }
        let candidate = election
            .get_candidate(candidate_id)
            .cloned()
            .ok_or(ValidationError::CandidateNotInElection(candidate_id, election_id))?;
        if self.store.has_ballot(voter.voter_id, election_id) {
            warn!("{} tried to vote twice in {}", voter.voter_code, election_id);
            return Err(ValidationError::AlreadyVoted);
        }

        let mut ballot = Ballot::new(&voter, election_id, candidate_id, now);
        let document = vvpat::render(&ballot, &voter, &election, &candidate);
        let location = receipts
            .store(&ballot, &document)
            .map_err(ValidationError::ReceiptFailed)?;
        ballot.vvp_generated = true;
        ballot.vvp_path = Some(location);
        ballot.audit_hash = Some(ballot.compute_audit_hash(voter.templates.key.as_ref()));

        if let Some(candidate) = election.get_candidate_mut(candidate_id) {
            candidate.votes_count += 1;
        }
        voter.has_voted = true;
        voter.last_voted_at = Some(now);

        self.store.put_election(election);
        self.store.put_voter(voter);
        self.store.put_ballot(ballot.clone());

        info!("ballot {} cast in election {}", ballot.ballot_id, election_id);
        Ok(ballot)
    }

    /// The stored VVPAT receipt of a ballot
    pub fn vvpat(&self, ballot_id: Uuid, receipts: &dyn ReceiptSink) -> Result<(Ballot, Vec<u8>), ValidationError> {
        let ballot = self
            .store
            .get_ballot(ballot_id)
            .ok_or(ValidationError::BallotNotFound)?;

        let location = match (&ballot.vvp_path, ballot.vvp_generated) {
            (Some(location), true) => location.clone(),
            _ => return Err(ValidationError::VvpatNotGenerated),
        };
        let bytes = receipts
            .load(&location)
            .map_err(ValidationError::ReceiptFailed)?;
        Ok((ballot, bytes))
    }
}

/// A fresh base64 session key
pub fn generate_session_key() -> String {
    TemplateKey::generate().to_base64()
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn seal_template(key: &TemplateKey, encoded: &str) -> Result<String, ValidationError> {
    let raw = base64::decode(encoded)
        .map_err(|e| ValidationError::InvalidTemplate(Error::Base64(e)))?;
    crypto::seal(key, &raw).map_err(ValidationError::InvalidTemplate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vvpat::tests::MemSink;

    fn now() -> NaiveDateTime {
        serde_datetime::parse_local("2025-03-01T09:00:00").unwrap()
    }

    fn registry() -> Registry<MemStore> {
        Registry::new(MemStore::default(), RegistrySettings::default())
    }

    fn new_voter(code: &str) -> NewVoter {
        NewVoter {
            voter_code: code.into(),
            name: format!("Voter {}", code),
            mobile: Some("9000000000".into()),
            dob: serde_datetime::parse_local("1990-01-01"),
        }
    }

    fn election_with_candidates(registry: &mut Registry<MemStore>) -> (Election, Candidate, Candidate) {
        let election = registry
            .create_election(NewElection {
                title: "Ward 7".into(),
                ..Default::default()
            })
            .unwrap();
        let a = registry
            .add_candidate(
                election.election_id,
                NewCandidate {
                    leader_name: "Rajesh Kumar".into(),
                    party_name: "Progressive Party".into(),
                    city: "Mumbai".into(),
                    votes_count: None,
                },
            )
            .unwrap();
        let b = registry
            .add_candidate(
                election.election_id,
                NewCandidate {
                    leader_name: "Priya Sharma".into(),
                    ..Default::default()
                },
            )
            .unwrap();
        (election, a, b)
    }

    #[test]
    fn admin_login_checks_credentials() {
        let registry = registry();
        assert!(registry.admin_login("admin1", "admin123").is_ok());
        assert!(matches!(
            registry.admin_login("admin1", "nope"),
            Err(ValidationError::InvalidCredentials)
        ));
    }

    #[test]
    fn create_voter_is_idempotent_on_code() {
        let mut registry = registry();
        let first = registry.create_voter(new_voter("V1"), now()).unwrap();

        let mut again = new_voter("V1");
        again.name = "Someone Else".into();
        let second = registry.create_voter(again, now()).unwrap();

        assert_eq!(first.voter_id, second.voter_id);
        assert_eq!(second.name, "Voter V1");
        assert_eq!(registry.voters().len(), 1);
        assert!(registry.create_voter(NewVoter::default(), now()).is_err());
    }

    #[test]
    fn register_then_scan() {
        let mut registry = registry();
        registry.create_voter(new_voter("V1"), now()).unwrap();

        let left = mock::palm_template_for("V1", Hand::Left);
        let session = TemplateKey::generate();
        let voter = registry
            .register_templates(
                "V1",
                &RegisterTemplateRequest {
                    left_template: Some(left.clone()),
                    right_template: Some("  ".into()),
                    session_key: Some(session.to_base64()),
                },
            )
            .unwrap();
        assert!(voter.left_registered);
        assert!(!voter.right_registered);
        assert_eq!(voter.templates.key, Some(session));

        // Matching hand under a fresh session key
        let scan_key = TemplateKey::generate();
        let raw = base64::decode(&left).unwrap();
        let result = registry
            .verify_scan(&ScanRequest {
                voter_code: "V1".into(),
                encrypted_template: crypto::seal(&scan_key, &raw).unwrap(),
                session_key: Some(scan_key.to_base64()),
            })
            .unwrap();
        assert!(result.verified);
        assert!(result.score > 0.999);

        // The other hand was never registered
        let right = base64::decode(&mock::palm_template_for("V1", Hand::Right)).unwrap();
        let result = registry
            .verify_scan(&ScanRequest {
                voter_code: "V1".into(),
                encrypted_template: crypto::seal(&session, &right).unwrap(),
                session_key: None,
            })
            .unwrap();
        assert!(!result.verified);
        assert!(result.score < DEFAULT_MATCH_THRESHOLD);

        assert!(matches!(
            registry.verify_scan(&ScanRequest {
                voter_code: "V404".into(),
                encrypted_template: String::new(),
                session_key: None,
            }),
            Err(ValidationError::VoterNotFound)
        ));
    }

    #[test]
    fn re_registration_keeps_the_first_key() {
        let mut registry = registry();
        registry.create_voter(new_voter("V1"), now()).unwrap();

        let first = registry
            .register_templates(
                "V1",
                &RegisterTemplateRequest {
                    left_template: Some(mock::palm_template_for("V1", Hand::Left)),
                    ..Default::default()
                },
            )
            .unwrap();
        let second = registry
            .register_templates(
                "V1",
                &RegisterTemplateRequest {
                    right_template: Some(mock::palm_template_for("V1", Hand::Right)),
                    session_key: Some(TemplateKey::generate().to_base64()),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(first.templates.key, second.templates.key);
        assert!(second.left_registered && second.right_registered);
    }

    #[test]
    fn register_rejects_bad_input() {
        let mut registry = registry();
        assert!(matches!(
            registry.register_templates("V404", &RegisterTemplateRequest::default()),
            Err(ValidationError::VoterNotFound)
        ));

        registry.create_voter(new_voter("V1"), now()).unwrap();
        assert!(matches!(
            registry.register_templates(
                "V1",
                &RegisterTemplateRequest {
                    left_template: Some("%%%".into()),
                    ..Default::default()
                }
            ),
            Err(ValidationError::InvalidTemplate(_))
        ));
        assert!(matches!(
            registry.register_templates(
                "V1",
                &RegisterTemplateRequest {
                    left_template: Some("AAEC".into()),
                    session_key: Some(base64::encode(&[0u8; 8])),
                    ..Default::default()
                }
            ),
            Err(ValidationError::InvalidTemplate(Error::KeyLength(8)))
        ));
    }

    #[test]
    fn candidates_need_an_election() {
        let mut registry = registry();
        assert!(matches!(
            registry.add_candidate(Uuid::new_v4(), NewCandidate::default()),
            Err(ValidationError::ElectionNotFound)
        ));
        assert!(matches!(
            registry.create_election(NewElection::default()),
            Err(ValidationError::TitleRequired)
        ));
    }

    #[test]
    fn cast_vote_once_per_election() {
        let mut registry = registry();
        let sink = MemSink::default();
        registry.create_voter(new_voter("V1"), now()).unwrap();
        registry
            .register_templates(
                "V1",
                &RegisterTemplateRequest {
                    left_template: Some(mock::palm_template_for("V1", Hand::Left)),
                    ..Default::default()
                },
            )
            .unwrap();
        let (election, a, b) = election_with_candidates(&mut registry);

        let ballot = registry
            .cast_vote("V1", election.election_id, a.candidate_id, now(), &sink)
            .unwrap();
        assert!(ballot.vvp_generated);
        let key = registry.login_voter("V1").unwrap().templates.key;
        assert_eq!(
            ballot.audit_hash.as_deref(),
            Some(ballot.compute_audit_hash(key.as_ref()).as_str())
        );

        let voter = registry.login_voter("V1").unwrap();
        assert!(voter.has_voted);
        assert_eq!(voter.last_voted_at, Some(now()));

        let stored = registry.store().require_election(election.election_id).unwrap();
        assert_eq!(stored.get_candidate(a.candidate_id).unwrap().votes_count, 1);
        assert_eq!(stored.get_candidate(b.candidate_id).unwrap().votes_count, 0);

        // Second attempt, even for another candidate, is refused
        assert!(matches!(
            registry.cast_vote("V1", election.election_id, b.candidate_id, now(), &sink),
            Err(ValidationError::AlreadyVoted)
        ));
        assert_eq!(registry.store().len_ballots(), 1);

        let (found, doc) = registry.vvpat(ballot.ballot_id, &sink).unwrap();
        assert_eq!(found.ballot_id, ballot.ballot_id);
        assert!(String::from_utf8(doc).unwrap().contains("Candidate: Rajesh Kumar"));
    }

    #[test]
    fn cast_vote_validates_everything_first() {
        let mut registry = registry();
        let sink = MemSink::default();
        registry.create_voter(new_voter("V1"), now()).unwrap();
        let (election, a, _) = election_with_candidates(&mut registry);
        let (other, foreign, _) = election_with_candidates(&mut registry);

        assert!(matches!(
            registry.cast_vote("V404", election.election_id, a.candidate_id, now(), &sink),
            Err(ValidationError::VoterNotFound)
        ));
        assert!(matches!(
            registry.cast_vote("V1", Uuid::new_v4(), a.candidate_id, now(), &sink),
            Err(ValidationError::ElectionNotFound)
        ));
        assert!(matches!(
            registry.cast_vote("V1", election.election_id, foreign.candidate_id, now(), &sink),
            Err(ValidationError::CandidateNotInElection(_, _))
        ));

        let mut closed = registry.store().require_election(other.election_id).unwrap();
        closed.status = ElectionStatus::Closed;
        registry.store.put_election(closed);
        assert!(matches!(
            registry.cast_vote("V1", other.election_id, foreign.candidate_id, now(), &sink),
            Err(ValidationError::ElectionNotActive(_))
        ));

        assert!(!registry.login_voter("V1").unwrap().has_voted);
        assert!(sink.docs.borrow().is_empty());
        assert!(matches!(
            registry.vvpat(Uuid::new_v4(), &sink),
            Err(ValidationError::BallotNotFound)
        ));
    }

    #[test]
    fn vvpat_requires_a_generated_receipt() {
        let mut registry = registry();
        let sink = MemSink::default();
        let voter = registry.create_voter(new_voter("V1"), now()).unwrap();
        let (election, a, _) = election_with_candidates(&mut registry);

        let pending = Ballot::new(&voter, election.election_id, a.candidate_id, now());
        assert!(!pending.vvp_generated);
        registry.store.put_ballot(pending.clone());
        assert!(matches!(
            registry.vvpat(pending.ballot_id, &sink),
            Err(ValidationError::VvpatNotGenerated)
        ));

        let mut unwritten = pending;
        unwritten.vvp_generated = true;
        unwritten.vvp_path = None;
        registry.store.put_ballot(unwritten.clone());
        assert!(matches!(
            registry.vvpat(unwritten.ballot_id, &sink),
            Err(ValidationError::VvpatNotGenerated)
        ));
    }
}
