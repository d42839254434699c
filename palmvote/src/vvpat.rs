//! Voter-verified paper audit trail: one plain-text receipt per ballot.

use crate::*;
use std::fs;
use std::path::{Path, PathBuf};

pub const VVPAT_TITLE: &str = "VVPAT - Quantum-Secured Palm Vein Voting";

/// Render the receipt document for a ballot
pub fn render(ballot: &Ballot, voter: &Voter, election: &Election, candidate: &Candidate) -> String {
    let lines = [
        VVPAT_TITLE.to_owned(),
        String::new(),
        format!("Ballot ID: {}", ballot.ballot_id),
        format!("Voter: {}", voter.name),
        format!("Voter Code: {}", voter.voter_code),
        format!("Election: {}", election.title),
        format!("Candidate: {}", candidate.leader_name),
        format!("Party: {}", candidate.party_name),
        format!("City: {}", candidate.city),
        format!("Timestamp: {}", ballot.cast_at.format("%Y-%m-%dT%H:%M:%S%.f")),
        String::new(),
        "QKD-Secured Audit Hash Included".to_owned(),
    ];
    let mut doc = lines.join("\n");
    doc.push('\n');
    doc
}

/// Where receipts go once a ballot is accepted
pub trait ReceiptSink {
    /// Persist `document` for `ballot`, returning its location
    fn store(&self, ballot: &Ballot, document: &str) -> Result<String, Error>;

    /// Read a previously stored receipt back
    fn load(&self, location: &str) -> Result<Vec<u8>, Error>;
}

/// Receipts written as `<dir>/<ballotId>.txt`
#[derive(Debug, Clone)]
pub struct VvpatDir {
    dir: PathBuf,
}

impl VvpatDir {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        VvpatDir { dir: dir.into() }
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    pub fn file_name(ballot: &Ballot) -> String {
        format!("{}.txt", ballot.ballot_id)
    }
}

impl ReceiptSink for VvpatDir {
    fn store(&self, ballot: &Ballot, document: &str) -> Result<String, Error> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(Self::file_name(ballot));
        fs::write(&path, document)?;

        let path = fs::canonicalize(&path).unwrap_or(path);
        Ok(path.to_string_lossy().into_owned())
    }

    fn load(&self, location: &str) -> Result<Vec<u8>, Error> {
        Ok(fs::read(location)?)
    }
}
