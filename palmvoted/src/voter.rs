use crate::admin::now;
use crate::error::{ApiResult, Failure};
use crate::Daemon;
use palmvote::*;
use rocket::http::{Header, Status};
use rocket::response::status::Custom;
use rocket::serde::json::Json;
use rocket::State;
use serde::Serialize;
use std::io::ErrorKind;
use uuid::Uuid;

#[derive(FromForm)]
pub struct VoterCode {
    #[field(name = "voterCode")]
    voter_code: String,
}

#[derive(FromForm)]
pub struct VoteParams {
    #[field(name = "voterCode")]
    voter_code: String,

    #[field(name = "electionId")]
    election_id: Uuid,

    #[field(name = "candidateId")]
    candidate_id: Uuid,
}

/// Scan outcome; rejections also carry a message for the banner
#[derive(Serialize, Debug)]
pub struct ScanReply {
    verified: bool,
    score: f64,

    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

#[derive(Responder)]
#[response(content_type = "text/plain")]
pub struct VvpatDocument {
    body: Vec<u8>,
    disposition: Header<'static>,
}

#[get("/api/voter/elections")]
pub fn active_elections(daemon: &State<Daemon>) -> Json<Vec<Election>> {
    Json(daemon.registry().active_elections())
}

#[get("/api/security/qkd/session-key")]
pub fn session_key() -> String {
    generate_session_key()
}

#[post("/api/voter/login?<params..>")]
pub fn login(daemon: &State<Daemon>, params: VoterCode) -> ApiResult<Json<Voter>> {
    let voter = daemon.registry().login_voter(&params.voter_code)?;
    Ok(Json(voter))
}

#[post("/api/voter/scan", data = "<request>")]
pub fn scan(daemon: &State<Daemon>, request: Json<ScanRequest>) -> ApiResult<Custom<Json<ScanReply>>> {
    let result = daemon.registry().verify_scan(&request)?;

    let (status, message) = if result.verified {
        (Status::Ok, None)
    } else {
        (Status::Unauthorized, Some("Palm verification failed".to_owned()))
    };
    Ok(Custom(
        status,
        Json(ScanReply {
            verified: result.verified,
            score: result.score,
            message,
        }),
    ))
}

#[post("/api/voter/vote?<params..>")]
pub fn vote(daemon: &State<Daemon>, params: VoteParams) -> ApiResult<Json<VoteResponse>> {
    let ballot = daemon.registry().cast_vote(
        &params.voter_code,
        params.election_id,
        params.candidate_id,
        now(),
        &daemon.receipts,
    )?;
    Ok(Json(ballot.response()))
}

#[get("/api/voter/ballot/<ballot_id>/vvp")]
pub fn vvpat(daemon: &State<Daemon>, ballot_id: Uuid) -> ApiResult<VvpatDocument> {
    let (ballot, body) = match daemon.registry().vvpat(ballot_id, &daemon.receipts) {
        Ok(found) => found,
        Err(ValidationError::ReceiptFailed(Error::Io(e))) if e.kind() == ErrorKind::NotFound => {
            return Err(Failure::new(Status::NotFound, "VVPAT file missing"));
        }
        Err(e) => return Err(e.into()),
    };

    let disposition = format!("attachment; filename={}", VvpatDir::file_name(&ballot));
    Ok(VvpatDocument {
        body,
        disposition: Header::new("Content-Disposition", disposition),
    })
}
