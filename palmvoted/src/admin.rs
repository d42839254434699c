use crate::error::{ApiResult, Failure};
use crate::Daemon;
use palmvote::*;
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::State;
use uuid::Uuid;

#[post("/api/admin/login", data = "<login>")]
pub fn login(daemon: &State<Daemon>, login: Json<AdminLogin>) -> ApiResult<&'static str> {
    daemon
        .registry()
        .admin_login(&login.username, &login.password)?;
    Ok("Login successful")
}

#[post("/api/admin/voters", data = "<voter>")]
pub fn create_voter(daemon: &State<Daemon>, voter: Json<NewVoter>) -> ApiResult<Json<Voter>> {
    let voter = daemon.registry().create_voter(voter.into_inner(), now())?;
    Ok(Json(voter))
}

#[get("/api/admin/voters")]
pub fn voters(daemon: &State<Daemon>) -> Json<Vec<Voter>> {
    Json(daemon.registry().voters())
}

#[post("/api/admin/voters/<voter_code>/register-template", data = "<request>")]
pub fn register_template(
    daemon: &State<Daemon>,
    voter_code: &str,
    request: Json<RegisterTemplateRequest>,
) -> ApiResult<Json<Voter>> {
    match daemon.registry().register_templates(voter_code, &request) {
        Ok(voter) => Ok(Json(voter)),
        Err(e @ ValidationError::VoterNotFound) => Err(Failure::new(Status::BadRequest, e.to_string())),
        Err(e) => Err(e.into()),
    }
}

#[post("/api/admin/elections", data = "<election>")]
pub fn create_election(daemon: &State<Daemon>, election: Json<NewElection>) -> ApiResult<Json<Election>> {
    let election = daemon.registry().create_election(election.into_inner())?;
    Ok(Json(election))
}

#[post("/api/admin/elections/<election_id>/candidates", data = "<candidate>")]
pub fn add_candidate(
    daemon: &State<Daemon>,
    election_id: Uuid,
    candidate: Json<NewCandidate>,
) -> ApiResult<Json<Candidate>> {
    let candidate = daemon
        .registry()
        .add_candidate(election_id, candidate.into_inner())?;
    Ok(Json(candidate))
}

#[get("/api/admin/elections")]
pub fn elections(daemon: &State<Daemon>) -> Json<Vec<Election>> {
    Json(daemon.registry().elections())
}

pub(crate) fn now() -> chrono::NaiveDateTime {
    chrono::Local::now().naive_local()
}
