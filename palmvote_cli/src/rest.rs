use palmvote::*;
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use uuid::Uuid;

/// `Backend` over HTTP
pub struct RestClient {
    base_uri: String,
    client: Client,
}

impl RestClient {
    pub fn new(base_uri: &str) -> Self {
        RestClient {
            base_uri: base_uri.trim_end_matches('/').to_owned(),
            client: Client::new(),
        }
    }

    pub fn url(&self, endpoint: &Endpoint) -> String {
        format!("{}{}", self.base_uri, endpoint.path())
    }

    fn request(&self, endpoint: &Endpoint) -> RequestBuilder {
        let url = self.url(endpoint);
        log::debug!("{:?} {}", endpoint.method(), url);

        let builder = match endpoint.method() {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
        };
        let query = endpoint.query();
        if query.is_empty() {
            builder
        } else {
            builder.query(&query)
        }
    }

    fn send(&self, builder: RequestBuilder) -> Result<Body, ApiError> {
        let res = builder.send().map_err(transport)?;
        let status = res.status().as_u16();
        let content_type = res
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let bytes = res.bytes().map_err(transport)?;

        normalize(status, content_type.as_deref(), &bytes)
    }

    fn call(&self, endpoint: Endpoint) -> Result<Body, ApiError> {
        self.send(self.request(&endpoint))
    }

    fn call_json<T: Serialize + ?Sized>(&self, endpoint: Endpoint, body: &T) -> Result<Body, ApiError> {
        self.send(self.request(&endpoint).json(body))
    }
}

fn transport(e: reqwest::Error) -> ApiError {
    ApiError::Transport(e.to_string())
}

impl Backend for RestClient {
    fn admin_login(&self, username: &str, password: &str) -> Result<String, ApiError> {
        let login = AdminLogin {
            username: username.to_owned(),
            password: password.to_owned(),
        };
        Ok(self.call_json(Endpoint::AdminLogin, &login)?.text())
    }

    fn create_voter(&self, voter: &NewVoter) -> Result<Voter, ApiError> {
        self.call_json(Endpoint::CreateVoter, voter)?.json()
    }

    fn voters(&self) -> Result<Vec<Voter>, ApiError> {
        self.call(Endpoint::Voters)?.json()
    }

    fn register_templates(&self, voter_code: &str, request: &RegisterTemplateRequest) -> Result<Voter, ApiError> {
        self.call_json(Endpoint::RegisterTemplates { voter_code }, request)?
            .json()
    }

    fn create_election(&self, election: &NewElection) -> Result<Election, ApiError> {
        self.call_json(Endpoint::CreateElection, election)?.json()
    }

    fn add_candidate(&self, election_id: Uuid, candidate: &NewCandidate) -> Result<Candidate, ApiError> {
        self.call_json(Endpoint::AddCandidate { election_id }, candidate)?
            .json()
    }

    fn elections(&self) -> Result<Vec<Election>, ApiError> {
        self.call(Endpoint::Elections)?.json()
    }

    fn active_elections(&self) -> Result<Vec<Election>, ApiError> {
        self.call(Endpoint::ActiveElections)?.json()
    }

    fn session_key(&self) -> Result<String, ApiError> {
        Ok(self.call(Endpoint::SessionKey)?.text())
    }

    fn voter_login(&self, voter_code: &str) -> Result<Voter, ApiError> {
        self.call(Endpoint::VoterLogin { voter_code })?.json()
    }

    fn scan_palm(&self, request: &ScanRequest) -> Result<ScanResult, ApiError> {
        self.call_json(Endpoint::Scan, request)?.json()
    }

    fn cast_vote(&self, voter_code: &str, election_id: Uuid, candidate_id: Uuid) -> Result<String, ApiError> {
        let endpoint = Endpoint::CastVote {
            voter_code,
            election_id,
            candidate_id,
        };
        Ok(self.call(endpoint)?.text())
    }

    fn download_vvpat(&self, ballot_id: Uuid) -> Result<Vec<u8>, ApiError> {
        let res = self
            .request(&Endpoint::Vvpat { ballot_id })
            .send()
            .map_err(transport)?;

        let status = res.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: "Failed to download VVPAT".to_owned(),
            });
        }
        Ok(res.bytes().map_err(transport)?.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_join_base_and_path() {
        let client = RestClient::new("http://localhost:8080/");
        assert_eq!(client.url(&Endpoint::Voters), "http://localhost:8080/api/admin/voters");

        let ballot_id = Uuid::new_v4();
        assert_eq!(
            client.url(&Endpoint::Vvpat { ballot_id }),
            format!("http://localhost:8080/api/voter/ballot/{}/vvp", ballot_id)
        );
    }

    #[test]
    fn unreachable_backend_is_a_transport_error() {
        let client = RestClient::new("http://127.0.0.1:9");
        assert!(matches!(client.session_key(), Err(ApiError::Transport(_))));
    }
}
