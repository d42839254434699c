use palmvote::{ApiError, CaptureResponse, Hand, PalmCapture};
use reqwest::blocking::Client;

const CAPTURE_FAILED: &str = "Capture failed.";

/// Client for the local palm capture service
pub struct HttpCapture {
    base_uri: String,
    client: Client,
}

impl HttpCapture {
    pub fn new(base_uri: &str) -> Self {
        HttpCapture {
            base_uri: base_uri.trim_end_matches('/').to_owned(),
            client: Client::new(),
        }
    }
}

impl PalmCapture for HttpCapture {
    fn capture(&self, hand: Hand, voter_code: &str) -> Result<String, ApiError> {
        let url = format!("{}/capture", self.base_uri);
        log::info!("capturing {} hand for {}", hand, voter_code);

        let res = self
            .client
            .get(&url)
            .query(&[("hand", hand.as_str()), ("voterCode", voter_code.trim())])
            .send()
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        let status = res.status().as_u16();
        let body = res
            .bytes()
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        parse_capture(status, &body)
    }
}

/// A capture reply is only good when it is 2xx JSON with status "success"
fn parse_capture(status: u16, body: &[u8]) -> Result<String, ApiError> {
    let reply: Option<CaptureResponse> = serde_json::from_slice(body).ok();
    match reply {
        Some(reply) if (200..300).contains(&status) => reply.into_template(),
        Some(reply) => Err(ApiError::Capture(
            reply.message.unwrap_or_else(|| CAPTURE_FAILED.to_owned()),
        )),
        None => Err(ApiError::Capture(CAPTURE_FAILED.to_owned())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_replies() {
        assert_eq!(
            parse_capture(200, br#"{"status":"success","template":"AAEC","voterCode":"V1"}"#).unwrap(),
            "AAEC"
        );
        assert_eq!(
            parse_capture(200, br#"{"status":"success","rawTemplate":"AAEC"}"#).unwrap(),
            "AAEC"
        );
        assert_eq!(
            parse_capture(500, br#"{"status":"error","message":"camera busy"}"#)
                .unwrap_err()
                .to_string(),
            "camera busy"
        );
        assert_eq!(
            parse_capture(200, b"<html>").unwrap_err().to_string(),
            CAPTURE_FAILED
        );
    }
}
