use crate::*;
use chrono::NaiveDateTime;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// A registered voter.
///
/// Sealed palm templates and the template key stay on the backend: they are
/// never serialized, so a voter fetched over the API carries only the
/// registration flags.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Voter {
    pub voter_id: Uuid,
    pub voter_code: String,
    pub name: String,

    #[serde(default)]
    pub mobile: Option<String>,

    #[serde(default, with = "serde_datetime::optional")]
    pub dob: Option<NaiveDateTime>,

    #[serde(default, with = "serde_datetime::optional")]
    pub registered_at: Option<NaiveDateTime>,

    #[serde(default)]
    pub left_registered: bool,

    #[serde(default)]
    pub right_registered: bool,

    #[serde(default)]
    pub has_voted: bool,

    #[serde(default, with = "serde_datetime::optional")]
    pub last_voted_at: Option<NaiveDateTime>,

    #[serde(skip)]
    pub templates: PalmTemplates,
}

impl Voter {
    pub fn new(new: NewVoter, now: NaiveDateTime) -> Self {
        Voter {
            voter_id: Uuid::new_v4(),
            voter_code: new.voter_code.trim().to_owned(),
            name: new.name.trim().to_owned(),
            mobile: new.mobile.filter(|m| !m.trim().is_empty()),
            dob: new.dob,
            registered_at: Some(now),
            left_registered: false,
            right_registered: false,
            has_voted: false,
            last_voted_at: None,
            templates: PalmTemplates::default(),
        }
    }

    /// True when at least one hand has a stored template
    pub fn palm_registered(&self) -> bool {
        self.left_registered || self.right_registered
    }
}

/// Body of a create-voter request
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewVoter {
    #[serde(default)]
    pub voter_code: String,

    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mobile: Option<String>,

    #[serde(default, with = "serde_datetime::optional")]
    pub dob: Option<NaiveDateTime>,
}

impl NewVoter {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.voter_code.trim().is_empty() {
            return Err(ValidationError::MissingField("voterCode"));
        }
        if self.name.trim().is_empty() {
            return Err(ValidationError::MissingField("name"));
        }
        Ok(())
    }
}

/// Sealed templates and the key they are sealed with.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PalmTemplates {
    /// `base64(nonce || ciphertext)` of the left-hand template
    pub left: Option<String>,
    pub right: Option<String>,
    pub key: Option<TemplateKey>,
}

impl PalmTemplates {
    pub fn sealed(&self) -> impl Iterator<Item = &String> {
        self.left.iter().chain(self.right.iter())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Hand {
    Left,
    Right,
}

impl Hand {
    pub fn as_str(&self) -> &'static str {
        match self {
            Hand::Left => "left",
            Hand::Right => "right",
        }
    }
}

impl fmt::Display for Hand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Hand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" => Ok(Hand::Left),
            "right" => Ok(Hand::Right),
            _ => Err("hand must be left/right".to_owned()),
        }
    }
}
