use palmvote::{RegistrySettings, DEFAULT_MATCH_THRESHOLD};
use std::env::var;
use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub admin_username: String,
    pub admin_password: String,
    pub match_threshold: f64,
    pub vvpat_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            admin_username: "admin1".to_owned(),
            admin_password: "admin123".to_owned(),
            match_threshold: DEFAULT_MATCH_THRESHOLD,
            vvpat_dir: PathBuf::from("./vvpat"),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Config::default();

        let admin_username = match var("PALMVOTE_ADMIN_USERNAME") {
            Ok(val) => val,
            Err(_e) => defaults.admin_username,
        };

        let admin_password = match var("PALMVOTE_ADMIN_PASSWORD") {
            Ok(val) => val,
            Err(_e) => defaults.admin_password,
        };

        let match_threshold = match var("PALMVOTE_MATCH_THRESHOLD") {
            Ok(val) => match parse_threshold(&val) {
                Some(threshold) => threshold,
                None => panic!("PALMVOTE_MATCH_THRESHOLD must be a number between 0 and 1"),
            },
            Err(_e) => defaults.match_threshold,
        };

        let vvpat_dir = match var("PALMVOTE_VVPAT_DIR") {
            Ok(val) => PathBuf::from(val),
            Err(_e) => defaults.vvpat_dir,
        };

        Config {
            admin_username,
            admin_password,
            match_threshold,
            vvpat_dir,
        }
    }

    pub fn settings(&self) -> RegistrySettings {
        RegistrySettings {
            admin_username: self.admin_username.clone(),
            admin_password: self.admin_password.clone(),
            match_threshold: self.match_threshold,
        }
    }
}

fn parse_threshold(val: &str) -> Option<f64> {
    val.trim()
        .parse::<f64>()
        .ok()
        .filter(|t| (0.0..=1.0).contains(t))
}
