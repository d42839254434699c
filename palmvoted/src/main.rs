use config::Config;
use palmvote::{MemStore, Registry, VvpatDir};
use rocket::figment::providers::Env;
use rocket::figment::Figment;
use rocket::{Build, Rocket};
use std::sync::{Mutex, MutexGuard};

#[macro_use]
extern crate rocket;

mod admin;
mod config;
mod error;
mod voter;

/// Shared daemon state. The registry lock is held for the whole of each
/// request, so every operation is atomic with respect to the others.
pub struct Daemon {
    registry: Mutex<Registry<MemStore>>,
    pub(crate) receipts: VvpatDir,
}

impl Daemon {
    pub fn new(config: &Config) -> Self {
        Daemon {
            registry: Mutex::new(Registry::new(MemStore::default(), config.settings())),
            receipts: VvpatDir::new(&config.vvpat_dir),
        }
    }

    pub fn registry(&self) -> MutexGuard<'_, Registry<MemStore>> {
        self.registry
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

pub fn build(config: Config) -> Rocket<Build> {
    let figment = Figment::from(rocket::Config::default())
        .merge(("port", config::DEFAULT_PORT))
        .merge(Env::prefixed("ROCKET_").ignore(&["PROFILE"]).global());

    log::info!(
        "VVPAT receipts go to {}",
        config.vvpat_dir.to_string_lossy()
    );

    rocket::custom(figment)
        .manage(Daemon::new(&config))
        .register("/", catchers![error::default_catcher])
        .mount(
            "/",
            routes![
                admin::login,
                admin::create_voter,
                admin::voters,
                admin::register_template,
                admin::create_election,
                admin::add_candidate,
                admin::elections,
                voter::active_elections,
                voter::session_key,
                voter::login,
                voter::scan,
                voter::vote,
                voter::vvpat,
            ],
        )
}

#[launch]
fn rocket() -> _ {
    build(Config::from_env())
}
