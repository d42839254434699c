use clap::{App, AppSettings, Arg, SubCommand};
use palmvote::{MockCapture, PalmCapture, DEFAULT_API_URI, DEFAULT_CAPTURE_URI};

mod capture;
mod command_admin;
mod command_gen;
mod command_vote;
mod rest;

use capture::HttpCapture;
use rest::RestClient;

#[derive(PartialEq, Copy, Clone, Debug)]
pub enum Verbosity {
    Warn,
    Info,
    Debug,
}

impl Verbosity {
    fn from_occurrences(v: u64) -> Self {
        match v {
            0 => Verbosity::Warn,
            1 => Verbosity::Info,
            _ => Verbosity::Debug,
        }
    }

    fn filter(self) -> &'static str {
        match self {
            Verbosity::Warn => "warn",
            Verbosity::Info => "info",
            Verbosity::Debug => "debug",
        }
    }
}

fn main() {
    let matches = App::new("PalmVote CLI")
        .version("0.1.0")
        .about("Drives the palm-vein voting backend: admin tasks and the voter booth")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .arg(
            Arg::with_name("uri")
                .long("uri")
                .takes_value(true)
                .global(true)
                .help("Backend URI - can also be set with PALMVOTE_URI"),
        )
        .arg(
            Arg::with_name("capture-uri")
                .long("capture-uri")
                .takes_value(true)
                .global(true)
                .help("Palm capture service URI - can also be set with PALMVOTE_CAPTURE_URI"),
        )
        .arg(
            Arg::with_name("mock-capture")
                .long("mock-capture")
                .global(true)
                .help("Use generated palm templates instead of the capture service"),
        )
        .arg(
            Arg::with_name("v")
                .short("v")
                .multiple(true)
                .global(true)
                .help("Sets the level of verbosity"),
        )
        .subcommand(command_admin::subcommand())
        .subcommand(SubCommand::with_name("session-key").about("Fetch a QKD session key"))
        .subcommand(
            SubCommand::with_name("vote")
                .about("Walk through the voting booth")
                .arg(
                    Arg::with_name("VOTER-CODE")
                        .index(1)
                        .help("Voter code; prompted for when missing"),
                )
                .arg(
                    Arg::with_name("candidate")
                        .long("candidate")
                        .takes_value(true)
                        .help("Candidate number from the ballot list (1-based)"),
                )
                .arg(
                    Arg::with_name("yes")
                        .long("yes")
                        .short("y")
                        .help("Confirm the vote without asking"),
                )
                .arg(
                    Arg::with_name("vvpat")
                        .long("vvpat")
                        .takes_value(true)
                        .help("Save the VVPAT receipt to this file"),
                ),
        )
        .subcommand(
            SubCommand::with_name("vvpat")
                .about("Download the VVPAT receipt of a ballot")
                .arg(Arg::with_name("BALLOT-ID").index(1).required(true))
                .arg(Arg::with_name("OUTPUT").index(2).required(true)),
        )
        .subcommand(command_gen::subcommand())
        .get_matches();

    let verbosity = Verbosity::from_occurrences(matches.occurrences_of("v"));
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(verbosity.filter())).init();

    let env_uri = std::env::var("PALMVOTE_URI");
    let uri = match matches.value_of("uri") {
        Some(uri) => uri,
        None => env_uri.as_deref().unwrap_or(DEFAULT_API_URI),
    };
    let env_capture = std::env::var("PALMVOTE_CAPTURE_URI");
    let capture_uri = match matches.value_of("capture-uri") {
        Some(uri) => uri,
        None => env_capture.as_deref().unwrap_or(DEFAULT_CAPTURE_URI),
    };
    log::info!("backend {}, capture service {}", uri, capture_uri);

    let backend = RestClient::new(uri);
    let capture: Box<dyn PalmCapture> = if matches.is_present("mock-capture") {
        Box::new(MockCapture)
    } else {
        Box::new(HttpCapture::new(capture_uri))
    };

    // Subcommands
    match matches.subcommand() {
        ("admin", Some(matches)) => command_admin::command_admin(matches, &backend, capture.as_ref()),
        ("session-key", Some(_)) => match palmvote::Backend::session_key(&backend) {
            Ok(key) => println!("{}", key.trim()),
            Err(e) => fail("session-key", e),
        },
        ("vote", Some(matches)) => command_vote::command_vote(matches, &backend, capture.as_ref()),
        ("vvpat", Some(matches)) => command_vote::command_vvpat(matches, &backend),
        ("gen", Some(matches)) => command_gen::command_gen(matches),
        _ => unreachable!("clap requires a subcommand"),
    }
}

/// Report a failed command and exit
pub fn fail<E: std::fmt::Display>(command: &str, e: E) -> ! {
    eprintln!("palmvote {}: {}", command, e);
    std::process::exit(1);
}

/// Expand `~` and environment variables in a path argument
pub fn expand(input: &str) -> String {
    match shellexpand::full(input) {
        Ok(expanded) => expanded.into_owned(),
        Err(e) => fail("expand", e),
    }
}
