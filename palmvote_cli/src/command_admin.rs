use crate::fail;
use crate::rest::RestClient;
use clap::{App, Arg, ArgMatches, SubCommand};
use palmvote::*;
use std::str::FromStr;
use uuid::Uuid;

pub fn subcommand() -> App<'static, 'static> {
    SubCommand::with_name("admin")
        .about("Admin portal")
        .subcommand(
            SubCommand::with_name("login")
                .about("Check admin credentials")
                .arg(Arg::with_name("username").long("username").takes_value(true).required(true))
                .arg(Arg::with_name("password").long("password").takes_value(true).required(true)),
        )
        .subcommand(
            SubCommand::with_name("create-voter")
                .about("Register a voter")
                .arg(Arg::with_name("name").long("name").takes_value(true).required(true))
                .arg(
                    Arg::with_name("code")
                        .long("code")
                        .takes_value(true)
                        .required_unless("generate-code")
                        .help("Voter code"),
                )
                .arg(
                    Arg::with_name("generate-code")
                        .long("generate-code")
                        .conflicts_with("code")
                        .help("Use a random voter code"),
                )
                .arg(Arg::with_name("mobile").long("mobile").takes_value(true).required(true))
                .arg(
                    Arg::with_name("dob")
                        .long("dob")
                        .takes_value(true)
                        .required(true)
                        .help("Date of birth, YYYY-MM-DD"),
                ),
        )
        .subcommand(
            SubCommand::with_name("voters")
                .about("List voters")
                .arg(
                    Arg::with_name("filter")
                        .long("filter")
                        .takes_value(true)
                        .help("Only voters whose name or code contains this"),
                ),
        )
        .subcommand(
            SubCommand::with_name("register-palm")
                .about("Capture and register a voter's palm templates")
                .arg(Arg::with_name("VOTER-CODE").index(1).required(true))
                .arg(
                    Arg::with_name("hand")
                        .long("hand")
                        .takes_value(true)
                        .possible_values(&["left", "right", "both"])
                        .default_value("both"),
                ),
        )
        .subcommand(
            SubCommand::with_name("create-election")
                .about("Create an election with its candidates")
                .arg(Arg::with_name("title").long("title").takes_value(true).required(true))
                .arg(Arg::with_name("start-date").long("start-date").takes_value(true))
                .arg(Arg::with_name("start-time").long("start-time").takes_value(true))
                .arg(Arg::with_name("end-date").long("end-date").takes_value(true))
                .arg(Arg::with_name("end-time").long("end-time").takes_value(true))
                .arg(
                    Arg::with_name("status")
                        .long("status")
                        .takes_value(true)
                        .possible_values(&["ACTIVE", "CLOSED", "DRAFT"])
                        .default_value("ACTIVE"),
                )
                .arg(
                    Arg::with_name("candidate")
                        .long("candidate")
                        .takes_value(true)
                        .multiple(true)
                        .number_of_values(1)
                        .help("Candidate as LEADER|PARTY|CITY; may be repeated"),
                ),
        )
        .subcommand(
            SubCommand::with_name("add-candidate")
                .about("Add a candidate to an election")
                .arg(Arg::with_name("ELECTION-ID").index(1).required(true))
                .arg(Arg::with_name("leader").long("leader").takes_value(true).required(true))
                .arg(Arg::with_name("party").long("party").takes_value(true))
                .arg(Arg::with_name("city").long("city").takes_value(true)),
        )
        .subcommand(SubCommand::with_name("elections").about("List elections"))
        .subcommand(SubCommand::with_name("overview").about("Dashboard counts"))
        .subcommand(
            SubCommand::with_name("results")
                .about("Standings of an election")
                .arg(
                    Arg::with_name("ELECTION-ID")
                        .index(1)
                        .help("Defaults to the first election"),
                ),
        )
}

pub fn command_admin(matches: &ArgMatches, backend: &RestClient, capture: &dyn PalmCapture) {
    match matches.subcommand() {
        ("login", Some(m)) => command_admin_login(m, backend),
        ("create-voter", Some(m)) => command_admin_create_voter(m, backend),
        ("voters", Some(m)) => command_admin_voters(m, backend),
        ("register-palm", Some(m)) => command_admin_register_palm(m, backend, capture),
        ("create-election", Some(m)) => command_admin_create_election(m, backend),
        ("add-candidate", Some(m)) => command_admin_add_candidate(m, backend),
        ("elections", Some(_)) => print_json("admin elections", &backend.elections()),
        ("overview", Some(_)) => command_admin_overview(backend),
        ("results", Some(m)) => command_admin_results(m, backend),
        _ => {
            eprintln!("{}", matches.usage());
            std::process::exit(1);
        }
    }
}

fn command_admin_login(matches: &ArgMatches, backend: &RestClient) {
    let mut screen = AdminLoginScreen {
        username: matches.value_of("username").unwrap_or_default().to_owned(),
        password: matches.value_of("password").unwrap_or_default().to_owned(),
        ..Default::default()
    };
    match screen.submit(backend) {
        Some(_) => println!("Login successful"),
        None => fail("admin login", banner(&screen.state)),
    }
}

fn command_admin_create_voter(matches: &ArgMatches, backend: &RestClient) {
    let mut form = CreateVoterForm::default();
    form.name = matches.value_of("name").unwrap_or_default().to_owned();
    form.mobile = matches.value_of("mobile").unwrap_or_default().to_owned();
    form.dob = matches.value_of("dob").unwrap_or_default().to_owned();
    if matches.is_present("generate-code") {
        form.generate_code(&mut rand::thread_rng());
    } else {
        form.voter_code = matches.value_of("code").unwrap_or_default().to_owned();
    }

    match form.submit(backend) {
        Some(voter) => print_json("admin create-voter", &Ok::<_, ApiError>(voter)),
        None => fail("admin create-voter", banner(&form.state)),
    }
}

fn command_admin_voters(matches: &ArgMatches, backend: &RestClient) {
    let mut list = VoterListScreen::default();
    list.filter = matches.value_of("filter").unwrap_or_default().to_owned();
    list.load(backend);
    if list.state.error.is_some() {
        fail("admin voters", banner(&list.state));
    }

    for voter in list.visible() {
        println!(
            "{:<12} {:<24} palm: {:<5} voted: {}",
            voter.voter_code,
            voter.name,
            hands(voter),
            if voter.has_voted { "yes" } else { "no" }
        );
    }
}

fn hands(voter: &Voter) -> &'static str {
    match (voter.left_registered, voter.right_registered) {
        (true, true) => "L+R",
        (true, false) => "L",
        (false, true) => "R",
        (false, false) => "-",
    }
}

fn command_admin_register_palm(matches: &ArgMatches, backend: &RestClient, capture: &dyn PalmCapture) {
    let mut screen = PalmRegistrationScreen::default();
    screen.voter_code = matches.value_of("VOTER-CODE").unwrap_or_default().to_owned();

    let hands: &[Hand] = match matches.value_of("hand") {
        Some("left") => &[Hand::Left],
        Some("right") => &[Hand::Right],
        _ => &[Hand::Left, Hand::Right],
    };
    for hand in hands {
        screen.capture(*hand, capture);
        if let Some(e) = &screen.state.error {
            eprintln!("{} hand: {}", hand, e);
        }
    }

    match screen.register(backend) {
        Some(voter) => println!("Palm registered for {} ({})", voter.voter_code, self::hands(&voter)),
        None => fail("admin register-palm", banner(&screen.state)),
    }
}

fn command_admin_create_election(matches: &ArgMatches, backend: &RestClient) {
    let value = |name: &str| matches.value_of(name).unwrap_or_default().to_owned();

    let mut form = CreateElectionForm {
        title: value("title"),
        start_date: value("start-date"),
        start_time: value("start-time"),
        end_date: value("end-date"),
        end_time: value("end-time"),
        ..Default::default()
    };
    form.status = ElectionStatus::from_str(&value("status")).unwrap_or_default();
    if let Some(rows) = matches.values_of("candidate") {
        form.candidates = rows.map(parse_candidate_row).collect();
    }

    match form.submit(backend) {
        Some(election) => print_json("admin create-election", &Ok::<_, ApiError>(election)),
        None => fail("admin create-election", banner(&form.state)),
    }
}

/// `LEADER|PARTY|CITY`, trailing parts optional
pub fn parse_candidate_row(row: &str) -> NewCandidate {
    let mut parts = row.splitn(3, '|').map(|p| p.trim().to_owned());
    NewCandidate {
        leader_name: parts.next().unwrap_or_default(),
        party_name: parts.next().unwrap_or_default(),
        city: parts.next().unwrap_or_default(),
        votes_count: None,
    }
}

fn command_admin_add_candidate(matches: &ArgMatches, backend: &RestClient) {
    let election_id = parse_uuid("admin add-candidate", matches.value_of("ELECTION-ID"));
    let candidate = NewCandidate {
        leader_name: matches.value_of("leader").unwrap_or_default().to_owned(),
        party_name: matches.value_of("party").unwrap_or_default().to_owned(),
        city: matches.value_of("city").unwrap_or_default().to_owned(),
        votes_count: None,
    };
    print_json("admin add-candidate", &backend.add_candidate(election_id, &candidate));
}

fn command_admin_overview(backend: &RestClient) {
    let mut dashboard = DashboardScreen::default();
    dashboard.refresh(backend);
    match dashboard.overview {
        Some(overview) => {
            println!("Total voters:      {}", overview.total_voters);
            println!("Palm registered:   {}", overview.palm_registered);
            println!("Voted:             {}", overview.voted);
            println!("Elections:         {}", overview.total_elections);
            println!("Active elections:  {}", overview.active_elections);
        }
        None => fail("admin overview", banner(&dashboard.state)),
    }
}

fn command_admin_results(matches: &ArgMatches, backend: &RestClient) {
    let mut results = ResultsScreen::default();
    results.load(backend);
    if results.state.error.is_some() {
        fail("admin results", banner(&results.state));
    }
    if let Some(id) = matches.value_of("ELECTION-ID") {
        let id = parse_uuid("admin results", Some(id));
        results.select(id);
        if results.selected != Some(id) {
            fail("admin results", ValidationError::ElectionNotFound);
        }
    }

    let standings = match results.standings() {
        Some(standings) => standings,
        None => fail("admin results", "no elections yet"),
    };
    println!("{} ({} votes)", standings.title, standings.total_votes);
    for (rank, row) in standings.rows.iter().enumerate() {
        println!(
            "{:>3}. {:<24} {:<24} {:>6} {:>5.1}%",
            rank + 1,
            row.leader_name,
            row.party_name,
            row.votes,
            row.percentage
        );
    }
    if let Some(winner) = standings.winner() {
        println!("Leading: {} ({})", winner.leader_name, winner.party_name);
    }
}

fn parse_uuid(command: &str, value: Option<&str>) -> Uuid {
    match value.map(Uuid::parse_str) {
        Some(Ok(id)) => id,
        Some(Err(e)) => fail(command, e),
        None => fail(command, "an ID is required"),
    }
}

fn banner(state: &ScreenState) -> String {
    state
        .error
        .clone()
        .unwrap_or_else(|| GENERIC_FAILURE.to_owned())
}

fn print_json<T: serde::Serialize>(command: &str, result: &Result<T, ApiError>) {
    match result {
        Ok(value) => match serde_json::to_string_pretty(value) {
            Ok(json) => println!("{}", json),
            Err(e) => fail(command, e),
        },
        Err(e) => fail(command, e),
    }
}
