use crate::rest::RestClient;
use crate::{expand, fail};
use clap::ArgMatches;
use palmvote::*;
use std::io::{self, BufRead, Write};
use std::thread::sleep;
use uuid::Uuid;

const BAR_WIDTH: usize = 30;

pub fn command_vote(matches: &ArgMatches, backend: &RestClient, capture: &dyn PalmCapture) {
    let mut router = Router::new();
    step(&mut router, Event::OpenVoter);

    // Login
    let mut login = VoterLoginScreen::default();
    login.voter_code = match matches.value_of("VOTER-CODE") {
        Some(code) => code.to_owned(),
        None => prompt("Voter code: "),
    };
    let event = login.submit(backend);
    let voter = match (event, login.voter.take()) {
        (Some(event), Some(voter)) => {
            step(&mut router, event);
            voter
        }
        _ if login.state.error.as_deref() == Some(ALREADY_VOTED) => {
            step(&mut router, Event::Fail(VoterErrorKind::AlreadyVoted));
            fail("vote", VoterErrorKind::AlreadyVoted.message());
        }
        _ => fail("vote", banner(&login.state)),
    };
    println!("Welcome, {}", voter.name);

    // Session key
    let mut session = QkdSessionScreen::default();
    session.establish(backend);
    let event = loop {
        if let Some(event) = session.tick() {
            break event;
        }
        print!("\r{}", progress_line(&session.progress));
        let _ = io::stdout().flush();
        sleep(qkd::TICK_INTERVAL);
    };
    println!("\r{}", progress_line(&session.progress));
    sleep(qkd::SETTLE_DELAY);
    step(&mut router, event);
    let session_key = match session.session_key {
        Some(key) if event == Event::SessionEstablished => key,
        _ => fail("vote", VoterErrorKind::SessionExpired.message()),
    };

    // Palm scan, with retries from the error screen
    loop {
        println!("Place your left palm on the scanner...");
        let mut scan = PalmScanScreen::new(&voter.voter_code, &session_key);
        match scan.scan(backend, capture) {
            Some(Event::ScanVerified) => {
                step(&mut router, Event::ScanVerified);
                break;
            }
            Some(event) => {
                step(&mut router, event);
                eprintln!("{}", VoterErrorKind::InvalidPalm.message());
                if !confirmed(&prompt("Try again? [y/N] ")) {
                    step(&mut router, Event::Exit);
                    std::process::exit(1);
                }
                step(&mut router, Event::Retry);
            }
            None => fail("vote", banner(&scan.state)),
        }
    }
    println!("Identity verified");
    step(&mut router, Event::Proceed);

    // Ballot
    let mut ballot = CandidateSelectionScreen::default();
    ballot.load(backend);
    if ballot.state.error.is_some() {
        fail("vote", banner(&ballot.state));
    }
    let election = match ballot.election() {
        Some(election) => election.clone(),
        None => fail("vote", "No active elections"),
    };
    println!("{}", election.title);
    for (n, candidate) in election.candidates.iter().enumerate() {
        println!("{:>3}. {} ({}, {})", n + 1, candidate.leader_name, candidate.party_name, candidate.city);
    }

    let input = match matches.value_of("candidate") {
        Some(choice) => choice.to_owned(),
        None => prompt("Candidate number: "),
    };
    let candidate = match parse_choice(&input, election.candidates.len()) {
        Some(n) => &election.candidates[n],
        None => fail("vote", format!("no candidate numbered {}", input.trim())),
    };
    ballot.select(candidate.candidate_id);

    let question = format!("Vote for {} ({})? [y/N] ", candidate.leader_name, candidate.party_name);
    if !matches.is_present("yes") && !confirmed(&prompt(&question)) {
        ballot.cancel();
        println!("Vote cancelled");
        step(&mut router, Event::Exit);
        return;
    }

    let now = chrono::Local::now().naive_local();
    match ballot.confirm(backend, &voter.voter_code, now, &mut rand::thread_rng()) {
        Some(event) => step(&mut router, event),
        None => fail("vote", banner(&ballot.state)),
    }

    // Receipt
    let receipt = match ballot.receipt.take() {
        Some(receipt) => receipt,
        None => fail("vote", GENERIC_FAILURE),
    };
    for line in receipt_lines(&receipt) {
        println!("{}", line);
    }

    if let Some(path) = matches.value_of("vvpat") {
        let mut success = VoteSuccessScreen::new(receipt);
        match success.download_vvpat(backend) {
            Some(bytes) => save("vote", path, &bytes),
            None => eprintln!("{}", banner(&success.state)),
        }
    }
    step(&mut router, Event::Exit);
}

pub fn command_vvpat(matches: &ArgMatches, backend: &RestClient) {
    let ballot_id = match matches.value_of("BALLOT-ID").map(Uuid::parse_str) {
        Some(Ok(id)) => id,
        Some(Err(e)) => fail("vvpat", e),
        None => fail("vvpat", "a ballot ID is required"),
    };
    let bytes = match backend.download_vvpat(ballot_id) {
        Ok(bytes) => bytes,
        Err(e) => fail("vvpat", e),
    };
    save("vvpat", matches.value_of("OUTPUT").unwrap_or_default(), &bytes);
}

fn save(command: &str, path: &str, bytes: &[u8]) {
    let path = expand(path);
    if let Err(e) = std::fs::write(&path, bytes) {
        fail(command, e);
    }
    println!("VVPAT saved to {}", path);
}

fn step(router: &mut Router, event: Event) {
    if let Err(e) = router.apply(event) {
        fail("vote", e);
    }
}

fn prompt(question: &str) -> String {
    print!("{}", question);
    let _ = io::stdout().flush();

    let mut line = String::new();
    if let Err(e) = io::stdin().lock().read_line(&mut line) {
        fail("vote", e);
    }
    line.trim().to_owned()
}

fn banner(state: &ScreenState) -> String {
    state
        .error
        .clone()
        .unwrap_or_else(|| GENERIC_FAILURE.to_owned())
}

/// A 1-based choice out of `count`, as a 0-based index
pub fn parse_choice(input: &str, count: usize) -> Option<usize> {
    match input.trim().parse::<usize>() {
        Ok(n) if n >= 1 && n <= count => Some(n - 1),
        _ => None,
    }
}

pub fn confirmed(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/// `[#######-------]  46%  Stage label`
pub fn progress_line(progress: &QkdProgress) -> String {
    let filled = progress.progress() as usize * BAR_WIDTH / 100;
    format!(
        "[{}{}] {:>3}%  {}",
        "#".repeat(filled),
        "-".repeat(BAR_WIDTH - filled),
        progress.progress(),
        progress.stage_label()
    )
}

pub fn receipt_lines(receipt: &VoteReceipt) -> Vec<String> {
    let mut lines = vec![
        "Vote recorded".to_owned(),
        format!("Ballot ID:  {}", receipt.ballot_id),
        format!("Audit hash: {}", receipt.audit_hash),
        format!(
            "Candidate:  {} ({})",
            receipt.candidate.leader_name, receipt.candidate.party_name
        ),
    ];
    if let Some(timestamp) = receipt.timestamp {
        lines.push(format!("Time:       {}", timestamp.format("%Y-%m-%d %H:%M:%S")));
    }
    if let Some(path) = &receipt.vvpat_path {
        lines.push(format!("VVPAT:      {}", path));
    }
    if receipt.fabricated {
        lines.push("The backend returned no ballot ID; these values are placeholders.".to_owned());
    }
    lines
}
