use crate::fail;
use clap::{App, Arg, ArgMatches, SubCommand};
use palmvote::{mock, Hand};

pub fn subcommand() -> App<'static, 'static> {
    SubCommand::with_name("gen")
        .about("Generate mock data")
        .subcommand(SubCommand::with_name("voter-code").about("Random voter code"))
        .subcommand(SubCommand::with_name("vote-id").about("Random vote ID"))
        .subcommand(
            SubCommand::with_name("template")
                .about("Mock palm template, base64")
                .arg(
                    Arg::with_name("voter-code")
                        .long("voter-code")
                        .takes_value(true)
                        .help("Derive the template from this voter code, so it is the same every time"),
                )
                .arg(
                    Arg::with_name("hand")
                        .long("hand")
                        .takes_value(true)
                        .possible_values(&["left", "right"])
                        .default_value("left"),
                ),
        )
}

pub fn command_gen(matches: &ArgMatches) {
    let mut rng = rand::thread_rng();
    match matches.subcommand() {
        ("voter-code", Some(_)) => println!("{}", mock::voter_code(&mut rng)),
        ("vote-id", Some(_)) => println!("{}", mock::vote_id(&mut rng)),
        ("template", Some(m)) => match m.value_of("voter-code") {
            Some(code) => {
                let hand = match m.value_of("hand").unwrap_or("left").parse::<Hand>() {
                    Ok(hand) => hand,
                    Err(e) => fail("gen template", e),
                };
                println!("{}", mock::palm_template_for(code, hand));
            }
            None => println!("{}", mock::palm_template(&mut rng)),
        },
        _ => {
            eprintln!("{}", matches.usage());
            std::process::exit(1);
        }
    }
}
