// Legend for various fix-this comments:
//   * "TODO" - bug or missing crucial feature.
//   * "Improvement potential" - missing nice-to-have feature or an opportunity
//       to make code better or faster.

#![forbid(unsafe_code)]
#![cfg_attr(feature = "strict", deny(warnings))]

pub mod network;
pub mod tui;

mod client_main;
mod server_config;
mod server_main;

use clap::{Command, arg};
use log::error;


fn main() {
    env_logger::Builder::new()
        .target(env_logger::Target::Stdout)
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let matches = Command::new("Duel chess")
        .version(clap::crate_version!())
        .about("Two-player chess server and console client")
        .subcommand_required(true)
        .subcommand(
            Command::new("server")
                .about("Run as server")
                .arg(
                    arg!(-c --config <config_file> "Path to the configuration file: yaml-serialized ServerConfig")
                        .required(false),
                )
                .arg(
                    arg!(-p --port <port> "Port to listen on; overrides the config file and PORT")
                        .required(false)
                        .value_parser(clap::value_parser!(u16)),
                ),
        )
        .subcommand(
            Command::new("client")
                .about("Run as console client")
                .arg(arg!(<server_address> "Server address, e.g. localhost:3000"))
                .arg(arg!([session_id] "Session to join; the default session if omitted")),
        )
        .get_matches();

    let result = match matches.subcommand() {
        Some(("server", sub_matches)) => server_config::load_config(
            sub_matches.get_one::<String>("config").map(String::as_str),
            std::env::var(server_config::PORT_ENV_VAR).ok(),
            sub_matches.get_one::<u16>("port").copied(),
        )
        .and_then(server_main::run),
        Some(("client", sub_matches)) => client_main::run(client_main::ClientConfig {
            server_address: sub_matches.get_one::<String>("server_address").unwrap().clone(),
            session_id: sub_matches.get_one::<String>("session_id").cloned(),
        }),
        _ => unreachable!("Exhausted list of subcommands and subcommand_required prevents `None`"),
    };
    if let Err(err) = result {
        error!("{err:#}");
        std::process::exit(1);
    }
}
