use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;

use crate::token::HasherCost;

pub const ARG_ARGON2_MEMORY_KIB: &str = "argon2-memory-kib";
pub const ARG_ARGON2_ITERATIONS: &str = "argon2-iterations";
pub const ARG_ARGON2_PARALLELISM: &str = "argon2-parallelism";
pub const ARG_PEPPER: &str = "pepper";

// argon2::Params::DEFAULT_{M,T,P}_COST
const DEFAULT_MEMORY_KIB: &str = "19456";
const DEFAULT_ITERATIONS: &str = "2";
const DEFAULT_PARALLELISM: &str = "1";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_ARGON2_MEMORY_KIB)
                .long(ARG_ARGON2_MEMORY_KIB)
                .help("Argon2 memory cost in KiB")
                .env("COUNTERSIGN_ARGON2_MEMORY_KIB")
                .default_value(DEFAULT_MEMORY_KIB)
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            Arg::new(ARG_ARGON2_ITERATIONS)
                .long(ARG_ARGON2_ITERATIONS)
                .help("Argon2 iterations")
                .env("COUNTERSIGN_ARGON2_ITERATIONS")
                .default_value(DEFAULT_ITERATIONS)
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            Arg::new(ARG_ARGON2_PARALLELISM)
                .long(ARG_ARGON2_PARALLELISM)
                .help("Argon2 lanes")
                .env("COUNTERSIGN_ARGON2_PARALLELISM")
                .default_value(DEFAULT_PARALLELISM)
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            Arg::new(ARG_PEPPER)
                .long(ARG_PEPPER)
                .help("Server-side secret mixed into verifier hashes")
                .env("COUNTERSIGN_PEPPER")
                .hide_env_values(true),
        )
}

#[derive(Debug)]
pub struct Options {
    pub cost: HasherCost,
    pub pepper: Option<SecretString>,
}

impl Options {
    #[must_use]
    pub fn parse(matches: &ArgMatches) -> Self {
        let defaults = HasherCost::default();
        let cost = HasherCost::new(
            matches
                .get_one::<u32>(ARG_ARGON2_MEMORY_KIB)
                .copied()
                .unwrap_or(defaults.memory_kib()),
            matches
                .get_one::<u32>(ARG_ARGON2_ITERATIONS)
                .copied()
                .unwrap_or(defaults.iterations()),
            matches
                .get_one::<u32>(ARG_ARGON2_PARALLELISM)
                .copied()
                .unwrap_or(defaults.parallelism()),
        );
        let pepper = matches
            .get_one::<String>(ARG_PEPPER)
            .filter(|pepper| !pepper.is_empty())
            .map(|pepper| SecretString::from(pepper.clone()));
        Self { cost, pepper }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_argon2() {
        temp_env::with_vars(
            [
                ("COUNTERSIGN_ARGON2_MEMORY_KIB", None::<&str>),
                ("COUNTERSIGN_ARGON2_ITERATIONS", None),
                ("COUNTERSIGN_ARGON2_PARALLELISM", None),
                ("COUNTERSIGN_PEPPER", None),
            ],
            || {
                let matches = with_args(Command::new("t")).get_matches_from(vec!["t"]);
                let options = Options::parse(&matches);
                assert_eq!(options.cost, HasherCost::default());
                assert!(options.pepper.is_none());
            },
        );
    }

    #[test]
    fn empty_pepper_is_ignored() {
        temp_env::with_vars([("COUNTERSIGN_PEPPER", Some(""))], || {
            let matches = with_args(Command::new("t")).get_matches_from(vec!["t"]);
            assert!(Options::parse(&matches).pepper.is_none());
        });
    }
}
