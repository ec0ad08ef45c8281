use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};
use url::Url;

pub const ARG_FRONTEND_BASE_URL: &str = "frontend-base-url";
pub const ARG_RESET_TTL_SECONDS: &str = "password-reset-ttl-seconds";
pub const ARG_EMAIL_CHANGE_TTL_SECONDS: &str = "email-change-ttl-seconds";
pub const ARG_MIN_PASSWORD_LENGTH: &str = "min-password-length";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_FRONTEND_BASE_URL)
                .long(ARG_FRONTEND_BASE_URL)
                .help("Frontend base URL used for confirmation links")
                .env("COUNTERSIGN_FRONTEND_BASE_URL")
                .default_value("https://permesi.dev"),
        )
        .arg(
            Arg::new(ARG_RESET_TTL_SECONDS)
                .long(ARG_RESET_TTL_SECONDS)
                .help("Password reset token TTL in seconds")
                .env("COUNTERSIGN_PASSWORD_RESET_TTL_SECONDS")
                .default_value("3600")
                .value_parser(clap::value_parser!(i64).range(1..)),
        )
        .arg(
            Arg::new(ARG_EMAIL_CHANGE_TTL_SECONDS)
                .long(ARG_EMAIL_CHANGE_TTL_SECONDS)
                .help("Email change token TTL in seconds")
                .env("COUNTERSIGN_EMAIL_CHANGE_TTL_SECONDS")
                .default_value("86400")
                .value_parser(clap::value_parser!(i64).range(1..)),
        )
        .arg(
            Arg::new(ARG_MIN_PASSWORD_LENGTH)
                .long(ARG_MIN_PASSWORD_LENGTH)
                .help("Minimum length of a new password")
                .env("COUNTERSIGN_MIN_PASSWORD_LENGTH")
                .default_value("8")
                .value_parser(clap::value_parser!(usize)),
        )
}

#[derive(Debug)]
pub struct Options {
    pub frontend_base_url: String,
    pub password_reset_ttl_seconds: i64,
    pub email_change_ttl_seconds: i64,
    pub min_password_length: usize,
}

impl Options {
    /// # Errors
    /// Returns an error if the frontend URL is not absolute.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        let frontend_base_url = matches
            .get_one::<String>(ARG_FRONTEND_BASE_URL)
            .cloned()
            .context("missing required argument: --frontend-base-url")?;
        Url::parse(&frontend_base_url).context("invalid --frontend-base-url")?;

        Ok(Self {
            frontend_base_url,
            password_reset_ttl_seconds: matches
                .get_one::<i64>(ARG_RESET_TTL_SECONDS)
                .copied()
                .unwrap_or(3600),
            email_change_ttl_seconds: matches
                .get_one::<i64>(ARG_EMAIL_CHANGE_TTL_SECONDS)
                .copied()
                .unwrap_or(86_400),
            min_password_length: matches
                .get_one::<usize>(ARG_MIN_PASSWORD_LENGTH)
                .copied()
                .unwrap_or(8),
        })
    }
}
