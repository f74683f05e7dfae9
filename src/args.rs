//! These structs provide the CLI interface for the expendash CLI.

use crate::model::TransactionType;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// expendash: a terminal client for an expendash backend.
///
/// The program fetches your transactions for a date range and draws the
/// income and expense category breakdowns. The backend authenticates you
/// with a QR-code session handshake: when a command is not signed in it
/// prints a scannable payload and waits for you to confirm it from another
/// trusted device.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the data directory and initialize the configuration file.
    ///
    /// This is the first command you should run. Pass the root URL of your
    /// backend API as --api-base-url; everything else has defaults.
    Init(InitArgs),
    /// Run only the QR-code session handshake and wait for confirmation.
    Auth,
    /// Fetch transactions and draw the income and expense charts.
    Show(ShowArgs),
    /// Fetch transactions and print the aggregates without drawing charts.
    Query(QueryArgs),
    /// Print the shareable link for a date range.
    Link(LinkArgs),
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where expendash configuration is held. Defaults to
    /// ~/expendash
    #[arg(long, env = "EXPENDASH_HOME", default_value_t = default_expendash_home())]
    expendash_home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, expendash_home: PathBuf) -> Self {
        Self {
            log_level,
            expendash_home: expendash_home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn expendash_home(&self) -> &DisplayPath {
        &self.expendash_home
    }
}

/// Args for the `expendash init` command.
#[derive(Debug, Parser, Clone)]
pub struct InitArgs {
    /// The root URL of the backend API, e.g. https://backend.example/api
    #[arg(long)]
    api_base_url: String,

    /// The URL of the hosted dashboard page, used when building shareable
    /// links. Defaults to the API base URL.
    #[arg(long)]
    share_url: Option<String>,
}

impl InitArgs {
    pub fn new(api_base_url: impl Into<String>, share_url: Option<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            share_url,
        }
    }

    pub fn api_base_url(&self) -> &str {
        &self.api_base_url
    }

    pub fn share_url(&self) -> Option<&str> {
        self.share_url.as_deref()
    }
}

/// Args for the `expendash show` command.
#[derive(Debug, Parser, Clone)]
pub struct ShowArgs {
    /// The first day of the range (inclusive), YYYY-MM-DD. Defaults to the
    /// first day of the current month.
    #[arg(long)]
    from: Option<NaiveDate>,

    /// The last day of the range (inclusive), YYYY-MM-DD. Defaults to today.
    #[arg(long)]
    to: Option<NaiveDate>,

    /// A previously shared dashboard link; its startDate/endDate parameters
    /// seed the range. --from and --to still win.
    #[arg(long)]
    link: Option<String>,
}

impl ShowArgs {
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>, link: Option<String>) -> Self {
        Self { from, to, link }
    }

    pub fn from(&self) -> Option<NaiveDate> {
        self.from
    }

    pub fn to(&self) -> Option<NaiveDate> {
        self.to
    }

    pub fn link(&self) -> Option<&str> {
        self.link.as_deref()
    }
}

/// Args for the `expendash query` command.
#[derive(Debug, Parser, Clone)]
pub struct QueryArgs {
    /// The first day of the range (inclusive), YYYY-MM-DD. Defaults to the
    /// first day of the current month.
    #[arg(long)]
    from: Option<NaiveDate>,

    /// The last day of the range (inclusive), YYYY-MM-DD. Defaults to today.
    #[arg(long)]
    to: Option<NaiveDate>,

    /// Restrict the output to one side: income or expense. Both by default.
    #[arg(long = "type")]
    transaction_type: Option<TransactionType>,
}

impl QueryArgs {
    pub fn new(
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
        transaction_type: Option<TransactionType>,
    ) -> Self {
        Self {
            from,
            to,
            transaction_type,
        }
    }

    pub fn from(&self) -> Option<NaiveDate> {
        self.from
    }

    pub fn to(&self) -> Option<NaiveDate> {
        self.to
    }

    pub fn transaction_type(&self) -> Option<TransactionType> {
        self.transaction_type
    }
}

/// Args for the `expendash link` command.
#[derive(Debug, Parser, Clone)]
pub struct LinkArgs {
    /// The first day of the range (inclusive), YYYY-MM-DD. Defaults to the
    /// first day of the current month.
    #[arg(long)]
    from: Option<NaiveDate>,

    /// The last day of the range (inclusive), YYYY-MM-DD. Defaults to today.
    #[arg(long)]
    to: Option<NaiveDate>,
}

impl LinkArgs {
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        Self { from, to }
    }

    pub fn from(&self) -> Option<NaiveDate> {
        self.from
    }

    pub fn to(&self) -> Option<NaiveDate> {
        self.to
    }
}

fn default_expendash_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("expendash"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --expendash-home or EXPENDASH_HOME instead of relying on the \
                default expendash home directory. If you continue using the program right now, \
                you may have problems!",
            );
            PathBuf::from("expendash")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn new(path: PathBuf) -> Self {
        Self(path)
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}
