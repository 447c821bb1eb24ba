use clap::Parser;

/// Mirrors Gradescope assignment due dates into a Google Calendar.
///
/// Credentials come from the environment (or a .env file): GRADESCOPE_EMAIL,
/// GRADESCOPE_PASSWORD and either GOOGLE_TOKEN or a token.json file.
#[derive(Debug, Parser)]
#[command(name = "gradesync", version)]
pub struct Args {
    /// Delete every event this tool created in the calendar, then exit
    #[arg(long, default_value_t = false)]
    pub cleanup: bool,

    /// Fetch and plan, but don't write anything to the calendar
    #[arg(long, short = 'n', default_value_t = false, conflicts_with = "cleanup")]
    pub dry_run: bool,

    /// Calendar name, overrides CALENDAR_NAME
    #[arg(long, value_name = "NAME")]
    pub calendar: Option<String>,
}
