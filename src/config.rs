use clap::Parser;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://courses.db";
pub const DEFAULT_LOG_FILTER: &str = "course_manager=warn";

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Manage course records from the console.")]
pub struct Config {
    /// SQLite database to open; created when missing.
    #[arg(long, env = "DATABASE_URL", default_value = DEFAULT_DATABASE_URL)]
    pub database_url: String,

    /// Log filter directive, e.g. `course_manager=debug`. Logs go to stderr.
    #[arg(long = "log", env = "RUST_LOG", default_value = DEFAULT_LOG_FILTER)]
    pub log_filter: String,
}
