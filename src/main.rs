use std::sync::Arc;

use clap::Parser;
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use course_manager::config::Config;
use course_manager::console::Console;
use course_manager::db::{self, SqliteCourseRepository};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let config = Config::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.log_filter))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let pool = db::connect(&config.database_url).await?;
    db::migrate(&pool).await?;
    info!("database ready");

    let courses = Arc::new(SqliteCourseRepository::new(pool.clone()));
    let input = BufReader::new(tokio::io::stdin());
    let mut console = Console::new(input, tokio::io::stdout(), courses);
    let outcome = console.run().await;

    pool.close().await;
    info!("connection closed");

    outcome?;
    Ok(())
}
