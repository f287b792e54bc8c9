#![deny(warnings)]

use persistence::default_sqlite_url;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let url = std::env::var("PILOT_DB_URL").unwrap_or_else(|_| default_sqlite_url().to_string());
    let pool = persistence::init_db(&url).await?;
    let stored = persistence::list_scenarios(&pool).await?.len();
    println!("DB migrated at {} ({} scenarios stored)", url, stored);
    Ok(())
}
