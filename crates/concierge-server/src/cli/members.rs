use crate::config::ConciergeConfig;
use crate::engine;
use anyhow::Result;
use concierge_core::Strategy;

pub async fn run(config: ConciergeConfig, strategy: Option<Strategy>) -> Result<()> {
    let engine = engine::build(&config, strategy)?;
    let overview = engine.answer.members().await?;

    println!(
        "{} members, {} messages\n",
        overview.unique_members, overview.total_messages
    );
    println!("{:<28} {:>8}  {:<20}  LATEST", "MEMBER", "MESSAGES", "WHEN");
    for member in &overview.members {
        let when: String = member.latest_timestamp.chars().take(19).collect();
        let latest: String = member.latest_message.chars().take(60).collect();
        println!(
            "{:<28} {:>8}  {:<20}  {}",
            member.name, member.message_count, when, latest
        );
    }
    Ok(())
}
