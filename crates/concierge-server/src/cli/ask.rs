use crate::cli::AskArgs;
use crate::config::ConciergeConfig;
use crate::engine;
use anyhow::Result;
use concierge_core::Strategy;

pub async fn run(args: AskArgs, config: ConciergeConfig, strategy: Option<Strategy>) -> Result<()> {
    let engine = engine::build(&config, strategy)?;

    if args.detailed {
        let detail = engine.answer.answer_detailed(&args.question).await?;
        println!("{}", serde_json::to_string_pretty(&detail)?);
        return Ok(());
    }

    let result = engine.answer.answer(&args.question).await?;
    println!("{}", result.answer);
    if let Some(confidence) = result.confidence {
        println!("\nConfidence: {:.2}", confidence);
    }
    Ok(())
}
