//! Serve answers from `rules/ga_rules.json` and `messages/` while the rule
//! file is swapped underneath.
//!
//! Run with `RUST_LOG=routebook=info cargo run --example hot_reload`.

use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use routebook::{Context, DataSources, Engine, Outcome, RuleConfig};

fn main() -> Result<(), routebook::RoutebookError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let root = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let rules_path = root.join("rules/ga_rules.json");
    let messages_dir = root.join("messages");
    let engine = Arc::new(Engine::from_paths(&rules_path, &messages_dir)?);

    for summary in engine.list_rules() {
        println!("{:>4}  {:<20} -> {}", summary.priority, summary.id, summary.message_ref);
    }

    let ctx = Context::new()
        .set("HCCustomerType", "Broker")
        .set("Policy.PolicyState", "CA");
    let ds = DataSources::new().set("fehbp_address", "MailingAddress", "P.O. Box 21542");

    let reader = {
        let engine = Arc::clone(&engine);
        let (ctx, ds) = (ctx.clone(), ds.clone());
        thread::spawn(move || {
            for _ in 0..3 {
                match engine.answer(&ctx, &ds) {
                    Outcome::Answered { matched, .. } => println!("reader: {matched}"),
                    other => println!("reader: {other:?}"),
                }
            }
        })
    };

    // Retire the broker rule and publish the edited configuration.
    let mut config = RuleConfig::from_file(&rules_path)?;
    for rule in &mut config.rules {
        if rule.id == "R002_FEHBP_BROKER" {
            rule.active = false;
        }
    }
    let messages = engine.snapshot().messages().clone();
    engine.reload(config, messages)?;

    let _ = reader.join();
    match engine.answer(&ctx, &ds) {
        Outcome::NoMatch => println!("after reload: no rule matched, caller shows its fallback"),
        other => println!("after reload: {other:?}"),
    }

    // A broken configuration is rejected and the current snapshot keeps serving.
    let broken = RuleConfig::from_json(r#"{"rules": [], "condition_templates": {"a": {"use_template": "a"}}}"#)?;
    if let Err(e) = engine.reload(broken, engine.snapshot().messages().clone()) {
        println!("rejected: {e}");
    }
    println!("still serving {} rules", engine.list_rules().len());
    Ok(())
}
