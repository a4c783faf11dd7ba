use routebook::{
    field, source, use_template, Context, DataSources, Engine, MessageCatalog, Outcome,
    RuleSetBuilder,
};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    // Define rules
    let ruleset = RuleSetBuilder::new()
        .template("is_member", field("HCCustomerType").eq("Member"))
        .rule("R001_FEHBP_MEMBER", |r| {
            r.priority(10)
                .when(use_template("is_member").and(source("fehbp_address").is_not_empty()))
                .message("FEHBP_MEMBER")
        })
        .rule("R003_NATIONAL", |r| {
            r.priority(30)
                .when(source("account_type").field("AccountType").eq("National"))
                .message("NATIONAL")
                .sub_rule("R003_NATIONAL_CA", |s| {
                    s.when(field("Policy.PolicyState").eq("CA")).message("NATIONAL_CA")
                })
        })
        .compile()
        .expect("failed to compile ruleset");

    println!("{ruleset}");

    let messages = MessageCatalog::new()
        .with("FEHBP_MEMBER", "Send your appeal to:\n{{fehbp_address.MailingAddress}}")
        .with("NATIONAL", "National appeals for {{Policy.PolicyState}} are handled centrally.")
        .with("NATIONAL_CA", "California national accounts follow the DMHC process.");
    let engine = Engine::new(ruleset, messages);

    // Evaluate against a context
    let ctx = Context::new()
        .set("HCCustomerType", "member")
        .set("Policy.PolicyState", "VA");
    let ds = DataSources::new().set(
        "fehbp_address",
        "MailingAddress",
        "P.O. Box 21542\nEagan, MN 55121",
    );

    match engine.answer(&ctx, &ds) {
        Outcome::Answered { matched, message } => {
            println!("Result: {matched}");
            println!("{}", message.markdown);
            println!("{}", message.html);
        }
        Outcome::MissingMessage(matched) => println!("{matched} has no message template."),
        Outcome::NoMatch => println!("No rule matched."),
    }

    // Detailed report for a national California account
    let ctx = Context::new().set("Policy.PolicyState", "CA");
    let ds = DataSources::new().set("account_type", "AccountType", "National");
    let report = engine.snapshot().rules().evaluate_detailed(&ctx, &ds);
    println!("{report}");
}
