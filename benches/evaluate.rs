use criterion::{black_box, criterion_group, criterion_main, Criterion};
use routebook::{
    field, source, use_template, Context, DataSources, MessageCatalog, RuleSetBuilder,
};

/// Build a ruleset with `n` rules where only the last one matches, so every
/// evaluation walks the whole list.
fn build_ruleset(n: usize) -> (routebook::RuleSet, Context, DataSources) {
    let mut builder = RuleSetBuilder::new()
        .template("is_member", field("HCCustomerType").eq("Member"))
        .template("is_fehbp", source("fehbp_address").is_not_empty());

    for i in 0..n {
        let state = format!("S{i}");
        builder = builder.rule(&format!("r{i}"), move |r| {
            r.priority(i64::try_from(i).unwrap_or(i64::MAX))
                .when(
                    use_template("is_member")
                        .and(use_template("is_fehbp"))
                        .and(field("Policy.PolicyState").eq(state.as_str())),
                )
                .message("MSG")
        });
    }

    let ctx = Context::new()
        .set("HCCustomerType", "member")
        .set("Policy.PolicyState", format!("S{}", n - 1));
    let ds = DataSources::new().set("fehbp_address", "MailingAddress", "PO Box 1");
    (builder.compile().unwrap(), ctx, ds)
}

fn bench_evaluate(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_eval");

    for &n in &[5, 20, 50] {
        let (ruleset, ctx, ds) = build_ruleset(n);
        group.bench_function(format!("{n}_rules_last_match"), |b| {
            b.iter(|| ruleset.evaluate(black_box(&ctx), black_box(&ds)));
        });
        group.bench_function(format!("{n}_rules_no_match"), |b| {
            let empty = Context::new();
            b.iter(|| ruleset.evaluate(black_box(&empty), black_box(&ds)));
        });
    }

    group.finish();
}

fn bench_compilation(c: &mut Criterion) {
    let mut group = c.benchmark_group("compilation");

    for &n in &[5, 20, 50] {
        group.bench_function(format!("{n}_rules"), |b| {
            b.iter(|| black_box(build_ruleset(n)));
        });
    }

    group.finish();
}

fn bench_resolve(c: &mut Criterion) {
    let catalog = MessageCatalog::new().with(
        "FEHBP_MEMBER",
        "---\nid: FEHBP_MEMBER\n---\n**FEHBP member** in {{Policy.PolicyState}}\n\n\
         Mail to:\n{{fehbp_address.MailingAddress}}\n\n\
         | Channel | Detail |\n|---|---|\n| Missing | {{unknown_token}} |\n",
    );
    let ctx = Context::new().set("Policy.PolicyState", "VA");
    let ds = DataSources::new().set("fehbp_address", "MailingAddress", "PO Box 1\nEagan, MN");

    c.bench_function("resolve_message", |b| {
        b.iter(|| catalog.resolve(black_box("FEHBP_MEMBER"), black_box(&ctx), black_box(&ds)));
    });
}

criterion_group!(benches, bench_evaluate, bench_compilation, bench_resolve);
criterion_main!(benches);
