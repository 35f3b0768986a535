use distress_bedrock::tokens::{TokenCount, get_pricing, usage_for};

#[test]
fn prices_known_model_families() {
    let sonnet = get_pricing("us.anthropic.claude-sonnet-4-5-20250929-v1:0").unwrap();
    assert_eq!(sonnet.input_per_million, 3.0);
    assert!(get_pricing("us.meta.llama3-70b").is_none());
}

#[test]
fn usage_includes_cost() {
    let tokens = TokenCount {
        input: 1_000_000,
        output: 100_000,
    };
    let usage = usage_for("us.anthropic.claude-sonnet-4-5-20250929-v1:0", tokens);
    assert_eq!(usage.tokens.total(), 1_100_000);
    assert!((usage.cost_usd - 4.5).abs() < 1e-9);

    assert_eq!(usage_for("unknown", tokens).cost_usd, 0.0);
}
