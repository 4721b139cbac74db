use recyclens::{
    adjust_confidence, aggregate_single, aggregate_weighted, AggregationPolicy, Candidate, Category,
    ConfidenceAdjustment, MatchedRule, RuleSet,
};

fn classify(label: &str) -> Category {
    RuleSet::standard().classify_label(label).unwrap().category
}

#[test]
fn test_every_recyclable_keyword_is_recyclable() {
    let rules = RuleSet::standard();
    for keyword in rules.recyclable_keywords() {
        // Skip keywords that a special case intercepts first
        if keyword.contains("bag") || keyword.contains("packet") {
            continue;
        }
        assert_eq!(classify(keyword), Category::Recyclable, "keyword '{}'", keyword);
        assert_eq!(classify(&format!("Large {} Item", keyword.to_uppercase())), Category::Recyclable);
    }
}

#[test]
fn test_recyclable_keyword_beats_non_recyclable_keyword() {
    let rules = RuleSet::standard();
    for non in rules.non_recyclable_keywords() {
        let label = format!("{} jar", non);
        if label.contains("bag") || label.contains("packet") {
            continue;
        }
        let matched = rules.classify_label(&label).unwrap();
        assert_eq!(matched.category, Category::Recyclable, "label '{}'", label);
        assert!(matches!(matched.rule, MatchedRule::RecyclableKeyword(_)));
    }
}

#[test]
fn test_unmatched_labels_default_negative() {
    for label in ["golden retriever", "hen", "tabby", "daisy", "sports car"] {
        let matched = RuleSet::standard().classify_label(label).unwrap();
        assert_eq!(matched.category, Category::NonRecyclable, "label '{}'", label);
        assert!(matched.is_uncertain(), "label '{}'", label);
    }
}

#[test]
fn test_plastic_bottle_round_trip() {
    assert_eq!(classify("plastic bottle"), Category::Recyclable);
}

#[test]
fn test_carton_special_case() {
    let rules = RuleSet::standard();

    let matched = rules.classify_label("milk carton").unwrap();
    assert_eq!(matched.category, Category::Recyclable);
    assert_eq!(matched.rule, MatchedRule::SpecialCase(0));

    // "egg" disables the special case; "carton" is still a recyclable keyword
    let matched = rules.classify_label("egg carton").unwrap();
    assert_eq!(matched.category, Category::Recyclable);
    assert_eq!(matched.rule, MatchedRule::RecyclableKeyword("carton".into()));
}

#[test]
fn test_packet_and_bag_special_case() {
    assert_eq!(classify("crisp packet"), Category::NonRecyclable);
    assert_eq!(classify("paper bag"), Category::NonRecyclable);
    assert_eq!(classify("mailbag"), Category::NonRecyclable);
}

#[test]
fn test_adjust_confidence_points() {
    assert!((adjust_confidence(0.5) - 0.925).abs() < 1e-6);
    assert_eq!(adjust_confidence(0.8), 0.8);
    assert_eq!(adjust_confidence(0.95), 0.95);
}

#[test]
fn test_weighted_bottle_apple() {
    let verdict = aggregate_weighted(
        &[Candidate::new("bottle", 0.6), Candidate::new("apple", 0.4)],
        RuleSet::standard(),
    )
    .unwrap();
    assert_eq!(verdict.category, Category::Recyclable);
    assert!((verdict.confidence - 0.6).abs() < 1e-6);
}

#[test]
fn test_weighted_all_zero_scores() {
    let verdict = aggregate_weighted(
        &[Candidate::new("bottle", 0.0), Candidate::new("apple", 0.0)],
        RuleSet::standard(),
    )
    .unwrap();
    assert_eq!(verdict.category, Category::NonRecyclable);
    assert_eq!(verdict.confidence, 0.0);
}

#[test]
fn test_single_top_tin_can_boosted() {
    let verdict = aggregate_single(
        &[Candidate::new("tin can", 0.42), Candidate::new("banana", 0.3)],
        RuleSet::standard(),
        ConfidenceAdjustment::Inflate,
    )
    .unwrap();
    assert!(verdict.is_recyclable());
    assert!((verdict.confidence - 0.913).abs() < 1e-6);
    assert_eq!(verdict.original_confidence, Some(0.42));
    assert_eq!(verdict.confidence_boosted, Some(true));
    assert_eq!(verdict.top_label, "tin can");
}

#[test]
fn test_confidence_stays_in_unit_interval() {
    let policies = [
        AggregationPolicy::SingleTop { adjustment: ConfidenceAdjustment::None },
        AggregationPolicy::SingleTop { adjustment: ConfidenceAdjustment::Inflate },
        AggregationPolicy::Weighted,
    ];
    let sets = [
        vec![Candidate::new("bottle", 1.0)],
        vec![Candidate::new("apple", 3.5), Candidate::new("jar", 2.0)],
        vec![Candidate::new("tabby", 0.01)],
    ];
    for policy in policies {
        for candidates in &sets {
            let verdict = policy.aggregate(candidates, RuleSet::standard()).unwrap();
            assert!((0.0..=1.0).contains(&verdict.confidence), "{:?} {:?}", policy, candidates);
        }
    }
}
