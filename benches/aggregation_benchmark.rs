use criterion::{black_box, criterion_group, criterion_main, Criterion};
use recyclens::{
    AggregationPolicy, Candidate, ConfidenceAdjustment, RecyclingClassifier, RuleSet, StaticLabelClassifier,
};

fn imagenet_like_candidates() -> Vec<Candidate> {
    vec![
        Candidate::new("water bottle", 0.41),
        Candidate::new("pop bottle", 0.22),
        Candidate::new("plastic bag", 0.12),
        Candidate::new("banana", 0.08),
        Candidate::new("golden retriever", 0.03),
    ]
}

fn bench_rules(c: &mut Criterion) {
    let rules = RuleSet::standard();
    let mut group = c.benchmark_group("Rules");
    group.sample_size(50);
    group.warm_up_time(std::time::Duration::from_secs(1));

    // Matched by the first recyclable keyword
    group.bench_function("early_keyword", |b| b.iter(|| {
        rules.classify_label(black_box("beer bottle")).unwrap()
    }));

    // Falls through every table to the default
    group.bench_function("default_negative", |b| b.iter(|| {
        rules.classify_label(black_box("Greater Swiss Mountain dog")).unwrap()
    }));

    group.finish();
}

fn bench_policies(c: &mut Criterion) {
    let candidates = imagenet_like_candidates();
    let image: &[u8] = &[];
    let mut group = c.benchmark_group("Policies");
    group.sample_size(50);
    group.warm_up_time(std::time::Duration::from_secs(1));

    let policies = [
        ("single_top", AggregationPolicy::SingleTop { adjustment: ConfidenceAdjustment::None }),
        ("single_top_inflated", AggregationPolicy::SingleTop { adjustment: ConfidenceAdjustment::Inflate }),
        ("weighted", AggregationPolicy::Weighted),
    ];

    for (name, policy) in policies {
        let classifier = RecyclingClassifier::builder()
            .with_label_classifier(StaticLabelClassifier::new(candidates.clone()))
            .with_policy(policy)
            .build()
            .unwrap();

        group.bench_function(format!("classify_{}", name), |b| b.iter(|| {
            classifier.classify(black_box(image)).unwrap()
        }));
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_rules,
    bench_policies
);
criterion_main!(benches);
