use criterion::{Criterion, criterion_group, criterion_main};
use rowflow::*;

fn word_count(docs: usize) -> usize {
    let graph = Graph::from_iter("docs")
        .map(Split::new("text"))
        .sort(&["text"])
        .reduce(Count::new("count"), &["text"])
        .sort(&["count", "text"]);
    let bindings = SourceBindings::new().bind("docs", move || {
        (0..docs).map(|i| row! {"doc_id" => i as i64, "text" => "sort reduce and count some words"})
    });
    graph.run(&bindings).unwrap().count()
}

fn sorted_join(rows: usize) -> usize {
    let left = Graph::from_iter("left").sort(&["id"]);
    let right = Graph::from_iter("right").sort(&["id"]);
    let graph = left.join(InnerJoiner::new(), &right, &["id"]);
    let bindings = SourceBindings::new()
        .bind("left", move || {
            (0..rows).map(|i| row! {"id" => i as i64, "a" => i as i64})
        })
        .bind("right", move || {
            (0..rows).map(|i| row! {"id" => (rows - 1 - i) as i64, "b" => i as i64})
        });
    graph.run(&bindings).unwrap().count()
}

fn bench(crit: &mut Criterion) {
    crit.bench_function("word_count_1k_docs", |b| {
        b.iter(|| std::hint::black_box(word_count(1_000)))
    });
    crit.bench_function("sorted_join_10k", |b| {
        b.iter(|| std::hint::black_box(sorted_join(10_000)))
    });
}

criterion_group!(benches, bench);
criterion_main!(benches);
