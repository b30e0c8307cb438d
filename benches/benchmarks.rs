use criterion::{black_box, criterion_group, criterion_main, Criterion};

use peptree_rust::index::{AlphabetMask, RankBitVector};
use peptree_rust::tree::{build_tree, BuildLimits, ProteinCorpus, ProteinTree, TagBacklog};

fn make_protein(len: usize, seed: u32) -> Vec<u8> {
    let residues = b"ACDEFGHIKLMNPQRSTVWY";
    let mut seq = Vec::with_capacity(len);
    let mut x: u32 = seed;
    for _ in 0..len {
        x = x.wrapping_mul(1_103_515_245).wrapping_add(12_345);
        seq.push(residues[(x >> 16) as usize % residues.len()]);
    }
    seq
}

fn bench_rank_query(c: &mut Criterion) {
    let text = make_protein(100_000, 42);
    let rv = RankBitVector::new(&text, &AlphabetMask::from_seq(&text));
    let mut i = 0usize;

    c.bench_function("rank_query_100k", |b| {
        b.iter(|| {
            i = (i * 7 + 13) % text.len();
            black_box(rv.rank(black_box(i), false).unwrap());
        })
    });
}

fn bench_rank_build(c: &mut Criterion) {
    let text = make_protein(100_000, 7);
    let mask = AlphabetMask::from_seq(&text);

    c.bench_function("rank_build_100k", |b| {
        b.iter(|| {
            black_box(RankBitVector::new(black_box(&text), &mask));
        })
    });
}

fn bench_backlog_drain(c: &mut Criterion) {
    use peptree_rust::error::StoreError;
    use peptree_rust::tree::{Node, NodeStore};

    /// 丢弃写入的仓库，只测固化与批量移除的开销
    struct NullStore;
    impl NodeStore for NullStore {
        fn commit(&self, _tag: &str, _node: &Node) -> Result<(), StoreError> {
            Ok(())
        }
        fn load(&self, tag: &str) -> Result<Node, StoreError> {
            Err(StoreError::MissingNode(tag.to_string()))
        }
    }

    let mut corpus = ProteinCorpus::new();
    for i in 0..20 {
        corpus.insert(format!("P{i}"), make_protein(2_000, 100 + i));
    }
    let tree = ProteinTree::from_corpus(&corpus, 2);
    let store = NullStore;
    let limits = BuildLimits {
        max_node_size: 50,
        max_tag_length: 6,
    };

    c.bench_function("backlog_drain_2aa_tags", |b| {
        b.iter(|| {
            let backlog = TagBacklog::seed(tree.tags());
            black_box(build_tree(&tree, &corpus, &backlog, &store, limits, 4, None));
        })
    });
}

criterion_group!(benches, bench_rank_query, bench_rank_build, bench_backlog_drain);
criterion_main!(benches);
