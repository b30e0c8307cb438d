//! 演示如何在 library 模式下使用 peptree-rust 构建并查询肽索引。
//!
//! 运行方式：
//! ```bash
//! cargo run --example build_and_query
//! ```

use peptree_rust::index::{AlphabetMask, RankBitVector};
use peptree_rust::progress::AtomicProgress;
use peptree_rust::tree::store::{FileNodeStore, Manifest};
use peptree_rust::tree::{build_tree, query, BuildLimits, ProteinCorpus, ProteinTree, TagBacklog};

fn main() {
    // 1. 构建参考蛋白库
    let mut corpus = ProteinCorpus::new();
    corpus.insert("sp|P1|DEMO1".to_string(), b"MKTAYIAKQRQISFVKSHFSRQLEERLGLIEVQ".to_vec());
    corpus.insert("sp|P2|DEMO2".to_string(), b"AYIAKQRMKTAYIAK".to_vec());
    corpus.insert("sp|P3|DEMO3".to_string(), b"GGSGGSGGSGG".to_vec());
    println!("蛋白数: {}", corpus.len());
    println!("残基总数: {}", corpus.total_residues());

    // 2. rank 位向量原语
    let rv = RankBitVector::new(b"ABACBA", &AlphabetMask::from_symbols(b"AB"));
    println!("\nrank 位向量（'ABACBA'，分区 {{B}}）:");
    println!("  rank(5, ones)  = {}", rv.rank(5, false).unwrap());
    println!("  rank(5, zeros) = {}", rv.rank(5, true).unwrap());

    // 3. 枚举 tag 并并发固化
    let tree = ProteinTree::from_corpus(&corpus, 3);
    let backlog = TagBacklog::seed(tree.tags());
    println!("\n待固化 tag 数: {}", backlog.len());

    let dir = std::env::temp_dir().join("peptree-demo");
    let store = FileNodeStore::create(&dir).expect("cannot create demo index dir");
    let limits = BuildLimits {
        max_node_size: 2,
        max_tag_length: 8,
    };
    let progress = AtomicProgress::new();
    let report = build_tree(&tree, &corpus, &backlog, &store, limits, 4, Some(&progress));
    println!(
        "固化完成: ok={} failed={} 批量移除={} 次",
        report.succeeded, report.failed, report.batch_flushes
    );

    // 4. 肽查询
    let manifest = Manifest {
        tag_length: 3,
        max_node_size: limits.max_node_size,
        max_tag_length: limits.max_tag_length,
        reference_file: None,
        build_args: None,
        build_timestamp: None,
    };
    for peptide in ["AYIAK", "MKTAYIAK", "GGSGG", "WWWW"] {
        match query::find_peptide(&store, &manifest, &corpus, peptide) {
            Ok(hits) if hits.is_empty() => println!("{peptide}: 无命中"),
            Ok(hits) => {
                println!("{peptide}: {} 处命中", hits.len());
                for h in hits {
                    println!("  {} @ {}", h.accession, h.position);
                }
            }
            Err(e) => println!("{peptide}: 查询失败 {e}"),
        }
    }

    println!("\n完成！");
}
