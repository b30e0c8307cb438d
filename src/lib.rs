//! # peptree-rust
//!
//! 受 compomics 蛋白树启发的 Rust 版肽段精确检索索引。
//!
//! 本 crate 针对"短肽 -> 超大蛋白库"的精确子串查找问题，提供：
//!
//! - **rank 位向量**：字母表二分的压缩索引原语，O(1) rank / 成员查询
//! - **肽树构建**：按定长 tag 枚举出现位置，节点超限时按残基递归切分
//! - **并发固化**：worker 池排空共享 backlog，逐 tag 容错、批量移除、可取消
//! - **持久化**：节点逐个落盘（bincode），构建可中断、可重跑收敛
//!
//! ## 快速示例
//!
//! ```rust,no_run
//! use peptree_rust::index::{AlphabetMask, RankBitVector};
//! use peptree_rust::tree::{build_tree, BuildLimits, ProteinCorpus, ProteinTree, TagBacklog};
//! use peptree_rust::tree::store::FileNodeStore;
//!
//! // rank 位向量：分区 B 符号的 O(1) 计数
//! let rv = RankBitVector::new(b"ABACBA", &AlphabetMask::from_symbols(b"AB"));
//! assert_eq!(rv.rank(5, false).unwrap(), 2);
//!
//! // 构建并固化肽树
//! let mut corpus = ProteinCorpus::new();
//! corpus.insert("P1".to_string(), b"MKTAYIAKQR".to_vec());
//! let tree = ProteinTree::from_corpus(&corpus, 3);
//! let backlog = TagBacklog::seed(tree.tags());
//! let store = FileNodeStore::create("peptree.idx").unwrap();
//! let report = build_tree(&tree, &corpus, &backlog, &store,
//!     BuildLimits::default(), 4, None);
//! println!("finalized {} tags", report.succeeded);
//! ```
//!
//! ## 模块说明
//!
//! - [`io`] — FASTA 蛋白库解析
//! - [`index`] — rank 位向量与字母表掩码
//! - [`tree`] — 肽树、并发构建 worker、节点仓库、肽查询
//! - [`util`] — 氨基酸编码 / 规范化工具
//! - [`progress`] — 进度上报与协作取消
//! - [`error`] — 分层错误类型

pub mod error;
pub mod index;
pub mod io;
pub mod progress;
pub mod tree;
pub mod util;
