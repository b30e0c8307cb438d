use std::collections::HashMap;
use std::sync::Mutex;

pub mod builder;
pub mod corpus;
pub mod node;
pub mod query;
pub mod store;

pub use builder::{build_tree, BuildLimits, BuildReport, IndexBuilderWorker, TagBacklog};
pub use corpus::ProteinCorpus;
pub use node::Node;
pub use store::{FileNodeStore, Manifest, NodeStore};

/// 以 tag 为键的内存节点表。
///
/// 构建期由所有 worker 只读共享；单个节点放在自己的 Mutex 里，
/// 按队列单次弹出的约定同一 tag 不会被两个 worker 同时固化，
/// 节点锁在实践中无竞争。
#[derive(Debug)]
pub struct ProteinTree {
    tag_length: usize,
    nodes: HashMap<String, Mutex<Node>>,
}

impl ProteinTree {
    /// 枚举语料中全部定长初始 tag 及其出现位置。
    pub fn from_corpus(corpus: &ProteinCorpus, tag_length: usize) -> Self {
        let mut plain: HashMap<String, Node> = HashMap::new();
        for accession in corpus.accessions() {
            let Some(seq) = corpus.residues(accession) else {
                continue;
            };
            if seq.len() < tag_length {
                continue;
            }
            for start in 0..=(seq.len() - tag_length) {
                let tag = String::from_utf8_lossy(&seq[start..start + tag_length]).into_owned();
                plain
                    .entry(tag)
                    .or_insert_with(|| Node::new(tag_length as u32))
                    .add_occurrence(accession, start as u32);
            }
        }
        let nodes = plain
            .into_iter()
            .map(|(tag, node)| (tag, Mutex::new(node)))
            .collect();
        Self { tag_length, nodes }
    }

    pub fn tag_length(&self) -> usize {
        self.tag_length
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, tag: &str) -> Option<&Mutex<Node>> {
        self.nodes.get(tag)
    }

    pub fn tags(&self) -> Vec<String> {
        self.nodes.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_corpus_enumerates_tags_with_occurrences() {
        let mut corpus = ProteinCorpus::new();
        corpus.insert("P1".to_string(), b"MKMK".to_vec());
        corpus.insert("P2".to_string(), b"KM".to_vec());
        let tree = ProteinTree::from_corpus(&corpus, 2);
        // MK (P1@0, P1@2), KM (P1@1, P2@0)
        assert_eq!(tree.len(), 2);
        let mk = tree.get("MK").unwrap().lock().unwrap();
        assert_eq!(mk.occurrence_count(), 2);
        let km = tree.get("KM").unwrap().lock().unwrap();
        assert_eq!(km.occurrence_count(), 2);
    }

    #[test]
    fn short_proteins_are_skipped() {
        let mut corpus = ProteinCorpus::new();
        corpus.insert("P1".to_string(), b"MK".to_vec());
        let tree = ProteinTree::from_corpus(&corpus, 3);
        assert!(tree.is_empty());
    }
}
