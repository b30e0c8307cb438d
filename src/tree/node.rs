use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::TreeError;
use crate::index::{AlphabetMask, RankBitVector};
use crate::tree::corpus::ProteinCorpus;

/// 序列末端的占位符号（出现在蛋白末尾之后的"下一残基"）。
pub const TERMINATOR: u8 = b'$';

/// 肽树节点：某一 tag 下全部出现位置的容器。
///
/// 未切分时 `occurrences` 存该 tag 的所有 (accession, 起始位置)；
/// 切分后按下一残基划入子节点，自身只保留终止于蛋白末端的出现。
/// finalize 时为本层的分支残基序列构建一个 [`RankBitVector`]
/// （多层索引在每个字母表二分层使用的原语）。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    depth: u32,
    occurrences: BTreeMap<String, Vec<u32>>,
    children: BTreeMap<u8, Node>,
    level: Option<RankBitVector>,
}

impl Node {
    pub fn new(depth: u32) -> Self {
        Self {
            depth,
            occurrences: BTreeMap::new(),
            children: BTreeMap::new(),
            level: None,
        }
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn add_occurrence(&mut self, accession: &str, position: u32) {
        self.occurrences
            .entry(accession.to_string())
            .or_default()
            .push(position);
    }

    /// 子树内全部出现的个数（含子节点）。
    pub fn occurrence_count(&self) -> usize {
        let own: usize = self.occurrences.values().map(Vec::len).sum();
        own + self
            .children
            .values()
            .map(Node::occurrence_count)
            .sum::<usize>()
    }

    pub fn is_split(&self) -> bool {
        !self.children.is_empty()
    }

    pub fn child(&self, residue: u8) -> Option<&Node> {
        self.children.get(&residue)
    }

    pub fn children(&self) -> impl Iterator<Item = (u8, &Node)> {
        self.children.iter().map(|(&r, n)| (r, n))
    }

    /// 本层的 rank 位向量（finalize 之后可用）。
    pub fn level(&self) -> Option<&RankBitVector> {
        self.level.as_ref()
    }

    /// 固化节点：超过 `max_node_size` 且深度未达 `max_tag_length`
    /// 时按下一残基切分为子节点并递归处理；同时构建本层的
    /// rank 位向量。对已切分节点重复调用是无操作（幂等，
    /// 重跑时安全地重新 finalize）。
    ///
    /// 语料查询失败（未知 accession、越界出现）让节点保持原样
    /// 并向上返回错误，由 worker 按 tag 隔离处理。
    pub fn finalize_and_split(
        &mut self,
        corpus: &ProteinCorpus,
        max_node_size: usize,
        max_tag_length: usize,
    ) -> Result<(), TreeError> {
        if self.is_split() {
            return Ok(());
        }

        // 先完整收集分支残基，语料损坏时不留下半切分状态
        let branches = self.branch_residues(corpus)?;
        let seq: Vec<u8> = branches.iter().map(|&(_, _, r)| r).collect();
        if self.level.is_none() {
            let mask = AlphabetMask::from_seq(&seq);
            self.level = Some(RankBitVector::new(&seq, &mask));
        }

        let own: usize = self.occurrences.values().map(Vec::len).sum();
        if own <= max_node_size || self.depth as usize >= max_tag_length {
            return Ok(());
        }

        let mut terminal: BTreeMap<String, Vec<u32>> = BTreeMap::new();
        for (accession, position, residue) in branches {
            if residue == TERMINATOR {
                terminal.entry(accession).or_default().push(position);
            } else {
                self.children
                    .entry(residue)
                    .or_insert_with(|| Node::new(self.depth + 1))
                    .add_occurrence(&accession, position);
            }
        }
        self.occurrences = terminal;

        for node in self.children.values_mut() {
            node.finalize_and_split(corpus, max_node_size, max_tag_length)?;
        }
        Ok(())
    }

    /// 把子树内所有出现收集为 (accession, position) 对。
    pub fn collect_occurrences(&self, out: &mut Vec<(String, u32)>) {
        for (accession, positions) in &self.occurrences {
            for &p in positions {
                out.push((accession.clone(), p));
            }
        }
        for node in self.children.values() {
            node.collect_occurrences(out);
        }
    }

    /// 每个出现在 `depth` 偏移处的下一残基（蛋白末端记为 `$`），
    /// 顺序与 occurrences 的迭代顺序一致。
    fn branch_residues(
        &self,
        corpus: &ProteinCorpus,
    ) -> Result<Vec<(String, u32, u8)>, TreeError> {
        let mut out = Vec::new();
        for (accession, positions) in &self.occurrences {
            for &position in positions {
                let next = corpus.residue_after(accession, position, self.depth as usize)?;
                out.push((accession.clone(), position, next.unwrap_or(TERMINATOR)));
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> ProteinCorpus {
        let mut c = ProteinCorpus::new();
        c.insert("P1".to_string(), b"MKAMKC".to_vec());
        c.insert("P2".to_string(), b"AMK".to_vec());
        c
    }

    // tag "MK"：P1 的 0 和 3，P2 的 1
    fn mk_node() -> Node {
        let mut node = Node::new(2);
        node.add_occurrence("P1", 0);
        node.add_occurrence("P1", 3);
        node.add_occurrence("P2", 1);
        node
    }

    #[test]
    fn small_node_stays_leaf_but_builds_level() {
        let corpus = corpus();
        let mut node = mk_node();
        node.finalize_and_split(&corpus, 10, 5).unwrap();
        assert!(!node.is_split());
        assert_eq!(node.occurrence_count(), 3);
        let level = node.level().unwrap();
        assert_eq!(level.len(), 3);
    }

    #[test]
    fn oversized_node_splits_by_next_residue() {
        let corpus = corpus();
        let mut node = mk_node();
        node.finalize_and_split(&corpus, 1, 5).unwrap();
        assert!(node.is_split());
        // 下一残基：P1@0 -> 'A'，P1@3 -> 'C'，P2@1 -> '$'（蛋白末端）
        let a = node.child(b'A').unwrap();
        let mut hits = Vec::new();
        a.collect_occurrences(&mut hits);
        assert_eq!(hits, vec![("P1".to_string(), 0)]);
        assert!(node.child(b'C').is_some());
        // 终止出现留在父节点
        let mut all = Vec::new();
        node.collect_occurrences(&mut all);
        assert_eq!(all.len(), 3);
        assert!(all.contains(&("P2".to_string(), 1)));
    }

    #[test]
    fn depth_limit_stops_splitting() {
        let corpus = corpus();
        let mut node = mk_node();
        node.finalize_and_split(&corpus, 1, 2).unwrap();
        assert!(!node.is_split());
    }

    #[test]
    fn finalize_is_idempotent() {
        let corpus = corpus();
        let mut node = mk_node();
        node.finalize_and_split(&corpus, 1, 5).unwrap();
        let snapshot = node.clone();
        node.finalize_and_split(&corpus, 1, 5).unwrap();
        assert_eq!(node, snapshot);
    }

    #[test]
    fn corrupt_occurrence_leaves_node_untouched() {
        let corpus = corpus();
        let mut node = Node::new(2);
        node.add_occurrence("P1", 99);
        node.add_occurrence("P1", 0);
        let before = node.clone();
        let err = node.finalize_and_split(&corpus, 0, 5).unwrap_err();
        assert!(matches!(err, TreeError::OccurrenceOutOfBounds { .. }));
        assert_eq!(node, before);
    }

    #[test]
    fn unknown_accession_is_reported() {
        let corpus = corpus();
        let mut node = Node::new(1);
        node.add_occurrence("GHOST", 0);
        let err = node.finalize_and_split(&corpus, 0, 5).unwrap_err();
        assert!(matches!(err, TreeError::UnknownAccession(_)));
    }
}
