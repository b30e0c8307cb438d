use std::collections::HashMap;

use anyhow::Result;
use std::io::BufRead;

use crate::error::TreeError;
use crate::io::fasta::FastaReader;
use crate::util::aa;

/// 内存中的参考蛋白库：accession -> 规范化残基序列。
///
/// 构建期被所有 worker 只读共享；没有任何进程级单例，
/// 由调用方显式构造并传入（替代原版的全局 SequenceFactory）。
#[derive(Debug, Default, Clone)]
pub struct ProteinCorpus {
    proteins: HashMap<String, Vec<u8>>,
    order: Vec<String>,
}

impl ProteinCorpus {
    pub fn new() -> Self {
        Self::default()
    }

    /// 从 FASTA 输入流读入全部蛋白。空序列被跳过。
    pub fn from_fasta<R: BufRead>(reader: R) -> Result<Self> {
        let mut corpus = Self::new();
        let mut fasta = FastaReader::new(reader);
        while let Some(rec) = fasta.next_record()? {
            let residues = aa::normalize_seq(&rec.seq);
            if residues.is_empty() {
                continue;
            }
            corpus.insert(rec.id, residues);
        }
        Ok(corpus)
    }

    pub fn insert(&mut self, accession: String, residues: Vec<u8>) {
        if !self.proteins.contains_key(&accession) {
            self.order.push(accession.clone());
        }
        self.proteins.insert(accession, residues);
    }

    pub fn len(&self) -> usize {
        self.proteins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proteins.is_empty()
    }

    pub fn total_residues(&self) -> usize {
        self.proteins.values().map(Vec::len).sum()
    }

    /// 按读入顺序枚举 accession。
    pub fn accessions(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn residues(&self, accession: &str) -> Option<&[u8]> {
        self.proteins.get(accession).map(Vec::as_slice)
    }

    /// 取某次出现之后的残基；出现位置越界视为节点数据损坏。
    pub fn residue_after(
        &self,
        accession: &str,
        position: u32,
        offset: usize,
    ) -> Result<Option<u8>, TreeError> {
        let seq = self
            .residues(accession)
            .ok_or_else(|| TreeError::UnknownAccession(accession.to_string()))?;
        let start = position as usize;
        if start >= seq.len() {
            return Err(TreeError::OccurrenceOutOfBounds {
                accession: accession.to_string(),
                position,
                length: seq.len(),
            });
        }
        Ok(seq.get(start + offset).copied())
    }
}
