use thiserror::Error;

/// rank 位向量的查询错误。
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RankError {
    /// 位置超出向量范围（包括对空向量的任何查询）。
    #[error("position {index} out of range for bit-vector of length {length}")]
    OutOfRange { index: usize, length: usize },
}

/// 节点持久化错误。
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Codec(#[from] bincode::Error),
    #[error("no committed node for tag '{0}'")]
    MissingNode(String),
}

/// 树构建 / 查询过程中的单 tag 错误。
///
/// 这些错误在 worker 内按 tag 隔离：记录、计数、保留 backlog 条目，
/// 从不中止整个构建。
#[derive(Debug, Error)]
pub enum TreeError {
    #[error("tag '{0}' not present in the tree")]
    UnknownTag(String),
    #[error("accession '{0}' not present in the corpus")]
    UnknownAccession(String),
    #[error("occurrence at position {position} exceeds protein '{accession}' of length {length}")]
    OccurrenceOutOfBounds {
        accession: String,
        position: u32,
        length: usize,
    },
    #[error("node for tag '{0}' is poisoned by a previous panic")]
    NodePoisoned(String),
    #[error("peptide '{0}' is shorter than the index tag length {1}")]
    PeptideTooShort(String, usize),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Rank(#[from] RankError),
}
