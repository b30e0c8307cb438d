use crate::error::TreeError;
use crate::tree::corpus::ProteinCorpus;
use crate::tree::store::{Manifest, NodeStore};
use crate::util::aa;

/// 一次精确命中：肽在某蛋白中的起始位置（0 基）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeptideHit {
    pub accession: String,
    pub position: u32,
}

/// 在已持久化的索引中查找肽的全部精确出现。
///
/// 取肽的前 `tag_length` 个残基定位根节点文件，沿子节点按残基
/// 下降，最后对收集到的出现逐一与语料核对剩余残基。
/// 肽短于索引 tag 长度时返回 [`TreeError::PeptideTooShort`]；
/// tag 未命中任何节点文件时返回空结果。
pub fn find_peptide(
    store: &dyn NodeStore,
    manifest: &Manifest,
    corpus: &ProteinCorpus,
    peptide: &str,
) -> Result<Vec<PeptideHit>, TreeError> {
    let residues = aa::normalize_seq(peptide.as_bytes());
    if residues.len() < manifest.tag_length {
        return Err(TreeError::PeptideTooShort(
            peptide.to_string(),
            manifest.tag_length,
        ));
    }

    let tag = String::from_utf8_lossy(&residues[..manifest.tag_length]).into_owned();
    let root = match store.load(&tag) {
        Ok(node) => node,
        Err(crate::error::StoreError::MissingNode(_)) => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    // 沿残基下降到覆盖整个肽前缀的最深节点
    let mut node = &root;
    let mut depth = manifest.tag_length;
    while node.is_split() && depth < residues.len() {
        match node.child(residues[depth]) {
            Some(child) => {
                node = child;
                depth += 1;
            }
            // 已切分但缺少该残基的分支：子树里不可能有命中
            None => return Ok(Vec::new()),
        }
    }

    let mut candidates = Vec::new();
    node.collect_occurrences(&mut candidates);

    let mut hits = Vec::new();
    for (accession, position) in candidates {
        if occurrence_matches(corpus, &accession, position, &residues)? {
            hits.push(PeptideHit {
                accession,
                position,
            });
        }
    }
    hits.sort_by(|a, b| a.accession.cmp(&b.accession).then(a.position.cmp(&b.position)));
    Ok(hits)
}

fn occurrence_matches(
    corpus: &ProteinCorpus,
    accession: &str,
    position: u32,
    residues: &[u8],
) -> Result<bool, TreeError> {
    let seq = corpus
        .residues(accession)
        .ok_or_else(|| TreeError::UnknownAccession(accession.to_string()))?;
    let start = position as usize;
    let end = start + residues.len();
    Ok(end <= seq.len() && &seq[start..end] == residues)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::builder::{build_tree, BuildLimits, TagBacklog};
    use crate::tree::store::FileNodeStore;
    use crate::tree::ProteinTree;

    fn indexed_fixture() -> (ProteinCorpus, FileNodeStore, Manifest, tempfile::TempDir) {
        let mut corpus = ProteinCorpus::new();
        corpus.insert("P1".to_string(), b"MKTAYIAKQR".to_vec());
        corpus.insert("P2".to_string(), b"AYIAKMKTAY".to_vec());
        corpus.insert("P3".to_string(), b"GGGGG".to_vec());

        let tree = ProteinTree::from_corpus(&corpus, 3);
        let backlog = TagBacklog::seed(tree.tags());
        let dir = tempfile::tempdir().unwrap();
        let store = FileNodeStore::create(dir.path()).unwrap();
        let limits = BuildLimits {
            max_node_size: 1,
            max_tag_length: 6,
        };
        let report = build_tree(&tree, &corpus, &backlog, &store, limits, 2, None);
        assert_eq!(report.failed, 0);
        assert!(backlog.is_empty());

        let manifest = Manifest {
            tag_length: 3,
            max_node_size: limits.max_node_size,
            max_tag_length: limits.max_tag_length,
            reference_file: None,
            build_args: None,
            build_timestamp: None,
        };
        (corpus, store, manifest, dir)
    }

    #[test]
    fn finds_hits_across_proteins() {
        let (corpus, store, manifest, _dir) = indexed_fixture();
        let hits = find_peptide(&store, &manifest, &corpus, "AYIAK").unwrap();
        assert_eq!(
            hits,
            vec![
                PeptideHit {
                    accession: "P1".to_string(),
                    position: 3
                },
                PeptideHit {
                    accession: "P2".to_string(),
                    position: 0
                },
            ]
        );
    }

    #[test]
    fn exact_tag_length_peptide_matches() {
        let (corpus, store, manifest, _dir) = indexed_fixture();
        let hits = find_peptide(&store, &manifest, &corpus, "MKT").unwrap();
        assert_eq!(hits.len(), 2); // P1@0, P2@5
    }

    #[test]
    fn repeated_tags_within_one_protein() {
        let (corpus, store, manifest, _dir) = indexed_fixture();
        let hits = find_peptide(&store, &manifest, &corpus, "GGG").unwrap();
        let positions: Vec<u32> = hits.iter().map(|h| h.position).collect();
        assert_eq!(positions, vec![0, 1, 2]);
    }

    #[test]
    fn absent_peptide_yields_no_hits() {
        let (corpus, store, manifest, _dir) = indexed_fixture();
        assert!(find_peptide(&store, &manifest, &corpus, "WWWW")
            .unwrap()
            .is_empty());
        // tag 命中但尾部不匹配
        assert!(find_peptide(&store, &manifest, &corpus, "MKTW")
            .unwrap()
            .is_empty());
    }

    #[test]
    fn too_short_peptide_is_rejected() {
        let (corpus, store, manifest, _dir) = indexed_fixture();
        assert!(matches!(
            find_peptide(&store, &manifest, &corpus, "MK"),
            Err(TreeError::PeptideTooShort(_, 3))
        ));
    }

    #[test]
    fn lowercase_input_is_normalized() {
        let (corpus, store, manifest, _dir) = indexed_fixture();
        let hits = find_peptide(&store, &manifest, &corpus, "ayiak").unwrap();
        assert_eq!(hits.len(), 2);
    }
}
