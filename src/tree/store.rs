use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::tree::node::Node;

/// 节点持久化接口（worker 的写出口）。
///
/// `commit` 必须是幂等的：同一 tag 重复提交覆盖同一份数据，
/// 重跑时对已固化节点的二次提交无害。
pub trait NodeStore: Sync {
    fn commit(&self, tag: &str, node: &Node) -> Result<(), StoreError>;
    fn load(&self, tag: &str) -> Result<Node, StoreError>;
}

/// 索引清单：查询端需要的构建参数与溯源信息。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub tag_length: usize,
    pub max_node_size: usize,
    pub max_tag_length: usize,
    pub reference_file: Option<String>,
    pub build_args: Option<String>,
    pub build_timestamp: Option<String>,
}

/// 目录式节点仓库：每个 tag 一个 bincode 文件。
#[derive(Debug, Clone)]
pub struct FileNodeStore {
    dir: PathBuf,
}

impl FileNodeStore {
    /// 新建仓库目录（已存在则复用，重跑场景）。
    pub fn create(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        fs::create_dir_all(dir.as_ref())?;
        Ok(Self {
            dir: dir.as_ref().to_path_buf(),
        })
    }

    /// 打开已有仓库目录。
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = dir.as_ref().to_path_buf();
        if !dir.is_dir() {
            return Err(StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("index directory '{}' does not exist", dir.display()),
            )));
        }
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    // tag 仅含残基码（A-Z 与 '$' 不会出现在 tag 中），可直接做文件名
    fn node_path(&self, tag: &str) -> PathBuf {
        self.dir.join(format!("{tag}.node"))
    }

    fn manifest_path(&self) -> PathBuf {
        self.dir.join("manifest.bin")
    }

    pub fn save_manifest(&self, manifest: &Manifest) -> Result<(), StoreError> {
        let mut f = fs::File::create(self.manifest_path())?;
        bincode::serialize_into(&mut f, manifest)?;
        Ok(())
    }

    pub fn load_manifest(&self) -> Result<Manifest, StoreError> {
        let f = fs::File::open(self.manifest_path())?;
        Ok(bincode::deserialize_from(f)?)
    }
}

impl NodeStore for FileNodeStore {
    fn commit(&self, tag: &str, node: &Node) -> Result<(), StoreError> {
        let mut f = fs::File::create(self.node_path(tag))?;
        bincode::serialize_into(&mut f, node)?;
        Ok(())
    }

    fn load(&self, tag: &str) -> Result<Node, StoreError> {
        let path = self.node_path(tag);
        if !path.is_file() {
            return Err(StoreError::MissingNode(tag.to_string()));
        }
        let f = fs::File::open(path)?;
        Ok(bincode::deserialize_from(f)?)
    }
}
