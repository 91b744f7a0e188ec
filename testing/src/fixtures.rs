use config::{AnnexConfig, SearchConfig};
use gin_core::Repository;
use std::path::{Path, PathBuf};

/// 16-byte key, selects AES-128.
pub const TEST_KEY_128: &str = "0123456789abcdef";

/// 32-byte key, selects AES-256.
pub const TEST_KEY_256: &str = "0123456789abcdef0123456789abcdef";

pub fn repository(id: i64, owner: &str, name: &str) -> Repository {
    let path = PathBuf::from("/data/repos")
        .join(owner)
        .join(format!("{name}.git"));
    Repository::new(id, owner, name, path)
}

/// Repository 42, `alice/myrepo`.
pub fn alice_repo() -> Repository {
    repository(42, "alice", "myrepo")
}

/// A repository whose path points into `root`, for tests that touch disk.
pub fn repository_at(id: i64, root: &Path) -> Repository {
    let name = crate::unique_id("repo");
    Repository::new(id, "tester", name.clone(), root.join(format!("{name}.git")))
}

/// Search settings with indexing pointed at `index_url` and the 128-bit
/// test key.
pub fn search_config(index_url: &str) -> SearchConfig {
    SearchConfig {
        index_url: Some(index_url.to_string()),
        key: TEST_KEY_128.to_string(),
        ..Default::default()
    }
}

pub fn annex_config() -> AnnexConfig {
    AnnexConfig::default()
}
