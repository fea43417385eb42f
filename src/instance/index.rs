//! Dataset discovery and pairing.
//!
//! The data root holds one sub-directory per dataset (minus a configured
//! blacklist). File listing is paginated and filterable; instance/solution
//! pairing matches by file stem, case-insensitively, anywhere under the
//! dataset directory.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{Error, Result};

pub const INSTANCE_EXTS: &[&str] = &["vrp", "xml", "txt"];
pub const SOLUTION_EXTS: &[&str] = &["sol", "xml", "txt"];
const DEFAULT_EXTS: &[&str] = &["vrp", "xml", "txt", "sol"];

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DatasetInfo {
    pub name: String,
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FileEntry {
    pub name: String,
    pub relpath: String,
    pub abspath: String,
    pub size: u64,
}

impl FileEntry {
    fn from_path(root: &Path, path: &Path) -> FileEntry {
        FileEntry {
            name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            relpath: path
                .strip_prefix(root)
                .unwrap_or(path)
                .to_string_lossy()
                .into_owned(),
            abspath: path.to_string_lossy().into_owned(),
            size: std::fs::metadata(path).map(|m| m.len()).unwrap_or(0),
        }
    }

    fn ext(&self) -> String {
        Path::new(&self.name)
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FilePage {
    pub items: Vec<FileEntry>,
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PairedFile {
    #[serde(flatten)]
    pub entry: FileEntry,
    pub dataset: String,
    pub kind: String,
    pub ext: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Pair {
    pub instance: Option<PairedFile>,
    pub solution: Option<PairedFile>,
}

/// Listing options for [`DatasetIndex::list_files`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    pub q: Option<String>,
    pub exts: Option<Vec<String>>,
    /// "instances" or "solutions".
    pub kind: Option<String>,
    pub sort: Option<String>,
    pub order: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

pub struct DatasetIndex {
    root: PathBuf,
    exclude: Vec<String>,
}

fn walk(dir: &Path, out: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else { return };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            walk(&path, out);
        } else if path.is_file() {
            out.push(path);
        }
    }
}

impl DatasetIndex {
    pub fn new(root: PathBuf, exclude: Vec<String>) -> Self {
        DatasetIndex { root, exclude }
    }

    /// Sub-directories of the data root, blacklist removed, sorted by name.
    pub fn list_datasets(&self) -> Vec<DatasetInfo> {
        let mut datasets: Vec<DatasetInfo> = Vec::new();
        if let Ok(entries) = std::fs::read_dir(&self.root) {
            for entry in entries.flatten() {
                let path = entry.path();
                if !path.is_dir() {
                    continue;
                }
                let name = entry.file_name().to_string_lossy().into_owned();
                if self
                    .exclude
                    .iter()
                    .any(|ex| ex.eq_ignore_ascii_case(&name))
                {
                    continue;
                }
                datasets.push(DatasetInfo {
                    name,
                    path: path.to_string_lossy().into_owned(),
                });
            }
        }
        datasets.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        datasets
    }

    fn dataset_root(&self, dataset: &str) -> Result<(String, PathBuf)> {
        self.list_datasets()
            .into_iter()
            .find(|ds| ds.name.eq_ignore_ascii_case(dataset))
            .map(|ds| {
                let path = PathBuf::from(&ds.path);
                (ds.name, path)
            })
            .ok_or_else(|| Error::NotFound(format!("dataset '{dataset}'")))
    }

    /// Absolute path for a file inside a dataset, by relative path.
    pub fn resolve(&self, dataset: &str, relpath: &str) -> Result<PathBuf> {
        let (_, root) = self.dataset_root(dataset)?;
        let path = root.join(relpath);
        if path.is_file() {
            Ok(path)
        } else {
            Err(Error::NotFound(format!("{relpath} in dataset '{dataset}'")))
        }
    }

    /// Paginated, filtered, sorted file listing for one dataset.
    pub fn list_files(&self, dataset: &str, query: &ListQuery) -> Result<FilePage> {
        let (_, root) = self.dataset_root(dataset)?;

        let exts_use: Vec<String> = {
            let base: Vec<String> = query
                .exts
                .clone()
                .unwrap_or_else(|| DEFAULT_EXTS.iter().map(|e| e.to_string()).collect())
                .into_iter()
                .map(|e| e.trim_start_matches('.').to_lowercase())
                .collect();
            match query.kind.as_deref() {
                Some("instances") => base
                    .into_iter()
                    .filter(|e| INSTANCE_EXTS.contains(&e.as_str()))
                    .collect(),
                Some("solutions") => base
                    .into_iter()
                    .filter(|e| SOLUTION_EXTS.contains(&e.as_str()))
                    .collect(),
                _ => base,
            }
        };

        let mut paths = Vec::new();
        walk(&root, &mut paths);

        let mut files: Vec<FileEntry> = paths
            .iter()
            .map(|p| FileEntry::from_path(&root, p))
            .filter(|f| exts_use.contains(&f.ext()))
            .collect();

        if let Some(q) = &query.q {
            let needle = q.to_lowercase();
            files.retain(|f| {
                f.name.to_lowercase().contains(&needle)
                    || f.relpath.to_lowercase().contains(&needle)
            });
        }

        let descending = query.order.as_deref().unwrap_or("asc").eq_ignore_ascii_case("desc");
        match query.sort.as_deref() {
            Some("size") => files.sort_by_key(|f| f.size),
            _ => files.sort_by_key(|f| f.name.to_lowercase()),
        }
        if descending {
            files.reverse();
        }

        let total = files.len();
        let offset = query.offset.unwrap_or(0);
        let limit = query.limit.unwrap_or(100);
        let items = files.into_iter().skip(offset).take(limit).collect();

        Ok(FilePage { items, total, limit, offset })
    }

    /// First instance and first solution whose stem matches `name`
    /// (case-insensitive; `"c101"` and `"c101.vrp"` are equivalent).
    pub fn find_pair(&self, dataset: &str, name: &str) -> Result<Pair> {
        let (dataset_name, root) = self.dataset_root(dataset)?;
        let target = Path::new(name)
            .file_stem()
            .map(|s| s.to_string_lossy().to_lowercase())
            .unwrap_or_else(|| name.to_lowercase());

        let mut paths = Vec::new();
        walk(&root, &mut paths);
        paths.sort();

        let mut instance: Option<FileEntry> = None;
        let mut solution: Option<FileEntry> = None;

        for path in &paths {
            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().to_lowercase())
                .unwrap_or_default();
            if stem != target {
                continue;
            }
            let entry = FileEntry::from_path(&root, path);
            let ext = entry.ext();
            if instance.is_none() && INSTANCE_EXTS.contains(&ext.as_str()) {
                instance = Some(entry);
            } else if solution.is_none() && SOLUTION_EXTS.contains(&ext.as_str()) {
                solution = Some(entry);
            }
            if instance.is_some() && solution.is_some() {
                break;
            }
        }

        let publish = |entry: Option<FileEntry>, kind: &str| {
            entry.map(|e| {
                let ext = e.ext();
                PairedFile {
                    entry: e,
                    dataset: dataset_name.clone(),
                    kind: kind.to_string(),
                    ext,
                }
            })
        };

        Ok(Pair {
            instance: publish(instance, "instance"),
            solution: publish(solution, "solution"),
        })
    }
}
