///! Ranking store - identifier → rank map backed by a tab-separated file
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

use super::comments::CommentStore;
use super::rank::{Rank, RankScale};
use crate::error::Result;

/// Suffix appended to the rankings file stem to name the comments companion
const COMMENTS_SUFFIX: &str = "_comments";

/// Path of the comments companion for a rankings file.
///
/// `rankings.txt` → `rankings_comments.txt`, `out` → `out_comments`.
pub fn comments_path(rankings_path: &Path) -> PathBuf {
    let stem = rankings_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match rankings_path.extension() {
        Some(ext) => format!("{}{}.{}", stem, COMMENTS_SUFFIX, ext.to_string_lossy()),
        None => format!("{}{}", stem, COMMENTS_SUFFIX),
    };
    rankings_path.with_file_name(name)
}

/// In-memory rankings validated against a [`RankScale`]
#[derive(Debug, Clone, Default)]
pub struct RankingStore {
    ranks: HashMap<String, Rank>,
    scale: RankScale,
}

impl RankingStore {
    pub fn new(scale: RankScale) -> Self {
        Self {
            ranks: HashMap::new(),
            scale,
        }
    }

    /// Load a rankings file; never fails.
    ///
    /// A missing file yields an empty store. Lines whose rank field is empty
    /// are unranked; lines whose rank does not parse are logged and skipped.
    pub fn load<P: AsRef<Path>>(path: P, scale: RankScale) -> Self {
        let path = path.as_ref();
        let mut store = Self::new(scale);

        if !path.exists() {
            debug!("Rankings file does not exist: {:?}", path);
            return store;
        }

        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                error!("Failed to read rankings file {:?}: {}", path, e);
                return store;
            }
        };

        for (line_no, line) in content.lines().enumerate() {
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() {
                continue;
            }

            let mut parts = line.split('\t');
            let identifier = parts.next().unwrap_or_default();
            let field = parts.next().unwrap_or_default();

            if identifier.is_empty() {
                warn!("Skipping rankings line {} with no identifier", line_no + 1);
                continue;
            }
            if field.trim().is_empty() {
                continue;
            }

            match store.scale.parse_stored(field) {
                Some(rank) => {
                    store.ranks.insert(identifier.to_string(), rank);
                }
                None => {
                    warn!(
                        "Skipping malformed rankings line {} ({:?}): rank '{}' not parseable",
                        line_no + 1,
                        identifier,
                        field
                    );
                }
            }
        }

        info!("Loaded {} rankings from {:?}", store.ranks.len(), path);
        store
    }

    /// Assign a rank, rejecting values outside the scale
    pub fn set(&mut self, identifier: &str, rank: Rank) -> Result<()> {
        self.scale.validate(&rank)?;
        self.ranks.insert(identifier.to_string(), rank);
        Ok(())
    }

    /// Remove a rank; returns whether one was present
    pub fn clear(&mut self, identifier: &str) -> bool {
        self.ranks.remove(identifier).is_some()
    }

    pub fn get(&self, identifier: &str) -> Option<&Rank> {
        self.ranks.get(identifier)
    }

    pub fn is_ranked(&self, identifier: &str) -> bool {
        self.ranks.contains_key(identifier)
    }

    pub fn len(&self) -> usize {
        self.ranks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranks.is_empty()
    }

    pub fn scale(&self) -> &RankScale {
        &self.scale
    }

    pub fn ranks(&self) -> &HashMap<String, Rank> {
        &self.ranks
    }
}

/// Write the rankings file and its comments companion.
///
/// Every identifier of `all_ids` gets exactly one line, in catalog order,
/// whether ranked or not. Both files are replaced atomically (written to a
/// sibling temporary file, then renamed).
pub fn save<P: AsRef<Path>>(
    path: P,
    ranks: &RankingStore,
    all_ids: &[String],
    comments: &CommentStore,
) -> Result<()> {
    let path = path.as_ref();

    let mut rankings = String::new();
    let mut annotated = String::new();
    for identifier in all_ids {
        let rank = ranks
            .get(identifier)
            .map(|r| r.to_string())
            .unwrap_or_default();
        let comment = comments.get(identifier).unwrap_or_default();

        rankings.push_str(&format!("{}\t{}\n", identifier, rank));
        annotated.push_str(&format!("{}\t{}\t{}\n", identifier, rank, comment));
    }

    write_replace(path, rankings.as_bytes())?;
    write_replace(&comments_path(path), annotated.as_bytes())?;

    debug!(
        "Saved {} rankings and {} comments over {} identifiers to {:?}",
        ranks.len(),
        comments.len(),
        all_ids.len(),
        path
    );
    Ok(())
}

pub(crate) fn write_replace(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut tmp_name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    let result = (|| -> std::io::Result<()> {
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        fs::rename(&tmp_path, path)
    })();

    if let Err(e) = result {
        let _ = fs::remove_file(&tmp_path);
        return Err(e.into());
    }
    Ok(())
}
