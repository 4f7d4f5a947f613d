use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{debug, error, info};

/// Free-text annotations, keyed independently of ranks
#[derive(Debug, Clone, Default)]
pub struct CommentStore {
    comments: HashMap<String, String>,
}

impl CommentStore {
    /// Load comments from the companion file's third tab field.
    ///
    /// Lines without a tab, with fewer than three fields or with an empty
    /// comment are skipped. Never fails.
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        let mut store = Self::default();

        if !path.exists() {
            debug!("Comments file does not exist: {:?}", path);
            return store;
        }

        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                error!("Failed to read comments file {:?}: {}", path, e);
                return store;
            }
        };

        for line in content.lines() {
            if !line.contains('\t') {
                continue;
            }
            let parts: Vec<&str> = line.splitn(3, '\t').collect();
            if parts.len() < 3 || parts[0].is_empty() {
                continue;
            }
            let comment = parts[2].trim_end_matches('\r');
            if !comment.is_empty() {
                store.comments.insert(parts[0].to_string(), comment.to_string());
            }
        }

        info!("Loaded {} comments from {:?}", store.comments.len(), path);
        store
    }

    /// Set or replace a comment; an empty comment removes the entry.
    ///
    /// Tabs and line breaks are folded into spaces so the comment stays on
    /// its line of the companion file.
    pub fn set(&mut self, identifier: &str, comment: &str) {
        let cleaned: String = comment
            .chars()
            .map(|c| if matches!(c, '\t' | '\n' | '\r') { ' ' } else { c })
            .collect();
        let cleaned = cleaned.trim();

        if cleaned.is_empty() {
            self.comments.remove(identifier);
        } else {
            self.comments.insert(identifier.to_string(), cleaned.to_string());
        }
    }

    pub fn remove(&mut self, identifier: &str) -> bool {
        self.comments.remove(identifier).is_some()
    }

    pub fn get(&self, identifier: &str) -> Option<&str> {
        self.comments.get(identifier).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.comments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.comments.is_empty()
    }

    pub fn comments(&self) -> &HashMap<String, String> {
        &self.comments
    }
}
