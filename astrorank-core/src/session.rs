///! Reviewing session
///!
///! Owns the catalog, the cursor and both stores. Rank submissions are
///! written in batches of `save_every`; clearing a rank and closing the
///! session write immediately.
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::catalog::list_images;
use crate::error::{AstroError, Result};
use crate::store::{self, comments_path, CommentStore, Rank, RankScale, RankingStore};

#[derive(Debug)]
pub struct Session {
    image_dir: PathBuf,
    output: PathBuf,
    ids: Vec<String>,
    cursor: usize,
    ranks: RankingStore,
    comments: CommentStore,
    save_every: usize,
    unsaved: usize,
    closed: bool,
}

impl Session {
    /// Load the catalog of `image_dir` and any existing rankings/comments.
    ///
    /// Fails with `NotFound` for a missing directory and `EmptyCatalog` when
    /// it holds no images.
    pub fn open(
        image_dir: &Path,
        output: &Path,
        scale: RankScale,
        save_every: usize,
    ) -> Result<Self> {
        let ids = list_images(image_dir)?;
        if ids.is_empty() {
            return Err(AstroError::EmptyCatalog(image_dir.to_path_buf()));
        }

        let ranks = RankingStore::load(output, scale);
        let comments = CommentStore::load(comments_path(output));
        info!(
            "Session over {} images in {:?}: {} ranked, {} commented",
            ids.len(),
            image_dir,
            ranks.len(),
            comments.len()
        );

        Ok(Self {
            image_dir: image_dir.to_path_buf(),
            output: output.to_path_buf(),
            ids,
            cursor: 0,
            ranks,
            comments,
            save_every: save_every.max(1),
            unsaved: 0,
            closed: false,
        })
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn index(&self) -> usize {
        self.cursor
    }

    pub fn current(&self) -> &str {
        &self.ids[self.cursor]
    }

    /// Full path of the current image
    pub fn current_path(&self) -> PathBuf {
        self.image_dir.join(self.current())
    }

    pub fn image_dir(&self) -> &Path {
        &self.image_dir
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    pub fn scale(&self) -> &RankScale {
        self.ranks.scale()
    }

    pub fn rank_of(&self, identifier: &str) -> Option<&Rank> {
        self.ranks.get(identifier)
    }

    pub fn comment_of(&self, identifier: &str) -> Option<&str> {
        self.comments.get(identifier)
    }

    pub fn ranked_count(&self) -> usize {
        self.ids.iter().filter(|id| self.ranks.is_ranked(id)).count()
    }

    /// Submissions not yet written to disk
    pub fn unsaved(&self) -> usize {
        self.unsaved
    }

    /// Rank the current image; every `save_every`-th submission saves.
    pub fn submit_rank(&mut self, rank: Rank) -> Result<()> {
        let identifier = self.current().to_string();
        let shown = rank.to_string();
        self.ranks.set(&identifier, rank)?;
        debug!("Ranked {} as {}", identifier, shown);

        self.unsaved += 1;
        if self.unsaved >= self.save_every {
            self.save()?;
        }
        Ok(())
    }

    /// Resolve typed input against the rank scale and submit it
    pub fn submit_input(&mut self, input: &str) -> Result<Rank> {
        let rank = self.ranks.scale().resolve(input)?;
        self.submit_rank(rank.clone())?;
        Ok(rank)
    }

    /// Remove the current image's rank and save at once. Returns whether a
    /// rank was removed; an unranked image is left untouched.
    pub fn clear_rank(&mut self) -> Result<bool> {
        let identifier = self.current().to_string();
        if !self.ranks.clear(&identifier) {
            return Ok(false);
        }
        info!("Cleared rank of {}", identifier);
        self.save()?;
        Ok(true)
    }

    /// Set or remove (empty text) the current image's comment. Written with
    /// the next save.
    pub fn set_comment(&mut self, text: &str) {
        let identifier = self.current().to_string();
        self.comments.set(&identifier, text);
    }

    /// Write both files and reset the batch counter
    pub fn save(&mut self) -> Result<()> {
        store::save(&self.output, &self.ranks, &self.ids, &self.comments)?;
        debug!("Saved session state to {:?}", self.output);
        self.unsaved = 0;
        Ok(())
    }

    /// Final save. Safe to call more than once.
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.save()?;
        self.closed = true;
        info!(
            "Session closed: {}/{} ranked, saved to {:?}",
            self.ranked_count(),
            self.ids.len(),
            self.output
        );
        Ok(())
    }

    pub fn next(&mut self) -> bool {
        if self.cursor + 1 < self.ids.len() {
            self.cursor += 1;
            true
        } else {
            false
        }
    }

    pub fn previous(&mut self) -> bool {
        if self.cursor > 0 {
            self.cursor -= 1;
            true
        } else {
            false
        }
    }

    pub fn first(&mut self) {
        self.cursor = 0;
    }

    /// Jump to an index; out-of-range indices are ignored
    pub fn go_to(&mut self, index: usize) -> bool {
        if index < self.ids.len() {
            self.cursor = index;
            true
        } else {
            false
        }
    }

    /// First unranked index at or after `from`
    pub fn find_next_unranked(&self, from: usize) -> Option<usize> {
        (from..self.ids.len()).find(|&i| !self.ranks.is_ranked(&self.ids[i]))
    }

    pub fn find_first_unranked(&self) -> Option<usize> {
        self.find_next_unranked(0)
    }

    /// Move to the next unranked image after the cursor. Returns `false`
    /// (cursor unchanged) when there is none.
    pub fn skip_to_next_unranked(&mut self) -> bool {
        match self.find_next_unranked(self.cursor + 1) {
            Some(index) => {
                self.cursor = index;
                true
            }
            None => false,
        }
    }

    /// Place the cursor on the first unranked image, if any
    pub fn resume(&mut self) {
        self.cursor = self.find_first_unranked().unwrap_or(0);
    }
}
