//! Git backend implementation.
//!
//! Library-linked git via the git2 crate. Each call opens the repository
//! fresh so a location change between calls is picked up immediately.

use std::fs;
use std::path::Path;

use chrono::{DateTime, FixedOffset, Utc};
use git2::{Commit, IndexAddOption, Oid, Repository, Signature, Sort};
use tracing::debug;

use crate::backend::VersionBackend;
use crate::error::StoreResult;

/// Committer identity used when the repository has none configured.
const FALLBACK_NAME: &str = "Savepoint";
const FALLBACK_EMAIL: &str = "savepoint@localhost";

/// Git-backed version store backend.
#[derive(Debug, Default)]
pub struct GitBackend;

impl GitBackend {
    fn signature(repo: &Repository) -> StoreResult<Signature<'static>> {
        // Snapshot repositories live outside any user git config, so fall
        // back to a fixed identity rather than failing the commit.
        match repo.signature() {
            Ok(sig) => Ok(sig),
            Err(_) => Ok(Signature::now(FALLBACK_NAME, FALLBACK_EMAIL)?),
        }
    }

    fn commit_index(repo: &Repository, message: &str) -> StoreResult<bool> {
        let mut index = repo.index()?;
        let tree_id = index.write_tree()?;
        let tree = repo.find_tree(tree_id)?;

        let parent = match repo.head() {
            Ok(head) => Some(head.peel_to_commit()?),
            Err(_) => None, // Unborn HEAD: initial commit
        };

        if let Some(ref p) = parent {
            if p.tree_id() == tree_id {
                debug!("nothing staged, skipping commit");
                return Ok(false);
            }
        }

        let sig = Self::signature(repo)?;
        let parents: Vec<&Commit> = parent.iter().collect();
        repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)?;
        Ok(true)
    }
}

impl VersionBackend for GitBackend {
    fn metadata_dir_name(&self) -> &'static str {
        ".git"
    }

    fn init(&self, location: &Path, message: &str) -> StoreResult<()> {
        let repo = Repository::init(location)?;
        let sig = Self::signature(&repo)?;

        // Initial commit over the empty tree, with no parents.
        let tree_id = repo.index()?.write_tree()?;
        let tree = repo.find_tree(tree_id)?;
        repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &[])?;

        debug!(location = %location.display(), "initialized git backend");
        Ok(())
    }

    fn stage_and_commit_all(&self, location: &Path, message: &str) -> StoreResult<bool> {
        let repo = Repository::open(location)?;

        let mut index = repo.index()?;
        index.add_all(["*"].iter(), IndexAddOption::DEFAULT, None)?;
        index.write()?;

        Self::commit_index(&repo, message)
    }

    fn list_revisions(&self, location: &Path, rel_path: &Path) -> StoreResult<Vec<String>> {
        let repo = match Repository::open(location) {
            Ok(repo) => repo,
            Err(_) => return Ok(Vec::new()),
        };

        let mut revwalk = repo.revwalk()?;
        if revwalk.push_head().is_err() {
            return Ok(Vec::new());
        }
        revwalk.set_sorting(Sort::TIME)?;

        let mut revisions = Vec::new();
        for oid in revwalk {
            let oid = oid?;
            let commit = repo.find_commit(oid)?;
            if touches_path(&commit, rel_path) {
                revisions.push(oid.to_string());
            }
        }
        Ok(revisions)
    }

    fn show_at_revision(
        &self,
        location: &Path,
        revision: &str,
        rel_path: &Path,
    ) -> StoreResult<Vec<u8>> {
        let repo = Repository::open(location)?;
        let commit = repo.find_commit(Oid::from_str(revision)?)?;
        let entry = commit.tree()?.get_path(rel_path)?;
        let blob = repo.find_blob(entry.id())?;
        Ok(blob.content().to_vec())
    }

    fn checkout_path(&self, location: &Path, revision: &str, rel_path: &Path) -> StoreResult<()> {
        let bytes = self.show_at_revision(location, revision, rel_path)?;

        let dest = location.join(rel_path);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&dest, bytes)?;

        debug!(path = %dest.display(), revision, "restored revision into working tree");
        Ok(())
    }

    fn describe_revision(
        &self,
        location: &Path,
        revision: &str,
        fields: &[String],
    ) -> StoreResult<Vec<String>> {
        let repo = Repository::open(location)?;
        let commit = repo.find_commit(Oid::from_str(revision)?)?;
        Ok(fields.iter().map(|f| format_field(&commit, f)).collect())
    }
}

/// The blob id recorded for `rel_path` by this commit's tree, if any.
fn tree_entry_id(commit: &Commit, rel_path: &Path) -> Option<Oid> {
    commit
        .tree()
        .ok()?
        .get_path(rel_path)
        .ok()
        .map(|entry| entry.id())
}

/// Whether this commit's change set touched `rel_path`: the entry differs
/// from every parent (covers added, modified, and deleted), or the commit
/// has no parent and introduces the entry.
fn touches_path(commit: &Commit, rel_path: &Path) -> bool {
    let current = tree_entry_id(commit, rel_path);
    if commit.parent_count() == 0 {
        return current.is_some();
    }
    commit
        .parents()
        .any(|parent| tree_entry_id(&parent, rel_path) != current)
}

/// Resolve a git pretty-format placeholder name against a commit.
///
/// Unknown names resolve to empty strings: the field list is
/// caller-supplied display data, not something worth failing a query over.
fn format_field(commit: &Commit, field: &str) -> String {
    match field {
        "H" => commit.id().to_string(),
        "h" => commit.id().to_string().chars().take(7).collect(),
        "an" => commit.author().name().unwrap_or("").to_string(),
        "ae" => commit.author().email().unwrap_or("").to_string(),
        "ad" => format_time(commit.author().when()),
        "at" => commit.author().when().seconds().to_string(),
        "cn" => commit.committer().name().unwrap_or("").to_string(),
        "ce" => commit.committer().email().unwrap_or("").to_string(),
        "cd" => format_time(commit.committer().when()),
        "ct" => commit.committer().when().seconds().to_string(),
        "s" => commit.summary().unwrap_or("").to_string(),
        _ => String::new(),
    }
}

fn format_time(time: git2::Time) -> String {
    let Some(utc) = DateTime::<Utc>::from_timestamp(time.seconds(), 0) else {
        return String::new();
    };
    match FixedOffset::east_opt(time.offset_minutes() * 60) {
        Some(offset) => utc.with_timezone(&offset).to_rfc2822(),
        None => utc.to_rfc2822(),
    }
}
