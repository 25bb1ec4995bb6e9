//! Folder tree building and ancestor walks.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::warn;

use filevault_auth::ownership::require_owned;
use filevault_core::error::AppError;
use filevault_database::repositories::FolderRepository;
use filevault_entity::folder::{Folder, FolderNode};

use crate::context::RequestContext;

/// Walks folder ancestry and builds nested tree views.
#[derive(Debug, Clone)]
pub struct TreeService {
    /// Folder repository.
    folder_repo: Arc<FolderRepository>,
}

impl TreeService {
    /// Creates a new tree service.
    pub fn new(folder_repo: Arc<FolderRepository>) -> Self {
        Self { folder_repo }
    }

    /// Ancestors of a folder ordered root first, excluding the folder.
    ///
    /// The walk stops at a missing ancestor, at an ancestor owned by
    /// another user, or on a revisited id; what was collected so far is
    /// returned.
    pub async fn get_parent_chain(
        &self,
        ctx: &RequestContext,
        folder_id: i64,
    ) -> Result<Vec<Folder>, AppError> {
        let folder = require_owned(
            self.folder_repo.find_by_id(folder_id).await?,
            ctx.user_id,
            "Folder",
            folder_id,
        )?;

        let mut chain = Vec::new();
        let mut visited = HashSet::from([folder.id]);
        let mut next = folder.parent_id;

        while let Some(parent_id) = next {
            if !visited.insert(parent_id) {
                warn!(folder_id, parent_id, "Cycle in folder ancestry, truncating chain");
                break;
            }
            match self.folder_repo.find_by_id(parent_id).await? {
                Some(parent) if parent.user_id == ctx.user_id => {
                    next = parent.parent_id;
                    chain.push(parent);
                }
                Some(_) => {
                    warn!(folder_id, parent_id, "Foreign ancestor, truncating chain");
                    break;
                }
                None => {
                    warn!(folder_id, parent_id, "Missing ancestor, truncating chain");
                    break;
                }
            }
        }

        chain.reverse();
        Ok(chain)
    }

    /// Whether `candidate` is `ancestor_id` itself or lies below it.
    pub async fn is_same_or_descendant(
        &self,
        candidate: &Folder,
        ancestor_id: i64,
    ) -> Result<bool, AppError> {
        if candidate.id == ancestor_id {
            return Ok(true);
        }

        let mut visited = HashSet::from([candidate.id]);
        let mut next = candidate.parent_id;
        while let Some(id) = next {
            if id == ancestor_id {
                return Ok(true);
            }
            if !visited.insert(id) {
                break;
            }
            next = self
                .folder_repo
                .find_by_id(id)
                .await?
                .and_then(|f| f.parent_id);
        }
        Ok(false)
    }

    /// Builds the nested tree below a folder, breadth first.
    pub async fn get_tree(&self, ctx: &RequestContext, folder_id: i64) -> Result<FolderNode, AppError> {
        let root = require_owned(
            self.folder_repo.find_by_id(folder_id).await?,
            ctx.user_id,
            "Folder",
            folder_id,
        )?;

        struct Entry {
            folder: Folder,
            depth: u32,
            parent: Option<usize>,
            file_count: u64,
        }

        let mut visited = HashSet::from([root.id]);
        let mut entries = vec![Entry {
            file_count: self.folder_repo.count_files(root.id).await?,
            folder: root,
            depth: 0,
            parent: None,
        }];

        let mut cursor = 0;
        while cursor < entries.len() {
            let (id, depth) = (entries[cursor].folder.id, entries[cursor].depth);
            for child in self.folder_repo.find_subfolders(id).await? {
                if visited.insert(child.id) {
                    entries.push(Entry {
                        file_count: self.folder_repo.count_files(child.id).await?,
                        folder: child,
                        depth: depth + 1,
                        parent: Some(cursor),
                    });
                }
            }
            cursor += 1;
        }

        // Children always sit after their parent, so folding from the back
        // completes every subtree before it is attached.
        let mut children: Vec<Vec<FolderNode>> = entries.iter().map(|_| Vec::new()).collect();
        let mut tree = None;
        for (idx, entry) in entries.into_iter().enumerate().rev() {
            let mut kids = std::mem::take(&mut children[idx]);
            kids.reverse();
            let node = FolderNode {
                id: entry.folder.id,
                name: entry.folder.name,
                is_locked: entry.folder.is_locked,
                depth: entry.depth,
                file_count: entry.file_count,
                children: kids,
            };
            match entry.parent {
                Some(parent) => children[parent].push(node),
                None => tree = Some(node),
            }
        }

        tree.ok_or_else(|| AppError::internal("Folder tree has no root"))
    }
}
