//! Folder selection over the gallery folder tree.
//!
//! The traversal offers every folder to a [`FolderDecider`] in depth-first
//! pre-order and collects the ids of accepted folders. Declining a parent
//! does not block its children: each folder is decided on its own.

use crate::api::Folder;

/// Per-folder include/exclude decision source.
///
/// The binary implements this with stdin prompts; tests use scripted
/// deciders.
pub trait FolderDecider {
    /// Returns `true` when `folder` should be included in the export.
    fn include(&mut self, folder: &Folder) -> bool;
}

/// Walks the folder tree depth-first, parents before children, and
/// collects the ids of every folder the decider accepts.
#[must_use]
pub fn select_folders(folders: &[Folder], decider: &mut dyn FolderDecider) -> Vec<String> {
    let mut selected = Vec::new();
    // Explicit stack instead of recursion; folder trees can nest deeply.
    let mut stack: Vec<&Folder> = folders.iter().rev().collect();

    while let Some(folder) = stack.pop() {
        if decider.include(folder) {
            selected.push(folder.folderid.clone());
        }
        for subfolder in folder.subfolders.iter().rev() {
            stack.push(subfolder);
        }
    }

    selected
}
