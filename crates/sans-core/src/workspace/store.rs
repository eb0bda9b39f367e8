use super::Workspace;
use crate::domain::{SansError, SansResult};
use std::collections::BTreeMap;

/// Named workspaces kept between reductions of one session.
#[derive(Debug, Clone, Default)]
pub struct WorkspaceStore {
    workspaces: BTreeMap<String, Workspace>,
}

impl WorkspaceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the workspace under its own name, replacing any previous entry.
    pub fn insert(&mut self, workspace: Workspace) -> Option<Workspace> {
        self.workspaces.insert(workspace.name.clone(), workspace)
    }

    pub fn get(&self, name: &str) -> Option<&Workspace> {
        self.workspaces.get(name)
    }

    pub fn require(&self, name: &str) -> SansResult<&Workspace> {
        self.get(name).ok_or_else(|| {
            SansError::validation(
                "VALIDATION.UNKNOWN_WORKSPACE",
                format!("workspace '{}' does not exist", name),
            )
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.workspaces.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Workspace> {
        self.workspaces.remove(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.workspaces.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.workspaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workspaces.is_empty()
    }
}
