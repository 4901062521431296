//! Room entity: a named broadcast domain.

use std::{collections::HashMap, sync::Arc};

use super::session::{SessionHandle, SessionId};

/// A named room and its current members.
///
/// A room with no members stays a valid entry; rooms are never dropped once
/// created.
#[derive(Debug)]
pub struct Room {
    name: String,
    members: HashMap<SessionId, Arc<SessionHandle>>,
}

impl Room {
    pub fn new(name: String) -> Self {
        Self {
            name,
            members: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add a member. Re-adding the same session replaces its handle.
    pub fn add_member(&mut self, member: Arc<SessionHandle>) {
        self.members.insert(member.id(), member);
    }

    /// Remove a member, returning its handle if it was present.
    pub fn remove_member(&mut self, id: &SessionId) -> Option<Arc<SessionHandle>> {
        self.members.remove(id)
    }

    pub fn contains(&self, id: &SessionId) -> bool {
        self.members.contains_key(id)
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Snapshot of the current members.
    pub fn members(&self) -> Vec<Arc<SessionHandle>> {
        self.members.values().cloned().collect()
    }

    /// Display names of the current members, sorted for consistent ordering.
    pub fn member_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .members
            .values()
            .map(|member| member.name().to_string())
            .collect();
        names.sort();
        names
    }
}
