use std::collections::HashMap;

use crate::cloner::ClonerId;
use crate::dom::NodeId;

/// The key whose default action (implicit form submission) the generated
/// controls suppress.
pub(crate) const CONFIRM_KEY: &str = "Enter";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ListenerAction {
    AddGroup(ClonerId),
    RemoveGroup { cloner: ClonerId, container: NodeId },
    SuppressConfirmKey,
}

#[derive(Debug, Default, Clone)]
pub(crate) struct ListenerStore {
    map: HashMap<NodeId, HashMap<String, Vec<ListenerAction>>>,
}

impl ListenerStore {
    pub(crate) fn add(&mut self, node_id: NodeId, event: &str, action: ListenerAction) {
        self.map
            .entry(node_id)
            .or_default()
            .entry(event.to_string())
            .or_default()
            .push(action);
    }

    pub(crate) fn get(&self, node_id: NodeId, event: &str) -> Vec<ListenerAction> {
        self.map
            .get(&node_id)
            .and_then(|events| events.get(event))
            .cloned()
            .unwrap_or_default()
    }

    /// Drops every listener registered on `nodes`.
    pub(crate) fn remove_nodes(&mut self, nodes: &[NodeId]) {
        for node in nodes {
            self.map.remove(node);
        }
    }

    pub(crate) fn node_count(&self) -> usize {
        self.map.len()
    }
}

#[derive(Debug, Clone)]
pub(crate) struct EventState {
    pub(crate) event_type: String,
    pub(crate) key: Option<String>,
    pub(crate) target: NodeId,
    pub(crate) current_target: NodeId,
    pub(crate) default_prevented: bool,
}

impl EventState {
    pub(crate) fn new(event_type: &str, target: NodeId, key: Option<&str>) -> Self {
        Self {
            event_type: event_type.to_string(),
            key: key.map(ToOwned::to_owned),
            target,
            current_target: target,
            default_prevented: false,
        }
    }

    pub(crate) fn is_confirm_key(&self) -> bool {
        self.key.as_deref() == Some(CONFIRM_KEY)
    }
}
