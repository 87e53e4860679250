use serde_json::Value;

use crate::cloner::{ClonerId, FieldGroupCloner};
use crate::dom::{Dom, NodeId, truncate_chars};
use crate::element_builder::{ElementSpec, InsertPosition, build_element};
use crate::events::{CONFIRM_KEY, EventState, ListenerAction, ListenerStore};
use crate::html::parse_html;
use crate::numbering::{container_class, container_number};
use crate::{Error, Result};

const DEFAULT_TRACE_LOG_LIMIT: usize = 10_000;
const TRACE_TARGET: &str = "form_field_cloner";

/// The host document together with its listeners, focus state and the
/// cloners attached to it.
///
/// Every mutation happens synchronously inside one user action, so the
/// numbering of clone containers is always contiguous again by the time
/// an action returns.
#[derive(Debug)]
pub struct Page {
    dom: Dom,
    listeners: ListenerStore,
    cloners: Vec<FieldGroupCloner>,
    clone_groups: Vec<NodeId>,
    active_element: Option<NodeId>,
    submissions: usize,
    trace: bool,
    trace_events: bool,
    trace_cloner: bool,
    trace_to_log: bool,
    trace_logs: Vec<String>,
    trace_log_limit: usize,
}

impl Page {
    pub fn from_html(html: &str) -> Result<Self> {
        let dom = parse_html(html)?;
        Ok(Self {
            dom,
            listeners: ListenerStore::default(),
            cloners: Vec::new(),
            clone_groups: Vec::new(),
            active_element: None,
            submissions: 0,
            trace: false,
            trace_events: true,
            trace_cloner: true,
            trace_to_log: true,
            trace_logs: Vec::new(),
            trace_log_limit: DEFAULT_TRACE_LOG_LIMIT,
        })
    }

    pub fn enable_trace(&mut self, enabled: bool) {
        self.trace = enabled;
    }

    pub fn take_trace_logs(&mut self) -> Vec<String> {
        std::mem::take(&mut self.trace_logs)
    }

    pub fn set_trace_events(&mut self, enabled: bool) {
        self.trace_events = enabled;
    }

    pub fn set_trace_cloner(&mut self, enabled: bool) {
        self.trace_cloner = enabled;
    }

    /// Controls whether trace lines are also emitted as `tracing` events.
    pub fn set_trace_output(&mut self, enabled: bool) {
        self.trace_to_log = enabled;
    }

    pub fn set_trace_log_limit(&mut self, max_entries: usize) -> Result<()> {
        if max_entries == 0 {
            return Err(Error::Config(
                "set_trace_log_limit requires at least 1 entry".into(),
            ));
        }
        self.trace_log_limit = max_entries;
        while self.trace_logs.len() > self.trace_log_limit {
            self.trace_logs.remove(0);
        }
        Ok(())
    }

    /// Attaches a [`FieldGroupCloner`] to the elements `selector` matches
    /// right now. `overrides` is a partial options object, or `null`.
    pub fn attach_cloner(&mut self, selector: &str, overrides: &Value) -> Result<ClonerId> {
        FieldGroupCloner::attach(self, selector, overrides)
    }

    pub fn cloner(&self, id: ClonerId) -> Option<&FieldGroupCloner> {
        self.cloners.get(id.0)
    }

    /// Number of clone containers currently in the document.
    pub fn cloned_group_count(&self) -> usize {
        self.clone_containers().len()
    }

    /// Form submissions triggered by clicks on submit controls or by an
    /// unsuppressed confirm key.
    pub fn submission_count(&self) -> usize {
        self.submissions
    }

    /// Same as activating the cloner's trigger, without dispatching events.
    pub fn create_group(&mut self, id: ClonerId) -> Result<usize> {
        let cloner = self.cloner_snapshot(id)?;
        cloner.create_group(self)
    }

    /// Same as activating the delete control of group `number`.
    pub fn remove_group(&mut self, id: ClonerId, number: usize) -> Result<()> {
        let cloner = self.cloner_snapshot(id)?;
        let container = self
            .clone_containers()
            .into_iter()
            .find(|node| {
                self.dom
                    .attr(*node, "class")
                    .and_then(|class_attr| container_number(&class_attr))
                    == Some(number)
            })
            .ok_or_else(|| Error::SelectorNotFound(format!(".{}", container_class(number))))?;
        cloner.remove_group(self, container)
    }

    /// Builds an element from `spec` next to the first match of `selector`.
    pub fn insert_element(
        &mut self,
        selector: &str,
        spec: &ElementSpec,
        position: InsertPosition,
    ) -> Result<()> {
        let reference = self.select_one(selector)?;
        build_element(&mut self.dom, spec, reference, position)?;
        Ok(())
    }

    pub fn type_text(&mut self, selector: &str, text: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        if self.dom.disabled(target) || self.dom.readonly(target) {
            return Ok(());
        }

        let tag = self
            .dom
            .tag_name(target)
            .ok_or_else(|| Error::TypeMismatch {
                selector: selector.to_string(),
                expected: "input or textarea".into(),
                actual: "non-element".into(),
            })?
            .to_ascii_lowercase();

        if tag != "input" && tag != "textarea" {
            return Err(Error::TypeMismatch {
                selector: selector.to_string(),
                expected: "input or textarea".into(),
                actual: tag,
            });
        }

        self.dom.set_value(target, text)?;
        self.dispatch_event(target, "input", None)?;
        Ok(())
    }

    pub fn click(&mut self, selector: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        if self.dom.disabled(target) {
            return Ok(());
        }

        let click = self.dispatch_event(target, "click", None)?;
        if click.default_prevented {
            return Ok(());
        }

        if is_submit_control(&self.dom, target) {
            if let Some(form) = self.dom.find_ancestor_by_tag(target, "form") {
                self.submit_form(form)?;
            }
        }
        Ok(())
    }

    /// Focuses the target and sends `keydown` / `keyup` for `key`.
    ///
    /// An `Enter` whose keydown was not default-prevented submits the
    /// enclosing form.
    pub fn press_key(&mut self, selector: &str, key: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        if self.dom.disabled(target) {
            return Ok(());
        }

        self.focus_node(target)?;
        let keydown = self.dispatch_event(target, "keydown", Some(key))?;
        if !keydown.default_prevented && key == CONFIRM_KEY && self.dom.is_connected(target) {
            if let Some(form) = self.dom.find_ancestor_by_tag(target, "form") {
                self.submit_form(form)?;
            }
        }
        self.dispatch_event(target, "keyup", Some(key))?;
        Ok(())
    }

    pub fn focus(&mut self, selector: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        self.focus_node(target)
    }

    pub fn blur(&mut self, selector: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        self.blur_node(target)
    }

    pub fn count(&self, selector: &str) -> Result<usize> {
        Ok(self.dom.query_selector_all(selector)?.len())
    }

    pub fn attr(&self, selector: &str, name: &str) -> Result<Option<String>> {
        let target = self.select_one(selector)?;
        Ok(self.dom.attr(target, name))
    }

    pub fn value(&self, selector: &str) -> Result<String> {
        let target = self.select_one(selector)?;
        self.dom.value(target)
    }

    pub fn text(&self, selector: &str) -> Result<String> {
        let target = self.select_one(selector)?;
        Ok(self.dom.text_content(target))
    }

    pub fn assert_text(&self, selector: &str, expected: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        let actual = self.dom.text_content(target);
        if actual != expected {
            return Err(Error::AssertionFailed {
                selector: selector.to_string(),
                expected: expected.to_string(),
                actual,
                dom_snippet: self.node_snippet(target),
            });
        }
        Ok(())
    }

    pub fn assert_value(&self, selector: &str, expected: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        let actual = self.dom.value(target)?;
        if actual != expected {
            return Err(Error::AssertionFailed {
                selector: selector.to_string(),
                expected: expected.to_string(),
                actual,
                dom_snippet: self.node_snippet(target),
            });
        }
        Ok(())
    }

    pub fn assert_attr(&self, selector: &str, name: &str, expected: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        let actual = self.dom.attr(target, name);
        if actual.as_deref() != Some(expected) {
            return Err(Error::AssertionFailed {
                selector: selector.to_string(),
                expected: format!("{name}={expected}"),
                actual: actual.map_or_else(|| format!("{name} missing"), |v| format!("{name}={v}")),
                dom_snippet: self.node_snippet(target),
            });
        }
        Ok(())
    }

    pub fn assert_exists(&self, selector: &str) -> Result<()> {
        let _ = self.select_one(selector)?;
        Ok(())
    }

    pub fn assert_count(&self, selector: &str, expected: usize) -> Result<()> {
        let actual = self.count(selector)?;
        if actual != expected {
            return Err(Error::AssertionFailed {
                selector: selector.to_string(),
                expected: expected.to_string(),
                actual: actual.to_string(),
                dom_snippet: String::new(),
            });
        }
        Ok(())
    }

    pub fn assert_focused(&self, selector: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        if self.active_element != Some(target) {
            return Err(Error::AssertionFailed {
                selector: selector.to_string(),
                expected: "focused".into(),
                actual: self
                    .active_element
                    .map_or_else(|| "no active element".into(), |node| self.trace_node_label(node)),
                dom_snippet: self.node_snippet(target),
            });
        }
        Ok(())
    }

    pub fn dump_dom(&self, selector: &str) -> Result<String> {
        let target = self.select_one(selector)?;
        Ok(self.dom.dump_node(target))
    }

    pub(crate) fn dom(&self) -> &Dom {
        &self.dom
    }

    pub(crate) fn dom_mut(&mut self) -> &mut Dom {
        &mut self.dom
    }

    pub(crate) fn next_cloner_id(&self) -> ClonerId {
        ClonerId(self.cloners.len())
    }

    pub(crate) fn register_cloner(&mut self, cloner: FieldGroupCloner) {
        self.cloners.push(cloner);
    }

    pub(crate) fn track_clone_group(&mut self, container: NodeId) {
        self.clone_groups.push(container);
    }

    pub(crate) fn untrack_clone_group(&mut self, container: NodeId) {
        self.clone_groups.retain(|node| *node != container);
    }

    /// Containers built by any cloner on this page that are still in the
    /// document, in document order.
    pub(crate) fn clone_containers(&self) -> Vec<NodeId> {
        self.dom
            .all_element_nodes()
            .into_iter()
            .filter(|node| self.clone_groups.contains(node))
            .collect()
    }

    pub(crate) fn add_listener(&mut self, node: NodeId, event: &str, action: ListenerAction) {
        self.listeners.add(node, event, action);
    }

    pub(crate) fn remove_listeners(&mut self, nodes: &[NodeId]) {
        self.listeners.remove_nodes(nodes);
    }

    pub(crate) fn listener_node_count(&self) -> usize {
        self.listeners.node_count()
    }

    pub(crate) fn focus_node(&mut self, node: NodeId) -> Result<()> {
        if self.dom.disabled(node) {
            return Ok(());
        }
        if self.active_element == Some(node) {
            return Ok(());
        }
        if let Some(current) = self.active_element {
            self.blur_node(current)?;
        }

        self.active_element = Some(node);
        self.dispatch_event(node, "focusin", None)?;
        self.dispatch_event(node, "focus", None)?;
        Ok(())
    }

    fn blur_node(&mut self, node: NodeId) -> Result<()> {
        if self.active_element != Some(node) {
            return Ok(());
        }
        self.dispatch_event(node, "focusout", None)?;
        self.dispatch_event(node, "blur", None)?;
        self.active_element = None;
        Ok(())
    }

    fn submit_form(&mut self, form: NodeId) -> Result<()> {
        let submit = self.dispatch_event(form, "submit", None)?;
        if !submit.default_prevented {
            self.submissions += 1;
        }
        Ok(())
    }

    fn cloner_snapshot(&self, id: ClonerId) -> Result<FieldGroupCloner> {
        self.cloners
            .get(id.0)
            .cloned()
            .ok_or_else(|| Error::Config(format!("unknown cloner id {}", id.0)))
    }

    fn dispatch_event(
        &mut self,
        target: NodeId,
        event_type: &str,
        key: Option<&str>,
    ) -> Result<EventState> {
        let mut event = EventState::new(event_type, target, key);

        // The path is fixed up front; handlers that detach the target do not
        // shorten it.
        let mut path = Vec::new();
        let mut cursor = Some(target);
        while let Some(node) = cursor {
            path.push(node);
            cursor = self.dom.parent(node);
        }

        for node in path {
            event.current_target = node;
            self.invoke_listeners(node, &mut event)?;
        }

        self.trace_event_done(&event, "completed");
        Ok(event)
    }

    fn invoke_listeners(&mut self, node_id: NodeId, event: &mut EventState) -> Result<()> {
        let actions = self.listeners.get(node_id, &event.event_type);
        for action in actions {
            if self.trace {
                let phase = if event.current_target == event.target {
                    "target"
                } else {
                    "bubble"
                };
                let target_label = self.trace_node_label(event.target);
                let current_label = self.trace_node_label(event.current_target);
                self.trace_event_line(format!(
                    "[event] {} target={} current={} phase={} default_prevented={}",
                    event.event_type, target_label, current_label, phase, event.default_prevented
                ));
            }
            self.run_action(action, event)?;
        }
        Ok(())
    }

    fn run_action(&mut self, action: ListenerAction, event: &mut EventState) -> Result<()> {
        match action {
            ListenerAction::AddGroup(id) => {
                let cloner = self.cloner_snapshot(id)?;
                cloner.create_group(self)?;
            }
            ListenerAction::RemoveGroup { cloner, container } => {
                let cloner = self.cloner_snapshot(cloner)?;
                cloner.remove_group(self, container)?;
            }
            ListenerAction::SuppressConfirmKey => {
                if event.is_confirm_key() {
                    event.default_prevented = true;
                }
            }
        }
        Ok(())
    }

    fn trace_event_done(&mut self, event: &EventState, outcome: &str) {
        if !(self.trace && self.trace_events) {
            return;
        }
        let target_label = self.trace_node_label(event.target);
        let current_label = self.trace_node_label(event.current_target);
        self.trace_event_line(format!(
            "[event] done {} target={} current={} outcome={} default_prevented={}",
            event.event_type, target_label, current_label, outcome, event.default_prevented
        ));
    }

    fn trace_event_line(&mut self, line: String) {
        if self.trace && self.trace_events {
            self.trace_line(line);
        }
    }

    pub(crate) fn trace_cloner_line(&mut self, line: String) {
        if self.trace && self.trace_cloner {
            self.trace_line(line);
        }
    }

    fn trace_line(&mut self, line: String) {
        if self.trace {
            if self.trace_to_log {
                tracing::debug!(target: TRACE_TARGET, "{line}");
            }
            if self.trace_logs.len() >= self.trace_log_limit {
                self.trace_logs.remove(0);
            }
            self.trace_logs.push(line);
        }
    }

    pub(crate) fn trace_node_label(&self, node: NodeId) -> String {
        if let Some(id) = self.dom.attr(node, "id") {
            if !id.is_empty() {
                return format!("#{id}");
            }
        }
        if let Some(class_attr) = self.dom.attr(node, "class") {
            if let Some(first) = class_attr.split_whitespace().next() {
                let tag = self.dom.tag_name(node).unwrap_or_default();
                return format!("{tag}.{first}");
            }
        }
        self.dom
            .tag_name(node)
            .map(ToOwned::to_owned)
            .unwrap_or_else(|| format!("node-{}", node.0))
    }

    fn select_one(&self, selector: &str) -> Result<NodeId> {
        self.dom
            .query_selector(selector)?
            .ok_or_else(|| Error::SelectorNotFound(selector.to_string()))
    }

    fn node_snippet(&self, node_id: NodeId) -> String {
        truncate_chars(&self.dom.dump_node(node_id), 200)
    }
}

fn is_submit_control(dom: &Dom, node_id: NodeId) -> bool {
    let Some(element) = dom.element(node_id) else {
        return false;
    };

    if element.is_tag("button") {
        return element
            .attrs
            .get("type")
            .is_none_or(|kind| kind.eq_ignore_ascii_case("submit"));
    }

    if element.is_tag("input") {
        return element
            .attrs
            .get("type")
            .is_some_and(|kind| kind.eq_ignore_ascii_case("submit"));
    }

    false
}
