use serde_json::Value;

use crate::dom::{Dom, NodeId};
use crate::element_builder::{ElementSpec, InsertPosition, build_element};
use crate::events::ListenerAction;
use crate::numbering::{append_suffix, container_class, container_number, replace_suffix};
use crate::options::ClonerOptions;
use crate::page::Page;
use crate::{Error, Result};

/// First control that takes focus inside a fresh group.
const FOCUS_TARGET_SELECTOR: &str = r#"input:not([type="hidden"]), select, textarea"#;

/// Handle of a cloner attached to a [`Page`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClonerId(pub(crate) usize);

/// Duplicates a template group of fields into numbered containers.
///
/// The template is the set of elements the selector matched when the
/// cloner was attached; later document changes do not alter it. Each copy
/// lives in a `div.cloned-fields-<n>` inserted right before the trigger,
/// and numbers stay contiguous from 1 across deletions.
#[derive(Debug, Clone)]
pub struct FieldGroupCloner {
    id: ClonerId,
    selector: String,
    fields: Vec<NodeId>,
    trigger: NodeId,
    options: ClonerOptions,
}

impl FieldGroupCloner {
    /// Captures the template group, merges `overrides` over the default
    /// options and inserts the trigger right after the last template
    /// element.
    pub fn attach(page: &mut Page, selector: &str, overrides: &Value) -> Result<ClonerId> {
        let options = ClonerOptions::from_overrides(overrides)?;
        let fields = page.dom().query_selector_all(selector)?;
        let Some(last_field) = fields.last().copied() else {
            return Err(Error::Config(format!(
                "selector matched no elements: {selector}"
            )));
        };

        let trigger_spec = ElementSpec::new("span")
            .class_name(options.classes.trigger.as_str())
            .text_content(options.add_button_text.as_str())
            .role("button")
            .tab_index(0);
        let trigger = build_element(
            page.dom_mut(),
            &trigger_spec,
            last_field,
            InsertPosition::AfterEnd,
        )?;

        let id = page.next_cloner_id();
        page.add_listener(trigger, "click", ListenerAction::AddGroup(id));
        page.add_listener(trigger, "keydown", ListenerAction::SuppressConfirmKey);
        let trigger_label = page.trace_node_label(trigger);
        page.trace_cloner_line(format!(
            "[cloner] attach selector={selector} fields={} trigger={trigger_label}",
            fields.len()
        ));
        page.register_cloner(Self {
            id,
            selector: selector.to_string(),
            fields,
            trigger,
            options,
        });
        Ok(id)
    }

    pub fn id(&self) -> ClonerId {
        self.id
    }

    pub fn selector(&self) -> &str {
        &self.selector
    }

    pub fn options(&self) -> &ClonerOptions {
        &self.options
    }

    pub fn template_len(&self) -> usize {
        self.fields.len()
    }

    /// Clone containers currently in the page.
    pub fn group_count(&self, page: &Page) -> usize {
        page.clone_containers().len()
    }

    /// Visible text of this cloner's trigger as it is in the document now.
    pub fn trigger_text(&self, page: &Page) -> String {
        page.dom().text_content(self.trigger)
    }

    /// Appends one numbered copy of the template before the trigger and
    /// returns its sequence number.
    pub(crate) fn create_group(&self, page: &mut Page) -> Result<usize> {
        let number = page.clone_containers().len() + 1;
        let container_spec = ElementSpec::new("div").class_name(container_class(number));
        let container = build_element(
            page.dom_mut(),
            &container_spec,
            self.trigger,
            InsertPosition::BeforeBegin,
        )?;
        page.track_clone_group(container);

        for field in &self.fields {
            let dom = page.dom_mut();
            let copy = dom.clone_subtree(*field)?;
            prepare_copy(dom, copy, number)?;
            dom.append_child(container, copy)?;
        }

        let delete_spec = ElementSpec::new("span")
            .role("button")
            .tab_index(0)
            .class_name(self.options.classes.delete.as_str())
            .text_content(self.options.delete_button_text.as_str());
        let delete_control = build_element(
            page.dom_mut(),
            &delete_spec,
            container,
            InsertPosition::BeforeEnd,
        )?;
        page.add_listener(
            delete_control,
            "click",
            ListenerAction::RemoveGroup {
                cloner: self.id,
                container,
            },
        );
        page.add_listener(delete_control, "keydown", ListenerAction::SuppressConfirmKey);

        page.trace_cloner_line(format!(
            "[cloner] create group={number} fields={}",
            self.fields.len()
        ));

        let focus_target = page
            .dom()
            .query_selector_from(container, FOCUS_TARGET_SELECTOR)?;
        if let Some(first_input) = focus_target {
            page.focus_node(first_input)?;
        }
        Ok(number)
    }

    /// Removes a clone container, renumbers the remaining ones and hands
    /// focus back to the trigger.
    pub(crate) fn remove_group(&self, page: &mut Page, container: NodeId) -> Result<()> {
        if !page.dom().is_connected(container) {
            return Ok(());
        }
        let number = page
            .dom()
            .attr(container, "class")
            .and_then(|class_attr| container_number(&class_attr));

        let mut removed = vec![container];
        page.dom().collect_elements_descendants_dfs(container, &mut removed);
        page.dom_mut().remove_node(container)?;
        page.untrack_clone_group(container);
        page.remove_listeners(&removed);
        let listening = page.listener_node_count();
        page.trace_cloner_line(format!(
            "[cloner] remove group={} listening_nodes={listening}",
            number.map_or_else(|| "?".to_string(), |n| n.to_string())
        ));

        self.renumber_groups(page)?;
        page.focus_node(self.trigger)
    }

    /// Reassigns `1..K` to the clone containers in document order and
    /// rewrites every `id` and label `for` inside them to match.
    pub(crate) fn renumber_groups(&self, page: &mut Page) -> Result<()> {
        let containers = page.clone_containers();
        let dom = page.dom_mut();
        for (index, container) in containers.iter().enumerate() {
            let number = index + 1;
            dom.set_attr(*container, "class", &container_class(number))?;

            for label in dom.query_selector_all_from(*container, "label")? {
                if let Some(target) = dom.attr(label, "for").filter(|value| !value.is_empty()) {
                    dom.set_attr(label, "for", &replace_suffix(&target, number))?;
                }
            }

            for node in dom.query_selector_all_from(*container, "[id]")? {
                if let Some(id) = dom.attr(node, "id").filter(|value| !value.is_empty()) {
                    dom.set_attr(node, "id", &replace_suffix(&id, number))?;
                }
            }
        }
        page.trace_cloner_line(format!("[cloner] renumber groups={}", containers.len()));
        Ok(())
    }
}

fn is_input_like(dom: &Dom, node: NodeId) -> bool {
    ["input", "select", "textarea"]
        .iter()
        .any(|tag| dom.is_tag(node, tag))
}

/// Numbers a fresh, still detached copy for group `number`.
///
/// Label `for` targets get the suffix appended (`email_1` becomes
/// `email_1_2` in group 2); ids have their suffix replaced; input-like
/// elements lose their value.
fn prepare_copy(dom: &mut Dom, root: NodeId, number: usize) -> Result<()> {
    let mut nodes = vec![root];
    dom.collect_elements_descendants_dfs(root, &mut nodes);
    for node in nodes {
        if dom.is_tag(node, "label") {
            if let Some(target) = dom.attr(node, "for").filter(|value| !value.is_empty()) {
                dom.set_attr(node, "for", &append_suffix(&target, number))?;
            }
        }
        if let Some(id) = dom.attr(node, "id").filter(|value| !value.is_empty()) {
            dom.set_attr(node, "id", &replace_suffix(&id, number))?;
        }
        if is_input_like(dom, node) {
            dom.set_value(node, "")?;
        }
    }
    Ok(())
}
