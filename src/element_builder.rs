use crate::dom::{Dom, NodeId};
use crate::Result;

/// Where a new element goes relative to its reference element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertPosition {
    /// Immediately before the reference, as a sibling.
    BeforeBegin,
    /// As the first child of the reference.
    AfterBegin,
    /// As the last child of the reference.
    BeforeEnd,
    /// Immediately after the reference, as a sibling.
    AfterEnd,
}

/// The recognized fields of a freshly built element.
///
/// Unset fields leave the element untouched; `dataset` entries use
/// camelCase keys and become `data-kebab-case` attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementSpec {
    pub tag: String,
    pub class_name: Option<String>,
    pub text_content: Option<String>,
    pub role: Option<String>,
    pub tab_index: Option<i32>,
    pub dataset: Vec<(String, String)>,
}

impl ElementSpec {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    pub fn class_name(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = Some(class_name.into());
        self
    }

    pub fn text_content(mut self, text: impl Into<String>) -> Self {
        self.text_content = Some(text.into());
        self
    }

    pub fn role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    pub fn tab_index(mut self, tab_index: i32) -> Self {
        self.tab_index = Some(tab_index);
        self
    }

    pub fn data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.dataset.push((key.into(), value.into()));
        self
    }
}

pub(crate) fn build_element(
    dom: &mut Dom,
    spec: &ElementSpec,
    reference: NodeId,
    position: InsertPosition,
) -> Result<NodeId> {
    dom.check_adjacent_target(reference, position)?;
    let node = dom.create_detached_element(&spec.tag);
    if let Some(class_name) = &spec.class_name {
        dom.set_attr(node, "class", class_name)?;
    }
    if let Some(role) = &spec.role {
        dom.set_attr(node, "role", role)?;
    }
    if let Some(tab_index) = spec.tab_index {
        dom.set_attr(node, "tabindex", &tab_index.to_string())?;
    }
    for (key, value) in &spec.dataset {
        dom.dataset_set(node, key, value)?;
    }
    if let Some(text) = &spec.text_content {
        dom.set_text_content(node, text)?;
    }
    dom.insert_adjacent_node(reference, position, node)?;
    Ok(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html::parse_html;
    use crate::Error;

    fn anchor(dom: &Dom) -> Result<NodeId> {
        dom.by_id("anchor")
            .ok_or_else(|| Error::SelectorNotFound("#anchor".into()))
    }

    #[test]
    fn builds_all_recognized_fields() -> Result<()> {
        let mut dom = parse_html("<div id='anchor'></div>")?;
        let spec = ElementSpec::new("span")
            .class_name("btn delete-btn")
            .text_content("Feldgruppe löschen")
            .role("button")
            .tab_index(0)
            .data("groupNumber", "2");
        let anchor = anchor(&dom)?;
        let node = build_element(&mut dom, &spec, anchor, InsertPosition::BeforeEnd)?;

        assert_eq!(dom.tag_name(node), Some("span"));
        assert_eq!(dom.attr(node, "class").as_deref(), Some("btn delete-btn"));
        assert_eq!(dom.attr(node, "role").as_deref(), Some("button"));
        assert_eq!(dom.attr(node, "tabindex").as_deref(), Some("0"));
        assert_eq!(dom.attr(node, "data-group-number").as_deref(), Some("2"));
        assert_eq!(dom.text_content(node), "Feldgruppe löschen");
        Ok(())
    }

    #[test]
    fn every_position_lands_where_expected() -> Result<()> {
        let mut dom = parse_html("<main id='root'><p id='anchor'><b></b></p></main>")?;
        let anchor = anchor(&dom)?;
        let mut place = |tag: &str, position| {
            build_element(&mut dom, &ElementSpec::new(tag), anchor, position)
        };
        let before = place("i", InsertPosition::BeforeBegin)?;
        let first = place("em", InsertPosition::AfterBegin)?;
        let last = place("u", InsertPosition::BeforeEnd)?;
        let after = place("s", InsertPosition::AfterEnd)?;

        let root = dom
            .by_id("root")
            .ok_or_else(|| Error::SelectorNotFound("#root".into()))?;
        assert_eq!(dom.children(root), &[before, anchor, after]);
        let inner = dom.children(anchor);
        assert_eq!(inner.first(), Some(&first));
        assert_eq!(inner.last(), Some(&last));
        assert_eq!(inner.len(), 3);
        Ok(())
    }

    #[test]
    fn sibling_positions_require_an_attached_reference() -> Result<()> {
        let mut dom = parse_html("")?;
        let detached = dom.create_detached_element("div");
        let err = build_element(
            &mut dom,
            &ElementSpec::new("span"),
            detached,
            InsertPosition::AfterEnd,
        )
        .expect_err("detached reference should fail");
        assert!(matches!(err, Error::DomMutation(_)));
        Ok(())
    }

    #[test]
    fn rejected_insertion_leaves_no_orphan_in_the_arena() -> Result<()> {
        let mut dom = parse_html("<p id='anchor'>text</p>")?;
        let anchor = anchor(&dom)?;
        let text = dom.children(anchor)[0];
        let before = dom.create_detached_element("i");

        for (reference, position) in [
            (before, InsertPosition::BeforeBegin),
            (text, InsertPosition::BeforeEnd),
            (NodeId(usize::MAX), InsertPosition::AfterBegin),
        ] {
            let spec = ElementSpec::new("span");
            assert!(build_element(&mut dom, &spec, reference, position).is_err());
        }

        let after = dom.create_detached_element("i");
        assert_eq!(after.0, before.0 + 1);
        Ok(())
    }
}
