use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SelectorAttrCondition {
    Exists { key: String },
    Eq { key: String, value: String },
    Contains { key: String, value: String },
    StartsWith { key: String, value: String },
    EndsWith { key: String, value: String },
    Includes { key: String, value: String },
}

impl SelectorAttrCondition {
    pub(crate) fn matches(&self, attr: Option<&String>) -> bool {
        let Some(actual) = attr else {
            return false;
        };
        match self {
            Self::Exists { .. } => true,
            Self::Eq { value, .. } => actual == value,
            // An empty operand never matches for the substring operators.
            Self::Contains { value, .. } => !value.is_empty() && actual.contains(value.as_str()),
            Self::StartsWith { value, .. } => {
                !value.is_empty() && actual.starts_with(value.as_str())
            }
            Self::EndsWith { value, .. } => !value.is_empty() && actual.ends_with(value.as_str()),
            Self::Includes { value, .. } => actual.split_whitespace().any(|token| token == value),
        }
    }

    pub(crate) fn key(&self) -> &str {
        match self {
            Self::Exists { key }
            | Self::Eq { key, .. }
            | Self::Contains { key, .. }
            | Self::StartsWith { key, .. }
            | Self::EndsWith { key, .. }
            | Self::Includes { key, .. } => key,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SelectorPseudoClass {
    FirstChild,
    LastChild,
    Disabled,
    Enabled,
    Not(Vec<Vec<SelectorPart>>),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct SelectorStep {
    pub(crate) tag: Option<String>,
    pub(crate) universal: bool,
    pub(crate) id: Option<String>,
    pub(crate) classes: Vec<String>,
    pub(crate) attrs: Vec<SelectorAttrCondition>,
    pub(crate) pseudo_classes: Vec<SelectorPseudoClass>,
}

impl SelectorStep {
    pub(crate) fn id_only(&self) -> Option<&str> {
        if !self.universal
            && self.tag.is_none()
            && self.classes.is_empty()
            && self.attrs.is_empty()
            && self.pseudo_classes.is_empty()
        {
            self.id.as_deref()
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SelectorCombinator {
    Descendant,
    Child,
    AdjacentSibling,
    GeneralSibling,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SelectorPart {
    pub(crate) step: SelectorStep,
    // Relation to previous (left) selector part.
    pub(crate) combinator: Option<SelectorCombinator>,
}

pub(crate) fn parse_selector_groups(selector: &str) -> Result<Vec<Vec<SelectorPart>>> {
    let groups = split_selector_groups(selector)?;
    let mut parsed = Vec::with_capacity(groups.len());
    for group in groups {
        parsed.push(parse_selector_chain(&group)?);
    }
    Ok(parsed)
}

fn parse_selector_chain(selector: &str) -> Result<Vec<SelectorPart>> {
    let selector = selector.trim();
    if selector.is_empty() {
        return Err(Error::UnsupportedSelector(selector.into()));
    }

    let tokens = tokenize_selector(selector)?;
    let mut steps = Vec::new();
    let mut pending_combinator: Option<SelectorCombinator> = None;

    for token in tokens {
        let combinator = match token.as_str() {
            ">" => Some(SelectorCombinator::Child),
            "+" => Some(SelectorCombinator::AdjacentSibling),
            "~" => Some(SelectorCombinator::GeneralSibling),
            _ => None,
        };
        if let Some(combinator) = combinator {
            if pending_combinator.is_some() || steps.is_empty() {
                return Err(Error::UnsupportedSelector(selector.into()));
            }
            pending_combinator = Some(combinator);
            continue;
        }

        let step = parse_selector_step(&token)?;
        let combinator = if steps.is_empty() {
            None
        } else {
            Some(
                pending_combinator
                    .take()
                    .unwrap_or(SelectorCombinator::Descendant),
            )
        };
        steps.push(SelectorPart { step, combinator });
    }

    if steps.is_empty() || pending_combinator.is_some() {
        return Err(Error::UnsupportedSelector(selector.into()));
    }

    Ok(steps)
}

/// Tracks bracket, paren and quote nesting while scanning a selector.
#[derive(Debug, Default)]
struct NestingState {
    bracket_depth: usize,
    paren_depth: usize,
    quote: Option<char>,
}

impl NestingState {
    /// Feeds one character; returns `false` on an unbalanced closer.
    fn feed(&mut self, ch: char) -> bool {
        if let Some(quote) = self.quote {
            if ch == quote {
                self.quote = None;
            }
            return true;
        }
        match ch {
            '"' | '\'' if self.bracket_depth > 0 => self.quote = Some(ch),
            '[' => self.bracket_depth += 1,
            ']' => {
                let Some(depth) = self.bracket_depth.checked_sub(1) else {
                    return false;
                };
                self.bracket_depth = depth;
            }
            '(' => self.paren_depth += 1,
            ')' => {
                let Some(depth) = self.paren_depth.checked_sub(1) else {
                    return false;
                };
                self.paren_depth = depth;
            }
            _ => {}
        }
        true
    }

    fn is_top_level(&self) -> bool {
        self.bracket_depth == 0 && self.paren_depth == 0 && self.quote.is_none()
    }
}

fn split_selector_groups(selector: &str) -> Result<Vec<String>> {
    let mut groups = Vec::new();
    let mut current = String::new();
    let mut nesting = NestingState::default();

    for ch in selector.chars() {
        if ch == ',' && nesting.is_top_level() {
            let trimmed = current.trim();
            if trimmed.is_empty() {
                return Err(Error::UnsupportedSelector(selector.into()));
            }
            groups.push(trimmed.to_string());
            current.clear();
            continue;
        }
        if !nesting.feed(ch) {
            return Err(Error::UnsupportedSelector(selector.into()));
        }
        current.push(ch);
    }

    if !nesting.is_top_level() {
        return Err(Error::UnsupportedSelector(selector.into()));
    }

    let trimmed = current.trim();
    if trimmed.is_empty() {
        return Err(Error::UnsupportedSelector(selector.into()));
    }
    groups.push(trimmed.to_string());
    Ok(groups)
}

fn tokenize_selector(selector: &str) -> Result<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut nesting = NestingState::default();

    for ch in selector.chars() {
        if nesting.is_top_level() {
            match ch {
                '>' | '+' | '~' => {
                    if !current.trim().is_empty() {
                        tokens.push(current.trim().to_string());
                    }
                    current.clear();
                    tokens.push(ch.to_string());
                    continue;
                }
                ch if ch.is_ascii_whitespace() => {
                    if !current.trim().is_empty() {
                        tokens.push(current.trim().to_string());
                    }
                    current.clear();
                    continue;
                }
                _ => {}
            }
        }
        if !nesting.feed(ch) {
            return Err(Error::UnsupportedSelector(selector.into()));
        }
        current.push(ch);
    }

    if !nesting.is_top_level() {
        return Err(Error::UnsupportedSelector(selector.into()));
    }

    if !current.trim().is_empty() {
        tokens.push(current.trim().to_string());
    }

    Ok(tokens)
}

fn parse_selector_step(part: &str) -> Result<SelectorStep> {
    let part = part.trim();
    if part.is_empty() {
        return Err(Error::UnsupportedSelector(part.into()));
    }

    let bytes = part.as_bytes();
    let mut i = 0usize;
    let mut step = SelectorStep::default();

    while i < bytes.len() {
        match bytes[i] {
            b'*' => {
                if step.universal || step.tag.is_some() {
                    return Err(Error::UnsupportedSelector(part.into()));
                }
                step.universal = true;
                i += 1;
            }
            b'#' => {
                let Some((id, next)) = parse_selector_ident(part, i + 1) else {
                    return Err(Error::UnsupportedSelector(part.into()));
                };
                if step.id.replace(id).is_some() {
                    return Err(Error::UnsupportedSelector(part.into()));
                }
                i = next;
            }
            b'.' => {
                let Some((class_name, next)) = parse_selector_ident(part, i + 1) else {
                    return Err(Error::UnsupportedSelector(part.into()));
                };
                step.classes.push(class_name);
                i = next;
            }
            b'[' => {
                let (attr, next) = parse_selector_attr_condition(part, i)?;
                step.attrs.push(attr);
                i = next;
            }
            b':' => {
                let Some((pseudo, next)) = parse_selector_pseudo(part, i) else {
                    return Err(Error::UnsupportedSelector(part.into()));
                };
                step.pseudo_classes.push(pseudo);
                i = next;
            }
            _ => {
                if step.tag.is_some()
                    || step.id.is_some()
                    || !step.classes.is_empty()
                    || !step.attrs.is_empty()
                    || !step.pseudo_classes.is_empty()
                    || step.universal
                {
                    return Err(Error::UnsupportedSelector(part.into()));
                }
                let Some((tag, next)) = parse_selector_ident(part, i) else {
                    return Err(Error::UnsupportedSelector(part.into()));
                };
                step.tag = Some(tag.to_ascii_lowercase());
                i = next;
            }
        }
    }

    Ok(step)
}

const SIMPLE_PSEUDO_CLASSES: &[(&str, SelectorPseudoClass)] = &[
    ("first-child", SelectorPseudoClass::FirstChild),
    ("last-child", SelectorPseudoClass::LastChild),
    ("disabled", SelectorPseudoClass::Disabled),
    ("enabled", SelectorPseudoClass::Enabled),
];

fn parse_selector_pseudo(part: &str, start: usize) -> Option<(SelectorPseudoClass, usize)> {
    if part.as_bytes().get(start)? != &b':' {
        return None;
    }
    let start = start + 1;
    let tail = part.get(start..)?;

    for (name, pseudo) in SIMPLE_PSEUDO_CLASSES {
        let Some(rest) = tail.strip_prefix(name) else {
            continue;
        };
        if rest.is_empty() || is_selector_continuation(rest.as_bytes().first()?) {
            return Some((pseudo.clone(), start + name.len()));
        }
    }

    let body = tail.strip_prefix("not(")?;
    let close_pos = find_matching_paren(body)?;
    let raw = body[..close_pos].trim();
    if raw.is_empty() {
        return None;
    }
    let groups = split_selector_groups(raw).ok()?;
    let mut inners = Vec::with_capacity(groups.len());
    for group in &groups {
        inners.push(parse_selector_chain(group).ok()?);
    }
    let next = start + "not(".len() + close_pos + 1;
    if let Some(ch) = part.as_bytes().get(next) {
        if !is_selector_continuation(ch) {
            return None;
        }
    }
    Some((SelectorPseudoClass::Not(inners), next))
}

fn find_matching_paren(body: &str) -> Option<usize> {
    let mut paren_depth = 1usize;
    let mut bracket_depth = 0usize;
    let mut quote: Option<u8> = None;

    for (idx, b) in body.bytes().enumerate() {
        if let Some(q) = quote {
            if b == q {
                quote = None;
            }
            continue;
        }

        match b {
            b'\'' | b'"' => quote = Some(b),
            b'[' => bracket_depth += 1,
            b']' => bracket_depth = bracket_depth.checked_sub(1)?,
            b'(' if bracket_depth == 0 => paren_depth += 1,
            b')' if bracket_depth == 0 => {
                paren_depth = paren_depth.checked_sub(1)?;
                if paren_depth == 0 {
                    return Some(idx);
                }
            }
            _ => {}
        }
    }
    None
}

fn is_selector_continuation(next: &u8) -> bool {
    matches!(next, b'.' | b'#' | b'[' | b':')
}

fn parse_selector_ident(src: &str, start: usize) -> Option<(String, usize)> {
    let bytes = src.as_bytes();
    if start >= bytes.len() || !is_selector_ident_char(bytes[start]) {
        return None;
    }
    let mut end = start + 1;
    while end < bytes.len() && is_selector_ident_char(bytes[end]) {
        end += 1;
    }
    Some((src.get(start..end)?.to_string(), end))
}

fn is_selector_ident_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'-'
}

fn parse_selector_attr_condition(
    src: &str,
    open_bracket: usize,
) -> Result<(SelectorAttrCondition, usize)> {
    let bytes = src.as_bytes();
    let mut i = open_bracket + 1;
    let mut quote: Option<u8> = None;

    while i < bytes.len() {
        let b = bytes[i];
        if let Some(q) = quote {
            if b == q {
                quote = None;
            }
            i += 1;
            continue;
        }

        if b == b'\'' || b == b'"' {
            quote = Some(b);
            i += 1;
            continue;
        }

        if b == b']' {
            let body = src
                .get(open_bracket + 1..i)
                .map(str::trim)
                .filter(|body| !body.is_empty())
                .ok_or_else(|| Error::UnsupportedSelector(src.into()))?;
            let cond = parse_attr_body(body).ok_or_else(|| Error::UnsupportedSelector(src.into()))?;
            return Ok((cond, i + 1));
        }

        i += 1;
    }

    Err(Error::UnsupportedSelector(src.into()))
}

fn parse_attr_body(body: &str) -> Option<SelectorAttrCondition> {
    let Some(eq_pos) = body.find('=') else {
        let key = body.to_ascii_lowercase();
        return key
            .bytes()
            .all(is_selector_ident_char)
            .then_some(SelectorAttrCondition::Exists { key });
    };

    let (raw_key, operator) = match body[..eq_pos].chars().last() {
        Some(op @ ('*' | '^' | '$' | '~')) => (&body[..eq_pos - 1], Some(op)),
        _ => (&body[..eq_pos], None),
    };
    let key = raw_key.trim().to_ascii_lowercase();
    if key.is_empty() || !key.bytes().all(is_selector_ident_char) {
        return None;
    }

    let value = body[eq_pos + 1..].trim();
    let value = if value.len() >= 2
        && ((value.starts_with('"') && value.ends_with('"'))
            || (value.starts_with('\'') && value.ends_with('\'')))
    {
        value[1..value.len() - 1].to_string()
    } else {
        value.to_string()
    };

    Some(match operator {
        None => SelectorAttrCondition::Eq { key, value },
        Some('*') => SelectorAttrCondition::Contains { key, value },
        Some('^') => SelectorAttrCondition::StartsWith { key, value },
        Some('$') => SelectorAttrCondition::EndsWith { key, value },
        Some(_) => SelectorAttrCondition::Includes { key, value },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn focus_target_selector_parses_into_three_groups() -> Result<()> {
        let groups = parse_selector_groups(r#"input:not([type="hidden"]), select, textarea"#)?;
        assert_eq!(groups.len(), 3);
        let input = &groups[0][0].step;
        assert_eq!(input.tag.as_deref(), Some("input"));
        match &input.pseudo_classes[..] {
            [SelectorPseudoClass::Not(inner)] => {
                assert_eq!(
                    inner[0][0].step.attrs,
                    vec![SelectorAttrCondition::Eq {
                        key: "type".into(),
                        value: "hidden".into(),
                    }]
                );
            }
            other => panic!("unexpected pseudo classes: {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn substring_attribute_operators_are_recognized() -> Result<()> {
        let groups =
            parse_selector_groups(r#"[class*="cloned-fields-"][id^=a][id$='_2'][class~=btn]"#)?;
        let attrs = &groups[0][0].step.attrs;
        assert!(matches!(attrs[0], SelectorAttrCondition::Contains { .. }));
        assert!(matches!(attrs[1], SelectorAttrCondition::StartsWith { .. }));
        assert!(matches!(attrs[2], SelectorAttrCondition::EndsWith { .. }));
        assert!(matches!(attrs[3], SelectorAttrCondition::Includes { .. }));
        Ok(())
    }

    #[test]
    fn commas_inside_quoted_attribute_values_do_not_split_groups() -> Result<()> {
        let groups = parse_selector_groups(r#"[data-x="a,b"], span"#)?;
        assert_eq!(groups.len(), 2);
        Ok(())
    }

    #[test]
    fn child_combinator_is_attached_to_the_right_part() -> Result<()> {
        let groups = parse_selector_groups("div.group > label")?;
        assert_eq!(groups[0].len(), 2);
        assert_eq!(groups[0][0].combinator, None);
        assert_eq!(groups[0][1].combinator, Some(SelectorCombinator::Child));
        Ok(())
    }

    #[test]
    fn malformed_selectors_are_rejected() {
        for selector in ["", "div,", "> a", "a >", "[", "a)", "#", ".", ":hover", "input[]"] {
            assert!(
                matches!(
                    parse_selector_groups(selector),
                    Err(Error::UnsupportedSelector(_))
                ),
                "selector should fail: {selector:?}"
            );
        }
    }

    #[test]
    fn id_only_step_is_detected() -> Result<()> {
        let groups = parse_selector_groups("#email_1")?;
        assert_eq!(groups[0][0].step.id_only(), Some("email_1"));
        let groups = parse_selector_groups("input#email_1")?;
        assert_eq!(groups[0][0].step.id_only(), None);
        Ok(())
    }
}
