use super::*;

#[test]
fn click_on_submit_button_counts_a_submission() -> Result<()> {
    let mut page = Page::from_html(SIGNUP_FORM)?;
    page.click("#send")?;
    assert_eq!(page.submission_count(), 1);

    page.click("#signup > label")?;
    assert_eq!(page.submission_count(), 1);
    Ok(())
}

#[test]
fn enter_in_a_field_submits_its_form() -> Result<()> {
    let mut page = Page::from_html(
        r#"<form><input id="in"></form><input id="outside"><button id="off" disabled>x</button>"#,
    )?;
    page.press_key("#in", "Enter")?;
    page.press_key("#outside", "Enter")?;
    page.press_key("#off", "Enter")?;
    assert_eq!(page.submission_count(), 1);
    page.assert_focused("#outside")?;
    Ok(())
}

#[test]
fn type_text_updates_value_but_skips_disabled_and_readonly() -> Result<()> {
    let mut page = Page::from_html(
        r#"<input id="a"><input id="ro" readonly value="keep"><textarea id="t"></textarea><p id="p"></p>"#,
    )?;
    page.type_text("#a", "hello")?;
    page.type_text("#ro", "changed")?;
    page.type_text("#t", "multi\nline")?;
    page.assert_value("#a", "hello")?;
    page.assert_value("#ro", "keep")?;
    assert_eq!(page.value("#t")?, "multi\nline");

    match page.type_text("#p", "x") {
        Err(Error::TypeMismatch { expected, actual, .. }) => {
            assert_eq!(expected, "input or textarea");
            assert_eq!(actual, "p");
        }
        other => panic!("expected type mismatch, got: {other:?}"),
    }
    Ok(())
}

#[test]
fn focus_and_blur_track_the_active_element() -> Result<()> {
    let mut page = Page::from_html(r#"<input id="a"><input id="b"><input id="c" disabled>"#)?;
    page.focus("#a")?;
    page.assert_focused("#a")?;
    page.focus("#b")?;
    page.assert_focused("#b")?;
    page.focus("#c")?;
    page.assert_focused("#b")?;

    page.blur("#a")?;
    page.assert_focused("#b")?;
    page.blur("#b")?;
    assert!(matches!(
        page.assert_focused("#b"),
        Err(Error::AssertionFailed { .. })
    ));
    Ok(())
}

#[test]
fn assertion_failures_carry_actual_value_and_snippet() -> Result<()> {
    let page = Page::from_html(r#"<span id="s" class="btn">Add</span>"#)?;
    match page.assert_text("#s", "Remove") {
        Err(Error::AssertionFailed {
            selector,
            expected,
            actual,
            dom_snippet,
        }) => {
            assert_eq!(selector, "#s");
            assert_eq!(expected, "Remove");
            assert_eq!(actual, "Add");
            assert!(dom_snippet.contains(r#"class="btn""#));
        }
        other => panic!("expected assertion failure, got: {other:?}"),
    }

    match page.assert_attr("#s", "role", "button") {
        Err(Error::AssertionFailed { actual, .. }) => assert_eq!(actual, "role missing"),
        other => panic!("expected assertion failure, got: {other:?}"),
    }
    assert!(matches!(page.assert_count("span", 2), Err(Error::AssertionFailed { .. })));
    assert!(matches!(
        page.assert_exists("#missing"),
        Err(Error::SelectorNotFound(_))
    ));
    Ok(())
}

#[test]
fn insert_element_builds_controls_from_spec() -> Result<()> {
    let mut page = Page::from_html(r#"<div id="host"><p id="para">text</p></div>"#)?;
    page.insert_element(
        "#host",
        &ElementSpec::new("span")
            .class_name("badge")
            .text_content("new")
            .data("groupNumber", "3"),
        InsertPosition::AfterBegin,
    )?;

    page.assert_exists("#host > .badge:first-child + #para")?;
    page.assert_attr(".badge", "data-group-number", "3")?;
    assert_eq!(
        page.dump_dom("#host")?,
        r#"<div id="host"><span class="badge" data-group-number="3">new</span><p id="para">text</p></div>"#
    );
    Ok(())
}

#[test]
fn trace_logs_capture_cloner_and_event_lines_when_enabled() -> Result<()> {
    let mut page = Page::from_html(SIGNUP_FORM)?;
    page.enable_trace(true);
    page.set_trace_output(false);
    page.attach_cloner(SIGNUP_FIELDS, &Value::Null)?;
    page.click(".btn-blue-text")?;
    page.click(".cloned-fields-1 .delete-btn")?;

    let logs = page.take_trace_logs();
    assert!(logs.iter().any(|line| line.starts_with("[cloner] attach selector=")));
    assert!(logs.iter().any(|line| line == "[cloner] create group=1 fields=2"));
    assert!(logs.iter().any(|line| line.starts_with("[cloner] remove group=1")));
    assert!(logs.iter().any(|line| line == "[cloner] renumber groups=0"));
    assert!(logs.iter().any(|line| line.contains("[event] click target=span.btn")));
    assert!(logs.iter().any(|line| line.contains("[event] done click")));
    assert!(page.take_trace_logs().is_empty());
    Ok(())
}

#[test]
fn trace_categories_can_be_disabled() -> Result<()> {
    let mut page = Page::from_html(SIGNUP_FORM)?;
    page.enable_trace(true);
    page.set_trace_events(false);
    page.attach_cloner(SIGNUP_FIELDS, &Value::Null)?;
    page.click(".btn-blue-text")?;
    let logs = page.take_trace_logs();
    assert!(!logs.is_empty());
    assert!(logs.iter().all(|line| line.starts_with("[cloner]")));

    page.set_trace_events(true);
    page.set_trace_cloner(false);
    page.click(".btn-blue-text")?;
    let logs = page.take_trace_logs();
    assert!(!logs.is_empty());
    assert!(logs.iter().all(|line| line.starts_with("[event]")));
    Ok(())
}

#[test]
fn trace_is_off_by_default() -> Result<()> {
    let mut page = Page::from_html(SIGNUP_FORM)?;
    page.attach_cloner(SIGNUP_FIELDS, &Value::Null)?;
    page.click(".btn-blue-text")?;
    assert!(page.take_trace_logs().is_empty());
    Ok(())
}

#[test]
fn trace_log_limit_keeps_latest_entries() -> Result<()> {
    let mut page = Page::from_html(SIGNUP_FORM)?;
    page.enable_trace(true);
    page.set_trace_output(false);
    page.set_trace_events(false);
    page.set_trace_log_limit(2)?;
    page.attach_cloner(SIGNUP_FIELDS, &Value::Null)?;
    page.click(".btn-blue-text")?;
    page.click(".btn-blue-text")?;

    let logs = page.take_trace_logs();
    assert_eq!(logs, vec!["[cloner] create group=1 fields=2", "[cloner] create group=2 fields=2"]);
    Ok(())
}

#[test]
fn set_trace_log_limit_rejects_zero() -> Result<()> {
    let mut page = Page::from_html("<p></p>")?;
    match page.set_trace_log_limit(0) {
        Err(Error::Config(message)) => assert!(message.contains("at least 1")),
        other => panic!("unexpected result: {other:?}"),
    }
    Ok(())
}
