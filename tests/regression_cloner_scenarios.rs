use form_field_cloner::{Error, Page};
use serde_json::json;

const ADDRESS_FORM: &str = r#"
<!DOCTYPE html>
<form id="order" action="/order" method="post">
  <h2>Delivery</h2>
  <!-- one address block, repeated by the cloner -->
  <label for="street_1">Street</label>
  <input id="street_1" class="address-field" name="street[]" value="Hauptstr. 1">
  <label for="city_1">City</label>
  <input id="city_1" class="address-field" name="city[]" value="Berlin">
  <label for="country_1">Country</label>
  <select id="country_1" class="address-field" name="country[]">
    <option value="de" selected>Germany</option>
    <option value="at">Austria</option>
  </select>
  <button type="submit">Order</button>
</form>
"#;

const ADDRESS_FIELDS: &str = "#order > label, #order > .address-field";

#[test]
fn single_label_and_input_round_trip() -> form_field_cloner::Result<()> {
    let html = r#"<form id="f"><label for="email_1">Mail</label><input id="email_1" value="x"></form>"#;
    let mut page = Page::from_html(html)?;
    page.attach_cloner("#f > *", &json!(null))?;

    page.click(".btn-blue-text")?;
    page.assert_attr(".cloned-fields-1 label", "for", "email_1_1")?;
    page.assert_attr(".cloned-fields-1 input", "id", "email_1")?;
    page.assert_value(".cloned-fields-1 input", "")?;

    page.click(".cloned-fields-1 .delete-btn")?;
    assert_eq!(page.cloned_group_count(), 0);
    page.assert_focused(".btn-blue-text")?;
    Ok(())
}

#[test]
fn address_block_is_cloned_with_every_field_numbered() -> form_field_cloner::Result<()> {
    let mut page = Page::from_html(ADDRESS_FORM)?;
    page.attach_cloner(
        ADDRESS_FIELDS,
        &json!({ "addButtonText": "Add address", "deleteButtonText": "Remove address" }),
    )?;

    page.click(".btn-blue-text")?;
    page.assert_count(".cloned-fields-1 label", 3)?;
    page.assert_count(".cloned-fields-1 .address-field", 3)?;
    page.assert_attr(".cloned-fields-1 #street_1", "name", "street[]")?;
    page.assert_attr(".cloned-fields-1 label[for^=country]", "for", "country_1_1")?;
    page.assert_value(".cloned-fields-1 select", "")?;
    page.assert_value("#city_1", "Berlin")?;
    page.assert_text(".cloned-fields-1 .delete-btn", "Remove address")?;
    page.assert_focused(".cloned-fields-1 input")?;
    Ok(())
}

#[test]
fn three_groups_minus_the_middle_one() -> form_field_cloner::Result<()> {
    let mut page = Page::from_html(ADDRESS_FORM)?;
    page.attach_cloner(ADDRESS_FIELDS, &json!({}))?;
    for _ in 0..3 {
        page.click(".btn-blue-text")?;
    }
    page.type_text(".cloned-fields-1 [name^=street]", "first")?;
    page.type_text(".cloned-fields-3 [name^=street]", "third")?;

    page.click(".cloned-fields-2 .delete-btn")?;

    assert_eq!(page.cloned_group_count(), 2);
    page.assert_value(".cloned-fields-1 [name^=street]", "first")?;
    page.assert_value(".cloned-fields-2 [name^=street]", "third")?;
    for (group, expected) in [(1, "street_1"), (2, "street_2")] {
        page.assert_attr(&format!(".cloned-fields-{group} input"), "id", expected)?;
    }
    page.assert_attr(".cloned-fields-2 label", "for", "street_1_2")?;
    page.assert_attr(".cloned-fields-2 select", "id", "country_2")?;
    page.assert_focused(".btn-blue-text")?;
    Ok(())
}

#[test]
fn keyboard_only_user_never_submits_by_accident() -> form_field_cloner::Result<()> {
    let mut page = Page::from_html(ADDRESS_FORM)?;
    page.attach_cloner(ADDRESS_FIELDS, &json!({}))?;

    page.focus(".btn-blue-text")?;
    page.press_key(".btn-blue-text", "Enter")?;
    page.click(".btn-blue-text")?;
    page.press_key(".cloned-fields-1 .delete-btn", "Enter")?;
    assert_eq!(page.submission_count(), 0);

    page.click("#order > button")?;
    assert_eq!(page.submission_count(), 1);
    Ok(())
}

#[test]
fn zero_matches_fail_fast_with_the_selector_in_the_message() {
    let mut page = match Page::from_html(ADDRESS_FORM) {
        Ok(page) => page,
        Err(err) => panic!("fixture should parse: {err}"),
    };
    let err = page
        .attach_cloner(".no-such-field", &json!({}))
        .expect_err("attach should fail");
    assert_eq!(
        err.to_string(),
        "configuration error: selector matched no elements: .no-such-field"
    );
    assert!(matches!(err, Error::Config(_)));
}
