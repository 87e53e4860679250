use super::*;
use serde_json::Value;

mod page_actions_and_trace;

pub(super) const SIGNUP_FORM: &str = r#"
<form id="signup">
  <label for="email_1">E-Mail</label>
  <input id="email_1" class="mail" name="email" value="x">
  <button type="submit" id="send">Send</button>
</form>
"#;

pub(super) const SIGNUP_FIELDS: &str = "#signup > label, #signup > .mail";
