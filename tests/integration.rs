use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::json;

use formpilot::{
    extract_fields, fill_fields, pipeline, Browser, ControlType, FormField, MockData,
    ResolvedValues, RunConfig, Stage, ValueResolver,
};

const ORDER_FORM: &str = r#"<html><body>
<form id="order">
  <label for="full-name">Full Name</label>
  <input type="text" id="full-name" name="full_name" placeholder="First and last">
  <label for="email">Email</label>
  <input type="email" id="email" name="email">
  <label for="age">Age</label>
  <input type="number" id="age" name="age">
  <label><input type="checkbox" id="subscribe" name="subscribe"> Subscribe</label>
  <fieldset>
    <legend>Favorite Color</legend>
    <label><input type="radio" name="color" value="red"> Red</label>
    <label><input type="radio" name="color" value="blue"> Blue</label>
  </fieldset>
  <label for="country">Country</label>
  <select id="country" name="country">
    <option value="US">United States</option>
    <option value="CA">Canada</option>
  </select>
  <button type="submit">Send</button>
</form>
</body></html>"#;

/// Resolver returning a canned mapping, so scenarios run without a model.
struct StubResolver(ResolvedValues);

#[async_trait]
impl ValueResolver for StubResolver {
    async fn resolve(
        &self,
        _fields: &[FormField],
        _data: &MockData,
    ) -> formpilot::Result<ResolvedValues> {
        Ok(self.0.clone())
    }
}

fn fixture_url(name: &str, html: &str) -> String {
    let path = std::env::temp_dir().join(format!("formpilot-{name}.html"));
    std::fs::write(&path, html).expect("Failed to write fixture page");
    format!("file://{}", path.display())
}

async fn open_fixture(name: &str, html: &str) -> (Browser, formpilot::Page) {
    let browser = Browser::builder()
        .headless(true)
        .build()
        .await
        .expect("Failed to launch browser");
    let page = browser
        .new_page(&fixture_url(name, html))
        .await
        .expect("Failed to open fixture page");
    (browser, page)
}

#[tokio::test]
async fn test_extracted_control_types_match_the_live_elements() {
    let (_browser, page) = open_fixture("extract", ORDER_FORM).await;

    let fields = extract_fields(&page).await.expect("Failed to extract fields");
    assert_eq!(fields.len(), 6, "fields were: {fields:#?}");

    let by_selector: BTreeMap<&str, &FormField> =
        fields.iter().map(|f| (f.selector.as_str(), f)).collect();

    assert_eq!(by_selector["#full-name"].control, ControlType::Text);
    assert_eq!(by_selector["#full-name"].label, "Full Name");
    let label_text = page
        .text_content("label[for='full-name']")
        .await
        .expect("Failed to read label text");
    assert_eq!(label_text, "Full Name");
    assert_eq!(by_selector["#full-name"].placeholder, "First and last");
    assert_eq!(by_selector["#email"].control, ControlType::Email);
    assert_eq!(by_selector["#age"].control, ControlType::Number);
    assert_eq!(by_selector["#subscribe"].control, ControlType::Checkbox);
    assert_eq!(by_selector["#subscribe"].label, "Subscribe");
    assert_eq!(by_selector["#country"].control, ControlType::Select);

    // The reported type must match the element's actual type attribute.
    for (selector, expected) in [
        ("#full-name", "text"),
        ("#email", "email"),
        ("#age", "number"),
        ("#subscribe", "checkbox"),
    ] {
        let el = page.find_element(selector).await.expect("Failed to find element");
        let attr = el
            .attribute("type")
            .await
            .expect("Failed to read type attribute")
            .expect("type attribute missing");
        assert_eq!(attr, expected, "selector {selector}");
    }
}

#[tokio::test]
async fn test_radio_groups_collapse_with_legend_and_options() {
    let (_browser, page) = open_fixture("radio", ORDER_FORM).await;

    let fields = extract_fields(&page).await.expect("Failed to extract fields");
    let radio = fields
        .iter()
        .find(|f| f.control == ControlType::Radio)
        .expect("no radio group extracted");

    assert_eq!(radio.label, "Favorite Color");
    assert_eq!(radio.name, "color");
    let texts: Vec<&str> = radio.options.iter().map(|o| o.text.as_str()).collect();
    let values: Vec<&str> = radio.options.iter().map(|o| o.value.as_str()).collect();
    assert_eq!(texts, ["Red", "Blue"]);
    assert_eq!(values, ["red", "blue"]);

    let select = fields
        .iter()
        .find(|f| f.control == ControlType::Select)
        .expect("no select extracted");
    let texts: Vec<&str> = select.options.iter().map(|o| o.text.as_str()).collect();
    assert_eq!(texts, ["United States", "Canada"]);
}

#[tokio::test]
async fn test_fill_applies_each_control_type() {
    let (_browser, page) = open_fixture("fill", ORDER_FORM).await;

    let fields = extract_fields(&page).await.expect("Failed to extract fields");

    let mut values = ResolvedValues::new();
    values.insert("#full-name".into(), json!("Jane Doe"));
    values.insert("#subscribe".into(), json!(true));
    // Display-text match, deliberately lowercased.
    values.insert("#country".into(), json!("canada"));
    values.insert(r#"input[type="radio"][name="color"]"#.into(), json!("Blue"));

    let report = fill_fields(&page, &fields, &values).await;
    assert_eq!(report.attempted, 6);
    assert_eq!(report.filled, 4);
    // email and age had no resolved value
    assert_eq!(report.skipped, 2);

    let name: String = page
        .evaluate_value("document.querySelector('#full-name').value")
        .await
        .expect("Failed to read name value");
    assert_eq!(name, "Jane Doe");

    let subscribed: bool = page
        .evaluate_value("document.querySelector('#subscribe').checked")
        .await
        .expect("Failed to read checkbox state");
    assert!(subscribed);

    let country: String = page
        .evaluate_value("document.querySelector('#country').value")
        .await
        .expect("Failed to read select value");
    assert_eq!(country, "CA");

    let color: String = page
        .evaluate_value(
            "document.querySelector('input[name=\"color\"]:checked')?.value || ''",
        )
        .await
        .expect("Failed to read radio state");
    assert_eq!(color, "blue");
}

#[tokio::test]
async fn test_unmatched_option_is_skipped_not_fatal() {
    let (_browser, page) = open_fixture("unmatched", ORDER_FORM).await;

    let fields = extract_fields(&page).await.expect("Failed to extract fields");

    let mut values = ResolvedValues::new();
    values.insert("#country".into(), json!("Mexico"));
    values.insert("#full-name".into(), json!("Jane Doe"));

    let report = fill_fields(&page, &fields, &values).await;
    assert_eq!(report.filled, 1);
    assert!(report
        .warnings
        .iter()
        .any(|w| w.contains("#country") && w.contains("no option matches")));

    // The select must be left on its first option, untouched.
    let country: String = page
        .evaluate_value("document.querySelector('#country').value")
        .await
        .expect("Failed to read select value");
    assert_eq!(country, "US");
}

#[tokio::test]
async fn test_unchecked_for_non_truthy_value() {
    let (_browser, page) = open_fixture("untruthy", ORDER_FORM).await;

    let fields = extract_fields(&page).await.expect("Failed to extract fields");

    let mut values = ResolvedValues::new();
    values.insert("#subscribe".into(), json!("no"));
    let report = fill_fields(&page, &fields, &values).await;
    assert_eq!(report.filled, 1);

    let subscribed: bool = page
        .evaluate_value("document.querySelector('#subscribe').checked")
        .await
        .expect("Failed to read checkbox state");
    assert!(!subscribed);
}

#[tokio::test]
async fn test_pipeline_runs_to_finalized_with_artifacts() {
    let data_path = std::env::temp_dir().join("formpilot-pipeline-data.json");
    std::fs::write(&data_path, r#"{"name": "Jane Doe", "subscribed": true}"#)
        .expect("Failed to write data file");
    let output_dir = std::env::temp_dir().join("formpilot-pipeline-out");

    let mut values = ResolvedValues::new();
    values.insert("#full-name".into(), json!("Jane Doe"));
    values.insert("#subscribe".into(), json!(true));
    values.insert("#country".into(), json!("Canada"));
    let resolver = StubResolver(values);

    let config = RunConfig {
        target_url: fixture_url("pipeline", ORDER_FORM),
        data_file: data_path,
        model: "unused".into(),
        endpoint: "http://localhost:0/unused".into(),
        output_dir: output_dir.clone(),
        submit: false,
        browser: Browser::builder().headless(true).build_config(),
    };

    let summary = pipeline::run(&config, &resolver)
        .await
        .expect("pipeline run failed");

    assert_eq!(summary.stage, Stage::Finalized);
    assert_eq!(summary.report.attempted, 6);
    assert_eq!(summary.report.filled, 3);
    assert_eq!(summary.report.skipped, 3);
    assert!(!summary.submitted);

    let screenshot = summary.screenshot.expect("no screenshot artifact");
    assert!(screenshot.exists(), "screenshot missing: {}", screenshot.display());

    let video = summary.video.expect("no video artifact");
    assert!(video.exists(), "video missing: {}", video.display());
    let bytes = std::fs::read(&video).expect("Failed to read video");
    // Motion-JPEG stream: starts with a JPEG SOI marker.
    assert_eq!(&bytes[0..2], &[0xFF, 0xD8]);
}
