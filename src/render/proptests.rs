//! Property-based tests for reply rendering

use super::*;
use proptest::prelude::*;

fn brand() -> BrandColors {
    BrandColors::default()
}

fn arb_word() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9]{1,8}".prop_map(String::from)
}

fn arb_url() -> impl Strategy<Value = String> {
    "[a-z]{1,8}".prop_map(|s| format!("https://example.com/{s}"))
}

fn arb_piece() -> impl Strategy<Value = String> {
    prop_oneof![
        arb_word(),
        (arb_word(), arb_url()).prop_map(|(t, u)| format!("[{t}]({u})")),
        (arb_word(), arb_url()).prop_map(|(t, u)| format!("![{t}]({u})")),
        arb_word().prop_map(|w| format!("**{w}**")),
        (arb_word(), arb_url()).prop_map(|(w, u)| format!("[**{w}**]({u})")),
        (arb_word(), arb_url()).prop_map(|(w, u)| format!("![###{w}###]({u})")),
        Just("###".to_string()),
        Just(" - ".to_string()),
        Just(".".to_string()),
    ]
}

fn arb_line() -> impl Strategy<Value = String> {
    proptest::collection::vec(arb_piece(), 0..6).prop_map(|pieces| pieces.join(" "))
}

fn arb_text() -> impl Strategy<Value = String> {
    proptest::collection::vec(arb_line(), 1..5).prop_map(|lines| lines.join("\n"))
}

fn arb_marker() -> impl Strategy<Value = String> {
    (0u8..10, 0u8..10).prop_map(|(a, b)| format!("【{a}:{b}†source】"))
}

/// Values of every `name="..."` attribute in `html`
fn attribute_values<'a>(html: &'a str, name: &str) -> Vec<&'a str> {
    let opener = format!(" {name}=\"");
    html.split(opener.as_str())
        .skip(1)
        .filter_map(|rest| rest.split_once('"').map(|(value, _)| value))
        .collect()
}

proptest! {
    #[test]
    fn no_markdown_links_or_images_survive(text in arb_text()) {
        let html = transform(&text, &[], &brand());
        prop_assert!(!html.contains("]("), "unconverted markdown in {}", html);
        prop_assert!(!html.contains("!["), "unconverted image in {}", html);
    }

    #[test]
    fn images_always_get_the_image_wrapper(alt in arb_word(), url in arb_url()) {
        let html = transform(&format!("![{alt}]({url})"), &[], &brand());
        let expected_img = format!(r#"<img style="max-width: 100%;" alt="{alt}" src="{url}" />"#);
        prop_assert!(html.contains(&expected_img));
    }

    #[test]
    fn transform_is_idempotent_per_input(text in arb_text(), marker in arb_marker()) {
        let annotations = vec![Annotation::new(marker)];
        prop_assert_eq!(
            transform(&text, &annotations, &brand()),
            transform(&text, &annotations, &brand())
        );
    }

    #[test]
    fn annotation_text_never_survives(
        lines in proptest::collection::vec(arb_line(), 1..4),
        marker in arb_marker(),
    ) {
        let text = lines.join(&format!("{marker}\n"));
        let annotations = vec![Annotation::new(marker.clone())];
        let html = transform(&text, &annotations, &brand());
        prop_assert!(!html.contains(&marker));
    }

    #[test]
    fn one_block_per_line(text in arb_text()) {
        let html = transform(&text, &[], &brand());
        let lines = text.split('\n').count();
        let blocks = html.matches(r#"<span style="display: block;"#).count()
            + html.matches(r#"<div style="display: block;"#).count();
        prop_assert_eq!(blocks, lines);
    }

    #[test]
    fn generated_attributes_hold_no_markup(text in arb_text()) {
        let html = transform(&text, &[], &brand());
        for name in ["title", "alt", "href", "src"] {
            for value in attribute_values(&html, name) {
                prop_assert!(!value.contains('<'), "markup inside {}=\"{}\" in {}", name, value, html);
            }
        }
    }

    #[test]
    fn arbitrary_text_never_panics(text in "\\PC{0,200}") {
        let _ = transform(&text, &[Annotation::new("x")], &brand());
    }
}
