pub(super) const SCROLL_TO_TOP: &str = r#"
    if (window.scrollTo) {
        window.scrollTo({ top: 0, left: 0, behavior: "auto" });
    }
"#;
