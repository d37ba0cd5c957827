//! Widget helpers scoped to a documentation section
//!
//! MUI docs pages group each demo under an `h2` heading followed by a
//! `div` holding the widget. These helpers build the steps for common
//! interactions inside one such section.

use crate::spec::TestStep;

const LISTBOX: &str = r#"[role="listbox"]"#;

/// One `h2`-headed section of a docs page
#[derive(Debug, Clone)]
pub struct Section {
    heading: String,
}

impl Section {
    pub fn new(heading: impl Into<String>) -> Self {
        Self {
            heading: heading.into(),
        }
    }

    /// Selector for the container following the heading
    pub fn container(&self) -> String {
        format!(
            "h2:has-text({}) + div",
            serde_json::Value::String(self.heading.clone())
        )
    }

    fn within(&self, selector: &str) -> String {
        format!("{} >> {}", self.container(), selector)
    }

    /// First table in the section
    pub fn table(&self) -> String {
        self.within("table >> nth=0")
    }

    /// Type into the section's combobox and pick a suggestion
    pub fn select_from_autocomplete(&self, search: &str, option: &str) -> Vec<TestStep> {
        let input = self.within(r#"input[role="combobox"] >> nth=0"#);
        vec![
            TestStep::Click {
                selector: input.clone(),
                timeout_ms: None,
                force: false,
            },
            TestStep::Type {
                selector: input,
                text: search.to_string(),
                delay_ms: None,
            },
            visible(LISTBOX),
            click_option(option),
        ]
    }

    /// Open the section's custom select and pick an option
    pub fn select_from_dropdown(&self, option: &str) -> Vec<TestStep> {
        vec![
            TestStep::Click {
                selector: self.within(r#"div[role="button"] >> nth=0"#),
                timeout_ms: None,
                force: false,
            },
            visible(LISTBOX),
            click_option(option),
        ]
    }

    /// Replace the text of the `index`-th input in the section
    pub fn fill_text_field(&self, index: usize, text: &str) -> Vec<TestStep> {
        vec![TestStep::Fill {
            selector: self.within(&format!("input >> nth={}", index)),
            value: text.to_string(),
            clear_first: true,
            force: true,
        }]
    }
}

fn visible(selector: &str) -> TestStep {
    TestStep::Assert {
        selector: selector.to_string(),
        visible: Some(true),
        text: None,
        text_contains: None,
        value: None,
        attribute: None,
        count: None,
        min_count: None,
    }
}

fn click_option(text: &str) -> TestStep {
    TestStep::Click {
        selector: format!(
            r#"[role="option"]:has-text({}) >> nth=0"#,
            serde_json::Value::String(text.to_string())
        ),
        timeout_ms: None,
        force: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_quotes_heading() {
        let section = Section::new("Basic \"select\"");
        assert_eq!(section.container(), r#"h2:has-text("Basic \"select\"") + div"#);
        assert_eq!(section.table(), r#"h2:has-text("Basic \"select\"") + div >> table >> nth=0"#);
    }

    #[test]
    fn test_autocomplete_steps() {
        let steps = Section::new("Combo box").select_from_autocomplete("The God", "The Godfather");
        assert_eq!(steps.len(), 4);
        match &steps[3] {
            TestStep::Click { selector, .. } => {
                assert_eq!(selector, r#"[role="option"]:has-text("The Godfather") >> nth=0"#)
            }
            other => panic!("unexpected step {:?}", other),
        }
    }

    #[test]
    fn test_fill_text_field_targets_index() {
        let steps = Section::new("Basic TextField").fill_text_field(2, "abc");
        match &steps[0] {
            TestStep::Fill { selector, clear_first, .. } => {
                assert!(selector.ends_with("input >> nth=2"));
                assert!(*clear_first);
            }
            other => panic!("unexpected step {:?}", other),
        }
    }

    #[test]
    fn test_dropdown_steps() {
        let steps = Section::new("Basic select").select_from_dropdown("Twenty");
        assert!(matches!(&steps[1], TestStep::Assert { visible: Some(true), .. }));
    }
}
