use super::{FormatOptions, FormatOutput};
use crate::catalog::ContextModule;

pub(super) const DEFAULT_PREFACE: &str =
    "Use the following reference material as context for this conversation.";

pub(super) fn render(modules: &[&ContextModule], opts: &FormatOptions) -> FormatOutput {
    if modules.is_empty() {
        return FormatOutput::Text(String::new());
    }

    let sections: Vec<String> = modules
        .iter()
        .map(|m| {
            let mut s = format!("## {}\n", m.name());
            if opts.include_metadata {
                let mut meta = format!("_Domain: {} | Type: {}", m.domain, m.module_type);
                if !m.tags.is_empty() {
                    meta.push_str(&format!(" | Tags: {}", m.tags.join(", ")));
                }
                meta.push('_');
                s.push_str(&meta);
                s.push('\n');
                if !m.description.is_empty() {
                    s.push_str(&format!("> {}\n", m.description));
                }
            }
            s.push('\n');
            s.push_str(m.content.trim());
            s
        })
        .collect();

    let body = sections.join(&format!("\n\n{}\n\n", opts.separator));
    let preface = opts.preface.as_deref().unwrap_or(DEFAULT_PREFACE);
    let out = if opts.include_preface && !preface.is_empty() {
        format!("{preface}\n\n{body}")
    } else {
        body
    };
    FormatOutput::Text(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::tests::module;

    #[test]
    fn preface_then_separated_sections() {
        let a = module("react/patterns/hooks.md", "React Hooks", true);
        let b = module("testing/unit/jest.md", "Jest Basics", true);
        let FormatOutput::Text(out) = render(&[&a, &b], &FormatOptions::default()) else {
            panic!("expected text");
        };
        assert!(out.starts_with(&format!("{DEFAULT_PREFACE}\n\n## React Hooks\n\n# React Hooks")));
        assert!(out.contains("\n\n---\n\n## Jest Basics\n\n"));
        assert_eq!(out.matches("\n---\n").count(), 1);
    }

    #[test]
    fn preface_can_be_replaced_or_dropped() {
        let a = module("react/patterns/hooks.md", "React Hooks", true);
        let custom = FormatOptions {
            preface: Some("Context:".to_string()),
            ..FormatOptions::default()
        };
        let FormatOutput::Text(out) = render(&[&a], &custom) else {
            panic!("expected text");
        };
        assert!(out.starts_with("Context:\n\n## React Hooks"));

        let none = FormatOptions {
            include_preface: false,
            ..FormatOptions::default()
        };
        let FormatOutput::Text(out) = render(&[&a], &none) else {
            panic!("expected text");
        };
        assert!(out.starts_with("## React Hooks"));
    }

    #[test]
    fn metadata_line_under_header() {
        let a = module("react/patterns/hooks.md", "React Hooks", true);
        let opts = FormatOptions {
            include_metadata: true,
            include_preface: false,
            separator: "***".to_string(),
            ..FormatOptions::default()
        };
        let FormatOutput::Text(out) = render(&[&a], &opts) else {
            panic!("expected text");
        };
        assert!(out.starts_with(
            "## React Hooks\n_Domain: react | Type: patterns_\n> About React Hooks\n\n"
        ));
    }
}
