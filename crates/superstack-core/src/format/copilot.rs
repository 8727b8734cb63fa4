use super::{FormatOptions, FormatOutput};
use crate::catalog::ContextModule;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleFile {
    pub filename: String,
    pub content: String,
    pub purpose: String,
}

pub(super) fn render(modules: &[&ContextModule], opts: &FormatOptions) -> FormatOutput {
    let files = modules
        .iter()
        .map(|m| {
            let name = m.name();
            let mut content = String::new();
            if opts.include_metadata {
                content.push_str(&format!(
                    "<!-- domain: {} | type: {}",
                    m.domain, m.module_type
                ));
                if !m.tags.is_empty() {
                    content.push_str(&format!(" | tags: {}", m.tags.join(", ")));
                }
                content.push_str(" -->\n");
            }
            content.push_str(&m.content);
            BundleFile {
                filename: bundle_filename(&m.domain, &name),
                content,
                purpose: if m.description.is_empty() {
                    format!("Context for {name}")
                } else {
                    m.description.clone()
                },
            }
        })
        .collect();
    FormatOutput::Files(files)
}

/// `<domain>-<name>.md`, lowercased, spaces replaced with underscores.
pub fn bundle_filename(domain: &str, name: &str) -> String {
    format!("{domain}-{name}.md").to_lowercase().replace(' ', "_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::tests::module;

    #[test]
    fn one_file_per_module() {
        let a = module("react/patterns/hooks.md", "React Hooks", true);
        let mut b = module("testing/unit/jest.md", "Jest Basics", true);
        b.description.clear();
        let FormatOutput::Files(files) = render(&[&a, &b], &FormatOptions::default()) else {
            panic!("expected files");
        };
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].filename, "react-react_hooks.md");
        assert_eq!(files[0].purpose, "About React Hooks");
        assert_eq!(files[0].content, a.content);
        assert_eq!(files[1].filename, "testing-jest_basics.md");
        assert_eq!(files[1].purpose, "Context for Jest Basics");
    }

    #[test]
    fn metadata_comment_prepended() {
        let a = module("react/patterns/hooks.md", "React Hooks", true);
        let opts = FormatOptions {
            include_metadata: true,
            ..FormatOptions::default()
        };
        let FormatOutput::Files(files) = render(&[&a], &opts) else {
            panic!("expected files");
        };
        assert!(files[0]
            .content
            .starts_with("<!-- domain: react | type: patterns -->\n# React Hooks"));
    }

    #[test]
    fn rendered_bundle_is_json_array() {
        let a = module("react/patterns/hooks.md", "React Hooks", true);
        let out = render(&[&a], &FormatOptions::default()).render().unwrap();
        let parsed: Vec<BundleFile> = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed[0].filename, "react-react_hooks.md");
    }
}
