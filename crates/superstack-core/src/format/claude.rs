use super::{metadata_lines, FormatOptions, FormatOutput};
use crate::catalog::ContextModule;

/// ```text
/// <context>
/// <module name="React Hooks" path="react/patterns/hooks.md">
/// <metadata>
/// domain: react
/// type: patterns
/// </metadata>
/// ...content...
/// </module>
/// </context>
/// ```
pub(super) fn render(modules: &[&ContextModule], opts: &FormatOptions) -> FormatOutput {
    if modules.is_empty() {
        return FormatOutput::Text(String::new());
    }

    let sections: Vec<String> = modules
        .iter()
        .map(|m| {
            let mut s = format!(
                "<module name=\"{}\" path=\"{}\">\n",
                escape_attr(&m.name()),
                escape_attr(&m.path)
            );
            if opts.include_metadata {
                s.push_str("<metadata>\n");
                for line in metadata_lines(m) {
                    s.push_str(&line);
                    s.push('\n');
                }
                s.push_str("</metadata>\n");
            }
            s.push_str(m.content.trim());
            s.push_str("\n</module>");
            s
        })
        .collect();

    FormatOutput::Text(format!(
        "<{tag}>\n{body}\n</{tag}>",
        tag = opts.tag,
        body = sections.join("\n\n")
    ))
}

fn escape_attr(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::tests::module;

    #[test]
    fn wraps_modules_in_outer_tag() {
        let a = module("react/patterns/hooks.md", "React Hooks", true);
        let b = module("testing/unit/jest.md", "Jest Basics", true);
        let FormatOutput::Text(out) = render(&[&a, &b], &FormatOptions::default()) else {
            panic!("expected text");
        };
        assert!(out.starts_with("<context>\n<module name=\"React Hooks\" path=\"react/patterns/hooks.md\">\n# React Hooks"));
        assert!(out.ends_with("</module>\n</context>"));
        assert_eq!(out.matches("<module ").count(), 2);
        assert!(!out.contains("<metadata>"));
        assert!(out.find("React Hooks").unwrap() < out.find("Jest Basics").unwrap());
    }

    #[test]
    fn metadata_block_when_requested() {
        let mut a = module("react/patterns/hooks.md", "React Hooks", true);
        a.tags = vec!["hooks".to_string(), "state".to_string()];
        let opts = FormatOptions {
            include_metadata: true,
            tag: "knowledge".to_string(),
            ..FormatOptions::default()
        };
        let FormatOutput::Text(out) = render(&[&a], &opts) else {
            panic!("expected text");
        };
        assert!(out.starts_with("<knowledge>\n"));
        assert!(out.contains(
            "<metadata>\ndescription: About React Hooks\ndomain: react\ntype: patterns\ntags: hooks, state\n</metadata>\n"
        ));
        assert!(out.ends_with("</knowledge>"));
    }

    #[test]
    fn attributes_are_escaped() {
        assert_eq!(escape_attr(r#"A "quoted" <name> & co"#), "A &quot;quoted&quot; &lt;name&gt; &amp; co");
    }
}
