use super::{metadata_lines, FormatOptions, FormatOutput};
use crate::catalog::ContextModule;

/// A `## name` heading over each module's contents, joined by the separator.
/// Metadata, when asked for, goes in an HTML comment under the heading so it
/// stays invisible once rendered.
pub(super) fn render(modules: &[&ContextModule], opts: &FormatOptions) -> FormatOutput {
    let sections: Vec<String> = modules
        .iter()
        .map(|m| {
            let mut s = format!("## {}\n\n", m.name());
            if opts.include_metadata {
                s.push_str(&format!("<!--\nmodule: {}\n", m.path));
                for line in metadata_lines(m) {
                    s.push_str(&line);
                    s.push('\n');
                }
                s.push_str("-->\n");
            }
            s.push_str(m.content.trim());
            s
        })
        .collect();
    FormatOutput::Text(sections.join(&format!("\n\n{}\n\n", opts.separator)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::tests::module;

    #[test]
    fn joins_contents_with_separator() {
        let a = module("react/patterns/hooks.md", "React Hooks", true);
        let b = module("testing/unit/jest.md", "Jest Basics", true);
        let FormatOutput::Text(out) = render(&[&a, &b], &FormatOptions::default()) else {
            panic!("expected text");
        };
        assert_eq!(
            out,
            format!(
                "## React Hooks\n\n{}\n\n---\n\n## Jest Basics\n\n{}",
                a.content.trim(),
                b.content.trim()
            )
        );
    }

    #[test]
    fn untitled_module_is_headed_by_file_stem() {
        let m = ContextModule::from_content("react/patterns/effects.md", "Plain notes.\n".to_string());
        let FormatOutput::Text(out) = render(&[&m], &FormatOptions::default()) else {
            panic!("expected text");
        };
        assert_eq!(out, "## effects\n\nPlain notes.");
    }

    #[test]
    fn metadata_in_comment() {
        let a = module("react/patterns/hooks.md", "React Hooks", true);
        let opts = FormatOptions {
            include_metadata: true,
            ..FormatOptions::default()
        };
        let FormatOutput::Text(out) = render(&[&a], &opts) else {
            panic!("expected text");
        };
        assert!(out.starts_with(
            "## React Hooks\n\n<!--\nmodule: react/patterns/hooks.md\ndescription: About React Hooks\ndomain: react\ntype: patterns\n-->\n# React Hooks"
        ));
    }
}
