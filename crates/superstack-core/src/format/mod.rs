//! Formatter registry.
//!
//! A formatter turns a list of modules into the wire format one AI tool
//! expects. Formatters are plain `fn` pointers registered in a table together
//! with a description of the options they accept, so callers can list the
//! targets, validate `key=value` options, and dispatch by id without knowing
//! any formatter up front.
//!
//! Every formatter sees the modules after the same filtering step
//! ([`filter_modules`]), so `include_inactive` and `default_domain` behave
//! identically whatever the target.

mod chatgpt;
mod claude;
mod copilot;
mod markdown;

pub use copilot::BundleFile;

use crate::catalog::ContextModule;
use crate::error::{Result, SuperstackError};
use crate::tokens::{estimate_token_count, optimize_for_limit, OptimizeOptions};
use serde::Serialize;

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionKind {
    Bool,
    String,
}

#[derive(Debug, Clone, Serialize)]
pub struct OptionSpec {
    pub name: &'static str,
    pub kind: OptionKind,
    pub default: &'static str,
    pub description: &'static str,
}

const INCLUDE_INACTIVE: OptionSpec = OptionSpec {
    name: "include_inactive",
    kind: OptionKind::Bool,
    default: "false",
    description: "Also render modules marked inactive",
};

const DEFAULT_DOMAIN: OptionSpec = OptionSpec {
    name: "default_domain",
    kind: OptionKind::String,
    default: "",
    description: "Only render modules from this domain",
};

const INCLUDE_METADATA: OptionSpec = OptionSpec {
    name: "include_metadata",
    kind: OptionKind::Bool,
    default: "false",
    description: "Emit description/domain/type/tags per module",
};

const INCLUDE_PREFACE: OptionSpec = OptionSpec {
    name: "include_preface",
    kind: OptionKind::Bool,
    default: "true",
    description: "Start with an introductory sentence",
};

const PREFACE: OptionSpec = OptionSpec {
    name: "preface",
    kind: OptionKind::String,
    default: chatgpt::DEFAULT_PREFACE,
    description: "Introductory sentence text",
};

const TAG: OptionSpec = OptionSpec {
    name: "tag",
    kind: OptionKind::String,
    default: DEFAULT_TAG,
    description: "Name of the outer wrapping tag",
};

const SEPARATOR: OptionSpec = OptionSpec {
    name: "separator",
    kind: OptionKind::String,
    default: DEFAULT_SEPARATOR,
    description: "Line placed between modules",
};

pub const DEFAULT_TAG: &str = "context";
pub const DEFAULT_SEPARATOR: &str = "---";

/// Options for a single formatting call. Fields a formatter does not declare
/// in its [`FormatterInfo`] are ignored by it.
#[derive(Debug, Clone, PartialEq)]
pub struct FormatOptions {
    pub include_inactive: bool,
    pub default_domain: Option<String>,
    pub include_metadata: bool,
    pub include_preface: bool,
    /// `None` uses the formatter's own default sentence.
    pub preface: Option<String>,
    pub tag: String,
    pub separator: String,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            include_inactive: false,
            default_domain: None,
            include_metadata: false,
            include_preface: true,
            preface: None,
            tag: DEFAULT_TAG.to_string(),
            separator: DEFAULT_SEPARATOR.to_string(),
        }
    }
}

impl FormatOptions {
    /// Build options from `key=value` strings, rejecting keys the formatter
    /// does not declare and values of the wrong kind.
    pub fn from_pairs<S: AsRef<str>>(info: &FormatterInfo, pairs: &[S]) -> Result<Self> {
        let mut opts = Self::default();
        for pair in pairs {
            let pair = pair.as_ref();
            let invalid = |reason: String| SuperstackError::InvalidOption {
                formatter: info.id.to_string(),
                reason,
            };
            let (key, value) = pair
                .split_once('=')
                .ok_or_else(|| invalid(format!("expected key=value, got '{pair}'")))?;
            let key = key.trim();
            let spec = info
                .options
                .iter()
                .find(|o| o.name == key)
                .ok_or_else(|| invalid(format!("unsupported option '{key}'")))?;
            opts.set(spec, value).map_err(invalid)?;
        }
        Ok(opts)
    }

    fn set(&mut self, spec: &OptionSpec, value: &str) -> std::result::Result<(), String> {
        match spec.name {
            "include_inactive" => self.include_inactive = parse_bool(spec, value)?,
            "include_metadata" => self.include_metadata = parse_bool(spec, value)?,
            "include_preface" => self.include_preface = parse_bool(spec, value)?,
            "default_domain" => {
                self.default_domain = Some(value.to_string()).filter(|v| !v.is_empty())
            }
            "preface" => self.preface = Some(value.to_string()),
            "tag" => {
                if value.is_empty() || value.contains(['<', '>', ' ']) {
                    return Err(format!("invalid tag name '{value}'"));
                }
                self.tag = value.to_string();
            }
            "separator" => self.separator = value.to_string(),
            other => return Err(format!("unsupported option '{other}'")),
        }
        Ok(())
    }
}

fn parse_bool(spec: &OptionSpec, value: &str) -> std::result::Result<bool, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Ok(true),
        "false" | "no" | "0" | "off" => Ok(false),
        _ => Err(format!("option '{}' expects true/false, got '{value}'", spec.name)),
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FormatOutput {
    Text(String),
    Files(Vec<BundleFile>),
}

impl FormatOutput {
    pub fn is_empty(&self) -> bool {
        match self {
            FormatOutput::Text(s) => s.is_empty(),
            FormatOutput::Files(f) => f.is_empty(),
        }
    }

    /// The string handed to the clipboard. File bundles become pretty JSON;
    /// an empty output is always the empty string.
    pub fn render(&self) -> Result<String> {
        match self {
            FormatOutput::Text(s) => Ok(s.clone()),
            FormatOutput::Files(f) if f.is_empty() => Ok(String::new()),
            FormatOutput::Files(f) => Ok(serde_json::to_string_pretty(f)?),
        }
    }
}

// ---------------------------------------------------------------------------
// Formatter table
// ---------------------------------------------------------------------------

pub type RenderFn = fn(&[&ContextModule], &FormatOptions) -> FormatOutput;

#[derive(Debug, Clone, Serialize)]
pub struct FormatterInfo {
    pub id: &'static str,
    pub description: &'static str,
    /// Model family or tool the output is shaped for.
    pub target: &'static str,
    pub options: &'static [OptionSpec],
}

pub struct Formatter {
    pub info: FormatterInfo,
    pub render: RenderFn,
}

pub fn default_formatters() -> Vec<Formatter> {
    vec![
        Formatter {
            info: FormatterInfo {
                id: "claude",
                description: "Modules wrapped in an XML-style tag block",
                target: "anthropic",
                options: &[INCLUDE_INACTIVE, DEFAULT_DOMAIN, INCLUDE_METADATA, TAG],
            },
            render: claude::render,
        },
        Formatter {
            info: FormatterInfo {
                id: "chatgpt",
                description: "Preface sentence, then '## name' sections split by a separator",
                target: "openai",
                options: &[
                    INCLUDE_INACTIVE,
                    DEFAULT_DOMAIN,
                    INCLUDE_METADATA,
                    INCLUDE_PREFACE,
                    PREFACE,
                    SEPARATOR,
                ],
            },
            render: chatgpt::render,
        },
        Formatter {
            info: FormatterInfo {
                id: "copilot",
                description: "One file per module as {filename, content, purpose} records",
                target: "github-copilot",
                options: &[INCLUDE_INACTIVE, DEFAULT_DOMAIN, INCLUDE_METADATA],
            },
            render: copilot::render,
        },
        Formatter {
            info: FormatterInfo {
                id: "markdown",
                description: "A '## name' heading per module, modules joined by a separator",
                target: "generic",
                options: &[INCLUDE_INACTIVE, DEFAULT_DOMAIN, INCLUDE_METADATA, SEPARATOR],
            },
            render: markdown::render,
        },
    ]
}

pub struct Registry {
    formatters: Vec<Formatter>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new(default_formatters())
    }
}

impl Registry {
    pub fn new(formatters: Vec<Formatter>) -> Self {
        Self { formatters }
    }

    pub fn list(&self) -> Vec<&FormatterInfo> {
        self.formatters.iter().map(|f| &f.info).collect()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.formatters.iter().any(|f| f.info.id == id)
    }

    pub fn get(&self, id: &str) -> Result<&Formatter> {
        self.formatters
            .iter()
            .find(|f| f.info.id == id)
            .ok_or_else(|| SuperstackError::UnknownFormatter(id.to_string()))
    }

    /// Filter `modules` and render them with formatter `id`.
    pub fn format(
        &self,
        id: &str,
        modules: &[ContextModule],
        opts: &FormatOptions,
    ) -> Result<FormatOutput> {
        let formatter = self.get(id)?;
        let kept = filter_modules(modules, opts);
        Ok((formatter.render)(&kept, opts))
    }

    /// Like [`Registry::format`], but when `budget` is set and the rendered
    /// output is over it, module contents are cut down before rendering
    /// again, so the formatter's own framing (tags, headings, JSON records)
    /// is never truncated.
    ///
    /// Modules are taken in order: each is kept whole while it fits, the
    /// first that does not is trimmed section by section, and every module
    /// after it is dropped.
    pub fn fit(
        &self,
        id: &str,
        modules: &[ContextModule],
        opts: &FormatOptions,
        budget: Option<&TokenBudget>,
    ) -> Result<Fitted> {
        let formatter = self.get(id)?;
        let kept = filter_modules(modules, opts);
        let whole = Fitted {
            output: (formatter.render)(&kept, opts),
            modules: kept.len(),
            trimmed: Vec::new(),
            dropped: Vec::new(),
        };
        let Some(budget) = budget else {
            return Ok(whole);
        };
        let rendered = estimate_token_count(&whole.output.render()?);
        if rendered <= budget.max_tokens {
            return Ok(whole);
        }

        let content_tokens: usize = kept
            .iter()
            .map(|m| estimate_token_count(m.content.trim()))
            .sum();
        let overhead = rendered.saturating_sub(content_tokens);
        let mut content_budget = budget.max_tokens.saturating_sub(overhead);
        loop {
            let fitted = fit_contents(formatter, &kept, opts, budget, content_budget);
            let tokens = estimate_token_count(&fitted.output.render()?);
            if tokens <= budget.max_tokens || content_budget == 0 {
                tracing::debug!(
                    formatter = id,
                    tokens,
                    max = budget.max_tokens,
                    trimmed = fitted.trimmed.len(),
                    dropped = fitted.dropped.len(),
                    "fitted output to budget"
                );
                return Ok(fitted);
            }
            // Rounding and the truncation marker can overshoot; shrink and retry.
            content_budget = content_budget.saturating_sub(tokens - budget.max_tokens);
        }
    }
}

/// Upper bound on the rendered output of [`Registry::fit`].
#[derive(Debug, Clone, Default)]
pub struct TokenBudget {
    pub max_tokens: usize,
    /// Sections mentioning these keywords are kept first when a module is trimmed.
    pub prioritize: Vec<String>,
}

/// Result of [`Registry::fit`].
#[derive(Debug, Clone)]
pub struct Fitted {
    pub output: FormatOutput,
    /// Modules present in the output, whole or trimmed.
    pub modules: usize,
    /// Paths whose content was cut short.
    pub trimmed: Vec<String>,
    /// Paths left out entirely.
    pub dropped: Vec<String>,
}

impl Fitted {
    pub fn truncated(&self) -> bool {
        !self.trimmed.is_empty() || !self.dropped.is_empty()
    }
}

fn fit_contents(
    formatter: &Formatter,
    kept: &[&ContextModule],
    opts: &FormatOptions,
    budget: &TokenBudget,
    content_budget: usize,
) -> Fitted {
    let optimize = OptimizeOptions {
        preserve_structure: true,
        prioritize_sections: budget.prioritize.clone(),
    };
    let mut remaining = content_budget;
    let mut fitted: Vec<ContextModule> = Vec::with_capacity(kept.len());
    let mut trimmed = Vec::new();
    let mut dropped = Vec::new();

    for m in kept {
        if !trimmed.is_empty() || !dropped.is_empty() {
            dropped.push(m.path.clone());
            continue;
        }
        let content = m.content.trim();
        let tokens = estimate_token_count(content);
        if tokens <= remaining {
            remaining -= tokens;
            fitted.push((*m).clone());
            continue;
        }
        let cut = optimize_for_limit(content, remaining, &optimize);
        if cut.sections_included == 0 {
            dropped.push(m.path.clone());
            continue;
        }
        trimmed.push(m.path.clone());
        fitted.push(ContextModule {
            content: cut.content,
            ..(*m).clone()
        });
        remaining = 0;
    }

    let refs: Vec<&ContextModule> = fitted.iter().collect();
    Fitted {
        output: (formatter.render)(&refs, opts),
        modules: refs.len(),
        trimmed,
        dropped,
    }
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Drop inactive modules (unless asked not to) and modules outside
/// `default_domain` when one is set. Order is preserved.
pub fn filter_modules<'a>(modules: &'a [ContextModule], opts: &FormatOptions) -> Vec<&'a ContextModule> {
    modules
        .iter()
        .filter(|m| opts.include_inactive || m.active)
        .filter(|m| match &opts.default_domain {
            Some(domain) => &m.domain == domain,
            None => true,
        })
        .collect()
}

/// `key: value` lines describing a module; empty values are skipped.
fn metadata_lines(m: &ContextModule) -> Vec<String> {
    let mut lines = Vec::new();
    if !m.description.is_empty() {
        lines.push(format!("description: {}", m.description));
    }
    lines.push(format!("domain: {}", m.domain));
    lines.push(format!("type: {}", m.module_type));
    if !m.tags.is_empty() {
        lines.push(format!("tags: {}", m.tags.join(", ")));
    }
    lines
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn module(path: &str, title: &str, active: bool) -> ContextModule {
        let mut m = ContextModule::from_content(
            path,
            format!("# {title}\n> About {title}\n\nBody of {title}.\n"),
        );
        m.active = active;
        m
    }

    fn sample() -> Vec<ContextModule> {
        vec![
            module("react/patterns/hooks.md", "React Hooks", true),
            module("react/patterns/legacy.md", "Legacy Mixins", false),
            module("testing/unit/jest.md", "Jest Basics", true),
            module("css/layout/grid.md", "Grid Layout", true),
            module("security/web/headers.md", "Security Headers", true),
        ]
    }

    #[test]
    fn every_formatter_drops_inactive_modules() {
        let registry = Registry::default();
        let modules = sample();
        for info in registry.list() {
            for include_metadata in [false, true] {
                let opts = FormatOptions {
                    include_metadata,
                    ..FormatOptions::default()
                };
                let out = registry
                    .format(info.id, &modules, &opts)
                    .unwrap()
                    .render()
                    .unwrap();
                for name in ["React Hooks", "Jest Basics", "Grid Layout", "Security Headers"] {
                    assert!(out.contains(name), "{} missing {name}", info.id);
                }
                assert!(!out.contains("Legacy Mixins"), "{} kept inactive", info.id);
            }
        }
    }

    #[test]
    fn every_formatter_names_untitled_modules() {
        let registry = Registry::default();
        let modules = vec![
            ContextModule::from_content("react/patterns/effects.md", "Plain notes.\n".to_string()),
            ContextModule::from_content("testing/unit/mocks.md", "More notes.\n".to_string()),
        ];
        for info in registry.list() {
            let out = registry
                .format(info.id, &modules, &FormatOptions::default())
                .unwrap()
                .render()
                .unwrap();
            assert!(out.contains("effects"), "{} lost the first name", info.id);
            assert!(out.contains("mocks"), "{} lost the second name", info.id);
        }
    }

    #[test]
    fn include_inactive_keeps_everything() {
        let modules = sample();
        let opts = FormatOptions {
            include_inactive: true,
            ..FormatOptions::default()
        };
        assert_eq!(filter_modules(&modules, &opts).len(), 5);
    }

    #[test]
    fn default_domain_is_exact_match() {
        let modules = sample();
        let opts = FormatOptions {
            default_domain: Some("react".to_string()),
            include_inactive: true,
            ..FormatOptions::default()
        };
        let kept = filter_modules(&modules, &opts);
        assert_eq!(kept.len(), 2);
        assert!(kept.iter().all(|m| m.domain == "react"));

        let opts = FormatOptions {
            default_domain: Some("reac".to_string()),
            ..FormatOptions::default()
        };
        assert!(filter_modules(&modules, &opts).is_empty());
    }

    #[test]
    fn empty_input_yields_empty_output() {
        let registry = Registry::default();
        for info in registry.list() {
            let out = registry
                .format(info.id, &[], &FormatOptions::default())
                .unwrap();
            assert!(out.is_empty(), "{} not empty", info.id);
            assert_eq!(out.render().unwrap(), "");
        }
    }

    #[test]
    fn everything_filtered_out_yields_empty_output() {
        let registry = Registry::default();
        let modules = vec![module("a/b/c.md", "Only Inactive", false)];
        let out = registry
            .format("chatgpt", &modules, &FormatOptions::default())
            .unwrap();
        assert_eq!(out.render().unwrap(), "");
    }

    #[test]
    fn unknown_formatter_is_error() {
        let registry = Registry::default();
        let err = registry
            .format("nope", &[], &FormatOptions::default())
            .unwrap_err();
        assert!(matches!(err, SuperstackError::UnknownFormatter(_)));
    }

    #[test]
    fn from_pairs_accepts_declared_options() {
        let registry = Registry::default();
        let info = &registry.get("chatgpt").unwrap().info;
        let opts = FormatOptions::from_pairs(
            info,
            &["include_metadata=yes", "preface=Read this:", "separator=***"],
        )
        .unwrap();
        assert!(opts.include_metadata);
        assert_eq!(opts.preface.as_deref(), Some("Read this:"));
        assert_eq!(opts.separator, "***");
    }

    #[test]
    fn from_pairs_rejects_undeclared_option() {
        let registry = Registry::default();
        let info = &registry.get("copilot").unwrap().info;
        let err = FormatOptions::from_pairs(info, &["tag=ctx"]).unwrap_err();
        assert!(err.to_string().contains("unsupported option 'tag'"));
    }

    #[test]
    fn from_pairs_rejects_bad_values() {
        let registry = Registry::default();
        let info = &registry.get("claude").unwrap().info;
        assert!(FormatOptions::from_pairs(info, &["include_metadata=maybe"]).is_err());
        assert!(FormatOptions::from_pairs(info, &["tag=<bad>"]).is_err());
        assert!(FormatOptions::from_pairs(info, &["no-equals-sign"]).is_err());
    }

    #[test]
    fn every_formatter_declares_the_filter_options() {
        for f in default_formatters() {
            let names: Vec<_> = f.info.options.iter().map(|o| o.name).collect();
            assert!(names.contains(&"include_inactive"), "{}", f.info.id);
            assert!(names.contains(&"default_domain"), "{}", f.info.id);
        }
    }

    fn long_module(path: &str, title: &str) -> ContextModule {
        let mut body = format!("# {title}\n> About {title}\n");
        for i in 0..30 {
            body.push_str(&format!("\nParagraph {i} of {title} with enough words to count.\n"));
        }
        ContextModule::from_content(path, body)
    }

    #[test]
    fn fit_without_budget_counts_rendered_modules() {
        let registry = Registry::default();
        let fitted = registry
            .fit("claude", &sample(), &FormatOptions::default(), None)
            .unwrap();
        assert_eq!(fitted.modules, 4);
        assert!(!fitted.truncated());
    }

    #[test]
    fn fit_under_budget_is_untouched() {
        let registry = Registry::default();
        let modules = sample();
        let opts = FormatOptions::default();
        let budget = TokenBudget {
            max_tokens: 10_000,
            ..TokenBudget::default()
        };
        let fitted = registry.fit("claude", &modules, &opts, Some(&budget)).unwrap();
        assert_eq!(fitted.output, registry.format("claude", &modules, &opts).unwrap());
        assert!(!fitted.truncated());
    }

    #[test]
    fn fit_keeps_claude_wrapper_intact() {
        let registry = Registry::default();
        let modules = vec![
            long_module("react/patterns/hooks.md", "React Hooks"),
            long_module("testing/unit/jest.md", "Jest Basics"),
        ];
        let budget = TokenBudget {
            max_tokens: 150,
            ..TokenBudget::default()
        };
        let fitted = registry
            .fit("claude", &modules, &FormatOptions::default(), Some(&budget))
            .unwrap();
        let out = fitted.output.render().unwrap();
        assert!(estimate_token_count(&out) <= 150);
        assert!(out.starts_with("<context>\n<module name=\"React Hooks\""));
        assert!(out.ends_with("</module>\n</context>"));
        assert!(out.contains(crate::tokens::TRUNCATION_MARKER));
        assert_eq!(fitted.trimmed, vec!["react/patterns/hooks.md".to_string()]);
        assert_eq!(fitted.dropped, vec!["testing/unit/jest.md".to_string()]);
        assert_eq!(fitted.modules, 1);
    }

    #[test]
    fn fit_keeps_copilot_bundle_parseable() {
        let registry = Registry::default();
        let modules = vec![
            long_module("react/patterns/hooks.md", "React Hooks"),
            long_module("testing/unit/jest.md", "Jest Basics"),
        ];
        let budget = TokenBudget {
            max_tokens: 200,
            ..TokenBudget::default()
        };
        let fitted = registry
            .fit("copilot", &modules, &FormatOptions::default(), Some(&budget))
            .unwrap();
        let out = fitted.output.render().unwrap();
        assert!(estimate_token_count(&out) <= 200);
        let files: Vec<BundleFile> = serde_json::from_str(&out).unwrap();
        assert!(!files.is_empty());
        assert!(fitted.truncated());
    }

    #[test]
    fn fit_budget_below_framing_drops_everything() {
        let registry = Registry::default();
        let modules = vec![long_module("react/patterns/hooks.md", "React Hooks")];
        let budget = TokenBudget {
            max_tokens: 5,
            ..TokenBudget::default()
        };
        let fitted = registry
            .fit("claude", &modules, &FormatOptions::default(), Some(&budget))
            .unwrap();
        assert!(fitted.output.is_empty());
        assert_eq!(fitted.modules, 0);
        assert_eq!(fitted.dropped.len(), 1);
    }

    #[test]
    fn placeholder_modules_render_visibly() {
        let registry = Registry::default();
        let modules = vec![
            ContextModule::missing("react/gone.md"),
            module("react/patterns/hooks.md", "React Hooks", true),
        ];
        let out = registry
            .format("claude", &modules, &FormatOptions::default())
            .unwrap()
            .render()
            .unwrap();
        assert!(out.contains("Module not found: react/gone.md"));
        assert!(out.contains("React Hooks"));
    }
}
