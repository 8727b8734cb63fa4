//! Suggest modules and groups for a piece of text.
//!
//! Each domain in the rule table scores one point per keyword occurrence
//! (case-insensitive, whole words) and two points per code-pattern match.
//! Domains are ranked by score and their recommendations are taken in rank
//! order until the requested maxima are reached.

use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

pub struct DomainRule {
    pub domain: &'static str,
    pub keywords: &'static [&'static str],
    /// Regular expressions, matched case-sensitively.
    pub patterns: &'static [&'static str],
    pub modules: &'static [&'static str],
    pub groups: &'static [&'static str],
}

pub const PATTERN_WEIGHT: usize = 2;

pub fn default_domains() -> &'static [DomainRule] {
    &[
        DomainRule {
            domain: "react",
            keywords: &["react", "component", "components", "jsx", "hook", "hooks", "props", "state"],
            patterns: &[
                r"useState\(",
                r"useEffect\(",
                r"useContext\(",
                r"useReducer\(",
                r"useCallback\(",
                r"React\.",
            ],
            modules: &[
                "react/patterns/hooks.md",
                "react/patterns/components.md",
                "react/patterns/state-management.md",
            ],
            groups: &["react", "frontend"],
        },
        DomainRule {
            domain: "accessibility",
            keywords: &["accessibility", "a11y", "aria", "wcag", "screen reader", "keyboard", "contrast", "focus"],
            patterns: &[r"aria-[a-z]+", r#"role=""#, r"tabIndex", r#"alt=""#],
            modules: &[
                "accessibility/guidelines/wcag.md",
                "accessibility/patterns/aria.md",
            ],
            groups: &["accessibility"],
        },
        DomainRule {
            domain: "typescript",
            keywords: &["typescript", "type", "types", "interface", "generic", "generics", "enum"],
            patterns: &[
                r"\binterface\s+[A-Z]\w*",
                r"\btype\s+[A-Z]\w*\s*=",
                r":\s*(string|number|boolean)\b",
                r"<T(\s+extends\s+\w+)?>",
            ],
            modules: &[
                "typescript/patterns/types.md",
                "typescript/patterns/generics.md",
            ],
            groups: &["typescript"],
        },
        DomainRule {
            domain: "testing",
            keywords: &["test", "tests", "testing", "jest", "vitest", "mock", "assertion", "coverage"],
            patterns: &[r"\bdescribe\(", r"\bit\(", r"\btest\(", r"\bexpect\("],
            modules: &["testing/unit/jest.md", "testing/patterns/mocking.md"],
            groups: &["testing"],
        },
        DomainRule {
            domain: "performance",
            keywords: &["performance", "slow", "optimize", "optimization", "memoize", "cache", "bundle", "latency"],
            patterns: &[r"React\.memo\(", r"\buseMemo\(", r"\blazy\(", r"performance\.now\("],
            modules: &[
                "performance/web/rendering.md",
                "performance/web/bundle-size.md",
            ],
            groups: &["performance"],
        },
        DomainRule {
            domain: "security",
            keywords: &["security", "xss", "csrf", "auth", "authentication", "password", "sanitize", "injection"],
            patterns: &[
                r"dangerouslySetInnerHTML",
                r"\beval\(",
                r"innerHTML\s*=",
                r"localStorage\.setItem\(",
            ],
            modules: &["security/web/xss.md", "security/web/auth.md"],
            groups: &["security"],
        },
        DomainRule {
            domain: "api",
            keywords: &["api", "endpoint", "rest", "graphql", "request", "response"],
            patterns: &[r"\bfetch\(", r"axios\.", r"\bapp\.(get|post|put|delete)\(", r"res\.json\("],
            modules: &["api/design/rest.md", "api/patterns/error-handling.md"],
            groups: &["backend"],
        },
        DomainRule {
            domain: "css",
            keywords: &["css", "style", "styles", "layout", "flexbox", "grid", "tailwind", "responsive"],
            patterns: &[r"display:\s*(flex|grid)", r"@media", r"className="],
            modules: &["css/layout/flexbox.md", "css/layout/grid.md"],
            groups: &["frontend"],
        },
    ]
}

// ---------------------------------------------------------------------------
// Compiled table
// ---------------------------------------------------------------------------

struct Compiled {
    rule: &'static DomainRule,
    keywords: Vec<(&'static str, Regex)>,
    patterns: Vec<(&'static str, Regex)>,
}

static COMPILED: OnceLock<Vec<Compiled>> = OnceLock::new();

fn compiled() -> &'static [Compiled] {
    COMPILED.get_or_init(|| {
        default_domains()
            .iter()
            .map(|rule| Compiled {
                rule,
                keywords: rule
                    .keywords
                    .iter()
                    .map(|k| {
                        let re = Regex::new(&format!(r"(?i)\b{}\b", regex::escape(k))).unwrap();
                        (*k, re)
                    })
                    .collect(),
                patterns: rule
                    .patterns
                    .iter()
                    .map(|p| (*p, Regex::new(p).unwrap()))
                    .collect(),
            })
            .collect()
    })
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DomainScore {
    pub domain: String,
    pub score: usize,
    /// Keywords and patterns that matched at least once.
    pub matches: Vec<String>,
}

/// Score every domain in table order.
pub fn score_domains(content: &str) -> Vec<DomainScore> {
    compiled()
        .iter()
        .map(|c| {
            let mut score = 0;
            let mut matches = Vec::new();
            for (keyword, re) in &c.keywords {
                let n = re.find_iter(content).count();
                if n > 0 {
                    score += n;
                    matches.push(keyword.to_string());
                }
            }
            for (pattern, re) in &c.patterns {
                let n = re.find_iter(content).count();
                if n > 0 {
                    score += n * PATTERN_WEIGHT;
                    matches.push(pattern.to_string());
                }
            }
            DomainScore {
                domain: c.rule.domain.to_string(),
                score,
                matches,
            }
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct RecommendOptions {
    pub max_modules: usize,
    pub max_groups: usize,
    pub min_score: usize,
    pub include_analysis: bool,
}

impl Default for RecommendOptions {
    fn default() -> Self {
        Self {
            max_modules: 5,
            max_groups: 2,
            min_score: 1,
            include_analysis: false,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    pub modules: Vec<String>,
    pub groups: Vec<String>,
    /// Ranked domains that met `min_score`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain_analysis: Option<Vec<DomainScore>>,
}

pub fn recommend(content: &str, opts: &RecommendOptions) -> Recommendation {
    let mut ranked: Vec<DomainScore> = score_domains(content)
        .into_iter()
        .filter(|d| d.score >= opts.min_score && d.score > 0)
        .collect();
    // Stable: ties keep table order.
    ranked.sort_by(|a, b| b.score.cmp(&a.score));

    let rules = default_domains();
    let mut modules: Vec<String> = Vec::new();
    let mut groups: Vec<String> = Vec::new();
    for scored in &ranked {
        let Some(rule) = rules.iter().find(|r| r.domain == scored.domain) else {
            continue;
        };
        fill(&mut modules, rule.modules, opts.max_modules);
        fill(&mut groups, rule.groups, opts.max_groups);
        if modules.len() >= opts.max_modules && groups.len() >= opts.max_groups {
            break;
        }
    }

    Recommendation {
        modules,
        groups,
        domain_analysis: opts.include_analysis.then_some(ranked),
    }
}

fn fill(out: &mut Vec<String>, items: &[&str], max: usize) {
    for item in items {
        if out.len() >= max {
            return;
        }
        if !out.iter().any(|o| o == item) {
            out.push(item.to_string());
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn score_of(scores: &[DomainScore], domain: &str) -> usize {
        scores.iter().find(|s| s.domain == domain).unwrap().score
    }

    #[test]
    fn table_patterns_compile() {
        assert_eq!(compiled().len(), default_domains().len());
    }

    #[test]
    fn code_patterns_weigh_double() {
        let content = "const [a, setA] = useState(0);\nconst [b, setB] = useState(1);\nconst [c, setC] = useState(2);";
        let scores = score_domains(content);
        assert_eq!(score_of(&scores, "react"), 6);
        assert_eq!(score_of(&scores, "accessibility"), 0);

        let rec = recommend(
            content,
            &RecommendOptions {
                include_analysis: true,
                ..RecommendOptions::default()
            },
        );
        let analysis = rec.domain_analysis.unwrap();
        assert_eq!(analysis[0].domain, "react");
        assert!(!analysis.iter().any(|d| d.domain == "accessibility"));
        assert_eq!(rec.modules[0], "react/patterns/hooks.md");
    }

    #[test]
    fn keywords_are_whole_word_and_case_insensitive() {
        let scores = score_domains("REACT reactive React-based");
        // "reactive" is not a whole-word match.
        assert_eq!(score_of(&scores, "react"), 2);
    }

    #[test]
    fn exact_scores_for_mixed_content() {
        let content = "Make this React component accessible: add aria-label and a focus ring.";
        let scores = score_domains(content);
        assert_eq!(score_of(&scores, "react"), 2);
        // aria (1) + focus (1) + aria-label pattern (2)
        assert_eq!(score_of(&scores, "accessibility"), 4);

        let rec = recommend(
            content,
            &RecommendOptions {
                max_modules: 3,
                ..RecommendOptions::default()
            },
        );
        assert_eq!(
            rec.modules,
            vec![
                "accessibility/guidelines/wcag.md",
                "accessibility/patterns/aria.md",
                "react/patterns/hooks.md",
            ]
        );
        assert_eq!(rec.groups, vec!["accessibility", "react"]);
        assert!(rec.domain_analysis.is_none());
    }

    #[test]
    fn ties_keep_table_order_and_groups_dedupe() {
        let content = "React component with a flexbox layout";
        let rec = recommend(
            content,
            &RecommendOptions {
                max_groups: 5,
                include_analysis: true,
                ..RecommendOptions::default()
            },
        );
        let analysis = rec.domain_analysis.unwrap();
        assert_eq!(analysis[0].domain, "react");
        assert_eq!(analysis[0].score, 2);
        assert_eq!(analysis[1].domain, "css");
        assert_eq!(analysis[1].score, 2);
        assert_eq!(rec.groups, vec!["react", "frontend"]);
    }

    #[test]
    fn min_score_filters_domains() {
        let rec = recommend(
            "React component",
            &RecommendOptions {
                min_score: 3,
                ..RecommendOptions::default()
            },
        );
        assert!(rec.modules.is_empty());
        assert!(rec.groups.is_empty());
    }

    #[test]
    fn no_signal_recommends_nothing() {
        let rec = recommend("lorem ipsum dolor sit amet", &RecommendOptions::default());
        assert!(rec.modules.is_empty());
        assert!(rec.groups.is_empty());
    }
}
