use crate::cmd::Env;
use crate::output::{print_fields, print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use superstack_core::{
    catalog::load_module,
    feedback::{
        add_feedback, generate_performance_report, get_module_performance,
        modules_needing_attention, AttentionCriteria, FeedbackKind, ModulePerformance,
    },
};

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum FeedbackSubcommand {
    /// Rate how well a module worked with a model
    Add {
        module: String,
        /// positive, negative or suggestion
        kind: FeedbackKind,
        /// Model the module was used with (default: config default_model)
        #[arg(long)]
        model: Option<String>,
        /// What went well or wrong
        #[arg(long)]
        detail: Option<String>,
        /// Free-form session identifier
        #[arg(long)]
        session: Option<String>,
    },

    /// Show the feedback tallies for one module
    Show { module: String },

    /// List modules whose share of negative feedback is too high
    Attention {
        /// Minimum negative share, 0.0 to 1.0
        #[arg(long, default_value_t = AttentionCriteria::default().threshold)]
        threshold: f64,
        /// Ignore modules with fewer ratings than this
        #[arg(long, default_value_t = AttentionCriteria::default().min_feedback)]
        min_feedback: usize,
        #[arg(long, default_value_t = AttentionCriteria::default().limit)]
        limit: usize,
    },

    /// Summarize feedback across all modules
    Report,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(env: &Env, subcmd: FeedbackSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        FeedbackSubcommand::Add {
            module,
            kind,
            model,
            detail,
            session,
        } => add(env, &module, kind, model, detail.as_deref(), session.as_deref(), json),
        FeedbackSubcommand::Show { module } => show(env, &module, json),
        FeedbackSubcommand::Attention {
            threshold,
            min_feedback,
            limit,
        } => attention(
            env,
            &AttentionCriteria {
                threshold,
                min_feedback,
                limit,
            },
            json,
        ),
        FeedbackSubcommand::Report => report(env, json),
    }
}

// ---------------------------------------------------------------------------
// add / show
// ---------------------------------------------------------------------------

fn add(
    env: &Env,
    module: &str,
    kind: FeedbackKind,
    model: Option<String>,
    detail: Option<&str>,
    session: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    if load_module(env.modules_root, module).is_err() {
        eprintln!("warning: module not found in catalog: {module}");
    }
    let model = model.unwrap_or_else(|| env.config.default_model.clone());
    let entry = add_feedback(env.store, module, &model, kind, detail, session)
        .context("failed to record feedback")?;

    if json {
        return print_json(&entry);
    }
    println!("Recorded {kind} feedback for {module} ({model}).");
    Ok(())
}

fn show(env: &Env, module: &str, json: bool) -> anyhow::Result<()> {
    let perf = get_module_performance(env.store, module).context("failed to load feedback")?;

    if json {
        return print_json(&perf);
    }
    if perf.total == 0 {
        println!("No feedback recorded for {module}.");
        return Ok(());
    }
    print_fields(&[
        ("Module", perf.module.clone()),
        ("Total", perf.total.to_string()),
        ("Positive", perf.positive.to_string()),
        ("Negative", perf.negative.to_string()),
        ("Suggestions", perf.suggestions.to_string()),
        ("Negative share", percent(perf.negative_ratio)),
        (
            "Last feedback",
            perf.last_feedback
                .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
                .unwrap_or_default(),
        ),
    ]);
    Ok(())
}

// ---------------------------------------------------------------------------
// attention / report
// ---------------------------------------------------------------------------

fn attention(env: &Env, criteria: &AttentionCriteria, json: bool) -> anyhow::Result<()> {
    if !(0.0..=1.0).contains(&criteria.threshold) {
        anyhow::bail!("--threshold must be between 0.0 and 1.0");
    }
    let flagged =
        modules_needing_attention(env.store, criteria).context("failed to load feedback")?;

    if json {
        return print_json(&flagged);
    }
    if flagged.is_empty() {
        println!("No module needs attention.");
        return Ok(());
    }
    print_table(&["MODULE", "NEGATIVE", "TOTAL", "SHARE"], rows(&flagged));
    Ok(())
}

fn report(env: &Env, json: bool) -> anyhow::Result<()> {
    let report = generate_performance_report(env.store).context("failed to load feedback")?;

    if json {
        return print_json(&report);
    }
    print_fields(&[
        ("Modules rated", report.total_modules.to_string()),
        ("Feedback entries", report.total_feedback.to_string()),
    ]);
    if !report.top_negative.is_empty() {
        println!("\nMost negative:");
        print_table(&["MODULE", "NEGATIVE", "TOTAL", "SHARE"], rows(&report.top_negative));
    }
    if !report.top_positive.is_empty() {
        println!("\nMost positive:");
        let rows = report
            .top_positive
            .iter()
            .map(|p| vec![p.module.clone(), p.positive.to_string(), p.total.to_string()])
            .collect();
        print_table(&["MODULE", "POSITIVE", "TOTAL"], rows);
    }
    Ok(())
}

fn rows(perf: &[ModulePerformance]) -> Vec<Vec<String>> {
    perf.iter()
        .map(|p| {
            vec![
                p.module.clone(),
                p.negative.to_string(),
                p.total.to_string(),
                percent(p.negative_ratio),
            ]
        })
        .collect()
}

fn percent(ratio: f64) -> String {
    format!("{:.0}%", ratio * 100.0)
}
