use crate::cmd::Env;
use crate::output::{print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use superstack_core::{
    active::{
        add_modules_to_active_context, clear_active_context, get_active_context,
        remove_modules_from_active_context, set_active_project, ActiveContext,
    },
    catalog::{load_module, resolve_modules},
};

#[derive(Subcommand)]
pub enum ContextSubcommand {
    /// Show the active modules
    Show,
    /// Add modules to the active context
    Add {
        #[arg(required = true)]
        paths: Vec<String>,
    },
    /// Remove modules from the active context
    Remove {
        #[arg(required = true)]
        paths: Vec<String>,
    },
    /// Remove every module and the project tag
    Clear,
    /// Tag the active context with a project name (omit to clear it)
    Project { name: Option<String> },
}

pub fn run(env: &Env, subcmd: ContextSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        ContextSubcommand::Show => show(env, json),
        ContextSubcommand::Add { paths } => add(env, &paths, json),
        ContextSubcommand::Remove { paths } => remove(env, &paths, json),
        ContextSubcommand::Clear => {
            let ctx = clear_active_context(env.store).context("failed to clear context")?;
            report(&ctx, "Active context cleared.", json)
        }
        ContextSubcommand::Project { name } => {
            let ctx = set_active_project(env.store, name.as_deref())
                .context("failed to set project")?;
            let msg = match &ctx.project {
                Some(p) => format!("Project set to '{p}'."),
                None => "Project cleared.".to_string(),
            };
            report(&ctx, &msg, json)
        }
    }
}

fn show(env: &Env, json: bool) -> anyhow::Result<()> {
    let ctx = get_active_context(env.store).context("failed to load active context")?;
    let modules = resolve_modules(env.modules_root, &ctx.modules);

    let project = ctx.project_or(env.config.project.as_deref());

    if json {
        let value = serde_json::json!({
            "modules": modules,
            "timestamp": ctx.timestamp,
            "project": project,
        });
        return print_json(&value);
    }

    match (&ctx.project, project) {
        (Some(p), _) => println!("Project: {p}"),
        (None, Some(p)) => println!("Project: {p} (config default)"),
        (None, None) => {}
    }
    if modules.is_empty() {
        println!("Active context is empty. Add modules with `dev context add <path>`.");
        return Ok(());
    }
    let rows = modules
        .iter()
        .map(|m| {
            let status = if m.missing { "missing" } else { "ok" };
            vec![m.path.clone(), m.name(), status.to_string()]
        })
        .collect();
    print_table(&["PATH", "TITLE", "STATUS"], rows);
    println!("\nUpdated {}", ctx.timestamp.format("%Y-%m-%d %H:%M:%S UTC"));
    Ok(())
}

fn add(env: &Env, module_paths: &[String], json: bool) -> anyhow::Result<()> {
    for p in module_paths {
        if load_module(env.modules_root, p).is_err() {
            eprintln!("warning: module not found in catalog: {p}");
        }
    }
    let before = get_active_context(env.store)
        .context("failed to load active context")?
        .modules
        .len();
    let ctx = add_modules_to_active_context(env.store, module_paths)
        .context("failed to add modules")?;
    let added = ctx.modules.len() - before;
    report(
        &ctx,
        &format!("Added {added} module(s); {} active.", ctx.modules.len()),
        json,
    )
}

fn remove(env: &Env, module_paths: &[String], json: bool) -> anyhow::Result<()> {
    let before = get_active_context(env.store)
        .context("failed to load active context")?
        .modules
        .len();
    let ctx = remove_modules_from_active_context(env.store, module_paths)
        .context("failed to remove modules")?;
    let removed = before - ctx.modules.len();
    report(
        &ctx,
        &format!("Removed {removed} module(s); {} active.", ctx.modules.len()),
        json,
    )
}

fn report(ctx: &ActiveContext, message: &str, json: bool) -> anyhow::Result<()> {
    if json {
        print_json(ctx)
    } else {
        println!("{message}");
        Ok(())
    }
}
