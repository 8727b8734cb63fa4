use crate::cmd::Env;
use crate::output::{print_fields, print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use superstack_core::catalog::{list_modules, load_module};

#[derive(Subcommand)]
pub enum ModulesSubcommand {
    /// List every module in the catalog
    List {
        /// Only modules from this domain (first path segment)
        #[arg(long)]
        domain: Option<String>,
    },
    /// Print one module's metadata and content
    Show { path: String },
}

pub fn run(env: &Env, subcmd: ModulesSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        ModulesSubcommand::List { domain } => list(env, domain.as_deref(), json),
        ModulesSubcommand::Show { path } => show(env, &path, json),
    }
}

fn list(env: &Env, domain: Option<&str>, json: bool) -> anyhow::Result<()> {
    let mut modules = list_modules(env.modules_root).context("failed to scan modules")?;
    if let Some(d) = domain {
        modules.retain(|m| m.domain == d);
    }

    if json {
        return print_json(&modules);
    }
    if modules.is_empty() {
        println!("No modules found in {}.", env.modules_root.display());
        return Ok(());
    }

    let rows = modules
        .iter()
        .map(|m| {
            vec![
                m.path.clone(),
                m.name(),
                m.domain.clone(),
                m.module_type.clone(),
                if m.active { "yes" } else { "no" }.to_string(),
            ]
        })
        .collect();
    print_table(&["PATH", "TITLE", "DOMAIN", "TYPE", "ACTIVE"], rows);
    Ok(())
}

fn show(env: &Env, path: &str, json: bool) -> anyhow::Result<()> {
    let module = load_module(env.modules_root, path)?;

    if json {
        let value = serde_json::json!({
            "module": module,
            "content": module.content,
        });
        return print_json(&value);
    }

    let mut fields = vec![
        ("Path", module.path.clone()),
        ("Title", module.name()),
        ("Domain", module.domain.clone()),
        ("Type", module.module_type.clone()),
    ];
    if !module.description.is_empty() {
        fields.push(("Description", module.description.clone()));
    }
    if !module.tags.is_empty() {
        fields.push(("Tags", module.tags.join(", ")));
    }
    if !module.active {
        fields.push(("Active", "no".to_string()));
    }
    print_fields(&fields);
    println!();
    println!("{}", module.content);
    Ok(())
}
