use crate::cmd::Env;
use crate::output::{print_fields, print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use superstack_core::{
    active::get_active_context,
    group::{
        add_group_to_active_context, create_context_group, delete_context_group,
        get_context_group, get_context_groups,
    },
    SuperstackError,
};

#[derive(Subcommand)]
pub enum GroupSubcommand {
    /// List all groups
    List,
    /// Show a group's modules
    Show { name: String },
    /// Create a group from module paths
    Create {
        name: String,
        #[arg(required = true)]
        paths: Vec<String>,
        #[arg(long)]
        description: Option<String>,
        /// Replace an existing group of the same name
        #[arg(long)]
        force: bool,
    },
    /// Delete a group
    Delete { name: String },
    /// Add a group's modules to the active context
    Use { name: String },
}

pub fn run(env: &Env, subcmd: GroupSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        GroupSubcommand::List => list(env, json),
        GroupSubcommand::Show { name } => show(env, &name, json),
        GroupSubcommand::Create {
            name,
            paths,
            description,
            force,
        } => create(env, &name, &paths, description.as_deref(), force, json),
        GroupSubcommand::Delete { name } => delete(env, &name, json),
        GroupSubcommand::Use { name } => use_group(env, &name, json),
    }
}

// ---------------------------------------------------------------------------
// list / show
// ---------------------------------------------------------------------------

fn list(env: &Env, json: bool) -> anyhow::Result<()> {
    let groups = get_context_groups(env.store).context("failed to load groups")?;

    if json {
        return print_json(&groups);
    }
    if groups.is_empty() {
        println!("No groups. Create one with `dev group create <name> <paths..>`.");
        return Ok(());
    }
    let rows = groups
        .iter()
        .map(|(name, g)| {
            vec![
                name.clone(),
                g.modules.len().to_string(),
                g.description.clone().unwrap_or_default(),
                g.updated.format("%Y-%m-%d").to_string(),
            ]
        })
        .collect();
    print_table(&["NAME", "MODULES", "DESCRIPTION", "UPDATED"], rows);
    Ok(())
}

fn show(env: &Env, name: &str, json: bool) -> anyhow::Result<()> {
    let group = get_context_group(env.store, name)
        .context("failed to load groups")?
        .ok_or_else(|| SuperstackError::GroupNotFound(name.to_string()))?;

    if json {
        let value = serde_json::json!({ "name": name, "group": group });
        return print_json(&value);
    }

    let mut fields = vec![("Name", name.to_string())];
    if let Some(d) = &group.description {
        fields.push(("Description", d.clone()));
    }
    fields.push(("Created", group.created.to_rfc3339()));
    fields.push(("Updated", group.updated.to_rfc3339()));
    print_fields(&fields);
    println!();
    for (i, m) in group.modules.iter().enumerate() {
        println!("{:>3}. {m}", i + 1);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// create / delete / use
// ---------------------------------------------------------------------------

fn create(
    env: &Env,
    name: &str,
    module_paths: &[String],
    description: Option<&str>,
    force: bool,
    json: bool,
) -> anyhow::Result<()> {
    let existing = get_context_group(env.store, name).context("failed to load groups")?;
    if existing.is_some() && !force {
        return Err(SuperstackError::GroupExists(name.to_string()).into());
    }

    let group = create_context_group(env.store, name, module_paths, description)?;

    if json {
        let value = serde_json::json!({ "name": name, "group": group });
        print_json(&value)
    } else {
        let verb = if existing.is_some() { "Replaced" } else { "Created" };
        println!("{verb} group '{name}' with {} module(s).", group.modules.len());
        Ok(())
    }
}

fn delete(env: &Env, name: &str, json: bool) -> anyhow::Result<()> {
    if !delete_context_group(env.store, name).context("failed to delete group")? {
        return Err(SuperstackError::GroupNotFound(name.to_string()).into());
    }
    if json {
        print_json(&serde_json::json!({ "deleted": name }))
    } else {
        println!("Deleted group '{name}'.");
        Ok(())
    }
}

fn use_group(env: &Env, name: &str, json: bool) -> anyhow::Result<()> {
    if !add_group_to_active_context(env.store, name).context("failed to apply group")? {
        return Err(SuperstackError::GroupNotFound(name.to_string()).into());
    }
    let ctx = get_active_context(env.store).context("failed to load active context")?;
    if json {
        print_json(&ctx)
    } else {
        println!(
            "Added group '{name}' to the active context; {} active.",
            ctx.modules.len()
        );
        Ok(())
    }
}
