use crate::output::{print_json, print_table};
use superstack_core::format::Registry;

pub fn run(json: bool) -> anyhow::Result<()> {
    let registry = Registry::default();
    let infos = registry.list();

    if json {
        return print_json(&infos);
    }

    let rows = infos
        .iter()
        .map(|f| {
            let options = f
                .options
                .iter()
                .map(|o| o.name)
                .collect::<Vec<_>>()
                .join(", ");
            vec![
                f.id.to_string(),
                f.target.to_string(),
                f.description.to_string(),
                options,
            ]
        })
        .collect();
    print_table(&["ID", "TARGET", "DESCRIPTION", "OPTIONS"], rows);
    Ok(())
}
