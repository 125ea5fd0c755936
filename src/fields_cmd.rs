use anyhow::{Context, Result, anyhow};
use log::info;

use crate::{catalog::YamlFieldCatalog, cli::FieldsArgs, table};

pub fn execute(args: &FieldsArgs) -> Result<()> {
    let catalog = YamlFieldCatalog::load(&args.catalog)
        .with_context(|| format!("Loading catalog from {:?}", args.catalog))?;

    let Some(module_id) = &args.module else {
        let headers = vec!["module".to_string(), "name".to_string(), "fields".to_string()];
        let rows = catalog
            .modules
            .iter()
            .map(|m| {
                vec![
                    m.id.clone(),
                    m.display_name().to_string(),
                    m.fields.len().to_string(),
                ]
            })
            .collect::<Vec<_>>();
        print!("{}", table::render_table(&headers, &rows));
        info!("Listed {} module(s) from {:?}", rows.len(), args.catalog);
        return Ok(());
    };

    let module = catalog
        .module(module_id)
        .ok_or_else(|| anyhow!("Module '{module_id}' is not defined in {:?}", args.catalog))?;
    print!("{}", table::render_fields(&module.fields));
    info!(
        "Listed {} field(s) for module '{}'",
        module.fields.len(),
        module.display_name()
    );
    Ok(())
}
