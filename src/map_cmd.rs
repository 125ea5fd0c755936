//! The `map` command and the upload preparation shared by `preview` and `import`.

use anyhow::{Context, Result, anyhow};
use log::info;

use crate::{
    catalog::YamlFieldCatalog,
    cli::MapArgs,
    io_utils,
    resolver::{AliasTable, FieldMatcher},
    session::ImportSession,
    table,
    templates::TemplateStore,
};

/// A session sitting in the mapping step, plus what it was built from.
pub struct PreparedUpload {
    pub session: ImportSession,
    pub catalog: YamlFieldCatalog,
    pub templates: Option<TemplateStore>,
}

pub fn build_matcher(args: &MapArgs) -> Result<FieldMatcher> {
    let mut aliases = match &args.aliases {
        Some(path) => {
            AliasTable::load(path).with_context(|| format!("Loading aliases from {path:?}"))?
        }
        None => AliasTable::default(),
    };
    if let Some(path) = &args.extra_aliases {
        let extra =
            AliasTable::load(path).with_context(|| format!("Loading aliases from {path:?}"))?;
        aliases = aliases.extended_with(&extra);
    }
    Ok(FieldMatcher::new(aliases))
}

pub fn prepare(args: &MapArgs) -> Result<PreparedUpload> {
    let catalog = YamlFieldCatalog::load(&args.catalog)
        .with_context(|| format!("Loading catalog from {:?}", args.catalog))?;
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let mut session = ImportSession::new(build_matcher(args)?);
    session.select_module(&catalog, &args.module)?;

    let text = io_utils::read_input_text(&args.input, encoding)?;
    session
        .upload(&text)
        .with_context(|| format!("Parsing upload {:?}", args.input))?;
    if let Some(table) = session.table() {
        info!(
            "Read {} column(s) and {} row(s) from {:?}",
            table.column_count(),
            table.row_count(),
            args.input
        );
    }

    let templates = match &args.templates {
        Some(path) => Some(
            TemplateStore::load(path)
                .with_context(|| format!("Loading templates from {path:?}"))?,
        ),
        None => None,
    };
    if let (Some(name), Some(store)) = (&args.template, &templates) {
        let template = store
            .find(&args.module, name)
            .ok_or_else(|| anyhow!("No template '{name}' for module '{}'", args.module))?;
        let applied = session.apply_template(template)?;
        info!("Applied {applied} entr(ies) from template '{name}'");
    }

    for entry in &args.overrides {
        session
            .set_target(&entry.column, entry.field.as_deref())
            .with_context(|| format!("Applying override for column '{}'", entry.column))?;
    }

    Ok(PreparedUpload {
        session,
        catalog,
        templates,
    })
}

pub fn execute(args: &MapArgs) -> Result<()> {
    let prepared = prepare(args)?;
    let session = &prepared.session;
    print!(
        "{}",
        table::render_mapping(session.mapping(), session.catalog())
    );
    for (target, columns) in session.mapping().duplicate_targets() {
        println!("warning: '{target}' is targeted by {}", columns.join(", "));
    }
    for field in session.mapping().unmapped_required(session.catalog()) {
        println!("warning: required field '{}' is not mapped", field.key);
    }
    Ok(())
}
