use anyhow::{Context, Result};
use log::info;

use crate::{
    cli::ImportArgs,
    executor::{ImportExecutor, NoProgress, ProgressSink},
    map_cmd,
    progress::CosmeticProgress,
    store::CsvRecordStore,
};

pub fn execute(args: &ImportArgs) -> Result<()> {
    let map_args = &args.mapping;
    let mut prepared = map_cmd::prepare(map_args)?;
    let session = &mut prepared.session;
    session.begin_preview()?;

    let template = args
        .save_template
        .as_deref()
        .map(|name| session.mapping().to_template(name, &map_args.module));

    let executor = ImportExecutor::new(CsvRecordStore::new(&args.store, &prepared.catalog));
    let progress: Box<dyn ProgressSink> = if args.no_progress || args.json {
        Box::new(NoProgress)
    } else {
        Box::new(CosmeticProgress::new(format!("Importing into {}", map_args.module)))
    };
    let result = session
        .execute(&executor, args.save_template.as_deref(), progress.as_ref())
        .with_context(|| format!("Importing {:?}", map_args.input))?
        .clone();

    if let (Some(template), Some(store), Some(path)) = (
        template,
        prepared.templates.as_mut(),
        &map_args.templates,
    ) {
        let name = template.name.clone();
        store.upsert(template);
        store
            .save(path)
            .with_context(|| format!("Saving template '{name}' to {path:?}"))?;
        info!("Saved mapping template '{name}' to {path:?}");
    }

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&result).context("Serializing import result")?
        );
    } else {
        println!(
            "Imported {} of {} record(s) into '{}' ({} error(s))",
            result.success, result.total, map_args.module, result.errors
        );
        for failure in &result.failures {
            println!("  row {}: {}", failure.row, failure.message);
        }
    }
    Ok(())
}
