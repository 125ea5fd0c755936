use anyhow::Result;
use log::info;

use crate::{cli::PreviewArgs, map_cmd, table};

pub fn execute(args: &PreviewArgs) -> Result<()> {
    let mut prepared = map_cmd::prepare(&args.mapping)?;
    let session = &mut prepared.session;
    session.begin_preview()?;
    let rows = session.preview(args.rows)?;

    print!(
        "{}",
        table::render_mapping(session.mapping(), session.catalog())
    );
    println!();
    print!("{}", table::render_preview(&rows));
    info!("Displayed {} preview row(s) from {:?}", rows.len(), args.mapping.input);
    Ok(())
}
