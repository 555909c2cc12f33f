use anyhow::{Context, Result};
use log::info;

use crate::{cli::PreviewArgs, snapshot::Snapshot, table};

pub fn execute(args: &PreviewArgs) -> Result<()> {
    let snapshot = Snapshot::load(&args.snapshot)
        .with_context(|| format!("Loading snapshot {:?}", args.snapshot))?;
    let data = snapshot.table();
    for name in &args.columns {
        if !data.has_column(name) {
            info!("Column '{name}' is not part of the snapshot");
        }
    }
    println!(
        "{} ({} rows x {} columns)",
        snapshot.label(),
        data.row_count(),
        data.column_count()
    );
    print!("{}", table::render_head(data, &args.columns, args.rows));
    info!(
        "Displayed {} row(s) from {:?}",
        data.row_count().min(args.rows),
        args.snapshot
    );
    Ok(())
}
