use std::path::Path;

use corrnet_rs::{
    construct_in_memory, read_stream_table, update, CorrNetError, IngestOptions, Matrix,
    SketchParams, StreamTable, Variant,
};

use crate::cli::UpdateArgs;
use crate::commands::construct::emit;
use crate::exit_codes;

/// Split the ingested streams into the prior series and the appended window,
/// run the in-memory construction over the prior series, then one
/// incremental step.
pub fn execute(args: UpdateArgs) -> i32 {
    match run(&args) {
        Ok(report) => emit(&report, args.json, args.output.as_deref()),
        Err(error) => {
            eprintln!("Error: {}", error);
            exit_codes::for_error(&error)
        }
    }
}

fn run(args: &UpdateArgs) -> corrnet_rs::Result<corrnet_rs::ConstructionReport> {
    let options = IngestOptions {
        before: args.before,
        max_locations: args.locations,
    };
    let table = read_stream_table(Path::new(&args.file), &options)?;

    let g = args.granularity;
    let windows = table.windows(g);
    if windows < 2 {
        return Err(CorrNetError::InvalidParameter(format!(
            "update needs at least 2 basic windows, the input holds {}",
            windows
        )));
    }
    let split = (windows - 1) * g;

    let mut old_entries = Vec::with_capacity(table.num_locations());
    let mut appended_entries = Vec::with_capacity(table.num_locations());
    for &location in table.locations() {
        old_entries.push((location, table.slice(location, 0, split)?.to_vec()));
        appended_entries.push((location, table.slice(location, split, split + g)?.to_vec()));
    }
    let table_old = StreamTable::from_streams(old_entries)?;
    let table_appended = StreamTable::from_streams(appended_entries)?;

    let mut params = SketchParams::new(args.tau, g);
    if args.dft {
        params = params.with_variant(Variant::Dft, args.ratio);
    }

    let matrix = Matrix::new(table_old.num_locations());
    let (_, mut state) = construct_in_memory(&table_old, &matrix, &params)?;
    matrix.clear();
    update(&table_appended, &mut state, &matrix, &params)
}
