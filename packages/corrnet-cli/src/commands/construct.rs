use std::path::Path;

use corrnet_rs::{
    construct_exact, construct_exact_parallel, construct_in_memory, construct_sketched,
    read_stream_table, ConstructionReport, IngestOptions, Matrix, MemoryStore, PostgresBackend,
    SketchParams, Variant,
};

use crate::cli::{ConstructArgs, Method};
use crate::exit_codes;
use crate::output;

pub fn execute(args: ConstructArgs) -> i32 {
    let options = IngestOptions {
        before: args.before,
        max_locations: args.locations,
    };
    let table = match read_stream_table(Path::new(&args.file), &options) {
        Ok(table) => table,
        Err(error) => {
            eprintln!("Error: {}", error);
            return exit_codes::for_error(&error);
        }
    };

    let matrix = Matrix::new(table.num_locations());
    let result = match args.method {
        Method::Exact if args.parallel => construct_exact_parallel(&table, &matrix, args.tau, None),
        Method::Exact => construct_exact(&table, &matrix, args.tau),
        Method::Sketch | Method::Dft => {
            let mut params = SketchParams::new(args.tau, args.granularity)
                .with_blocks(args.write_block, args.read_block);
            if args.method == Method::Dft {
                params = params.with_variant(Variant::Dft, args.ratio);
            }
            if let (Some(start), Some(end)) = (args.query_start, args.query_end) {
                params = params.with_query_range(start, end);
            }
            run_sketched(&args, &table, &matrix, &params)
        }
    };

    let report = match result {
        Ok(report) => report,
        Err(error) => {
            eprintln!("Error: {}", error);
            return exit_codes::for_error(&error);
        }
    };

    emit(&report, args.json, args.output.as_deref())
}

fn run_sketched(
    args: &ConstructArgs,
    table: &corrnet_rs::StreamTable,
    matrix: &Matrix,
    params: &SketchParams,
) -> corrnet_rs::Result<ConstructionReport> {
    if args.in_memory {
        return construct_in_memory(table, matrix, params).map(|(report, _)| report);
    }
    match &args.database_url {
        Some(url) => {
            let backend = PostgresBackend::new(url.clone());
            construct_sketched(table, matrix, &backend, params)
        }
        None => {
            log::warn!("no database URL configured, falling back to the in-memory store");
            let backend = MemoryStore::new();
            construct_sketched(table, matrix, &backend, params)
        }
    }
}

pub(crate) fn emit(report: &ConstructionReport, json: bool, output_path: Option<&str>) -> i32 {
    let format = if json {
        output::Format::Json
    } else {
        output::Format::Text
    };
    match output::emit_report(report, format, output_path) {
        Ok(()) => exit_codes::SUCCESS,
        Err(error) => {
            eprintln!("Error: {}", error);
            exit_codes::for_error(&error)
        }
    }
}
