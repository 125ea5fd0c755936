pub mod catalog;
pub mod cli;
pub mod error;
pub mod executor;
pub mod fields_cmd;
pub mod import_cmd;
pub mod io_utils;
pub mod map_cmd;
pub mod mapping;
pub mod normalize;
pub mod parser;
pub mod preview;
pub mod progress;
pub mod projection;
pub mod resolver;
pub mod session;
pub mod store;
pub mod table;
pub mod templates;

use std::{env, sync::OnceLock};

use anyhow::Result;
use clap::Parser;
use log::LevelFilter;

use crate::cli::{Cli, Commands};

pub use crate::{
    catalog::{FieldCatalog, TargetField},
    error::ImportError,
    executor::{ImportExecutor, ImportResult, RecordStore},
    mapping::{ColumnMapping, MappingSet},
    parser::{RawTable, parse_line, parse_table},
    resolver::{AliasTable, FieldMatcher, MatchStage},
    session::{ImportSession, SessionState},
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("crm_import", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Fields(args) => fields_cmd::execute(&args),
        Commands::Map(args) => map_cmd::execute(&args),
        Commands::Preview(args) => preview::execute(&args),
        Commands::Import(args) => import_cmd::execute(&args),
    }
}
