use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about = "Map and bulk-import CSV uploads into CRM modules", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List the modules of a field catalog, or the fields of one module
    Fields(FieldsArgs),
    /// Show the column-to-field mapping proposed for an upload
    Map(MapArgs),
    /// Preview the first rows of an upload as they would be imported
    Preview(PreviewArgs),
    /// Import an upload into a module's record store
    Import(ImportArgs),
}

#[derive(Debug, Args)]
pub struct FieldsArgs {
    /// Field catalog YAML file
    #[arg(short, long)]
    pub catalog: PathBuf,
    /// Module whose fields should be listed
    #[arg(short, long)]
    pub module: Option<String>,
}

#[derive(Debug, Clone, Args)]
pub struct MapArgs {
    /// Input CSV upload ('-' reads stdin)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Field catalog YAML file
    #[arg(short, long)]
    pub catalog: PathBuf,
    /// Target module identifier
    #[arg(short, long)]
    pub module: String,
    /// Replace the built-in alias table with this YAML file (`field_key: [alias, ...]`)
    #[arg(long)]
    pub aliases: Option<PathBuf>,
    /// Extend the alias table with this YAML file
    #[arg(long = "extra-aliases")]
    pub extra_aliases: Option<PathBuf>,
    /// Override a column: `COLUMN=field_key`, or `COLUMN=` to skip it
    #[arg(long = "set", value_parser = parse_override, action = clap::ArgAction::Append)]
    pub overrides: Vec<ColumnOverride>,
    /// Mapping template file (YAML)
    #[arg(long)]
    pub templates: Option<PathBuf>,
    /// Apply the named template from --templates before overrides
    #[arg(long, requires = "templates")]
    pub template: Option<String>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct PreviewArgs {
    #[command(flatten)]
    pub mapping: MapArgs,
    /// Number of rows to display
    #[arg(long, default_value_t = 5)]
    pub rows: usize,
}

#[derive(Debug, Args)]
pub struct ImportArgs {
    #[command(flatten)]
    pub mapping: MapArgs,
    /// Directory holding the module record files
    #[arg(short, long)]
    pub store: PathBuf,
    /// Save the final mapping under this name in --templates
    #[arg(long = "save-template", requires = "templates")]
    pub save_template: Option<String>,
    /// Print the import result as JSON
    #[arg(long)]
    pub json: bool,
    /// Disable the progress bar
    #[arg(long = "no-progress")]
    pub no_progress: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnOverride {
    pub column: String,
    pub field: Option<String>,
}

pub fn parse_override(value: &str) -> Result<ColumnOverride, String> {
    let (column, field) = value
        .rsplit_once('=')
        .ok_or_else(|| format!("Override '{value}' must look like COLUMN=field_key"))?;
    let column = column.trim();
    if column.is_empty() {
        return Err("Override column name cannot be empty".to_string());
    }
    let field = field.trim();
    Ok(ColumnOverride {
        column: column.to_string(),
        field: (!field.is_empty()).then(|| field.to_string()),
    })
}
