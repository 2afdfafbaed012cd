//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr, eyre};
use contentgraph_core::{
    Collection, ContentStore, EnrichmentRegistry, JsonFileLoader, NavigationIndex, SortDirection,
};
use contentgraph_shared::{AppConfig, FieldValue, QueryOptions, RawSection, init_config, load_config};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// contentgraph — compile, query and navigate site content.
#[derive(Parser)]
#[command(
    name = "contentgraph",
    version,
    about = "Compile markdown content, query collections, and build documentation navigation.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Compile a markdown file and print the markup.
    Compile {
        /// Markdown file to compile.
        file: PathBuf,

        /// Print the node tree as JSON instead of markup.
        #[arg(long)]
        tree: bool,
    },

    /// Query a collection and print the results as JSON.
    Query {
        /// Raw items file (defaults to `content.items_file`).
        #[arg(long)]
        items: Option<PathBuf>,

        /// Collection to query.
        #[arg(short, long)]
        collection: String,

        /// Keep items where FIELD equals VALUE (repeatable).
        #[arg(long = "where", value_name = "FIELD=VALUE")]
        filters: Vec<String>,

        /// Field to sort by (descending unless --asc).
        #[arg(long)]
        sort: Option<String>,

        /// Sort ascending.
        #[arg(long, requires = "sort")]
        asc: bool,

        /// Maximum number of results.
        #[arg(long)]
        limit: Option<usize>,

        /// Comma-separated fields to keep in the output.
        #[arg(long, value_delimiter = ',')]
        fields: Vec<String>,

        /// Comma-separated enrichment steps to run (e.g. readTime,wordCount).
        #[arg(long, value_delimiter = ',')]
        enrich: Vec<String>,

        /// Output shape.
        #[arg(long, value_enum, default_value = "all")]
        output: QueryOutput,
    },

    /// Print the ordered documentation tree.
    Nav {
        /// Raw items file (defaults to `content.items_file`).
        #[arg(long)]
        items: Option<PathBuf>,

        /// Collection to build navigation from (defaults to `content.docs_collection`).
        #[arg(short, long)]
        collection: Option<String>,

        /// Resolve a `/documentation/...` path and show its neighbours.
        #[arg(long)]
        url: Option<String>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Terminal operation for `query`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub(crate) enum QueryOutput {
    All,
    First,
    Count,
    Group,
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "contentgraph=info",
        1 => "contentgraph=debug",
        _ => "contentgraph=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    // Logs go to stderr so JSON results on stdout stay clean.
    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Compile { file, tree } => cmd_compile(&file, tree),
        Command::Query {
            items,
            collection,
            filters,
            sort,
            asc,
            limit,
            fields,
            enrich,
            output,
        } => {
            let flags = QueryFlags {
                filters,
                sort,
                asc,
                limit,
                fields,
                enrich,
            };
            cmd_query(items.as_deref(), &collection, flags, output).await
        }
        Command::Nav {
            items,
            collection,
            url,
        } => cmd_nav(items.as_deref(), collection.as_deref(), url.as_deref()),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(),
        },
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

fn cmd_compile(file: &Path, tree: bool) -> Result<()> {
    let source = std::fs::read_to_string(file)
        .wrap_err_with(|| format!("cannot read '{}'", file.display()))?;

    let blocks = contentgraph_markdown::compile(&source);
    info!(file = %file.display(), blocks = blocks.len(), "compiled markdown");

    if tree {
        println!("{}", serde_json::to_string_pretty(&blocks)?);
    } else {
        println!("{}", contentgraph_markdown::render(&blocks));
    }
    Ok(())
}

/// Query flags collected from the command line.
struct QueryFlags {
    filters: Vec<String>,
    sort: Option<String>,
    asc: bool,
    limit: Option<usize>,
    fields: Vec<String>,
    enrich: Vec<String>,
}

impl QueryFlags {
    fn apply(self, mut query: Collection) -> Result<Collection> {
        for filter in &self.filters {
            let (field, value) = parse_where(filter)?;
            query = query.where_eq(field, value);
        }
        if let Some(field) = self.sort {
            let direction = if self.asc {
                SortDirection::Asc
            } else {
                SortDirection::Desc
            };
            query = query.sort_by(field, direction);
        }
        if let Some(limit) = self.limit {
            query = query.limit(limit);
        }
        for step in self.enrich {
            query = query.enrich(step);
        }
        if !self.fields.is_empty() {
            query = query.fields(self.fields);
        }
        Ok(query)
    }
}

async fn cmd_query(
    items: Option<&Path>,
    collection: &str,
    flags: QueryFlags,
    output: QueryOutput,
) -> Result<()> {
    let config = load_config()?;
    let store = open_store(&config, items)?;

    info!(collection, items = store.len(), ?output, "running query");
    let query = flags.apply(store.collection(collection))?;

    let json = match output {
        QueryOutput::All => serde_json::to_string_pretty(&query.all().await)?,
        QueryOutput::First => serde_json::to_string_pretty(&query.first().await)?,
        QueryOutput::Count => query.count().await.to_string(),
        QueryOutput::Group => serde_json::to_string_pretty(&query.group_by_section())?,
    };
    println!("{json}");
    Ok(())
}

fn cmd_nav(items: Option<&Path>, collection: Option<&str>, url: Option<&str>) -> Result<()> {
    let config = load_config()?;
    let store = open_store(&config, items)?;
    let collection = collection.unwrap_or(&config.content.docs_collection);

    let sections: Vec<RawSection> = store
        .collection(collection)
        .group_by_section()
        .into_iter()
        .map(RawSection::from)
        .collect();
    let mut index = NavigationIndex::new(sections);

    for section in index.sections() {
        println!("{}  {}", section.title, section.url());
        for doc in &section.documents {
            let marker = if doc.is_intro { "*" } else { "-" };
            println!("  {marker} {}  {}", doc.title(), doc.url());
        }
    }

    let Some(path) = url else {
        return Ok(());
    };

    let document = index
        .resolve_url(path)
        .cloned()
        .ok_or_else(|| eyre!("no document at '{path}'"))?;
    index.select_document(&document);

    println!();
    println!("  Current:  {}  {}", document.title(), document.url());
    if let Some(prev) = index.previous_document(&document) {
        println!("  Previous: {}  {}", prev.title(), prev.url());
    }
    if let Some(next) = index.next_document(&document) {
        println!("  Next:     {}  {}", next.title(), next.url());
    }
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn open_store(config: &AppConfig, items: Option<&Path>) -> Result<ContentStore> {
    let path = items
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(&config.content.items_file));

    let options = QueryOptions::from(config);
    let registry = EnrichmentRegistry::with_builtins(&options);
    let loader = JsonFileLoader::new(&path);

    let store = ContentStore::load(&loader, registry)?.with_options(options);
    Ok(store)
}

/// Split `FIELD=VALUE`, reading VALUE as a bool or number when it looks like one.
fn parse_where(filter: &str) -> Result<(String, FieldValue)> {
    let (field, raw) = filter
        .split_once('=')
        .ok_or_else(|| eyre!("invalid filter '{filter}': expected FIELD=VALUE"))?;

    let value = match raw {
        "true" => FieldValue::Bool(true),
        "false" => FieldValue::Bool(false),
        _ => match raw.parse::<f64>() {
            Ok(n) => FieldValue::Number(n),
            Err(_) => FieldValue::from(raw),
        },
    };
    Ok((field.trim().to_string(), value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_where_infers_kinds() {
        assert_eq!(
            parse_where("draft=false").unwrap(),
            ("draft".to_string(), FieldValue::Bool(false))
        );
        assert_eq!(
            parse_where("order=2").unwrap(),
            ("order".to_string(), FieldValue::Number(2.0))
        );
        assert_eq!(
            parse_where("slug=guide/setup").unwrap(),
            ("slug".to_string(), FieldValue::from("guide/setup"))
        );
        assert!(parse_where("nonsense").is_err());
    }

    #[test]
    fn query_flags_parse() {
        let cli = Cli::try_parse_from([
            "contentgraph",
            "query",
            "-c",
            "blog",
            "--sort",
            "published",
            "--asc",
            "--fields",
            "title,readTime",
            "--enrich",
            "readTime",
            "--output",
            "count",
        ])
        .expect("parse");

        let Command::Query {
            collection,
            asc,
            fields,
            enrich,
            output,
            ..
        } = cli.command
        else {
            panic!("expected query command");
        };
        assert_eq!(collection, "blog");
        assert!(asc);
        assert_eq!(fields, vec!["title", "readTime"]);
        assert_eq!(enrich, vec!["readTime"]);
        assert_eq!(output, QueryOutput::Count);
    }

    #[test]
    fn asc_requires_sort() {
        assert!(Cli::try_parse_from(["contentgraph", "query", "-c", "blog", "--asc"]).is_err());
    }
}
