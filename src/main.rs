use clap::{Args, Parser, Subcommand};
use cypher_adapter::config::{self, ConfigError, ConnectionConfig};
use cypher_adapter::query_builder::{
    CountCriteria, DestroyCriteria, FindCriteria, GraphCriteria, NearbyCriteria, PropertyMapping,
    ProximityAnchor, RelationSpec,
};
use cypher_adapter::{Adapter, AdapterError, ConnectionRegistry, HttpTransport};
use dotenvy::dotenv;
use serde_json::Value;
use std::path::PathBuf;
use thiserror::Error;

/// Cypher adapter - run one record operation against a Cypher HTTP server
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// YAML connection file (overrides every other connection option)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Read the connection from NEO4J_* environment variables
    #[arg(long, global = true)]
    env: bool,

    /// Server host
    #[arg(long, global = true, default_value = "localhost")]
    host: String,

    /// Server port
    #[arg(long, global = true, default_value_t = 7474)]
    port: u16,

    /// URL scheme including separator
    #[arg(long, global = true, default_value = "http://")]
    protocol: String,

    /// REST service root path
    #[arg(long, global = true, default_value = "/db/data")]
    base: String,

    /// Record field holding latitude
    #[arg(long, global = true)]
    geom_lat: Option<String>,

    /// Record field holding longitude
    #[arg(long, global = true)]
    geom_lon: Option<String>,

    /// Do not log compiled statements
    #[arg(long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Find records of a collection
    Find {
        #[command(flatten)]
        target: Target,

        /// Raw Cypher condition over `n`
        #[arg(long = "raw-where")]
        raw_where: Option<String>,

        #[arg(long)]
        limit: Option<u64>,

        #[arg(long)]
        skip: Option<u64>,
    },
    /// Count records of a collection
    Count {
        #[command(flatten)]
        target: Target,
    },
    /// Records within a radius (kilometers) of a point
    Nearby {
        #[command(flatten)]
        target: Target,

        #[command(flatten)]
        anchor: Anchor,
    },
    /// Records related to a `me` anchor through shortest paths
    Graph {
        /// Collection (node label)
        collection: String,

        /// JSON filter on the returned records
        #[arg(long, default_value = "{}")]
        them: String,

        /// JSON filter on the anchor
        #[arg(long)]
        me: Option<String>,

        /// Relationship hop, `TYPE` or `TYPE:required`; repeatable
        #[arg(long = "relation")]
        relations: Vec<String>,

        #[arg(long, allow_hyphen_values = true, requires_all = ["lon", "dist"])]
        lat: Option<f64>,

        #[arg(long, allow_hyphen_values = true)]
        lon: Option<f64>,

        #[arg(long)]
        dist: Option<f64>,
    },
    /// Delete records and their relationships
    Destroy {
        #[command(flatten)]
        target: Target,
    },
}

#[derive(Args)]
struct Target {
    /// Collection (node label)
    collection: String,

    /// JSON property filter, e.g. '{"name":"Alice"}'
    #[arg(long = "where", default_value = "{}")]
    filter: String,
}

#[derive(Args)]
struct Anchor {
    #[arg(long, allow_hyphen_values = true)]
    lat: f64,

    #[arg(long, allow_hyphen_values = true)]
    lon: f64,

    /// Radius in kilometers
    #[arg(long)]
    dist: f64,
}

#[derive(Debug, Error)]
enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Adapter(#[from] AdapterError),

    #[error("Invalid input: {0}")]
    Input(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Cli {
    fn connection_config(&self) -> Result<ConnectionConfig, ConfigError> {
        let mut config = if let Some(path) = &self.config {
            ConnectionConfig::from_yaml_file(path)?
        } else if self.env {
            ConnectionConfig::from_env()?
        } else {
            ConnectionConfig::from_cli(config::CliConfig {
                identity: "cli".to_string(),
                protocol: self.protocol.clone(),
                host: self.host.clone(),
                port: self.port,
                base: self.base.clone(),
                debug: true,
                geom_lat: self.geom_lat.clone(),
                geom_lon: self.geom_lon.clone(),
            })?
        };
        if self.quiet {
            config.debug = false;
        }
        Ok(config)
    }
}

fn parse_filter(raw: &str) -> Result<PropertyMapping, CliError> {
    match serde_json::from_str::<Value>(raw)? {
        Value::Object(object) => Ok(PropertyMapping::from_json_object(&object)),
        other => Err(CliError::Input(format!("filter must be a JSON object, got {}", other))),
    }
}

fn parse_relation(raw: &str) -> RelationSpec {
    match raw.split_once(':') {
        Some((rel_type, flag)) if flag.eq_ignore_ascii_case("required") => {
            RelationSpec::required(rel_type)
        }
        _ => RelationSpec::optional(raw),
    }
}

async fn run(cli: Cli) -> Result<Value, CliError> {
    let config = cli.connection_config()?;
    let identity = config.identity.clone();

    let adapter = Adapter::new(HttpTransport::new());
    let registry = ConnectionRegistry::new();
    adapter.register(&registry, config).await?;
    let conn = registry
        .resolve(&identity)
        .await
        .map_err(AdapterError::from)?;

    let output = match cli.command {
        Command::Find {
            target,
            raw_where,
            limit,
            skip,
        } => {
            let criteria = FindCriteria {
                filter: parse_filter(&target.filter)?,
                raw_where,
                limit,
                skip,
            };
            serde_json::to_value(adapter.find(&conn, &target.collection, &criteria).await?)?
        }
        Command::Count { target } => {
            let criteria = CountCriteria {
                filter: parse_filter(&target.filter)?,
            };
            Value::from(adapter.count(&conn, &target.collection, &criteria).await?)
        }
        Command::Nearby { target, anchor } => {
            let criteria = NearbyCriteria {
                anchor: ProximityAnchor {
                    lat: anchor.lat,
                    lon: anchor.lon,
                    dist: anchor.dist,
                },
                filter: parse_filter(&target.filter)?,
            };
            serde_json::to_value(adapter.nearby(&conn, &target.collection, &criteria).await?)?
        }
        Command::Graph {
            collection,
            them,
            me,
            relations,
            lat,
            lon,
            dist,
        } => {
            let nearby = match (lat, lon, dist) {
                (Some(lat), Some(lon), Some(dist)) => Some(ProximityAnchor { lat, lon, dist }),
                _ => None,
            };
            let criteria = GraphCriteria {
                them: parse_filter(&them)?,
                me: me.as_deref().map(parse_filter).transpose()?,
                nearby,
                relations: relations.iter().map(|r| parse_relation(r)).collect(),
            };
            serde_json::to_value(adapter.graph(&conn, &collection, &criteria).await?)?
        }
        Command::Destroy { target } => {
            let criteria = DestroyCriteria {
                filter: parse_filter(&target.filter)?,
            };
            adapter.destroy(&conn, &target.collection, &criteria).await?;
            Value::Null
        }
    };

    registry.teardown(Some(&identity)).await;
    Ok(output)
}

#[tokio::main]
async fn main() {
    dotenv().ok();

    // Initialize logger - defaults to INFO level, can be overridden with RUST_LOG env var
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(Value::Null) => {}
        Ok(output) => match serde_json::to_string_pretty(&output) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                log::error!("Cannot render output: {}", e);
                std::process::exit(1);
            }
        },
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(1);
        }
    }
}
