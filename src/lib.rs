//! Client SDK for the Tooso search and catalog indexing API.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tooso_sdk::{ClientBuilder, InMemorySessionStore, SearchOptions};
//!
//! let client = ClientBuilder::new()
//!     .with_api_key("my-key")
//!     .with_language("en-US")
//!     .with_session_store(Arc::new(InMemorySessionStore::new()))
//!     .build();
//!
//! let result = client.search("running shoes", &SearchOptions::default().limit(20))?;
//! println!("{} hits", result.total_results());
//! # Ok::<(), tooso_sdk::ClientError>(())
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod indexer;
pub mod request;
pub mod response;
pub mod search;
pub mod session;
pub mod telemetry;
pub mod transport;

pub use client::ApiClient;
pub use config::{ClientBuilder, ClientConfig};
pub use error::{ClientError, Result};
pub use indexer::{IndexPayload, IndexResult, UploadParams};
pub use response::ResponseEnvelope;
pub use search::{SearchOptions, SearchResult};
pub use session::{InMemorySessionStore, SessionStore};
pub use telemetry::{ErrorReport, Logger, ReportSender, TracingLogger, TracingReportSender};
pub use transport::{HttpMethod, HttpTransport, ReqwestTransport};

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{CommandFactory, Parser, Subcommand};

/// Command-line interface.
///
/// Connection settings default to the `TOOSO_*` environment variables; flags
/// override them.
#[derive(Parser, Debug)]
#[command(name = "tooso", version, about = "Search and index catalogs on the Tooso API")]
pub struct Cli {
    /// API key (tracking id)
    #[arg(long, global = true)]
    pub api_key: Option<String>,

    /// API base URL
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// API version; an empty value drops the version path segment
    #[arg(long, global = true)]
    pub api_version: Option<String>,

    /// Catalog language, e.g. en-us
    #[arg(long, global = true)]
    pub language: Option<String>,

    /// Store code, used when no language is set
    #[arg(long, global = true)]
    pub store_code: Option<String>,

    /// Value of the X-Tooso-Agent header
    #[arg(long, global = true)]
    pub agent: Option<String>,

    /// Skip TLS certificate verification (test endpoints only)
    #[arg(long, global = true, default_value_t = false)]
    pub insecure: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a search and print a JSON summary
    Search {
        query: String,

        /// Disable server-side typo correction
        #[arg(long, default_value_t = false)]
        no_typo_correction: bool,

        /// Request debug-enriched results
        #[arg(long, default_value_t = false)]
        enriched: bool,

        #[arg(long, default_value_t = search::DEFAULT_PAGE)]
        page: u32,

        #[arg(long, default_value_t = search::DEFAULT_LIMIT)]
        limit: u32,

        /// Extra query parameter as key=value (repeatable)
        #[arg(long = "param", value_parser = parse_key_val)]
        params: Vec<(String, String)>,
    },
    /// Zip catalog files and upload them for indexing
    Index {
        /// Files to upload; each is stored under its file name
        #[arg(required = true)]
        files: Vec<PathBuf>,

        #[arg(long)]
        access_key_id: Option<String>,

        #[arg(long)]
        secret_key: Option<String>,

        #[arg(long)]
        bucket: Option<String>,

        /// Object key prefix inside the bucket
        #[arg(long)]
        path: Option<String>,
    },
    /// Print a fresh unique id
    Uuid,
    /// Generate shell completions to stdout
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Search {
            ref query,
            no_typo_correction,
            enriched,
            page,
            limit,
            ref params,
        } => {
            let client = client_from_cli(&cli);
            let options = SearchOptions {
                typo_correction: !no_typo_correction,
                extra_params: params.clone(),
                enriched,
                page,
                limit,
            };
            let result = client
                .search(query, &options)
                .with_context(|| format!("searching for {query:?}"))?;
            println!("{}", serde_json::to_string_pretty(&result.summary())?);
            Ok(())
        }
        Commands::Index {
            ref files,
            ref access_key_id,
            ref secret_key,
            ref bucket,
            ref path,
        } => {
            let mut upload = UploadParams::from_env();
            let overrides = [
                (&mut upload.access_key_id, access_key_id),
                (&mut upload.secret_key, secret_key),
                (&mut upload.bucket, bucket),
                (&mut upload.path, path),
            ];
            for (slot, value) in overrides {
                if value.is_some() {
                    slot.clone_from(value);
                }
            }

            let payload = read_payload_files(files)?;
            let client = client_from_cli(&cli);
            let result = client.index(payload, &upload).context("uploading catalog")?;
            println!("s3://{}/{}", result.bucket(), result.object_key());
            Ok(())
        }
        Commands::Uuid => {
            println!("{}", request::new_unique_id());
            Ok(())
        }
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "tooso", &mut std::io::stdout());
            Ok(())
        }
    }
}

fn client_from_cli(cli: &Cli) -> ApiClient {
    let mut builder = ClientBuilder::from_env()
        .with_logger(Arc::new(TracingLogger))
        .with_report_sender(Arc::new(TracingReportSender));
    if let Some(key) = &cli.api_key {
        builder = builder.with_api_key(key.clone());
    }
    if let Some(url) = &cli.base_url {
        builder = builder.with_api_base_url(url.clone());
    }
    if let Some(version) = &cli.api_version {
        builder = builder.with_api_version(Some(version.clone()).filter(|v| !v.is_empty()));
    }
    if let Some(language) = &cli.language {
        builder = builder.with_language(language.clone());
    }
    if let Some(store) = &cli.store_code {
        builder = builder.with_store_code(store.clone());
    }
    if let Some(agent) = &cli.agent {
        builder = builder.with_agent(agent.clone());
    }
    if cli.insecure {
        builder = builder.danger_accept_invalid_certs(true);
    }
    builder.build()
}

fn read_payload_files(files: &[PathBuf]) -> anyhow::Result<IndexPayload> {
    let mut named = BTreeMap::new();
    for file in files {
        let name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .with_context(|| format!("{} has no file name", file.display()))?;
        let content = std::fs::read_to_string(file)
            .with_context(|| format!("reading {}", file.display()))?;
        if named.insert(name.clone(), content).is_some() {
            bail!("two files share the name {name}");
        }
    }
    Ok(IndexPayload::Named(named))
}

fn parse_key_val(s: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got {s:?}"))?;
    if key.is_empty() {
        return Err(format!("empty key in {s:?}"));
    }
    Ok((key.to_string(), value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_val() {
        assert_eq!(
            parse_key_val("sort=price:asc"),
            Ok(("sort".to_string(), "price:asc".to_string()))
        );
        assert_eq!(parse_key_val("empty="), Ok(("empty".to_string(), String::new())));
        assert!(parse_key_val("novalue").is_err());
        assert!(parse_key_val("=x").is_err());
    }

    #[test]
    fn test_cli_parses_search_flags() {
        let cli = Cli::try_parse_from([
            "tooso",
            "--api-key",
            "K",
            "search",
            "red shoes",
            "--limit",
            "10",
            "--param",
            "sort=price",
            "--no-typo-correction",
        ])
        .unwrap();
        assert_eq!(cli.api_key.as_deref(), Some("K"));
        match cli.command {
            Commands::Search {
                query,
                limit,
                params,
                no_typo_correction,
                page,
                ..
            } => {
                assert_eq!(query, "red shoes");
                assert_eq!(limit, 10);
                assert_eq!(page, 0);
                assert!(no_typo_correction);
                assert_eq!(params, vec![("sort".to_string(), "price".to_string())]);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_read_payload_files_rejects_duplicate_names() {
        let a = tempfile::TempDir::new().unwrap();
        let b = tempfile::TempDir::new().unwrap();
        let first = a.path().join("products.csv");
        let second = b.path().join("products.csv");
        std::fs::write(&first, "1").unwrap();
        std::fs::write(&second, "2").unwrap();

        assert!(read_payload_files(&[first.clone()]).is_ok());
        assert!(read_payload_files(&[first, second]).is_err());
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }
}
