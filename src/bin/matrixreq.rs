//! `matrixreq` - command line access to a Matrix instance.
//!
//! Connection settings come from flags or from `MATRIX_INSTANCE` and
//! `MATRIX_TOKEN`.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand};
use serde::{Deserialize, Serialize};
use tracing::info;
use tracing_subscriber::EnvFilter;

use matrixreq_client::polarion::{
    load_item_tracker, ImportOptions, PictureFolder, PolarionExport, PolarionImporter,
    DEFAULT_IMPORT_REASON,
};
use matrixreq_client::{ClientOptions, ItemDraft, MatrixClient};

#[derive(Parser)]
#[command(name = "matrixreq")]
#[command(about = "Command line client for the Matrix requirements management REST API")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Instance name (`myorg`) or full URL
    #[arg(long, env = "MATRIX_INSTANCE", global = true)]
    instance: Option<String>,

    /// API token
    #[arg(long, env = "MATRIX_TOKEN", hide_env_values = true, global = true)]
    token: Option<String>,

    /// Request timeout in seconds
    #[arg(long, default_value = "20", global = true)]
    timeout: u64,

    /// Retries on timeouts and dropped connections
    #[arg(long, default_value = "0", global = true)]
    retries: u32,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the server version
    Version,

    /// Print an item as JSON
    Item {
        project: String,
        /// Item ref, e.g. REQ-12
        item: String,

        /// Include the version history
        #[arg(long)]
        history: bool,
    },

    /// Replace the test steps of a test case
    SetTestSteps {
        project: String,
        /// Item ref, e.g. XTC-13
        item: String,

        /// Label of the test steps field
        #[arg(short, long, default_value = "Test Case Steps")]
        field: String,

        /// JSON file holding an array of steps
        #[arg(short, long)]
        steps: PathBuf,

        #[arg(short, long, default_value = "test steps import")]
        reason: String,
    },

    /// Download a file produced by a job
    DownloadJob {
        project: String,
        job: i64,
        /// Destination file
        output: PathBuf,

        /// File to fetch (defaults to the last one)
        #[arg(long)]
        file_id: Option<i64>,
    },

    /// Attach a file to a project and print its key
    UploadFile { project: String, file: PathBuf },

    /// Import a Polarion XML export as folders and items, printing
    /// `<work item id>\t<item ref>` per created item
    PolarionImport(PolarionImportArgs),
}

#[derive(Args)]
struct PolarionImportArgs {
    project: String,

    /// Polarion work item export
    #[arg(long)]
    xml: PathBuf,

    /// Category for work item types without a --map entry
    #[arg(long)]
    category: Option<String>,

    /// Work item type to category, e.g. softwareRequirement=SWREQ
    #[arg(long = "map", value_name = "TYPE=CAT", value_parser = parse_mapping)]
    map: Vec<(String, String)>,

    /// Only import work items of this type
    #[arg(long = "type", value_name = "TYPE")]
    type_filter: Option<String>,

    /// Label of the field receiving test steps
    #[arg(long)]
    steps: Option<String>,

    /// Link roles listed as uplinks besides implements, refines, verifies and depends_on
    #[arg(long = "relation", value_delimiter = ',')]
    relations: Vec<String>,

    /// Drop chapter numbers from titles
    #[arg(long, alias = "removeNumbers")]
    remove_numbers: bool,

    /// Replace titles ending in `...` by the first sentence of the description
    #[arg(long, alias = "replaceDots")]
    replace_dots: bool,

    /// Folder holding the exported pictures
    #[arg(long, alias = "picFolder", requires = "pic_url_prefix")]
    pic_folder: Option<PathBuf>,

    /// URL prefix of the pictures in the export
    #[arg(long)]
    pic_url_prefix: Option<String>,

    /// Item tracker export (`id|...` lines); other work items are labelled rejected
    #[arg(long, alias = "itemTracker")]
    item_tracker: Option<PathBuf>,

    #[arg(short, long, default_value = DEFAULT_IMPORT_REASON)]
    reason: String,
}

fn parse_mapping(value: &str) -> std::result::Result<(String, String), String> {
    match value.split_once('=') {
        Some((type_id, category)) if !type_id.is_empty() && !category.is_empty() => {
            Ok((type_id.to_owned(), category.to_owned()))
        }
        _ => Err(format!("expected TYPE=CAT, got {value:?}")),
    }
}

/// One row of a `test_steps` field.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct TestStep {
    action: String,
    expected: String,
    actual_results: String,
    result: String,
    comment: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("matrixreq=debug,matrixreq_client=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            eprintln!();
            eprintln!("{}", Cli::command().render_usage());
            ExitCode::FAILURE
        }
    }
}

fn connect(cli: &Cli) -> Result<MatrixClient> {
    let instance = cli
        .instance
        .as_deref()
        .filter(|i| !i.trim().is_empty())
        .context("no instance given (--instance or MATRIX_INSTANCE)")?;
    let options = ClientOptions::with_timeout_secs(cli.timeout).retries(cli.retries);
    let mut client = MatrixClient::from_instance(instance, options)?;
    if let Some(token) = cli.token.as_deref().filter(|t| !t.trim().is_empty()) {
        client.set_token_authorization(token.trim());
    }
    Ok(client)
}

async fn run(cli: Cli) -> Result<()> {
    let client = connect(&cli)?;

    match cli.command {
        Commands::Version => {
            println!("{}", client.get_server_version().await?);
        }

        Commands::Item {
            project,
            item,
            history,
        } => {
            let json = if history {
                serde_json::to_string_pretty(&client.get_item_with_history(&project, &item).await?)?
            } else {
                serde_json::to_string_pretty(&client.get_item(&project, &item).await?)?
            };
            println!("{json}");
        }

        Commands::SetTestSteps {
            project,
            item,
            field,
            steps,
            reason,
        } => {
            set_test_steps(&client, &project, &item, &field, &steps, &reason).await?;
        }

        Commands::DownloadJob {
            project,
            job,
            output,
            file_id,
        } => {
            let status = match file_id {
                Some(file_id) => client.download_job_file(&project, job, file_id, &output).await?,
                None => {
                    let job_status = client.get_job_status(Some(&project), job).await?;
                    if !job_status.is_done() {
                        bail!("job {job} is at {}%", job_status.progress);
                    }
                    client
                        .download_last_job_file(&project, job, &job_status, &output)
                        .await?
                }
            };
            if status != 200 {
                bail!("download failed with HTTP {status}");
            }
            info!("saved {}", output.display());
        }

        Commands::UploadFile { project, file } => {
            let uploaded = client.upload_file(&project, &file).await?;
            println!("{}?key={}", uploaded.file_id, uploaded.key);
        }

        Commands::PolarionImport(args) => {
            polarion_import(&client, args).await?;
        }
    }

    Ok(())
}

async fn set_test_steps(
    client: &MatrixClient,
    project: &str,
    item: &str,
    field_label: &str,
    steps_file: &Path,
    reason: &str,
) -> Result<()> {
    let category = item
        .split('-')
        .next()
        .filter(|c| !c.is_empty() && *c != item)
        .with_context(|| format!("{item} is not an item ref"))?;

    let raw = tokio::fs::read_to_string(steps_file)
        .await
        .with_context(|| format!("reading {}", steps_file.display()))?;
    let steps: Vec<TestStep> =
        serde_json::from_str(&raw).with_context(|| format!("parsing {}", steps_file.display()))?;

    let category_info = client.get_category(project, category).await?;
    let field = category_info
        .field_by_label(field_label)
        .with_context(|| format!("category {category} has no field {field_label:?}"))?;

    let current = client.get_item(project, item).await?;
    let mut draft = ItemDraft::new(current.title, reason)
        .fields(current.field_val_list)
        .field(field.id, serde_json::to_string(&steps)?);
    draft.labels = current.labels;

    client.update_item(project, item, &draft).await?;
    info!(item, steps = steps.len(), "test steps updated");
    Ok(())
}

async fn polarion_import(client: &MatrixClient, args: PolarionImportArgs) -> Result<()> {
    if args.map.is_empty() && args.category.is_none() {
        bail!("no category given (--category or --map TYPE=CAT)");
    }
    let export = PolarionExport::load(&args.xml)
        .await
        .with_context(|| format!("reading {}", args.xml.display()))?;
    let tracked_items = match &args.item_tracker {
        Some(path) => Some(
            load_item_tracker(path)
                .await
                .with_context(|| format!("reading {}", path.display()))?,
        ),
        None => None,
    };

    let options = ImportOptions {
        categories: args.map.into_iter().collect(),
        default_category: args.category,
        type_filter: args.type_filter,
        steps_field: args.steps,
        extra_uplink_roles: args.relations,
        remove_numbers: args.remove_numbers,
        replace_dots: args.replace_dots,
        tracked_items,
        reason: args.reason,
    };
    let mut importer = PolarionImporter::new(client, args.project, options);
    if let (Some(folder), Some(prefix)) = (args.pic_folder, args.pic_url_prefix) {
        importer = importer.with_pictures(PictureFolder::new(folder, prefix));
    }

    let report = importer.run(&export).await?;
    for (legacy_id, item_ref) in &report.items {
        println!("{legacy_id}\t{item_ref}");
    }
    for (legacy_id, reason) in &report.failed {
        eprintln!("{legacy_id}: {reason}");
    }
    info!(
        folders = report.folders.len(),
        items = report.items.len(),
        skipped = report.skipped.len(),
        "polarion import done"
    );
    if !report.failed.is_empty() {
        bail!("{} work items were not imported", report.failed.len());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::{CommandFactory, Parser};

    use super::{parse_mapping, Cli, Commands, TestStep};

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_set_test_steps() {
        let cli = Cli::try_parse_from([
            "matrixreq",
            "--instance",
            "myorg",
            "--retries",
            "3",
            "set-test-steps",
            "ZB",
            "XTC-13",
            "--steps",
            "steps.json",
        ])
        .unwrap();
        assert_eq!(cli.retries, 3);
        match cli.command {
            Commands::SetTestSteps { item, field, .. } => {
                assert_eq!(item, "XTC-13");
                assert_eq!(field, "Test Case Steps");
            }
            _ => panic!("wrong subcommand"),
        }
    }

    #[test]
    fn test_steps_keep_snake_case_keys() {
        let steps: Vec<TestStep> =
            serde_json::from_str(r#"[{"action":"a","expected":"e","actual_results":"w"}]"#).unwrap();
        let json = serde_json::to_string(&steps).unwrap();
        assert_eq!(
            json,
            r#"[{"action":"a","expected":"e","actual_results":"w","result":"","comment":""}]"#
        );
    }

    #[test]
    fn parses_polarion_import_with_legacy_flag_names() {
        let cli = Cli::try_parse_from([
            "matrixreq",
            "polarion-import",
            "ZB",
            "--xml",
            "export.xml",
            "--map",
            "softwareRequirement=SWREQ",
            "--map",
            "unitTestCase=UTC",
            "--relation",
            "mitigates,tests",
            "--removeNumbers",
            "--picFolder",
            "pic",
            "--pic-url-prefix",
            "https://polarion.example.com/polarion/",
        ])
        .unwrap();
        let Commands::PolarionImport(args) = cli.command else {
            panic!("wrong subcommand");
        };
        assert_eq!(
            args.map,
            vec![
                ("softwareRequirement".to_owned(), "SWREQ".to_owned()),
                ("unitTestCase".to_owned(), "UTC".to_owned()),
            ]
        );
        assert_eq!(args.relations, vec!["mitigates", "tests"]);
        assert!(args.remove_numbers);
        assert!(!args.replace_dots);
        assert_eq!(args.reason, "Polarion import");
    }

    #[test]
    fn picture_folder_needs_url_prefix() {
        let parsed = Cli::try_parse_from([
            "matrixreq",
            "polarion-import",
            "ZB",
            "--xml",
            "export.xml",
            "--pic-folder",
            "pic",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn mapping_needs_both_sides() {
        assert_eq!(
            parse_mapping("designElement=SDD").unwrap(),
            ("designElement".to_owned(), "SDD".to_owned())
        );
        assert!(parse_mapping("designElement").is_err());
        assert!(parse_mapping("=SDD").is_err());
    }
}
