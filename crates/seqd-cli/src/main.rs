use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use seqd_core::document::SequenceDocument;
use seqd_core::graph_view::GraphDocument;
use seqd_core::reconcile::HeightPolicy;
use seqd_core::source::{GRAPH_DEFAULT_PATH, SEQUENCE_DEFAULT_PATH, data_path_from_query};
use seqd_editor::config::EditorConfig;
use seqd_editor::editor::Editor;
use std::fs;
use std::io::{self, Read};

#[derive(Parser)]
#[command(name = "seqd")]
#[command(about = "Merge sequence-diagram documents and export their geometry")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fold setUp/testBody/tearDown into the main arrays and print the result
    Merge {
        /// Document path. Use '-' to read from stdin.
        #[arg(default_value = SEQUENCE_DEFAULT_PATH)]
        input: String,
    },
    /// Print the drawable scene (lifelines, activations, routed messages)
    Scene {
        #[arg(default_value = SEQUENCE_DEFAULT_PATH)]
        input: String,

        /// Relabel the parameter group before laying out.
        #[arg(long)]
        variant: Option<String>,

        #[arg(long, value_enum, default_value_t = PolicyArg::PerLifeline)]
        policy: PolicyArg,
    },
    /// List the variant labels a document offers
    Variants {
        #[arg(default_value = SEQUENCE_DEFAULT_PATH)]
        input: String,
    },
    /// Print graph-view nodes with their fills and navigation targets
    Graph {
        #[arg(default_value = GRAPH_DEFAULT_PATH)]
        input: String,
    },
    /// Resolve the document path a page query string points at
    Path {
        /// Query string, e.g. `?data=seq/login.json`.
        #[arg(default_value = "")]
        query: String,

        /// Resolve for the graph view instead of the sequence view.
        #[arg(long)]
        graph: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum PolicyArg {
    PerLifeline,
    Uniform,
}

impl From<PolicyArg> for HeightPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::PerLifeline => HeightPolicy::PerLifeline,
            PolicyArg::Uniform => HeightPolicy::Uniform,
        }
    }
}

fn read_input(input: &str) -> Result<String> {
    if input == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read document from stdin")?;
        return Ok(buf);
    }
    fs::read_to_string(input).with_context(|| format!("failed to read '{input}'"))
}

fn merge(input: &str) -> Result<String> {
    let source = read_input(input)?;
    let doc = SequenceDocument::load(&source).with_context(|| format!("'{input}' is not a sequence document"))?;
    Ok(serde_json::to_string_pretty(&doc)?)
}

fn scene(input: &str, variant: Option<&str>, policy: HeightPolicy) -> Result<String> {
    let source = read_input(input)?;
    let config = EditorConfig {
        height_policy: policy,
        read_only: true,
        ..EditorConfig::default()
    };
    let mut editor =
        Editor::from_json(&source, config).with_context(|| format!("'{input}' is not a sequence document"))?;
    if let Some(label) = variant {
        if !editor.variant_labels().iter().any(|l| l == label) {
            log::warn!("'{label}' is not one of the document's variants");
        }
        let count = editor
            .select_variant(label)
            .with_context(|| format!("failed to apply variant '{label}'"))?;
        log::info!("relabelled {count} parts as '{label}'");
    }
    Ok(serde_json::to_string_pretty(&editor.scene())?)
}

fn variants(input: &str) -> Result<String> {
    let source = read_input(input)?;
    let editor = Editor::from_json(&source, EditorConfig::default())
        .with_context(|| format!("'{input}' is not a sequence document"))?;
    Ok(editor.variant_labels().join("\n"))
}

fn graph(input: &str) -> Result<String> {
    let source = read_input(input)?;
    let doc = GraphDocument::from_json(&source).with_context(|| format!("'{input}' is not a graph document"))?;
    for link in doc.dangling_links() {
        log::warn!("link {} -> {} does not resolve", link.from, link.to);
    }
    let mut lines = Vec::with_capacity(doc.node_data_array.len());
    for node in &doc.node_data_array {
        let target = node.navigation_target().unwrap_or("-");
        lines.push(format!("{}\t{}\t{}", node.text, node.fill(), target));
    }
    if lines.is_empty() {
        bail!("'{input}' has no nodes");
    }
    Ok(lines.join("\n"))
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Merge { input } => merge(&input),
        Commands::Scene {
            input,
            variant,
            policy,
        } => scene(&input, variant.as_deref(), policy.into()),
        Commands::Variants { input } => variants(&input),
        Commands::Graph { input } => graph(&input),
        Commands::Path { query, graph } => {
            let default = if graph {
                GRAPH_DEFAULT_PATH
            } else {
                SEQUENCE_DEFAULT_PATH
            };
            Ok(data_path_from_query(&query, default))
        }
    };

    match result {
        Ok(output) => println!("{output}"),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}
