use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use text_locator::{build_path, DocumentTree, FlatText, NodeId};

use super::io::read_tree;
use super::output::{emit, OutputFormat};

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Document snapshot (JSON node description)
    #[arg(long, value_name = "FILE")]
    pub tree: PathBuf,
}

#[derive(Debug, Serialize)]
struct TextNodeRow {
    node: NodeId,
    path: String,
    /// Char offset of the node inside the document's flattened text
    offset: usize,
    text: String,
}

#[derive(Debug, Serialize)]
struct InspectOutput {
    nodes: usize,
    flattened: String,
    text_nodes: Vec<TextNodeRow>,
}

pub async fn cmd_inspect(args: InspectArgs, output: OutputFormat) -> Result<()> {
    let tree = read_tree(&args.tree).await?;
    let flat = FlatText::build(&tree, tree.root());

    let mut text_nodes = Vec::with_capacity(flat.segments().len());
    for segment in flat.segments() {
        text_nodes.push(TextNodeRow {
            node: segment.node,
            path: build_path(&tree, segment.node)?,
            offset: segment.start,
            text: tree.text(segment.node).unwrap_or_default().to_string(),
        });
    }

    let payload = InspectOutput {
        nodes: tree.len(),
        flattened: flat.text().to_string(),
        text_nodes,
    };
    emit(&payload, output, |payload| {
        for row in &payload.text_nodes {
            println!("{:>6}  {}  {:?}", row.offset, row.path, row.text);
        }
        println!("{} nodes, {} text nodes", payload.nodes, payload.text_nodes.len());
    })
}
