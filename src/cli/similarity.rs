use anyhow::Result;
use clap::Args;
use serde::Serialize;
use text_locator::calculate_similarity;

use super::output::{emit, OutputFormat};

#[derive(Args, Debug)]
pub struct SimilarityArgs {
    pub left: String,
    pub right: String,
}

#[derive(Debug, Serialize)]
struct SimilarityOutput<'a> {
    left: &'a str,
    right: &'a str,
    score: f64,
}

pub fn cmd_similarity(args: SimilarityArgs, output: OutputFormat) -> Result<()> {
    let payload = SimilarityOutput {
        left: &args.left,
        right: &args.right,
        score: calculate_similarity(&args.left, &args.right),
    };
    emit(&payload, output, |payload| println!("{:.4}", payload.score))
}
