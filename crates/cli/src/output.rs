//! Console rendering of search results and run summaries.

use colored::Colorize;
use data_loader::{Movie, VectorIndex};

const RULE_WIDTH: usize = 80;

pub const NO_RESULTS: &str =
    "No results found. Make sure the embeddings are generated in the database and the index is created.";

/// Format the labeled result block for one query
pub fn render_results(movies: &[Movie]) -> String {
    let heavy = "=".repeat(RULE_WIDTH);
    let light = "-".repeat(RULE_WIDTH);

    let mut out = String::new();
    out.push_str(&format!("\n{}\n{}\n{}\n", heavy, "SEARCH RESULTS:".bold().blue(), heavy));

    if movies.is_empty() {
        out.push_str(&format!("\n{}\n", NO_RESULTS.yellow()));
        return out;
    }

    for (rank, movie) in movies.iter().enumerate() {
        out.push_str(&format!(
            "\n[{}] {}\n",
            (rank + 1).to_string().green(),
            movie.title.bold()
        ));
        out.push_str(&format!(
            "Plot: {}\n",
            movie.plot.as_deref().unwrap_or("(no plot)")
        ));
        if !movie.genres.is_empty() {
            out.push_str(&format!("Genres: {}\n", movie.genres.join(", ")));
        }
        if let Some(score) = movie.score {
            out.push_str(&format!("Score: {:.4}\n", score));
        }
        out.push_str(&light);
        out.push('\n');
    }
    out
}

/// First few components of a vector, for eyeballing
pub fn preview(embedding: &[f32], count: usize) -> String {
    let shown: Vec<String> = embedding
        .iter()
        .take(count)
        .map(|v| format!("{:.4}", v))
        .collect();
    if embedding.len() > count {
        format!("[{}, ...]", shown.join(", "))
    } else {
        format!("[{}]", shown.join(", "))
    }
}

pub fn describe_index(index: &VectorIndex) -> String {
    let dimensions = index
        .num_dimensions
        .map(|d| d.to_string())
        .unwrap_or_else(|| "unknown".to_string());
    format!(
        "{} on '{}' ({} dimensions, {} similarity, {})",
        index.name,
        index.path,
        dimensions,
        index.similarity.as_deref().unwrap_or("unknown"),
        if index.queryable { "queryable" } else { "not queryable" }
    )
}
