//! Find command implementation.

use crate::cli::FindArgs;
use crate::config::Settings;
use crate::error::Result;
use crate::model::Entry;
use crate::tools::format_results;
use colored::Colorize;
use serde::Serialize;

use super::{block_on, open_tools, parse_json_object};

#[derive(Serialize)]
struct FindOutput<'a> {
    query: &'a str,
    count: usize,
    results: &'a [Entry],
}

/// Execute the find command.
///
/// # Errors
///
/// Returns `Error::InvalidArgument` for a malformed filter or zero limit,
/// or any embedding/store error.
pub fn execute(args: &FindArgs, settings: &Settings, json: bool) -> Result<()> {
    let filter = args
        .filter
        .as_deref()
        .map(|raw| parse_json_object("filter", raw).map(serde_json::Value::Object))
        .transpose()?;

    block_on(async {
        let tools = open_tools(settings).await?;
        let entries = tools
            .find(&args.query, args.limit, args.collection.as_deref(), filter)
            .await?;

        if json {
            let output = FindOutput {
                query: &args.query,
                count: entries.len(),
                results: &entries,
            };
            println!("{}", serde_json::to_string(&output)?);
        } else if args.reply {
            println!("{}", format_results(&args.query, &entries));
        } else {
            print_entries(&args.query, &entries);
        }
        Ok(())
    })
}

fn print_entries(query: &str, entries: &[Entry]) {
    if entries.is_empty() {
        println!("No results for '{query}'");
        return;
    }

    for (i, entry) in entries.iter().enumerate() {
        let score = entry
            .similarity_score
            .map_or_else(|| "-".to_string(), |s| format!("{s:.3}"));
        let platform = entry.platform.as_deref().unwrap_or_default();
        let date = entry.date.as_deref().map(|d| format!(" {d}")).unwrap_or_default();

        println!(
            "{} {} {}{}",
            format!("{:>2}.", i + 1).dimmed(),
            score.cyan(),
            platform.yellow(),
            date.dimmed()
        );
        println!("    {}", entry.content);
        if let Some(metadata) = &entry.metadata {
            println!("    {}", serde_json::Value::Object(metadata.clone()).to_string().dimmed());
        }
    }
}
