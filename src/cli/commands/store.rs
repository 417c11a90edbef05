//! Store command implementation.

use crate::cli::StoreArgs;
use crate::config::Settings;
use crate::error::Result;
use serde::Serialize;

use super::{block_on, open_tools, parse_json_object};

#[derive(Serialize)]
struct StoreOutput<'a> {
    stored: bool,
    collection: Option<&'a str>,
    message: String,
}

/// Execute the store command.
///
/// # Errors
///
/// Returns `Error::ReadOnly` in read-only mode, `Error::InvalidArgument`
/// for malformed metadata, or any embedding/store error.
pub fn execute(args: &StoreArgs, settings: &Settings, json: bool) -> Result<()> {
    let metadata = args
        .metadata
        .as_deref()
        .map(|raw| parse_json_object("metadata", raw))
        .transpose()?;

    // Fail before loading the model
    if settings.read_only {
        return Err(crate::error::Error::ReadOnly);
    }

    let collection = args.collection.as_deref();

    block_on(async {
        let tools = open_tools(settings).await?;
        let message = tools.store(&args.information, metadata, collection).await?;

        if json {
            let output = StoreOutput {
                stored: true,
                collection: collection.or(settings.collection_name.as_deref()),
                message,
            };
            println!("{}", serde_json::to_string(&output)?);
        } else if !crate::is_quiet() {
            println!("{message}");
        }
        Ok(())
    })
}
