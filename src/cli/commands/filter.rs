use clap::Subcommand;
use serde_json::{json, Value};

use crate::cli::client::ApiClient;
use crate::cli::utils::{output_empty_collection, output_success, print_json};
use crate::cli::OutputFormat;
use crate::filter::FilterType;

#[derive(Subcommand)]
pub enum FilterCommands {
    #[command(about = "List filter definitions")]
    List {
        #[arg(long, help = "Substring to match against names")]
        search: Option<String>,
    },

    #[command(about = "Create a filter definition (admin token)")]
    Create {
        #[arg(long)]
        name: String,
        #[arg(long = "type", help = "STRING_RANGE, NUMBER_RANGE or DATE_RANGE")]
        filter_type: FilterType,
        #[arg(long)]
        hint: Option<String>,
        #[arg(long = "value", help = "Allowed value (repeatable)")]
        values: Vec<String>,
    },

    #[command(about = "Delete a filter definition and its associations (admin token)")]
    Delete {
        #[arg(help = "Filter id")]
        id: i64,
    },
}

pub async fn handle(cmd: FilterCommands, client: &ApiClient, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        FilterCommands::List { search } => {
            let query: Vec<(&str, String)> = search.into_iter().map(|s| ("search", s)).collect();
            let filters = client.get("api/v1/filters", &query).await?;
            list(&filters, &output_format)
        }
        FilterCommands::Create { name, filter_type, hint, values } => {
            let body = json!({ "name": name, "type": filter_type, "hint": hint, "values": values });
            let created = client.post("api/v1/admin/filters", &body).await?;
            output_success(
                &output_format,
                &format!("Filter {} created", created["id"]),
                Some(json!({ "filter": created })),
            )
        }
        FilterCommands::Delete { id } => {
            client.delete(&format!("api/v1/admin/filters/{}", id)).await?;
            output_success(&output_format, &format!("Filter {} deleted", id), None)
        }
    }
}

fn list(filters: &Value, output_format: &OutputFormat) -> anyhow::Result<()> {
    let entries = filters.as_array().map(Vec::as_slice).unwrap_or_default();
    if entries.is_empty() {
        return output_empty_collection(output_format, "filters", "No filters defined");
    }

    match output_format {
        OutputFormat::Json => print_json(&json!({ "filters": filters })),
        OutputFormat::Text => {
            for filter in entries {
                let values = filter["values"]
                    .as_array()
                    .map(|vs| vs.iter().filter_map(Value::as_str).collect::<Vec<_>>().join(", "))
                    .unwrap_or_default();
                println!(
                    "{:>5}  {:<14} {}{}",
                    filter["id"],
                    filter["type"].as_str().unwrap_or("?"),
                    filter["name"].as_str().unwrap_or(""),
                    if values.is_empty() { String::new() } else { format!(" [{}]", values) }
                );
            }
            Ok(())
        }
    }
}
