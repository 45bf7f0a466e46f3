use clap::Subcommand;
use serde_json::Value;

use crate::cli::client::ApiClient;
use crate::cli::utils::{output_empty_collection, parse_filter_spec, print_json};
use crate::cli::OutputFormat;
use crate::filter::FilterCriterion;
use crate::services::SearchRequest;

#[derive(Subcommand)]
pub enum BenefitCommands {
    #[command(about = "Search the catalogue")]
    Search {
        #[arg(long, help = "Substring matched against title, content and bonus")]
        text: Option<String>,
        #[arg(
            long = "filter",
            value_parser = parse_filter_spec,
            help = "Criterion: ID=value, ID=from..to, ID=from.. or ID=..to (repeatable)"
        )]
        filters: Vec<FilterCriterion>,
        #[arg(long)]
        limit: Option<i64>,
        #[arg(long)]
        offset: Option<i64>,
    },
}

pub async fn handle(cmd: BenefitCommands, client: &ApiClient, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        BenefitCommands::Search { text, filters, limit, offset } => {
            let request = SearchRequest { search: text, filters, limit, offset };
            let page = client.post("api/v1/benefits/search", &request).await?;
            print_page(&page, &output_format)
        }
    }
}

fn print_page(page: &Value, output_format: &OutputFormat) -> anyhow::Result<()> {
    let items = page["benefits"].as_array().map(Vec::as_slice).unwrap_or_default();
    if items.is_empty() {
        return output_empty_collection(output_format, "benefits", "No matching benefits");
    }

    match output_format {
        OutputFormat::Json => print_json(page),
        OutputFormat::Text => {
            for benefit in items {
                println!("{:>5}  {}", benefit["id"], benefit["title"].as_str().unwrap_or(""));
            }
            println!("{} of {} shown", items.len(), page["total"]);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(subcommand)]
        cmd: BenefitCommands,
    }

    #[test]
    fn repeated_filters_are_collected() {
        let parsed = Harness::try_parse_from([
            "benefits", "search", "--text", "allowance", "--filter", "1=18..25", "--filter", "2=north",
        ])
        .unwrap();
        let BenefitCommands::Search { text, filters, .. } = parsed.cmd;
        assert_eq!(text.as_deref(), Some("allowance"));
        assert_eq!(filters[0], FilterCriterion::range(1, Some("18"), Some("25")));
        assert_eq!(filters[1], FilterCriterion::exact(2, "north"));
    }

    #[test]
    fn malformed_filter_is_a_usage_error() {
        assert!(Harness::try_parse_from(["benefits", "search", "--filter", "abc"]).is_err());
    }
}
