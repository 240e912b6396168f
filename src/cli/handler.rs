//! Command handlers: resolve the resource type, run the operation, print JSON

use anyhow::{Context, Result};
use colored::*;
use serde_json::{Value, json};

use hubspot_crm::{Crm, PagedCollection, Record, ResourceType, SearchQuery};

use super::app::{Cli, Commands};

pub async fn handle_command(cli: Cli, crm: &Crm) -> Result<()> {
    let compact = cli.compact;

    match cli.command {
        Commands::Find {
            resource,
            id,
            properties,
        } => {
            let kind = parse_resource(&resource)?;
            let id = kind.parse_id(&id)?;
            let record = crm
                .resource(kind)
                .find_with(&id, &as_strs(&properties))
                .await
                .with_context(|| format!("Failed to find {} {}", kind, id))?;

            print_heading(&format!("{} {}", kind, id));
            print_json(&record.to_json(), compact)
        }
        Commands::FindBy {
            resource,
            property,
            value,
            properties,
        } => {
            let kind = parse_resource(&resource)?;
            let record = crm
                .resource(kind)
                .find_by(&property, &value, &as_strs(&properties))
                .await
                .with_context(|| format!("Failed to find {} with {} = {}", kind, property, value))?;

            print_heading(&format!("{} {}={}", kind, property, value));
            print_json(&record.to_json(), compact)
        }
        Commands::Search {
            resource,
            query,
            filters,
            properties,
            limit,
        } => {
            let kind = parse_resource(&resource)?;
            let mut collection = search_collection(crm, kind, query, &filters, &properties)?;
            let records = collection
                .first_n(limit)
                .await
                .with_context(|| format!("Search on {} failed", kind))?;

            print_records(kind, &records, collection.known_total(), compact)
        }
        Commands::List {
            resource,
            properties,
            limit,
        } => {
            let kind = parse_resource(&resource)?;
            let mut collection = crm.resource(kind).list(Default::default());
            if !properties.is_empty() {
                collection.select(properties);
            }
            let records = collection
                .first_n(limit)
                .await
                .with_context(|| format!("Listing {} failed", kind))?;

            print_records(kind, &records, None, compact)
        }
        Commands::Total {
            resource,
            query,
            filters,
        } => {
            let kind = parse_resource(&resource)?;
            let mut collection = search_collection(crm, kind, query, &filters, &[])?;
            let total = collection
                .total()
                .await
                .with_context(|| format!("Counting {} failed", kind))?;

            print_heading(&format!("{} total", kind));
            print_json(&json!({ "total": total }), compact)
        }
        Commands::Properties { resource, custom } => {
            let kind = parse_resource(&resource)?;
            let repository = crm.resource(kind);
            let properties = if custom {
                repository.custom_property_list().await
            } else {
                repository.full_property_list().await
            }
            .with_context(|| format!("Failed to load properties for {}", kind))?;

            print_heading(&format!("{} {} properties", properties.len(), kind));
            print_json(&serde_json::to_value(properties)?, compact)
        }
        Commands::Archive { resource, id } => {
            let kind = parse_resource(&resource)?;
            let id = kind.parse_id(&id)?;
            crm.resource(kind)
                .archive(&id)
                .await
                .with_context(|| format!("Failed to archive {} {}", kind, id))?;

            println!("{} {} {}", "Archived".bright_green().bold(), kind, id);
            Ok(())
        }
    }
}

fn parse_resource(name: &str) -> Result<ResourceType> {
    name.parse::<ResourceType>()
        .with_context(|| format!("Expected one of contacts, companies, forms, users; got '{}'", name))
}

fn as_strs(values: &[String]) -> Vec<&str> {
    values.iter().map(String::as_str).collect()
}

/// `query` and `filters` combined; with neither, every record matches
fn search_collection(
    crm: &Crm,
    kind: ResourceType,
    query: Option<String>,
    filters: &[String],
    properties: &[String],
) -> Result<PagedCollection<Record>> {
    let conditions = filters
        .iter()
        .map(|raw| parse_filter(raw))
        .collect::<Result<Vec<_>>>()?;

    let repository = crm.resource(kind);
    let mut collection = match query {
        Some(text) => repository.search(SearchQuery::Text(text), &as_strs(properties), 100),
        None if properties.is_empty() => repository.all(),
        None => repository.select(properties.iter().cloned()),
    };

    if !conditions.is_empty() {
        collection.add_filters(conditions);
    }

    Ok(collection)
}

/// `key=value`; an `_in` key takes a comma-separated list, an empty value
/// matches records without the property
fn parse_filter(raw: &str) -> Result<(String, Value)> {
    let (key, value) = raw
        .split_once('=')
        .with_context(|| format!("Filter '{}' must look like key=value", raw))?;

    let key = key.trim();
    if key.is_empty() {
        anyhow::bail!("Filter '{}' has an empty key", raw);
    }

    let value = if key.ends_with("_in") {
        Value::Array(
            value
                .split(',')
                .map(|v| Value::String(v.trim().to_string()))
                .filter(|v| v.as_str().is_some_and(|s| !s.is_empty()))
                .collect(),
        )
    } else {
        Value::String(value.to_string())
    };

    Ok((key.to_string(), value))
}

fn print_heading(text: &str) {
    println!("{}", text.bright_cyan().bold());
}

fn print_records(kind: ResourceType, records: &[Record], total: Option<u64>, compact: bool) -> Result<()> {
    let heading = match total {
        Some(total) => format!("{} {} (of {})", records.len(), kind, total),
        None => format!("{} {}", records.len(), kind),
    };
    print_heading(&heading);

    let rendered: Vec<Value> = records.iter().map(Record::to_json).collect();
    print_json(&Value::Array(rendered), compact)
}

fn print_json(value: &Value, compact: bool) -> Result<()> {
    let text = if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    println!("{}", text);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_filter() {
        assert_eq!(
            parse_filter("email_contains=acme").unwrap(),
            ("email_contains".to_string(), json!("acme"))
        );
        assert_eq!(
            parse_filter("lifecyclestage_in=lead, customer").unwrap(),
            ("lifecyclestage_in".to_string(), json!(["lead", "customer"]))
        );
        assert_eq!(parse_filter("phone=").unwrap(), ("phone".to_string(), json!("")));
        assert!(parse_filter("broken").is_err());
        assert!(parse_filter("=x").is_err());
    }
}
