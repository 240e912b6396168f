use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "hubspot-crm")]
#[command(about = "A CLI tool for reading and archiving HubSpot CRM records")]
#[command(version)]
pub struct Cli {
    /// Print JSON on one line instead of pretty-printed
    #[arg(long, global = true)]
    pub compact: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch one record by id
    Find {
        /// Resource type (contacts, companies, forms, users)
        resource: String,
        id: String,
        /// Comma-separated properties to return
        #[arg(short, long, value_delimiter = ',')]
        properties: Vec<String>,
    },
    /// Fetch one record by a unique property such as email
    FindBy {
        resource: String,
        property: String,
        value: String,
        #[arg(short, long, value_delimiter = ',')]
        properties: Vec<String>,
    },
    /// Full-text and/or filtered search
    Search {
        resource: String,
        /// Full-text query
        query: Option<String>,
        /// Filter as key=value; the key may carry _contains, _gt, _gte, _lt, _lte, _neq or _in
        #[arg(short = 'f', long = "filter")]
        filters: Vec<String>,
        #[arg(short, long, value_delimiter = ',')]
        properties: Vec<String>,
        /// Maximum number of records to print
        #[arg(short = 'n', long, default_value_t = 10)]
        limit: usize,
    },
    /// List records page by page
    List {
        resource: String,
        #[arg(short, long, value_delimiter = ',')]
        properties: Vec<String>,
        #[arg(short = 'n', long, default_value_t = 10)]
        limit: usize,
    },
    /// Count records matching a search
    Total {
        resource: String,
        query: Option<String>,
        #[arg(short = 'f', long = "filter")]
        filters: Vec<String>,
    },
    /// Show the property schema of a resource type
    Properties {
        resource: String,
        /// Only properties not defined by HubSpot
        #[arg(long)]
        custom: bool,
    },
    /// Archive one record
    Archive { resource: String, id: String },
}
