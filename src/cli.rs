use std::path::PathBuf;

use clap::{Parser, Subcommand};

use catalog_client::client::DEFAULT_LANG;
use catalog_client::models::Expand;

#[derive(Parser)]
#[command(name = "catalog")]
#[command(about = "Object catalog API client", long_about = None)]
pub struct Cli {
    #[arg(short, long, help = "Path to the configuration file", default_value = "data/config.toml")]
    pub config: PathBuf,
    #[arg(short, long, help = "Access token, overrides the configured one")]
    pub token: Option<String>,
    #[arg(long, help = "API host, overrides the configured one")]
    pub host: Option<String>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch an object by id
    Get {
        id: String,
        #[arg(
            short,
            long,
            value_delimiter = ',',
            help = "Related entities to embed (properties, suggestedProperties, parents, children, countChildren)"
        )]
        expand: Vec<Expand>,
    },
    /// Search objects by name
    Find {
        name: String,
        #[arg(short, long, help = "Language of the name", default_value = DEFAULT_LANG)]
        lang: String,
        #[arg(short, long, help = "Only return children of this object")]
        parent_id: Option<String>,
        #[arg(long, help = "Match names partially instead of exactly")]
        fuzzy: bool,
        #[arg(
            short,
            long,
            value_delimiter = ',',
            help = "Related entities to embed. Defaults to suggestedProperties,parents"
        )]
        expand: Vec<Expand>,
    },
    /// Create an object from a JSON file
    Create {
        #[arg(short, long, help = "JSON file holding the object")]
        object: PathBuf,
        #[arg(short, long, help = "Image to attach. Can be specified multiple times.")]
        image: Vec<PathBuf>,
        #[arg(long = "main-image", help = "Attached image to mark as the main one")]
        main_image: Option<PathBuf>,
    },
    /// Update an object from a JSON file
    Update {
        id: String,
        #[arg(short, long, help = "JSON file holding the object")]
        object: PathBuf,
        #[arg(short, long, help = "Image to attach. Can be specified multiple times.")]
        image: Vec<PathBuf>,
        #[arg(long = "main-image", help = "Attached image to mark as the main one")]
        main_image: Option<PathBuf>,
    },
    /// Look up a property by name, creating it when it does not exist
    Property {
        name: String,
        #[arg(short, long, help = "Language of the name", default_value = DEFAULT_LANG)]
        lang: String,
        #[arg(long = "create-as", help = "Create the property with this type if no match is found")]
        create_as: Option<String>,
    },
}
