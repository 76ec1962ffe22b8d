use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use serde_json::Value;

use catalog_client::client::{CatalogClient, FindObjects};
use catalog_client::config::loader::load_configuration;
use catalog_client::log::init_logging;
use catalog_client::models::CatalogObject;

mod cli;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging()?;
    let cli = Cli::parse();

    let mut config = load_configuration(&cli.config)?;
    config.apply_token(cli.token.as_deref());
    config.apply_host(cli.host.as_deref());
    if config.token.is_empty() {
        warn!("No access token configured; requests will be anonymous");
    }

    let client = CatalogClient::new(&config).context("Could not create catalog client")?;

    let result = match cli.command {
        Commands::Get { id, expand } => client.get_object(id, &expand).await?,
        Commands::Find {
            name,
            lang,
            parent_id,
            fuzzy,
            expand,
        } => {
            let mut find = FindObjects::new(name).with_lang(lang);
            if let Some(parent_id) = parent_id {
                find = find.with_parent(parent_id);
            }
            if fuzzy {
                find = find.fuzzy();
            }
            if !expand.is_empty() {
                find = find.with_expand(expand);
            }
            client.find_objects(&find).await?
        },
        Commands::Create { object, image, main_image } => {
            let object = read_object(&object)?;
            let created = client.create_object(&object, &image, main_image.as_deref()).await?;
            info!(name = object.name.as_str(); "Object created");
            created
        },
        Commands::Update {
            id,
            object,
            image,
            main_image,
        } => {
            let object = read_object(&object)?;
            client
                .update_object(id, &object, &image, main_image.as_deref())
                .await?
        },
        Commands::Property { name, lang, create_as } => {
            let found = client.find_property(&name, &lang).await?;
            match create_as {
                Some(kind) if is_empty_result(&found) => client.create_property(&name, &lang, &kind).await?,
                _ => found,
            }
        },
    };

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn read_object(path: &Path) -> Result<CatalogObject> {
    let content = std::fs::read_to_string(path).with_context(|| format!("Could not read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid object JSON in {}", path.display()))
}

fn is_empty_result(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Array(items) => items.is_empty(),
        Value::Object(entries) => entries.is_empty(),
        _ => false,
    }
}
