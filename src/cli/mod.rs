pub mod catalog;

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::info;

use modelmapper::schema;
use modelmapper::{
    MemoryProvider, ModelFactory, MySqlQueryGenerator, MySqlSchemaGenerator, QueryGenerator,
    Value,
};

#[derive(Parser, Debug)]
#[command(name = "modelmapper")]
#[command(about = "Inspect and exercise convention-driven model declarations")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the descriptor of a sample model as JSON
    Describe {
        /// Model type, e.g. `Student` or `sample::Student`
        type_name: String,
    },
    /// Print MySQL DDL for the sample catalog
    Schema {
        /// Also print the SELECT used to load each table
        #[arg(long)]
        queries: bool,
    },
    /// Create, save and export sample records
    Demo,
}

pub fn run(cli: Cli) -> anyhow::Result<()> {
    let registry = catalog::sample_registry().context("loading the sample catalog")?;

    match cli.command {
        Commands::Describe { type_name } => {
            let type_name = catalog::qualify(&type_name);
            let descriptor = registry.describe(&type_name)?;
            println!("{}", serde_json::to_string_pretty(descriptor.as_ref())?);
        }
        Commands::Schema { queries } => {
            let ddl = schema::migrate(&registry, &MySqlSchemaGenerator, &catalog::ALL)?;
            println!("{}", ddl);
            if queries {
                for type_name in catalog::ALL {
                    let table = registry.table_name(type_name)?;
                    let id = registry.identity(type_name)?.field;
                    println!(
                        "{};",
                        MySqlQueryGenerator.generate_select(
                            &[table.as_str()],
                            &[table.as_str()],
                            &format!("{} = ?", id),
                            None,
                            false,
                            None
                        )
                    );
                }
            }
        }
        Commands::Demo => demo(registry)?,
    }
    Ok(())
}

fn demo(registry: Arc<modelmapper::Registry>) -> anyhow::Result<()> {
    let provider = Arc::new(MemoryProvider::new());
    let factory = ModelFactory::new(registry, provider.clone());

    let mut account = factory.create(catalog::ACCOUNT)?;
    account.call_setter("setEmail", "a@b.com")?;
    account.call_setter("setPassword", "x")?;
    account.save()?;
    info!("Saved account {}", account.id()?);

    let mut service = factory.create(catalog::WEB_SERVICE)?;
    service.call_setter("setName", "mail")?;
    service.call_setter("setHostName", "mail.example.com")?;
    service.save()?;
    provider.link(&service, "Accounts", &[&account])?;

    println!("{}\n", account);
    println!("{}", account.to_xml());
    println!("{}\n", serde_json::to_string_pretty(&account.to_json_value())?);

    let accounts = service.call_getter("getAccounts")?.into_many();
    info!("Fetched {} account(s) for {}", accounts.len(), service.id()?);
    println!("{}\n", service);

    let mut person = factory.create(catalog::PERSON)?;
    person.call_setter("setName", "Ada")?;
    person.call_setter("setSurname", "Lovelace")?;
    let full_name = person
        .invoke("fullName", Vec::new())?
        .into_value()
        .unwrap_or(Value::Null);
    println!("fullName() = {}", full_name);

    let mut corporation = factory.create(catalog::CORPORATION)?;
    corporation.call_setter("setName", "Analytical Engines")?;
    corporation.save()?;
    let ceo = corporation.call_getter("getCEO")?.into_one();
    println!(
        "{} has CEO: {}",
        corporation.get("Name")?,
        ceo.map(|m| m.to_string()).unwrap_or_else(|| "none".to_string())
    );
    info!("Provider served {} fetch call(s)", provider.fetch_count());
    Ok(())
}
