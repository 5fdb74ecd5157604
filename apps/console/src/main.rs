use anyhow::Result;
use clap::{Parser, Subcommand};
use client_core::{CatalogClient, FormState};
use shared::domain::ProductId;

#[derive(Parser, Debug)]
struct Args {
    #[arg(long, default_value = "http://127.0.0.1:35000")]
    server_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Add a product to the catalog.
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        price: String,
        #[arg(long)]
        image: String,
    },
    /// Print every product in the catalog.
    List,
    /// Remove a product by id.
    Remove {
        #[arg(long)]
        id: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();
    let args = Args::parse();

    let client = CatalogClient::new(&args.server_url)?;
    match args.command {
        Command::Add { name, price, image } => {
            // Same validation path the form flow uses.
            let form = FormState { name, price, image };
            let draft = form.parse()?;
            let record = client.add_product(&draft).await?;
            println!("Added product #{}: {}", record.product_id.0, record.name);
        }
        Command::List => {
            for product in client.list_products().await? {
                println!(
                    "#{:<4} {:<24} {:>10.2}  {}",
                    product.product_id.0, product.name, product.price, product.image
                );
            }
        }
        Command::Remove { id } => {
            client.remove_product(ProductId(id)).await?;
            println!("Removed product #{id}");
        }
    }

    Ok(())
}
