//! Box office command line.
//!
//! ```text
//! box-office                       list the active edition and ticket types on sale
//! box-office <ticket-type> <qty>   preview a reservation
//! box-office <ticket-type> <qty> --commit [channel]
//!                                  preview, then commit if anything would be granted
//! ```
//!
//! Configuration comes from the `FESTIVAL_*` environment variables. Set
//! `FESTIVAL_PRINT_METRICS=1` to dump Prometheus metrics on exit.

use anyhow::{Context, bail};
use festival_client::{ClientConfig, FestivalClient, TicketTypeId};
use festival_runtime::metrics::PrometheusExporter;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Parsed command line.
enum Command {
    Catalog,
    Reserve {
        ticket_type_id: TicketTypeId,
        quantity: u32,
        commit: Option<Option<String>>,
    },
}

fn parse_args(args: &[String]) -> anyhow::Result<Command> {
    let [id, quantity, rest @ ..] = args else {
        if args.is_empty() {
            return Ok(Command::Catalog);
        }
        bail!("usage: box-office [<ticket-type> <quantity> [--commit [channel]]]");
    };

    let ticket_type_id = TicketTypeId::new(id.parse().with_context(|| format!("invalid ticket type id: {id}"))?);
    let quantity = quantity
        .parse()
        .with_context(|| format!("invalid quantity: {quantity}"))?;

    let commit = match rest {
        [] => None,
        [flag] if flag == "--commit" => Some(None),
        [flag, channel] if flag == "--commit" => Some(Some(channel.clone())),
        _ => bail!("unexpected arguments: {}", rest.join(" ")),
    };

    Ok(Command::Reserve {
        ticket_type_id,
        quantity,
        commit,
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "box_office=info,festival_client=info,festival_runtime=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = parse_args(&args)?;

    let mut exporter = PrometheusExporter::new();
    exporter.install()?;

    let config = ClientConfig::from_env()?;
    info!(api_base = %config.api_base, authenticated = config.api_token.is_some(), "Starting box office");
    let client = FestivalClient::from_config(&config)?;

    match command {
        Command::Catalog => show_catalog(&client).await?,
        Command::Reserve {
            ticket_type_id,
            quantity,
            commit,
        } => {
            let reservations = client.reservations();

            let preview = reservations.preview(ticket_type_id, quantity).await?;
            println!(
                "Preview: {} of {quantity} would be granted, {} left",
                preview.reserved, preview.available
            );

            if let Some(channel) = commit {
                if preview.reserved == 0 {
                    println!("Nothing to commit");
                } else {
                    let channel = channel.unwrap_or_else(|| client.default_channel().to_string());
                    let result = reservations.commit(ticket_type_id, quantity, &channel).await?;
                    if result.is_partial(quantity) {
                        println!(
                            "Partially reserved {} of {quantity} ({} short), {} left",
                            result.reserved,
                            result.shortfall(quantity),
                            result.available
                        );
                    } else {
                        println!("Reserved {}, {} left", result.reserved, result.available);
                    }
                    show_catalog(&client).await?;
                }
            }
        }
    }

    if std::env::var_os("FESTIVAL_PRINT_METRICS").is_some() {
        if let Some(rendered) = exporter.render() {
            println!("{rendered}");
        }
    }

    Ok(())
}

async fn show_catalog(client: &FestivalClient) -> anyhow::Result<()> {
    match client.active_edition().await? {
        Some(edition) => println!(
            "{} ({} to {})",
            edition.name, edition.start_date, edition.end_date
        ),
        None => println!("No active edition"),
    }

    let ticket_types = client.on_sale_ticket_types().await?;
    if ticket_types.is_empty() {
        println!("Nothing on sale");
    }
    for ticket_type in ticket_types {
        let quota = ticket_type
            .quota
            .map_or_else(|| "-".to_string(), |q| q.to_string());
        println!(
            "  [{}] {:<24} {:>8.2} {}  quota {quota}",
            ticket_type.id, ticket_type.name, ticket_type.price, ticket_type.currency
        );
    }

    Ok(())
}
