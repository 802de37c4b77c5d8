use clap::Parser;
use srl_processor::{
    args::{Args, Command},
    database::{db::DbClient, db_structs::{DriverPatch, NewDriver}},
    messaging::{RabbitMqConfig, RabbitMqPublisher},
    settlement::SettlementService,
    store::DriverStore,
    utils::progress_utils::progress_bar
};
use tracing::{info, warn};

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&args.log_level))
        .init();

    let client = DbClient::connect(&args.connection_string)
        .await
        .unwrap_or_else(|e| {
            eprintln!("Failed to connect to database: {}", e);
            eprintln!("Application cannot start without a valid database connection");
            std::process::exit(1);
        });

    let service = SettlementService::new(client);

    match args.command {
        Command::Seed => seed(&service).await,
        Command::CloseSeason => close_season(&service).await,
        Command::Stats => stats(&service).await
    }
}

/// The demo grid the league uses for staging environments.
/// (tag, name, rating, balance, archived)
const DEMO_GRID: &[(&str, &str, i32, i64, bool)] = &[
    ("GHST", "Ghost", 1487, 148_500, false),
    ("NYTE", "Nyte", 1356, 97_200, false),
    ("VNMN", "Venom", 1245, 74_800, false),
    ("WRAT", "Wraith", 1134, 53_100, false),
    ("BLCK", "Blackout", 1108, 41_700, false),
    ("BLZE", "Blaze", 1042, 28_300, false),
    ("LYNX", "Lynx", 987, 19_600, false),
    ("NOVA", "Nova", 934, 11_400, false),
    ("SCRB", "Scrub", 871, 4_200, false),
    ("ZERO", "Zero", 812, 1_100, false),
    ("EXIL", "Exile", 1023, 0, true),
];

async fn seed(service: &SettlementService<DbClient>) {
    let bar = progress_bar(DEMO_GRID.len() as u64, "Seeding demo drivers".to_string());

    for (tag, name, rating, balance, archived) in DEMO_GRID {
        let driver = service
            .register_driver(NewDriver {
                tag: tag.to_string(),
                name: name.to_string()
            })
            .await
            .expect("Expected driver insert to succeed");

        service
            .store()
            .update_driver(
                driver.id,
                DriverPatch {
                    rating: Some(*rating),
                    balance: Some(*balance),
                    archived: Some(*archived)
                }
            )
            .await
            .expect("Expected driver update to succeed");

        bar.inc(1);
    }

    bar.finish_with_message("Demo grid seeded");
    info!(drivers = DEMO_GRID.len(), "seeding complete");
}

async fn close_season(service: &SettlementService<DbClient>) {
    let stats = service.season_stats().await.expect("Expected current season stats");
    let rewards = service.close_season().await.expect("Expected season close to succeed");

    println!("Season {} closed.", stats.season);
    for reward in &rewards {
        match &reward.title {
            Some(title) => println!(
                "  driver {} -> \"{}\" (+{} rating)",
                reward.driver_id, title, reward.rating_bonus
            ),
            None => println!("  driver {} -> no title", reward.driver_id)
        }
    }

    publish_season_closed(stats.season, rewards.iter().map(|r| r.driver_id).collect()).await;
}

async fn stats(service: &SettlementService<DbClient>) {
    let stats = service.season_stats().await.expect("Expected current season stats");

    println!("Season {}", stats.season);
    println!("  races:      {}", stats.race_count);
    println!("  challenges: {}", stats.challenge_count);
    println!("  final pot:  {}", stats.final_pot);
}

/// Best-effort event publication. Settlement results are already durable at
/// this point; a missing broker only costs the notification.
async fn publish_season_closed(season: i32, rewarded: Vec<i32>) {
    let config = match RabbitMqConfig::from_env() {
        Ok(config) => config,
        Err(_) => {
            info!("RabbitMQ not configured, skipping season-closed event");
            return;
        }
    };

    match RabbitMqPublisher::connect_from_config(&config).await {
        Ok(mut publisher) => {
            if let Err(e) = publisher.publish_season_closed(season, rewarded, None).await {
                warn!("Failed to publish season-closed event: {}", e);
            }
            let _ = publisher.close().await;
        }
        Err(e) => warn!("Failed to connect to RabbitMQ: {}", e)
    }
}
