use anyhow::Result;
use clap::Parser;
use shared::domain::{ActivityName, Email};
use viewsync::{ListView, ParticipantsSection, ViewSyncClient};

#[derive(Parser, Debug)]
struct Args {
    #[arg(long)]
    server_url: String,
    /// Sign this email up for --activity after the initial load.
    #[arg(long, requires = "activity")]
    email: Option<String>,
    #[arg(long, requires = "email")]
    activity: Option<String>,
    /// Unregister the pair instead of signing it up.
    #[arg(long, default_value_t = false)]
    unregister: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();
    let args = Args::parse();

    let client = ViewSyncClient::new(&args.server_url)?;
    client.load_activities().await;

    print_activities(&client).await;

    if let (Some(email), Some(activity)) = (args.email, args.activity) {
        let activity = ActivityName::new(activity);
        let email = Email::new(email);
        if args.unregister {
            client.unregister(&activity, &email).await;
        } else {
            client.sign_up(&activity, &email).await;
        }

        let view = client.view_state().await;
        if view.status.is_visible() {
            println!("-> {}", view.status.text);
        }
        if let Some(card) = view
            .activities
            .cards()
            .and_then(|cards| cards.card(&activity))
        {
            println!(
                "-> {}: {}, {}",
                card.name,
                card.participants_heading(),
                card.availability_text()
            );
        }
    }

    Ok(())
}

async fn print_activities(client: &ViewSyncClient) {
    let view = client.view_state().await;
    match &view.activities {
        ListView::Loading => println!("Still loading."),
        ListView::Failed(notice) => println!("{notice}"),
        ListView::Ready(cards) => {
            for card in cards.cards() {
                println!("{} ({})", card.name, card.schedule);
                println!("  {}", card.availability_text());
                match &card.participants {
                    ParticipantsSection::Empty { placeholder } => {
                        println!("  {placeholder}");
                    }
                    ParticipantsSection::Roster { entries } => {
                        println!("  {}", card.participants_heading());
                        for entry in entries {
                            println!("    {}", entry.email);
                        }
                    }
                }
            }
        }
    }
}
