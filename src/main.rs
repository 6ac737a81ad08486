use std::error::Error;
use std::fs::File;
use std::sync::Arc;

use chrono::NaiveDate;
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use log::{info, warn};
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};

use staybook::backend::{
    AuthProvider, BackendError, CardStore, ReservationQuery, ReservationStore, SupabaseClient,
};
use staybook::core::card::{
    CardDraft, PaymentMethod, PaymentStep, ReviewSummary, choose, format_card_number,
    payment_options, total_spent,
};
use staybook::core::config::{self, CliOverrides, ResolvedConfig};
use staybook::core::pricing::format_price;
use staybook::core::selection::{BookingWindow, GuestCount};
use staybook::core::session;
use staybook::core::state::App;
use staybook::core::submit::{ReservationSubmitter, SubmitPhase};

#[derive(Parser)]
#[command(name = "staybook", about = "Book a stay from the terminal")]
struct Args {
    /// Account e-mail (overrides config and STAYBOOK_EMAIL)
    #[arg(short, long, global = true)]
    email: Option<String>,

    /// Backend URL (overrides config and STAYBOOK_BACKEND_URL)
    #[arg(long, global = true)]
    backend_url: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Open the booking calendar (default)
    Calendar,
    /// Book a stay without the calendar
    Book {
        #[arg(long)]
        check_in: NaiveDate,
        #[arg(long)]
        check_out: NaiveDate,
        #[arg(long, default_value_t = GuestCount::default().get())]
        guests: u32,
        /// Payment option to use once the reservation is confirmed
        #[arg(long, value_enum)]
        pay: Option<PayWith>,
        /// Card details, read when paying with a new card
        #[command(flatten)]
        card: NewCardArgs,
    },
    /// List your reservations, newest first
    History {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Sign in with STAYBOOK_PASSWORD
    Login,
    /// Create an account with STAYBOOK_PASSWORD
    Signup,
    /// Sign out and forget the stored session
    Logout,
    /// Manage the saved payment card
    Card {
        #[command(subcommand)]
        action: CardCommand,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum PayWith {
    GooglePay,
    ApplePay,
    SavedCard,
    AddCard,
}

impl PayWith {
    fn matches(self, method: &PaymentMethod) -> bool {
        matches!(
            (self, method),
            (PayWith::GooglePay, PaymentMethod::GooglePay)
                | (PayWith::ApplePay, PaymentMethod::ApplePay)
                | (PayWith::SavedCard, PaymentMethod::SavedCard { .. })
                | (PayWith::AddCard, PaymentMethod::AddCard)
        )
    }
}

#[derive(ClapArgs, Default)]
struct NewCardArgs {
    #[arg(long = "card-number")]
    number: Option<String>,
    #[arg(long = "card-name")]
    name: Option<String>,
    /// MM/YY
    #[arg(long = "card-expiry")]
    expiry: Option<String>,
    #[arg(long = "card-cvv")]
    cvv: Option<String>,
}

impl NewCardArgs {
    fn draft(&self) -> CardDraft {
        let mut draft = CardDraft::new();
        draft.set_number(self.number.as_deref().unwrap_or_default());
        draft.set_name(self.name.as_deref().unwrap_or_default());
        draft.set_expiry(self.expiry.as_deref().unwrap_or_default());
        draft.set_cvv(self.cvv.as_deref().unwrap_or_default());
        draft
    }
}

const INCOMPLETE_CARD: &str =
    "card incomplete: 16-digit number, name, MM/YY expiry and 3-digit CVV required";

#[derive(Subcommand)]
enum CardCommand {
    /// Save a card (only the last four digits are stored)
    Add {
        #[command(flatten)]
        card: NewCardArgs,
    },
    /// Show the saved card and payment options
    Show,
    /// Remove the saved card
    Remove,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    dotenv::dotenv().ok();

    // File logger: the terminal belongs to the TUI
    let log_config = ConfigBuilder::new().set_time_format_rfc3339().build();
    if let Ok(log_file) = File::create("staybook.log") {
        let _ = WriteLogger::init(LevelFilter::Debug, log_config, log_file);
    }

    let file_config = config::load_config()?;
    let resolved = config::resolve(
        &file_config,
        &CliOverrides {
            email: args.email.clone(),
            backend_url: args.backend_url.clone(),
        },
    );
    info!("staybook starting up for {}", resolved.hotel_name);

    let client = Arc::new(build_client(&resolved)?);
    restore_session(&client).await;

    match args.command.unwrap_or(Command::Calendar) {
        Command::Calendar => {
            let mut app = App::from_config(client.clone(), client.clone(), &resolved);
            app.saved_card = saved_card(&client).await;
            staybook::tui::run(app, resolved.poll_interval)?;
        }
        Command::Book {
            check_in,
            check_out,
            guests,
            pay,
            card,
        } => {
            let request = BookRequest {
                check_in,
                check_out,
                guests,
                pay,
                card,
            };
            book(&client, &resolved, request).await?
        }
        Command::History { limit } => history(&client, &resolved, limit).await?,
        Command::Login => {
            let (email, password) = credentials(&resolved)?;
            let session = client.sign_in_with_password(&email, &password).await?;
            session::save_auth_session(&session)?;
            println!("Logged in as {email}");
        }
        Command::Signup => {
            let (email, password) = credentials(&resolved)?;
            let user_id = client.sign_up(&email, &password).await?;
            match client.session() {
                Some(session) => {
                    session::save_auth_session(&session)?;
                    println!("Account created and logged in ({user_id})");
                }
                None => println!("Account created ({user_id}). Confirm your e-mail, then log in."),
            }
        }
        Command::Logout => {
            if let Err(e) = client.sign_out().await {
                warn!("Server-side sign out failed: {}", e);
            }
            session::clear_auth_session()?;
            println!("Logged out");
        }
        Command::Card { action } => card(&client, action).await?,
    }

    Ok(())
}

fn build_client(config: &ResolvedConfig) -> Result<SupabaseClient, BackendError> {
    let url = config.backend_url.clone().ok_or_else(|| {
        BackendError::Config(
            "backend URL not set (config [backend] url, STAYBOOK_BACKEND_URL, or --backend-url)"
                .to_string(),
        )
    })?;
    let anon_key = config.anon_key.clone().ok_or_else(|| {
        BackendError::Config(
            "anon key not set (config [backend] anon_key or STAYBOOK_ANON_KEY)".to_string(),
        )
    })?;
    Ok(SupabaseClient::new(url, anon_key))
}

fn credentials(config: &ResolvedConfig) -> Result<(String, String), BackendError> {
    let email = config.email.clone().ok_or_else(|| {
        BackendError::Config("e-mail not set (--email, STAYBOOK_EMAIL, or config)".to_string())
    })?;
    let password = std::env::var("STAYBOOK_PASSWORD")
        .map_err(|_| BackendError::Config("STAYBOOK_PASSWORD is not set".to_string()))?;
    Ok((email, password))
}

/// Loads the stored session; an expired one is refreshed once, or dropped.
async fn restore_session(client: &SupabaseClient) {
    let Some(stored) = session::load_auth_session() else {
        return;
    };
    let expired = stored.is_expired(chrono::Utc::now());
    client.set_session(Some(stored));
    if !expired {
        return;
    }

    info!("Stored session expired, refreshing");
    match client.refresh_session().await {
        Ok(fresh) => {
            if let Err(e) = session::save_auth_session(&fresh) {
                warn!("Failed to save refreshed session: {}", e);
            }
        }
        Err(e) => {
            warn!("Session refresh failed: {}", e);
            if let Err(e) = session::clear_auth_session() {
                warn!("Failed to clear session: {}", e);
            }
        }
    }
}

async fn saved_card(client: &SupabaseClient) -> Option<staybook::backend::Card> {
    let user_id = client.current_user()?;
    match client.saved_card(user_id).await {
        Ok(card) => card,
        Err(e) => {
            warn!("Could not load saved card: {}", e);
            None
        }
    }
}

struct BookRequest {
    check_in: NaiveDate,
    check_out: NaiveDate,
    guests: u32,
    pay: Option<PayWith>,
    card: NewCardArgs,
}

/// Resolves `--pay` against the options on offer.
fn pick_payment(
    pay: PayWith,
    saved: Option<&staybook::backend::Card>,
) -> Result<(PaymentMethod, PaymentStep), Box<dyn Error>> {
    let index = payment_options(saved)
        .iter()
        .position(|method| pay.matches(method))
        .ok_or("no saved card; pay with --pay add-card and the --card-* options")?;
    choose(saved, index).ok_or_else(|| "payment option not available".into())
}

async fn book(
    client: &SupabaseClient,
    config: &ResolvedConfig,
    request: BookRequest,
) -> Result<(), Box<dyn Error>> {
    let window = BookingWindow::new(config.max_date);
    let selection = window.select(request.check_in, request.check_out)?;
    let guests = GuestCount::new(request.guests);

    let mut card = saved_card(client).await;
    let choice = match request.pay {
        Some(pay) => Some(pick_payment(pay, card.as_ref())?),
        None => None,
    };
    // Card entry is checked before booking so a typo never leaves a
    // reservation without a payment method.
    let new_card = match &choice {
        Some((_, PaymentStep::EnterCard)) => {
            let draft = request.card.draft();
            if !draft.is_complete() {
                return Err(INCOMPLETE_CARD.into());
            }
            Some(draft)
        }
        _ => None,
    };

    let mut submitter = ReservationSubmitter::new();
    let phase = submitter
        .submit(&selection, guests.get(), &config.pricing, client, client)
        .await
        .clone();

    let reservation = match phase {
        SubmitPhase::Confirmed(reservation) => reservation,
        SubmitPhase::Failed(e) => {
            eprintln!("{}", e.user_message());
            return Err(e.into());
        }
        other => return Err(format!("unexpected submit state: {other:?}").into()),
    };

    if let Some(draft) = new_card
        && let Some(payload) = draft.to_new_card(reservation.user_id)
    {
        let saved = client.insert_card(&payload).await?;
        println!("Saved card {}", format_card_number(draft.number()));
        card = Some(saved);
    }

    let review = ReviewSummary::new(
        reservation,
        config.pricing.nightly_rate,
        config.pricing.service_fee_rate,
        card.as_ref(),
    );
    let stay = &review.reservation;
    println!("Reservation confirmed at {}", config.hotel_name);
    println!("  {} → {} ({} nights)", stay.check_in, stay.check_out, review.price.nights);
    println!("  Guests       {}", stay.guests);
    println!("  Stay         {}", format_price(review.price.subtotal, &config.currency));
    println!("  Service fee  {}", format_price(review.price.service_fee, &config.currency));
    println!("  Amount due   {}", format_price(review.amount_due(), &config.currency));

    match choice {
        Some((method, PaymentStep::Review)) => println!("Paying with {}", method.label()),
        Some((_, PaymentStep::EnterCard)) => {
            if let Some(last4) = review.card_last4 {
                println!("Paying with {}", PaymentMethod::SavedCard { last4 }.label());
            }
        }
        None => {
            println!("Pay with (--pay):");
            for method in payment_options(card.as_ref()) {
                println!("  • {}", method.label());
            }
        }
    }
    Ok(())
}

async fn history(
    client: &SupabaseClient,
    config: &ResolvedConfig,
    limit: usize,
) -> Result<(), Box<dyn Error>> {
    let user_id = client.current_user().ok_or(BackendError::AuthRequired)?;
    let rows = client
        .query(&ReservationQuery::for_user(user_id).limit(limit))
        .await?;

    if rows.is_empty() {
        println!("No reservations yet.");
        return Ok(());
    }
    for r in &rows {
        println!(
            "#{:<6} {} → {}  {:>2} nights  {} guests  {}",
            r.id.0,
            r.check_in,
            r.check_out,
            r.nights(),
            r.guests,
            format_price(r.total_price, &config.currency)
        );
    }
    println!("Total spent {}", format_price(total_spent(&rows), &config.currency));
    Ok(())
}

async fn card(client: &SupabaseClient, action: CardCommand) -> Result<(), Box<dyn Error>> {
    let user_id = client.current_user().ok_or(BackendError::AuthRequired)?;
    match action {
        CardCommand::Add { card } => {
            let draft = card.draft();
            let new_card = draft.to_new_card(user_id).ok_or(INCOMPLETE_CARD)?;
            client.insert_card(&new_card).await?;
            println!("Saved card {}", format_card_number(draft.number()));
        }
        CardCommand::Show => match client.saved_card(user_id).await? {
            Some(card) => {
                println!("{}  {}  {}", card.name_on_card, card.expiry, card.last4);
                println!("Pay with:");
                for method in payment_options(Some(&card)) {
                    println!("  • {}", method.label());
                }
            }
            None => println!("No saved card."),
        },
        CardCommand::Remove => {
            client.delete_cards(user_id).await?;
            println!("Saved card removed");
        }
    }
    Ok(())
}
