use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use clap::Subcommand;
use log::*;

use crate::{
    filter::{city_label, country_label},
    map::{self, Camera},
    model::{NewCity, TripRecord},
    services::{
        auth::AuthProvider,
        location::{resolve_position, LocationProvider},
        storage::BlobStore,
        DocumentStore,
    },
    session::{profile, Inbox, Notice, TripBrowser, TripDetail, TripForm},
    CityTripError, GenericError,
};

pub struct Context {
    pub store: Arc<dyn DocumentStore>,
    pub auth: Arc<dyn AuthProvider>,
    pub blobs: Arc<dyn BlobStore>,
    pub location: Arc<dyn LocationProvider>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List trips, optionally filtered by city and country.
    Trips {
        #[arg(long)]
        city: Option<String>,
        #[arg(long)]
        country: Option<String>,
    },
    /// Keep listing trips as they change, until interrupted.
    Watch {
        #[arg(long)]
        city: Option<String>,
        #[arg(long)]
        country: Option<String>,
    },
    /// Show the city and country filter options.
    Options,
    /// Show one trip with its reviews.
    Show { trip_id: String },
    /// Post a review on a trip as the configured user.
    Review {
        trip_id: String,
        #[arg(long, default_value_t = 4)]
        rating: i64,
        #[arg(long, default_value = "")]
        comment: String,
    },
    /// Save the current position as a new trip.
    Add {
        #[arg(long)]
        title: String,
        #[arg(long)]
        city: String,
        #[arg(long)]
        country: String,
        #[arg(long)]
        category: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        image_url: Option<String>,
        #[arg(long, conflicts_with = "image_url")]
        image_file: Option<PathBuf>,
    },
    /// Add an entry to the cities collection.
    AddCity {
        #[arg(long)]
        name: String,
        #[arg(long)]
        country: String,
        #[arg(long, default_value = "")]
        category: String,
        #[arg(long, default_value = "")]
        location: String,
        #[arg(long, default_value = "")]
        description: String,
        /// ISO-8601, defaults to now.
        #[arg(long)]
        date_added: Option<String>,
    },
    /// Show where trip markers go and how the map camera fits them.
    Map,
    /// List the users you can send messages to.
    Contacts,
    /// Show messages sent to you.
    Messages,
    /// Send a message to another user.
    Send { to: String, text: String },
}

pub async fn run(ctx: &Context, command: Command) -> Result<(), GenericError> {
    trace!("Running {:?}.", command);
    match command {
        Command::Trips { city, country } => trips(ctx, city, country).await,
        Command::Watch { city, country } => watch(ctx, city, country).await,
        Command::Options => options(ctx).await,
        Command::Show { trip_id } => show(ctx, &trip_id).await,
        Command::Review {
            trip_id,
            rating,
            comment,
        } => review(ctx, &trip_id, rating, &comment).await,
        Command::Add {
            title,
            city,
            country,
            category,
            description,
            image_url,
            image_file,
        } => {
            let picked_image = match image_file {
                Some(path) => Some(tokio::fs::read(&path).await?),
                None => None,
            };
            let form = TripForm {
                title,
                city,
                country,
                category,
                description,
                image_url: image_url.unwrap_or_default(),
                picked_image,
            };
            add(ctx, &form).await
        }
        Command::AddCity {
            name,
            country,
            category,
            location,
            description,
            date_added,
        } => {
            let mut city = NewCity::opened_at(Utc::now());
            city.name = name;
            city.country = country;
            city.category = category;
            city.location = location;
            city.description = description;
            if let Some(date_added) = date_added {
                city.date_added = date_added;
            }
            let id = profile::add_city(ctx.store.as_ref(), &city).await?;
            println!("City added ({}).", id);
            Ok(())
        }
        Command::Map => show_map(ctx).await,
        Command::Contacts => contacts(ctx).await,
        Command::Messages => messages(ctx).await,
        Command::Send { to, text } => send(ctx, &to, &text).await,
    }
}

fn print_notices(notices: Vec<Notice>) {
    for notice in notices {
        match notice {
            Notice::Info(_) => println!("{}", notice),
            Notice::Failure(_) => eprintln!("{}", notice),
        }
    }
}

fn trip_line(trip: &TripRecord, distance: Option<String>) -> String {
    let mut line = format!("{}  {} ({}, {})", trip.id, trip.title, trip.city, trip.country);
    if let Some(category) = &trip.category {
        line.push_str(&format!(" [{}]", category));
    }
    if let Some(distance) = distance {
        line.push_str(&format!(" {}", distance));
    }
    line
}

async fn open_browser(
    ctx: &Context,
    city: Option<String>,
    country: Option<String>,
) -> TripBrowser {
    let mut browser = TripBrowser::new(ctx.store.clone());
    browser.set_user_position(resolve_position(ctx.location.as_ref()).await);
    if let Some(city) = city {
        browser.select_city(&city);
    }
    if let Some(country) = country {
        browser.select_country(&country);
    }
    browser
}

fn print_trips(browser: &TripBrowser) {
    let selection = browser.selection();
    println!(
        "{} / {}: {} of {} trips",
        selection.city_label(),
        selection.country_label(),
        browser.visible().len(),
        browser.all_trips().len()
    );
    for trip in browser.visible() {
        println!("{}", trip_line(trip, browser.distance_label(trip)));
    }
}

async fn trips(
    ctx: &Context,
    city: Option<String>,
    country: Option<String>,
) -> Result<(), GenericError> {
    let mut browser = open_browser(ctx, city, country).await;
    browser.refresh().await;
    print_notices(browser.take_notices());
    print_trips(&browser);
    Ok(())
}

async fn watch(
    ctx: &Context,
    city: Option<String>,
    country: Option<String>,
) -> Result<(), GenericError> {
    let mut browser = open_browser(ctx, city, country).await;
    browser.fetch_city_names().await;
    browser.attach().await?;
    loop {
        let more = tokio::select! {
            _ = tokio::signal::ctrl_c() => false,
            more = browser.next_update() => more,
        };
        if !more {
            break;
        }
        browser.drain_updates().await;
        print_notices(browser.take_notices());
        print_trips(&browser);
    }
    browser.detach();
    Ok(())
}

async fn options(ctx: &Context) -> Result<(), GenericError> {
    let mut browser = TripBrowser::new(ctx.store.clone());
    browser.refresh().await;
    print_notices(browser.take_notices());
    let cities = browser.city_options();
    let countries = browser.country_options();
    let cities: Vec<&str> = cities.iter().map(|c| city_label(c)).collect();
    let countries: Vec<&str> = countries.iter().map(|c| country_label(c)).collect();
    println!("Cities: {}", cities.join(", "));
    println!("Countries: {}", countries.join(", "));
    Ok(())
}

async fn show(ctx: &Context, trip_id: &str) -> Result<(), GenericError> {
    let mut detail = TripDetail::open(ctx.store.clone(), trip_id).await?;
    detail.locate(ctx.location.as_ref()).await;
    print_detail(&detail);
    Ok(())
}

fn print_detail(detail: &TripDetail) {
    let trip = detail.trip();
    println!("{}", trip.title);
    if let Some(distance) = detail.distance_label() {
        println!("{}", distance);
    }
    println!("{}, {}", trip.city, trip.country);
    if !trip.description.is_empty() {
        println!("{}", trip.description);
    }
    if !trip.image.is_empty() {
        println!("{}", trip.image);
    }
    println!();
    println!("Reviews");
    if detail.reviews().is_empty() {
        println!("No reviews yet");
    }
    for review in detail.reviews() {
        println!("{}", review.star_line());
        if !review.comment.trim().is_empty() {
            println!("  {}", review.comment);
        }
        if let Some(username) = review.username.as_deref().filter(|u| !u.trim().is_empty()) {
            println!("  {}", username);
        }
    }
}

async fn review(
    ctx: &Context,
    trip_id: &str,
    rating: i64,
    comment: &str,
) -> Result<(), GenericError> {
    let mut detail = TripDetail::open(ctx.store.clone(), trip_id).await?;
    detail.set_rating(rating);
    detail.set_comment(comment);
    let user = ctx.auth.current_user();
    let posted = detail.post_review(user.as_ref()).await;
    print_notices(detail.take_notices());
    if !posted {
        return Err(CityTripError::Validation("Review not posted.".to_string()).into());
    }
    print_detail(&detail);
    Ok(())
}

async fn add(ctx: &Context, form: &TripForm) -> Result<(), GenericError> {
    let id = form
        .save(ctx.store.as_ref(), ctx.blobs.as_ref(), ctx.location.as_ref())
        .await?;
    println!("CityTrip saved ({}).", id);
    Ok(())
}

async fn show_map(ctx: &Context) -> Result<(), GenericError> {
    let mut browser = TripBrowser::new(ctx.store.clone());
    browser.refresh().await;
    print_notices(browser.take_notices());
    let user = resolve_position(ctx.location.as_ref()).await;
    let markers = map::markers(browser.all_trips());
    match map::fit_camera(&markers, user) {
        Camera::Centered { center, zoom } => {
            println!("Camera: centre {} zoom {}", center, zoom)
        }
        Camera::World { zoom } => println!("Camera: world zoom {}", zoom),
        Camera::Fit(bounds) => println!(
            "Camera: fit N {} E {} S {} W {}",
            bounds.north, bounds.east, bounds.south, bounds.west
        ),
    }
    for marker in &markers {
        println!(
            "{} @ {}: {}",
            marker.trip_id,
            marker.position,
            map::marker_notice(marker, user)
        );
    }
    Ok(())
}

fn signed_in(ctx: &Context) -> Result<String, CityTripError> {
    ctx.auth
        .current_user()
        .map(|user| user.id)
        .ok_or(CityTripError::LoginRequired())
}

async fn contacts(ctx: &Context) -> Result<(), GenericError> {
    let mut inbox = Inbox::new(ctx.store.clone(), &signed_in(ctx)?);
    inbox.load_contacts().await;
    for contact in inbox.contacts() {
        println!("{}  {}", contact.user_id, contact.name);
    }
    Ok(())
}

async fn messages(ctx: &Context) -> Result<(), GenericError> {
    let mut inbox = Inbox::new(ctx.store.clone(), &signed_in(ctx)?);
    inbox.attach().await?;
    // first delivery is the current inbox
    inbox.next_update().await;
    inbox.detach();
    println!("Received Messages:");
    for message in inbox.received() {
        println!("{}: {}", message.from_name, message.message);
    }
    Ok(())
}

async fn send(ctx: &Context, to: &str, text: &str) -> Result<(), GenericError> {
    let mut inbox = Inbox::new(ctx.store.clone(), &signed_in(ctx)?);
    let sent = inbox.send(to, text).await;
    print_notices(inbox.take_notices());
    if sent {
        println!("Message sent.");
    }
    Ok(())
}
