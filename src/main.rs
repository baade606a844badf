use std::time::Duration;

use anyhow::Result;
use clap::Parser;

use skycast_core::App;
use skycast_weather::{Notification, Notifier, Severity, TracingNotifier};

/// How long to wait for trailing notifications (air quality) after loading
const NOTIFICATION_WAIT: Duration = Duration::from_millis(1500);

#[derive(Parser)]
#[command(name = "skycast")]
#[command(about = "Current weather and a short forecast for a city, from OpenWeather")]
#[command(arg_required_else_help = true)]
struct Cli {
    /// City name to search for (at least 3 characters)
    query: String,

    /// Which search result to use, starting at 1
    #[arg(short, long, default_value_t = 1)]
    pick: usize,

    /// Send notifications to the log instead of printing them
    #[arg(short, long)]
    quiet: bool,
}

/// Prints notifications below the report
struct PrintNotifier;

impl Notifier for PrintNotifier {
    fn show(&self, notification: Notification) {
        let marker = match notification.severity {
            Severity::Destructive => "!",
            Severity::Primary => "*",
            Severity::Default => "-",
        };
        println!();
        println!("{} {}: {}", marker, notification.title, notification.description);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    skycast_core::init()?;
    let cli = Cli::parse();

    let mut app = App::new().inspect_err(|e| eprintln!("{}", e.user_message()))?;
    let store = app.store();

    let city = match app.find_city(&cli.query, cli.pick).await {
        Ok(Some(city)) => city,
        Ok(None) => anyhow::bail!("No cities match '{}'", cli.query),
        Err(e) => {
            eprintln!("{}", e.user_message());
            return Err(e.into());
        }
    };
    tracing::info!("Using {}", city.id());

    // Adding a city also selects it and loads its forecast
    store.add_city(city.clone()).await;

    println!("{}, {}", city.name(), city.country());
    match (store.current_weather(), store.error_for(&city)) {
        (Some(weather), _) => {
            println!("  {}°C  {}", weather.temperature, weather.conditions);
            println!("  {}", weather.icon_url());
        }
        (None, Some(error)) => println!("  {}", error),
        (None, None) => println!("  No data"),
    }

    let forecast = store.forecast_days();
    if !forecast.is_empty() {
        println!();
        for day in &forecast {
            println!("  {:<4}{:>4}°C  {}", day.day, day.temperature, day.description);
        }
    }

    let sink: &dyn Notifier = if cli.quiet { &TracingNotifier } else { &PrintNotifier };
    app.drain_notifications(sink, NOTIFICATION_WAIT).await;

    Ok(())
}
