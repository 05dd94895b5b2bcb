// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use production_stats::{
    filter, read_json, write_csv, write_json, CalendarDate, DateProvider, ManualCalendar,
    Notification, PersistenceError, ProductionWindow, Quality, Resource, Session,
    SqliteSaveStore, StatsConfig, StockEntry, WorldHoldings,
};

#[derive(Parser)]
#[command(name = "production-stats")]
#[command(about = "Track what the farm produces over in-game time", long_about = None)]
struct Cli {
    /// Save database (SQLite)
    #[arg(long, default_value = "production-stats.db")]
    db: PathBuf,

    /// Config file (JSON); missing file means defaults
    #[arg(long, default_value = "production-stats.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record a gained (positive) or lost (negative) quantity
    Record {
        /// Qualified item id, e.g. "(O)24"
        item: String,
        #[arg(allow_negative_numbers = true)]
        count: i64,
        /// normal, silver, gold, iridium (or 0/1/2/4)
        #[arg(long)]
        quality: Option<String>,
        /// Display name (defaults to the item id)
        #[arg(long)]
        name: Option<String>,
        /// Date of the change, e.g. "spring-5-1" (defaults to today)
        #[arg(long)]
        date: Option<String>,
    },

    /// Show a rollup: today, yesterday, week, season, year, or `range FROM TO`
    Report {
        window: String,
        from: Option<String>,
        to: Option<String>,
        /// Emit JSON
        #[arg(long)]
        json: bool,
    },

    /// Merge a holdings file into one stock list
    Stock {
        holdings: PathBuf,
        /// Player whose view to build (defaults to the configured owner)
        #[arg(long)]
        owner: Option<i64>,
        #[arg(long)]
        search: Option<String>,
        /// Emit JSON
        #[arg(long)]
        json: bool,
    },

    /// Export a rollup as CSV
    Export {
        window: String,
        /// Output file (defaults to stdout)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// End the current day
    NextDay,

    /// Show or set the current in-game date
    Date {
        #[arg(long)]
        set: Option<String>,
    },

    /// Clear every tracked event (the start date is kept)
    Reset,

    /// Open the interactive production menu
    Ui {
        /// Holdings file for the inventory page
        #[arg(long)]
        holdings: Option<PathBuf>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    if let Err(err) = run() {
        error!(error = %format!("{:#}", err), "cli.failed");
        eprintln!("{:#}", err);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let mut host = Host::open(&cli.db, &cli.config)?;

    match cli.command {
        Commands::Record {
            item,
            count,
            quality,
            name,
            date,
        } => {
            let quality = match quality {
                Some(q) => Quality::parse(&q).ok_or_else(|| anyhow!("unknown quality `{}`", q))?,
                None => Quality::Normal,
            };
            let name = name.unwrap_or_else(|| item.clone());
            let resource = Resource::new(item, name).with_quality(quality);
            let date = match date {
                Some(d) => parse_date(&d)?,
                None => host.calendar.now(),
            };

            let tracker = host.session.tracker_mut().context("no save loaded")?;
            tracker.add_on(resource.clone(), count, date);
            host.save()?;
            println!("✓ Recorded {:+} {} on {}", count, resource, date);
        }
        Commands::Report {
            window,
            from,
            to,
            json,
        } => {
            let (title, entries) = host.rollup(&window, from.as_deref(), to.as_deref())?;
            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else {
                print_entries(&title, &entries);
            }
        }
        Commands::Stock {
            holdings,
            owner,
            search,
            json,
        } => {
            let world = read_holdings(&holdings)?;
            let owner = owner.unwrap_or(host.config.owner_id);
            let mut entries = world.snapshot(owner);
            if let Some(query) = search {
                entries = filter(&entries, &query);
            }
            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else {
                print_entries("Inventory", &entries);
            }
        }
        Commands::Export { window, out } => {
            let (title, entries) = host.rollup(&window, None, None)?;
            match out {
                Some(path) => {
                    let file = fs::File::create(&path)
                        .with_context(|| format!("creating {}", path.display()))?;
                    write_csv(&entries, file)?;
                    info!(window = %title, rows = entries.len(), path = %path.display(), "export.written");
                    println!("✓ Exported {} rows to {}", entries.len(), path.display());
                }
                None => write_csv(&entries, io::stdout())?,
            }
        }
        Commands::NextDay => {
            let today = host.calendar.next_day();
            host.save()?;
            info!(date = %today, "calendar.day_started");
            println!("🌅 {}", today);
        }
        Commands::Date { set } => {
            if let Some(d) = set {
                host.calendar.set(parse_date(&d)?);
                host.save()?;
            }
            let tracker = host.session.tracker().context("no save loaded")?;
            println!("📅 {} (tracking since {})", host.calendar.now(), tracker.start());
        }
        Commands::Reset => {
            let cleared = host.session.tracker().map_or(0, |t| t.len());
            host.session.dispatch(Notification::ReturnedToTitle)?;
            host.save()?;
            println!("✓ Cleared {} tracked events", cleared);
        }
        Commands::Ui { holdings } => {
            let world = match holdings {
                Some(path) => read_holdings(&path)?,
                None => WorldHoldings::default(),
            };
            run_ui_mode(host, world)?;
        }
    }

    Ok(())
}

/// Save database, config and calendar for one CLI invocation.
struct Host {
    config: StatsConfig,
    calendar: Rc<ManualCalendar>,
    session: Session<SqliteSaveStore>,
}

impl Host {
    fn open(db_path: &Path, config_path: &Path) -> Result<Self> {
        let config = StatsConfig::load_or_default(config_path);
        let store = SqliteSaveStore::open(db_path)
            .with_context(|| format!("opening save database {}", db_path.display()))?;

        let today = match read_json::<CalendarDate, _>(&store, &config.date_key()) {
            Ok(Some(date)) => date,
            Ok(None) => CalendarDate::first_day(),
            Err(PersistenceError::Json(err)) => {
                warn!(key = %config.date_key(), error = %err, "calendar.restore_failed");
                CalendarDate::first_day()
            }
            Err(err) => return Err(err).context("reading the current date"),
        };
        let calendar = Rc::new(ManualCalendar::new(today));

        let mut session = Session::new(
            store,
            calendar.clone(),
            config.owner_id,
            config.save_key.clone(),
            config.scroll_amount,
        );
        session
            .dispatch(Notification::SaveLoaded)
            .context("loading tracker")?;

        Ok(Host {
            config,
            calendar,
            session,
        })
    }

    fn save(&mut self) -> Result<()> {
        self.session
            .dispatch(Notification::Saving)
            .context("saving tracker")?;
        let key = self.config.date_key();
        write_json(self.session.store_mut(), &key, &self.calendar.now())
            .context("saving the current date")?;
        Ok(())
    }

    fn rollup(&self, window: &str, from: Option<&str>, to: Option<&str>) -> Result<(String, Vec<StockEntry>)> {
        let tracker = self.session.tracker().context("no save loaded")?;

        if window.eq_ignore_ascii_case("range") {
            let (Some(from), Some(to)) = (from, to) else {
                bail!("`range` needs a start and an end date");
            };
            let (from, to) = (parse_date(from)?, parse_date(to)?);
            let title = format!("{} to {}", from, to);
            return Ok((title, tracker.produced_in_range(from, to)));
        }

        let window = window.parse::<ProductionWindow>().map_err(|e| anyhow!(e))?;
        Ok((window.title().to_string(), tracker.produced(window)))
    }
}

fn parse_date(value: &str) -> Result<CalendarDate> {
    value
        .parse::<CalendarDate>()
        .with_context(|| format!("invalid date `{}` (try \"spring-5-1\")", value))
}

fn read_holdings(path: &Path) -> Result<WorldHoldings> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("reading holdings {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("parsing holdings {}", path.display()))
}

fn print_entries(title: &str, entries: &[StockEntry]) {
    println!("📊 {}", title);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    if entries.is_empty() {
        println!("  (nothing)");
        return;
    }
    for entry in entries {
        println!("  {:<36} {:>8}", entry.resource.to_string(), entry.count);
    }
}

#[cfg(feature = "tui")]
fn run_ui_mode(host: Host, world: WorldHoldings) -> Result<()> {
    let mut app = ui::App::new(host.session, world, &host.config);
    ui::run_ui(&mut app)?;
    println!("\n✅ Menu closed");
    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_host: Host, _world: WorldHoldings) -> Result<()> {
    bail!("the terminal menu is not available; rebuild with `--features tui`")
}
