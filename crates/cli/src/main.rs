use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use data_loader::{Catalog, DataPaths, FactorModel};
use server::{
    AdminService, AppState, AuthService, Recommendation, RecommendationOrchestrator,
    ServerConfig, SessionRegistry,
};
use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use storage::{CsvFeedbackStore, CsvUserStore, FeedbackRecord, FeedbackRepository, FeedbackValue};

/// Smart Recs - Electronics Product Recommender
#[derive(Parser)]
#[command(name = "smart-recs")]
#[command(about = "Electronics product recommender using matrix factorization", long_about = None)]
struct Cli {
    /// Directory holding the catalog files and the user/feedback tables
    #[arg(long, default_value = "data", global = true)]
    data_dir: PathBuf,

    /// Directory holding the factor model artifact
    #[arg(long, default_value = "models", global = true)]
    models_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API
    Serve {
        #[arg(long, default_value = "127.0.0.1")]
        host: IpAddr,

        #[arg(long, default_value = "8080")]
        port: u16,

        /// Recommendations per request when the client names no limit
        #[arg(long, default_value = "8")]
        default_limit: usize,
    },

    /// Get product recommendations for a user
    Recommend {
        #[arg(long)]
        user: String,

        /// Number of recommendations to return
        #[arg(long, default_value = "8")]
        limit: usize,

        /// Show the scoring source and explanation for each item
        #[arg(long)]
        explain: bool,
    },

    /// Record a like or dislike
    Feedback {
        #[arg(long)]
        user: String,

        #[arg(long)]
        item: String,

        #[arg(long, value_enum)]
        action: Action,
    },

    /// Create a user account
    Signup {
        #[arg(long)]
        username: String,

        #[arg(long)]
        password: String,
    },

    /// Set a new password for an existing account
    ResetPassword {
        #[arg(long)]
        username: String,

        #[arg(long)]
        password: String,
    },

    /// List user accounts
    Users,

    /// Switch a user between the user and admin roles
    ToggleRole {
        #[arg(long)]
        username: String,
    },

    /// Show dashboard metrics
    Stats,

    /// Show the feedback log, newest first
    FeedbackLog {
        /// Maximum number of rows to print
        #[arg(long, default_value = "50")]
        limit: usize,
    },

    /// Convert raw review JSON lines into the interaction CSV
    ConvertReviews {
        #[arg(long)]
        input: PathBuf,

        #[arg(long)]
        output: PathBuf,
    },

    /// Extract the title map (and optionally the image map) from raw metadata
    PrepareMetadata {
        #[arg(long)]
        input: PathBuf,

        #[arg(long)]
        titles: PathBuf,

        #[arg(long)]
        images: Option<PathBuf>,
    },

    /// Download missing catalog files
    FetchData {
        /// Location of a factor model artifact to download as well
        #[arg(long)]
        model_url: Option<String>,
    },

    /// Run benchmark to test performance
    Benchmark {
        /// Number of requests to make
        #[arg(long, default_value = "100")]
        requests: usize,

        /// Number of concurrent requests
        #[arg(long, default_value = "10")]
        concurrent: usize,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Action {
    Like,
    Dislike,
}

impl From<Action> for FeedbackValue {
    fn from(action: Action) -> Self {
        match action {
            Action::Like => FeedbackValue::Like,
            Action::Dislike => FeedbackValue::Dislike,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let paths = DataPaths::new(&cli.data_dir, &cli.models_dir);

    match cli.command {
        Commands::Serve {
            host,
            port,
            default_limit,
        } => {
            let config = ServerConfig {
                host,
                port,
                default_limit,
            };
            handle_serve(&paths, config).await?
        }
        Commands::Recommend {
            user,
            limit,
            explain,
        } => handle_recommend(&paths, &user, limit, explain)?,
        Commands::Feedback { user, item, action } => {
            handle_feedback(&paths, &user, &item, action.into())?
        }
        Commands::Signup { username, password } => handle_signup(&paths, &username, &password)?,
        Commands::ResetPassword { username, password } => {
            handle_reset_password(&paths, &username, &password)?
        }
        Commands::Users => handle_users(&paths)?,
        Commands::ToggleRole { username } => handle_toggle_role(&paths, &username)?,
        Commands::Stats => handle_stats(&paths)?,
        Commands::FeedbackLog { limit } => handle_feedback_log(&paths, limit)?,
        Commands::ConvertReviews { input, output } => {
            let stats = data_loader::convert::convert_reviews(&input, &output)
                .with_context(|| format!("Failed to convert {}", input.display()))?;
            println!(
                "{} Wrote {} interactions from {} lines to {}",
                "✓".green(),
                stats.rows_written,
                stats.lines_read,
                output.display()
            );
        }
        Commands::PrepareMetadata {
            input,
            titles,
            images,
        } => {
            let stats = data_loader::convert::prepare_metadata(&input, &titles, images.as_deref())
                .with_context(|| format!("Failed to prepare {}", input.display()))?;
            println!(
                "{} Wrote {} products from {} lines to {}",
                "✓".green(),
                stats.rows_written,
                stats.lines_read,
                titles.display()
            );
        }
        Commands::FetchData { model_url } => {
            let files = paths.remote_files(model_url.as_deref());
            let fetched = data_loader::bootstrap::ensure_data(&files)
                .await
                .context("Failed to download data files")?;
            if fetched.is_empty() {
                println!("{} All data files already present", "✓".green());
            }
            for path in fetched {
                println!("{} Downloaded {}", "✓".green(), path.display());
            }
        }
        Commands::Benchmark {
            requests,
            concurrent,
        } => handle_benchmark(&paths, requests, concurrent).await?,
    }

    Ok(())
}

/// Load the catalog and the factor model
fn load_engine(paths: &DataPaths) -> Result<(Arc<Catalog>, Arc<FactorModel>)> {
    println!("Loading catalog from {}...", paths.interactions.display());
    let start = Instant::now();
    let catalog = Catalog::load(paths).context("Failed to load catalog")?;
    let model = FactorModel::load(&paths.model)
        .with_context(|| format!("Failed to load factor model {}", paths.model.display()))?;
    println!(
        "{} Loaded {} items and {} model users in {:?}",
        "✓".green(),
        model.item_count(),
        model.user_count(),
        start.elapsed()
    );
    Ok((Arc::new(catalog), Arc::new(model)))
}

/// Load only the title map, for commands that label items
fn load_titles(paths: &DataPaths) -> Result<Arc<Catalog>> {
    let catalog = Catalog::load_titles(paths)
        .with_context(|| format!("Failed to load {}", paths.titles.display()))?;
    Ok(Arc::new(catalog))
}

fn open_feedback(paths: &DataPaths) -> Result<Arc<CsvFeedbackStore>> {
    let store = CsvFeedbackStore::open(&paths.feedback)
        .with_context(|| format!("Failed to open {}", paths.feedback.display()))?;
    Ok(Arc::new(store))
}

/// Open the user table and seed the default admin
fn open_auth(paths: &DataPaths) -> Result<(Arc<CsvUserStore>, AuthService)> {
    let users = Arc::new(
        CsvUserStore::open(&paths.users)
            .with_context(|| format!("Failed to open {}", paths.users.display()))?,
    );
    let auth = AuthService::new(users.clone());
    if auth.ensure_admin()? {
        println!(
            "{} Created default admin account '{}'",
            "!".yellow(),
            server::auth::DEFAULT_ADMIN_USERNAME
        );
    }
    Ok((users, auth))
}

fn open_admin(paths: &DataPaths) -> Result<AdminService> {
    let (users, _) = open_auth(paths)?;
    Ok(AdminService::new(users, open_feedback(paths)?, load_titles(paths)?))
}

/// Handle the 'serve' command
async fn handle_serve(paths: &DataPaths, config: ServerConfig) -> Result<()> {
    let (catalog, model) = load_engine(paths)?;
    let (users, auth) = open_auth(paths)?;
    let feedback = open_feedback(paths)?;

    let state = AppState {
        orchestrator: RecommendationOrchestrator::new(catalog.clone(), model, feedback.clone()),
        auth,
        admin: AdminService::new(users, feedback, catalog),
        sessions: SessionRegistry::new(),
        default_limit: config.default_limit,
    };

    println!(
        "{} Serving on http://{}:{}",
        "✓".green(),
        config.host,
        config.port
    );
    server::serve(config, state).await
}

/// Handle the 'recommend' command
fn handle_recommend(paths: &DataPaths, user: &str, limit: usize, explain: bool) -> Result<()> {
    let (catalog, model) = load_engine(paths)?;
    let orchestrator = RecommendationOrchestrator::new(catalog, model, open_feedback(paths)?);

    let recommendations = orchestrator.get_recommendations(user, limit)?;
    print_recommendations(user, &recommendations, explain);
    Ok(())
}

/// Handle the 'feedback' command
fn handle_feedback(paths: &DataPaths, user: &str, item: &str, value: FeedbackValue) -> Result<()> {
    let feedback = open_feedback(paths)?;
    feedback
        .append(FeedbackRecord::now(user, item, value))
        .context("Failed to record feedback")?;

    let catalog = load_titles(paths)?;
    println!(
        "{} Recorded {} of {} by {}",
        "✓".green(),
        value.label(),
        catalog.title(item),
        user
    );
    Ok(())
}

/// Handle the 'signup' command
fn handle_signup(paths: &DataPaths, username: &str, password: &str) -> Result<()> {
    let (_, auth) = open_auth(paths)?;
    let user = auth.signup(username, password)?;
    println!("{} Created {} account {}", "✓".green(), user.role, user.username.bold());
    Ok(())
}

/// Handle the 'reset-password' command
fn handle_reset_password(paths: &DataPaths, username: &str, password: &str) -> Result<()> {
    let (_, auth) = open_auth(paths)?;
    auth.reset_password(username, password)?;
    println!("{} Password updated for {}", "✓".green(), username.bold());
    Ok(())
}

/// Handle the 'users' command
fn handle_users(paths: &DataPaths) -> Result<()> {
    let (users, _) = open_auth(paths)?;
    let admin = AdminService::new(users, open_feedback(paths)?, Arc::new(Catalog::new()));

    println!("{}", "Users:".bold().blue());
    for user in admin.users()? {
        println!(
            "  {:<24} {:<6} {}",
            user.username,
            user.role.to_string().cyan(),
            storage::timestamp::format(&user.created_at)
        );
    }
    Ok(())
}

/// Handle the 'toggle-role' command
fn handle_toggle_role(paths: &DataPaths, username: &str) -> Result<()> {
    let (users, _) = open_auth(paths)?;
    let admin = AdminService::new(users, open_feedback(paths)?, Arc::new(Catalog::new()));
    let role = admin.toggle_role(username)?;
    println!("{} {} is now {}", "✓".green(), username.bold(), role.to_string().cyan());
    Ok(())
}

/// Handle the 'stats' command
fn handle_stats(paths: &DataPaths) -> Result<()> {
    let (users, _) = open_auth(paths)?;
    let admin = AdminService::new(users, open_feedback(paths)?, Arc::new(Catalog::new()));
    let metrics = admin.metrics()?;

    println!("{}", "Dashboard:".bold().blue());
    println!("{}Total users: {}", "• ".green(), metrics.total_users);
    println!(
        "{}Active in the last {} days: {}",
        "• ".green(),
        server::admin::ACTIVE_WINDOW_DAYS,
        metrics.active_last_7_days
    );
    Ok(())
}

/// Handle the 'feedback-log' command
fn handle_feedback_log(paths: &DataPaths, limit: usize) -> Result<()> {
    let admin = open_admin(paths)?;
    let log = admin.feedback_log()?;

    println!("{}", format!("Feedback log ({} rows):", log.len()).bold().blue());
    for entry in log.iter().take(limit) {
        let action = match entry.action {
            "Like" => entry.action.green(),
            _ => entry.action.red(),
        };
        println!(
            "  {} {:<16} {:<8} {}",
            storage::timestamp::format(&entry.timestamp),
            entry.user,
            action,
            entry.product
        );
    }
    Ok(())
}

/// Handle the 'benchmark' command
async fn handle_benchmark(paths: &DataPaths, requests: usize, concurrent: usize) -> Result<()> {
    if requests == 0 {
        bail!("--requests must be positive");
    }
    let (catalog, model) = load_engine(paths)?;
    let orchestrator = RecommendationOrchestrator::new(catalog, model.clone(), open_feedback(paths)?);

    // Mostly model users, with every fifth request a cold-start user
    let known = model.users();
    let users: Vec<String> = (0..requests)
        .map(|i| {
            if known.is_empty() || i % 5 == 4 {
                format!("bench-cold-{}", i)
            } else {
                known[rand::random::<u32>() as usize % known.len()].clone()
            }
        })
        .collect();

    let wall_clock = Instant::now();
    let mut timings: Vec<Duration> = Vec::with_capacity(requests);
    for batch in users.chunks(concurrent.max(1)) {
        let mut handles = Vec::with_capacity(batch.len());
        for user in batch {
            let orchestrator = orchestrator.clone();
            let user = user.clone();
            handles.push(tokio::task::spawn_blocking(move || {
                let start = Instant::now();
                orchestrator.recommend_ids(&user, 8)?;
                Ok::<_, anyhow::Error>(start.elapsed())
            }));
        }
        for handle in handles {
            timings.push(handle.await??);
        }
    }
    let total_time = wall_clock.elapsed();

    timings.sort();
    let latency_sum: Duration = timings.iter().sum();
    let avg_latency = latency_sum / timings.len() as u32;
    let percentile = |p: f32| timings[((timings.len() as f32 * p) as usize).min(timings.len() - 1)];
    let throughput = requests as f32 / total_time.as_secs_f32();

    println!("{}", "Benchmark results:".bold().blue());
    println!("Total time: {:?}", total_time);
    println!("Average latency: {:?}", avg_latency);
    println!("P50 latency: {:?}", percentile(0.50));
    println!("P95 latency: {:?}", percentile(0.95));
    println!("P99 latency: {:?}", percentile(0.99));
    println!("Throughput: {:.2} requests/second", throughput);

    Ok(())
}

/// Helper function to format and print recommendations
fn print_recommendations(user: &str, recommendations: &[Recommendation], explain: bool) {
    println!("{}", format!("Recommendations for {}:", user).bold().blue());
    if recommendations.is_empty() {
        println!("  (no items)");
    }
    for (rank, rec) in recommendations.iter().enumerate() {
        let title = if rec.disliked {
            rec.title.dimmed()
        } else {
            rec.title.normal()
        };
        println!(
            "{}. {} [{}] - Score: {:.3}",
            (rank + 1).to_string().green(),
            title,
            rec.item_id,
            rec.score
        );
        if explain {
            println!("   Source: {} | {}", rec.source, rec.explanation);
            println!("   Image: {}", rec.image_url);
        }
    }
}
