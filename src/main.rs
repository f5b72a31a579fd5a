use anyhow::Context;
use clap::{Parser, ValueEnum};
use dotenv::dotenv;
use review_sentiment::config::{
    DEFAULT_BASE_URL, DEFAULT_MAX_CONCURRENCY, DEFAULT_MAX_FOLLOW_PAGES, DEFAULT_PAGES,
    DEFAULT_PROXY_ENDPOINT,
};
use review_sentiment::extractor::{BODY_SELECTOR, NEXT_PAGE_SELECTOR, RATING_SELECTOR, TITLE_SELECTOR};
use review_sentiment::{
    run, AggregationError, FetchConfig, FieldExtractor, HttpFetcher, Lexicon, NegationPolicy,
    PageMode, PaginatedIngestor, RunSettings,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(ValueEnum, Debug, Clone, Copy)]
enum NegationArg {
    /// Flip the polarity of negated tokens
    Invert,
    /// Score negated tokens as if they were not negated
    Ignore,
}

impl From<NegationArg> for NegationPolicy {
    fn from(arg: NegationArg) -> Self {
        match arg {
            NegationArg::Invert => NegationPolicy::Invert,
            NegationArg::Ignore => NegationPolicy::Ignore,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "review-sentiment", about = "Sentiment summary of a product's review pages")]
struct Cli {
    /// Product identifier used in the review listing URL
    #[arg(env = "REVIEWS_PRODUCT_ID")]
    product_id: String,

    /// Display name for the report heading (defaults to the product id)
    #[arg(long, env = "REVIEWS_PRODUCT_NAME")]
    product_name: Option<String>,

    /// Number of pages to fetch concurrently
    #[arg(long, env = "REVIEWS_PAGES", default_value_t = DEFAULT_PAGES)]
    pages: u32,

    /// Follow next-page links sequentially instead of fetching a fixed count
    #[arg(long, env = "REVIEWS_FOLLOW_NEXT", default_value_t = false)]
    follow_next: bool,

    /// Page cap when following next-page links
    #[arg(long, env = "REVIEWS_MAX_PAGES", default_value_t = DEFAULT_MAX_FOLLOW_PAGES)]
    max_pages: u32,

    /// Scraping proxy API key; pages are fetched directly when unset
    #[arg(long, env = "REVIEWS_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Ask the scraping proxy to forward request headers
    #[arg(long, env = "REVIEWS_FORWARD_HEADERS", default_value_t = false)]
    forward_headers: bool,

    /// Scraping proxy endpoint
    #[arg(long, env = "REVIEWS_PROXY_ENDPOINT", default_value = DEFAULT_PROXY_ENDPOINT)]
    endpoint: String,

    /// Site root for review listing URLs
    #[arg(long, env = "REVIEWS_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Per-request timeout in seconds
    #[arg(long, env = "REVIEWS_TIMEOUT_SECS", default_value_t = 30)]
    timeout_secs: u64,

    /// Maximum pages in flight at once
    #[arg(long, env = "REVIEWS_MAX_CONCURRENCY", default_value_t = DEFAULT_MAX_CONCURRENCY)]
    max_concurrency: usize,

    /// Vocabulary file, one word per line
    #[arg(long, env = "REVIEWS_VOCAB")]
    vocab: Option<PathBuf>,

    /// Valence lexicon file (token<TAB>valence)
    #[arg(long, env = "REVIEWS_LEXICON")]
    lexicon: Option<PathBuf>,

    /// Stopword file, one word per line
    #[arg(long, env = "REVIEWS_STOPWORDS")]
    stopwords: Option<PathBuf>,

    /// How negation tags affect token scores
    #[arg(long, value_enum, default_value_t = NegationArg::Invert)]
    negation: NegationArg,

    #[arg(long, default_value = TITLE_SELECTOR)]
    title_selector: String,

    #[arg(long, default_value = BODY_SELECTOR)]
    body_selector: String,

    #[arg(long, default_value = RATING_SELECTOR)]
    rating_selector: String,

    #[arg(long, default_value = NEXT_PAGE_SELECTOR)]
    next_selector: String,

    /// Print the report as JSON
    #[arg(long, default_value_t = false)]
    json: bool,
}

impl Cli {
    fn fetch_config(&self) -> FetchConfig {
        FetchConfig {
            api_key: self.api_key.clone().filter(|k| !k.is_empty()),
            forward_headers: self.forward_headers,
            endpoint: self.endpoint.clone(),
            base_url: self.base_url.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
            max_concurrency: self.max_concurrency,
        }
    }

    fn page_mode(&self) -> PageMode {
        if self.follow_next {
            PageMode::FollowNext {
                max_pages: self.max_pages,
            }
        } else {
            PageMode::Count(self.pages)
        }
    }

    fn load_lexicon(&self) -> anyhow::Result<Lexicon> {
        let mut lexicon = Lexicon::builtin();
        if let Some(path) = &self.vocab {
            lexicon = lexicon.with_vocabulary_file(path)?;
        }
        if let Some(path) = &self.lexicon {
            lexicon = lexicon.with_valence_file(path)?;
        }
        if let Some(path) = &self.stopwords {
            lexicon = lexicon.with_stopword_file(path)?;
        }
        Ok(lexicon)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if cli.product_id.trim().is_empty() {
        return Err(review_sentiment::ConfigError::EmptyProductId.into());
    }
    let fetch_config = cli.fetch_config();
    fetch_config.validate().context("invalid fetch configuration")?;
    let mode = cli.page_mode();
    mode.validate().context("invalid page mode")?;

    let lexicon = Arc::new(cli.load_lexicon().context("failed to load lexicon resources")?);
    info!("📚 Lexicon ready: {} vocabulary words", lexicon.vocabulary_len());

    let extractor = FieldExtractor::new(
        &cli.title_selector,
        &cli.body_selector,
        &cli.rating_selector,
        &cli.next_selector,
    )?;
    let fetcher = Arc::new(HttpFetcher::new(fetch_config.clone()).context("failed to build http client")?);
    let ingestor = PaginatedIngestor::new(fetcher, extractor, fetch_config);

    let settings = RunSettings {
        product_name: cli.product_name.clone().unwrap_or_else(|| cli.product_id.clone()),
        product_id: cli.product_id.clone(),
        mode,
        negation: cli.negation.into(),
    };

    match run(&ingestor, lexicon, &settings).await {
        Ok(report) => {
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{report}");
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(AggregationError::DivisionByZero) => {
            error!("❌ No classifiable reviews were found for {}", settings.product_id);
            eprintln!("error: {}", AggregationError::DivisionByZero);
            Ok(ExitCode::FAILURE)
        }
    }
}
