//! Run one recommendation pipeline from the command line.
//!
//! ```bash
//! DEEPSEEK_API_KEY=... TMDB_API_KEY=... \
//!     cargo run --example recommend -- "Drishyam" "tense plotting" 3
//! ```
//!
//! Set `CINEBOT_DEBUG=1` for debug logging and to print the raw model output
//! when parsing fails.

use cinebot::logging::{LogLevel, init_logging, init_logging_with_filter};
use cinebot::{Config, Pipeline, RecommendationRequest};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let debug = std::env::var_os("CINEBOT_DEBUG").is_some();
    if debug {
        init_logging_with_filter("cinebot=debug");
    } else {
        init_logging(LogLevel::Info);
    }

    let mut args = std::env::args().skip(1);
    let seed_title = args.next().unwrap_or_else(|| "Drishyam".to_string());
    let liked_aspect = args.next().unwrap_or_else(|| "tense plotting".to_string());
    let count: u32 = match args.next() {
        Some(n) => n.parse()?,
        None => 5,
    };

    let config = Config::from_env()?;
    let pipeline = Pipeline::from_config(&config)?;
    let request = RecommendationRequest::new(
        &seed_title,
        &liked_aspect,
        count,
        pipeline.max_recommendations(),
    )?;

    match pipeline.run(&request).await {
        Ok(movies) => {
            println!("Because you liked {seed_title} ({liked_aspect}):\n");
            for movie in movies {
                println!("{}. {} ({})", movie.rank, movie.title, movie.year);
                println!("   {}", movie.description);
                println!("   Why: {}", movie.reasoning);
                println!("   Poster: {}\n", movie.poster_reference);
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("Recommendation failed [{}]: {}", e.kind(), e);
            if let Some(raw) = e.raw_text().filter(|_| debug) {
                eprintln!("\nRaw model output:\n{raw}");
            }
            Err(e.into())
        }
    }
}
