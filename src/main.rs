use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info};

use foodietour::cli::{Cli, Command};
use foodietour::images::UnsplashClient;
use foodietour::models::{DietaryPreference, TourRequest};
use foodietour::planner::{LogProgress, TourPlanner};
use foodietour::render::Renderer;
use foodietour::web::{self, AppState};
use foodietour::{Cache, FoodieTourConfig, export, logging};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = FoodieTourConfig::load_from_path(cli.config.clone())?;
    logging::init(&config.logging, cli.verbose)?;

    let cache = Cache::from_location(&config.cache.location)
        .with_context(|| format!("Failed to open cache at {}", config.cache.location))?;
    let planner = TourPlanner::from_config(&config, cache.clone())?;
    let images = UnsplashClient::new(&config.images, cache)?;
    let renderer = Renderer::new(Arc::new(images))?;

    match cli.command {
        Command::Serve { port } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            let state = AppState {
                planner: Arc::new(planner),
                renderer: Arc::new(renderer),
            };
            web::run(&config.server, state).await
        }
        Command::Plan {
            cities,
            prefs,
            no_surprise,
            out,
        } => {
            let prefs = if prefs.is_empty() {
                vec![DietaryPreference::None]
            } else {
                prefs
                    .iter()
                    .map(|p| p.parse())
                    .collect::<Result<Vec<DietaryPreference>, _>>()?
            };
            let request = TourRequest {
                cities,
                prefs,
                surprise: !no_surprise,
                festival: false,
            };
            plan_to_files(&planner, &renderer, &request, &out).await
        }
    }
}

/// Runs the pipeline once and writes each city's artifacts to `out`
async fn plan_to_files(
    planner: &TourPlanner,
    renderer: &Renderer,
    request: &TourRequest,
    out: &Path,
) -> Result<()> {
    std::fs::create_dir_all(out)
        .with_context(|| format!("Failed to create output directory {}", out.display()))?;

    let batch = planner.plan_tours(request, &mut LogProgress).await;
    if !export::PDF_AVAILABLE {
        info!("PDF export unavailable in this build, writing JSON and HTML only");
    }

    for plan in &batch.tours {
        let json_path = out.join(export::json_file_name(&plan.city));
        std::fs::write(&json_path, export::json_document(plan)?)
            .with_context(|| format!("Failed to write {}", json_path.display()))?;
        info!("Wrote {}", json_path.display());

        #[cfg(feature = "pdf")]
        {
            let pdf_path = out.join(export::pdf_file_name(&plan.city));
            std::fs::write(&pdf_path, export::pdf_bytes(plan)?)
                .with_context(|| format!("Failed to write {}", pdf_path.display()))?;
            info!("Wrote {}", pdf_path.display());
        }

        let html_path = out.join(export::html_file_name(&plan.city));
        std::fs::write(&html_path, renderer.city_page(request, plan).await?)
            .with_context(|| format!("Failed to write {}", html_path.display()))?;
        info!("Wrote {}", html_path.display());
    }

    for failure in &batch.failures {
        error!("{}", failure.message);
        if let Some(raw) = &failure.raw_output {
            error!("Raw output for {}: {}", failure.city, raw);
        }
    }

    println!(
        "Planned {} of {} cities into {}",
        batch.tours.len(),
        batch.tours.len() + batch.failures.len(),
        out.display()
    );
    Ok(())
}
