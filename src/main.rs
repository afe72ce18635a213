mod config;
mod error;
mod handlers;
mod inference;
mod models;
mod preprocess;
mod state;

use std::sync::Arc;

use actix_web::{middleware, web, App, HttpServer};
use anyhow::Context;
use log::{info, warn};
use structopt::StructOpt;

use config::{Opt, Settings};
use inference::{Classifier, OnnxClassifier};
use models::ClassIndex;
use state::AppState;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = Settings::from_opt(Opt::from_args(), &config::base_dir()?);

    info!("Loading model from {}", settings.model_path.display());
    let classifier = OnnxClassifier::load(&settings.model_path)?;
    info!("Loading class indices from {}", settings.class_indices_path.display());
    let classes = ClassIndex::load(&settings.class_indices_path)?;
    if classes.is_empty() {
        warn!("Class index table {} is empty", settings.class_indices_path.display());
    } else {
        info!("Loaded {} class labels", classes.len());
    }

    if let Some(num_classes) = classifier.num_classes() {
        let missing = classes.missing_indices(num_classes);
        if !missing.is_empty() {
            warn!(
                "Model emits {} classes but {} have no label: {:?}",
                num_classes,
                missing.len(),
                missing
            );
        }
    }

    let state = web::Data::new(AppState::new(
        Arc::new(classifier),
        classes,
        settings.max_upload_bytes,
    ));
    let allowed_origin = settings.allowed_origin.clone();

    info!(
        "Server running at http://{}:{}",
        settings.bind_addr.0, settings.bind_addr.1
    );

    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .service(
                web::scope("/api")
                    .wrap(handlers::cors(&allowed_origin))
                    .configure(handlers::config),
            )
    })
    .bind(settings.bind_addr.clone())
    .with_context(|| format!("Could not bind {}:{}", settings.bind_addr.0, settings.bind_addr.1))?
    .run()
    .await?;

    Ok(())
}
