use std::sync::Arc;

use chrono::Utc;

use mathpath_core::config::Config;
use mathpath_core::content::generators::{self, addition, fraction};
use mathpath_core::learner::{bkt, Attempt, LearnerState, Skill, SkillCatalog};
use mathpath_core::logging;
use mathpath_core::rng::ThreadRandom;
use mathpath_core::{GenerationEngine, Recommender};

fn demo_catalog() -> SkillCatalog {
    let skills = vec![
        Skill::new(addition::SKILL_ID, "Add whole numbers"),
        Skill::new(fraction::SKILL_ID, "Find a fraction of a quantity")
            .with_prerequisites([addition::SKILL_ID]),
    ];
    SkillCatalog::new(skills).unwrap_or_default()
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let config = Config::from_env();
    let _log_guard = logging::init_tracing(&config.logging);

    let catalog = match &config.catalog_path {
        Some(path) => match SkillCatalog::load(path) {
            Ok(catalog) => catalog,
            Err(err) => {
                tracing::error!(error = %err, path = %path.display(), "failed to load skill catalog");
                std::process::exit(1);
            }
        },
        None => demo_catalog(),
    };
    catalog.diagnostics();

    let engine = Arc::new(GenerationEngine::from_config(
        &config.engine,
        generators::default_registry(),
    ));
    let recommender = Recommender::new(engine);

    let learner = LearnerState::initialize("demo-learner", &catalog, Utc::now());
    let mut rng = ThreadRandom;

    let item = match recommender.recommend(&learner, &mut rng, &catalog).await {
        Ok(item) => item,
        Err(err) => {
            tracing::error!(error = %err, "recommendation failed");
            std::process::exit(1);
        }
    };

    match serde_json::to_string_pretty(&item) {
        Ok(json) => println!("{json}"),
        Err(err) => tracing::error!(error = %err, "failed to encode item"),
    }

    let attempt = Attempt::new(&learner.user_id, item.skill_id(), true, Utc::now()).for_item(item.id());
    let updated = bkt::update(&learner, &attempt, &catalog, &config.bkt);
    tracing::info!(
        skill_id = %attempt.skill_id,
        before = learner.mastery(&attempt.skill_id).unwrap_or_default(),
        after = updated.mastery(&attempt.skill_id).unwrap_or_default(),
        posterior = config.bkt.correct_posterior.as_str(),
        "simulated correct attempt applied"
    );
}
