use anyhow::Context;
use premium_core::{
    config::Config,
    pipeline::AppCore,
    schema::{Occupation, RawInput},
};
use std::path::PathBuf;

fn main() -> anyhow::Result<()> {
    // 1) model dir: first arg, else the default from Config
    let model_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| Config::default().model_dir);

    let cfg = Config {
        model_dir,
        ..Config::default()
    };
    let core = AppCore::from_config(cfg).context("load model")?;
    println!(
        "model={} proba={}",
        core.runtime.model_path.display(),
        core.supports_proba()
    );

    // 2) the form's default input
    let raw = RawInput {
        age: 34,
        weight: 82.0,
        height: 1.78,
        income: 18.2,
        smoker: false,
        city: "Seattle".into(),
        occupation: Occupation::SoftwareEngineer,
    };

    let feats = core.derive(raw.clone())?;
    println!("features={}", serde_json::to_string(&feats)?);

    let pred = core.predict(raw.clone())?;
    println!("predicted_category={}", pred.predicted_category);

    // 3) probabilities only when the artifact has them
    if core.supports_proba() {
        let resp = core.predict_proba(raw)?;
        for (class, p) in resp.classes.iter().zip(&resp.proba) {
            println!("  {:<10} {:>8.4}", class, p);
        }
    }

    Ok(())
}
