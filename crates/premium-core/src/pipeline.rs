use crate::{
    config::Config,
    error::{CoreError, ValidationError},
    features::DerivedFeatures,
    runtime::ModelRuntime,
    schema::{PredictResponse, ProbaResponse, RawInput},
    util::now_us,
};

use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct AppCore {
    pub cfg: Config,
    pub runtime: Arc<ModelRuntime>,
}

impl AppCore {
    pub fn new(cfg: Config, runtime: ModelRuntime) -> Self {
        Self {
            cfg,
            runtime: Arc::new(runtime),
        }
    }

    /// Loads the model from `cfg.model_dir`.
    pub fn from_config(cfg: Config) -> anyhow::Result<Self> {
        let runtime = ModelRuntime::load_from_dir(&cfg.model_dir)?;
        Ok(Self::new(cfg, runtime))
    }

    #[inline]
    pub fn supports_proba(&self) -> bool {
        self.runtime.supports_proba()
    }

    pub fn derive(&self, raw: RawInput) -> Result<DerivedFeatures, ValidationError> {
        let t_feat = Instant::now();
        let input = raw.validate().inspect_err(|e| {
            metrics::counter!("validation_rejected_total", "field" => e.field()).increment(1);
        })?;
        let feats = DerivedFeatures::derive(&input);
        metrics::histogram!("stage_feature_us").record(now_us(t_feat) as f64);
        Ok(feats)
    }

    pub fn predict(&self, raw: RawInput) -> Result<PredictResponse, CoreError> {
        let t0 = Instant::now();
        let trace_id = Uuid::new_v4();
        metrics::counter!("predict_total").increment(1);

        let feats = self.derive(raw)?;

        let t_pred = Instant::now();
        let label = self.runtime.classifier().predict(&feats)?;
        metrics::histogram!("stage_predict_us").record(now_us(t_pred) as f64);

        tracing::debug!(%trace_id, features = ?feats, label = %label, "predict");
        metrics::histogram!("e2e_us").record(now_us(t0) as f64);

        Ok(PredictResponse {
            predicted_category: label,
        })
    }

    pub fn predict_proba(&self, raw: RawInput) -> Result<ProbaResponse, CoreError> {
        let t0 = Instant::now();
        let trace_id = Uuid::new_v4();
        metrics::counter!("predict_proba_total").increment(1);

        let feats = self.derive(raw)?;

        let Some(proba) = self.runtime.proba() else {
            metrics::counter!("proba_unavailable_total").increment(1);
            return Err(CoreError::CapabilityUnavailable);
        };

        let t_pred = Instant::now();
        let p = proba.predict_proba(&feats)?;
        metrics::histogram!("stage_predict_us").record(now_us(t_pred) as f64);

        tracing::debug!(%trace_id, features = ?feats, proba = ?p, "predict_proba");
        metrics::histogram!("e2e_us").record(now_us(t0) as f64);

        Ok(ProbaResponse {
            classes: proba.classes().to_vec(),
            proba: p,
        })
    }
}
