use crate::model::{Classifier, LinearModel, ProbaClassifier};
use anyhow::{anyhow, Context, Result};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

fn select_model_file(dir: &Path) -> Option<PathBuf> {
    for name in ["model.json", "model.json.gz"] {
        let p = dir.join(name);
        if p.is_file() {
            return Some(p);
        }
    }

    // model_v1.json / model_v2.json ...: lowest version wins
    let mut cands: Vec<(u32, PathBuf)> = vec![];
    if let Ok(rd) = fs::read_dir(dir) {
        for ent in rd.flatten() {
            let path = ent.path();
            if !path.is_file() {
                continue;
            }
            let name = path.file_name().and_then(|s| s.to_str()).unwrap_or("");
            if let Some(rest) = name.strip_prefix("model_v") {
                if let Some(rest) = rest.strip_suffix(".json") {
                    if let Ok(v) = rest.parse::<u32>() {
                        cands.push((v, path));
                    }
                }
            }
        }
    }
    cands.sort_by_key(|(v, _)| *v);
    cands.first().map(|(_, p)| p.clone())
}

fn read_artifact(path: &Path) -> Result<String> {
    let gz = path
        .extension()
        .map(|e| e.eq_ignore_ascii_case("gz"))
        .unwrap_or(false);
    if gz {
        let f = fs::File::open(path).with_context(|| format!("open {}", path.display()))?;
        let mut s = String::new();
        flate2::read::GzDecoder::new(f)
            .read_to_string(&mut s)
            .with_context(|| format!("decompress {}", path.display()))?;
        Ok(s)
    } else {
        fs::read_to_string(path).with_context(|| format!("read {}", path.display()))
    }
}

/// The loaded model, shared read-only by every request.
#[derive(Debug, Clone)]
pub struct ModelRuntime {
    pub model_dir: PathBuf,
    pub model_path: PathBuf,
    classifier: Arc<dyn Classifier>,
    /// Probability capability, resolved once when the runtime is built.
    proba: Option<Arc<dyn ProbaClassifier>>,
}

impl ModelRuntime {
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        let model_path = select_model_file(dir).ok_or_else(|| {
            anyhow!(
                "no model artifact in model_dir={}, expected model.json, model.json.gz or model_v<N>.json",
                dir.display()
            )
        })?;

        let s = read_artifact(&model_path)?;
        let model = LinearModel::from_json_str(&s)
            .with_context(|| format!("load model: {}", model_path.display()))?;

        tracing::info!(
            model = %model_path.display(),
            kind = ?model.kind(),
            classes = ?model.labels(),
            width = model.width(),
            "model loaded"
        );

        Ok(Self::with_classifier(dir, model_path, Arc::new(model)))
    }

    /// Wraps an already-built classifier (alternative backends, test stubs).
    pub fn with_classifier(
        model_dir: impl AsRef<Path>,
        model_path: impl AsRef<Path>,
        classifier: Arc<dyn Classifier>,
    ) -> Self {
        let proba = Arc::clone(&classifier).proba_handle();
        Self {
            model_dir: model_dir.as_ref().to_path_buf(),
            model_path: model_path.as_ref().to_path_buf(),
            classifier,
            proba,
        }
    }

    #[inline]
    pub fn supports_proba(&self) -> bool {
        self.proba.is_some()
    }

    #[inline]
    pub fn classifier(&self) -> &dyn Classifier {
        self.classifier.as_ref()
    }

    #[inline]
    pub fn proba(&self) -> Option<&dyn ProbaClassifier> {
        self.proba.as_deref()
    }
}
