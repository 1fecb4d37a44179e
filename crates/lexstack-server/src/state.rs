use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Instant;

use lexstack_ai::{Predictor, PredictorConfig};
use lexstack_core::Prediction;
use tracing::info;

use crate::config::ServiceConfig;

/// Builds the predictor the first time it is needed.
pub type PredictorLoader = Box<dyn Fn() -> anyhow::Result<Predictor> + Send + Sync>;

/// Shared application state.
pub struct AppState {
    pub config: ServiceConfig,
    pub started: Instant,
    predictor: Mutex<Option<Predictor>>,
    loaded: AtomicBool,
    loader: PredictorLoader,
}

impl AppState {
    /// State that loads the ONNX encoder and artifacts named by `config`.
    pub fn new(config: ServiceConfig) -> Self {
        let predictor_config = config.predictor_config();
        Self::with_loader(config, move || load_predictor(&predictor_config))
    }

    pub fn with_loader(
        config: ServiceConfig,
        loader: impl Fn() -> anyhow::Result<Predictor> + Send + Sync + 'static,
    ) -> Self {
        Self {
            config,
            started: Instant::now(),
            predictor: Mutex::new(None),
            loaded: AtomicBool::new(false),
            loader: Box::new(loader),
        }
    }

    /// Whether the models are in memory. Never waits on a running prediction.
    pub fn models_loaded(&self) -> bool {
        self.loaded.load(Ordering::Acquire)
    }

    /// Load the models now if they are not loaded yet. Blocks.
    pub fn ensure_loaded(&self) -> anyhow::Result<()> {
        let mut guard = self.lock();
        if guard.is_none() {
            *guard = Some(self.load()?);
        }
        Ok(())
    }

    /// Classify document text, loading the models on first use. Blocks.
    ///
    /// A failed load is not cached; the next call tries again.
    pub fn predict_text(&self, text: &str) -> anyhow::Result<Prediction> {
        let mut guard = self.lock();
        if guard.is_none() {
            *guard = Some(self.load()?);
        }
        match guard.as_mut() {
            Some(predictor) => predictor.predict_text(text),
            None => anyhow::bail!("models are not loaded"),
        }
    }

    fn load(&self) -> anyhow::Result<Predictor> {
        let start = Instant::now();
        let predictor = (self.loader)()?;
        self.loaded.store(true, Ordering::Release);
        info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            base_models = ?predictor.base_model_names().collect::<Vec<_>>(),
            "models loaded"
        );
        Ok(predictor)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<Predictor>> {
        // A panic mid-prediction leaves the predictor itself intact.
        self.predictor.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(feature = "onnx")]
fn load_predictor(config: &PredictorConfig) -> anyhow::Result<Predictor> {
    Predictor::load(config)
}

#[cfg(not(feature = "onnx"))]
fn load_predictor(_config: &PredictorConfig) -> anyhow::Result<Predictor> {
    anyhow::bail!("lexstack-server was built without the `onnx` feature; no encoder available")
}
