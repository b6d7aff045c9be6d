//! Setup, train and predict workflows
//!
//! Every request of a session is routed through [`dispatch`], which runs one
//! workflow against the session and renders the resulting form. A failed step
//! leaves the session exactly as it was.

mod session;

pub use session::{Phase, Session};

use std::path::PathBuf;
use std::time::Instant;

use serde::Deserialize;
use tracing::{info, warn};

use crate::config::DemoConfig;
use crate::error::{Result, StudioError};
use crate::export::{load_model, save_model};
use crate::training::{build_model, Prediction};
use crate::ui::{self, Form};

/// Number of predictions surfaced in the form
pub const SHOWN_PREDICTIONS: usize = 3;

/// Button action carried by a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Setup,
    Train,
    Predict,
}

impl Action {
    /// Train takes precedence when both buttons are reported.
    pub fn from_args(train: bool, predict: bool) -> Self {
        if train {
            Action::Train
        } else if predict {
            Action::Predict
        } else {
            Action::Setup
        }
    }
}

/// Request arguments: the name of the pressed button, if any
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DemoArgs {
    #[serde(default, deserialize_with = "button_pressed")]
    pub train: bool,
    #[serde(default, deserialize_with = "button_pressed")]
    pub predict: bool,
}

impl DemoArgs {
    pub fn action(&self) -> Action {
        Action::from_args(self.train, self.predict)
    }
}

/// Accepts `true`/`false` from JSON and any non-empty value other than
/// `false` from form posts.
fn button_pressed<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Bool(bool),
        Text(String),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Bool(b)) => b,
        Some(Raw::Text(s)) => !s.is_empty() && !s.eq_ignore_ascii_case("false"),
        None => false,
    })
}

/// What a successful train step produced
#[derive(Debug, Clone)]
pub struct TrainSummary {
    pub model_id: String,
    pub accuracy: f64,
    pub model_path: PathBuf,
}

/// Run `action` against `session` and render the form.
pub fn dispatch(session: &mut Session, action: Action, config: &DemoConfig) -> Result<Form> {
    match action {
        Action::Setup => setup(session, config)?,
        Action::Train => {
            train_step(session, config)?;
        }
        Action::Predict => {
            predict_step(session)?;
        }
    }
    Ok(ui::render(session))
}

/// Replace the session's partitions with a fresh split and forget any model.
pub fn setup(session: &mut Session, config: &DemoConfig) -> Result<()> {
    *session = Session::new(config)?;
    info!(train_rows = session.train.height(), test_rows = session.test.height(), "Session set up");
    Ok(())
}

/// Train on the session's train partition, save the model and record its path.
pub fn train_step(session: &mut Session, config: &DemoConfig) -> Result<TrainSummary> {
    let start = Instant::now();
    let model = build_model(&session.train, &config.automl()).inspect_err(|e| {
        warn!(error = %e, "Training failed");
    })?;

    let model_id = model.model_id().to_string();
    let accuracy = model.accuracy_percent();
    let model_path = save_model(&model, &config.model_dir)?;

    if let Some(previous) = session.model_path.replace(model_path.clone()) {
        if previous != model_path {
            info!(previous = %previous.display(), "Replacing stored model path");
        }
    }
    session.phase = Phase::Trained {
        model_id: model_id.clone(),
        accuracy,
    };

    info!(
        model_id = %model_id,
        accuracy,
        path = %model_path.display(),
        elapsed_secs = start.elapsed().as_secs_f64(),
        "Training completed"
    );

    Ok(TrainSummary {
        model_id,
        accuracy,
        model_path,
    })
}

/// Reload the saved model and score the session's test partition.
///
/// Returns one prediction per test row; the session keeps the leading
/// [`SHOWN_PREDICTIONS`] of them.
pub fn predict_step(session: &mut Session) -> Result<Vec<Prediction>> {
    let path = session
        .model_path
        .clone()
        .ok_or_else(|| StudioError::InvalidState("No trained model has been saved yet".to_string()))?;

    let model = load_model(&path)?;
    let predictions = model.predict(&session.test)?;

    session.phase = Phase::Predicted {
        model_id: model.model_id().to_string(),
        accuracy: model.accuracy_percent(),
        predictions: predictions.iter().take(SHOWN_PREDICTIONS).cloned().collect(),
    };

    info!(
        model_id = %model.model_id(),
        rows = predictions.len(),
        path = %path.display(),
        "Prediction completed"
    );
    Ok(predictions)
}
