//! Demo form description
//!
//! The form is rebuilt from the session on every request. Its items are, in
//! order: the dataset note, the train/predict buttons, the message bar and two
//! result placeholders (training summary, example predictions).

mod html;

pub use html::to_html;

use serde::{Deserialize, Serialize};

use crate::workflow::{Phase, Session};

pub const TRAIN_BUTTON: &str = "train";
pub const PREDICT_BUTTON: &str = "predict";

const DATASET_NOTE: &str = "The sample dataset used is the wine dataset \
    (178 wines from three cultivars, 13 chemical measurements each; see \
    https://scikit-learn.org/stable/modules/generated/sklearn.datasets.load_wine.html).";
const TRAINING_HINT: &str = "Training will take a few seconds";
const TRAINING_DONE: &str = "Training successfully completed!";
const PREDICTION_DONE: &str = "Prediction successfully completed!";

/// Severity of the message bar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageBarType {
    Warning,
    Success,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Button {
    pub name: String,
    pub label: String,
    pub primary: bool,
    pub disabled: bool,
}

impl Button {
    fn new(name: &str, label: &str, disabled: bool) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            primary: true,
            disabled,
        }
    }
}

/// One form item. Text content uses `\n` as a line break.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "item", rename_all = "snake_case")]
pub enum FormItem {
    Text {
        content: String,
    },
    Buttons {
        items: Vec<Button>,
    },
    MessageBar {
        #[serde(rename = "type")]
        kind: MessageBarType,
        text: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Form {
    pub items: Vec<FormItem>,
}

impl Form {
    pub fn button(&self, name: &str) -> Option<&Button> {
        self.items.iter().find_map(|item| match item {
            FormItem::Buttons { items } => items.iter().find(|b| b.name == name),
            _ => None,
        })
    }

    pub fn message_bar(&self) -> Option<(MessageBarType, &str)> {
        self.items.iter().find_map(|item| match item {
            FormItem::MessageBar { kind, text } => Some((*kind, text.as_str())),
            _ => None,
        })
    }

    /// Content of every text item, in order
    pub fn texts(&self) -> Vec<&str> {
        self.items
            .iter()
            .filter_map(|item| match item {
                FormItem::Text { content } => Some(content.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Training summary placeholder
    pub fn summary(&self) -> &str {
        self.texts().get(1).copied().unwrap_or_default()
    }

    /// Example predictions placeholder
    pub fn predictions(&self) -> &str {
        self.texts().get(2).copied().unwrap_or_default()
    }
}

/// Build the form for the session's current phase.
pub fn render(session: &Session) -> Form {
    let (kind, banner, summary, predictions) = match session.phase() {
        Phase::Idle => (MessageBarType::Warning, TRAINING_HINT, String::new(), String::new()),
        Phase::Trained { model_id, accuracy } => (
            MessageBarType::Success,
            TRAINING_DONE,
            training_summary(model_id, *accuracy),
            String::new(),
        ),
        Phase::Predicted {
            model_id,
            accuracy,
            predictions,
        } => {
            let mut lines = vec!["Example predictions:".to_string()];
            lines.extend(predictions.iter().map(|p| p.to_string()));
            (
                MessageBarType::Success,
                PREDICTION_DONE,
                training_summary(model_id, *accuracy),
                lines.join("\n"),
            )
        }
    };

    Form {
        items: vec![
            FormItem::Text {
                content: DATASET_NOTE.to_string(),
            },
            FormItem::Buttons {
                items: vec![
                    Button::new(TRAIN_BUTTON, "Train", false),
                    Button::new(PREDICT_BUTTON, "Predict", !session.can_predict()),
                ],
            },
            FormItem::MessageBar {
                kind,
                text: banner.to_string(),
            },
            FormItem::Text { content: summary },
            FormItem::Text { content: predictions },
        ],
    }
}

fn training_summary(model_id: &str, accuracy: f64) -> String {
    format!("AutoML model id: {}\nAccuracy: {}%", model_id, accuracy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DemoConfig;
    use crate::training::Prediction;
    use std::path::PathBuf;

    fn idle_session() -> Session {
        Session::new(&DemoConfig::default().with_split_seed(1)).unwrap()
    }

    #[test]
    fn test_initial_form() {
        let form = render(&idle_session());

        assert_eq!(form.items.len(), 5);
        assert!(!form.button(TRAIN_BUTTON).unwrap().disabled);
        assert!(form.button(PREDICT_BUTTON).unwrap().disabled);
        assert_eq!(form.message_bar(), Some((MessageBarType::Warning, TRAINING_HINT)));
        assert_eq!(form.summary(), "");
        assert_eq!(form.predictions(), "");
    }

    #[test]
    fn test_dataset_note_links_source() {
        let form = render(&idle_session());
        let note = form.texts()[0];
        assert!(note.starts_with("The sample dataset used is the wine dataset"));
        assert!(note.contains("https://scikit-learn.org/stable/modules/generated/sklearn.datasets.load_wine.html"));
    }

    #[test]
    fn test_trained_form() {
        let mut session = idle_session();
        session.model_path = Some(PathBuf::from("mymodelfolder/DRF_1_AutoML_20240101_000000"));
        session.phase = Phase::Trained {
            model_id: "DRF_1_AutoML_20240101_000000".to_string(),
            accuracy: 97.22,
        };

        let form = render(&session);
        assert!(!form.button(PREDICT_BUTTON).unwrap().disabled);
        assert_eq!(form.message_bar(), Some((MessageBarType::Success, TRAINING_DONE)));
        assert_eq!(
            form.summary(),
            "AutoML model id: DRF_1_AutoML_20240101_000000\nAccuracy: 97.22%"
        );
        assert_eq!(form.predictions(), "");
    }

    #[test]
    fn test_predicted_form() {
        let mut session = idle_session();
        session.model_path = Some(PathBuf::from("m"));
        session.phase = Phase::Predicted {
            model_id: "KNN_1_AutoML_20240101_000000".to_string(),
            accuracy: 95.0,
            predictions: ["0", "2", "1"]
                .iter()
                .map(|l| Prediction {
                    label: l.to_string(),
                    probabilities: vec![0.5, 0.25, 0.25],
                })
                .collect(),
        };

        let form = render(&session);
        assert_eq!(form.message_bar(), Some((MessageBarType::Success, PREDICTION_DONE)));
        assert!(form.summary().starts_with("AutoML model id: KNN_1"));

        let lines: Vec<&str> = form.predictions().lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[1], "0 (0.5000, 0.2500, 0.2500)");
        assert!(lines[3].starts_with("1 "));
    }

    #[test]
    fn test_form_json_shape() {
        let json = serde_json::to_value(render(&idle_session())).unwrap();
        assert_eq!(json["items"][1]["item"], "buttons");
        assert_eq!(json["items"][1]["items"][1]["disabled"], true);
        assert_eq!(json["items"][2]["item"], "message_bar");
        assert_eq!(json["items"][2]["type"], "warning");
    }
}
