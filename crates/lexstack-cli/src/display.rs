//! Vertical card display for classification results.

use std::fmt::Write;

use lexstack_core::ClassifyResponse;

const PREVIEW_CHARS: usize = 240;
const BAR_WIDTH: usize = 20;

// ── Public API ──

/// Print one classification result as a card.
pub fn print_prediction_card(resp: &ClassifyResponse) {
    print!("{}", render_card(resp));
}

pub fn render_card(resp: &ClassifyResponse) -> String {
    let mut out = String::new();
    let result = &resp.result;

    let _ = writeln!(out, "=== {} ===", resp.filename);
    out.push('\n');

    out.push_str("Prediction\n");
    let _ = writeln!(out, "  {:<26} {}", "label", result.prediction);
    let _ = writeln!(
        out,
        "  {:<26} {:.2}%  {}",
        "confidence",
        result.confidence,
        bar(result.confidence / 100.0)
    );
    out.push('\n');

    if !result.base_model_outputs.is_empty() {
        let _ = writeln!(out, "Base models ({}):", result.base_model_outputs.len());
        for o in result.base_model_outputs.iter() {
            let _ = writeln!(out, "    {:<30}{}", o.name, format_probabilities(&o.probabilities));
        }
        out.push('\n');
    }

    if !resp.text_preview.is_empty() {
        out.push_str("Preview\n");
        let _ = writeln!(out, "  {}", truncate(&resp.text_preview, PREVIEW_CHARS));
    }
    out
}

// ── Helpers ──

fn format_probabilities(p: &[f32]) -> String {
    let items: Vec<String> = p.iter().map(|v| format!("{v:.4}")).collect();
    format!("[{}]", items.join(", "))
}

fn bar(fraction: f64) -> String {
    let filled = (fraction.clamp(0.0, 1.0) * BAR_WIDTH as f64).round() as usize;
    format!("{}{}", "#".repeat(filled), ".".repeat(BAR_WIDTH - filled))
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars - 3).collect();
    format!("{cut}...")
}

#[cfg(test)]
mod tests {
    use super::*;
    use lexstack_core::{BaseModelOutput, BaseModelOutputs, Prediction};

    fn response() -> ClassifyResponse {
        ClassifyResponse {
            filename: "judgment.pdf".into(),
            text_preview: "IN THE SUPREME COURT OF INDIA".into(),
            result: Prediction {
                prediction: "appeal approved".into(),
                confidence: 87.42,
                base_model_outputs: BaseModelOutputs(vec![
                    BaseModelOutput {
                        name: "logreg".into(),
                        probabilities: vec![0.25, 0.75],
                    },
                    BaseModelOutput {
                        name: "svc".into(),
                        probabilities: vec![0.1, 0.9],
                    },
                ]),
            },
        }
    }

    #[test]
    fn card_lists_label_confidence_and_models() {
        let card = render_card(&response());
        assert!(card.starts_with("=== judgment.pdf ===\n"));
        assert!(card.contains("appeal approved"));
        assert!(card.contains("87.42%"));
        assert!(card.contains("Base models (2):"));
        assert!(card.contains("[0.2500, 0.7500]"));
        let logreg = card.find("logreg").unwrap();
        let svc = card.find("svc").unwrap();
        assert!(logreg < svc);
    }

    #[test]
    fn bar_is_proportional() {
        assert_eq!(bar(0.5), format!("{}{}", "#".repeat(10), ".".repeat(10)));
        assert_eq!(bar(1.5).len(), BAR_WIDTH);
        assert_eq!(bar(0.0), ".".repeat(BAR_WIDTH));
    }

    #[test]
    fn long_previews_are_cut() {
        let t = truncate(&"a".repeat(300), 10);
        assert_eq!(t, "aaaaaaa...");
        assert_eq!(truncate("short", 10), "short");
    }
}
