//! HTML presenter for the dashboard page

use crate::config::ExplanationConfig;
use crate::dashboard::plot::{format_value, render_attribution_svg};
use crate::error::ExplanationRenderFailure;
use crate::pipeline::Analysis;
use crate::types::transaction::{RawTransaction, TransactionType};
use chrono::{DateTime, Utc};
use std::fmt::Write;
use tracing::warn;
use uuid::Uuid;

const TITLE: &str = "Financial Transaction Fraud Detection";

const STYLE: &str = r#"
body { font-family: sans-serif; max-width: 960px; margin: 2rem auto; color: #1f2430; }
form { display: grid; grid-template-columns: repeat(2, minmax(0, 1fr)); gap: 0.75rem 1.5rem; }
label { display: flex; flex-direction: column; font-size: 0.9rem; }
button { grid-column: span 2; padding: 0.6rem; font-size: 1rem; }
.banner { padding: 0.9rem 1.2rem; border-radius: 6px; font-weight: bold; margin: 1rem 0; }
.fraud { background: #fde2e4; color: #9b1c1c; }
.legit { background: #def7ec; color: #03543f; }
.error { background: #fde2e4; color: #9b1c1c; padding: 0.8rem 1.2rem; border-radius: 6px; }
.warning { background: #fdf6b2; color: #723b13; padding: 0.8rem 1.2rem; border-radius: 6px; }
.meta { color: #6b7280; font-size: 0.8rem; }
table { border-collapse: collapse; }
td, th { border: 1px solid #d1d5db; padding: 0.3rem 0.7rem; text-align: right; }
"#;

/// What the result section of the page shows
#[derive(Debug)]
pub enum Outcome {
    Completed(Box<Report>),
    Failed(String),
}

/// Presentable view of one finished analysis
#[derive(Debug)]
pub struct Report {
    pub analysis_id: Uuid,
    pub analyzed_at: DateTime<Utc>,
    pub headline: String,
    pub is_fraud: bool,
    pub plot: Result<String, ExplanationRenderFailure>,
    pub features: Vec<(String, f64)>,
}

impl Report {
    /// Build the report, drawing the attribution plot.
    ///
    /// A plot failure is kept as a warning; the rest of the report stands.
    pub fn from_analysis(analysis: &Analysis, settings: &ExplanationConfig) -> Self {
        let plot = render_attribution_svg(&analysis.attribution, settings);
        if let Err(e) = &plot {
            warn!(analysis_id = %analysis.analysis_id, error = %e, "Attribution plot skipped");
        }

        Self {
            analysis_id: analysis.analysis_id,
            analyzed_at: analysis.analyzed_at,
            headline: analysis.prediction.headline(),
            is_fraud: analysis.prediction.is_fraud(),
            plot,
            features: analysis
                .features
                .iter()
                .map(|(name, value)| (name.to_string(), value))
                .collect(),
        }
    }
}

/// Render the whole page.
///
/// `diagnostic` is the artifact load failure, shown above the form.
pub fn render_page(
    diagnostic: Option<&str>,
    form: &RawTransaction,
    outcome: Option<&Outcome>,
) -> String {
    let mut html = String::with_capacity(16 * 1024);

    let _ = write!(
        html,
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{TITLE}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n\
         <h1>{TITLE}</h1>\n\
         <p>Enter the details of a transaction to check whether the model flags it as \
         fraud. The attribution plot shows how each feature pushes the prediction away \
         from the model's baseline.</p>\n"
    );

    if let Some(reason) = diagnostic {
        let _ = write!(
            html,
            "<div class=\"error\">Model artifacts could not be loaded: {}. Place the \
             model and column files next to the server and restart it.</div>\n",
            escape(reason)
        );
    }

    render_form(&mut html, form);

    match outcome {
        Some(Outcome::Completed(report)) => render_report(&mut html, report),
        Some(Outcome::Failed(message)) => {
            let _ = write!(html, "<div class=\"error\">{}</div>\n", escape(message));
        }
        None => {}
    }

    html.push_str("</body>\n</html>\n");
    html
}

fn render_form(html: &mut String, form: &RawTransaction) {
    html.push_str("<form method=\"post\" action=\"/analyze\">\n");

    html.push_str("<label>Transaction type<select name=\"type\">");
    for tx_type in TransactionType::ALL {
        let selected = if tx_type == form.tx_type { " selected" } else { "" };
        let _ = write!(html, "<option value=\"{tx_type}\"{selected}>{tx_type}</option>");
    }
    html.push_str("</select></label>\n");

    number_input(html, "Amount", "amount", form.amount);
    let _ = write!(
        html,
        "<label>Step (hour)<input type=\"number\" name=\"step\" min=\"1\" step=\"1\" \
         value=\"{}\"></label>\n",
        form.step
    );
    number_input(html, "Sender balance before", "oldbalanceOrg", form.old_balance_orig);
    number_input(html, "Sender balance after", "newbalanceOrig", form.new_balance_orig);
    number_input(html, "Receiver balance before", "oldbalanceDest", form.old_balance_dest);
    number_input(html, "Receiver balance after", "newbalanceDest", form.new_balance_dest);

    html.push_str("<button type=\"submit\">Analyze transaction</button>\n</form>\n");
}

fn number_input(html: &mut String, label: &str, name: &str, value: f64) {
    let _ = write!(
        html,
        "<label>{label}<input type=\"number\" name=\"{name}\" min=\"0\" step=\"any\" \
         value=\"{value}\"></label>\n"
    );
}

fn render_report(html: &mut String, report: &Report) {
    let class = if report.is_fraud { "fraud" } else { "legit" };
    let _ = write!(
        html,
        "<h2>Model prediction</h2>\n<div class=\"banner {class}\">{}</div>\n",
        escape(&report.headline)
    );

    html.push_str(
        "<h2>Model explanation</h2>\n<p>Each bar shows how much one feature moves the \
         prediction from the baseline towards the final output.</p>\n",
    );
    match &report.plot {
        Ok(svg) => {
            let _ = write!(html, "<figure>{svg}</figure>\n");
        }
        Err(e) => {
            let _ = write!(html, "<div class=\"warning\">{}</div>\n", escape(&e.to_string()));
        }
    }

    html.push_str(
        "<details>\n<summary>Feature row passed to the model</summary>\n\
         <table>\n<tr><th>Feature</th><th>Value</th></tr>\n",
    );
    for (name, value) in &report.features {
        let _ = write!(
            html,
            "<tr><td>{}</td><td>{}</td></tr>\n",
            escape(name),
            format_value(*value)
        );
    }
    html.push_str("</table>\n</details>\n");

    let _ = write!(
        html,
        "<p class=\"meta\">Analysis {} at {}</p>\n",
        report.analysis_id,
        report.analyzed_at.to_rfc3339()
    );
}

/// Escape text for HTML element content and attribute values.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(is_fraud: bool, plot: Result<String, ExplanationRenderFailure>) -> Report {
        Report {
            analysis_id: Uuid::nil(),
            analyzed_at: Utc::now(),
            headline: if is_fraud {
                "Prediction: FRAUD (Probability: 72.31%)".to_string()
            } else {
                "Prediction: Not fraud (Probability: 51.00%)".to_string()
            },
            is_fraud,
            plot,
            features: vec![
                ("amount".to_string(), 5_000_000.0),
                ("type_TRANSFER".to_string(), 1.0),
            ],
        }
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("<a href=\"x\">&'"), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;");
    }

    #[test]
    fn test_form_is_prefilled() {
        let form = RawTransaction {
            tx_type: TransactionType::CashOut,
            amount: 181.5,
            ..RawTransaction::default()
        };
        let html = render_page(None, &form, None);

        assert!(html.contains("<option value=\"CASH_OUT\" selected>"));
        assert!(html.contains("name=\"amount\" min=\"0\" step=\"any\" value=\"181.5\""));
        assert!(html.contains("name=\"step\" min=\"1\" step=\"1\" value=\"10\""));
        assert!(!html.contains("class=\"error\""));
    }

    #[test]
    fn test_diagnostic_is_escaped() {
        let html = render_page(Some("file '<x>' not found"), &RawTransaction::default(), None);
        assert!(html.contains("file &#39;&lt;x&gt;&#39; not found"));
    }

    #[test]
    fn test_report_sections() {
        let outcome = Outcome::Completed(Box::new(report(true, Ok("<svg></svg>".to_string()))));
        let html = render_page(None, &RawTransaction::default(), Some(&outcome));

        assert!(html.contains("banner fraud\">Prediction: FRAUD (Probability: 72.31%)"));
        assert!(html.contains("<figure><svg></svg></figure>"));
        assert!(html.contains("<details>"));
        assert!(html.contains("<tr><td>amount</td><td>5000000</td></tr>"));
        assert!(html.contains("Analysis 00000000-0000-0000-0000-000000000000"));
    }

    #[test]
    fn test_plot_failure_keeps_banner() {
        let failure = ExplanationRenderFailure("backend failed".to_string());
        let outcome = Outcome::Completed(Box::new(report(false, Err(failure))));
        let html = render_page(None, &RawTransaction::default(), Some(&outcome));

        assert!(html.contains("banner legit"));
        assert!(html.contains("<div class=\"warning\">attribution plot could not be rendered"));
        assert!(!html.contains("<figure>"));
    }
}
