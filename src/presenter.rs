//! HTML and text rendering of the form and its outcome.

use std::fmt::Write;

use crate::types::{
    Crop, CropInput, PredictionReport, Region, SoilType, WeatherCondition, DAYS_TO_HARVEST,
    FERTILIZER_USED, IRRIGATION_USED, RAINFALL_MM, REGION, SOIL_TYPE, TEMPERATURE_CELSIUS,
    WEATHER_CONDITION, CROP,
};

/// What goes under the form.
#[derive(Debug, Clone, Copy)]
pub enum Outcome<'a> {
    None,
    Report(&'a PredictionReport),
    Error(&'a str),
}

pub fn format_yield(value: f64) -> String {
    format!("{value:.2} tons / hectare")
}

/// One-line summary for logs and terminals.
pub fn summary(report: &PredictionReport) -> String {
    format!(
        "yield={} category={} progress={:.2}",
        format_yield(report.yield_tons_per_hectare),
        report.label,
        report.progress
    )
}

pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
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

const STYLE: &str = "body{font-family:sans-serif;max-width:40rem;margin:2rem auto;padding:0 1rem}\
fieldset{margin-bottom:1rem}label{display:block;margin:.4rem 0}\
.card{padding:1rem;border-radius:.5rem;margin-top:1rem}\
.low{background:#fde2e2}.medium{background:#fff4cc}.high{background:#dff5e1}\
.error{background:#fde2e2;border:1px solid #c33}progress{width:100%}";

/// The full page: form prefilled with `input`, followed by `outcome`.
pub fn page(input: &CropInput, outcome: Outcome<'_>) -> String {
    let mut html = String::new();
    html.push_str("<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"utf-8\">");
    html.push_str("<title>Crop Yield Predictor</title>");
    let _ = write!(html, "<style>{STYLE}</style></head><body>");
    html.push_str("<h1>🌾 Crop Yield Prediction System</h1>");
    html.push_str("<p>Predict crop yield using Machine Learning</p><hr>");
    html.push_str("<form method=\"post\" action=\"/predict\">");

    html.push_str("<fieldset><legend>🌍 Environmental Conditions</legend>");
    select(&mut html, "Region", REGION, Region::ALL, input.region);
    select(
        &mut html,
        "Weather Condition",
        WEATHER_CONDITION,
        WeatherCondition::ALL,
        input.weather_condition,
    );
    number(&mut html, "Rainfall (mm)", RAINFALL_MM, input.rainfall_mm, "0", "any");
    number(
        &mut html,
        "Temperature (°C)",
        TEMPERATURE_CELSIUS,
        input.temperature_celsius,
        "0",
        "any",
    );
    html.push_str("</fieldset>");

    html.push_str("<fieldset><legend>🌱 Crop Details</legend>");
    select(&mut html, "Soil Type", SOIL_TYPE, SoilType::ALL, input.soil_type);
    select(&mut html, "Crop", CROP, Crop::ALL, input.crop);
    number(
        &mut html,
        "Days to Harvest",
        DAYS_TO_HARVEST,
        f64::from(input.days_to_harvest),
        "1",
        "1",
    );
    html.push_str("</fieldset>");

    html.push_str("<fieldset><legend>🚜 Farming Practices</legend>");
    boolean(&mut html, "Fertilizer Used", FERTILIZER_USED, input.fertilizer_used);
    boolean(&mut html, "Irrigation Used", IRRIGATION_USED, input.irrigation_used);
    html.push_str("</fieldset>");

    html.push_str("<button type=\"submit\">🚀 Predict Yield</button></form>");

    match outcome {
        Outcome::None => {}
        Outcome::Report(report) => result_card(&mut html, report),
        Outcome::Error(msg) => {
            let _ = write!(
                html,
                "<div class=\"card error\" role=\"alert\"><strong>Prediction failed:</strong> {}</div>",
                escape(msg)
            );
        }
    }

    html.push_str("</body></html>");
    html
}

/// Result, category, advisory and progress bar, in that order.
fn result_card(html: &mut String, report: &PredictionReport) {
    let _ = write!(
        html,
        "<div class=\"card {}\" id=\"result\"><h2>📦 Prediction Result</h2>",
        report.category.css_class()
    );
    let _ = write!(
        html,
        "<p>🌾 <strong>Predicted Crop Yield:</strong> <span id=\"yield\">{}</span></p>",
        format_yield(report.yield_tons_per_hectare)
    );
    let _ = write!(
        html,
        "<p>📊 <strong>Yield Category:</strong> <span id=\"category\">{} {}</span></p>",
        report.category.marker(),
        report.label
    );
    let _ = write!(html, "<p id=\"advisory\">{}</p>", escape(report.advisory));
    let _ = write!(
        html,
        "<progress id=\"progress\" max=\"1\" value=\"{:.4}\"></progress></div>",
        report.progress
    );
}

fn select<T: Copy + PartialEq + std::fmt::Display>(
    html: &mut String,
    label: &str,
    name: &str,
    options: &[T],
    current: T,
) {
    let _ = write!(html, "<label>{label} <select name=\"{name}\">");
    for opt in options {
        let selected = if *opt == current { " selected" } else { "" };
        let _ = write!(html, "<option value=\"{opt}\"{selected}>{opt}</option>");
    }
    html.push_str("</select></label>");
}

fn number(html: &mut String, label: &str, name: &str, value: f64, min: &str, step: &str) {
    let _ = write!(
        html,
        "<label>{label} <input type=\"number\" name=\"{name}\" value=\"{value}\" min=\"{min}\" step=\"{step}\" required></label>"
    );
}

fn boolean(html: &mut String, label: &str, name: &str, current: bool) {
    let _ = write!(html, "<label>{label} <select name=\"{name}\">");
    for opt in [true, false] {
        let selected = if opt == current { " selected" } else { "" };
        let text = if opt { "True" } else { "False" };
        let _ = write!(html, "<option value=\"{opt}\"{selected}>{text}</option>");
    }
    html.push_str("</select></label>");
}
