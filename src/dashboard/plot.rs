//! Static SVG waterfall of one attribution.
//!
//! Bars start at the baseline at the bottom and stack every contribution up
//! to the model output at the top; the largest pushes sit highest.

use crate::config::ExplanationConfig;
use crate::error::ExplanationRenderFailure;
use crate::models::explainer::Attribution;
use plotters::prelude::*;

const PUSH_UP: RGBColor = RGBColor(255, 0, 81);
const PUSH_DOWN: RGBColor = RGBColor(0, 139, 251);

/// One horizontal bar of the waterfall
#[derive(Debug, Clone, PartialEq)]
pub struct WaterfallBar {
    pub label: String,
    pub start: f64,
    pub shap_value: f64,
}

impl WaterfallBar {
    pub fn end(&self) -> f64 {
        self.start + self.shap_value
    }
}

/// Bars from bottom to top.
///
/// At most `max_display` bars; when features have to be dropped, the smallest
/// ones are summed into a single bottom bar.
pub fn waterfall_bars(attribution: &Attribution, max_display: usize) -> Vec<WaterfallBar> {
    let ranked = attribution.ranked();
    let keep = if ranked.len() > max_display {
        max_display.saturating_sub(1)
    } else {
        ranked.len()
    };

    let mut bars = Vec::with_capacity(keep + 1);
    let mut cursor = attribution.base_value;

    let rest = &ranked[keep..];
    if !rest.is_empty() {
        let folded: f64 = rest.iter().map(|c| c.shap_value).sum();
        bars.push(WaterfallBar {
            label: format!("{} other features", rest.len()),
            start: cursor,
            shap_value: folded,
        });
        cursor += folded;
    }

    for contribution in ranked[..keep].iter().rev() {
        bars.push(WaterfallBar {
            label: format!(
                "{} = {}",
                contribution.name,
                format_value(contribution.value)
            ),
            start: cursor,
            shap_value: contribution.shap_value,
        });
        cursor += contribution.shap_value;
    }

    bars
}

/// Render the waterfall as an SVG document.
pub fn render_attribution_svg(
    attribution: &Attribution,
    settings: &ExplanationConfig,
) -> Result<String, ExplanationRenderFailure> {
    let bars = waterfall_bars(attribution, settings.max_display);
    if bars.is_empty() {
        return Err(ExplanationRenderFailure(
            "attribution has no features".to_string(),
        ));
    }

    let base = attribution.base_value;
    let output = attribution.output_value;
    let mut xs = vec![base, output];
    for bar in &bars {
        xs.push(bar.start);
        xs.push(bar.end());
    }
    if xs.iter().any(|x| !x.is_finite()) {
        return Err(ExplanationRenderFailure(
            "attribution contains non-finite values".to_string(),
        ));
    }

    let lo = xs.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = xs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = if hi - lo > 0.0 { hi - lo } else { 1.0 };
    // Room on the right for the bar labels
    let x_range = (lo - 0.1 * span)..(hi + 0.6 * span);
    let rows = bars.len() as f64;

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (settings.width, settings.height))
            .into_drawing_area();
        root.fill(&WHITE).map_err(render_err)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(
                format!("f(x) = {output:.3}    E[f(x)] = {base:.3}"),
                ("sans-serif", 16).into_font(),
            )
            .margin(12)
            .x_label_area_size(40)
            .build_cartesian_2d(x_range, -0.6f64..(rows - 0.4))
            .map_err(render_err)?;

        chart
            .configure_mesh()
            .disable_y_mesh()
            .disable_y_axis()
            .x_desc("model output (log-odds)")
            .draw()
            .map_err(render_err)?;

        chart
            .draw_series(bars.iter().enumerate().map(|(i, bar)| {
                let y = i as f64;
                let colour = if bar.shap_value >= 0.0 { PUSH_UP } else { PUSH_DOWN };
                let (x0, x1) = (bar.start.min(bar.end()), bar.start.max(bar.end()));
                Rectangle::new([(x0, y - 0.35), (x1, y + 0.35)], colour.filled())
            }))
            .map_err(render_err)?;

        chart
            .draw_series(bars.iter().enumerate().map(|(i, bar)| {
                let right = bar.start.max(bar.end()) + 0.02 * span;
                Text::new(
                    format!("{}  ({:+.3})", bar.label, bar.shap_value),
                    (right, i as f64 + 0.15),
                    ("sans-serif", 12).into_font(),
                )
            }))
            .map_err(render_err)?;

        for (x, colour) in [(base, BLACK.mix(0.4)), (output, BLACK.mix(0.8))] {
            chart
                .draw_series(LineSeries::new(
                    vec![(x, -0.6), (x, rows - 0.4)],
                    colour,
                ))
                .map_err(render_err)?;
        }

        root.present().map_err(render_err)?;
    }

    Ok(svg)
}

fn render_err<E: std::fmt::Display>(e: E) -> ExplanationRenderFailure {
    ExplanationRenderFailure(e.to_string())
}

/// Whole numbers without decimals, everything else to two places.
pub fn format_value(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::explainer::FeatureContribution;

    fn attribution() -> Attribution {
        let contributions = vec![
            ("step", 10.0, 0.05),
            ("amount", 5_000_000.0, 0.9),
            ("type_TRANSFER", 1.0, 0.6),
            ("errorBalanceOrg", 0.0, -0.35),
            ("errorBalanceDest", 0.0, -0.02),
        ]
        .into_iter()
        .map(|(name, value, shap_value)| FeatureContribution {
            name: name.to_string(),
            value,
            shap_value,
        })
        .collect::<Vec<_>>();
        let total: f64 = contributions.iter().map(|c| c.shap_value).sum();

        Attribution {
            base_value: -1.0,
            output_value: -1.0 + total,
            contributions,
        }
    }

    #[test]
    fn test_bars_stack_from_base_to_output() {
        let attribution = attribution();
        let bars = waterfall_bars(&attribution, 10);

        assert_eq!(bars.len(), 5);
        assert_eq!(bars[0].start, -1.0);
        for pair in bars.windows(2) {
            assert!((pair[0].end() - pair[1].start).abs() < 1e-12);
        }
        let top = bars.last().unwrap();
        assert!((top.end() - attribution.output_value).abs() < 1e-12);
        assert_eq!(top.label, "amount = 5000000");
    }

    #[test]
    fn test_small_features_are_folded() {
        let attribution = attribution();
        let bars = waterfall_bars(&attribution, 3);

        assert_eq!(bars.len(), 3);
        assert_eq!(bars[0].label, "3 other features");
        assert!((bars[0].shap_value - (0.05 - 0.35 - 0.02)).abs() < 1e-12);
        assert!((bars[2].end() - attribution.output_value).abs() < 1e-12);
    }

    #[test]
    fn test_renders_svg() {
        let svg = render_attribution_svg(&attribution(), &ExplanationConfig::default()).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("type_TRANSFER = 1"));
    }

    #[test]
    fn test_non_finite_attribution_fails() {
        let mut attribution = attribution();
        attribution.contributions[0].shap_value = f64::NAN;
        assert!(render_attribution_svg(&attribution, &ExplanationConfig::default()).is_err());
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(5_010_000.0), "5010000");
        assert_eq!(format_value(0.126), "0.13");
        assert_eq!(format_value(0.5), "0.50");
        assert_eq!(format_value(-3.0), "-3");
    }
}
