//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the pipeline and the model code stay free of presentation
//! - output changes are localized (the launcher forwards this text verbatim)

use crate::domain::{AnalysisKind, AnalysisReport, ModelParameters, PointResidual, RunOutput};
use crate::error::AppError;

/// Format a whole run: header, parameters, then one block per report.
pub fn format_run_output(run: &RunOutput) -> String {
    let mut out = String::new();

    out.push_str(&format!("=== phiz - {} ===\n", run.analysis.title()));
    out.push_str(&format!("Parameters: {}\n", fmt_params(&run.params)));
    out.push_str(&format!(
        "Generated: {}\n",
        run.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    for report in &run.reports {
        out.push('\n');
        out.push_str(&format_report(report));
    }

    out
}

/// Format one analysis report.
pub fn format_report(report: &AnalysisReport) -> String {
    let mut out = String::new();

    out.push_str(&format!("--- {} ---\n", report.analysis.title()));

    if let Some(ds) = &report.dataset {
        let errors = if ds.full_covariance {
            "full covariance"
        } else {
            "diagonal"
        };
        out.push_str(&format!(
            "Dataset: {} | n={} | z=[{:.3}, {:.3}] | errors: {errors}\n",
            ds.name, ds.n_points, ds.z_min, ds.z_max
        ));
    }

    if let Some(stat) = &report.statistic {
        out.push_str(&format!(
            "chi2 = {:.3} | dof = {} | chi2/dof = {:.3}",
            stat.chi2, stat.dof, stat.chi2_per_dof
        ));
        if let Some(doc) = report.documented_chi2_per_dof {
            out.push_str(&format!(" (documented: {doc:.3})"));
        }
        out.push('\n');
    } else if let Some(doc) = report.documented_chi2_per_dof {
        out.push_str(&format!("Documented chi2/dof: {doc:.3}\n"));
    }

    if !report.quantities.is_empty() {
        out.push_str("\nDerived quantities:\n");
        for q in &report.quantities {
            out.push_str(
                format!(
                    "- {:<32} {:>16} {}\n",
                    truncate(&q.label, 32),
                    fmt_value(q.value),
                    q.unit
                )
                .trim_end(),
            );
            out.push('\n');
        }
    }

    if !report.tensions.is_empty() {
        out.push_str("\nTensions:\n");
        for t in &report.tensions {
            out.push_str(&format!(
                "- {}: model={} observed={} ± {} -> {:.2} sigma\n",
                t.label,
                fmt_value(t.model),
                fmt_value(t.observed),
                fmt_value(t.sigma),
                t.n_sigma
            ));
        }
    }

    if !report.residuals.is_empty() {
        out.push_str("\nLargest pulls:\n");
        out.push_str(&format_residual_table(&report.residuals));
    }

    if !report.notes.is_empty() {
        out.push_str("\nNotes:\n");
        for note in &report.notes {
            out.push_str(&format!("- {note}\n"));
        }
    }

    out
}

/// Pretty-printed JSON of the structured results.
pub fn format_json(run: &RunOutput) -> Result<String, AppError> {
    serde_json::to_string_pretty(run)
        .map_err(|e| AppError::new(2, format!("Failed to serialise run output: {e}")))
}

/// The analysis catalogue printed by `phiz list`.
pub fn format_catalog() -> String {
    let mut out = String::new();
    out.push_str(
        format!(
            "{:<14} {:<26} {:>10} {:<34}\n",
            "id", "alias", "doc chi2", "title"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(format!("{:-<14} {:-<26} {:-<10} {:-<34}\n", "", "", "", "").trim_end());
    out.push('\n');

    for kind in AnalysisKind::ALL {
        let documented = kind
            .documented_chi2_per_dof()
            .map(|v| format!("{v:.3}"))
            .unwrap_or_else(|| "-".to_string());
        out.push_str(
            format!(
                "{:<14} {:<26} {:>10} {:<34}\n",
                kind.id(),
                kind.script_name(),
                documented,
                kind.title()
            )
            .trim_end(),
        );
        out.push('\n');
    }
    out
}

fn format_residual_table(rows: &[PointResidual]) -> String {
    let mut out = String::new();
    out.push_str(
        format!(
            "{:>8} {:<10} {:<9} {:>12} {:>12} {:>10} {:>8}\n",
            "z", "observable", "unit", "observed", "predicted", "sigma", "pull"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(
        format!(
            "{:->8} {:-<10} {:-<9} {:->12} {:->12} {:->10} {:->8}\n",
            "", "", "", "", "", "", ""
        )
        .trim_end(),
    );
    out.push('\n');

    for r in rows {
        out.push_str(
            format!(
                "{:>8.4} {:<10} {:<9} {:>12.4} {:>12.4} {:>10.4} {:>8.2}\n",
                r.z,
                r.observable.label(),
                r.observable.unit(),
                r.observed,
                r.predicted,
                r.sigma,
                r.pull
            )
            .trim_end(),
        );
        out.push('\n');
    }

    out
}

fn fmt_params(p: &ModelParameters) -> String {
    format!(
        "H0={} Om={} Gamma={} A1={} A2={} (OL={:.4})",
        p.h0,
        p.om,
        p.gamma,
        p.a1,
        p.a2,
        p.omega_lambda()
    )
}

/// Fixed notation for ordinary magnitudes, scientific for tiny or huge ones.
fn fmt_value(v: f64) -> String {
    let a = v.abs();
    if v == 0.0 || (1e-3..1e6).contains(&a) {
        format!("{v:.6}")
    } else {
        format!("{v:.6e}")
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DatasetSummary, FitStatistic, Observable, Quantity, Tension};
    use chrono::TimeZone;
    use chrono::Utc;

    fn sample_report() -> AnalysisReport {
        let mut report = AnalysisReport::new(AnalysisKind::Chronometers);
        report.dataset = Some(DatasetSummary {
            name: "Cosmic Chronometers H(z)".to_string(),
            n_points: 32,
            n_excluded: 0,
            z_min: 0.07,
            z_max: 1.965,
            full_covariance: false,
        });
        report.statistic = Some(FitStatistic {
            chi2: 27.0,
            dof: 27,
            chi2_per_dof: 1.0,
        });
        report.residuals.push(PointResidual {
            z: 0.17,
            observable: Observable::HubbleRate,
            observed: 83.0,
            predicted: 75.0,
            sigma: 8.0,
            pull: 1.0,
        });
        report.quantities.push(Quantity::new("sound horizon r_d", 147.0, "Mpc"));
        report.tensions.push(Tension {
            label: "theta*".to_string(),
            model: 0.0104,
            observed: 0.0104085,
            sigma: 0.000004,
            n_sigma: 2.5,
        });
        report
    }

    #[test]
    fn report_shows_computed_and_documented_statistic() {
        let text = format_report(&sample_report());
        assert!(text.contains("chi2/dof = 1.000 (documented: 0.997)"));
        assert!(text.contains("n=32"));
        assert!(text.contains("errors: diagonal"));
        assert!(text.contains("-> 2.50 sigma"));
        assert!(text.contains("Largest pulls:"));
        assert!(text.contains("H(z)       km/s/Mpc"));
        assert!(text.lines().all(|l| l == l.trim_end()));
    }

    #[test]
    fn run_output_has_header_and_json_roundtrips_kind() {
        let run = RunOutput {
            analysis: AnalysisKind::Galaxy2pcf,
            params: ModelParameters::GLOBAL_BEST_FIT,
            generated_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            reports: vec![sample_report()],
        };
        let text = format_run_output(&run);
        assert!(text.starts_with("=== phiz - Galaxy 2PCF Correlation Slope ==="));
        assert!(text.contains("Generated: 2025-01-01 00:00:00 UTC"));

        let json = format_json(&run).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["analysis"], "galaxy-2pcf");
        assert_eq!(value["reports"][0]["statistic"]["dof"], 27);
    }

    #[test]
    fn catalog_lists_every_analysis() {
        let text = format_catalog();
        for kind in AnalysisKind::ALL {
            assert!(text.contains(kind.id()));
            assert!(text.contains(kind.script_name()));
        }
    }

    #[test]
    fn values_switch_to_scientific_notation() {
        assert_eq!(fmt_value(147.0), "147.000000");
        assert_eq!(fmt_value(0.000004), "4.000000e-6");
        assert_eq!(fmt_value(0.0), "0.000000");
    }
}
