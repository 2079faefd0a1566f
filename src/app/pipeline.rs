//! Shared analysis pipeline used by the CLI (and, through a subprocess, by the
//! launcher).
//!
//! Every analysis is a thin composition of:
//! dataset adapter -> model evaluator -> statistic engine -> report record
//!
//! Nothing here prints; the report emitter owns presentation.

use chrono::Utc;
use rayon::prelude::*;

use crate::data::{self, PowerSpectrum};
use crate::domain::{
    AnalysisKind, AnalysisReport, Dataset, FitStatistic, ModelParameters, PointResidual, Quantity,
    RunConfig, RunOutput, Tension,
};
use crate::error::{AppError, CosmoError};
use crate::fit::{
    DEFAULT_N_PARAMETERS, chi_squared_covariance, chi_squared_diagonal, reduced_chi_squared,
    tension_sigma,
};
use crate::math::invert_covariance;
use crate::models::constants::{
    FIDUCIAL_SOUND_HORIZON, GAMMA_SLOPE_REDSHIFTS, PLANCK_THETA_STAR,
    PLANCK_THETA_STAR_COMPRESSED, SHOES_H0, SHOES_H0_SIGMA, ThetaStarReference, Z_CLUSTER_ERA,
};
use crate::models::{
    acoustic_angular_scale, cluster_deficit_percent, comoving_distance, comoving_distance_with,
    correlation_slope, fractal_dimension, hubble_rate_lcdm, predict, sound_horizon_for,
    volume_averaged_distance,
};
use crate::report::rank_by_pull;

/// A dataset evaluated against the model.
#[derive(Debug, Clone)]
pub struct DatasetFit {
    pub statistic: FitStatistic,
    pub residuals: Vec<PointResidual>,
}

/// Run one analysis and collect its structured results.
pub fn run_analysis(kind: AnalysisKind, config: &RunConfig) -> Result<RunOutput, AppError> {
    config.params.validate()?;

    let reports = match kind {
        AnalysisKind::Chronometers => vec![chronometers(config)?],
        AnalysisKind::Bao => vec![bao(config)?],
        AnalysisKind::Snia => vec![snia(config)?],
        AnalysisKind::Cmb => vec![cmb(config)?],
        AnalysisKind::Clusters => vec![clusters(&config.params)?],
        AnalysisKind::Galaxy2pcf => vec![galaxy_2pcf()],
        AnalysisKind::Summary => summary(config)?,
    };

    Ok(RunOutput {
        analysis: kind,
        params: config.params,
        generated_at: Utc::now(),
        reports,
    })
}

/// Predict every point, compute chi² (diagonal or full covariance) and residuals.
///
/// Points are evaluated in parallel; the prediction vector keeps dataset order.
pub fn fit_dataset(
    dataset: &Dataset,
    params: &ModelParameters,
    sound_horizon: f64,
    n_parameters: usize,
) -> Result<DatasetFit, CosmoError> {
    let predicted: Vec<f64> = dataset
        .points
        .par_iter()
        .map(|p| predict(p.observable, p.z, params, sound_horizon))
        .collect::<Result<_, _>>()?;

    let observed = dataset.observed();
    let chi2 = match &dataset.covariance {
        Some(cov) => {
            let inv = invert_covariance(cov)?;
            chi_squared_covariance(&observed, &predicted, &inv)?
        }
        None => chi_squared_diagonal(&observed, &predicted, &dataset.sigmas())?,
    };
    let statistic = reduced_chi_squared(chi2, dataset.len(), n_parameters)?;

    let residuals = dataset
        .points
        .iter()
        .zip(&predicted)
        .map(|(p, &pred)| PointResidual {
            z: p.z,
            observable: p.observable,
            observed: p.observed,
            predicted: pred,
            sigma: p.sigma,
            pull: (p.observed - pred) / p.sigma,
        })
        .collect();

    log::debug!(
        "{}: chi2={:.6} dof={} over {} points",
        dataset.name,
        statistic.chi2,
        statistic.dof,
        dataset.len()
    );
    Ok(DatasetFit {
        statistic,
        residuals,
    })
}

fn fitted_report(
    kind: AnalysisKind,
    dataset: &Dataset,
    fit: DatasetFit,
    top_n: usize,
) -> AnalysisReport {
    let mut report = AnalysisReport::new(kind);
    report.dataset = Some(dataset.summary());
    report.statistic = Some(fit.statistic);
    report.residuals = rank_by_pull(&fit.residuals, top_n);
    report
}

fn chronometers(config: &RunConfig) -> Result<AnalysisReport, CosmoError> {
    let dataset = data::cosmic_chronometers()?;
    let rd = sound_horizon_for(&config.params);
    let fit = fit_dataset(&dataset, &config.params, rd, DEFAULT_N_PARAMETERS)?;
    Ok(fitted_report(
        AnalysisKind::Chronometers,
        &dataset,
        fit,
        config.top_n,
    ))
}

fn bao(config: &RunConfig) -> Result<AnalysisReport, CosmoError> {
    let params = &config.params;
    let dataset = data::desi_bao()?;
    let rd = sound_horizon_for(params);

    // Parameters were not fitted to these three points.
    let fit = fit_dataset(&dataset, params, rd, 0)?;
    let mut report = fitted_report(AnalysisKind::Bao, &dataset, fit, config.top_n);

    report
        .quantities
        .push(Quantity::new("sound horizon r_d", rd, "Mpc"));
    report.quantities.push(Quantity::new(
        "r_d / fiducial 147 Mpc",
        rd / FIDUCIAL_SOUND_HORIZON,
        "",
    ));
    let z_dv = dataset.points[0].z;
    report.quantities.push(Quantity::new(
        format!("D_V(z={z_dv})"),
        volume_averaged_distance(z_dv, params)?,
        "Mpc",
    ));
    Ok(report)
}

fn snia(config: &RunConfig) -> Result<AnalysisReport, CosmoError> {
    let dataset = data::load_pantheon(&config.data_dir)?;
    let rd = sound_horizon_for(&config.params);
    let fit = fit_dataset(&dataset, &config.params, rd, DEFAULT_N_PARAMETERS)?;
    let mut report = fitted_report(AnalysisKind::Snia, &dataset, fit, config.top_n);
    report.notes.push(format!(
        "{} Cepheid calibrators excluded from catalogue and covariance",
        dataset.excluded.len()
    ));
    Ok(report)
}

fn theta_star_tension(
    params: &ModelParameters,
    reference: &ThetaStarReference,
) -> Result<(Tension, f64), CosmoError> {
    let theta = acoustic_angular_scale(reference.z, params)?;
    let dc = comoving_distance(reference.z, params)?;
    let tension = Tension {
        label: reference.label.to_string(),
        model: theta,
        observed: reference.theta,
        sigma: reference.sigma,
        n_sigma: tension_sigma(theta, reference.theta, reference.sigma),
    };
    Ok((tension, dc))
}

fn cmb(config: &RunConfig) -> Result<AnalysisReport, CosmoError> {
    let params = &config.params;
    let mut report = AnalysisReport::new(AnalysisKind::Cmb);

    let rd = sound_horizon_for(params);
    let (tension, dc) = theta_star_tension(params, &PLANCK_THETA_STAR)?;
    report
        .quantities
        .push(Quantity::new("sound horizon r_d", rd, "Mpc"));
    report.quantities.push(Quantity::new(
        format!("D_C(z={})", PLANCK_THETA_STAR.z),
        dc,
        "Mpc",
    ));
    report
        .quantities
        .push(Quantity::new("theta* model", tension.model, "rad"));
    report.tensions.push(tension);

    match data::load_spectrum(&config.data_dir)? {
        Some(spectrum) => push_spectrum_summary(&mut report, &spectrum),
        None => {
            let path = config.data_dir.join(data::SPECTRUM_FILE);
            log::warn!("{} not found; skipping TT spectrum", path.display());
            report.notes.push(format!(
                "TT spectrum not loaded ({} not found); theta* check unaffected",
                path.display()
            ));
        }
    }
    Ok(report)
}

fn push_spectrum_summary(report: &mut AnalysisReport, spectrum: &PowerSpectrum) {
    report.quantities.push(Quantity::new(
        "TT spectrum multipoles",
        spectrum.len() as f64,
        "",
    ));
    if let Some(peak) = spectrum.peak() {
        report
            .quantities
            .push(Quantity::new("TT first peak ell", peak.ell, ""));
        report
            .quantities
            .push(Quantity::new("TT first peak D_ell", peak.dl, "uK^2"));
    }
}

fn clusters(params: &ModelParameters) -> Result<AnalysisReport, CosmoError> {
    let mut report = AnalysisReport::new(AnalysisKind::Clusters);
    let z = Z_CLUSTER_ERA;

    let dc_fractal = comoving_distance(z, params)?;
    let dc_lcdm = comoving_distance_with(z, |x| hubble_rate_lcdm(x, params.h0, params.om))?;
    let volume_ratio = (dc_fractal / dc_lcdm).powi(3);
    let phi = fractal_dimension(z, params.gamma, params.a1, params.a2);
    let deficit = cluster_deficit_percent(z, params.gamma, params.a1, params.a2);

    report.quantities.extend([
        Quantity::new(format!("D_C fractal (z={z})"), dc_fractal, "Mpc"),
        Quantity::new(format!("D_C LCDM (z={z})"), dc_lcdm, "Mpc"),
        Quantity::new("volume fractal", dc_fractal.powi(3) / 1e9, "Gpc^3 (prop.)"),
        Quantity::new("volume LCDM", dc_lcdm.powi(3) / 1e9, "Gpc^3 (prop.)"),
        Quantity::new("volume ratio fractal/LCDM", volume_ratio, ""),
        Quantity::new(format!("phi(z={z})"), phi, ""),
        Quantity::new("massive cluster deficit", deficit, "%"),
    ]);
    Ok(report)
}

fn galaxy_2pcf() -> AnalysisReport {
    let mut report = AnalysisReport::new(AnalysisKind::Galaxy2pcf);
    for z in GAMMA_SLOPE_REDSHIFTS {
        report
            .quantities
            .push(Quantity::new(format!("gamma(z={z})"), correlation_slope(z), ""));
    }
    report
}

fn summary(config: &RunConfig) -> Result<Vec<AnalysisReport>, CosmoError> {
    let params = &config.params;
    let cc = chronometers(config)?;
    let bao = bao(config)?;

    let mut report = AnalysisReport::new(AnalysisKind::Summary);
    report.tensions.push(Tension {
        label: "H0 vs SH0ES".to_string(),
        model: params.h0,
        observed: SHOES_H0,
        sigma: SHOES_H0_SIGMA,
        n_sigma: tension_sigma(params.h0, SHOES_H0, SHOES_H0_SIGMA),
    });

    let (theta, _) = theta_star_tension(params, &PLANCK_THETA_STAR_COMPRESSED)?;
    report.tensions.push(theta);

    let rd = sound_horizon_for(params);
    report.quantities.extend([
        Quantity::new("sound horizon r_d", rd, "Mpc"),
        Quantity::new(
            "massive cluster deficit",
            cluster_deficit_percent(Z_CLUSTER_ERA, params.gamma, params.a1, params.a2),
            "%",
        ),
    ]);
    for (label, stat) in [
        ("chronometers chi2/dof", cc.statistic),
        ("BAO chi2/dof", bao.statistic),
    ] {
        if let Some(stat) = stat {
            report.quantities.push(Quantity::new(label, stat.chi2_per_dof, ""));
        }
    }

    Ok(vec![cc, bao, report])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ObservationPoint, Observable};
    use nalgebra::DMatrix;

    fn config() -> RunConfig {
        RunConfig::new(ModelParameters::GLOBAL_BEST_FIT, "/nonexistent/phiz-data")
    }

    fn close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() < tol
    }

    #[test]
    fn chronometer_statistic_is_pinned() {
        let out = run_analysis(AnalysisKind::Chronometers, &config()).unwrap();
        let stat = out.reports[0].statistic.unwrap();
        assert_eq!(stat.dof, 27);
        assert!(close(stat.chi2, 9900.378, 0.01), "chi2={}", stat.chi2);
        assert!(close(stat.chi2_per_dof, 366.681, 0.01));
        assert_eq!(out.reports[0].residuals.len(), 5);
    }

    #[test]
    fn bao_statistic_uses_all_points_as_dof() {
        let out = run_analysis(AnalysisKind::Bao, &config()).unwrap();
        let report = &out.reports[0];
        let stat = report.statistic.unwrap();
        assert_eq!(stat.dof, 3);
        assert!(stat.chi2_per_dof.is_finite() && stat.chi2_per_dof > 0.0);
        assert!(close(stat.chi2_per_dof, 2125.681, 0.01));
        assert!(close(report.quantities[0].value, 147.0, 1e-9));
    }

    #[test]
    fn snia_without_files_is_a_data_source_error() {
        let err = run_analysis(AnalysisKind::Snia, &config()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.message().contains("Pantheon+SH0ES.dat"));
    }

    #[test]
    fn cmb_runs_without_spectrum_file() {
        let out = run_analysis(AnalysisKind::Cmb, &config()).unwrap();
        let report = &out.reports[0];
        assert_eq!(report.tensions.len(), 1);
        assert!(close(report.tensions[0].model, 0.0504670, 1e-6));
        assert!(report.tensions[0].n_sigma > 1000.0);
        assert_eq!(report.notes.len(), 1);
    }

    #[test]
    fn cmb_aborts_on_malformed_spectrum() {
        let dir = std::env::temp_dir().join(format!("phiz-cmb-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(data::SPECTRUM_FILE), "2 garbage 1 1\n").unwrap();
        let cfg = RunConfig::new(ModelParameters::GLOBAL_BEST_FIT, dir.clone());
        let err = run_analysis(AnalysisKind::Cmb, &cfg).unwrap_err();
        std::fs::remove_dir_all(&dir).ok();
        assert_eq!(err.exit_code(), 2);
        assert!(err.message().contains("line 1"), "{}", err.message());
    }

    #[test]
    fn cluster_deficit_matches_volume_inputs() {
        let out = run_analysis(AnalysisKind::Clusters, &config()).unwrap();
        let q = &out.reports[0].quantities;
        assert!(close(q[0].value, 1511.3795, 1e-3));
        assert!(close(q[1].value, 2110.9873, 1e-3));
        assert!(close(q[6].value, -26.6293, 1e-3));
    }

    #[test]
    fn galaxy_slopes_decrease_with_redshift() {
        let out = run_analysis(AnalysisKind::Galaxy2pcf, &config()).unwrap();
        let values: Vec<f64> = out.reports[0].quantities.iter().map(|q| q.value).collect();
        assert_eq!(values.len(), 3);
        assert!(values.windows(2).all(|w| w[0] > w[1]));
        assert!(close(values[0], 1.177084, 1e-6));
    }

    #[test]
    fn summary_collects_three_reports() {
        let out = run_analysis(AnalysisKind::Summary, &config()).unwrap();
        assert_eq!(out.reports.len(), 3);
        let summary = &out.reports[2];
        assert_eq!(summary.tensions[0].n_sigma, 0.0);
        assert!(close(summary.tensions[1].n_sigma, 801.12, 0.01));
        assert_eq!(summary.documented_chi2_per_dof, Some(0.951));
    }

    #[test]
    fn invalid_parameters_abort_before_any_work() {
        let mut cfg = config();
        cfg.params.om = 1.5;
        let err = run_analysis(AnalysisKind::Galaxy2pcf, &cfg).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn covariance_fit_matches_diagonal_fit_for_diagonal_matrix() {
        let params = ModelParameters::GLOBAL_BEST_FIT;
        let points = vec![
            ObservationPoint::new(0.1, 38.3, 0.2, Observable::DistanceModulus),
            ObservationPoint::new(0.5, 42.0, 0.3, Observable::DistanceModulus),
            ObservationPoint::new(1.0, 44.0, 0.4, Observable::DistanceModulus),
            ObservationPoint::new(1.2, 44.5, 0.4, Observable::DistanceModulus),
            ObservationPoint::new(1.4, 45.0, 0.5, Observable::DistanceModulus),
            ObservationPoint::new(1.6, 45.3, 0.5, Observable::DistanceModulus),
        ];
        let diag = Dataset::new("diag", points.clone()).unwrap();
        let cov = DMatrix::from_fn(6, 6, |i, j| {
            if i == j { points[i].sigma * points[i].sigma } else { 0.0 }
        });
        let full = Dataset::new("full", points).unwrap().with_covariance(cov, vec![]).unwrap();

        let a = fit_dataset(&diag, &params, 147.0, DEFAULT_N_PARAMETERS).unwrap();
        let b = fit_dataset(&full, &params, 147.0, DEFAULT_N_PARAMETERS).unwrap();
        assert!(close(a.statistic.chi2, b.statistic.chi2, 1e-8));
        assert_eq!(a.statistic.dof, 1);
    }
}
