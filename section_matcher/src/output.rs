//! Persisted run record.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use anyhow::{Context, Result};
use ncc_register::Registration;
use serde::Serialize;

/// Everything a run reports, written once as JSON at the end.
#[derive(Debug, Serialize)]
pub struct RunRecord {
    pub elapsed_seconds: f64,
    pub angles_deg: [f64; 3],
    pub section_index: i64,
    pub correlation: f64,
    pub peak_row: usize,
    pub peak_col: usize,
    pub converged: bool,
    pub generations: usize,
    pub evaluations: usize,
    pub loss_history: Vec<f64>,
}

impl RunRecord {
    pub fn from_registration<T>(run: &Registration<T>) -> Self {
        Self {
            elapsed_seconds: run.elapsed.as_secs_f64(),
            angles_deg: [
                run.params.angles.theta_x,
                run.params.angles.theta_y,
                run.params.angles.theta_z,
            ],
            section_index: run.params.section,
            correlation: run.correlation,
            peak_row: run.peak_row,
            peak_col: run.peak_col,
            converged: run.status.is_converged(),
            generations: run.generations,
            evaluations: run.evaluations,
            loss_history: run.loss_history.clone(),
        }
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let file =
            File::create(path).with_context(|| format!("creating {}", path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)
            .with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_serializes_all_fields() {
        let record = RunRecord {
            elapsed_seconds: 12.5,
            angles_deg: [5.0, 0.25, -1.0],
            section_index: 130,
            correlation: 0.87,
            peak_row: 14,
            peak_col: 22,
            converged: true,
            generations: 40,
            evaluations: 2050,
            loss_history: vec![-0.5, -0.7, -0.87],
        };

        let json: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&record).unwrap()).unwrap();
        assert_eq!(json["section_index"], 130);
        assert_eq!(json["angles_deg"][0], 5.0);
        assert_eq!(json["converged"], true);
        assert_eq!(json["loss_history"].as_array().unwrap().len(), 3);
    }
}
