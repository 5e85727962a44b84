// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Appends one CSV row per evaluate() call to
// model_dir/eval_metrics.csv so the history of a model
// directory can be plotted later.
//
// Example CSV output:
//   global_step,num_examples,loss,average_loss,accuracy,precision,recall,auc,auc_precision_recall,prediction_mean,label_mean,accuracy_baseline
//   100,512,0.912300,0.912300,0.640000,0.610000,0.700000,0.690000,0.710000,0.520000,0.500000,0.500000

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use crate::ml::eval::EvalMetrics;

const CSV_FILE: &str = "eval_metrics.csv";
const CSV_HEADER: &str = "global_step,num_examples,loss,average_loss,accuracy,precision,recall,auc,auc_precision_recall,prediction_mean,label_mean,accuracy_baseline";

pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Writes the CSV header if the file doesn't exist yet.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create '{}'", dir.display()))?;

        let csv_path = dir.join(CSV_FILE);
        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)
                .with_context(|| format!("Cannot create '{}'", csv_path.display()))?;
            writeln!(f, "{CSV_HEADER}")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    pub fn log(&self, m: &EvalMetrics) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot open '{}'", self.csv_path.display()))?;

        writeln!(
            f,
            "{},{},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6}",
            m.global_step,
            m.num_examples,
            m.loss,
            m.average_loss,
            m.accuracy,
            m.precision,
            m.recall,
            m.auc,
            m.auc_precision_recall,
            m.prediction_mean,
            m.label_mean,
            m.accuracy_baseline,
        )?;

        tracing::debug!(
            "Logged eval metrics at step {}: loss={:.4}, accuracy={:.4}",
            m.global_step,
            m.loss,
            m.accuracy,
        );
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::eval::MetricsAccumulator;

    #[test]
    fn test_appends_rows_under_one_header() {
        let tmp = tempfile::tempdir().unwrap();
        let mut acc = MetricsAccumulator::new();
        acc.record(0.5, &[0.5], &[0.8], &[1.0]);
        let m = acc.finish(7);

        MetricsLogger::new(tmp.path()).unwrap().log(&m).unwrap();
        // a second logger on the same directory keeps appending
        let logger = MetricsLogger::new(tmp.path()).unwrap();
        logger.log(&m).unwrap();

        let csv = fs::read_to_string(logger.csv_path()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], CSV_HEADER);
        assert!(lines[1].starts_with("7,1,0.500000,0.500000,1.000000"));
        // one positive scored alone: ROC AUC undefined, average precision 1
        let columns: Vec<&str> = lines[1].split(',').collect();
        assert_eq!(columns.len(), CSV_HEADER.split(',').count());
        assert_eq!(columns[7], "0.000000");
        assert_eq!(columns[8], "1.000000");
    }
}
