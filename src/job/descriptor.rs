use serde::{Deserialize, Serialize};

use crate::error::LauncherError;

/// Parameters for one training/testing run of the experiment jar.
///
/// Field order matches the positional arguments the jar expects; see
/// [`JobDescriptor::program_args`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDescriptor {
    /// Free-form label, never passed to the process.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trial: Option<String>,

    #[serde(default, alias = "jarFile")]
    pub jar_file: String,

    #[serde(default)]
    pub dataset: String,

    #[serde(default, alias = "algorithmID", alias = "algroithmID")]
    pub algorithm_id: String,

    #[serde(default, alias = "experimentID")]
    pub experiment_id: String,

    #[serde(default, alias = "parallelCores")]
    pub parallel_cores: String,

    #[serde(default, alias = "trainFile")]
    pub train_file: String,

    #[serde(default, alias = "testFile")]
    pub test_file: String,
}

impl JobDescriptor {
    /// The seven values forwarded to the jar, in positional order.
    pub fn program_args(&self) -> [&str; 7] {
        [
            &self.jar_file,
            &self.dataset,
            &self.algorithm_id,
            &self.experiment_id,
            &self.parallel_cores,
            &self.train_file,
            &self.test_file,
        ]
    }

    /// Checks that every required field is non-empty. `index` is the
    /// descriptor's position in its batch and is only used for reporting.
    pub fn validate(&self, index: usize) -> Result<(), LauncherError> {
        let fields = [
            ("jar_file", &self.jar_file),
            ("dataset", &self.dataset),
            ("algorithm_id", &self.algorithm_id),
            ("experiment_id", &self.experiment_id),
            ("parallel_cores", &self.parallel_cores),
            ("train_file", &self.train_file),
            ("test_file", &self.test_file),
        ];

        for (field, value) in fields {
            if value.trim().is_empty() {
                return Err(LauncherError::MissingField { index, field });
            }
        }
        Ok(())
    }

    /// Short name for logs and terminal output.
    pub fn label(&self) -> &str {
        self.trial.as_deref().unwrap_or(&self.experiment_id)
    }
}
