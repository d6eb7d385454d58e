//! Saída de terminal do explaunch com cores.
//!
//! Usa a crate `console` para estilização. O [`BatchPrinter`] imprime uma
//! linha por job na ordem de entrada e um resumo ao final do lote.

use console::Style;

use crate::job::{JobDescriptor, JobOutcome, JobState};
use crate::report::BatchReport;

/// Impressora dos resultados de um lote no terminal.
///
/// Sucesso em verde, falha em vermelho e falha de inicialização em amarelo.
pub struct BatchPrinter {
    green: Style,
    red: Style,
    yellow: Style,
    dim: Style,
}

impl Default for BatchPrinter {
    fn default() -> Self {
        Self {
            green: Style::new().green().bold(),
            red: Style::new().red().bold(),
            yellow: Style::new().yellow(),
            dim: Style::new().dim(),
        }
    }
}

impl BatchPrinter {
    /// Imprime o resultado de cada job, na mesma ordem do lote.
    pub fn print_outcomes(&self, jobs: &[JobDescriptor], outcomes: &[JobOutcome]) {
        for (index, (job, outcome)) in jobs.iter().zip(outcomes).enumerate() {
            println!("{}", self.outcome_line(index, job, outcome));
        }
    }

    fn outcome_line(&self, index: usize, job: &JobDescriptor, outcome: &JobOutcome) -> String {
        let (mark, style) = match outcome.state() {
            JobState::Succeeded => ("✓", &self.green),
            JobState::LaunchFailed => ("!", &self.yellow),
            _ => ("✗", &self.red),
        };
        format!(
            "  {} {} {} {outcome}",
            style.apply_to(mark),
            self.dim.apply_to(format!("[{index:>3}]")),
            job.label(),
        )
    }

    /// Imprime o resumo do lote.
    pub fn print_summary(&self, report: &BatchReport) {
        println!();
        println!(
            "{} succeeded, {} failed, {} could not start ({} ms, {} workers)",
            self.green.apply_to(report.succeeded),
            self.red.apply_to(report.failed),
            self.yellow.apply_to(report.launch_failed),
            report.duration_ms,
            report.workers,
        );
    }

    /// Imprime a linha de comando que um job executaria.
    pub fn print_command(&self, index: usize, argv: &[String]) {
        println!("{} {}", self.dim.apply_to(format!("[{index:>3}]")), argv.join(" "));
    }
}
