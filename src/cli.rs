//! Interface de linha de comando do explaunch baseada em clap.
//!
//! Define a struct [`Cli`] com subcomandos [`Command`] (run, plan)
//! e flags globais (--java, --verbose).

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// explaunch — executa lotes de experimentos JVM em paralelo.
#[derive(Debug, Parser)]
#[command(name = "explaunch", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Executável Java a usar (sobrepõe `explaunch.toml` e `EXPLAUNCH_JAVA`).
    #[arg(long, global = true)]
    pub java: Option<String>,

    /// Habilita saída detalhada (verbose).
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Executa todos os jobs de um arquivo de lote.
    Run {
        /// Arquivo de lote em TOML ou JSON.
        batch: PathBuf,

        /// Número de jobs executados ao mesmo tempo.
        #[arg(long, short)]
        workers: Option<usize>,

        /// Pula os primeiros N jobs do lote (retomar uma execução interrompida).
        #[arg(long, default_value_t = 0)]
        skip: usize,

        /// Grava um relatório JSON do lote neste caminho.
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Mostra a linha de comando de cada job sem executar nada.
    Plan {
        /// Arquivo de lote em TOML ou JSON.
        batch: PathBuf,

        /// Pula os primeiros N jobs do lote.
        #[arg(long, default_value_t = 0)]
        skip: usize,
    },
}
