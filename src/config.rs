//! Configuração do explaunch carregada a partir de `explaunch.toml`.
//!
//! A struct [`LauncherConfig`] contém os parâmetros da JVM e o tamanho
//! padrão do pool de workers. Valores não presentes no arquivo usam defaults.
//! A variável de ambiente `EXPLAUNCH_JAVA` tem precedência sobre o arquivo.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

const CONFIG_FILE: &str = "explaunch.toml";
const JAVA_ENV: &str = "EXPLAUNCH_JAVA";

/// Configuração de nível superior carregada de `explaunch.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct LauncherConfig {
    /// Executável usado para iniciar os jobs.
    #[serde(default = "default_java")]
    pub java: String,

    /// Heap inicial da JVM, passado como `-Xms<valor>`.
    #[serde(default = "default_min_heap")]
    pub min_heap: String,

    /// Heap máximo da JVM, passado como `-Xmx<valor>`.
    #[serde(default = "default_max_heap")]
    pub max_heap: String,

    /// Número de jobs executados simultaneamente.
    #[serde(default = "default_workers")]
    pub workers: usize,
}

fn default_java() -> String {
    "java".to_string()
}

fn default_min_heap() -> String {
    "1g".to_string()
}

fn default_max_heap() -> String {
    "8g".to_string()
}

fn default_workers() -> usize {
    4
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            java: default_java(),
            min_heap: default_min_heap(),
            max_heap: default_max_heap(),
            workers: default_workers(),
        }
    }
}

impl LauncherConfig {
    /// Carrega a configuração de `explaunch.toml` no diretório atual.
    /// Usa valores padrão se o arquivo não existir.
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new(CONFIG_FILE))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            toml::from_str::<LauncherConfig>(&contents)
                .with_context(|| format!("failed to parse {}", path.display()))?
        } else {
            Self::default()
        };

        // Variável de ambiente tem precedência sobre o arquivo.
        if let Ok(java) = std::env::var(JAVA_ENV)
            && !java.is_empty()
        {
            config.java = java;
        }

        Ok(config)
    }

    /// Flags fixas da JVM inseridas antes dos argumentos do job.
    pub fn jvm_args(&self) -> Vec<String> {
        vec![
            format!("-Xms{}", self.min_heap),
            format!("-Xmx{}", self.max_heap),
            "-jar".to_string(),
        ]
    }
}
