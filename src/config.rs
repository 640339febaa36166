use anyhow::{anyhow, Context};
use std::path::PathBuf;

use crate::quiz::DEFAULT_SAMPLE_SIZE;

pub const DEFAULT_GRADES: [&str; 5] = ["Grade 4", "Grade 5", "Grade 6", "Grade 7", "Grade 8"];

#[derive(Debug, Clone)]
pub struct Config {
    /// Opened at startup when set; otherwise the shell sends `workspace.select`.
    pub workspace: Option<PathBuf>,
    pub sample_size: usize,
    pub seed_samples: bool,
    pub grades: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workspace: None,
            sample_size: DEFAULT_SAMPLE_SIZE,
            seed_samples: true,
            grades: DEFAULT_GRADES.iter().map(|g| g.to_string()).collect(),
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(get: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Config::default();
        let var = |key: &str| get(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(v) = var("QUIZD_WORKSPACE") {
            cfg.workspace = Some(PathBuf::from(v));
        }
        if let Some(v) = var("QUIZD_SAMPLE_SIZE") {
            let n: usize = v
                .parse()
                .with_context(|| format!("invalid QUIZD_SAMPLE_SIZE {:?}", v))?;
            if n == 0 {
                return Err(anyhow!("QUIZD_SAMPLE_SIZE must be at least 1"));
            }
            cfg.sample_size = n;
        }
        if let Some(v) = var("QUIZD_SEED_SAMPLES") {
            cfg.seed_samples = parse_boolish(&v)
                .ok_or_else(|| anyhow!("invalid QUIZD_SEED_SAMPLES {:?}", v))?;
        }
        if let Some(v) = var("QUIZD_GRADES") {
            let grades = v
                .split(',')
                .map(str::trim)
                .filter(|g| !g.is_empty())
                .map(str::to_string)
                .collect::<Vec<_>>();
            if grades.is_empty() {
                return Err(anyhow!("QUIZD_GRADES lists no grades"));
            }
            cfg.grades = grades;
        }
        Ok(cfg)
    }
}

pub fn parse_boolish(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}
