//! Creates the empty model folder layout with a README in each folder

use crate::config::{ModelsConfig, REGRESSOR_FILE_NAME};
use commentscope_core::{Category, Result};
use std::path::{Path, PathBuf};

const BUNDLE_FILES: &[&str] = &[
    "config.json",
    "model.safetensors (or pytorch_model.bin)",
    "tokenizer.json",
    "tokenizer_config.json",
    "vocab.txt (or equivalent tokenizer files)",
];

/// Outcome of [`create_model_folders`]
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ScaffoldReport {
    /// Directories that did not exist before
    pub created: Vec<PathBuf>,
    /// Directories that were already present
    pub existing: Vec<PathBuf>,
    /// README files written (overwritten if present)
    pub readmes: Vec<PathBuf>,
    /// Folders that already hold model files
    pub populated: Vec<PathBuf>,
}

/// Create the emotion, sentiment and like-count folders described by `config`
pub fn create_model_folders(config: &ModelsConfig) -> Result<ScaffoldReport> {
    let mut report = ScaffoldReport::default();

    let folders = [
        (Category::Emotion, &config.emotion_dir),
        (Category::Sentiment, &config.sentiment_dir),
        (Category::LikeCount, &config.like_count_dir),
    ];

    for (category, dir) in folders {
        if dir.is_dir() {
            tracing::info!("Directory already exists: {}", dir.display());
            report.existing.push(dir.clone());
        } else {
            std::fs::create_dir_all(dir)?;
            tracing::info!("Created directory: {}", dir.display());
            report.created.push(dir.clone());
        }

        let readme = dir.join("README.md");
        std::fs::write(&readme, readme_contents(category))?;
        report.readmes.push(readme);

        if is_populated(dir) {
            report.populated.push(dir.clone());
        }
    }

    Ok(report)
}

fn readme_contents(category: Category) -> String {
    let (title, purpose) = match category {
        Category::Emotion => ("Emotion Model", "emotion classification"),
        Category::Sentiment => ("Sentiment Model", "sentiment classification"),
        Category::LikeCount => ("Like Count Prediction Model", "like count prediction"),
    };

    let mut out = format!("# {}\n\nThis folder holds the {} model.\n\n", title, purpose);

    out.push_str("## Required files\n");
    for file in BUNDLE_FILES {
        out.push_str(&format!("- {}\n", file));
    }
    if category == Category::LikeCount {
        out.push_str(&format!(
            "- {} (XGBoost model saved with `save_model`)\n",
            REGRESSOR_FILE_NAME
        ));
    }

    out.push_str("\n## Supported labels\n");
    for (index, label) in category.labels().labels().iter().enumerate() {
        match like_count_range(category, index) {
            Some(range) => out.push_str(&format!("- {} ({})\n", label, range)),
            None => out.push_str(&format!("- {}\n", label)),
        }
    }

    out.push_str("\nCopy your model files into this folder.\n");
    out
}

fn like_count_range(category: Category, index: usize) -> Option<&'static str> {
    if category != Category::LikeCount {
        return None;
    }
    match index {
        0 => Some("predicted value below 100"),
        1 => Some("100 to 500"),
        2 => Some("501 to 1500"),
        3 => Some("above 1500"),
        _ => None,
    }
}

/// Whether `dir` holds anything besides the scaffolded README
fn is_populated(dir: &Path) -> bool {
    std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .any(|e| e.file_name() != "README.md")
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_creates_folders_with_readmes() {
        let dir = TempDir::new().unwrap();
        let config = ModelsConfig::rooted_at(dir.path().join("models"));

        let report = create_model_folders(&config).unwrap();
        assert_eq!(report.created.len(), 3);
        assert!(report.existing.is_empty());
        assert_eq!(report.readmes.len(), 3);

        let emotion = std::fs::read_to_string(config.emotion_dir.join("README.md")).unwrap();
        assert!(emotion.starts_with("# Emotion Model"));
        assert!(emotion.contains("- surprise"));

        let like_count = std::fs::read_to_string(config.like_count_dir.join("README.md")).unwrap();
        assert!(like_count.contains("- viral (above 1500)"));
        assert!(like_count.contains(REGRESSOR_FILE_NAME));

        assert!(report.populated.is_empty());
    }

    #[test]
    fn test_second_run_reports_existing() {
        let dir = TempDir::new().unwrap();
        let config = ModelsConfig::rooted_at(dir.path());

        create_model_folders(&config).unwrap();
        std::fs::write(config.sentiment_dir.join("config.json"), "{}").unwrap();

        let report = create_model_folders(&config).unwrap();
        assert!(report.created.is_empty());
        assert_eq!(report.existing.len(), 3);
        assert_eq!(report.populated, vec![config.sentiment_dir.clone()]);
    }

    #[test]
    fn test_readme_layout() {
        let readme = readme_contents(Category::Sentiment);
        assert!(readme.starts_with("# Sentiment Model\n\nThis folder holds the sentiment classification model.\n\n## Required files\n- config.json\n"));
        assert!(readme.contains("\n## Supported labels\n- positive\n- negative\n- neutral\n"));
        assert!(readme.ends_with("\nCopy your model files into this folder.\n"));
        assert!(!readme.contains(REGRESSOR_FILE_NAME));
    }
}
