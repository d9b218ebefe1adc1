use serde::{Deserialize, Serialize};

/// Per-file metrics computed by the file analyzer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileMetrics {
    pub path: String,
    pub total_lines: u64,
    pub code_lines: u64,
    pub comment_lines: u64,
    pub blank_lines: u64,
    pub functions: u64,
    pub classes: u64,
    pub imports: u64,
    pub exports: u64,
    pub max_nesting_depth: u64,
    pub size_bytes: u64,
    pub complexity_score: u64,
    pub oversized: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileSizeEntry {
    pub path: String,
    pub size_bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileScoreEntry {
    pub path: String,
    pub score: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub files_analyzed: u64,
    pub skipped_files: u64,
    pub average_complexity: f64,
    pub large_file_count: u64,
    pub complex_file_count: u64,
    /// Largest offenders only, capped for report size.
    pub large_files: Vec<FileSizeEntry>,
    pub complex_files: Vec<FileScoreEntry>,
}
