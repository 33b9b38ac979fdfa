pub mod excel;
pub mod pdf;

use std::path::{Path, PathBuf};

/// Resolves an output path: directories (or extension-less paths) get
/// `<stem>.<extension>` appended.
pub fn output_path_for(output: &Path, stem: &str, extension: &str) -> PathBuf {
    if output.is_dir() || output.extension().is_none() {
        output.join(format!("{}.{}", sanitize_file_stem(stem), extension))
    } else {
        output.to_path_buf()
    }
}

/// Replaces characters that are unsafe in file names.
pub fn sanitize_file_stem(stem: &str) -> String {
    let cleaned: String = stem
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_whitespace() => '_',
            c => c,
        })
        .collect();
    if cleaned.is_empty() {
        "report".to_string()
    } else {
        cleaned
    }
}

/// `maintenance-record-<transformer>-<record>`
pub fn report_stem(transformer_no: &str, record_id: Option<&str>) -> String {
    match record_id {
        Some(id) => format!("maintenance-record-{}-{}", transformer_no, id),
        None => format!("maintenance-record-{}", transformer_no),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_file_stem() {
        assert_eq!(sanitize_file_stem("T/100 a"), "T_100_a");
        assert_eq!(sanitize_file_stem("  "), "report");
    }

    #[test]
    fn test_output_path_for_file() {
        let p = output_path_for(Path::new("out/report.pdf"), "x", "pdf");
        assert_eq!(p, PathBuf::from("out/report.pdf"));
        let p = output_path_for(Path::new("out"), "T-1", "pdf");
        assert_eq!(p, PathBuf::from("out/T-1.pdf"));
    }
}
