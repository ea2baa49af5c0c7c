//! Class-name lists for detectors (one name per line, `coco.names` style).

use crate::{Error, Result};
use std::path::Path;

pub fn parse_labels(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

pub fn load_labels(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)
        .map_err(|e| Error::Io(format!("{}: {e}", path.display())))?;
    let labels = parse_labels(&contents);
    if labels.is_empty() {
        return Err(Error::Io(format!("{}: no class names", path.display())));
    }
    tracing::debug!("Loaded {} class names from {}", labels.len(), path.display());
    Ok(labels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_skips_blank_and_comments() {
        let labels = parse_labels("# coco\nperson\n\n bicycle \ncar\n");
        assert_eq!(labels, vec!["person", "bicycle", "car"]);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "person\nchair").unwrap();
        let labels = load_labels(file.path()).unwrap();
        assert_eq!(labels, vec!["person", "chair"]);
    }

    #[test]
    fn test_empty_file_is_error() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert!(load_labels(file.path()).is_err());
    }
}
