/// Parsers for the local sample metadata files
use std::fs;
use std::path::Path;
use crate::config::defs::PipelineError;
use crate::utils::sample::SampleMap;


/// Reads a file containing one `sample sex` pair per line.
///
/// # Arguments
///
/// * `path` - Local path to the sex file.
///
/// # Returns
/// SampleMap of sample id to sex label. Later duplicates overwrite earlier ones.
pub fn parse_sex_file<P: AsRef<Path>>(path: P) -> Result<SampleMap<String>, PipelineError> {
    let path = path.as_ref();
    let content = read_local(path)?;
    parse_sex_lines(&content, &path.display().to_string())
}

pub fn parse_sex_lines(content: &str, source_name: &str) -> Result<SampleMap<String>, PipelineError> {
    let mut sample_sexes = SampleMap::new();
    for (line_no, line) in content.lines().enumerate() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        match fields.as_slice() {
            [] => continue,
            [sample, sex] => {
                sample_sexes.insert(*sample, sex.to_string());
            }
            _ => {
                return Err(PipelineError::Parse {
                    source_name: source_name.to_string(),
                    message: format!(
                        "line {}: expected 'sample sex', found {} fields: '{}'",
                        line_no + 1,
                        fields.len(),
                        line
                    ),
                });
            }
        }
    }
    Ok(sample_sexes)
}

/// Reads a file containing one normal sample id per line.
pub fn parse_normal_sample_file<P: AsRef<Path>>(path: P) -> Result<Vec<String>, PipelineError> {
    let content = read_local(path.as_ref())?;
    Ok(parse_sample_list(&content))
}

pub fn parse_sample_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

fn read_local(path: &Path) -> Result<String, PipelineError> {
    fs::read_to_string(path)
        .map_err(|e| PipelineError::IOError(format!("Cannot read {}: {}", path.display(), e)))
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_sex_file() -> Result<(), PipelineError> {
        let mut tmp = NamedTempFile::new()?;
        writeln!(tmp, "X1_S1 M\nX2_S2\tF\n\nX3_S3   F")?;
        tmp.flush()?;

        let sexes = parse_sex_file(tmp.path())?;
        assert_eq!(sexes.len(), 3);
        assert_eq!(sexes.get("X1_S1").map(String::as_str), Some("M"));
        assert_eq!(sexes.get("X2_S2").map(String::as_str), Some("F"));
        assert_eq!(sexes.get("X3_S3").map(String::as_str), Some("F"));
        Ok(())
    }

    #[test]
    fn test_sex_file_duplicate_keeps_last() {
        let sexes = parse_sex_lines("X1_S1 M\nX1_S1 F\n", "sexes").unwrap();
        assert_eq!(sexes.len(), 1);
        assert_eq!(sexes.get("X1_S1").map(String::as_str), Some("F"));
    }

    #[test]
    fn test_sex_file_malformed_line() {
        let res = parse_sex_lines("X1_S1 M extra\n", "sexes");
        assert!(matches!(res, Err(PipelineError::Parse { .. })));
    }

    #[test]
    fn test_parse_normal_sample_file() -> Result<(), PipelineError> {
        let mut tmp = NamedTempFile::new()?;
        write!(tmp, "X1_S1\n X2_S2 \n\nX3_S3")?;
        tmp.flush()?;

        let normals = parse_normal_sample_file(tmp.path())?;
        assert_eq!(normals, vec!["X1_S1", "X2_S2", "X3_S3"]);
        Ok(())
    }

    #[test]
    fn test_missing_file() {
        let res = parse_normal_sample_file("/nonexistent/normals.txt");
        assert!(matches!(res, Err(PipelineError::IOError(_))));
    }
}
