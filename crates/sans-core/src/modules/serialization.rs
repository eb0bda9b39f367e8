use crate::domain::{SansError, SansResult};
use crate::workspace::Workspace;
use std::fs;
use std::path::{Path, PathBuf};

pub const WORKSPACE_EXTENSION: &str = "json";

pub fn read_workspace(path: &Path) -> SansResult<Workspace> {
    let content = fs::read_to_string(path).map_err(|source| {
        SansError::io(
            "IO.WORKSPACE_READ",
            format!("failed to read workspace '{}': {}", path.display(), source),
        )
    })?;
    let workspace: Workspace = serde_json::from_str(&content).map_err(|source| {
        SansError::io(
            "IO.WORKSPACE_PARSE",
            format!("failed to parse workspace '{}': {}", path.display(), source),
        )
    })?;
    workspace.validate_shape()?;
    Ok(workspace)
}

pub fn write_workspace(path: &Path, workspace: &Workspace) -> SansResult<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| {
            SansError::io(
                "IO.OUTPUT_DIRECTORY",
                format!("failed to create '{}': {}", parent.display(), source),
            )
        })?;
    }
    let mut content = serde_json::to_string_pretty(workspace).map_err(|source| {
        SansError::internal(
            "INTERNAL.WORKSPACE_ENCODE",
            format!("failed to encode workspace '{}': {}", workspace.name, source),
        )
    })?;
    content.push('\n');
    fs::write(path, content).map_err(|source| {
        SansError::io(
            "IO.WORKSPACE_WRITE",
            format!("failed to write workspace '{}': {}", path.display(), source),
        )
    })
}

/// Writes `<dir>/<name>.json` and returns the path.
pub fn write_workspace_to_dir(dir: &Path, workspace: &Workspace) -> SansResult<PathBuf> {
    let path = dir.join(format!("{}.{}", workspace.name, WORKSPACE_EXTENSION));
    write_workspace(&path, workspace)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::{read_workspace, write_workspace, write_workspace_to_dir};
    use crate::domain::{ProcessType, SansErrorCategory};
    use crate::workspace::DetectorGrid;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn written_workspace_reads_back_identically() {
        let temp = TempDir::new().expect("tempdir should be created");
        let mut ws = DetectorGrid::new("D22", 3, 2).uniform_counts(4.0).build("water");
        ws.set_processed_as(ProcessType::Water);
        ws.mask_detector_ids(&[1]);

        let path = write_workspace_to_dir(temp.path(), &ws).expect("write should succeed");
        assert_eq!(path, temp.path().join("water.json"));
        let read = read_workspace(&path).expect("read should succeed");
        assert_eq!(read, ws);
    }

    #[test]
    fn repeated_writes_produce_identical_bytes() {
        let temp = TempDir::new().expect("tempdir should be created");
        let path = temp.path().join("nested").join("sample.json");
        let ws = DetectorGrid::new("D11", 2, 2).build("sample");

        write_workspace(&path, &ws).expect("first write should succeed");
        let first = fs::read(&path).expect("workspace should be readable");
        write_workspace(&path, &ws).expect("second write should succeed");
        let second = fs::read(&path).expect("workspace should be readable");
        assert_eq!(first, second);
    }

    #[test]
    fn missing_and_malformed_files_are_io_errors() {
        let temp = TempDir::new().expect("tempdir should be created");
        let missing = read_workspace(&temp.path().join("absent.json")).expect_err("missing");
        assert_eq!(missing.category(), SansErrorCategory::Io);

        let path = temp.path().join("broken.json");
        fs::write(&path, "{ not json").expect("fixture should be written");
        let broken = read_workspace(&path).expect_err("malformed");
        assert_eq!(broken.placeholder(), "IO.WORKSPACE_PARSE");
    }
}
