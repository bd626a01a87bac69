//! Path checks shared by the subcommands.

use camino::Utf8Path;

use crate::CliError;

/// Ensure `path` names an existing regular file.
pub(crate) fn require_existing(path: &Utf8Path, field: &'static str) -> Result<(), CliError> {
    match wrangle_fs::is_file(path) {
        Ok(true) => Ok(()),
        Ok(false) if wrangle_fs::exists(path).unwrap_or(false) => {
            Err(CliError::SourcePathNotFile {
                field,
                path: path.to_path_buf(),
            })
        }
        Ok(false) => Err(CliError::MissingSourceFile {
            field,
            path: path.to_path_buf(),
        }),
        Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
            Err(CliError::MissingSourceFile {
                field,
                path: path.to_path_buf(),
            })
        }
        Err(source) => Err(CliError::InspectSourcePath {
            field,
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Reject an output directory that already exists as a file.
pub(crate) fn require_output_dir(path: &Utf8Path) -> Result<(), CliError> {
    match wrangle_fs::is_file(path) {
        Ok(false) => Ok(()),
        Ok(true) => Err(CliError::OutputDirectoryNotDirectory {
            path: path.to_path_buf(),
        }),
        Err(source) if source.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(CliError::InspectSourcePath {
            field: crate::ARG_EXPORT_OUTPUT_DIR,
            path: path.to_path_buf(),
            source,
        }),
    }
}
