//! File backends that open data files into a [`DataFile`]

use crate::file::DataFile;
use crate::node::{Node, NodeKind};
use crate::{Error, Result};
use std::path::Path;
use tracing::{debug, trace};

/// Opens data files of one on-disk format
pub trait FileBackend {
    /// Open and read the file at `path`
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be read or is not in the
    /// backend's format.
    fn open(&self, path: &Path) -> Result<DataFile>;
}

/// Backend for data trees serialized as JSON
///
/// The top-level JSON object is the root group:
///
/// ```json
/// {
///   "kind": "group",
///   "children": [
///     {"name": "entry", "kind": "group",
///      "attributes": [{"name": "NX_class", "value": "NXentry"}]}
///   ]
/// }
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBackend;

impl JsonBackend {
    pub fn new() -> Self {
        Self
    }

    /// Parse a JSON document into a data file
    ///
    /// # Errors
    ///
    /// Returns an error when the text is not a valid serialized tree or its
    /// top-level node is not a group.
    pub fn parse(&self, path: &Path, json: &str) -> Result<DataFile> {
        let root: Node = serde_json::from_str(json).map_err(|e| Error::Open {
            path: path.display().to_string(),
            message: format!("JSON parse error: {e}"),
        })?;

        if root.kind != NodeKind::Group {
            return Err(Error::Open {
                path: path.display().to_string(),
                message: format!("root node must be a group, found {}", root.kind),
            });
        }

        trace!("Parsed data tree with {} top-level nodes", root.children.len());
        Ok(DataFile::new(path, root))
    }
}

impl FileBackend for JsonBackend {
    fn open(&self, path: &Path) -> Result<DataFile> {
        debug!("Opening data file: {:?}", path);
        let content = std::fs::read_to_string(path).map_err(|e| Error::Open {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        self.parse(path, &content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal() {
        let backend = JsonBackend::new();
        let file = backend
            .parse(Path::new("mem.json"), r#"{"kind": "group", "children": []}"#)
            .unwrap();
        assert!(file.root().children.is_empty());
        assert_eq!(file.path(), Path::new("mem.json"));
    }

    #[test]
    fn test_parse_rejects_field_root() {
        let backend = JsonBackend::new();
        let err = backend
            .parse(Path::new("mem.json"), r#"{"kind": "field", "value": 1}"#)
            .unwrap_err();
        assert!(err.to_string().contains("root node must be a group"));
    }

    #[test]
    fn test_parse_invalid_json() {
        let backend = JsonBackend::new();
        let err = backend.parse(Path::new("mem.json"), "not json").unwrap_err();
        assert!(matches!(err, Error::Open { .. }));
    }

    #[test]
    fn test_open_missing_file() {
        let backend = JsonBackend::new();
        let result = backend.open(Path::new("/definitely/not/here.json"));
        assert!(matches!(result, Err(Error::Open { .. })));
    }
}
