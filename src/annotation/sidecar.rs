/// Sidecar persistence for the geometry store
///
/// One JSON record per (image, frame): `<image dir>/<image name>/<frame>.txt`
/// holding the four kind collections (`line`, `rectangle`, `circle`,
/// `freehand`), each possibly empty.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::store::GeometryStore;

#[derive(Error, Debug)]
pub enum SidecarError {
    #[error("no annotation sidecar at {}", .0.display())]
    NotFound(PathBuf),
    #[error("malformed annotation sidecar {}: {source}", .path.display())]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("could not serialize annotations: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl SidecarError {
    /// Missing sidecars just mean "no prior annotations".
    pub fn is_not_found(&self) -> bool {
        matches!(self, SidecarError::NotFound(_))
    }
}

/// Directory holding all sidecars of one image: a sibling folder named
/// after the image file up to its first dot (`scan.dcm` → `scan/`).
/// Files without an extension get `<name>_annotations/` instead.
pub fn sidecar_dir(image_path: &Path) -> PathBuf {
    let file_name = image_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let base = match file_name.split('.').next() {
        Some(b) if !b.is_empty() => b.to_string(),
        _ => image_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "annotations".to_string()),
    };
    // Extensionless files (common for DICOM) would collide with the image itself
    let base = if base == file_name {
        format!("{}_annotations", base)
    } else {
        base
    };
    let parent = image_path.parent().unwrap_or_else(|| Path::new(""));
    parent.join(base)
}

/// Sidecar file for one frame of an image
pub fn sidecar_path(image_path: &Path, frame: u32) -> PathBuf {
    sidecar_dir(image_path).join(format!("{}.txt", frame))
}

/// Read a geometry store from `path`.
pub fn load(path: &Path) -> Result<GeometryStore, SidecarError> {
    let text = fs::read_to_string(path).map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            SidecarError::NotFound(path.to_path_buf())
        } else {
            SidecarError::Io {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })?;
    let format_err = |source: serde_json::Error| SidecarError::Format {
        path: path.to_path_buf(),
        source,
    };
    let store: GeometryStore = serde_json::from_str(&text).map_err(format_err)?;
    store
        .validate()
        .map_err(|msg| format_err(<serde_json::Error as serde::de::Error>::custom(msg)))?;
    Ok(store)
}

/// Write `store` to `path`, replacing any existing file and creating the
/// containing directory when needed.
pub fn save(store: &GeometryStore, path: &Path) -> Result<(), SidecarError> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir).map_err(|source| SidecarError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
        }
    }
    let json = serde_json::to_string_pretty(store)?;
    fs::write(path, json).map_err(|source| SidecarError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    log::info!("Saved {} to {}", store.summary(), path.display());
    Ok(())
}

/// Move an unreadable sidecar aside as `<file>.corrupt` so a later save
/// does not destroy it. Any previous backup is replaced.
pub fn backup(path: &Path) -> Result<PathBuf, SidecarError> {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".corrupt");
    let target = path.with_file_name(name);
    fs::rename(path, &target).map_err(|source| SidecarError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    log::warn!("Moved unreadable sidecar {} to {}", path.display(), target.display());
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::shape::{Circle, Freehand, Line, Point, Rectangle, Shape};

    fn sample_store() -> GeometryStore {
        let mut store = GeometryStore::new();
        store.push(Shape::Line(Line::from([10.0, 10.0, 100.0, 100.0])));
        store.push(Shape::Line(Line::from([0.25, 3.5, 7.125, 9.0])));
        store.push(Shape::Rectangle(Rectangle::from([5.0, 6.0, 20.5, 30.0])));
        store.push(Shape::Circle(Circle {
            center: Point::new(64.0, 64.0),
            radius: 2.0_f64.sqrt() * 10.0,
        }));
        store.push(Shape::Freehand(Freehand {
            points: vec![Point::new(1.0, 1.0), Point::new(2.5, 3.75), Point::new(4.0, 0.1)],
        }));
        store
    }

    #[test]
    fn test_sidecar_path_per_frame() {
        let p = sidecar_path(Path::new("/data/study/scan.dcm"), 0);
        assert_eq!(p, PathBuf::from("/data/study/scan/0.txt"));
        let p = sidecar_path(Path::new("/data/study/scan.dcm"), 7);
        assert_eq!(p, PathBuf::from("/data/study/scan/7.txt"));
    }

    #[test]
    fn test_sidecar_dir_uses_name_before_first_dot() {
        let d = sidecar_dir(Path::new("/tmp/ct.series.2.dcm"));
        assert_eq!(d, PathBuf::from("/tmp/ct"));
        let d = sidecar_dir(Path::new("/tmp/.hidden"));
        assert_eq!(d, PathBuf::from("/tmp/.hidden_annotations"));
    }

    #[test]
    fn test_extensionless_image_gets_separate_directory() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("IM0001");
        fs::write(&image, b"not really dicom").unwrap();

        let path = sidecar_path(&image, 0);
        assert_eq!(path, dir.path().join("IM0001_annotations").join("0.txt"));
        assert!(load(&path).unwrap_err().is_not_found());

        save(&sample_store(), &path).unwrap();
        assert_eq!(load(&path).unwrap(), sample_store());
        assert!(image.is_file());
    }

    #[test]
    fn test_save_then_load_roundtrip_all_kinds() {
        let dir = tempfile::tempdir().unwrap();
        let path = sidecar_path(&dir.path().join("scan.dcm"), 0);
        let store = sample_store();

        save(&store, &path).unwrap();
        assert!(path.exists(), "save should create the sidecar directory");

        let loaded = load(&path).unwrap();
        assert_eq!(loaded, store);
    }

    #[test]
    fn test_save_overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("0.txt");
        save(&sample_store(), &path).unwrap();
        save(&GeometryStore::new(), &path).unwrap();
        assert!(load(&path).unwrap().is_empty());
    }

    #[test]
    fn test_load_missing_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = load(&dir.path().join("0.txt")).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_load_missing_key_is_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("0.txt");
        fs::write(&path, r#"{"line": [], "rectangle": [], "freehand": []}"#).unwrap();
        let err = load(&path).unwrap_err();
        assert!(matches!(err, SidecarError::Format { .. }));
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_load_invalid_shapes_is_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("0.txt");
        for record in [
            r#"{"line": [], "rectangle": [[0, 0, -5, -5]], "circle": [], "freehand": []}"#,
            r#"{"line": [], "rectangle": [], "circle": [[[0, 0], -3]], "freehand": []}"#,
            r#"{"line": [], "rectangle": [], "circle": [], "freehand": [[[1, 1]]]}"#,
        ] {
            fs::write(&path, record).unwrap();
            let err = load(&path).unwrap_err();
            assert!(matches!(err, SidecarError::Format { .. }), "{}: {}", record, err);
        }
    }

    #[test]
    fn test_load_garbage_is_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("0.txt");
        fs::write(&path, "not json at all").unwrap();
        assert!(matches!(load(&path), Err(SidecarError::Format { .. })));
    }

    #[test]
    fn test_record_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("0.txt");
        let mut store = GeometryStore::new();
        store.push(Shape::Line(Line::from([10.0, 10.0, 100.0, 100.0])));
        save(&store, &path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "line": [[10.0, 10.0, 100.0, 100.0]],
                "rectangle": [],
                "circle": [],
                "freehand": []
            })
        );
    }

    #[test]
    fn test_loads_record_with_integer_coordinates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("0.txt");
        fs::write(
            &path,
            r#"{"line": [[10, 10, 100, 100]], "rectangle": [[1, 2, 3, 4]],
               "circle": [[[50, 60], 12.5]], "freehand": [[[0, 0], [1, 1], [2, 0]]]}"#,
        )
        .unwrap();
        let store = load(&path).unwrap();
        assert_eq!(store.line, vec![Line::from([10.0, 10.0, 100.0, 100.0])]);
        assert_eq!(store.circle[0].center, Point::new(50.0, 60.0));
        assert_eq!(store.circle[0].radius, 12.5);
        assert_eq!(store.freehand[0].points.len(), 3);
    }
}
