/// Image sources: decode a file into displayable grayscale frames
///
/// DICOM files go through the `dicom` crate, which also applies the VOI
/// (window) LUT; anything else is opened with the `image` crate as a single
/// frame without windowing metadata.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use dicom::core::Tag;
use dicom::dictionary_std::tags;
use dicom::object::DefaultDicomObject;
use dicom::pixeldata::{ConvertOptions, PixelDecoder, VoiLutOption, WindowLevel};
use image::GrayImage;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("DICOM error in {}: {message}", .path.display())]
    Dicom { path: PathBuf, message: String },
    #[error("image decode error: {0}")]
    Image(#[from] image::ImageError),
    #[error("frame {frame} out of range (image has {frames} frames)")]
    FrameOutOfRange { frame: u32, frames: u32 },
    #[error("unsupported image: {0}")]
    Unsupported(String),
}

/// Display window (level/width pair) in modality units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Window {
    pub center: f64,
    pub width: f64,
}

impl std::fmt::Display for Window {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "WL: {} WW: {}", self.center, self.width)
    }
}

/// Decode side of the rendering collaborator
pub trait ImageSource {
    /// (width, height) in pixels
    fn dimensions(&self) -> (u32, u32);

    fn frame_count(&self) -> u32;

    /// Window stored in the file, if any
    fn default_window(&self) -> Option<Window>;

    /// Render one frame to 8-bit grayscale. `window` overrides the stored
    /// window where the source supports it.
    fn render_frame(&self, frame: u32, window: Option<Window>) -> Result<GrayImage, DecodeError>;

    /// Short description for the status bar, e.g. "DICOM CT"
    fn describe(&self) -> String;

    /// Whether `render_frame` honours a window at all
    fn supports_windowing(&self) -> bool {
        true
    }
}

/// Open `path` with the matching source.
pub fn open_source(path: &Path) -> Result<Box<dyn ImageSource>, DecodeError> {
    if looks_like_dicom(path)? {
        Ok(Box::new(DicomSource::open(path)?))
    } else {
        Ok(Box::new(RasterSource::open(path)?))
    }
}

/// DICOM Part 10 files carry "DICM" after a 128-byte preamble; bare
/// datasets are recognised by extension only.
fn looks_like_dicom(path: &Path) -> Result<bool, DecodeError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    if ext == "dcm" || ext == "dicom" {
        return Ok(true);
    }

    let mut file = File::open(path).map_err(|source| DecodeError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut head = [0u8; 132];
    match file.read_exact(&mut head) {
        Ok(()) => Ok(&head[128..132] == b"DICM"),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(false),
        Err(source) => Err(DecodeError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn check_frame(frame: u32, frames: u32) -> Result<(), DecodeError> {
    if frame >= frames {
        return Err(DecodeError::FrameOutOfRange { frame, frames });
    }
    Ok(())
}

// ── DICOM ──────────────────────────────────────────────────────────────────

pub struct DicomSource {
    path: PathBuf,
    obj: DefaultDicomObject,
    rows: u32,
    columns: u32,
    frames: u32,
    window: Option<Window>,
    modality: String,
}

impl DicomSource {
    pub fn open(path: &Path) -> Result<Self, DecodeError> {
        let dicom_err = |message: String| DecodeError::Dicom {
            path: path.to_path_buf(),
            message,
        };

        let obj = dicom::object::open_file(path).map_err(|e| dicom_err(e.to_string()))?;

        let int_tag = |tag: Tag, name: &str| -> Result<u32, DecodeError> {
            obj.element(tag)
                .map_err(|e| dicom_err(format!("{}: {}", name, e)))?
                .to_int::<u32>()
                .map_err(|e| dicom_err(format!("{}: {}", name, e)))
        };
        let rows = int_tag(tags::ROWS, "Rows")?;
        let columns = int_tag(tags::COLUMNS, "Columns")?;

        let frames = obj
            .element_opt(tags::NUMBER_OF_FRAMES)
            .ok()
            .flatten()
            .and_then(|e| e.to_int::<u32>().ok())
            .unwrap_or(1)
            .max(1);

        let float_tag = |tag: Tag| {
            obj.element_opt(tag)
                .ok()
                .flatten()
                .and_then(|e| e.to_float64().ok())
        };
        let window = match (float_tag(tags::WINDOW_CENTER), float_tag(tags::WINDOW_WIDTH)) {
            (Some(center), Some(width)) => Some(Window { center, width }),
            _ => None,
        };

        let modality = obj
            .element_opt(tags::MODALITY)
            .ok()
            .flatten()
            .and_then(|e| e.to_str().ok())
            .map(|s| s.trim().to_string())
            .unwrap_or_default();

        log::info!(
            "Opened DICOM {} ({}x{}, {} frame(s), modality '{}', window {:?})",
            path.display(),
            columns,
            rows,
            frames,
            modality,
            window
        );

        Ok(Self {
            path: path.to_path_buf(),
            obj,
            rows,
            columns,
            frames,
            window,
            modality,
        })
    }
}

impl ImageSource for DicomSource {
    fn dimensions(&self) -> (u32, u32) {
        (self.columns, self.rows)
    }

    fn frame_count(&self) -> u32 {
        self.frames
    }

    fn default_window(&self) -> Option<Window> {
        self.window
    }

    fn render_frame(&self, frame: u32, window: Option<Window>) -> Result<GrayImage, DecodeError> {
        check_frame(frame, self.frames)?;
        let dicom_err = |message: String| DecodeError::Dicom {
            path: self.path.clone(),
            message,
        };

        let pixels = self
            .obj
            .decode_pixel_data()
            .map_err(|e| dicom_err(e.to_string()))?;
        let voi = match window {
            Some(w) => VoiLutOption::Custom(WindowLevel {
                center: w.center,
                width: w.width,
            }),
            None => VoiLutOption::Default,
        };
        let options = ConvertOptions::new().with_voi_lut(voi).force_8bit();
        let image = pixels
            .to_dynamic_image_with_options(frame, &options)
            .map_err(|e| dicom_err(e.to_string()))?;
        Ok(image.to_luma8())
    }

    fn describe(&self) -> String {
        if self.modality.is_empty() {
            "DICOM".to_string()
        } else {
            format!("DICOM {}", self.modality)
        }
    }
}

// ── Plain raster images ────────────────────────────────────────────────────

pub struct RasterSource {
    image: GrayImage,
}

impl RasterSource {
    pub fn open(path: &Path) -> Result<Self, DecodeError> {
        let image = image::open(path)?.to_luma8();
        if image.width() == 0 || image.height() == 0 {
            return Err(DecodeError::Unsupported(format!(
                "{} has no pixels",
                path.display()
            )));
        }
        log::info!(
            "Opened raster image {} ({}x{})",
            path.display(),
            image.width(),
            image.height()
        );
        Ok(Self::from_image(image))
    }

    pub fn from_image(image: GrayImage) -> Self {
        Self { image }
    }
}

impl ImageSource for RasterSource {
    fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    fn frame_count(&self) -> u32 {
        1
    }

    fn default_window(&self) -> Option<Window> {
        None
    }

    fn render_frame(&self, frame: u32, window: Option<Window>) -> Result<GrayImage, DecodeError> {
        check_frame(frame, 1)?;
        if window.is_some() {
            log::debug!("Raster images carry no modality data; window ignored");
        }
        Ok(self.image.clone())
    }

    fn describe(&self) -> String {
        "Raster".to_string()
    }

    fn supports_windowing(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raster_source_single_frame() {
        let src = RasterSource::from_image(GrayImage::new(4, 3));
        assert_eq!(src.dimensions(), (4, 3));
        assert_eq!(src.frame_count(), 1);
        assert!(src.default_window().is_none());
        assert!(!src.supports_windowing());
        assert!(src.render_frame(0, None).is_ok());
        assert!(matches!(
            src.render_frame(1, None),
            Err(DecodeError::FrameOutOfRange { frame: 1, frames: 1 })
        ));
    }

    #[test]
    fn test_open_png_through_open_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiny.png");
        GrayImage::from_pixel(8, 6, image::Luma([200u8])).save(&path).unwrap();

        let src = open_source(&path).unwrap();
        assert_eq!(src.dimensions(), (8, 6));
        assert_eq!(src.describe(), "Raster");
        let frame = src.render_frame(0, None).unwrap();
        assert_eq!(frame.get_pixel(3, 3).0, [200u8]);
    }

    #[test]
    fn test_unreadable_file_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"definitely not a png").unwrap();
        assert!(open_source(&path).is_err());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = open_source(&dir.path().join("absent.img")).err().unwrap();
        assert!(matches!(err, DecodeError::Io { .. }));
    }

    #[test]
    fn test_dicom_extension_routes_to_dicom_decoder() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.dcm");
        std::fs::write(&path, vec![0u8; 256]).unwrap();
        let err = open_source(&path).err().unwrap();
        assert!(matches!(err, DecodeError::Dicom { .. }));
    }

    #[test]
    fn test_window_display() {
        let w = Window { center: 40.0, width: 400.0 };
        assert_eq!(w.to_string(), "WL: 40 WW: 400");
    }
}
