//! Format detection for Office Open XML packages.
//!
//! Only presentation packages can be used as templates; the other Office
//! formats are recognized so the error can say what was supplied instead.

use crate::error::{Error, Result};
use crate::package::{Package, CONTENT_TYPES};

/// ZIP file magic bytes: PK\x03\x04
const ZIP_MAGIC: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];

const DOCX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml";

const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml";

const PPTX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml";

const PPTM_CONTENT_TYPE: &str = "application/vnd.ms-powerpoint.presentation.macroEnabled.main+xml";

const POTX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.template.main+xml";

/// Detected Office package format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatType {
    /// PowerPoint presentation (.pptx)
    Pptx,
    /// Macro-enabled PowerPoint presentation (.pptm)
    Pptm,
    /// PowerPoint template (.potx)
    Potx,
    /// Word document (.docx)
    Docx,
    /// Excel workbook (.xlsx)
    Xlsx,
}

impl FormatType {
    /// Returns the file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            FormatType::Pptx => "pptx",
            FormatType::Pptm => "pptm",
            FormatType::Potx => "potx",
            FormatType::Docx => "docx",
            FormatType::Xlsx => "xlsx",
        }
    }

    /// Returns a human-readable name for this format.
    pub fn name(&self) -> &'static str {
        match self {
            FormatType::Pptx => "PowerPoint Presentation",
            FormatType::Pptm => "PowerPoint Macro-Enabled Presentation",
            FormatType::Potx => "PowerPoint Template",
            FormatType::Docx => "Word Document",
            FormatType::Xlsx => "Excel Workbook",
        }
    }

    /// Whether the package has the presentation structure.
    pub fn is_presentation(&self) -> bool {
        matches!(self, FormatType::Pptx | FormatType::Pptm | FormatType::Potx)
    }
}

impl std::fmt::Display for FormatType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Check if data starts with ZIP magic bytes.
pub fn is_zip_file(data: &[u8]) -> bool {
    data.len() >= 4 && data[..4] == ZIP_MAGIC
}

/// Detect the format type from raw bytes.
pub fn detect_format_from_bytes(data: &[u8]) -> Result<FormatType> {
    if !is_zip_file(data) {
        return Err(Error::UnsupportedFormat("not a ZIP package".to_string()));
    }
    detect_format(&Package::from_bytes(data)?)
}

/// Detect the format of a loaded package from its `[Content_Types].xml`,
/// falling back to the top-level folder layout.
pub fn detect_format(package: &Package) -> Result<FormatType> {
    if !package.contains(CONTENT_TYPES) {
        return Err(Error::MissingComponent(CONTENT_TYPES.to_string()));
    }
    let content_types = package.read_xml(CONTENT_TYPES)?;

    if content_types.contains(PPTX_CONTENT_TYPE) {
        Ok(FormatType::Pptx)
    } else if content_types.contains(PPTM_CONTENT_TYPE) {
        Ok(FormatType::Pptm)
    } else if content_types.contains(POTX_CONTENT_TYPE) {
        Ok(FormatType::Potx)
    } else if content_types.contains(DOCX_CONTENT_TYPE) {
        Ok(FormatType::Docx)
    } else if content_types.contains(XLSX_CONTENT_TYPE) {
        Ok(FormatType::Xlsx)
    } else {
        detect_by_folder_structure(package)
    }
}

fn detect_by_folder_structure(package: &Package) -> Result<FormatType> {
    let has_word = !package.part_names_with_prefix("word/").is_empty();
    let has_xl = !package.part_names_with_prefix("xl/").is_empty();
    let has_ppt = !package.part_names_with_prefix("ppt/").is_empty();

    match (has_word, has_xl, has_ppt) {
        (true, false, false) => Ok(FormatType::Docx),
        (false, true, false) => Ok(FormatType::Xlsx),
        (false, false, true) => Ok(FormatType::Pptx),
        _ => Err(Error::UnsupportedFormat(
            "unrecognized OOXML package".to_string(),
        )),
    }
}
