//! # redeck
//!
//! PowerPoint template engine: fills placeholder tokens, drops optional
//! slides, and re-serializes a valid `.pptx` package.
//!
//! ## Quick Start
//!
//! ```no_run
//! use redeck::{BuildRequest, Template, TemplateManifest};
//!
//! let manifest = TemplateManifest::load("proposal.json")?;
//! let template = Template::open("proposal.pptx")?.with_manifest(manifest);
//!
//! let request = BuildRequest::new()
//!     .with_replacement("{{COMPANY_NAME}}", "Acme Corp")
//!     .with_toggle("pricing", false)
//!     .remove_slide(4);
//!
//! let pptx = template.build(&request)?;
//! std::fs::write("proposal_Acme_Corp.pptx", pptx)?;
//! # Ok::<(), redeck::Error>(())
//! ```
//!
//! ## Pipeline
//!
//! 1. Toggle groups whose flag is false add their slides to the removal set.
//! 2. [`Deck::prune`] removes those slides, highest position first, and
//!    detaches their relationships.
//! 3. [`Deck::resolve`] replaces tokens in every remaining slide, even when
//!    a token is split over several text runs.
//! 4. [`Deck::into_bytes`] rewrites the slide list, drops parts that lost
//!    their last reference, and serializes.
//!
//! ## Features
//!
//! - `async`: `Template::open_async` with Tokio

pub mod assemble;
pub mod convert;
pub mod deck;
pub mod detect;
pub mod error;
pub mod manifest;
pub mod package;
mod prune;
pub mod replacements;
pub mod request;
pub mod resolve;
pub mod text;
pub mod toggle;
mod xml;

// Re-exports
pub use assemble::{build, BuildRequest, Template};
pub use convert::{convert_bytes, Converter, ConverterOptions, LibreOffice};
pub use deck::{Deck, SlideRecord, SlideSummary};
pub use detect::{detect_format, detect_format_from_bytes, FormatType};
pub use error::{Error, Result};
pub use manifest::TemplateManifest;
pub use package::{Package, Relationship, Relationships};
pub use replacements::{token, ReplacementMap, ReplacementValue};
pub use request::{PricingOverrides, RenderRequest};
pub use text::LogicalText;
pub use toggle::{ToggleFlags, ToggleGroups};

use std::path::Path;

/// Build a presentation from a template file.
///
/// # Example
///
/// ```no_run
/// use redeck::{build_file, BuildRequest};
///
/// let request = BuildRequest::new().with_replacement("{{COMPANY_NAME}}", "Acme Corp");
/// let pptx = build_file("proposal.pptx", &request)?;
/// # Ok::<(), redeck::Error>(())
/// ```
pub fn build_file(path: impl AsRef<Path>, request: &BuildRequest) -> Result<Vec<u8>> {
    Template::open(path)?.build(request)
}

/// Build a presentation and render it to PDF with LibreOffice.
///
/// Generation errors and rendering errors stay distinguishable through
/// [`Error::is_conversion`].
pub fn build_pdf(
    template: &Template,
    request: &BuildRequest,
    options: ConverterOptions,
) -> Result<Vec<u8>> {
    let pptx = template.build(request)?;
    convert_bytes(&LibreOffice::new(options), &pptx)
}
