//! PDF parsing and page rendering.
//!
//! - **Text extraction**: [`LopdfTextEngine`] reads the text layer and document metadata
//! - **Table detection**: [`LayoutTableDetector`] rebuilds cell grids from positioned text
//! - **Rasterization**: [`PdftoppmRasterizer`] by default, [`PdfiumRasterizer`] with the `pdfium` feature
//!
//! # Example
//!
//! ```rust,no_run
//! use pdf_harvest::pdf::extract_text_from_pdf;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pdf_bytes = std::fs::read("document.pdf")?;
//! let extraction = extract_text_from_pdf(&pdf_bytes, None)?;
//! println!("{} pages: {}", extraction.page_count(), extraction.text);
//! # Ok(())
//! # }
//! ```

#[cfg(feature = "pdfium")]
mod bindings;
pub mod error;
pub mod layout;
pub mod metadata;
pub mod poppler;
#[cfg(feature = "pdfium")]
pub mod rendering;
pub mod table;
pub mod text;

pub use error::PdfError;
pub use metadata::extract_metadata_from_document;
pub use poppler::PdftoppmRasterizer;
#[cfg(feature = "pdfium")]
pub use rendering::PdfiumRasterizer;
pub use table::{LayoutTableDetector, detect_tables_in_pdf};
pub use text::{LopdfTextEngine, extract_text_from_pdf};

#[cfg(test)]
pub(crate) mod test_pdf {
    use lopdf::content::{Content, Operation};
    use lopdf::{Document, Object, Stream, dictionary};

    /// Build a PDF where each page shows the given strings at absolute positions.
    pub fn build_pdf(pages: &[&[(&str, i64, i64)]]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for page in pages {
            let mut operations = Vec::new();
            for (text, x, y) in page.iter() {
                operations.push(Operation::new("BT", vec![]));
                operations.push(Operation::new("Tf", vec!["F1".into(), 12.into()]));
                operations.push(Operation::new("Td", vec![(*x).into(), (*y).into()]));
                operations.push(Operation::new("Tj", vec![Object::string_literal(*text)]));
                operations.push(Operation::new("ET", vec![]));
            }
            let content = Content { operations };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer).unwrap();
        buffer
    }
}
