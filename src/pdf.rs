// ABOUTME: PDF exporter for the clipdeck application
// ABOUTME: Turns the static frame plan into one JPEG page per selected frame

use crate::config::PresentationConfig;
use crate::errors::{DeckError, Result};
use crate::export::{commit_file, frame_plan, require_clip, temp_sibling, ExportOptions, PlannedFrame};
use crate::media::MediaBackend;
use crate::utils::ensure_parent_directory_exists;
use image::codecs::jpeg::JpegEncoder;
use log::info;
use std::fs;
use std::path::Path;

/// Configuration for PDF generation
pub struct PdfConfig {
    pub title: String,
    /// JPEG quality for the embedded pages.
    pub quality: u8,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            title: "Presentation".to_string(),
            quality: 90,
        }
    }
}

struct Page {
    width: u32,
    height: u32,
    jpeg: Vec<u8>,
}

/// Combined deterministic frame plan across scenes, with global slide
/// numbering.
pub fn combined_frame_plan(
    configs: &[PresentationConfig],
    options: &ExportOptions,
) -> Result<Vec<PlannedFrame>> {
    if configs.is_empty() {
        return Err(DeckError::ValidationError(
            "Cannot convert an empty list of presentation configs".to_string(),
        ));
    }
    let mut plan = Vec::new();
    let mut offset = 0usize;
    for config in configs {
        for mut frame in frame_plan(config, options)? {
            frame.slide_index += offset;
            plan.push(frame);
        }
        offset += config.slides.len();
    }
    Ok(plan)
}

/// Generate a PDF with one page per planned frame.
pub fn convert_pdf(
    configs: &[PresentationConfig],
    output: &Path,
    options: &ExportOptions,
    config: &PdfConfig,
    backend: &dyn MediaBackend,
) -> Result<()> {
    ensure_parent_directory_exists(output)?;

    let plan = combined_frame_plan(configs, options)?;
    info!("Rendering {} PDF pages to {:?}", plan.len(), output);

    let frame_dir = std::env::temp_dir().join(format!("clipdeck_frames_{}", uuid::Uuid::new_v4()));
    fs::create_dir_all(&frame_dir).map_err(DeckError::FileReadError)?;

    let pages = (|| -> Result<Vec<Page>> {
        let mut pages = Vec::with_capacity(plan.len());
        for (page_index, frame) in plan.iter().enumerate() {
            require_clip(frame.slide_index, &frame.clip)?;
            let frame_path = frame_dir.join(format!("page{:04}.png", page_index));
            backend.extract_frame(&frame.clip, frame.position, &frame_path)?;

            let decoded = image::open(&frame_path)?.to_rgb8();
            let (width, height) = decoded.dimensions();
            let mut jpeg = Vec::new();
            JpegEncoder::new_with_quality(&mut jpeg, config.quality)
                .encode_image(&decoded)
                .map_err(DeckError::from)?;
            pages.push(Page {
                width,
                height,
                jpeg,
            });
        }
        Ok(pages)
    })();

    let _ = fs::remove_dir_all(&frame_dir);
    let pages = pages?;

    let document = build_pdf(&pages, &config.title);

    let temp = temp_sibling(output);
    fs::write(&temp, document).map_err(DeckError::FileReadError)?;
    commit_file(&temp, output)?;

    info!("PDF file created at {:?}", output);
    Ok(())
}

/// Assemble the PDF container by hand: a catalog, a page tree, and per page
/// one page object, one content stream and one DCT-encoded image XObject.
fn build_pdf(pages: &[Page], title: &str) -> Vec<u8> {
    let mut buf: Vec<u8> = Vec::new();
    let mut offsets: Vec<usize> = Vec::new();

    buf.extend_from_slice(b"%PDF-1.4\n");

    let object_count = 3 + pages.len() * 3;
    let page_ids: Vec<usize> = (0..pages.len()).map(|i| 4 + i * 3).collect();

    let begin_obj = |buf: &mut Vec<u8>, offsets: &mut Vec<usize>, id: usize| {
        debug_assert_eq!(offsets.len() + 1, id);
        offsets.push(buf.len());
        buf.extend_from_slice(format!("{} 0 obj\n", id).as_bytes());
    };

    // 1: catalog
    begin_obj(&mut buf, &mut offsets, 1);
    buf.extend_from_slice(b"<< /Type /Catalog /Pages 2 0 R >>\nendobj\n");

    // 2: page tree
    begin_obj(&mut buf, &mut offsets, 2);
    let kids = page_ids
        .iter()
        .map(|id| format!("{} 0 R", id))
        .collect::<Vec<_>>()
        .join(" ");
    buf.extend_from_slice(
        format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>\nendobj\n",
            kids,
            pages.len()
        )
        .as_bytes(),
    );

    // 3: document info
    begin_obj(&mut buf, &mut offsets, 3);
    let date = chrono::Utc::now().format("%Y%m%d%H%M%SZ");
    buf.extend_from_slice(
        format!(
            "<< /Title ({}) /Producer (clipdeck) /CreationDate (D:{}) >>\nendobj\n",
            title.replace(['(', ')', '\\'], " "),
            date
        )
        .as_bytes(),
    );

    for (i, page) in pages.iter().enumerate() {
        let page_id = 4 + i * 3;
        let content_id = page_id + 1;
        let image_id = page_id + 2;

        // Page: one pixel maps to one point.
        begin_obj(&mut buf, &mut offsets, page_id);
        buf.extend_from_slice(
            format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {} {}] \
                 /Resources << /XObject << /Im{} {} 0 R >> >> /Contents {} 0 R >>\nendobj\n",
                page.width, page.height, i, image_id, content_id
            )
            .as_bytes(),
        );

        let content = format!(
            "q\n{} 0 0 {} 0 0 cm\n/Im{} Do\nQ\n",
            page.width, page.height, i
        );
        begin_obj(&mut buf, &mut offsets, content_id);
        buf.extend_from_slice(format!("<< /Length {} >>\nstream\n", content.len()).as_bytes());
        buf.extend_from_slice(content.as_bytes());
        buf.extend_from_slice(b"endstream\nendobj\n");

        begin_obj(&mut buf, &mut offsets, image_id);
        buf.extend_from_slice(
            format!(
                "<< /Type /XObject /Subtype /Image /Width {} /Height {} \
                 /ColorSpace /DeviceRGB /BitsPerComponent 8 /Filter /DCTDecode \
                 /Length {} >>\nstream\n",
                page.width,
                page.height,
                page.jpeg.len()
            )
            .as_bytes(),
        );
        buf.extend_from_slice(&page.jpeg);
        buf.extend_from_slice(b"\nendstream\nendobj\n");
    }

    let xref_offset = buf.len();
    buf.extend_from_slice(format!("xref\n0 {}\n", object_count + 1).as_bytes());
    buf.extend_from_slice(b"0000000000 65535 f \n");
    for offset in &offsets {
        buf.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
    }
    buf.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R /Info 3 0 R >>\nstartxref\n{}\n%%EOF\n",
            object_count + 1,
            xref_offset
        )
        .as_bytes(),
    );

    buf
}
