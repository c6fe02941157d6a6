// ABOUTME: HTML exporter for the clipdeck application
// ABOUTME: Emits a navigable document with per-slide media and cue metadata

use crate::config::PresentationConfig;
use crate::errors::{DeckError, Result};
use crate::export::{commit_file, require_clip, temp_sibling, ExportOptions, SubsectionMode};
use crate::resources::ResourceFile;
use crate::utils::ensure_parent_directory_exists;
use log::info;
use quick_xml::escape::escape;
use std::fs;
use std::path::Path;

const DEFAULT_CSS: &str = include_str!("../assets/deck.css");
const DEFAULT_JS: &str = include_str!("../assets/player.js");

/// Configuration for HTML generation
pub struct HtmlConfig {
    pub title: String,
    /// Extra CSS resources; the built-in deck stylesheet is used when empty.
    pub css_files: Vec<ResourceFile>,
    /// Extra JS resources; the built-in player script is used when empty.
    pub js_files: Vec<ResourceFile>,
    /// Whether local resources are embedded into the document or linked.
    pub embed_resources: bool,
}

impl Default for HtmlConfig {
    fn default() -> Self {
        Self {
            title: "Presentation".to_string(),
            css_files: Vec::new(),
            js_files: Vec::new(),
            embed_resources: true,
        }
    }
}

/// Generate the HTML document. Media sources point into `assets_dir_name`,
/// which [`convert_html`] populates with a copy of every clip.
pub fn generate_html(
    configs: &[PresentationConfig],
    options: &ExportOptions,
    html_config: &HtmlConfig,
    assets_dir_name: &str,
) -> Result<String> {
    if configs.is_empty() {
        return Err(DeckError::ValidationError(
            "Cannot convert an empty list of presentation configs".to_string(),
        ));
    }
    for config in configs {
        config.validate()?;
    }

    let mut doc = String::from("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    doc.push_str("<meta charset=\"UTF-8\">\n");
    doc.push_str(
        "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n",
    );
    doc.push_str(&format!("<title>{}</title>\n", escape(&html_config.title)));

    if html_config.css_files.is_empty() {
        doc.push_str(&format!("<style>{}</style>\n", DEFAULT_CSS));
    } else {
        for css in &html_config.css_files {
            doc.push_str(&css.tag("css", html_config.embed_resources)?);
            doc.push('\n');
        }
    }

    doc.push_str("</head>\n<body>\n");

    let slide_count: usize = configs.iter().map(|c| c.slides.len()).sum();
    doc.push_str(&format!(
        "<div id=\"deck\" data-slide-count=\"{}\">\n",
        slide_count
    ));

    let mut global_index = 0usize;
    for config in configs {
        for slide in &config.slides {
            let mut attrs = format!(
                " class=\"slide\" data-index=\"{}\" data-loop=\"{}\" data-auto-next=\"{}\"",
                global_index, slide.loop_, slide.auto_next
            );

            // Fragment cue points replicate the presenter's subsection
            // stepping on the client side.
            if options.subsections != SubsectionMode::None && !slide.subsections.is_empty() {
                let cues: Vec<String> = slide
                    .subsections
                    .iter()
                    .map(|m| m.clip_index.to_string())
                    .collect();
                attrs.push_str(&format!(" data-cues=\"{}\"", cues.join(",")));
                let auto_cues: Vec<String> = slide
                    .subsections
                    .iter()
                    .filter(|m| m.auto_next)
                    .map(|m| m.clip_index.to_string())
                    .collect();
                if !auto_cues.is_empty() {
                    attrs.push_str(&format!(" data-cue-auto=\"{}\"", auto_cues.join(",")));
                }
            }

            doc.push_str(&format!("<section{}>\n", attrs));
            for (clip_index, clip) in slide.animation_files.iter().enumerate() {
                let media_name = media_file_name(global_index, clip_index, clip);
                doc.push_str(&format!(
                    "<video preload=\"auto\" muted playsinline src=\"{}/{}\" data-clip=\"{}\"></video>\n",
                    assets_dir_name, media_name, clip_index
                ));
            }
            if !slide.notes.is_empty() {
                doc.push_str(&format!(
                    "<aside class=\"notes\">{}</aside>\n",
                    escape(&slide.notes)
                ));
            }
            doc.push_str("</section>\n");
            global_index += 1;
        }
    }

    doc.push_str("</div>\n");

    if html_config.js_files.is_empty() {
        doc.push_str(&format!("<script>{}</script>\n", DEFAULT_JS));
    } else {
        for js in &html_config.js_files {
            doc.push_str(&js.tag("js", html_config.embed_resources)?);
            doc.push('\n');
        }
    }

    doc.push_str("</body>\n</html>\n");
    Ok(doc)
}

/// Stable per-clip media name inside the assets directory.
fn media_file_name(slide_index: usize, clip_index: usize, clip: &Path) -> String {
    let ext = clip
        .extension()
        .map(|e| e.to_string_lossy().to_string())
        .unwrap_or_else(|| "mp4".to_string());
    format!("slide{:04}_clip{:02}.{}", slide_index, clip_index, ext)
}

/// Convert presentations into an HTML deck plus a sibling assets directory.
///
/// Both the document and the assets directory are staged under temporary
/// names and moved into place only once every clip copied successfully.
pub fn convert_html(
    configs: &[PresentationConfig],
    output: &Path,
    options: &ExportOptions,
    html_config: &HtmlConfig,
) -> Result<()> {
    ensure_parent_directory_exists(output)?;

    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "deck".to_string());
    let assets_dir_name = format!("{}_assets", stem);

    let document = generate_html(configs, options, html_config, &assets_dir_name)?;

    let assets_dir = output
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(&assets_dir_name);
    let temp_assets = temp_sibling(&assets_dir);
    fs::create_dir_all(&temp_assets).map_err(DeckError::FileReadError)?;

    let copy_result = (|| -> Result<()> {
        let mut global_index = 0usize;
        for config in configs {
            for slide in &config.slides {
                for (clip_index, clip) in slide.animation_files.iter().enumerate() {
                    require_clip(global_index, clip)?;
                    let dest = temp_assets.join(media_file_name(global_index, clip_index, clip));
                    fs::copy(clip, &dest).map_err(DeckError::FileReadError)?;
                }
                global_index += 1;
            }
        }
        Ok(())
    })();

    if let Err(e) = copy_result {
        let _ = fs::remove_dir_all(&temp_assets);
        return Err(e);
    }

    let temp_html = temp_sibling(output);
    fs::write(&temp_html, &document).map_err(DeckError::FileReadError)?;

    if assets_dir.exists() {
        fs::remove_dir_all(&assets_dir).map_err(DeckError::FileReadError)?;
    }
    commit_file(&temp_assets, &assets_dir)?;
    commit_file(&temp_html, output)?;

    info!("HTML deck written to {:?}", output);
    Ok(())
}

/// Utility function to write HTML content to a file
pub fn write_html_to_file(html_content: &str, output_path: &Path) -> Result<()> {
    ensure_parent_directory_exists(output_path)?;
    fs::write(output_path, html_content).map_err(DeckError::FileReadError)?;
    Ok(())
}
