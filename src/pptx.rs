// ABOUTME: PPTX exporter for the clipdeck application
// ABOUTME: Creates PowerPoint presentations embedding slide videos with posters

use crate::config::PresentationConfig;
use crate::errors::{DeckError, Result};
use crate::export::{commit_file, require_clip, temp_sibling, ExportOptions, SubsectionMode};
use crate::media::{FramePosition, MediaBackend};
use crate::utils::ensure_parent_directory_exists;
use log::{info, warn};
use quick_xml::escape::escape;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use zip::{write::FileOptions, ZipWriter};

/// Configuration for PPTX generation
pub struct PptxConfig {
    pub title: String,
    pub aspect_ratio: String, // "16:9" or "4:3"
}

impl Default for PptxConfig {
    fn default() -> Self {
        Self {
            title: "Presentation".to_string(),
            aspect_ratio: "16:9".to_string(),
        }
    }
}

/// One destination slide: a video part, its poster frame, and the stable
/// secondary number (`3`, `3a`, `3b`) that keeps the canonical slide count
/// discoverable after splitting.
struct DestSlide {
    label: String,
    video: PathBuf,
    poster: PathBuf,
}

fn segment_suffix(segment: usize) -> String {
    if segment == 0 {
        return String::new();
    }
    // 1 -> a, 2 -> b, ..., 27 -> aa
    let mut n = segment;
    let mut suffix = String::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        suffix.insert(0, (b'a' + rem as u8) as char);
        n = (n - 1) / 26;
    }
    suffix
}

/// Cut and stage the media for every destination slide.
fn stage_media(
    configs: &[PresentationConfig],
    options: &ExportOptions,
    backend: &dyn MediaBackend,
    media_dir: &Path,
) -> Result<Vec<DestSlide>> {
    let mut dest_slides = Vec::new();
    let mut global_index = 0usize;

    for config in configs {
        for slide in &config.slides {
            for clip in &slide.animation_files {
                require_clip(global_index, clip)?;
            }
            let number = global_index + 1;

            let segments: Vec<(usize, usize)> = match options.subsections {
                SubsectionMode::All if !slide.subsections.is_empty() => {
                    (0..slide.segment_count()).map(|s| slide.segment_span(s)).collect()
                }
                // Scope the embedded video to the terminal segment.
                SubsectionMode::Final => vec![slide.segment_span(slide.segment_count() - 1)],
                _ => vec![(0, slide.animation_files.len())],
            };

            for (segment, (start, end)) in segments.into_iter().enumerate() {
                let label = format!("{}{}", number, segment_suffix(segment));
                let clips = &slide.animation_files[start..end];

                let video = media_dir.join(format!("media{}.mp4", dest_slides.len() + 1));
                backend.concat_clips(clips, &video).map_err(|e| match e {
                    DeckError::PathNotFoundError(clip) => DeckError::MissingClip {
                        slide_index: global_index,
                        clip,
                    },
                    other => other,
                })?;

                // Poster frame follows the static "first frame" policy,
                // scoped to this segment's span.
                let poster = media_dir.join(format!("poster{}.png", dest_slides.len() + 1));
                backend.extract_frame(&clips[0], FramePosition::First, &poster)?;

                dest_slides.push(DestSlide {
                    label,
                    video,
                    poster,
                });
            }
            global_index += 1;
        }
    }

    Ok(dest_slides)
}

/// Generate a PPTX presentation from presentation configs.
///
/// Without subsection splitting this emits exactly one destination slide per
/// source slide, embedding the slide's full forward clip. With
/// `subsections: all`, slides are cut at marker boundaries into one
/// destination slide per segment.
pub fn convert_pptx(
    configs: &[PresentationConfig],
    output: &Path,
    options: &ExportOptions,
    config: &PptxConfig,
    backend: &dyn MediaBackend,
) -> Result<()> {
    if configs.is_empty() {
        return Err(DeckError::ValidationError(
            "Cannot convert an empty list of presentation configs".to_string(),
        ));
    }
    for presentation in configs {
        presentation.validate()?;
    }
    ensure_parent_directory_exists(output)?;

    info!("Generating PPTX at {:?}", output);

    let media_dir = std::env::temp_dir().join(format!("clipdeck_pptx_{}", uuid::Uuid::new_v4()));
    fs::create_dir_all(&media_dir).map_err(DeckError::FileReadError)?;

    let staged = stage_media(configs, options, backend, &media_dir);
    let result = staged.and_then(|dest_slides| {
        let temp = temp_sibling(output);
        match write_package(&temp, &dest_slides, config) {
            Ok(()) => commit_file(&temp, output),
            Err(e) => {
                let _ = fs::remove_file(&temp);
                Err(e)
            }
        }
    });

    let _ = fs::remove_dir_all(&media_dir);
    result?;

    info!("PPTX file created at {:?}", output);
    Ok(())
}

/// Slide dimensions in EMU for the configured aspect ratio.
fn slide_size(config: &PptxConfig) -> (u64, u64) {
    match config.aspect_ratio.as_str() {
        "16:9" => (9144000, 5143500),
        "4:3" => (9144000, 6858000),
        _ => {
            warn!(
                "Unsupported aspect ratio: {}. Using 16:9 instead.",
                config.aspect_ratio
            );
            (9144000, 5143500)
        }
    }
}

fn write_package(dest: &Path, dest_slides: &[DestSlide], config: &PptxConfig) -> Result<()> {
    let file = fs::File::create(dest).map_err(DeckError::FileReadError)?;
    let mut zip = ZipWriter::new(file);
    let (cx, cy) = slide_size(config);

    // [Content_Types].xml
    zip.start_file("[Content_Types].xml", FileOptions::default())?;
    let content_types = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
    <Default Extension="xml" ContentType="application/xml"/>
    <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
    <Default Extension="png" ContentType="image/png"/>
    <Default Extension="mp4" ContentType="video/mp4"/>
    <Override PartName="/ppt/presentation.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml"/>
    <Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/>
    <Override PartName="/docProps/app.xml" ContentType="application/vnd.openxmlformats-officedocument.extended-properties+xml"/>
    {slides}
</Types>"#,
        slides = (1..=dest_slides.len())
            .map(|i| format!(
                r#"<Override PartName="/ppt/slides/slide{}.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slide+xml"/>"#,
                i
            ))
            .collect::<Vec<String>>()
            .join("\n")
    );
    zip.write_all(content_types.as_bytes())?;

    // _rels/.rels
    zip.start_file("_rels/.rels", FileOptions::default())?;
    let rels = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
    <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="ppt/presentation.xml"/>
    <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/>
    <Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties" Target="docProps/app.xml"/>
</Relationships>"#;
    zip.write_all(rels.as_bytes())?;

    // docProps/app.xml
    zip.start_file("docProps/app.xml", FileOptions::default())?;
    let app_xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties" xmlns:vt="http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes">
    <Application>clipdeck</Application>
    <Slides>{}</Slides>
</Properties>"#,
        dest_slides.len()
    );
    zip.write_all(app_xml.as_bytes())?;

    // docProps/core.xml
    zip.start_file("docProps/core.xml", FileOptions::default())?;
    let core_xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:dcmitype="http://purl.org/dc/dcmitype/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
    <dc:title>{}</dc:title>
    <dc:creator>clipdeck</dc:creator>
    <dcterms:created xsi:type="dcterms:W3CDTF">{}</dcterms:created>
    <cp:revision>1</cp:revision>
</cp:coreProperties>"#,
        escape(&config.title),
        chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ")
    );
    zip.write_all(core_xml.as_bytes())?;

    // ppt/_rels/presentation.xml.rels
    zip.start_file("ppt/_rels/presentation.xml.rels", FileOptions::default())?;
    let mut pres_rels = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
"#,
    );
    for i in 1..=dest_slides.len() {
        pres_rels.push_str(&format!(
            r#"    <Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide" Target="slides/slide{}.xml"/>"#,
            i, i
        ));
        pres_rels.push('\n');
    }
    pres_rels.push_str("</Relationships>");
    zip.write_all(pres_rels.as_bytes())?;

    // ppt/presentation.xml
    zip.start_file("ppt/presentation.xml", FileOptions::default())?;
    let presentation_xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:presentation xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main">
    <p:sldIdLst>
{slide_ids}
    </p:sldIdLst>
    <p:sldSz cx="{cx}" cy="{cy}"/>
    <p:notesSz cx="6858000" cy="9144000"/>
</p:presentation>"#,
        slide_ids = (0..dest_slides.len())
            .map(|i| format!(r#"        <p:sldId id="{}" r:id="rId{}"/>"#, 256 + i, i + 1))
            .collect::<Vec<String>>()
            .join("\n"),
        cx = cx,
        cy = cy
    );
    zip.write_all(presentation_xml.as_bytes())?;

    // Per-slide media parts, relationships and slide XML.
    for (i, dest_slide) in dest_slides.iter().enumerate() {
        let slide_num = i + 1;

        let video_name = format!("media{}.mp4", slide_num);
        let video_data = fs::read(&dest_slide.video).map_err(DeckError::FileReadError)?;
        zip.start_file(format!("ppt/media/{}", video_name), FileOptions::default())?;
        zip.write_all(&video_data)?;

        let poster_name = format!("poster{}.png", slide_num);
        let poster_data = fs::read(&dest_slide.poster).map_err(DeckError::FileReadError)?;
        zip.start_file(format!("ppt/media/{}", poster_name), FileOptions::default())?;
        zip.write_all(&poster_data)?;

        zip.start_file(
            format!("ppt/slides/_rels/slide{}.xml.rels", slide_num),
            FileOptions::default(),
        )?;
        let slide_rels = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
    <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="../media/{poster}"/>
    <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/video" Target="../media/{video}"/>
    <Relationship Id="rId3" Type="http://schemas.microsoft.com/office/2007/relationships/media" Target="../media/{video}"/>
</Relationships>"#,
            poster = poster_name,
            video = video_name
        );
        zip.write_all(slide_rels.as_bytes())?;

        zip.start_file(
            format!("ppt/slides/slide{}.xml", slide_num),
            FileOptions::default(),
        )?;
        let slide_xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main">
    <p:cSld>
        <p:spTree>
            <p:nvGrpSpPr>
                <p:cNvPr id="1" name=""/>
                <p:cNvGrpSpPr/>
                <p:nvPr/>
            </p:nvGrpSpPr>
            <p:grpSpPr>
                <a:xfrm>
                    <a:off x="0" y="0"/>
                    <a:ext cx="0" cy="0"/>
                    <a:chOff x="0" y="0"/>
                    <a:chExt cx="0" cy="0"/>
                </a:xfrm>
            </p:grpSpPr>
            <p:pic>
                <p:nvPicPr>
                    <p:cNvPr id="2" name="Slide {label}">
                        <a:hlinkClick r:id="" action="ppaction://media"/>
                    </p:cNvPr>
                    <p:cNvPicPr>
                        <a:picLocks noChangeAspect="1"/>
                    </p:cNvPicPr>
                    <p:nvPr>
                        <a:videoFile r:link="rId2"/>
                        <p:extLst>
                            <p:ext uri="{{DAA4B4D4-6D71-4841-9C94-3DE7FCFB9230}}">
                                <p14:media xmlns:p14="http://schemas.microsoft.com/office/powerpoint/2010/main" r:embed="rId3"/>
                            </p:ext>
                        </p:extLst>
                    </p:nvPr>
                </p:nvPicPr>
                <p:blipFill>
                    <a:blip r:embed="rId1"/>
                    <a:stretch>
                        <a:fillRect/>
                    </a:stretch>
                </p:blipFill>
                <p:spPr>
                    <a:xfrm>
                        <a:off x="0" y="0"/>
                        <a:ext cx="{cx}" cy="{cy}"/>
                    </a:xfrm>
                    <a:prstGeom prst="rect">
                        <a:avLst/>
                    </a:prstGeom>
                </p:spPr>
            </p:pic>
        </p:spTree>
    </p:cSld>
    <p:clrMapOvr>
        <a:masterClrMapping/>
    </p:clrMapOvr>
</p:sld>"#,
            label = escape(&dest_slide.label),
            cx = cx,
            cy = cy
        );
        zip.write_all(slide_xml.as_bytes())?;
    }

    zip.finish()?;
    Ok(())
}
