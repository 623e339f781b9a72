use std::path::Path;

use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use serde::{Deserialize, Serialize};
use ttf_parser::Face;

use crate::{
    assets::AssetStore,
    attendance::AttendanceStatus,
    db::EventDb,
    error::{Error, Result},
};

/// Overlay geometry and color stored with an event's certificate
/// template. Color components are 0-255 and normalized to unit range when
/// drawn.
#[derive(PartialEq, Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OverlaySpec {
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub color: [u8; 3],
}

/// The stored certificate template of an event
#[derive(PartialEq, Debug, Clone)]
pub struct CertificateMeta {
    pub pdf_file: String,
    pub font_file: String,
    pub spec: OverlaySpec,
}

/// Template and font files plus overlay geometry, as uploaded by an
/// operator
#[derive(Debug)]
pub struct TemplateUpload {
    pub pdf_name: String,
    pub pdf_bytes: Vec<u8>,
    pub font_name: String,
    pub font_bytes: Vec<u8>,
    pub spec: OverlaySpec,
}

/// Resource name under which the custom font is registered on the page.
const FONT_RESOURCE: &str = "FCert";

/// Width assigned to characters the font has no glyph for.
const DEFAULT_GLYPH_WIDTH: i64 = 500;

/// Draw `name` onto the first page of `template` using the supplied
/// TrueType font, position, size and color. Pure function of its inputs;
/// the output document contains exactly one page.
pub fn overlay_name(
    template: &[u8],
    font: &[u8],
    spec: &OverlaySpec,
    name: &str,
) -> Result<Vec<u8>> {
    let mut doc = Document::load_mem(template).map_err(|e| Error::BadTemplate(e.to_string()))?;
    let first_page = doc
        .get_pages()
        .into_values()
        .next()
        .ok_or_else(|| Error::BadTemplate("template has no pages".to_string()))?;

    keep_first_page(&mut doc, first_page)?;
    let font_id = embed_font(&mut doc, font)?;
    attach_font(&mut doc, first_page, font_id)?;
    append_text(&mut doc, first_page, spec, name)?;

    let _ = doc.prune_objects();
    let mut out = Vec::new();
    doc.save_to(&mut out)
        .map_err(|e| Error::BadTemplate(e.to_string()))?;
    Ok(out)
}

/// Trim the page tree down to the design page.
fn keep_first_page(doc: &mut Document, page_id: ObjectId) -> Result<()> {
    let pages_id = doc
        .catalog()
        .and_then(|catalog| catalog.get(b"Pages"))
        .and_then(Object::as_reference)
        .map_err(|e| Error::BadTemplate(e.to_string()))?;

    page_dict_mut(doc, page_id)?.set("Parent", Object::Reference(pages_id));

    let pages = doc
        .get_object_mut(pages_id)
        .and_then(Object::as_dict_mut)
        .map_err(|e| Error::BadTemplate(e.to_string()))?;
    pages.set("Kids", vec![Object::Reference(page_id)]);
    pages.set("Count", 1);
    Ok(())
}

/// Embed the font program as a TrueType simple font with WinAnsi encoding
/// and per-byte widths taken from the font's own metrics.
fn embed_font(doc: &mut Document, font: &[u8]) -> Result<ObjectId> {
    let face = Face::parse(font, 0).map_err(|_| Error::BadFont)?;
    let scale = 1000.0 / f64::from(face.units_per_em());
    let to_pdf = |units: i16| (f64::from(units) * scale).round() as i64;

    let widths: Vec<Object> = (32..=255u8)
        .map(|byte| {
            winansi_char(byte)
                .and_then(|c| face.glyph_index(c))
                .and_then(|glyph| face.glyph_hor_advance(glyph))
                .map(|advance| (f64::from(advance) * scale).round() as i64)
                .unwrap_or(DEFAULT_GLYPH_WIDTH)
                .into()
        })
        .collect();

    let bbox = face.global_bounding_box();
    let ascent = to_pdf(face.ascender());
    let font_file = doc.add_object(Stream::new(
        dictionary! { "Length1" => font.len() as i64 },
        font.to_vec(),
    ));
    let descriptor = doc.add_object(dictionary! {
        "Type" => "FontDescriptor",
        "FontName" => "EventdeskCert",
        "Flags" => 32,
        "FontBBox" => vec![
            to_pdf(bbox.x_min).into(),
            to_pdf(bbox.y_min).into(),
            to_pdf(bbox.x_max).into(),
            to_pdf(bbox.y_max).into(),
        ],
        "ItalicAngle" => face.italic_angle().round() as i64,
        "Ascent" => ascent,
        "Descent" => to_pdf(face.descender()),
        "CapHeight" => face.capital_height().map(to_pdf).unwrap_or(ascent),
        "StemV" => 80,
        "FontFile2" => font_file,
    });
    Ok(doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "TrueType",
        "BaseFont" => "EventdeskCert",
        "FirstChar" => 32,
        "LastChar" => 255,
        "Widths" => widths,
        "FontDescriptor" => descriptor,
        "Encoding" => "WinAnsiEncoding",
    }))
}

/// Register the embedded font on the page, giving the page its own copy
/// of any inherited resources first.
fn attach_font(doc: &mut Document, page_id: ObjectId, font_id: ObjectId) -> Result<()> {
    let existing = page_dict_mut(doc, page_id)?.get(b"Resources").ok().cloned();
    let mut resources = match existing {
        Some(Object::Dictionary(dict)) => dict,
        Some(Object::Reference(id)) => doc
            .get_dictionary(id)
            .cloned()
            .map_err(|e| Error::BadTemplate(e.to_string()))?,
        _ => inherited_resources(doc).unwrap_or_default(),
    };

    let mut fonts = match resources.get(b"Font") {
        Ok(Object::Dictionary(dict)) => dict.clone(),
        Ok(Object::Reference(id)) => doc.get_dictionary(*id).cloned().unwrap_or_default(),
        _ => Dictionary::new(),
    };
    fonts.set(FONT_RESOURCE, Object::Reference(font_id));
    resources.set("Font", Object::Dictionary(fonts));

    page_dict_mut(doc, page_id)?.set("Resources", Object::Dictionary(resources));
    Ok(())
}

/// Resources hung off the page tree root rather than the page itself.
fn inherited_resources(doc: &Document) -> Option<Dictionary> {
    let pages_id = doc.catalog().ok()?.get(b"Pages").ok()?.as_reference().ok()?;
    match doc.get_dictionary(pages_id).ok()?.get(b"Resources").ok()? {
        Object::Dictionary(dict) => Some(dict.clone()),
        Object::Reference(id) => doc.get_dictionary(*id).cloned().ok(),
        _ => None,
    }
}

/// Append a content stream drawing the name; the template's own content
/// is left untouched.
fn append_text(doc: &mut Document, page_id: ObjectId, spec: &OverlaySpec, name: &str) -> Result<()> {
    let [red, green, blue] = spec.color;
    let mut content = format!(
        "q\nBT\n/{} {} Tf\n{} {} {} rg\n{} {} Td\n(",
        FONT_RESOURCE,
        spec.size,
        f32::from(red) / 255.0,
        f32::from(green) / 255.0,
        f32::from(blue) / 255.0,
        spec.x,
        spec.y,
    )
    .into_bytes();
    for byte in encode_winansi(name) {
        if matches!(byte, b'(' | b')' | b'\\') {
            content.push(b'\\');
        }
        content.push(byte);
    }
    content.extend_from_slice(b") Tj\nET\nQ");

    let stream_id = doc.add_object(Stream::new(dictionary! {}, content));

    let page = page_dict_mut(doc, page_id)?;
    let contents = match page.get(b"Contents").ok().cloned() {
        Some(Object::Reference(existing)) => {
            vec![Object::Reference(existing), Object::Reference(stream_id)]
        }
        Some(Object::Array(mut streams)) => {
            streams.push(Object::Reference(stream_id));
            streams
        }
        _ => vec![Object::Reference(stream_id)],
    };
    page.set("Contents", contents);
    Ok(())
}

fn page_dict_mut(doc: &mut Document, page_id: ObjectId) -> Result<&mut Dictionary> {
    doc.get_object_mut(page_id)
        .and_then(Object::as_dict_mut)
        .map_err(|e| Error::BadTemplate(e.to_string()))
}

/// Store the template pair under the event's asset namespace, deleting
/// any superseded files whose name changed, and persist the overlay
/// geometry on the event row.
pub async fn set_template(
    db: &EventDb,
    assets: &AssetStore,
    event_id: i64,
    upload: TemplateUpload,
) -> Result<()> {
    check_filename(&upload.pdf_name, &["pdf"])?;
    check_filename(&upload.font_name, &["ttf", "otf"])?;
    Document::load_mem(&upload.pdf_bytes).map_err(|e| Error::BadTemplate(e.to_string()))?;
    Face::parse(&upload.font_bytes, 0).map_err(|_| Error::BadFont)?;

    let event = db.get_event(event_id).await?;
    if let Some(previous) = event.certificate_meta() {
        if previous.pdf_file != upload.pdf_name {
            assets.delete(&AssetStore::certificate_key(event_id, &previous.pdf_file))?;
        }
        if previous.font_file != upload.font_name {
            assets.delete(&AssetStore::certificate_key(event_id, &previous.font_file))?;
        }
    }
    assets.write(
        &AssetStore::certificate_key(event_id, &upload.pdf_name),
        &upload.pdf_bytes,
    )?;
    assets.write(
        &AssetStore::certificate_key(event_id, &upload.font_name),
        &upload.font_bytes,
    )?;

    db.set_certificate_meta(event_id, &upload.pdf_name, &upload.font_name, &upload.spec)
        .await?;
    log::debug!("stored certificate template for event {}", event_id);
    Ok(())
}

/// Render a personalized certificate. Requires the participant's status
/// for the event to be exactly `attended` and a configured template.
pub async fn render(
    db: &EventDb,
    assets: &AssetStore,
    event_id: i64,
    participant_id: i64,
) -> Result<Vec<u8>> {
    let event = db.get_event(event_id).await?;
    let participant = db.get_participant(participant_id).await?;
    let status = db
        .registration_status(participant_id, event_id)
        .await?
        .ok_or(Error::NotRegistered)?;
    if status != AttendanceStatus::Attended {
        return Err(Error::NotEligible);
    }
    let meta = event.certificate_meta().ok_or(Error::TemplateMissing)?;

    let pdf = assets
        .read(&AssetStore::certificate_key(event_id, &meta.pdf_file))
        .map_err(Error::AssetRead)?;
    let font = assets
        .read(&AssetStore::certificate_key(event_id, &meta.font_file))
        .map_err(Error::AssetRead)?;
    overlay_name(&pdf, &font, &meta.spec, &participant.name)
}

/// Overlay a caller-supplied template/font pair without touching
/// persisted state, so an operator can check placement before committing.
pub fn preview(pdf: &[u8], font: &[u8], spec: &OverlaySpec, name: &str) -> Result<Vec<u8>> {
    overlay_name(pdf, font, spec, name)
}

fn check_filename(name: &str, extensions: &[&str]) -> Result<()> {
    if name.is_empty() || name.contains('/') || name.contains('\\') || name.contains("..") {
        return Err(Error::Validation(format!("invalid file name '{name}'")));
    }
    let ext = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase);
    match ext {
        Some(ext) if extensions.contains(&ext.as_str()) => Ok(()),
        _ => Err(Error::Validation(format!(
            "'{name}' must have one of the extensions {extensions:?}"
        ))),
    }
}

/// WinAnsi (CP1252) code point for a byte in the 32..=255 range.
fn winansi_char(byte: u8) -> Option<char> {
    match byte {
        0x20..=0x7E => Some(byte as char),
        0xA0..=0xFF => char::from_u32(u32::from(byte)),
        _ => WINANSI_HIGH
            .iter()
            .find(|(b, _)| *b == byte)
            .map(|(_, c)| *c),
    }
}

/// Encode a name into WinAnsi bytes; characters outside the encoding are
/// replaced with '?'.
fn encode_winansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match u32::from(c) {
            0x20..=0x7E => c as u8,
            0xA0..=0xFF => u32::from(c) as u8,
            _ => WINANSI_HIGH
                .iter()
                .find(|(_, h)| *h == c)
                .map(|(b, _)| *b)
                .unwrap_or(b'?'),
        })
        .collect()
}

/// The CP1252-specific 0x80..0x9F range (undefined slots omitted).
const WINANSI_HIGH: [(u8, char); 27] = [
    (0x80, '\u{20AC}'),
    (0x82, '\u{201A}'),
    (0x83, '\u{0192}'),
    (0x84, '\u{201E}'),
    (0x85, '\u{2026}'),
    (0x86, '\u{2020}'),
    (0x87, '\u{2021}'),
    (0x88, '\u{02C6}'),
    (0x89, '\u{2030}'),
    (0x8A, '\u{0160}'),
    (0x8B, '\u{2039}'),
    (0x8C, '\u{0152}'),
    (0x8E, '\u{017D}'),
    (0x91, '\u{2018}'),
    (0x92, '\u{2019}'),
    (0x93, '\u{201C}'),
    (0x94, '\u{201D}'),
    (0x95, '\u{2022}'),
    (0x96, '\u{2013}'),
    (0x97, '\u{2014}'),
    (0x98, '\u{02DC}'),
    (0x99, '\u{2122}'),
    (0x9A, '\u{0161}'),
    (0x9B, '\u{203A}'),
    (0x9C, '\u{0153}'),
    (0x9E, '\u{017E}'),
    (0x9F, '\u{0178}'),
];

#[cfg(test)]
pub(crate) mod fixtures {
    use lopdf::{dictionary, Document, Object, Stream};

    /// A syntactically valid TrueType font with head, hhea, maxp, hmtx and
    /// an empty cmap; enough for metric parsing, with every drawn
    /// character falling back to the default width.
    pub fn minimal_ttf() -> Vec<u8> {
        fn be16(v: &mut Vec<u8>, x: u16) {
            v.extend_from_slice(&x.to_be_bytes());
        }
        fn bei16(v: &mut Vec<u8>, x: i16) {
            v.extend_from_slice(&x.to_be_bytes());
        }
        fn be32(v: &mut Vec<u8>, x: u32) {
            v.extend_from_slice(&x.to_be_bytes());
        }

        let mut head = Vec::new();
        be32(&mut head, 0x0001_0000); // version
        be32(&mut head, 0x0001_0000); // font revision
        be32(&mut head, 0); // checksum adjustment
        be32(&mut head, 0x5F0F_3CF5); // magic
        be16(&mut head, 0); // flags
        be16(&mut head, 1000); // units per em
        head.extend_from_slice(&[0u8; 16]); // created + modified
        bei16(&mut head, 0); // x min
        bei16(&mut head, -200); // y min
        bei16(&mut head, 600); // x max
        bei16(&mut head, 800); // y max
        be16(&mut head, 0); // mac style
        be16(&mut head, 8); // lowest rec ppem
        bei16(&mut head, 2); // font direction hint
        bei16(&mut head, 0); // index to loc format
        bei16(&mut head, 0); // glyph data format

        let mut hhea = Vec::new();
        be32(&mut hhea, 0x0001_0000); // version
        bei16(&mut hhea, 800); // ascender
        bei16(&mut hhea, -200); // descender
        bei16(&mut hhea, 0); // line gap
        be16(&mut hhea, 600); // advance width max
        bei16(&mut hhea, 0); // min left side bearing
        bei16(&mut hhea, 0); // min right side bearing
        bei16(&mut hhea, 600); // x max extent
        bei16(&mut hhea, 1); // caret slope rise
        bei16(&mut hhea, 0); // caret slope run
        bei16(&mut hhea, 0); // caret offset
        hhea.extend_from_slice(&[0u8; 8]); // reserved
        bei16(&mut hhea, 0); // metric data format
        be16(&mut hhea, 2); // number of h metrics

        let mut maxp = Vec::new();
        be32(&mut maxp, 0x0001_0000); // version
        be16(&mut maxp, 2); // num glyphs
        maxp.extend_from_slice(&[0u8; 26]);

        let mut hmtx = Vec::new();
        for _ in 0..2 {
            be16(&mut hmtx, 600);
            bei16(&mut hmtx, 0);
        }

        // cmap with a single format 4 subtable holding only the required
        // terminator segment, so no character maps to a glyph
        let mut cmap = Vec::new();
        be16(&mut cmap, 0); // version
        be16(&mut cmap, 1); // table count
        be16(&mut cmap, 3); // platform: windows
        be16(&mut cmap, 1); // encoding: unicode bmp
        be32(&mut cmap, 12); // subtable offset
        be16(&mut cmap, 4); // format
        be16(&mut cmap, 24); // length
        be16(&mut cmap, 0); // language
        be16(&mut cmap, 2); // seg count * 2
        be16(&mut cmap, 2); // search range
        be16(&mut cmap, 0); // entry selector
        be16(&mut cmap, 0); // range shift
        be16(&mut cmap, 0xFFFF); // end code
        be16(&mut cmap, 0); // reserved pad
        be16(&mut cmap, 0xFFFF); // start code
        bei16(&mut cmap, 1); // id delta
        be16(&mut cmap, 0); // id range offset

        let tables: [(&[u8; 4], Vec<u8>); 5] = [
            (b"cmap", cmap),
            (b"head", head),
            (b"hhea", hhea),
            (b"hmtx", hmtx),
            (b"maxp", maxp),
        ];

        let mut font = Vec::new();
        be32(&mut font, 0x0001_0000); // sfnt version
        be16(&mut font, tables.len() as u16);
        be16(&mut font, 64); // search range
        be16(&mut font, 2); // entry selector
        be16(&mut font, 16); // range shift

        let mut offset = (12 + tables.len() * 16) as u32;
        for (tag, data) in &tables {
            font.extend_from_slice(*tag);
            be32(&mut font, 0); // checksum, unchecked by parsers
            be32(&mut font, offset);
            be32(&mut font, data.len() as u32);
            offset += data.len().next_multiple_of(4) as u32;
        }
        for (_, data) in &tables {
            font.extend_from_slice(data);
            for _ in data.len()..data.len().next_multiple_of(4) {
                font.push(0);
            }
        }
        font
    }

    /// A blank single- or multi-page PDF template.
    pub fn blank_pdf(pages: usize) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let kids: Vec<Object> = (0..pages)
            .map(|_| {
                let content_id = doc.add_object(Stream::new(dictionary! {}, Vec::new()));
                let page_id = doc.add_object(dictionary! {
                    "Type" => "Page",
                    "Parent" => pages_id,
                    "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
                    "Contents" => content_id,
                });
                Object::Reference(page_id)
            })
            .collect();
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => pages as i64,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::{blank_pdf, minimal_ttf};
    use super::*;

    fn spec() -> OverlaySpec {
        OverlaySpec {
            x: 120.0,
            y: 300.0,
            size: 24.0,
            color: [255, 0, 0],
        }
    }

    fn contains(haystack: &[u8], needle: &[u8]) -> bool {
        haystack.windows(needle.len()).any(|w| w == needle)
    }

    #[test]
    fn overlay_draws_the_name_and_embeds_the_font() {
        let font = minimal_ttf();
        let out = overlay_name(&blank_pdf(1), &font, &spec(), "Grace Hopper").unwrap();

        let doc = Document::load_mem(&out).unwrap();
        let pages = doc.get_pages();
        assert_eq!(pages.len(), 1);

        let page_id = *pages.values().next().unwrap();
        let content = doc.get_page_content(page_id).unwrap();
        assert!(contains(&content, b"(Grace Hopper) Tj"));
        assert!(contains(&content, b"1 0 0 rg"));

        // font program is embedded verbatim
        assert!(contains(&out, b"FontFile2"));
        assert!(contains(&out, &font));
    }

    #[test]
    fn overlay_keeps_only_the_first_page() {
        let out = overlay_name(&blank_pdf(3), &minimal_ttf(), &spec(), "A").unwrap();
        let doc = Document::load_mem(&out).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[test]
    fn overlay_escapes_pdf_string_delimiters() {
        let out = overlay_name(
            &blank_pdf(1),
            &minimal_ttf(),
            &spec(),
            r"Team (A) \ Rocket",
        )
        .unwrap();
        let doc = Document::load_mem(&out).unwrap();
        let page_id = *doc.get_pages().values().next().unwrap();
        let content = doc.get_page_content(page_id).unwrap();
        assert!(contains(&content, br"(Team \(A\) \\ Rocket) Tj"));
    }

    #[test]
    fn overlay_rejects_bad_inputs() {
        assert!(matches!(
            overlay_name(b"not a pdf", &minimal_ttf(), &spec(), "A"),
            Err(Error::BadTemplate(_))
        ));
        assert!(matches!(
            overlay_name(&blank_pdf(1), b"not a font", &spec(), "A"),
            Err(Error::BadFont)
        ));
    }

    #[test]
    fn preview_is_the_pure_overlay() {
        let out = preview(&blank_pdf(1), &minimal_ttf(), &spec(), "Preview Name").unwrap();
        assert!(contains(&out, b"%PDF"));
    }

    #[test]
    fn winansi_round_trips_the_printable_range() {
        for byte in 0x20..=0x7Eu8 {
            let c = winansi_char(byte).unwrap();
            assert_eq!(encode_winansi(&c.to_string()), vec![byte]);
        }
        assert_eq!(encode_winansi("€"), vec![0x80]);
        assert_eq!(encode_winansi("é"), vec![0xE9]);
        // outside the encoding
        assert_eq!(encode_winansi("桜"), vec![b'?']);
    }

    #[test]
    fn filenames_are_checked() {
        assert!(check_filename("certificate.pdf", &["pdf"]).is_ok());
        assert!(check_filename("Font.TTF", &["ttf", "otf"]).is_ok());
        assert!(check_filename("nested/evil.pdf", &["pdf"]).is_err());
        assert!(check_filename("../evil.pdf", &["pdf"]).is_err());
        assert!(check_filename("font.woff", &["ttf", "otf"]).is_err());
        assert!(check_filename("", &["pdf"]).is_err());
    }
}

#[cfg(test)]
mod pipeline_tests {
    use super::fixtures::{blank_pdf, minimal_ttf};
    use super::*;
    use crate::db::testutil::{event, participant, temp_db};

    fn upload(pdf_name: &str, font_name: &str) -> TemplateUpload {
        TemplateUpload {
            pdf_name: pdf_name.to_string(),
            pdf_bytes: blank_pdf(1),
            font_name: font_name.to_string(),
            font_bytes: minimal_ttf(),
            spec: OverlaySpec {
                x: 100.0,
                y: 250.0,
                size: 18.0,
                color: [0, 0, 255],
            },
        }
    }

    #[tokio::test]
    async fn render_requires_full_attendance_and_a_template() {
        let (db, _db_dir) = temp_db().await;
        let asset_dir = tempfile::tempdir().unwrap();
        let assets = AssetStore::new(asset_dir.path());

        let ev = db.add_event(&event("2024-01-01", "2024-01-02", 2, 5)).await.unwrap();
        let p = db.add_participant(&participant(1), "cred").await.unwrap();

        assert!(matches!(
            render(&db, &assets, ev.id, p.id).await,
            Err(Error::NotRegistered)
        ));

        db.register_for_event(p.id, ev.id).await.unwrap();
        assert!(matches!(
            render(&db, &assets, ev.id, p.id).await,
            Err(Error::NotEligible)
        ));

        db.mark_attendance_on(&ev.code, p.id, "2024-01-01".parse().unwrap())
            .await
            .unwrap();
        db.mark_attendance_on(&ev.code, p.id, "2024-01-02".parse().unwrap())
            .await
            .unwrap();
        assert!(matches!(
            render(&db, &assets, ev.id, p.id).await,
            Err(Error::TemplateMissing)
        ));

        set_template(&db, &assets, ev.id, upload("template.pdf", "font.ttf"))
            .await
            .unwrap();
        let pdf = render(&db, &assets, ev.id, p.id).await.unwrap();
        let doc = Document::load_mem(&pdf).unwrap();
        let page_id = *doc.get_pages().values().next().unwrap();
        let content = doc.get_page_content(page_id).unwrap();
        let name = format!("({}) Tj", participant(1).name);
        assert!(content
            .windows(name.len())
            .any(|w| w == name.as_bytes()));
    }

    #[tokio::test]
    async fn replacing_a_template_deletes_superseded_files() {
        let (db, _db_dir) = temp_db().await;
        let asset_dir = tempfile::tempdir().unwrap();
        let assets = AssetStore::new(asset_dir.path());
        let ev = db.add_event(&event("2024-01-01", "2024-01-01", 1, 5)).await.unwrap();

        set_template(&db, &assets, ev.id, upload("first.pdf", "first.ttf"))
            .await
            .unwrap();
        set_template(&db, &assets, ev.id, upload("second.pdf", "second.ttf"))
            .await
            .unwrap();

        assert!(assets
            .read(&AssetStore::certificate_key(ev.id, "first.pdf"))
            .is_err());
        assert!(assets
            .read(&AssetStore::certificate_key(ev.id, "first.ttf"))
            .is_err());
        assert!(assets
            .read(&AssetStore::certificate_key(ev.id, "second.pdf"))
            .is_ok());

        let meta = db.get_event(ev.id).await.unwrap().certificate_meta().unwrap();
        assert_eq!(meta.pdf_file, "second.pdf");
        assert_eq!(meta.spec.color, [0, 0, 255]);
    }

    #[tokio::test]
    async fn set_template_validates_uploads() {
        let (db, _db_dir) = temp_db().await;
        let asset_dir = tempfile::tempdir().unwrap();
        let assets = AssetStore::new(asset_dir.path());
        let ev = db.add_event(&event("2024-01-01", "2024-01-01", 1, 5)).await.unwrap();

        let mut bad = upload("template.pdf", "font.ttf");
        bad.pdf_bytes = b"not a pdf".to_vec();
        assert!(matches!(
            set_template(&db, &assets, ev.id, bad).await,
            Err(Error::BadTemplate(_))
        ));

        let mut bad = upload("template.pdf", "font.ttf");
        bad.font_bytes = b"not a font".to_vec();
        assert!(matches!(
            set_template(&db, &assets, ev.id, bad).await,
            Err(Error::BadFont)
        ));

        assert!(matches!(
            set_template(&db, &assets, ev.id, upload("template.pdf", "font.woff")).await,
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            set_template(&db, &assets, 99, upload("template.pdf", "font.ttf")).await,
            Err(Error::EventNotFound(99))
        ));
    }

    #[tokio::test]
    async fn render_surfaces_missing_assets() {
        let (db, _db_dir) = temp_db().await;
        let asset_dir = tempfile::tempdir().unwrap();
        let assets = AssetStore::new(asset_dir.path());
        let ev = db.add_event(&event("2024-01-01", "2024-01-01", 1, 5)).await.unwrap();
        let p = db.add_participant(&participant(1), "cred").await.unwrap();
        db.register_for_event(p.id, ev.id).await.unwrap();
        db.mark_attendance_on(&ev.code, p.id, "2024-01-01".parse().unwrap())
            .await
            .unwrap();

        set_template(&db, &assets, ev.id, upload("template.pdf", "font.ttf"))
            .await
            .unwrap();
        assets
            .delete(&AssetStore::certificate_key(ev.id, "template.pdf"))
            .unwrap();

        assert!(matches!(
            render(&db, &assets, ev.id, p.id).await,
            Err(Error::AssetRead(_))
        ));
    }
}
