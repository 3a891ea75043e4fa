//! Merging per-page output files into the final document.
//!
//! Page files are named with zero-padded indices (see
//! [`crate::util::page_file_name`]), so sorting by file name restores page
//! order. Any unreadable page aborts the merge and nothing is written.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, info};

use crate::error::{Error, Result};

/// File name of the merged document inside the output directory
pub const MERGED_FILE_NAME: &str = "translated.pdf";

/// List the per-page PDFs in `dir`, sorted by file name.
///
/// The merged output file itself is never included.
pub fn ordered_page_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_pdf = path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
        let is_merged = path.file_name().is_some_and(|name| name == MERGED_FILE_NAME);
        if path.is_file() && is_pdf && !is_merged {
            files.push(path);
        }
    }
    sort_by_file_name(&mut files);
    Ok(files)
}

/// Sort paths by their file name only.
pub fn sort_by_file_name(files: &mut [PathBuf]) {
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
}

/// Merge the given page files, in file-name order, into `output`.
///
/// The output is written to a sibling temporary file first and renamed into
/// place once the merge succeeded.
pub fn assemble(page_files: &[PathBuf], output: &Path) -> Result<PathBuf> {
    let mut ordered = page_files.to_vec();
    sort_by_file_name(&mut ordered);

    let mut pages = Vec::with_capacity(ordered.len());
    for path in &ordered {
        let bytes = std::fs::read(path).map_err(|e| {
            Error::PdfAssemble(format!("Failed to read {}: {e}", path.display()))
        })?;
        debug!("Queued {} ({} bytes)", path.display(), bytes.len());
        pages.push(bytes);
    }

    let merged = combine_pdfs(&pages)?;

    let partial = output.with_extension("pdf.part");
    std::fs::write(&partial, &merged)?;
    std::fs::rename(&partial, output)?;

    info!("Assembled {} pages into {}", ordered.len(), output.display());
    Ok(output.to_path_buf())
}

/// Merge every per-page PDF in `dir` into `dir/translated.pdf`.
pub fn assemble_dir(dir: &Path) -> Result<PathBuf> {
    let files = ordered_page_files(dir)?;
    assemble(&files, &dir.join(MERGED_FILE_NAME))
}

/// Combine PDFs into one document, keeping the given order.
pub fn combine_pdfs(documents: &[Vec<u8>]) -> Result<Vec<u8>> {
    if documents.is_empty() {
        return Err(Error::PdfAssemble("No pages to combine".to_string()));
    }

    if documents.len() == 1 {
        return Ok(documents[0].clone());
    }

    // Renumbering each input past the previous max id keeps ObjectId order
    // equal to input order, which the BTreeMaps below rely on.
    let mut next_id: u32 = 1;
    let mut page_objects: BTreeMap<ObjectId, Dictionary> = BTreeMap::new();
    let mut other_objects: BTreeMap<ObjectId, Object> = BTreeMap::new();

    for (i, bytes) in documents.iter().enumerate() {
        let mut doc = Document::load_mem(bytes)
            .map_err(|e| Error::Lopdf(format!("Failed to load page file {}: {e}", i + 1)))?;

        doc.renumber_objects_with(next_id);
        next_id = doc.max_id + 1;

        for page_id in doc.get_pages().into_values() {
            let page = doc
                .get_dictionary(page_id)
                .map_err(|e| Error::Lopdf(format!("Broken page in file {}: {e}", i + 1)))?;
            page_objects.insert(page_id, page.clone());
        }

        for (object_id, object) in doc.objects {
            match object.type_name().unwrap_or(b"") {
                b"Catalog" | b"Pages" | b"Page" | b"Outlines" | b"Outline" => {}
                _ => {
                    other_objects.insert(object_id, object);
                }
            }
        }
    }

    let mut merged = Document::with_version("1.5");
    merged.objects.extend(other_objects);
    merged.max_id = next_id;

    let pages_id = merged.new_object_id();

    let mut kids = Vec::with_capacity(page_objects.len());
    for (page_id, mut page) in page_objects {
        page.set("Parent", Object::Reference(pages_id));
        merged.objects.insert(page_id, Object::Dictionary(page));
        kids.push(Object::Reference(page_id));
    }

    let count = i64::try_from(kids.len())
        .map_err(|_| Error::PdfAssemble("Too many pages".to_string()))?;
    merged.objects.insert(
        pages_id,
        Object::Dictionary(Dictionary::from_iter([
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Kids", Object::Array(kids)),
            ("Count", Object::Integer(count)),
        ])),
    );

    let catalog_id = merged.add_object(Dictionary::from_iter([
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    merged.trailer.set("Root", Object::Reference(catalog_id));

    merged.renumber_objects();
    merged.compress();

    let mut output = Vec::new();
    merged
        .save_to(&mut output)
        .map_err(|e| Error::PdfAssemble(format!("Failed to save merged PDF: {e}")))?;

    Ok(output)
}
