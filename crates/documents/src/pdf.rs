//! PDF text-layer extraction via `lopdf`.

use docchat_core::error::ExtractionError;
use lopdf::Document;
use lopdf::encryption::DecryptionError;
use tracing::{debug, trace, warn};

/// Text of every page, in page order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedPdf {
    pub pages: Vec<String>,
}

impl ExtractedPdf {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Concatenate pages with no separator. Page boundaries are not marked.
    pub fn into_text(self) -> String {
        self.pages.concat()
    }
}

/// Parse `bytes` as a PDF and extract each page's text.
///
/// Encrypted files are opened with the empty user password, which covers
/// PDFs locked only by an owner password. Any page whose text cannot be read
/// fails the whole document.
pub fn extract_pages(bytes: &[u8]) -> Result<ExtractedPdf, ExtractionError> {
    let mut doc =
        Document::load_mem(bytes).map_err(|e| ExtractionError::MalformedPdf(e.to_string()))?;

    if doc.is_encrypted() {
        match doc.decrypt("") {
            Ok(()) => debug!("Opened encrypted PDF with the empty user password"),
            Err(lopdf::Error::Decryption(DecryptionError::IncorrectPassword)) => {
                warn!("PDF requires a user password");
                return Err(ExtractionError::PasswordProtected);
            }
            Err(e) => {
                return Err(ExtractionError::MalformedPdf(format!(
                    "cannot decrypt: {e}"
                )));
            }
        }
    }

    let page_numbers: Vec<u32> = doc.get_pages().into_keys().collect();
    if page_numbers.is_empty() {
        warn!("PDF has no pages");
    }

    let mut pages = Vec::with_capacity(page_numbers.len());
    for page_number in page_numbers {
        let raw = doc.extract_text(&[page_number]).map_err(|e| {
            ExtractionError::MalformedPdf(format!("page {page_number}: {e}"))
        })?;
        trace!(page_number, chars = raw.len(), "Extracted PDF page");
        pages.push(strip_line_terminators(&raw).to_string());
    }

    Ok(ExtractedPdf { pages })
}

/// The text-layer reader ends every text object with a newline; a page's
/// own text does not include it.
fn strip_line_terminators(page: &str) -> &str {
    page.trim_end_matches(['\n', '\r'])
}

/// Minimal text-only PDFs for tests.
#[cfg(any(test, feature = "test-fixtures"))]
pub mod fixtures {
    use lopdf::content::{Content, Operation};
    use lopdf::encryption::{decrypt_object, get_encryption_key};
    use lopdf::{Document, Object, ObjectId, Stream, StringFormat, dictionary};

    /// Padding string of the standard security handler.
    const PASSWORD_PADDING: [u8; 32] = [
        0x28, 0xBF, 0x4E, 0x5E, 0x4E, 0x75, 0x8A, 0x41, 0x64, 0x00, 0x4E, 0x56, 0xFF, 0xFA,
        0x01, 0x08, 0x2E, 0x2E, 0x00, 0xB6, 0xD0, 0x68, 0x3E, 0x80, 0x2F, 0x0C, 0xA9, 0xFE,
        0x64, 0x53, 0x69, 0x7A,
    ];

    /// Build a PDF with one page per entry, each showing that string.
    pub fn text_pdf(pages: &[&str]) -> lopdf::Result<Vec<u8>> {
        save(build(pages.iter().map(|text| show_text(text)).collect())?)
    }

    /// Like [`text_pdf`], but the page at index `broken` has a `Tf` operator
    /// whose font operand is not a name, so its text cannot be extracted.
    pub fn pdf_with_unreadable_page(pages: &[&str], broken: usize) -> lopdf::Result<Vec<u8>> {
        let contents = pages
            .iter()
            .enumerate()
            .map(|(index, text)| {
                let mut content = show_text(text);
                if index == broken {
                    content.operations[1] =
                        Operation::new("Tf", vec![Object::Integer(1), Object::Integer(24)]);
                }
                content
            })
            .collect();
        save(build(contents)?)
    }

    /// An RC4-encrypted text PDF (revision 2) with an owner password only.
    /// It opens with the empty user password.
    pub fn owner_locked_pdf(pages: &[&str]) -> lopdf::Result<Vec<u8>> {
        encrypted_pdf(pages, true)
    }

    /// An RC4-encrypted text PDF that refuses the empty user password.
    pub fn user_locked_pdf(pages: &[&str]) -> lopdf::Result<Vec<u8>> {
        encrypted_pdf(pages, false)
    }

    fn show_text(text: &str) -> Content {
        Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), Object::Integer(24)]),
                Operation::new("Td", vec![Object::Integer(72), Object::Integer(720)]),
                Operation::new("Tj", vec![Object::string_literal(text)]),
                Operation::new("ET", vec![]),
            ],
        }
    }

    fn build(contents: Vec<Content>) -> lopdf::Result<Document> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => font_id,
            },
        });

        let mut kids: Vec<Object> = Vec::with_capacity(contents.len());
        for content in contents {
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        let pages_dict = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => Object::Integer(count),
            "Resources" => resources_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(612),
                Object::Integer(792),
            ],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        Ok(doc)
    }

    fn encrypted_pdf(pages: &[&str], opens_with_empty_password: bool) -> lopdf::Result<Vec<u8>> {
        let mut doc = build(pages.iter().map(|text| show_text(text)).collect())?;

        let file_id = Object::String(b"docchat-fixture-id".to_vec(), StringFormat::Hexadecimal);
        doc.trailer.set("ID", vec![file_id.clone(), file_id]);

        let encrypt_id = doc.add_object(dictionary! {
            "Filter" => "Standard",
            "V" => Object::Integer(1),
            "R" => Object::Integer(2),
            "Length" => Object::Integer(40),
            "P" => Object::Integer(-4),
            "O" => Object::String(vec![0x5A; 32], StringFormat::Hexadecimal),
        });
        doc.trailer.set("Encrypt", encrypt_id);

        let key = get_encryption_key(&doc, "", false)?;

        // RC4 is symmetric: "decrypting" plaintext with the object key encrypts it.
        let sealed: Vec<(ObjectId, Vec<u8>)> = doc
            .objects
            .iter()
            .filter(|(id, _)| **id != encrypt_id)
            .filter_map(|(&id, object)| decrypt_object(&key, id, object).ok().map(|b| (id, b)))
            .collect();
        for (id, bytes) in sealed {
            match doc.get_object_mut(id)? {
                Object::Stream(stream) => stream.set_content(bytes),
                Object::String(content, _) => *content = bytes,
                _ => {}
            }
        }

        let user_entry = if opens_with_empty_password {
            rc4(&key, &PASSWORD_PADDING)
        } else {
            vec![0; 32]
        };
        doc.get_object_mut(encrypt_id)?
            .as_dict_mut()?
            .set("U", Object::String(user_entry, StringFormat::Hexadecimal));

        save(doc)
    }

    fn save(mut doc: Document) -> lopdf::Result<Vec<u8>> {
        let mut bytes = Vec::new();
        doc.save_to(&mut bytes)?;
        Ok(bytes)
    }

    fn rc4(key: &[u8], data: &[u8]) -> Vec<u8> {
        let mut state: Vec<u8> = (0..=255).collect();
        let mut j = 0u8;
        for i in 0..256 {
            j = j.wrapping_add(state[i]).wrapping_add(key[i % key.len()]);
            state.swap(i, j as usize);
        }

        let (mut i, mut j) = (0u8, 0u8);
        data.iter()
            .map(|byte| {
                i = i.wrapping_add(1);
                j = j.wrapping_add(state[i as usize]);
                state.swap(i as usize, j as usize);
                byte ^ state[state[i as usize].wrapping_add(state[j as usize]) as usize]
            })
            .collect()
    }
}
