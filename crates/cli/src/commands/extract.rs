//! `docchat extract`: Print a document's extracted text.

use std::path::PathBuf;

pub async fn run(path: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let doc = docchat_documents::load_file(&path).await?;

    println!("{}", doc.text);
    eprintln!();
    eprintln!(
        "  {} ({}): {} page(s), {} characters",
        doc.name,
        doc.kind,
        doc.page_count,
        doc.char_count()
    );
    Ok(())
}
