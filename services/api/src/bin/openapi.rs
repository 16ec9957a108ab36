//! services/api/src/bin/openapi.rs
//!
//! Writes the OpenAPI document of the proxy endpoints to disk, by default
//! `openapi.json` in the working directory. Pass a path to write elsewhere.

use api_lib::web::rest::ApiDoc;
use std::path::{Path, PathBuf};
use utoipa::OpenApi;

fn write_document(
    api_doc: utoipa::openapi::OpenApi,
    path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, api_doc.to_pretty_json()?)?;
    println!("OpenAPI document written to {}", path.display());
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("openapi.json"));
    write_document(ApiDoc::openapi(), &path)
}
