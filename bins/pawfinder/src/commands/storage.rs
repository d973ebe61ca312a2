//! Storage commands

use crate::context::{api, Context};
use crate::output;
use anyhow::{Context as _, Result};
use owo_colors::OwoColorize;
use serde_json::json;
use std::path::Path;

/// Upload flags
pub struct UploadOptions {
    pub path: Option<String>,
    pub bucket: Option<String>,
    pub content_type: Option<String>,
    pub cleanup: bool,
}

/// List buckets
pub async fn buckets(ctx: &Context) -> Result<()> {
    let client = ctx.client()?;
    let buckets = api(client.storage().list_buckets().await)?;

    if ctx.is_json() {
        return ctx.print_json(&buckets);
    }

    output::banner("🪣 Storage Buckets");
    if buckets.is_empty() {
        println!("  {}", "No buckets".dimmed());
    }
    for bucket in &buckets {
        let visibility = if bucket.public {
            "public".green().to_string()
        } else {
            "private".yellow().to_string()
        };
        println!("  {:<24} {}", bucket.name, visibility);
    }
    println!();
    Ok(())
}

/// Content type for a file name, by extension
pub fn guess_content_type(file: &Path) -> &'static str {
    let ext = file
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "heic" => "image/heic",
        "json" => "application/json",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}

/// Upload one file
pub async fn upload(ctx: &Context, file: &Path, options: UploadOptions) -> Result<()> {
    let bytes = std::fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;
    let size = bytes.len();

    let object_path = match options.path {
        Some(path) => path,
        None => {
            let name = file
                .file_name()
                .and_then(|n| n.to_str())
                .context("File name is not valid UTF-8")?;
            format!("diagnostics/{name}")
        }
    };
    let content_type = options
        .content_type
        .unwrap_or_else(|| guess_content_type(file).to_string());

    let client = ctx.client()?;
    let storage = match options.bucket {
        Some(bucket) => client.storage_bucket(bucket),
        None => client.storage_bucket(ctx.schema().submit.bucket.clone()),
    };

    let stored = api(storage.upload(&object_path, bytes, &content_type).await)?;
    let url = storage.public_url(&stored);

    if options.cleanup {
        api(storage.remove(std::slice::from_ref(&stored)).await)?;
    }

    if ctx.is_json() {
        return ctx.print_json(&json!({
            "bucket": storage.bucket(),
            "path": stored,
            "url": url,
            "bytes": size,
            "content_type": content_type,
            "removed": options.cleanup,
        }));
    }

    output::banner("📤 Storage Upload");
    output::ok(&format!("Uploaded {size} bytes to {}/{stored}", storage.bucket()));
    println!("    └─ {}", url.dimmed());
    if options.cleanup {
        output::ok("Removed again");
    }
    println!();
    Ok(())
}

/// Create a bucket
pub async fn create_bucket(ctx: &Context, name: &str, public: bool) -> Result<()> {
    let client = ctx.client()?;
    api(client.storage().create_bucket(name, public).await)?;

    if ctx.is_json() {
        return ctx.print_json(&json!({ "name": name, "public": public }));
    }
    output::ok(&format!(
        "Created {} bucket {}",
        if public { "public" } else { "private" },
        name.bold()
    ));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guess_content_type() {
        assert_eq!(guess_content_type(Path::new("cat.JPG")), "image/jpeg");
        assert_eq!(guess_content_type(Path::new("dog.webp")), "image/webp");
        assert_eq!(guess_content_type(Path::new("notes")), "application/octet-stream");
    }
}
