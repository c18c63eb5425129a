use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::{util::url_encode, MatrixClient, Result};

const URL_END: &[char] = &['"', '\'', '<', '>', '\\', ' ', '\t', '\r', '\n'];

/// Pictures exported next to the XML, one file per picture URL.
///
/// A picture published at `<url_prefix><rest>` is stored in `folder` under
/// the form-encoded `<rest>`.
#[derive(Clone, Debug)]
pub struct PictureFolder {
    folder: PathBuf,
    url_prefix: String,
    uploaded: HashMap<String, String>,
}

impl PictureFolder {
    pub fn new(folder: impl Into<PathBuf>, url_prefix: impl Into<String>) -> Self {
        Self {
            folder: folder.into(),
            url_prefix: url_prefix.into(),
            uploaded: HashMap::new(),
        }
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    /// Picture URLs in `html`, first occurrence order, without repeats.
    pub fn picture_urls(&self, html: &str) -> Vec<String> {
        let mut urls: Vec<String> = Vec::new();
        if self.url_prefix.is_empty() {
            return urls;
        }
        for (start, _) in html.match_indices(&self.url_prefix) {
            let tail = &html[start..];
            let end = tail.find(URL_END).unwrap_or(tail.len());
            let url = &tail[..end];
            if !urls.iter().any(|known| known == url) {
                urls.push(url.to_owned());
            }
        }
        urls
    }

    /// Local copy of the picture behind `url`, if it was exported.
    pub fn local_file(&self, url: &str) -> Option<PathBuf> {
        let rest = url.strip_prefix(&self.url_prefix)?;
        let path = self.folder.join(url_encode(rest));
        path.is_file().then_some(path)
    }

    /// Uploads every exported picture `html` refers to and points the
    /// references at the uploaded copies. A picture is uploaded once per
    /// import; pictures without a local copy keep their URL.
    pub async fn rehost(&mut self, client: &MatrixClient, project: &str, html: &str) -> Result<String> {
        let mut urls = self.picture_urls(html);
        // longest first so a URL that prefixes another is not rewritten inside it
        urls.sort_by_key(|url| std::cmp::Reverse(url.len()));

        let mut rewritten = html.to_owned();
        for url in urls {
            let hosted = match self.uploaded.get(&url) {
                Some(hosted) => hosted.clone(),
                None => {
                    let Some(file) = self.local_file(&url) else {
                        debug!(%url, "no local copy of picture");
                        continue;
                    };
                    let upload = client.upload_file(project, &file).await?;
                    let hosted = format!(
                        "{}/{project}/file/{}?key={}",
                        client.base_url(),
                        upload.file_id,
                        upload.key
                    );
                    info!(%url, %hosted, "picture uploaded");
                    self.uploaded.insert(url.clone(), hosted.clone());
                    hosted
                }
            };
            rewritten = rewritten.replace(&url, &hosted);
        }
        Ok(rewritten)
    }
}
