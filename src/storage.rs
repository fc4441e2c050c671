use log::debug;
use std::path::PathBuf;

use crate::error::Result;

#[derive(Debug, Clone)]
pub struct ImageStore {
    dir: PathBuf,
    prefix: String,
}

impl ImageStore {
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
        }
    }

    pub fn file_name(&self, index: usize) -> String {
        format!("{}_{}.png", self.prefix, index)
    }

    // The returned name is what clients fetch under /images
    pub async fn save(&self, index: usize, bytes: &[u8]) -> Result<String> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let name = self.file_name(index);
        let path = self.dir.join(&name);
        tokio::fs::write(&path, bytes).await?;

        debug!("Wrote {} bytes to {}", bytes.len(), path.display());
        Ok(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_names_follow_the_prefix_pattern() {
        let store = ImageStore::new("out", "gemini_generated_image");
        assert_eq!(store.file_name(1), "gemini_generated_image_1.png");
        assert_eq!(store.file_name(10), "gemini_generated_image_10.png");
    }

    #[tokio::test]
    async fn save_creates_the_directory_and_writes_bytes() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ImageStore::new(tmp.path().join("nested"), "img");

        let name = store.save(2, b"\x89PNG").await.unwrap();

        assert_eq!(name, "img_2.png");
        let written = std::fs::read(tmp.path().join("nested").join("img_2.png")).unwrap();
        assert_eq!(written, b"\x89PNG");
    }
}
