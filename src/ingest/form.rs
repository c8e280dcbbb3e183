use std::path::PathBuf;
use tempfile::NamedTempFile;
use tokio::io::AsyncRead;

enum UploadSource {
    Memory(Vec<u8>),
    Path(PathBuf),
    Temp(NamedTempFile),
}

/// One file part of a multipart form, already spooled by the request layer.
pub struct UploadedFile {
    pub file_name: String,
    source: UploadSource,
}

impl UploadedFile {
    pub fn from_bytes(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            source: UploadSource::Memory(bytes),
        }
    }

    pub fn from_path(file_name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            file_name: file_name.into(),
            source: UploadSource::Path(path.into()),
        }
    }

    pub fn from_temp_file(file_name: impl Into<String>, file: NamedTempFile) -> Self {
        Self {
            file_name: file_name.into(),
            source: UploadSource::Temp(file),
        }
    }

    pub async fn open(&self) -> std::io::Result<Box<dyn AsyncRead + Unpin + Send + '_>> {
        match &self.source {
            UploadSource::Memory(bytes) => Ok(Box::new(bytes.as_slice())),
            UploadSource::Path(path) => Ok(Box::new(tokio::fs::File::open(path).await?)),
            UploadSource::Temp(file) => Ok(Box::new(tokio::fs::File::open(file.path()).await?)),
        }
    }
}

pub struct FormEntry {
    pub field_name: String,
    pub file: UploadedFile,
}

/// File parts of a multipart form, in the order the client sent them.
#[derive(Default)]
pub struct UploadForm {
    entries: Vec<FormEntry>,
}

impl UploadForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, field_name: impl Into<String>, file: UploadedFile) -> Self {
        self.push(field_name, file);
        self
    }

    pub fn push(&mut self, field_name: impl Into<String>, file: UploadedFile) {
        self.entries.push(FormEntry {
            field_name: field_name.into(),
            file,
        });
    }

    pub fn files<'a>(&'a self, field_name: &'a str) -> impl Iterator<Item = &'a UploadedFile> + 'a {
        self.entries
            .iter()
            .filter(move |entry| entry.field_name == field_name)
            .map(|entry| &entry.file)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tokio::io::AsyncReadExt;

    async fn read_all(file: &UploadedFile) -> std::io::Result<Vec<u8>> {
        let mut reader = file.open().await?;
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes).await?;
        Ok(bytes)
    }

    #[tokio::test]
    async fn test_open_each_source() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"temp bytes").unwrap();
        temp.flush().unwrap();

        let memory = UploadedFile::from_bytes("a.png", b"memory bytes".to_vec());
        let spooled = UploadedFile::from_temp_file("b.png", temp);

        assert_eq!(read_all(&memory).await.unwrap(), b"memory bytes");
        assert_eq!(read_all(&spooled).await.unwrap(), b"temp bytes");
    }

    #[tokio::test]
    async fn test_open_missing_path_fails() {
        let file = UploadedFile::from_path("gone.png", "/no/such/dir/gone.png");
        assert!(file.open().await.is_err());
    }

    #[test]
    fn test_files_filters_by_field_and_keeps_order() {
        let form = UploadForm::new()
            .with_file("images", UploadedFile::from_bytes("1.png", vec![]))
            .with_file("avatar", UploadedFile::from_bytes("2.png", vec![]))
            .with_file("images", UploadedFile::from_bytes("3.png", vec![]));

        let names: Vec<&str> = form.files("images").map(|f| f.file_name.as_str()).collect();
        assert_eq!(names, vec!["1.png", "3.png"]);
        assert_eq!(form.len(), 3);
    }
}
