use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::Path;

use crate::Container;

const ZIP_MAGIC: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];
const ZIP_EMPTY_MAGIC: [u8; 4] = [0x50, 0x4B, 0x05, 0x06];
const SEVEN_ZIP_MAGIC: [u8; 6] = [0x37, 0x7A, 0xBC, 0xAF, 0x27, 0x1C];
const RAR_MAGIC: [u8; 6] = [0x52, 0x61, 0x72, 0x21, 0x1A, 0x07];

impl From<&[u8]> for Container {
    fn from(value: &[u8]) -> Self {
        Container::from_magic_bytes(value)
    }
}
impl Display for Container {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(match self {
            Container::None => "none",
            Container::Zip => "zip",
            Container::SevenZip => "7z",
            Container::Rar => "rar",
        })
    }
}
impl Container {
    /// Detect a container from a file extension.
    #[must_use]
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| match ext.to_lowercase().as_str() {
                "zip" => Container::Zip,
                "7z" => Container::SevenZip,
                "rar" => Container::Rar,
                _ => Container::None,
            })
            .unwrap_or(Container::None)
    }

    /// Detect a container from magic bytes.
    #[must_use]
    pub fn from_magic_bytes(bytes: &[u8]) -> Self {
        if bytes.starts_with(&ZIP_MAGIC) || bytes.starts_with(&ZIP_EMPTY_MAGIC) {
            return Container::Zip;
        }
        if bytes.starts_with(&SEVEN_ZIP_MAGIC) {
            return Container::SevenZip;
        }
        if bytes.starts_with(&RAR_MAGIC) {
            return Container::Rar;
        }
        Container::None
    }

    pub fn is_archive(&self) -> bool {
        !matches!(self, Container::None)
    }

    /// Removes a trailing container extension from a file name.
    ///
    /// ```
    /// use deltahub_archive::Container;
    /// assert_eq!(Container::strip_suffix("extra_file_x_png.zip"), "extra_file_x_png");
    /// assert_eq!(Container::strip_suffix("bundle.RAR"), "bundle");
    /// assert_eq!(Container::strip_suffix("x.png"), "x.png");
    /// ```
    pub fn strip_suffix(name: &str) -> &str {
        match Container::from_path(name) {
            Container::None => name,
            _ => name.rfind('.').map(|index| &name[..index]).unwrap_or(name),
        }
    }
}
