//! Test Suite for formfill
//!
//! Fixture generators and read-back helpers shared by the tests of every
//! crate in the workspace.

pub mod generators;
pub mod inspect;

pub use generators::{FormTemplateBuilder, PdfRect};
pub use inspect::{FormSnapshot, WidgetSnapshot};

/// Common test utilities
pub mod utils {
    use base64::{engine::general_purpose::STANDARD, Engine as _};

    /// Create a temporary directory for test outputs
    pub fn create_test_output_dir() -> anyhow::Result<tempfile::TempDir> {
        Ok(tempfile::tempdir()?)
    }

    pub fn to_base64(bytes: &[u8]) -> String {
        STANDARD.encode(bytes)
    }

    pub fn from_base64(text: &str) -> anyhow::Result<Vec<u8>> {
        Ok(STANDARD.decode(text)?)
    }
}
