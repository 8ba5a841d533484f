// Report engine: template model, formatting, and the preview / PDF / XLSX /
// Word / DOCX / CSV renderers.

pub mod color;
pub mod csv;
pub mod dataset;
pub mod docx;
pub mod export;
pub mod fonts;
pub mod format;
pub mod html;
pub mod images;
pub mod pdf;
pub mod presets;
pub mod preview;
pub mod report;
pub mod table;
pub mod template;
pub mod totals;
pub mod watermark;
pub mod word;
pub mod xlsx;

pub use export::{ExportArtifact, ExportError, ExportFormat, export, save_artifact};
pub use format::FormatLocale;
pub use images::{DefaultImageLoader, ImageLoader};
pub use report::ReportRequest;
pub use template::{Column, ColumnType, Orientation, ReportType, Template};
