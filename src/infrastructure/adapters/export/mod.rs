//! Export Adapters

mod txt_exporter;

pub use txt_exporter::{normalize_export_path, render_book, TxtExporter};
